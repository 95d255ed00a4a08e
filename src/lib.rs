//! Fetch an application's `name=value` configuration from DynamoDB using the
//! instance role's temporary credentials.
//!
//! [`list`] runs the whole pipeline: credentials and region come from the
//! instance metadata service, a SigV4-signed `Scan` filtered on the `App`
//! attribute goes to the regional endpoint, and the returned items are
//! flattened into lines.

pub mod config;
pub mod dynamo;
pub mod errors;
pub mod format;
pub mod http;
pub mod imds;
pub mod region;
pub mod resolver;
pub mod sigv4;
pub mod telemetry;

pub use config::Settings;
pub use dynamo::{ConfigEntry, ConfigStore, DynamoClient};
pub use errors::{Error, Result};
pub use format::format_entries;
pub use http::Http;
pub use imds::MetadataClient;
pub use region::Region;
pub use resolver::{resolve, ResolvedConfig};
pub use sigv4::{Credentials, SignableRequest, SignedRequest, Signer};

/// Resolve credentials and region, scan for `app`, and format the entries.
pub fn list(settings: &Settings, app: &str) -> Result<Vec<String>> {
    let http = Http::new(settings.http_timeout())?;
    let metadata = MetadataClient::new(http.clone(), settings.metadata_endpoint());
    let ResolvedConfig {
        credentials,
        region,
    } = resolve(&metadata, settings.role())?;

    let store = DynamoClient::for_region(
        http,
        credentials,
        &region,
        settings.dynamodb_endpoint(),
        settings.table(),
    )?;
    list_from(&store, app)
}

/// Query `store` for `app` and format the result.
pub fn list_from(store: &dyn ConfigStore, app: &str) -> Result<Vec<String>> {
    let entries = store.query(app)?;
    Ok(format_entries(&entries))
}
