use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::{Error, Result};
use crate::imds::MetadataClient;
use crate::region::Region;
use crate::sigv4::Credentials;

pub const SECURITY_CREDENTIALS_PATH: &str = "/latest/meta-data/iam/security-credentials/";
pub const AVAILABILITY_ZONE_PATH: &str = "/latest/meta-data/placement/availability-zone";

const SUCCESS_CODE: &str = "Success";

/// Region and credentials resolved once at startup.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub credentials: Credentials,
    pub region: Region,
}

/// Credential document served for an instance role.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CredentialDocument {
    #[serde(default)]
    code: Option<String>,
    access_key_id: String,
    secret_access_key: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    expiration: Option<String>,
}

/// Read the role credentials and the placement zone from the metadata service.
pub fn resolve(metadata: &MetadataClient, role: &str) -> Result<ResolvedConfig> {
    let credentials = fetch_credentials(metadata, role)?;
    let zone = metadata.fetch_text(AVAILABILITY_ZONE_PATH)?;
    let region = Region::from_availability_zone(&zone)?;
    info!(%region, zone = zone.trim(), "resolved region from placement");
    Ok(ResolvedConfig {
        credentials,
        region,
    })
}

fn fetch_credentials(metadata: &MetadataClient, role: &str) -> Result<Credentials> {
    let path = format!("{SECURITY_CREDENTIALS_PATH}{role}");
    let document: CredentialDocument = metadata.fetch_json(&path)?;

    if let Some(code) = document.code.as_deref() {
        if code != SUCCESS_CODE {
            return Err(Error::unavailable(
                format!("{}{path}", metadata.base_url()),
                format!("credential document reports {code}"),
            ));
        }
    }
    if let Some(expiration) = document.expiration.as_deref() {
        debug!(role, expiration, "instance role credentials loaded");
    }

    Ok(Credentials::new(
        document.access_key_id,
        document.secret_access_key,
        document.token,
    ))
}
