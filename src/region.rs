use std::fmt;

use crate::errors::{Error, Result};

/// A region identifier such as `us-east-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Region(String);

impl Region {
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    /// Derive the region from an availability-zone string.
    ///
    /// Zones append a letter to the numbered region (`us-east-1a`). The last
    /// character is dropped only when it is not a digit, so an
    /// already-normalized region passes through unchanged.
    pub fn from_availability_zone(zone: &str) -> Result<Self> {
        let zone = zone.trim();
        let last = zone
            .chars()
            .last()
            .ok_or_else(|| Error::decode("availability zone", "empty value"))?;
        if last.is_ascii_digit() {
            return Ok(Self(zone.to_string()));
        }
        Ok(Self(zone[..zone.len() - last.len_utf8()].to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn dynamodb_endpoint(&self) -> String {
        format!("https://dynamodb.{}.amazonaws.com/", self.0)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
