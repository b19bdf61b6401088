//! Vault timestamps
//!
//! The vault reports instants as Unix epoch seconds, but not consistently:
//! the same field arrives as `"1543600800"` from one endpoint and as a bare
//! `1543600800` from another. [`VaultTime`] accepts both and decodes them to
//! the same UTC instant.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::VaultError;

/// An absolute instant as reported by the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VaultTime(DateTime<Utc>);

impl VaultTime {
    /// Decode a raw JSON scalar, quoted or bare.
    ///
    /// Surrounding quote characters are stripped before the remaining text is
    /// parsed as a base-10 integer, so `"42"` and `42` decode identically.
    pub fn from_raw(raw: &[u8]) -> crate::Result<Self> {
        let text = std::str::from_utf8(raw).map_err(|_| {
            VaultError::MalformedTimestamp(String::from_utf8_lossy(raw).into_owned())
        })?;

        let digits = text.trim_start_matches('"').trim_end_matches('"');
        let secs: i64 = digits
            .parse()
            .map_err(|_| VaultError::MalformedTimestamp(text.to_string()))?;

        Self::from_epoch_secs(secs)
    }

    /// Build from Unix epoch seconds
    pub fn from_epoch_secs(secs: i64) -> crate::Result<Self> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or_else(|| VaultError::MalformedTimestamp(format!("{secs} is out of range")))
    }

    /// Unix epoch seconds
    pub fn timestamp(&self) -> i64 {
        self.0.timestamp()
    }
}

impl fmt::Display for VaultTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339())
    }
}

impl Serialize for VaultTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339())
    }
}

struct VaultTimeVisitor;

impl<'de> Visitor<'de> for VaultTimeVisitor {
    type Value = VaultTime;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Unix epoch seconds as an integer or a quoted integer")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<VaultTime, E> {
        VaultTime::from_epoch_secs(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<VaultTime, E> {
        let secs = i64::try_from(v)
            .map_err(|_| E::custom(VaultError::MalformedTimestamp(v.to_string())))?;
        self.visit_i64(secs)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<VaultTime, E> {
        VaultTime::from_raw(v.as_bytes()).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for VaultTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(VaultTimeVisitor)
    }
}
