// Wire timestamp format
//
// The service renders all timestamps as naive UTC `YYYY-MM-DDTHH:MM:SS`.

use crate::domain::error::{DomainError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Format used for every timestamp sent to or received from the service
pub const WIRE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Render a timestamp in wire format (sub-second precision is dropped)
pub fn format(ts: &DateTime<Utc>) -> String {
    ts.format(WIRE_TIMESTAMP_FORMAT).to_string()
}

/// Parse a wire timestamp, falling back to RFC 3339
pub fn parse(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, WIRE_TIMESTAMP_FORMAT) {
        return Ok(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DomainError::InvalidTimestamp(s.to_string()))
}

/// `#[serde(with = "wire")]` for `DateTime<Utc>` fields
pub mod wire {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse(&raw).map_err(de::Error::custom)
    }
}

/// `#[serde(with = "wire_opt")]` for `Option<DateTime<Utc>>` fields
pub mod wire_opt {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => s.serialize_str(&super::format(ts)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) => super::parse(&raw).map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}
