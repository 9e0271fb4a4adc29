// Geographic coordinate pair

use crate::domain::error::{DomainError, Result};
use serde::{de, Deserialize, Deserializer, Serialize};

/// A `{lat, lon}` pair. Both fields are always present together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build from two optional halves
    ///
    /// Returns `Ok(None)` when both are absent and `PartialLocation` when
    /// only one is present.
    pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Result<Option<Self>> {
        match (lat, lon) {
            (Some(lat), Some(lon)) => Ok(Some(Self { lat, lon })),
            (None, None) => Ok(None),
            _ => Err(DomainError::PartialLocation),
        }
    }
}

#[derive(Deserialize)]
struct RawLocation {
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

/// Deserialize a nullable coordinate object
///
/// `null`, a missing field, and `{lat: null, lon: null}` all map to `None`.
/// An object carrying only one of the two halves is rejected.
pub fn deserialize_optional<'de, D>(d: D) -> std::result::Result<Option<Location>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawLocation>::deserialize(d)? {
        Some(raw) => Location::from_parts(raw.lat, raw.lon).map_err(de::Error::custom),
        None => Ok(None),
    }
}
