// Result Records
//
// Typed rows returned by `GET <request_url>/data`. Unknown fields are
// ignored so new server-side columns do not break older clients.

use crate::domain::location::{self, Location};
use crate::domain::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity of the program/platform/instrument a row came from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    #[serde(default)]
    pub identifier: Option<i64>,
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub instrument_type: Option<String>,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub maintainers: Option<Vec<String>>,
    #[serde(default)]
    pub ephemeris_metadata_schema: Option<Vec<Value>>,
    #[serde(default)]
    pub data_product_metadata_schema: Option<Vec<Value>>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// One ephemeris position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EphemerisRecord {
    pub data_source: DataSource,
    #[serde(with = "timestamp::wire")]
    pub epoch: DateTime<Utc>,
    #[serde(default, deserialize_with = "location::deserialize_optional")]
    pub location_geo: Option<Location>,
    #[serde(default, deserialize_with = "location::deserialize_optional")]
    pub location_gsm: Option<Location>,
    #[serde(default, deserialize_with = "location::deserialize_optional")]
    pub nbtrace: Option<Location>,
    #[serde(default, deserialize_with = "location::deserialize_optional")]
    pub sbtrace: Option<Location>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// One data product (keogram, movie, ...) covering a time range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataProductRecord {
    pub data_source: DataSource,
    pub data_product_type: String,
    #[serde(with = "timestamp::wire")]
    pub start: DateTime<Utc>,
    #[serde(with = "timestamp::wire")]
    pub end: DateTime<Utc>,
    pub url: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Sub-interval of a conjunction involving a particular pair of sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConjunctionEvent {
    #[serde(with = "timestamp::wire")]
    pub start: DateTime<Utc>,
    #[serde(with = "timestamp::wire")]
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub e1_source: Option<Value>,
    #[serde(default)]
    pub e2_source: Option<Value>,
    #[serde(default)]
    pub min_distance: Option<f64>,
    #[serde(default)]
    pub max_distance: Option<f64>,
}

/// One conjunction between two or more data sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConjunctionRecord {
    pub conjunction_type: String,
    #[serde(with = "timestamp::wire")]
    pub start: DateTime<Utc>,
    #[serde(with = "timestamp::wire")]
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub min_distance: Option<f64>,
    #[serde(default)]
    pub max_distance: Option<f64>,
    #[serde(default, with = "timestamp::wire_opt")]
    pub closest_epoch: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::wire_opt")]
    pub farthest_epoch: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data_sources: Vec<DataSource>,
    #[serde(default)]
    pub events: Vec<ConjunctionEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_ephemeris_row() {
        let row = json!({
            "data_source": {
                "identifier": 3,
                "program": "swarm",
                "platform": "swarma",
                "instrument_type": "footprint",
                "source_type": "leo"
            },
            "epoch": "2020-01-01T00:05:00",
            "location_geo": {"lat": 51.05, "lon": -114.07},
            "location_gsm": null,
            "nbtrace": {"lat": 52.0, "lon": -113.5},
            "metadata": {"nbtrace_region": "north auroral oval"}
        });

        let rec: EphemerisRecord = serde_json::from_value(row).unwrap();
        assert_eq!(rec.epoch, Utc.with_ymd_and_hms(2020, 1, 1, 0, 5, 0).unwrap());
        assert_eq!(rec.location_geo, Some(Location { lat: 51.05, lon: -114.07 }));
        assert_eq!(rec.location_gsm, None);
        assert_eq!(rec.sbtrace, None);
        assert_eq!(rec.data_source.program.as_deref(), Some("swarm"));
        assert_eq!(rec.metadata["nbtrace_region"], "north auroral oval");
    }

    #[test]
    fn test_ephemeris_row_with_partial_location_is_rejected() {
        let row = json!({
            "data_source": {},
            "epoch": "2020-01-01T00:05:00",
            "location_geo": {"lat": 51.05, "lon": null}
        });
        let res: Result<EphemerisRecord, _> = serde_json::from_value(row);
        assert!(res.is_err());
    }

    #[test]
    fn test_data_product_row() {
        let row = json!({
            "data_source": {"program": "trex", "platform": "gillam", "instrument_type": "RGB ASI"},
            "data_product_type": "keogram",
            "start": "2021-11-04T00:00:00",
            "end": "2021-11-04T23:59:59",
            "url": "https://data.phys.ucalgary.ca/keogram.jpg",
            "metadata": {}
        });

        let rec: DataProductRecord = serde_json::from_value(row).unwrap();
        assert_eq!(rec.data_product_type, "keogram");
        assert_eq!(rec.end, Utc.with_ymd_and_hms(2021, 11, 4, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_conjunction_row() {
        let row = json!({
            "conjunction_type": "nbtrace",
            "start": "2020-01-01T00:00:00",
            "end": "2020-01-01T00:03:00",
            "min_distance": 120.5,
            "max_distance": 410.0,
            "closest_epoch": "2020-01-01T00:01:00",
            "farthest_epoch": null,
            "data_sources": [{"program": "themis-asi"}, {"program": "swarm"}],
            "events": [
                {"start": "2020-01-01T00:00:00", "end": "2020-01-01T00:03:00", "min_distance": 120.5}
            ]
        });

        let rec: ConjunctionRecord = serde_json::from_value(row).unwrap();
        assert_eq!(
            rec.closest_epoch,
            Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 1, 0).unwrap())
        );
        assert_eq!(rec.farthest_epoch, None);
        assert_eq!(rec.data_sources.len(), 2);
        assert_eq!(rec.events[0].min_distance, Some(120.5));
    }
}
