// Search Query Model
//
// Queries are immutable once built; `to_payload` renders the wire body for
// the matching search endpoint.

use crate::domain::error::{DomainError, Result};
use crate::domain::location::Location;
use crate::domain::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Maximum number of criteria blocks accepted by the conjunction engine
pub const MAX_CRITERIA_BLOCKS: usize = 10;

/// Minimum number of criteria blocks for a conjunction search
pub const MIN_CRITERIA_BLOCKS: usize = 2;

/// Default conjunction epoch search precision (seconds)
pub const DEFAULT_EPOCH_SEARCH_PRECISION: u32 = 60;

/// Inclusive UTC time window of a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(with = "timestamp::wire")]
    pub start: DateTime<Utc>,
    #[serde(with = "timestamp::wire")]
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        if self.end < self.start {
            return Err(DomainError::InvalidRequestShape(format!(
                "end {} is before start {}",
                timestamp::format(&self.end),
                timestamp::format(&self.start)
            )));
        }
        Ok(())
    }
}

/// Comparison operator of a metadata filter expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataOperator {
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "between")]
    Between,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not in")]
    NotIn,
}

/// How the expressions of a metadata filter are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

/// One `key operator values` condition on record metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilterExpression {
    pub key: String,
    #[serde(deserialize_with = "one_or_many")]
    pub values: Vec<String>,
    pub operator: MetadataOperator,
}

impl MetadataFilterExpression {
    pub fn new<I, S>(key: impl Into<String>, values: I, operator: MetadataOperator) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
            operator,
        }
    }

    /// Expression with a single value (sent as a one-element list)
    pub fn single(key: impl Into<String>, value: impl Into<String>, operator: MetadataOperator) -> Self {
        Self::new(key, [value.into()], operator)
    }
}

fn one_or_many<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<Value>),
        One(Value),
    }

    fn stringify(v: Value) -> String {
        match v {
            Value::String(s) => s,
            other => other.to_string(),
        }
    }

    Ok(match OneOrMany::deserialize(d)? {
        OneOrMany::Many(values) => values.into_iter().map(stringify).collect(),
        OneOrMany::One(value) => vec![stringify(value)],
    })
}

/// A set of metadata expressions joined by one logical operator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilter {
    #[serde(default)]
    pub logical_operator: LogicalOperator,
    #[serde(default)]
    pub expressions: Vec<MetadataFilterExpression>,
}

impl MetadataFilter {
    pub fn new(logical_operator: LogicalOperator, expressions: Vec<MetadataFilterExpression>) -> Self {
        Self {
            logical_operator,
            expressions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    fn to_wire(&self) -> Value {
        json!({
            "logical_operator": self.logical_operator,
            "expressions": self.expressions,
        })
    }
}

/// Wire form of an optional filter in a top-level search: `{}` when unset
fn filter_or_empty(filter: &Option<MetadataFilter>) -> Value {
    match filter {
        Some(f) if !f.is_empty() => f.to_wire(),
        _ => json!({}),
    }
}

/// Wire form of an optional filter in a criteria block: `null` when unset
fn filter_or_null(filter: &Option<MetadataFilter>) -> Value {
    match filter {
        Some(f) if !f.is_empty() => f.to_wire(),
        _ => Value::Null,
    }
}

fn has_filter(filter: &Option<MetadataFilter>) -> bool {
    filter.as_ref().map(|f| !f.is_empty()).unwrap_or(false)
}

// ============================================================================
// Ephemeris
// ============================================================================

/// Ephemeris search criteria
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EphemerisQuery {
    #[serde(flatten)]
    pub time_range: TimeRange,
    #[serde(default)]
    pub programs: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub instrument_types: Vec<String>,
    #[serde(default)]
    pub metadata_filter: Option<MetadataFilter>,
    /// Optional response-shaping body; when set, data is fetched with POST
    #[serde(default)]
    pub response_format: Option<Value>,
}

impl EphemerisQuery {
    pub fn new(time_range: TimeRange) -> Self {
        Self {
            time_range,
            programs: Vec::new(),
            platforms: Vec::new(),
            instrument_types: Vec::new(),
            metadata_filter: None,
            response_format: None,
        }
    }

    pub fn with_programs<S: Into<String>>(mut self, programs: impl IntoIterator<Item = S>) -> Self {
        self.programs = programs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_platforms<S: Into<String>>(mut self, platforms: impl IntoIterator<Item = S>) -> Self {
        self.platforms = platforms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_instrument_types<S: Into<String>>(
        mut self,
        instrument_types: impl IntoIterator<Item = S>,
    ) -> Self {
        self.instrument_types = instrument_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata_filter(mut self, filter: MetadataFilter) -> Self {
        self.metadata_filter = Some(filter);
        self
    }

    pub fn with_response_format(mut self, format: Value) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.time_range.validate()?;
        if self.programs.is_empty()
            && self.platforms.is_empty()
            && self.instrument_types.is_empty()
            && !has_filter(&self.metadata_filter)
        {
            return Err(DomainError::InvalidRequestShape(
                "at least one filter criteria besides start and end must be specified".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_payload(&self) -> Result<Value> {
        self.validate()?;
        Ok(json!({
            "data_sources": {
                "programs": self.programs,
                "platforms": self.platforms,
                "instrument_types": self.instrument_types,
                "ephemeris_metadata_filters": filter_or_empty(&self.metadata_filter),
            },
            "start": timestamp::format(&self.time_range.start),
            "end": timestamp::format(&self.time_range.end),
        }))
    }
}

// ============================================================================
// Data products
// ============================================================================

/// Kind of data product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataProductType {
    Keogram,
    Montage,
    Movie,
    SummaryPlot,
    DataAvailability,
}

/// Data product search criteria
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataProductQuery {
    #[serde(flatten)]
    pub time_range: TimeRange,
    #[serde(default)]
    pub programs: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub instrument_types: Vec<String>,
    #[serde(default)]
    pub data_product_types: Vec<DataProductType>,
    #[serde(default)]
    pub metadata_filter: Option<MetadataFilter>,
    #[serde(default)]
    pub response_format: Option<Value>,
}

impl DataProductQuery {
    pub fn new(time_range: TimeRange) -> Self {
        Self {
            time_range,
            programs: Vec::new(),
            platforms: Vec::new(),
            instrument_types: Vec::new(),
            data_product_types: Vec::new(),
            metadata_filter: None,
            response_format: None,
        }
    }

    pub fn with_programs<S: Into<String>>(mut self, programs: impl IntoIterator<Item = S>) -> Self {
        self.programs = programs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_platforms<S: Into<String>>(mut self, platforms: impl IntoIterator<Item = S>) -> Self {
        self.platforms = platforms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_instrument_types<S: Into<String>>(
        mut self,
        instrument_types: impl IntoIterator<Item = S>,
    ) -> Self {
        self.instrument_types = instrument_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_data_product_types(mut self, types: impl IntoIterator<Item = DataProductType>) -> Self {
        self.data_product_types = types.into_iter().collect();
        self
    }

    pub fn with_metadata_filter(mut self, filter: MetadataFilter) -> Self {
        self.metadata_filter = Some(filter);
        self
    }

    pub fn with_response_format(mut self, format: Value) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.time_range.validate()?;
        if self.programs.is_empty()
            && self.platforms.is_empty()
            && self.instrument_types.is_empty()
            && self.data_product_types.is_empty()
            && !has_filter(&self.metadata_filter)
        {
            return Err(DomainError::InvalidRequestShape(
                "at least one filter criteria besides start and end must be specified".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_payload(&self) -> Result<Value> {
        self.validate()?;
        Ok(json!({
            "data_sources": {
                "programs": self.programs,
                "platforms": self.platforms,
                "instrument_types": self.instrument_types,
                "data_product_metadata_filters": filter_or_empty(&self.metadata_filter),
            },
            "start": timestamp::format(&self.time_range.start),
            "end": timestamp::format(&self.time_range.end),
            "data_product_type_filters": self.data_product_types,
        }))
    }
}

// ============================================================================
// Conjunctions
// ============================================================================

/// Ground or space instrument group of a conjunction search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaBlock {
    #[serde(default)]
    pub programs: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub instrument_types: Vec<String>,
    #[serde(default)]
    pub metadata_filter: Option<MetadataFilter>,
}

impl CriteriaBlock {
    fn to_wire(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("programs".into(), json!(self.programs));
        m.insert("platforms".into(), json!(self.platforms));
        m.insert("instrument_types".into(), json!(self.instrument_types));
        m.insert(
            "ephemeris_metadata_filters".into(),
            filter_or_null(&self.metadata_filter),
        );
        m
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    Northern,
    Southern,
}

/// Space instrument group, optionally restricted to a hemisphere
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceCriteriaBlock {
    #[serde(flatten)]
    pub criteria: CriteriaBlock,
    #[serde(default)]
    pub hemisphere: Vec<Hemisphere>,
}

/// Event group; the program is always `events`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsCriteriaBlock {
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub instrument_types: Vec<String>,
    #[serde(default)]
    pub metadata_filter: Option<MetadataFilter>,
}

/// Group of caller-supplied fixed locations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdhocCriteriaBlock {
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConjunctionType {
    Nbtrace,
    Sbtrace,
    Geographic,
}

/// Maximum distance (km) between criteria blocks
///
/// `Uniform` applies one distance to every pair. `PerPair` is keyed
/// `"<block>-<block>"` (e.g. `"ground1-space1"`); pairs left out are sent
/// as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaxDistances {
    Uniform(f64),
    PerPair(BTreeMap<String, f64>),
}

fn default_conjunction_types() -> Vec<ConjunctionType> {
    vec![ConjunctionType::Nbtrace]
}

fn default_epoch_search_precision() -> u32 {
    DEFAULT_EPOCH_SEARCH_PRECISION
}

/// Conjunction search criteria
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConjunctionQuery {
    #[serde(flatten)]
    pub time_range: TimeRange,
    #[serde(default)]
    pub ground: Vec<CriteriaBlock>,
    #[serde(default)]
    pub space: Vec<SpaceCriteriaBlock>,
    #[serde(default)]
    pub events: Vec<EventsCriteriaBlock>,
    #[serde(default)]
    pub adhoc: Vec<AdhocCriteriaBlock>,
    #[serde(default = "default_conjunction_types")]
    pub conjunction_types: Vec<ConjunctionType>,
    pub max_distances: MaxDistances,
    #[serde(default = "default_epoch_search_precision")]
    pub epoch_search_precision: u32,
    #[serde(default)]
    pub response_format: Option<Value>,
}

impl ConjunctionQuery {
    pub fn new(time_range: TimeRange, max_distances: MaxDistances) -> Self {
        Self {
            time_range,
            ground: Vec::new(),
            space: Vec::new(),
            events: Vec::new(),
            adhoc: Vec::new(),
            conjunction_types: default_conjunction_types(),
            max_distances,
            epoch_search_precision: DEFAULT_EPOCH_SEARCH_PRECISION,
            response_format: None,
        }
    }

    pub fn with_ground(mut self, block: CriteriaBlock) -> Self {
        self.ground.push(block);
        self
    }

    pub fn with_space(mut self, block: SpaceCriteriaBlock) -> Self {
        self.space.push(block);
        self
    }

    pub fn with_events(mut self, block: EventsCriteriaBlock) -> Self {
        self.events.push(block);
        self
    }

    pub fn with_adhoc(mut self, block: AdhocCriteriaBlock) -> Self {
        self.adhoc.push(block);
        self
    }

    pub fn with_conjunction_types(mut self, types: impl IntoIterator<Item = ConjunctionType>) -> Self {
        self.conjunction_types = types.into_iter().collect();
        self
    }

    pub fn with_response_format(mut self, format: Value) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn block_count(&self) -> usize {
        self.ground.len() + self.space.len() + self.events.len() + self.adhoc.len()
    }

    /// Names of all criteria blocks in wire order (`ground1`, `space1`, ...)
    pub fn block_names(&self) -> Vec<String> {
        let groups = [
            ("ground", self.ground.len()),
            ("space", self.space.len()),
            ("events", self.events.len()),
            ("adhoc", self.adhoc.len()),
        ];
        groups
            .iter()
            .flat_map(|(prefix, n)| (1..=*n).map(move |i| format!("{}{}", prefix, i)))
            .collect()
    }

    /// Every unordered pair of block names, keyed `"a-b"` in wire order
    fn pair_keys(names: &[String]) -> Vec<(String, String, String)> {
        let mut pairs = Vec::new();
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                pairs.push((format!("{}-{}", a, b), a.clone(), b.clone()));
            }
        }
        pairs
    }

    /// Expand `max_distances` into the full per-pair map sent on the wire
    pub fn resolve_max_distances(&self) -> Result<Map<String, Value>> {
        let names = self.block_names();
        let pairs = Self::pair_keys(&names);

        match &self.max_distances {
            MaxDistances::Uniform(d) => Ok(pairs.into_iter().map(|(key, _, _)| (key, json!(d))).collect()),
            MaxDistances::PerPair(given) => {
                let mut out: Map<String, Value> =
                    pairs.iter().map(|(key, _, _)| (key.clone(), Value::Null)).collect();

                for (raw_key, distance) in given {
                    let invalid = || {
                        DomainError::InvalidRequestShape(format!(
                            "max distance key '{}' does not name a pair of criteria blocks",
                            raw_key
                        ))
                    };
                    let (left, right) = raw_key.split_once('-').ok_or_else(invalid)?;
                    let (left, right) = (left.trim(), right.trim());

                    let key = pairs
                        .iter()
                        .find(|(_, a, b)| (a == left && b == right) || (a == right && b == left))
                        .map(|(key, _, _)| key.clone())
                        .ok_or_else(invalid)?;
                    out.insert(key, json!(distance));
                }
                Ok(out)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.time_range.validate()?;
        let count = self.block_count();
        if count < MIN_CRITERIA_BLOCKS {
            return Err(DomainError::InvalidRequestShape(format!(
                "at least {} criteria blocks are required, got {}",
                MIN_CRITERIA_BLOCKS, count
            )));
        }
        if count > MAX_CRITERIA_BLOCKS {
            return Err(DomainError::InvalidRequestShape(format!(
                "number of criteria blocks exceeds {}, got {}",
                MAX_CRITERIA_BLOCKS, count
            )));
        }
        if self.conjunction_types.is_empty() {
            return Err(DomainError::InvalidRequestShape(
                "at least one conjunction type must be specified".to_string(),
            ));
        }
        self.resolve_max_distances().map(|_| ())
    }

    pub fn to_payload(&self) -> Result<Value> {
        self.validate()?;

        let ground: Vec<Value> = self.ground.iter().map(|b| Value::Object(b.to_wire())).collect();

        let space: Vec<Value> = self
            .space
            .iter()
            .map(|b| {
                let mut m = b.criteria.to_wire();
                m.insert("hemisphere".into(), json!(b.hemisphere));
                Value::Object(m)
            })
            .collect();

        let events: Vec<Value> = self
            .events
            .iter()
            .map(|b| {
                json!({
                    "programs": ["events"],
                    "platforms": b.platforms,
                    "instrument_types": b.instrument_types,
                    "ephemeris_metadata_filters": filter_or_null(&b.metadata_filter),
                })
            })
            .collect();

        let adhoc: Vec<Value> = self
            .adhoc
            .iter()
            .map(|b| json!({ "locations": b.locations }))
            .collect();

        Ok(json!({
            "start": timestamp::format(&self.time_range.start),
            "end": timestamp::format(&self.time_range.end),
            "ground": ground,
            "space": space,
            "events": events,
            "adhoc": adhoc,
            "conjunction_types": self.conjunction_types,
            "max_distances": self.resolve_max_distances()?,
            "epoch_search_precision": self.epoch_search_precision,
        }))
    }
}
