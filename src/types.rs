//! Core types for inies-dl
//!
//! Wire shapes use the remote API's camelCase field names. Name fields on
//! [`IndicatorSet`] and [`IndicatorQuantity`] arrive empty and are filled by
//! [`crate::metadata::decorate`].

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Unique identifier for a record (EPD) in the remote catalogue
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl RecordId {
    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Lightweight summary of a record, used only to drive the fetch fan-out
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordIndexEntry {
    /// Record identifier
    pub id: RecordId,
    /// Serial code shared by all versions of a declaration
    pub serial_identifier: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Classification tags
    #[serde(default)]
    pub classification_ids: Vec<i64>,
    /// Last update timestamp
    #[serde(default, with = "lenient_datetime")]
    pub last_update: Option<NaiveDateTime>,
    /// Whether the record is archived
    #[serde(default)]
    pub is_archived: Option<bool>,
}

/// Organism responsible for a declaration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponsibleOrganism {
    /// Organism name
    pub name: Option<String>,
    /// Acronym
    pub acronym: Option<String>,
    /// Country
    pub country: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Website
    pub website: Option<String>,
}

/// Product constituent of the functional unit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstituentProduct {
    /// Constituent name
    pub name: String,
    /// Quantity (absent when not declared)
    #[serde(default)]
    pub quantity: Option<f64>,
    /// Unit label
    #[serde(default)]
    pub unit: String,
    /// Unit identifier
    #[serde(default)]
    pub unit_id: Option<i64>,
    /// Constituent type code
    #[serde(default, rename = "constituantType")]
    pub constituent_type: Option<i64>,
}

/// One reported quantity of an indicator over a lifecycle phase
///
/// `indicator_id` and `phase_id` are foreign keys into the norm's descriptor
/// lists; the name fields stay `None` until resolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorQuantity {
    /// Indicator identifier
    pub indicator_id: i64,
    /// Resolved indicator name
    #[serde(default)]
    pub indicator_name: Option<String>,
    /// Resolved indicator unit
    #[serde(default)]
    pub indicator_unit: Option<String>,
    /// Phase identifier
    pub phase_id: i64,
    /// Resolved phase name
    #[serde(default)]
    pub phase_name: Option<String>,
    /// Reported quantity
    #[serde(default)]
    pub quantity: Option<f64>,
}

/// Set of indicator quantities reported under one norm
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSet {
    /// Norm identifier
    pub id: i64,
    /// Resolved norm display name
    #[serde(default)]
    pub name: Option<String>,
    /// Ordered quantities
    #[serde(default)]
    pub indicator_quantities: Vec<IndicatorQuantity>,
}

/// A complete environmental product declaration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullRecord {
    /// Record identifier (one per version)
    pub id: RecordId,
    /// Serial code shared by all versions
    pub serial_identifier: String,
    /// Display name
    pub name: String,
    /// Version label
    #[serde(default)]
    pub version: Option<String>,
    /// Issue date
    #[serde(default, with = "lenient_datetime")]
    pub issue_date: Option<NaiveDateTime>,
    /// Declaration type code
    #[serde(default)]
    pub declaration_type: Option<i64>,
    /// Declaration type label
    #[serde(default)]
    pub declaration_type_name: Option<String>,
    /// Responsible organism
    #[serde(default)]
    pub responsible_organism: ResponsibleOrganism,
    /// Commercial references (free text, may contain line breaks)
    #[serde(default)]
    pub commercial_references: Option<String>,
    /// Reference service life in years
    #[serde(default)]
    pub dvt: Option<i64>,
    /// Functional unit quantity
    #[serde(default)]
    pub uf_quantity: Option<f64>,
    /// Functional unit label
    #[serde(default)]
    pub uf_unit: Option<String>,
    /// Functional unit description
    #[serde(default)]
    pub uf_description: Option<String>,
    /// Biogenic carbon storage
    #[serde(default)]
    pub carbon_biogenic_storage: Option<f64>,
    /// Biogenic carbon storage of the packaging
    #[serde(default)]
    pub packaging_carbon_biogenic_storage: Option<f64>,
    /// A4 transport distance in km
    #[serde(default)]
    pub distance_transport_a4_km: Option<f64>,
    /// Production place
    #[serde(default)]
    pub production_place: Option<String>,
    /// French production regions
    #[serde(default)]
    pub production_region_fr: Vec<String>,
    /// Constituents of the functional unit
    #[serde(default, rename = "fuConstituantProducts")]
    pub fu_constituent_products: Vec<ConstituentProduct>,
    /// Indicator quantities
    pub indicator_set: IndicatorSet,
}

/// Orchestrator lifecycle state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorState {
    /// No batch running
    #[default]
    Idle,
    /// Fetching the record index
    Listing,
    /// Creating one fetch task per index entry
    FanningOut,
    /// Awaiting task completions
    Collecting,
    /// Batch finished
    Done,
}

impl OrchestratorState {
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            OrchestratorState::Idle => 0,
            OrchestratorState::Listing => 1,
            OrchestratorState::FanningOut => 2,
            OrchestratorState::Collecting => 3,
            OrchestratorState::Done => 4,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => OrchestratorState::Listing,
            2 => OrchestratorState::FanningOut,
            3 => OrchestratorState::Collecting,
            4 => OrchestratorState::Done,
            _ => OrchestratorState::Idle,
        }
    }
}

/// Point-in-time batch progress
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Tasks resolved so far (success or failure)
    pub completed: u64,
    /// Tasks that resolved with a failure
    pub failed: u64,
    /// Tasks created for the current batch
    pub total: u64,
}

impl ProgressSnapshot {
    /// Completion percentage (0.0 to 100.0); 100 when the batch is empty
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            return 100.0;
        }
        (self.completed as f64 / self.total as f64 * 100.0) as f32
    }
}

/// Outcome of a batch fetch
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Successfully fetched and decorated records, in completion order
    pub records: Vec<FullRecord>,
    /// Records whose retry budget was exhausted or hit a permanent error
    pub failures: Vec<crate::error::RecordFailure>,
}

/// Event emitted while a client is working
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Index listing started
    Listing {
        /// Watermark date filter, if any
        since: Option<NaiveDate>,
    },

    /// Index listing finished; fan-out is about to start
    Listed {
        /// Number of index entries (one task each)
        total: u64,
    },

    /// The session credential was refreshed
    TokenRefreshed,

    /// A record was fetched and decorated
    RecordFetched {
        /// Record ID
        id: RecordId,
        /// Tasks resolved so far
        completed: u64,
        /// Total tasks
        total: u64,
    },

    /// A record could not be fetched and was skipped
    RecordFailed {
        /// Record ID
        id: RecordId,
        /// Error message
        error: String,
        /// Tasks resolved so far
        completed: u64,
        /// Total tasks
        total: u64,
    },

    /// Batch finished
    Finished {
        /// Records fetched
        succeeded: u64,
        /// Records skipped
        failed: u64,
    },
}

/// Deserializes timestamps with or without a UTC offset
///
/// The catalogue returns local timestamps such as `2023-04-12T00:00:00`; some
/// payloads carry an offset or fractional seconds. Offsets are dropped after
/// conversion to the timestamp's local wall-clock time.
pub(crate) mod lenient_datetime {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse(s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s}"))),
        }
    }

    pub(crate) fn parse(s: &str) -> Option<NaiveDateTime> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_local());
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(dt);
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }
}
