//! Reference metadata: norms, indicators and phases
//!
//! The taxonomy is loaded once when a client is constructed and is read-only
//! afterwards. Records reference it by id; [`decorate`] performs the join and
//! returns a record with its name fields filled in.

use crate::catalogue::Catalogue;
use crate::error::{Error, Result};
use crate::types::{FullRecord, IndicatorQuantity, IndicatorSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Name given to an indicator set whose norm is not in the taxonomy
pub const UNKNOWN_NORM: &str = "Autre norme";

/// Entry of the norm list
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormSummary {
    /// Norm identifier
    pub id: i64,
    /// Display name
    pub name: String,
}

/// Indicator defined by a norm
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorDescriptor {
    /// Indicator identifier
    pub id: i64,
    /// French display name
    #[serde(default)]
    pub name_fr: Option<String>,
    /// Unit label
    #[serde(default)]
    pub unit_name: Option<String>,
}

/// Lifecycle phase defined by a norm
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseDescriptor {
    /// Phase identifier
    pub id: i64,
    /// French display name
    #[serde(default)]
    pub name_fr: Option<String>,
}

/// Indicators and phases of one norm
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NormDetail {
    /// Indicator descriptors, in server order
    #[serde(default)]
    pub indicators: Vec<IndicatorDescriptor>,
    /// Phase descriptors, in server order
    #[serde(default)]
    pub phases: Vec<PhaseDescriptor>,
}

/// Immutable snapshot of the norm taxonomy
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceMetadata {
    norm_names: BTreeMap<i64, String>,
    details: HashMap<i64, NormDetail>,
}

impl ReferenceMetadata {
    /// Build a snapshot from already-fetched parts
    pub fn from_parts(norms: Vec<NormSummary>, details: HashMap<i64, NormDetail>) -> Self {
        Self {
            norm_names: norms.into_iter().map(|n| (n.id, n.name)).collect(),
            details,
        }
    }

    /// Fetch the norm list, then the detail of every norm
    ///
    /// Any failure is reported as [`Error::MetadataLoad`]; a client cannot
    /// operate without the taxonomy.
    pub async fn load(catalogue: &Catalogue) -> Result<Self> {
        tracing::info!("fetching norms");
        let norms = catalogue
            .list_norms()
            .await
            .map_err(|e| Error::metadata(None, e))?;

        tracing::info!(norms = norms.len(), "fetching indicators and phases");
        let mut details = HashMap::with_capacity(norms.len());
        for norm in &norms {
            let detail = catalogue
                .norm_detail(norm.id)
                .await
                .map_err(|e| Error::metadata(Some(norm.id), e))?;
            tracing::debug!(
                norm_id = norm.id,
                indicators = detail.indicators.len(),
                phases = detail.phases.len(),
                "loaded norm detail"
            );
            details.insert(norm.id, detail);
        }

        Ok(Self::from_parts(norms, details))
    }

    /// Display name of a norm
    pub fn norm_name(&self, norm_id: i64) -> Option<&str> {
        self.norm_names.get(&norm_id).map(String::as_str)
    }

    /// Indicators and phases of a norm
    pub fn norm_detail(&self, norm_id: i64) -> Option<&NormDetail> {
        self.details.get(&norm_id)
    }

    /// Known norm ids, ascending
    pub fn norm_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.norm_names.keys().copied()
    }

    /// Number of norms
    pub fn len(&self) -> usize {
        self.norm_names.len()
    }

    /// Whether no norm is known
    pub fn is_empty(&self) -> bool {
        self.norm_names.is_empty()
    }
}

/// Resolve the names of a record's indicator set against the taxonomy
pub fn decorate(mut record: FullRecord, metadata: &ReferenceMetadata) -> FullRecord {
    record.indicator_set = decorate_set(&record.indicator_set, metadata);
    record
}

/// Resolve norm, indicator and phase names of an indicator set
///
/// Unknown norms get [`UNKNOWN_NORM`]. Indicator and phase names are looked up
/// in the norm's descriptor lists (first match wins); quantities without a match
/// keep their name fields unresolved.
pub fn decorate_set(set: &IndicatorSet, metadata: &ReferenceMetadata) -> IndicatorSet {
    let name = metadata
        .norm_name(set.id)
        .unwrap_or(UNKNOWN_NORM)
        .to_string();

    let detail = metadata.norm_detail(set.id);
    let indicator_quantities = set
        .indicator_quantities
        .iter()
        .map(|quantity| match detail {
            Some(detail) => resolve_quantity(quantity, detail),
            None => quantity.clone(),
        })
        .collect();

    IndicatorSet {
        id: set.id,
        name: Some(name),
        indicator_quantities,
    }
}

fn resolve_quantity(quantity: &IndicatorQuantity, detail: &NormDetail) -> IndicatorQuantity {
    let mut resolved = quantity.clone();

    if let Some(indicator) = detail
        .indicators
        .iter()
        .find(|i| i.id == quantity.indicator_id)
    {
        resolved.indicator_name = indicator.name_fr.clone();
        resolved.indicator_unit = indicator.unit_name.clone();
    }

    if let Some(phase) = detail.phases.iter().find(|p| p.id == quantity.phase_id) {
        resolved.phase_name = phase.name_fr.clone();
    }

    resolved
}
