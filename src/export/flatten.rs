//! Flattening of decorated records into export rows
//!
//! One row per record. Indicator quantities are filtered to
//! [`KEPT_INDICATORS`], then pivoted on their resolved phase name; the first
//! quantity seen for a phase wins, even when it is null.

use super::columns::{
    A4_TRANSPORT, A5_INSTALLATION, CONSTRUCTION_STAGE, HEADERS, KEPT_INDICATORS, LEGACY_PHASES,
    LIST_SEPARATOR, PRODUCTION_STAGE, phase_for_column,
};
use crate::types::{ConstituentProduct, FullRecord};
use std::collections::HashMap;

/// A record reduced to the cells of one export row
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlatRow {
    /// Display name
    pub name: String,
    /// Serial identifier shared by all versions
    pub serial_identifier: String,
    /// Identifier of this version
    pub id: i64,
    /// Version label
    pub version: Option<String>,
    /// Issue date formatted `YYYY/MM/DD`
    pub issue_date: Option<String>,
    /// Declaration type code
    pub declaration_type: Option<i64>,
    /// Declaration type label
    pub declaration_type_name: Option<String>,
    /// Resolved norm name
    pub norm: Option<String>,
    /// Responsible organism name
    pub organism: Option<String>,
    /// Reference service life
    pub dvt: Option<i64>,
    /// Functional unit quantity
    pub uf_quantity: Option<f64>,
    /// Functional unit label
    pub uf_unit: Option<String>,
    /// Functional unit description
    pub uf_description: Option<String>,
    /// Commercial references on one line
    pub commercial_references: Option<String>,
    /// Pivoted quantities keyed by phase name, legacy names already merged
    pub phases: HashMap<String, f64>,
    /// Aggregated A stage
    pub a: f64,
    /// Biogenic carbon storage
    pub carbon_biogenic_storage: Option<f64>,
    /// Biogenic carbon storage of the packaging
    pub packaging_carbon_biogenic_storage: Option<f64>,
    /// A4 transport distance in km
    pub distance_transport_a4_km: Option<f64>,
    /// Production place
    pub production_place: Option<String>,
    /// Production regions joined into one cell
    pub production_regions: Option<String>,
    /// Constituents joined into one cell
    pub constituents: String,
}

impl FlatRow {
    /// Quantity pivoted for a phase name
    pub fn phase(&self, name: &str) -> Option<f64> {
        self.phases.get(name).copied()
    }

    /// Cells in [`HEADERS`] order
    pub fn cells(&self) -> Vec<String> {
        HEADERS.iter().map(|column| self.cell(column)).collect()
    }

    fn cell(&self, column: &str) -> String {
        if let Some(phase) = phase_for_column(column) {
            return number(self.phase(phase));
        }

        match column {
            "Name_FDES" => self.name.clone(),
            "ID_FDES" => self.serial_identifier.clone(),
            "Unique_ID_FDES_version" => self.id.to_string(),
            "Version" => text(&self.version),
            "Issue_Date" => text(&self.issue_date),
            "Declaration_Type" => integer(self.declaration_type),
            "Declaration_Type_Name" => text(&self.declaration_type_name),
            "Norme" => text(&self.norm),
            "Organisme_Name" => text(&self.organism),
            "DVT" => integer(self.dvt),
            "UF_Quantity" => number(self.uf_quantity),
            "UF_Unit" => text(&self.uf_unit),
            "UF_Description" => text(&self.uf_description),
            "Commercial_References" => text(&self.commercial_references),
            "A" => self.a.to_string(),
            "CarbonBiogenicStorage" => number(self.carbon_biogenic_storage),
            "Packaging_Carbone_Biogenic_Storage" => number(self.packaging_carbon_biogenic_storage),
            "Distance_Transport_A4_Km" => number(self.distance_transport_a4_km),
            "Production_Place" => text(&self.production_place),
            "Production_Region_FR" => text(&self.production_regions),
            "Constituant_Products" => self.constituents.clone(),
            _ => String::new(),
        }
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn integer(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Flatten decorated records, preserving their order
pub fn flatten(records: &[FullRecord]) -> Vec<FlatRow> {
    records.iter().map(flatten_one).collect()
}

/// Flatten a single decorated record
pub fn flatten_one(record: &FullRecord) -> FlatRow {
    let phases = merge_legacy(pivot(record));
    let a = aggregate_a(&phases);

    FlatRow {
        name: record.name.clone(),
        serial_identifier: record.serial_identifier.clone(),
        id: record.id.get(),
        version: record.version.clone(),
        issue_date: record
            .issue_date
            .map(|d| d.format("%Y/%m/%d").to_string()),
        declaration_type: record.declaration_type,
        declaration_type_name: record.declaration_type_name.clone(),
        norm: record.indicator_set.name.clone(),
        organism: record.responsible_organism.name.clone(),
        dvt: record.dvt,
        uf_quantity: record.uf_quantity,
        uf_unit: record.uf_unit.clone(),
        uf_description: record.uf_description.clone(),
        commercial_references: record.commercial_references.as_deref().map(single_line),
        phases,
        a,
        carbon_biogenic_storage: record.carbon_biogenic_storage,
        packaging_carbon_biogenic_storage: record.packaging_carbon_biogenic_storage,
        distance_transport_a4_km: record.distance_transport_a4_km,
        production_place: record.production_place.clone(),
        production_regions: join_regions(&record.production_region_fr),
        constituents: join_constituents(&record.fu_constituent_products),
    }
}

/// First quantity seen per phase, kept even when it is null
fn pivot(record: &FullRecord) -> HashMap<String, Option<f64>> {
    let mut phases = HashMap::new();
    for quantity in &record.indicator_set.indicator_quantities {
        if !KEPT_INDICATORS.contains(&quantity.indicator_id) {
            continue;
        }
        if let Some(phase) = &quantity.phase_name {
            phases.entry(phase.clone()).or_insert(quantity.quantity);
        }
    }
    phases
}

/// Fill empty current phases from their legacy names, then drop null cells
fn merge_legacy(mut phases: HashMap<String, Option<f64>>) -> HashMap<String, f64> {
    for (current, legacy) in LEGACY_PHASES {
        if phases.get(current).copied().flatten().is_some() {
            continue;
        }
        if let Some(value) = phases.get(legacy).copied().flatten() {
            phases.insert(current.to_string(), Some(value));
        }
    }
    phases
        .into_iter()
        .filter_map(|(phase, value)| value.map(|v| (phase, v)))
        .collect()
}

/// `max(A1-A3 + A4-A5, A1-A3 + A4 + A5)` with missing phases counted as zero
fn aggregate_a(phases: &HashMap<String, f64>) -> f64 {
    let get = |name: &str| phases.get(name).copied().unwrap_or(0.0);
    let production = get(PRODUCTION_STAGE);
    let combined = production + get(CONSTRUCTION_STAGE);
    let detailed = production + get(A4_TRANSPORT) + get(A5_INSTALLATION);
    combined.max(detailed)
}

fn single_line(text: &str) -> String {
    text.replace("\r\n", LIST_SEPARATOR)
        .replace(['\r', '\n'], LIST_SEPARATOR)
}

fn join_regions(regions: &[String]) -> Option<String> {
    if regions.is_empty() {
        None
    } else {
        Some(regions.join(LIST_SEPARATOR))
    }
}

fn join_constituents(products: &[ConstituentProduct]) -> String {
    products
        .iter()
        .map(|p| {
            let mut parts = vec![p.name.clone()];
            if let Some(quantity) = p.quantity {
                parts.push(quantity.to_string());
            }
            if !p.unit.is_empty() {
                parts.push(p.unit.clone());
            }
            parts.join(" ")
        })
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}
