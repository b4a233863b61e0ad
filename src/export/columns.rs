//! Column catalogue of the tabular export

/// Indicators whose quantities are pivoted into phase columns
pub const KEPT_INDICATORS: [i64; 4] = [2, 19, 45, 57];

/// Separator used when a list is collapsed into one cell
pub const LIST_SEPARATOR: &str = " ; ";

/// Phase names of the current norm and the output column each one fills
pub const PHASE_COLUMNS: [(&str, &str); 22] = [
    ("Total cycle de vie", "Total"),
    ("Étape d’utilisation", "B"),
    ("Étape de fin de vie", "C"),
    ("D-Bénéfices et charges au-delà des frontières du système", "D"),
    ("A1-Approvisionnement en matières premières", "A1"),
    ("A2-Transport", "A2"),
    ("A3-Fabrication", "A3"),
    (PRODUCTION_STAGE, "A1-A3"),
    (A4_TRANSPORT, "A4"),
    (A5_INSTALLATION, "A5"),
    (CONSTRUCTION_STAGE, "A4-A5"),
    ("B1-Utilisation", "B1"),
    ("B2-Maintenance", "B2"),
    ("B3-Réparation", "B3"),
    ("B4-Remplacement", "B4"),
    ("B5-Réhabilitation", "B5"),
    ("B6-Utilisation de l’énergie durant l’étape d’utilisation", "B6"),
    ("B7-Utilisation de l’eau durant l’étape d’utilisation", "B7"),
    ("C1-Déconstruction / démolition", "C1"),
    ("C2-Transport", "C2"),
    ("C3-Traitement des déchets", "C3"),
    ("C4-Élimination", "C4"),
];

/// Older phase names, used only when the current phase has no quantity
///
/// `(current, legacy)`
pub const LEGACY_PHASES: [(&str, &str); 4] = [
    (PRODUCTION_STAGE, "Production"),
    (A4_TRANSPORT, "Transport"),
    ("Étape d’utilisation", "Vie en oeuvre"),
    ("Étape de fin de vie", "Fin de vie"),
];

pub(crate) const PRODUCTION_STAGE: &str = "Étape de production";
pub(crate) const A4_TRANSPORT: &str = "A4-Transport";
pub(crate) const A5_INSTALLATION: &str = "A5-Processus de construction – installation";
pub(crate) const CONSTRUCTION_STAGE: &str = "Étape du processus de construction";

/// Header row, in output order
pub const HEADERS: [&str; 43] = [
    "Name_FDES",
    "ID_FDES",
    "Unique_ID_FDES_version",
    "Version",
    "Issue_Date",
    "Declaration_Type",
    "Declaration_Type_Name",
    "Norme",
    "Organisme_Name",
    "DVT",
    "UF_Quantity",
    "UF_Unit",
    "UF_Description",
    "Commercial_References",
    "Total",
    "A",
    "B",
    "C",
    "D",
    "A1",
    "A2",
    "A3",
    "A1-A3",
    "A4",
    "A5",
    "A4-A5",
    "B1",
    "B2",
    "B3",
    "B4",
    "B5",
    "B6",
    "B7",
    "C1",
    "C2",
    "C3",
    "C4",
    "CarbonBiogenicStorage",
    "Packaging_Carbone_Biogenic_Storage",
    "Distance_Transport_A4_Km",
    "Production_Place",
    "Production_Region_FR",
    "Constituant_Products",
];

/// Phase name feeding an output column, if the column is a phase column
pub fn phase_for_column(column: &str) -> Option<&'static str> {
    PHASE_COLUMNS
        .iter()
        .find(|(_, c)| *c == column)
        .map(|(phase, _)| *phase)
}
