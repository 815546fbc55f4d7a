//! Column layout of the persisted tables and the forward migrations applied
//! when older files are opened.

use crate::table::{Row, Table, cell};
use leadflow_core::stage::{self, Stage};
use tracing::warn;

pub const LEAD_COLUMNS: &[&str] = &[
    "id_lead",
    "fecha_registro",
    "hora_registro",
    "nombre",
    "apellidos",
    "genero",
    "edad",
    "celular",
    "telefono",
    "correo",
    "interes_curso",
    "como_enteraste",
    "lead_status",
    "funnel_etapas",
    "fecha_ultimo_contacto",
    "observaciones",
    "owner",
    "proxima_accion_fecha",
    "proxima_accion_desc",
    "lead_score",
    "probabilidad_cierre",
    "monto_estimado",
    "motivo_perdida",
    "fecha_entrada_etapa",
];

/// Values used when a declared lead column is missing from the file.
pub const LEAD_DEFAULTS: &[(&str, &str)] = &[("lead_score", "0"), ("probabilidad_cierre", "0.2")];

pub const INTERACTION_COLUMNS: &[&str] = &[
    "id_seguimiento",
    "id_lead",
    "fecha",
    "hora",
    "etapa",
    "proxima_accion_fecha",
    "tipo_mensaje",
    "estado_mensaje",
    "canal",
    "atendido_por",
    "observaciones",
];

pub const CREDENTIAL_COLUMNS: &[&str] = &["username", "name", "role", "pass_hash"];

pub const STAGE_COLUMNS: &[&str] = &["stage"];

/// Columns of the filtered lead export.
pub const EXPORT_COLUMNS: &[&str] = &[
    "id_lead",
    "nombre",
    "apellidos",
    "genero",
    "celular",
    "correo",
    "interes_curso",
    "como_enteraste",
    "lead_status",
    "owner",
    "proxima_accion_fecha",
    "proxima_accion_desc",
    "fecha_ultimo_contacto",
    "lead_score",
];

const LEGACY_GENDER_COLUMN: &str = "alias";
const LEGACY_STAGE_COLUMN: &str = "etapa";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchemaVersion {
    /// Leads carry `alias` instead of `genero`; the stage table uses `etapa`
    /// with Spanish labels.
    V1,
    V2,
}

impl SchemaVersion {
    pub const CURRENT: SchemaVersion = SchemaVersion::V2;
}

pub fn lead_schema_version(table: &Table) -> SchemaVersion {
    if table.has_column(LEGACY_GENDER_COLUMN) && !table.has_column("genero") {
        SchemaVersion::V1
    } else {
        SchemaVersion::V2
    }
}

pub fn stage_schema_version(table: &Table) -> SchemaVersion {
    if table.has_column(LEGACY_STAGE_COLUMN) && !table.has_column("stage") {
        SchemaVersion::V1
    } else {
        SchemaVersion::V2
    }
}

/// Bring a leads table to the current layout. Returns true when anything
/// other than column order changed.
pub fn migrate_leads(table: &mut Table) -> bool {
    let migrated = lead_schema_version(table) < SchemaVersion::CURRENT;
    if migrated {
        warn!("migrating leads table: renaming `alias` to `genero`");
        table.rename_column(LEGACY_GENDER_COLUMN, "genero");
    }
    let missing = LEAD_COLUMNS.iter().any(|c| !table.has_column(c));
    table.conform(LEAD_COLUMNS, LEAD_DEFAULTS);
    migrated || missing
}

/// Bring a stage lookup table to the current layout: a single `stage`
/// column of distinct canonical tokens. Returns true when it changed.
pub fn migrate_stages(table: &mut Table) -> bool {
    let before = table.clone();
    let source = match stage_schema_version(table) {
        SchemaVersion::V1 => {
            warn!("migrating stage table: normalizing legacy `etapa` column");
            LEGACY_STAGE_COLUMN
        }
        SchemaVersion::V2 => "stage",
    };

    let mut stages: Vec<Stage> = Vec::new();
    if table.has_column(source) {
        for row in &table.rows {
            let value = stage::normalize(cell(row, source));
            if !stages.contains(&value) {
                stages.push(value);
            }
        }
    }
    if stages.is_empty() {
        stages = Stage::ALL.to_vec();
    }

    *table = stage_table(&stages);
    *table != before
}

pub fn stage_table(stages: &[Stage]) -> Table {
    let mut table = Table::with_headers(STAGE_COLUMNS);
    table.rows = stages
        .iter()
        .map(|s| Row::from([("stage".to_string(), s.as_str().to_string())]))
        .collect();
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|values| {
                    headers
                        .iter()
                        .zip(values.iter())
                        .map(|(h, v)| (h.to_string(), v.to_string()))
                        .collect()
                })
                .collect(),
        }
    }

    #[test]
    fn alias_column_becomes_gender() {
        let mut leads = table(&["id_lead", "nombre", "alias"], &[&["1", "Ana", "Mujer"]]);
        assert_eq!(lead_schema_version(&leads), SchemaVersion::V1);

        assert!(migrate_leads(&mut leads));
        assert_eq!(lead_schema_version(&leads), SchemaVersion::V2);
        assert!(!leads.has_column("alias"));
        assert_eq!(cell(&leads.rows[0], "genero"), "Mujer");
        assert_eq!(cell(&leads.rows[0], "probabilidad_cierre"), "0.2");
        assert_eq!(cell(&leads.rows[0], "lead_score"), "0");
        assert_eq!(leads.headers.len(), LEAD_COLUMNS.len());
    }

    #[test]
    fn alias_is_kept_when_gender_already_exists() {
        let mut leads = table(&["id_lead", "genero", "alias"], &[&["1", "Hombre", "Beto"]]);
        migrate_leads(&mut leads);
        assert_eq!(cell(&leads.rows[0], "genero"), "Hombre");
        assert_eq!(leads.headers.last().map(String::as_str), Some("alias"));
    }

    #[test]
    fn current_leads_table_is_unchanged() {
        let mut leads = Table::with_headers(LEAD_COLUMNS);
        assert!(!migrate_leads(&mut leads));
    }

    #[test]
    fn legacy_stage_table_is_normalized() {
        let mut stages = table(
            &["etapa"],
            &[&["Contactado"], &["Interesado"], &["Inscrito"], &["Contactado"]],
        );
        assert!(migrate_stages(&mut stages));
        let tokens: Vec<&str> = stages.rows.iter().map(|r| cell(r, "stage")).collect();
        assert_eq!(tokens, vec!["Contacted", "SQL", "Won"]);
    }

    #[test]
    fn unusable_stage_table_falls_back_to_all_stages() {
        let mut stages = table(&["other"], &[&["x"]]);
        assert!(migrate_stages(&mut stages));
        assert_eq!(stages.rows.len(), Stage::ALL.len());
    }

    #[test]
    fn canonical_stage_table_is_unchanged() {
        let mut stages = stage_table(&Stage::ALL);
        assert!(!migrate_stages(&mut stages));
    }
}
