//! The lead table.

use crate::Mutation;
use crate::codec::{decode_date, decode_time, encode_date, encode_time};
use crate::error::StoreError;
use crate::schema::{LEAD_COLUMNS, migrate_leads};
use crate::table::{Row, Table, cell, merge_row, read_or_create, read_table, write_table};
use chrono::NaiveDateTime;
use leadflow_core::lead::next_sequential_id;
use leadflow_core::validate::{validate_choices, validate_lead, validate_patch_choices};
use leadflow_core::{Catalog, Lead, LeadDraft, LeadPatch, ValidationError, normalize_stage};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// CSV-backed store of [`Lead`] rows, newest first.
///
/// Every mutation is a full load, in-memory change and atomic rewrite.
/// Two writers working from independent snapshots overwrite each other:
/// the last save wins.
#[derive(Debug, Clone)]
pub struct LeadStore {
    path: PathBuf,
    lock_timeout: Duration,
}

impl LeadStore {
    /// Open the table, creating it with headers when missing and migrating
    /// older layouts once.
    pub fn open(path: impl Into<PathBuf>, lock_timeout: Duration) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            lock_timeout,
        };
        let mut table = read_or_create(&store.path, LEAD_COLUMNS, lock_timeout)?;
        if migrate_leads(&mut table) {
            write_table(&store.path, &table, lock_timeout)?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All leads in stored order with derived fields recomputed.
    pub fn load(&self) -> Result<Vec<Lead>, StoreError> {
        let table = self.read()?;
        let extras = table.extra_columns(LEAD_COLUMNS);
        Ok(table
            .rows
            .iter()
            .map(|row| lead_from_row(row, &extras))
            .collect())
    }

    /// Persist `leads` as the full table content.
    ///
    /// A lead already stored under the same id keeps the stored text of every
    /// cell whose value it did not change, so unreadable dates and legacy
    /// labels are never replaced by their decoded stand-ins.
    pub fn save(&self, leads: &[Lead]) -> Result<(), StoreError> {
        let stored = match read_table(&self.path)? {
            Some(mut table) => {
                migrate_leads(&mut table);
                table
            }
            None => Table::with_headers(LEAD_COLUMNS),
        };
        let stored_extras = stored.extra_columns(LEAD_COLUMNS);
        let mut by_id: HashMap<&str, &Row> = HashMap::new();
        for row in &stored.rows {
            by_id.entry(cell(row, "id_lead").trim()).or_insert(row);
        }

        let mut extras = stored_extras.clone();
        for lead in leads {
            for key in lead.extra.keys() {
                if !extras.contains(key) && !LEAD_COLUMNS.contains(&key.as_str()) {
                    extras.push(key.clone());
                }
            }
        }

        let mut table = Table::with_headers(LEAD_COLUMNS);
        table.headers.extend(extras);
        table.rows = leads
            .iter()
            .map(|lead| match by_id.get(lead.id.as_str()) {
                Some(row) => {
                    let previous = lead_to_row(&lead_from_row(row, &stored_extras));
                    merge_row(row, &previous, lead_to_row(lead), &[SCORE_COLUMN])
                }
                None => lead_to_row(lead),
            })
            .collect();
        write_table(&self.path, &table, self.lock_timeout)?;
        info!(path = %self.path.display(), leads = leads.len(), "saved leads");
        Ok(())
    }

    /// Identifier the next registered lead receives.
    pub fn next_id(leads: &[Lead]) -> String {
        next_sequential_id(leads.iter().map(|lead| lead.id.as_str())).to_string()
    }

    /// Register a new lead owned by `owner`. Nothing is written when the
    /// draft is rejected.
    pub fn register(
        &self,
        draft: LeadDraft,
        owner: &str,
        catalog: &Catalog,
        now: NaiveDateTime,
    ) -> Result<Mutation<Lead>, StoreError> {
        let mut leads = self.load()?;
        let lead = Lead::register(Self::next_id(&leads), draft, owner, now);

        let mut errors = validate_lead(&lead).err().unwrap_or_default();
        errors.extend(validate_choices(
            Some(&lead.course),
            Some(&lead.channel),
            Some(&lead.gender),
            catalog,
        ));
        if !errors.is_empty() {
            return Ok(Mutation::Rejected(errors));
        }

        leads.insert(0, lead.clone());
        self.save(&leads)?;
        info!(id = %lead.id, "registered lead");
        Ok(Mutation::Applied(lead))
    }

    /// Apply `patch` to the lead with `id`, validating the result.
    pub fn update(
        &self,
        id: &str,
        patch: LeadPatch,
        catalog: &Catalog,
        now: NaiveDateTime,
    ) -> Result<Mutation<Lead>, StoreError> {
        let choice_errors = validate_patch_choices(&patch, catalog);
        self.modify(id, now, |lead| {
            lead.apply(patch, now);
            let mut errors = validate_lead(lead).err().unwrap_or_default();
            errors.extend(choice_errors);
            errors
        })
    }

    /// Apply `patch` without contact validation. Used for follow-ups, which
    /// never touch contact fields and must not be blocked by legacy rows.
    pub(crate) fn apply_unchecked(
        &self,
        id: &str,
        patch: LeadPatch,
        now: NaiveDateTime,
    ) -> Result<Mutation<Lead>, StoreError> {
        self.modify(id, now, |lead| {
            lead.apply(patch, now);
            Vec::new()
        })
    }

    fn modify<F>(&self, id: &str, now: NaiveDateTime, change: F) -> Result<Mutation<Lead>, StoreError>
    where
        F: FnOnce(&mut Lead) -> Vec<ValidationError>,
    {
        let mut leads = self.load()?;
        let Some(index) = leads.iter().position(|lead| lead.id == id) else {
            return Ok(Mutation::NotFound(id.to_string()));
        };

        let mut updated = leads[index].clone();
        let errors = change(&mut updated);
        if !errors.is_empty() {
            return Ok(Mutation::Rejected(errors));
        }

        leads[index] = updated.clone();
        self.save(&leads)?;
        info!(id = %updated.id, stage = %updated.stage, "updated lead");
        Ok(Mutation::Applied(updated))
    }

    fn read(&self) -> Result<Table, StoreError> {
        let mut table = read_or_create(&self.path, LEAD_COLUMNS, self.lock_timeout)?;
        migrate_leads(&mut table);
        Ok(table)
    }
}

fn lead_from_row(row: &Row, extras: &[String]) -> Lead {
    let text = |column: &str| cell(row, column).to_string();
    let mut lead = Lead {
        id: cell(row, "id_lead").trim().to_string(),
        registered_on: decode_date(cell(row, "fecha_registro")),
        registered_at: decode_time(cell(row, "hora_registro")),
        name: text("nombre"),
        surname: text("apellidos"),
        gender: text("genero"),
        age: text("edad"),
        mobile: text("celular"),
        landline: text("telefono"),
        email: text("correo"),
        course: text("interes_curso"),
        channel: text("como_enteraste"),
        stage: normalize_stage(cell(row, "lead_status")),
        legacy_stage: text("funnel_etapas"),
        last_contact_on: decode_date(cell(row, "fecha_ultimo_contacto")),
        notes: text("observaciones"),
        owner: text("owner"),
        next_action_on: decode_date(cell(row, "proxima_accion_fecha")),
        next_action: text("proxima_accion_desc"),
        close_probability: text("probabilidad_cierre"),
        estimated_amount: text("monto_estimado"),
        loss_reason: text("motivo_perdida"),
        stage_entered_on: decode_date(cell(row, "fecha_entrada_etapa")),
        age_years: 0,
        score: 0,
        extra: extras
            .iter()
            .map(|column| (column.clone(), text(column)))
            .collect::<BTreeMap<_, _>>(),
    };
    lead.refresh_derived();
    lead
}

/// Derived column, rewritten whenever its lead changes.
const SCORE_COLUMN: &str = "lead_score";

pub(crate) fn lead_to_row(lead: &Lead) -> Row {
    let mut row: Row = lead.extra.clone();
    let fields = [
        ("id_lead", lead.id.clone()),
        ("fecha_registro", encode_date(lead.registered_on)),
        ("hora_registro", encode_time(lead.registered_at)),
        ("nombre", lead.name.clone()),
        ("apellidos", lead.surname.clone()),
        ("genero", lead.gender.clone()),
        ("edad", lead.age.clone()),
        ("celular", lead.mobile.clone()),
        ("telefono", lead.landline.clone()),
        ("correo", lead.email.clone()),
        ("interes_curso", lead.course.clone()),
        ("como_enteraste", lead.channel.clone()),
        ("lead_status", lead.stage.as_str().to_string()),
        ("funnel_etapas", lead.legacy_stage.clone()),
        ("fecha_ultimo_contacto", encode_date(lead.last_contact_on)),
        ("observaciones", lead.notes.clone()),
        ("owner", lead.owner.clone()),
        ("proxima_accion_fecha", encode_date(lead.next_action_on)),
        ("proxima_accion_desc", lead.next_action.clone()),
        (SCORE_COLUMN, lead.score.to_string()),
        ("probabilidad_cierre", lead.close_probability.clone()),
        ("monto_estimado", lead.estimated_amount.clone()),
        ("motivo_perdida", lead.loss_reason.clone()),
        ("fecha_entrada_etapa", encode_date(lead.stage_entered_on)),
    ];
    for (column, value) in fields {
        row.insert(column.to_string(), value);
    }
    row
}
