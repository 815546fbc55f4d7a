//! The append-only follow-up log.

use crate::codec::{decode_date, decode_time, encode_date, encode_time};
use crate::error::StoreError;
use crate::schema::INTERACTION_COLUMNS;
use crate::table::{Row, Table, cell, read_or_create, write_table};
use leadflow_core::interaction::history_for;
use leadflow_core::lead::next_sequential_id;
use leadflow_core::{InteractionEvent, normalize_stage};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct InteractionLog {
    path: PathBuf,
    lock_timeout: Duration,
}

impl InteractionLog {
    pub fn open(path: impl Into<PathBuf>, lock_timeout: Duration) -> Result<Self, StoreError> {
        let log = Self {
            path: path.into(),
            lock_timeout,
        };
        let mut table = read_or_create(&log.path, INTERACTION_COLUMNS, lock_timeout)?;
        if INTERACTION_COLUMNS.iter().any(|c| !table.has_column(c)) {
            table.conform(INTERACTION_COLUMNS, &[]);
            write_table(&log.path, &table, lock_timeout)?;
        }
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every event in log order.
    pub fn load(&self) -> Result<Vec<InteractionEvent>, StoreError> {
        let table = self.read()?;
        let extras = table.extra_columns(INTERACTION_COLUMNS);
        Ok(table
            .rows
            .iter()
            .map(|row| event_from_row(row, &extras))
            .collect())
    }

    /// Append one event. An empty `id` is replaced with the next sequential
    /// identifier. Earlier rows are written back exactly as stored.
    pub fn append(&self, mut event: InteractionEvent) -> Result<InteractionEvent, StoreError> {
        let mut table = self.read()?;
        if event.id.trim().is_empty() {
            let used = table.rows.iter().map(|row| cell(row, "id_seguimiento").trim());
            event.id = next_sequential_id(used).to_string();
        }
        for key in event.extra.keys() {
            if !table.has_column(key) {
                table.headers.push(key.clone());
            }
        }
        table.rows.push(event_to_row(&event));
        write_table(&self.path, &table, self.lock_timeout)?;
        info!(id = %event.id, lead = %event.lead_id, "logged follow-up");
        Ok(event)
    }

    /// Events of `lead_id` ordered by date and time.
    pub fn history(&self, lead_id: &str) -> Result<Vec<InteractionEvent>, StoreError> {
        let events = self.load()?;
        Ok(history_for(&events, lead_id).into_iter().cloned().collect())
    }

    fn read(&self) -> Result<Table, StoreError> {
        let mut table = read_or_create(&self.path, INTERACTION_COLUMNS, self.lock_timeout)?;
        table.conform(INTERACTION_COLUMNS, &[]);
        Ok(table)
    }
}

fn event_from_row(row: &Row, extras: &[String]) -> InteractionEvent {
    let text = |column: &str| cell(row, column).to_string();
    InteractionEvent {
        id: cell(row, "id_seguimiento").trim().to_string(),
        lead_id: cell(row, "id_lead").trim().to_string(),
        date: decode_date(cell(row, "fecha")),
        time: decode_time(cell(row, "hora")),
        stage: normalize_stage(cell(row, "etapa")),
        next_action_on: decode_date(cell(row, "proxima_accion_fecha")),
        message_kind: text("tipo_mensaje"),
        message_status: text("estado_mensaje"),
        channel: text("canal"),
        operator: text("atendido_por"),
        notes: text("observaciones"),
        extra: extras.iter().map(|c| (c.clone(), text(c))).collect(),
    }
}

fn event_to_row(event: &InteractionEvent) -> Row {
    let mut row = event.extra.clone();
    let fields = [
        ("id_seguimiento", event.id.clone()),
        ("id_lead", event.lead_id.clone()),
        ("fecha", encode_date(event.date)),
        ("hora", encode_time(event.time)),
        ("etapa", event.stage.as_str().to_string()),
        ("proxima_accion_fecha", encode_date(event.next_action_on)),
        ("tipo_mensaje", event.message_kind.clone()),
        ("estado_mensaje", event.message_status.clone()),
        ("canal", event.channel.clone()),
        ("atendido_por", event.operator.clone()),
        ("observaciones", event.notes.clone()),
    ];
    for (column, value) in fields {
        row.insert(column.to_string(), value);
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::Stage;
    use leadflow_core::testing;
    use std::fs;

    const TIMEOUT: Duration = Duration::from_millis(200);

    #[test]
    fn append_assigns_ids_and_history_sorts() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let log = InteractionLog::open(tmp.path().join("seguimientos.csv"), TIMEOUT).expect("open");

        let mut later = testing::event("", "4", testing::now() + chrono::Duration::hours(2));
        later.notes = "segundo".to_string();
        let mut earlier = testing::event("", "4", testing::now());
        earlier.notes = "primero".to_string();

        let stored = log.append(later).expect("append");
        assert_eq!(stored.id, "1");
        let stored = log.append(earlier).expect("append");
        assert_eq!(stored.id, "2");
        log.append(testing::event("", "5", testing::now())).expect("append");

        let history = log.history("4").expect("history");
        let notes: Vec<&str> = history.iter().map(|e| e.notes.as_str()).collect();
        assert_eq!(notes, vec!["primero", "segundo"]);
    }

    #[test]
    fn events_for_missing_leads_are_kept() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let log = InteractionLog::open(tmp.path().join("seguimientos.csv"), TIMEOUT).expect("open");
        log.append(testing::event("", "404", testing::now())).expect("append");
        assert_eq!(log.history("404").expect("history").len(), 1);
    }

    #[test]
    fn legacy_rows_load_with_defaults() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("seguimientos.csv");
        fs::write(
            &path,
            "id_seguimiento,id_lead,fecha,etapa,observaciones\n1,2,2025-05-05,Interesado,hola\n",
        )
        .expect("seed");

        let log = InteractionLog::open(&path, TIMEOUT).expect("open");
        let events = log.load().expect("load");
        assert_eq!(events[0].stage, Stage::Sql);
        assert_eq!(events[0].time, chrono::NaiveTime::MIN);
        assert_eq!(events[0].next_action_on, None);

        let header = fs::read_to_string(&path).expect("read");
        assert!(header.starts_with(&INTERACTION_COLUMNS.join(",")));
    }

    #[test]
    fn append_leaves_earlier_rows_untouched() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("seguimientos.csv");
        let legacy = "1,2,03/15/2024,tarde,Interesado,ayer,,,,,hola";
        fs::write(&path, format!("{}\n{legacy}\n", INTERACTION_COLUMNS.join(","))).expect("seed");

        let log = InteractionLog::open(&path, TIMEOUT).expect("open");
        let stored = log.append(testing::event("", "2", testing::now())).expect("append");
        assert_eq!(stored.id, "2");

        let text = fs::read_to_string(&path).expect("read");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], legacy);

        let history = log.history("2").expect("history");
        assert_eq!(history[0].date, None);
        assert_eq!(history[1].date, Some(testing::now().date()));
    }
}
