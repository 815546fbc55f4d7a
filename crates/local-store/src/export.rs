use crate::error::StoreError;
use crate::leads::lead_to_row;
use crate::schema::EXPORT_COLUMNS;
use crate::table::cell;
use leadflow_core::Lead;
use std::io::Write;

/// Write `leads` as CSV with the export columns. Returns the row count.
pub fn export_csv<'a, W, I>(writer: W, leads: I) -> Result<usize, StoreError>
where
    W: Write,
    I: IntoIterator<Item = &'a Lead>,
{
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(EXPORT_COLUMNS)?;
    let mut count = 0;
    for lead in leads {
        let row = lead_to_row(lead);
        csv.write_record(EXPORT_COLUMNS.iter().map(|column| cell(&row, column)))?;
        count += 1;
    }
    csv.flush()?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::testing;

    #[test]
    fn export_uses_view_columns() {
        let mut lead = testing::lead("3", "Ana");
        lead.surname = "Pérez, López".to_string();
        let mut out = Vec::new();
        let count = export_csv(&mut out, [&lead]).expect("export");
        assert_eq!(count, 1);

        let text = String::from_utf8(out).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(EXPORT_COLUMNS.join(",").as_str()));
        let row = lines.next().expect("row");
        assert!(row.starts_with("3,Ana,\"Pérez, López\",,5511112222,,Inglés,Otro,Awareness,"));
        assert!(row.ends_with(",0"));
    }
}
