//! Tabular export of loaded entries.
//!
//! A pure projection: callers load a store and hand the entries in.

use std::io::Write;

use crate::entry::{Entry, FieldSet};
use crate::error::Result;

/// Header row for a field set: `date`, the field columns, `notes`
pub fn header<F: FieldSet>() -> Vec<&'static str> {
    let mut columns = vec!["date"];
    columns.extend_from_slice(F::COLUMNS);
    columns.push("notes");
    columns
}

/// Write entries as CSV with a header row
pub fn write_csv<F: FieldSet, W: Write>(entries: &[Entry<F>], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(header::<F>())?;

    for entry in entries {
        let mut record = Vec::with_capacity(F::COLUMNS.len() + 2);
        record.push(entry.date.to_string());
        record.extend(entry.fields.columns());
        record.push(entry.notes.clone());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// CSV export as a string
pub fn to_csv_string<F: FieldSet>(entries: &[Entry<F>]) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(entries, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
