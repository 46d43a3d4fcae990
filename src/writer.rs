use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::extract::{ContactRecord, MailAddr};

/// Rendered From field: `Display Name <address>` when a display name is
/// present, the bare address otherwise.
fn render_from(from: &MailAddr) -> String {
    if from.display.is_empty() {
        from.address.clone()
    } else {
        format!("{} <{}>", from.display, from.address)
    }
}

/// Write the surviving records as CSV with RFC 4180 quoting.
///
/// The header row is always present, even for zero records. Returns the
/// number of data rows written.
pub fn write_records<W: Write>(
    writer: W,
    records: &[ContactRecord],
    include_subject: bool,
) -> Result<u64> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    if include_subject {
        csv_writer.write_record(["To", "From", "Subject", "Date"])?;
    } else {
        csv_writer.write_record(["To", "From", "Date"])?;
    }

    let mut written = 0u64;
    for record in records {
        let from = render_from(&record.from);
        let date = record.date.to_export_string();
        if include_subject {
            csv_writer.write_record([
                record.to.as_str(),
                from.as_str(),
                record.subject.as_str(),
                date.as_str(),
            ])?;
        } else {
            csv_writer.write_record([record.to.as_str(), from.as_str(), date.as_str()])?;
        }
        written += 1;
    }

    csv_writer.flush().map_err(crate::error::SiftError::Io)?;
    Ok(written)
}

/// Create the output file and write all records into it.
pub fn write_to_path(
    path: &Path,
    records: &[ContactRecord],
    include_subject: bool,
) -> Result<u64> {
    let file = File::create(path)?;
    write_records(file, records, include_subject)
}
