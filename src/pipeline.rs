use std::path::Path;

use log::{debug, info};

use crate::config::{Config, FetchErrorPolicy};
use crate::error::{Result, SiftError};
use crate::exclusion::{ExclusionProvider, ExclusionSet};
use crate::extract::{self, ContactRecord, DateField};
use crate::filter;
use crate::mbox::MboxReader;
use crate::report::RunReport;
use crate::writer;

/// Run the whole pipeline for one archive: read, extract, fetch the
/// exclusion list, filter, write.
///
/// Fatal errors abort the run; per-message problems accumulate as warnings
/// on the returned report.
pub fn run(config: &Config, input: &Path, output: &Path) -> Result<RunReport> {
    let mut report = RunReport::default();

    let records = read_archive(input, &mut report)?;
    let exclusions = fetch_exclusions(config, &mut report)?;
    sift_and_write(config, records, &exclusions, output, &mut report)?;

    info!("{}", report.summary());
    Ok(report)
}

/// Read and extract every message in the archive. The file handle is held
/// only for the duration of this scan.
fn read_archive(input: &Path, report: &mut RunReport) -> Result<Vec<ContactRecord>> {
    let mut reader = MboxReader::open(input)?;
    let mut records = Vec::new();

    while let Some(raw) = reader.read_message()? {
        let index = reader.message_count();
        let mut warnings = Vec::new();
        records.push(extract::extract_record(index, &raw, &mut warnings));
        for warning in warnings {
            report.warn(warning);
        }

        if index % 1000 == 0 {
            info!("{index} messages processed");
        }
    }

    report.parsed = reader.message_count();
    info!("parsed {} messages from {}", report.parsed, input.display());
    Ok(records)
}

/// Fetch the exclusion set, honoring the configured failure policy. No
/// service configured means an empty set (offline mode).
fn fetch_exclusions(config: &Config, report: &mut RunReport) -> Result<ExclusionSet> {
    let service = match &config.exclusion_service {
        Some(service) => service,
        None => {
            info!("no exclusion service configured, proceeding unfiltered");
            return Ok(ExclusionSet::default());
        }
    };

    let provider = ExclusionProvider::new(service.clone())?;
    match provider.fetch() {
        Ok(set) => Ok(set),
        Err(err @ SiftError::Network(_)) if service.on_fetch_error == FetchErrorPolicy::Proceed => {
            report.warn(format!("proceeding without exclusion list: {err}"));
            Ok(ExclusionSet::default())
        }
        Err(err) => Err(err),
    }
}

/// Filter, optionally restrict to one year, sort, and write the output.
fn sift_and_write(
    config: &Config,
    records: Vec<ContactRecord>,
    exclusions: &ExclusionSet,
    output: &Path,
    report: &mut RunReport,
) -> Result<()> {
    let mut kept = Vec::with_capacity(records.len());
    for record in records {
        if let Some(reason) = filter::evaluate(&record, exclusions) {
            debug!("excluding {}: {reason:?}", record.from.address);
            report.filtered += 1;
            continue;
        }

        if let Some(year) = config.export.year {
            if record.date.year() != Some(year) {
                debug!("excluding {}: outside year {year}", record.from.address);
                report.filtered += 1;
                continue;
            }
        }

        kept.push(record);
    }

    if config.export.sort_by_date {
        // Records without a parseable date sort last, in input order.
        kept.sort_by_key(|r| match &r.date {
            DateField::Parsed(dt) => dt.timestamp(),
            DateField::Raw(_) => i64::MAX,
        });
    }

    match writer::write_to_path(output, &kept, config.export.include_subject) {
        Ok(written) => {
            report.written = written;
            Ok(())
        }
        Err(err) => {
            report.output_truncated = true;
            report.warn(format!("output file may be incomplete: {err}"));
            Err(err)
        }
    }
}
