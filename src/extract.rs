use chrono::{DateTime, FixedOffset, TimeZone};
use mail_parser::MessageParser;

/// Sender identity split into the views the export and the filter need.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MailAddr {
    /// Display name, empty when the header carried none.
    pub display: String,
    /// Bare address, e.g. `user@example.com`.
    pub address: String,
}

impl MailAddr {
    /// Domain portion after the last `@`, lowercased.
    pub fn domain(&self) -> Option<String> {
        self.address.rsplit_once('@').map(|(_, d)| d.to_lowercase())
    }
}

/// A Date header value: parsed when RFC 2822/5322 parsing succeeded,
/// otherwise the raw header text preserved verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum DateField {
    Parsed(DateTime<FixedOffset>),
    Raw(String),
}

impl DateField {
    pub fn year(&self) -> Option<i32> {
        match self {
            DateField::Parsed(dt) => Some(chrono::Datelike::year(dt)),
            DateField::Raw(_) => None,
        }
    }

    /// Rendered form for the CSV export: `M/D/YY` for parsed dates (the
    /// format the record-store import expects), raw text otherwise.
    pub fn to_export_string(&self) -> String {
        match self {
            DateField::Parsed(dt) => {
                use chrono::Datelike;
                format!("{}/{}/{:02}", dt.month(), dt.day(), dt.year().rem_euclid(100))
            }
            DateField::Raw(raw) => raw.clone(),
        }
    }
}

/// One extracted contact row. Immutable once produced.
#[derive(Debug, Clone)]
pub struct ContactRecord {
    /// Recipient addresses, comma-joined when the header listed several.
    pub to: String,
    pub from: MailAddr,
    pub subject: String,
    pub date: DateField,
}

impl ContactRecord {
    /// Individual recipient addresses for filtering.
    pub fn to_addresses(&self) -> impl Iterator<Item = &str> {
        self.to.split(',').map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Extract the four target headers from one raw message.
///
/// Never fails: a missing or undecodable header degrades to an empty field
/// plus a warning naming the 1-based message index.
pub fn extract_record(index: u64, raw: &[u8], warnings: &mut Vec<String>) -> ContactRecord {
    let parsed = match MessageParser::default().parse(raw) {
        Some(parsed) => parsed,
        None => {
            warnings.push(format!("message {index}: unparseable headers"));
            return ContactRecord {
                to: String::new(),
                from: MailAddr::default(),
                subject: String::new(),
                date: DateField::Raw(String::new()),
            };
        }
    };

    let from = match parsed.from().and_then(|f| f.first()) {
        Some(addr) => MailAddr {
            display: addr.name().unwrap_or("").to_string(),
            address: addr.address().unwrap_or("").to_string(),
        },
        None => {
            warnings.push(format!("message {index}: missing From header"));
            MailAddr::default()
        }
    };

    let to = match parsed.to() {
        Some(addr) => addr
            .iter()
            .filter_map(|a| a.address().map(|s| s.to_string()))
            .collect::<Vec<_>>()
            .join(", "),
        None => {
            warnings.push(format!("message {index}: missing To header"));
            String::new()
        }
    };

    let subject = match parsed.subject() {
        Some(subject) => subject.to_string(),
        None => {
            warnings.push(format!("message {index}: missing Subject header"));
            String::new()
        }
    };

    let date = match parsed.date() {
        Some(date) => match to_chrono(date) {
            Some(dt) => DateField::Parsed(dt),
            None => DateField::Raw(date.to_rfc3339()),
        },
        None => match parsed.header_raw("Date") {
            Some(raw_date) => {
                warnings.push(format!("message {index}: unparseable Date header"));
                DateField::Raw(raw_date.trim().to_string())
            }
            None => {
                warnings.push(format!("message {index}: missing Date header"));
                DateField::Raw(String::new())
            }
        },
    };

    ContactRecord {
        to,
        from,
        subject,
        date,
    }
}

/// Transform a [`mail_parser::DateTime`] into a fixed-offset chrono value.
fn to_chrono(date: &mail_parser::DateTime) -> Option<DateTime<FixedOffset>> {
    let tz_secs = (date.tz_hour as i32) * 3600 + (date.tz_minute as i32) * 60;
    let tz_sign = if date.tz_before_gmt { -1 } else { 1 };
    let tz = FixedOffset::east_opt(tz_sign * tz_secs)?;
    tz.with_ymd_and_hms(
        date.year as i32,
        date.month as u32,
        date.day as u32,
        date.hour as u32,
        date.minute as u32,
        date.second as u32,
    )
    .earliest()
}
