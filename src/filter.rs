use crate::exclusion::ExclusionSet;
use crate::extract::ContactRecord;

/// Why a record was discarded. Used for debug logging only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discard {
    Address(String),
    Domain(String),
    Keyword,
}

/// Pure keep/discard decision for one record against the exclusion set.
///
/// Discards when the From or any To address exactly matches an excluded
/// address, when either side's domain equals or is a dot-suffix of an
/// excluded domain, or when the subject contains an excluded keyword. All
/// comparisons are case-insensitive.
pub fn evaluate(record: &ContactRecord, exclusions: &ExclusionSet) -> Option<Discard> {
    if !record.from.address.is_empty() {
        if exclusions.contains_address(&record.from.address) {
            return Some(Discard::Address(record.from.address.clone()));
        }
        if let Some(domain) = record.from.domain() {
            if exclusions.matches_domain(&domain) {
                return Some(Discard::Domain(domain));
            }
        }
    }

    for to in record.to_addresses() {
        if exclusions.contains_address(to) {
            return Some(Discard::Address(to.to_string()));
        }
        if let Some((_, domain)) = to.rsplit_once('@') {
            if exclusions.matches_domain(domain) {
                return Some(Discard::Domain(domain.to_lowercase()));
            }
        }
    }

    if exclusions.matches_keyword(&record.subject) {
        return Some(Discard::Keyword);
    }

    None
}

/// Convenience wrapper when the reason is not needed.
pub fn keep(record: &ContactRecord, exclusions: &ExclusionSet) -> bool {
    evaluate(record, exclusions).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{DateField, MailAddr};

    fn record(from: &str, to: &str, subject: &str) -> ContactRecord {
        ContactRecord {
            to: to.to_string(),
            from: MailAddr {
                display: String::new(),
                address: from.to_string(),
            },
            subject: subject.to_string(),
            date: DateField::Raw(String::new()),
        }
    }

    #[test]
    fn test_excluded_from_address_discarded() {
        let mut exclusions = ExclusionSet::default();
        exclusions.add_address("spam@example.com");

        let rec = record("Spam@Example.com", "b@good.org", "hello");
        assert!(!keep(&rec, &exclusions));
        assert_eq!(
            evaluate(&rec, &exclusions),
            Some(Discard::Address("Spam@Example.com".to_string()))
        );
    }

    #[test]
    fn test_excluded_to_address_discarded() {
        let mut exclusions = ExclusionSet::default();
        exclusions.add_address("list@example.com");

        let rec = record("a@good.org", "b@good.org, list@example.com", "hello");
        assert!(!keep(&rec, &exclusions));
    }

    #[test]
    fn test_excluded_domain_discards_both_directions() {
        let mut exclusions = ExclusionSet::default();
        exclusions.add_domain("bad.org");

        assert!(!keep(&record("a@bad.org", "b@good.org", "x"), &exclusions));
        assert!(!keep(&record("a@good.org", "b@BAD.ORG", "x"), &exclusions));
        assert!(!keep(&record("a@mail.bad.org", "b@good.org", "x"), &exclusions));
        assert!(keep(&record("a@good.org", "b@good.org", "x"), &exclusions));
    }

    #[test]
    fn test_keyword_discards_on_subject() {
        let mut exclusions = ExclusionSet::default();
        exclusions.add_keyword("invoice");

        let rec = record("a@good.org", "b@good.org", "Your INVOICE is ready");
        assert_eq!(evaluate(&rec, &exclusions), Some(Discard::Keyword));
    }

    #[test]
    fn test_empty_set_keeps_everything() {
        let exclusions = ExclusionSet::default();
        assert!(keep(&record("a@x.com", "b@y.com", "subject"), &exclusions));
    }

    #[test]
    fn test_empty_from_is_not_matched() {
        let mut exclusions = ExclusionSet::default();
        exclusions.add_address("");

        assert!(keep(&record("", "b@y.com", "subject"), &exclusions));
    }
}
