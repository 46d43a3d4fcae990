use std::collections::HashSet;
use std::time::Duration;

use log::{debug, info};
use serde_json::{json, Value};

use crate::config::{ExclusionServiceConfig, ListQuery};
use crate::error::{Result, SiftError};

/// Exclusion lists merged from the record-store, lowercased on insert.
/// Rebuilt once per run; nothing persists across runs.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    addresses: HashSet<String>,
    domains: HashSet<String>,
    keywords: HashSet<String>,
}

impl ExclusionSet {
    pub fn add_address(&mut self, address: &str) {
        self.addresses.insert(address.trim().to_lowercase());
    }

    pub fn add_domain(&mut self, domain: &str) {
        self.domains.insert(domain.trim().to_lowercase());
    }

    pub fn add_keyword(&mut self, keyword: &str) {
        self.keywords.insert(keyword.trim().to_lowercase());
    }

    pub fn contains_address(&self, address: &str) -> bool {
        self.addresses.contains(&address.trim().to_lowercase())
    }

    /// Exact or dot-suffix domain match, e.g. `bad.org` also matches
    /// `mail.bad.org`.
    pub fn matches_domain(&self, domain: &str) -> bool {
        let domain = domain.trim().to_lowercase();
        self.domains
            .iter()
            .any(|d| domain == *d || domain.ends_with(&format!(".{d}")))
    }

    /// Case-insensitive substring match against the keyword list.
    pub fn matches_keyword(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty() && self.domains.is_empty() && self.keywords.is_empty()
    }

    pub fn len(&self) -> usize {
        self.addresses.len() + self.domains.len() + self.keywords.len()
    }
}

/// Fetches the exclusion lists from the record-store query API.
///
/// One blocking request per configured list, no retries. Failure policy is
/// decided by the caller.
pub struct ExclusionProvider {
    client: reqwest::blocking::Client,
    config: ExclusionServiceConfig,
}

impl ExclusionProvider {
    pub fn new(config: ExclusionServiceConfig) -> Result<Self> {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("mbox-sift/{}", env!("CARGO_PKG_VERSION")));
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client, config })
    }

    /// Fetch every configured list and merge the results.
    pub fn fetch(&self) -> Result<ExclusionSet> {
        let mut set = ExclusionSet::default();

        if let Some(query) = &self.config.lists.addresses {
            for value in self.query_list(query)? {
                set.add_address(&value);
            }
        }
        if let Some(query) = &self.config.lists.domains {
            for value in self.query_list(query)? {
                set.add_domain(&value);
            }
        }
        if let Some(query) = &self.config.lists.keywords {
            for value in self.query_list(query)? {
                set.add_keyword(&value);
            }
        }

        info!("loaded {} exclusion entries from record-store", set.len());
        Ok(set)
    }

    fn query_list(&self, query: &ListQuery) -> Result<Vec<String>> {
        let url = format!(
            "{}/records/query",
            self.config.endpoint.trim_end_matches('/')
        );
        debug!("querying table {} column {}", query.table, query.column);

        let body = json!({
            "from": query.table,
            "select": [query.column],
            "where": format!("{{{}.XEX.''}}", query.column),
            "options": { "skip": 0, "top": 0, "compareWithAppLocalTime": false },
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(token) = self.config.resolved_token() {
            request = request.header("Authorization", token);
        }
        if let Some(realm) = &self.config.realm_hostname {
            request = request.header("QB-Realm-Hostname", realm.clone());
        }

        let response = request.send()?;
        if !response.status().is_success() {
            return Err(SiftError::Network(format!(
                "record-store returned {} for table {}",
                response.status(),
                query.table
            )));
        }

        let payload: Value = response
            .json()
            .map_err(|e| SiftError::Network(format!("malformed response body: {e}")))?;
        parse_query_response(&payload, query.column)
    }
}

/// Pull the value strings out of a record-store query response:
/// `{ "data": [ { "<column>": { "value": "..." } }, .. ] }`.
pub fn parse_query_response(payload: &Value, column: u32) -> Result<Vec<String>> {
    let records = payload
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| SiftError::Network("response missing 'data' array".to_string()))?;

    Ok(records
        .iter()
        .filter_map(|record| {
            record
                .get(column.to_string())
                .and_then(|field| field.get("value"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_membership_is_case_insensitive() {
        let mut set = ExclusionSet::default();
        set.add_address("Spam@Example.COM");

        assert!(set.contains_address("spam@example.com"));
        assert!(set.contains_address("SPAM@EXAMPLE.COM"));
        assert!(!set.contains_address("ham@example.com"));
    }

    #[test]
    fn test_domain_suffix_matching() {
        let mut set = ExclusionSet::default();
        set.add_domain("bad.org");

        assert!(set.matches_domain("bad.org"));
        assert!(set.matches_domain("BAD.ORG"));
        assert!(set.matches_domain("mail.bad.org"));
        assert!(!set.matches_domain("notbad.org"));
        assert!(!set.matches_domain("bad.org.evil.com"));
    }

    #[test]
    fn test_keyword_substring_matching() {
        let mut set = ExclusionSet::default();
        set.add_keyword("Unsubscribe");

        assert!(set.matches_keyword("Please UNSUBSCRIBE me now"));
        assert!(!set.matches_keyword("monthly newsletter"));
    }

    #[test]
    fn test_parse_query_response() {
        let payload: Value = serde_json::from_str(
            r#"{
                "data": [
                    { "6": { "value": "spam@example.com" } },
                    { "6": { "value": "junk@example.org" } },
                    { "6": { "value": 42 } }
                ],
                "fields": [ { "id": 6, "label": "Email" } ]
            }"#,
        )
        .unwrap();

        let values = parse_query_response(&payload, 6).unwrap();
        assert_eq!(values, vec!["spam@example.com", "junk@example.org"]);
    }

    #[test]
    fn test_parse_query_response_missing_data() {
        let payload: Value = serde_json::from_str(r#"{ "message": "bad token" }"#).unwrap();
        match parse_query_response(&payload, 6) {
            Err(SiftError::Network(_)) => {}
            other => panic!("expected network error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_empty_set() {
        let set = ExclusionSet::default();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert!(!set.contains_address("anyone@example.com"));
        assert!(!set.matches_domain("example.com"));
    }
}
