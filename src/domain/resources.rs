//! Resource collections served by the admin API.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use super::error::DomainError;

const MAX_NAME_LEN: usize = 64;

/// A single record of a resource collection.
pub type ResourceRecord = Map<String, Value>;

/// Validated collection name as it appears in `/api/{resource}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ResourceName(String);

impl ResourceName {
    /// Accepts 1-64 characters of lowercase ASCII letters, digits, `-` and `_`,
    /// starting with a letter.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let starts_with_letter = raw.chars().next().is_some_and(|ch| ch.is_ascii_lowercase());
        let valid_chars = raw
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_');

        if !starts_with_letter || !valid_chars || raw.len() > MAX_NAME_LEN {
            return Err(DomainError::validation(format!(
                "invalid resource name `{raw}`"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Field filters read from `filter[field]=a,b`.
///
/// A record matches when, for every filtered field, at least one accepted
/// value matches. Text fields match case-insensitively by substring; every
/// other value matches on its exact textual form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResourceFilter {
    fields: BTreeMap<String, Vec<String>>,
}

impl ResourceFilter {
    /// Build from the `filter` object of a parsed query string.
    pub fn from_query(filter: Option<&Value>) -> Self {
        let mut fields = BTreeMap::new();
        if let Some(Value::Object(map)) = filter {
            for (field, accepted) in map {
                let values: Vec<String> = match accepted {
                    Value::String(text) => vec![text.clone()],
                    Value::Array(items) => items
                        .iter()
                        .filter_map(|item| item.as_str().map(str::to_string))
                        .collect(),
                    _ => Vec::new(),
                };
                let values: Vec<String> = values
                    .into_iter()
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty())
                    .collect();
                if !values.is_empty() {
                    fields.insert(field.clone(), values);
                }
            }
        }
        Self { fields }
    }

    pub fn with(mut self, field: impl Into<String>, values: &[&str]) -> Self {
        self.fields.insert(
            field.into(),
            values.iter().map(|value| value.to_string()).collect(),
        );
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn matches(&self, record: &ResourceRecord) -> bool {
        self.fields.iter().all(|(field, accepted)| {
            record
                .get(field)
                .is_some_and(|value| accepted.iter().any(|wanted| value_matches(value, wanted)))
        })
    }
}

fn value_matches(value: &Value, wanted: &str) -> bool {
    match value {
        Value::String(text) => text.to_lowercase().contains(&wanted.to_lowercase()),
        Value::Null => false,
        Value::Array(items) => items.iter().any(|item| value_matches(item, wanted)),
        other => other.to_string() == wanted,
    }
}

/// Sort requested with `sort=field` (ascending) or `sort=-field` (descending).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortOrder {
    pub field: String,
    pub descending: bool,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (field, descending) = match raw.strip_prefix('-') {
            Some(field) => (field, true),
            None => (raw, false),
        };
        (!field.is_empty()).then(|| Self {
            field: field.to_string(),
            descending,
        })
    }

    /// Sort in place; records missing the field sort last either way.
    pub fn apply(&self, records: &mut [ResourceRecord]) {
        records.sort_by(|a, b| {
            match (a.get(&self.field), b.get(&self.field)) {
                (Some(left), Some(right)) => {
                    let ordering = compare_values(left, right);
                    if self.descending {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
    }

    /// `field` or `-field`.
    pub fn as_query_value(&self) -> String {
        if self.descending {
            format!("-{}", self.field)
        } else {
            self.field.clone()
        }
    }
}

fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or_default();
            let b = b.as_f64().unwrap_or_default();
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (a, b) => a.to_string().cmp(&b.to_string()),
    }
}
