//! Pure query helpers over a record collection.
//!
//! Every predicate is independent and passes everything through when left
//! at `all` / empty, so they can be applied in any order.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::store::StoredRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusFilter {
    pub fn matches<R: StoredRecord>(&self, record: &R) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => record.is_active(),
            StatusFilter::Inactive => !record.is_active(),
        }
    }
}

impl From<&str> for StatusFilter {
    /// Only the exact words `active` and `inactive` narrow the view.
    fn from(value: &str) -> Self {
        match value {
            "active" => StatusFilter::Active,
            "inactive" => StatusFilter::Inactive,
            _ => StatusFilter::All,
        }
    }
}

impl<'de> Deserialize<'de> for StatusFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(StatusFilter::from).unwrap_or_default())
    }
}

/// `all`, or one literal value to match exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn only(value: impl Into<String>) -> Self {
        Selection::Only(value.into())
    }

    fn accepts(&self, key: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => key == Some(wanted.as_str()),
        }
    }
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        if value.is_empty() || value == "all" {
            Selection::All
        } else {
            Selection::Only(value.to_string())
        }
    }
}

impl Serialize for Selection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Selection::All => serializer.serialize_str("all"),
            Selection::Only(value) => serializer.serialize_str(value),
        }
    }
}

impl<'de> Deserialize<'de> for Selection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Selection::from).unwrap_or_default())
    }
}

/// The filter controls of a list view. Missing JSON fields mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub status: StatusFilter,
    #[serde(alias = "type")]
    pub category: Selection,
    pub priority: Selection,
    #[serde(deserialize_with = "null_as_empty")]
    pub search: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl FilterSpec {
    pub fn matches<R: StoredRecord>(&self, record: &R) -> bool {
        self.status.matches(record)
            && self.category.accepts(Some(record.category_key()))
            && self.priority.accepts(record.priority_key())
            && matches_search(record, &self.search)
    }
}

fn matches_search<R: StoredRecord>(record: &R, query: &str) -> bool {
    if query.trim().is_empty() {
        return true;
    }
    let term = query.to_lowercase();
    record
        .search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
}

pub fn filter_by_status<'a, R: StoredRecord>(
    records: impl IntoIterator<Item = &'a R>,
    status: StatusFilter,
) -> Vec<&'a R> {
    records.into_iter().filter(|r| status.matches(*r)).collect()
}

pub fn filter_by_category<'a, R: StoredRecord>(
    records: impl IntoIterator<Item = &'a R>,
    category: &Selection,
) -> Vec<&'a R> {
    records
        .into_iter()
        .filter(|r| category.accepts(Some(r.category_key())))
        .collect()
}

/// Records without a priority only pass when `priority` is `all`.
pub fn filter_by_priority<'a, R: StoredRecord>(
    records: impl IntoIterator<Item = &'a R>,
    priority: &Selection,
) -> Vec<&'a R> {
    records
        .into_iter()
        .filter(|r| priority.accepts(r.priority_key()))
        .collect()
}

/// Case-insensitive substring search over each record's text fields.
pub fn search<'a, R: StoredRecord>(records: impl IntoIterator<Item = &'a R>, query: &str) -> Vec<&'a R> {
    records.into_iter().filter(|r| matches_search(*r, query)).collect()
}

pub fn apply_filters<'a, R: StoredRecord>(records: impl IntoIterator<Item = &'a R>, spec: &FilterSpec) -> Vec<&'a R> {
    records.into_iter().filter(|r| spec.matches(*r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{sample, Record};

    fn fixture() -> Vec<Record> {
        vec![
            sample("1", "Rust Book", "book", true),
            sample("2", "Async video", "video", false),
            sample("3", "Rust course", "course", true),
            sample("4", "Lecture notes", "pdf", false),
            sample("5", "rusty tools", "pdf", true),
        ]
    }

    fn ids(records: &[&Record]) -> Vec<String> {
        records.iter().map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn status_filter_splits_active_and_inactive() {
        let records = fixture();
        assert_eq!(filter_by_status(&records, StatusFilter::All).len(), 5);
        assert_eq!(ids(&filter_by_status(&records, StatusFilter::Active)), ["1", "3", "5"]);
        assert_eq!(ids(&filter_by_status(&records, StatusFilter::Inactive)), ["2", "4"]);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let records = fixture();
        assert_eq!(ids(&search(&records, "RUST")), ["1", "3", "5"]);
        assert_eq!(search(&records, "   ").len(), 5);
        assert!(search(&records, "haskell").is_empty());
    }

    #[test]
    fn category_selection_matches_literal_key() {
        let records = fixture();
        assert_eq!(ids(&filter_by_category(&records, &Selection::only("pdf"))), ["4", "5"]);
        assert_eq!(filter_by_category(&records, &Selection::All).len(), 5);
        assert!(filter_by_category(&records, &Selection::only("podcast")).is_empty());
    }

    #[test]
    fn priority_selection_uses_default_medium() {
        let records = fixture();
        assert_eq!(filter_by_priority(&records, &Selection::only("medium")).len(), 5);
        assert!(filter_by_priority(&records, &Selection::only("high")).is_empty());
    }

    #[test]
    fn composition_is_order_independent() {
        let records = fixture();
        let statuses = [StatusFilter::All, StatusFilter::Active, StatusFilter::Inactive];
        let categories = [Selection::All, Selection::only("pdf"), Selection::only("book")];
        let priorities = [Selection::All, Selection::only("medium"), Selection::only("high")];
        let queries = ["", "rust", "NOTES"];

        for status in statuses {
            for category in &categories {
                for priority in &priorities {
                    for query in queries {
                        let forward = search(
                            filter_by_priority(filter_by_category(filter_by_status(&records, status), category), priority),
                            query,
                        );
                        let backward = filter_by_status(
                            filter_by_category(filter_by_priority(search(&records, query), priority), category),
                            status,
                        );
                        assert_eq!(ids(&forward), ids(&backward));

                        let spec = FilterSpec {
                            status,
                            category: category.clone(),
                            priority: priority.clone(),
                            search: query.to_string(),
                        };
                        assert_eq!(ids(&apply_filters(&records, &spec)), ids(&forward));
                    }
                }
            }
        }
    }

    #[test]
    fn spec_parses_ui_values() {
        let spec: FilterSpec =
            serde_json::from_str(r#"{"status":"active","category":"all","priority":"high","search":"x"}"#).unwrap();
        assert_eq!(spec.status, StatusFilter::Active);
        assert_eq!(spec.category, Selection::All);
        assert_eq!(spec.priority, Selection::only("high"));

        let spec: FilterSpec = serde_json::from_str(r#"{"type":"Novel"}"#).unwrap();
        assert_eq!(spec.category, Selection::only("Novel"));
        assert_eq!(serde_json::from_str::<FilterSpec>("{}").unwrap(), FilterSpec::default());
    }

    #[test]
    fn blank_null_and_unknown_values_pass_everything() {
        for json in [
            r#"{"status":""}"#,
            r#"{"status":null}"#,
            r#"{"status":"ALL"}"#,
            r#"{"status":"archived"}"#,
            r#"{"search":null}"#,
            r#"{"status":null,"category":null,"priority":"","search":null}"#,
        ] {
            let spec: FilterSpec = serde_json::from_str(json).unwrap();
            assert_eq!(spec, FilterSpec::default(), "{json}");
            assert_eq!(apply_filters(&fixture(), &spec).len(), 5);
        }

        let spec: FilterSpec = serde_json::from_str(r#"{"status":"inactive"}"#).unwrap();
        assert_eq!(spec.status, StatusFilter::Inactive);
    }
}
