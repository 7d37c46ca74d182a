//! Library record: the item kept by the digital library list manager.
//!
//! Records are stored as camelCase JSON objects:
//!
//! ```json
//! {
//!   "id": "0b6f0a0e-5a5c-4b7e-9d51-6f3c2b8d8a11",
//!   "title": "Rust for Rustaceans",
//!   "description": "Idiomatic intermediate Rust",
//!   "category": "book",
//!   "priority": "high",
//!   "active": true,
//!   "createdAt": "2024-01-15T10:30:00Z",
//!   "updatedAt": null
//! }
//! ```
//!
//! Snapshots written by earlier versions used a numeric `id` and `name`
//! instead of `title`; both are still accepted when reading.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize};

use crate::app_response::AppResponse;
use crate::store::{next_stamp, StoredRecord, Timestamp};

/// Kind of learning resource.
///
/// Unknown values are kept verbatim in [`Category::Other`] rather than
/// rejected, so they survive a load/save cycle and show up in statistics
/// under their literal key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    Pdf,
    Video,
    Course,
    Presentation,
    Book,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Pdf => "pdf",
            Category::Video => "video",
            Category::Course => "course",
            Category::Presentation => "presentation",
            Category::Book => "book",
            Category::Other(raw) => raw,
        }
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        match value {
            "pdf" => Category::Pdf,
            "video" => Category::Video,
            "course" => Category::Course,
            "presentation" => Category::Presentation,
            "book" => Category::Book,
            other => Category::Other(other.to_string()),
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Category::from(value.as_str())
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reading priority. Unknown values are kept verbatim, like [`Category`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
    Other(String),
}

impl Priority {
    pub fn as_str(&self) -> &str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::Other(raw) => raw,
        }
    }
}

impl From<&str> for Priority {
    fn from(value: &str) -> Self {
        match value {
            "high" => Priority::High,
            "medium" => Priority::Medium,
            "low" => Priority::Low,
            other => Priority::Other(other.to_string()),
        }
    }
}

impl From<String> for Priority {
    fn from(value: String) -> Self {
        Priority::from(value.as_str())
    }
}

impl From<Priority> for String {
    fn from(value: Priority) -> Self {
        value.as_str().to_string()
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(deserialize_with = "id_from_string_or_number")]
    id: String,
    #[serde(alias = "name")]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: Category,
    #[serde(default)]
    priority: Priority,
    #[serde(default = "default_active")]
    active: bool,
    created_at: Timestamp,
    #[serde(default)]
    updated_at: Option<Timestamp>,
}

fn default_active() -> bool {
    true
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

impl Record {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn priority(&self) -> &Priority {
        &self.priority
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<Timestamp> {
        self.updated_at
    }

    #[cfg(test)]
    pub(crate) fn clear_updated_at(&mut self) {
        self.updated_at = None;
    }
}

/// Fields accepted when creating a record. Everything but the title is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordDraft {
    #[serde(alias = "name")]
    pub title: String,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
}

impl RecordDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial update; `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordPatch {
    #[serde(alias = "name")]
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
}

impl From<RecordDraft> for RecordPatch {
    fn from(draft: RecordDraft) -> Self {
        Self {
            title: Some(draft.title),
            description: draft.description,
            category: draft.category,
            priority: draft.priority,
        }
    }
}

fn required_title(title: &str) -> Result<String, AppResponse> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppResponse::validation("Title cannot be empty"));
    }
    Ok(trimmed.to_string())
}

impl StoredRecord for Record {
    type Draft = RecordDraft;
    type Patch = RecordPatch;

    fn from_draft(id: String, draft: RecordDraft, now: Timestamp) -> Result<Self, AppResponse> {
        Ok(Record {
            id,
            title: required_title(&draft.title)?,
            description: draft.description.map(|d| d.trim().to_string()).unwrap_or_default(),
            category: draft.category.unwrap_or_default(),
            priority: draft.priority.unwrap_or_default(),
            active: true,
            created_at: now,
            updated_at: None,
        })
    }

    fn apply_patch(&mut self, patch: RecordPatch, now: Timestamp) -> Result<(), AppResponse> {
        let title = patch.title.as_deref().map(required_title).transpose()?;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description.trim().to_string();
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        self.updated_at = Some(next_stamp(self.created_at, self.updated_at, now));
        Ok(())
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool, now: Timestamp) {
        self.active = active;
        self.updated_at = Some(next_stamp(self.created_at, self.updated_at, now));
    }

    fn category_key(&self) -> &str {
        self.category.as_str()
    }

    fn priority_key(&self) -> Option<&str> {
        Some(self.priority.as_str())
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.description.as_str()]
    }
}

#[cfg(test)]
pub(crate) fn sample(id: &str, title: &str, category: &str, active: bool) -> Record {
    use chrono::TimeZone;

    Record {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        category: Category::from(category),
        priority: Priority::default(),
        active,
        created_at: chrono::Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
        updated_at: None,
    }
}
