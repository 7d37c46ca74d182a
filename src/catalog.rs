//! Typed catalog items: books that share a common base (title, shelf,
//! active flag, timestamps) and carry a variant-specific payload.
//!
//! The variant is the type tag; it is serialized as `"type"` alongside the
//! base fields:
//!
//! ```json
//! {"id":"…","title":"Sapiens","shelf":"C3","active":true,
//!  "createdAt":"2024-01-15T10:30:00Z","updatedAt":null,
//!  "type":"HistoryBook","author":"Yuval Noah Harari",
//!  "period":"Prehistoria - Moderna","region":"Global"}
//! ```

use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;
use crate::store::{next_stamp, StoredRecord, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ItemKind {
    Novel {
        author: String,
        pages: u32,
        genre: String,
    },
    ScienceBook {
        author: String,
        field: String,
        complexity: String,
    },
    HistoryBook {
        author: String,
        period: String,
        region: String,
    },
}

impl ItemKind {
    pub const TAGS: [&'static str; 3] = ["Novel", "ScienceBook", "HistoryBook"];

    pub fn type_tag(&self) -> &'static str {
        match self {
            ItemKind::Novel { .. } => "Novel",
            ItemKind::ScienceBook { .. } => "ScienceBook",
            ItemKind::HistoryBook { .. } => "HistoryBook",
        }
    }

    pub fn author(&self) -> &str {
        match self {
            ItemKind::Novel { author, .. }
            | ItemKind::ScienceBook { author, .. }
            | ItemKind::HistoryBook { author, .. } => author,
        }
    }

    /// Payload used when a quick-add form only picks the book type.
    ///
    /// Accepts the type tags and the Spanish selector values
    /// (`Novela`, `Ciencia`, `Historia`). Anything else yields `None`.
    pub fn placeholder(selector: &str) -> Option<ItemKind> {
        match selector {
            "Novela" | "Novel" => Some(ItemKind::Novel {
                author: "Autor Desconocido".to_string(),
                pages: 200,
                genre: "General".to_string(),
            }),
            "Ciencia" | "ScienceBook" => Some(ItemKind::ScienceBook {
                author: "Autor Científico".to_string(),
                field: "General".to_string(),
                complexity: "Básico".to_string(),
            }),
            "Historia" | "HistoryBook" => Some(ItemKind::HistoryBook {
                author: "Autor Histórico".to_string(),
                period: "General".to_string(),
                region: "Global".to_string(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    id: String,
    title: String,
    shelf: String,
    #[serde(default = "default_active")]
    active: bool,
    created_at: Timestamp,
    #[serde(default)]
    updated_at: Option<Timestamp>,
    #[serde(flatten)]
    kind: ItemKind,
}

fn default_active() -> bool {
    true
}

/// Structured, display-ready view of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSummary {
    pub id: String,
    pub title: String,
    pub active: bool,
    #[serde(flatten)]
    pub details: ItemKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDraft {
    pub title: String,
    pub shelf: String,
    #[serde(flatten)]
    pub kind: ItemKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogPatch {
    pub title: Option<String>,
    pub shelf: Option<String>,
    #[serde(skip)]
    pub kind: Option<ItemKind>,
}

impl From<CatalogDraft> for CatalogPatch {
    fn from(draft: CatalogDraft) -> Self {
        Self {
            title: Some(draft.title),
            shelf: Some(draft.shelf),
            kind: Some(draft.kind),
        }
    }
}

fn non_blank(value: &str, what: &str) -> Result<String, AppResponse> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppResponse::validation(format!("{what} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

impl CatalogItem {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn shelf(&self) -> &str {
        &self.shelf
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
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

    pub fn type_tag(&self) -> &'static str {
        self.kind.type_tag()
    }

    /// Moves the item to another shelf. Blank values are rejected and leave the item untouched.
    pub fn set_shelf(&mut self, shelf: &str) -> Result<(), AppResponse> {
        self.shelf = non_blank(shelf, "Shelf")?;
        Ok(())
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn summary(&self) -> ItemSummary {
        ItemSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            active: self.active,
            details: self.kind.clone(),
        }
    }
}

impl StoredRecord for CatalogItem {
    type Draft = CatalogDraft;
    type Patch = CatalogPatch;

    fn from_draft(id: String, draft: CatalogDraft, now: Timestamp) -> Result<Self, AppResponse> {
        let title = non_blank(&draft.title, "Title")?;
        let shelf = non_blank(&draft.shelf, "Shelf")?;

        Ok(CatalogItem {
            id,
            title,
            shelf,
            active: true,
            created_at: now,
            updated_at: None,
            kind: draft.kind,
        })
    }

    fn apply_patch(&mut self, patch: CatalogPatch, now: Timestamp) -> Result<(), AppResponse> {
        let title = patch.title.as_deref().map(|t| non_blank(t, "Title")).transpose()?;
        if let Some(shelf) = patch.shelf.as_deref() {
            self.set_shelf(shelf)?;
        }
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
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
        if active {
            self.activate();
        } else {
            self.deactivate();
        }
        self.updated_at = Some(next_stamp(self.created_at, self.updated_at, now));
    }

    fn category_key(&self) -> &str {
        self.type_tag()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str()]
    }
}

/// The three demo books a fresh catalog starts with.
pub fn seed_catalog() -> Vec<CatalogDraft> {
    vec![
        CatalogDraft {
            title: "Cien años de soledad".to_string(),
            shelf: "A1".to_string(),
            kind: ItemKind::Novel {
                author: "Gabriel García Márquez".to_string(),
                pages: 417,
                genre: "Realismo mágico".to_string(),
            },
        },
        CatalogDraft {
            title: "Breve historia del tiempo".to_string(),
            shelf: "B2".to_string(),
            kind: ItemKind::ScienceBook {
                author: "Stephen Hawking".to_string(),
                field: "Física".to_string(),
                complexity: "Intermedio".to_string(),
            },
        },
        CatalogDraft {
            title: "Sapiens".to_string(),
            shelf: "C3".to_string(),
            kind: ItemKind::HistoryBook {
                author: "Yuval Noah Harari".to_string(),
                period: "Prehistoria - Moderna".to_string(),
                region: "Global".to_string(),
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
    }

    fn novel() -> CatalogItem {
        let draft = seed_catalog().remove(0);
        CatalogItem::from_draft("n1".to_string(), draft, now()).unwrap()
    }

    #[test]
    fn type_tag_follows_variant() {
        let tags: Vec<&str> = seed_catalog()
            .into_iter()
            .enumerate()
            .map(|(i, d)| CatalogItem::from_draft(i.to_string(), d, now()).unwrap().type_tag())
            .collect();
        assert_eq!(tags, ItemKind::TAGS.to_vec());
    }

    #[test]
    fn set_shelf_rejects_blank_and_keeps_previous() {
        let mut item = novel();
        let err = item.set_shelf("   ").unwrap_err();
        assert!(matches!(err, AppResponse::ValidationError(_)));
        assert_eq!(item.shelf(), "A1");

        item.set_shelf("  D4 ").unwrap();
        assert_eq!(item.shelf(), "D4");
    }

    #[test]
    fn patch_with_blank_shelf_changes_nothing() {
        let mut item = novel();
        let before = item.clone();
        let patch = CatalogPatch {
            title: Some("Renamed".to_string()),
            shelf: Some(String::new()),
            kind: None,
        };
        assert!(item.apply_patch(patch, now()).is_err());
        assert_eq!(item, before);
    }

    #[test]
    fn activate_and_deactivate_are_idempotent() {
        let mut item = novel();
        item.activate();
        assert!(item.is_active());
        item.deactivate();
        item.deactivate();
        assert!(!item.is_active());
    }

    #[test]
    fn summary_carries_variant_fields() {
        let value = serde_json::to_value(novel().summary()).unwrap();
        assert_eq!(value["type"], "Novel");
        assert_eq!(value["author"], "Gabriel García Márquez");
        assert_eq!(value["pages"], 417);
        assert_eq!(value["title"], "Cien años de soledad");
        assert_eq!(value["active"], true);
    }

    #[test]
    fn persisted_shape_round_trips() {
        let item = novel();
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains(r#""type":"Novel""#));
        assert!(json.contains(r#""createdAt""#));
        let back: CatalogItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn placeholder_accepts_form_selectors_only() {
        assert_eq!(ItemKind::placeholder("Ciencia").unwrap().type_tag(), "ScienceBook");
        assert_eq!(ItemKind::placeholder("HistoryBook").unwrap().author(), "Autor Histórico");
        assert!(ItemKind::placeholder("Poesía").is_none());
    }
}
