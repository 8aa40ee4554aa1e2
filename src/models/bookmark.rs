use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::{Category, Collection, Tag};

/// Bookmark as the backend sends it: memberships are bare IDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBookmark {
    pub id: String,
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub collections: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(default)]
    pub is_fav: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Bookmark with its references resolved against the lookup tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub url: String,
    pub title: String,
    pub summary: String,
    pub tags: Vec<Tag>,
    pub collections: Vec<Collection>,
    /// Zero or one entries.
    pub categories: Vec<Category>,
    pub created_at: DateTime<Utc>,
    pub is_fav: bool,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl Bookmark {
    pub fn category(&self) -> Option<&Category> {
        self.categories.first()
    }

    pub fn has_category(&self, id: &str) -> bool {
        self.categories.iter().any(|c| c.id == id)
    }

    pub fn has_collection(&self, id: &str) -> bool {
        self.collections.iter().any(|c| c.id == id)
    }

    pub fn has_tag(&self, id: &str) -> bool {
        self.tags.iter().any(|t| t.id == id)
    }

    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.url
        } else {
            &self.title
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewBookmark {
    pub url: String,
    pub title: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub collections: Vec<String>,
    pub category: Option<String>,
    pub is_fav: bool,
}

/// Partial update for `PUT /bookmarks/{id}`. Unset fields are left out of the body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookmarkPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_fav: Option<bool>,
}

impl BookmarkPatch {
    pub fn favorite(is_fav: bool) -> Self {
        Self {
            is_fav: Some(is_fav),
            ..Default::default()
        }
    }
}

/// Server-side filters for `GET /bookmarks`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookmarkQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections: Option<String>,
    #[serde(rename = "isFav", skip_serializing_if = "Option::is_none")]
    pub is_fav: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl BookmarkQuery {
    pub fn favorites() -> Self {
        Self {
            is_fav: Some(true),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// User-entered bookmark before names are resolved to IDs.
#[derive(Debug, Clone, Default)]
pub struct BookmarkDraft {
    pub url: String,
    pub title: String,
    pub summary: String,
    pub tag_names: Vec<String>,
    pub collection_names: Vec<String>,
    pub category_name: Option<String>,
    pub is_fav: bool,
}

/// Split a comma separated input line into trimmed, non-empty names.
pub fn split_names(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
