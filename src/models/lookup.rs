use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

impl Category {
    pub fn label(&self) -> String {
        match self.emoji.as_deref() {
            Some(emoji) if !emoji.is_empty() => format!("{emoji} {}", self.name),
            _ => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(default, alias = "weekly_count", skip_serializing_if = "Option::is_none")]
    pub weekly_count: Option<i64>,
    #[serde(default, alias = "prev_count", skip_serializing_if = "Option::is_none")]
    pub prev_count: Option<i64>,
    #[serde(default, alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Tag {
    /// Week-over-week change in usage, when the backend reports both counts.
    pub fn trend(&self) -> Option<i64> {
        Some(self.weekly_count? - self.prev_count?)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCollection {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTag {
    pub name: String,
}
