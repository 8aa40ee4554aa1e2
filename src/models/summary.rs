use serde::{Deserialize, Serialize};

/// Bookmark suggestion from `GET /agent/suggestions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryStatus {
    #[default]
    Idle,
    Generating,
    Generated,
    Failed,
}
