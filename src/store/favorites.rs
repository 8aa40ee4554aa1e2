use std::collections::HashSet;

use crate::error::Result;
use crate::models::BookmarkPatch;
use crate::services::MarklyApi;

use super::Library;

/// An optimistic favorite flip that has been applied locally but not yet
/// confirmed by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToggle {
    pub id: String,
    pub previous: bool,
    pub next: bool,
}

impl PendingToggle {
    pub fn patch(&self) -> BookmarkPatch {
        BookmarkPatch::favorite(self.next)
    }

    /// Send the partial update. Safe to run on a spawned task.
    pub async fn send<A>(&self, api: &A) -> Result<()>
    where
        A: MarklyApi + ?Sized,
    {
        api.update_bookmark(&self.id, &self.patch()).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Committed { id: String, is_fav: bool },
    RolledBack { id: String, is_fav: bool, message: String },
}

/// Tracks in-flight favorite toggles so each bookmark has at most one.
///
/// Per bookmark: idle -> pending (begin) -> committed | rolled back (settle).
#[derive(Debug, Default)]
pub struct FavoriteToggles {
    in_flight: HashSet<String>,
}

impl FavoriteToggles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.in_flight.contains(id)
    }

    /// Flip the flag locally and mark the bookmark pending.
    pub fn begin(&mut self, library: &mut Library, id: &str) -> Option<PendingToggle> {
        if self.in_flight.contains(id) {
            tracing::debug!("Favorite toggle for {} already in flight", id);
            return None;
        }

        let previous = library.bookmark(id)?.is_fav;
        let next = !previous;
        library.set_favorite(id, next)?;
        self.in_flight.insert(id.to_string());

        Some(PendingToggle {
            id: id.to_string(),
            previous,
            next,
        })
    }

    /// Apply the backend's answer. Failures restore the captured value rather
    /// than re-fetching. An expired session is rolled back and then returned
    /// as an error.
    pub fn settle(
        &mut self,
        library: &mut Library,
        pending: PendingToggle,
        result: Result<()>,
    ) -> Result<ToggleOutcome> {
        self.in_flight.remove(&pending.id);

        match result {
            Ok(()) => {
                // A reload while in flight may have brought back the old value
                library.set_favorite(&pending.id, pending.next);
                Ok(ToggleOutcome::Committed {
                    id: pending.id,
                    is_fav: pending.next,
                })
            }
            Err(e) => {
                library.set_favorite(&pending.id, pending.previous);
                tracing::warn!("Rolled back favorite on {}: {}", pending.id, e);
                if e.is_unauthorized() {
                    return Err(e);
                }
                Ok(ToggleOutcome::RolledBack {
                    id: pending.id,
                    is_fav: pending.previous,
                    message: e.to_string(),
                })
            }
        }
    }

    /// Settle, then resync with the backend once it has agreed.
    pub async fn finish<A>(
        &mut self,
        library: &mut Library,
        api: &A,
        pending: PendingToggle,
        result: Result<()>,
    ) -> Result<ToggleOutcome>
    where
        A: MarklyApi + ?Sized,
    {
        let outcome = self.settle(library, pending, result)?;
        if matches!(outcome, ToggleOutcome::Committed { .. }) {
            library.after_write(api).await?;
        }
        Ok(outcome)
    }
}
