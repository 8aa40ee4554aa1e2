mod counts;
mod favorites;
mod hydrate;
mod library;
mod tags;

pub use counts::{category_counts, collection_counts, tag_counts};
pub use favorites::{FavoriteToggles, PendingToggle, ToggleOutcome};
pub use hydrate::{hydrate, hydrate_all, Lookups};
pub use library::{Library, ViewFilter};
pub use tags::{resolve_tag, resolve_tags};
