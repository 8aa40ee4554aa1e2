use std::collections::HashMap;

use crate::models::{Bookmark, Category, Collection, RawBookmark, Tag};

/// The three lookup tables bookmarks reference by ID.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lookups {
    pub categories: Vec<Category>,
    pub collections: Vec<Collection>,
    pub tags: Vec<Tag>,
}

impl Lookups {
    pub fn new(categories: Vec<Category>, collections: Vec<Collection>, tags: Vec<Tag>) -> Self {
        Self {
            categories,
            collections,
            tags,
        }
    }

    pub fn tag_by_name(&self, name: &str) -> Option<&Tag> {
        let name = name.trim().to_lowercase();
        self.tags.iter().find(|t| t.name.to_lowercase() == name)
    }

    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        let name = name.trim().to_lowercase();
        self.categories
            .iter()
            .find(|c| c.name.to_lowercase() == name)
    }

    pub fn collection_by_name(&self, name: &str) -> Option<&Collection> {
        let name = name.trim().to_lowercase();
        self.collections
            .iter()
            .find(|c| c.name.to_lowercase() == name)
    }

    fn index(&self) -> LookupIndex<'_> {
        LookupIndex {
            categories: self.categories.iter().map(|c| (c.id.as_str(), c)).collect(),
            collections: self.collections.iter().map(|c| (c.id.as_str(), c)).collect(),
            tags: self.tags.iter().map(|t| (t.id.as_str(), t)).collect(),
        }
    }
}

struct LookupIndex<'a> {
    categories: HashMap<&'a str, &'a Category>,
    collections: HashMap<&'a str, &'a Collection>,
    tags: HashMap<&'a str, &'a Tag>,
}

impl LookupIndex<'_> {
    fn join(&self, raw: &RawBookmark) -> Bookmark {
        // Dangling IDs are dropped rather than rendered.
        let tags = raw
            .tags
            .iter()
            .filter_map(|id| self.tags.get(id.as_str()).map(|t| (*t).clone()))
            .collect();

        let collections = raw
            .collections
            .iter()
            .filter_map(|id| self.collections.get(id.as_str()).map(|c| (*c).clone()))
            .collect();

        let categories = raw
            .category
            .as_deref()
            .and_then(|id| self.categories.get(id))
            .map(|c| vec![(*c).clone()])
            .unwrap_or_default();

        Bookmark {
            id: raw.id.clone(),
            url: raw.url.clone(),
            title: raw.title.clone(),
            summary: raw.summary.clone(),
            tags,
            collections,
            categories,
            created_at: raw.created_at,
            is_fav: raw.is_fav,
            user_id: raw.user_id.clone(),
            thumbnail: raw.thumbnail.clone(),
        }
    }
}

/// Resolve one raw bookmark against the lookup tables.
pub fn hydrate(raw: &RawBookmark, lookups: &Lookups) -> Bookmark {
    lookups.index().join(raw)
}

/// Resolve a batch, preserving order and length.
pub fn hydrate_all(raw: &[RawBookmark], lookups: &Lookups) -> Vec<Bookmark> {
    let index = lookups.index();
    raw.iter().map(|b| index.join(b)).collect()
}
