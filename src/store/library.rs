use crate::error::{AppError, Result};
use crate::models::{
    Bookmark, BookmarkDraft, BookmarkQuery, Category, Collection, NewBookmark, NewCategory,
    NewCollection, RawBookmark, Tag,
};
use crate::services::MarklyApi;

use super::{
    category_counts, collection_counts, hydrate, hydrate_all, resolve_tag, resolve_tags,
    tag_counts, Lookups,
};

/// Which slice of the library is on screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewFilter {
    #[default]
    All,
    Favorites,
    Category(String),
    Collection(String),
    Tag(String),
}

impl ViewFilter {
    pub fn matches(&self, bookmark: &Bookmark) -> bool {
        match self {
            ViewFilter::All => true,
            ViewFilter::Favorites => bookmark.is_fav,
            ViewFilter::Category(id) => bookmark.has_category(id),
            ViewFilter::Collection(id) => bookmark.has_collection(id),
            ViewFilter::Tag(id) => bookmark.has_tag(id),
        }
    }
}

/// Client-side copy of everything the user has: the raw records, the lookup
/// tables, and the hydrated bookmarks derived from them.
#[derive(Debug, Default)]
pub struct Library {
    lookups: Lookups,
    raw: Vec<RawBookmark>,
    bookmarks: Vec<Bookmark>,
    reload_after_write: bool,
}

impl Library {
    pub fn new(reload_after_write: bool) -> Self {
        Self {
            reload_after_write,
            ..Default::default()
        }
    }

    /// Fetch bookmarks and the three lookup tables concurrently, then hydrate.
    /// On error the previous contents are kept.
    pub async fn load<A>(&mut self, api: &A) -> Result<()>
    where
        A: MarklyApi + ?Sized,
    {
        let all = BookmarkQuery::default();
        let (raw, categories, collections, tags) = futures::try_join!(
            api.list_bookmarks(&all),
            api.list_categories(),
            api.list_collections(),
            api.list_tags(),
        )?;

        tracing::debug!(
            "Loaded {} bookmarks, {} categories, {} collections, {} tags",
            raw.len(),
            categories.len(),
            collections.len(),
            tags.len()
        );

        self.lookups = Lookups::new(categories, collections, tags);
        self.raw = raw;
        self.rehydrate();
        Ok(())
    }

    pub async fn reload<A>(&mut self, api: &A) -> Result<()>
    where
        A: MarklyApi + ?Sized,
    {
        self.load(api).await
    }

    pub(crate) async fn after_write<A>(&mut self, api: &A) -> Result<()>
    where
        A: MarklyApi + ?Sized,
    {
        if self.reload_after_write {
            self.reload(api).await?;
        }
        Ok(())
    }

    pub fn reloads_after_write(&self) -> bool {
        self.reload_after_write
    }

    pub fn rehydrate(&mut self) {
        self.bookmarks = hydrate_all(&self.raw, &self.lookups);
    }

    pub fn lookups(&self) -> &Lookups {
        &self.lookups
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn bookmark(&self, id: &str) -> Option<&Bookmark> {
        self.bookmarks.iter().find(|b| b.id == id)
    }

    pub fn favorites(&self) -> Vec<&Bookmark> {
        self.filtered(&ViewFilter::Favorites)
    }

    pub fn filtered(&self, view: &ViewFilter) -> Vec<&Bookmark> {
        self.bookmarks.iter().filter(|b| view.matches(b)).collect()
    }

    pub fn category_counts(&self) -> Vec<(&Category, usize)> {
        category_counts(&self.lookups.categories, &self.bookmarks)
    }

    pub fn collection_counts(&self) -> Vec<(&Collection, usize)> {
        collection_counts(&self.lookups.collections, &self.bookmarks)
    }

    pub fn tag_counts(&self) -> Vec<(&Tag, usize)> {
        tag_counts(&self.lookups.tags, &self.bookmarks)
    }

    /// Sidebar entries in display order.
    pub fn views(&self) -> Vec<ViewFilter> {
        let mut views = vec![ViewFilter::All, ViewFilter::Favorites];
        views.extend(self.lookups.categories.iter().map(|c| ViewFilter::Category(c.id.clone())));
        views.extend(self.lookups.collections.iter().map(|c| ViewFilter::Collection(c.id.clone())));
        views.extend(self.lookups.tags.iter().map(|t| ViewFilter::Tag(t.id.clone())));
        views
    }

    pub fn view_label(&self, view: &ViewFilter) -> String {
        match view {
            ViewFilter::All => "All bookmarks".to_string(),
            ViewFilter::Favorites => "Favorites".to_string(),
            ViewFilter::Category(id) => self
                .lookups
                .categories
                .iter()
                .find(|c| &c.id == id)
                .map(|c| c.label())
                .unwrap_or_else(|| "Unknown category".to_string()),
            ViewFilter::Collection(id) => self
                .lookups
                .collections
                .iter()
                .find(|c| &c.id == id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "Unknown collection".to_string()),
            ViewFilter::Tag(id) => self
                .lookups
                .tags
                .iter()
                .find(|t| &t.id == id)
                .map(|t| format!("#{}", t.name))
                .unwrap_or_else(|| "Unknown tag".to_string()),
        }
    }

    /// Set the favorite flag locally on both the raw and hydrated record.
    /// Returns the previous value, or `None` if the bookmark is unknown.
    pub fn set_favorite(&mut self, id: &str, is_fav: bool) -> Option<bool> {
        let raw = self.raw.iter_mut().find(|b| b.id == id)?;
        let previous = raw.is_fav;
        raw.is_fav = is_fav;
        if let Some(bookmark) = self.bookmarks.iter_mut().find(|b| b.id == id) {
            bookmark.is_fav = is_fav;
        }
        Some(previous)
    }

    /// Insert or replace one raw record and refresh its hydrated copy.
    pub fn upsert_raw(&mut self, raw: RawBookmark) {
        let hydrated = hydrate(&raw, &self.lookups);
        match self.raw.iter().position(|b| b.id == raw.id) {
            Some(index) => {
                self.raw[index] = raw;
                self.bookmarks[index] = hydrated;
            }
            None => {
                self.raw.push(raw);
                self.bookmarks.push(hydrated);
            }
        }
    }

    pub async fn add_bookmark<A>(&mut self, api: &A, draft: BookmarkDraft) -> Result<RawBookmark>
    where
        A: MarklyApi + ?Sized,
    {
        let url = draft.url.trim();
        if url.is_empty() {
            return Err(AppError::InvalidInput("URL is required".to_string()));
        }
        url::Url::parse(url)?;

        let collections = draft
            .collection_names
            .iter()
            .map(|name| {
                self.lookups
                    .collection_by_name(name)
                    .map(|c| c.id.clone())
                    .ok_or_else(|| AppError::InvalidInput(format!("Unknown collection: {name}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let category = match draft.category_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(
                self.lookups
                    .category_by_name(name)
                    .map(|c| c.id.clone())
                    .ok_or_else(|| AppError::InvalidInput(format!("Unknown category: {name}")))?,
            ),
            _ => None,
        };

        // Unknown tag names are created before the bookmark is written.
        let tags = resolve_tags(&mut self.lookups, api, &draft.tag_names).await?;

        let request = NewBookmark {
            url: url.to_string(),
            title: draft.title.trim().to_string(),
            summary: draft.summary.trim().to_string(),
            tags,
            collections,
            category,
            is_fav: draft.is_fav,
        };

        let created = api.create_bookmark(&request).await?;
        tracing::info!("Saved bookmark {}", created.url);
        self.upsert_raw(created.clone());
        self.after_write(api).await?;
        Ok(created)
    }

    pub async fn add_category<A>(&mut self, api: &A, name: &str, emoji: Option<&str>) -> Result<Category>
    where
        A: MarklyApi + ?Sized,
    {
        let name = required_name(name, "Category")?;
        let request = NewCategory {
            name,
            emoji: emoji.map(str::trim).filter(|e| !e.is_empty()).map(str::to_string),
        };
        let created = api.create_category(&request).await?;
        self.lookups.categories.push(created.clone());
        self.rehydrate();
        self.after_write(api).await?;
        Ok(created)
    }

    pub async fn add_collection<A>(&mut self, api: &A, name: &str) -> Result<Collection>
    where
        A: MarklyApi + ?Sized,
    {
        let request = NewCollection {
            name: required_name(name, "Collection")?,
        };
        let created = api.create_collection(&request).await?;
        self.lookups.collections.push(created.clone());
        self.rehydrate();
        self.after_write(api).await?;
        Ok(created)
    }

    /// Delete a collection. Bookmarks keep the stale ID on the server, but it
    /// no longer resolves so it disappears from their hydrated form.
    pub async fn delete_collection<A>(&mut self, api: &A, id: &str) -> Result<()>
    where
        A: MarklyApi + ?Sized,
    {
        api.delete_collection(id).await?;
        self.lookups.collections.retain(|c| c.id != id);
        self.rehydrate();
        self.after_write(api).await
    }

    pub async fn add_tag<A>(&mut self, api: &A, name: &str) -> Result<String>
    where
        A: MarklyApi + ?Sized,
    {
        let name = required_name(name, "Tag")?;
        let id = resolve_tag(&mut self.lookups, api, &name)
            .await?
            .ok_or_else(|| AppError::InvalidInput(format!("Could not create tag {name}")))?;
        self.after_write(api).await?;
        Ok(id)
    }

    /// Ask the backend for a fresh summary and pull the updated record.
    /// Takes no library so it can run on a spawned task; feed the result
    /// to `upsert_raw`.
    pub async fn fetch_summary<A>(api: &A, id: &str) -> Result<RawBookmark>
    where
        A: MarklyApi + ?Sized,
    {
        api.summarize(id).await?;
        api.get_bookmark(id).await
    }
}

fn required_name(name: &str, what: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput(format!("{what} name is required")));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::services::fake::{category, collection, raw, tag, FakeBackend};

    fn backend() -> FakeBackend {
        let mut fav = raw("b2", &["t1"], &["col-1"], Some("dev-1"));
        fav.is_fav = true;
        FakeBackend::new()
            .with_bookmarks(vec![raw("b1", &["t1", "t-gone"], &[], None), fav])
            .with_categories(vec![category("dev-1", "Dev")])
            .with_collections(vec![collection("col-1", "Reading")])
            .with_tags(vec![tag("t1", "rust")])
    }

    #[tokio::test]
    async fn test_load_hydrates_everything() {
        let api = backend();
        let mut library = Library::new(true);

        library.load(&api).await.unwrap();

        assert_eq!(library.bookmarks().len(), 2);
        let first = library.bookmark("b1").unwrap();
        assert_eq!(first.tags.len(), 1);
        let second = library.bookmark("b2").unwrap();
        assert_eq!(second.category().map(|c| c.name.as_str()), Some("Dev"));
        assert_eq!(library.favorites().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_state() {
        let api = backend();
        let mut library = Library::new(true);
        library.load(&api).await.unwrap();

        api.fail_category_list.store(true, Ordering::SeqCst);
        api.bookmarks.lock().unwrap().clear();

        assert!(library.reload(&api).await.is_err());
        assert_eq!(library.bookmarks().len(), 2);
        assert_eq!(library.lookups().categories.len(), 1);
    }

    #[tokio::test]
    async fn test_filters_and_counts() {
        let api = backend();
        let mut library = Library::new(false);
        library.load(&api).await.unwrap();

        assert_eq!(library.filtered(&ViewFilter::All).len(), 2);
        assert_eq!(library.filtered(&ViewFilter::Tag("t1".into())).len(), 2);
        assert_eq!(library.filtered(&ViewFilter::Collection("col-1".into())).len(), 1);
        assert_eq!(library.filtered(&ViewFilter::Category("dev-1".into())).len(), 1);

        let counts: Vec<usize> = library.category_counts().into_iter().map(|(_, n)| n).collect();
        assert_eq!(counts, vec![1]);
        assert_eq!(library.views().len(), 5);
        assert_eq!(library.view_label(&ViewFilter::Tag("t1".into())), "#rust");
    }

    #[tokio::test]
    async fn test_add_bookmark_creates_missing_tags_first() {
        let api = backend();
        let mut library = Library::new(true);
        library.load(&api).await.unwrap();

        let draft = BookmarkDraft {
            url: "https://tokio.rs".to_string(),
            title: "Tokio".to_string(),
            tag_names: vec!["Rust".to_string(), "async".to_string()],
            collection_names: vec!["reading".to_string()],
            category_name: Some("dev".to_string()),
            ..Default::default()
        };
        let created = library.add_bookmark(&api, draft).await.unwrap();

        assert_eq!(created.tags.len(), 2);
        assert_eq!(created.tags[0], "t1");
        assert_eq!(created.collections, vec!["col-1".to_string()]);
        assert_eq!(created.category.as_deref(), Some("dev-1"));
        assert_eq!(api.tag_creates.load(Ordering::SeqCst), 1);

        let hydrated = library.bookmark(&created.id).unwrap();
        assert_eq!(hydrated.tags.len(), 2);
        assert_eq!(library.bookmarks().len(), 3);
    }

    #[tokio::test]
    async fn test_add_bookmark_rejects_bad_input() {
        let api = backend();
        let mut library = Library::new(false);
        library.load(&api).await.unwrap();

        let missing_url = library.add_bookmark(&api, BookmarkDraft::default()).await;
        assert!(matches!(missing_url, Err(AppError::InvalidInput(_))));

        let bad_url = BookmarkDraft {
            url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(library.add_bookmark(&api, bad_url).await, Err(AppError::Url(_))));

        let unknown_collection = BookmarkDraft {
            url: "https://example.org".to_string(),
            collection_names: vec!["nope".to_string()],
            ..Default::default()
        };
        assert!(library.add_bookmark(&api, unknown_collection).await.is_err());
        assert_eq!(api.bookmarks.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_collection_drops_references() {
        let api = backend();
        let mut library = Library::new(false);
        library.load(&api).await.unwrap();

        library.delete_collection(&api, "col-1").await.unwrap();

        assert!(library.lookups().collections.is_empty());
        assert!(library.bookmark("b2").unwrap().collections.is_empty());
    }

    #[tokio::test]
    async fn test_writes_trigger_reload() {
        let api = backend();
        let mut library = Library::new(true);
        library.load(&api).await.unwrap();
        let before = api.bookmark_lists.load(Ordering::SeqCst);

        library.add_category(&api, "News", Some("📰")).await.unwrap();
        library.add_collection(&api, "Later").await.unwrap();

        assert_eq!(api.bookmark_lists.load(Ordering::SeqCst), before + 2);
        assert_eq!(library.lookups().categories.len(), 2);
        assert_eq!(library.lookups().collections.len(), 2);
    }

    #[tokio::test]
    async fn test_blank_names_rejected() {
        let api = backend();
        let mut library = Library::new(false);

        assert!(library.add_category(&api, "  ", None).await.is_err());
        assert!(library.add_collection(&api, "").await.is_err());
        assert!(library.add_tag(&api, " ").await.is_err());
    }

    #[tokio::test]
    async fn test_summarize_refreshes_record() {
        let api = backend();
        let mut library = Library::new(false);
        library.load(&api).await.unwrap();

        let updated = Library::fetch_summary(&api, "b1").await.unwrap();
        assert_eq!(library.bookmark("b1").unwrap().summary, "");
        library.upsert_raw(updated);

        assert_eq!(library.bookmark("b1").unwrap().summary, "Summary of Bookmark b1");
    }
}
