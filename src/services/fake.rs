//! In-memory backend used by the store tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::error::{AppError, Result};
use crate::models::{
    BookmarkPatch, BookmarkQuery, Category, Collection, Credentials, NewBookmark, NewCategory,
    NewCollection, NewTag, RawBookmark, Registration, Suggestion, Tag, User,
};

use super::MarklyApi;

#[derive(Default)]
pub struct FakeBackend {
    pub bookmarks: Mutex<Vec<RawBookmark>>,
    pub categories: Mutex<Vec<Category>>,
    pub collections: Mutex<Vec<Collection>>,
    pub tags: Mutex<Vec<Tag>>,
    pub fail_updates: AtomicBool,
    pub fail_tag_creates: AtomicBool,
    pub fail_category_list: AtomicBool,
    pub fail_me: AtomicBool,
    pub expired: AtomicBool,
    pub tag_creates: AtomicUsize,
    pub bookmark_lists: AtomicUsize,
    next_id: AtomicUsize,
}

pub fn raw(id: &str, tags: &[&str], collections: &[&str], category: Option<&str>) -> RawBookmark {
    RawBookmark {
        id: id.to_string(),
        url: format!("https://example.com/{id}"),
        title: format!("Bookmark {id}"),
        summary: String::new(),
        tags: tags.iter().map(|s| s.to_string()).collect(),
        collections: collections.iter().map(|s| s.to_string()).collect(),
        category: category.map(|s| s.to_string()),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        user_id: "u1".to_string(),
        is_fav: false,
        thumbnail: None,
    }
}

pub fn category(id: &str, name: &str) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
        emoji: None,
    }
}

pub fn collection(id: &str, name: &str) -> Collection {
    Collection {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn tag(id: &str, name: &str) -> Tag {
    Tag {
        id: id.to_string(),
        name: name.to_string(),
        weekly_count: None,
        prev_count: None,
        created_at: None,
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bookmarks(self, bookmarks: Vec<RawBookmark>) -> Self {
        *self.bookmarks.lock().unwrap() = bookmarks;
        self
    }

    pub fn with_categories(self, categories: Vec<Category>) -> Self {
        *self.categories.lock().unwrap() = categories;
        self
    }

    pub fn with_collections(self, collections: Vec<Collection>) -> Self {
        *self.collections.lock().unwrap() = collections;
        self
    }

    pub fn with_tags(self, tags: Vec<Tag>) -> Self {
        *self.tags.lock().unwrap() = tags;
        self
    }

    pub fn stored_fav(&self, id: &str) -> Option<bool> {
        self.bookmarks
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.is_fav)
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("{prefix}-new-{n}")
    }

    fn failure() -> AppError {
        AppError::Api {
            status: 500,
            message: "backend unavailable".to_string(),
        }
    }
}

#[async_trait]
impl MarklyApi for FakeBackend {
    async fn login(&self, _credentials: &Credentials) -> Result<()> {
        Ok(())
    }

    async fn register(&self, _registration: &Registration) -> Result<()> {
        Ok(())
    }

    async fn me(&self) -> Result<User> {
        if self.fail_me.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(User {
            id: "u1".to_string(),
            email: "me@example.com".to_string(),
            name: None,
        })
    }

    async fn list_bookmarks(&self, query: &BookmarkQuery) -> Result<Vec<RawBookmark>> {
        self.bookmark_lists.fetch_add(1, Ordering::SeqCst);
        let bookmarks = self.bookmarks.lock().unwrap().clone();
        Ok(bookmarks
            .into_iter()
            .filter(|b| query.is_fav.map_or(true, |fav| b.is_fav == fav))
            .collect())
    }

    async fn get_bookmark(&self, id: &str) -> Result<RawBookmark> {
        self.bookmarks
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    async fn create_bookmark(&self, bookmark: &NewBookmark) -> Result<RawBookmark> {
        let mut created = raw(&self.next_id("b"), &[], &[], None);
        created.url = bookmark.url.clone();
        created.title = bookmark.title.clone();
        created.summary = bookmark.summary.clone();
        created.tags = bookmark.tags.clone();
        created.collections = bookmark.collections.clone();
        created.category = bookmark.category.clone();
        created.is_fav = bookmark.is_fav;
        self.bookmarks.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_bookmark(&self, id: &str, patch: &BookmarkPatch) -> Result<()> {
        if self.expired.load(Ordering::SeqCst) {
            return Err(AppError::Unauthorized);
        }
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        let mut bookmarks = self.bookmarks.lock().unwrap();
        let bookmark = bookmarks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        if let Some(is_fav) = patch.is_fav {
            bookmark.is_fav = is_fav;
        }
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        if self.fail_category_list.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(self.categories.lock().unwrap().clone())
    }

    async fn create_category(&self, new: &NewCategory) -> Result<Category> {
        let created = Category {
            id: self.next_id("cat"),
            name: new.name.clone(),
            emoji: new.emoji.clone(),
        };
        self.categories.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn list_collections(&self) -> Result<Vec<Collection>> {
        Ok(self.collections.lock().unwrap().clone())
    }

    async fn create_collection(&self, new: &NewCollection) -> Result<Collection> {
        let created = collection(&self.next_id("col"), &new.name);
        self.collections.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn delete_collection(&self, id: &str) -> Result<()> {
        let mut collections = self.collections.lock().unwrap();
        let before = collections.len();
        collections.retain(|c| c.id != id);
        if collections.len() == before {
            return Err(AppError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        Ok(self.tags.lock().unwrap().clone())
    }

    async fn list_user_tags(&self) -> Result<Vec<Tag>> {
        self.list_tags().await
    }

    async fn create_tag(&self, new: &NewTag) -> Result<Tag> {
        self.tag_creates.fetch_add(1, Ordering::SeqCst);
        if self.expired.load(Ordering::SeqCst) {
            return Err(AppError::Unauthorized);
        }
        if self.fail_tag_creates.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        let created = tag(&self.next_id("tag"), &new.name);
        self.tags.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn summarize(&self, id: &str) -> Result<()> {
        let mut bookmarks = self.bookmarks.lock().unwrap();
        let bookmark = bookmarks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        bookmark.summary = format!("Summary of {}", bookmark.title);
        Ok(())
    }

    async fn suggestions(&self) -> Result<Vec<Suggestion>> {
        Ok(vec![Suggestion {
            url: "https://docs.rs".to_string(),
            title: "Docs.rs".to_string(),
            reason: Some("You save a lot of Rust links".to_string()),
        }])
    }
}
