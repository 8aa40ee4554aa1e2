use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    BookmarkPatch, BookmarkQuery, Category, Collection, Credentials, NewBookmark, NewCategory,
    NewCollection, NewTag, RawBookmark, Registration, Suggestion, Tag, User,
};

/// Operations the client performs against the Markly REST API.
///
/// [`super::ApiClient`] is the HTTP implementation; the store layer only
/// depends on this trait.
#[async_trait]
pub trait MarklyApi: Send + Sync {
    /// Exchange credentials for a token and remember it in the session.
    async fn login(&self, credentials: &Credentials) -> Result<()>;

    async fn register(&self, registration: &Registration) -> Result<()>;

    async fn me(&self) -> Result<User>;

    async fn list_bookmarks(&self, query: &BookmarkQuery) -> Result<Vec<RawBookmark>>;

    async fn get_bookmark(&self, id: &str) -> Result<RawBookmark>;

    async fn create_bookmark(&self, bookmark: &NewBookmark) -> Result<RawBookmark>;

    async fn update_bookmark(&self, id: &str, patch: &BookmarkPatch) -> Result<()>;

    async fn list_categories(&self) -> Result<Vec<Category>>;

    async fn create_category(&self, category: &NewCategory) -> Result<Category>;

    async fn list_collections(&self) -> Result<Vec<Collection>>;

    async fn create_collection(&self, collection: &NewCollection) -> Result<Collection>;

    async fn delete_collection(&self, id: &str) -> Result<()>;

    async fn list_tags(&self) -> Result<Vec<Tag>>;

    /// Tags the current user has applied to at least one bookmark.
    async fn list_user_tags(&self) -> Result<Vec<Tag>>;

    async fn create_tag(&self, tag: &NewTag) -> Result<Tag>;

    /// Ask the backend to (re)generate the AI summary of a bookmark.
    async fn summarize(&self, id: &str) -> Result<()>;

    async fn suggestions(&self) -> Result<Vec<Suggestion>>;
}
