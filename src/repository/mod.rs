use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Comment, CommentPatch, NewPost, NewUser, Post, PostPatch, User, UserCredentials};

mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

/// Result type of every persistence call. Driver errors surface as `AppError::Database`.
pub type RepoResult<T> = Result<T, sqlx::Error>;

/// Repository Trait
///
/// The abstract contract for all persistence operations. Handlers only see
/// `Arc<dyn Repository>`, so the Postgres backend and the in-memory backend are
/// interchangeable.
///
/// Missing rows are `Ok(None)` / `Ok(false)`, never errors. Ownership is not
/// checked here; handlers apply the authorization rule before writing.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Posts ---
    /// All posts, newest first.
    async fn list_posts(&self) -> RepoResult<Vec<Post>>;
    async fn get_post(&self, id: i64) -> RepoResult<Option<Post>>;
    async fn create_post(&self, author: Uuid, post: NewPost) -> RepoResult<Post>;
    // Only the `Some` fields of `changes` are written.
    async fn update_post(&self, id: i64, changes: PostPatch) -> RepoResult<Option<Post>>;
    async fn delete_post(&self, id: i64) -> RepoResult<bool>;

    // --- Comments ---
    /// All comments, newest first.
    async fn list_comments(&self) -> RepoResult<Vec<Comment>>;
    async fn get_comment(&self, id: i64) -> RepoResult<Option<Comment>>;
    async fn create_comment(&self, author: Uuid, post: i64, content: String) -> RepoResult<Comment>;
    async fn update_comment(&self, id: i64, changes: CommentPatch) -> RepoResult<Option<Comment>>;
    async fn delete_comment(&self, id: i64) -> RepoResult<bool>;

    // --- Users ---
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn get_credentials(&self, username: &str) -> RepoResult<Option<UserCredentials>>;
    /// Returns `None` when the username is already taken; nothing is written then.
    async fn create_user(&self, user: NewUser) -> RepoResult<Option<User>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
