use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RepoResult, Repository};
use crate::models::{Comment, CommentPatch, NewPost, NewUser, Post, PostPatch, User, UserCredentials};

#[derive(Default)]
struct Tables {
    users: Vec<(User, String)>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    next_post_id: i64,
    next_comment_id: i64,
}

impl Tables {
    fn username(&self, id: Uuid) -> String {
        self.users
            .iter()
            .find(|(user, _)| user.id == id)
            .map(|(user, _)| user.username.clone())
            .unwrap_or_default()
    }
}

/// MemoryRepository
///
/// An in-process implementation of `Repository` with the same observable semantics
/// as `PostgresRepository`: sequential ids starting at 1, newest-first listings,
/// unique usernames and no cascade from posts to comments. Used by the test suite
/// and for running the API without a database.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

// Newest first; the higher id wins when timestamps collide.
fn newest_first<T, K: Ord>(rows: &mut [T], key: impl Fn(&T) -> K) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn list_posts(&self) -> RepoResult<Vec<Post>> {
        let mut posts = self.tables.read().await.posts.clone();
        newest_first(&mut posts, |p| (p.created_at, p.id));
        Ok(posts)
    }

    async fn get_post(&self, id: i64) -> RepoResult<Option<Post>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn create_post(&self, author: Uuid, post: NewPost) -> RepoResult<Post> {
        let mut tables = self.tables.write().await;
        tables.next_post_id += 1;

        let created = Post {
            id: tables.next_post_id,
            title: post.title,
            content: post.content,
            author,
            author_username: tables.username(author),
            created_at: Utc::now(),
        };
        tables.posts.push(created.clone());
        Ok(created)
    }

    async fn update_post(&self, id: i64, changes: PostPatch) -> RepoResult<Option<Post>> {
        let mut tables = self.tables.write().await;
        let Some(post) = tables.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: i64) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        Ok(tables.posts.len() < before)
    }

    async fn list_comments(&self) -> RepoResult<Vec<Comment>> {
        let mut comments = self.tables.read().await.comments.clone();
        newest_first(&mut comments, |c| (c.created_at, c.id));
        Ok(comments)
    }

    async fn get_comment(&self, id: i64) -> RepoResult<Option<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn create_comment(&self, author: Uuid, post: i64, content: String) -> RepoResult<Comment> {
        let mut tables = self.tables.write().await;
        tables.next_comment_id += 1;

        let created = Comment {
            id: tables.next_comment_id,
            content,
            author,
            author_username: tables.username(author),
            post,
            created_at: Utc::now(),
        };
        tables.comments.push(created.clone());
        Ok(created)
    }

    async fn update_comment(&self, id: i64, changes: CommentPatch) -> RepoResult<Option<Comment>> {
        let mut tables = self.tables.write().await;
        let Some(comment) = tables.comments.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        if let Some(content) = changes.content {
            comment.content = content;
        }
        Ok(Some(comment.clone()))
    }

    async fn delete_comment(&self, id: i64) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        Ok(tables.comments.len() < before)
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|(user, _)| user.id == id)
            .map(|(user, _)| user.clone()))
    }

    async fn get_credentials(&self, username: &str) -> RepoResult<Option<UserCredentials>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|(user, _)| user.username == username)
            .map(|(user, hash)| UserCredentials {
                id: user.id,
                password_hash: hash.clone(),
            }))
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<Option<User>> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|(u, _)| u.username == user.username) {
            return Ok(None);
        }

        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            date_joined: Utc::now(),
        };
        tables.users.push((created.clone(), user.password_hash));
        Ok(Some(created))
    }
}
