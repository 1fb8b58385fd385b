use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{RepoResult, Repository};
use crate::models::{Comment, CommentPatch, NewPost, NewUser, Post, PostPatch, User, UserCredentials};

// Both record types are always returned joined with the author's username.
const POST_SELECT: &str = r#"
    SELECT p.id, p.title, p.content, p.author_id AS author,
           u.username AS author_username, p.created_at
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.content, c.author_id AS author,
           u.username AS author_username, c.post_id AS post, c.created_at
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Queries are checked at runtime, so building the crate needs no live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// list_posts
    ///
    /// Newest first. `id` breaks ties between posts created in the same instant.
    async fn list_posts(&self) -> RepoResult<Vec<Post>> {
        let query = format!("{POST_SELECT} ORDER BY p.created_at DESC, p.id DESC");
        sqlx::query_as::<_, Post>(&query).fetch_all(&self.pool).await
    }

    async fn get_post(&self, id: i64) -> RepoResult<Option<Post>> {
        let query = format!("{POST_SELECT} WHERE p.id = $1");
        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// create_post
    ///
    /// Inserts and joins the author's username in one round trip using a CTE.
    async fn create_post(&self, author: Uuid, post: NewPost) -> RepoResult<Post> {
        sqlx::query_as::<_, Post>(
            r#"
            WITH inserted AS (
                INSERT INTO posts (title, content, author_id) VALUES ($1, $2, $3)
                RETURNING id, title, content, author_id, created_at
            )
            SELECT i.id, i.title, i.content, i.author_id AS author,
                   u.username AS author_username, i.created_at
            FROM inserted i JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(post.title)
        .bind(post.content)
        .bind(author)
        .fetch_one(&self.pool)
        .await
    }

    /// update_post
    ///
    /// Uses `COALESCE` so that `None` fields keep their stored value.
    async fn update_post(&self, id: i64, changes: PostPatch) -> RepoResult<Option<Post>> {
        sqlx::query_as::<_, Post>(
            r#"
            WITH updated AS (
                UPDATE posts
                SET title = COALESCE($2, title),
                    content = COALESCE($3, content)
                WHERE id = $1
                RETURNING id, title, content, author_id, created_at
            )
            SELECT d.id, d.title, d.content, d.author_id AS author,
                   u.username AS author_username, d.created_at
            FROM updated d JOIN users u ON u.id = d.author_id
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.content)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_post(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(&self) -> RepoResult<Vec<Comment>> {
        let query = format!("{COMMENT_SELECT} ORDER BY c.created_at DESC, c.id DESC");
        sqlx::query_as::<_, Comment>(&query).fetch_all(&self.pool).await
    }

    async fn get_comment(&self, id: i64) -> RepoResult<Option<Comment>> {
        let query = format!("{COMMENT_SELECT} WHERE c.id = $1");
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// create_comment
    ///
    /// The caller has already checked that `post` exists; the table carries no
    /// foreign key on it, so deleting the post later leaves this row in place.
    async fn create_comment(&self, author: Uuid, post: i64, content: String) -> RepoResult<Comment> {
        sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (content, author_id, post_id) VALUES ($1, $2, $3)
                RETURNING id, content, author_id, post_id, created_at
            )
            SELECT i.id, i.content, i.author_id AS author,
                   u.username AS author_username, i.post_id AS post, i.created_at
            FROM inserted i JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(content)
        .bind(author)
        .bind(post)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_comment(&self, id: i64, changes: CommentPatch) -> RepoResult<Option<Comment>> {
        sqlx::query_as::<_, Comment>(
            r#"
            WITH updated AS (
                UPDATE comments
                SET content = COALESCE($2, content)
                WHERE id = $1
                RETURNING id, content, author_id, post_id, created_at
            )
            SELECT d.id, d.content, d.author_id AS author,
                   u.username AS author_username, d.post_id AS post, d.created_at
            FROM updated d JOIN users u ON u.id = d.author_id
            "#,
        )
        .bind(id)
        .bind(changes.content)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_comment(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// get_user
    ///
    /// Used by the `AuthUser` extractor on every authenticated request.
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT id, username, email, date_joined FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_credentials(&self, username: &str) -> RepoResult<Option<UserCredentials>> {
        sqlx::query_as::<_, UserCredentials>("SELECT id, password_hash FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    /// create_user
    ///
    /// `ON CONFLICT DO NOTHING` turns a concurrent duplicate registration into
    /// `None` instead of a unique-violation error.
    async fn create_user(&self, user: NewUser) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username) DO NOTHING
            RETURNING id, username, email, date_joined
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .fetch_optional(&self.pool)
        .await
    }
}
