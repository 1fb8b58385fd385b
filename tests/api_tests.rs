use egram_api::{AppConfig, AppState, MemoryRepository, create_router, repository::RepositoryState};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
    pub client: Client,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn register(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/register/"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Registers a fresh user and returns its access token.
    async fn access_token_for(&self, username: &str) -> String {
        let password = "correct-horse-battery";
        assert_eq!(self.register(username, password).await.status(), StatusCode::CREATED);

        let body: Value = self
            .client
            .post(self.url("/api/auth/login/"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
            .json()
            .await
            .unwrap();

        body["access"].as_str().unwrap().to_string()
    }

    async fn create_post(&self, token: &str, title: &str) -> Value {
        let response = self
            .client
            .post(self.url("/api/posts/"))
            .bearer_auth(token)
            .json(&json!({ "title": title, "content": "See attached." }))
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().await.unwrap()
    }
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::new()) as RepositoryState;
    let router = create_router(AppState::new(repo, AppConfig::default()));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        client: Client::new(),
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/health"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let app = spawn_app().await;

    let body: Value = app
        .client
        .get(app.url("/"))
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .unwrap();

    assert_eq!(body["message"], "Welcome to the E gram API!");
    assert_eq!(body["endpoints"]["register"], "/api/auth/register/");
    assert_eq!(body["endpoints"]["posts"], "/api/posts/");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/api-docs/openapi.json"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::OK);
    let doc: Value = response.json().await.unwrap();
    assert!(doc["paths"]["/api/posts/"].is_object());
}

#[tokio::test]
async fn test_register_login_and_post_flow() {
    let app = spawn_app().await;
    let token = app.access_token_for("alice").await;

    let post = app.create_post(&token, "Chapter 5 reading").await;
    assert_eq!(post["author_username"], "alice");
    assert_eq!(post["title"], "Chapter 5 reading");

    let fetched: Value = app
        .client
        .get(app.url(&format!("/api/posts/{}/", post["id"])))
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, post);
}

#[tokio::test]
async fn test_posts_listed_newest_first_without_auth() {
    let app = spawn_app().await;
    let token = app.access_token_for("instructor").await;

    for title in ["first", "second", "third"] {
        app.create_post(&token, title).await;
    }

    let posts: Vec<Value> = app
        .client
        .get(app.url("/api/posts/"))
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .unwrap();

    let titles: Vec<&str> = posts.iter().map(|p| p["title"].as_str().unwrap()).collect();
    assert_eq!(titles, ["third", "second", "first"]);
}

#[tokio::test]
async fn test_anonymous_writes_and_comments_denied() {
    let app = spawn_app().await;

    let create = app
        .client
        .post(app.url("/api/posts/"))
        .json(&json!({ "title": "t", "content": "c" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(create.status(), StatusCode::FORBIDDEN);

    let comments = app
        .client
        .get(app.url("/api/comments/"))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(comments.status(), StatusCode::FORBIDDEN);
    let body: Value = comments.json().await.unwrap();
    assert_eq!(body["detail"], "Authentication credentials were not provided.");
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/api/comments/"))
        .bearer_auth("definitely-not-a-token")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_comment_flow_and_author_only_edits() {
    let app = spawn_app().await;
    let alice = app.access_token_for("alice").await;
    let bob = app.access_token_for("bob").await;
    let post = app.create_post(&alice, "Lab report").await;

    let created = app
        .client
        .post(app.url("/api/comments/"))
        .bearer_auth(&bob)
        .json(&json!({ "content": "Due Friday?", "post": post["id"] }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(created.status(), StatusCode::CREATED);
    let comment: Value = created.json().await.unwrap();
    assert_eq!(comment["author_username"], "bob");
    assert_eq!(comment["post"], post["id"]);

    let comment_url = app.url(&format!("/api/comments/{}/", comment["id"]));

    let forbidden = app
        .client
        .patch(&comment_url)
        .bearer_auth(&alice)
        .json(&json!({ "content": "edited by alice" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let edited: Value = app
        .client
        .patch(&comment_url)
        .bearer_auth(&bob)
        .json(&json!({ "content": "Due Friday at noon?" }))
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .unwrap();
    assert_eq!(edited["content"], "Due Friday at noon?");

    let deleted = app
        .client
        .delete(&comment_url)
        .bearer_auth(&bob)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_comment_on_unknown_post_is_not_found() {
    let app = spawn_app().await;
    let token = app.access_token_for("alice").await;

    let response = app
        .client
        .post(app.url("/api/comments/"))
        .bearer_auth(&token)
        .json(&json!({ "content": "hello", "post": 12345 }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Post not found.");
}

#[tokio::test]
async fn test_register_duplicate_and_invalid_fields() {
    let app = spawn_app().await;

    assert_eq!(
        app.register("alice", "long-enough-pw").await.status(),
        StatusCode::CREATED
    );

    let duplicate = app.register("alice", "another-password").await;
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);
    let body: Value = duplicate.json().await.unwrap();
    assert_eq!(body["username"][0], "A user with that username already exists.");

    let invalid = app.register("bad name!", "short").await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    let body: Value = invalid.json().await.unwrap();
    assert!(body["username"].is_array());
    assert!(body["password"].is_array());
}

#[tokio::test]
async fn test_register_response_never_echoes_password() {
    let app = spawn_app().await;

    let response = app.register("carol", "sup3r-secret-pw").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let text = response.text().await.unwrap();
    assert!(!text.contains("sup3r-secret-pw"));
    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["message"], "User created successfully");
}

#[tokio::test]
async fn test_login_wrong_password_and_refresh() {
    let app = spawn_app().await;
    app.register("dave", "right-password").await;

    let wrong = app
        .client
        .post(app.url("/api/auth/login/"))
        .json(&json!({ "username": "dave", "password": "wrong-password" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let pair: Value = app
        .client
        .post(app.url("/api/auth/login/"))
        .json(&json!({ "username": "dave", "password": "right-password" }))
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .unwrap();

    let refreshed = app
        .client
        .post(app.url("/api/auth/login/refresh/"))
        .json(&json!({ "refresh": pair["refresh"] }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(refreshed.status(), StatusCode::OK);
    let body: Value = refreshed.json().await.unwrap();
    let access = body["access"].as_str().unwrap();

    // The refreshed token works as a bearer credential.
    let comments = app
        .client
        .get(app.url("/api/comments/"))
        .bearer_auth(access)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(comments.status(), StatusCode::OK);

    let bad_refresh = app
        .client
        .post(app.url("/api/auth/login/refresh/"))
        .json(&json!({ "refresh": pair["access"] }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(bad_refresh.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_json_body_is_bad_request() {
    let app = spawn_app().await;
    let token = app.access_token_for("erin").await;

    let response = app
        .client
        .post(app.url("/api/posts/"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_non_numeric_id_is_json_not_found() {
    let app = spawn_app().await;
    let token = app.access_token_for("frank").await;

    let post = app
        .client
        .get(app.url("/api/posts/abc/"))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(post.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        post.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    let body: Value = post.json().await.unwrap();
    assert_eq!(body["detail"], "Not found.");

    let comment = app
        .client
        .delete(app.url("/api/comments/abc/"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(comment.status(), StatusCode::NOT_FOUND);
    let body: Value = comment.json().await.unwrap();
    assert_eq!(body["detail"], "Not found.");
}

#[tokio::test]
async fn test_duplicate_register_leaves_original_credentials() {
    let app = spawn_app().await;

    app.register("grace", "original-password").await;
    let duplicate = app.register("grace", "replacement-password").await;
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);

    let login = |password: &'static str| {
        app.client
            .post(app.url("/api/auth/login/"))
            .json(&json!({ "username": "grace", "password": password }))
            .send()
    };

    let original = login("original-password").await.expect("Failed to execute request.");
    assert_eq!(original.status(), StatusCode::OK);

    let replacement = login("replacement-password")
        .await
        .expect("Failed to execute request.");
    assert_eq!(replacement.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_anonymous_writes_denied_on_every_resource() {
    let app = spawn_app().await;
    let token = app.access_token_for("heidi").await;
    let post = app.create_post(&token, "Existing post").await;

    let comment: Value = app
        .client
        .post(app.url("/api/comments/"))
        .bearer_auth(&token)
        .json(&json!({ "content": "Existing comment", "post": post["id"] }))
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .unwrap();

    let post_url = app.url(&format!("/api/posts/{}/", post["id"]));
    let comment_url = app.url(&format!("/api/comments/{}/", comment["id"]));
    let body = json!({ "title": "anon", "content": "anon", "post": post["id"] });

    let requests = [
        app.client.put(&post_url).json(&body),
        app.client.patch(&post_url).json(&body),
        app.client.delete(&post_url),
        app.client.post(app.url("/api/comments/")).json(&body),
        app.client.get(&comment_url),
        app.client.put(&comment_url).json(&body),
        app.client.patch(&comment_url).json(&body),
        app.client.delete(&comment_url),
    ];

    for request in requests {
        let response = request.send().await.expect("Failed to execute request.");
        let url = response.url().to_string();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "anonymous request to {url}");
        let detail: Value = response.json().await.unwrap();
        assert_eq!(detail["detail"], "Authentication credentials were not provided.");
    }

    // Nothing changed.
    let stored_post: Value = app
        .client
        .get(&post_url)
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .unwrap();
    assert_eq!(stored_post, post);

    let stored_comment: Value = app
        .client
        .get(&comment_url)
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .unwrap();
    assert_eq!(stored_comment, comment);
}

#[tokio::test]
async fn test_comment_post_id_as_numeric_string() {
    let app = spawn_app().await;
    let token = app.access_token_for("ivan").await;
    let post = app.create_post(&token, "Stringly typed").await;

    let response = app
        .client
        .post(app.url("/api/comments/"))
        .bearer_auth(&token)
        .json(&json!({ "content": "hi", "post": post["id"].to_string() }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::CREATED);
    let comment: Value = response.json().await.unwrap();
    assert_eq!(comment["post"], post["id"]);
}
