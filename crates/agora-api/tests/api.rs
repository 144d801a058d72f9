//! End-to-end tests: the full router over an in-memory database.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use agora_api::auth::AppStateInner;
use agora_db::Database;

fn app() -> Router {
    let db = Arc::new(Database::open_in_memory().expect("in-memory database"));
    agora_api::router(Arc::new(AppStateInner::new(db, "test-secret")))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().unwrap().to_string()
}

async fn create_text_post(app: &Router, token: &str) -> Value {
    let (status, post) = send(
        app,
        Method::POST,
        "/api/posts",
        Some(token),
        Some(json!({ "category": "music", "title": "X", "type": "text", "text": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{post}");
    post
}

#[tokio::test]
async fn register_login_and_both_tokens_work() {
    let app = app();
    let first = register(&app, "alice", "pw1").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "username": "alice", "password": "pw1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let second = body["token"].as_str().unwrap().to_string();
    assert_ne!(first, second);

    // Both tokens authenticate as alice: posts they create are hers.
    for token in [&first, &second] {
        let post = create_text_post(&app, token).await;
        assert_eq!(post["author"]["username"], "alice");
        assert_eq!(post["author"]["id"], "1");
    }
}

#[tokio::test]
async fn bad_login_and_duplicate_registration() {
    let app = app();
    register(&app, "alice", "pw1").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "username": "alice", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "username": "bob", "password": "pw1" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({ "username": "alice", "password": "again" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["param"], "username");
    assert_eq!(body["errors"][0]["value"], "alice");
    assert_eq!(body["errors"][0]["msg"], "already exists");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({ "username": "", "password": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn new_text_post_starts_with_authors_upvote() {
    let app = app();
    let token = register(&app, "alice", "pw1").await;
    let post = create_text_post(&app, &token).await;

    assert_eq!(post["score"], 1);
    assert_eq!(post["upvotePercentage"], 100);
    assert_eq!(post["votes"], json!([{ "user": "1", "vote": 1 }]));
    assert_eq!(post["type"], "text");
    assert_eq!(post["text"], "hi");
    assert!(post.get("url").is_none());
    assert_eq!(post["category"], "music");
    assert_eq!(post["views"], 0);
    assert_eq!(post["comments"], json!([]));
    assert_eq!(post["id"].as_str().unwrap().len(), 32);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = app();
    let body = json!({ "category": "music", "title": "X", "type": "text", "text": "hi" });

    let (status, _) = send(&app, Method::POST, "/api/posts", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        send(&app, Method::POST, "/api/posts", Some("garbage"), Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn voting_flow() {
    let app = app();
    let alice = register(&app, "alice", "pw1").await;
    let bob = register(&app, "bob", "pw2").await;
    let post = create_text_post(&app, &alice).await;
    let id = post["id"].as_str().unwrap();

    let down = format!("/api/post/{id}/downvote");
    let up = format!("/api/post/{id}/upvote");

    let (status, post) = send(&app, Method::GET, &down, Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["score"], 0);
    assert_eq!(post["upvotePercentage"], 50);

    let (_, post) = send(&app, Method::GET, &up, Some(bob.as_str()), None).await;
    assert_eq!(post["score"], 2);
    assert_eq!(post["upvotePercentage"], 100);
    assert_eq!(post["votes"].as_array().unwrap().len(), 2);

    // Same direction again changes nothing.
    let (_, again) = send(&app, Method::GET, &up, Some(bob.as_str()), None).await;
    assert_eq!(again, post);

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/post/0123456789abcdef0123456789abcdef/upvote",
        Some(bob.as_str()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comments_are_expanded_and_removable() {
    let app = app();
    let alice = register(&app, "alice", "pw1").await;
    let post = create_text_post(&app, &alice).await;
    let id = post["id"].as_str().unwrap();
    let uri = format!("/api/post/{id}");

    let (status, post) = send(
        &app,
        Method::POST,
        &uri,
        Some(alice.as_str()),
        Some(json!({ "comment": "nice" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let comments = post["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["body"], "nice");
    assert_eq!(comments[0]["author"]["username"], "alice");
    let comment_id = comments[0]["id"].as_str().unwrap().to_string();

    let (status, post) = send(
        &app,
        Method::DELETE,
        &format!("{uri}/{comment_id}"),
        Some(alice.as_str()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["comments"], json!([]));

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("{uri}/{comment_id}"),
        Some(alice.as_str()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listings_views_and_delete() {
    let app = app();
    let alice = register(&app, "alice", "pw1").await;
    let bob = register(&app, "bob", "pw2").await;
    let post = create_text_post(&app, &alice).await;
    let id = post["id"].as_str().unwrap();
    send(
        &app,
        Method::POST,
        "/api/posts",
        Some(bob.as_str()),
        Some(json!({ "category": "news", "title": "Y", "type": "link", "url": "https://x.io" })),
    )
    .await;

    let (_, all) = send(&app, Method::GET, "/api/posts/", None, None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, news) = send(&app, Method::GET, "/api/posts/news", None, None).await;
    assert_eq!(news.as_array().unwrap().len(), 1);
    assert_eq!(news[0]["url"], "https://x.io");
    assert!(news[0].get("text").is_none());

    let (_, by_alice) = send(&app, Method::GET, "/api/user/alice", None, None).await;
    assert_eq!(by_alice.as_array().unwrap().len(), 1);

    let uri = format!("/api/post/{id}");
    send(&app, Method::GET, &uri, None, None).await;
    let (status, viewed) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(viewed["views"], 2);

    let (status, _) = send(&app, Method::GET, "/api/post/not-an-id", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, Method::DELETE, &uri, Some(alice.as_str()), None).await;
    assert_eq!(body["message"], "success");
    let (_, body) = send(&app, Method::DELETE, &uri, Some(alice.as_str()), None).await;
    assert_eq!(body["message"], "failure");

    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_cannot_be_deleted_through_another_post() {
    let app = app();
    let alice = register(&app, "alice", "pw1").await;
    let first = create_text_post(&app, &alice).await;
    let second = create_text_post(&app, &alice).await;
    let first_uri = format!("/api/post/{}", first["id"].as_str().unwrap());
    let second_uri = format!("/api/post/{}", second["id"].as_str().unwrap());

    let (_, post) = send(
        &app,
        Method::POST,
        &first_uri,
        Some(alice.as_str()),
        Some(json!({ "comment": "keep me" })),
    )
    .await;
    let comment_id = post["comments"][0]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("{second_uri}/{comment_id}"),
        Some(alice.as_str()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, post) = send(&app, Method::GET, &first_uri, None, None).await;
    let comments = post["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["body"], "keep me");

    let (status, post) = send(
        &app,
        Method::DELETE,
        &format!("{first_uri}/{comment_id}"),
        Some(alice.as_str()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["comments"], json!([]));
}
