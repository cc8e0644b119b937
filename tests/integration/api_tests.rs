//! API integration tests against a running server

use library_server::models::ObjectId;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:3000/api";

/// ISBN that no earlier run has used
fn fresh_isbn() -> String {
    ObjectId::generate().to_string()
}

async fn create_book(client: &Client, copies: i32) -> Value {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": "Integration",
            "author": "Tester",
            "genre": "SCIENCE",
            "isbn": fresh_isbn(),
            "copies": copies
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["data"].clone()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_create_update_and_delete_book() {
    let client = Client::new();
    let book = create_book(&client, 2).await;
    let id = book["_id"].as_str().expect("No id in response");

    let response = client
        .put(format!("{}/books/{}", BASE_URL, id))
        .json(&json!({ "copies": 0 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["available"], false);

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_isbn_is_rejected() {
    let client = Client::new();
    let book = create_book(&client, 1).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": "Copy",
            "author": "Tester",
            "genre": "FICTION",
            "isbn": book["isbn"],
            "copies": 1
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"]["errors"]["isbn"]["kind"], "unique");
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrows_never_oversell() {
    let client = Client::new();
    let book = create_book(&client, 3).await;
    let id = book["_id"].as_str().expect("No id in response").to_string();

    let requests = (0..6).map(|_| {
        let client = client.clone();
        let id = id.clone();
        tokio::spawn(async move {
            client
                .post(format!("{}/borrow", BASE_URL))
                .json(&json!({ "book": id, "quantity": 1, "dueDate": "2030-01-01" }))
                .send()
                .await
                .expect("Failed to send request")
                .status()
        })
    });

    let mut created = 0;
    for request in requests.collect::<Vec<_>>() {
        match request.await.expect("Task panicked") {
            StatusCode::CREATED => created += 1,
            status => assert_eq!(status, StatusCode::BAD_REQUEST),
        }
    }
    assert_eq!(created, 3);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["copies"], 0);
    assert_eq!(body["data"]["available"], false);
}

#[tokio::test]
#[ignore]
async fn test_borrow_summary() {
    let client = Client::new();

    let response = client
        .get(format!("{}/borrow", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["data"].is_array());
}
