//! Contact form: anonymous submission, admin-only inbox.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{delete, get, login, post, test_app};

fn joao() -> serde_json::Value {
    json!({
        "name": "Joao Pereira",
        "email": "joao@example.com",
        "phone": "+55 11 99999-0000",
        "subject": "Visita",
        "message": "Gostaria de agendar uma visita no sabado."
    })
}

#[tokio::test]
async fn anyone_can_submit_the_contact_form() {
    let app = test_app().await;

    let (status, body, headers) = post(&app, "/api/contacts", None, joao()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_str().is_some());
    assert_eq!(body["name"], "Joao Pereira");
    // Submitting the form must not create a session
    assert!(common::session_cookie(&headers).is_none());
}

#[tokio::test]
async fn submission_is_validated_per_field() {
    let app = test_app().await;

    let (status, body, _) = post(
        &app,
        "/api/contacts",
        None,
        json!({"name": "Joao", "email": "not-an-email"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["email"].is_string());
    assert!(body["errors"]["subject"].is_string());
    assert!(body["errors"]["message"].is_string());
}

#[tokio::test]
async fn inbox_is_admin_only() {
    let app = test_app().await;
    let (_, created, _) = post(&app, "/api/contacts", None, joao()).await;
    let id = created["id"].as_str().unwrap().to_string();

    // Reads and deletes are guarded
    let (status, _, _) = get(&app, "/api/contacts", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _, _) = get(&app, &format!("/api/contacts/{}", id), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _, _) = delete(&app, &format!("/api/contacts/{}", id), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let cookie = login(&app).await;
    let (status, list, _) = get(&app, "/api/contacts", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["email"], "joao@example.com");

    let (status, _, _) = delete(&app, &format!("/api/contacts/{}", id), Some(&cookie)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, list, _) = get(&app, "/api/contacts", Some(&cookie)).await;
    assert_eq!(list.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn newest_submissions_come_first() {
    let app = test_app().await;
    for subject in ["Primeira", "Segunda"] {
        let mut body = joao();
        body["subject"] = json!(subject);
        let (status, _, _) = post(&app, "/api/contacts", None, body).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let cookie = login(&app).await;
    let (_, list, _) = get(&app, "/api/contacts", Some(&cookie)).await;
    let subjects: Vec<_> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["subject"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(subjects, vec!["Segunda", "Primeira"]);
}
