mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use sqlx::SqlitePool;

use common::{assert_user_shape, insert_user, send, token_for, user_count};

#[sqlx::test]
async fn admin_lists_all_users(pool: SqlitePool) -> Result<()> {
    let app = common::app(&pool).await?;
    let admin = insert_user(&pool, "admin@example.com", "admin").await?;
    insert_user(&pool, "member@example.com", "member").await?;
    let token = token_for(admin);

    let (status, body) = send(&app, "GET", "/api/v1/users", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "good!");

    let data = body["data"].as_array().expect("data array");
    assert_eq!(data.len(), 2);
    assert_user_shape(&data[0]);

    Ok(())
}

#[sqlx::test]
async fn admin_reads_single_user(pool: SqlitePool) -> Result<()> {
    let app = common::app(&pool).await?;
    let admin = insert_user(&pool, "admin@example.com", "admin").await?;
    let member = insert_user(&pool, "member@example.com", "member").await?;
    let token = token_for(admin);

    let (status, body) = send(&app, "GET", &format!("/api/v1/users/{member}"), Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let data = body["data"].as_array().expect("data array");
    assert_eq!(data.len(), 1);
    assert_user_shape(&data[0]);
    assert_eq!(data[0]["email"], "member@example.com");

    let (status, body) = send(&app, "GET", "/api/v1/users/999999999", Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "no good :(");
    assert_eq!(body["message"], "That user does not exist.");

    Ok(())
}

#[sqlx::test]
async fn admin_creates_user(pool: SqlitePool) -> Result<()> {
    let app = common::app(&pool).await?;
    let admin = insert_user(&pool, "admin@example.com", "admin").await?;
    let token = token_for(admin);

    let payload = json!({
        "email": "dignityapps@gmail.com",
        "password": "test9876",
        "first_name": "Dignity",
        "last_name": "Applications",
        "date_of_birth": "10/01/1990",
        "home_phone_number": "704-885-8342",
        "cell_phone_number": "704-111-3357",
        "current_address": "1234 Test St., Wilmington NC 28412",
        "previous_address": "4321 Test Rd., Testville NC 28110"
    });

    let (status, body) = send(&app, "POST", "/api/v1/users", Some(&token), Some(payload.clone())).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["status"], "good!");
    let data = body["data"].as_array().expect("data array");
    assert_eq!(data.len(), 1);
    assert_user_shape(&data[0]);
    assert_eq!(data[0]["date_of_birth"], "10/01/1990");

    let member_role = common::role_id(&pool, "member").await?;
    assert_eq!(data[0]["role_id"], member_role, "default role applies when role_id is omitted");

    // same email again
    let (status, body) = send(&app, "POST", "/api/v1/users", Some(&token), Some(payload)).await?;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);

    Ok(())
}

#[sqlx::test]
async fn malformed_payload_is_rejected(pool: SqlitePool) -> Result<()> {
    let app = common::app(&pool).await?;
    let admin = insert_user(&pool, "admin@example.com", "admin").await?;
    let token = token_for(admin);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/users",
        Some(&token),
        Some(json!({ "test": "not sending the right payload!" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert_eq!(body["status"], "no good :(");
    assert!(body["message"].is_string());

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/users",
        Some(&token),
        Some(json!({ "email": "x@example.com", "password": "short", "first_name": "X", "last_name": "Y" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "short password");

    Ok(())
}

#[sqlx::test]
async fn admin_updates_user(pool: SqlitePool) -> Result<()> {
    let app = common::app(&pool).await?;
    let admin = insert_user(&pool, "admin@example.com", "admin").await?;
    let member = insert_user(&pool, "member@example.com", "member").await?;
    let token = token_for(admin);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/users/{member}"),
        Some(&token),
        Some(json!({ "first_name": "Jerry" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let data = body["data"].as_array().expect("data array");
    assert_user_shape(&data[0]);
    assert_eq!(data[0]["first_name"], "Jerry");
    assert_eq!(data[0]["last_name"], "User", "untouched fields are kept");

    let (status, body) = send(
        &app,
        "PUT",
        "/api/v1/users/9999999",
        Some(&token),
        Some(json!({ "first_name": "Jerry" })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "That user does not exist.");

    Ok(())
}

#[sqlx::test]
async fn admin_promotes_member(pool: SqlitePool) -> Result<()> {
    let app = common::app(&pool).await?;
    let admin = insert_user(&pool, "admin@example.com", "admin").await?;
    let member = insert_user(&pool, "member@example.com", "member").await?;
    let admin_role = common::role_id(&pool, "admin").await?;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/users/{member}"),
        Some(&token_for(admin)),
        Some(json!({ "role_id": admin_role })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"][0]["role_id"], admin_role);

    Ok(())
}

#[sqlx::test]
async fn admin_deletes_user(pool: SqlitePool) -> Result<()> {
    let app = common::app(&pool).await?;
    let admin = insert_user(&pool, "admin@example.com", "admin").await?;
    let member = insert_user(&pool, "member@example.com", "member").await?;
    let token = token_for(admin);
    let before = user_count(&pool).await?;

    let (status, body) = send(&app, "DELETE", &format!("/api/v1/users/{member}"), Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "good!");
    let data = body["data"].as_array().expect("data array");
    assert_eq!(data.len(), 1);
    assert_user_shape(&data[0]);
    assert_eq!(user_count(&pool).await?, before - 1);

    let (status, body) = send(&app, "DELETE", "/api/v1/users/9999999", Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "That user does not exist.");

    Ok(())
}

#[sqlx::test]
async fn non_numeric_id_gets_failure_envelope(pool: SqlitePool) -> Result<()> {
    let app = common::app(&pool).await?;
    let admin = insert_user(&pool, "admin@example.com", "admin").await?;
    let token = token_for(admin);

    for method in ["GET", "DELETE"] {
        let (status, body) = send(&app, method, "/api/v1/users/abc", Some(&token), None).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method}: {body}");
        assert_eq!(body["status"], "no good :(");
        assert_eq!(body["error"], "bad_request");
        assert!(body["message"].is_string());
    }

    let (status, body) = send(
        &app,
        "PUT",
        "/api/v1/users/abc",
        Some(&token),
        Some(json!({ "first_name": "Jerry" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert_eq!(body["status"], "no good :(");

    Ok(())
}
