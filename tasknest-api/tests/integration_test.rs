/// Integration tests for the TaskNest API
///
/// These verify the full system end-to-end against a real database:
/// - registration, local login, and the token round-trip
/// - duplicate-email enforcement through the unique index
/// - federated login (stub verifier): account creation and additive linking
/// - owner-scoped task CRUD, sparse patches, and derived deadline fields
///
/// Requires `DATABASE_URL` pointing at a test database.

mod common;

use axum::http::StatusCode;
use common::{create_task, register, send_json, unique_email, TestContext, TEST_JWT_SECRET};
use serde_json::json;

use tasknest_shared::auth::jwt::verify_token;
use tasknest_shared::models::user::User;

#[tokio::test]
async fn test_register_returns_token_and_public_user() {
    let ctx = TestContext::new().await.unwrap();
    let email = unique_email("register");

    let body = register(&ctx.app, &email, "Test User", "Pw12345678").await;

    assert!(body["access_token"].is_string());
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user"]["email"], email);
    assert_eq!(body["user"]["name"], "Test User");
    assert!(body["user"]["id"].is_string());

    // Credential fields never leave the service
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("federated_subject_id").is_none());
    assert!(body["user"].get("auth_provider").is_none());
}

#[tokio::test]
async fn test_register_normalizes_email_and_rejects_duplicates() {
    let ctx = TestContext::new().await.unwrap();
    let email = unique_email("dup");
    let upper = email.to_uppercase();

    let body = register(&ctx.app, &upper, "First", "Pw12345678").await;
    assert_eq!(body["user"]["email"], email, "email must be lowercased");

    // Same normalized email, different case: must hit the unique index
    let (status, body) = send_json(
        &ctx.app,
        "POST",
        "/auth/register",
        None,
        Some(json!({"email": email, "name": "Second", "password": "Pw12345678"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["message"], "User with this email already exists");
}

#[tokio::test]
async fn test_login_roundtrip_token_subject() {
    let ctx = TestContext::new().await.unwrap();
    let email = unique_email("roundtrip");

    register(&ctx.app, &email, "T", "Pw12345678").await;

    let (status, body) = send_json(
        &ctx.app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": email, "password": "Pw12345678"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");

    let token = body["access_token"].as_str().unwrap();
    let claims = verify_token(token, TEST_JWT_SECRET).unwrap();
    assert_eq!(claims.sub, email);
}

#[tokio::test]
async fn test_login_does_not_reveal_which_emails_exist() {
    let ctx = TestContext::new().await.unwrap();
    let email = unique_email("leak");

    register(&ctx.app, &email, "T", "Pw12345678").await;

    let (wrong_status, wrong_body) = send_json(
        &ctx.app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": email, "password": "WrongPassword1"})),
    )
    .await;

    let (absent_status, absent_body) = send_json(
        &ctx.app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": unique_email("absent"), "password": "WrongPassword1"})),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(absent_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body["message"], absent_body["message"]);
}

#[tokio::test]
async fn test_federated_login_creates_account_without_password() {
    let ctx = TestContext::new().await.unwrap();
    let email = unique_email("fed-create");

    let (status, body) = send_json(
        &ctx.app,
        "POST",
        "/auth/federated",
        None,
        Some(json!({"credential": format!("{email}|stub-subject-1")})),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["email"], email);

    let user = User::find_by_email(&ctx.db, &email).await.unwrap().unwrap();
    assert!(user.password_hash.is_none());
    assert_eq!(user.federated_subject_id.as_deref(), Some("stub-subject-1"));

    // No usable password login on a federated-only account
    let (status, _) = send_json(
        &ctx.app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": email, "password": "AnyPassword1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_federated_login_links_additively_onto_local_account() {
    let ctx = TestContext::new().await.unwrap();
    let email = unique_email("fed-link");

    register(&ctx.app, &email, "Local First", "Pw12345678").await;

    let (status, body) = send_json(
        &ctx.app,
        "POST",
        "/auth/federated",
        None,
        Some(json!({"credential": format!("{email}|stub-subject-2")})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let user = User::find_by_email(&ctx.db, &email).await.unwrap().unwrap();
    assert_eq!(user.federated_subject_id.as_deref(), Some("stub-subject-2"));
    assert!(user.password_hash.is_some(), "linking must preserve the password");

    // The local credential still works after linking
    let (status, _) = send_json(
        &ctx.app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": email, "password": "Pw12345678"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_federated_login_rejects_bad_assertion() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = send_json(
        &ctx.app,
        "POST",
        "/auth/federated",
        None,
        Some(json!({"credential": "garbage"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid identity assertion");
}

#[tokio::test]
async fn test_tasks_require_auth() {
    let ctx = TestContext::new().await.unwrap();

    let (status, _) = send_json(&ctx.app, "GET", "/tasks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(
        &ctx.app,
        "POST",
        "/tasks",
        Some("not-a-valid-token"),
        Some(json!({"title": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_task_with_bare_date_deadline() {
    let ctx = TestContext::new().await.unwrap();
    let body = register(&ctx.app, &unique_email("deadline"), "T", "Pw12345678").await;
    let token = body["access_token"].as_str().unwrap();

    let task = create_task(
        &ctx.app,
        token,
        json!({
            "title": "Write tests",
            "description": "Long-form description for this task.",
            "deadline": "2026-12-31",
            "priority": "high",
        }),
    )
    .await;

    assert_eq!(task["status"], "not_started");
    assert_eq!(task["priority"], "high");
    assert_eq!(task["description"], "Long-form description for this task.");
    assert_eq!(task["deadline"], "2026-12-31T23:59:59Z");
    assert!(task["time_left_seconds"].is_i64());
    assert!(task["time_left_human"].is_string());
    assert_eq!(task["is_overdue"], false);
}

#[tokio::test]
async fn test_create_task_defaults() {
    let ctx = TestContext::new().await.unwrap();
    let body = register(&ctx.app, &unique_email("defaults"), "T", "Pw12345678").await;
    let token = body["access_token"].as_str().unwrap();

    let task = create_task(&ctx.app, token, json!({"title": "Bare minimum"})).await;

    assert_eq!(task["status"], "not_started");
    assert_eq!(task["priority"], "medium");
    assert_eq!(task["description"], "");
    assert!(task["deadline"].is_null());
    assert!(task["time_left_seconds"].is_null());
    assert!(task["time_left_human"].is_null());
    assert_eq!(task["is_overdue"], false);
}

#[tokio::test]
async fn test_overdue_task_derived_fields() {
    let ctx = TestContext::new().await.unwrap();
    let body = register(&ctx.app, &unique_email("overdue"), "T", "Pw12345678").await;
    let token = body["access_token"].as_str().unwrap();

    let task = create_task(
        &ctx.app,
        token,
        json!({"title": "Too late", "deadline": "2020-01-01T00:00:00Z"}),
    )
    .await;

    assert_eq!(task["is_overdue"], true);
    assert!(task["time_left_seconds"].as_i64().unwrap() < 0);
    assert!(task["time_left_human"]
        .as_str()
        .unwrap()
        .ends_with("overdue"));
}

#[tokio::test]
async fn test_patch_applies_only_present_fields() {
    let ctx = TestContext::new().await.unwrap();
    let body = register(&ctx.app, &unique_email("patch"), "T", "Pw12345678").await;
    let token = body["access_token"].as_str().unwrap();

    let task = create_task(
        &ctx.app,
        token,
        json!({"title": "Original title", "priority": "urgent"}),
    )
    .await;
    let task_id = task["id"].as_str().unwrap();

    let (status, updated) = send_json(
        &ctx.app,
        "PATCH",
        &format!("/tasks/{task_id}"),
        Some(token),
        Some(json!({"status": "finished"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["status"], "finished");
    assert_eq!(updated["title"], "Original title");
    assert_eq!(updated["priority"], "urgent");

    let before =
        chrono::DateTime::parse_from_rfc3339(task["updated_at"].as_str().unwrap()).unwrap();
    let after =
        chrono::DateTime::parse_from_rfc3339(updated["updated_at"].as_str().unwrap()).unwrap();
    assert!(after >= before, "updated_at must be refreshed");
}

#[tokio::test]
async fn test_patch_null_description_resets_to_empty() {
    let ctx = TestContext::new().await.unwrap();
    let body = register(&ctx.app, &unique_email("desc"), "T", "Pw12345678").await;
    let token = body["access_token"].as_str().unwrap();

    let task = create_task(
        &ctx.app,
        token,
        json!({"title": "Described", "description": "Something"}),
    )
    .await;
    let task_id = task["id"].as_str().unwrap();

    let (status, updated) = send_json(
        &ctx.app,
        "PATCH",
        &format!("/tasks/{task_id}"),
        Some(token),
        Some(json!({"description": null})),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["description"], "");
}

#[tokio::test]
async fn test_register_validation_failures() {
    let ctx = TestContext::new().await.unwrap();

    // Short password
    let (status, _) = send_json(
        &ctx.app,
        "POST",
        "/auth/register",
        None,
        Some(json!({"email": unique_email("short"), "name": "T", "password": "short"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Malformed email
    let (status, _) = send_json(
        &ctx.app,
        "POST",
        "/auth/register",
        None,
        Some(json!({"email": "not-an-email", "name": "T", "password": "Pw12345678"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_patch_empty_field_set_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let body = register(&ctx.app, &unique_email("empty-patch"), "T", "Pw12345678").await;
    let token = body["access_token"].as_str().unwrap();

    let task = create_task(&ctx.app, token, json!({"title": "Untouched"})).await;
    let task_id = task["id"].as_str().unwrap();

    let (status, body) = send_json(
        &ctx.app,
        "PATCH",
        &format!("/tasks/{task_id}"),
        Some(token),
        Some(json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No fields provided to update");
}

#[tokio::test]
async fn test_patch_null_deadline_clears_it() {
    let ctx = TestContext::new().await.unwrap();
    let body = register(&ctx.app, &unique_email("clear"), "T", "Pw12345678").await;
    let token = body["access_token"].as_str().unwrap();

    let task = create_task(
        &ctx.app,
        token,
        json!({"title": "Has deadline", "deadline": "2026-12-31"}),
    )
    .await;
    let task_id = task["id"].as_str().unwrap();

    let (status, updated) = send_json(
        &ctx.app,
        "PATCH",
        &format!("/tasks/{task_id}"),
        Some(token),
        Some(json!({"deadline": null})),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{updated}");
    assert!(updated["deadline"].is_null());
    assert!(updated["time_left_seconds"].is_null());
    assert_eq!(updated["is_overdue"], false);
}

#[tokio::test]
async fn test_patch_invalid_id_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let body = register(&ctx.app, &unique_email("bad-id"), "T", "Pw12345678").await;
    let token = body["access_token"].as_str().unwrap();

    let (status, body) = send_json(
        &ctx.app,
        "PATCH",
        "/tasks/not-a-uuid",
        Some(token),
        Some(json!({"status": "finished"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid task id");
}

#[tokio::test]
async fn test_cross_owner_access_is_not_found() {
    let ctx = TestContext::new().await.unwrap();

    let owner = register(&ctx.app, &unique_email("owner"), "Owner", "Pw12345678").await;
    let owner_token = owner["access_token"].as_str().unwrap();

    let intruder = register(&ctx.app, &unique_email("intruder"), "Intruder", "Pw12345678").await;
    let intruder_token = intruder["access_token"].as_str().unwrap();

    let task = create_task(&ctx.app, owner_token, json!({"title": "Private"})).await;
    let task_id = task["id"].as_str().unwrap();

    // Delete as the wrong user: 404, and nothing is deleted
    let (status, _) = send_json(
        &ctx.app,
        "DELETE",
        &format!("/tasks/{task_id}"),
        Some(intruder_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Patch as the wrong user: 404 as well
    let (status, _) = send_json(
        &ctx.app,
        "PATCH",
        &format!("/tasks/{task_id}"),
        Some(intruder_token),
        Some(json!({"status": "finished"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The owner still sees the task untouched
    let (status, tasks) = send_json(&ctx.app, "GET", "/tasks", Some(owner_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let found = tasks
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t["id"] == task["id"]);
    assert!(found, "task must survive a cross-owner delete attempt");
}

#[tokio::test]
async fn test_delete_task() {
    let ctx = TestContext::new().await.unwrap();
    let body = register(&ctx.app, &unique_email("delete"), "T", "Pw12345678").await;
    let token = body["access_token"].as_str().unwrap();

    let task = create_task(&ctx.app, token, json!({"title": "Done soon"})).await;
    let task_id = task["id"].as_str().unwrap();

    let (status, body) = send_json(
        &ctx.app,
        "DELETE",
        &format!("/tasks/{task_id}"),
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task deleted successfully");

    // Second delete: the record is gone
    let (status, _) = send_json(
        &ctx.app,
        "DELETE",
        &format!("/tasks/{task_id}"),
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_returns_only_own_tasks() {
    let ctx = TestContext::new().await.unwrap();

    let a = register(&ctx.app, &unique_email("list-a"), "A", "Pw12345678").await;
    let a_token = a["access_token"].as_str().unwrap();

    let b = register(&ctx.app, &unique_email("list-b"), "B", "Pw12345678").await;
    let b_token = b["access_token"].as_str().unwrap();

    create_task(&ctx.app, a_token, json!({"title": "A's task"})).await;

    let (status, tasks) = send_json(&ctx.app, "GET", "/tasks", Some(b_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(tasks.as_array().unwrap().is_empty());

    let (status, tasks) = send_json(&ctx.app, "GET", "/tasks", Some(a_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks.as_array().unwrap().len(), 1);
    assert_eq!(tasks[0]["user_id"], a["user"]["id"]);
}
