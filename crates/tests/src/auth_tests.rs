use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn register_returns_tokens_and_user() {
    let app = TestApp::spawn().await;

    let user = app
        .register_user("ana@test.dev", "ana", "Ana", "Aria", "Secret123!")
        .await;

    assert!(!user.access_token.is_empty());
    assert!(!user.refresh_token.is_empty());
    assert!(!user.id.is_empty());
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = TestApp::spawn().await;
    app.register_user("dup@test.dev", "dup_one", "Dee", "One", "Secret123!")
        .await;

    let resp = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&serde_json::json!({
            "email": "dup@test.dev",
            "username": "dup_two",
            "first_name": "Dee",
            "last_name": "Two",
            "password": "Secret123!",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn register_rejects_invalid_email() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&serde_json::json!({
            "email": "not-an-email",
            "username": "badmail",
            "first_name": "Bad",
            "last_name": "Mail",
            "password": "Secret123!",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = TestApp::spawn().await;
    app.register_user("lw@test.dev", "lw_user", "El", "Wu", "Secret123!")
        .await;

    let resp = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&serde_json::json!({
            "email": "lw@test.dev",
            "password": "WrongPassword!",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn me_requires_token() {
    let app = TestApp::spawn().await;

    let resp = app.client.get(app.url("/api/auth/me")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn me_returns_current_user() {
    let app = TestApp::spawn().await;
    let user = app
        .register_user("me@test.dev", "me_user", "Mia", "Eli", "Secret123!")
        .await;

    let resp = app
        .auth_get("/api/auth/me", &user.access_token)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["email"], "me@test.dev");
    assert_eq!(json["username"], "me_user");
    assert_eq!(json["is_online"], false);
}

#[tokio::test]
async fn refresh_issues_usable_access_token() {
    let app = TestApp::spawn().await;
    let user = app
        .register_user("rf@test.dev", "rf_user", "Ria", "Frey", "Secret123!")
        .await;

    let resp = app
        .client
        .post(app.url("/api/auth/refresh"))
        .json(&serde_json::json!({ "refresh_token": user.refresh_token }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    let new_access = json["access_token"].as_str().unwrap();

    let resp = app.auth_get("/api/auth/me", new_access).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn refresh_rejects_access_token() {
    let app = TestApp::spawn().await;
    let user = app
        .register_user("rx@test.dev", "rx_user", "Rex", "Xu", "Secret123!")
        .await;

    let resp = app
        .client
        .post(app.url("/api/auth/refresh"))
        .json(&serde_json::json!({ "refresh_token": user.access_token }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 401);
}
