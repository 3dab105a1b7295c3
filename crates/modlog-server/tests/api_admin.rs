use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use modlog_db::{create_pool, DbPool, DbRuntimeSettings};
use modlog_pipeline::RawEvent;
use modlog_server::{app, AppState};
use modlog_settings::{resolve_destination, Route};
use modlog_types::EventType;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

const TOKEN: &str = "admin-secret";

struct Harness {
    _dir: tempfile::TempDir,
    pool: DbPool,
    app: Router,
    _events: mpsc::Receiver<RawEvent>,
}

fn setup() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("admin.db");
    let pool = create_pool(path.to_str().unwrap(), DbRuntimeSettings::default()).unwrap();
    modlog_db::run_migrations(&pool.get().unwrap()).unwrap();

    let (tx, rx) = mpsc::channel(4);
    let state = AppState {
        pool: pool.clone(),
        admin_token: TOKEN.to_string(),
        events: tx,
    };
    Harness {
        _dir: dir,
        pool,
        app: app(state),
        _events: rx,
    }
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {TOKEN}"));
    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_needs_no_token() {
    let h = setup();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, json) = call(&h.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn missing_or_wrong_token_is_rejected() {
    let h = setup();

    let no_auth = Request::builder()
        .uri("/api/guilds/g1/settings")
        .body(Body::empty())
        .unwrap();
    assert_eq!(call(&h.app, no_auth).await.0, StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .uri("/api/guilds/g1/settings")
        .header("Authorization", "Bearer nope")
        .body(Body::empty())
        .unwrap();
    assert_eq!(call(&h.app, wrong).await.0, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn empty_admin_token_disables_surface() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locked.db");
    let pool = create_pool(path.to_str().unwrap(), DbRuntimeSettings::default()).unwrap();
    let (tx, _rx) = mpsc::channel(1);
    let app = app(AppState {
        pool,
        admin_token: String::new(),
        events: tx,
    });

    let req = Request::builder()
        .uri("/api/guilds/g1/settings")
        .header("Authorization", "Bearer ")
        .body(Body::empty())
        .unwrap();
    assert_eq!(call(&app, req).await.0, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn set_global_channel_routes_all_types() {
    let h = setup();
    let (status, json) = call(
        &h.app,
        request(
            "PUT",
            "/api/guilds/X/log-channel",
            Some(serde_json::json!({"channelId": "D1"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Global log channel set to <#D1>");

    let conn = h.pool.get().unwrap();
    assert_eq!(
        resolve_destination(&conn, "X", EventType::MessageDeleted).unwrap(),
        Route::Deliver("D1".to_string())
    );
}

#[tokio::test]
async fn empty_channel_id_is_rejected() {
    let h = setup();
    let (status, json) = call(
        &h.app,
        request(
            "PUT",
            "/api/guilds/X/log-channel",
            Some(serde_json::json!({"channelId": "  "})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap_or_default().contains("channelId"));
}

#[tokio::test]
async fn type_override_and_reset() {
    let h = setup();
    call(
        &h.app,
        request(
            "PUT",
            "/api/guilds/X/log-channel",
            Some(serde_json::json!({"channelId": "D1"})),
        ),
    )
    .await;
    let (status, json) = call(
        &h.app,
        request(
            "PUT",
            "/api/guilds/X/log-channel/roleCreated",
            Some(serde_json::json!({"channelId": "D2"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Specific log for **roleCreated** set to <#D2>");
    {
        let conn = h.pool.get().unwrap();
        assert_eq!(
            resolve_destination(&conn, "X", EventType::RoleCreated).unwrap(),
            Route::Deliver("D2".to_string())
        );
    }

    let (status, _) = call(&h.app, request("DELETE", "/api/guilds/X/log-channels", None)).await;
    assert_eq!(status, StatusCode::OK);
    let conn = h.pool.get().unwrap();
    assert_eq!(
        resolve_destination(&conn, "X", EventType::RoleCreated).unwrap(),
        Route::Deliver("D1".to_string())
    );
}

#[tokio::test]
async fn toggle_reports_new_state() {
    let h = setup();

    let (status, json) = call(&h.app, request("POST", "/api/guilds/Y/toggles/roleCreated", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["type"], "roleCreated");
    assert_eq!(json["enabled"], false);
    assert_eq!(json["message"], "Log type **roleCreated** is now **DISABLED**");

    let (_, json) = call(&h.app, request("POST", "/api/guilds/Y/toggles/roleCreated", None)).await;
    assert_eq!(json["enabled"], true);
    assert_eq!(json["message"], "Log type **roleCreated** is now **ENABLED**");
}

#[tokio::test]
async fn unknown_type_is_bad_request() {
    let h = setup();
    let (status, json) = call(&h.app, request("POST", "/api/guilds/Y/toggles/typingStarted", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "unknown event type: typingStarted");

    let (status, _) = call(
        &h.app,
        request(
            "PUT",
            "/api/guilds/Y/log-channel/RoleCreated",
            Some(serde_json::json!({"channelId": "D2"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "labels are case-sensitive");
}

#[tokio::test]
async fn settings_summary_reflects_writes() {
    let h = setup();
    call(
        &h.app,
        request(
            "PUT",
            "/api/guilds/g1/log-channel",
            Some(serde_json::json!({"channelId": "D1"})),
        ),
    )
    .await;
    call(&h.app, request("POST", "/api/guilds/g1/toggles/vcLeft", None)).await;

    let (status, json) = call(&h.app, request("GET", "/api/guilds/g1/settings", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["guildId"], "g1");
    assert_eq!(json["globalLogChannel"], "D1");
    assert_eq!(json["disabled"], serde_json::json!(["vcLeft"]));
}
