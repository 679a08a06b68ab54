use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::tempdir;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use backup_cell::backup_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

async fn send(app: Router, method: Method, uri: &str, token: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn setup(server: &MockServer, backup_dir: &Path) -> (Arc<AppConfig>, TestConfig) {
    let test_config = TestConfig::with_postgrest(&server.uri());
    let mut config = test_config.to_app_config();
    config.backup_dir = backup_dir.to_string_lossy().into_owned();
    config.backup_retention_days = 7;
    (Arc::new(config), test_config)
}

fn admin_token(test_config: &TestConfig) -> String {
    let admin = TestUser::admin("admin@clinica.com").with_id(1);
    JwtTestUtils::create_test_token(&admin, &test_config.jwt_secret, Some(1))
}

fn backup_row(id: i64, file: &Path, fecha: &str) -> Value {
    json!({
        "id": id,
        "fecha_backup": fecha,
        "nombre_archivo": file.file_name().unwrap().to_string_lossy(),
        "tamano_bytes": 2048,
        "usuario_responsable_id": 1,
        "tipo_backup": "Completo",
        "estado": "Exitoso",
        "ubicacion_almacenamiento": file.to_string_lossy(),
        "notas": null
    })
}

async fn mount_audit(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/core_bitacora"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": 1}])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn admins_list_backups_newest_first() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let (config, test_config) = setup(&server, dir.path());

    Mock::given(method("GET"))
        .and(path("/core_registrobackup"))
        .and(query_param("order", "fecha_backup.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            backup_row(2, &dir.path().join("backup_manual_20250302_100000.sql"), "2025-03-02T10:00:00Z"),
            backup_row(1, &dir.path().join("backup_auto_20250301_020000.sql"), "2025-03-01T02:00:00Z"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(backup_routes(config), Method::GET, "/", &admin_token(&test_config)).await;

    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["nombre_archivo"], "backup_manual_20250302_100000.sql");
}

#[tokio::test]
async fn backups_are_admin_only() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let (config, test_config) = setup(&server, dir.path());
    let doctor = TestUser::doctor("medico@clinica.com").with_id(11);
    let token = JwtTestUtils::create_test_token(&doctor, &test_config.jwt_secret, Some(1));

    let (status, _) = send(backup_routes(config.clone()), Method::GET, "/", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(backup_routes(config), Method::POST, "/", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn manual_backup_without_database_settings_is_unavailable() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let (config, test_config) = setup(&server, dir.path());

    Mock::given(method("POST"))
        .and(path("/core_bitacora"))
        .and(body_partial_json(json!({
            "accion_realizada": "Error en backup manual",
            "modulo_afectado": "Backup/Restore",
            "usuario_id": 1
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/core_registrobackup"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = send(backup_routes(config), Method::POST, "/", &admin_token(&test_config)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("backups"));
}

#[tokio::test]
async fn deleting_a_backup_removes_row_and_file() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let (config, test_config) = setup(&server, dir.path());
    let file = dir.path().join("backup_manual_20250302_100000.sql");
    std::fs::write(&file, "-- PostgreSQL database dump").unwrap();

    Mock::given(method("GET"))
        .and(path("/core_registrobackup"))
        .and(query_param("id", "eq.9"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([backup_row(9, &file, "2025-03-02T10:00:00Z")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/core_registrobackup"))
        .and(query_param("id", "eq.9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    mount_audit(&server).await;

    let (status, _) = send(backup_routes(config), Method::DELETE, "/9", &admin_token(&test_config)).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!file.exists());
}

#[tokio::test]
async fn restoring_a_missing_file_is_not_found() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let (config, test_config) = setup(&server, dir.path());
    let file = dir.path().join("backup_auto_20250301_020000.sql");

    Mock::given(method("GET"))
        .and(path("/core_registrobackup"))
        .and(query_param("id", "eq.4"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([backup_row(4, &file, "2025-03-01T02:00:00Z")])),
        )
        .mount(&server)
        .await;

    let (status, body) = send(
        backup_routes(config),
        Method::POST,
        "/4/restaurar",
        &admin_token(&test_config),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("backup_auto_20250301_020000.sql"));
}

#[tokio::test]
async fn cleanup_removes_expired_rows_and_their_files() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let (config, test_config) = setup(&server, dir.path());
    let kept_on_disk = dir.path().join("backup_auto_20250101_020000.sql");
    let already_gone = dir.path().join("backup_auto_20250102_020000.sql");
    std::fs::write(&kept_on_disk, "-- dump").unwrap();

    Mock::given(method("GET"))
        .and(path("/core_registrobackup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            backup_row(1, &kept_on_disk, "2025-01-01T02:00:00Z"),
            backup_row(2, &already_gone, "2025-01-02T02:00:00Z"),
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/core_registrobackup"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    mount_audit(&server).await;

    let (status, body) = send(
        backup_routes(config),
        Method::POST,
        "/limpiar",
        &admin_token(&test_config),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["registros_eliminados"], 2);
    assert_eq!(body["archivos_eliminados"], 1);
    assert!(!kept_on_disk.exists());
}

#[tokio::test]
async fn cleanup_with_nothing_expired_deletes_nothing() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let (config, test_config) = setup(&server, dir.path());

    Mock::given(method("GET"))
        .and(path("/core_registrobackup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/core_registrobackup"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = send(
        backup_routes(config),
        Method::POST,
        "/limpiar",
        &admin_token(&test_config),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["registros_eliminados"], 0);
}
