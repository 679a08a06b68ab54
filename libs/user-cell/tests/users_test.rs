use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_utils::test_utils::{JwtTestUtils, MockPostgrestResponses, TestConfig, TestUser};
use user_cell::{role_routes, user_routes};

fn bearer(user: &TestUser, config: &TestConfig) -> String {
    format!(
        "Bearer {}",
        JwtTestUtils::create_test_token(user, &config.jwt_secret, Some(1))
    )
}

async fn send(app: Router, method: Method, uri: &str, auth: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", auth)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn admin_lists_users_with_search_and_ordering() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&mock_server.uri());
    let admin = TestUser::admin("admin1@salud.com");

    let mut doctor = MockPostgrestResponses::user_row(11, "medico1@salud.com", 2, "Medico");
    doctor["medico"] = json!({"usuario_id": 11});
    doctor["password"] = json!("$argon2id$hash");

    Mock::given(method("GET"))
        .and(path("/core_usuario"))
        .and(query_param("or", r#"(email.ilike."*medico*",nombre.ilike."*medico*",apellido.ilike."*medico*",telefono.ilike."*medico*")"#))
        .and(query_param("order", "nombre.desc"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doctor])))
        .mount(&mock_server)
        .await;

    let (status, body) = send(
        user_routes(config.to_arc()),
        Method::GET,
        "/?search=medico&ordering=-nombre,password&limit=10",
        &bearer(&admin, &config),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["tipo_usuario"], "Medico");
    assert_eq!(body[0]["rol"]["nombre_rol"], "Medico");
    assert!(body[0].get("password").is_none());
}

#[tokio::test]
async fn patient_without_permission_cannot_list_users() {
    let config = TestConfig::default();
    let patient = TestUser::patient("paciente1@salud.com");

    let (status, body) = send(
        user_routes(config.to_arc()),
        Method::GET,
        "/",
        &bearer(&patient, &config),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Missing permission: ver_usuarios");
}

#[tokio::test]
async fn create_user_rejects_short_password() {
    let config = TestConfig::default();
    let admin = TestUser::admin("admin1@salud.com");

    let (status, _) = send(
        user_routes(config.to_arc()),
        Method::POST,
        "/",
        &bearer(&admin, &config),
        Some(json!({
            "email": "nuevo@salud.com",
            "password": "123",
            "nombre": "Nuevo",
            "apellido": "Usuario",
            "id_rol": 3
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_user_with_taken_email_conflicts() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&mock_server.uri());
    let admin = TestUser::admin("admin1@salud.com");

    Mock::given(method("GET"))
        .and(path("/core_rol"))
        .and(query_param("id", "eq.3"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([MockPostgrestResponses::role_row(3, "Paciente")])),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core_usuario"))
        .and(query_param("email", "eq.ana@salud.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 5}])))
        .mount(&mock_server)
        .await;

    let (status, body) = send(
        user_routes(config.to_arc()),
        Method::POST,
        "/",
        &bearer(&admin, &config),
        Some(json!({
            "email": "Ana@Salud.com",
            "password": "secreto123",
            "nombre": "Ana",
            "apellido": "Pérez",
            "id_rol": 3
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Ya existe un usuario con este email");
}

#[tokio::test]
async fn change_password_requires_six_characters() {
    let config = TestConfig::default();
    let user = TestUser::patient("paciente1@salud.com").with_id(40);

    let (status, body) = send(
        user_routes(config.to_arc()),
        Method::POST,
        "/40/cambiar-password",
        &bearer(&user, &config),
        Some(json!({ "password": "abc" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password inválido (mínimo 6 caracteres).");
}

#[tokio::test]
async fn role_permissions_must_be_a_list() {
    let config = TestConfig::default();
    let admin = TestUser::admin("admin1@salud.com");

    let (status, body) = send(
        role_routes(config.to_arc()),
        Method::PUT,
        "/1/permisos",
        &bearer(&admin, &config),
        Some(json!({ "permisos": "1,2" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "El campo permisos debe ser una lista de IDs.");
}

/// Role 2 currently holds permissions 4 and 9; 4 and 7 exist in the catalog.
async fn mount_role_with_grants(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/core_rol"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([MockPostgrestResponses::role_row(2, "Medico")])),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core_permiso"))
        .and(query_param("id", "in.(4,7)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 4}, {"id": 7}])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core_rol_permisos"))
        .and(query_param("select", "permiso_id"))
        .and(query_param("rol_id", "eq.2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"permiso_id": 4}, {"permiso_id": 9}])),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn role_permissions_are_replaced() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&mock_server.uri());
    let admin = TestUser::admin("admin1@salud.com");
    mount_role_with_grants(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/core_rol_permisos"))
        .and(body_json(json!([{"rol_id": 2, "permiso_id": 7}])))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([{"id": 2, "rol_id": 2, "permiso_id": 7}])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/core_rol_permisos"))
        .and(query_param("rol_id", "eq.2"))
        .and(query_param("permiso_id", "in.(9)"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (status, body) = send(
        role_routes(config.to_arc()),
        Method::PUT,
        "/2/permisos",
        &bearer(&admin, &config),
        Some(json!({ "permisos": [7, 4, 4] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Permisos actualizados correctamente.");
}

#[tokio::test]
async fn failed_grant_keeps_existing_permissions() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&mock_server.uri());
    let admin = TestUser::admin("admin1@salud.com");
    mount_role_with_grants(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/core_rol_permisos"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/core_rol_permisos"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (status, _) = send(
        role_routes(config.to_arc()),
        Method::PUT,
        "/2/permisos",
        &bearer(&admin, &config),
        Some(json!({ "permisos": [4, 7] })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&mock_server.uri());
    let admin = TestUser::admin("admin1@salud.com");

    Mock::given(method("GET"))
        .and(path("/core_usuario"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let (status, _) = send(
        user_routes(config.to_arc()),
        Method::GET,
        "/999",
        &bearer(&admin, &config),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
