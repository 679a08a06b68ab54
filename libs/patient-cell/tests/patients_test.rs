use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::{patient_routes, registration_routes};
use shared_utils::test_utils::{JwtTestUtils, MockPostgrestResponses, TestConfig, TestUser};

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    auth: Option<String>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = auth {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn token_for(user: &TestUser, config: &TestConfig) -> Option<String> {
    Some(JwtTestUtils::create_test_token(user, &config.jwt_secret, Some(1)))
}

fn patient_with_user(user_id: i64, email: &str) -> Value {
    let mut usuario = MockPostgrestResponses::user_row(user_id, email, 3, "Paciente");
    usuario["paciente"] = json!({"usuario_id": user_id});
    let mut row = MockPostgrestResponses::patient_row(user_id);
    row["usuario"] = usuario;
    row
}

fn registration_body() -> Value {
    json!({
        "email": "Nuevo.Paciente@Salud.com",
        "password": "paciente123",
        "nombre": "Ana",
        "apellido": "Pérez",
        "telefono": "600111222",
        "genero": "F",
        "tipo_sangre": "O+",
        "alergias": "Penicilina"
    })
}

async fn mount_account_creation(server: &MockServer, new_id: i64) {
    Mock::given(method("GET"))
        .and(path("/core_rol"))
        .and(query_param("nombre_rol", "eq.Paciente"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::role_row(3, "Paciente")
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core_rol"))
        .and(query_param("id", "eq.3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::role_row(3, "Paciente")
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core_usuario"))
        .and(query_param("email", "eq.nuevo.paciente@salud.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/core_usuario"))
        .and(body_partial_json(json!({
            "email": "nuevo.paciente@salud.com",
            "id_rol_id": 3
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": new_id}])))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core_usuario"))
        .and(query_param("id", format!("eq.{}", new_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::user_row(new_id, "nuevo.paciente@salud.com", 3, "Paciente")
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn registration_creates_account_profile_and_history() {
    let server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&server.uri());
    mount_account_creation(&server, 60).await;

    Mock::given(method("POST"))
        .and(path("/core_paciente"))
        .and(body_partial_json(json!({
            "usuario_id": 60,
            "tipo_sangre": "O+",
            "estado": "Activo"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockPostgrestResponses::patient_row(60)
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core_historiaclinica"))
        .and(query_param("paciente_id", "eq.60"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/core_historiaclinica"))
        .and(body_partial_json(json!({"paciente_id": 60, "activo": true})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": 90,
            "paciente_id": 60,
            "fecha_creacion": "2025-03-01T10:00:00Z",
            "observaciones_generales": null,
            "activo": true
        }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/core_bitacora"))
        .and(body_partial_json(json!({
            "usuario_id": 60,
            "accion_realizada": "Registro de paciente",
            "modulo_afectado": "Pacientes"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core_paciente"))
        .and(query_param("usuario_id", "eq.60"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            patient_with_user(60, "nuevo.paciente@salud.com")
        ])))
        .mount(&server)
        .await;

    let (status, body) = send(
        registration_routes(config.to_arc()),
        Method::POST,
        "/",
        None,
        Some(registration_body()),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["usuario"]["id"], 60);
    assert_eq!(body["usuario"]["tipo_usuario"], "Paciente");
    assert!(body["usuario"].get("password").is_none());
    assert_eq!(body["tipo_sangre"], "O+");
}

#[tokio::test]
async fn failed_profile_removes_the_new_account() {
    let server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&server.uri());
    mount_account_creation(&server, 61).await;

    Mock::given(method("POST"))
        .and(path("/core_paciente"))
        .respond_with(ResponseTemplate::new(500).set_body_string("insert failed"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/core_usuario"))
        .and(query_param("id", "eq.61"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/core_historiaclinica"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let (status, _) = send(
        registration_routes(config.to_arc()),
        Method::POST,
        "/",
        None,
        Some(registration_body()),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn registration_with_short_password_is_rejected() {
    let server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&server.uri());
    Mock::given(method("GET"))
        .and(path("/core_rol"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::role_row(3, "Paciente")
        ])))
        .mount(&server)
        .await;

    let mut body = registration_body();
    body["password"] = json!("123");
    let (status, body) = send(
        registration_routes(config.to_arc()),
        Method::POST,
        "/",
        None,
        Some(body),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password inválido (mínimo 6 caracteres).");
}

#[tokio::test]
async fn staff_search_patients_by_account_fields() {
    let server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&server.uri());
    let doctor = TestUser::doctor("medico1@salud.com");

    Mock::given(method("GET"))
        .and(path("/core_paciente"))
        .and(query_param(
            "usuario.or",
            r#"(nombre.ilike."*ana*",apellido.ilike."*ana*",email.ilike."*ana*",telefono.ilike."*ana*")"#,
        ))
        .and(query_param("estado", "eq.Activo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            patient_with_user(40, "paciente1@salud.com")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        patient_routes(config.to_arc()),
        Method::GET,
        "/?search=ana&estado=Activo",
        token_for(&doctor, &config),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["usuario"]["email"], "paciente1@salud.com");
}

#[tokio::test]
async fn patients_cannot_list_patients() {
    let config = TestConfig::default();
    let patient = TestUser::patient("paciente1@salud.com");

    let (status, _) = send(
        patient_routes(config.to_arc()),
        Method::GET,
        "/",
        token_for(&patient, &config),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn patient_reads_only_own_record() {
    let server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&server.uri());
    let patient = TestUser::patient("paciente1@salud.com").with_id(40);

    Mock::given(method("GET"))
        .and(path("/core_paciente"))
        .and(query_param("usuario_id", "eq.40"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            patient_with_user(40, "paciente1@salud.com")
        ])))
        .mount(&server)
        .await;

    let (own, _) = send(
        patient_routes(config.to_arc()),
        Method::GET,
        "/40",
        token_for(&patient, &config),
        None,
    )
    .await;
    let (other, body) = send(
        patient_routes(config.to_arc()),
        Method::GET,
        "/41",
        token_for(&patient, &config),
        None,
    )
    .await;

    assert_eq!(own, StatusCode::OK);
    assert_eq!(other, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Solo puede consultar su propio perfil de paciente");
}

#[tokio::test]
async fn invalid_state_is_rejected_on_update() {
    let config = TestConfig::default();
    let admin = TestUser::admin("admin1@salud.com");

    let (status, _) = send(
        patient_routes(config.to_arc()),
        Method::PATCH,
        "/40",
        token_for(&admin, &config),
        Some(json!({"estado": "Suspendido"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn staff_update_medical_fields() {
    let server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&server.uri());
    let doctor = TestUser::doctor("medico1@salud.com");

    Mock::given(method("PATCH"))
        .and(path("/core_paciente"))
        .and(query_param("usuario_id", "eq.40"))
        .and(body_partial_json(json!({"alergias": "Ninguna"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::patient_row(40)
        ])))
        .expect(1)
        .mount(&server)
        .await;
    let mut updated = patient_with_user(40, "paciente1@salud.com");
    updated["alergias"] = json!("Ninguna");
    Mock::given(method("GET"))
        .and(path("/core_paciente"))
        .and(query_param("usuario_id", "eq.40"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([updated])))
        .mount(&server)
        .await;

    let (status, body) = send(
        patient_routes(config.to_arc()),
        Method::PATCH,
        "/40",
        token_for(&doctor, &config),
        Some(json!({"alergias": "Ninguna"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alergias"], "Ninguna");
}
