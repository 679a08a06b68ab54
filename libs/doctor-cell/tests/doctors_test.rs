use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Local};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::{
    assignment_routes, doctor_routes, schedule_routes, specialty_routes, weekday_name,
};
use shared_utils::test_utils::{JwtTestUtils, MockPostgrestResponses, TestConfig, TestUser};

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    user: &TestUser,
    config: &TestConfig,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let token = JwtTestUtils::create_test_token(user, &config.jwt_secret, Some(1));
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn doctor_with_user(user_id: i64, email: &str) -> Value {
    let mut usuario = MockPostgrestResponses::user_row(user_id, email, 2, "Medico");
    usuario["medico"] = json!({"usuario_id": user_id});
    let mut row = MockPostgrestResponses::doctor_row(user_id, "Activo");
    row["usuario"] = usuario;
    row["especialidades"] = json!([{
        "id": 5,
        "medico_id": user_id,
        "especialidad_id": 1,
        "especialidad": MockPostgrestResponses::specialty_row(1, "CARD", "Cardiología")
    }]);
    row
}

#[tokio::test]
async fn doctors_filtered_by_specialty() {
    let server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&server.uri());
    let patient = TestUser::patient("paciente1@salud.com");

    Mock::given(method("GET"))
        .and(path("/medico_especialidad"))
        .and(query_param("especialidad_id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"medico_id": 11},
            {"medico_id": 12}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core_medico"))
        .and(query_param("usuario_id", "in.(11,12)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            doctor_with_user(11, "medico1@salud.com")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        doctor_routes(config.to_arc()),
        Method::GET,
        "/?especialidad=1",
        &patient,
        &config,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["usuario"]["tipo_usuario"], "Medico");
    assert_eq!(body[0]["especialidades"][0]["especialidad"]["nombre"], "Cardiología");
}

#[tokio::test]
async fn unknown_specialty_filter_yields_no_doctors() {
    let server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&server.uri());
    let admin = TestUser::admin("admin1@salud.com");

    Mock::given(method("GET"))
        .and(path("/medico_especialidad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core_medico"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = send(
        doctor_routes(config.to_arc()),
        Method::GET,
        "/?especialidad=99",
        &admin,
        &config,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn duplicate_license_is_a_conflict() {
    let server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&server.uri());
    let admin = TestUser::admin("admin1@salud.com");

    Mock::given(method("GET"))
        .and(path("/core_medico"))
        .and(query_param("numero_licencia", "eq.M-11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"usuario_id": 11}])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/core_usuario"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = send(
        doctor_routes(config.to_arc()),
        Method::POST,
        "/",
        &admin,
        &config,
        Some(json!({
            "email": "nuevo.medico@salud.com",
            "password": "medico123",
            "nombre": "Luis",
            "apellido": "Gómez",
            "numero_licencia": "M-11"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Ya existe un médico con este número de licencia.");
}

#[tokio::test]
async fn only_admins_create_doctors() {
    let config = TestConfig::default();
    let doctor = TestUser::doctor("medico1@salud.com");

    let (status, _) = send(
        doctor_routes(config.to_arc()),
        Method::POST,
        "/",
        &doctor,
        &config,
        Some(json!({"numero_licencia": "M-99"})),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn doctor_state_must_be_known() {
    let config = TestConfig::default();
    let admin = TestUser::admin("admin1@salud.com");

    let (status, _) = send(
        doctor_routes(config.to_arc()),
        Method::PATCH,
        "/11",
        &admin,
        &config,
        Some(json!({"estado": "Jubilado"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn specialty_with_doctors_cannot_be_deleted() {
    let server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&server.uri());
    let admin = TestUser::admin("admin1@salud.com");

    Mock::given(method("GET"))
        .and(path("/core_especialidad"))
        .and(query_param("id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::specialty_row(1, "CARD", "Cardiología")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/medico_especialidad"))
        .and(query_param("especialidad_id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 5}])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/core_especialidad"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = send(
        specialty_routes(config.to_arc()),
        Method::DELETE,
        "/1",
        &admin,
        &config,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "No se puede eliminar la especialidad porque está asociada a uno o más médicos."
    );
}

#[tokio::test]
async fn unused_specialty_is_deleted() {
    let server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&server.uri());
    let admin = TestUser::admin("admin1@salud.com");

    Mock::given(method("GET"))
        .and(path("/core_especialidad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::specialty_row(2, "DERM", "Dermatología")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/medico_especialidad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/core_especialidad"))
        .and(query_param("id", "eq.2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (status, _) = send(
        specialty_routes(config.to_arc()),
        Method::DELETE,
        "/2",
        &admin,
        &config,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn duplicate_specialty_assignment_is_a_conflict() {
    let server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&server.uri());
    let admin = TestUser::admin("admin1@salud.com");

    Mock::given(method("GET"))
        .and(path("/core_medico"))
        .and(query_param("usuario_id", "eq.11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"usuario_id": 11}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core_especialidad"))
        .and(query_param("id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::specialty_row(1, "CARD", "Cardiología")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/medico_especialidad"))
        .and(query_param("medico_id", "eq.11"))
        .and(query_param("especialidad_id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 5}])))
        .mount(&server)
        .await;

    let (status, body) = send(
        doctor_routes(config.to_arc()),
        Method::POST,
        "/11/especialidades",
        &admin,
        &config,
        Some(json!({"especialidad": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "El médico ya tiene asignada esta especialidad.");
}

#[tokio::test]
async fn schedule_must_end_after_it_starts() {
    let config = TestConfig::default();
    let admin = TestUser::admin("admin1@salud.com");

    let (status, body) = send(
        schedule_routes(config.to_arc()),
        Method::POST,
        "/",
        &admin,
        &config,
        Some(json!({
            "medico_especialidad": 5,
            "dia_semana": "Lunes",
            "hora_inicio": "12:00:00",
            "hora_fin": "08:00:00"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "La hora de inicio debe ser anterior a la hora de fin.");
}

#[tokio::test]
async fn duplicate_schedule_is_a_conflict() {
    let server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&server.uri());
    let admin = TestUser::admin("admin1@salud.com");

    Mock::given(method("GET"))
        .and(path("/medico_especialidad"))
        .and(query_param("id", "eq.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 5}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core_horariomedico"))
        .and(query_param("dia_semana", "eq.Lunes"))
        .and(query_param("hora_inicio", "eq.08:00:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/core_horariomedico"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let (status, _) = send(
        schedule_routes(config.to_arc()),
        Method::POST,
        "/",
        &admin,
        &config,
        Some(json!({
            "medico_especialidad": 5,
            "dia_semana": "Lunes",
            "hora_inicio": "08:00:00",
            "hora_fin": "12:00:00"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn schedule_is_created() {
    let server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&server.uri());
    let admin = TestUser::admin("admin1@salud.com");

    Mock::given(method("GET"))
        .and(path("/medico_especialidad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 5}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core_horariomedico"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/core_horariomedico"))
        .and(body_partial_json(json!({
            "medico_especialidad_id": 5,
            "dia_semana": "Martes",
            "hora_inicio": "14:00:00",
            "hora_fin": "18:00:00",
            "activo": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockPostgrestResponses::schedule_row(3, 5, "Martes", "14:00:00", "18:00:00")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        schedule_routes(config.to_arc()),
        Method::POST,
        "/",
        &admin,
        &config,
        Some(json!({
            "medico_especialidad": 5,
            "dia_semana": "Martes",
            "hora_inicio": "14:00:00",
            "hora_fin": "18:00:00"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 3);
}

async fn mount_assignment(server: &MockServer, estado: &str) {
    Mock::given(method("GET"))
        .and(path("/medico_especialidad"))
        .and(query_param("id", "eq.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::doctor_specialty_row(5, 11, 1)
        ])))
        .mount(server)
        .await;
    let rows = if estado == "Activo" {
        json!([{"usuario_id": 11}])
    } else {
        json!([])
    };
    Mock::given(method("GET"))
        .and(path("/core_medico"))
        .and(query_param("usuario_id", "eq.11"))
        .and(query_param("estado", "eq.Activo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(server)
        .await;
}

#[tokio::test]
async fn doctors_on_vacation_offer_no_slots() {
    let server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&server.uri());
    let patient = TestUser::patient("paciente1@salud.com");
    mount_assignment(&server, "Vacaciones").await;
    Mock::given(method("GET"))
        .and(path("/core_horariomedico"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = send(
        assignment_routes(config.to_arc()),
        Method::GET,
        "/5/disponibilidad",
        &patient,
        &config,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["medico"], 11);
    assert_eq!(body["dias"], json!([]));
}

#[tokio::test]
async fn availability_skips_booked_slots() {
    let server = MockServer::start().await;
    let config = TestConfig::with_postgrest(&server.uri());
    let patient = TestUser::patient("paciente1@salud.com");
    mount_assignment(&server, "Activo").await;

    let today = Local::now().date_naive();
    let next_week = today + Duration::days(7);
    let dia = weekday_name(today);

    Mock::given(method("GET"))
        .and(path("/core_horariomedico"))
        .and(query_param("medico_especialidad_id", "eq.5"))
        .and(query_param("activo", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::schedule_row(1, 5, dia, "08:00:00", "09:00:00")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core_agendacita"))
        .and(query_param("medico_especialidad_id", "eq.5"))
        .and(query_param("estado", "neq.cancelada"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"fecha_cita": next_week.to_string(), "hora_cita": "08:00:00"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        assignment_routes(config.to_arc()),
        Method::GET,
        "/5/disponibilidad",
        &patient,
        &config,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["desde"], today.to_string());
    let days = body["dias"].as_array().unwrap();
    let booked_day = days
        .iter()
        .find(|d| d["fecha"] == next_week.to_string())
        .unwrap();
    assert_eq!(booked_day["horas"], json!(["08:30:00"]));
    let last_day = days.last().unwrap();
    assert_eq!(last_day["fecha"], (today + Duration::days(14)).to_string());
    assert_eq!(last_day["horas"], json!(["08:00:00", "08:30:00"]));
}
