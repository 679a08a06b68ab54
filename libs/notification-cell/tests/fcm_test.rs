// =====================================================================================
// FCM HTTP v1 TESTS - OAUTH TOKEN REUSE
// =====================================================================================

use std::collections::BTreeMap;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notification_cell::services::channels::ServiceAccount;
use notification_cell::{FcmPushSender, PushSender};

const TEST_KEY: &str = include_str!("fixtures/service_account_key.pem");

fn sender_for(server: &MockServer) -> FcmPushSender {
    let account = ServiceAccount {
        client_email: "push@clinica-demo.iam.gserviceaccount.com".to_string(),
        private_key: TEST_KEY.to_string(),
        token_uri: format!("{}/token", server.uri()),
    };
    FcmPushSender::new("clinica-demo", account).with_base_url(&server.uri())
}

#[tokio::test]
async fn access_token_is_minted_once_for_many_pushes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.cached",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/clinica-demo/messages:send"))
        .and(header("authorization", "Bearer ya29.cached"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "msg"})))
        .expect(3)
        .mount(&server)
        .await;

    // Each request builds its own sender; the token survives between them.
    let first = sender_for(&server)
        .send(&["tok-a".to_string(), "tok-b".to_string()], "Cita Confirmada", "cuerpo", &BTreeMap::new())
        .await
        .unwrap();
    let second = sender_for(&server)
        .send(&["tok-a".to_string()], "Cita Cancelada", "cuerpo", &BTreeMap::new())
        .await
        .unwrap();

    assert_eq!(first, 2);
    assert_eq!(second, 1);
}

#[tokio::test]
async fn failed_token_exchange_is_a_push_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/clinica-demo/messages:send"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = sender_for(&server)
        .send(&["tok-a".to_string()], "Cita", "cuerpo", &BTreeMap::new())
        .await;

    assert!(result.is_err());
}
