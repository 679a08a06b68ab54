use anyhow::{anyhow, Context, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::query::Query;

/// Thin client over the PostgREST API of the clinic database.
#[derive(Clone)]
pub struct PostgrestClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl PostgrestClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.postgrest_url.trim_end_matches('/').to_string(),
            service_key: config.postgrest_service_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !self.service_key.is_empty() {
            headers.insert("apikey", HeaderValue::from_str(&self.service_key)?);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", self.service_key))?,
            );
        }

        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Data API error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    anyhow!("Authentication error: {}", error_text)
                }
                StatusCode::NOT_FOUND => anyhow!("Resource not found: {}", error_text),
                StatusCode::CONFLICT => anyhow!("Unique constraint violated: {}", error_text),
                _ => anyhow!("Data API error ({}): {}", status, error_text),
            });
        }

        Ok(response)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body, extra_headers).await?;
        let data = response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to decode response from {}", path))?;
        Ok(data)
    }

    fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    pub async fn select<T>(&self, table: &str, query: &Query) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let path = format!("/{}{}", table, query.to_query_string());
        self.request(Method::GET, &path, None).await
    }

    pub async fn select_one<T>(&self, table: &str, query: &Query) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let rows: Vec<T> = self.select(table, query).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn exists(&self, table: &str, query: &Query) -> Result<bool> {
        let rows: Vec<Value> = self.select(table, &query.clone().limit(1)).await?;
        Ok(!rows.is_empty())
    }

    pub async fn insert<T>(&self, table: &str, body: Value) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let rows: Vec<T> = self.insert_many(table, body).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| anyhow!("Insert into {} returned no rows", table))
    }

    pub async fn insert_many<T>(&self, table: &str, body: Value) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let path = format!("/{}", table);
        self.request_with_headers(
            Method::POST,
            &path,
            Some(body),
            Some(Self::representation_headers()),
        )
        .await
    }

    pub async fn update<T>(&self, table: &str, query: &Query, body: Value) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let path = format!("/{}{}", table, query.to_query_string());
        self.request_with_headers(
            Method::PATCH,
            &path,
            Some(body),
            Some(Self::representation_headers()),
        )
        .await
    }

    pub async fn delete(&self, table: &str, query: &Query) -> Result<()> {
        let path = format!("/{}{}", table, query.to_query_string());
        self.send(Method::DELETE, &path, None, None).await?;
        Ok(())
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> PostgrestClient {
        PostgrestClient::new(&AppConfig {
            postgrest_url: server.uri(),
            postgrest_service_key: "service-key".to_string(),
            ..AppConfig::default()
        })
    }

    #[tokio::test]
    async fn select_sends_filters_and_service_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/core_rol"))
            .and(query_param("nombre_rol", "eq.Paciente"))
            .and(header("apikey", "service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 3, "nombre_rol": "Paciente"}
            ])))
            .mount(&server)
            .await;

        let rows: Vec<Value> = client_for(&server)
            .select("core_rol", &Query::new().eq("nombre_rol", "Paciente"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], 3);
    }

    #[tokio::test]
    async fn insert_asks_for_representation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/core_permiso"))
            .and(header("Prefer", "return=representation"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([
                {"id": 9, "codigo": "ver_usuarios"}
            ])))
            .mount(&server)
            .await;

        let row: Value = client_for(&server)
            .insert("core_permiso", json!({"codigo": "ver_usuarios"}))
            .await
            .unwrap();
        assert_eq!(row["id"], 9);
    }

    #[tokio::test]
    async fn conflict_status_becomes_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key"))
            .mount(&server)
            .await;

        let result: Result<Value> = client_for(&server)
            .insert("core_permiso", json!({}))
            .await;
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Unique constraint violated"));
    }

    #[tokio::test]
    async fn delete_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/core_dispositivo"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        client_for(&server)
            .delete("core_dispositivo", &Query::new().eq("id", 4))
            .await
            .unwrap();
    }
}
