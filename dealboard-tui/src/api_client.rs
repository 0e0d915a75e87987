//! REST client for the sales backend.

use crate::config::{AuthConfig, TuiConfig};
use crate::traits::SalesBackend;
use async_trait::async_trait;
use dealboard_core::{
    ListParams, Opportunity, OpportunityId, Page, PipelineParams, PipelinePayload, Stage, Stats,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Config error: {0}")]
    Config(String),
}

impl ApiClientError {
    /// Short text suitable for a notification line.
    pub fn user_message(&self) -> String {
        match self {
            ApiClientError::Status { message, .. } => message.clone(),
            ApiClientError::Http(err) if err.is_timeout() => "Request timed out".to_string(),
            ApiClientError::Http(err) if err.is_connect() => "Backend unreachable".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Serialize)]
struct StatusUpdate {
    status: Stage,
}

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    trailing_slash: bool,
    auth_header: HeaderMap,
}

impl RestClient {
    pub fn new(config: &TuiConfig) -> Result<Self, ApiClientError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let auth_header = build_auth_headers(&config.auth)?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            trailing_slash: config.trailing_slash,
            auth_header,
        })
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path, self.trailing_slash)
    }

    async fn get_json<T, Q>(&self, path: &str, query: Option<&Q>) -> Result<T, ApiClientError>
    where
        T: serde::de::DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let mut request = self
            .client
            .get(self.url(path))
            .headers(self.auth_header.clone());
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = request.send().await?;
        self.parse_response(response).await
    }

    /// POST a JSON body and hand back the raw status and text for the caller
    /// to judge.
    async fn post<B>(&self, path: &str, body: &B) -> Result<(u16, String), ApiClientError>
    where
        B: serde::Serialize + ?Sized,
    {
        let response = self
            .client
            .post(self.url(path))
            .headers(self.auth_header.clone())
            .json(body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_else(|err| {
            tracing::debug!(error = %err, status, "Could not read response body");
            String::new()
        });
        Ok((status, text))
    }

    async fn delete(&self, path: &str) -> Result<(), ApiClientError> {
        let response = self
            .client
            .delete(self.url(path))
            .headers(self.auth_header.clone())
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await?;
        Err(status_error(status.as_u16(), &text))
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiClientError> {
        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(ApiClientError::from)
        } else {
            Err(status_error(status.as_u16(), &text))
        }
    }
}

#[async_trait]
impl SalesBackend for RestClient {
    async fn fetch_pipeline(&self, params: &PipelineParams) -> Result<PipelinePayload, ApiClientError> {
        let body: serde_json::Value = self.get_json("/pipeline", Some(params)).await?;
        Ok(PipelinePayload::from_value(body)?)
    }

    async fn update_status(&self, id: OpportunityId, stage: Stage) -> Result<(), ApiClientError> {
        let path = format!("/sales/{}/update_status", id);
        let (status, body) = self.post(&path, &StatusUpdate { status: stage }).await?;
        check_status_update(id, status, &body)
    }

    async fn delete_sale(&self, id: OpportunityId) -> Result<(), ApiClientError> {
        self.delete(&format!("/sales/{}", id)).await
    }

    async fn fetch_stats(&self) -> Result<Stats, ApiClientError> {
        self.get_json::<Stats, ()>("/sales/stats", None).await
    }

    async fn list_sales(&self, params: &ListParams) -> Result<Page<Opportunity>, ApiClientError> {
        self.get_json("/sales", Some(params)).await
    }
}

/// `base` + `path`, with an optional trailing slash before the query string.
pub fn join_url(base: &str, path: &str, trailing_slash: bool) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_end_matches('/');
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    if trailing_slash {
        format!("{}{}/", base, path)
    } else {
        format!("{}{}", base, path)
    }
}

/// Verdict on a status update response.
///
/// Any 2xx means the backend committed the change. A body that does not
/// decode, or names another record, is logged and otherwise ignored.
pub fn check_status_update(id: OpportunityId, status: u16, body: &str) -> Result<(), ApiClientError> {
    if !(200..300).contains(&status) {
        return Err(status_error(status, body));
    }
    match serde_json::from_str::<Opportunity>(body) {
        Ok(updated) if updated.id != id => {
            tracing::warn!(%id, returned = %updated.id, "Status update answered with another record");
        }
        Ok(_) => {}
        Err(err) => tracing::warn!(%id, error = %err, "Status update body not understood"),
    }
    Ok(())
}

/// Turn an error response into `ApiClientError::Status`, surfacing the
/// backend's own message when the body carries one.
pub fn status_error(status: u16, body: &str) -> ApiClientError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| error_message(&value))
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("request failed with status {}", status)
            } else {
                trimmed.to_string()
            }
        });
    ApiClientError::Status { status, message }
}

fn error_message(value: &serde_json::Value) -> Option<String> {
    ["error", "detail", "message"]
        .iter()
        .find_map(|key| value.get(key))
        .and_then(|field| match field {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        })
}

fn build_auth_headers(auth: &AuthConfig) -> Result<HeaderMap, ApiClientError> {
    let mut headers = HeaderMap::new();
    if let Some(api_key) = &auth.api_key {
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_str(api_key).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    if let Some(jwt) = &auth.jwt {
        let value = format!("Bearer {}", jwt);
        headers.insert(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&value).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_follow_trailing_slash_setting() {
        assert_eq!(
            join_url("http://host/api/", "/sales/7/update_status", true),
            "http://host/api/sales/7/update_status/"
        );
        assert_eq!(join_url("http://host/api", "pipeline", false), "http://host/api/pipeline");
    }

    #[test]
    fn error_body_message_is_surfaced() {
        let err = status_error(400, r#"{"error": "Invalid status"}"#);
        assert_eq!(err.user_message(), "Invalid status");
        match status_error(404, r#"{"detail": "Not found."}"#) {
            ApiClientError::Status { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not found.");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_error_body_falls_back_to_status() {
        let err = status_error(502, "  ");
        assert_eq!(err.to_string(), "HTTP 502: request failed with status 502");
    }

    #[test]
    fn any_success_status_confirms_update() {
        let id = OpportunityId(7);
        assert!(check_status_update(id, 200, r#"{"id": 7, "status": "WON"}"#).is_ok());
        assert!(check_status_update(id, 200, r#"{"id": 8, "status": "WON"}"#).is_ok());
        assert!(check_status_update(id, 200, "<html>ok</html>").is_ok());
        assert!(check_status_update(id, 204, "").is_ok());
    }

    #[test]
    fn failed_update_status_carries_backend_message() {
        let err = check_status_update(OpportunityId(7), 400, r#"{"error": "Invalid status"}"#).unwrap_err();
        assert!(matches!(err, ApiClientError::Status { status: 400, .. }));
        assert_eq!(err.user_message(), "Invalid status");
    }

    #[test]
    fn auth_headers_include_both_credentials() {
        let headers = build_auth_headers(&AuthConfig {
            api_key: Some("key".into()),
            jwt: Some("token".into()),
        })
        .unwrap();
        assert_eq!(headers["x-api-key"], "key");
        assert_eq!(headers["authorization"], "Bearer token");
    }
}
