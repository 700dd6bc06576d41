//! Signed HTTP client for the Bitvavo REST API.
//!
//! Every request is sent exactly once. Failures are classified by whether
//! the request could have reached the exchange, and retry decisions are
//! left to the caller.

use std::sync::Arc;
use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::Sha256;

use super::api_types::ErrorResponse;
use super::config::BitvavoConfig;
use super::error::BitvavoError;
use crate::application::ports::CredentialSet;

type HmacSha256 = Hmac<Sha256>;

/// HTTP client for the Bitvavo API.
#[derive(Debug, Clone)]
pub struct BitvavoHttpClient {
    client: Client,
    credentials: Arc<CredentialSet>,
    base_url: String,
    signing_prefix: String,
    access_window_ms: u64,
}

impl BitvavoHttpClient {
    /// Create a client bound to one credential set.
    pub fn new(config: &BitvavoConfig, credentials: Arc<CredentialSet>) -> Result<Self, BitvavoError> {
        if !credentials.is_complete() {
            return Err(BitvavoError::Authentication(
                "API credentials not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BitvavoError::Request(e.to_string()))?;

        Ok(Self {
            client,
            credentials,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            signing_prefix: config.signing_prefix().to_string(),
            access_window_ms: config.access_window_ms,
        })
    }

    /// Signed GET. `path` may carry a query string.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BitvavoError> {
        self.request(Method::GET, path, None::<&()>).await
    }

    /// Signed POST with a JSON body.
    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, BitvavoError> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Signed DELETE.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, BitvavoError> {
        self.request(Method::DELETE, path, None::<&()>).await
    }

    async fn request<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, BitvavoError> {
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| BitvavoError::Request(e.to_string()))?
            .unwrap_or_default();
        let timestamp = chrono::Utc::now().timestamp_millis().to_string();
        let signature = sign(
            self.credentials.api_secret(),
            &timestamp,
            method.as_str(),
            &format!("{}{path}", self.signing_prefix),
            &body,
        )?;

        let mut request = self
            .client
            .request(method.clone(), format!("{}{path}", self.base_url))
            .header("bitvavo-access-key", self.credentials.api_key())
            .header("bitvavo-access-signature", signature)
            .header("bitvavo-access-timestamp", timestamp)
            .header("bitvavo-access-window", self.access_window_ms.to_string());
        if !body.is_empty() {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        tracing::debug!(%method, path, "Bitvavo request");
        let response = request.send().await.map_err(classify_send_error)?;
        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);
        let text = response.text().await.map_err(classify_send_error)?;

        if status.is_success() {
            return serde_json::from_str(&text).map_err(|e| BitvavoError::Decode(e.to_string()));
        }

        tracing::debug!(%method, path, status = status.as_u16(), body = %text, "Bitvavo error response");
        Err(classify_status(status, &text, retry_after, method != Method::GET))
    }
}

/// Hex HMAC-SHA256 of `timestamp + METHOD + path + body`.
pub fn sign(
    secret: &str,
    timestamp: &str,
    method: &str,
    path: &str,
    body: &str,
) -> Result<String, BitvavoError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| BitvavoError::Request(e.to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(method.as_bytes());
    mac.update(path.as_bytes());
    mac.update(body.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn classify_send_error(err: reqwest::Error) -> BitvavoError {
    if err.is_connect() || err.is_builder() {
        BitvavoError::Connect(err.to_string())
    } else {
        // Sent, or possibly sent; the outcome is unknown.
        BitvavoError::Timeout(err.to_string())
    }
}

/// `state_changing` requests that got a 5xx answer were delivered, so the
/// exchange may have acted on them.
fn classify_status(
    status: StatusCode,
    body: &str,
    retry_after: Option<Duration>,
    state_changing: bool,
) -> BitvavoError {
    let parsed = serde_json::from_str::<ErrorResponse>(body).ok();
    let message = parsed
        .as_ref()
        .map_or_else(|| body.to_string(), |e| e.error.clone());

    match status.as_u16() {
        429 => BitvavoError::RateLimited { retry_after },
        401 | 403 => BitvavoError::Authentication(message),
        404 => BitvavoError::NotFound(message),
        408 => BitvavoError::Timeout(message),
        500..=599 if state_changing => BitvavoError::Unconfirmed {
            status: status.as_u16(),
            message,
        },
        500..=599 => BitvavoError::Server {
            status: status.as_u16(),
            message,
        },
        _ => match parsed {
            Some(ErrorResponse { error_code, .. })
                if error_code == super::api_types::ORDER_NOT_FOUND_CODE =>
            {
                BitvavoError::NotFound(message)
            }
            Some(ErrorResponse { error_code, error }) => BitvavoError::Api {
                code: error_code,
                message: error,
            },
            None => BitvavoError::Api {
                code: i64::from(status.as_u16()),
                message,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn signature_covers_every_component() {
        let base = sign("secret", "1700000000000", "GET", "/v2/time", "").unwrap();
        assert_eq!(base.len(), 64);
        assert!(base.chars().all(|c| c.is_ascii_hexdigit()));

        assert_ne!(base, sign("other", "1700000000000", "GET", "/v2/time", "").unwrap());
        assert_ne!(base, sign("secret", "1700000000001", "GET", "/v2/time", "").unwrap());
        assert_ne!(base, sign("secret", "1700000000000", "POST", "/v2/time", "").unwrap());
        assert_ne!(base, sign("secret", "1700000000000", "GET", "/v2/time", "{}").unwrap());
        assert_eq!(base, sign("secret", "1700000000000", "GET", "/v2/time", "").unwrap());
    }

    #[test_case(429, "", false => matches BitvavoError::RateLimited { .. } ; "rate limited")]
    #[test_case(403, r#"{"errorCode":105,"error":"Access denied"}"#, false => matches BitvavoError::Authentication(_) ; "forbidden")]
    #[test_case(503, "maintenance", false => matches BitvavoError::Server { status: 503, .. } ; "unavailable read")]
    #[test_case(503, "maintenance", true => matches BitvavoError::Unconfirmed { status: 503, .. } ; "unavailable order post")]
    #[test_case(500, "", true => matches BitvavoError::Unconfirmed { status: 500, .. } ; "server error order post")]
    #[test_case(400, r#"{"errorCode":216,"error":"Insufficient balance"}"#, true => matches BitvavoError::Api { code: 216, .. } ; "rejected")]
    #[test_case(400, r#"{"errorCode":240,"error":"No order found"}"#, false => matches BitvavoError::NotFound(_) ; "order lookup miss")]
    #[test_case(418, "teapot", false => matches BitvavoError::Api { code: 418, .. } ; "unstructured")]
    fn classifies_error_status(status: u16, body: &str, state_changing: bool) -> BitvavoError {
        classify_status(StatusCode::from_u16(status).unwrap(), body, None, state_changing)
    }

    #[test]
    fn incomplete_credentials_are_refused_locally() {
        let result = BitvavoHttpClient::new(
            &BitvavoConfig::default(),
            Arc::new(CredentialSet::new("", "")),
        );
        assert!(matches!(result, Err(BitvavoError::Authentication(_))));
    }
}
