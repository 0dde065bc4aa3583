use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Function {path} failed: {message}")]
    Function { path: String, message: String },

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl BackendError {
    /// Whether the backend refused the caller's credentials
    pub fn is_unauthorized(&self) -> bool {
        match self {
            BackendError::Api { status, .. } => *status == 401 || *status == 403,
            BackendError::Function { message, .. } => message.contains("Unauthorized"),
            _ => false,
        }
    }
}

/// Envelope every function call is answered with
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum FunctionResponse {
    Success {
        value: Value,
    },
    Error {
        #[serde(rename = "errorMessage")]
        error_message: String,
    },
}

/// HTTP client for the catalog backend's function-call API
#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    admin_key: Option<String>,
    http: reqwest::Client,
}

impl BackendClient {
    pub fn new(
        base_url: &str,
        admin_key: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_key: admin_key.map(str::to_string),
            http: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run a read-only function and deserialize its value
    pub async fn query<T: DeserializeOwned>(&self, path: &str, args: Value) -> Result<T, BackendError> {
        self.call("query", path, args).await
    }

    /// Run a mutating function and deserialize its value
    pub async fn mutation<T: DeserializeOwned>(
        &self,
        path: &str,
        args: Value,
    ) -> Result<T, BackendError> {
        self.call("mutation", path, args).await
    }

    /// POST raw bytes to an absolute URL such as a one-shot upload URL
    pub async fn post_bytes<T: DeserializeOwned>(
        &self,
        url: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<T, BackendError> {
        let resp = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        handle_response(resp).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        kind: &str,
        path: &str,
        args: Value,
    ) -> Result<T, BackendError> {
        let url = format!("{}/api/{kind}", self.base_url);
        debug!(kind, path, "Calling backend function");

        let mut request = self.http.post(&url).json(&json!({
            "path": path,
            "args": args,
            "format": "json",
        }));
        if let Some(key) = &self.admin_key {
            request = request.bearer_auth(key);
        }

        let response: FunctionResponse = handle_response(request.send().await?).await?;
        match response {
            FunctionResponse::Success { value } => Ok(serde_json::from_value(value)?),
            FunctionResponse::Error { error_message } => Err(BackendError::Function {
                path: path.to_string(),
                message: error_message,
            }),
        }
    }
}

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, BackendError> {
    if resp.status().is_success() {
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    } else {
        let status = resp.status().as_u16();
        let message = resp.text().await.unwrap_or_default();
        Err(BackendError::Api { status, message })
    }
}

/// Function arguments with the admin token attached when one is present
pub(crate) fn with_token(mut args: Value, token: Option<&str>) -> Value {
    if let (Some(token), Value::Object(map)) = (token, &mut args) {
        map.insert("adminToken".to_string(), Value::String(token.to_string()));
    }
    args
}
