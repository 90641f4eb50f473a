use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

use super::{Tool, ToolType};
use crate::config::HttpToolConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRequest {
    pub url: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Per-attempt timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Total number of attempts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: BTreeMap::new(),
            params: BTreeMap::new(),
            body: None,
            timeout: None,
            retries: None,
        }
    }
}

/// Transport failures are reported in `error` with `status` 0, never as `Err`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub data: Value,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct HttpTool {
    client: reqwest::Client,
    default_headers: BTreeMap<String, String>,
    default_timeout: Duration,
    default_retries: u32,
}

impl HttpTool {
    pub fn new(config: &HttpToolConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("SevaSahayak/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            default_headers: config.default_headers.clone(),
            default_timeout: Duration::from_millis(config.timeout_ms),
            default_retries: config.retries,
        })
    }

    pub async fn request(&self, request: ApiRequest) -> ApiResponse {
        let timeout = request
            .timeout
            .map(Duration::from_millis)
            .unwrap_or(self.default_timeout);
        let attempts = request.retries.unwrap_or(self.default_retries).max(1);

        let mut headers = BTreeMap::from([(
            "Content-Type".to_string(),
            "application/json".to_string(),
        )]);
        headers.extend(self.default_headers.clone());
        headers.extend(request.headers.clone());

        let mut last_error = None;
        for attempt in 0..attempts {
            match self.attempt(&request, &headers, timeout).await {
                Ok(response) => return response,
                Err(e) => {
                    let retryable = e.is_timeout();
                    log::debug!(
                        "{:?} {} attempt {} failed: {}",
                        request.method,
                        request.url,
                        attempt + 1,
                        e
                    );
                    last_error = Some(e.to_string());

                    if !retryable || attempt + 1 == attempts {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(100 * 2u64.pow(attempt))).await;
                }
            }
        }

        ApiResponse {
            data: Value::Null,
            status: 0,
            headers: BTreeMap::new(),
            error: Some(last_error.unwrap_or_else(|| "Unknown error occurred".to_string())),
        }
    }

    async fn attempt(
        &self,
        request: &ApiRequest,
        headers: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> reqwest::Result<ApiResponse> {
        let mut builder = self
            .client
            .request(request.method.into(), &request.url)
            .timeout(timeout);

        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let response_headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let is_json = response_headers
            .get("content-type")
            .is_some_and(|ct| ct.contains("application/json"));

        let text = response.text().await?;
        let data = if is_json {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        } else {
            Value::String(text)
        };

        Ok(ApiResponse {
            data,
            status,
            headers: response_headers,
            error: None,
        })
    }

    pub async fn get(
        &self,
        url: &str,
        params: BTreeMap<String, String>,
        headers: BTreeMap<String, String>,
    ) -> ApiResponse {
        let mut request = ApiRequest::new(HttpMethod::Get, url);
        request.params = params;
        request.headers = headers;
        self.request(request).await
    }

    pub async fn post(&self, url: &str, body: Value, headers: BTreeMap<String, String>) -> ApiResponse {
        let mut request = ApiRequest::new(HttpMethod::Post, url);
        request.body = Some(body);
        request.headers = headers;
        self.request(request).await
    }

    pub async fn put(&self, url: &str, body: Value, headers: BTreeMap<String, String>) -> ApiResponse {
        let mut request = ApiRequest::new(HttpMethod::Put, url);
        request.body = Some(body);
        request.headers = headers;
        self.request(request).await
    }

    pub async fn delete(&self, url: &str, headers: BTreeMap<String, String>) -> ApiResponse {
        let mut request = ApiRequest::new(HttpMethod::Delete, url);
        request.headers = headers;
        self.request(request).await
    }
}

#[async_trait]
impl Tool for HttpTool {
    fn tool_type(&self) -> ToolType {
        ToolType::HttpRequest
    }

    fn name(&self) -> &str {
        "http_request"
    }

    fn description(&self) -> &str {
        "Call an external HTTP API. Timeouts are retried with exponential backoff."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "description": "Request URL" },
                "method": {
                    "type": "string",
                    "enum": ["GET", "POST", "PUT", "DELETE", "PATCH"]
                },
                "headers": { "type": "object" },
                "params": { "type": "object", "description": "Query parameters" },
                "body": { "description": "JSON request body" },
                "timeout": { "type": "integer", "description": "Per-attempt timeout in ms" },
                "retries": { "type": "integer", "description": "Maximum attempts" }
            },
            "required": ["url", "method"]
        })
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        let request: ApiRequest = serde_json::from_value(params)
            .map_err(|e| anyhow!("Invalid http_request parameters: {}", e))?;
        Ok(serde_json::to_value(self.request(request).await)?)
    }
}
