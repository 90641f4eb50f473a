pub mod http;
pub mod runtime;
pub mod scraper;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use http::{ApiRequest, ApiResponse, HttpMethod, HttpTool};
pub use runtime::ToolRuntime;
pub use scraper::{Link, ScrapeOptions, ScrapeResult, ScrapedElement, ScraperTool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    HttpRequest,
    Scrape,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::HttpRequest => "http_request",
            ToolType::Scrape => "scrape",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "http_request" => Some(ToolType::HttpRequest),
            "scrape" => Some(ToolType::Scrape),
            _ => None,
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn tool_type(&self) -> ToolType;
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, params: Value) -> Result<Value>;
}

pub struct ToolCall {
    pub tool_type: ToolType,
    pub params: Value,
}
