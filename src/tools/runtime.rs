use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use std::collections::HashMap;

use super::http::HttpTool;
use super::scraper::ScraperTool;
use super::{Tool, ToolCall, ToolType};
use crate::config::Config;

/// Tool collaborators, built once from configuration and passed to whoever needs them.
pub struct ToolRuntime {
    tools: HashMap<ToolType, Box<dyn Tool>>,
}

impl ToolRuntime {
    pub fn new(config: &Config) -> Result<Self> {
        let mut tools: HashMap<ToolType, Box<dyn Tool>> = HashMap::new();

        tools.insert(ToolType::HttpRequest, Box::new(HttpTool::new(&config.http)?));
        tools.insert(ToolType::Scrape, Box::new(ScraperTool::new(&config.scraper)?));

        Ok(Self { tools })
    }

    pub fn get(&self, tool_type: ToolType) -> Option<&dyn Tool> {
        self.tools.get(&tool_type).map(|t| t.as_ref())
    }

    pub fn get_schemas(&self, allowed: &[ToolType]) -> Vec<Value> {
        allowed
            .iter()
            .filter_map(|t| self.tools.get(t))
            .map(|tool| {
                json!({
                    "name": tool.name(),
                    "description": tool.description(),
                    "parameters": tool.parameters_schema(),
                })
            })
            .collect()
    }

    pub async fn execute(&self, tool_call: &ToolCall) -> Result<Value> {
        let tool = self
            .tools
            .get(&tool_call.tool_type)
            .ok_or_else(|| anyhow!("Unknown tool: {:?}", tool_call.tool_type))?;

        tool.execute(tool_call.params.clone()).await
    }
}
