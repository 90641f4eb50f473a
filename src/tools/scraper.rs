use anyhow::{anyhow, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::LazyLock;
use std::time::Duration;

use super::{Tool, ToolType};
use crate::config::ScraperConfig;

static SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script\s*>").expect("valid pattern"));
static STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style\s*>").expect("valid pattern"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid pattern"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid pattern"));
static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title\s*>").expect("valid pattern"));
static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a\s*>"#)
        .expect("valid pattern")
});
static TAG_SELECTOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9]*$").expect("valid pattern"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeOptions {
    pub url: String,
    /// Tag-name selector, e.g. `h1` or `p`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

impl ScrapeOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            selector: None,
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedElement {
    pub selector: String,
    pub text: String,
    pub html: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<ScrapedElement>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScrapeResult {
    fn failed(url: &str, error: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

pub struct ScraperTool {
    client: reqwest::Client,
}

impl ScraperTool {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }

    pub async fn scrape(&self, options: &ScrapeOptions) -> ScrapeResult {
        let url = options.url.as_str();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return ScrapeResult::failed(url, "URL must start with http:// or https://");
        }

        log::info!(
            "Scraping URL: {} (selector: {})",
            url,
            options.selector.as_deref().unwrap_or("none")
        );

        let html = match self.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                log::warn!("Error scraping {}: {}", url, e);
                return ScrapeResult::failed(url, format!("Failed to scrape content: {}", e));
            }
        };

        let elements = match options.selector.as_deref() {
            Some(selector) => match select_elements(&html, selector) {
                Ok(elements) => Some(elements),
                Err(e) => return ScrapeResult::failed(url, e.to_string()),
            },
            None => None,
        };

        ScrapeResult {
            url: url.to_string(),
            title: extract_title(&html),
            content: Some(extract_text_from_html(&html)),
            links: Some(extract_links_from_html(&html)),
            elements,
            error: None,
        }
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("HTTP {}", response.status());
        }
        Ok(response.text().await?)
    }

    /// Text of the first element matching `selector`, or empty.
    pub async fn extract(&self, url: &str, selector: &str) -> Result<String> {
        let result = self
            .scrape(&ScrapeOptions::new(url).with_selector(selector))
            .await;
        if let Some(error) = result.error {
            return Err(anyhow!(error));
        }

        Ok(result
            .elements
            .unwrap_or_default()
            .into_iter()
            .find(|el| el.selector == selector)
            .map(|el| el.text)
            .unwrap_or_default())
    }

    pub async fn extract_links(&self, url: &str) -> Result<Vec<Link>> {
        let result = self.scrape(&ScrapeOptions::new(url)).await;
        if let Some(error) = result.error {
            return Err(anyhow!(error));
        }
        Ok(result.links.unwrap_or_default())
    }

    pub async fn extract_main_content(&self, url: &str) -> Result<String> {
        let result = self.scrape(&ScrapeOptions::new(url)).await;
        if let Some(error) = result.error {
            return Err(anyhow!(error));
        }
        Ok(result.content.unwrap_or_default())
    }
}

#[async_trait]
impl Tool for ScraperTool {
    fn tool_type(&self) -> ToolType {
        ToolType::Scrape
    }

    fn name(&self) -> &str {
        "scrape"
    }

    fn description(&self) -> &str {
        "Fetch a web page and extract its title, text content, links and elements matching a tag selector."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The page to scrape"
                },
                "selector": {
                    "type": "string",
                    "description": "Optional tag name to collect, e.g. h1"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        let options: ScrapeOptions = serde_json::from_value(params)
            .map_err(|e| anyhow!("Invalid scrape parameters: {}", e))?;
        Ok(serde_json::to_value(self.scrape(&options).await)?)
    }
}

fn normalize_text(fragment: &str) -> String {
    let text = TAG.replace_all(fragment, " ");
    let text = html_escape::decode_html_entities(&text).to_string();
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

fn extract_text_from_html(html: &str) -> String {
    let text = SCRIPT.replace_all(html, "");
    let text = STYLE.replace_all(&text, "");
    let text = TITLE.replace_all(&text, "");
    normalize_text(&text)
}

fn extract_title(html: &str) -> Option<String> {
    TITLE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| normalize_text(m.as_str()))
        .filter(|t| !t.is_empty())
}

fn extract_links_from_html(html: &str) -> Vec<Link> {
    LINK.captures_iter(html)
        .map(|c| Link {
            href: html_escape::decode_html_entities(&c[1]).to_string(),
            text: normalize_text(&c[2]),
        })
        .collect()
}

fn select_elements(html: &str, selector: &str) -> Result<Vec<ScrapedElement>> {
    if !TAG_SELECTOR.is_match(selector) {
        return Err(anyhow!("Unsupported selector: {}", selector));
    }

    let pattern = Regex::new(&format!(
        r"(?is)<{tag}\b[^>]*>(.*?)</{tag}\s*>",
        tag = regex::escape(selector)
    ))?;

    Ok(pattern
        .captures_iter(html)
        .map(|c| ScrapedElement {
            selector: selector.to_string(),
            text: normalize_text(&c[1]),
            html: c[0].to_string(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
            <head><title>Health Information for Seniors</title></head>
            <body>
                <script>console.log('ignore');</script>
                <h1>Staying Active</h1>
                <p>Regular check-ups &amp; gentle exercise.</p>
                <a href="https://example.com/exercise">Exercise Tips</a>
                <a class="nav" href='/diet'>Healthy <b>Diet</b></a>
                <style>.hidden { display: none; }</style>
            </body>
        </html>
    "#;

    #[test]
    fn test_extract_text_from_html() {
        let text = extract_text_from_html(PAGE);
        assert!(text.contains("Staying Active"));
        assert!(text.contains("Regular check-ups & gentle exercise."));
        assert!(!text.contains("console.log"));
        assert!(!text.contains(".hidden"));
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(
            extract_title(PAGE).as_deref(),
            Some("Health Information for Seniors")
        );
        assert_eq!(extract_title("<p>no title</p>"), None);
    }

    #[test]
    fn test_extract_links() {
        let links = extract_links_from_html(PAGE);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].href, "https://example.com/exercise");
        assert_eq!(links[1].text, "Healthy Diet");
        assert_eq!(links[1].href, "/diet");
    }

    #[test]
    fn test_select_elements_by_tag() {
        let elements = select_elements(PAGE, "p").unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].selector, "p");
        assert!(elements[0].html.starts_with("<p>"));
    }

    #[test]
    fn test_unsupported_selector() {
        assert!(select_elements(PAGE, "div > .nav").is_err());
    }

    #[tokio::test]
    async fn test_scrape_requires_http_protocol() {
        let tool = ScraperTool::new(&ScraperConfig::default()).unwrap();
        let result = tool.scrape(&ScrapeOptions::new("file:///etc/passwd")).await;
        assert!(result.error.unwrap().contains("http"));
        assert!(result.content.is_none());
    }
}
