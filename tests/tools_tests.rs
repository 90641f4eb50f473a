use axum::{
    extract::Query,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

use sevasahayak::config::{HttpToolConfig, ScraperConfig};
use sevasahayak::tools::{
    ApiRequest, HttpMethod, HttpTool, ScrapeOptions, ScraperTool, ToolCall, ToolRuntime, ToolType,
};
use sevasahayak::Config;

const CARE_PAGE: &str = r#"<html>
<head><title>Community Care Centre</title></head>
<body>
  <h1>Weekly Programme</h1>
  <p>Yoga on Monday &amp; Thursday.</p>
  <p>Music circle on Saturday.</p>
  <a href="/schedule">Full schedule</a>
  <a href="https://example.org/volunteer">Volunteer</a>
</body>
</html>"#;

async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn test_server() -> String {
    let app = Router::new()
        .route(
            "/vitals",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                Json(json!({ "patient": params.get("patient"), "heartRate": 72 }))
            }),
        )
        .route("/echo", post(|Json(body): Json<Value>| async move { Json(body) }))
        .route("/care", get(|| async { Html(CARE_PAGE) }));
    spawn_server(app).await
}

#[tokio::test]
async fn test_http_get_with_query_params() {
    let base = test_server().await;
    let tool = HttpTool::new(&HttpToolConfig::default()).unwrap();

    let params = BTreeMap::from([("patient".to_string(), "p-17".to_string())]);
    let response = tool
        .get(&format!("{}/vitals", base), params, BTreeMap::new())
        .await;

    assert_eq!(response.status, 200);
    assert!(response.error.is_none());
    assert_eq!(response.data["patient"], "p-17");
    assert_eq!(response.data["heartRate"], 72);
}

#[tokio::test]
async fn test_http_post_sends_json_body() {
    let base = test_server().await;
    let tool = HttpTool::new(&HttpToolConfig::default()).unwrap();

    let response = tool
        .post(
            &format!("{}/echo", base),
            json!({ "reminder": "Metformin", "time": "08:00" }),
            BTreeMap::new(),
        )
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.data["reminder"], "Metformin");
}

#[tokio::test]
async fn test_http_timeouts_are_retried() {
    // Accepts connections but never answers
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = connections.clone();
    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            open.push(socket);
        }
    });

    let tool = HttpTool::new(&HttpToolConfig::default()).unwrap();
    let mut request = ApiRequest::new(HttpMethod::Get, format!("http://{}/slow", addr));
    request.timeout = Some(100);
    request.retries = Some(3);

    let response = tool.request(request).await;
    assert_eq!(response.status, 0);
    assert!(response.error.is_some());
    assert_eq!(connections.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_http_connection_refused_is_not_retried() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let tool = HttpTool::new(&HttpToolConfig::default()).unwrap();
    let started = std::time::Instant::now();
    let response = tool
        .get(&format!("http://{}/", addr), BTreeMap::new(), BTreeMap::new())
        .await;

    assert_eq!(response.status, 0);
    assert!(response.error.is_some());
    // No backoff sleeps happened
    assert!(started.elapsed() < std::time::Duration::from_millis(100));
}

#[tokio::test]
async fn test_scrape_page() {
    let base = test_server().await;
    let tool = ScraperTool::new(&ScraperConfig::default()).unwrap();

    let result = tool
        .scrape(&ScrapeOptions::new(format!("{}/care", base)).with_selector("p"))
        .await;

    assert!(result.error.is_none());
    assert_eq!(result.title.as_deref(), Some("Community Care Centre"));
    assert!(result
        .content
        .as_deref()
        .unwrap()
        .contains("Yoga on Monday & Thursday."));

    let links = result.links.unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].href, "/schedule");

    let elements = result.elements.unwrap();
    assert_eq!(elements.len(), 2);
    assert_eq!(elements[1].text, "Music circle on Saturday.");
}

#[tokio::test]
async fn test_scrape_helpers() {
    let base = test_server().await;
    let tool = ScraperTool::new(&ScraperConfig::default()).unwrap();
    let url = format!("{}/care", base);

    assert_eq!(tool.extract(&url, "h1").await.unwrap(), "Weekly Programme");
    assert_eq!(tool.extract_links(&url).await.unwrap().len(), 2);
    assert!(tool
        .extract_main_content(&url)
        .await
        .unwrap()
        .contains("Music circle"));

    let missing = tool.extract_main_content(&format!("{}/nothing", base)).await;
    assert!(missing.is_err());
}

#[tokio::test]
async fn test_runtime_executes_tool_calls() {
    let base = test_server().await;
    let runtime = ToolRuntime::new(&Config::default()).unwrap();

    let schemas = runtime.get_schemas(&[ToolType::HttpRequest, ToolType::Scrape]);
    assert_eq!(schemas.len(), 2);

    let result = runtime
        .execute(&ToolCall {
            tool_type: ToolType::HttpRequest,
            params: json!({
                "url": format!("{}/vitals", base),
                "method": "GET",
                "params": { "patient": "p-3" }
            }),
        })
        .await
        .unwrap();
    assert_eq!(result["status"], 200);
    assert_eq!(result["data"]["patient"], "p-3");

    let result = runtime
        .execute(&ToolCall {
            tool_type: ToolType::Scrape,
            params: json!({ "url": format!("{}/care", base) }),
        })
        .await
        .unwrap();
    assert_eq!(result["title"], "Community Care Centre");
}
