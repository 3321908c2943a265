//! Debug server, MCP bridge and instrumentation client working together

use std::sync::Arc;
use std::time::Duration;

use mcpdebugger::mcp::{DebugServerClient, McpServer};
use mcpdebugger::{BreakpointStore, DebugBreak, DebugBreakConfig, DebugServer, PauseOutcome, PauseRegistry};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct Harness {
    url: String,
    registry: Arc<BreakpointStore>,
    stop: oneshot::Sender<()>,
    task: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl Harness {
    async fn start() -> Self {
        let registry = Arc::new(BreakpointStore::new());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let (stop, stopped) = oneshot::channel::<()>();

        let task = tokio::spawn(DebugServer::new(registry.clone()).serve(listener, async move {
            let _ = stopped.await;
        }));

        Self { url, registry, stop, task }
    }

    async fn wait_for(&self, count: usize) {
        while self.registry.len() < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn stop(self) {
        let _ = self.stop.send(());
        self.task.await.unwrap().unwrap();
    }
}

async fn call(mcp: &McpServer<DebugServerClient>, id: u32, tool: &str, arguments: Value) -> String {
    let line = serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": tool, "arguments": arguments},
    })
    .to_string();

    let response = serde_json::to_value(mcp.handle_line(&line).await.unwrap()).unwrap();
    assert_eq!(response["id"], id);
    response["result"]["content"][0]["text"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_pause_inspect_resume() {
    let harness = Harness::start().await;
    let mcp = McpServer::new(DebugServerClient::new(&harness.url).unwrap());
    let debug = Arc::new(DebugBreak::new(DebugBreakConfig {
        server_url: harness.url.clone(),
        enabled: true,
    }));

    let paused = {
        let debug = Arc::clone(&debug);
        tokio::spawn(async move { debug.here_async().await })
    };
    harness.wait_for(1).await;

    let listing = call(&mcp, 1, "get_breakpoints", serde_json::json!({})).await;
    assert!(listing.starts_with("Active breakpoints: 1"));
    assert!(listing.contains("end_to_end.rs"));

    let id = harness.registry.get_all()[0].id.clone();
    let context = call(&mcp, 2, "get_context", serde_json::json!({ "id": id })).await;
    assert!(context.starts_with(&format!("=== Breakpoint {} ===", id)));
    assert!(context.contains(">>"));

    // Still paused after inspection
    assert!(!paused.is_finished());

    let resumed = call(&mcp, 3, "resume", serde_json::json!({ "id": id })).await;
    assert_eq!(resumed, format!("Breakpoint '{}' resumed. Execution continues.", id));
    assert_eq!(paused.await.unwrap(), PauseOutcome::Resumed);

    let empty = call(&mcp, 4, "get_breakpoints", serde_json::json!({})).await;
    assert_eq!(empty, "No active breakpoints. The application is either not running or hasn't hit any DebugBreak calls yet.");

    harness.stop().await;
}

#[tokio::test]
async fn test_resume_all_releases_every_caller() {
    let harness = Harness::start().await;
    let mcp = McpServer::new(DebugServerClient::new(&harness.url).unwrap());
    let debug = Arc::new(DebugBreak::new(DebugBreakConfig {
        server_url: harness.url.clone(),
        enabled: true,
    }));

    let mut paused = Vec::new();
    for _ in 0..3 {
        let debug = Arc::clone(&debug);
        paused.push(tokio::spawn(async move { debug.here_async().await }));
    }
    let blocking = {
        let debug = Arc::clone(&debug);
        std::thread::spawn(move || debug.here())
    };
    harness.wait_for(4).await;

    let text = call(&mcp, 1, "resume_all", serde_json::json!({})).await;
    assert_eq!(text, "Resumed 4 breakpoint(s). All paused execution continues.");

    for task in paused {
        assert_eq!(task.await.unwrap(), PauseOutcome::Resumed);
    }
    let outcome = tokio::task::spawn_blocking(move || blocking.join().unwrap())
        .await
        .unwrap();
    assert_eq!(outcome, PauseOutcome::Resumed);
    assert!(harness.registry.is_empty());

    harness.stop().await;
}

#[tokio::test]
async fn test_client_continues_without_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let debug = DebugBreak::new(DebugBreakConfig {
        server_url: url,
        enabled: true,
    });

    assert_eq!(debug.here_async().await, PauseOutcome::Failed);
}
