use orator_dispatch::{DispatchError, Dispatcher};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt, tool, tool_handler, tool_router};
use tokio_util::sync::CancellationToken;

use crate::{SpeakParams, StopParams};

const INSTRUCTIONS: &str = "Reads text aloud on this machine. Use `speak` to start speech \
(asynchronous unless wait_for_completion is set) and `stop_speech` to silence it.";

/// MCP server exposing the `speak` and `stop_speech` tools
#[derive(Clone)]
pub struct OratorServer {
    dispatcher: Dispatcher,
    tool_router: ToolRouter<Self>,
}

impl OratorServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            tool_router: Self::tool_router(),
        }
    }

    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Serve MCP over stdin/stdout until the client disconnects or `shutdown` fires
    ///
    /// Active speech is stopped before returning.
    pub async fn serve(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let dispatcher = self.dispatcher.clone();

        let running = ServiceExt::serve(self, rmcp::transport::stdio())
            .await
            .map_err(|e| anyhow::anyhow!("failed to start MCP session: {e}"))?;
        tracing::info!("MCP session started on stdio");

        let session = running.cancellation_token();
        let stop_session = shutdown.clone();
        tokio::spawn(async move {
            stop_session.cancelled().await;
            session.cancel();
        });

        let reason = running.waiting().await?;
        tracing::info!(?reason, "MCP session ended");

        let stopped = dispatcher.shutdown().await;
        if stopped > 0 {
            tracing::info!(stopped, "stopped active speech");
        }

        Ok(())
    }
}

#[tool_router]
impl OratorServer {
    #[tool(
        description = "Read text aloud with a local speech engine (auto, say, swift or espeak). \
                       Returns immediately unless wait_for_completion is true."
    )]
    pub async fn speak(&self, Parameters(params): Parameters<SpeakParams>) -> Result<CallToolResult, McpError> {
        let request = params.into_request(self.dispatcher.config().default_timeout_seconds);

        match self.dispatcher.speak(request).await {
            Ok(outcome) => Ok(CallToolResult::success(vec![
                Content::text(outcome.summary()),
                Content::json(&outcome)?,
            ])),
            Err(e) => rejection(&e),
        }
    }

    #[tool(description = "Stop speech that is currently playing. Stops everything by default, \
                          or only the most recent request when all is false.")]
    pub async fn stop_speech(&self, Parameters(params): Parameters<StopParams>) -> Result<CallToolResult, McpError> {
        let outcome = self.dispatcher.stop_speech(params.all).await;

        Ok(CallToolResult::success(vec![
            Content::text(outcome.summary()),
            Content::json(&outcome)?,
        ]))
    }
}

#[tool_handler]
impl ServerHandler for OratorServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "orator".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }
}

/// Map a dispatch error to a tool result, or a protocol error for server faults
fn rejection(error: &DispatchError) -> Result<CallToolResult, McpError> {
    if error.is_rejection() {
        tracing::debug!(error = %error, "speech request rejected");
        Ok(CallToolResult::error(vec![Content::text(error.to_string())]))
    } else {
        tracing::error!(error = %error, "speech dispatch failed");
        Err(McpError::internal_error(error.to_string(), None))
    }
}

#[cfg(test)]
mod tests {
    use orator_config::DispatchConfig;
    use orator_engine::EngineSet;

    use super::*;

    fn server() -> OratorServer {
        OratorServer::new(Dispatcher::new(DispatchConfig::default(), EngineSet::default()))
    }

    fn text(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|content| content.as_text().map(|text| text.text.clone()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn advertises_tools() {
        let info = server().get_info();
        assert!(info.capabilities.tools.is_some());
        assert_eq!(info.server_info.name, "orator");

        let tools = server().tool_router.list_all();
        let names: Vec<_> = tools.iter().map(|tool| tool.name.to_string()).collect();
        assert!(names.contains(&"speak".to_string()));
        assert!(names.contains(&"stop_speech".to_string()));
    }

    #[tokio::test]
    async fn rejection_is_a_tool_error() {
        let params = SpeakParams {
            text: "**  **".to_string(),
            engine: orator_engine::EngineChoice::Auto,
            speed: 1.0,
            timeout_seconds: None,
            warmup: false,
            wait_for_completion: false,
            dedupe_seconds: None,
            hard_timeout_seconds: None,
        };

        let result = server().speak(Parameters(params)).await.unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(text(&result).contains("text is empty"));
    }

    #[tokio::test]
    async fn no_engine_is_a_tool_error() {
        let params: SpeakParams = serde_json::from_value(serde_json::json!({ "text": "hello" })).unwrap();

        let result = server().speak(Parameters(params)).await.unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(text(&result).contains("no available speech engine"));
    }

    #[tokio::test]
    async fn stop_without_speech() {
        let result = server().stop_speech(Parameters(StopParams { all: true })).await.unwrap();
        assert_ne!(result.is_error, Some(true));
        assert!(text(&result).contains("No active speech."));
    }
}
