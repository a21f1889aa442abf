//! MCP server wiring: tool registration and request dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult,
        PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
};
use serde_json::Value;

use crate::client::GraphClient;
use crate::dates::DailyNoteFormatter;
use crate::redact::sanitize_args;
use crate::tools::{ReflectTool, TOOL_SPECS, parse_schema};

#[derive(Clone)]
pub struct ReflectServer {
    tools: Arc<Vec<Tool>>,
    tool_handlers: Arc<HashMap<&'static str, ReflectTool>>,
}

impl ReflectServer {
    pub fn new(client: Arc<GraphClient>, dates: DailyNoteFormatter) -> Self {
        let mut tools = Vec::new();
        let mut handlers = HashMap::new();
        for spec in TOOL_SPECS {
            let handler = ReflectTool::new(client.clone(), dates.clone(), spec);
            let schema = parse_schema(spec.schema);
            let tool = Tool::new(spec.name, spec.description, Arc::new(schema));
            tools.push(tool);
            handlers.insert(spec.name, handler);
        }
        debug!("registered {} tools", tools.len());
        Self {
            tools: Arc::new(tools),
            tool_handlers: Arc::new(handlers),
        }
    }

    async fn handle_tool_call(&self, name: &str, args: Value) -> Result<CallToolResult, McpError> {
        let handler = self
            .tool_handlers
            .get(name)
            .ok_or_else(|| McpError::invalid_params(format!("unknown tool: {}", name), None))?;
        handler.handle(args).await
    }
}

impl ServerHandler for ReflectServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "reflect-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools = self.tools.clone();
        async move {
            Ok(ListToolsResult {
                tools: (*tools).clone(),
                next_cursor: None,
            })
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let server = self.clone();
        async move {
            let name = request.name.as_ref();
            let args = request.arguments.map(Value::Object).unwrap_or(Value::Null);
            info!("tool call: {}", name);
            debug!("arguments (sanitized): {}", sanitize_args(&args));
            server.handle_tool_call(name, args).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{DEFAULT_BASE_URL, ReflectClient};
    use crate::dates::{DEFAULT_LOCALE, DailyNoteFormatter};

    fn test_server() -> ReflectServer {
        let api =
            ReflectClient::new(DEFAULT_BASE_URL.to_string(), "token".to_string(), 1000).unwrap();
        let client = Arc::new(GraphClient::new(api, "graph".to_string()));
        let dates = DailyNoteFormatter::new(chrono_tz::UTC, DEFAULT_LOCALE);
        ReflectServer::new(client, dates)
    }

    #[test]
    fn every_spec_is_registered_with_a_handler() {
        let server = test_server();
        assert_eq!(server.tools.len(), TOOL_SPECS.len());
        for spec in TOOL_SPECS {
            assert!(server.tool_handlers.contains_key(spec.name));
        }
    }

    #[test]
    fn registered_tools_carry_non_empty_schemas() {
        let server = test_server();
        for tool in server.tools.iter() {
            assert!(!tool.input_schema.is_empty(), "{} has empty schema", tool.name);
        }
    }
}
