//! Bridges the internal `Tool` registry to the Model Context Protocol.
//!
//! `McpBridge` implements `rmcp::ServerHandler`: it lists tools, converts
//! calls into `ToolContext::execute` invocations, and wraps results back
//! into `CallToolResult`. No tool's own logic needs to know rmcp exists.

use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool as McpTool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};
use serde_json::Value;

use crate::traits::{Tool, ToolContext, ToolRegistry};

pub struct McpBridge {
    tools: Arc<ToolRegistry>,
    ctx: Arc<ToolContext>,
}

impl McpBridge {
    pub fn new(tools: Arc<ToolRegistry>, ctx: Arc<ToolContext>) -> Self {
        Self { tools, ctx }
    }

    fn find_tool(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.find(name)
    }
}

fn to_mcp_tool(tool: &dyn Tool) -> McpTool {
    McpTool {
        name: tool.name().to_string().into(),
        description: Some(tool.description().to_string().into()),
        input_schema: Arc::new(
            tool.parameters_schema()
                .as_object()
                .cloned()
                .unwrap_or_default(),
        ),
        annotations: None,
    }
}

#[async_trait::async_trait]
impl ServerHandler for McpBridge {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "nimgenie".to_string(),
                title: Some("NimGenie".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Tools for indexing, searching, and type-checking a Nim workspace.".to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _params: Option<PaginatedRequestParam>,
        _ctx: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tools.tools().iter().map(|t| to_mcp_tool(t.as_ref())).collect(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        params: CallToolRequestParam,
        _ctx: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool = self
            .find_tool(&params.name)
            .ok_or_else(|| McpError::invalid_params(format!("unknown tool: {}", params.name), None))?;

        let args: Value = params
            .arguments
            .map(Value::Object)
            .unwrap_or_else(|| Value::Object(Default::default()));

        match tool.execute(args, &self.ctx).await {
            Ok(result) => {
                let text = serde_json::to_string(&result).unwrap_or_else(|_| result.to_string());
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(err) => Ok(CallToolResult::error(vec![Content::text(err.to_string())])),
        }
    }
}
