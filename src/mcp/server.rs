//! MCP server implementation using pmcp (Pragmatic AI's rust-mcp-sdk).
//!
//! The server shares one immutable [`QueryCoordinator`] between all tool
//! calls; every call evaluates against its own fresh session.

use crate::mcp::tools::ToolRegistry;
use crate::search::QueryCoordinator;
use async_trait::async_trait;
use pmcp::{
    server::streamable_http_server::StreamableHttpServer, Error, RequestHandlerExtra, Server,
    ServerCapabilities, ToolHandler, ToolInfo,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// The MCP server exposing catalog search and record details
#[derive(Debug, Clone)]
pub struct McpServer {
    server: Arc<Mutex<Server>>,
    tool_names: Vec<String>,
}

impl McpServer {
    /// Create a new MCP server over the given coordinator
    pub fn new(coordinator: Arc<QueryCoordinator>) -> Result<Self, pmcp::Error> {
        let tools = ToolRegistry::from_coordinator(coordinator);
        let mut tool_names: Vec<String> = tools.all().iter().map(|t| t.name.clone()).collect();
        tool_names.sort();

        let server = Self::build_server_impl(tools)?;
        Ok(Self {
            server: Arc::new(Mutex::new(server)),
            tool_names,
        })
    }

    /// Names of the registered tools
    pub fn tool_names(&self) -> &[String] {
        &self.tool_names
    }

    fn build_server_impl(tools: ToolRegistry) -> Result<Server, pmcp::Error> {
        let mut builder = Server::builder()
            .name("vipdb-search")
            .version(env!("CARGO_PKG_VERSION"))
            .capabilities(ServerCapabilities::default());

        for tool in tools.all() {
            let tool_handler = ToolWrapper {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                input_schema: tool.input_schema.clone(),
                handler: tool.handler.clone(),
            };
            builder = builder.tool(tool_handler.name.clone(), tool_handler);
        }

        builder.build()
    }

    /// Run the server in stdio mode
    pub async fn run(self) -> Result<(), pmcp::Error> {
        tracing::info!("Starting MCP server in stdio mode");
        self.into_server()?.run_stdio().await
    }

    /// Take sole ownership of the pmcp server; fails while a clone of this
    /// `McpServer` (e.g. a running HTTP transport) still shares it
    fn into_server(self) -> Result<Server, pmcp::Error> {
        Arc::try_unwrap(self.server)
            .map(Mutex::into_inner)
            .map_err(|_| Error::internal("MCP server is still shared by another transport"))
    }

    /// Run the server in HTTP/SSE mode
    pub async fn run_http(&self, addr: &str) -> Result<(SocketAddr, JoinHandle<()>), pmcp::Error> {
        tracing::info!("Starting MCP server in HTTP/SSE mode on {}", addr);

        let socket_addr: SocketAddr = addr
            .parse()
            .map_err(|e| Error::invalid_params(format!("Invalid address: {}", e)))?;

        let http_server = StreamableHttpServer::new(socket_addr, self.server.clone());
        http_server.start().await
    }
}

/// Wrapper for adapting our Tool to pmcp's ToolHandler
#[derive(Clone)]
struct ToolWrapper {
    name: String,
    description: Option<String>,
    input_schema: Value,
    handler: Arc<dyn crate::mcp::tools::ToolHandler>,
}

#[async_trait]
impl ToolHandler for ToolWrapper {
    async fn handle(&self, args: Value, _extra: RequestHandlerExtra) -> Result<Value, Error> {
        self.handler
            .execute(args)
            .await
            .map_err(|e| Error::internal(&e))
    }

    fn metadata(&self) -> Option<ToolInfo> {
        Some(ToolInfo::new(
            self.name.clone(),
            self.description.clone(),
            self.input_schema.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RecordStore;
    use crate::search::SearchOptions;

    fn server() -> McpServer {
        let store = RecordStore::from_json_str(r#"[{"PubMed_ID": "100", "Title": "SIFT"}]"#).unwrap();
        let coordinator = QueryCoordinator::new(Arc::new(store), SearchOptions::default());
        McpServer::new(Arc::new(coordinator)).unwrap()
    }

    #[test]
    fn test_tool_names() {
        assert_eq!(server().tool_names(), &["get_details", "run_query"]);
    }

    #[test]
    fn test_stdio_takes_sole_ownership() {
        let server = server();
        assert_eq!(Arc::strong_count(&server.server), 1);
        assert!(server.into_server().is_ok());
    }

    #[test]
    fn test_shared_server_cannot_be_taken() {
        let server = server();
        let shared = server.clone();
        let err = server.into_server().unwrap_err();
        assert!(err.to_string().contains("still shared"));
        assert!(shared.into_server().is_ok());
    }
}
