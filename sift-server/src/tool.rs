//! Newline-delimited JSON-RPC tool server.
//!
//! Exposes one tool, `extract-url-content`, and one prompt, `summarize-url`.
//! Each input line is one request; each response is written as one line.
//! Notifications are consumed without a reply.
use crate::extractor::Extractor;
use crate::protocol::{Method, RequestId, RpcError, RpcRequest, RpcResponse};
use serde::Deserialize;
use serde_json::{Value, json};
use sift_common::ExtractionResult;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const EXTRACT_TOOL: &str = "extract-url-content";
pub const SUMMARIZE_PROMPT: &str = "summarize-url";

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct GetPromptParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Clone)]
pub struct ToolServer {
    extractor: Arc<dyn Extractor>,
}

impl ToolServer {
    pub fn new(extractor: Arc<dyn Extractor>) -> Self {
        Self { extractor }
    }

    /// Read requests from `reader` until EOF, writing one response line per request.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(target: "tool", "tool.serving");
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let Some(response) = self.handle_line(&line).await else {
                continue;
            };
            let encoded = serde_json::to_string(&response)?;
            writer.write_all(encoded.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        info!(target: "tool", "tool.input_closed");
        Ok(())
    }

    /// Decode and dispatch one raw line.
    pub async fn handle_line(&self, line: &str) -> Option<RpcResponse> {
        let raw: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!(target: "tool", error = %e, "tool.parse_error");
                return Some(RpcResponse::error(None, RpcError::parse_error()));
            }
        };
        match serde_json::from_value::<RpcRequest>(raw.clone()) {
            Ok(request) => self.handle(request).await,
            Err(_) => {
                let id = raw
                    .get("id")
                    .and_then(|v| serde_json::from_value::<RequestId>(v.clone()).ok());
                Some(RpcResponse::error(id, RpcError::invalid_request()))
            }
        }
    }

    pub async fn handle(&self, request: RpcRequest) -> Option<RpcResponse> {
        debug!(target: "tool", method = %request.method, "tool.request");
        if request.is_notification() {
            return None;
        }
        let id = request.id.clone();
        let params = request.params.unwrap_or(Value::Null);

        let outcome = match Method::parse(&request.method) {
            Some(Method::Initialize) => Ok(initialize_result()),
            Some(Method::Ping) => Ok(json!({})),
            Some(Method::ListTools) => Ok(json!({ "tools": [extract_tool_descriptor()] })),
            Some(Method::ListPrompts) => Ok(json!({ "prompts": [summarize_prompt_descriptor()] })),
            Some(Method::CallTool) => self.call_tool(params).await,
            Some(Method::GetPrompt) => get_prompt(params),
            None => Err(RpcError::method_not_found(&request.method)),
        };

        Some(match outcome {
            Ok(result) => RpcResponse::success(id, result),
            Err(error) => RpcResponse::error(id, error),
        })
    }

    async fn call_tool(&self, params: Value) -> Result<Value, RpcError> {
        let call: CallParams =
            serde_json::from_value(params).map_err(|e| RpcError::invalid_params(e.to_string()))?;
        if call.name != EXTRACT_TOOL {
            return Err(RpcError::invalid_params(format!("unknown tool: {}", call.name)));
        }
        let url = url_argument(&call.arguments)?;

        match self.extractor.extract(&url).await {
            Ok(result) => {
                info!(target: "tool", url = %url, readable = result.is_readable, "tool.extract.ok");
                Ok(json!({
                    "content": [{ "type": "text", "text": render_result(&result) }],
                    "metadata": {
                        "isReadable": result.is_readable,
                        "contentLength": result.length,
                        "excerpt": result.excerpt,
                        "url": url,
                    }
                }))
            }
            Err(err) => {
                warn!(target: "tool", url = %url, error = %err, "tool.extract.failed");
                Ok(json!({
                    "isError": true,
                    "content": [{ "type": "text", "text": format!("Failed to extract content: {err}") }],
                    "metadata": { "error": err.to_string(), "url": url }
                }))
            }
        }
    }
}

fn url_argument(arguments: &Value) -> Result<String, RpcError> {
    let raw = arguments
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::invalid_params("missing string argument `url`"))?;
    url::Url::parse(raw)
        .map_err(|e| RpcError::invalid_params(format!("`url` is not a valid URL: {e}")))?;
    Ok(raw.to_string())
}

/// Markdown-ish text rendering handed back to the calling model.
pub fn render_result(result: &ExtractionResult) -> String {
    let mut text = format!("# {}\n\n", result.title);
    let mut attribution = String::new();
    if let Some(site) = &result.site_name {
        attribution.push_str(&format!("[Source: {site}]\n"));
    }
    if let Some(byline) = &result.byline {
        attribution.push_str(&format!("[By: {byline}]\n"));
    }
    if !attribution.is_empty() {
        text.push_str(&attribution);
        text.push('\n');
    }
    text.push_str(&result.text_content);
    text
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {}, "prompts": {} },
        "serverInfo": {
            "name": "sift",
            "version": env!("CARGO_PKG_VERSION"),
        }
    })
}

fn extract_tool_descriptor() -> Value {
    json!({
        "name": EXTRACT_TOOL,
        "description": "Fetch a web page in a real browser and return its main article text.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "url": { "type": "string", "format": "uri", "description": "Page to extract" }
            },
            "required": ["url"]
        }
    })
}

fn summarize_prompt_descriptor() -> Value {
    json!({
        "name": SUMMARIZE_PROMPT,
        "description": "Summarize the content of a web page",
        "arguments": [
            { "name": "url", "description": "Page to summarize", "required": true }
        ]
    })
}

fn get_prompt(params: Value) -> Result<Value, RpcError> {
    let get: GetPromptParams =
        serde_json::from_value(params).map_err(|e| RpcError::invalid_params(e.to_string()))?;
    if get.name != SUMMARIZE_PROMPT {
        return Err(RpcError::invalid_params(format!("unknown prompt: {}", get.name)));
    }
    let url = url_argument(&get.arguments)?;
    Ok(json!({
        "description": "Summarize web page content",
        "messages": [{
            "role": "user",
            "content": {
                "type": "text",
                "text": format!("Please summarize the content from this URL: {url}")
            }
        }]
    }))
}
