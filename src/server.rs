//! MCP server speaking line-delimited JSON-RPC 2.0 over stdio.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::tools::{definitions, Tools};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    jsonrpc: Option<String>,
    /// `null` is a valid id, only a missing key marks a notification.
    #[serde(default)]
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct Response {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

impl Response {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

pub struct Server {
    tools: Tools,
}

impl Server {
    pub fn new(tools: Tools) -> Self {
        Self { tools }
    }

    /// Answers requests one line at a time until `input` is exhausted.
    pub async fn serve<R, W>(&self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await.context("read from client failed")? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line).await {
                let mut out = serde_json::to_vec(&response)?;
                out.push(b'\n');
                output
                    .write_all(&out)
                    .await
                    .context("write to client failed")?;
                output.flush().await?;
            }
        }
        info!("client closed the connection");
        Ok(())
    }

    /// Returns `None` for notifications, which get no answer.
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        let request = match serde_json::from_str::<Value>(line) {
            Ok(value) => value,
            Err(e) => {
                warn!("unparseable message: {e}");
                return to_value(Response::err(Value::Null, PARSE_ERROR, e.to_string()));
            }
        };
        let is_notification = request.get("id").is_none();
        let request = match serde_json::from_value::<Request>(request) {
            Ok(request) => request,
            Err(e) => {
                return to_value(Response::err(Value::Null, INVALID_REQUEST, e.to_string()));
            }
        };
        if request.jsonrpc.as_deref().is_some_and(|v| v != "2.0") {
            return to_value(Response::err(
                request.id,
                INVALID_REQUEST,
                "jsonrpc must be \"2.0\"",
            ));
        }
        if is_notification {
            debug!("notification {}", request.method);
            return None;
        }
        let id = request.id;
        let response = match request.method.as_str() {
            "initialize" => Response::ok(id, self.initialize()),
            "ping" => Response::ok(id, json!({})),
            "tools/list" => Response::ok(id, json!({ "tools": definitions() })),
            "tools/call" => match serde_json::from_value::<CallToolParams>(request.params) {
                Ok(params) => Response::ok(id, self.call_tool(params).await),
                Err(e) => Response::err(id, INVALID_PARAMS, e.to_string()),
            },
            other => Response::err(id, METHOD_NOT_FOUND, format!("method not found: {other}")),
        };
        to_value(response)
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
        })
    }

    /// Tool failures are results with `isError` set, never protocol errors.
    async fn call_tool(&self, params: CallToolParams) -> Value {
        info!("tool call {}", params.name);
        match self.tools.call(&params.name, params.arguments).await {
            Ok(text) => json!({
                "content": [{ "type": "text", "text": text }],
                "isError": false,
            }),
            Err(e) => {
                error!("tool {} failed: {e}", params.name);
                json!({
                    "content": [{ "type": "text", "text": e.to_json().to_string() }],
                    "isError": true,
                })
            }
        }
    }
}

fn to_value(response: Response) -> Option<Value> {
    match serde_json::to_value(response) {
        Ok(value) => Some(value),
        Err(e) => {
            error!("cannot serialize response: {e}");
            None
        }
    }
}
