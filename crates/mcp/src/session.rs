//! Tool host session (spawn, handshake, request/response, teardown).

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, Implementation, Incoming, InitializeParams, InitializeResult,
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, ListToolsParams, ListToolsResult,
    RequestId, Tool,
};

/// Default bound on spawn-to-initialized.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(15);

/// Default bound on a single request/response pair.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum size of one line of host output (1MB).
pub const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Upper bound on `tools/list` pages followed in one discovery.
const MAX_TOOL_PAGES: usize = 64;

/// How to launch a tool host.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub handshake_timeout: Duration,
    pub request_timeout: Duration,
}

impl ServerConfig {
    /// Config for `command args...` with default timeouts, named after the command.
    pub fn new(
        command: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let command = command.into();
        Self {
            name: command.clone(),
            command,
            args: args.into_iter().map(Into::into).collect(),
            env: HashMap::new(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_handshake_timeout(mut self, limit: Duration) -> Self {
        self.handshake_timeout = limit;
        self
    }

    pub fn with_request_timeout(mut self, limit: Duration) -> Self {
        self.request_timeout = limit;
        self
    }
}

/// Both ends of the pipe pair. Held under one lock so a request and its
/// response are never interleaved with another request.
///
/// Partial lines stay buffered in the framed reader, so a `recv` cancelled
/// by a timeout resumes at the same byte on the next call.
struct Channel {
    stdin: Option<ChildStdin>,
    stdout: FramedRead<ChildStdout, LinesCodec>,
}

impl Channel {
    async fn send(&mut self, line: &str) -> Result<()> {
        let stdin = self.stdin.as_mut().ok_or(Error::Closed)?;
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    async fn recv(&mut self, id: &RequestId) -> Result<JsonRpcResponse> {
        loop {
            let line = match self.stdout.next().await {
                Some(Ok(line)) => line,
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    return Err(Error::OutputTooLarge {
                        max: MAX_OUTPUT_SIZE,
                    });
                }
                Some(Err(LinesCodecError::Io(e))) => return Err(e.into()),
                None => return Err(Error::ServerExited),
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let incoming = Incoming::parse(line)
                .map_err(|e| Error::InvalidResponse(format!("{e}: {}", preview(line))))?;

            match incoming {
                Incoming::Response(response) if &response.id == id => return Ok(response),
                Incoming::Response(response) => {
                    // Left over from a request that timed out.
                    warn!(expected = ?id, got = ?response.id, "discarding unmatched response");
                }
                Incoming::Other { method } => {
                    debug!(%method, "skipping host-initiated message");
                }
            }
        }
    }
}

/// A live session with one tool host process.
///
/// The process lives until [`ToolSession::close`] is called or the session is
/// dropped, whichever comes first.
pub struct ToolSession {
    config: ServerConfig,
    process: std::sync::Mutex<Child>,
    channel: Mutex<Channel>,
    next_id: AtomicI64,
    server_info: Option<Implementation>,
    closed: AtomicBool,
}

impl ToolSession {
    /// Spawn the tool host and complete the handshake.
    pub async fn open(config: ServerConfig) -> Result<Self> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut process = cmd.spawn().map_err(Error::Spawn)?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| Error::Spawn(std::io::Error::other("failed to capture stdin")))?;

        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| Error::Spawn(std::io::Error::other("failed to capture stdout")))?;

        debug!(server = %config.name, command = %config.command, args = ?config.args, "spawned tool host");

        let limit = config.handshake_timeout;
        let mut session = Self {
            config,
            process: std::sync::Mutex::new(process),
            channel: Mutex::new(Channel {
                stdin: Some(stdin),
                stdout: FramedRead::new(stdout, LinesCodec::new_with_max_length(MAX_OUTPUT_SIZE)),
            }),
            next_id: AtomicI64::new(1),
            server_info: None,
            closed: AtomicBool::new(false),
        };

        // Dropping `session` on failure kills the process.
        let result = timeout(limit, session.handshake())
            .await
            .map_err(|_| Error::HandshakeTimeout(limit))??;

        debug!(
            server = %session.config.name,
            host = %result.server_info.name,
            protocol = %result.protocol_version,
            "handshake complete"
        );
        session.server_info = Some(result.server_info);

        Ok(session)
    }

    /// The configured session name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Name and version the host reported during the handshake.
    pub fn server_info(&self) -> Option<&Implementation> {
        self.server_info.as_ref()
    }

    /// Fetch the host's current tool catalog, following pagination.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_TOOL_PAGES {
            let params = match cursor.take() {
                Some(cursor) => Some(serde_json::to_value(ListToolsParams {
                    cursor: Some(cursor),
                })?),
                None => None,
            };

            let page: ListToolsResult = self.request("tools/list", params).await?;
            tools.extend(page.tools);

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Ok(tools),
            }
        }

        Err(Error::InvalidResponse(format!(
            "tools/list still paginating after {MAX_TOOL_PAGES} pages"
        )))
    }

    /// Invoke one tool and wait for its result.
    ///
    /// Both an `isError` result and a JSON-RPC error answer are reported as
    /// [`Error::ToolCallFailed`]; everything else is a channel failure.
    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> Result<CallToolResult> {
        let params = serde_json::to_value(CallToolParams {
            name: name.to_string(),
            arguments,
        })?;

        let result: CallToolResult = match self.request("tools/call", Some(params)).await {
            Ok(result) => result,
            Err(Error::JsonRpc(e)) => {
                return Err(Error::ToolCallFailed {
                    name: name.to_string(),
                    detail: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        if result.is_error {
            return Err(Error::ToolCallFailed {
                name: name.to_string(),
                detail: result.text(),
            });
        }

        Ok(result)
    }

    /// Check if the host process is still running.
    pub fn is_running(&self) -> bool {
        match self.process.lock() {
            Ok(mut process) => matches!(process.try_wait(), Ok(None)),
            Err(_) => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Release the channel and terminate the host. Safe to call repeatedly.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        debug!(server = %self.config.name, "closing tool session");

        // EOF on stdin lets a well-behaved host exit on its own.
        if let Ok(mut channel) = self.channel.try_lock() {
            channel.stdin.take();
        }

        match self.process.lock() {
            Ok(mut process) => {
                if let Err(e) = process.start_kill() {
                    debug!(server = %self.config.name, error = %e, "tool host already gone");
                }
            }
            Err(_) => warn!(server = %self.config.name, "process handle poisoned"),
        }
    }

    // --- Internal methods ---

    async fn handshake(&self) -> Result<InitializeResult> {
        let params = serde_json::to_value(InitializeParams::default())?;
        let result: InitializeResult = self.request("initialize", Some(params)).await?;
        self.notify("notifications/initialized").await?;
        Ok(result)
    }

    fn next_request_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn request<R>(&self, method: &str, params: Option<Value>) -> Result<R>
    where
        R: DeserializeOwned,
    {
        if self.is_closed() {
            return Err(Error::Closed);
        }

        let id = self.next_request_id();
        let mut request = JsonRpcRequest::new(id.clone(), method);
        if let Some(params) = params {
            request = request.with_params(params);
        }
        let line = serde_json::to_string(&request)?;

        let mut channel = self.channel.lock().await;
        debug!(server = %self.config.name, %method, ?id, "sending request");
        channel.send(&line).await?;

        let response = timeout(self.config.request_timeout, channel.recv(&id))
            .await
            .map_err(|_| Error::Timeout)??;

        Ok(serde_json::from_value(response.into_result()?)?)
    }

    async fn notify(&self, method: &str) -> Result<()> {
        let line = serde_json::to_string(&JsonRpcNotification::new(method))?;
        let mut channel = self.channel.lock().await;
        channel.send(&line).await
    }
}

impl Drop for ToolSession {
    fn drop(&mut self) {
        self.close();
    }
}

fn preview(line: &str) -> &str {
    match line.char_indices().nth(120) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_defaults() {
        let config = ServerConfig::new("python", ["weather.py"]);
        assert_eq!(config.name, "python");
        assert_eq!(config.args, vec!["weather.py".to_string()]);
        assert_eq!(config.handshake_timeout, DEFAULT_HANDSHAKE_TIMEOUT);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn server_config_builders() {
        let config = ServerConfig::new("node", ["host.js"])
            .with_name("weather")
            .with_handshake_timeout(Duration::from_millis(250))
            .with_request_timeout(Duration::from_secs(5));
        assert_eq!(config.name, "weather");
        assert_eq!(config.handshake_timeout, Duration::from_millis(250));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "é".repeat(200);
        assert_eq!(preview(&long).chars().count(), 120);
        assert_eq!(preview("short"), "short");
    }
}
