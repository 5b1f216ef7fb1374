//! Session startup and guaranteed teardown.

use std::path::Path;
use std::time::Duration;

use mcp::ServerConfig;
use tracing::{debug, info};

use crate::model::ToolSpec;
use crate::tools::{McpToolHost, ToolHost};
use crate::{Error, Result};

/// The kinds of tool host script the launcher knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Python,
    Node,
}

impl ScriptKind {
    /// Pick the interpreter from the script's extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("py") => Ok(Self::Python),
            Some("js") => Ok(Self::Node),
            _ => Err(Error::Config(format!(
                "tool host script must be a .py or .js file, got {}",
                path.display()
            ))),
        }
    }

    pub fn interpreter(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Node => "node",
        }
    }
}

/// Timeouts applied to the tool host channel.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub handshake_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            handshake_timeout: mcp::DEFAULT_HANDSHAKE_TIMEOUT,
            request_timeout: mcp::DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Owns a tool host from a validated start until teardown.
///
/// The host is closed exactly once: by [`SessionLifecycle::stop`], or on drop
/// if the owner exits early through an error.
pub struct SessionLifecycle<H: ToolHost> {
    host: H,
    tools: Vec<ToolSpec>,
    stopped: bool,
}

impl SessionLifecycle<McpToolHost> {
    /// Launch the script under its interpreter and validate the session.
    pub async fn start(script: impl AsRef<Path>, options: SessionOptions) -> Result<Self> {
        let script = script.as_ref();
        let kind = ScriptKind::from_path(script)?;

        let name = script
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| script.display().to_string());
        let config = ServerConfig::new(kind.interpreter(), [script.display().to_string()])
            .with_name(name)
            .with_handshake_timeout(options.handshake_timeout)
            .with_request_timeout(options.request_timeout);

        info!(script = %script.display(), interpreter = kind.interpreter(), "starting tool host");
        let host = McpToolHost::spawn(config)
            .await
            .map_err(Error::from_session)?;

        Self::attach(host).await
    }
}

impl<H: ToolHost> SessionLifecycle<H> {
    /// Take ownership of a connected host and check that it can list tools.
    ///
    /// If the check fails the host is closed before the error is returned.
    pub async fn attach(host: H) -> Result<Self> {
        let tools = match host.list_tools().await {
            Ok(tools) => tools,
            Err(err) => {
                host.close();
                return Err(Error::from_session(err));
            }
        };

        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        info!(tools = ?names, "connected to tool host");

        Ok(Self {
            host,
            tools,
            stopped: false,
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// The catalog fetched when the session was validated.
    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    /// Close the host.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.host.close();
        debug!("tool session stopped");
    }
}

impl<H: ToolHost> Drop for SessionLifecycle<H> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
