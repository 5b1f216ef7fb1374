//! Anthropic Messages API gateway.

use crate::model::{
    Decision, DecisionRequest, Gateway, Message, ModelError, Role, ToolSpec,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1024;

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ApiMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool<'a>>,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ApiTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        #[allow(dead_code)]
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Unknown,
}

// ─────────────────────────────────────────────────────────────────────────────
// Gateway Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for [`AnthropicGateway`].
#[derive(Debug, Clone)]
pub struct AnthropicGatewayBuilder {
    api_key: String,
    model: String,
    max_tokens: u32,
    system: Option<String>,
    base_url: String,
}

impl AnthropicGatewayBuilder {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system: None,
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Override the messages endpoint (proxies, gateways).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn build(self) -> AnthropicGateway {
        AnthropicGateway {
            client: reqwest::Client::new(),
            api_key: self.api_key,
            model: self.model,
            max_tokens: self.max_tokens,
            system: self.system,
            base_url: self.base_url,
        }
    }
}

/// Reasoning gateway backed by the Anthropic Messages API with tool use.
pub struct AnthropicGateway {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    system: Option<String>,
    base_url: String,
}

impl AnthropicGateway {
    pub fn builder(api_key: impl Into<String>, model: impl Into<String>) -> AnthropicGatewayBuilder {
        AnthropicGatewayBuilder::new(api_key, model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn role_to_api(role: Role) -> &'static str {
        match role {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    fn message_to_api(msg: &Message) -> ApiMessage<'_> {
        ApiMessage {
            role: Self::role_to_api(msg.role),
            content: &msg.content,
        }
    }

    /// The API rejects a final assistant turn that ends in whitespace.
    fn messages_to_api(transcript: &[Message]) -> Vec<ApiMessage<'_>> {
        let mut messages: Vec<_> = transcript.iter().map(Self::message_to_api).collect();
        if let Some(last) = messages.last_mut() {
            if last.role == "assistant" {
                last.content = last.content.trim_end();
            }
        }
        messages
    }

    fn tool_to_api(spec: &ToolSpec) -> ApiTool<'_> {
        ApiTool {
            name: &spec.name,
            description: &spec.description,
            input_schema: &spec.schema,
        }
    }
}

/// Fold response blocks into exactly one decision.
///
/// The first `tool_use` block wins; otherwise all text is the answer.
fn decision_from_blocks(blocks: Vec<ApiResponseBlock>) -> Result<Decision, ModelError> {
    let mut text = String::new();

    for block in blocks {
        match block {
            ApiResponseBlock::ToolUse { name, input, .. } => {
                return Ok(Decision::ToolInvocation {
                    tool_name: name,
                    arguments: input.to_string(),
                });
            }
            ApiResponseBlock::Text { text: part } => text.push_str(&part),
            ApiResponseBlock::Unknown => {}
        }
    }

    if text.trim().is_empty() {
        return Err(ModelError::InvalidResponse(
            "response carried neither text nor a tool call".into(),
        ));
    }

    Ok(Decision::FinalAnswer { content: text })
}

impl std::fmt::Display for AnthropicGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "anthropic({})", self.model)
    }
}

impl Gateway for AnthropicGateway {
    async fn decide(&self, request: DecisionRequest<'_>) -> Result<Decision, ModelError> {
        let api_request = ApiRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: Self::messages_to_api(request.transcript),
            system: self.system.as_deref(),
            tools: request.tools.iter().map(Self::tool_to_api).collect(),
        };

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        debug!(
            model = %self.model,
            stop_reason = api_response.stop_reason.as_deref().unwrap_or("none"),
            blocks = api_response.content.len(),
            "gateway responded"
        );

        decision_from_blocks(api_response.content)
    }
}
