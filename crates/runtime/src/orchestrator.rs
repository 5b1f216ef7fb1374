//! The per-query negotiation loop.
//!
//! One query runs `decide → (optionally) call one tool → decide again` and
//! produces one [`Answer`]. The loop never issues a second tool call: if the
//! model asks for another tool after seeing the first result, the answer is
//! returned without it and the request is recorded in
//! [`Answer::declined_tool`].

use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::model::{Decision, DecisionRequest, Gateway, Message, ToolSpec};
use crate::tools::{ToolArguments, ToolError, ToolHost, render_output};
use crate::{Error, Result};

/// A unique identifier for one query, carried on its tracing span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryId(pub Uuid);

impl QueryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QueryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for QueryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a query is in the negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Started,
    AwaitingDecision,
    AwaitingToolResult,
    AwaitingFinalDecision,
    Answered,
}

/// The outcome of one query.
#[derive(Debug, Clone)]
pub struct Answer {
    pub id: QueryId,
    /// Output lines in order: the tool trace line (if a tool ran), then the
    /// model's final text (if it gave one).
    pub lines: Vec<String>,
    /// The transcript as last sent to the gateway.
    pub transcript: Vec<Message>,
    /// A tool the model asked for after the first round-trip, not executed.
    pub declined_tool: Option<String>,
}

impl Answer {
    /// The consolidated answer text.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text())
    }
}

/// Runs queries against a gateway, using whichever tool host the caller passes in.
pub struct Orchestrator<G> {
    gateway: G,
}

impl<G: Gateway> Orchestrator<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Turn one user query into an answer.
    ///
    /// Every error is scoped to this query except [`Error::Transport`], after
    /// which the host should not be used again (see [`Error::ends_session`]).
    pub async fn process_query<H: ToolHost>(&self, host: &H, query: &str) -> Result<Answer> {
        let id = QueryId::new();
        self.negotiate(host, query, id)
            .instrument(info_span!("query", %id))
            .await
    }

    async fn negotiate<H: ToolHost>(&self, host: &H, query: &str, id: QueryId) -> Result<Answer> {
        let mut phase = Phase::Started;
        let mut transcript = vec![Message::user(query)];
        let mut lines = Vec::new();

        advance(&mut phase, Phase::AwaitingDecision);
        let catalog = host.list_tools().await.map_err(Error::from_session)?;

        let (tool_name, raw_arguments) = match self.decide(&transcript, &catalog).await? {
            Decision::FinalAnswer { content } => {
                lines.push(content);
                advance(&mut phase, Phase::Answered);
                return Ok(Answer {
                    id,
                    lines,
                    transcript,
                    declined_tool: None,
                });
            }
            Decision::ToolInvocation {
                tool_name,
                arguments,
            } => (tool_name, arguments),
        };

        if !catalog.iter().any(|tool| tool.name == tool_name) {
            return Err(Error::UnknownTool { name: tool_name });
        }

        let arguments = ToolArguments::parse(&raw_arguments).map_err(|err| {
            let detail = match err {
                ToolError::InvalidInput(detail) => detail,
                other => other.to_string(),
            };
            Error::MalformedArguments {
                name: tool_name.clone(),
                detail,
            }
        })?;

        info!(tool = %tool_name, args = %arguments, "invoking tool");
        lines.push(format!("[Calling tool {tool_name} with args {arguments}]"));

        advance(&mut phase, Phase::AwaitingToolResult);
        let output = host
            .call_tool(&tool_name, arguments)
            .await
            .map_err(|err| Error::from_tool_call(&tool_name, err))?;

        transcript.push(Message::assistant(format!(
            "tool {tool_name} returned: {}",
            render_output(&output)
        )));

        advance(&mut phase, Phase::AwaitingFinalDecision);
        let declined_tool = match self.decide(&transcript, &catalog).await? {
            Decision::FinalAnswer { content } => {
                lines.push(content);
                None
            }
            Decision::ToolInvocation { tool_name: next, .. } => {
                warn!(tool = %next, "model asked for a second tool call; answering without it");
                Some(next)
            }
        };

        advance(&mut phase, Phase::Answered);
        Ok(Answer {
            id,
            lines,
            transcript,
            declined_tool,
        })
    }

    async fn decide(&self, transcript: &[Message], tools: &[ToolSpec]) -> Result<Decision> {
        let decision = self
            .gateway
            .decide(DecisionRequest { transcript, tools })
            .await?;
        Ok(decision)
    }
}

fn advance(phase: &mut Phase, next: Phase) {
    debug!(from = ?*phase, to = ?next, "phase");
    *phase = next;
}
