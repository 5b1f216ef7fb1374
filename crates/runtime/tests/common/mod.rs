//! Scripted gateway and host used by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use runtime::{
    Decision, DecisionRequest, Gateway, Message, ModelError, ToolArguments, ToolError, ToolHost,
    ToolSpec,
};
use serde_json::{Value, json};

/// One scripted gateway reply.
#[derive(Debug, Clone)]
pub enum Step {
    Decide(Decision),
    Malformed(String),
}

pub fn answer(content: &str) -> Step {
    Step::Decide(Decision::FinalAnswer {
        content: content.to_string(),
    })
}

pub fn invoke(tool: &str, arguments: &str) -> Step {
    Step::Decide(Decision::ToolInvocation {
        tool_name: tool.to_string(),
        arguments: arguments.to_string(),
    })
}

/// Replays steps in order, then repeats `fallback` (if any) forever.
/// Records every transcript it is shown.
#[derive(Default)]
pub struct StubGateway {
    script: Mutex<VecDeque<Step>>,
    fallback: Option<Step>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl StubGateway {
    pub fn scripted(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: Mutex::new(steps.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn always(step: Step) -> Self {
        Self {
            fallback: Some(step),
            ..Self::default()
        }
    }

    pub fn transcripts(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl Gateway for StubGateway {
    async fn decide(&self, request: DecisionRequest<'_>) -> Result<Decision, ModelError> {
        self.seen.lock().unwrap().push(request.transcript.to_vec());
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.fallback.clone());
        match next {
            Some(Step::Decide(decision)) => Ok(decision),
            Some(Step::Malformed(reason)) => Err(ModelError::InvalidResponse(reason)),
            None => Err(ModelError::InvalidResponse("script exhausted".into())),
        }
    }
}

/// What the stub host does when a tool is called.
#[derive(Debug, Clone)]
pub enum Outcome {
    Output(Value),
    Fail(String),
    Broken,
}

#[derive(Debug, Clone, Default)]
pub struct Counters {
    pub list: Arc<AtomicUsize>,
    pub call: Arc<AtomicUsize>,
    pub close: Arc<AtomicUsize>,
}

impl Counters {
    pub fn lists(&self) -> usize {
        self.list.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.call.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.close.load(Ordering::SeqCst)
    }
}

pub struct StubHost {
    catalog: Vec<ToolSpec>,
    outcome: Outcome,
    discovery_broken: bool,
    pub counters: Counters,
    pub last_call: Mutex<Option<(String, ToolArguments)>>,
}

impl StubHost {
    pub fn new(tools: &[&str], outcome: Outcome) -> Self {
        Self {
            catalog: tools.iter().map(|name| tool(name)).collect(),
            outcome,
            discovery_broken: false,
            counters: Counters::default(),
            last_call: Mutex::new(None),
        }
    }

    pub fn with_broken_discovery(mut self) -> Self {
        self.discovery_broken = true;
        self
    }
}

pub fn tool(name: &str) -> ToolSpec {
    ToolSpec {
        name: name.to_string(),
        description: format!("{name} tool"),
        schema: json!({"type": "object"}),
    }
}

impl ToolHost for StubHost {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolError> {
        self.counters.list.fetch_add(1, Ordering::SeqCst);
        if self.discovery_broken {
            return Err(ToolError::Transport("tool host exited unexpectedly".into()));
        }
        Ok(self.catalog.clone())
    }

    async fn call_tool(&self, name: &str, arguments: ToolArguments) -> Result<Value, ToolError> {
        self.counters.call.fetch_add(1, Ordering::SeqCst);
        *self.last_call.lock().unwrap() = Some((name.to_string(), arguments));
        match &self.outcome {
            Outcome::Output(value) => Ok(value.clone()),
            Outcome::Fail(detail) => Err(ToolError::Execution {
                name: name.to_string(),
                detail: detail.clone(),
            }),
            Outcome::Broken => Err(ToolError::Transport("broken pipe".into())),
        }
    }

    fn close(&self) {
        self.counters.close.fetch_add(1, Ordering::SeqCst);
    }
}
