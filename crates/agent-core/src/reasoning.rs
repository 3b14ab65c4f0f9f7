//! Agent Loop
//!
//! Drives streaming turns with the provider. Text is forwarded to the caller
//! as it arrives, tool calls are accumulated per turn and executed when the
//! model stops for tool use, and their results are fed back as the next turn's
//! context. Every request ends with exactly one `StreamEvent::Done`.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::error::{AgentError, Result};
use crate::history::{DEFAULT_MAX_TURNS, trim_history};
use crate::message::{ContentBlock, Message, Role};
use crate::provider::{ChatRequest, FinishReason, GenerationOptions, LlmProvider, StreamFragment};
use crate::retry::RetryPolicy;
use crate::stream_event::StreamEvent;
use crate::tool::{ToolCall, ToolRegistry, ToolResult};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System instructions sent with every turn
    pub system_prompt: String,

    /// Maximum model turns per request
    pub max_iterations: usize,

    /// Generation options; `model` is overridden per request when given
    pub generation: GenerationOptions,

    /// Conversation turns forwarded to the provider
    pub history_turns: usize,

    /// Retry policy for rate-limited turns
    pub retry: RetryPolicy,

    /// Tool output longer than this is truncated before it reaches the model
    pub max_tool_result_chars: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: 25,
            generation: GenerationOptions::default(),
            history_turns: DEFAULT_MAX_TURNS,
            retry: RetryPolicy::default(),
            max_tool_result_chars: 60_000,
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the available tools \
to look up facts instead of guessing, then answer concisely.";

/// Where a turn is in its lifecycle
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnState {
    /// Between blocks
    Idle,
    /// Inside a tool call block, collecting its JSON arguments
    AccumulatingToolCall { id: String, name: String, buffer: String },
    /// The provider reported a stop reason
    TurnComplete,
}

/// Per-turn state machine fed with provider fragments
#[derive(Debug)]
pub struct TurnAccumulator {
    state: TurnState,
    text: String,
    tool_calls: Vec<ToolCall>,
    stop_reason: Option<FinishReason>,
}

impl Default for TurnAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnAccumulator {
    pub const fn new() -> Self {
        Self {
            state: TurnState::Idle,
            text: String::new(),
            tool_calls: Vec::new(),
            stop_reason: None,
        }
    }

    /// Apply one fragment; returns the event to forward immediately, if any.
    pub fn apply(&mut self, fragment: StreamFragment) -> Option<StreamEvent> {
        match fragment {
            StreamFragment::TextDelta(text) => {
                if text.is_empty() {
                    return None;
                }
                self.text.push_str(&text);
                Some(StreamEvent::Text { content: text })
            }
            StreamFragment::ToolCallStart { id, name } => {
                self.file_open_call();
                let id = if id.is_empty() {
                    format!("call_{}", uuid::Uuid::new_v4().simple())
                } else {
                    id
                };
                self.state = TurnState::AccumulatingToolCall {
                    id,
                    name: name.clone(),
                    buffer: String::new(),
                };
                Some(StreamEvent::ToolCall { name })
            }
            StreamFragment::ToolCallDelta(partial) => {
                if let TurnState::AccumulatingToolCall { buffer, .. } = &mut self.state {
                    buffer.push_str(&partial);
                }
                None
            }
            StreamFragment::ToolCallEnd => {
                self.file_open_call();
                None
            }
            StreamFragment::TurnEnd { stop_reason } => {
                self.file_open_call();
                self.stop_reason = Some(stop_reason);
                self.state = TurnState::TurnComplete;
                None
            }
        }
    }

    fn file_open_call(&mut self) {
        if matches!(self.state, TurnState::AccumulatingToolCall { .. }) {
            if let TurnState::AccumulatingToolCall { id, name, buffer } =
                std::mem::replace(&mut self.state, TurnState::Idle)
            {
                self.tool_calls.push(ToolCall::new(id, name, parse_arguments(&buffer)));
            }
        }
    }

    pub const fn state(&self) -> &TurnState {
        &self.state
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.tool_calls
    }

    pub const fn stop_reason(&self) -> Option<FinishReason> {
        self.stop_reason
    }

    /// The model stopped to use tools and at least one call was collected.
    pub fn wants_tools(&self) -> bool {
        self.stop_reason == Some(FinishReason::ToolUse) && !self.tool_calls.is_empty()
    }

    /// Assistant message recording this turn's text and tool calls
    fn into_message(self) -> (Message, Vec<ToolCall>) {
        let mut blocks = Vec::with_capacity(self.tool_calls.len() + 1);
        if !self.text.is_empty() {
            blocks.push(ContentBlock::Text { text: self.text });
        }
        blocks.extend(self.tool_calls.iter().map(|call| ContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.name.clone(),
            input: Value::Object(call.arguments.clone()),
        }));
        (Message::blocks(Role::Assistant, blocks), self.tool_calls)
    }
}

/// Parse accumulated tool arguments; anything but a JSON object becomes `{}`.
pub fn parse_arguments(buffer: &str) -> Map<String, Value> {
    if buffer.trim().is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(buffer) {
        Ok(Value::Object(arguments)) => arguments,
        Ok(_) | Err(_) => {
            tracing::warn!(raw = %buffer, "Malformed tool arguments, using empty object");
            Map::new()
        }
    }
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self::new(provider, tools, AgentConfig::default())
    }

    /// Answer the last user message of `history`, streaming events to `events`.
    ///
    /// Always finishes with `StreamEvent::Done`, preceded by
    /// `StreamEvent::Error` when the request failed.
    pub async fn run_stream(
        &self,
        history: &[Message],
        model: Option<&str>,
        events: &mpsc::Sender<StreamEvent>,
    ) {
        match self.drive(history, model, events).await {
            Ok(()) => {}
            Err(AgentError::Cancelled) => {
                tracing::info!("Caller went away, stopping agent loop");
            }
            Err(e) => {
                tracing::error!(error = %e, "Agent loop failed");
                let _ = events
                    .send(StreamEvent::Error {
                        message: e.user_message(),
                    })
                    .await;
            }
        }
        let _ = events.send(StreamEvent::Done).await;
    }

    /// Run the loop on a background task and hand back the event receiver.
    pub fn spawn_stream(
        self: Arc<Self>,
        history: Vec<Message>,
        model: Option<String>,
    ) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            self.run_stream(&history, model.as_deref(), &tx).await;
        });
        rx
    }

    async fn drive(
        &self,
        history: &[Message],
        model: Option<&str>,
        events: &mpsc::Sender<StreamEvent>,
    ) -> Result<()> {
        let mut options = self.config.generation.clone();
        if let Some(model) = model {
            options.model = model.to_string();
        }

        let mut messages = trim_history(history, self.config.history_turns);
        let tools = self.tools.schemas();

        for iteration in 1..=self.config.max_iterations {
            tracing::debug!(iteration, model = %options.model, messages = messages.len(), "Starting turn");

            let request = ChatRequest {
                system: &self.config.system_prompt,
                messages: &messages,
                tools: &tools,
                options: &options,
            };
            let request = &request;

            let turn = self
                .config
                .retry
                .execute(
                    move || self.consume_turn(request, events),
                    move |wait| async move {
                        let _ = events
                            .send(StreamEvent::Retrying {
                                wait_seconds: wait.as_secs(),
                            })
                            .await;
                    },
                )
                .await?;

            if !turn.wants_tools() {
                tracing::debug!(iteration, stop_reason = ?turn.stop_reason(), "Turn finished without tool use");
                return Ok(());
            }

            let (assistant, calls) = turn.into_message();
            messages.push(assistant);

            let results = self.execute_tools(&calls, events).await?;
            messages.push(Message::blocks(Role::User, results));
        }

        Err(AgentError::MaxIterations(self.config.max_iterations))
    }

    /// Consume one streaming turn from the provider.
    async fn consume_turn(
        &self,
        request: &ChatRequest<'_>,
        events: &mpsc::Sender<StreamEvent>,
    ) -> Result<TurnAccumulator> {
        let mut stream = self.provider.stream(request).await?;
        let mut turn = TurnAccumulator::new();

        while let Some(fragment) = stream.next().await {
            if let Some(event) = turn.apply(fragment?) {
                emit(events, event).await?;
            }
        }

        Ok(turn)
    }

    /// Execute every call of a turn concurrently; results are keyed by call id.
    async fn execute_tools(
        &self,
        calls: &[ToolCall],
        events: &mpsc::Sender<StreamEvent>,
    ) -> Result<Vec<ContentBlock>> {
        let mut pending: FuturesUnordered<_> = calls
            .iter()
            .map(|call| async move { (call.id.clone(), self.execute_tool(call).await) })
            .collect();

        let mut finished: HashMap<String, ToolResult> = HashMap::with_capacity(calls.len());
        while let Some((id, result)) = pending.next().await {
            emit(
                events,
                StreamEvent::ToolResult {
                    name: result.name.clone(),
                    success: result.success,
                    error: (!result.success).then(|| result.output.clone()),
                },
            )
            .await?;
            finished.insert(id, result);
        }

        Ok(calls
            .iter()
            .filter_map(|call| {
                finished.remove(&call.id).map(|result| ContentBlock::ToolResult {
                    tool_use_id: call.id.clone(),
                    content: self.format_tool_result(&result),
                    is_error: !result.success,
                })
            })
            .collect())
    }

    /// Execute a tool call; failures become failed results, never errors.
    async fn execute_tool(&self, call: &ToolCall) -> ToolResult {
        match self.tools.execute(call).await {
            Ok(result) => result.with_id(&call.id),
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool call failed");
                ToolResult::failure(&call.name, e.to_string()).with_id(&call.id)
            }
        }
    }

    /// Format tool result for the conversation, capped in size
    fn format_tool_result(&self, result: &ToolResult) -> String {
        let content = if result.success {
            result.content()
        } else {
            format!("Error: {}", result.output)
        };
        truncate_chars(content, self.config.max_tool_result_chars)
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

async fn emit(events: &mpsc::Sender<StreamEvent>, event: StreamEvent) -> Result<()> {
    events.send(event).await.map_err(|_| AgentError::Cancelled)
}

fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((cut, _)) = text.char_indices().nth(max_chars) {
        text.truncate(cut);
        text.push_str("… [truncated]");
    }
    text
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            config: AgentConfig::default(),
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn tool<T: crate::tool::Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    #[must_use]
    pub const fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        Ok(Agent::new(provider, Arc::new(self.tools), self.config))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::message::MessageContent;
    use crate::provider::CompletionStream;
    use crate::tool::{ParameterSchema, Tool, ToolSchema};

    type Turn = Result<Vec<Result<StreamFragment>>>;

    /// Replays scripted turns and records the messages of every request.
    struct ScriptedProvider {
        turns: Mutex<VecDeque<Turn>>,
        requests: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedProvider {
        fn new(turns: Vec<Turn>) -> Self {
            Self {
                turns: Mutex::new(turns.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<Vec<Message>> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn stream(&self, request: &ChatRequest<'_>) -> Result<CompletionStream> {
            self.requests.lock().unwrap().push(request.messages.to_vec());
            let turn = self
                .turns
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(vec![Ok(StreamFragment::TurnEnd { stop_reason: FinishReason::Stop })]))?;
            Ok(Box::pin(futures::stream::iter(turn)))
        }
    }

    struct HandleTool;

    #[derive(Deserialize)]
    struct HandleArgs {
        handle: String,
    }

    #[async_trait]
    impl Tool for HandleTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "lookup".into(),
                description: "Look up a handle".into(),
                parameters: vec![ParameterSchema::required("handle", "string", "Handle")],
                category: None,
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
            let args: HandleArgs = call.parse_args()?;
            Ok(ToolResult::json("lookup", json!({ "handle": args.handle, "rating": 3000 })))
        }
    }

    /// Answers after a fixed delay.
    struct SleepTool {
        name: &'static str,
        delay: Duration,
    }

    #[async_trait]
    impl Tool for SleepTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: self.name.into(),
                description: "Sleeps, then answers".into(),
                parameters: vec![],
                category: None,
            }
        }

        async fn execute(&self, _call: &ToolCall) -> Result<ToolResult> {
            tokio::time::sleep(self.delay).await;
            Ok(ToolResult::success(self.name, format!("{} finished", self.name)))
        }
    }

    fn text(s: &str) -> Result<StreamFragment> {
        Ok(StreamFragment::TextDelta(s.into()))
    }

    fn tool_call(id: &str, name: &str, chunks: &[&str]) -> Vec<Result<StreamFragment>> {
        let mut fragments = vec![Ok(StreamFragment::ToolCallStart {
            id: id.into(),
            name: name.into(),
        })];
        fragments.extend(chunks.iter().map(|c| Ok(StreamFragment::ToolCallDelta((*c).into()))));
        fragments.push(Ok(StreamFragment::ToolCallEnd));
        fragments
    }

    fn end(reason: FinishReason) -> Result<StreamFragment> {
        Ok(StreamFragment::TurnEnd { stop_reason: reason })
    }

    fn agent(provider: Arc<ScriptedProvider>) -> Agent {
        AgentBuilder::new()
            .provider(provider)
            .tool(HandleTool)
            .build()
            .unwrap()
    }

    async fn run(agent: &Agent, history: &[Message]) -> Vec<StreamEvent> {
        let (tx, mut rx) = mpsc::channel(64);
        agent.run_stream(history, None, &tx).await;
        drop(tx);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_accumulator_collects_tool_call_across_deltas() {
        let mut turn = TurnAccumulator::new();
        assert_eq!(turn.apply(StreamFragment::TextDelta("Let me check…".into())), Some(StreamEvent::text("Let me check…")));
        assert_eq!(
            turn.apply(StreamFragment::ToolCallStart { id: "t1".into(), name: "lookup".into() }),
            Some(StreamEvent::ToolCall { name: "lookup".into() })
        );
        assert!(matches!(turn.state(), TurnState::AccumulatingToolCall { .. }));
        assert_eq!(turn.apply(StreamFragment::ToolCallDelta(r#"{"hand"#.into())), None);
        assert_eq!(turn.apply(StreamFragment::ToolCallDelta(r#"le":"tourist"}"#.into())), None);
        turn.apply(StreamFragment::ToolCallEnd);
        turn.apply(StreamFragment::TurnEnd { stop_reason: FinishReason::ToolUse });

        assert_eq!(turn.state(), &TurnState::TurnComplete);
        assert!(turn.wants_tools());
        assert_eq!(turn.tool_calls()[0].arguments["handle"], "tourist");
        assert_eq!(turn.text(), "Let me check…");
    }

    #[test]
    fn test_malformed_arguments_become_empty_object() {
        assert!(parse_arguments(r#"{"handle": "tour"#).is_empty());
        assert!(parse_arguments("[1,2]").is_empty());
        assert!(parse_arguments("").is_empty());
        assert_eq!(parse_arguments(r#"{"limit": 3}"#)["limit"], 3);
    }

    #[test]
    fn test_tool_use_without_calls_does_not_loop() {
        let mut turn = TurnAccumulator::new();
        turn.apply(StreamFragment::TurnEnd { stop_reason: FinishReason::ToolUse });
        assert!(!turn.wants_tools());
    }

    #[tokio::test]
    async fn test_text_only_turn_streams_then_done() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(vec![
            text("Hel"),
            text("lo"),
            end(FinishReason::Stop),
        ])]));
        let events = run(&agent(provider), &[Message::user("hi")]).await;

        assert_eq!(
            events,
            vec![StreamEvent::text("Hel"), StreamEvent::text("lo"), StreamEvent::Done]
        );
    }

    #[tokio::test]
    async fn test_tool_round_trip_feeds_results_back_by_id() {
        let mut first = vec![text("Checking. ")];
        first.extend(tool_call("toolu_1", "lookup", &[r#"{"handle":"#, r#""tourist"}"#]));
        first.push(end(FinishReason::ToolUse));
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(first),
            Ok(vec![text("tourist is rated 3000."), end(FinishReason::Stop)]),
        ]));

        let events = run(&agent(provider.clone()), &[Message::user("rating of tourist?")]).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::text("Checking. "),
                StreamEvent::ToolCall { name: "lookup".into() },
                StreamEvent::ToolResult { name: "lookup".into(), success: true, error: None },
                StreamEvent::text("tourist is rated 3000."),
                StreamEvent::Done,
            ]
        );

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        let second = &requests[1];
        assert_eq!(second.len(), 3);
        assert_eq!(second[1].role, Role::Assistant);
        let MessageContent::Blocks(results) = &second[2].content else {
            panic!("expected tool result blocks");
        };
        assert!(matches!(
            &results[0],
            ContentBlock::ToolResult { tool_use_id, is_error: false, content }
                if tool_use_id == "toolu_1" && content.contains("3000")
        ));
    }

    #[tokio::test]
    async fn test_tool_failures_are_reported_and_loop_continues() {
        let mut first = tool_call("t1", "nope", &["{}"]);
        first.extend(tool_call("t2", "lookup", &["{not json"]));
        first.push(end(FinishReason::ToolUse));
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(first),
            Ok(vec![text("Sorry."), end(FinishReason::Stop)]),
        ]));

        let events = run(&agent(provider.clone()), &[Message::user("?")]).await;
        let failures: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, StreamEvent::ToolResult { success: false, .. }))
            .collect();
        assert_eq!(failures.len(), 2);
        assert_eq!(events.last(), Some(&StreamEvent::Done));
        assert!(!events.iter().any(|e| matches!(e, StreamEvent::Error { .. })));

        let requests = provider.requests();
        let MessageContent::Blocks(results) = &requests[1][2].content else {
            panic!("expected tool result blocks");
        };
        assert_eq!(results.len(), 2);
        assert!(matches!(&results[0], ContentBlock::ToolResult { tool_use_id, is_error: true, .. } if tool_use_id == "t1"));
        assert!(matches!(&results[1], ContentBlock::ToolResult { tool_use_id, is_error: true, .. } if tool_use_id == "t2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_follow_call_order_not_completion_order() {
        let mut first = tool_call("call_slow", "slow", &["{}"]);
        first.extend(tool_call("call_fast", "fast", &["{}"]));
        first.push(end(FinishReason::ToolUse));
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(first),
            Ok(vec![text("Both done."), end(FinishReason::Stop)]),
        ]));
        let agent = AgentBuilder::new()
            .provider(provider.clone())
            .tool(SleepTool { name: "slow", delay: Duration::from_millis(500) })
            .tool(SleepTool { name: "fast", delay: Duration::from_millis(10) })
            .build()
            .unwrap();

        let events = run(&agent, &[Message::user("go")]).await;
        let finished: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::ToolResult { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(finished, vec!["fast", "slow"]);

        let requests = provider.requests();
        let MessageContent::Blocks(results) = &requests[1][2].content else {
            panic!("expected tool result blocks");
        };
        assert_eq!(results.len(), 2);
        assert!(matches!(
            &results[0],
            ContentBlock::ToolResult { tool_use_id, content, is_error: false }
                if tool_use_id == "call_slow" && content == "slow finished"
        ));
        assert!(matches!(
            &results[1],
            ContentBlock::ToolResult { tool_use_id, content, is_error: false }
                if tool_use_id == "call_fast" && content == "fast finished"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_turn_is_retried() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(AgentError::RateLimited("429".into())),
            Ok(vec![text("ok"), end(FinishReason::Stop)]),
        ]));

        let events = run(&agent(provider), &[Message::user("hi")]).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Retrying { wait_seconds: 5 },
                StreamEvent::text("ok"),
                StreamEvent::Done,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_mid_stream_keeps_streamed_text() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(vec![text("Let me "), Err(AgentError::RateLimited("overloaded".into()))]),
            Ok(vec![text("answer."), end(FinishReason::Stop)]),
        ]));

        let events = run(&agent(provider), &[Message::user("hi")]).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::text("Let me "),
                StreamEvent::Retrying { wait_seconds: 5 },
                StreamEvent::text("answer."),
                StreamEvent::Done,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_end_with_error_then_done() {
        let provider = Arc::new(ScriptedProvider::new(
            (0..4).map(|_| Err(AgentError::RateLimited("429".into()))).collect(),
        ));

        let events = run(&agent(provider.clone()), &[Message::user("hi")]).await;
        let retries = events
            .iter()
            .filter(|e| matches!(e, StreamEvent::Retrying { .. }))
            .count();
        assert_eq!(retries, 3);
        assert_eq!(provider.requests().len(), 4);
        assert!(matches!(events[events.len() - 2], StreamEvent::Error { .. }));
        assert_eq!(events.last(), Some(&StreamEvent::Done));
    }

    #[tokio::test]
    async fn test_provider_error_is_not_retried() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(AgentError::Provider("500".into()))]));

        let events = run(&agent(provider.clone()), &[Message::user("hi")]).await;
        assert_eq!(provider.requests().len(), 1);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], StreamEvent::Error { .. }));
        assert_eq!(events[1], StreamEvent::Done);
    }

    #[tokio::test]
    async fn test_history_is_trimmed_before_first_turn() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let mut history = Vec::new();
        for i in 0..6 {
            history.push(Message::user(format!("q{i}")));
            history.push(Message::assistant(format!("a{i}")));
        }
        history.push(Message::user("latest"));

        run(&agent(provider.clone()), &history).await;
        let sent = &provider.requests()[0];
        assert_eq!(sent.len(), 9);
        assert_eq!(sent[0].text(), "q2");
        assert_eq!(sent[8].text(), "latest");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abc".into(), 5), "abc");
        assert_eq!(truncate_chars("★★★★★".into(), 2), "★★… [truncated]");
    }
}
