//! The think/act loop shared by every domain worker.
//!
//! `ToolCallAgent` plays the Base/ReAct/ToolCall roles in one struct: Base
//! supplies the state machine and step guard, ReAct alternates think/act,
//! and ToolCall specializes think into an LLM-with-tools call and act into
//! executing the calls it returns.

use std::sync::Arc;
use std::sync::Mutex;

use lawagent_core::{AgentState, CoreError, Message, Result};
use lawagent_llm::{LlmClient, ToolChoice};
use lawagent_tools::ToolRegistry;
use tracing::{debug, info, instrument, warn};

/// Messages longer than this are treated as a complete answer rather than
/// a stray thought, once no further tool calls are pending.
const FINAL_ANSWER_MIN_LEN: usize = 50;

/// How many of the most recent session messages are sent to the LLM per
/// think step (after orphan-tool pruning).
const THINK_WINDOW: usize = 10;

const STUCK_STRATEGY_PROMPT: &str =
    "你连续给出了相同的回复，请尝试不同的思路或调用其他工具来推进这个问题。";

const FORCED_FINAL_PROMPT: &str = "请现在直接给出最终答案，不要再调用任何工具。";

const STEP_LIMIT_FALLBACK: &str = "抱歉，这个问题比较复杂，已达到处理步骤上限。建议您咨询专业律师以获得准确的帮助。";

/// Configuration for one [`ToolCallAgent`] instance. The model itself is
/// fixed on the [`LlmClient`] this agent is built with.
#[derive(Debug, Clone)]
pub struct ToolCallAgentConfig {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub duplicate_threshold: usize,
}

/// Drives the Idle→Running→Finished/Error state machine for a single
/// `run` invocation against a growing message history.
pub struct ToolCallAgent {
    llm: Arc<LlmClient>,
    tools: Arc<ToolRegistry>,
    config: ToolCallAgentConfig,
    state: Mutex<AgentState>,
}

enum ThinkOutcome {
    Finished(String),
    ActNeeded(Vec<lawagent_core::ToolCall>),
    Continue,
}

impl ToolCallAgent {
    pub fn new(llm: Arc<LlmClient>, tools: Arc<ToolRegistry>, config: ToolCallAgentConfig) -> Self {
        Self {
            llm,
            tools,
            config,
            state: Mutex::new(AgentState::Idle),
        }
    }

    pub fn state(&self) -> AgentState {
        *self.state.lock().unwrap()
    }

    /// Invoke a single tool outside the think/act loop, e.g. for a
    /// critic-driven refined search. Errors are folded into the
    /// observation string rather than propagated, matching `act`.
    pub async fn call_tool_directly(&self, name: &str, arguments: &str) -> String {
        match self.tools.call(name, arguments).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = name, error = %e, "direct tool call failed");
                format!("Error: {e}")
            }
        }
    }

    /// Run the think/act loop against `messages` (the caller's growing
    /// history, mutated in place) for up to `max_steps` steps. Always
    /// restores `Idle` before returning, on every path.
    #[instrument(skip(self, messages))]
    pub async fn run(&self, messages: &mut Vec<Message>, max_steps: usize) -> Result<String> {
        {
            let mut state = self.state.lock().unwrap();
            if *state != AgentState::Idle {
                return Err(CoreError::state("agent entered run() while not Idle"));
            }
            *state = AgentState::Running;
        }

        let outcome = self.run_inner(messages, max_steps).await;

        let mut state = self.state.lock().unwrap();
        *state = match &outcome {
            Ok(_) => AgentState::Idle,
            Err(_) => {
                // Errors are terminal within this run, but the agent is
                // reusable: restore Idle per the state-machine contract.
                AgentState::Idle
            }
        };
        drop(state);

        outcome
    }

    async fn run_inner(&self, messages: &mut Vec<Message>, max_steps: usize) -> Result<String> {
        let mut next_step_prompt: Option<String> = None;
        let mut duplicate_run = 0usize;
        let mut strategy_injected = false;

        for step in 0..max_steps {
            debug!(step, "think/act step start");

            match self.think(messages, next_step_prompt.take()).await? {
                ThinkOutcome::Finished(text) => {
                    info!(step, "agent produced final answer");
                    return Ok(text);
                }
                ThinkOutcome::ActNeeded(calls) => {
                    self.act(&calls, messages).await;
                    duplicate_run = 0;
                    strategy_injected = false;
                }
                ThinkOutcome::Continue => {
                    let repeated = last_two_assistant_contents_match(messages);
                    if repeated {
                        duplicate_run += 1;
                    } else {
                        duplicate_run = 0;
                        strategy_injected = false;
                    }
                    if duplicate_run >= self.config.duplicate_threshold && !strategy_injected {
                        warn!(step, duplicate_run, "stuck detection triggered, injecting strategy change");
                        next_step_prompt = Some(STUCK_STRATEGY_PROMPT.to_string());
                        strategy_injected = true;
                    }
                }
            }
        }

        warn!(max_steps, "step limit reached, forcing final answer");
        self.forced_final_answer(messages).await
    }

    async fn think(&self, messages: &mut Vec<Message>, next_step_prompt: Option<String>) -> Result<ThinkOutcome> {
        let pruned = lawagent_core::prune_orphan_tool_messages(messages);
        let recent_len = pruned.len();
        let skip = recent_len.saturating_sub(THINK_WINDOW);
        let mut window: Vec<Message> = pruned[skip..].to_vec();

        if let Some(prompt) = next_step_prompt {
            window.push(Message::user(prompt));
        }

        let response = self
            .llm
            .chat_with_tools(&window, &self.tools.schemas(), ToolChoice::Auto, self.config.temperature, self.config.max_tokens)
            .await?;

        if response.has_tool_calls() {
            messages.push(Message::assistant_with_tool_calls(response.content.clone(), response.tool_calls.clone()));
            return Ok(ThinkOutcome::ActNeeded(response.tool_calls));
        }

        // A long enough reply with no pending tool calls is treated as
        // final, regardless of whether a tool ran earlier this turn.
        let is_final = response.content.chars().count() > FINAL_ANSWER_MIN_LEN;

        messages.push(Message::assistant(response.content.clone()));

        if is_final {
            Ok(ThinkOutcome::Finished(response.content))
        } else {
            Ok(ThinkOutcome::Continue)
        }
    }

    async fn act(&self, calls: &[lawagent_core::ToolCall], messages: &mut Vec<Message>) {
        for call in calls {
            let arguments = &call.function.arguments;
            debug!(tool = %call.function.name, id = %call.id, "executing tool call");

            let observation = match self.tools.call(&call.function.name, arguments).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(tool = %call.function.name, error = %e, "tool call failed");
                    format!("Error: {e}")
                }
            };

            messages.push(Message::tool(observation, call.id.clone(), call.function.name.clone()));
        }
    }

    async fn forced_final_answer(&self, messages: &mut Vec<Message>) -> Result<String> {
        messages.push(Message::system(FORCED_FINAL_PROMPT));
        let pruned = lawagent_core::prune_orphan_tool_messages(messages);

        match self.llm.chat(&pruned, None, self.config.temperature, self.config.max_tokens).await {
            Ok(text) => {
                messages.push(Message::assistant(text.clone()));
                Ok(text)
            }
            Err(e) => {
                warn!(error = %e, "forced final answer call failed, scanning history for a usable reply");
                if let Some(text) = last_long_assistant_content(messages) {
                    Ok(text)
                } else {
                    Ok(STEP_LIMIT_FALLBACK.to_string())
                }
            }
        }
    }
}

fn last_two_assistant_contents_match(messages: &[Message]) -> bool {
    let assistant_contents: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == lawagent_core::Role::Assistant && !m.has_tool_calls())
        .map(|m| m.content.as_str())
        .collect();

    assistant_contents.len() >= 2 && assistant_contents[assistant_contents.len() - 1] == assistant_contents[assistant_contents.len() - 2]
}

fn last_long_assistant_content(messages: &[Message]) -> Option<String> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == lawagent_core::Role::Assistant && m.content.chars().count() > FINAL_ANSWER_MIN_LEN)
        .map(|m| m.content.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_agent_state_is_idle() {
        let llm = Arc::new(LlmClient::new(lawagent_llm::LlmClientConfig::new("http://x", "key", "m")));
        let tools = Arc::new(ToolRegistry::new(2000));
        let agent = ToolCallAgent::new(
            llm,
            tools,
            ToolCallAgentConfig {
                temperature: Some(0.0),
                max_tokens: None,
                duplicate_threshold: 2,
            },
        );
        assert_eq!(agent.state(), AgentState::Idle);
    }

    #[test]
    fn last_two_assistant_contents_match_detects_repeats() {
        let messages = vec![
            Message::user("q"),
            Message::assistant("same"),
            Message::assistant("same"),
        ];
        assert!(last_two_assistant_contents_match(&messages));
    }

    #[test]
    fn last_two_assistant_contents_match_ignores_tool_call_messages() {
        let tool_call = lawagent_core::ToolCall {
            id: "1".into(),
            kind: "function".into(),
            function: lawagent_core::FunctionCall {
                name: "calculator".into(),
                arguments: "{}".into(),
            },
        };
        let messages = vec![
            Message::assistant_with_tool_calls("", vec![tool_call]),
            Message::tool("42", "1", "calculator"),
            Message::assistant("same"),
        ];
        assert!(!last_two_assistant_contents_match(&messages));
    }

    #[test]
    fn last_long_assistant_content_skips_short_messages() {
        let messages = vec![
            Message::assistant("short"),
            Message::assistant(&"长".repeat(60)),
        ];
        assert!(last_long_assistant_content(&messages).is_some());
    }

    #[test]
    fn last_long_assistant_content_returns_none_when_all_short() {
        let messages = vec![Message::assistant("short")];
        assert!(last_long_assistant_content(&messages).is_none());
    }
}
