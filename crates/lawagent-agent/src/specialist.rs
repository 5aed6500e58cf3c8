//! Domain-scoped specialist: runs the ToolCall loop, then has a critic
//! pass judgment on the result before it goes back to the caller.

use std::sync::Arc;
use std::sync::LazyLock;

use lawagent_core::{LegalDomain, LegalIntent, Message, Result, StatusCallback, notify};
use lawagent_llm::LlmClient;
use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::runtime::{ToolCallAgent, ToolCallAgentConfig};

const CRITIC_SYSTEM_PROMPT: &str = "你是一名资深法律顾问，负责审核另一位助理给出的回答是否合格。\
只输出一个 JSON 对象 {\"is_acceptable\": bool, \"feedback\": \"...\"}。\
如果回答空洞、没有引用具体法条、或明显答非所问，则 is_acceptable 为 false，并在 feedback 中说明需要补充什么信息。";

static STATUTE_CITATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"《[^》]{2,30}》第[一二三四五六七八九十百千〇0-9]+条").unwrap());

static ENUMERATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*([一二三四五六七八九十]+、|[0-9]+[.、])").unwrap());

fn plan_prompt(domain: LegalDomain, intent: LegalIntent) -> String {
    format!(
        "你是{domain}领域的专业法律助理，当前任务类型是{intent}。\
请结合可用工具（法条检索、网络搜索、计算器、文书生成等）逐步解决用户的问题，\
回答时尽量引用具体法律条文，给出清晰、可执行的建议。",
    )
}

#[derive(Debug, Clone, serde::Deserialize)]
struct CriticVerdict {
    is_acceptable: bool,
    #[serde(default)]
    feedback: String,
}

/// Configuration shared by every [`SpecialistAgent`] in the domain pool.
#[derive(Debug, Clone)]
pub struct SpecialistConfig {
    pub max_critic_rounds: usize,
}

pub struct SpecialistAgent {
    domain: LegalDomain,
    llm: Arc<LlmClient>,
    agent: ToolCallAgent,
    config: SpecialistConfig,
}

impl SpecialistAgent {
    pub fn new(domain: LegalDomain, llm: Arc<LlmClient>, tools: Arc<lawagent_tools::ToolRegistry>, agent_config: ToolCallAgentConfig, config: SpecialistConfig) -> Self {
        let agent = ToolCallAgent::new(llm.clone(), tools, agent_config);
        Self { domain, llm, agent, config }
    }

    pub fn domain(&self) -> LegalDomain {
        self.domain
    }

    /// Plan, run the think/act loop, then have the critic judge the
    /// answer, retrying with a refined search up to `max_critic_rounds`
    /// times when it is rejected. The last round never refines: an answer
    /// is only ever returned after the critic has actually looked at it.
    #[instrument(skip(self, query, context, status_callback), fields(domain = %self.domain))]
    pub async fn execute_task(&self, query: &str, intent: LegalIntent, context: &str, status_callback: Option<&StatusCallback<'_>>) -> Result<String> {
        let mut messages = Vec::new();
        let system_prompt = plan_prompt(self.domain, intent);
        messages.push(Message::system(system_prompt));
        if !context.is_empty() {
            messages.push(Message::system(context.to_string()));
        }
        messages.push(Message::user(query.to_string()));

        let max_steps = intent.default_max_steps();
        let mut answer = self.agent.run(&mut messages, max_steps).await?;

        for round in 0..self.config.max_critic_rounds {
            notify(status_callback, "critic", &format!("critic round {round}"), "running");
            let verdict = self.critique(query, &answer).await;
            let deterministic_ok = passes_deterministic_checks(&answer);

            let is_acceptable = verdict.is_acceptable && deterministic_ok;
            if is_acceptable {
                debug!(round, "critic accepted answer");
                notify(status_callback, "critic", &format!("critic round {round}"), "complete");
                break;
            }
            notify(status_callback, "critic", &format!("critic round {round} rejected: {}", verdict.feedback), "complete");

            if round + 1 >= self.config.max_critic_rounds {
                info!(round, feedback = %verdict.feedback, "critic rejected answer on final round, returning as critiqued");
                break;
            }

            info!(round, feedback = %verdict.feedback, "critic rejected answer, attempting refined search");
            notify(status_callback, "refined_search", &format!("round {round}: {}", verdict.feedback), "running");
            answer = self.refine_with_search(query, &verdict.feedback, &mut messages).await.unwrap_or(answer);
            notify(status_callback, "refined_search", &format!("round {round}"), "complete");
        }

        Ok(answer)
    }

    async fn critique(&self, query: &str, answer: &str) -> CriticVerdict {
        let prompt = format!("用户问题:\n{query}\n\n助理回答:\n{answer}");
        let messages = vec![Message::user(prompt)];

        match self.llm.chat(&messages, Some(CRITIC_SYSTEM_PROMPT), Some(0.0), Some(256)).await {
            Ok(reply) => match crate::json::parse_json_block(&reply) {
                Ok(value) => serde_json::from_value(value).unwrap_or(CriticVerdict {
                    is_acceptable: true,
                    feedback: String::new(),
                }),
                Err(e) => {
                    warn!(error = %e, "critic reply was not valid JSON, defaulting to acceptable");
                    CriticVerdict {
                        is_acceptable: true,
                        feedback: String::new(),
                    }
                }
            },
            Err(e) => {
                warn!(error = %e, "critic call failed, defaulting to acceptable");
                CriticVerdict {
                    is_acceptable: true,
                    feedback: String::new(),
                }
            }
        }
    }

    async fn refine_with_search(&self, query: &str, feedback: &str, messages: &mut Vec<Message>) -> Result<String> {
        let search_query = format!("{query} {feedback}");
        let search_args = serde_json::json!({ "query": search_query }).to_string();

        let observation = self.agent.call_tool_directly("web_search", &search_args).await;

        messages.push(Message::system(format!(
            "补充检索结果:\n{observation}\n\n请结合以上信息重新给出更完整、更具体的最终回答，不要再调用工具。"
        )));

        let pruned = lawagent_core::prune_orphan_tool_messages(messages);
        let revised = self.llm.chat(&pruned, None, Some(0.3), None).await?;
        messages.push(Message::assistant(revised.clone()));
        Ok(revised)
    }
}

/// A deterministic floor on top of the critic's LLM judgment: a statute
/// citation or an enumerated list is never rejected outright, even if the
/// critic is unsure. This can only *tighten* the critic's verdict, never
/// loosen a rejection it made for other reasons.
fn passes_deterministic_checks(answer: &str) -> bool {
    STATUTE_CITATION.is_match(answer) || ENUMERATION.is_match(answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statute_citation_is_detected() {
        assert!(passes_deterministic_checks("根据《中华人民共和国劳动合同法》第四十条的规定，用人单位应当支付经济补偿。"));
    }

    #[test]
    fn chinese_enumeration_is_detected() {
        assert!(passes_deterministic_checks("一、解除劳动合同\n二、支付经济补偿\n三、办理离职手续"));
    }

    #[test]
    fn numeric_enumeration_is_detected() {
        assert!(passes_deterministic_checks("1. 先协商\n2. 再申请仲裁"));
    }

    #[test]
    fn plain_prose_without_citation_or_list_fails_deterministic_check() {
        assert!(!passes_deterministic_checks("这件事情比较复杂，建议你谨慎处理。"));
    }

    #[test]
    fn plan_prompt_names_domain_and_intent() {
        let prompt = plan_prompt(LegalDomain::Labor, LegalIntent::Calculation);
        assert!(prompt.contains("labor"));
        assert!(prompt.contains("calculation"));
    }
}
