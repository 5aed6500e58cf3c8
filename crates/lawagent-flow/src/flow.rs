//! Top-level request pipeline: memory read → route → dispatch → memory
//! write → archive. Owns the Memory Manager and the Router + Specialist
//! pool for the process; never raises to its caller.

use std::collections::HashMap;
use std::sync::Arc;

use lawagent_agent::{RouterAgent, SpecialistAgent};
use lawagent_core::{LegalDomain, Message, StatusCallback, notify};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::memory::MemoryManager;

const APOLOGY_MESSAGE: &str = "抱歉，处理您的问题时出现了一些问题，请稍后再试，或咨询专业律师获取帮助。";
const EMPTY_INPUT_REPLY: &str = "您好，请问您想咨询什么法律问题？可以具体描述一下情况，我会尽力帮您解答。";

pub struct Flow {
    memory: Arc<MemoryManager>,
    router: Arc<RouterAgent>,
    specialists: HashMap<LegalDomain, Arc<SpecialistAgent>>,
}

impl Flow {
    pub fn new(memory: Arc<MemoryManager>, router: Arc<RouterAgent>, specialists: HashMap<LegalDomain, Arc<SpecialistAgent>>) -> Self {
        Self { memory, router, specialists }
    }

    #[instrument(skip(self, input, status_callback), fields(request_id = %Uuid::now_v7()))]
    pub async fn execute(&self, input: &str, status_callback: Option<&StatusCallback<'_>>, session_id: &str) -> String {
        match self.execute_inner(input, status_callback, session_id).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "flow pipeline failed, returning apology");
                notify(status_callback, "error", &e.to_string(), "error");
                APOLOGY_MESSAGE.to_string()
            }
        }
    }

    async fn execute_inner(&self, input: &str, status_callback: Option<&StatusCallback<'_>>, session_id: &str) -> lawagent_core::Result<String> {
        self.memory.add_message(Message::user(input.to_string()), session_id).await;

        if input.trim().is_empty() {
            let reply = EMPTY_INPUT_REPLY.to_string();
            self.memory.add_message(Message::assistant(reply.clone()), session_id).await;
            notify(status_callback, "done", "empty input, skipped routing", "complete");
            return Ok(reply);
        }

        let mut context = self.memory.get_full_context(input, session_id).await;

        notify(status_callback, "route", "classifying domain and intent", "running");
        let (domain, intent, entities) = self.router.route(input, &context).await;
        notify(status_callback, "route", &format!("{domain}/{intent}"), "complete");

        if !entities.is_empty() {
            self.memory.update_global_state(session_id, Some(domain), Some(intent), Some(entities));
            context = self.memory.get_full_context(input, session_id).await;
        }

        notify(status_callback, "dispatch", &format!("dispatching to {domain} specialist"), "running");
        let specialist = self
            .specialists
            .get(&domain)
            .ok_or_else(|| lawagent_core::CoreError::state(format!("no specialist registered for domain {domain}")))?;

        let response = specialist.execute_task(input, intent, &context, status_callback).await?;
        notify(status_callback, "dispatch", "specialist run complete", "complete");

        self.memory.add_message(Message::assistant(response.clone()), session_id).await;
        self.memory.check_and_archive(session_id).await?;

        notify(status_callback, "done", "", "complete");
        info!(session_id, "flow request complete");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_reply_is_non_empty_and_not_the_apology() {
        assert!(!EMPTY_INPUT_REPLY.trim().is_empty());
        assert_ne!(EMPTY_INPUT_REPLY, APOLOGY_MESSAGE);
    }
}
