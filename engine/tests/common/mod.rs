//! Shared test helpers
//!
//! `ScriptedProvider` replays canned replies in order and records every
//! request it receives, so pipeline scenarios run without a model server.

#![allow(dead_code)]

use async_trait::async_trait;
use quill_engine::llm::{LLMError, LLMProvider, Message};
use std::collections::VecDeque;
use std::sync::Mutex;

pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, LLMError>>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    /// Queue a transport failure
    pub fn fail(self, error: LLMError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, LLMError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LLMError::ProviderUnavailable("script exhausted".to_string())))
    }
}

pub const DRAFT_REPLY: &str = "```json\n{\"hook\": \"Ship faster\", \"body\": \"Our new CI cuts build times in half.\", \"call_to_action\": \"Try it free\", \"hashtags\": [\"#devops\", \"#ci\"]}\n```";

pub fn translation_reply(languages: &[&str], hook_prefix: &str) -> String {
    let object: serde_json::Map<String, serde_json::Value> = languages
        .iter()
        .map(|lang| {
            (
                lang.to_string(),
                serde_json::json!({
                    "hook": format!("{} {}", hook_prefix, lang),
                    "body": format!("body {}", lang),
                    "call_to_action": format!("cta {}", lang),
                    "hashtags": ["#devops"]
                }),
            )
        })
        .collect();
    format!(
        "Sure, here you go:\n```json\n{}\n```",
        serde_json::to_string_pretty(&serde_json::Value::Object(object)).unwrap()
    )
}
