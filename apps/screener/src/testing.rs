//! In-memory fakes shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::llm_client::{LlmError, TextModel};

/// Replays a fixed script of responses, then repeats `fallback` (or fails
/// with `EmptyContent` when there is none).
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    fallback: Option<String>,
    calls: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn always(text: &str) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(text.to_string()),
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn sequence(responses: Vec<Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(responses.into()),
            fallback: None,
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextModel for ScriptedModel {
    async fn generate(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            return next;
        }
        self.fallback.clone().ok_or(LlmError::EmptyContent)
    }
}

type Responder = dyn Fn(&str, &str) -> Result<String, LlmError> + Send + Sync;

/// Answers each call with a closure over (prompt, system).
pub struct FnModel {
    responder: Box<Responder>,
    calls: AtomicU32,
}

impl FnModel {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&str, &str) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextModel for FnModel {
    async fn generate(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.responder)(prompt, system)
    }
}
