//! Scripted in-process model for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::GenerativeModel;
use crate::error::{GeminiError, GeminiResult};
use crate::types::ModelRequest;

/// Replays queued results in order and records every request it receives.
/// Once the script runs out, the fallback is repeated.
pub(crate) struct ScriptedModel {
    script: Mutex<VecDeque<GeminiResult<String>>>,
    fallback: fn(&ModelRequest) -> GeminiResult<String>,
    calls: Mutex<Vec<(String, ModelRequest)>>,
}

impl ScriptedModel {
    pub fn new(script: Vec<GeminiResult<String>>) -> Self {
        Self::with_fallback(script, |_| Err(GeminiError::invalid_response("script exhausted")))
    }

    pub fn with_fallback(
        script: Vec<GeminiResult<String>>,
        fallback: fn(&ModelRequest) -> GeminiResult<String>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(String, ModelRequest)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate(&self, credential: &str, request: &ModelRequest) -> GeminiResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((credential.to_string(), request.clone()));

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => (self.fallback)(request),
        }
    }
}
