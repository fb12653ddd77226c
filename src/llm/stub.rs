use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::gateway::{GatewayError, LlmGateway, Prompt};
use super::parsing::decode_text_response;
use super::schema::ResponseSchema;
use crate::models::ClaimId;

/// What a scripted call answers with
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Structured answer, as a tool call would deliver it
    Json(Value),
    /// Free-text answer, decoded the same way the HTTP client decodes text
    Text(String),
    TransportFailure,
    Declined,
    Empty,
}

impl ScriptedReply {
    fn resolve(&self, schema: &'static str) -> Result<Value, GatewayError> {
        match self {
            ScriptedReply::Json(value) => Ok(value.clone()),
            ScriptedReply::Text(text) => decode_text_response(schema, text),
            ScriptedReply::TransportFailure => {
                Err(GatewayError::Transport("scripted connection failure".into()))
            }
            ScriptedReply::Declined => Err(GatewayError::Declined("scripted refusal".into())),
            ScriptedReply::Empty => Err(GatewayError::EmptyResponse),
        }
    }
}

/// One call observed by a [`ScriptedGateway`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub schema: &'static str,
    pub claim_id: Option<ClaimId>,
}

type ReplyKey = (&'static str, Option<ClaimId>);

/// Deterministic gateway answering from a script
///
/// Replies are looked up by `(schema name, claim id)` first, then by schema
/// name alone. Registering several replies under one key answers successive
/// calls in order, and the last reply repeats. Unscripted calls answer
/// `EmptyResponse`. A per-claim delay holds every reply for that claim.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    replies: HashMap<ReplyKey, Vec<ScriptedReply>>,
    delays: HashMap<ClaimId, Duration>,
    served: Mutex<HashMap<ReplyKey, usize>>,
    calls: Mutex<Vec<RecordedCall>>,
    completed: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a reply for one claim
    pub fn on(self, schema: &'static str, claim_id: &ClaimId, reply: ScriptedReply) -> Self {
        self.push((schema, Some(claim_id.clone())), reply)
    }

    /// Script a reply for any claim without its own entry
    pub fn on_any(self, schema: &'static str, reply: ScriptedReply) -> Self {
        self.push((schema, None), reply)
    }

    /// Hold every reply for one claim for `delay`
    pub fn delay(mut self, claim_id: &ClaimId, delay: Duration) -> Self {
        self.delays.insert(claim_id.clone(), delay);
        self
    }

    fn push(mut self, key: ReplyKey, reply: ScriptedReply) -> Self {
        self.replies.entry(key).or_default().push(reply);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Calls in the order their replies were delivered
    pub fn completed(&self) -> Vec<RecordedCall> {
        self.completed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self, schema: &str) -> usize {
        self.calls().iter().filter(|c| c.schema == schema).count()
    }

    fn next_reply(&self, key: ReplyKey) -> Option<ScriptedReply> {
        let replies = self.replies.get(&key)?;
        let mut served = self
            .served
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let count = served.entry(key).or_insert(0);
        let reply = replies.get(*count).or_else(|| replies.last()).cloned();
        *count += 1;
        reply
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn invoke(
        &self,
        prompt: &Prompt,
        schema: &ResponseSchema,
    ) -> Result<Value, GatewayError> {
        let call = RecordedCall {
            schema: schema.name,
            claim_id: prompt.claim_id.clone(),
        };
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call.clone());

        let delay = prompt
            .claim_id
            .as_ref()
            .and_then(|id| self.delays.get(id).copied());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.completed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);

        let reply = prompt
            .claim_id
            .clone()
            .and_then(|id| self.next_reply((schema.name, Some(id))))
            .or_else(|| self.next_reply((schema.name, None)));

        match reply {
            Some(reply) => reply.resolve(schema.name),
            None => Err(GatewayError::EmptyResponse),
        }
    }
}
