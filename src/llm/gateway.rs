use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use super::schema::ResponseSchema;
use super::validation::ValidationError;
use crate::models::ClaimId;

/// A fully-formed instruction for one model call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Claim this call concerns, for logging and stub lookup
    pub claim_id: Option<ClaimId>,
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            claim_id: None,
            system: system.into(),
            user: user.into(),
        }
    }

    pub fn for_claim(mut self, claim_id: &ClaimId) -> Self {
        self.claim_id = Some(claim_id.clone());
        self
    }
}

/// Failure of a single gateway call
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid model response: {0}")]
    Validation(#[from] ValidationError),

    #[error("model declined to answer: {0}")]
    Declined(String),

    #[error("model returned no content")]
    EmptyResponse,
}

/// "Send a prompt, get back a structured object"
///
/// Implementations perform exactly one model call per `invoke` and never
/// retry; retry policy belongs to the caller.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn invoke(&self, prompt: &Prompt, schema: &ResponseSchema)
    -> Result<Value, GatewayError>;
}

/// Invoke the gateway and decode the response into `T`
///
/// Shape mismatches (missing required keys, wrong types) come back as
/// `GatewayError::Validation`.
pub async fn invoke_as<T: DeserializeOwned>(
    gateway: &dyn LlmGateway,
    prompt: &Prompt,
    schema: &ResponseSchema,
) -> Result<T, GatewayError> {
    let value = gateway.invoke(prompt, schema).await?;

    if value.is_null() {
        return Err(GatewayError::EmptyResponse);
    }

    serde_json::from_value(value).map_err(|e| {
        GatewayError::Validation(ValidationError::Shape {
            schema: schema.name,
            message: e.to_string(),
        })
    })
}
