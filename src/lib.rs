pub mod heuristics;
pub mod io;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod stages;

pub use heuristics::{DamageKeywords, is_glass_only};
pub use io::{PipelineReport, read_claims_file, split_claims};
pub use llm::{AnthropicClient, AnthropicConfig, GatewayError, LlmGateway};
pub use models::{
    BatchIntegrityError, BatchResult, ClaimId, ExtractedClaim, Queue, QueueAssignment,
    RawClaimText, Severity, SeverityAssessment,
};
pub use pipeline::{PipelineConfig, PipelineError, PipelineOutput, run_pipeline, run_pipeline_until};
pub use stages::{AssessmentConfig, ExtractionConfig, RoutingConfig, assess, extract, route};
