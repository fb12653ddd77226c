use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    AssessmentOutcome, BatchResult, ExtractedClaim, ExtractionStats, Priority, Queue,
    QueueAssignment, RequiredField, RoutingStats, Severity, SeverityAssessment, SeverityStats,
    ValidityState,
};
use crate::pipeline::PipelineOutput;

/// Machine-readable result of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Model that served the run
    pub model: String,
    pub feedback_loop: bool,
    pub extraction: BatchResult<ExtractedClaim, ExtractionStats>,
    pub assessment: BatchResult<SeverityAssessment, SeverityStats>,
    pub routing: BatchResult<QueueAssignment, RoutingStats>,
}

impl PipelineReport {
    pub fn new(output: PipelineOutput, model: impl Into<String>, feedback_loop: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            model: model.into(),
            feedback_loop,
            extraction: output.extraction,
            assessment: output.assessment,
            routing: output.routing,
        }
    }

    pub fn claim_count(&self) -> usize {
        self.routing.len()
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }

    /// Plain-text summary for the terminal
    pub fn format_summary(&self) -> String {
        let mut out = String::new();
        let ext = &self.extraction.stats;
        let sev = &self.assessment.stats;
        let routing = &self.routing.stats;

        let _ = writeln!(out, "Triage Report {}", self.run_id);
        let _ = writeln!(out, "=============");
        let _ = writeln!(
            out,
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(out, "Model: {}", self.model);
        let _ = writeln!(
            out,
            "Feedback loop: {}",
            if self.feedback_loop { "on" } else { "off" }
        );
        let _ = writeln!(out, "Claims: {}", self.claim_count());
        out.push('\n');

        let _ = writeln!(out, "Extraction");
        let _ = writeln!(out, "----------");
        let _ = writeln!(
            out,
            "valid {}, partial {}, invalid {}",
            ext.valid, ext.partial, ext.invalid
        );
        if self.feedback_loop {
            let _ = writeln!(
                out,
                "refined {}, review failed {}, refine failed {}",
                ext.refined, ext.review_failed, ext.refine_failed
            );
        }
        out.push('\n');

        let _ = writeln!(out, "Severity");
        let _ = writeln!(out, "--------");
        for severity in Severity::ALL {
            let _ = writeln!(out, "{:<24}{}", severity, sev.count(severity));
        }
        let _ = writeln!(
            out,
            "{:<24}{}",
            "Insufficient info", sev.insufficient_information
        );
        let _ = writeln!(
            out,
            "{:<24}${:.2}",
            "Total estimated cost", sev.total_estimated_cost
        );
        if let Some(mean) = sev.mean_estimated_cost {
            let _ = writeln!(out, "{:<24}${:.2}", "Mean estimated cost", mean);
        }
        out.push('\n');

        let _ = writeln!(out, "Queues");
        let _ = writeln!(out, "------");
        for queue in Queue::ALL {
            let _ = writeln!(out, "{:<24}{}", queue, routing.queue_count(queue));
        }
        out.push('\n');

        let _ = writeln!(out, "Priorities");
        let _ = writeln!(out, "----------");
        for priority in Priority::all() {
            let _ = writeln!(
                out,
                "Priority {:<15}{}",
                priority.value(),
                routing.priority_count(priority.value())
            );
        }
        out.push('\n');

        let _ = writeln!(out, "Claims");
        let _ = writeln!(out, "------");
        for assignment in &self.routing.records {
            let id = &assignment.claim_id;
            let claim = self.extraction.get(id);
            let validity = claim
                .map(|c| format!("{:?}", c.validity_state()).to_lowercase())
                .unwrap_or_default();
            let severity = self
                .assessment
                .get(id)
                .map(describe_outcome)
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "{}  {:<8} {:<28} {:<16} P{}",
                id, validity, severity, assignment.queue, assignment.priority
            );

            let Some(claim) = claim else { continue };
            if let Some(error) = &claim.extraction_error {
                let _ = writeln!(out, "    extraction failed: {}", error);
            } else if claim.validity_state() != ValidityState::Valid {
                let missing: Vec<&str> = claim
                    .validity
                    .missing()
                    .into_iter()
                    .map(RequiredField::as_str)
                    .collect();
                let _ = writeln!(out, "    missing: {}", missing.join(", "));
            }
        }

        out
    }
}

fn describe_outcome(assessment: &SeverityAssessment) -> String {
    match &assessment.outcome {
        AssessmentOutcome::Assessed {
            severity,
            estimated_cost,
            ..
        } => format!("{} (${:.0})", severity, estimated_cost),
        AssessmentOutcome::InsufficientInformation { .. } => "insufficient information".into(),
    }
}
