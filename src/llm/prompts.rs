use serde_json::json;

use super::gateway::Prompt;
use crate::models::{ExtractedClaim, RawClaimText, ReviewFeedback};

/// System prompt for extraction and refinement
pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are an insurance claims intake assistant. You read one First Notice of Loss (FNOL) report and extract structured fields from it.

RULES:
1. Extract only what the report states. Never invent names, dates, vehicles or damage.
2. Use null for anything the report does not mention.
3. damage.description must describe the physical damage to the vehicle, not how the incident happened.
4. incident_description describes how the incident happened.
5. estimated_repair_cost is filled only when the report quotes an amount.

Use the submit_extraction tool to return the fields."#;

/// System prompt for the self-review step
pub const REVIEW_SYSTEM_PROMPT: &str = r#"You are a senior claims examiner checking another assistant's extraction of an FNOL report.

Compare the extraction against the report and score it from 0 (unusable) to 100 (complete and accurate).
- List fields that are wrong or inconsistent with the report under "issues".
- List information that appears in the report but is missing from the extraction under "missing_information".
- Do not list information the report does not contain.

Use the submit_review tool to return your review."#;

/// System prompt for severity assessment
pub const ASSESSMENT_SYSTEM_PROMPT: &str = r#"You are an insurance claims severity specialist. Classify the damage of one claim and estimate the repair cost.

GUIDELINES:
- Minor: roughly 100-1,000. Cosmetic damage, scratches, small chips, glass damage.
- Moderate: roughly 1,000-5,000. Significant body damage, broken parts, several areas affected.
- Major: 5,000 and above. Structural damage, airbag deployment, vehicle not drivable, likely total loss.

Base the classification on the damage described. Use the submit_assessment tool to return the result."#;

/// Build the extraction prompt for one report
pub fn build_extraction_prompt(raw: &RawClaimText) -> Prompt {
    let user = format!(
        "# FNOL Report {}\n\n{}\n",
        raw.claim_id,
        raw.text.trim()
    );
    Prompt::new(EXTRACTION_SYSTEM_PROMPT, user).for_claim(&raw.claim_id)
}

/// Build the review prompt for one extraction
pub fn build_review_prompt(raw: &RawClaimText, extracted: &ExtractedClaim) -> Prompt {
    let mut user = String::new();

    user.push_str(&format!("# FNOL Report {}\n\n", raw.claim_id));
    user.push_str(raw.text.trim());
    user.push_str("\n\n## Extraction to Review\n```json\n");
    user.push_str(&format_extraction(extracted));
    user.push_str("\n```\n");

    Prompt::new(REVIEW_SYSTEM_PROMPT, user).for_claim(&raw.claim_id)
}

/// Build the refinement prompt: the extraction prompt plus the review findings
pub fn build_refine_prompt(
    raw: &RawClaimText,
    extracted: &ExtractedClaim,
    feedback: &ReviewFeedback,
) -> Prompt {
    let mut user = String::new();

    user.push_str(&format!("# FNOL Report {}\n\n", raw.claim_id));
    user.push_str(raw.text.trim());
    user.push_str("\n\n## Previous Extraction\n```json\n");
    user.push_str(&format_extraction(extracted));
    user.push_str("\n```\n\n");

    user.push_str(&format!(
        "## Review (quality score {}/100)\n",
        feedback.quality_score
    ));
    if feedback.is_clean() {
        user.push_str("- No issues found.\n");
    }
    for issue in &feedback.issues {
        user.push_str(&format!("- Issue: {}\n", issue));
    }
    for missing in &feedback.missing_information {
        user.push_str(&format!("- Missing: {}\n", missing));
    }

    user.push_str(
        "\nProduce a corrected extraction of the report that resolves the review findings.\n",
    );

    Prompt::new(EXTRACTION_SYSTEM_PROMPT, user).for_claim(&raw.claim_id)
}

/// Build the assessment prompt from the descriptive fields of a claim
pub fn build_assessment_prompt(
    claim: &ExtractedClaim,
    damage_description: &str,
) -> Prompt {
    let summary = json!({
        "claim_id": claim.claim_id,
        "loss_desc": damage_description,
        "damage_area": claim.damage_location().unwrap_or("Unknown"),
        "incident_description": claim
            .incident_description
            .as_deref()
            .unwrap_or("No incident description"),
        "vehicle": claim.vehicle.label(),
    });

    let user = format!(
        "## Claim to Assess\n```json\n{}\n```\n",
        serde_json::to_string_pretty(&summary).unwrap_or_default()
    );

    Prompt::new(ASSESSMENT_SYSTEM_PROMPT, user).for_claim(&claim.claim_id)
}

/// Extraction fields as JSON, without the source text
fn format_extraction(claim: &ExtractedClaim) -> String {
    let view = json!({
        "claim_number": claim.reported_claim_number,
        "policyholder_name": claim.policyholder_name,
        "contact_phone": claim.contact_phone,
        "contact_email": claim.contact_email,
        "vehicle": claim.vehicle,
        "incident_date": claim.incident_date,
        "incident_location": claim.incident_location,
        "incident_description": claim.incident_description,
        "damage": claim.damage,
        "other_parties_involved": claim.other_parties_involved,
        "police_report_filed": claim.police_report_filed,
    });
    serde_json::to_string_pretty(&view).unwrap_or_default()
}
