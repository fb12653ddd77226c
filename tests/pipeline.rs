use serde_json::{Value, json};

use fnol_triage::llm::schema::{ASSESSMENT, EXTRACTION, REVIEW};
use fnol_triage::llm::{ScriptedGateway, ScriptedReply};
use fnol_triage::models::{AssessmentOutcome, RoutingReason, ValidityState};
use fnol_triage::{
    ClaimId, PipelineConfig, PipelineReport, Queue, Severity, run_pipeline, split_claims,
};

const CLAIMS_FILE: &str = "\
Policyholder Maria Gonzalez, 2019 Honda Civic. On March 3rd she was parked at
the Westfield mall lot when someone knocked on her window to say her car had
been hit. She has not looked at the car yet.
---
John Smith here, policy for my 2018 Toyota Camry. A stone flew up on I-95
yesterday and there is now a crack across the windshield. No other damage.
---
This is Priya Patel. My 2021 Ford Escape was sideswiped on Elm Street on
June 10th. The driver door and rear quarter panel are dented in.
---
Reporting for Tom Becker. The 2015 Jeep Wrangler rolled over on Route 9 on
the ice. The roof is crushed and the frame is bent. Car was towed.
---
asdf ;; 0x00 ??? <<>> lorem
";

fn extraction(value: Value) -> ScriptedReply {
    ScriptedReply::Json(value)
}

fn assessment(severity: &str, cost: f64) -> ScriptedReply {
    ScriptedReply::Json(json!({
        "severity": severity,
        "estimated_cost": cost,
        "reasoning": "scripted"
    }))
}

fn id(position: usize) -> ClaimId {
    ClaimId::from_position(position)
}

fn scripted_gateway() -> ScriptedGateway {
    ScriptedGateway::new()
        .on(
            EXTRACTION,
            &id(0),
            extraction(json!({
                "policyholder_name": "Maria Gonzalez",
                "vehicle": {"make": "Honda", "model": "Civic", "year": 2019},
                "incident_date": "March 3rd",
                "incident_location": "Westfield mall parking lot",
                "incident_description": "Parked car was hit by another vehicle",
                "damage": null
            })),
        )
        .on(
            EXTRACTION,
            &id(1),
            extraction(json!({
                "policyholder_name": "John Smith",
                "vehicle": {"make": "Toyota", "model": "Camry", "year": 2018},
                "incident_location": "I-95",
                "incident_description": "Stone struck the windshield",
                "damage": {"description": "Crack across the windshield", "location": "windshield"}
            })),
        )
        .on(
            EXTRACTION,
            &id(2),
            extraction(json!({
                "policyholder_name": "Priya Patel",
                "vehicle": {"make": "Ford", "model": "Escape", "year": 2021},
                "incident_date": "June 10th",
                "incident_location": "Elm Street",
                "incident_description": "Sideswiped by another vehicle",
                "damage": {
                    "description": "Driver door and rear quarter panel dented",
                    "location": "driver side"
                },
                "other_parties_involved": false
            })),
        )
        .on(
            EXTRACTION,
            &id(3),
            extraction(json!({
                "policyholder_name": "Tom Becker",
                "vehicle": {"make": "Jeep", "model": "Wrangler", "year": 2015},
                "incident_location": "Route 9",
                "incident_description": "Rollover on ice",
                "damage": {"description": "Roof crushed, frame bent", "location": "roof"}
            })),
        )
        .on(
            EXTRACTION,
            &id(4),
            ScriptedReply::Text("I could not find any claim details in this text.".into()),
        )
        .on(ASSESSMENT, &id(1), assessment("Minor", 450.0))
        .on(ASSESSMENT, &id(2), assessment("Moderate", 2400.0))
        .on(ASSESSMENT, &id(3), assessment("Major", 22000.0))
        .on(ASSESSMENT, &id(4), assessment("Minor", 100.0))
}

#[tokio::test]
async fn test_five_claim_batch_end_to_end() {
    let claims = split_claims(CLAIMS_FILE);
    assert_eq!(claims.len(), 5);

    let gateway = scripted_gateway();
    let output = run_pipeline(&gateway, &claims, &PipelineConfig::default())
        .await
        .unwrap();

    let ids: Vec<ClaimId> = (0..5).map(id).collect();
    assert_eq!(output.extraction.claim_ids(), ids);
    assert_eq!(output.assessment.claim_ids(), ids);
    assert_eq!(output.routing.claim_ids(), ids);

    // No damage reported: flagged, not guessed, no assessment call
    let empty = &output.extraction.records[0];
    assert!(!empty.validity.damage);
    assert_eq!(empty.validity_state(), ValidityState::Partial);
    assert!(output.assessment.records[0].is_insufficient());
    assert_eq!(output.routing.records[0].queue, Queue::FastTrack);
    assert_eq!(output.routing.records[0].priority.value(), 3);

    assert_eq!(output.routing.records[1].queue, Queue::Glass);
    assert_eq!(output.routing.records[1].priority.value(), 5);

    assert_eq!(output.assessment.records[2].severity(), Some(Severity::Moderate));
    assert_eq!(output.routing.records[2].queue, Queue::MaterialDamage);

    assert_eq!(output.routing.records[3].queue, Queue::TotalLoss);
    assert_eq!(output.routing.records[3].priority.value(), 1);

    // Unparsable extraction: every flag false, escalated for manual handling
    let malformed = &output.extraction.records[4];
    assert_eq!(malformed.validity_state(), ValidityState::Invalid);
    assert!(malformed.extraction_error.is_some());
    assert_eq!(output.routing.records[4].queue, Queue::TotalLoss);
    assert_eq!(output.routing.records[4].reason, RoutingReason::InvalidExtraction);

    let stats = &output.routing.stats;
    assert_eq!(stats.queue_count(Queue::TotalLoss), 2);
    assert_eq!(stats.queue_count(Queue::MaterialDamage), 1);
    assert_eq!(stats.queue_count(Queue::Glass), 1);
    assert_eq!(stats.queue_count(Queue::FastTrack), 1);

    assert_eq!(output.extraction.stats.valid, 3);
    assert_eq!(output.extraction.stats.partial, 1);
    assert_eq!(output.extraction.stats.invalid, 1);
    assert_eq!(output.assessment.stats.insufficient_information, 1);

    assert_eq!(gateway.call_count(EXTRACTION), 5);
    assert_eq!(gateway.call_count(ASSESSMENT), 4);
    assert_eq!(gateway.call_count(REVIEW), 0);
}

#[tokio::test]
async fn test_assessment_and_routing_are_repeatable() {
    let claims = split_claims(CLAIMS_FILE);
    let gateway = scripted_gateway();

    let first = run_pipeline(&gateway, &claims, &PipelineConfig::default())
        .await
        .unwrap();
    let second = run_pipeline(&gateway, &claims, &PipelineConfig::default())
        .await
        .unwrap();

    assert_eq!(first.assessment, second.assessment);
    assert_eq!(first.routing, second.routing);
}

#[tokio::test]
async fn test_feedback_loop_keeps_original_when_refine_fails() {
    let claims = split_claims(CLAIMS_FILE);
    let gateway = scripted_gateway()
        .on_any(
            REVIEW,
            ScriptedReply::Json(json!({
                "quality_score": 85,
                "issues": ["incident date missing"],
                "missing_information": ["incident_date"]
            })),
        )
        // second extraction call for claim 2 is the refine
        .on(EXTRACTION, &id(1), ScriptedReply::TransportFailure);

    let baseline = run_pipeline(&scripted_gateway(), &claims, &PipelineConfig::default())
        .await
        .unwrap();
    let config = PipelineConfig::default().with_feedback_loop(true);
    let output = run_pipeline(&gateway, &claims, &config).await.unwrap();

    assert_eq!(output.extraction.records[1], baseline.extraction.records[1]);
    assert_eq!(output.extraction.stats.refine_failed, 1);

    // the malformed claim is never reviewed
    assert_eq!(gateway.call_count(REVIEW), 4);
    assert_eq!(output.routing.claim_ids(), baseline.routing.claim_ids());
}

#[tokio::test]
async fn test_report_serializes_outcomes() {
    let claims = split_claims(CLAIMS_FILE);
    let output = run_pipeline(&scripted_gateway(), &claims, &PipelineConfig::default())
        .await
        .unwrap();

    let report = PipelineReport::new(output, "scripted", false);
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["routing"]["records"].as_array().unwrap().len(), 5);
    assert_eq!(
        value["assessment"]["records"][0]["outcome"]["status"],
        "insufficient_information"
    );
    assert!(matches!(
        report.assessment.records[3].outcome,
        AssessmentOutcome::Assessed {
            severity: Severity::Major,
            ..
        }
    ));
    assert!(report.format_summary().contains("CLAIM-005"));
}
