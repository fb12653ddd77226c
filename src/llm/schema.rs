use serde_json::{Value, json};

/// Expected structured response shape for a model call
///
/// `schema` is a JSON Schema object handed to the provider for constrained
/// decoding; `name` doubles as the tool name.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: Value,
}

pub const EXTRACTION: &str = "submit_extraction";
pub const REVIEW: &str = "submit_review";
pub const ASSESSMENT: &str = "submit_assessment";

fn nullable(kind: &str, description: &str) -> Value {
    json!({ "type": [kind, "null"], "description": description })
}

/// Schema for extraction and refinement responses
pub fn extraction_schema() -> ResponseSchema {
    ResponseSchema {
        name: EXTRACTION,
        description: "Submit the structured fields extracted from one FNOL report",
        schema: json!({
            "type": "object",
            "properties": {
                "claim_number": nullable("string", "Claim number quoted in the report"),
                "policyholder_name": nullable("string", "Name of the policyholder"),
                "contact_phone": nullable("string", "Contact phone number"),
                "contact_email": nullable("string", "Contact email address"),
                "vehicle": {
                    "type": ["object", "null"],
                    "properties": {
                        "make": nullable("string", "Manufacturer"),
                        "model": nullable("string", "Model"),
                        "year": {
                            "type": ["integer", "null"],
                            "minimum": 1900,
                            "maximum": 2100
                        },
                        "vin": nullable("string", "Vehicle identification number"),
                        "license_plate": nullable("string", "License plate"),
                        "color": nullable("string", "Colour")
                    }
                },
                "incident_date": nullable("string", "Date and time of the incident"),
                "incident_location": nullable("string", "Where the incident happened"),
                "incident_description": nullable("string", "How the incident happened"),
                "damage": {
                    "type": ["object", "null"],
                    "properties": {
                        "description": nullable("string", "Description of the damage"),
                        "location": nullable("string", "Area of the vehicle that is damaged"),
                        "estimated_repair_cost": {
                            "type": ["number", "null"],
                            "minimum": 0
                        }
                    }
                },
                "other_parties_involved": nullable("boolean", "Whether other parties were involved"),
                "police_report_filed": nullable("boolean", "Whether a police report was filed")
            },
            "required": ["policyholder_name", "vehicle", "incident_description", "damage"]
        }),
    }
}

/// Schema for the self-review of an extraction
pub fn review_schema() -> ResponseSchema {
    ResponseSchema {
        name: REVIEW,
        description: "Submit a quality review of an extraction",
        schema: json!({
            "type": "object",
            "properties": {
                "quality_score": {
                    "type": "number",
                    "minimum": 0,
                    "maximum": 100,
                    "description": "0 = unusable, 100 = complete and accurate"
                },
                "issues": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Fields that are wrong or inconsistent with the report"
                },
                "missing_information": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Information present in the report but not extracted"
                }
            },
            "required": ["quality_score", "issues", "missing_information"]
        }),
    }
}

/// Schema for a severity assessment
pub fn assessment_schema() -> ResponseSchema {
    ResponseSchema {
        name: ASSESSMENT,
        description: "Submit the severity classification and cost estimate for one claim",
        schema: json!({
            "type": "object",
            "properties": {
                "severity": {
                    "type": "string",
                    "enum": ["Minor", "Moderate", "Major"]
                },
                "estimated_cost": {
                    "type": "number",
                    "minimum": 0,
                    "description": "Estimated repair cost"
                },
                "reasoning": {
                    "type": "string",
                    "description": "Brief explanation of the classification"
                }
            },
            "required": ["severity", "estimated_cost", "reasoning"]
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_names_are_distinct() {
        let names = [
            extraction_schema().name,
            review_schema().name,
            assessment_schema().name,
        ];
        assert_eq!(names, [EXTRACTION, REVIEW, ASSESSMENT]);
    }

    #[test]
    fn test_assessment_schema_enumerates_severities() {
        let schema = assessment_schema();
        let levels = schema.schema["properties"]["severity"]["enum"]
            .as_array()
            .unwrap()
            .len();
        assert_eq!(levels, 3);
    }
}
