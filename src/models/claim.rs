use serde::{Deserialize, Serialize};

use super::batch::{ClaimId, ClaimRecord};

/// One free-text FNOL report as supplied by the input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawClaimText {
    pub claim_id: ClaimId,
    pub text: String,
}

impl RawClaimText {
    pub fn new(claim_id: ClaimId, text: impl Into<String>) -> Self {
        Self {
            claim_id,
            text: text.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl ClaimRecord for RawClaimText {
    fn claim_id(&self) -> &ClaimId {
        &self.claim_id
    }
}

/// Vehicle involved in the loss
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleInfo {
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub license_plate: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl VehicleInfo {
    /// Whether anything identifying the vehicle was reported
    pub fn is_identified(&self) -> bool {
        [&self.make, &self.model, &self.vin, &self.license_plate]
            .into_iter()
            .any(|f| has_text(f))
            || self.year.is_some()
    }

    /// "2018 Toyota Camry" style label, empty when nothing is known
    pub fn label(&self) -> String {
        let year = self.year.map(|y| y.to_string());
        [year.as_deref(), self.make.as_deref(), self.model.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Reported damage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageInfo {
    #[serde(default)]
    pub description: Option<String>,
    /// Area of the vehicle, e.g. "front bumper"
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub estimated_repair_cost: Option<f64>,
}

impl DamageInfo {
    pub fn has_description(&self) -> bool {
        has_text(&self.description)
    }
}

/// Raw shape the model returns for an extraction or refinement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionPayload {
    #[serde(default)]
    pub claim_number: Option<String>,
    #[serde(default)]
    pub policyholder_name: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub vehicle: Option<VehicleInfo>,
    #[serde(default)]
    pub incident_date: Option<String>,
    #[serde(default)]
    pub incident_location: Option<String>,
    #[serde(default)]
    pub incident_description: Option<String>,
    #[serde(default)]
    pub damage: Option<DamageInfo>,
    #[serde(default)]
    pub other_parties_involved: Option<bool>,
    #[serde(default)]
    pub police_report_filed: Option<bool>,
}

/// The four required field categories of an extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Policyholder,
    Vehicle,
    Incident,
    Damage,
}

impl RequiredField {
    pub const ALL: [RequiredField; 4] = [
        RequiredField::Policyholder,
        RequiredField::Vehicle,
        RequiredField::Incident,
        RequiredField::Damage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RequiredField::Policyholder => "policyholder",
            RequiredField::Vehicle => "vehicle",
            RequiredField::Incident => "incident",
            RequiredField::Damage => "damage",
        }
    }
}

/// Presence flag per required field category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValidity {
    pub policyholder: bool,
    pub vehicle: bool,
    pub incident: bool,
    pub damage: bool,
}

impl FieldValidity {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_present(&self, field: RequiredField) -> bool {
        match field {
            RequiredField::Policyholder => self.policyholder,
            RequiredField::Vehicle => self.vehicle,
            RequiredField::Incident => self.incident,
            RequiredField::Damage => self.damage,
        }
    }

    pub fn missing(&self) -> Vec<RequiredField> {
        RequiredField::ALL
            .into_iter()
            .filter(|f| !self.is_present(*f))
            .collect()
    }

    pub fn state(&self) -> ValidityState {
        match self.missing().len() {
            0 => ValidityState::Valid,
            4 => ValidityState::Invalid,
            _ => ValidityState::Partial,
        }
    }
}

/// Overall validity of an extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidityState {
    Valid,
    Partial,
    Invalid,
}

/// Structured fields for one claim, as produced by Stage I
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedClaim {
    pub claim_id: ClaimId,
    /// Claim number quoted in the report itself, if any
    pub reported_claim_number: Option<String>,
    pub policyholder_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub vehicle: VehicleInfo,
    pub incident_date: Option<String>,
    pub incident_location: Option<String>,
    pub incident_description: Option<String>,
    pub damage: Option<DamageInfo>,
    pub other_parties_involved: Option<bool>,
    pub police_report_filed: Option<bool>,
    pub validity: FieldValidity,
    /// Concrete detail fields that were not reported
    pub missing_fields: Vec<String>,
    /// Why extraction failed outright, if it did
    pub extraction_error: Option<String>,
    /// Original report text
    pub source_text: String,
}

impl ExtractedClaim {
    /// Build a claim from a validated model payload
    pub fn from_payload(raw: &RawClaimText, payload: ExtractionPayload) -> Self {
        let vehicle = payload.vehicle.unwrap_or_default();
        let damage = payload.damage.filter(|d| {
            d.has_description() || has_text(&d.location) || d.estimated_repair_cost.is_some()
        });

        let validity = FieldValidity {
            policyholder: has_text(&payload.policyholder_name),
            vehicle: vehicle.is_identified(),
            incident: has_text(&payload.incident_description)
                || has_text(&payload.incident_date)
                || has_text(&payload.incident_location),
            damage: damage.as_ref().is_some_and(DamageInfo::has_description),
        };

        let mut missing_fields = Vec::new();
        if !validity.policyholder {
            missing_fields.push("policyholder_name".to_string());
        }
        if !validity.vehicle {
            missing_fields.push("vehicle".to_string());
        }
        if !has_text(&payload.incident_date) {
            missing_fields.push("incident_date".to_string());
        }
        if !has_text(&payload.incident_location) {
            missing_fields.push("incident_location".to_string());
        }
        if !has_text(&payload.incident_description) {
            missing_fields.push("incident_description".to_string());
        }
        if !validity.damage {
            missing_fields.push("damage.description".to_string());
        }

        Self {
            claim_id: raw.claim_id.clone(),
            reported_claim_number: payload.claim_number,
            policyholder_name: payload.policyholder_name,
            contact_phone: payload.contact_phone,
            contact_email: payload.contact_email,
            vehicle,
            incident_date: payload.incident_date,
            incident_location: payload.incident_location,
            incident_description: payload.incident_description,
            damage,
            other_parties_involved: payload.other_parties_involved,
            police_report_filed: payload.police_report_filed,
            validity,
            missing_fields,
            extraction_error: None,
            source_text: raw.text.clone(),
        }
    }

    /// A record for a claim whose extraction failed outright
    pub fn failed(raw: &RawClaimText, error: impl Into<String>) -> Self {
        Self {
            claim_id: raw.claim_id.clone(),
            reported_claim_number: None,
            policyholder_name: None,
            contact_phone: None,
            contact_email: None,
            vehicle: VehicleInfo::default(),
            incident_date: None,
            incident_location: None,
            incident_description: None,
            damage: None,
            other_parties_involved: None,
            police_report_filed: None,
            validity: FieldValidity::none(),
            missing_fields: [
                "policyholder_name",
                "vehicle",
                "incident_date",
                "incident_location",
                "incident_description",
                "damage.description",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            extraction_error: Some(error.into()),
            source_text: raw.text.clone(),
        }
    }

    pub fn validity_state(&self) -> ValidityState {
        self.validity.state()
    }

    /// None of the four required fields is present
    pub fn is_fully_invalid(&self) -> bool {
        self.validity_state() == ValidityState::Invalid
    }

    /// The model call or its validation failed; no fields came back at all
    pub fn extraction_failed(&self) -> bool {
        self.extraction_error.is_some()
    }

    pub fn damage_description(&self) -> Option<&str> {
        self.damage
            .as_ref()
            .and_then(|d| d.description.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn damage_location(&self) -> Option<&str> {
        self.damage
            .as_ref()
            .and_then(|d| d.location.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

impl ClaimRecord for ExtractedClaim {
    fn claim_id(&self) -> &ClaimId {
        &self.claim_id
    }
}

/// Stage I aggregate statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub total: usize,
    pub valid: usize,
    pub partial: usize,
    pub invalid: usize,
    /// Claims superseded by a refined extraction
    pub refined: usize,
    pub review_failed: usize,
    pub refine_failed: usize,
}

impl ExtractionStats {
    pub fn record(&mut self, claim: &ExtractedClaim) {
        self.total += 1;
        match claim.validity_state() {
            ValidityState::Valid => self.valid += 1,
            ValidityState::Partial => self.partial += 1,
            ValidityState::Invalid => self.invalid += 1,
        }
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}
