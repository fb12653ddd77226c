pub mod glass;

pub use glass::*;

/// Word lists used to classify damage descriptions
#[derive(Debug, Clone)]
pub struct DamageKeywords {
    /// Words that indicate glass damage
    pub glass_terms: Vec<String>,
    /// Multi-word glass parts whose words would otherwise read as body terms
    pub glass_phrases: Vec<String>,
    /// Words that indicate damage to the body or mechanical parts
    pub body_terms: Vec<String>,
}

impl Default for DamageKeywords {
    fn default() -> Self {
        Self {
            glass_terms: [
                "windshield",
                "windshields",
                "windscreen",
                "glass",
                "window",
                "windows",
                "sunroof",
                "moonroof",
                "backlite",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            glass_phrases: [
                "quarter glass",
                "quarter window",
                "door glass",
                "vent glass",
                "vent window",
                "mirror glass",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            body_terms: [
                "bumper", "door", "doors", "fender", "hood", "bonnet", "panel", "quarter",
                "trunk", "tailgate", "frame", "chassis", "airbag", "airbags", "axle", "wheel",
                "wheels", "tire", "tires", "tyre", "engine", "radiator", "grille", "headlight",
                "headlights", "taillight", "taillights", "roof", "pillar", "suspension",
                "body", "bodywork",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}
