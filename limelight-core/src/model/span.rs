use serde::{Deserialize, Serialize};

/// Broad grouping of manipulation techniques, used for presentation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ManipulationClass {
    Emotional,
    Fallacy,
    Rhetorical,
    Evidence,
    Social,
}

impl ManipulationClass {
    pub fn all() -> &'static [ManipulationClass] {
        &[
            ManipulationClass::Emotional,
            ManipulationClass::Fallacy,
            ManipulationClass::Rhetorical,
            ManipulationClass::Evidence,
            ManipulationClass::Social,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ManipulationClass::Emotional => "emotional",
            ManipulationClass::Fallacy => "fallacy",
            ManipulationClass::Rhetorical => "rhetorical",
            ManipulationClass::Evidence => "evidence",
            ManipulationClass::Social => "social",
        }
    }
}

/// The closed set of techniques the external classifier reports
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ManipulationType {
    // Emotional
    FearMongering,
    EmotionalAppeal,
    OutrageBait,
    GuiltTripping,
    // Fallacy
    AdHominem,
    Strawman,
    FalseDilemma,
    SlipperySlope,
    // Rhetorical
    LoadedLanguage,
    Euphemism,
    Hyperbole,
    Repetition,
    // Evidence
    CherryPicking,
    MisleadingStatistics,
    FalseAuthority,
    // Social
    Bandwagon,
    AppealToTradition,
    UsVsThem,
}

impl ManipulationType {
    pub fn all() -> &'static [ManipulationType] {
        use ManipulationType::*;
        &[
            FearMongering,
            EmotionalAppeal,
            OutrageBait,
            GuiltTripping,
            AdHominem,
            Strawman,
            FalseDilemma,
            SlipperySlope,
            LoadedLanguage,
            Euphemism,
            Hyperbole,
            Repetition,
            CherryPicking,
            MisleadingStatistics,
            FalseAuthority,
            Bandwagon,
            AppealToTradition,
            UsVsThem,
        ]
    }

    /// Wire name, matching the classifier payload
    pub fn as_str(&self) -> &'static str {
        use ManipulationType::*;
        match self {
            FearMongering => "fear_mongering",
            EmotionalAppeal => "emotional_appeal",
            OutrageBait => "outrage_bait",
            GuiltTripping => "guilt_tripping",
            AdHominem => "ad_hominem",
            Strawman => "strawman",
            FalseDilemma => "false_dilemma",
            SlipperySlope => "slippery_slope",
            LoadedLanguage => "loaded_language",
            Euphemism => "euphemism",
            Hyperbole => "hyperbole",
            Repetition => "repetition",
            CherryPicking => "cherry_picking",
            MisleadingStatistics => "misleading_statistics",
            FalseAuthority => "false_authority",
            Bandwagon => "bandwagon",
            AppealToTradition => "appeal_to_tradition",
            UsVsThem => "us_vs_them",
        }
    }

    pub fn label(&self) -> &'static str {
        use ManipulationType::*;
        match self {
            FearMongering => "Fear Mongering",
            EmotionalAppeal => "Emotional Appeal",
            OutrageBait => "Outrage Bait",
            GuiltTripping => "Guilt Tripping",
            AdHominem => "Ad Hominem",
            Strawman => "Strawman",
            FalseDilemma => "False Dilemma",
            SlipperySlope => "Slippery Slope",
            LoadedLanguage => "Loaded Language",
            Euphemism => "Euphemism",
            Hyperbole => "Hyperbole",
            Repetition => "Repetition",
            CherryPicking => "Cherry Picking",
            MisleadingStatistics => "Misleading Statistics",
            FalseAuthority => "False Authority",
            Bandwagon => "Bandwagon",
            AppealToTradition => "Appeal to Tradition",
            UsVsThem => "Us vs. Them",
        }
    }

    pub fn class(&self) -> ManipulationClass {
        use ManipulationType::*;
        match self {
            FearMongering | EmotionalAppeal | OutrageBait | GuiltTripping => {
                ManipulationClass::Emotional
            }
            AdHominem | Strawman | FalseDilemma | SlipperySlope => ManipulationClass::Fallacy,
            LoadedLanguage | Euphemism | Hyperbole | Repetition => ManipulationClass::Rhetorical,
            CherryPicking | MisleadingStatistics | FalseAuthority => ManipulationClass::Evidence,
            Bandwagon | AppealToTradition | UsVsThem => ManipulationClass::Social,
        }
    }
}

/// One classified quotation as delivered by the classification collaborator.
/// Assumed already validated; this crate only has to find it in the tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnotationSpan {
    pub original_text: String,
    pub manipulation_type: ManipulationType,
    pub manipulation_description: String,
    pub confidence: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_set_size() {
        assert_eq!(ManipulationType::all().len(), 18);
        assert_eq!(ManipulationClass::all().len(), 5);
    }

    #[test]
    fn test_wire_names_round_trip() {
        for ty in ManipulationType::all() {
            let json = serde_json::to_string(ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty.as_str()));
            let back: ManipulationType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, *ty);
        }
    }

    #[test]
    fn test_span_deserializes_from_classifier_payload() {
        let json = r#"{
            "original_text": "you should be very afraid",
            "manipulation_type": "fear_mongering",
            "manipulation_description": "Invokes fear of the future without evidence.",
            "confidence": 0.9
        }"#;
        let span: AnnotationSpan = serde_json::from_str(json).unwrap();
        assert_eq!(span.manipulation_type, ManipulationType::FearMongering);
        assert_eq!(span.manipulation_type.class(), ManipulationClass::Emotional);
        assert!((span.confidence - 0.9).abs() < f32::EPSILON);
    }
}
