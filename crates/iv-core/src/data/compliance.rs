//! Latent compliance types of the heterogeneous-effects model

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a compliance type's treatment status responds to the instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreatmentRule {
    /// `D = Z`
    FollowInstrument,
    /// `D = 1`
    AlwaysTreated,
    /// `D = 0`
    NeverTreated,
    /// `D = 1 - Z`
    OpposeInstrument,
}

impl TreatmentRule {
    /// Treatment status for a binary instrument value
    pub fn apply(self, z: f64) -> f64 {
        match self {
            TreatmentRule::FollowInstrument => z,
            TreatmentRule::AlwaysTreated => 1.0,
            TreatmentRule::NeverTreated => 0.0,
            TreatmentRule::OpposeInstrument => 1.0 - z,
        }
    }
}

/// Canonical LATE population type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplianceType {
    Complier,
    AlwaysTaker,
    NeverTaker,
    Defier,
}

struct TypeProfile {
    rule: TreatmentRule,
    effect: f64,
}

// Indexed by `ComplianceType::index`.
const PROFILES: [TypeProfile; 4] = [
    TypeProfile {
        rule: TreatmentRule::FollowInstrument,
        effect: 5.0,
    },
    TypeProfile {
        rule: TreatmentRule::AlwaysTreated,
        effect: 2.0,
    },
    TypeProfile {
        rule: TreatmentRule::NeverTreated,
        effect: 2.0,
    },
    TypeProfile {
        rule: TreatmentRule::OpposeInstrument,
        effect: 2.0,
    },
];

impl ComplianceType {
    /// All types, in the order used for weights and counts
    pub const ALL: [ComplianceType; 4] = [
        ComplianceType::Complier,
        ComplianceType::AlwaysTaker,
        ComplianceType::NeverTaker,
        ComplianceType::Defier,
    ];

    /// Position in [`ComplianceType::ALL`]
    pub fn index(self) -> usize {
        match self {
            ComplianceType::Complier => 0,
            ComplianceType::AlwaysTaker => 1,
            ComplianceType::NeverTaker => 2,
            ComplianceType::Defier => 3,
        }
    }

    /// Treatment assignment rule of this type
    pub fn treatment_rule(self) -> TreatmentRule {
        PROFILES[self.index()].rule
    }

    /// True treatment effect β of this type
    pub fn true_effect(self) -> f64 {
        PROFILES[self.index()].effect
    }

    /// Treatment status given the instrument
    pub fn treatment(self, z: f64) -> f64 {
        self.treatment_rule().apply(z)
    }

    /// Whether treatment responds to the instrument at all
    pub fn responds_to_instrument(self) -> bool {
        matches!(
            self.treatment_rule(),
            TreatmentRule::FollowInstrument | TreatmentRule::OpposeInstrument
        )
    }

    /// Short human-readable name
    pub fn label(self) -> &'static str {
        match self {
            ComplianceType::Complier => "Complier",
            ComplianceType::AlwaysTaker => "Always-taker",
            ComplianceType::NeverTaker => "Never-taker",
            ComplianceType::Defier => "Defier",
        }
    }
}

impl fmt::Display for ComplianceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
