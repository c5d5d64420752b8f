//! Static exam track and study module catalog.
//!
//! The two LEED tracks share the nine credit-category modules; the PMP track
//! carries the ten PMBOK knowledge areas. Module icons, colors, and other
//! presentation data live in the browser client, not here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One certification exam's identity. A chat session is bound to exactly one
/// track for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    LeedV41,
    LeedV5,
    Pmp,
}

impl Track {
    pub const ALL: [Track; 3] = [Track::LeedV41, Track::LeedV5, Track::Pmp];

    /// Display name, as shown to the learner and embedded in prompts.
    pub fn name(&self) -> &'static str {
        match self {
            Track::LeedV41 => "LEED AP v4.1",
            Track::LeedV5 => "LEED v5",
            Track::Pmp => "PMP",
        }
    }

    /// Stable identifier used in URLs and the wire protocol.
    pub fn as_str(&self) -> &'static str {
        match self {
            Track::LeedV41 => "leed_v41",
            Track::LeedV5 => "leed_v5",
            Track::Pmp => "pmp",
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Track {
    type Err = UnknownTrack;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Track::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTrack(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown exam track: '{0}'")]
pub struct UnknownTrack(pub String);

/// One topic within a track, with an independent completion lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleDef {
    pub id: &'static str,
    pub name: &'static str,
}

const LEED_MODULES: [ModuleDef; 9] = [
    ModuleDef { id: "integrative-process", name: "Integrative Process (IP)" },
    ModuleDef { id: "location-transportation", name: "Location and Transportation (LT)" },
    ModuleDef { id: "sustainable-sites", name: "Sustainable Sites (SS)" },
    ModuleDef { id: "water-efficiency", name: "Water Efficiency (WE)" },
    ModuleDef { id: "energy-atmosphere", name: "Energy and Atmosphere (EA)" },
    ModuleDef { id: "materials-resources", name: "Materials and Resources (MR)" },
    ModuleDef { id: "indoor-environmental-quality", name: "Indoor Environmental Quality (EQ)" },
    ModuleDef { id: "innovation", name: "Innovation (IN)" },
    ModuleDef { id: "regional-priority", name: "Regional Priority (RP)" },
];

const PMP_MODULES: [ModuleDef; 10] = [
    ModuleDef { id: "integration", name: "Integration Management" },
    ModuleDef { id: "scope", name: "Scope Management" },
    ModuleDef { id: "schedule", name: "Schedule Management" },
    ModuleDef { id: "cost", name: "Cost Management" },
    ModuleDef { id: "quality", name: "Quality Management" },
    ModuleDef { id: "resource", name: "Resource Management" },
    ModuleDef { id: "communications", name: "Communications Management" },
    ModuleDef { id: "risk", name: "Risk Management" },
    ModuleDef { id: "procurement", name: "Procurement Management" },
    ModuleDef { id: "stakeholder", name: "Stakeholder Management" },
];

/// The study modules for a track, in dashboard order.
pub fn modules_for(track: Track) -> &'static [ModuleDef] {
    match track {
        Track::LeedV41 | Track::LeedV5 => &LEED_MODULES,
        Track::Pmp => &PMP_MODULES,
    }
}

/// Looks up a single module by id within a track.
pub fn module(track: Track, module_id: &str) -> Option<&'static ModuleDef> {
    modules_for(track).iter().find(|m| m.id == module_id)
}
