// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Domain tags shared across routing, retrieval, and session tracking.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A specialist domain the router can dispatch to.
///
/// `General` is the fallback when no keyword matches; it is never combined
/// with the other domains in a single routing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Domain {
    Admissions,
    Academics,
    FinancialAid,
    General,
}

impl Domain {
    /// Fixed aggregation order for multi-domain responses.
    pub const AGGREGATION_ORDER: [Domain; 3] =
        [Domain::Admissions, Domain::Academics, Domain::FinancialAid];

    /// Stable tag used in chunk metadata and log fields.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Domain::Admissions => "admissions",
            Domain::Academics => "academics",
            Domain::FinancialAid => "financial-aid",
            Domain::General => "general",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Domain> {
        match tag {
            "admissions" => Some(Domain::Admissions),
            "academics" => Some(Domain::Academics),
            "financial-aid" | "financial_aid" => Some(Domain::FinancialAid),
            "general" => Some(Domain::General),
            _ => None,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Topic filter applied to a retrieval query.
///
/// `All` makes every chunk eligible. `Topic` admits chunks tagged with that
/// domain plus untagged chunks — untagged content is corpus-wide, while a
/// tagged chunk never leaks into another topic's scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    All,
    Topic(Domain),
}

impl Scope {
    pub fn matches(&self, chunk_topic: Option<Domain>) -> bool {
        match self {
            Scope::All => true,
            Scope::Topic(domain) => chunk_topic.is_none() || chunk_topic == Some(*domain),
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            Scope::All => "all",
            Scope::Topic(domain) => domain.as_tag(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip() {
        for domain in [
            Domain::Admissions,
            Domain::Academics,
            Domain::FinancialAid,
            Domain::General,
        ] {
            assert_eq!(Domain::from_tag(domain.as_tag()), Some(domain));
        }
        assert_eq!(Domain::from_tag("unknown"), None);
    }

    #[test]
    fn test_aggregation_order_excludes_general() {
        assert!(!Domain::AGGREGATION_ORDER.contains(&Domain::General));
        assert_eq!(Domain::AGGREGATION_ORDER[0], Domain::Admissions);
        assert_eq!(Domain::AGGREGATION_ORDER[2], Domain::FinancialAid);
    }

    #[test]
    fn test_scope_matching() {
        assert!(Scope::All.matches(None));
        assert!(Scope::All.matches(Some(Domain::Academics)));
        assert!(Scope::Topic(Domain::Admissions).matches(Some(Domain::Admissions)));
        assert!(!Scope::Topic(Domain::Admissions).matches(Some(Domain::Academics)));
        // Untagged chunks are corpus-wide.
        assert!(Scope::Topic(Domain::Admissions).matches(None));
    }

    #[test]
    fn test_serde_kebab_case() {
        let json = serde_json::to_string(&Domain::FinancialAid).unwrap();
        assert_eq!(json, "\"financial-aid\"");
    }
}
