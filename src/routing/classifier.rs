// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Deterministic keyword classification.
//!
//! One data-driven rule table maps keywords to domains. A keyword matches
//! when any word of the query starts with it ("requirements" matches
//! "requirement", "costs" matches "cost"), which avoids the substring false
//! positives of naive `contains` matching ("said" would otherwise match
//! "aid"). No randomness anywhere: the same query always classifies the
//! same way.
//!
//! Two rule attributes refine plain union-of-matches:
//! - `generic`: broad program words (program, course, class, ...) that name
//!   a subject rather than an intent.
//! - `dominant`: monetary words (cost, tuition, ...). When a dominant
//!   keyword fires, domains matched only through generic words are dropped —
//!   a cost question about a program is a financial question, not an
//!   academic one.

use crate::domain::Domain;

pub struct KeywordRule {
    pub keyword: &'static str,
    pub domain: Domain,
    pub generic: bool,
    pub dominant: bool,
}

const fn rule(keyword: &'static str, domain: Domain) -> KeywordRule {
    KeywordRule {
        keyword,
        domain,
        generic: false,
        dominant: false,
    }
}

const fn generic(keyword: &'static str, domain: Domain) -> KeywordRule {
    KeywordRule {
        keyword,
        domain,
        generic: true,
        dominant: false,
    }
}

const fn dominant(keyword: &'static str, domain: Domain) -> KeywordRule {
    KeywordRule {
        keyword,
        domain,
        generic: false,
        dominant: true,
    }
}

pub const KEYWORD_RULES: &[KeywordRule] = &[
    // Admissions
    rule("admission", Domain::Admissions),
    rule("apply", Domain::Admissions),
    rule("application", Domain::Admissions),
    rule("requirement", Domain::Admissions),
    rule("prerequisite", Domain::Admissions),
    rule("enroll", Domain::Admissions),
    rule("registration", Domain::Admissions),
    rule("placement", Domain::Admissions),
    rule("transcript", Domain::Admissions),
    // Academics
    generic("program", Domain::Academics),
    generic("course", Domain::Academics),
    generic("class", Domain::Academics),
    generic("degree", Domain::Academics),
    generic("certificate", Domain::Academics),
    rule("curriculum", Domain::Academics),
    rule("major", Domain::Academics),
    rule("academic", Domain::Academics),
    rule("credit", Domain::Academics),
    rule("semester", Domain::Academics),
    rule("quarter", Domain::Academics),
    // Financial aid
    rule("financial", Domain::FinancialAid),
    rule("aid", Domain::FinancialAid),
    rule("scholarship", Domain::FinancialAid),
    rule("grant", Domain::FinancialAid),
    rule("loan", Domain::FinancialAid),
    rule("fafsa", Domain::FinancialAid),
    rule("payment", Domain::FinancialAid),
    dominant("tuition", Domain::FinancialAid),
    dominant("cost", Domain::FinancialAid),
    dominant("fee", Domain::FinancialAid),
    dominant("price", Domain::FinancialAid),
    dominant("afford", Domain::FinancialAid),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    Low,
}

#[derive(Debug, Clone)]
pub struct DomainSelection {
    pub domain: Domain,
    pub confidence: Confidence,
    pub matched: Vec<&'static str>,
}

/// One decision per incoming query; never empty, never persisted.
#[derive(Debug, Clone)]
pub struct RoutingDecision {
    pub domains: Vec<DomainSelection>,
}

impl RoutingDecision {
    pub fn selected(&self) -> Vec<Domain> {
        self.domains.iter().map(|s| s.domain).collect()
    }
}

#[derive(Default)]
struct DomainHits {
    matched: Vec<&'static str>,
    non_generic: bool,
    dominant: bool,
}

/// Classify `text` into a non-empty, fixed-order set of domains.
pub fn classify(text: &str, declared_topic: Option<Domain>) -> RoutingDecision {
    let words: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect();

    let mut hits: [DomainHits; 3] = Default::default();
    let slot = |domain: Domain| -> usize {
        match domain {
            Domain::Admissions => 0,
            Domain::Academics => 1,
            Domain::FinancialAid => 2,
            Domain::General => unreachable!("no rules map to the general domain"),
        }
    };

    for rule in KEYWORD_RULES {
        if words.iter().any(|w| w.starts_with(rule.keyword)) {
            let entry = &mut hits[slot(rule.domain)];
            entry.matched.push(rule.keyword);
            entry.non_generic |= !rule.generic;
            entry.dominant |= rule.dominant;
        }
    }

    let any_dominant = hits.iter().any(|h| h.dominant);

    let mut domains = Vec::new();
    for domain in Domain::AGGREGATION_ORDER {
        let entry = &hits[slot(domain)];
        let declared = declared_topic == Some(domain);
        if entry.matched.is_empty() && !declared {
            continue;
        }
        // Dominant monetary intent drops generic-only matches elsewhere.
        if any_dominant && !entry.dominant && !entry.non_generic && !declared {
            continue;
        }
        let confidence = if declared || entry.non_generic || entry.matched.len() >= 2 {
            Confidence::High
        } else {
            Confidence::Low
        };
        domains.push(DomainSelection {
            domain,
            confidence,
            matched: entry.matched.clone(),
        });
    }

    if declared_topic == Some(Domain::General) || domains.is_empty() {
        domains = vec![DomainSelection {
            domain: Domain::General,
            confidence: Confidence::Low,
            matched: Vec::new(),
        }];
    }

    RoutingDecision { domains }
}

/// Topic tag for a block of source text at indexing time, reusing the same
/// rule table. Ambiguous or untagged text stays corpus-wide (`None`).
pub fn infer_topic(text: &str) -> Option<Domain> {
    let decision = classify(text, None);
    let strong: Vec<&DomainSelection> = decision
        .domains
        .iter()
        .filter(|s| s.domain != Domain::General && s.confidence == Confidence::High)
        .collect();
    match strong.as_slice() {
        [only] => Some(only.domain),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nursing_requirements_routes_to_admissions_and_academics() {
        let decision = classify("What are the requirements for the nursing program?", None);
        assert_eq!(
            decision.selected(),
            vec![Domain::Admissions, Domain::Academics]
        );
    }

    #[test]
    fn test_welding_cost_routes_to_financial_aid_only() {
        let decision = classify("How much does the welding program cost?", None);
        assert_eq!(decision.selected(), vec![Domain::FinancialAid]);
    }

    #[test]
    fn test_unmatched_query_falls_back_to_general() {
        let decision = classify("Where can I park my bicycle?", None);
        assert_eq!(decision.selected(), vec![Domain::General]);
        assert_eq!(decision.domains[0].confidence, Confidence::Low);
    }

    #[test]
    fn test_never_empty() {
        for text in ["", "???", "zzz qqq", "the and or"] {
            assert!(!classify(text, None).domains.is_empty());
        }
    }

    #[test]
    fn test_word_prefix_matching_avoids_substring_hits() {
        // "said" must not match the "aid" keyword.
        let decision = classify("He said hello", None);
        assert_eq!(decision.selected(), vec![Domain::General]);

        // Plural and inflected forms still match.
        let decision = classify("What are the costs?", None);
        assert_eq!(decision.selected(), vec![Domain::FinancialAid]);
    }

    #[test]
    fn test_declared_topic_is_force_included() {
        let decision = classify("Tell me more", Some(Domain::FinancialAid));
        assert_eq!(decision.selected(), vec![Domain::FinancialAid]);
        assert_eq!(decision.domains[0].confidence, Confidence::High);
    }

    #[test]
    fn test_deterministic() {
        let text = "Do I qualify for financial aid for the nursing program?";
        let a = classify(text, None).selected();
        let b = classify(text, None).selected();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fixed_domain_order() {
        let decision = classify(
            "What are the tuition payment requirements to enroll in the nursing curriculum?",
            None,
        );
        let selected = decision.selected();
        assert_eq!(
            selected,
            vec![Domain::Admissions, Domain::Academics, Domain::FinancialAid]
        );
    }

    #[test]
    fn test_infer_topic() {
        assert_eq!(
            infer_topic("Tuition is due at the start of each term and payment plans exist."),
            Some(Domain::FinancialAid)
        );
        // Multiple strong domains: stays corpus-wide.
        assert_eq!(
            infer_topic("Admission requirements and tuition payment for the nursing curriculum."),
            None
        );
        assert_eq!(infer_topic("Campus parking map."), None);
    }
}
