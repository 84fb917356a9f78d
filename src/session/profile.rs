// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Derived student profile.
//!
//! Accumulated from interactions, never entered directly: topic counts from
//! routing decisions, program names lifted from queries. Feeds the compact
//! context summary specialists fold into their prompts.

use crate::domain::Domain;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MAX_PROGRAMS_TRACKED: usize = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentProfile {
    /// Interactions per routed domain.
    pub topic_counts: BTreeMap<Domain, u32>,
    /// Programs the student has asked about, most recent last.
    pub programs_mentioned: Vec<String>,
    pub questions_asked: u32,
}

impl StudentProfile {
    pub fn observe(&mut self, query: &str, domains: &[Domain]) {
        self.questions_asked += 1;
        for domain in domains {
            *self.topic_counts.entry(*domain).or_insert(0) += 1;
        }
        for program in extract_program_names(query) {
            self.programs_mentioned.retain(|p| p != &program);
            self.programs_mentioned.push(program);
        }
        if self.programs_mentioned.len() > MAX_PROGRAMS_TRACKED {
            let excess = self.programs_mentioned.len() - MAX_PROGRAMS_TRACKED;
            self.programs_mentioned.drain(..excess);
        }
    }

    /// Compact one-line summary, or `None` when there is nothing to say.
    pub fn context_summary(&self) -> Option<String> {
        if self.questions_asked == 0 {
            return None;
        }
        let mut parts = Vec::new();

        if !self.topic_counts.is_empty() {
            let topics: Vec<String> = self
                .topic_counts
                .iter()
                .map(|(domain, count)| format!("{} ({})", domain, count))
                .collect();
            parts.push(format!("topics asked about: {}", topics.join(", ")));
        }
        if !self.programs_mentioned.is_empty() {
            let recent: Vec<&str> = self
                .programs_mentioned
                .iter()
                .rev()
                .take(3)
                .map(String::as_str)
                .collect();
            parts.push(format!("programs of interest: {}", recent.join(", ")));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }
}

/// Words immediately preceding "program"/"certificate"/"degree" name the
/// program ("the nursing program" -> "nursing").
fn extract_program_names(query: &str) -> Vec<String> {
    let words: Vec<String> = query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();

    let mut names = Vec::new();
    for window in words.windows(2) {
        let (name, marker) = (&window[0], &window[1]);
        if matches!(marker.as_str(), "program" | "certificate" | "degree")
            && !matches!(name.as_str(), "the" | "a" | "an" | "this" | "that" | "which" | "what")
        {
            names.push(name.clone());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_extraction() {
        assert_eq!(
            extract_program_names("How much does the welding program cost?"),
            vec!["welding".to_string()]
        );
        assert!(extract_program_names("Which program is best?").is_empty());
    }

    #[test]
    fn test_profile_accumulation() {
        let mut profile = StudentProfile::default();
        assert!(profile.context_summary().is_none());

        profile.observe(
            "What are the requirements for the nursing program?",
            &[Domain::Admissions, Domain::Academics],
        );
        profile.observe(
            "How much does the nursing program cost?",
            &[Domain::FinancialAid],
        );

        assert_eq!(profile.questions_asked, 2);
        assert_eq!(profile.topic_counts[&Domain::Admissions], 1);
        assert_eq!(profile.topic_counts[&Domain::FinancialAid], 1);
        assert_eq!(profile.programs_mentioned, vec!["nursing".to_string()]);

        let summary = profile.context_summary().unwrap();
        assert!(summary.contains("nursing"));
        assert!(summary.contains("admissions"));
    }

    #[test]
    fn test_programs_tracked_bounded() {
        let mut profile = StudentProfile::default();
        for i in 0..20 {
            profile.observe(&format!("cost of the subject{} program", i), &[Domain::General]);
        }
        assert!(profile.programs_mentioned.len() <= MAX_PROGRAMS_TRACKED);
    }
}
