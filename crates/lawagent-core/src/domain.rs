//! Closed taxonomy enums and the agent state machine.

use serde::{Deserialize, Serialize};

/// The legal domain a query has been routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalDomain {
    Labor,
    Family,
    Contract,
    Corporate,
    Criminal,
    Procedural,
    NonLegal,
}

impl LegalDomain {
    pub const ALL: [LegalDomain; 7] = [
        LegalDomain::Labor,
        LegalDomain::Family,
        LegalDomain::Contract,
        LegalDomain::Corporate,
        LegalDomain::Criminal,
        LegalDomain::Procedural,
        LegalDomain::NonLegal,
    ];

    /// Parse a free-text label (case-insensitive, underscore/space
    /// normalized) into a domain, e.g. from an LLM's JSON reply.
    pub fn parse_label(label: &str) -> Option<Self> {
        let norm = normalize_label(label);
        Some(match norm.as_str() {
            "labor" | "laboremployment" | "employment" => LegalDomain::Labor,
            "family" | "marriage" | "divorce" => LegalDomain::Family,
            "contract" | "contracts" => LegalDomain::Contract,
            "corporate" | "company" | "business" => LegalDomain::Corporate,
            "criminal" => LegalDomain::Criminal,
            "procedural" | "litigation" | "procedure" => LegalDomain::Procedural,
            "nonlegal" | "none" | "other" | "general" => LegalDomain::NonLegal,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LegalDomain::Labor => "labor",
            LegalDomain::Family => "family",
            LegalDomain::Contract => "contract",
            LegalDomain::Corporate => "corporate",
            LegalDomain::Criminal => "criminal",
            LegalDomain::Procedural => "procedural",
            LegalDomain::NonLegal => "non_legal",
        }
    }
}

impl std::fmt::Display for LegalDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The intent classification for a query, orthogonal to domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalIntent {
    QaRetrieval,
    CaseAnalysis,
    DocDrafting,
    Calculation,
    ReviewContract,
    Clarification,
}

impl LegalIntent {
    pub fn parse_label(label: &str) -> Option<Self> {
        let norm = normalize_label(label);
        Some(match norm.as_str() {
            "qaretrieval" | "qa" | "retrieval" | "question" => LegalIntent::QaRetrieval,
            "caseanalysis" | "analysis" | "case" => LegalIntent::CaseAnalysis,
            "docdrafting" | "drafting" | "draft" | "document" => LegalIntent::DocDrafting,
            "calculation" | "calculate" | "compute" => LegalIntent::Calculation,
            "reviewcontract" | "review" | "contractreview" => LegalIntent::ReviewContract,
            "clarification" | "clarify" => LegalIntent::Clarification,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LegalIntent::QaRetrieval => "qa_retrieval",
            LegalIntent::CaseAnalysis => "case_analysis",
            LegalIntent::DocDrafting => "doc_drafting",
            LegalIntent::Calculation => "calculation",
            LegalIntent::ReviewContract => "review_contract",
            LegalIntent::Clarification => "clarification",
        }
    }

    /// Default `max_steps` for a ToolCall loop running this intent, ranging
    /// 5-10 depending on how open-ended the intent tends to be.
    pub fn default_max_steps(&self) -> usize {
        match self {
            LegalIntent::QaRetrieval => 6,
            LegalIntent::CaseAnalysis => 8,
            LegalIntent::DocDrafting => 5,
            LegalIntent::Calculation => 5,
            LegalIntent::ReviewContract => 10,
            LegalIntent::Clarification => 5,
        }
    }
}

impl std::fmt::Display for LegalIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn normalize_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Per-`run` agent lifecycle state. `run` must restore `Idle` before
/// returning regardless of which terminal state it passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Idle,
    Running,
    Finished,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_label_parsing_is_case_and_separator_insensitive() {
        assert_eq!(LegalDomain::parse_label("Labor"), Some(LegalDomain::Labor));
        assert_eq!(LegalDomain::parse_label("non_legal"), Some(LegalDomain::NonLegal));
        assert_eq!(LegalDomain::parse_label("  Family "), Some(LegalDomain::Family));
        assert_eq!(LegalDomain::parse_label("xyz"), None);
    }

    #[test]
    fn intent_default_steps_stay_within_bounds() {
        for intent in [
            LegalIntent::QaRetrieval,
            LegalIntent::CaseAnalysis,
            LegalIntent::DocDrafting,
            LegalIntent::Calculation,
            LegalIntent::ReviewContract,
            LegalIntent::Clarification,
        ] {
            let steps = intent.default_max_steps();
            assert!((5..=10).contains(&steps));
        }
    }
}
