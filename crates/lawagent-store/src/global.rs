//! Global State: a per-conversation extracted-entity bag kept outside
//! the message stream so it survives window truncation.

use std::collections::{HashMap, HashSet};

use lawagent_core::{LegalDomain, LegalIntent};
use serde::{Deserialize, Serialize};

/// Entities extracted from a query or carried forward from prior turns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entities {
    pub persons: HashSet<String>,
    pub amounts: HashSet<String>,
    pub dates: HashSet<String>,
    pub locations: HashSet<String>,
    pub other: HashMap<String, serde_json::Value>,
}

impl Entities {
    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
            && self.amounts.is_empty()
            && self.dates.is_empty()
            && self.locations.is_empty()
            && self.other.is_empty()
    }

    /// Merge-union: lists deduplicated by value equality, maps merged key
    /// by key, never replacing an existing value with nothing.
    fn merge(&mut self, other: Entities) {
        self.persons.extend(other.persons);
        self.amounts.extend(other.amounts);
        self.dates.extend(other.dates);
        self.locations.extend(other.locations);
        self.other.extend(other.other);
    }
}

/// Per-conversation state: the current domain/intent classification plus
/// accumulated entities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalState {
    pub domain: Option<LegalDomain>,
    pub intent: Option<LegalIntent>,
    pub entities: Entities,
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field-wise merge. `domain`/`intent` are replaced only when `Some`;
    /// `entities` always merge-union. Never replaces non-empty state with
    /// empty, so applying the same update twice is a no-op the second time.
    pub fn update(&mut self, domain: Option<LegalDomain>, intent: Option<LegalIntent>, entities: Option<Entities>) {
        if let Some(d) = domain {
            self.domain = Some(d);
        }
        if let Some(i) = intent {
            self.intent = Some(i);
        }
        if let Some(e) = entities {
            self.entities.merge(e);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// A human-readable block used as LLM context.
    pub fn to_context_string(&self) -> String {
        if self.domain.is_none() && self.intent.is_none() && self.entities.is_empty() {
            return String::new();
        }

        let mut lines = Vec::new();
        if let Some(d) = self.domain {
            lines.push(format!("领域: {d}"));
        }
        if let Some(i) = self.intent {
            lines.push(format!("意图: {i}"));
        }
        if !self.entities.persons.is_empty() {
            lines.push(format!("当事人: {}", join_sorted(&self.entities.persons)));
        }
        if !self.entities.amounts.is_empty() {
            lines.push(format!("金额: {}", join_sorted(&self.entities.amounts)));
        }
        if !self.entities.dates.is_empty() {
            lines.push(format!("日期: {}", join_sorted(&self.entities.dates)));
        }
        if !self.entities.locations.is_empty() {
            lines.push(format!("地点: {}", join_sorted(&self.entities.locations)));
        }
        for (key, value) in &self.entities.other {
            lines.push(format!("{key}: {value}"));
        }

        lines.join("\n")
    }
}

fn join_sorted(set: &HashSet<String>) -> String {
    let mut items: Vec<&String> = set.iter().collect();
    items.sort();
    items
        .into_iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities_with_location(loc: &str) -> Entities {
        let mut e = Entities::default();
        e.locations.insert(loc.to_string());
        e
    }

    #[test]
    fn update_merges_entities_without_losing_prior_state() {
        let mut state = GlobalState::new();
        state.update(Some(LegalDomain::Labor), None, Some(entities_with_location("深圳")));
        state.update(None, Some(LegalIntent::QaRetrieval), Some(entities_with_location("北京")));

        assert_eq!(state.domain, Some(LegalDomain::Labor));
        assert_eq!(state.intent, Some(LegalIntent::QaRetrieval));
        assert!(state.entities.locations.contains("深圳"));
        assert!(state.entities.locations.contains("北京"));
    }

    #[test]
    fn update_is_idempotent() {
        let mut once = GlobalState::new();
        let entities = entities_with_location("上海");
        once.update(Some(LegalDomain::Family), Some(LegalIntent::Clarification), Some(entities.clone()));

        let mut twice = once.clone();
        twice.update(Some(LegalDomain::Family), Some(LegalIntent::Clarification), Some(entities));

        assert_eq!(once.domain, twice.domain);
        assert_eq!(once.intent, twice.intent);
        assert_eq!(once.entities.locations, twice.entities.locations);
    }

    #[test]
    fn empty_update_never_clears_existing_state() {
        let mut state = GlobalState::new();
        state.update(Some(LegalDomain::Corporate), None, Some(entities_with_location("广州")));
        state.update(None, None, None);
        assert_eq!(state.domain, Some(LegalDomain::Corporate));
        assert!(state.entities.locations.contains("广州"));
    }

    #[test]
    fn to_context_string_empty_when_no_state() {
        let state = GlobalState::new();
        assert_eq!(state.to_context_string(), "");
    }

    #[test]
    fn to_context_string_contains_fields_present() {
        let mut state = GlobalState::new();
        state.update(Some(LegalDomain::Labor), None, Some(entities_with_location("深圳")));
        let text = state.to_context_string();
        assert!(text.contains("深圳"));
        assert!(text.contains("领域"));
    }
}
