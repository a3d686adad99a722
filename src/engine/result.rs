//! Output records of a matching run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Final outcome of a deferred-acceptance run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingResult {
    /// Number of full propose/respond rounds executed
    pub rounds: usize,
    /// Proposer name -> responder name, mutual engagements only
    pub matches: BTreeMap<String, String>,
    /// Agents left without any match (empty after finalization)
    pub unmatched: Vec<String>,
    /// Agents matched to themselves
    pub self_matches: Vec<String>,
    /// True iff `unmatched` and `self_matches` are both empty
    pub all_matched: bool,
}

impl MatchingResult {
    /// Responder matched to `proposer`, if any
    pub fn partner_of(&self, proposer: &str) -> Option<&str> {
        self.matches.get(proposer).map(String::as_str)
    }

    pub fn is_self_matched(&self, name: &str) -> bool {
        self.self_matches.iter().any(|n| n == name)
    }
}

/// A proposer/responder pair taking part in a round event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProposalAction {
    pub proposer: String,
    pub responder: String,
}

impl ProposalAction {
    pub fn new(proposer: impl Into<String>, responder: impl Into<String>) -> Self {
        Self {
            proposer: proposer.into(),
            responder: responder.into(),
        }
    }
}

/// Snapshot of a single propose/respond round
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundStep {
    /// 1-based round number
    pub round: usize,
    /// Proposals sent this round
    pub proposals: Vec<ProposalAction>,
    /// Proposers who proposed this round and are unmatched after responses
    pub rejections: Vec<ProposalAction>,
    /// Every engagement standing after this round
    pub tentative_matches: Vec<ProposalAction>,
    /// Proposers that exhausted their acceptable responders this round
    pub self_matches: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partner_lookup() {
        let mut matches = BTreeMap::new();
        matches.insert("alice".to_string(), "bob".to_string());
        let result = MatchingResult {
            rounds: 1,
            matches,
            unmatched: Vec::new(),
            self_matches: vec!["dave".to_string()],
            all_matched: false,
        };

        assert_eq!(result.partner_of("alice"), Some("bob"));
        assert_eq!(result.partner_of("dave"), None);
        assert!(result.is_self_matched("dave"));
        assert!(!result.is_self_matched("alice"));
    }

    #[test]
    fn test_round_step_json_shape() {
        let step = RoundStep {
            round: 2,
            proposals: vec![ProposalAction::new("B", "Y")],
            rejections: Vec::new(),
            tentative_matches: vec![ProposalAction::new("A", "X"), ProposalAction::new("B", "Y")],
            self_matches: Vec::new(),
        };

        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["round"], 2);
        assert_eq!(json["proposals"][0]["proposer"], "B");
        assert_eq!(json["tentative_matches"].as_array().unwrap().len(), 2);
    }
}
