//! Handle, ranking and match-state types shared by proposers and responders.
//!
//! Agents never hold references to each other. A proposer refers to a
//! responder through a [`ResponderId`] and a responder to a proposer through a
//! [`ProposerId`]; both are indices into the arenas owned by
//! [`Engine`](crate::engine::Engine).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a proposer inside an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProposerId(pub usize);

/// Index of a responder inside an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResponderId(pub usize);

impl ProposerId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl ResponderId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ProposerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proposer #{}", self.0)
    }
}

impl fmt::Display for ResponderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "responder #{}", self.0)
    }
}

/// One entry of a preference list.
///
/// `Threshold` is the agent's own position in its ranking: every candidate
/// ranked before it is acceptable, every candidate after it is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ranked<T> {
    Candidate(T),
    Threshold,
}

impl<T: Copy> Ranked<T> {
    /// Returns the candidate, or `None` for the threshold marker
    pub fn candidate(self) -> Option<T> {
        match self {
            Ranked::Candidate(peer) => Some(peer),
            Ranked::Threshold => None,
        }
    }

    pub fn is_threshold(self) -> bool {
        matches!(self, Ranked::Threshold)
    }
}

/// Current match of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchState<T> {
    /// Not yet decided
    #[default]
    Undecided,
    /// Engaged to an agent of the other side
    Engaged(T),
    /// Deliberately unmatched
    SelfMatched,
}

impl<T: Copy> MatchState<T> {
    /// True for an engagement or a self-match
    pub fn is_matched(self) -> bool {
        !matches!(self, MatchState::Undecided)
    }

    pub fn is_self_matched(self) -> bool {
        matches!(self, MatchState::SelfMatched)
    }

    /// Returns the engaged partner, if any
    pub fn partner(self) -> Option<T> {
        match self {
            MatchState::Engaged(peer) => Some(peer),
            _ => None,
        }
    }

    /// Transform the engaged partner, keeping the state otherwise
    pub fn map_partner<U>(self, f: impl FnOnce(T) -> U) -> MatchState<U> {
        match self {
            MatchState::Undecided => MatchState::Undecided,
            MatchState::Engaged(peer) => MatchState::Engaged(f(peer)),
            MatchState::SelfMatched => MatchState::SelfMatched,
        }
    }
}

/// Contract violations raised by the agent model.
///
/// These indicate a construction bug upstream, never a data problem, and are
/// kept distinct from an ordinary "unacceptable" (`false`) answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    #[error("{peer} is not ranked by {agent}")]
    NotRanked { agent: String, peer: String },

    #[error("preferences of {agent} are not set")]
    PreferencesUnset { agent: String },

    #[error("is_matched of {agent} can only be set to false")]
    ForcedMatch { agent: String },

    #[error("invalid preferences for {agent}: {reason}")]
    InvalidPreferences { agent: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_state_flags() {
        let undecided: MatchState<ResponderId> = MatchState::default();
        assert!(!undecided.is_matched());
        assert_eq!(undecided.partner(), None);

        let engaged = MatchState::Engaged(ResponderId(2));
        assert!(engaged.is_matched());
        assert!(!engaged.is_self_matched());
        assert_eq!(engaged.partner(), Some(ResponderId(2)));

        let single: MatchState<ResponderId> = MatchState::SelfMatched;
        assert!(single.is_matched());
        assert!(single.is_self_matched());
        assert_eq!(single.partner(), None);
    }

    #[test]
    fn test_ranked_candidate() {
        assert_eq!(Ranked::Candidate(ProposerId(1)).candidate(), Some(ProposerId(1)));
        assert_eq!(Ranked::<ProposerId>::Threshold.candidate(), None);
        assert!(Ranked::<ProposerId>::Threshold.is_threshold());
    }

    #[test]
    fn test_error_messages() {
        let err = AgentError::NotRanked {
            agent: "alice".to_string(),
            peer: ResponderId(3).to_string(),
        };
        assert_eq!(err.to_string(), "responder #3 is not ranked by alice");
    }
}
