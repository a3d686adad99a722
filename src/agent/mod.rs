//! Agent model: proposers, responders and their preference lists.

pub mod preferences;
pub mod proposer;
pub mod responder;
pub mod types;

use std::fmt;
use std::hash::Hash;

pub use preferences::PreferenceList;
pub use proposer::Proposer;
pub use responder::Responder;
pub use types::{AgentError, MatchState, ProposerId, Ranked, ResponderId};

/// Capabilities shared by both sides of the market.
///
/// Proposers and responders are separate concrete types; this trait only
/// covers naming, preferences and the match state.
pub trait Agent {
    /// Handle type of the opposite side
    type Peer: Copy + Eq + Hash + fmt::Display;

    fn name(&self) -> &str;

    /// Label of the group this agent belongs to
    fn side(&self) -> &str;

    fn preferences(&self) -> &PreferenceList<Self::Peer>;

    fn match_state(&self) -> MatchState<Self::Peer>;

    /// Clear the match back to undecided
    fn unmatch(&mut self);

    /// True when engaged or self-matched
    fn is_matched(&self) -> bool {
        self.match_state().is_matched()
    }

    /// Setting `false` clears the match. Setting `true` is refused: matches
    /// are only made by engaging two agents.
    fn set_matched(&mut self, matched: bool) -> Result<(), AgentError> {
        if matched {
            return Err(AgentError::ForcedMatch {
                agent: self.name().to_string(),
            });
        }
        self.unmatch();
        Ok(())
    }

    /// Whether `peer` ranks at or above this agent's threshold
    fn is_acceptable(&self, peer: Self::Peer) -> Result<bool, AgentError> {
        let preferences = self.preferences();
        if !preferences.is_set() {
            return Err(AgentError::PreferencesUnset {
                agent: self.name().to_string(),
            });
        }
        preferences.is_acceptable(peer).ok_or_else(|| AgentError::NotRanked {
            agent: self.name().to_string(),
            peer: peer.to_string(),
        })
    }

    /// Whether the current match is acceptable to this agent.
    ///
    /// Undecided agents and self-matches trivially pass.
    fn accepts_match(&self) -> Result<bool, AgentError> {
        match self.match_state() {
            MatchState::Engaged(peer) => self.is_acceptable(peer),
            MatchState::Undecided | MatchState::SelfMatched => Ok(true),
        }
    }
}
