//! Responding side of the market.

use super::preferences::PreferenceList;
use super::types::{AgentError, MatchState, ProposerId};
use super::Agent;

/// An agent that holds on to its best acceptable proposal so far
#[derive(Debug, Clone)]
pub struct Responder {
    name: String,
    side: String,
    preferences: PreferenceList<ProposerId>,
    state: MatchState<ProposerId>,
    /// Proposals received this round, not yet answered
    current_proposals: Vec<ProposerId>,
}

impl Responder {
    /// Create a responder with no preferences and no match
    pub fn new(name: impl Into<String>, side: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            side: side.into(),
            preferences: PreferenceList::default(),
            state: MatchState::Undecided,
            current_proposals: Vec::new(),
        }
    }

    /// Create a responder and assign its preferences in one go
    pub fn with_preferences(
        name: impl Into<String>,
        side: impl Into<String>,
        preferences: PreferenceList<ProposerId>,
    ) -> Result<Self, AgentError> {
        let mut responder = Self::new(name, side);
        responder.set_preferences(preferences)?;
        Ok(responder)
    }

    /// Assign the preference list. Lists are immutable once set.
    pub fn set_preferences(&mut self, preferences: PreferenceList<ProposerId>) -> Result<(), AgentError> {
        if self.preferences.is_set() {
            return Err(AgentError::InvalidPreferences {
                agent: self.name.clone(),
                reason: "preferences are already set".to_string(),
            });
        }
        self.preferences = preferences;
        Ok(())
    }

    pub fn current_proposals(&self) -> &[ProposerId] {
        &self.current_proposals
    }

    /// True while proposals from this round are pending
    pub fn awaiting_response(&self) -> bool {
        !self.current_proposals.is_empty()
    }

    pub(crate) fn receive(&mut self, proposer: ProposerId) {
        self.current_proposals.push(proposer);
    }

    /// Pending proposals this responder finds acceptable
    pub fn acceptable_proposals(&self) -> Result<Vec<ProposerId>, AgentError> {
        let mut acceptable = Vec::with_capacity(self.current_proposals.len());
        for &proposer in &self.current_proposals {
            if self.is_acceptable(proposer)? {
                acceptable.push(proposer);
            }
        }
        Ok(acceptable)
    }

    /// Most preferred of `candidates`, `None` if there are none
    pub fn most_preferred(&self, candidates: &[ProposerId]) -> Result<Option<ProposerId>, AgentError> {
        if !self.preferences.is_set() {
            return Err(AgentError::PreferencesUnset {
                agent: self.name.clone(),
            });
        }

        let mut best: Option<(usize, ProposerId)> = None;
        for &candidate in candidates {
            let rank = self.preferences.rank_of(candidate).ok_or_else(|| AgentError::NotRanked {
                agent: self.name.clone(),
                peer: candidate.to_string(),
            })?;
            if best.map_or(true, |(best_rank, _)| rank < best_rank) {
                best = Some((rank, candidate));
            }
        }
        Ok(best.map(|(_, proposer)| proposer))
    }

    /// Answer this round's proposals.
    ///
    /// Returns the proposer to engage with when it differs from the current
    /// partner. Pending proposals are cleared in every case.
    pub fn respond(&mut self) -> Result<Option<ProposerId>, AgentError> {
        let acceptable = self.acceptable_proposals();
        self.current_proposals.clear();
        let mut acceptable = acceptable?;

        if acceptable.is_empty() {
            return Ok(None);
        }

        match self.state {
            MatchState::Engaged(current) => {
                acceptable.push(current);
                let best = self.most_preferred(&acceptable)?;
                Ok(best.filter(|&proposer| proposer != current))
            }
            MatchState::Undecided | MatchState::SelfMatched => self.most_preferred(&acceptable),
        }
    }

    pub(crate) fn engage_with(&mut self, proposer: ProposerId) {
        self.state = MatchState::Engaged(proposer);
    }

    /// Match this responder to itself
    pub fn self_match(&mut self) {
        self.state = MatchState::SelfMatched;
    }
}

impl Agent for Responder {
    type Peer = ProposerId;

    fn name(&self) -> &str {
        &self.name
    }

    fn side(&self) -> &str {
        &self.side
    }

    fn preferences(&self) -> &PreferenceList<ProposerId> {
        &self.preferences
    }

    fn match_state(&self) -> MatchState<ProposerId> {
        self.state
    }

    fn unmatch(&mut self) {
        self.state = MatchState::Undecided;
    }
}
