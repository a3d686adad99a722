//! Proposing side of the market.

use super::preferences::PreferenceList;
use super::types::{AgentError, MatchState, Ranked, ResponderId};
use super::Agent;

/// An agent that sends proposals, one per round, in preference order
#[derive(Debug, Clone)]
pub struct Proposer {
    name: String,
    side: String,
    preferences: PreferenceList<ResponderId>,
    state: MatchState<ResponderId>,
    /// Most recent proposal target; `Threshold` once the list is exhausted
    last_proposal: Option<Ranked<ResponderId>>,
}

impl Proposer {
    /// Create a proposer with no preferences and no match
    pub fn new(name: impl Into<String>, side: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            side: side.into(),
            preferences: PreferenceList::default(),
            state: MatchState::Undecided,
            last_proposal: None,
        }
    }

    /// Create a proposer and assign its preferences in one go
    pub fn with_preferences(
        name: impl Into<String>,
        side: impl Into<String>,
        preferences: PreferenceList<ResponderId>,
    ) -> Result<Self, AgentError> {
        let mut proposer = Self::new(name, side);
        proposer.set_preferences(preferences)?;
        Ok(proposer)
    }

    /// Assign the preference list. Lists are immutable once set.
    pub fn set_preferences(&mut self, preferences: PreferenceList<ResponderId>) -> Result<(), AgentError> {
        if self.preferences.is_set() {
            return Err(AgentError::InvalidPreferences {
                agent: self.name.clone(),
                reason: "preferences are already set".to_string(),
            });
        }
        self.preferences = preferences;
        Ok(())
    }

    pub fn last_proposal(&self) -> Option<Ranked<ResponderId>> {
        self.last_proposal
    }

    /// Ranked-acceptable targets, ending with the threshold marker
    pub fn acceptable_to_propose(&self) -> Result<&[Ranked<ResponderId>], AgentError> {
        if !self.preferences.is_set() {
            return Err(AgentError::PreferencesUnset {
                agent: self.name.clone(),
            });
        }
        Ok(self.preferences.acceptable())
    }

    /// Entry following the last proposal in the acceptable prefix.
    ///
    /// Returns the first acceptable entry before any proposal was made, and
    /// [`Ranked::Threshold`] once every acceptable responder has been tried.
    pub fn next_proposal(&self) -> Result<Ranked<ResponderId>, AgentError> {
        let acceptable = self.acceptable_to_propose()?;

        let next = match self.last_proposal {
            None => acceptable.first().copied(),
            Some(Ranked::Threshold) => Some(Ranked::Threshold),
            Some(Ranked::Candidate(responder)) => {
                let position = acceptable
                    .iter()
                    .position(|entry| *entry == Ranked::Candidate(responder))
                    .ok_or_else(|| AgentError::NotRanked {
                        agent: self.name.clone(),
                        peer: responder.to_string(),
                    })?;
                acceptable.get(position + 1).copied()
            }
        };

        // The acceptable prefix always ends with the threshold marker
        Ok(next.unwrap_or(Ranked::Threshold))
    }

    pub(crate) fn record_proposal(&mut self, target: Ranked<ResponderId>) {
        self.last_proposal = Some(target);
    }

    pub(crate) fn engage_with(&mut self, responder: ResponderId) {
        self.state = MatchState::Engaged(responder);
    }

    /// Match this proposer to itself
    pub fn self_match(&mut self) {
        self.state = MatchState::SelfMatched;
    }
}

impl Agent for Proposer {
    type Peer = ResponderId;

    fn name(&self) -> &str {
        &self.name
    }

    fn side(&self) -> &str {
        &self.side
    }

    fn preferences(&self) -> &PreferenceList<ResponderId> {
        &self.preferences
    }

    fn match_state(&self) -> MatchState<ResponderId> {
        self.state
    }

    fn unmatch(&mut self) {
        self.state = MatchState::Undecided;
    }
}
