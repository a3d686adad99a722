//! Deferred-acceptance matching engine.
//!
//! ## Rounds
//!
//! Each round runs two phases separated by a barrier:
//!
//! 1. **Propose**: every undecided proposer proposes to the next acceptable
//!    responder on its list, or matches itself once the list is exhausted.
//! 2. **Respond**: every responder holding proposals keeps the most preferred
//!    acceptable one among them and its current partner, releasing the rest.
//!
//! The loop stops once every proposer is engaged or self-matched. Responders
//! still undecided at that point are self-matched during finalization.
//!
//! The outcome is the proposer-optimal stable matching. Each proposer
//! proposes to each responder at most once, so a run takes at most
//! `proposers * responders + 1` rounds.
//!
//! ## Example
//!
//! ```
//! use gale_shapley::matching::{build_engine, PreferenceMap};
//!
//! let mut proposers = PreferenceMap::new();
//! proposers.insert("alice".to_string(), vec!["bob".to_string(), "charlie".to_string()]);
//! proposers.insert("dave".to_string(), vec!["charlie".to_string(), "bob".to_string()]);
//!
//! let mut responders = PreferenceMap::new();
//! responders.insert("bob".to_string(), vec!["alice".to_string(), "dave".to_string()]);
//! responders.insert("charlie".to_string(), vec!["dave".to_string(), "alice".to_string()]);
//!
//! let mut engine = build_engine(&proposers, &responders).unwrap();
//! let result = engine.run().unwrap();
//!
//! assert_eq!(result.rounds, 1);
//! assert_eq!(result.partner_of("alice"), Some("bob"));
//! assert!(result.all_matched);
//! ```

pub mod result;

pub use result::{MatchingResult, ProposalAction, RoundStep};

use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::agent::{Agent, AgentError, MatchState, Proposer, ProposerId, Ranked, Responder, ResponderId};

/// Where the engine is in its round cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    NotStarted,
    Proposing,
    Responding,
    Terminated,
}

/// Proposals sent during one propose phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposeOutcome {
    pub proposals: Vec<(ProposerId, ResponderId)>,
    pub self_matched: Vec<ProposerId>,
}

/// Owns both sides of the market and runs deferred acceptance over them
#[derive(Debug, Clone)]
pub struct Engine {
    proposers: Vec<Proposer>,
    responders: Vec<Responder>,
    round: usize,
    phase: Phase,
}

/// Ensure every candidate handle points inside the opposite arena
fn check_peer_handles<A: Agent>(
    agents: &[A],
    peers: usize,
    index: fn(A::Peer) -> usize,
) -> Result<(), AgentError> {
    for agent in agents {
        let dangling = agent
            .preferences()
            .entries()
            .iter()
            .filter_map(|entry| entry.candidate())
            .find(|&peer| index(peer) >= peers);

        if let Some(peer) = dangling {
            return Err(AgentError::InvalidPreferences {
                agent: agent.name().to_string(),
                reason: format!("{} does not exist", peer),
            });
        }
    }
    Ok(())
}

impl Engine {
    /// Take ownership of both sides.
    ///
    /// Fails if a preference list refers to an agent outside the given sets.
    pub fn new(proposers: Vec<Proposer>, responders: Vec<Responder>) -> Result<Self, AgentError> {
        check_peer_handles(&proposers, responders.len(), ResponderId::index)?;
        check_peer_handles(&responders, proposers.len(), ProposerId::index)?;

        Ok(Self {
            proposers,
            responders,
            round: 0,
            phase: Phase::NotStarted,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn proposers(&self) -> &[Proposer] {
        &self.proposers
    }

    pub fn responders(&self) -> &[Responder] {
        &self.responders
    }

    /// # Panics
    /// If `id` does not belong to this engine
    pub fn proposer(&self, id: ProposerId) -> &Proposer {
        &self.proposers[id.index()]
    }

    /// # Panics
    /// If `id` does not belong to this engine
    pub fn responder(&self, id: ResponderId) -> &Responder {
        &self.responders[id.index()]
    }

    pub fn proposer_id(&self, name: &str) -> Option<ProposerId> {
        self.proposers.iter().position(|p| p.name() == name).map(ProposerId)
    }

    pub fn responder_id(&self, name: &str) -> Option<ResponderId> {
        self.responders.iter().position(|r| r.name() == name).map(ResponderId)
    }

    /// Completed rounds
    pub fn round(&self) -> usize {
        self.round
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::Terminated
    }

    /// Proposers without a match, self-matches excluded
    pub fn unmatched_proposers(&self) -> Vec<ProposerId> {
        self.proposers
            .iter()
            .enumerate()
            .filter(|(_, proposer)| !proposer.is_matched())
            .map(|(index, _)| ProposerId(index))
            .collect()
    }

    /// True once every proposer is engaged or self-matched
    pub fn all_proposers_matched(&self) -> bool {
        self.proposers.iter().all(|proposer| proposer.is_matched())
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Engage `proposer` and `responder` to each other.
    ///
    /// Any previous partner of either agent that still points back is
    /// released to undecided.
    ///
    /// # Panics
    /// If either handle does not belong to this engine
    pub fn engage(&mut self, proposer: ProposerId, responder: ResponderId) {
        if let Some(previous) = self.responders[responder.index()].match_state().partner() {
            let jilted = &mut self.proposers[previous.index()];
            if previous != proposer && jilted.match_state() == MatchState::Engaged(responder) {
                debug!("{} releases {}", self.responders[responder.index()].name(), jilted.name());
                jilted.unmatch();
            }
        }

        if let Some(previous) = self.proposers[proposer.index()].match_state().partner() {
            let left = &mut self.responders[previous.index()];
            if previous != responder && left.match_state() == MatchState::Engaged(proposer) {
                left.unmatch();
            }
        }

        self.proposers[proposer.index()].engage_with(responder);
        self.responders[responder.index()].engage_with(proposer);
    }

    /// Self-match a proposer, releasing its partner if it had one
    pub fn self_match_proposer(&mut self, proposer: ProposerId) {
        if let Some(previous) = self.proposers[proposer.index()].match_state().partner() {
            let left = &mut self.responders[previous.index()];
            if left.match_state() == MatchState::Engaged(proposer) {
                left.unmatch();
            }
        }
        self.proposers[proposer.index()].self_match();
    }

    /// Self-match a responder, releasing its partner if it had one
    pub fn self_match_responder(&mut self, responder: ResponderId) {
        if let Some(previous) = self.responders[responder.index()].match_state().partner() {
            let left = &mut self.proposers[previous.index()];
            if left.match_state() == MatchState::Engaged(responder) {
                left.unmatch();
            }
        }
        self.responders[responder.index()].self_match();
    }

    // ========================================================================
    // Algorithm
    // ========================================================================

    /// Phase 1: every undecided proposer makes exactly one proposal.
    ///
    /// The set of proposers is fixed at phase start. A proposer whose
    /// acceptable responders are exhausted matches itself instead.
    pub fn proposers_propose(&mut self) -> Result<ProposeOutcome, AgentError> {
        self.phase = Phase::Proposing;
        let mut outcome = ProposeOutcome::default();

        for id in self.unmatched_proposers() {
            let proposer = &mut self.proposers[id.index()];
            let target = proposer.next_proposal()?;
            proposer.record_proposal(target);

            match target {
                Ranked::Threshold => {
                    proposer.self_match();
                    outcome.self_matched.push(id);
                }
                Ranked::Candidate(responder) => {
                    self.responders[responder.index()].receive(id);
                    outcome.proposals.push((id, responder));
                }
            }
        }

        Ok(outcome)
    }

    /// Phase 2: every responder holding proposals answers them
    pub fn responders_respond(&mut self) -> Result<(), AgentError> {
        self.phase = Phase::Responding;

        for index in 0..self.responders.len() {
            if !self.responders[index].awaiting_response() {
                continue;
            }
            if let Some(proposer) = self.responders[index].respond()? {
                self.engage(proposer, ResponderId(index));
            }
        }

        Ok(())
    }

    /// Run one full round.
    ///
    /// Returns `None` without doing anything once every proposer is matched.
    pub fn step(&mut self) -> Result<Option<RoundStep>, AgentError> {
        if self.all_proposers_matched() {
            return Ok(None);
        }

        let mut was_undecided = vec![false; self.proposers.len()];
        for id in self.unmatched_proposers() {
            was_undecided[id.index()] = true;
        }

        let outcome = self.proposers_propose()?;
        self.responders_respond()?;
        self.round += 1;

        let mut step = RoundStep {
            round: self.round,
            proposals: outcome
                .proposals
                .iter()
                .map(|&(proposer, responder)| self.action(proposer, responder))
                .collect(),
            self_matches: outcome
                .self_matched
                .iter()
                .map(|&proposer| self.proposer(proposer).name().to_string())
                .collect(),
            ..RoundStep::default()
        };

        for (index, proposer) in self.proposers.iter().enumerate() {
            match proposer.match_state() {
                MatchState::Engaged(responder) => {
                    step.tentative_matches.push(self.action(ProposerId(index), responder));
                }
                MatchState::Undecided if was_undecided[index] => {
                    if let Some(Ranked::Candidate(responder)) = proposer.last_proposal() {
                        step.rejections.push(self.action(ProposerId(index), responder));
                    }
                }
                _ => {}
            }
        }

        debug!(
            "Round {}: {} proposals, {} rejections, {} self-matches, {} engaged",
            step.round,
            step.proposals.len(),
            step.rejections.len(),
            step.self_matches.len(),
            step.tentative_matches.len()
        );

        Ok(Some(step))
    }

    /// Self-match every responder that is still undecided
    pub fn finalize(&mut self) {
        for responder in &mut self.responders {
            if !responder.is_matched() {
                responder.self_match();
            }
        }
        self.phase = Phase::Terminated;
    }

    /// Run rounds until every proposer is matched, then finalize
    pub fn run(&mut self) -> Result<MatchingResult, AgentError> {
        self.run_with_steps().map(|(_, result)| result)
    }

    /// Like [`Engine::run`], also returning a snapshot of every round
    pub fn run_with_steps(&mut self) -> Result<(Vec<RoundStep>, MatchingResult), AgentError> {
        info!(
            "Running deferred acceptance: {} proposers, {} responders",
            self.proposers.len(),
            self.responders.len()
        );

        let mut steps = Vec::new();
        while let Some(step) = self.step()? {
            steps.push(step);
        }
        self.finalize();

        info!("Algorithm terminated after {} rounds", self.round);
        Ok((steps, self.result()))
    }

    /// Summarise the current match states
    pub fn result(&self) -> MatchingResult {
        let mut matches = BTreeMap::new();
        let mut unmatched = Vec::new();
        let mut self_matches = Vec::new();

        for (index, proposer) in self.proposers.iter().enumerate() {
            match proposer.match_state() {
                MatchState::Undecided => unmatched.push(proposer.name().to_string()),
                MatchState::SelfMatched => self_matches.push(proposer.name().to_string()),
                MatchState::Engaged(responder) => {
                    let responder = self.responder(responder);
                    if responder.match_state() == MatchState::Engaged(ProposerId(index)) {
                        matches.insert(proposer.name().to_string(), responder.name().to_string());
                    }
                }
            }
        }

        for responder in &self.responders {
            match responder.match_state() {
                MatchState::Undecided => unmatched.push(responder.name().to_string()),
                MatchState::SelfMatched => self_matches.push(responder.name().to_string()),
                MatchState::Engaged(_) => {}
            }
        }

        let all_matched = unmatched.is_empty() && self_matches.is_empty();
        MatchingResult {
            rounds: self.round,
            matches,
            unmatched,
            self_matches,
            all_matched,
        }
    }

    fn action(&self, proposer: ProposerId, responder: ResponderId) -> ProposalAction {
        ProposalAction::new(self.proposer(proposer).name(), self.responder(responder).name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::PreferenceList;

    fn proposer(name: &str, acceptable: &[usize], unacceptable: &[usize]) -> Proposer {
        let prefs = PreferenceList::from_parts(
            acceptable.iter().copied().map(ResponderId).collect(),
            unacceptable.iter().copied().map(ResponderId).collect(),
        )
        .unwrap();
        Proposer::with_preferences(name, "proposer", prefs).unwrap()
    }

    fn responder(name: &str, acceptable: &[usize], unacceptable: &[usize]) -> Responder {
        let prefs = PreferenceList::from_parts(
            acceptable.iter().copied().map(ProposerId).collect(),
            unacceptable.iter().copied().map(ProposerId).collect(),
        )
        .unwrap();
        Responder::with_preferences(name, "responder", prefs).unwrap()
    }

    /// A:[X,Y], B:[X,Y]; X:[A,B], Y:[B,A]
    fn rejection_chain() -> Engine {
        Engine::new(
            vec![proposer("A", &[0, 1], &[]), proposer("B", &[0, 1], &[])],
            vec![responder("X", &[0, 1], &[]), responder("Y", &[1, 0], &[])],
        )
        .unwrap()
    }

    #[test]
    fn test_new_engine_state() {
        let engine = rejection_chain();
        assert_eq!(engine.round(), 0);
        assert_eq!(engine.phase(), Phase::NotStarted);
        assert_eq!(engine.unmatched_proposers(), vec![ProposerId(0), ProposerId(1)]);
        assert_eq!(engine.proposer_id("B"), Some(ProposerId(1)));
        assert_eq!(engine.responder_id("Y"), Some(ResponderId(1)));
        assert_eq!(engine.responder_id("Z"), None);
    }

    #[test]
    fn test_rejects_dangling_handles() {
        let err = Engine::new(vec![proposer("A", &[3], &[])], vec![responder("X", &[0], &[])]).unwrap_err();
        assert!(matches!(err, AgentError::InvalidPreferences { .. }));
    }

    #[test]
    fn test_proposers_propose() {
        let mut engine = rejection_chain();
        let outcome = engine.proposers_propose().unwrap();

        assert_eq!(engine.phase(), Phase::Proposing);
        assert_eq!(
            outcome.proposals,
            vec![(ProposerId(0), ResponderId(0)), (ProposerId(1), ResponderId(0))]
        );
        assert!(outcome.self_matched.is_empty());
        assert_eq!(engine.responder(ResponderId(0)).current_proposals().len(), 2);
        assert_eq!(
            engine.proposer(ProposerId(1)).last_proposal(),
            Some(Ranked::Candidate(ResponderId(0)))
        );
    }

    #[test]
    fn test_responders_respond() {
        let mut engine = rejection_chain();
        engine.proposers_propose().unwrap();
        engine.responders_respond().unwrap();

        assert_eq!(engine.phase(), Phase::Responding);
        assert_eq!(engine.proposer(ProposerId(0)).match_state(), MatchState::Engaged(ResponderId(0)));
        assert_eq!(engine.proposer(ProposerId(1)).match_state(), MatchState::Undecided);
        assert!(!engine.responder(ResponderId(0)).awaiting_response());
    }

    #[test]
    fn test_step_records_round() {
        let mut engine = rejection_chain();

        let first = engine.step().unwrap().unwrap();
        assert_eq!(first.round, 1);
        assert_eq!(first.proposals.len(), 2);
        assert_eq!(first.rejections, vec![ProposalAction::new("B", "X")]);
        assert_eq!(first.tentative_matches, vec![ProposalAction::new("A", "X")]);

        let second = engine.step().unwrap().unwrap();
        assert_eq!(second.round, 2);
        assert_eq!(second.proposals, vec![ProposalAction::new("B", "Y")]);
        assert!(second.rejections.is_empty());
        assert_eq!(second.tentative_matches.len(), 2);

        assert!(engine.step().unwrap().is_none());
        assert_eq!(engine.round(), 2);
    }

    #[test]
    fn test_run_rejection_chain() {
        let mut engine = rejection_chain();
        let result = engine.run().unwrap();

        assert_eq!(result.rounds, 2);
        assert_eq!(result.partner_of("A"), Some("X"));
        assert_eq!(result.partner_of("B"), Some("Y"));
        assert!(result.all_matched);
        assert!(engine.is_terminated());
    }

    #[test]
    fn test_replaced_partner_proposes_again() {
        // X prefers B, but B only reaches X after Y turns it down
        let mut engine = Engine::new(
            vec![proposer("A", &[0, 1], &[]), proposer("B", &[1, 0], &[])],
            vec![responder("X", &[1, 0], &[]), responder("Y", &[0], &[1])],
        )
        .unwrap();

        let result = engine.run().unwrap();
        // Round 1: A->X (kept), B->Y (unacceptable to Y). Round 2: B->X, X trades up.
        // Round 3: A->Y, accepted.
        assert_eq!(result.rounds, 3);
        assert_eq!(result.partner_of("A"), Some("Y"));
        assert_eq!(result.partner_of("B"), Some("X"));
    }

    #[test]
    fn test_exhausted_proposer_self_matches() {
        let mut engine = Engine::new(
            vec![proposer("m1", &[0], &[]), proposer("m2", &[0], &[])],
            vec![responder("w1", &[0, 1], &[])],
        )
        .unwrap();

        let (steps, result) = engine.run_with_steps().unwrap();
        assert_eq!(result.rounds, 2);
        assert_eq!(steps[1].self_matches, vec!["m2".to_string()]);
        assert_eq!(result.self_matches, vec!["m2".to_string()]);
        assert!(!result.all_matched);
    }

    #[test]
    fn test_finalize_self_matches_idle_responders() {
        let mut engine = Engine::new(
            vec![proposer("m1", &[0], &[1])],
            vec![responder("w1", &[0], &[]), responder("w2", &[0], &[])],
        )
        .unwrap();

        let result = engine.run().unwrap();
        assert_eq!(result.partner_of("m1"), Some("w1"));
        assert_eq!(result.self_matches, vec!["w2".to_string()]);
        assert!(result.unmatched.is_empty());
        assert_eq!(
            engine.responder(ResponderId(1)).match_state(),
            MatchState::SelfMatched
        );
    }

    #[test]
    fn test_no_proposers() {
        let mut engine = Engine::new(Vec::new(), vec![responder("w1", &[], &[])]).unwrap();
        let result = engine.run().unwrap();
        assert_eq!(result.rounds, 0);
        assert_eq!(result.self_matches, vec!["w1".to_string()]);
    }

    #[test]
    fn test_unset_preferences_halt_the_run() {
        let mut engine = Engine::new(
            vec![Proposer::new("m1", "proposer")],
            vec![responder("w1", &[0], &[])],
        )
        .unwrap();
        assert!(matches!(engine.run(), Err(AgentError::PreferencesUnset { .. })));
    }

    #[test]
    fn test_engage_releases_previous_partners() {
        let mut engine = rejection_chain();
        engine.engage(ProposerId(0), ResponderId(0));
        engine.engage(ProposerId(1), ResponderId(0));

        assert_eq!(engine.proposer(ProposerId(0)).match_state(), MatchState::Undecided);
        assert_eq!(engine.responder(ResponderId(0)).match_state(), MatchState::Engaged(ProposerId(1)));

        engine.engage(ProposerId(1), ResponderId(1));
        assert_eq!(engine.responder(ResponderId(0)).match_state(), MatchState::Undecided);
    }
}
