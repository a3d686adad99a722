//! Stability verification of a finished matching.
//!
//! These checks never mutate agents and can be run against any engine state,
//! including hand-built ones. Results are only meaningful once the engine has
//! been finalized.

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, MatchState, ProposerId, Proposer, Ranked, Responder};
use crate::engine::Engine;

/// Outcome of a stability check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilityResult {
    /// Individually rational and free of blocking pairs
    pub is_stable: bool,
    /// Every matched agent finds its match acceptable
    pub is_individually_rational: bool,
    /// (proposer, responder) pairs that would both rather be together
    pub blocking_pairs: Vec<(String, String)>,
}

/// True if every matched agent finds its match acceptable.
///
/// Self-matches and undecided agents pass trivially. A partner missing from
/// the agent's own ranking counts as unacceptable.
pub fn is_individually_rational(proposers: &[Proposer], responders: &[Responder]) -> bool {
    proposers.iter().all(|proposer| proposer.accepts_match().unwrap_or(false))
        && responders.iter().all(|responder| responder.accepts_match().unwrap_or(false))
}

/// Find all blocking pairs.
///
/// For each matched proposer, every responder it ranks strictly above its
/// current match is checked: the pair blocks if that responder is undecided,
/// or ranks the proposer strictly above its own current match. Scanning the
/// proposer side alone finds every blocking pair.
pub fn find_blocking_pairs(proposers: &[Proposer], responders: &[Responder]) -> Vec<(String, String)> {
    let mut blocking = Vec::new();

    for (index, proposer) in proposers.iter().enumerate() {
        let preferences = proposer.preferences();
        if !preferences.is_set() || !proposer.is_matched() {
            continue;
        }
        let Some(current) = preferences.rank_of_match(proposer.match_state()) else {
            continue;
        };

        for entry in preferences.better_than(current) {
            // Skip the threshold marker, (self, self) is never blocking
            let Ranked::Candidate(responder_id) = *entry else {
                continue;
            };
            let Some(responder) = responders.get(responder_id.index()) else {
                continue;
            };

            let blocks = match responder.match_state() {
                MatchState::Undecided => true,
                state => {
                    let theirs = responder.preferences();
                    match (theirs.rank_of(ProposerId(index)), theirs.rank_of_match(state)) {
                        (Some(rank_of_proposer), Some(rank_of_match)) => rank_of_proposer < rank_of_match,
                        _ => false,
                    }
                }
            };

            if blocks {
                blocking.push((proposer.name().to_string(), responder.name().to_string()));
            }
        }
    }

    blocking
}

/// Combine individual rationality and blocking pairs for an engine's state
pub fn check_stability(engine: &Engine) -> StabilityResult {
    let is_individually_rational = is_individually_rational(engine.proposers(), engine.responders());
    let blocking_pairs = find_blocking_pairs(engine.proposers(), engine.responders());

    StabilityResult {
        is_stable: is_individually_rational && blocking_pairs.is_empty(),
        is_individually_rational,
        blocking_pairs,
    }
}
