//! Construction layer: engines from name-keyed preference maps.
//!
//! Each input map goes from an agent name to the names it ranks, most
//! preferred first. Listed agents are acceptable. The agent's own threshold is
//! appended after them, followed by every unlisted agent of the other side.
//!
//! Input is validated in full before any agent is created, so a rejected
//! input never yields a partially wired engine.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::agent::{AgentError, PreferenceList, Proposer, ProposerId, Responder, ResponderId};
use crate::engine::{Engine, MatchingResult, RoundStep};
use crate::stability::{check_stability, StabilityResult};

/// Agent name -> ranked names of the other side
pub type PreferenceMap = BTreeMap<String, Vec<String>>;

/// Construction input rejected before any round runs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("{side} names must not be empty")]
    EmptyName { side: String },

    #[error("{name:?} appears among both proposers and responders")]
    DuplicateName { name: String },

    #[error("{name:?} must not rank itself")]
    SelfReference { name: String },

    #[error("preference {preference:?} of {name:?} is not a known {side}")]
    UnknownAgent {
        name: String,
        preference: String,
        side: String,
    },

    #[error("{name:?} ranks {preference:?} more than once")]
    DuplicatePreference { name: String, preference: String },
}

/// Any failure of the convenience entry points
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchingError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Result, stability and round history of one matching
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingOutcome {
    pub steps: Vec<RoundStep>,
    pub result: MatchingResult,
    pub stability: StabilityResult,
}

/// Wires proposers and responders from two preference maps
#[derive(Debug, Clone)]
pub struct EngineBuilder<'a> {
    proposer_preferences: &'a PreferenceMap,
    responder_preferences: &'a PreferenceMap,
    proposer_side: String,
    responder_side: String,
}

impl<'a> EngineBuilder<'a> {
    pub fn new(proposer_preferences: &'a PreferenceMap, responder_preferences: &'a PreferenceMap) -> Self {
        Self {
            proposer_preferences,
            responder_preferences,
            proposer_side: "proposer".to_string(),
            responder_side: "responder".to_string(),
        }
    }

    /// Set the side labels carried by the created agents
    pub fn sides(mut self, proposer_side: &str, responder_side: &str) -> Self {
        self.proposer_side = proposer_side.to_string();
        self.responder_side = responder_side.to_string();
        self
    }

    /// Check the input without building anything
    pub fn validate(&self) -> Result<(), InputError> {
        self.resolve().map(|_| ())
    }

    /// Build the engine, unlisted agents padded in declaration order
    pub fn build(self) -> Result<Engine, MatchingError> {
        self.build_with(|_| {})
    }

    /// Build the engine, unlisted agents padded in random order
    pub fn build_shuffled<R: Rng + ?Sized>(self, rng: &mut R) -> Result<Engine, MatchingError> {
        self.build_with(|unlisted| unlisted.shuffle(rng))
    }

    fn build_with(self, mut order_unlisted: impl FnMut(&mut Vec<usize>)) -> Result<Engine, MatchingError> {
        let (proposer_lists, responder_lists) = self.resolve()?;
        let responder_count = responder_lists.len();
        let proposer_count = proposer_lists.len();

        let mut proposers = Vec::with_capacity(proposer_count);
        for (name, listed) in proposer_lists {
            let unlisted = padding(&listed, responder_count, &mut order_unlisted);
            let preferences = PreferenceList::from_parts(
                listed.into_iter().map(ResponderId).collect(),
                unlisted.into_iter().map(ResponderId).collect(),
            )
            .map_err(|reason| invalid(name, reason))?;
            proposers.push(Proposer::with_preferences(name, &self.proposer_side, preferences)?);
        }

        let mut responders = Vec::with_capacity(responder_count);
        for (name, listed) in responder_lists {
            let unlisted = padding(&listed, proposer_count, &mut order_unlisted);
            let preferences = PreferenceList::from_parts(
                listed.into_iter().map(ProposerId).collect(),
                unlisted.into_iter().map(ProposerId).collect(),
            )
            .map_err(|reason| invalid(name, reason))?;
            responders.push(Responder::with_preferences(name, &self.responder_side, preferences)?);
        }

        Ok(Engine::new(proposers, responders)?)
    }

    /// Validate both maps and translate names to arena indices
    #[allow(clippy::type_complexity)]
    fn resolve(&self) -> Result<(Vec<(&'a str, Vec<usize>)>, Vec<(&'a str, Vec<usize>)>), InputError> {
        check_names(self.proposer_preferences, &self.proposer_side)?;
        check_names(self.responder_preferences, &self.responder_side)?;

        if let Some(name) = self
            .proposer_preferences
            .keys()
            .find(|name| self.responder_preferences.contains_key(*name))
        {
            return Err(InputError::DuplicateName { name: name.clone() });
        }

        let proposer_lists = resolve_side(self.proposer_preferences, self.responder_preferences, &self.responder_side)?;
        let responder_lists = resolve_side(self.responder_preferences, self.proposer_preferences, &self.proposer_side)?;
        Ok((proposer_lists, responder_lists))
    }
}

fn check_names(preferences: &PreferenceMap, side: &str) -> Result<(), InputError> {
    if preferences.keys().any(|name| name.trim().is_empty()) {
        return Err(InputError::EmptyName { side: side.to_string() });
    }
    Ok(())
}

fn resolve_side<'a>(
    own: &'a PreferenceMap,
    others: &PreferenceMap,
    other_side: &str,
) -> Result<Vec<(&'a str, Vec<usize>)>, InputError> {
    let index: HashMap<&str, usize> = others
        .keys()
        .enumerate()
        .map(|(position, name)| (name.as_str(), position))
        .collect();

    let mut lists = Vec::with_capacity(own.len());
    for (name, listed) in own {
        let mut seen = HashSet::with_capacity(listed.len());
        let mut resolved = Vec::with_capacity(listed.len());

        for preference in listed {
            if preference == name {
                return Err(InputError::SelfReference { name: name.clone() });
            }
            let position = *index.get(preference.as_str()).ok_or_else(|| InputError::UnknownAgent {
                name: name.clone(),
                preference: preference.clone(),
                side: other_side.to_string(),
            })?;
            if !seen.insert(position) {
                return Err(InputError::DuplicatePreference {
                    name: name.clone(),
                    preference: preference.clone(),
                });
            }
            resolved.push(position);
        }

        lists.push((name.as_str(), resolved));
    }
    Ok(lists)
}

/// Indices of the other side missing from `listed`, in the chosen order
fn padding(listed: &[usize], total: usize, order: &mut impl FnMut(&mut Vec<usize>)) -> Vec<usize> {
    let listed: HashSet<usize> = listed.iter().copied().collect();
    let mut unlisted: Vec<usize> = (0..total).filter(|position| !listed.contains(position)).collect();
    order(&mut unlisted);
    unlisted
}

fn invalid(agent: &str, reason: String) -> AgentError {
    AgentError::InvalidPreferences {
        agent: agent.to_string(),
        reason,
    }
}

/// Build an engine from two preference maps with default side labels
pub fn build_engine(
    proposer_preferences: &PreferenceMap,
    responder_preferences: &PreferenceMap,
) -> Result<Engine, MatchingError> {
    EngineBuilder::new(proposer_preferences, responder_preferences).build()
}

/// Build, run and summarise a matching.
///
/// # Examples
/// ```
/// use gale_shapley::matching::{create_matching, PreferenceMap};
///
/// let mut proposers = PreferenceMap::new();
/// proposers.insert("m1".to_string(), vec!["w1".to_string()]);
/// proposers.insert("m2".to_string(), vec!["w1".to_string()]);
///
/// let mut responders = PreferenceMap::new();
/// responders.insert("w1".to_string(), vec!["m1".to_string(), "m2".to_string()]);
///
/// let result = create_matching(&proposers, &responders).unwrap();
/// assert_eq!(result.partner_of("m1"), Some("w1"));
/// assert!(result.is_self_matched("m2"));
/// ```
pub fn create_matching(
    proposer_preferences: &PreferenceMap,
    responder_preferences: &PreferenceMap,
) -> Result<MatchingResult, MatchingError> {
    let mut engine = build_engine(proposer_preferences, responder_preferences)?;
    Ok(engine.run()?)
}

/// Like [`create_matching`], also returning every round and the stability check
pub fn create_matching_with_steps(
    proposer_preferences: &PreferenceMap,
    responder_preferences: &PreferenceMap,
) -> Result<MatchingOutcome, MatchingError> {
    let mut engine = build_engine(proposer_preferences, responder_preferences)?;
    let (steps, result) = engine.run_with_steps()?;
    let stability = check_stability(&engine);

    Ok(MatchingOutcome {
        steps,
        result,
        stability,
    })
}
