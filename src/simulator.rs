//! Repeated matching simulations driven by a [`Config`].
//!
//! In random mode every agent ranks a uniform shuffle of the other side
//! together with its own threshold. In input mode agents and acceptable
//! preferences come from the configuration and the remaining agents are
//! appended after the threshold in random order.
//!
//! Simulation `i` draws from a `StdRng` seeded with `seed + i`, so a batch
//! is reproducible regardless of how many worker threads run it.

use color_eyre::eyre::{Context, Result};
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::iter;
use std::time::Duration;

use crate::agent::{AgentError, PreferenceList, Proposer, ProposerId, Ranked, Responder, ResponderId};
use crate::config::{Config, PreferenceType};
use crate::display::{format_all_preferences, format_matches};
use crate::engine::{Engine, MatchingResult, RoundStep};
use crate::matching::{EngineBuilder, MatchingError};
use crate::stability::{check_stability, StabilityResult};
use crate::utils::logging::timed;

/// Batch-level settings
#[derive(Debug, Clone)]
pub struct SimulationOptions {
    /// Number of simulations, at least 1
    pub simulations: usize,
    /// Overrides the configured seed
    pub seed: Option<u64>,
    /// Worker threads, 0 for the rayon default
    pub jobs: usize,
    /// Log every preference table
    pub show_preferences: bool,
    /// Compact tables instead of per-agent listings
    pub compact: bool,
    /// Log the final matches
    pub show_matches: bool,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            simulations: 1,
            seed: None,
            jobs: 1,
            show_preferences: true,
            compact: true,
            show_matches: true,
        }
    }
}

/// Everything produced by one simulation
#[derive(Debug, Clone)]
pub struct SimulationRun {
    /// 0-based position in the batch
    pub index: usize,
    pub seed: u64,
    /// Final engine state, kept for display and inspection
    pub engine: Engine,
    pub steps: Vec<RoundStep>,
    pub result: MatchingResult,
    pub stability: StabilityResult,
    pub elapsed: Duration,
}

/// Outcome of a whole batch
#[derive(Debug, Clone)]
pub struct SimulationBatch {
    pub base_seed: u64,
    pub runs: Vec<SimulationRun>,
    pub elapsed: Duration,
}

pub struct Simulator {
    config: Config,
    proposer_names: Vec<String>,
    responder_names: Vec<String>,
}

impl Simulator {
    pub fn new(config: Config) -> Result<Self> {
        config.validate().wrap_err("Cannot simulate an invalid configuration")?;

        let (proposer_names, responder_names) = match config.preference_type {
            PreferenceType::Random => {
                let (proposer_prefix, responder_prefix) =
                    short_names(&config.proposer_side_name, &config.responder_side_name);
                (
                    numbered(&proposer_prefix, config.number_of_proposers),
                    numbered(&responder_prefix, config.number_of_responders),
                )
            }
            PreferenceType::Input => (
                config.proposers.keys().cloned().collect(),
                config.responders.keys().cloned().collect(),
            ),
        };

        Ok(Self {
            config,
            proposer_names,
            responder_names,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn proposer_names(&self) -> &[String] {
        &self.proposer_names
    }

    pub fn responder_names(&self) -> &[String] {
        &self.responder_names
    }

    /// Build a fresh engine with preferences drawn from `rng`
    pub fn create_engine<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Engine, MatchingError> {
        match self.config.preference_type {
            PreferenceType::Random => Ok(self.random_engine(rng)?),
            PreferenceType::Input => EngineBuilder::new(&self.config.proposers, &self.config.responders)
                .sides(&self.config.proposer_side_name, &self.config.responder_side_name)
                .build_shuffled(rng),
        }
    }

    fn random_engine<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Engine, AgentError> {
        let responder_count = self.responder_names.len();
        let proposer_count = self.proposer_names.len();

        let mut proposers = Vec::with_capacity(proposer_count);
        for name in &self.proposer_names {
            let preferences = shuffled_list(name, (0..responder_count).map(ResponderId), rng)?;
            proposers.push(Proposer::with_preferences(
                name.as_str(),
                self.config.proposer_side_name.as_str(),
                preferences,
            )?);
        }

        let mut responders = Vec::with_capacity(responder_count);
        for name in &self.responder_names {
            let preferences = shuffled_list(name, (0..proposer_count).map(ProposerId), rng)?;
            responders.push(Responder::with_preferences(
                name.as_str(),
                self.config.responder_side_name.as_str(),
                preferences,
            )?);
        }

        Engine::new(proposers, responders)
    }

    /// Run simulation `index` with its own seed
    pub fn run_once(&self, index: usize, seed: u64) -> Result<SimulationRun> {
        let (outcome, elapsed) = timed(|| -> Result<_> {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut engine = self.create_engine(&mut rng)?;
            let (steps, result) = engine.run_with_steps()?;
            let stability = check_stability(&engine);
            Ok((engine, steps, result, stability))
        });
        let (engine, steps, result, stability) =
            outcome.wrap_err_with(|| format!("Simulation {} failed", index + 1))?;

        Ok(SimulationRun {
            index,
            seed,
            engine,
            steps,
            result,
            stability,
            elapsed,
        })
    }

    /// Run a batch of simulations and log each one in order
    pub fn simulate(&self, options: &SimulationOptions) -> Result<SimulationBatch> {
        let base_seed = options
            .seed
            .or(self.config.seed)
            .unwrap_or_else(|| rand::thread_rng().gen());
        info!(
            "Running {} simulation(s) of {} {} and {} {} with seed {}",
            options.simulations,
            self.proposer_names.len(),
            self.config.proposer_side_name,
            self.responder_names.len(),
            self.config.responder_side_name,
            base_seed
        );

        let (runs, elapsed) = timed(|| self.run_batch(options, base_seed));
        let runs = runs?;

        for run in &runs {
            self.log_run(run, options);
        }
        info!("Finished {} simulation(s) in {:.3?}", runs.len(), elapsed);

        Ok(SimulationBatch {
            base_seed,
            runs,
            elapsed,
        })
    }

    fn run_batch(&self, options: &SimulationOptions, base_seed: u64) -> Result<Vec<SimulationRun>> {
        let seed_of = |index: usize| base_seed.wrapping_add(index as u64);

        if options.jobs == 1 || options.simulations <= 1 {
            return (0..options.simulations)
                .map(|index| self.run_once(index, seed_of(index)))
                .collect();
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.jobs)
            .build()
            .context("Failed to configure thread pool")?;

        pool.install(|| {
            (0..options.simulations)
                .into_par_iter()
                .map(|index| self.run_once(index, seed_of(index)))
                .collect()
        })
    }

    fn log_run(&self, run: &SimulationRun, options: &SimulationOptions) {
        info!("{}", "=".repeat(80));
        info!("Simulation {} (seed {})", run.index + 1, run.seed);
        info!("{}", "=".repeat(80));

        if options.show_preferences {
            for line in format_all_preferences(&run.engine, options.compact).lines() {
                info!("{}", line);
            }
        }

        if options.show_matches {
            for line in format_matches(&run.engine).lines() {
                info!("{}", line);
            }
        }

        info!(
            "Rounds: {}, matched pairs: {}, self-matched: {}",
            run.result.rounds,
            run.result.matches.len(),
            run.result.self_matches.len()
        );
        if run.stability.is_stable {
            info!("Matching is stable");
        } else {
            log::warn!(
                "Matching is NOT stable: individually rational = {}, blocking pairs = {:?}",
                run.stability.is_individually_rational,
                run.stability.blocking_pairs
            );
        }
        info!("Simulation {} took {:.3?}", run.index + 1, run.elapsed);
    }
}

/// Name prefixes for generated agents.
///
/// The lowercased first letter of each side name, or the whole lowercased
/// side names when both start with the same letter.
///
/// # Examples
/// ```
/// use gale_shapley::simulator::short_names;
///
/// assert_eq!(short_names("Men", "Women"), ("m".to_string(), "w".to_string()));
/// assert_eq!(short_names("hospitals", "Hackers"), ("hospitals".to_string(), "hackers".to_string()));
/// ```
pub fn short_names(proposer_side: &str, responder_side: &str) -> (String, String) {
    let proposer = proposer_side.to_lowercase();
    let responder = responder_side.to_lowercase();

    match (proposer.chars().next(), responder.chars().next()) {
        (Some(p), Some(r)) if p != r => (p.to_string(), r.to_string()),
        _ => (proposer, responder),
    }
}

fn numbered(prefix: &str, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("{}_{}", prefix, i)).collect()
}

/// Uniform shuffle of `peers` plus the threshold marker
fn shuffled_list<T, R>(
    agent: &str,
    peers: impl Iterator<Item = T>,
    rng: &mut R,
) -> Result<PreferenceList<T>, AgentError>
where
    T: Copy + Eq + std::hash::Hash,
    R: Rng + ?Sized,
{
    let mut entries: Vec<Ranked<T>> = peers.map(Ranked::Candidate).chain(iter::once(Ranked::Threshold)).collect();
    entries.shuffle(rng);
    PreferenceList::new(entries).map_err(|reason| AgentError::InvalidPreferences {
        agent: agent.to_string(),
        reason,
    })
}
