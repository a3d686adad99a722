//! # Gale-Shapley - Stable matching for two-sided markets
//!
//! This library computes stable matchings between a proposing side and a
//! responding side with the deferred-acceptance algorithm.
//!
//! ## Overview
//!
//! Every agent ranks the agents of the other side together with a threshold
//! marking where it would rather stay on its own. Proposers propose down
//! their lists, responders hold on to the best acceptable proposal seen so
//! far, and the loop ends once every proposer is engaged or has run out of
//! acceptable responders. The result is the proposer-optimal stable
//! matching.
//!
//! ## Architecture
//!
//! - `agent`: proposers, responders, preference lists and match states
//! - `engine`: the round-based deferred-acceptance engine
//! - `stability`: individual rationality and blocking-pair checks
//! - `matching`: engine construction from name-keyed preference maps
//! - `config`: YAML configuration and validation
//! - `simulator`: random or configured markets, run in batches
//! - `display`: preference tables and match listings
//! - `report`: JSON and text reports of a batch
//! - `utils`: logging setup and validation helpers
//!
//! ## Example Usage
//!
//! ```rust
//! use gale_shapley::matching::{create_matching_with_steps, PreferenceMap};
//!
//! let mut proposers = PreferenceMap::new();
//! proposers.insert("A".to_string(), vec!["X".to_string(), "Y".to_string()]);
//! proposers.insert("B".to_string(), vec!["X".to_string(), "Y".to_string()]);
//!
//! let mut responders = PreferenceMap::new();
//! responders.insert("X".to_string(), vec!["A".to_string(), "B".to_string()]);
//! responders.insert("Y".to_string(), vec!["B".to_string(), "A".to_string()]);
//!
//! let outcome = create_matching_with_steps(&proposers, &responders)?;
//! assert_eq!(outcome.result.partner_of("A"), Some("X"));
//! assert_eq!(outcome.result.partner_of("B"), Some("Y"));
//! assert!(outcome.stability.is_stable);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Library operations return typed `thiserror` errors. The configuration,
//! simulation and reporting layers use `color_eyre` for errors with context.

pub mod agent;
pub mod config;
pub mod display;
pub mod engine;
pub mod matching;
pub mod report;
pub mod simulator;
pub mod stability;
pub mod utils;
