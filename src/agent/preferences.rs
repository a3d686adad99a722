//! Ranked preference lists with an explicit acceptability threshold.
//!
//! A list is a strict total order over distinct candidates with exactly one
//! [`Ranked::Threshold`] entry. Candidates before the threshold are
//! acceptable; candidates after it rank below staying unmatched.
//!
//! An empty list means "not set". Queries on an unset list return `None`
//! and the owning agent turns that into
//! [`AgentError::PreferencesUnset`](super::AgentError::PreferencesUnset).

use std::collections::HashMap;
use std::hash::Hash;

use super::types::{MatchState, Ranked};

/// Ordered preference list of one agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceList<T: Eq + Hash> {
    entries: Vec<Ranked<T>>,
    /// Candidate -> position in `entries`
    ranks: HashMap<T, usize>,
    /// Position of the threshold marker in `entries`
    threshold: usize,
}

impl<T: Copy + Eq + Hash> Default for PreferenceList<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            ranks: HashMap::new(),
            threshold: 0,
        }
    }
}

impl<T: Copy + Eq + Hash> PreferenceList<T> {
    /// Build a list from ranked entries, most preferred first.
    ///
    /// # Returns
    /// * `Err(String)` if a candidate appears twice or the threshold marker
    ///   does not appear exactly once
    ///
    /// # Examples
    /// ```
    /// use gale_shapley::agent::{PreferenceList, Ranked, ResponderId};
    ///
    /// let list = PreferenceList::new(vec![
    ///     Ranked::Candidate(ResponderId(1)),
    ///     Ranked::Threshold,
    ///     Ranked::Candidate(ResponderId(0)),
    /// ]).unwrap();
    /// assert_eq!(list.is_acceptable(ResponderId(1)), Some(true));
    /// assert_eq!(list.is_acceptable(ResponderId(0)), Some(false));
    /// ```
    pub fn new(entries: Vec<Ranked<T>>) -> Result<Self, String> {
        let mut ranks = HashMap::with_capacity(entries.len());
        let mut threshold = None;

        for (position, entry) in entries.iter().enumerate() {
            match *entry {
                Ranked::Candidate(peer) => {
                    if ranks.insert(peer, position).is_some() {
                        return Err(format!("candidate at position {} is ranked twice", position + 1));
                    }
                }
                Ranked::Threshold => {
                    if threshold.replace(position).is_some() {
                        return Err("threshold marker appears more than once".to_string());
                    }
                }
            }
        }

        let threshold = threshold.ok_or_else(|| "threshold marker is missing".to_string())?;

        Ok(Self {
            entries,
            ranks,
            threshold,
        })
    }

    /// Build a list where `acceptable` precede the threshold and
    /// `unacceptable` follow it.
    pub fn from_parts(acceptable: Vec<T>, unacceptable: Vec<T>) -> Result<Self, String> {
        let entries = acceptable
            .into_iter()
            .map(Ranked::Candidate)
            .chain(std::iter::once(Ranked::Threshold))
            .chain(unacceptable.into_iter().map(Ranked::Candidate))
            .collect();
        Self::new(entries)
    }

    /// True once preferences have been assigned
    #[inline]
    pub fn is_set(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Number of entries, including the threshold marker
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, most preferred first
    #[inline]
    pub fn entries(&self) -> &[Ranked<T>] {
        &self.entries
    }

    /// Position of the threshold marker
    pub fn threshold_rank(&self) -> Option<usize> {
        self.is_set().then_some(self.threshold)
    }

    /// Position of a candidate (0 = most preferred)
    pub fn rank_of(&self, peer: T) -> Option<usize> {
        self.ranks.get(&peer).copied()
    }

    /// Position of an entry; the threshold marker ranks at the threshold
    pub fn rank_of_entry(&self, entry: Ranked<T>) -> Option<usize> {
        match entry {
            Ranked::Candidate(peer) => self.rank_of(peer),
            Ranked::Threshold => self.threshold_rank(),
        }
    }

    /// Position of a match: the partner's rank for an engagement, the
    /// threshold for a self-match, `None` while undecided.
    pub fn rank_of_match(&self, state: MatchState<T>) -> Option<usize> {
        match state {
            MatchState::Undecided => None,
            MatchState::Engaged(peer) => self.rank_of(peer),
            MatchState::SelfMatched => self.threshold_rank(),
        }
    }

    /// Whether `peer` ranks at or above the threshold.
    ///
    /// `None` when the list is unset or `peer` is not ranked.
    pub fn is_acceptable(&self, peer: T) -> Option<bool> {
        let threshold = self.threshold_rank()?;
        self.rank_of(peer).map(|rank| rank <= threshold)
    }

    /// Prefix of the list up to and including the threshold marker
    pub fn acceptable(&self) -> &[Ranked<T>] {
        match self.threshold_rank() {
            Some(threshold) => &self.entries[..=threshold],
            None => &[],
        }
    }

    /// Entries ranked strictly before `rank`
    pub fn better_than(&self, rank: usize) -> &[Ranked<T>] {
        &self.entries[..rank.min(self.entries.len())]
    }

    /// Number of acceptable candidates (threshold excluded)
    pub fn acceptable_count(&self) -> usize {
        self.acceptable().len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::types::ProposerId;

    fn list(acceptable: &[usize], unacceptable: &[usize]) -> PreferenceList<ProposerId> {
        PreferenceList::from_parts(
            acceptable.iter().copied().map(ProposerId).collect(),
            unacceptable.iter().copied().map(ProposerId).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_default_is_unset() {
        let prefs: PreferenceList<ProposerId> = PreferenceList::default();
        assert!(!prefs.is_set());
        assert_eq!(prefs.threshold_rank(), None);
        assert_eq!(prefs.is_acceptable(ProposerId(0)), None);
        assert!(prefs.acceptable().is_empty());
    }

    #[test]
    fn test_threshold_splits_acceptability() {
        let prefs = list(&[2, 0], &[1]);
        assert_eq!(prefs.len(), 4);
        assert_eq!(prefs.threshold_rank(), Some(2));
        assert_eq!(prefs.is_acceptable(ProposerId(2)), Some(true));
        assert_eq!(prefs.is_acceptable(ProposerId(0)), Some(true));
        assert_eq!(prefs.is_acceptable(ProposerId(1)), Some(false));
        assert_eq!(prefs.is_acceptable(ProposerId(9)), None);
        assert_eq!(prefs.acceptable_count(), 2);
    }

    #[test]
    fn test_acceptable_prefix_ends_with_threshold() {
        let prefs = list(&[1], &[0, 2]);
        assert_eq!(
            prefs.acceptable(),
            &[Ranked::Candidate(ProposerId(1)), Ranked::Threshold]
        );
    }

    #[test]
    fn test_threshold_only() {
        let prefs = list(&[], &[0]);
        assert_eq!(prefs.acceptable(), &[Ranked::Threshold]);
        assert_eq!(prefs.is_acceptable(ProposerId(0)), Some(false));
    }

    #[test]
    fn test_rejects_duplicate_candidate() {
        let err = PreferenceList::from_parts(vec![ProposerId(0)], vec![ProposerId(0)]).unwrap_err();
        assert!(err.contains("twice"));
    }

    #[test]
    fn test_rejects_missing_or_repeated_threshold() {
        assert!(PreferenceList::new(vec![Ranked::Candidate(ProposerId(0))]).is_err());
        assert!(PreferenceList::<ProposerId>::new(vec![Ranked::Threshold, Ranked::Threshold]).is_err());
    }

    #[test]
    fn test_rank_of_match() {
        let prefs = list(&[1, 0], &[]);
        assert_eq!(prefs.rank_of_match(MatchState::Engaged(ProposerId(0))), Some(1));
        assert_eq!(prefs.rank_of_match(MatchState::SelfMatched), Some(2));
        assert_eq!(prefs.rank_of_match(MatchState::Undecided), None);
    }

    #[test]
    fn test_better_than() {
        let prefs = list(&[1, 0], &[2]);
        assert_eq!(prefs.better_than(1), &[Ranked::Candidate(ProposerId(1))]);
        assert_eq!(prefs.better_than(10).len(), 4);
    }
}
