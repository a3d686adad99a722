//! Human-readable views of an engine: preference tables and matches.

use crate::agent::{Agent, MatchState, Ranked};
use crate::engine::Engine;

/// Column width of the compact preference table
const CELL_WIDTH: usize = 5;

/// Numbered preference list of the agent called `name`.
///
/// Acceptable entries are marked with `*`, the threshold shows as `(self)`.
/// Returns `None` if no agent has that name.
pub fn format_preferences(engine: &Engine, name: &str) -> Option<String> {
    if let Some(id) = engine.proposer_id(name) {
        let proposer = engine.proposer(id);
        return Some(listing(proposer, |peer| engine.responder(peer).name().to_string()));
    }
    engine
        .responder_id(name)
        .map(|id| listing(engine.responder(id), |peer| engine.proposer(peer).name().to_string()))
}

fn listing<A: Agent>(agent: &A, peer_name: impl Fn(A::Peer) -> String) -> String {
    let preferences = agent.preferences();
    let mut lines = vec![format!("{} ({}) preferences:", agent.name(), agent.side())];

    if !preferences.is_set() {
        lines.push("  not set".to_string());
        return lines.join("\n");
    }

    let acceptable = preferences.acceptable_count();
    for (rank, entry) in preferences.entries().iter().enumerate() {
        let label = match *entry {
            Ranked::Candidate(peer) => peer_name(peer),
            Ranked::Threshold => "(self)".to_string(),
        };
        let marker = if rank < acceptable { " *" } else { "" };
        lines.push(format!("  {:>2}. {}{}", rank + 1, label, marker));
    }
    lines.join("\n")
}

/// Preferences of every agent, proposers first.
///
/// In compact form each side is one table with a column per agent listing
/// its acceptable entries in order. Otherwise every agent gets its own
/// numbered listing.
pub fn format_all_preferences(engine: &Engine, compact: bool) -> String {
    if compact {
        let proposer_columns: Vec<(String, Vec<String>)> = engine
            .proposers()
            .iter()
            .map(|p| column(p, |peer| engine.responder(peer).name().to_string()))
            .collect();
        let responder_columns: Vec<(String, Vec<String>)> = engine
            .responders()
            .iter()
            .map(|r| column(r, |peer| engine.proposer(peer).name().to_string()))
            .collect();

        let mut sections = Vec::new();
        if let Some(first) = engine.proposers().first() {
            sections.push(table(first.side(), &proposer_columns));
        }
        if let Some(first) = engine.responders().first() {
            sections.push(table(first.side(), &responder_columns));
        }
        return sections.join("\n\n");
    }

    let proposers = engine
        .proposers()
        .iter()
        .map(|p| listing(p, |peer| engine.responder(peer).name().to_string()));
    let responders = engine
        .responders()
        .iter()
        .map(|r| listing(r, |peer| engine.proposer(peer).name().to_string()));
    proposers.chain(responders).collect::<Vec<_>>().join("\n")
}

fn column<A: Agent>(agent: &A, peer_name: impl Fn(A::Peer) -> String) -> (String, Vec<String>) {
    let cells = agent
        .preferences()
        .acceptable()
        .iter()
        .filter_map(|entry| entry.candidate())
        .map(peer_name)
        .collect();
    (agent.name().to_string(), cells)
}

fn table(side: &str, columns: &[(String, Vec<String>)]) -> String {
    let depth = columns.iter().map(|(_, cells)| cells.len()).max().unwrap_or(0);
    let mut lines = vec![format!("{} preferences:", side)];

    lines.push(
        columns
            .iter()
            .map(|(name, _)| format!("{:>width$}", name, width = CELL_WIDTH))
            .collect::<Vec<_>>()
            .join(" "),
    );
    for row in 0..depth {
        let line = columns
            .iter()
            .map(|(_, cells)| {
                let cell = cells.get(row).map(String::as_str).unwrap_or("");
                format!("{:>width$}", cell, width = CELL_WIDTH)
            })
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

/// One line per agent describing its match, proposers first
pub fn format_matches(engine: &Engine) -> String {
    let mut lines = Vec::with_capacity(engine.proposers().len() + engine.responders().len());

    for proposer in engine.proposers() {
        lines.push(describe(
            proposer.name(),
            proposer.match_state().map_partner(|r| engine.responder(r).name()),
        ));
    }
    for responder in engine.responders() {
        lines.push(describe(
            responder.name(),
            responder.match_state().map_partner(|p| engine.proposer(p).name()),
        ));
    }
    lines.join("\n")
}

fn describe(name: &str, state: MatchState<&str>) -> String {
    match state {
        MatchState::Engaged(partner) => format!("{} is matched to {}", name, partner),
        MatchState::SelfMatched => format!("{} is matched to self", name),
        MatchState::Undecided => format!("{} is unmatched", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{build_engine, PreferenceMap};

    fn prefs(entries: &[(&str, &[&str])]) -> PreferenceMap {
        entries
            .iter()
            .map(|(name, listed)| (name.to_string(), listed.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    fn small_engine() -> Engine {
        build_engine(
            &prefs(&[("m1", &["w1"]), ("m2", &["w1", "w2"])]),
            &prefs(&[("w1", &["m2"]), ("w2", &[])]),
        )
        .unwrap()
    }

    #[test]
    fn test_format_preferences_marks_acceptable() {
        let engine = small_engine();
        let text = format_preferences(&engine, "m1").unwrap();
        assert_eq!(
            text,
            "m1 (proposer) preferences:\n   1. w1 *\n   2. (self)\n   3. w2"
        );
        assert!(format_preferences(&engine, "w2").unwrap().contains("1. (self)"));
        assert!(format_preferences(&engine, "nobody").is_none());
    }

    #[test]
    fn test_compact_table() {
        let engine = small_engine();
        let text = format_all_preferences(&engine, true);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "proposer preferences:");
        assert_eq!(lines[1], "   m1    m2");
        assert_eq!(lines[2], "   w1    w1");
        assert_eq!(lines[3], "         w2");
        assert!(text.contains("responder preferences:"));
    }

    #[test]
    fn test_expanded_listing_covers_everyone() {
        let engine = small_engine();
        let text = format_all_preferences(&engine, false);
        for name in ["m1", "m2", "w1", "w2"] {
            assert!(text.contains(&format!("{} (", name)));
        }
    }

    #[test]
    fn test_format_matches() {
        let mut engine = small_engine();
        assert!(format_matches(&engine).contains("m1 is unmatched"));

        engine.run().unwrap();
        let text = format_matches(&engine);
        assert!(text.contains("m2 is matched to w1"));
        assert!(text.contains("w1 is matched to m2"));
        assert!(text.contains("m1 is matched to self"));
        assert!(text.contains("w2 is matched to self"));
    }
}
