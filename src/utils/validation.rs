//! Configuration validation utilities.
//!
//! Plain checks returning `Err(String)` with a human-readable message. The
//! configuration layer wraps these messages into its own error type.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Side names are single words made of ASCII letters
static SIDE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]+$").expect("Invalid side name regex"));

/// Validate a single side name such as `men` or `Hospitals`
///
/// # Examples
/// ```
/// use gale_shapley::utils::validation::validate_side_name;
///
/// assert!(validate_side_name("women").is_ok());
/// assert!(validate_side_name("side 2").is_err());
/// ```
pub fn validate_side_name(name: &str) -> Result<(), String> {
    if !SIDE_NAME.is_match(name) {
        return Err(format!("side name '{}' must contain letters only", name));
    }
    Ok(())
}

/// Validate both side names and that they can be told apart
pub fn validate_side_names(proposer_side: &str, responder_side: &str) -> Result<(), String> {
    validate_side_name(proposer_side)?;
    validate_side_name(responder_side)?;

    if proposer_side.eq_ignore_ascii_case(responder_side) {
        return Err(format!(
            "side names '{}' and '{}' must differ",
            proposer_side, responder_side
        ));
    }
    Ok(())
}

/// Validate a log file name relative to the log directory
///
/// # Arguments
/// * `name` - File name as given in the configuration
///
/// # Returns
/// * `Ok(())` for relative names ending with `.log`
/// * `Err(String)` describing the problem otherwise
pub fn validate_log_file_name(name: &str) -> Result<(), String> {
    if name.starts_with('/') {
        return Err(format!("log file name '{}' must be relative", name));
    }
    if !name.ends_with(".log") || name.len() == ".log".len() {
        return Err(format!("log file name '{}' must end with .log", name));
    }
    Ok(())
}

/// Check that every name referenced by `lists` is a key of `others`
///
/// Returns the first offending reference, naming the agent that holds it.
pub fn validate_references(
    lists: &BTreeMap<String, Vec<String>>,
    others: &BTreeMap<String, Vec<String>>,
    other_side: &str,
) -> Result<(), String> {
    for (name, listed) in lists {
        if let Some(missing) = listed.iter().find(|peer| !others.contains_key(*peer)) {
            return Err(format!(
                "'{}' ranks '{}', which is not among the {}",
                name, missing, other_side
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_side_name() {
        assert!(validate_side_name("men").is_ok());
        assert!(validate_side_name("Hospitals").is_ok());
        assert!(validate_side_name("").is_err());
        assert!(validate_side_name("side_a").is_err());
        assert!(validate_side_name("résidents").is_err());
    }

    #[test]
    fn test_side_names_must_differ_ignoring_case() {
        assert!(validate_side_names("men", "women").is_ok());
        assert!(validate_side_names("Men", "men").is_err());
        assert!(validate_side_names("men", "wo men").is_err());
    }

    #[test]
    fn test_validate_log_file_name() {
        assert!(validate_log_file_name("matching.log").is_ok());
        assert!(validate_log_file_name("runs/matching.log").is_ok());
        assert!(validate_log_file_name("/var/log/matching.log").is_err());
        assert!(validate_log_file_name("matching.txt").is_err());
        assert!(validate_log_file_name(".log").is_err());
    }

    #[test]
    fn test_validate_references() {
        let mut men = BTreeMap::new();
        men.insert("m1".to_string(), vec!["w1".to_string(), "w2".to_string()]);
        let mut women = BTreeMap::new();
        women.insert("w1".to_string(), vec!["m1".to_string()]);

        let err = validate_references(&men, &women, "women").unwrap_err();
        assert!(err.contains("w2"));
        assert!(validate_references(&women, &men, "men").is_ok());
    }
}
