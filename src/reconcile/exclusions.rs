// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Exclusion pattern grammar: exact hostname, shell-style glob, or a `~`
//! prefixed regex. Compiled once per cycle and shared between the proxy
//! poll filter (Step 4) and the resolver cleanup step (Step 7).

use regex::Regex;
use tracing::warn;

use crate::patterns::glob_to_regex;

/// One compiled exclusion entry.
pub enum Pattern {
    /// Anchored full match, case-insensitive, compared lowercase.
    Exact(String),
    /// `*`/`?` converted to an anchored, case-insensitive regex.
    Glob(Regex),
    /// A `~`-prefixed pattern, compiled directly as a case-insensitive regex.
    Regex(Regex),
}

impl Pattern {
    fn matches(&self, hostname: &str) -> bool {
        match self {
            Pattern::Exact(exact) => exact.eq_ignore_ascii_case(hostname),
            Pattern::Glob(re) | Pattern::Regex(re) => re.is_match(hostname),
        }
    }
}

/// Compile `raw` exclusion strings into [`Pattern`]s. Invalid regexes are
/// logged and dropped rather than failing the whole list.
pub fn compile_exclusions(raw: &[String]) -> Vec<Pattern> {
    raw.iter()
        .filter_map(|pattern| {
            if let Some(body) = pattern.strip_prefix('~') {
                match Regex::new(&format!("(?i){body}")) {
                    Ok(re) => Some(Pattern::Regex(re)),
                    Err(err) => {
                        warn!(pattern = %pattern, error = %err, "invalid exclusion regex, dropping");
                        None
                    }
                }
            } else if pattern.contains('*') || pattern.contains('?') {
                Some(Pattern::Glob(glob_to_regex(pattern)))
            } else {
                Some(Pattern::Exact(pattern.to_lowercase()))
            }
        })
        .collect()
}

/// True if `hostname` matches any of `patterns`.
#[must_use]
pub fn matches_any(patterns: &[Pattern], hostname: &str) -> bool {
    patterns.iter().any(|p| p.matches(hostname))
}

#[cfg(test)]
#[path = "exclusions_tests.rs"]
mod exclusions_tests;
