// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shell-style glob matching shared by the Traefik router filter and the
//! domain exclusion list, so both follow the same `*`/`?` semantics.

use regex::{escape, Regex};

/// Compile a glob pattern (`*` = any run of characters, `?` = exactly one)
/// into an anchored, case-insensitive [`Regex`].
///
/// An empty pattern compiles to a regex that matches everything, which is
/// the "no filter configured" case for both call sites.
pub fn glob_to_regex(pattern: &str) -> Regex {
    if pattern.is_empty() {
        return Regex::new("^.*$").expect("static pattern is valid");
    }
    let mut body = String::with_capacity(pattern.len() * 2);
    body.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => body.push_str(".*"),
            '?' => body.push('.'),
            other => body.push_str(&escape(&other.to_string())),
        }
    }
    body.push('$');
    Regex::new(&format!("(?i){body}")).expect("glob-derived pattern is always valid")
}

/// Match `value` against a glob `pattern`. An empty pattern always matches.
#[must_use]
pub fn glob_matches(pattern: &str, value: &str) -> bool {
    glob_to_regex(pattern).is_match(value)
}

#[cfg(test)]
#[path = "patterns_tests.rs"]
mod patterns_tests;
