// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2026 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Topic pattern matching for `+`/`#` wildcard subscriptions.
//!
//! A short topic is the tokenized tail of a full topic, i.e. a full topic with the
//! `N/<system-id>/` prefix stripped and the remainder split on `/`. A pattern is the same shape,
//! but individual segments may be `+` (match exactly one segment) or, as the final segment only,
//! `#` (match all remaining segments, including zero).

use std::fmt;

/// A tokenized short topic, e.g. `system/0/Serial` becomes `["system", "0", "Serial"]`.
pub type ShortTopic = Vec<String>;

/// Splits a full topic (`N/<system-id>/...`) into its short-topic tokens.
#[must_use]
pub fn short_topic_of(full_topic: &str) -> ShortTopic {
    full_topic
        .splitn(3, '/')
        .nth(2)
        .unwrap_or("")
        .split('/')
        .map(str::to_string)
        .collect()
}

/// A parsed subscription pattern.
///
/// `Exact` patterns contain no wildcard segments and use a direct vector comparison; `Wild`
/// patterns contain at least one `+` or a terminal `#` and fall back to the general matcher.
/// Keeping the two apart is a fast-path requirement, not a semantic one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// Matches every topic unconditionally (the keepalive "subscribe all" entry).
    AllWildcard,
    Exact(Vec<String>),
    Wild(Vec<String>),
}

impl Pattern {
    /// Parses a pattern string such as `system/+/Relay/0/State` or `system/#`.
    #[must_use]
    pub fn parse(pattern: &str) -> Self {
        let segments: Vec<String> = pattern.split('/').map(str::to_string).collect();
        if segments.iter().any(|s| s == "+" || s == "#") {
            Self::Wild(segments)
        } else {
            Self::Exact(segments)
        }
    }

    /// Matches `short` against this pattern.
    #[must_use]
    pub fn matches(&self, short: &[String]) -> bool {
        match self {
            Self::AllWildcard => true,
            Self::Exact(segments) => segments.as_slice() == short,
            Self::Wild(segments) => matches_wild(segments, short),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllWildcard => f.write_str("#"),
            Self::Exact(s) | Self::Wild(s) => f.write_str(&s.join("/")),
        }
    }
}

/// Segment-by-segment match allowing `+` (one segment) and a terminal `#` (all remaining).
///
/// Mirrors a `zip_longest` walk: if one side runs out before the other and no `#` has been seen,
/// the match fails; `#` short-circuits to a match regardless of what remains on either side.
fn matches_wild(pattern: &[String], topic: &[String]) -> bool {
    let mut pi = 0;
    let mut ti = 0;
    loop {
        match (pattern.get(pi), topic.get(ti)) {
            (None, None) => return true,
            (Some(p), _) if p == "#" => return true,
            (None, Some(_)) | (Some(_), None) => return false,
            (Some(p), Some(_)) if p == "+" => {}
            (Some(p), Some(t)) if p == t => {}
            _ => return false,
        }
        pi += 1;
        ti += 1;
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("system/0/Serial", "system/0/Serial", true)]
    #[case("system/+/Serial", "system/0/Serial", true)]
    #[case("system/+/Serial", "system/0/1/Serial", false)]
    #[case("system/#", "system/0/Serial", true)]
    // `#` matches zero trailing segments too: a terminal `#` is satisfied the instant the
    // fixed prefix before it has matched, with nothing left over to check.
    #[case("system/#", "system", true)]
    #[case("system/0/#", "system/0", true)]
    #[case("system/0/#", "system/0/a/b/c", true)]
    #[case("inverter/+/voltage", "system/0/voltage", false)]
    fn test_pattern_matches(#[case] pattern: &str, #[case] topic: &str, #[case] expected: bool) {
        let pattern = Pattern::parse(pattern);
        let topic: ShortTopic = topic.split('/').map(str::to_string).collect();
        assert_eq!(pattern.matches(&topic), expected);
    }

    #[test]
    fn test_all_wildcard_matches_everything() {
        let pattern = Pattern::AllWildcard;
        assert!(pattern.matches(&["anything".to_string()]));
        assert!(pattern.matches(&[]));
    }

    #[test]
    fn test_fast_path_is_exact_when_no_wildcards() {
        assert!(matches!(Pattern::parse("a/b/c"), Pattern::Exact(_)));
        assert!(matches!(Pattern::parse("a/+/c"), Pattern::Wild(_)));
        assert!(matches!(Pattern::parse("a/b/#"), Pattern::Wild(_)));
    }

    #[test]
    fn test_pattern_equality_is_on_tokenized_form() {
        assert_eq!(Pattern::parse("a/b/c"), Pattern::parse("a/b/c"));
        assert_ne!(Pattern::parse("a/b/c"), Pattern::parse("a/b/d"));
    }

    #[test]
    fn test_short_topic_of_strips_prefix() {
        assert_eq!(
            short_topic_of("N/d0ff500097c0/system/0/Serial"),
            vec!["system", "0", "Serial"]
        );
    }
}
