//! Per-request claim policy.
//!
//! A policy is derived from query parameters: `claims_<name>=<value>`
//! registers a literal pattern for claim `<name>`, and
//! `claims_regexp_<name>=<pattern>` registers a regex pattern. Parameters
//! may repeat; all patterns registered under one claim name form an OR-set,
//! and the claim names combine with logical AND.

use crate::auth::claims::{ClaimSet, ClaimValue};
use crate::pattern_cache::PatternCache;
use std::collections::HashMap;

const LITERAL_PREFIX: &str = "claims_";
const REGEX_PREFIX: &str = "regexp_";

/// A single acceptable value pattern, literal or regex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub text: String,
    pub is_regex: bool,
}

/// Claim-name -> acceptable-pattern constraints for one request.
///
/// Constructed fresh per request and never persisted.
#[derive(Debug, Default)]
pub struct ClaimPolicy {
    rules: HashMap<String, Vec<Pattern>>,
}

impl ClaimPolicy {
    /// Derive the policy from request query parameters.
    ///
    /// Parameters without the `claims_` prefix are ignored.
    pub fn from_query(params: &[(String, String)]) -> Self {
        let mut rules: HashMap<String, Vec<Pattern>> = HashMap::new();

        for (key, value) in params {
            let Some(rest) = key.strip_prefix(LITERAL_PREFIX) else {
                continue;
            };

            let (name, is_regex) = match rest.strip_prefix(REGEX_PREFIX) {
                Some(name) => (name, true),
                None => (rest, false),
            };

            rules.entry(name.to_string()).or_default().push(Pattern {
                text: value.clone(),
                is_regex,
            });
        }

        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Decide whether `claims` satisfies this policy.
    ///
    /// An empty policy accepts unconditionally: a `/validate` call without
    /// any `claims_` parameter performs signature verification only. The
    /// warning log makes the permissive default visible in operation.
    ///
    /// Evaluation is AND across claim names with short-circuit on the first
    /// rejected name, and OR across the patterns under one name. A scalar
    /// claim must match some pattern; a sequence claim must contain some
    /// element matching some pattern (an empty sequence can never satisfy a
    /// non-empty pattern set); an absent claim or any other value shape
    /// rejects.
    pub fn evaluate(&self, claims: &ClaimSet, patterns: &PatternCache) -> bool {
        if self.rules.is_empty() {
            tracing::warn!(
                target: "sra.policy",
                "No claim requirements in request, accepting any verified token"
            );
            return true;
        }

        for (name, accepted) in &self.rules {
            if !self.check_claim(name, accepted, claims, patterns) {
                tracing::debug!(
                    target: "sra.policy",
                    claim = %name,
                    "Token claims did not match required values"
                );
                return false;
            }
        }

        true
    }

    fn check_claim(
        &self,
        name: &str,
        accepted: &[Pattern],
        claims: &ClaimSet,
        patterns: &PatternCache,
    ) -> bool {
        match claims.get(name) {
            Some(ClaimValue::Scalar(actual)) => accepted
                .iter()
                .any(|pattern| matches_value(pattern, actual, patterns)),
            Some(ClaimValue::Sequence(actuals)) => {
                if actuals.is_empty() {
                    return false;
                }
                actuals.iter().any(|actual| {
                    accepted
                        .iter()
                        .any(|pattern| matches_value(pattern, actual, patterns))
                })
            }
            Some(ClaimValue::Other) => {
                tracing::warn!(
                    target: "sra.policy",
                    claim = %name,
                    "Claim has an unsupported value shape, rejecting"
                );
                false
            }
            None => false,
        }
    }
}

fn matches_value(pattern: &Pattern, actual: &str, patterns: &PatternCache) -> bool {
    if pattern.is_regex {
        patterns.is_match(&pattern.text, actual)
    } else {
        pattern.text == actual
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn claims(value: serde_json::Value) -> ClaimSet {
        match value {
            serde_json::Value::Object(map) => ClaimSet::new(map),
            _ => unreachable!("test claims must be an object"),
        }
    }

    #[test]
    fn test_from_query_parses_literals_and_regexes() {
        let policy = ClaimPolicy::from_query(&params(&[
            ("claims_group", "developers"),
            ("claims_group", "administrators"),
            ("claims_regexp_role", "^admin.*"),
            ("cookie", "session"),
            ("headers_x", "sub"),
        ]));

        assert_eq!(policy.rules.len(), 2);
        assert_eq!(
            policy.rules.get("group"),
            Some(&vec![
                Pattern {
                    text: "developers".to_string(),
                    is_regex: false
                },
                Pattern {
                    text: "administrators".to_string(),
                    is_regex: false
                },
            ])
        );
        assert_eq!(
            policy.rules.get("role"),
            Some(&vec![Pattern {
                text: "^admin.*".to_string(),
                is_regex: true
            }])
        );
    }

    #[test]
    fn test_literal_and_regex_for_same_claim_merge() {
        let policy = ClaimPolicy::from_query(&params(&[
            ("claims_role", "superuser"),
            ("claims_regexp_role", "^admin"),
        ]));

        let rules = policy.rules.get("role").unwrap();
        assert_eq!(rules.len(), 2);

        // Either pattern is sufficient (OR within a claim name)
        let cache = PatternCache::new();
        assert!(policy.evaluate(&claims(json!({"role": "superuser"})), &cache));
        assert!(policy.evaluate(&claims(json!({"role": "administrator"})), &cache));
        assert!(!policy.evaluate(&claims(json!({"role": "user"})), &cache));
    }

    #[test]
    fn test_empty_policy_accepts_unconditionally() {
        // Documented permissive default: no claims_ parameters means
        // signature verification only.
        let policy = ClaimPolicy::from_query(&params(&[("cookie", "session")]));
        assert!(policy.is_empty());

        let cache = PatternCache::new();
        assert!(policy.evaluate(&claims(json!({})), &cache));
        assert!(policy.evaluate(&claims(json!({"group": ["anything"]})), &cache));
    }

    #[test]
    fn test_and_across_claim_names_or_across_values() {
        let policy = ClaimPolicy::from_query(&params(&[
            ("claims_group", "developers"),
            ("claims_group", "administrators"),
            ("claims_location", "hq"),
        ]));
        let cache = PatternCache::new();

        assert!(policy.evaluate(
            &claims(json!({"group": ["developers"], "location": "hq"})),
            &cache
        ));
        assert!(!policy.evaluate(
            &claims(json!({"group": ["sales"], "location": "hq"})),
            &cache
        ));
        assert!(!policy.evaluate(&claims(json!({"group": ["developers"]})), &cache));
    }

    #[test]
    fn test_empty_array_never_satisfies() {
        let policy = ClaimPolicy::from_query(&params(&[("claims_group", "developers")]));
        let cache = PatternCache::new();

        assert!(!policy.evaluate(&claims(json!({"group": []})), &cache));
    }

    #[test]
    fn test_absent_claim_rejects() {
        let policy = ClaimPolicy::from_query(&params(&[("claims_group", "developers")]));
        let cache = PatternCache::new();

        assert!(!policy.evaluate(&claims(json!({"other": "developers"})), &cache));
    }

    #[test]
    fn test_unsupported_claim_shape_rejects() {
        let policy = ClaimPolicy::from_query(&params(&[("claims_group", "42")]));
        let cache = PatternCache::new();

        assert!(!policy.evaluate(&claims(json!({"group": 42})), &cache));
        assert!(!policy.evaluate(&claims(json!({"group": {"nested": true}})), &cache));
    }

    #[test]
    fn test_regex_matching() {
        let policy = ClaimPolicy::from_query(&params(&[("claims_regexp_role", "^admin.*")]));
        let cache = PatternCache::new();

        assert!(policy.evaluate(&claims(json!({"role": "administrator"})), &cache));
        assert!(!policy.evaluate(&claims(json!({"role": "user"})), &cache));
    }

    #[test]
    fn test_regex_against_sequence() {
        let policy = ClaimPolicy::from_query(&params(&[("claims_regexp_group", "^dev")]));
        let cache = PatternCache::new();

        assert!(policy.evaluate(&claims(json!({"group": ["sales", "developers"]})), &cache));
        assert!(!policy.evaluate(&claims(json!({"group": ["sales", "support"]})), &cache));
    }

    #[test]
    fn test_malformed_regex_is_non_match_not_error() {
        let policy = ClaimPolicy::from_query(&params(&[
            ("claims_regexp_role", "[unclosed"),
            ("claims_role", "admin"),
        ]));
        let cache = PatternCache::new();

        // Malformed pattern contributes nothing; the literal still matches
        assert!(policy.evaluate(&claims(json!({"role": "admin"})), &cache));
        assert!(!policy.evaluate(&claims(json!({"role": "other"})), &cache));
    }

    #[test]
    fn test_literal_is_exact_not_substring() {
        let policy = ClaimPolicy::from_query(&params(&[("claims_group", "dev")]));
        let cache = PatternCache::new();

        assert!(!policy.evaluate(&claims(json!({"group": "developers"})), &cache));
        assert!(policy.evaluate(&claims(json!({"group": "dev"})), &cache));
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let policy = ClaimPolicy::from_query(&params(&[
            ("claims_group", "developers"),
            ("claims_regexp_role", "^admin"),
        ]));
        let cache = PatternCache::new();
        let accepted = claims(json!({"group": ["developers"], "role": "administrator"}));
        let rejected = claims(json!({"group": ["sales"], "role": "administrator"}));

        for _ in 0..10 {
            assert!(policy.evaluate(&accepted, &cache));
            assert!(!policy.evaluate(&rejected, &cache));
        }
    }
}
