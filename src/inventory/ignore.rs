use std::collections::BTreeMap;

use anyhow::{Result, Context};
use regex::Regex;
use tracing::trace;

use crate::config::{compile_anchored, IgnoreRule};

/// Evaluates a spec's ordered ignore rules against a row's labels. Patterns
/// compile once per spec invocation, not per row.
#[derive(Debug)]
pub struct IgnoreMatcher {
    rules: Vec<Vec<(String, Option<Regex>)>>,
}

impl IgnoreMatcher {
    pub fn new(rules: &[IgnoreRule]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let mut pairs = Vec::with_capacity(rule.len());
            for (label, pattern) in rule {
                let matcher = if pattern.is_empty() {
                    // Empty pattern: match when the label is missing
                    None
                } else {
                    Some(compile_anchored(pattern).with_context(|| {
                        format!("Invalid ignore pattern '{}' for label '{}'", pattern, label)
                    })?)
                };
                pairs.push((label.clone(), matcher));
            }
            compiled.push(pairs);
        }
        Ok(Self { rules: compiled })
    }

    /// True when any rule pair matches: an empty pattern matches a missing
    /// label, a non-empty pattern prefix-matches the label value. The first
    /// match short-circuits.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        for rule in &self.rules {
            for (label, pattern) in rule {
                match pattern {
                    None => {
                        if !labels.contains_key(label) {
                            trace!("Ignore rule matched: label '{}' absent", label);
                            return true;
                        }
                    }
                    Some(re) => {
                        if labels.get(label).is_some_and(|value| re.is_match(value)) {
                            trace!("Ignore rule matched on label '{}'", label);
                            return true;
                        }
                    }
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn rule(pairs: &[(&str, &str)]) -> IgnoreRule {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn value_matches_as_prefix_only() {
        let matcher = IgnoreMatcher::new(&[rule(&[("role", "spare")])]).unwrap();
        assert!(matcher.matches(&labels(&[("role", "spare")])));
        assert!(matcher.matches(&labels(&[("role", "spare-pool")])));
        // Anchored at the start: a mid-string occurrence is not a match
        assert!(!matcher.matches(&labels(&[("role", "hot-spare")])));
    }

    #[test]
    fn empty_pattern_matches_missing_label() {
        let matcher = IgnoreMatcher::new(&[rule(&[("serial", "")])]).unwrap();
        assert!(matcher.matches(&labels(&[("role", "leaf")])));
        assert!(!matcher.matches(&labels(&[("serial", "SN1")])));
    }

    #[test]
    fn any_pair_in_a_rule_matches() {
        let matcher =
            IgnoreMatcher::new(&[rule(&[("role", "spare"), ("state", "retired")])]).unwrap();
        assert!(matcher.matches(&labels(&[("state", "retired")])));
        assert!(matcher.matches(&labels(&[("role", "spare")])));
        assert!(!matcher.matches(&labels(&[("role", "leaf"), ("state", "up")])));
    }

    #[test]
    fn no_rules_never_match() {
        let matcher = IgnoreMatcher::new(&[]).unwrap();
        assert!(!matcher.matches(&labels(&[("role", "anything")])));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(IgnoreMatcher::new(&[rule(&[("role", "(unclosed")])]).is_err());
    }
}
