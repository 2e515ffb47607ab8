//! Built-in anti-pattern rule catalogue.
//!
//! Rules are static, versioned-with-the-crate data organized by language.
//! Loading is side-effect-free and idempotent; asking for a language twice
//! yields value-identical rule lists.

use std::collections::HashSet;

use anyhow::Result;
use once_cell::sync::Lazy;

use super::{Language, Rule, RuleCatalogue, RuleValidationError};

mod go;
mod javascript;
mod python;
mod rust_rules;

static CATALOGUE: Lazy<Vec<Rule>> = Lazy::new(|| {
    let mut rules = Vec::new();
    rules.extend(go::rules());
    rules.extend(javascript::rules());
    rules.extend(python::rules());
    rules.extend(rust_rules::rules());
    rules
});

/// Every built-in rule, across all languages, in catalogue order.
pub fn all_rules() -> &'static [Rule] {
    &CATALOGUE
}

/// The built-in catalogue backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticCatalogue;

impl StaticCatalogue {
    pub fn new() -> Self {
        Self
    }
}

fn check_unique_ids(language: Language, rules: &[Rule]) -> Result<(), RuleValidationError> {
    let mut seen = HashSet::new();
    for rule in rules {
        if !seen.insert(rule.id.as_str()) {
            return Err(RuleValidationError::DuplicateId {
                rule_id: rule.id.clone(),
                language,
            });
        }
    }
    Ok(())
}

#[async_trait::async_trait]
impl RuleCatalogue for StaticCatalogue {
    async fn rules_for(&self, language: Language) -> Result<Vec<Rule>> {
        let rules: Vec<Rule> = CATALOGUE
            .iter()
            .filter(|rule| rule.language == language)
            .cloned()
            .collect();
        check_unique_ids(language, &rules)?;
        Ok(rules)
    }

    async fn get_rule(&self, language: Language, rule_id: &str) -> Result<Option<Rule>> {
        Ok(CATALOGUE
            .iter()
            .find(|rule| rule.language == language && rule.id == rule_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::matcher::CompiledRule;
    use crate::scanner::Risk;

    #[tokio::test]
    async fn every_language_ships_rules() {
        let catalogue = StaticCatalogue::new();
        for language in Language::ALL {
            let rules = catalogue.rules_for(language).await.unwrap();
            assert!(
                !rules.is_empty(),
                "language {language} must carry a rule set"
            );
            assert!(rules.iter().all(|rule| rule.language == language));
        }
    }

    #[test]
    fn every_rule_compiles() {
        for rule in all_rules() {
            CompiledRule::compile(rule.clone()).unwrap_or_else(|err| {
                panic!("rule `{}` ({}) failed to compile: {err}", rule.id, rule.language)
            });
        }
    }

    #[test]
    fn ids_are_unique_within_each_language() {
        for language in Language::ALL {
            let mut seen = HashSet::new();
            for rule in all_rules().iter().filter(|r| r.language == language) {
                assert!(
                    seen.insert(rule.id.as_str()),
                    "duplicate id `{}` in {language}",
                    rule.id
                );
            }
        }
    }

    #[test]
    fn secret_family_spans_every_language() {
        for language in Language::ALL {
            assert!(
                all_rules()
                    .iter()
                    .any(|r| r.language == language && r.id == "HARDCODED_SECRET"),
                "{language} must carry the hardcoded-secret rule"
            );
        }
    }

    #[test]
    fn every_rule_carries_examples_and_guidance() {
        for rule in all_rules() {
            assert!(!rule.before_example.trim().is_empty(), "{}", rule.id);
            assert!(!rule.after_example.trim().is_empty(), "{}", rule.id);
            assert!(!rule.guidance.trim().is_empty(), "{}", rule.id);
            assert!(
                matches!(rule.risk, Risk::Critical | Risk::High | Risk::Medium),
                "{}",
                rule.id
            );
        }
    }

    #[tokio::test]
    async fn loading_twice_is_value_identical() {
        let catalogue = StaticCatalogue::new();
        let first = catalogue.rules_for(Language::Python).await.unwrap();
        let second = catalogue.rules_for(Language::Python).await.unwrap();
        let first_ids: Vec<_> = first.iter().map(|r| r.id.clone()).collect();
        let second_ids: Vec<_> = second.iter().map(|r| r.id.clone()).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[tokio::test]
    async fn get_rule_finds_by_language_and_id() {
        let catalogue = StaticCatalogue::new();
        let rule = catalogue
            .get_rule(Language::Go, "IGNORED_ERROR")
            .await
            .unwrap();
        assert!(rule.is_some());
        let missing = catalogue
            .get_rule(Language::Python, "IGNORED_ERROR")
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
