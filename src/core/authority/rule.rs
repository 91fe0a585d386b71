use crate::base::SentinelRule;
use crate::Error;
use serde::{Deserialize, Serialize};
use serde_json;
use std::fmt;
use std::hash::{Hash, Hasher};

/// `AuthorityStrategy` indicates the decision direction of an [`Rule`]'s origin list.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, Hash, Eq)]
pub enum AuthorityStrategy {
    /// `White` blocks any origin NOT present in `rule.rule_list`.
    White,
    /// `Black` blocks any origin present in `rule.rule_list`.
    Black,
}

impl Default for AuthorityStrategy {
    fn default() -> AuthorityStrategy {
        AuthorityStrategy::White
    }
}

/// `Rule` describes the origin allow/deny policy for a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    /// `id` represents the unique ID of the rule (optional).
    pub id: String,
    /// `resource` represents the target resource definition.
    pub resource: String,
    pub strategy: AuthorityStrategy,
    /// `rule_list` is a comma-separated list of origins this rule checks against.
    pub rule_list: String,
}

impl Default for Rule {
    fn default() -> Self {
        Rule {
            #[cfg(target_arch = "wasm32")]
            id: String::new(),
            #[cfg(not(target_arch = "wasm32"))]
            id: uuid::Uuid::new_v4().to_string(),
            resource: String::default(),
            strategy: AuthorityStrategy::default(),
            rule_list: String::default(),
        }
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.resource == other.resource
            && self.strategy == other.strategy
            && self.rule_list == other.rule_list
    }
}

impl Eq for Rule {}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.resource.hash(state);
    }
}

impl Rule {
    /// Returns whether `origin` is one of the comma-separated tokens in `rule_list`.
    pub fn origin_matches(&self, origin: &str) -> bool {
        if origin.is_empty() {
            return false;
        }
        self.rule_list.split(',').any(|item| item.trim() == origin)
    }
}

impl SentinelRule for Rule {
    fn resource_name(&self) -> String {
        self.resource.clone()
    }

    fn is_valid(&self) -> crate::Result<()> {
        if self.resource.is_empty() {
            return Err(Error::msg("empty resource of authority rule"));
        }
        if self.rule_list.is_empty() {
            return Err(Error::msg("empty rule_list of authority rule"));
        }
        Ok(())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmtted = serde_json::to_string_pretty(self).unwrap();
        write!(f, "{}", fmtted)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    #[should_panic(expected = "empty resource of authority rule")]
    fn invalid_resource() {
        let rule = Rule {
            rule_list: "a,b".into(),
            ..Default::default()
        };
        rule.is_valid().unwrap();
    }

    #[test]
    #[should_panic(expected = "empty rule_list of authority rule")]
    fn invalid_rule_list() {
        let rule = Rule {
            resource: "abc".into(),
            ..Default::default()
        };
        rule.is_valid().unwrap();
    }

    #[test]
    fn origin_matches() {
        let rule = Rule {
            resource: "abc".into(),
            rule_list: "a, b,c".into(),
            ..Default::default()
        };
        assert!(rule.origin_matches("b"));
        assert!(!rule.origin_matches("d"));
        assert!(!rule.origin_matches(""));
    }
}
