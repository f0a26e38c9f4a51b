//! Auto-reply Configuration
//!
//! Reply rules and the behaviour knobs of the rate-limited reply handler.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::selector::{ReplyRuleSet, SelectionPolicy};
use super::template::{ReplyTemplate, RuleError};

/// Default trigger keyword
pub const DEFAULT_TRIGGER: &str = "alot";

/// Default minimum time between replies (5 minutes)
pub const DEFAULT_MIN_INTERVAL_SECONDS: u64 = 5 * 60;

/// A pattern/template pair as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRuleConfig {
    /// Rule ID (unique identifier)
    pub id: String,
    /// Regular expression; its capture groups fill the template
    pub pattern: String,
    /// Reply template with one `%s` per capture group
    pub template: String,
    /// Match the pattern ignoring case
    #[serde(default)]
    pub case_insensitive: bool,
    /// Whether rule is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl ReplyRuleConfig {
    /// Create a new, enabled, case-sensitive rule
    pub fn new(
        id: impl Into<String>,
        pattern: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            pattern: pattern.into(),
            template: template.into(),
            case_insensitive: false,
            enabled: true,
        }
    }

    /// Set case-insensitive matching
    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    /// Set enabled flag
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Compile into a reply template
    pub fn compile(&self) -> Result<ReplyTemplate, RuleError> {
        if self.case_insensitive {
            ReplyTemplate::case_insensitive(&self.id, &self.pattern, &self.template)
        } else {
            ReplyTemplate::new(&self.id, &self.pattern, &self.template)
        }
    }
}

/// The rules the bot started out with
pub fn default_rules() -> Vec<ReplyRuleConfig> {
    vec![
        ReplyRuleConfig::new("love-alot", r"I love (\w+) alot", "Alot love %s too! <3")
            .with_case_insensitive(true),
        ReplyRuleConfig::new("like-alot", r"I like (\w+) alot", "Alot like %s too! :D")
            .with_case_insensitive(true),
    ]
}

/// Auto-reply configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoReplyConfig {
    /// Keyword a post must contain (case-insensitive) to be considered
    pub trigger_keyword: String,
    /// Minimum seconds between two replies
    pub min_interval_seconds: u64,
    /// How rules are chosen for a post
    pub policy: SelectionPolicy,
    /// Under `try_all`, stop after the first rule that replies
    pub first_match_only: bool,
    /// Reply rules, tried in order
    pub rules: Vec<ReplyRuleConfig>,
}

impl Default for AutoReplyConfig {
    fn default() -> Self {
        Self {
            trigger_keyword: DEFAULT_TRIGGER.to_string(),
            min_interval_seconds: DEFAULT_MIN_INTERVAL_SECONDS,
            policy: SelectionPolicy::default(),
            first_match_only: false,
            rules: default_rules(),
        }
    }
}

impl AutoReplyConfig {
    /// Create a config with the default rule table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config with no rules
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            ..Self::default()
        }
    }

    /// Add a rule at the end of the trial order
    pub fn add_rule(&mut self, rule: ReplyRuleConfig) {
        self.rules.push(rule);
    }

    /// Get a rule by ID
    pub fn get_rule(&self, rule_id: &str) -> Option<&ReplyRuleConfig> {
        self.rules.iter().find(|r| r.id == rule_id)
    }

    /// Enabled rules, in order
    pub fn enabled_rules(&self) -> impl Iterator<Item = &ReplyRuleConfig> {
        self.rules.iter().filter(|r| r.enabled)
    }

    /// Minimum interval as a time delta; `None` if zero or out of range
    pub fn min_interval(&self) -> Option<TimeDelta> {
        if self.min_interval_seconds == 0 {
            return None;
        }
        i64::try_from(self.min_interval_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
    }

    /// Compile the enabled rules, rejecting duplicates and bad templates
    pub fn build_rule_set(&self) -> Result<ReplyRuleSet, RuleError> {
        let mut seen_ids = HashSet::new();
        for rule in &self.rules {
            if !seen_ids.insert(rule.id.as_str()) {
                return Err(RuleError::DuplicateId(rule.id.clone()));
            }
        }

        let compiled = self
            .enabled_rules()
            .map(ReplyRuleConfig::compile)
            .collect::<Result<Vec<_>, _>>()?;

        if compiled.is_empty() {
            return Err(RuleError::NoRules);
        }
        Ok(ReplyRuleSet::new(compiled))
    }
}
