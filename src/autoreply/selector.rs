//! Response selection.
//!
//! Decides which reply rules get a chance at a post. Two policies exist:
//!
//! - [`SelectionPolicy::TryAll`] runs every rule in order and keeps every reply
//!   produced, so a post matching several rules gets several replies unless
//!   `first_match_only` is set.
//! - [`SelectionPolicy::SingleCursor`] only runs the rule under the cursor; a
//!   successful reply moves the cursor to a uniformly random rule.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::template::ReplyTemplate;

/// Rule selection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Try every rule, in order, on each post
    #[default]
    TryAll,
    /// Try only the rule under the cursor
    SingleCursor,
}

impl FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "try_all" | "try-all" | "all" => Ok(Self::TryAll),
            "single_cursor" | "single-cursor" | "cursor" => Ok(Self::SingleCursor),
            other => Err(format!(
                "unknown selection policy {:?} (expected try_all or single_cursor)",
                other
            )),
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TryAll => f.write_str("try_all"),
            Self::SingleCursor => f.write_str("single_cursor"),
        }
    }
}

/// Ordered, immutable set of compiled reply rules
#[derive(Debug, Clone, Default)]
pub struct ReplyRuleSet {
    rules: Vec<ReplyTemplate>,
}

impl ReplyRuleSet {
    pub fn new(rules: Vec<ReplyTemplate>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ReplyTemplate> {
        self.rules.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReplyTemplate> {
        self.rules.iter()
    }
}

/// A reply produced by one rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Position of the rule in the rule set
    pub rule_index: usize,
    /// Rule ID
    pub rule_id: String,
    /// Rendered reply body (not yet upper-cased or addressed)
    pub body: String,
}

/// Picks replies for eligible posts
pub struct ResponseSelector {
    rules: ReplyRuleSet,
    policy: SelectionPolicy,
    first_match_only: bool,
    cursor: usize,
    rng: StdRng,
}

impl fmt::Debug for ResponseSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseSelector")
            .field("rules", &self.rules.len())
            .field("policy", &self.policy)
            .field("first_match_only", &self.first_match_only)
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl ResponseSelector {
    /// Create a selector with the cursor on the first rule
    pub fn new(rules: ReplyRuleSet, policy: SelectionPolicy) -> Self {
        Self {
            rules,
            policy,
            first_match_only: false,
            cursor: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Use a specific random source for cursor moves
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Stop `TryAll` after the first rule that replies
    pub fn first_match_only(mut self, first_only: bool) -> Self {
        self.first_match_only = first_only;
        self
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Current cursor (only advanced under `SingleCursor`)
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn rules(&self) -> &ReplyRuleSet {
        &self.rules
    }

    /// Select replies for `text`, advancing the cursor where the policy says so
    pub fn select(&mut self, text: &str) -> Vec<Selection> {
        match self.policy {
            SelectionPolicy::TryAll => self.try_all(text),
            SelectionPolicy::SingleCursor => self.try_cursor(text).into_iter().collect(),
        }
    }

    fn try_all(&self, text: &str) -> Vec<Selection> {
        let mut selections = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            if let Some(selection) = render(index, rule, text) {
                selections.push(selection);
                if self.first_match_only {
                    break;
                }
            }
        }
        selections
    }

    fn try_cursor(&mut self, text: &str) -> Option<Selection> {
        let rule = self.rules.get(self.cursor)?;
        let selection = render(self.cursor, rule, text)?;
        self.cursor = self.rng.gen_range(0..self.rules.len());
        Some(selection)
    }
}

/// An empty rendering counts as no match
fn render(index: usize, rule: &ReplyTemplate, text: &str) -> Option<Selection> {
    rule.render(text).filter(|body| !body.is_empty()).map(|body| Selection {
        rule_index: index,
        rule_id: rule.id().to_string(),
        body,
    })
}
