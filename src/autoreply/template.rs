//! Reply Templates
//!
//! Compiles a pattern/template pair into a reply generator. A template carries
//! `%s` slots that are filled, in order, from the pattern's capture groups.
//! `%%` renders a literal percent sign; any other `%` sequence is copied as-is.

use regex::{Regex, RegexBuilder};

/// Errors raised while building reply rules
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("Invalid regex pattern in rule {rule}: {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error(
        "Rule {rule} has {groups} capture group(s) but its template has {slots} placeholder(s)"
    )]
    PlaceholderMismatch {
        rule: String,
        groups: usize,
        slots: usize,
    },

    #[error("Duplicate rule ID: {0}")]
    DuplicateId(String),

    #[error("No reply rules are enabled")]
    NoRules,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot,
}

/// Split a template into literal runs and `%s` slots.
fn parse_template(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }
        match chars.peek() {
            Some('s') => {
                chars.next();
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Slot);
            }
            Some('%') => {
                chars.next();
                literal.push('%');
            }
            _ => literal.push('%'),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// A compiled reply rule: a pattern plus the template its captures fill.
#[derive(Debug, Clone)]
pub struct ReplyTemplate {
    id: String,
    regex: Regex,
    segments: Vec<Segment>,
    slots: usize,
}

impl ReplyTemplate {
    /// Build a case-sensitive reply template
    pub fn new(
        id: impl Into<String>,
        pattern: &str,
        template: &str,
    ) -> Result<Self, RuleError> {
        Self::build(id.into(), pattern, template, false)
    }

    /// Build a reply template whose pattern ignores case
    pub fn case_insensitive(
        id: impl Into<String>,
        pattern: &str,
        template: &str,
    ) -> Result<Self, RuleError> {
        Self::build(id.into(), pattern, template, true)
    }

    fn build(
        id: String,
        pattern: &str,
        template: &str,
        case_insensitive: bool,
    ) -> Result<Self, RuleError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|source| RuleError::InvalidPattern {
                rule: id.clone(),
                source,
            })?;

        let segments = parse_template(template);
        let slots = segments
            .iter()
            .filter(|s| matches!(s, Segment::Slot))
            .count();

        // captures_len counts the implicit whole-match group
        let groups = regex.captures_len() - 1;
        if groups != slots {
            return Err(RuleError::PlaceholderMismatch {
                rule: id,
                groups,
                slots,
            });
        }

        Ok(Self {
            id,
            regex,
            segments,
            slots,
        })
    }

    /// Rule identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of `%s` placeholders (equal to the pattern's capture groups)
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// The source pattern
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Render a reply for `text`, or `None` when the pattern does not match.
    ///
    /// Groups that did not take part in the match render as empty strings.
    pub fn render(&self, text: &str) -> Option<String> {
        let captures = self.regex.captures(text)?;
        let mut reply = String::new();
        let mut group = 1;

        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => reply.push_str(literal),
                Segment::Slot => {
                    if let Some(m) = captures.get(group) {
                        reply.push_str(m.as_str());
                    }
                    group += 1;
                }
            }
        }

        Some(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn love_rule() -> ReplyTemplate {
        ReplyTemplate::case_insensitive("love", r"I love (\w+) alot", "Alot love %s too! <3")
            .unwrap()
    }

    #[test]
    fn test_render_substitutes_capture() {
        let rule = love_rule();
        assert_eq!(
            rule.render("I love Go alot").as_deref(),
            Some("Alot love Go too! <3")
        );
    }

    #[test]
    fn test_render_is_case_insensitive_when_requested() {
        let rule = love_rule();
        assert_eq!(
            rule.render("well i LOVE rust ALOT, honestly").as_deref(),
            Some("Alot love rust too! <3")
        );
    }

    #[test]
    fn test_case_sensitive_rule_rejects_other_case() {
        let rule = ReplyTemplate::new("love", r"I love (\w+) alot", "%s!").unwrap();
        assert!(rule.render("i love go alot").is_none());
        assert_eq!(rule.render("I love go alot").as_deref(), Some("go!"));
    }

    #[test]
    fn test_no_match_returns_none() {
        let rule = love_rule();
        assert!(rule.render("I hate Go a lot").is_none());
        assert!(rule.render("").is_none());
    }

    #[test]
    fn test_multiple_slots_fill_in_order() {
        let rule =
            ReplyTemplate::new("pair", r"(\w+) and (\w+) alot", "first=%s second=%s").unwrap();
        assert_eq!(
            rule.render("cats and dogs alot").as_deref(),
            Some("first=cats second=dogs")
        );
        assert_eq!(rule.slots(), 2);
    }

    #[test]
    fn test_mismatched_counts_rejected_at_construction() {
        let err = ReplyTemplate::new("bad", r"(\w+) and (\w+)", "only %s").unwrap_err();
        match err {
            RuleError::PlaceholderMismatch {
                rule,
                groups,
                slots,
            } => {
                assert_eq!(rule, "bad");
                assert_eq!(groups, 2);
                assert_eq!(slots, 1);
            }
            other => panic!("Expected PlaceholderMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_more_slots_than_groups_rejected() {
        assert!(matches!(
            ReplyTemplate::new("bad", r"(\w+)", "%s %s"),
            Err(RuleError::PlaceholderMismatch { groups: 1, slots: 2, .. })
        ));
    }

    #[test]
    fn test_non_capturing_groups_do_not_count() {
        let rule = ReplyTemplate::new("nc", r"(?:hey|hi) (\w+)", "hello %s").unwrap();
        assert_eq!(rule.render("hi bob").as_deref(), Some("hello bob"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = ReplyTemplate::new("broken", "[invalid", "x").unwrap_err();
        assert!(matches!(err, RuleError::InvalidPattern { .. }));
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_percent_escapes() {
        let rule = ReplyTemplate::new("pct", r"(\d+) alot", "%s%% sure, %d stays").unwrap();
        assert_eq!(rule.slots(), 1);
        assert_eq!(
            rule.render("100 alot").as_deref(),
            Some("100% sure, %d stays")
        );
    }

    #[test]
    fn test_static_template_without_groups() {
        let rule = ReplyTemplate::new("static", "alot", "It's two words!").unwrap();
        assert_eq!(rule.render("I eat alot").as_deref(), Some("It's two words!"));
    }

    #[test]
    fn test_unmatched_optional_group_renders_empty() {
        let rule = ReplyTemplate::new("opt", r"alot(!+)?", "alot[%s]").unwrap();
        assert_eq!(rule.render("alot").as_deref(), Some("alot[]"));
        assert_eq!(rule.render("alot!!").as_deref(), Some("alot[!!]"));
    }

    #[test]
    fn test_parse_template_segments() {
        assert_eq!(
            parse_template("a%sb%"),
            vec![
                Segment::Literal("a".to_string()),
                Segment::Slot,
                Segment::Literal("b%".to_string()),
            ]
        );
    }
}
