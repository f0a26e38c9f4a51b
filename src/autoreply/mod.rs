//! Auto-reply Module
//!
//! Rate-limited, pattern-driven replies to posts from the stream.
//! Rules pair a regex with a `%s` template; a selector decides which rules run
//! and the engine enforces the cooldown between replies.

pub mod classify;
pub mod config;
pub mod engine;
pub mod selector;
pub mod template;

pub use classify::is_repost;
pub use config::{default_rules, AutoReplyConfig, ReplyRuleConfig};
pub use engine::{
    contains_trigger, format_reply, Clock, CooldownState, HandleOutcome, HandlerStats,
    ReplyHandler, SystemClock,
};
pub use selector::{ReplyRuleSet, ResponseSelector, Selection, SelectionPolicy};
pub use template::{ReplyTemplate, RuleError};
