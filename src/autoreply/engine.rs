//! Auto-reply Engine
//!
//! The rate-limited reply handler. Every incoming post goes through, in order:
//!
//! 1. the cooldown check (a post arriving before `last_reply + min_interval`
//!    is ignored outright),
//! 2. the repost filter,
//! 3. the trigger keyword filter (case-insensitive substring),
//! 4. the response selector.
//!
//! Each reply the selector produces is addressed to the post's author,
//! upper-cased and queued on the outbox. Queuing is fire-and-forget: the
//! cooldown restarts as soon as a reply is queued, whether or not the gateway
//! later manages to publish it.

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use tracing::{debug, info, trace};

use super::classify::is_repost;
use super::selector::ResponseSelector;
use crate::channels::{IncomingPost, OutgoingReply};
use crate::messages::Outbox;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// When the last reply went out and how long to wait before the next one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownState {
    last_reply_at: DateTime<Utc>,
    min_interval: TimeDelta,
}

impl CooldownState {
    /// Start armed: the first eligible post at `now` may reply immediately
    pub fn new(now: DateTime<Utc>, min_interval: TimeDelta) -> Self {
        Self {
            last_reply_at: now
                .checked_sub_signed(min_interval)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            min_interval,
        }
    }

    /// Earliest time the next reply may go out
    pub fn ready_at(&self) -> DateTime<Utc> {
        self.last_reply_at
            .checked_add_signed(self.min_interval)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether the interval since the last reply has elapsed
    pub fn is_armed(&self, now: DateTime<Utc>) -> bool {
        now >= self.ready_at()
    }

    /// Restart the interval at `now`
    pub fn record_reply(&mut self, now: DateTime<Utc>) {
        self.last_reply_at = now;
    }

    pub fn last_reply_at(&self) -> DateTime<Utc> {
        self.last_reply_at
    }

    pub fn min_interval(&self) -> TimeDelta {
        self.min_interval
    }
}

/// What the handler did with a post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Within the cooldown interval; nothing else was checked
    Cooling,
    /// Post is a repost
    Repost,
    /// Post text lacks the trigger keyword
    NoTrigger,
    /// No rule produced a reply
    NoMatch,
    /// This many replies were queued
    Replied(usize),
}

/// Per-handler counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandlerStats {
    pub seen: u64,
    pub cooling: u64,
    pub reposts: u64,
    pub no_trigger: u64,
    pub no_match: u64,
    pub replies: u64,
}

impl HandlerStats {
    fn record(&mut self, outcome: HandleOutcome) {
        self.seen += 1;
        match outcome {
            HandleOutcome::Cooling => self.cooling += 1,
            HandleOutcome::Repost => self.reposts += 1,
            HandleOutcome::NoTrigger => self.no_trigger += 1,
            HandleOutcome::NoMatch => self.no_match += 1,
            HandleOutcome::Replied(n) => self.replies += n as u64,
        }
    }
}

/// Address a reply body to the author of `post`
pub fn format_reply(post: &IncomingPost, body: &str) -> OutgoingReply {
    OutgoingReply {
        body: format!("@{} {}", post.author_handle, body.to_uppercase()),
        in_reply_to: post.id.clone(),
    }
}

/// Case-insensitive trigger keyword test
pub fn contains_trigger(text: &str, keyword: &str) -> bool {
    text.to_lowercase().contains(&keyword.to_lowercase())
}

/// Stateful, rate-limited reply handler
#[derive(Debug)]
pub struct ReplyHandler<C: Clock = SystemClock> {
    selector: ResponseSelector,
    cooldown: CooldownState,
    trigger: String,
    clock: C,
    outbox: Outbox,
    stats: HandlerStats,
}

impl<C: Clock> ReplyHandler<C> {
    /// Create a handler that is armed at construction time
    pub fn new(
        selector: ResponseSelector,
        trigger_keyword: &str,
        min_interval: TimeDelta,
        clock: C,
        outbox: Outbox,
    ) -> Self {
        let cooldown = CooldownState::new(clock.now(), min_interval);
        Self {
            selector,
            cooldown,
            trigger: trigger_keyword.to_lowercase(),
            clock,
            outbox,
            stats: HandlerStats::default(),
        }
    }

    /// Handle one post from the stream
    pub fn handle_post(&mut self, post: &IncomingPost) -> HandleOutcome {
        let outcome = self.evaluate(post);
        self.stats.record(outcome);
        outcome
    }

    fn evaluate(&mut self, post: &IncomingPost) -> HandleOutcome {
        let now = self.clock.now();

        if !self.cooldown.is_armed(now) {
            trace!(post_id = %post.id, ready_at = %self.cooldown.ready_at(), "cooling down, ignoring post");
            return HandleOutcome::Cooling;
        }

        if is_repost(post) {
            trace!(post_id = %post.id, "ignoring repost");
            return HandleOutcome::Repost;
        }

        if !contains_trigger(&post.text, &self.trigger) {
            trace!(post_id = %post.id, "trigger keyword absent");
            return HandleOutcome::NoTrigger;
        }

        let selections = self.selector.select(&post.text);
        if selections.is_empty() {
            debug!(post_id = %post.id, "no rule matched");
            return HandleOutcome::NoMatch;
        }

        for selection in &selections {
            let reply = format_reply(post, &selection.body);
            info!(
                post_id = %post.id,
                author = %post.author_handle,
                rule = %selection.rule_id,
                reply = %reply.body,
                "queueing reply"
            );
            self.outbox.send(reply);
        }
        self.cooldown.record_reply(now);

        HandleOutcome::Replied(selections.len())
    }

    pub fn cooldown(&self) -> &CooldownState {
        &self.cooldown
    }

    pub fn selector(&self) -> &ResponseSelector {
        &self.selector
    }

    pub fn stats(&self) -> HandlerStats {
        self.stats
    }
}
