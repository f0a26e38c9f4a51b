//! Bot runtime
//!
//! Wires a gateway subscription to the reply handler and the delivery loop,
//! and runs until the post stream ends or shutdown is signalled.

use chrono::TimeDelta;
use futures_util::StreamExt;
use rand::rngs::StdRng;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::autoreply::{
    Clock, HandlerStats, ReplyHandler, ReplyRuleSet, ResponseSelector, SelectionPolicy,
    SystemClock,
};
use crate::channels::{DynGateway, GatewayError};
use crate::config::{BotConfig, ConfigError};
use crate::messages::{delivery_loop, DeliveryStats, Outbox};

/// Bot runtime errors
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Delivery task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// What a finished run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub handler: HandlerStats,
    pub delivery: DeliveryStats,
    /// Stream items that failed to decode
    pub malformed: u64,
}

/// A configured, not yet running bot
#[derive(Debug)]
pub struct Bot<C: Clock = SystemClock> {
    rules: ReplyRuleSet,
    policy: SelectionPolicy,
    first_match_only: bool,
    trigger: String,
    min_interval: TimeDelta,
    clock: C,
    rng: Option<StdRng>,
}

impl Bot<SystemClock> {
    /// Validate `config` and compile its rules
    pub fn new(config: &BotConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            rules: config.rule_set()?,
            policy: config.autoreply.policy,
            first_match_only: config.autoreply.first_match_only,
            trigger: config.autoreply.trigger_keyword.clone(),
            min_interval: config.min_interval()?,
            clock: SystemClock,
            rng: None,
        })
    }
}

impl<C: Clock> Bot<C> {
    /// Use a different time source
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Bot<C2> {
        Bot {
            rules: self.rules,
            policy: self.policy,
            first_match_only: self.first_match_only,
            trigger: self.trigger,
            min_interval: self.min_interval,
            clock,
            rng: self.rng,
        }
    }

    /// Seed the cursor policy's random source
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Some(rng);
        self
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// Run against `gateway` until its stream ends or `shutdown` becomes `true`
    pub async fn run(
        self,
        gateway: DynGateway,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<RunSummary, BotError> {
        let mut selector = ResponseSelector::new(self.rules, self.policy)
            .first_match_only(self.first_match_only);
        if let Some(rng) = self.rng {
            selector = selector.with_rng(rng);
        }

        let mut stream = gateway.subscribe(&self.trigger).await?;

        let (outbox, rx) = Outbox::channel();
        let delivery = tokio::spawn(delivery_loop(rx, gateway.clone()));

        let mut handler = ReplyHandler::new(
            selector,
            &self.trigger,
            self.min_interval,
            self.clock,
            outbox,
        );

        info!(
            gateway = gateway.name(),
            trigger = %self.trigger,
            min_interval_secs = self.min_interval.num_seconds(),
            policy = %self.policy,
            "Bot started"
        );

        let mut malformed = 0u64;
        loop {
            if *shutdown.borrow_and_update() {
                info!("Shutdown requested");
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        info!("Shutdown signal dropped, stopping");
                        break;
                    }
                }
                item = stream.next() => match item {
                    Some(Ok(post)) => {
                        handler.handle_post(&post);
                    }
                    Some(Err(e)) => {
                        malformed += 1;
                        warn!(error = %e, "Skipping malformed post");
                    }
                    None => {
                        info!("Post stream ended");
                        break;
                    }
                },
            }
        }

        let handler_stats = handler.stats();
        // Dropping the handler closes the outbox so the delivery loop drains and exits
        drop(handler);
        let delivery_stats = delivery.await?;

        let summary = RunSummary {
            handler: handler_stats,
            delivery: delivery_stats,
            malformed,
        };
        info!(
            seen = summary.handler.seen,
            replies = summary.handler.replies,
            delivered = summary.delivery.delivered,
            failed = summary.delivery.failed,
            malformed = summary.malformed,
            "Bot stopped"
        );
        Ok(summary)
    }
}
