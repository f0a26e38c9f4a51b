//! alotbot library
//!
//! A rate-limited auto-reply bot: it watches a keyword-filtered stream of
//! public posts, matches them against regex reply rules and answers at most
//! once per cooldown interval.

pub mod autoreply;
pub mod bot;
pub mod channels;
pub mod cli;
pub mod config;
pub mod logging;
pub mod messages;
pub mod server;
