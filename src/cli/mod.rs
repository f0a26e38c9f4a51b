//! CLI subcommand definitions and handlers.
//!
//! Uses clap derive to define the subcommand hierarchy:
//! - `start` (default) -- run the bot against stdin/stdout
//! - `check <text>` -- show how the bot would react to a post
//! - `config show|get|path` -- inspect configuration
//! - `version` -- print build/version info

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Rate-limited pattern auto-reply bot.
#[derive(Parser, Debug)]
#[command(
    name = "alotbot",
    version = env!("CARGO_PKG_VERSION"),
    about = "alotbot: replies to posts that mention the alot, at most once per interval"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to a JSON5 config file (default: $ALOTBOT_CONFIG, then the user config dir).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the bot (default when no subcommand is given).
    Start,

    /// Show which rules would reply to a post, without sending anything.
    Check {
        /// Post text to evaluate.
        text: String,

        /// Handle of the post author used in the rendered reply.
        #[arg(long, default_value = "someone")]
        author: String,
    },

    /// Inspect configuration.
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Print version, build date, and git commit information.
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the fully loaded configuration (secrets redacted) as JSON.
    Show,

    /// Print a specific configuration value by dot-notation path.
    Get {
        /// Dot-notation key (e.g. "server.port", "autoreply.policy").
        key: String,
    },

    /// Print the resolved configuration file path.
    Path,
}

// ---------------------------------------------------------------------------
// Subcommand handlers
// ---------------------------------------------------------------------------

use crate::autoreply::{contains_trigger, format_reply, is_repost, ResponseSelector};
use crate::bot::Bot;
use crate::channels::{IncomingPost, StdioGateway};
use crate::config::{self, BotConfig, ConfigError, Credentials};
use crate::logging::init_logging;
use crate::server::serve_liveness;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

/// Secrets that should be redacted when printing config.
const SECRET_KEYS: &[&str] = &["consumer_key", "token", "secret", "password"];

/// Run the `start` subcommand.
pub async fn handle_start(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = BotConfig::load(config_path)?;
    init_logging(&cfg.logging)?;

    let credentials = Credentials::from_env()?;
    tracing::debug!(credentials = ?credentials, "API credentials loaded");

    let bot = Bot::new(&cfg)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl-C, shutting down"),
            Err(e) => tracing::warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
        let _ = signal_tx.send(true);
    });

    let server = if cfg.server.enabled {
        let server_config = cfg.server.clone();
        let rx = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            serve_liveness(&server_config, rx).await
        }))
    } else {
        None
    };

    let gateway = Arc::new(StdioGateway::stdio());
    let result = bot.run(gateway, shutdown_rx).await;

    // The stream may end on its own; make sure the liveness endpoint follows
    let _ = shutdown_tx.send(true);
    if let Some(server) = server {
        server.await??;
    }

    result?;
    Ok(())
}

/// What the bot would do with a post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub is_repost: bool,
    pub has_trigger: bool,
    /// `(rule id, addressed reply)` for every reply that would be sent
    pub replies: Vec<(String, String)>,
}

/// Evaluate `post` the way a freshly started bot would, ignoring the cooldown
pub fn check_post(cfg: &BotConfig, post: &IncomingPost) -> Result<CheckReport, ConfigError> {
    let rules = cfg.rule_set()?;
    let mut selector = ResponseSelector::new(rules, cfg.autoreply.policy)
        .first_match_only(cfg.autoreply.first_match_only);

    let is_repost = is_repost(post);
    let has_trigger = contains_trigger(&post.text, &cfg.autoreply.trigger_keyword);
    let replies = if is_repost || !has_trigger {
        Vec::new()
    } else {
        selector
            .select(&post.text)
            .into_iter()
            .map(|s| (s.rule_id, format_reply(post, &s.body).body))
            .collect()
    };

    Ok(CheckReport {
        is_repost,
        has_trigger,
        replies,
    })
}

/// Run the `check <text>` subcommand.
pub fn handle_check(
    config_path: Option<&Path>,
    text: &str,
    author: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = BotConfig::load(config_path)?;
    let post = IncomingPost::new("check", author, text);
    let report = check_post(&cfg, &post)?;

    println!("Repost:  {}", if report.is_repost { "yes (ignored)" } else { "no" });
    println!(
        "Trigger: {}",
        if report.has_trigger { "present" } else { "absent (ignored)" }
    );
    if report.replies.is_empty() {
        println!("No reply would be sent.");
    }
    for (rule, reply) in &report.replies {
        println!("  [{}] {}", rule, reply);
    }
    Ok(())
}

/// Configuration plus credential status as a redacted JSON value
fn redacted_config(cfg: &BotConfig) -> Result<Value, serde_json::Error> {
    let mut value = serde_json::to_value(cfg)?;
    if let Value::Object(map) = &mut value {
        let credentials = match Credentials::from_env() {
            Ok(creds) => serde_json::to_value(&creds)?,
            Err(e) => Value::String(e.to_string()),
        };
        map.insert("credentials".to_string(), credentials);
    }
    Ok(redact_secrets(value))
}

/// Run the `config show` subcommand.
pub fn handle_config_show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = BotConfig::load(config_path)?;
    let pretty = serde_json::to_string_pretty(&redacted_config(&cfg)?)?;
    println!("{}", pretty);
    Ok(())
}

/// Run the `config get <key>` subcommand.
pub fn handle_config_get(
    config_path: Option<&Path>,
    key: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = BotConfig::load(config_path)?;
    match get_value_at_path(&redacted_config(&cfg)?, key) {
        Some(value) => {
            let pretty = serde_json::to_string_pretty(&value)?;
            println!("{}", pretty);
        }
        None => {
            eprintln!("Key not found: {}", key);
            std::process::exit(1);
        }
    }
    Ok(())
}

/// Run the `config path` subcommand.
pub fn handle_config_path(config_path: Option<&Path>) {
    match config::resolve_config_path(config_path, &|key: &str| std::env::var(key).ok()) {
        Some(path) => println!("{}", path.display()),
        None => {
            let default = config::default_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<no config dir>".to_string());
            println!("none (built-in defaults; would read {})", default);
        }
    }
}

/// Run the `version` subcommand.
pub fn handle_version() {
    println!("alotbot {}", env!("CARGO_PKG_VERSION"));
    println!("  Build date: {}", env!("ALOTBOT_BUILD_DATE"));
    println!("  Git commit: {}", env!("ALOTBOT_GIT_HASH"));
    println!(
        "  Platform:   {} ({})",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Navigate a JSON value by dot-notation path and return the leaf value.
fn get_value_at_path(root: &Value, path: &str) -> Option<Value> {
    let mut current = root;
    for part in path.split('.') {
        current = match current {
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            other => other.as_object()?.get(part)?,
        };
    }
    Some(current.clone())
}

/// Redact known secret keys in a JSON value (recursive).
fn redact_secrets(mut value: Value) -> Value {
    match &mut value {
        Value::Object(map) => {
            let keys: Vec<String> = map.keys().cloned().collect();
            for key in keys {
                let lower = key.to_lowercase();
                if SECRET_KEYS.iter().any(|s| lower.contains(s)) {
                    map.insert(key, Value::String("[REDACTED]".to_string()));
                } else if let Some(child) = map.remove(&key) {
                    map.insert(key, redact_secrets(child));
                }
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                *item = redact_secrets(item.take());
            }
        }
        _ => {}
    }
    value
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
