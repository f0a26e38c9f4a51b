//! Gateway Trait
//!
//! Defines the interface between the bot and the service that streams posts
//! and accepts replies.

use async_trait::async_trait;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors that can occur in gateway operations
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Subscription failed: {0}")]
    SubscribeFailed(String),

    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A post that could not be turned into an [`IncomingPost`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedPost {
    #[error("post is missing field `{0}`")]
    MissingField(&'static str),

    #[error("post is not valid JSON: {0}")]
    InvalidJson(String),
}

/// Opaque identifier of a post on the remote service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Post delivered by the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingPost {
    /// Post ID (replies are addressed to it)
    pub id: PostId,
    /// Post text
    pub text: String,
    /// Author handle, without the leading `@`
    pub author_handle: String,
    /// Native repost flag reported by the service
    pub is_repost: bool,
}

impl IncomingPost {
    /// Create a new original (non-repost) post
    pub fn new(
        id: impl Into<String>,
        author_handle: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: PostId::new(id),
            text: text.into(),
            author_handle: author_handle.into(),
            is_repost: false,
        }
    }

    /// Set the native repost flag
    pub fn with_repost_flag(mut self, is_repost: bool) -> Self {
        self.is_repost = is_repost;
        self
    }
}

/// Reply handed to the gateway for publishing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingReply {
    /// Full reply text, including the leading mention
    pub body: String,
    /// Post being replied to
    pub in_reply_to: PostId,
}

/// Lazy, non-restartable sequence of posts
pub type PostStream = Pin<Box<dyn Stream<Item = Result<IncomingPost, MalformedPost>> + Send>>;

/// Source of posts and sink for replies
#[async_trait]
pub trait PostGateway: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Subscribe to posts matching `keyword`
    async fn subscribe(&self, keyword: &str) -> GatewayResult<PostStream>;

    /// Publish a reply
    async fn publish(&self, reply: &OutgoingReply) -> GatewayResult<()>;
}

/// Type-erased gateway for sharing between tasks
pub type DynGateway = Arc<dyn PostGateway>;
