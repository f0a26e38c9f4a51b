//! In-memory gateway.
//!
//! Replays a scripted feed and records every publish attempt. Used by tests
//! and by embedders that drive the bot from their own event source.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{
    GatewayError, GatewayResult, IncomingPost, MalformedPost, OutgoingReply, PostGateway,
    PostStream,
};

/// Scripted gateway with recorded publishes
#[derive(Debug, Default)]
pub struct MemoryGateway {
    feed: Mutex<Option<Vec<Result<IncomingPost, MalformedPost>>>>,
    keyword: Mutex<Option<String>>,
    published: Mutex<Vec<OutgoingReply>>,
    attempts: Mutex<Vec<OutgoingReply>>,
    fail_publish: AtomicBool,
}

impl MemoryGateway {
    /// Gateway that yields `posts` in order, then ends
    pub fn new(posts: Vec<IncomingPost>) -> Self {
        Self::with_feed(posts.into_iter().map(Ok).collect())
    }

    /// Gateway yielding a feed that may contain malformed entries
    pub fn with_feed(feed: Vec<Result<IncomingPost, MalformedPost>>) -> Self {
        Self {
            feed: Mutex::new(Some(feed)),
            ..Self::default()
        }
    }

    /// Make every publish fail
    pub fn failing_publishes(self) -> Self {
        self.fail_publish.store(true, Ordering::SeqCst);
        self
    }

    /// Replies that were published successfully
    pub fn published(&self) -> Vec<OutgoingReply> {
        self.published.lock().clone()
    }

    /// Every publish attempt, successful or not
    pub fn attempts(&self) -> Vec<OutgoingReply> {
        self.attempts.lock().clone()
    }

    /// Keyword passed to `subscribe`, if it was called
    pub fn subscribed_keyword(&self) -> Option<String> {
        self.keyword.lock().clone()
    }
}

#[async_trait]
impl PostGateway for MemoryGateway {
    fn name(&self) -> &str {
        "memory"
    }

    async fn subscribe(&self, keyword: &str) -> GatewayResult<PostStream> {
        let feed = self.feed.lock().take().ok_or_else(|| {
            GatewayError::SubscribeFailed("feed already consumed".to_string())
        })?;
        *self.keyword.lock() = Some(keyword.to_string());
        Ok(Box::pin(futures_util::stream::iter(feed)))
    }

    async fn publish(&self, reply: &OutgoingReply) -> GatewayResult<()> {
        self.attempts.lock().push(reply.clone());
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(GatewayError::PublishFailed("simulated failure".to_string()));
        }
        self.published.lock().push(reply.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_feed_is_replayed_once() {
        let gateway = MemoryGateway::new(vec![
            IncomingPost::new("1", "bob", "first"),
            IncomingPost::new("2", "amy", "second"),
        ]);

        let posts: Vec<_> = gateway.subscribe("alot").await.unwrap().collect().await;
        assert_eq!(posts.len(), 2);
        assert_eq!(gateway.subscribed_keyword().as_deref(), Some("alot"));
        assert!(gateway.subscribe("alot").await.is_err());
    }

    #[tokio::test]
    async fn test_failing_publish_is_recorded_as_attempt() {
        let gateway = MemoryGateway::default().failing_publishes();
        let reply = OutgoingReply {
            body: "@bob HI".to_string(),
            in_reply_to: crate::channels::PostId::new("1"),
        };

        assert!(gateway.publish(&reply).await.is_err());
        assert_eq!(gateway.attempts(), vec![reply]);
        assert!(gateway.published().is_empty());
    }
}
