//! Line-delimited JSON gateway.
//!
//! Reads tweet-shaped posts, one JSON object per line, and publishes replies
//! as JSON lines. [`StdioGateway::stdio`] binds it to the process's stdin and
//! stdout so a relay process can pipe a live stream through the bot.

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::warn;

use super::wire::{decode_post, encode_reply};
use super::{GatewayError, GatewayResult, OutgoingReply, PostGateway, PostStream};

type Reader = Box<dyn AsyncRead + Send + Unpin>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Gateway over a pair of byte streams
pub struct StdioGateway {
    input: Mutex<Option<Reader>>,
    output: tokio::sync::Mutex<Writer>,
}

impl StdioGateway {
    /// Gateway reading posts from stdin and writing replies to stdout
    pub fn stdio() -> Self {
        Self::from_io(tokio::io::stdin(), tokio::io::stdout())
    }

    /// Gateway over arbitrary reader/writer halves
    pub fn from_io<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            input: Mutex::new(Some(Box::new(reader))),
            output: tokio::sync::Mutex::new(Box::new(writer)),
        }
    }
}

/// Case-insensitive keyword filter applied at subscription time
fn matches_keyword(text: &str, keyword: &str) -> bool {
    keyword.is_empty() || text.to_lowercase().contains(keyword)
}

#[async_trait]
impl PostGateway for StdioGateway {
    fn name(&self) -> &str {
        "stdio"
    }

    async fn subscribe(&self, keyword: &str) -> GatewayResult<PostStream> {
        let reader = self.input.lock().take().ok_or_else(|| {
            GatewayError::SubscribeFailed("input stream already consumed".to_string())
        })?;
        let keyword = keyword.to_lowercase();

        let stream = async_stream::stream! {
            let mut lines = BufReader::new(reader).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match decode_post(line) {
                            Ok(post) if matches_keyword(&post.text, &keyword) => yield Ok(post),
                            Ok(_) => {}
                            Err(e) => yield Err(e),
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "failed to read post stream");
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    async fn publish(&self, reply: &OutgoingReply) -> GatewayResult<()> {
        let mut line = encode_reply(reply).to_string();
        line.push('\n');

        let mut output = self.output.lock().await;
        output.write_all(line.as_bytes()).await?;
        output.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{MalformedPost, PostId};
    use futures_util::StreamExt;
    use tokio::io::AsyncReadExt;

    const FEED: &str = concat!(
        r#"{"id_str":"1","text":"I love Go alot","user":{"screen_name":"bob"}}"#,
        "\n",
        "\n",
        r#"{"id_str":"2","text":"nothing to see","user":{"screen_name":"amy"}}"#,
        "\n",
        r#"{"id_str":"3","text":"ALOT of stuff"}"#,
        "\n",
        r#"{"id_str":"4","text":"I like tea ALOT","user":{"screen_name":"cy"}}"#,
        "\n",
    );

    #[tokio::test]
    async fn test_subscribe_filters_by_keyword_and_reports_malformed() {
        let gateway = StdioGateway::from_io(FEED.as_bytes(), tokio::io::sink());
        let items: Vec<_> = gateway.subscribe("Alot").await.unwrap().collect().await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().id.as_str(), "1");
        assert_eq!(
            items[1],
            Err(MalformedPost::MissingField("user.screen_name"))
        );
        assert_eq!(items[2].as_ref().unwrap().author_handle, "cy");
    }

    #[tokio::test]
    async fn test_subscribe_twice_fails() {
        let gateway = StdioGateway::from_io(FEED.as_bytes(), tokio::io::sink());
        assert!(gateway.subscribe("alot").await.is_ok());
        assert!(matches!(
            gateway.subscribe("alot").await,
            Err(GatewayError::SubscribeFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_publish_writes_json_line() {
        let (writer, mut reader) = tokio::io::duplex(1024);
        let gateway = StdioGateway::from_io(tokio::io::empty(), writer);

        gateway
            .publish(&OutgoingReply {
                body: "@bob ALOT LOVE GO TOO! <3".to_string(),
                in_reply_to: PostId::new("1"),
            })
            .await
            .unwrap();
        drop(gateway);

        let mut written = String::new();
        reader.read_to_string(&mut written).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(written.trim_end()).unwrap();
        assert!(written.ends_with('\n'));
        assert_eq!(value["status"], "@bob ALOT LOVE GO TOO! <3");
        assert_eq!(value["in_reply_to_status_id"], "1");
    }
}
