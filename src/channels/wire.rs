//! Wire format for posts and replies.
//!
//! Posts arrive as tweet-shaped JSON objects (`id_str`, `text`,
//! `user.screen_name`, `retweeted`, `retweeted_status`). Replies leave as
//! `{"status": ..., "in_reply_to_status_id": ...}`.

use serde::Deserialize;
use serde_json::{json, Value};

use super::{IncomingPost, MalformedPost, OutgoingReply, PostId};

#[derive(Debug, Deserialize)]
struct RawUser {
    screen_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    id_str: Option<String>,
    id: Option<serde_json::Number>,
    text: Option<String>,
    user: Option<RawUser>,
    retweeted: Option<bool>,
    retweeted_status: Option<Value>,
}

impl TryFrom<RawPost> for IncomingPost {
    type Error = MalformedPost;

    fn try_from(raw: RawPost) -> Result<Self, Self::Error> {
        let id = raw
            .id_str
            .or_else(|| raw.id.map(|n| n.to_string()))
            .ok_or(MalformedPost::MissingField("id_str"))?;
        let text = raw.text.ok_or(MalformedPost::MissingField("text"))?;
        let author_handle = raw
            .user
            .and_then(|u| u.screen_name)
            .ok_or(MalformedPost::MissingField("user.screen_name"))?;

        // A quoted original under retweeted_status marks a native repost
        let is_repost = raw.retweeted.unwrap_or(false) || raw.retweeted_status.is_some();

        Ok(Self {
            id: PostId::new(id),
            text,
            author_handle,
            is_repost,
        })
    }
}

/// Decode a single JSON post
pub fn decode_post(line: &str) -> Result<IncomingPost, MalformedPost> {
    let raw: RawPost =
        serde_json::from_str(line).map_err(|e| MalformedPost::InvalidJson(e.to_string()))?;
    IncomingPost::try_from(raw)
}

/// Encode a reply as a status update request
pub fn encode_reply(reply: &OutgoingReply) -> Value {
    json!({
        "status": reply.body,
        "in_reply_to_status_id": reply.in_reply_to,
    })
}
