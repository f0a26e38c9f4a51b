//! Channels
//!
//! The gateway port through which posts arrive and replies leave, plus the
//! adapters that implement it.

mod gateway;
pub mod memory;
pub mod stdio;
pub mod wire;

pub use gateway::{
    DynGateway, GatewayError, GatewayResult, IncomingPost, MalformedPost, OutgoingReply, PostId,
    PostGateway, PostStream,
};
pub use memory::MemoryGateway;
pub use stdio::StdioGateway;
