//! The revision-loop protocol: parsing agent replies into actions, gating
//! action order, dispatching tools, and driving rounds until a final plan.
//!
//! The text generator behind [`harness::LlmClient`] and the weather oracle
//! are injected; everything in here is deterministic given their answers.

pub mod calc;
pub mod conversation;
pub mod harness;
pub mod tools;
pub mod wire;

pub use conversation::{ChatMessage, Conversation, Role};
pub use harness::{FinalizeGate, LlmClient, ReviseConfig, ReviseError, revise_itinerary};
pub use tools::Toolset;
pub use wire::{ActionWire, ParsedReply, ReplyParseError, ToolCall, parse_reply};
