//! TM protocol core
//!
//! Protocol primitives for the Tournament Manager field-set control
//! protocol:
//! - Data model for matches, notices, and commands ([`types`])
//! - Handshake and XOR frame obfuscation ([`wire`])
//! - Tagged binary payload codec and schema registry ([`codec`])
//! - The notice-driven field-set state machine ([`state`])
//!
//! This crate is transport-agnostic; the WebSocket plumbing lives in
//! `vextm-transport` and the high-level client in `vextm-client`.

pub mod codec;
pub mod error;
pub mod state;
pub mod types;
pub mod wire;

pub use codec::{FrameCodec, SchemaRegistry};
pub use error::{Error, Result};
pub use state::reduce;
pub use types::*;
pub use wire::Handshake;

/// Mask XOR'd with the magic byte to form the first byte of every frame.
pub const MAGIC_MASK: u8 = 0xE5;

/// Total handshake buffer size in bytes.
pub const HANDSHAKE_LEN: usize = 128;
