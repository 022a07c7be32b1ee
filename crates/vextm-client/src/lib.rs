//! TM client library
//!
//! High-level async client for a Tournament Manager server: bearer
//! authentication against the DWAB authorization service, REST reads
//! (teams, divisions, matches, rankings), and live field-set control over
//! the obfuscated WebSocket protocol.
//!
//! # Example
//!
//! ```ignore
//! use vextm_client::{Client, Credentials};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Client::new("http://localhost", Credentials {
//!         client_id: "...".into(),
//!         client_secret: "...".into(),
//!         expiration_date: 1735689600000,
//!     })?;
//!
//!     let fieldset = client.fieldsets().await?.remove(0);
//!     fieldset.connect().await?;
//!
//!     fieldset.on_any(|notice| println!("{notice:?}"));
//!     fieldset.queue_next_match().await?;
//!     fieldset.start_match(1).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod dispatch;
pub mod error;
pub mod fieldset;
pub mod rest;
pub mod schema;

pub use auth::{AuthError, BearerAuthenticator, Credentials};
pub use client::Client;
pub use dispatch::{EventDispatcher, Subscription};
pub use error::{ClientError, Result};
pub use fieldset::{ConnectionState, Fieldset};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::auth::Credentials;
    pub use crate::client::Client;
    pub use crate::error::{ClientError, Result};
    pub use crate::fieldset::{ConnectionState, Fieldset};
    pub use vextm_core::{
        AudienceDisplay, FieldsetCommand, FieldsetMatch, FieldsetNotice, FieldsetState,
        MatchRound, MatchState, MatchTuple, NoticeKind, SkillsType,
    };
}
