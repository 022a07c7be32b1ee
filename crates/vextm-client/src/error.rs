//! Client error types

use thiserror::Error;

use crate::auth::AuthError;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("authorization error: {0}")]
    Auth(#[from] AuthError),

    #[error("transport error: {0}")]
    Transport(#[from] vextm_transport::TransportError),

    /// A command was issued while the field-set channel was not open.
    #[error("field-set channel is closed")]
    ChannelClosed,

    #[error("already connected")]
    AlreadyConnected,

    #[error("protocol error: {0}")]
    Protocol(#[from] vextm_core::Error),

    #[error("web server returned status {0}")]
    WebServer(u16),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
