//! Field-set control channel
//!
//! A [`Fieldset`] is a handle to one field set on the TM server. It starts
//! disconnected; `connect()` authenticates, opens the obfuscated WebSocket,
//! sends the timestamp handshake, and spawns a reader task that folds every
//! decoded notice into the mirrored [`FieldsetState`] before delivering it
//! to subscribers. Commands go out over the same channel and fail fast with
//! [`ClientError::ChannelClosed`] whenever the channel is not open.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;

use vextm_core::{
    AudienceDisplay, FieldsetCommand, FieldsetNotice, FieldsetState, FrameCodec, Handshake,
    NoticeKind, SkillsType,
};
use vextm_transport::{TransportEvent, TransportReceiver, TransportSender, WebSocketTransport};

use crate::auth::BearerAuthenticator;
use crate::dispatch::{EventDispatcher, Subscription};
use crate::error::{ClientError, Result};
use crate::rest::{Field, FieldsResponse};
use crate::schema;

/// Lifecycle of the realtime channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected.
    Idle,
    /// `connect()` is in flight.
    Connecting,
    /// Channel is up; commands may be sent.
    Open,
    /// Closed by either side; `connect()` may be called again.
    Closed,
    /// The last `connect()` failed; `connect()` may be called again.
    Failed,
}

/// Handle to one field set, REST identity plus the realtime channel.
pub struct Fieldset {
    id: i32,
    name: String,
    address: Url,
    auth: Arc<BearerAuthenticator>,
    http: reqwest::Client,
    state: Arc<RwLock<FieldsetState>>,
    conn_state: Arc<RwLock<ConnectionState>>,
    dispatcher: Arc<EventDispatcher>,
    sender: Arc<RwLock<Option<Arc<dyn TransportSender>>>>,
    close_tx: watch::Sender<()>,
}

impl Fieldset {
    pub(crate) fn new(
        id: i32,
        name: String,
        address: Url,
        auth: Arc<BearerAuthenticator>,
        http: reqwest::Client,
    ) -> Self {
        let (close_tx, _) = watch::channel(());
        Self {
            id,
            name,
            address,
            auth,
            http,
            state: Arc::new(RwLock::new(FieldsetState::default())),
            conn_state: Arc::new(RwLock::new(ConnectionState::Idle)),
            dispatcher: Arc::new(EventDispatcher::new()),
            sender: Arc::new(RwLock::new(None)),
            close_tx,
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The mirrored field-set state, as of the last processed notice.
    pub fn state(&self) -> FieldsetState {
        self.state.read().clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.conn_state.read()
    }

    /// Open the realtime channel: obtain a bearer token, dial the
    /// WebSocket, send the handshake, and start the reader task.
    ///
    /// A `disconnect()` racing this call wins: the dial is abandoned and
    /// the channel ends up `Closed`.
    pub async fn connect(&self) -> Result<()> {
        {
            let mut conn_state = self.conn_state.write();
            match *conn_state {
                ConnectionState::Connecting | ConnectionState::Open => {
                    return Err(ClientError::AlreadyConnected)
                }
                _ => *conn_state = ConnectionState::Connecting,
            }
        }

        let token = match self.auth.ensure().await {
            Ok(token) => token,
            Err(e) => {
                *self.conn_state.write() = ConnectionState::Failed;
                return Err(e.into());
            }
        };

        let url = self.channel_url()?;
        let mut close_rx = self.close_tx.subscribe();

        let dial = WebSocketTransport::connect(&url, &token);
        tokio::pin!(dial);

        let (sender, receiver) = tokio::select! {
            result = &mut dial => match result {
                Ok(pair) => pair,
                Err(e) => {
                    *self.conn_state.write() = ConnectionState::Failed;
                    return Err(e.into());
                }
            },
            _ = close_rx.changed() => {
                debug!(fieldset = self.id, "connect abandoned by disconnect");
                *self.conn_state.write() = ConnectionState::Closed;
                return Err(ClientError::ChannelClosed);
            }
        };

        // First message on the channel must be the timestamp handshake.
        if let Err(e) = sender
            .send(Bytes::copy_from_slice(Handshake::now().as_bytes()))
            .await
        {
            *self.conn_state.write() = ConnectionState::Failed;
            return Err(e.into());
        }

        *self.sender.write() = Some(Arc::new(sender));
        *self.conn_state.write() = ConnectionState::Open;
        info!(fieldset = self.id, "field-set channel open");

        tokio::spawn(run_reader(
            receiver,
            self.state.clone(),
            self.dispatcher.clone(),
            self.conn_state.clone(),
        ));

        Ok(())
    }

    /// Close the channel. Safe to call in any state, including while a
    /// `connect()` is still in flight; never errors.
    pub async fn disconnect(&self) {
        self.close_tx.send_replace(());

        let sender = self.sender.write().take();
        if let Some(sender) = sender {
            let _ = sender.close().await;
        }

        *self.conn_state.write() = ConnectionState::Closed;
    }

    /// Send one command over the open channel.
    pub async fn send(&self, command: FieldsetCommand) -> Result<()> {
        if self.connection_state() != ConnectionState::Open {
            return Err(ClientError::ChannelClosed);
        }

        let sender = self
            .sender
            .read()
            .clone()
            .ok_or(ClientError::ChannelClosed)?;

        let codec = FrameCodec::new(schema::registry().await);
        let frame = codec.encode_command(&command);

        if let Err(e) = sender.send(frame).await {
            *self.conn_state.write() = ConnectionState::Closed;
            return Err(e.into());
        }
        Ok(())
    }

    pub async fn start_match(&self, field_id: u32) -> Result<()> {
        self.send(FieldsetCommand::Start { field_id }).await
    }

    pub async fn end_match_early(&self, field_id: u32) -> Result<()> {
        self.send(FieldsetCommand::EndEarly { field_id }).await
    }

    pub async fn abort_match(&self, field_id: u32) -> Result<()> {
        self.send(FieldsetCommand::Abort { field_id }).await
    }

    pub async fn reset_timer(&self, field_id: u32) -> Result<()> {
        self.send(FieldsetCommand::Reset { field_id }).await
    }

    pub async fn queue_previous_match(&self) -> Result<()> {
        self.send(FieldsetCommand::QueuePrevMatch).await
    }

    pub async fn queue_next_match(&self) -> Result<()> {
        self.send(FieldsetCommand::QueueNextMatch).await
    }

    pub async fn queue_skills(&self, skills_type: SkillsType) -> Result<()> {
        self.send(FieldsetCommand::QueueSkills { skills_type }).await
    }

    pub async fn set_audience_display(&self, display: AudienceDisplay) -> Result<()> {
        self.send(FieldsetCommand::SetAudienceDisplay { display })
            .await
    }

    /// Subscribe to one notice kind.
    pub fn on<F>(&self, kind: NoticeKind, handler: F) -> Subscription
    where
        F: FnMut(&FieldsetNotice) + Send + 'static,
    {
        self.dispatcher.subscribe(kind, handler)
    }

    /// Subscribe to one notice kind for a single delivery.
    pub fn once<F>(&self, kind: NoticeKind, handler: F) -> Subscription
    where
        F: FnMut(&FieldsetNotice) + Send + 'static,
    {
        self.dispatcher.subscribe_once(kind, handler)
    }

    /// Subscribe to every notice.
    pub fn on_any<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&FieldsetNotice) + Send + 'static,
    {
        self.dispatcher.subscribe_any(handler)
    }

    /// Remove a subscription.
    pub fn off(&self, subscription: Subscription) {
        self.dispatcher.unsubscribe(subscription);
    }

    /// The fields belonging to this field set, from the REST API.
    pub async fn fields(&self) -> Result<Vec<Field>> {
        let url = self
            .address
            .join(&format!("/api/fieldsets/{}/fields", self.id))?;
        let token = self.auth.ensure().await?;

        let response = self.http.get(url).bearer_auth(token).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::WebServer(response.status().as_u16()));
        }

        Ok(response.json::<FieldsResponse>().await?.fields)
    }

    fn channel_url(&self) -> Result<Url> {
        let mut url = self.address.join(&format!("/api/fieldsets/{}", self.id))?;
        let scheme = match url.scheme() {
            "https" => "wss",
            _ => "ws",
        };
        // http(s) and ws(s) are all special schemes; this swap cannot fail.
        let _ = url.set_scheme(scheme);
        Ok(url)
    }
}

/// Drain transport events until the connection ends. Every decoded notice
/// updates the mirrored state first, then goes to subscribers, so handlers
/// observe post-notice state. Undecodable frames are logged and dropped
/// without tearing the connection down.
pub(crate) async fn run_reader<R: TransportReceiver>(
    mut receiver: R,
    state: Arc<RwLock<FieldsetState>>,
    dispatcher: Arc<EventDispatcher>,
    conn_state: Arc<RwLock<ConnectionState>>,
) {
    let codec = FrameCodec::new(schema::registry().await);

    loop {
        let Some(event) = receiver.recv().await else {
            break;
        };

        match event {
            TransportEvent::Connected => {}
            TransportEvent::Data(frame) => match codec.decode_notice(&frame) {
                Ok(notice) => {
                    state.write().apply(&notice);
                    dispatcher.dispatch(&notice);
                }
                Err(e) => {
                    warn!("dropping undecodable frame: {e}");
                }
            },
            TransportEvent::Error(message) => {
                warn!("transport error: {message}");
            }
            TransportEvent::Disconnected { reason } => {
                info!(?reason, "field-set channel closed");
                break;
            }
        }
    }

    *conn_state.write() = ConnectionState::Closed;
}
