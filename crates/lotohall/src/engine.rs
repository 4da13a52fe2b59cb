//! `LotoEngine` builder and request surface.
//!
//! This is the entry point for a transport. It ties together the layers:
//! parameters in, registry operation, persistence sink out. Every method
//! maps to one request kind and takes plain strings and integers. The
//! `*_raw` variants take numeric parameters as received (query values,
//! form fields) and reject unparsable ones as invalid input.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use lotohall_protocol::{
    Codec, JoinRecord, JsonCodec, RoomId, RoomListEntry, RoomSnapshot, Username, parse_card,
    parse_interval, parse_number,
};
use lotohall_room::{
    ClaimReceipt, Departure, PresenceCleaner, RoomRegistry, Verdict,
};
use lotohall_session::AdminGate;
use tokio::task::JoinHandle;

use crate::{EngineConfig, JoinSink, LotoError, TracingSink};

/// Who sent a create/join request. Only forwarded to the sink.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: String,
}

impl ClientInfo {
    pub fn new(ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            user_agent: user_agent.into(),
        }
    }
}

/// Builder for configuring a [`LotoEngine`].
///
/// # Example
///
/// ```rust
/// use lotohall::prelude::*;
///
/// let engine = LotoEngine::builder()
///     .config(EngineConfig::default())
///     .build();
/// # let _ = engine;
/// ```
pub struct LotoEngineBuilder<S: JoinSink> {
    config: EngineConfig,
    sink: S,
}

impl LotoEngineBuilder<TracingSink> {
    /// Creates a builder with default settings and the tracing sink.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            sink: TracingSink,
        }
    }
}

impl Default for LotoEngineBuilder<TracingSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: JoinSink> LotoEngineBuilder<S> {
    /// Sets the engine configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the persistence sink.
    pub fn sink<T: JoinSink>(self, sink: T) -> LotoEngineBuilder<T> {
        LotoEngineBuilder {
            config: self.config,
            sink,
        }
    }

    /// Builds the engine. No task is started until a game starts or
    /// [`LotoEngine::spawn_cleaner`] is called.
    pub fn build(self) -> LotoEngine<S> {
        let gate = AdminGate::new(self.config.admin_secret.clone());
        let rooms = RoomRegistry::new(self.config.room.clone()).with_admin_gate(gate);

        LotoEngine {
            rooms: Arc::new(rooms),
            sink: Arc::new(self.sink),
            codec: JsonCodec,
            config: self.config,
        }
    }
}

/// The loto hall: every room, every operation.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct LotoEngine<S: JoinSink = TracingSink> {
    rooms: Arc<RoomRegistry>,
    sink: Arc<S>,
    codec: JsonCodec,
    config: EngineConfig,
}

impl LotoEngine<TracingSink> {
    /// Creates a new builder.
    pub fn builder() -> LotoEngineBuilder<TracingSink> {
        LotoEngineBuilder::new()
    }
}

impl<S: JoinSink> LotoEngine<S> {
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The underlying registry, for callers that work with typed ids.
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.rooms
    }

    /// Starts the presence cleaner. Abort the handle to stop it.
    pub fn spawn_cleaner(&self) -> JoinHandle<()> {
        PresenceCleaner::spawn(Arc::clone(&self.rooms), self.config.cleaner.clone())
    }

    // -----------------------------------------------------------------
    // Rooms and presence
    // -----------------------------------------------------------------

    /// Creates room `id` with `admin` present and records it with the sink.
    pub async fn create(
        &self,
        id: &str,
        admin: &str,
        secret: &str,
        client: &ClientInfo,
    ) -> Result<(), LotoError> {
        let (id, admin) = (RoomId::from(id), Username::from(admin));
        self.rooms.create(&id, &admin, secret).await?;

        let sink = Arc::clone(&self.sink);
        let record = join_record(id, admin, client);
        tokio::spawn(async move {
            if let Err(e) = sink.room_created(record).await {
                tracing::warn!(error = %e, "failed to persist room creation");
            }
        });
        Ok(())
    }

    /// Adds `user` to room `id` and records the join with the sink.
    pub async fn join(
        &self,
        id: &str,
        user: &str,
        secret: &str,
        client: &ClientInfo,
    ) -> Result<(), LotoError> {
        let (id, user) = (RoomId::from(id), Username::from(user));
        self.rooms.join(&id, &user, secret).await?;

        let sink = Arc::clone(&self.sink);
        let record = join_record(id, user, client);
        tokio::spawn(async move {
            if let Err(e) = sink.user_joined(record).await {
                tracing::warn!(error = %e, "failed to persist join");
            }
        });
        Ok(())
    }

    pub async fn leave(&self, id: &str, user: &str) -> Result<Departure, LotoError> {
        Ok(self
            .rooms
            .leave(&RoomId::from(id), &Username::from(user))
            .await?)
    }

    /// Refreshes `user`'s presence. Always succeeds.
    pub async fn ping(&self, id: &str, user: &str) -> bool {
        self.rooms
            .ping(&RoomId::from(id), &Username::from(user))
            .await
    }

    pub async fn list(&self) -> Vec<RoomListEntry> {
        self.rooms.list().await
    }

    pub async fn state(&self, id: &str) -> Result<RoomSnapshot, LotoError> {
        Ok(self.rooms.snapshot(&RoomId::from(id)).await?)
    }

    /// [`list`](Self::list), encoded.
    pub async fn list_json(&self) -> Result<Vec<u8>, LotoError> {
        let list = self.list().await;
        Ok(self.codec.encode(&list)?)
    }

    /// [`state`](Self::state), encoded.
    pub async fn state_json(&self, id: &str) -> Result<Vec<u8>, LotoError> {
        let snapshot = self.state(id).await?;
        Ok(self.codec.encode(&snapshot)?)
    }

    // -----------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------

    pub async fn start(&self, id: &str, secret: &str) -> Result<(), LotoError> {
        Ok(self.rooms.start(&RoomId::from(id), secret).await?)
    }

    pub async fn stop(&self, id: &str, secret: &str) -> Result<(), LotoError> {
        Ok(self.rooms.stop(&RoomId::from(id), secret).await?)
    }

    pub async fn set_interval(&self, id: &str, secs: u32) -> Result<(), LotoError> {
        Ok(self.rooms.set_interval(&RoomId::from(id), secs).await?)
    }

    pub async fn force_number(&self, id: &str, number: u8, token: &str) -> Result<(), LotoError> {
        Ok(self
            .rooms
            .force_number(&RoomId::from(id), number, token)
            .await?)
    }

    // -----------------------------------------------------------------
    // Bingo
    // -----------------------------------------------------------------

    /// Submits a bingo claim. `nums` is empty or a comma-separated list.
    pub async fn bingo(&self, id: &str, user: &str, nums: &str) -> Result<ClaimReceipt, LotoError> {
        Ok(self
            .rooms
            .submit_claim(&RoomId::from(id), &Username::from(user), nums)
            .await?)
    }

    /// Approves (`true`) or rejects the oldest pending claim.
    pub async fn bingo_result(&self, id: &str, approve: bool) -> Result<Verdict, LotoError> {
        Ok(self.rooms.resolve_claim(&RoomId::from(id), approve).await?)
    }

    pub async fn restart(&self, id: &str) -> Result<(), LotoError> {
        Ok(self.rooms.restart(&RoomId::from(id)).await?)
    }

    // -----------------------------------------------------------------
    // Cards
    // -----------------------------------------------------------------

    pub async fn select(&self, id: &str, user: &str, card: u32) -> Result<(), LotoError> {
        Ok(self
            .rooms
            .select_card(&RoomId::from(id), &Username::from(user), card)
            .await?)
    }

    /// Releases `card` if `user` owns it; otherwise nothing happens.
    pub async fn unselect(&self, id: &str, user: &str, card: u32) -> Result<bool, LotoError> {
        Ok(self
            .rooms
            .unselect_card(&RoomId::from(id), &Username::from(user), card)
            .await?)
    }

    // -----------------------------------------------------------------
    // Raw parameters
    // -----------------------------------------------------------------

    pub async fn set_interval_raw(&self, id: &str, secs: &str) -> Result<(), LotoError> {
        self.set_interval(id, parse_interval(secs)?).await
    }

    pub async fn force_number_raw(
        &self,
        id: &str,
        number: &str,
        token: &str,
    ) -> Result<(), LotoError> {
        self.force_number(id, parse_number(number)?, token).await
    }

    pub async fn select_raw(&self, id: &str, user: &str, card: &str) -> Result<(), LotoError> {
        self.select(id, user, parse_card(card)?).await
    }

    pub async fn unselect_raw(&self, id: &str, user: &str, card: &str) -> Result<bool, LotoError> {
        self.unselect(id, user, parse_card(card)?).await
    }
}

fn join_record(room_id: RoomId, username: Username, client: &ClientInfo) -> JoinRecord {
    JoinRecord {
        room_id,
        username,
        client_ip: client.ip.clone(),
        user_agent: client.user_agent.clone(),
        joined_at: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0),
    }
}
