//! Persistence hook for room creations and joins.
//!
//! The engine hands a [`JoinRecord`] to its sink after every successful
//! `create` and `join`. Calls run on their own task once the registry lock
//! is released; a failing sink is logged and never touches room state.

use std::future::Future;
use std::path::{Path, PathBuf};

use lotohall_protocol::{Codec, JoinRecord, JsonCodec, ProtocolError};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Errors a sink can report.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("sink I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Encode(#[from] ProtocolError),
}

/// Receives join records.
///
/// # Trait bounds
///
/// `Send + Sync + 'static` because the sink is shared with every spawned
/// persistence task.
///
/// # Example
///
/// ```rust
/// use lotohall::{JoinSink, SinkError};
/// use lotohall_protocol::JoinRecord;
///
/// /// Drops everything.
/// struct NullSink;
///
/// impl JoinSink for NullSink {
///     async fn room_created(&self, _record: JoinRecord) -> Result<(), SinkError> {
///         Ok(())
///     }
///
///     async fn user_joined(&self, _record: JoinRecord) -> Result<(), SinkError> {
///         Ok(())
///     }
/// }
/// ```
pub trait JoinSink: Send + Sync + 'static {
    /// A room was created; `record.username` is its admin.
    fn room_created(
        &self,
        record: JoinRecord,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;

    /// A user joined (or re-joined) a room.
    fn user_joined(
        &self,
        record: JoinRecord,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}

// ---------------------------------------------------------------------------
// TracingSink
// ---------------------------------------------------------------------------

/// Logs each record at `info`. The default sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl JoinSink for TracingSink {
    async fn room_created(&self, record: JoinRecord) -> Result<(), SinkError> {
        tracing::info!(
            room_id = %record.room_id,
            admin = %record.username,
            client_ip = %record.client_ip,
            user_agent = %record.user_agent,
            "room persisted"
        );
        Ok(())
    }

    async fn user_joined(&self, record: JoinRecord) -> Result<(), SinkError> {
        tracing::info!(
            room_id = %record.room_id,
            user = %record.username,
            client_ip = %record.client_ip,
            user_agent = %record.user_agent,
            "join persisted"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JsonLinesSink
// ---------------------------------------------------------------------------

/// Appends one JSON object per record to a file.
///
/// The file is opened (and created if needed) on first write. Writes are
/// serialized so lines never interleave.
pub struct JsonLinesSink {
    path: PathBuf,
    codec: JsonCodec,
    file: Mutex<Option<File>>,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            codec: JsonCodec,
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, record: &JoinRecord) -> Result<(), SinkError> {
        let mut line = self.codec.encode(record)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        if file.is_none() {
            let opened = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            *file = Some(opened);
        }
        if let Some(f) = file.as_mut() {
            f.write_all(&line).await?;
            f.flush().await?;
        }
        Ok(())
    }
}

impl JoinSink for JsonLinesSink {
    async fn room_created(&self, record: JoinRecord) -> Result<(), SinkError> {
        self.append(&record).await
    }

    async fn user_joined(&self, record: JoinRecord) -> Result<(), SinkError> {
        self.append(&record).await
    }
}
