//! Session and file transfer models.
//!
//! Plain values handed to the application, which drives the handshake and
//! chunked transfers. Identifier generation and time are injected through
//! [`SessionIdSource`] and [`Clock`] so tests can pin them.
//!
//! # Example
//!
//! ```
//! use hybridwire::session::{initialize_file_transfer, SessionFactory};
//!
//! let sessions: SessionFactory = SessionFactory::default();
//! let a = sessions.create("client-a");
//! let b = sessions.create("client-b");
//! assert_ne!(a.session_id, b.session_id);
//! assert!(!a.is_authenticated);
//!
//! let mut transfer = initialize_file_transfer("a.bin", 100);
//! transfer.apply_chunk(100).unwrap();
//! assert!(transfer.is_complete);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::config::ProtocolConfig;
use crate::error::{HybridWireError, Result};

/// Hands out session identifiers.
///
/// Implementations must never return the same id twice while both sessions
/// may be open.
pub trait SessionIdSource: Send + Sync {
    fn next_id(&self) -> u64;
}

/// Wall-clock time in milliseconds since the UNIX epoch.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Process-wide unique ids from an atomic counter.
#[derive(Debug)]
pub struct CounterSessionIds {
    next: AtomicU64,
}

impl CounterSessionIds {
    /// Counter starting at 1. Session id 0 is what clients send before they
    /// have been assigned one.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for CounterSessionIds {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionIdSource for CounterSessionIds {
    fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now_millis: u64) -> Self {
        Self {
            now: AtomicU64::new(now_millis),
        }
    }

    pub fn set(&self, now_millis: u64) {
        self.now.store(now_millis, Ordering::Relaxed);
    }

    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }
}

/// State of one logical session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: u64,
    pub is_authenticated: bool,
    pub client_id: String,
    /// Milliseconds since the UNIX epoch.
    pub last_activity: u64,
}

impl SessionState {
    /// Record activity now.
    pub fn touch(&mut self, clock: &dyn Clock) {
        self.last_activity = clock.now_millis();
    }
}

/// Create an unauthenticated session for `client_id`.
pub fn create_session(
    client_id: impl Into<String>,
    ids: &dyn SessionIdSource,
    clock: &dyn Clock,
) -> SessionState {
    SessionState {
        session_id: ids.next_id(),
        is_authenticated: false,
        client_id: client_id.into(),
        last_activity: clock.now_millis(),
    }
}

/// An id source and a clock bundled for repeated [`create_session`] calls.
#[derive(Debug, Default)]
pub struct SessionFactory<I = CounterSessionIds, C = SystemClock> {
    ids: I,
    clock: C,
}

impl<I: SessionIdSource, C: Clock> SessionFactory<I, C> {
    pub fn new(ids: I, clock: C) -> Self {
        Self { ids, clock }
    }

    /// Create an unauthenticated session for `client_id`.
    pub fn create(&self, client_id: impl Into<String>) -> SessionState {
        create_session(client_id, &self.ids, &self.clock)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

/// Progress of one chunked file transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTransferState {
    pub filename: String,
    pub total_size: u64,
    pub bytes_transferred: u64,
    pub chunk_size: u32,
    pub is_complete: bool,
}

impl FileTransferState {
    /// Override the chunk size. Zero is bumped to 1.
    pub fn with_chunk_size(mut self, chunk_size: u32) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Bytes still to transfer.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.total_size - self.bytes_transferred
    }

    /// Size of the next chunk to send: the chunk size, or less for the tail.
    #[inline]
    pub fn next_chunk_len(&self) -> u64 {
        self.remaining().min(u64::from(self.chunk_size))
    }

    /// Record `len` more bytes as transferred.
    ///
    /// The transfer completes exactly when the running total reaches
    /// `total_size`. A zero-length transfer completes on its first
    /// (empty) chunk.
    ///
    /// # Errors
    ///
    /// `TransferOverrun` if the chunk would exceed `total_size`; the state is
    /// left unchanged.
    pub fn apply_chunk(&mut self, len: u64) -> Result<()> {
        let attempted = self
            .bytes_transferred
            .checked_add(len)
            .filter(|&total| total <= self.total_size)
            .ok_or_else(|| HybridWireError::TransferOverrun {
                filename: self.filename.clone(),
                attempted: self.bytes_transferred.saturating_add(len),
                total: self.total_size,
            })?;

        self.bytes_transferred = attempted;
        if attempted == self.total_size {
            self.is_complete = true;
            tracing::debug!(filename = %self.filename, total = self.total_size, "transfer complete");
        }
        Ok(())
    }
}

/// Start tracking a transfer of `total_size` bytes with the default chunk size.
///
/// Does not touch the file system.
pub fn initialize_file_transfer(filename: impl Into<String>, total_size: u64) -> FileTransferState {
    initialize_file_transfer_with(&ProtocolConfig::default(), filename, total_size)
}

/// Start tracking a transfer using the chunk size from `config`.
pub fn initialize_file_transfer_with(
    config: &ProtocolConfig,
    filename: impl Into<String>,
    total_size: u64,
) -> FileTransferState {
    FileTransferState {
        filename: filename.into(),
        total_size,
        bytes_transferred: 0,
        chunk_size: config.chunk_size,
        is_complete: false,
    }
}
