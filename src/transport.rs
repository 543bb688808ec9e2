//! The byte-stream abstraction `Conn` consumes (§6). Everything below this
//! trait — sockets, TLS, a reactor — is the embedder's responsibility; this
//! crate only frames and codes what `Transport` hands it.

use thiserror::Error;

/// A transport-level failure, distinct from [`crate::Error`] (which covers
/// codec failures on already-read bytes).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport refused the connection")]
    Refused,
    #[error("transport failed: {0}")]
    Failed(String),
    #[error("transport is closed")]
    Closed,
}

/// Outcome of a [`Transport::write`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// `usize` bytes, a prefix of the input, were accepted.
    Accepted(usize),
    /// The transport cannot accept any bytes right now.
    WouldBlock,
}

/// Outcome of a [`Transport::read`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `usize` bytes were read into the supplied buffer.
    Bytes(usize),
    /// No bytes are available right now.
    WouldBlock,
    /// The peer closed its write side; no more bytes will ever arrive.
    Eof,
}

/// A byte-stream transport a [`crate::Conn`] can frame OpenFlow messages
/// over. Implementations are expected to be non-blocking: `write`/`read`
/// return promptly, signalling backpressure/absence of data via the
/// `WouldBlock` variants rather than blocking the caller.
pub trait Transport: Send {
    /// Begin establishing the transport (e.g. connect the underlying
    /// socket). May complete asynchronously; the embedder drives readiness
    /// via [`crate::Conn::on_readable`]/[`crate::Conn::on_writable`].
    fn open(&mut self) -> Result<(), TransportError>;

    /// Tear down the transport. Idempotent.
    fn close(&mut self);

    /// Write as many of `bytes` as the transport will currently accept.
    fn write(&mut self, bytes: &[u8]) -> Result<WriteOutcome, TransportError>;

    /// Read as many bytes as are currently available into `buf`.
    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, TransportError>;
}
