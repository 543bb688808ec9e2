//! Error taxonomy for the wire codec and the connection/channel state
//! machines.
//!
//! Every decoder and encoder in this crate returns `Result<T, Error>`; there
//! is no panicking path on malformed input. `Conn` treats any decode error on
//! an incoming frame as fatal to that connection (see [`crate::conn`]).

use thiserror::Error;

/// The result type used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Kinds of failure the codec and the connection state machine can produce.
///
/// Grouped the way the distilled spec groups them (buffer / format / state),
/// even though Rust gives us a single enum rather than three exception
/// hierarchies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // --- buffer errors ---
    /// A decode operation needed more bytes than the buffer had.
    #[error("buffer too short: needed at least {needed}, got {available}")]
    TooShort { needed: usize, available: usize },

    /// An encode operation needed more room than the destination buffer had.
    #[error("buffer full: needed {needed}, have {available}")]
    BufferFull { needed: usize, available: usize },

    /// A frame's declared length exceeds `max_message_bytes`.
    #[error("frame of {declared} bytes exceeds the {limit} byte cap")]
    OversizeFrame { declared: usize, limit: usize },

    /// A `length` field disagrees with the amount of data actually present.
    #[error("length mismatch: field says {declared}, buffer has {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    // --- format errors ---
    /// Header `version` byte does not match any known [`crate::version::Version`].
    #[error("unsupported protocol version byte {0:#x}")]
    BadVersion(u8),

    /// Header `type` byte is not a recognized message kind.
    #[error("unrecognized message kind {0:#x}")]
    BadKind(u8),

    /// A reserved bit or byte that must be zero was not.
    #[error("reserved field set to a non-zero value")]
    MalformedReserved,

    /// An action/instruction/bucket list under- or over-read its declared
    /// length while iterating.
    #[error("malformed list: element boundaries do not align with declared lengths")]
    InvalList,

    /// An OXM TLV's `length` byte does not match the width dictated by its
    /// `(class, field)`.
    #[error("oxm field length {actual} does not match the expected width {expected}")]
    InvalFieldLength { expected: usize, actual: usize },

    /// A `Match` violates a field prerequisite (e.g. `tcp_src` without
    /// `eth_type`/`ip_proto`).
    #[error("match prerequisite violated: {0}")]
    MatchPrereqViolated(&'static str),

    /// An OXM TLV's `oxm_class` is neither `OXM_BASIC`, packet-register, nor
    /// experimenter.
    #[error("unsupported oxm class {0:#x}")]
    BadOxmClass(u16),

    /// An OXM TLV's `oxm_field` is not recognized for its class.
    #[error("unrecognized oxm field {0:#x}")]
    BadOxmField(u8),

    /// A `Match`'s `match_type` is not `OXM` (`0x0002`); the deprecated
    /// `STANDARD` wire format is not implemented.
    #[error("unsupported match_type {0:#x}")]
    BadMatchType(u16),

    /// `(version, type)` is a pairing this codec has no decoder for.
    #[error("no decoder registered for (version {version:#x}, type {kind:#x})")]
    UnsupportedKind { version: u8, kind: u8 },

    // --- state errors ---
    /// An operation that requires an established connection was attempted
    /// before negotiation completed.
    #[error("connection is not established")]
    NotEstablished,

    /// `Chan::add_conn()` scanned all 256 auxid slots without finding a free
    /// one.
    #[error("auxid namespace exhausted")]
    ChanExhausted,

    /// `Chan::get_conn()` was called with an auxid that has no connection.
    #[error("no connection for auxid {0}")]
    ChanNotFound(u8),

    /// reserved for embedders that want `add_conn` to fail rather than
    /// replace; unused by this crate's own `add_conn`, which replaces.
    #[error("a connection already exists for auxid {0}")]
    ChanExists(u8),

    /// A null/invalid argument was passed to a `Chan` method.
    #[error("invalid channel argument")]
    ChanInval,

    /// The outbound tail queue is full; the caller must back off.
    #[error("connection is congested, outbound queue is full")]
    Congested,
}
