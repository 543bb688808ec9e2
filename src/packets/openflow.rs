//! The 8-byte OpenFlow message envelope shared by every message kind.
//!
//! ```no_rust
//! +--------+--------+--------+--------+
//! |version |  type  |     length      |
//! +--------+--------+--------+--------+
//! |                xid                |
//! +--------+--------+--------+--------+
//! |              payload              |
//! +--------+--------+--------+--------+
//! ```
//!
//! - The version field indicates the version of OpenFlow which this message belongs to.
//! - The length field gives the message length, including the header itself.
//! - The xid, or transaction identifier, is a unique value used to match requests to responses.
use crate::error::{Error, Result};
use crate::version::Version;
use byteorder::{ByteOrder, NetworkEndian};

enum_with_unknown! {
    /// The message kind, carried in the envelope's `type` byte. Kind codes
    /// are stable across the versions this crate speaks; only the payload
    /// shape for a handful of kinds varies by version.
    pub doc enum Kind(u8) {
        /// Version negotiation.
        Hello               = 0,
        /// Error notification.
        Error               = 1,
        /// Keepalive request.
        EchoRequest         = 2,
        /// Keepalive reply.
        EchoReply           = 3,
        /// Vendor extension.
        Experimenter        = 4,

        /// Query the datapath's capabilities.
        FeaturesRequest     = 5,
        /// The datapath's capabilities.
        FeaturesReply       = 6,
        /// Query the datapath's configuration.
        GetConfigRequest    = 7,
        /// The datapath's configuration.
        GetConfigReply      = 8,
        /// Set the datapath's configuration.
        SetConfig           = 9,

        /// Packet delivered to the controller.
        PacketIn            = 10,
        /// A flow entry expired or was deleted.
        FlowRemoved         = 11,
        /// A port's status changed.
        PortStatus          = 12,

        /// Controller-injected packet.
        PacketOut           = 13,
        /// Flow table modification.
        FlowMod             = 14,
        /// Group table modification.
        GroupMod            = 15,
        /// Port configuration modification.
        PortMod             = 16,
        /// Flow table configuration modification.
        TableMod            = 17,

        /// Multipart/statistics request.
        MultipartRequest    = 18,
        /// Multipart/statistics reply.
        MultipartReply      = 19,

        /// Request a synchronization barrier.
        BarrierRequest      = 20,
        /// Synchronization barrier reached.
        BarrierReply        = 21,

        /// Query the queues configured on a port.
        QueueGetConfigRequest = 22,
        /// The queues configured on a port.
        QueueGetConfigReply   = 23,

        /// Claim the controller role.
        RoleRequest         = 24,
        /// The controller's role.
        RoleReply           = 25,

        /// Query asynchronous message filters.
        GetAsyncRequest     = 26,
        /// The asynchronous message filters.
        GetAsyncReply       = 27,
        /// Set asynchronous message filters.
        SetAsync            = 28,

        /// Meter table modification.
        MeterMod            = 29
    }
}

/// A wrapper around a buffer holding an OpenFlow message envelope. `Packet`
/// provides getters and setters for each of the header fields.
#[derive(Debug)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

mod field {
    use crate::field::*;

    pub const VERSION: usize = 0;
    pub const KIND: usize = 1;
    pub const LENGTH: Field = 2..4;
    pub const XID: Field = 4..8;
}

impl<T: AsRef<[u8]>> Packet<T> {
    /// Imbue a raw octet buffer with OpenFlow packet structure.
    pub fn new(buffer: T) -> Packet<T> {
        Packet { buffer }
    }

    /// Shorthand for a combination of [new] and [check_len].
    ///
    /// [new]: #method.new
    /// [check_len]: #method.check_len
    pub fn new_checked(buffer: T) -> Result<Packet<T>> {
        let packet = Self::new(buffer);
        packet.check_len()?;
        Ok(packet)
    }

    /// Ensure that no accessor method will panic if called, and that the
    /// buffer holds exactly one message (no trailing bytes, no truncation).
    pub fn check_len(&self) -> Result<()> {
        let len = self.buffer.as_ref().len();
        if len < field::XID.end {
            return Err(Error::TooShort {
                needed: field::XID.end,
                available: len,
            });
        }
        let declared = self.length() as usize;
        if declared < field::XID.end {
            return Err(Error::LengthMismatch {
                declared,
                actual: len,
            });
        }
        if len < declared {
            return Err(Error::TooShort {
                needed: declared,
                available: len,
            });
        }
        Ok(())
    }

    /// Consume the packet, returning the underlying buffer.
    pub fn into_inner(self) -> T {
        self.buffer
    }

    /// Return the version field.
    #[inline]
    pub fn version(&self) -> Result<Version> {
        let data = self.buffer.as_ref();
        Version::from_wire_byte(data[field::VERSION])
    }

    /// Return the type field. The type field indicates what type of message is present and how to
    /// interpret the payload. Message types are documented in the [Kind] enum.
    ///
    /// [Kind]: enum.Kind.html
    #[inline]
    pub fn kind(&self) -> Kind {
        let data = self.buffer.as_ref();
        Kind::from(data[field::KIND])
    }

    /// Return the length field. The length field indicates the total message length, including
    /// the header.
    #[inline]
    pub fn length(&self) -> u16 {
        let data = self.buffer.as_ref();
        NetworkEndian::read_u16(&data[field::LENGTH])
    }

    /// Return the xid field. The xid, or transaction identifier, is a unique value used to match
    /// requests to responses
    #[inline]
    pub fn xid(&self) -> u32 {
        let data = self.buffer.as_ref();
        NetworkEndian::read_u32(&data[field::XID])
    }

    /// Return the header length.
    pub fn header_len(&self) -> usize {
        field::XID.end
    }
}

impl<'a, T: AsRef<[u8]> + ?Sized> Packet<&'a T> {
    /// Return a pointer to the payload, assuming `check_len` already passed.
    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        let range = field::XID.end..self.length() as usize;
        let data = self.buffer.as_ref();
        &data[range]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    /// Set the version field.
    #[inline]
    pub fn set_version(&mut self, value: Version) {
        let data = self.buffer.as_mut();
        data[field::VERSION] = value.wire_byte()
    }

    /// Set the type field.
    #[inline]
    pub fn set_kind(&mut self, value: Kind) {
        let data = self.buffer.as_mut();
        data[field::KIND] = value.into()
    }

    /// Set the length.
    #[inline]
    pub fn set_length(&mut self, value: u16) {
        let data = self.buffer.as_mut();
        NetworkEndian::write_u16(&mut data[field::LENGTH], value)
    }

    /// Set the xid field.
    #[inline]
    pub fn set_xid(&mut self, value: u32) {
        let data = self.buffer.as_mut();
        NetworkEndian::write_u32(&mut data[field::XID], value)
    }
}

impl<'a, T: AsRef<[u8]> + AsMut<[u8]> + ?Sized> Packet<&'a mut T> {
    /// Return a mutable pointer to the payload, assuming the header fields are already set.
    #[inline]
    pub fn payload_mut(&mut self) -> &mut [u8] {
        let range = field::XID.end..self.length() as usize;
        let data = self.buffer.as_mut();
        &mut data[range]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[cfg_attr(rustfmt, rustfmt_skip)]
    static BYTES: [u8; 8] = [
        0x04,             // version (1.3)
        0x00,             // type (hello)
        0x00, 0x08,       // length
        0x00, 0x00, 0x00, 0x2a, // xid
    ];

    #[test]
    fn test_deconstruct() {
        let packet = Packet::new_checked(&BYTES[..]).unwrap();
        assert_eq!(packet.version().unwrap(), Version::V1_3);
        assert_eq!(packet.kind(), Kind::Hello);
        assert_eq!(packet.length(), 8);
        assert_eq!(packet.xid(), 42);
        assert!(packet.payload().is_empty());
    }

    #[test]
    fn test_construct() {
        let mut bytes = [0; 8];
        let mut packet = Packet::new(&mut bytes[..]);
        packet.set_version(Version::V1_3);
        packet.set_kind(Kind::Hello);
        packet.set_length(8);
        packet.set_xid(42);
        assert_eq!(&bytes[..], &BYTES[..]);
    }
}
