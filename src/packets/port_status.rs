//! # Port status
//!
//! Sent when a datapath port's configuration or state changes, or when a
//! port is added or removed.
use crate::error::{Error, Result};
use crate::port::PortNumber;
use crate::Repr;
use byteorder::{ByteOrder, NetworkEndian};
use smoltcp::wire::EthernetAddress;

enum_with_unknown! {
    pub doc enum Reason(u8) {
        /// The port was added.
        Add     = 0,
        /// The port was removed.
        Delete  = 1,
        /// Some attribute of the port changed.
        Modify  = 2
    }
}

mod field {
    use crate::field::*;
    pub const REASON: usize = 0;
    pub const PORT_DESC: Field = 8..72;
}

mod port_desc_field {
    use crate::field::*;
    pub const PORT_NO: Field = 0..4;
    pub const HW_ADDR: Field = 8..14;
    pub const NAME: Field = 16..32;
    pub const CONFIG: Field = 32..36;
    pub const STATE: Field = 36..40;
    pub const CURR: Field = 40..44;
    pub const ADVERTISED: Field = 44..48;
    pub const SUPPORTED: Field = 48..52;
    pub const PEER: Field = 52..56;
    pub const CURR_SPEED: Field = 56..60;
    pub const MAX_SPEED: Field = 60..64;
    pub const LEN: usize = 64;
}

/// An `ofp_port` structure: a port's number, address, and the bitmaps
/// describing its configuration, state, and negotiated/advertised/supported
/// link features.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PortDesc {
    pub port_no: PortNumber,
    pub hw_addr: EthernetAddress,
    /// A human-readable name, NUL-padded to 16 bytes on the wire.
    pub name: String,
    pub config: u32,
    pub state: u32,
    pub curr: u32,
    pub advertised: u32,
    pub supported: u32,
    pub peer: u32,
    pub curr_speed: u32,
    pub max_speed: u32,
}

impl PortDesc {
    fn parse(buffer: &[u8]) -> Result<Self> {
        use self::port_desc_field as f;
        if buffer.len() < f::LEN {
            return Err(Error::TooShort {
                needed: f::LEN,
                available: buffer.len(),
            });
        }
        let name_bytes = &buffer[f::NAME];
        let nul = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
        let name = String::from_utf8_lossy(&name_bytes[..nul]).into_owned();
        Ok(PortDesc {
            port_no: PortNumber::from(NetworkEndian::read_u32(&buffer[f::PORT_NO])),
            hw_addr: EthernetAddress::from_bytes(&buffer[f::HW_ADDR]),
            name,
            config: NetworkEndian::read_u32(&buffer[f::CONFIG]),
            state: NetworkEndian::read_u32(&buffer[f::STATE]),
            curr: NetworkEndian::read_u32(&buffer[f::CURR]),
            advertised: NetworkEndian::read_u32(&buffer[f::ADVERTISED]),
            supported: NetworkEndian::read_u32(&buffer[f::SUPPORTED]),
            peer: NetworkEndian::read_u32(&buffer[f::PEER]),
            curr_speed: NetworkEndian::read_u32(&buffer[f::CURR_SPEED]),
            max_speed: NetworkEndian::read_u32(&buffer[f::MAX_SPEED]),
        })
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        use self::port_desc_field as f;
        if buffer.len() < f::LEN {
            return Err(Error::BufferFull {
                needed: f::LEN,
                available: buffer.len(),
            });
        }
        for byte in buffer.iter_mut() {
            *byte = 0;
        }
        NetworkEndian::write_u32(&mut buffer[f::PORT_NO], self.port_no.into());
        buffer[f::HW_ADDR].copy_from_slice(self.hw_addr.as_bytes());
        let name_bytes = self.name.as_bytes();
        let copy_len = name_bytes.len().min(f::NAME.len() - 1);
        buffer[f::NAME][..copy_len].copy_from_slice(&name_bytes[..copy_len]);
        NetworkEndian::write_u32(&mut buffer[f::CONFIG], self.config);
        NetworkEndian::write_u32(&mut buffer[f::STATE], self.state);
        NetworkEndian::write_u32(&mut buffer[f::CURR], self.curr);
        NetworkEndian::write_u32(&mut buffer[f::ADVERTISED], self.advertised);
        NetworkEndian::write_u32(&mut buffer[f::SUPPORTED], self.supported);
        NetworkEndian::write_u32(&mut buffer[f::PEER], self.peer);
        NetworkEndian::write_u32(&mut buffer[f::CURR_SPEED], self.curr_speed);
        NetworkEndian::write_u32(&mut buffer[f::MAX_SPEED], self.max_speed);
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PacketRepr {
    pub reason: Reason,
    pub desc: PortDesc,
}

impl Repr for PacketRepr {
    fn parse(buffer: &[u8]) -> Result<Self> {
        let len = buffer.len();
        if len < field::PORT_DESC.end {
            return Err(Error::TooShort {
                needed: field::PORT_DESC.end,
                available: len,
            });
        }
        Ok(PacketRepr {
            reason: Reason::from(buffer[field::REASON]),
            desc: PortDesc::parse(&buffer[field::PORT_DESC])?,
        })
    }

    fn buffer_len(&self) -> usize {
        field::PORT_DESC.end
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        for byte in &mut buffer[1..8] {
            *byte = 0;
        }
        buffer[field::REASON] = self.reason.into();
        self.desc.emit(&mut buffer[field::PORT_DESC])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> PacketRepr {
        PacketRepr {
            reason: Reason::Modify,
            desc: PortDesc {
                port_no: PortNumber::Regular(1),
                hw_addr: EthernetAddress([0, 1, 2, 3, 4, 5]),
                name: "eth0".into(),
                config: 0,
                state: 0,
                curr: 0,
                advertised: 0,
                supported: 0,
                peer: 0,
                curr_speed: 0,
                max_speed: 0,
            },
        }
    }

    #[test]
    fn test_round_trip() {
        let repr = sample();
        let mut bytes = vec![0; repr.buffer_len()];
        repr.emit(&mut bytes).unwrap();
        assert_eq!(PacketRepr::parse(&bytes).unwrap(), repr);
    }
}
