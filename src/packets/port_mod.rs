//! # Port modification
//!
//! Requests a change to a port's configuration bits (e.g. admin up/down).
use crate::error::{Error, Result};
use crate::port::PortNumber;
use crate::Repr;
use byteorder::{ByteOrder, NetworkEndian};
use smoltcp::wire::EthernetAddress;

mod field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const PORT_NO: Field = 0..4;
    pub const HW_ADDR: Field = 8..14;
    pub const CONFIG: Field = 16..20;
    pub const MASK: Field = 20..24;
    pub const ADVERTISE: Field = 24..28;
    pub const LEN: usize = 32;
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PacketRepr {
    pub port_no: PortNumber,
    pub hw_addr: EthernetAddress,
    /// Bits to set in the port's `config`.
    pub config: u32,
    /// Which bits of `config` this message actually touches.
    pub mask: u32,
    /// Requested link features to advertise; zero leaves it unchanged.
    pub advertise: u32,
}

impl Repr for PacketRepr {
    fn parse(buffer: &[u8]) -> Result<Self> {
        let len = buffer.len();
        if len < field::LEN {
            return Err(Error::TooShort {
                needed: field::LEN,
                available: len,
            });
        }
        Ok(PacketRepr {
            port_no: PortNumber::from(NetworkEndian::read_u32(&buffer[field::PORT_NO])),
            hw_addr: EthernetAddress::from_bytes(&buffer[field::HW_ADDR]),
            config: NetworkEndian::read_u32(&buffer[field::CONFIG]),
            mask: NetworkEndian::read_u32(&buffer[field::MASK]),
            advertise: NetworkEndian::read_u32(&buffer[field::ADVERTISE]),
        })
    }

    fn buffer_len(&self) -> usize {
        field::LEN
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        for byte in buffer.iter_mut() {
            *byte = 0;
        }
        NetworkEndian::write_u32(&mut buffer[field::PORT_NO], self.port_no.into());
        buffer[field::HW_ADDR].copy_from_slice(self.hw_addr.as_bytes());
        NetworkEndian::write_u32(&mut buffer[field::CONFIG], self.config);
        NetworkEndian::write_u32(&mut buffer[field::MASK], self.mask);
        NetworkEndian::write_u32(&mut buffer[field::ADVERTISE], self.advertise);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_round_trip() {
        let repr = PacketRepr {
            port_no: PortNumber::Regular(3),
            hw_addr: EthernetAddress([0, 1, 2, 3, 4, 5]),
            config: 1,
            mask: 1,
            advertise: 0,
        };
        let mut bytes = vec![0; repr.buffer_len()];
        repr.emit(&mut bytes).unwrap();
        assert_eq!(PacketRepr::parse(&bytes).unwrap(), repr);
    }
}
