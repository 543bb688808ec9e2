//! # Role request / reply
//!
//! Lets a controller claim (or query) its role in a multi-controller
//! deployment: equal, master, or slave. Shared shape for both the request
//! and the reply.
use crate::error::{Error, Result};
use crate::Repr;
use byteorder::{ByteOrder, NetworkEndian};

enum_with_unknown! {
    pub doc enum Role(u32) {
        /// No change to the controller's role.
        NoChange  = 0,
        /// Full access, no coordination with other controllers.
        Equal     = 1,
        /// Read/write access, exactly one master per generation.
        Master    = 2,
        /// Read-only access.
        Slave     = 3
    }
}

mod field {
    use crate::field::*;
    pub const ROLE: Field = 0..4;
    pub const GENERATION_ID: Field = 8..16;
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct PacketRepr {
    pub role: Role,
    /// Monotonically increasing id used to order role changes from
    /// different connections; `0xffff_ffff_ffff_ffff` disables the check.
    pub generation_id: u64,
}

impl Repr for PacketRepr {
    fn parse(buffer: &[u8]) -> Result<Self> {
        let len = buffer.len();
        if len < field::GENERATION_ID.end {
            return Err(Error::TooShort {
                needed: field::GENERATION_ID.end,
                available: len,
            });
        }
        Ok(PacketRepr {
            role: Role::from(NetworkEndian::read_u32(&buffer[field::ROLE])),
            generation_id: NetworkEndian::read_u64(&buffer[field::GENERATION_ID]),
        })
    }

    fn buffer_len(&self) -> usize {
        field::GENERATION_ID.end
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        NetworkEndian::write_u32(&mut buffer[field::ROLE], self.role.into());
        for byte in &mut buffer[4..8] {
            *byte = 0;
        }
        NetworkEndian::write_u64(&mut buffer[field::GENERATION_ID], self.generation_id);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_round_trip() {
        let repr = PacketRepr {
            role: Role::Master,
            generation_id: 7,
        };
        let mut bytes = vec![0; repr.buffer_len()];
        repr.emit(&mut bytes).unwrap();
        assert_eq!(PacketRepr::parse(&bytes).unwrap(), repr);
    }
}
