//! # Table modification
//!
//! Configures a flow table's behavior toward unmatched packets.
use crate::error::{Error, Result};
use crate::Repr;
use byteorder::{ByteOrder, NetworkEndian};

/// `0xff` addresses every table at once.
pub const ALL_TABLES: u8 = 0xff;

enum_with_unknown! {
    pub doc enum TableConfig(u32) {
        /// Unmatched packets fall through to the next table (default).
        Deprecated = 3
    }
}

mod field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const TABLE_ID: usize = 0;
    pub const CONFIG: Field = 4..8;
    pub const LEN: usize = 8;
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PacketRepr {
    pub table_id: u8,
    pub config: TableConfig,
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
            table_id: buffer[field::TABLE_ID],
            config: TableConfig::from(NetworkEndian::read_u32(&buffer[field::CONFIG])),
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
        buffer[field::TABLE_ID] = self.table_id;
        for byte in &mut buffer[1..4] {
            *byte = 0;
        }
        NetworkEndian::write_u32(&mut buffer[field::CONFIG], self.config.into());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_round_trip() {
        let repr = PacketRepr {
            table_id: ALL_TABLES,
            config: TableConfig::Deprecated,
        };
        let mut bytes = vec![0; repr.buffer_len()];
        repr.emit(&mut bytes).unwrap();
        assert_eq!(PacketRepr::parse(&bytes).unwrap(), repr);
    }
}
