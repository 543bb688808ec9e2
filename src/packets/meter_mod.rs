//! # Meter modification
//!
//! Installs, modifies, or deletes a meter: a rate-limiter that a flow
//! entry's instructions can direct traffic through.
use crate::error::{Error, Result};
use crate::Repr;
use byteorder::{ByteOrder, NetworkEndian};

enum_with_unknown! {
    pub doc enum Command(u16) {
        Add     = 0,
        Modify  = 1,
        Delete  = 2
    }
}

enum_with_unknown! {
    pub doc enum BandKind(u16) {
        /// Drop the packet.
        Drop         = 1,
        /// Remark the DSCP field.
        DscpRemark   = 2,
        /// Vendor-defined band.
        Experimenter = 0xffff
    }
}

/// Rate this meter measures in kbps rather than packets per second.
pub const FLAG_KBPS: u16 = 1;
/// Rate measured in packets per second.
pub const FLAG_PKTPS: u16 = 1 << 1;
/// Apply burst size.
pub const FLAG_BURST: u16 = 1 << 2;
/// Collect statistics.
pub const FLAG_STATS: u16 = 1 << 3;

mod field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const COMMAND: Field = 0..2;
    pub const FLAGS: Field = 2..4;
    pub const METER_ID: Field = 4..8;
    pub const HEADER_LEN: usize = 8;
}

mod band_field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const KIND: Field = 0..2;
    pub const LENGTH: Field = 2..4;
    pub const RATE: Field = 4..8;
    pub const BURST_SIZE: Field = 8..12;
    pub const HEADER_LEN: usize = 12;
}

/// One `ofp_meter_band_header` and its type-specific tail.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Band {
    Drop { rate: u32, burst_size: u32 },
    DscpRemark { rate: u32, burst_size: u32, prec_level: u8 },
    Experimenter { rate: u32, burst_size: u32, experimenter: u32 },
}

impl Band {
    fn kind(&self) -> BandKind {
        match *self {
            Band::Drop { .. } => BandKind::Drop,
            Band::DscpRemark { .. } => BandKind::DscpRemark,
            Band::Experimenter { .. } => BandKind::Experimenter,
        }
    }
}

impl Repr for Band {
    fn parse(buffer: &[u8]) -> Result<Self> {
        use self::band_field as field;
        let len = buffer.len();
        if len < field::HEADER_LEN {
            return Err(Error::TooShort {
                needed: field::HEADER_LEN,
                available: len,
            });
        }
        let kind = BandKind::from(NetworkEndian::read_u16(&buffer[field::KIND]));
        let rate = NetworkEndian::read_u32(&buffer[field::RATE]);
        let burst_size = NetworkEndian::read_u32(&buffer[field::BURST_SIZE]);
        Ok(match kind {
            BandKind::Drop => Band::Drop { rate, burst_size },
            BandKind::DscpRemark => {
                if len < field::HEADER_LEN + 1 {
                    return Err(Error::TooShort {
                        needed: field::HEADER_LEN + 1,
                        available: len,
                    });
                }
                Band::DscpRemark {
                    rate,
                    burst_size,
                    prec_level: buffer[field::HEADER_LEN],
                }
            }
            BandKind::Experimenter => {
                if len < field::HEADER_LEN + 4 {
                    return Err(Error::TooShort {
                        needed: field::HEADER_LEN + 4,
                        available: len,
                    });
                }
                Band::Experimenter {
                    rate,
                    burst_size,
                    experimenter: NetworkEndian::read_u32(
                        &buffer[field::HEADER_LEN..field::HEADER_LEN + 4],
                    ),
                }
            }
            BandKind::Unknown(raw) => return Err(Error::BadKind(raw as u8)),
        })
    }

    fn buffer_len(&self) -> usize {
        band_field::HEADER_LEN
            + match *self {
                Band::Drop { .. } => 4,
                Band::DscpRemark { .. } => 4,
                Band::Experimenter { .. } => 4,
            }
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        use self::band_field as field;
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
        NetworkEndian::write_u16(&mut buffer[field::KIND], self.kind().into());
        NetworkEndian::write_u16(&mut buffer[field::LENGTH], needed as u16);
        match *self {
            Band::Drop { rate, burst_size }
            | Band::DscpRemark { rate, burst_size, .. }
            | Band::Experimenter { rate, burst_size, .. } => {
                NetworkEndian::write_u32(&mut buffer[field::RATE], rate);
                NetworkEndian::write_u32(&mut buffer[field::BURST_SIZE], burst_size);
            }
        }
        match *self {
            Band::Drop { .. } => {}
            Band::DscpRemark { prec_level, .. } => buffer[field::HEADER_LEN] = prec_level,
            Band::Experimenter { experimenter, .. } => NetworkEndian::write_u32(
                &mut buffer[field::HEADER_LEN..field::HEADER_LEN + 4],
                experimenter,
            ),
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PacketRepr {
    pub command: Command,
    pub flags: u16,
    pub meter_id: u32,
    pub bands: Vec<Band>,
}

impl Repr for PacketRepr {
    fn parse(buffer: &[u8]) -> Result<Self> {
        let len = buffer.len();
        if len < field::HEADER_LEN {
            return Err(Error::TooShort {
                needed: field::HEADER_LEN,
                available: len,
            });
        }
        let mut bands = Vec::new();
        let mut offset = field::HEADER_LEN;
        while offset < len {
            let band = Band::parse(&buffer[offset..])?;
            offset += band.buffer_len();
            bands.push(band);
        }
        Ok(PacketRepr {
            command: Command::from(NetworkEndian::read_u16(&buffer[field::COMMAND])),
            flags: NetworkEndian::read_u16(&buffer[field::FLAGS]),
            meter_id: NetworkEndian::read_u32(&buffer[field::METER_ID]),
            bands,
        })
    }

    fn buffer_len(&self) -> usize {
        field::HEADER_LEN + self.bands.iter().fold(0, |acc, b| acc + b.buffer_len())
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        NetworkEndian::write_u16(&mut buffer[field::COMMAND], self.command.into());
        NetworkEndian::write_u16(&mut buffer[field::FLAGS], self.flags);
        NetworkEndian::write_u32(&mut buffer[field::METER_ID], self.meter_id);
        let mut offset = field::HEADER_LEN;
        for band in &self.bands {
            let length = band.buffer_len();
            band.emit(&mut buffer[offset..offset + length])?;
            offset += length;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_round_trip() {
        let repr = PacketRepr {
            command: Command::Add,
            flags: FLAG_KBPS | FLAG_BURST,
            meter_id: 1,
            bands: vec![
                Band::Drop {
                    rate: 1000,
                    burst_size: 0,
                },
                Band::DscpRemark {
                    rate: 2000,
                    burst_size: 0,
                    prec_level: 1,
                },
            ],
        };
        let mut bytes = vec![0; repr.buffer_len()];
        repr.emit(&mut bytes).unwrap();
        assert_eq!(PacketRepr::parse(&bytes).unwrap(), repr);
    }
}
