//! The typed message codec (C4): the 8-byte envelope ([`openflow`]) plus one
//! submodule per message kind, tied together by [`Msg`].

pub mod async_config;
pub mod error;
pub mod features_reply;
pub mod flow_mod;
pub mod flow_removed;
pub mod get_config_reply;
pub mod group_mod;
pub mod hello;
pub mod meter_mod;
pub mod multipart;
pub mod openflow;
pub mod packet_in;
pub mod packet_out;
pub mod port_mod;
pub mod port_status;
pub mod queue_get_config;
pub mod role;
pub mod table_mod;

use crate::error::{Error, Result};
use crate::oxm::Experimenter;
use crate::version::Version;
use crate::VersionedRepr;
use self::openflow::{Kind, Packet};

/// Every OpenFlow message kind this crate codes, tagged by `(version, xid)`.
/// `Experimenter`-typed payloads (Set-Field actions, `PacketIn`'s match, …)
/// all instantiate their generic `E` parameter with
/// [`crate::oxm::Experimenter`], the crate's single opaque-bytes vendor
/// payload.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Msg {
    Hello { xid: u32, payload: hello::PacketRepr },
    Error { xid: u32, payload: error::PacketRepr },
    EchoRequest { xid: u32, data: Vec<u8> },
    EchoReply { xid: u32, data: Vec<u8> },
    Experimenter { xid: u32, experimenter: u32, exp_type: u32, data: Vec<u8> },
    FeaturesRequest { xid: u32 },
    FeaturesReply { xid: u32, payload: features_reply::PacketRepr },
    GetConfigRequest { xid: u32 },
    GetConfigReply { xid: u32, payload: get_config_reply::PacketRepr },
    SetConfig { xid: u32, payload: get_config_reply::PacketRepr },
    PacketIn { xid: u32, payload: packet_in::PacketRepr<Experimenter> },
    PacketOut { xid: u32, payload: packet_out::PacketRepr<Experimenter> },
    FlowRemoved { xid: u32, payload: flow_removed::PacketRepr<Experimenter> },
    PortStatus { xid: u32, payload: port_status::PacketRepr },
    FlowMod { xid: u32, payload: flow_mod::PacketRepr<Experimenter> },
    GroupMod { xid: u32, payload: group_mod::PacketRepr<Experimenter> },
    PortMod { xid: u32, payload: port_mod::PacketRepr },
    TableMod { xid: u32, payload: table_mod::PacketRepr },
    MeterMod { xid: u32, payload: meter_mod::PacketRepr },
    MultipartRequest { xid: u32, payload: multipart::RequestRepr<Experimenter> },
    MultipartReply { xid: u32, payload: multipart::ReplyRepr<Experimenter> },
    BarrierRequest { xid: u32 },
    BarrierReply { xid: u32 },
    QueueGetConfigRequest { xid: u32, payload: queue_get_config::RequestRepr },
    QueueGetConfigReply { xid: u32, payload: queue_get_config::ReplyRepr },
    RoleRequest { xid: u32, payload: role::PacketRepr },
    RoleReply { xid: u32, payload: role::PacketRepr },
    GetAsyncRequest { xid: u32 },
    GetAsyncReply { xid: u32, payload: async_config::PacketRepr },
    SetAsync { xid: u32, payload: async_config::PacketRepr },
}

impl Msg {
    /// The envelope `xid` carried by every message variant.
    pub fn xid(&self) -> u32 {
        match *self {
            Msg::Hello { xid, .. }
            | Msg::Error { xid, .. }
            | Msg::EchoRequest { xid, .. }
            | Msg::EchoReply { xid, .. }
            | Msg::Experimenter { xid, .. }
            | Msg::FeaturesRequest { xid }
            | Msg::FeaturesReply { xid, .. }
            | Msg::GetConfigRequest { xid }
            | Msg::GetConfigReply { xid, .. }
            | Msg::SetConfig { xid, .. }
            | Msg::PacketIn { xid, .. }
            | Msg::PacketOut { xid, .. }
            | Msg::FlowRemoved { xid, .. }
            | Msg::PortStatus { xid, .. }
            | Msg::FlowMod { xid, .. }
            | Msg::GroupMod { xid, .. }
            | Msg::PortMod { xid, .. }
            | Msg::TableMod { xid, .. }
            | Msg::MeterMod { xid, .. }
            | Msg::MultipartRequest { xid, .. }
            | Msg::MultipartReply { xid, .. }
            | Msg::BarrierRequest { xid }
            | Msg::BarrierReply { xid }
            | Msg::QueueGetConfigRequest { xid, .. }
            | Msg::QueueGetConfigReply { xid, .. }
            | Msg::RoleRequest { xid, .. }
            | Msg::RoleReply { xid, .. }
            | Msg::GetAsyncRequest { xid }
            | Msg::GetAsyncReply { xid, .. }
            | Msg::SetAsync { xid, .. } => xid,
        }
    }

    fn kind(&self) -> Kind {
        match *self {
            Msg::Hello { .. } => Kind::Hello,
            Msg::Error { .. } => Kind::Error,
            Msg::EchoRequest { .. } => Kind::EchoRequest,
            Msg::EchoReply { .. } => Kind::EchoReply,
            Msg::Experimenter { .. } => Kind::Experimenter,
            Msg::FeaturesRequest { .. } => Kind::FeaturesRequest,
            Msg::FeaturesReply { .. } => Kind::FeaturesReply,
            Msg::GetConfigRequest { .. } => Kind::GetConfigRequest,
            Msg::GetConfigReply { .. } => Kind::GetConfigReply,
            Msg::SetConfig { .. } => Kind::SetConfig,
            Msg::PacketIn { .. } => Kind::PacketIn,
            Msg::PacketOut { .. } => Kind::PacketOut,
            Msg::FlowRemoved { .. } => Kind::FlowRemoved,
            Msg::PortStatus { .. } => Kind::PortStatus,
            Msg::FlowMod { .. } => Kind::FlowMod,
            Msg::GroupMod { .. } => Kind::GroupMod,
            Msg::PortMod { .. } => Kind::PortMod,
            Msg::TableMod { .. } => Kind::TableMod,
            Msg::MeterMod { .. } => Kind::MeterMod,
            Msg::MultipartRequest { .. } => Kind::MultipartRequest,
            Msg::MultipartReply { .. } => Kind::MultipartReply,
            Msg::BarrierRequest { .. } => Kind::BarrierRequest,
            Msg::BarrierReply { .. } => Kind::BarrierReply,
            Msg::QueueGetConfigRequest { .. } => Kind::QueueGetConfigRequest,
            Msg::QueueGetConfigReply { .. } => Kind::QueueGetConfigReply,
            Msg::RoleRequest { .. } => Kind::RoleRequest,
            Msg::RoleReply { .. } => Kind::RoleReply,
            Msg::GetAsyncRequest { .. } => Kind::GetAsyncRequest,
            Msg::GetAsyncReply { .. } => Kind::GetAsyncReply,
            Msg::SetAsync { .. } => Kind::SetAsync,
        }
    }

    fn payload_len(&self, version: Version) -> usize {
        use crate::Repr;
        match *self {
            Msg::Hello { ref payload, .. } => payload.buffer_len(),
            Msg::Error { ref payload, .. } => payload.buffer_len(),
            Msg::EchoRequest { ref data, .. } | Msg::EchoReply { ref data, .. } => data.len(),
            Msg::Experimenter { ref data, .. } => 8 + data.len(),
            Msg::FeaturesRequest { .. }
            | Msg::GetConfigRequest { .. }
            | Msg::BarrierRequest { .. }
            | Msg::BarrierReply { .. } => 0,
            Msg::FeaturesReply { ref payload, .. } => payload.buffer_len(),
            Msg::GetConfigReply { ref payload, .. } | Msg::SetConfig { ref payload, .. } => {
                payload.buffer_len()
            }
            Msg::PacketIn { ref payload, .. } => payload.buffer_len(version),
            Msg::PacketOut { ref payload, .. } => payload.buffer_len(),
            Msg::FlowRemoved { ref payload, .. } => payload.buffer_len(),
            Msg::PortStatus { ref payload, .. } => payload.buffer_len(),
            Msg::FlowMod { ref payload, .. } => payload.buffer_len(),
            Msg::GroupMod { ref payload, .. } => payload.buffer_len(),
            Msg::PortMod { ref payload, .. } => payload.buffer_len(),
            Msg::TableMod { ref payload, .. } => payload.buffer_len(),
            Msg::MeterMod { ref payload, .. } => payload.buffer_len(),
            Msg::MultipartRequest { ref payload, .. } => payload.buffer_len(),
            Msg::MultipartReply { ref payload, .. } => payload.buffer_len(),
            Msg::QueueGetConfigRequest { ref payload, .. } => payload.buffer_len(),
            Msg::QueueGetConfigReply { ref payload, .. } => payload.buffer_len(),
            Msg::RoleRequest { ref payload, .. } | Msg::RoleReply { ref payload, .. } => {
                payload.buffer_len()
            }
            Msg::GetAsyncRequest { .. } => 0,
            Msg::GetAsyncReply { ref payload, .. } | Msg::SetAsync { ref payload, .. } => {
                payload.buffer_len()
            }
        }
    }

    /// Decode one full message out of `buffer`, which must contain exactly
    /// the bytes the envelope's `length` field declares (see
    /// [`crate::conn`] for how the frame boundary is found before this is
    /// called).
    pub fn parse(version: Version, buffer: &[u8]) -> Result<Self> {
        use crate::Repr;
        let packet = Packet::new_checked(buffer)?;
        let xid = packet.xid();
        let body = packet.payload();
        Ok(match packet.kind() {
            Kind::Hello => Msg::Hello {
                xid,
                payload: hello::PacketRepr::parse(body)?,
            },
            Kind::Error => Msg::Error {
                xid,
                payload: error::PacketRepr::parse(body)?,
            },
            Kind::EchoRequest => Msg::EchoRequest {
                xid,
                data: body.to_vec(),
            },
            Kind::EchoReply => Msg::EchoReply {
                xid,
                data: body.to_vec(),
            },
            Kind::Experimenter => {
                if body.len() < 8 {
                    return Err(Error::TooShort {
                        needed: 8,
                        available: body.len(),
                    });
                }
                use byteorder::{ByteOrder, NetworkEndian};
                Msg::Experimenter {
                    xid,
                    experimenter: NetworkEndian::read_u32(&body[0..4]),
                    exp_type: NetworkEndian::read_u32(&body[4..8]),
                    data: body[8..].to_vec(),
                }
            }
            Kind::FeaturesRequest => Msg::FeaturesRequest { xid },
            Kind::FeaturesReply => Msg::FeaturesReply {
                xid,
                payload: features_reply::PacketRepr::parse(body)?,
            },
            Kind::GetConfigRequest => Msg::GetConfigRequest { xid },
            Kind::GetConfigReply => Msg::GetConfigReply {
                xid,
                payload: get_config_reply::PacketRepr::parse(body)?,
            },
            Kind::SetConfig => Msg::SetConfig {
                xid,
                payload: get_config_reply::PacketRepr::parse(body)?,
            },
            Kind::PacketIn => Msg::PacketIn {
                xid,
                payload: packet_in::PacketRepr::parse(version, body)?,
            },
            Kind::PacketOut => Msg::PacketOut {
                xid,
                payload: packet_out::PacketRepr::parse(body)?,
            },
            Kind::FlowRemoved => Msg::FlowRemoved {
                xid,
                payload: flow_removed::PacketRepr::parse(body)?,
            },
            Kind::PortStatus => Msg::PortStatus {
                xid,
                payload: port_status::PacketRepr::parse(body)?,
            },
            Kind::FlowMod => Msg::FlowMod {
                xid,
                payload: flow_mod::PacketRepr::parse(body)?,
            },
            Kind::GroupMod => Msg::GroupMod {
                xid,
                payload: group_mod::PacketRepr::parse(body)?,
            },
            Kind::PortMod => Msg::PortMod {
                xid,
                payload: port_mod::PacketRepr::parse(body)?,
            },
            Kind::TableMod => Msg::TableMod {
                xid,
                payload: table_mod::PacketRepr::parse(body)?,
            },
            Kind::MeterMod => Msg::MeterMod {
                xid,
                payload: meter_mod::PacketRepr::parse(body)?,
            },
            Kind::MultipartRequest => Msg::MultipartRequest {
                xid,
                payload: multipart::RequestRepr::parse(body)?,
            },
            Kind::MultipartReply => Msg::MultipartReply {
                xid,
                payload: multipart::ReplyRepr::parse(body)?,
            },
            Kind::BarrierRequest => Msg::BarrierRequest { xid },
            Kind::BarrierReply => Msg::BarrierReply { xid },
            Kind::QueueGetConfigRequest => Msg::QueueGetConfigRequest {
                xid,
                payload: queue_get_config::RequestRepr::parse(body)?,
            },
            Kind::QueueGetConfigReply => Msg::QueueGetConfigReply {
                xid,
                payload: queue_get_config::ReplyRepr::parse(body)?,
            },
            Kind::RoleRequest => Msg::RoleRequest {
                xid,
                payload: role::PacketRepr::parse(body)?,
            },
            Kind::RoleReply => Msg::RoleReply {
                xid,
                payload: role::PacketRepr::parse(body)?,
            },
            Kind::GetAsyncRequest => Msg::GetAsyncRequest { xid },
            Kind::GetAsyncReply => Msg::GetAsyncReply {
                xid,
                payload: async_config::PacketRepr::parse(body)?,
            },
            Kind::SetAsync => Msg::SetAsync {
                xid,
                payload: async_config::PacketRepr::parse(body)?,
            },
            other => {
                return Err(Error::UnsupportedKind {
                    version: version.wire_byte(),
                    kind: other.into(),
                })
            }
        })
    }

    /// The total encoded length of this message, header included.
    pub fn buffer_len(&self, version: Version) -> usize {
        8 + self.payload_len(version)
    }

    /// Encode this message, filling in `length` from [`Self::buffer_len`].
    pub fn emit(&self, version: Version, buffer: &mut [u8]) -> Result<()> {
        use crate::Repr;
        let needed = self.buffer_len(version);
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        let mut packet = Packet::new(&mut buffer[..]);
        packet.set_version(version);
        packet.set_kind(self.kind());
        packet.set_length(needed as u16);
        packet.set_xid(self.xid());
        let body = packet.payload_mut();
        match *self {
            Msg::Hello { ref payload, .. } => payload.emit(body)?,
            Msg::Error { ref payload, .. } => payload.emit(body)?,
            Msg::EchoRequest { ref data, .. } | Msg::EchoReply { ref data, .. } => {
                body.copy_from_slice(data)
            }
            Msg::Experimenter {
                experimenter,
                exp_type,
                ref data,
                ..
            } => {
                use byteorder::{ByteOrder, NetworkEndian};
                NetworkEndian::write_u32(&mut body[0..4], experimenter);
                NetworkEndian::write_u32(&mut body[4..8], exp_type);
                body[8..].copy_from_slice(data);
            }
            Msg::FeaturesRequest { .. }
            | Msg::GetConfigRequest { .. }
            | Msg::BarrierRequest { .. }
            | Msg::BarrierReply { .. } => {}
            Msg::FeaturesReply { ref payload, .. } => payload.emit(body)?,
            Msg::GetConfigReply { ref payload, .. } | Msg::SetConfig { ref payload, .. } => {
                payload.emit(body)?
            }
            Msg::PacketIn { ref payload, .. } => payload.emit(version, body)?,
            Msg::PacketOut { ref payload, .. } => payload.emit(body)?,
            Msg::FlowRemoved { ref payload, .. } => payload.emit(body)?,
            Msg::PortStatus { ref payload, .. } => payload.emit(body)?,
            Msg::FlowMod { ref payload, .. } => payload.emit(body)?,
            Msg::GroupMod { ref payload, .. } => payload.emit(body)?,
            Msg::PortMod { ref payload, .. } => payload.emit(body)?,
            Msg::TableMod { ref payload, .. } => payload.emit(body)?,
            Msg::MeterMod { ref payload, .. } => payload.emit(body)?,
            Msg::MultipartRequest { ref payload, .. } => payload.emit(body)?,
            Msg::MultipartReply { ref payload, .. } => payload.emit(body)?,
            Msg::QueueGetConfigRequest { ref payload, .. } => payload.emit(body)?,
            Msg::QueueGetConfigReply { ref payload, .. } => payload.emit(body)?,
            Msg::RoleRequest { ref payload, .. } | Msg::RoleReply { ref payload, .. } => {
                payload.emit(body)?
            }
            Msg::GetAsyncRequest { .. } => {}
            Msg::GetAsyncReply { ref payload, .. } | Msg::SetAsync { ref payload, .. } => {
                payload.emit(body)?
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_hello_round_trip() {
        let msg = Msg::Hello {
            xid: 42,
            payload: hello::PacketRepr::new(Vec::new()),
        };
        let mut bytes = vec![0; msg.buffer_len(Version::V1_3)];
        msg.emit(Version::V1_3, &mut bytes).unwrap();
        assert_eq!(bytes[0], Version::V1_3.wire_byte());
        let parsed = Msg::parse(Version::V1_3, &bytes).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_echo_request_round_trip() {
        let msg = Msg::EchoRequest {
            xid: 7,
            data: vec![1, 2, 3],
        };
        let mut bytes = vec![0; msg.buffer_len(Version::V1_0)];
        msg.emit(Version::V1_0, &mut bytes).unwrap();
        assert_eq!(Msg::parse(Version::V1_0, &bytes).unwrap(), msg);
    }

    #[test]
    fn test_unsupported_kind_rejected() {
        let mut bytes = vec![0u8; 8];
        bytes[0] = Version::V1_3.wire_byte();
        bytes[1] = 99; // no `Kind` variant claims this byte
        byteorder::NetworkEndian::write_u16(&mut bytes[2..4], 8);
        assert!(Msg::parse(Version::V1_3, &bytes).is_err());
    }
}
