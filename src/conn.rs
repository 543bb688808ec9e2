//! The per-connection state machine (C6): Hello negotiation, frame
//! extraction, keepalive, and backpressured sends over one [`crate::transport::Transport`].

use std::collections::VecDeque;
use std::sync::Weak;

use tracing::{debug, trace, warn};

use crate::chan::Chan;
use crate::env::Environment;
use crate::error::{Error, Result};
use crate::packets::hello;
use crate::packets::openflow;
use crate::packets::Msg;
use crate::transport::{ReadOutcome, Transport, TransportError, WriteOutcome};
use crate::version::Version;
use crate::AuxId;
use crate::Repr;

/// Where a [`Conn`] currently sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Disconnected,
    Connecting,
    HelloSent,
    Established(Version),
    NegotiationFailed,
    ConnectFailed,
    ConnectRefused,
    Closing,
    Closed,
}

impl ConnState {
    /// Whether sending application messages (anything but Hello) is allowed.
    pub fn is_established(self) -> bool {
        matches!(self, ConnState::Established(_))
    }
}

/// Tunables for one [`Conn`]'s framing, keepalive, and backpressure
/// behavior. Defaults match the distilled design's stated defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnConfig {
    /// Largest frame this `Conn` will accept before rejecting with
    /// `OversizeFrame`.
    pub max_message_bytes: usize,
    /// Seconds without a received frame before an Echo-Request is sent.
    pub echo_interval_secs: u64,
    /// Seconds without an Echo-Reply before the connection is closed.
    pub echo_timeout_secs: u64,
    /// Capacity, in bytes, of the outbound tail queue used while congested.
    pub send_buffer_cap: usize,
}

impl Default for ConnConfig {
    fn default() -> Self {
        ConnConfig {
            max_message_bytes: 64 * 1024,
            echo_interval_secs: 5,
            echo_timeout_secs: 10,
            send_buffer_cap: 4 * 1024 * 1024,
        }
    }
}

/// One OpenFlow control connection: a primary or an auxiliary of some
/// [`crate::Chan`]. Owns its `Transport`, a read accumulator, and an
/// outbound tail queue; drives Hello negotiation and frame extraction.
///
/// `Conn` is single-writer: callers are expected to drive one `Conn` from a
/// single thread (its I/O thread, per §5), even though `Chan` itself may be
/// touched from many.
pub struct Conn<T: Transport> {
    auxid: AuxId,
    config: ConnConfig,
    transport: T,
    env: Weak<dyn Environment>,
    state: ConnState,
    local_versions: Vec<Version>,
    read_buf: VecDeque<u8>,
    send_queue: VecDeque<u8>,
    congested: bool,
    secs_since_read: u64,
    secs_since_echo_sent: u64,
    echo_outstanding: bool,
}

impl<T: Transport> Conn<T> {
    pub fn new(
        auxid: AuxId,
        transport: T,
        env: Weak<dyn Environment>,
        local_versions: Vec<Version>,
        config: ConnConfig,
    ) -> Self {
        Conn {
            auxid,
            config,
            transport,
            env,
            state: ConnState::Disconnected,
            local_versions,
            read_buf: VecDeque::new(),
            send_queue: VecDeque::new(),
            congested: false,
            secs_since_read: 0,
            secs_since_echo_sent: 0,
            echo_outstanding: false,
        }
    }

    pub fn auxid(&self) -> AuxId {
        self.auxid
    }

    pub fn state(&self) -> ConnState {
        self.state
    }

    /// Begin establishing the transport and, once up, send the local Hello.
    pub fn open(&mut self, chan: &Chan) {
        self.state = ConnState::Connecting;
        match self.transport.open() {
            Ok(()) => self.enter_hello_sent(chan),
            Err(TransportError::Refused) => self.fail(chan, ConnState::ConnectRefused),
            Err(TransportError::Failed(_)) | Err(TransportError::Closed) => {
                self.fail(chan, ConnState::ConnectFailed)
            }
        }
    }

    fn enter_hello_sent(&mut self, chan: &Chan) {
        self.state = ConnState::HelloSent;
        let bitmap = Version::bitmap_from_set(&self.local_versions);
        let hello = hello::PacketRepr::new(vec![hello::ElementRepr {
            kind: hello::Kind::Bitmap,
            payload: hello::ElementData::Bitmap(hello::BitmapRepr(bitmap)),
        }]);
        // Hello negotiation precedes any negotiated version; encode with the
        // highest version we speak, as the spec directs for the first frame.
        let version = self.local_versions.iter().copied().max().unwrap_or(Version::V1_3);
        let msg = Msg::Hello {
            xid: 0,
            payload: hello,
        };
        self.write_msg(chan, version, &msg);
    }

    fn fail(&mut self, chan: &Chan, terminal: ConnState) {
        self.state = terminal;
        if let Some(env) = self.env.upgrade() {
            match terminal {
                ConnState::ConnectRefused => env.handle_connect_refused(chan, self.auxid),
                ConnState::ConnectFailed => env.handle_connect_failed(chan, self.auxid),
                _ => {}
            }
        }
    }

    /// Close the connection. Discards any buffered outbound bytes (§5:
    /// cancellation at any time discards in-flight writes).
    pub fn close(&mut self) {
        if self.state == ConnState::Closed {
            return;
        }
        self.state = ConnState::Closing;
        self.transport.close();
        self.send_queue.clear();
        self.congested = false;
        self.state = ConnState::Closed;
    }

    /// Encode and send `msg`. Returns `Error::NotEstablished` if called
    /// before negotiation completes (Hello itself bypasses this via
    /// `enter_hello_sent`), and `Error::Congested` if the tail queue is
    /// already full.
    pub fn send(&mut self, chan: &Chan, msg: &Msg) -> Result<()> {
        let version = match self.state {
            ConnState::Established(v) => v,
            _ => return Err(Error::NotEstablished),
        };
        self.write_msg(chan, version, msg);
        Ok(())
    }

    fn write_msg(&mut self, chan: &Chan, version: Version, msg: &Msg) {
        let len = msg.buffer_len(version);
        let mut bytes = vec![0u8; len];
        if let Err(err) = msg.emit(version, &mut bytes) {
            warn!(auxid = %self.auxid, error = %err, "dropping message that failed to encode");
            return;
        }
        if self.congested || !self.send_queue.is_empty() {
            self.enqueue(chan, &bytes);
            return;
        }
        self.write_bytes(chan, &bytes);
    }

    fn enqueue(&mut self, chan: &Chan, bytes: &[u8]) {
        if self.send_queue.len() + bytes.len() > self.config.send_buffer_cap {
            warn!(auxid = %self.auxid, "outbound queue full, dropping message");
            return;
        }
        self.send_queue.extend(bytes.iter().copied());
        if !self.congested {
            self.congested = true;
            if let Some(env) = self.env.upgrade() {
                env.congestion_indication(chan, self.auxid);
            }
        }
    }

    fn write_bytes(&mut self, chan: &Chan, bytes: &[u8]) {
        match self.transport.write(bytes) {
            Ok(WriteOutcome::Accepted(n)) if n == bytes.len() => {}
            Ok(WriteOutcome::Accepted(n)) => {
                self.enqueue(chan, &bytes[n..]);
            }
            Ok(WriteOutcome::WouldBlock) => {
                self.enqueue(chan, bytes);
            }
            Err(err) => {
                warn!(auxid = %self.auxid, error = %err, "transport write failed");
                self.close();
            }
        }
    }

    /// Re-entry point the embedder calls once its reactor signals the
    /// transport is writable again. Drains the tail queue.
    pub fn on_writable(&mut self, chan: &Chan) {
        if self.send_queue.is_empty() {
            return;
        }
        let pending: Vec<u8> = self.send_queue.drain(..).collect();
        match self.transport.write(&pending) {
            Ok(WriteOutcome::Accepted(n)) if n == pending.len() => {
                self.congested = false;
                if let Some(env) = self.env.upgrade() {
                    env.handle_send(chan, self.auxid);
                }
            }
            Ok(WriteOutcome::Accepted(n)) => {
                self.send_queue.extend(pending[n..].iter().copied());
            }
            Ok(WriteOutcome::WouldBlock) => {
                self.send_queue.extend(pending);
            }
            Err(err) => {
                warn!(auxid = %self.auxid, error = %err, "transport write failed while draining");
                self.close();
            }
        }
    }

    /// Whether the outbound tail queue is currently congested.
    pub fn is_congested(&self) -> bool {
        self.congested
    }

    /// Re-entry point the embedder calls once bytes are available on the
    /// transport. Accumulates into the read buffer, extracts complete
    /// frames, and decodes each, firing `Environment::handle_recv` on `chan`
    /// for every message not consumed internally (Hello negotiation, Echo).
    pub fn on_readable(&mut self, chan: &Chan) -> Result<()> {
        let mut chunk = [0u8; 4096];
        loop {
            match self.transport.read(&mut chunk) {
                Ok(ReadOutcome::Bytes(n)) => {
                    self.read_buf.extend(chunk[..n].iter().copied());
                    if n < chunk.len() {
                        break;
                    }
                }
                Ok(ReadOutcome::WouldBlock) => break,
                Ok(ReadOutcome::Eof) => {
                    self.close();
                    break;
                }
                Err(err) => {
                    warn!(auxid = %self.auxid, error = %err, "transport read failed");
                    self.close();
                    return Ok(());
                }
            }
        }
        self.secs_since_read = 0;
        self.drain_frames(chan)
    }

    fn drain_frames(&mut self, chan: &Chan) -> Result<()> {
        loop {
            let header_len = 8;
            if self.read_buf.len() < header_len {
                break;
            }
            let header: Vec<u8> = self.read_buf.iter().take(header_len).copied().collect();
            let declared = u16::from(header[2]) << 8 | u16::from(header[3]);
            let declared = declared as usize;
            if declared > self.config.max_message_bytes {
                return Err(Error::OversizeFrame {
                    declared,
                    limit: self.config.max_message_bytes,
                });
            }
            if self.read_buf.len() < declared {
                break;
            }
            let frame: Vec<u8> = self.read_buf.drain(..declared).collect();
            if let Err(err) = self.handle_frame(chan, &frame) {
                warn!(auxid = %self.auxid, error = %err, "dropping connection on decode error");
                self.close();
                return Err(err);
            }
        }
        Ok(())
    }

    /// Decode one frame, handling Hello negotiation and Echo transparently;
    /// every other message kind is delivered to the embedder via
    /// `Environment::handle_recv`.
    fn handle_frame(&mut self, chan: &Chan, frame: &[u8]) -> Result<()> {
        let envelope = openflow::Packet::new_checked(frame)?;
        let peer_version_byte = frame[0];

        if self.state == ConnState::HelloSent && envelope.kind() == openflow::Kind::Hello {
            let peer_version = Version::from_wire_byte(peer_version_byte).ok();
            let hello = hello::PacketRepr::parse(envelope.payload())?;
            let peer_bitmap = hello_bitmap(&hello, peer_version);
            let local_bitmap = Version::bitmap_from_set(&self.local_versions);
            match Version::negotiate(local_bitmap, peer_bitmap) {
                Some(version) => {
                    debug!(auxid = %self.auxid, ?version, "negotiated OpenFlow version");
                    self.state = ConnState::Established(version);
                    chan.report_established(self.auxid, version);
                }
                None => {
                    self.state = ConnState::NegotiationFailed;
                    if let Some(env) = self.env.upgrade() {
                        env.handle_negotiation_failed(chan, self.auxid);
                    }
                }
            }
            return Ok(());
        }

        let version = match self.state {
            ConnState::Established(v) => v,
            _ => return Err(Error::NotEstablished),
        };
        let msg = Msg::parse(version, frame)?;
        if let Msg::EchoRequest { xid, data } = &msg {
            let reply = Msg::EchoReply {
                xid: *xid,
                data: data.clone(),
            };
            self.write_msg(chan, version, &reply);
            return Ok(());
        }
        if matches!(msg, Msg::EchoReply { .. }) {
            self.echo_outstanding = false;
            self.secs_since_echo_sent = 0;
            return Ok(());
        }
        if let Some(env) = self.env.upgrade() {
            env.handle_recv(chan, self.auxid, msg);
        }
        Ok(())
    }

    /// Advance the keepalive clock by one embedder-supplied tick. Returns
    /// `true` if this tick closed the connection (echo timeout).
    pub fn on_clock_tick(&mut self, chan: &Chan, elapsed_secs: u64) -> bool {
        if !self.state.is_established() {
            return false;
        }
        self.secs_since_read += elapsed_secs;
        if self.echo_outstanding {
            self.secs_since_echo_sent += elapsed_secs;
            if self.secs_since_echo_sent >= self.config.echo_timeout_secs {
                self.close();
                return true;
            }
        } else if self.secs_since_read >= self.config.echo_interval_secs {
            if let ConnState::Established(version) = self.state {
                trace!(auxid = %self.auxid, "sending keepalive echo request");
                self.echo_outstanding = true;
                self.secs_since_echo_sent = 0;
                let msg = Msg::EchoRequest {
                    xid: 0,
                    data: Vec::new(),
                };
                self.write_msg(chan, version, &msg);
            }
        }
        false
    }
}

fn hello_bitmap(hello: &hello::PacketRepr, fallback_version: Option<Version>) -> u32 {
    for element in hello.elements() {
        if let hello::ElementData::Bitmap(bitmap) = &element.payload {
            return bitmap.0;
        }
    }
    // No bitmap element: OpenFlow 1.0 peers only ever send the plain
    // version byte, so fall back to a singleton bitmap for it.
    fallback_version
        .map(|v| Version::bitmap_from_set(&[v]))
        .unwrap_or(0)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemTransport {
        opened: bool,
        outbox: Vec<u8>,
        inbox: VecDeque<u8>,
    }

    impl Transport for MemTransport {
        fn open(&mut self) -> std::result::Result<(), TransportError> {
            self.opened = true;
            Ok(())
        }
        fn close(&mut self) {
            self.opened = false;
        }
        fn write(&mut self, bytes: &[u8]) -> std::result::Result<WriteOutcome, TransportError> {
            self.outbox.extend_from_slice(bytes);
            Ok(WriteOutcome::Accepted(bytes.len()))
        }
        fn read(&mut self, buf: &mut [u8]) -> std::result::Result<ReadOutcome, TransportError> {
            if self.inbox.is_empty() {
                return Ok(ReadOutcome::WouldBlock);
            }
            let n = self.inbox.len().min(buf.len());
            for (i, b) in self.inbox.drain(..n).enumerate() {
                buf[i] = b;
            }
            Ok(ReadOutcome::Bytes(n))
        }
    }

    struct NullEnv;
    impl Environment for NullEnv {
        fn handle_established(&self, _chan: &crate::Chan, _version: Version) {}
        fn handle_closed(&self, _chan: &crate::Chan, _auxid: AuxId) {}
        fn handle_connect_refused(&self, _chan: &crate::Chan, _auxid: AuxId) {}
        fn handle_connect_failed(&self, _chan: &crate::Chan, _auxid: AuxId) {}
        fn handle_accept_failed(&self, _chan: &crate::Chan, _auxid: AuxId) {}
        fn handle_negotiation_failed(&self, _chan: &crate::Chan, _auxid: AuxId) {}
        fn handle_send(&self, _chan: &crate::Chan, _auxid: AuxId) {}
        fn handle_recv(&self, _chan: &crate::Chan, _auxid: AuxId, _msg: Msg) {}
        fn congestion_indication(&self, _chan: &crate::Chan, _auxid: AuxId) {}
        fn get_async_xid(&self, _chan: &crate::Chan, _auxid: AuxId) -> crate::XId {
            crate::XId(0)
        }
        fn get_sync_xid(
            &self,
            _chan: &crate::Chan,
            _auxid: AuxId,
            _msg_type: u8,
            _msg_sub: u8,
        ) -> crate::XId {
            crate::XId(0)
        }
        fn release_sync_xid(&self, _chan: &crate::Chan, _xid: crate::XId) {}
    }

    #[test]
    fn test_open_sends_hello() {
        let env: std::sync::Arc<dyn Environment> = std::sync::Arc::new(NullEnv);
        let weak = std::sync::Arc::downgrade(&env);
        let chan = Chan::new(weak.clone(), crate::chan::ChanConfig::default());
        let mut conn = Conn::new(
            AuxId::PRIMARY,
            MemTransport::default(),
            weak,
            vec![Version::V1_0, Version::V1_3],
            ConnConfig::default(),
        );
        conn.open(&chan);
        assert_eq!(conn.state(), ConnState::HelloSent);
        assert!(!conn.transport.outbox.is_empty());
        assert_eq!(conn.transport.outbox[1], openflow::Kind::Hello.into());
    }

    #[test]
    fn test_negotiation_picks_highest_common_version() {
        let env: std::sync::Arc<dyn Environment> = std::sync::Arc::new(NullEnv);
        let weak = std::sync::Arc::downgrade(&env);
        let chan = Chan::new(weak.clone(), crate::chan::ChanConfig::default());
        let mut conn = Conn::new(
            AuxId::PRIMARY,
            MemTransport::default(),
            weak,
            vec![Version::V1_0, Version::V1_2, Version::V1_3],
            ConnConfig::default(),
        );
        conn.open(&chan);

        let peer_hello = hello::PacketRepr::new(vec![hello::ElementRepr {
            kind: hello::Kind::Bitmap,
            payload: hello::ElementData::Bitmap(hello::BitmapRepr(Version::bitmap_from_set(&[
                Version::V1_0,
                Version::V1_2,
            ]))),
        }]);
        let msg = Msg::Hello {
            xid: 1,
            payload: peer_hello,
        };
        let mut bytes = vec![0; msg.buffer_len(Version::V1_2)];
        msg.emit(Version::V1_2, &mut bytes).unwrap();
        conn.transport.inbox.extend(bytes);

        conn.on_readable(&chan).unwrap();
        assert_eq!(conn.state(), ConnState::Established(Version::V1_2));
    }
}
