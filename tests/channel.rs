//! `Conn`/`Chan` lifecycle integration tests, covering SPEC_FULL.md's S1-S6
//! scenarios. Each test supplies a small in-memory [`Transport`] and plays
//! the role of the embedder: polling `Conn` after each driving call and
//! relaying state changes into `Environment` upcalls, the way `Chan`'s
//! design notes describe the split of responsibility.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Weak};

use ofchan::chan::ChanConfig;
use ofchan::conn::ConnConfig;
use ofchan::env::Environment;
use ofchan::packets::hello;
use ofchan::transport::{ReadOutcome, Transport, TransportError, WriteOutcome};
use ofchan::{AuxId, Chan, Conn, ConnState, Msg, Version, XId};

#[derive(Default)]
struct CountingEnv {
    established: AtomicU32,
    closed: AtomicU32,
    congested: AtomicU32,
}

impl Environment for CountingEnv {
    fn handle_established(&self, _chan: &Chan, _version: Version) {
        self.established.fetch_add(1, Ordering::SeqCst);
    }
    fn handle_closed(&self, _chan: &Chan, _auxid: AuxId) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
    fn handle_connect_refused(&self, _chan: &Chan, _auxid: AuxId) {}
    fn handle_connect_failed(&self, _chan: &Chan, _auxid: AuxId) {}
    fn handle_accept_failed(&self, _chan: &Chan, _auxid: AuxId) {}
    fn handle_negotiation_failed(&self, _chan: &Chan, _auxid: AuxId) {}
    fn handle_send(&self, _chan: &Chan, _auxid: AuxId) {}
    fn handle_recv(&self, _chan: &Chan, _auxid: AuxId, _msg: Msg) {}
    fn congestion_indication(&self, _chan: &Chan, _auxid: AuxId) {
        self.congested.fetch_add(1, Ordering::SeqCst);
    }
    fn get_async_xid(&self, _chan: &Chan, _auxid: AuxId) -> XId {
        XId(0)
    }
    fn get_sync_xid(&self, _chan: &Chan, _auxid: AuxId, _msg_type: u8, _msg_sub: u8) -> XId {
        XId(0)
    }
    fn release_sync_xid(&self, _chan: &Chan, _xid: XId) {}
}

/// An in-memory transport whose `write` only ever accepts up to `room`
/// bytes, shared via `Arc<Mutex<_>>` so a test can both hand ownership of
/// the transport to a `Conn` and keep manipulating its capacity/inbox from
/// outside.
#[derive(Clone)]
struct MemTransport {
    room: Arc<Mutex<usize>>,
    inbox: Arc<Mutex<VecDeque<u8>>>,
}

impl MemTransport {
    fn new(room: usize) -> Self {
        MemTransport {
            room: Arc::new(Mutex::new(room)),
            inbox: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    fn push_inbound(&self, bytes: &[u8]) {
        self.inbox.lock().unwrap().extend(bytes.iter().copied());
    }

    fn set_room(&self, room: usize) {
        *self.room.lock().unwrap() = room;
    }
}

impl Transport for MemTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
    fn close(&mut self) {}
    fn write(&mut self, bytes: &[u8]) -> Result<WriteOutcome, TransportError> {
        let mut room = self.room.lock().unwrap();
        if *room == 0 {
            return Ok(WriteOutcome::WouldBlock);
        }
        let n = (*room).min(bytes.len());
        *room -= n;
        Ok(WriteOutcome::Accepted(n))
    }
    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, TransportError> {
        let mut inbox = self.inbox.lock().unwrap();
        if inbox.is_empty() {
            return Ok(ReadOutcome::WouldBlock);
        }
        let n = inbox.len().min(buf.len());
        for (i, b) in inbox.drain(..n).enumerate() {
            buf[i] = b;
        }
        Ok(ReadOutcome::Bytes(n))
    }
}

fn hello_bytes(versions: &[Version], xid: u32) -> Vec<u8> {
    let payload = hello::PacketRepr::new(vec![hello::ElementRepr {
        kind: hello::Kind::Bitmap,
        payload: hello::ElementData::Bitmap(hello::BitmapRepr(Version::bitmap_from_set(versions))),
    }]);
    let version = versions.iter().copied().max().unwrap_or(Version::V1_3);
    let msg = Msg::Hello { xid, payload };
    let mut bytes = vec![0u8; msg.buffer_len(version)];
    msg.emit(version, &mut bytes).unwrap();
    bytes
}

fn new_env_and_chan() -> (Arc<CountingEnv>, Chan) {
    let env = Arc::new(CountingEnv::default());
    let weak: Weak<dyn Environment> = Arc::downgrade(&env) as Weak<dyn Environment>;
    (env, Chan::new(weak, ChanConfig::default()))
}

/// S1: local bitmap {1.0, 1.3}, peer bitmap {1.0, 1.2, 1.3} negotiate 1.3;
/// the channel's `handle_established` fires exactly once.
#[test]
fn hello_negotiation_picks_highest_common_version() {
    let (env, chan) = new_env_and_chan();
    let weak: Weak<dyn Environment> = Arc::downgrade(&env) as Weak<dyn Environment>;
    let transport = MemTransport::new(1 << 20);

    let mut conn = Conn::new(
        AuxId::PRIMARY,
        transport.clone(),
        weak,
        vec![Version::V1_0, Version::V1_3],
        ConnConfig::default(),
    );
    chan.add_conn(AuxId::PRIMARY, ConnState::Disconnected);

    conn.open(&chan);
    assert_eq!(conn.state(), ConnState::HelloSent);

    transport.push_inbound(&hello_bytes(
        &[Version::V1_0, Version::V1_2, Version::V1_3],
        1,
    ));
    conn.on_readable(&chan).unwrap();
    assert_eq!(conn.state(), ConnState::Established(Version::V1_3));

    assert_eq!(chan.negotiated_version(), Some(Version::V1_3));
    assert_eq!(env.established.load(Ordering::SeqCst), 1);
}

/// S2: local bitmap {1.0}, peer bitmap {1.3}: no common version, the
/// connection fails negotiation and closes.
#[test]
fn hello_negotiation_mismatch_closes_connection() {
    let (env, chan) = new_env_and_chan();
    let weak: Weak<dyn Environment> = Arc::downgrade(&env) as Weak<dyn Environment>;
    let transport = MemTransport::new(1 << 20);

    let mut conn = Conn::new(
        AuxId::PRIMARY,
        transport.clone(),
        weak,
        vec![Version::V1_0],
        ConnConfig::default(),
    );
    chan.add_conn(AuxId::PRIMARY, ConnState::Disconnected);

    conn.open(&chan);
    transport.push_inbound(&hello_bytes(&[Version::V1_3], 1));
    conn.on_readable(&chan).unwrap();
    assert_eq!(conn.state(), ConnState::NegotiationFailed);

    conn.close();
    assert_eq!(conn.state(), ConnState::Closed);
}

/// S5: enqueueing far more than a transport's write capacity congests the
/// connection exactly once; after the transport fully drains, further
/// sends proceed without a second congestion signal.
#[test]
fn backpressure_fires_congestion_once_then_clears() {
    const ROOM: usize = 1 << 20; // 1 MiB
    let (env, chan) = new_env_and_chan();
    let weak: Weak<dyn Environment> = Arc::downgrade(&env) as Weak<dyn Environment>;
    let transport = MemTransport::new(ROOM);

    let config = ConnConfig {
        send_buffer_cap: 16 << 20,
        ..ConnConfig::default()
    };
    let mut conn = Conn::new(
        AuxId::PRIMARY,
        transport.clone(),
        weak,
        vec![Version::V1_3],
        config,
    );
    chan.add_conn(AuxId::PRIMARY, ConnState::Disconnected);

    conn.open(&chan);
    transport.push_inbound(&hello_bytes(&[Version::V1_3], 1));
    conn.on_readable(&chan).unwrap();
    assert_eq!(conn.state(), ConnState::Established(Version::V1_3));

    // 10 MiB of Packet-Out traffic against a 1 MiB transport.
    for _ in 0..10 {
        let payload = ofchan::packets::packet_out::PacketRepr::<ofchan::oxm::Experimenter> {
            buffer_id: 0xffff_ffff,
            in_port: ofchan::PortNumber::Controller,
            actions: Vec::new(),
            data: vec![0u8; 1 << 20],
        };
        conn.send(&chan, &Msg::PacketOut { xid: 1, payload }).unwrap();
    }
    assert_eq!(env.congested.load(Ordering::SeqCst), 1);
    assert!(conn.is_congested());

    // Let the transport drain fully: no second congestion call.
    transport.set_room(usize::MAX);
    conn.on_writable(&chan);
    assert!(!conn.is_congested());
    assert_eq!(env.congested.load(Ordering::SeqCst), 1);

    let payload = ofchan::packets::packet_out::PacketRepr::<ofchan::oxm::Experimenter> {
        buffer_id: 0xffff_ffff,
        in_port: ofchan::PortNumber::Controller,
        actions: Vec::new(),
        data: vec![0u8; 16],
    };
    conn.send(&chan, &Msg::PacketOut { xid: 2, payload }).unwrap();
    assert_eq!(env.congested.load(Ordering::SeqCst), 1);
}

/// S6: a primary established at 1.2 plus 3 auxiliaries; closing the primary
/// cascades to all 4, and the environment observes exactly 4 `handle_closed`
/// calls.
#[test]
fn auxiliary_lifecycle_cascading_close() {
    let (env, chan) = new_env_and_chan();
    chan.add_conn(AuxId::PRIMARY, ConnState::Established(Version::V1_2));
    for i in 1..=3u8 {
        let auxid = chan.next_free_auxid().unwrap();
        assert_eq!(auxid, AuxId(i));
        chan.add_conn(auxid, ConnState::Established(Version::V1_2));
    }
    assert_eq!(chan.size(), 4);

    chan.drop_conn(AuxId::PRIMARY);
    assert_eq!(chan.size(), 0);
    assert_eq!(env.closed.load(Ordering::SeqCst), 4);
}

/// Property 6: `add_conn` fills every one of the 256 auxids a `u8` can name;
/// the channel then has no room left for a 257th.
#[test]
fn auxid_allocation_exhausts_after_256() {
    let (_env, chan) = new_env_and_chan();
    chan.add_conn(AuxId::PRIMARY, ConnState::Disconnected);
    for _ in 1..=255u16 {
        let auxid = chan.next_free_auxid().unwrap();
        chan.add_conn(auxid, ConnState::Disconnected);
    }
    assert_eq!(chan.size(), 256);
    assert!(chan.next_free_auxid().is_err());
}
