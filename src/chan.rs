//! The channel multiplexer (C7): one primary connection plus up to 255
//! auxiliaries, addressed by [`AuxId`].

use std::collections::HashMap;
use std::sync::Weak;

use parking_lot::RwLock;
use tracing::debug;

use crate::conn::ConnConfig;
use crate::env::Environment;
use crate::error::{Error, Result};
use crate::version::Version;
use crate::xid::XidRegistry;
use crate::AuxId;

/// Tunables for a [`Chan`] as a whole: the versions it offers during
/// negotiation and the [`ConnConfig`] handed to every `Conn` it creates.
#[derive(Debug, Clone)]
pub struct ChanConfig {
    pub local_versions: Vec<Version>,
    pub conn: ConnConfig,
}

impl Default for ChanConfig {
    fn default() -> Self {
        ChanConfig {
            local_versions: Version::ALL.to_vec(),
            conn: ConnConfig::default(),
        }
    }
}

struct ConnEntry {
    state: crate::conn::ConnState,
}

/// A multiplexed OpenFlow channel: the primary connection (auxid 0) plus its
/// auxiliary connections, all speaking to the same datapath or controller.
///
/// The connection map is guarded by a `parking_lot::RwLock` per §5: reads
/// (`get_conn`, `has_conn`, `size`) take a shared lock, writes (`add_conn`,
/// `drop_conn`) take an exclusive one. No lock is held while invoking the
/// embedder's upcalls.
pub struct Chan {
    conns: RwLock<HashMap<AuxId, ConnEntry>>,
    last_auxid: RwLock<u8>,
    env: Weak<dyn Environment>,
    xids: XidRegistry,
    negotiated_version: RwLock<Option<Version>>,
    config: ChanConfig,
}

impl Chan {
    pub fn new(env: Weak<dyn Environment>, config: ChanConfig) -> Self {
        Chan {
            conns: RwLock::new(HashMap::new()),
            last_auxid: RwLock::new(0),
            env,
            xids: XidRegistry::new(),
            negotiated_version: RwLock::new(None),
            config,
        }
    }

    pub fn config(&self) -> &ChanConfig {
        &self.config
    }

    pub fn xids(&self) -> &XidRegistry {
        &self.xids
    }

    /// The version negotiated by the primary connection, once established.
    pub fn negotiated_version(&self) -> Option<Version> {
        *self.negotiated_version.read()
    }

    /// Register a freshly-created connection for `auxid`, replacing any
    /// prior entry at that id.
    pub fn add_conn(&self, auxid: AuxId, state: crate::conn::ConnState) {
        self.conns.write().insert(auxid, ConnEntry { state });
        if auxid != AuxId::PRIMARY {
            let mut last = self.last_auxid.write();
            *last = auxid.0;
        }
    }

    /// Pick the next free auxid starting from `last_auxid + 1`, scanning at
    /// most 256 slots. Returns `ChanExhausted` if none are free.
    pub fn next_free_auxid(&self) -> Result<AuxId> {
        let conns = self.conns.read();
        let start = self.last_auxid.read().wrapping_add(1).max(1);
        for offset in 0..=255u16 {
            let candidate = (start as u16 + offset) % 256;
            let candidate = if candidate == 0 { 1 } else { candidate as u8 };
            let auxid = AuxId(candidate);
            if !conns.contains_key(&auxid) {
                return Ok(auxid);
            }
        }
        Err(Error::ChanExhausted)
    }

    pub fn has_conn(&self, auxid: AuxId) -> bool {
        self.conns.read().contains_key(&auxid)
    }

    pub fn conn_state(&self, auxid: AuxId) -> Result<crate::conn::ConnState> {
        self.conns
            .read()
            .get(&auxid)
            .map(|entry| entry.state)
            .ok_or(Error::ChanNotFound(auxid.0))
    }

    pub fn size(&self) -> usize {
        self.conns.read().len()
    }

    /// Drop one connection, or (if `auxid` is the primary) every connection
    /// on this channel.
    pub fn drop_conn(&self, auxid: AuxId) {
        let dropped: Vec<AuxId> = if auxid.is_primary() {
            let mut conns = self.conns.write();
            let all: Vec<AuxId> = conns.keys().copied().collect();
            conns.clear();
            all
        } else {
            self.conns.write().remove(&auxid);
            vec![auxid]
        };
        // Upcalls happen after the lock is released, per §5.
        if let Some(env) = self.env.upgrade() {
            for id in dropped {
                debug!(auxid = %id, "connection closed");
                env.handle_closed(self, id);
            }
        }
    }

    /// Record that the primary connection reached `Established`, and fire
    /// `handle_established` exactly once.
    pub fn report_established(&self, auxid: AuxId, version: Version) {
        if let Some(entry) = self.conns.write().get_mut(&auxid) {
            entry.state = crate::conn::ConnState::Established(version);
        }
        if auxid.is_primary() {
            let already = self.negotiated_version.read().is_some();
            if !already {
                *self.negotiated_version.write() = Some(version);
                if let Some(env) = self.env.upgrade() {
                    env.handle_established(self, version);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Msg, XId};

    struct NullEnv;
    impl Environment for NullEnv {
        fn handle_established(&self, _chan: &Chan, _version: Version) {}
        fn handle_closed(&self, _chan: &Chan, _auxid: AuxId) {}
        fn handle_connect_refused(&self, _chan: &Chan, _auxid: AuxId) {}
        fn handle_connect_failed(&self, _chan: &Chan, _auxid: AuxId) {}
        fn handle_accept_failed(&self, _chan: &Chan, _auxid: AuxId) {}
        fn handle_negotiation_failed(&self, _chan: &Chan, _auxid: AuxId) {}
        fn handle_send(&self, _chan: &Chan, _auxid: AuxId) {}
        fn handle_recv(&self, _chan: &Chan, _auxid: AuxId, _msg: Msg) {}
        fn congestion_indication(&self, _chan: &Chan, _auxid: AuxId) {}
        fn get_async_xid(&self, _chan: &Chan, _auxid: AuxId) -> XId {
            XId(0)
        }
        fn get_sync_xid(&self, _chan: &Chan, _auxid: AuxId, _msg_type: u8, _msg_sub: u8) -> XId {
            XId(0)
        }
        fn release_sync_xid(&self, _chan: &Chan, _xid: XId) {}
    }

    fn new_chan() -> (std::sync::Arc<NullEnv>, Chan) {
        let env = std::sync::Arc::new(NullEnv);
        let weak: Weak<dyn Environment> = std::sync::Arc::downgrade(&env) as Weak<dyn Environment>;
        (env, Chan::new(weak, ChanConfig::default()))
    }

    #[test]
    fn test_add_and_get_conn() {
        let (_env, chan) = new_chan();
        chan.add_conn(AuxId::PRIMARY, crate::conn::ConnState::Disconnected);
        assert!(chan.has_conn(AuxId::PRIMARY));
        assert_eq!(chan.size(), 1);
    }

    #[test]
    fn test_next_free_auxid_skips_taken() {
        let (_env, chan) = new_chan();
        chan.add_conn(AuxId(1), crate::conn::ConnState::Disconnected);
        chan.add_conn(AuxId(2), crate::conn::ConnState::Disconnected);
        let next = chan.next_free_auxid().unwrap();
        assert_eq!(next, AuxId(3));
    }

    #[test]
    fn test_drop_primary_clears_all() {
        let (_env, chan) = new_chan();
        chan.add_conn(AuxId::PRIMARY, crate::conn::ConnState::Disconnected);
        chan.add_conn(AuxId(1), crate::conn::ConnState::Disconnected);
        chan.drop_conn(AuxId::PRIMARY);
        assert_eq!(chan.size(), 0);
    }

    #[test]
    fn test_drop_auxiliary_keeps_primary() {
        let (_env, chan) = new_chan();
        chan.add_conn(AuxId::PRIMARY, crate::conn::ConnState::Disconnected);
        chan.add_conn(AuxId(1), crate::conn::ConnState::Disconnected);
        chan.drop_conn(AuxId(1));
        assert_eq!(chan.size(), 1);
        assert!(chan.has_conn(AuxId::PRIMARY));
    }

    #[test]
    fn test_report_established_fires_once() {
        let (_env, chan) = new_chan();
        chan.add_conn(AuxId::PRIMARY, crate::conn::ConnState::HelloSent);
        chan.report_established(AuxId::PRIMARY, Version::V1_3);
        assert_eq!(chan.negotiated_version(), Some(Version::V1_3));
    }
}
