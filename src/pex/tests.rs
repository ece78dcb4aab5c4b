use super::*;
use crate::constants::PEX_VOLLEY_SIZE;
use crate::peer::{Network, PeerIdentity, PeerSource};
use rand::Rng as _;
use std::sync::Weak;

fn detached_session(cap: usize) -> ExchangeSession {
    let remote = PeerIdentity::from_addr("100.64.0.1", 6881, PeerSource::Incoming);
    ExchangeSession::new(remote, Weak::new(), Box::new(|| false), cap)
}

fn peer(n: u8) -> PeerIdentity {
    PeerIdentity::from_addr(&format!("100.64.1.{}", n), 6881, PeerSource::PeerExchange)
}

#[test]
fn test_drain_empty_is_none() {
    let session = detached_session(10);
    assert!(session.drain_added(PEX_VOLLEY_SIZE, None).is_none());
    assert!(session.drain_dropped(PEX_VOLLEY_SIZE, None).is_none());
}

#[test]
fn test_added_is_idempotent_and_ordered() {
    let session = detached_session(10);
    session.record_peer_seen_by_remote(&peer(3));
    session.record_peer_seen_by_remote(&peer(1));
    session.record_peer_seen_by_remote(&peer(3));
    session.record_peer_seen_by_remote(&peer(2));

    assert_eq!(
        session.drain_added(PEX_VOLLEY_SIZE, None),
        Some(vec![peer(3), peer(1), peer(2)])
    );
    assert!(session.drain_added(PEX_VOLLEY_SIZE, None).is_none());
}

#[test]
fn test_opposite_transition_cancels() {
    let session = detached_session(10);

    session.record_peer_seen_by_remote(&peer(4));
    session.record_peer_gone_from_remote(&peer(4));
    assert_eq!(session.pending_added_count(), 0);
    assert_eq!(session.pending_dropped_count(), 0);

    session.record_peer_gone_from_remote(&peer(5));
    session.record_peer_seen_by_remote(&peer(5));
    assert_eq!(session.pending_added_count(), 0);
    assert_eq!(session.pending_dropped_count(), 0);

    session.record_peer_gone_from_remote(&peer(6));
    session.record_peer_gone_from_remote(&peer(6));
    assert_eq!(session.drain_dropped(PEX_VOLLEY_SIZE, None), Some(vec![peer(6)]));
}

#[test]
fn test_random_sequences_never_pending_in_both() {
    let session = detached_session(10);
    let target = peer(7);
    let mut rng = rand::rng();

    // net state relative to the last drain: +1 added, -1 dropped, 0 nothing
    let mut expected = 0i32;
    for _ in 0..500 {
        if rng.random_bool(0.5) {
            session.record_peer_seen_by_remote(&target);
            expected = if expected == -1 { 0 } else { 1 };
        } else {
            session.record_peer_gone_from_remote(&target);
            expected = if expected == 1 { 0 } else { -1 };
        }

        let added = session.pending_added_count();
        let dropped = session.pending_dropped_count();
        assert!(added + dropped <= 1);
        assert_eq!(added == 1, expected == 1);
        assert_eq!(dropped == 1, expected == -1);
    }
}

#[test]
fn test_drain_respects_batch_size() {
    let session = detached_session(10);
    for n in 0..5 {
        session.record_peer_seen_by_remote(&peer(10 + n));
    }

    let first = session.drain_added(2, None).unwrap();
    assert_eq!(first, vec![peer(10), peer(11)]);
    let rest = session.drain_added(10, None).unwrap();
    assert_eq!(rest, vec![peer(12), peer(13), peer(14)]);
}

#[test]
fn test_filtered_drain_discards_other_networks() {
    let session = detached_session(10);
    let i2p_a = PeerIdentity::from_addr("aaaa.b32.i2p", 6881, PeerSource::PeerExchange);
    let i2p_b = PeerIdentity::from_addr("bbbb.b32.i2p", 6881, PeerSource::PeerExchange);

    session.record_peer_seen_by_remote(&peer(20));
    session.record_peer_seen_by_remote(&i2p_a);
    session.record_peer_seen_by_remote(&peer(21));
    session.record_peer_seen_by_remote(&i2p_b);
    session.record_peer_seen_by_remote(&peer(22));

    let batch = session.drain_added(2, Some(Network::Public)).unwrap();
    assert_eq!(batch, vec![peer(20), peer(21)]);

    // i2p_a was visited and discarded; i2p_b and peer(22) remain
    assert_eq!(session.pending_added_count(), 2);
    let batch = session.drain_added(10, Some(Network::I2P)).unwrap();
    assert_eq!(batch, vec![i2p_b]);
    assert!(session.drain_added(10, None).is_none());
}

#[test]
fn test_filtered_drain_with_no_matches() {
    let session = detached_session(10);
    session.record_peer_gone_from_remote(&peer(30));

    assert_eq!(session.drain_dropped(5, Some(Network::Tor)), Some(vec![]));
    assert!(session.drain_dropped(5, None).is_none());
}

#[test]
fn test_known_peers_are_capped() {
    let session = detached_session(3);
    for n in 40..45 {
        session.mark_locally_known_peer(&peer(n));
    }
    assert_eq!(session.known_peer_count(), 3);
    assert!(session.is_known_peer(&peer(40)));
    assert!(!session.is_known_peer(&peer(44)));

    session.forget_locally_known_peer(&peer(40));
    assert!(!session.is_known_peer(&peer(40)));
    session.mark_locally_known_peer(&peer(44));
    assert!(session.is_known_peer(&peer(44)));

    let mut known = session.known_peers();
    known.sort();
    let mut expected = vec![peer(41), peer(42), peer(44)];
    expected.sort();
    assert_eq!(known, expected);
}

#[test]
fn test_disable_maintenance_resets_state() {
    let session = detached_session(10);
    session.record_peer_seen_by_remote(&peer(50));
    session.record_peer_gone_from_remote(&peer(51));
    session.mark_locally_known_peer(&peer(52));

    session.disable_state_maintenance();
    assert!(!session.is_maintaining());
    assert_eq!(session.pending_added_count(), 0);
    assert_eq!(session.pending_dropped_count(), 0);
    assert_eq!(session.known_peer_count(), 0);

    session.record_peer_seen_by_remote(&peer(53));
    session.mark_locally_known_peer(&peer(53));
    assert_eq!(session.pending_added_count(), 0);
    assert_eq!(session.known_peer_count(), 0);

    session.enable_state_maintenance();
    assert!(session.is_maintaining());
    session.record_peer_seen_by_remote(&peer(53));
    assert_eq!(session.drain_added(PEX_VOLLEY_SIZE, None), Some(vec![peer(53)]));
}

#[test]
fn test_detached_session_operations() {
    let session = detached_session(10);
    session.record_peer_seen_by_remote(&peer(60));

    // no registry to call back into
    session.notify_seed_transition();
    session.destroy();

    assert!(!session.is_maintaining());
    assert_eq!(session.pending_added_count(), 0);
}
