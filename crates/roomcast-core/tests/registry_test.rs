//! Room registry behavior tests.
//!
//! These live as integration tests because they use the `roomcast-harness`
//! environment, which depends back on this crate.

use roomcast_core::env::Environment;
use roomcast_core::{ConnectionRecord, RoomRegistry, SocketId};
use roomcast_harness::SimEnv;

fn record(env: &SimEnv) -> ConnectionRecord {
    ConnectionRecord::generate(env)
}

#[test]
fn register_and_lookup() {
    let env = SimEnv::with_seed(1);
    let mut registry = RoomRegistry::new();
    let socket = SocketId::new(env.random_u64());
    let rec = record(&env);

    registry.register(socket, rec);

    assert!(registry.contains(socket));
    assert_eq!(registry.record(socket), Some(&rec));
    assert_eq!(registry.len(), 1);
}

#[test]
fn register_replaces_existing_entry() {
    let env = SimEnv::with_seed(2);
    let mut registry = RoomRegistry::new();
    let socket = SocketId::new(7);
    let first = record(&env);
    let second = record(&env);

    registry.register(socket, first);
    registry.register(socket, second);

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.record(socket), Some(&second));
}

#[test]
fn deregister_is_idempotent() {
    let env = SimEnv::with_seed(3);
    let mut registry = RoomRegistry::new();
    let socket = SocketId::new(7);
    registry.register(socket, record(&env));

    assert!(registry.deregister(socket));
    assert!(!registry.deregister(socket));
    assert!(registry.is_empty());
}

#[test]
fn unresolved_sockets_are_tracked_without_a_record() {
    let mut registry = RoomRegistry::new();
    let socket = SocketId::new(9);

    registry.track_unresolved(socket);

    assert!(registry.contains(socket));
    assert!(registry.record(socket).is_none());
    assert_eq!(registry.len(), 1);
}

#[test]
fn rebuild_replaces_previous_membership() {
    let env = SimEnv::with_seed(4);
    let mut registry = RoomRegistry::new();
    registry.register(SocketId::new(1), record(&env));
    registry.register(SocketId::new(2), record(&env));

    let survivor = record(&env);
    registry.rebuild(vec![
        (SocketId::new(2), Some(survivor)),
        (SocketId::new(3), None),
    ]);

    assert!(!registry.contains(SocketId::new(1)));
    assert_eq!(registry.record(SocketId::new(2)), Some(&survivor));
    assert!(registry.contains(SocketId::new(3)));
    assert!(registry.record(SocketId::new(3)).is_none());
    assert_eq!(registry.len(), 2);
}

#[test]
fn members_yields_every_tracked_socket() {
    let env = SimEnv::with_seed(5);
    let mut registry = RoomRegistry::new();
    registry.register(SocketId::new(1), record(&env));
    registry.track_unresolved(SocketId::new(2));

    let mut sockets: Vec<u64> = registry.members().map(|(s, _)| s.raw()).collect();
    sockets.sort_unstable();
    assert_eq!(sockets, vec![1, 2]);
}
