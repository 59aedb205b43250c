//! # Broker Property Tests
//!
//! End-to-end checks of the broker contract through the public API only.
//!
//! ## Groups
//! - Registration: uniqueness and ownership
//! - Removal: owner isolation and bucket cleanup
//! - Fingerprint: structural identity
//! - Visibility: fail-closed topology gating and indexed lookup

use ctxpool_core::{
    ConnectionGraph, ContextInterface, ContextObject, ContextPool, ContextSchema, Credential,
    OwnerId, PoolError, RegistryStats, fingerprint,
};
use std::any::Any;
use std::sync::Arc;

const SECRET: &str = "host-secret-0123456789";

ctxpool_core::context_interface! {
    /// Serial line shared by terminals and printers.
    pub trait SerialLine [device] {
        fn send(&self, byte: u8);
        fn receive(&self) -> Option<u8>;
    }
}

struct Loopback(std::sync::Mutex<Option<u8>>);

impl Loopback {
    fn new() -> Arc<Self> {
        Arc::new(Self(std::sync::Mutex::new(None)))
    }
}

impl SerialLine for Loopback {
    fn send(&self, byte: u8) {
        *self.0.lock().expect("line") = Some(byte);
    }

    fn receive(&self) -> Option<u8> {
        self.0.lock().expect("line").take()
    }
}

fn serial() -> &'static ContextSchema {
    <dyn SerialLine as ContextInterface>::schema()
}

fn pool() -> ContextPool {
    ContextPool::new(Credential::new(SECRET)).expect("pool")
}

fn bound_pool(edges: &[(u64, u64)]) -> ContextPool {
    let pool = pool();
    let graph = ConnectionGraph::from_edges(
        edges
            .iter()
            .map(|&(from, to)| (OwnerId(from), OwnerId(to))),
    );
    pool.bind(&Credential::new(SECRET), Arc::new(graph))
        .expect("bind");
    pool
}

fn everyone_pool() -> ContextPool {
    let pool = pool();
    pool.bind(
        &Credential::new(SECRET),
        Arc::new(|_: OwnerId, _: OwnerId| true),
    )
    .expect("bind");
    pool
}

// =============================================================================
// REGISTRATION
// =============================================================================

mod registration {
    use super::*;

    /// Register then lookup by a connected requester returns the instance.
    #[test]
    fn registered_context_found_at_index_zero() {
        let pool = bound_pool(&[(1, 2)]);
        let line = Loopback::new();
        let published: Arc<dyn SerialLine> = line.clone();
        pool.register(OwnerId(2), published).expect("register");

        let found = pool
            .get_device_context::<dyn SerialLine>(OwnerId(1))
            .expect("lookup")
            .expect("visible");
        found.send(0x41);
        assert_eq!(line.receive(), Some(0x41));
    }

    /// A second register of the same instance fails and keeps the bucket.
    #[test]
    fn second_register_rejected() {
        let pool = everyone_pool();
        let line: Arc<dyn SerialLine> = Loopback::new();

        pool.register(OwnerId(1), line.clone()).expect("first");
        let result = pool.register(OwnerId(1), line);

        let expected = fingerprint(serial()).expect("fingerprint");
        assert_eq!(
            result,
            Err(PoolError::AlreadyRegistered {
                fingerprint: expected
            })
        );
        assert_eq!(pool.visible(OwnerId(1), serial()).expect("visible").len(), 1);
    }

    /// An untagged descriptor is rejected before anything is stored.
    #[test]
    fn untagged_schema_rejected() {
        let pool = everyone_pool();
        let schema = serial().clone().untagged();
        let object = ContextObject::new::<dyn SerialLine>(Loopback::new()).expect("object");

        let result = pool.register_object(OwnerId(1), object, &schema);
        assert!(matches!(result, Err(PoolError::InvalidContext(_))));
        assert_eq!(pool.stats(), RegistryStats::default());
    }

    /// A descriptor with state is not a pure capability interface.
    #[test]
    fn stateful_schema_rejected() {
        let pool = everyone_pool();
        let schema = serial().clone().with_field("baud_rate");
        let object = ContextObject::new::<dyn SerialLine>(Loopback::new()).expect("object");

        let result = pool.register_object(OwnerId(1), object, &schema);
        assert!(matches!(result, Err(PoolError::InvalidContext(_))));
    }

    /// An instance that does not implement the descriptor is rejected.
    #[test]
    fn instance_must_implement_descriptor() {
        let pool = everyone_pool();
        let printer = ContextSchema::new("Printer").with_operation("print", "()", ["&str"]);
        let instance: Arc<dyn Any + Send + Sync> = Arc::new(0u32);
        let object = ContextObject::declared(instance, &printer).expect("declared");

        let result = pool.register_object(OwnerId(1), object, serial());
        assert!(matches!(result, Err(PoolError::InvalidContext(_))));
    }
}

// =============================================================================
// REMOVAL
// =============================================================================

mod removal {
    use super::*;

    /// Unregister removes only the caller's registrations.
    #[test]
    fn other_owners_untouched() {
        let pool = everyone_pool();
        let theirs: Arc<dyn SerialLine> = Loopback::new();
        pool.register(OwnerId(1), Loopback::new() as Arc<dyn SerialLine>)
            .expect("mine");
        pool.register(OwnerId(2), theirs.clone()).expect("theirs");

        assert_eq!(pool.unregister::<dyn SerialLine>(OwnerId(1)).expect("unregister"), 1);

        let left = pool
            .get_device_context::<dyn SerialLine>(OwnerId(3))
            .expect("lookup")
            .expect("theirs still visible");
        assert!(Arc::ptr_eq(&left, &theirs));
    }

    /// Removing nothing is reported, not raised.
    #[test]
    fn removing_nothing_returns_zero() {
        let pool = everyone_pool();
        assert_eq!(pool.unregister::<dyn SerialLine>(OwnerId(1)).expect("empty"), 0);
    }

    /// After the last removal the bucket is gone and lookups find nothing.
    #[test]
    fn last_removal_drops_bucket() {
        let pool = everyone_pool();
        pool.register(OwnerId(1), Loopback::new() as Arc<dyn SerialLine>)
            .expect("register");
        pool.unregister::<dyn SerialLine>(OwnerId(1))
            .expect("unregister");

        assert!(pool.lookup(OwnerId(1), serial(), 0).expect("lookup").is_none());
        assert_eq!(pool.stats(), RegistryStats::default());
    }

    /// Register/unregister cycling does not grow the registry.
    #[test]
    fn cycling_does_not_grow() {
        let pool = everyone_pool();
        for round in 0..100 {
            pool.register(OwnerId(round % 3), Loopback::new() as Arc<dyn SerialLine>)
                .expect("register");
            pool.unregister::<dyn SerialLine>(OwnerId(round % 3))
                .expect("unregister");
            assert_eq!(pool.stats(), RegistryStats::default());
        }
    }

    /// Unloading a plugin withdraws everything it published.
    #[test]
    fn unregister_owner_withdraws_everything() {
        let pool = everyone_pool();
        let timer = ContextSchema::new("Timer").with_operation("tick", "()", Vec::<String>::new());
        let instance: Arc<dyn Any + Send + Sync> = Arc::new(());
        let object = ContextObject::declared(instance, &timer).expect("declared");

        pool.register(OwnerId(1), Loopback::new() as Arc<dyn SerialLine>)
            .expect("serial");
        pool.register_object(OwnerId(1), object, &timer)
            .expect("timer");
        assert_eq!(pool.registrations_of(OwnerId(1)).len(), 2);

        assert_eq!(pool.unregister_owner(OwnerId(1)), 2);
        assert_eq!(pool.stats(), RegistryStats::default());
    }
}

// =============================================================================
// FINGERPRINT
// =============================================================================

mod fingerprints {
    use super::*;

    mod vendor_a {
        ctxpool_core::context_interface! {
            pub trait Disk [device] {
                fn read_sector(&self, track: u16, sector: u8) -> Vec<u8>;
                fn write_sector(&self, track: u16, sector: u8, data: &[u8]);
            }
        }
    }

    mod vendor_b {
        ctxpool_core::context_interface! {
            pub trait Disk [device] {
                fn write_sector(&self, track: u16, sector: u8, data: &[u8]);
                fn read_sector(&self, track: u16, sector: u8) -> Vec<u8>;
            }
        }
    }

    mod vendor_c {
        ctxpool_core::context_interface! {
            pub trait Disk [device] {
                fn read_sector(&self, track: u32, sector: u8) -> Vec<u8>;
                fn write_sector(&self, track: u16, sector: u8, data: &[u8]);
            }
        }
    }

    struct Drive;

    impl vendor_a::Disk for Drive {
        fn read_sector(&self, track: u16, sector: u8) -> Vec<u8> {
            vec![track.to_le_bytes()[0], sector]
        }

        fn write_sector(&self, _track: u16, _sector: u8, _data: &[u8]) {}
    }

    impl vendor_b::Disk for Drive {
        fn write_sector(&self, track: u16, sector: u8, data: &[u8]) {
            vendor_a::Disk::write_sector(self, track, sector, data);
        }

        fn read_sector(&self, track: u16, sector: u8) -> Vec<u8> {
            vendor_a::Disk::read_sector(self, track, sector)
        }
    }

    impl vendor_c::Disk for Drive {
        fn read_sector(&self, track: u32, sector: u8) -> Vec<u8> {
            vec![track.to_le_bytes()[0], sector]
        }

        fn write_sector(&self, track: u16, sector: u8, data: &[u8]) {
            vendor_a::Disk::write_sector(self, track, sector, data);
        }
    }

    /// Separately declared identical interfaces share a fingerprint.
    #[test]
    fn identical_shapes_share_fingerprint() {
        let a = <dyn vendor_a::Disk as ContextInterface>::schema();
        let b = <dyn vendor_b::Disk as ContextInterface>::schema();

        assert_ne!(a.interface, b.interface);
        assert_eq!(fingerprint(a).expect("a"), fingerprint(b).expect("b"));
    }

    /// One differing parameter type changes the fingerprint.
    #[test]
    fn one_parameter_type_changes_fingerprint() {
        let a = <dyn vendor_a::Disk as ContextInterface>::schema();
        let c = <dyn vendor_c::Disk as ContextInterface>::schema();

        assert_ne!(fingerprint(a).expect("a"), fingerprint(c).expect("c"));
    }

    /// A context published by one vendor's interface is found through the
    /// other's descriptor, and typed access works through the publishing
    /// interface.
    #[test]
    fn published_under_one_found_under_other() {
        let pool = everyone_pool();
        let drive: Arc<dyn vendor_a::Disk> = Arc::new(Drive);
        pool.register(OwnerId(1), drive).expect("register");

        let schema_b = <dyn vendor_b::Disk as ContextInterface>::schema();
        assert!(pool.lookup(OwnerId(2), schema_b, 0).expect("lookup").is_some());

        let typed = pool
            .get_device_context::<dyn vendor_a::Disk>(OwnerId(2))
            .expect("lookup")
            .expect("typed");
        assert_eq!(typed.read_sector(3, 7), vec![3, 7]);

        let other: Arc<dyn vendor_b::Disk> = Arc::new(Drive);
        other.write_sector(0, 0, &[]);
        assert_eq!(other.read_sector(1, 2), vec![1, 2]);
        let distinct: Arc<dyn vendor_c::Disk> = Arc::new(Drive);
        distinct.write_sector(0, 0, &[]);
        assert_eq!(distinct.read_sector(4, 5), vec![4, 5]);
    }
}

// =============================================================================
// VISIBILITY
// =============================================================================

mod visibility {
    use super::*;

    /// Nothing is visible before a topology is bound.
    #[test]
    fn unbound_topology_hides_everything() {
        let pool = pool();
        pool.register(OwnerId(1), Loopback::new() as Arc<dyn SerialLine>)
            .expect("register");

        for requester in 0..4 {
            assert!(
                pool.lookup(OwnerId(requester), serial(), 0)
                    .expect("lookup")
                    .is_none()
            );
        }
        assert_eq!(pool.stats().registrations, 1);
    }

    /// A failed bind keeps the pool fail-closed.
    #[test]
    fn wrong_credential_keeps_everything_hidden() {
        let pool = pool();
        pool.register(OwnerId(1), Loopback::new() as Arc<dyn SerialLine>)
            .expect("register");

        let result = pool.bind(
            &Credential::new("plugin-guessing-secret"),
            Arc::new(|_: OwnerId, _: OwnerId| true),
        );
        assert_eq!(result, Err(PoolError::InvalidCredential));
        assert!(!pool.is_bound());
        assert!(pool.lookup(OwnerId(2), serial(), 0).expect("lookup").is_none());
    }

    /// A registration the requester is not connected to stays hidden.
    #[test]
    fn unconnected_owner_hidden() {
        let pool = bound_pool(&[(1, 2)]);
        pool.register(OwnerId(3), Loopback::new() as Arc<dyn SerialLine>)
            .expect("register");

        assert!(pool.lookup(OwnerId(1), serial(), 0).expect("lookup").is_none());
    }

    /// Scenario: owners A, B, C each publish under one fingerprint; the
    /// requester is connected to A and C only.
    #[test]
    fn indexed_lookup_counts_visible_entries() {
        let (requester, a, b, c) = (OwnerId(10), OwnerId(1), OwnerId(2), OwnerId(3));
        let pool = bound_pool(&[(10, 1), (10, 3)]);

        let from_a: Arc<dyn SerialLine> = Loopback::new();
        let from_b: Arc<dyn SerialLine> = Loopback::new();
        let from_c: Arc<dyn SerialLine> = Loopback::new();
        pool.register(a, from_a.clone()).expect("a");
        pool.register(b, from_b).expect("b");
        pool.register(c, from_c.clone()).expect("c");

        let at0 = pool
            .get_device_context_at::<dyn SerialLine>(requester, 0)
            .expect("0")
            .expect("a visible");
        let at1 = pool
            .get_device_context_at::<dyn SerialLine>(requester, 1)
            .expect("1")
            .expect("c visible");
        assert!(Arc::ptr_eq(&at0, &from_a));
        assert!(Arc::ptr_eq(&at1, &from_c));
        assert!(
            pool.get_device_context_at::<dyn SerialLine>(requester, 2)
                .expect("2")
                .is_none()
        );

        let owners: Vec<_> = pool
            .visible(requester, serial())
            .expect("visible")
            .iter()
            .map(|registration| registration.owner)
            .collect();
        assert_eq!(owners, vec![a, c]);
    }

    /// The bound topology cannot be replaced.
    #[test]
    fn rebind_rejected() {
        let pool = bound_pool(&[]);
        pool.register(OwnerId(1), Loopback::new() as Arc<dyn SerialLine>)
            .expect("register");

        let result = pool.bind(
            &Credential::new(SECRET),
            Arc::new(|_: OwnerId, _: OwnerId| true),
        );
        assert_eq!(result, Err(PoolError::TopologyAlreadyBound));
        assert!(pool.lookup(OwnerId(2), serial(), 0).expect("lookup").is_none());
    }
}
