// Reference-counted packet pooling.
//
// One packet is often sent to many players. Each recipient holds a
// reference; the last release resets the packet and returns its slot to the
// pool. A handle remembers the slot generation it was issued for, so a
// handle that outlives the reclaim is rejected instead of touching the next
// owner's packet.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};
use serde::Serialize;
use tracing::{debug, error};

use crate::config::CodecConfig;
use crate::error::PoolError;
use crate::packet::{Envelope, Packet};

/// Result of a single `release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReleaseOutcome {
    /// References remain.
    Retained(usize),
    /// Last reference dropped: packet reset and slot freed.
    Reclaimed,
    /// Instance is permanent; nothing changed.
    Permanent,
    /// Instance never came from a pool; nothing to do.
    Unpooled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub created: usize,
    pub reused: usize,
    pub idle: usize,
}

struct SlotState {
    generation: u64,
    refs: usize,
    permanent: bool,
    live: bool,
}

struct Slot<P: Packet> {
    state: Mutex<SlotState>,
    envelope: RwLock<Envelope<P>>,
}

impl<P: Packet> Slot<P> {
    fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                generation: 0,
                refs: 0,
                permanent: false,
                live: false,
            }),
            envelope: RwLock::new(Envelope::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock()
    }
}

struct PoolShared<P: Packet> {
    free: Mutex<Vec<Arc<Slot<P>>>>,
    max_idle: usize,
    created: AtomicUsize,
    reused: AtomicUsize,
}

impl<P: Packet> PoolShared<P> {
    fn free_list(&self) -> MutexGuard<'_, Vec<Arc<Slot<P>>>> {
        self.free.lock()
    }
}

/// Free list of one packet type. Cheap to clone; clones share the list.
pub struct PacketPool<P: Packet> {
    shared: Arc<PoolShared<P>>,
}

impl<P: Packet> Clone for PacketPool<P> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<P: Packet> PacketPool<P> {
    pub fn new(max_idle: usize) -> Self {
        Self {
            shared: Arc::new(PoolShared {
                free: Mutex::new(Vec::new()),
                max_idle,
                created: AtomicUsize::new(0),
                reused: AtomicUsize::new(0),
            }),
        }
    }

    /// Takes an instance from the free list (or builds one) holding
    /// `initial_refs` references. Zero is treated as one.
    pub fn create_object(&self, initial_refs: usize) -> PooledPacket<P> {
        let reused = self.shared.free_list().pop();
        let slot = match reused {
            Some(slot) => {
                self.shared.reused.fetch_add(1, Ordering::Relaxed);
                slot
            }
            None => {
                self.shared.created.fetch_add(1, Ordering::Relaxed);
                Arc::new(Slot::new())
            }
        };

        let generation = {
            let mut state = slot.state();
            state.generation += 1;
            state.refs = initial_refs.max(1);
            state.permanent = false;
            state.live = true;
            state.generation
        };
        PooledPacket {
            slot,
            generation,
            pool: Some(Arc::clone(&self.shared)),
        }
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.shared.created.load(Ordering::Relaxed),
            reused: self.shared.reused.load(Ordering::Relaxed),
            idle: self.shared.free_list().len(),
        }
    }
}

impl<P: Packet> fmt::Debug for PacketPool<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketPool")
            .field("packet", &P::NAME)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Handle to one packet instance.
///
/// Cloning a handle does not add a reference; references are counted only
/// through `add_reference` and `release`.
pub struct PooledPacket<P: Packet> {
    slot: Arc<Slot<P>>,
    generation: u64,
    pool: Option<Arc<PoolShared<P>>>,
}

impl<P: Packet> Clone for PooledPacket<P> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            generation: self.generation,
            pool: self.pool.clone(),
        }
    }
}

impl<P: Packet> PooledPacket<P> {
    /// Wraps a packet that is not owned by any pool. Releases are no-ops;
    /// reference and permanence changes are errors.
    pub fn unpooled(packet: P) -> Self {
        let slot = Slot {
            state: Mutex::new(SlotState {
                generation: 1,
                refs: 1,
                permanent: false,
                live: true,
            }),
            envelope: RwLock::new(Envelope::new(packet)),
        };
        Self {
            slot: Arc::new(slot),
            generation: 1,
            pool: None,
        }
    }

    pub fn is_pooled(&self) -> bool {
        self.pool.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current reference count, or an error if this handle is stale.
    pub fn reference_count(&self) -> Result<usize, PoolError> {
        let state = self.slot.state();
        self.check_live(&state)?;
        Ok(state.refs)
    }

    pub fn is_permanent(&self) -> bool {
        self.slot.state().permanent
    }

    pub fn add_reference(&self) -> Result<usize, PoolError> {
        self.add_references(1)
    }

    pub fn add_references(&self, n: usize) -> Result<usize, PoolError> {
        self.require_pooled()?;
        let mut state = self.slot.state();
        self.check_live(&state)?;
        if !state.permanent {
            state.refs += n;
        }
        Ok(state.refs)
    }

    /// Exempts the instance from reclaim until permanence is revoked.
    pub fn set_permanent(&self, permanent: bool) -> Result<(), PoolError> {
        self.require_pooled()?;
        let mut state = self.slot.state();
        self.check_live(&state)?;
        state.permanent = permanent;
        debug!("{} permanent={}", P::NAME, permanent);
        Ok(())
    }

    /// Drops one reference. The last one resets the packet (once) and
    /// returns the slot to the pool.
    pub fn release(&self) -> Result<ReleaseOutcome, PoolError> {
        let Some(pool) = &self.pool else {
            return Ok(ReleaseOutcome::Unpooled);
        };

        {
            let mut state = self.slot.state();
            if state.generation != self.generation {
                return Err(self.stale(state.generation));
            }
            if state.permanent {
                return Ok(ReleaseOutcome::Permanent);
            }
            if state.refs == 0 {
                let err = PoolError::ReferenceUnderflow {
                    packet: P::NAME,
                    count: -1,
                };
                error!("{}", err);
                return Err(err);
            }
            state.refs -= 1;
            if state.refs > 0 {
                return Ok(ReleaseOutcome::Retained(state.refs));
            }
            state.live = false;
        }

        // Only the release that took the count to zero gets here.
        self.slot.envelope.write().reset();

        let mut free = pool.free_list();
        if free.len() < pool.max_idle {
            free.push(Arc::clone(&self.slot));
        } else {
            debug!("{} pool full ({} idle), dropping instance", P::NAME, free.len());
        }
        Ok(ReleaseOutcome::Reclaimed)
    }

    /// Runs `f` against the envelope, for reads and `encode`.
    pub fn with_envelope<R>(&self, f: impl FnOnce(&Envelope<P>) -> R) -> Result<R, PoolError> {
        let envelope = self.slot.envelope.read();
        self.check_live(&self.slot.state())?;
        Ok(f(&envelope))
    }

    /// Runs `f` against the packet fields. Drops any cached encoding.
    pub fn update<R>(&self, f: impl FnOnce(&mut P) -> R) -> Result<R, PoolError> {
        let mut envelope = self.slot.envelope.write();
        self.check_live(&self.slot.state())?;
        Ok(f(envelope.packet_mut()))
    }

    fn require_pooled(&self) -> Result<(), PoolError> {
        if self.pool.is_some() {
            return Ok(());
        }
        let err = PoolError::NotPooled { packet: P::NAME };
        error!("{}", err);
        Err(err)
    }

    fn check_live(&self, state: &SlotState) -> Result<(), PoolError> {
        if state.generation == self.generation && state.live {
            return Ok(());
        }
        Err(self.stale(state.generation))
    }

    fn stale(&self, current: u64) -> PoolError {
        let err = PoolError::StaleHandle {
            packet: P::NAME,
            held: self.generation,
            current,
        };
        error!("{}", err);
        err
    }
}

impl<P: Packet> fmt::Debug for PooledPacket<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledPacket")
            .field("packet", &P::NAME)
            .field("generation", &self.generation)
            .field("pooled", &self.pool.is_some())
            .finish()
    }
}

/// One pool per packet type, created on first use.
pub struct PoolRegistry {
    max_idle: usize,
    pools: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl PoolRegistry {
    pub fn new(max_idle: usize) -> Self {
        Self {
            max_idle,
            pools: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &CodecConfig) -> Self {
        Self::new(config.pool_max_idle)
    }

    pub fn pool<P: Packet>(&self) -> PacketPool<P> {
        let key = TypeId::of::<P>();
        {
            let pools = self.pools.read();
            if let Some(pool) = pools.get(&key).and_then(|p| p.downcast_ref::<PacketPool<P>>()) {
                return pool.clone();
            }
        }

        let mut pools = self.pools.write();
        let entry = pools.entry(key).or_insert_with(|| {
            debug!("Creating pool for {}", P::NAME);
            Arc::new(PacketPool::<P>::new(self.max_idle))
        });
        match entry.downcast_ref::<PacketPool<P>>() {
            Some(pool) => pool.clone(),
            // Keys are the TypeId of the stored pool's packet type.
            None => PacketPool::new(self.max_idle),
        }
    }

    /// Shorthand for `pool::<P>().create_object(initial_refs)`.
    pub fn create_object<P: Packet>(&self, initial_refs: usize) -> PooledPacket<P> {
        self.pool::<P>().create_object(initial_refs)
    }

    pub fn len(&self) -> usize {
        self.pools.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::from_config(&CodecConfig::default())
    }
}

impl fmt::Debug for PoolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolRegistry")
            .field("max_idle", &self.max_idle)
            .field("pools", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    use crate::codec::{PacketReader, PacketWriter};
    use crate::context::CodecContext;
    use crate::error::Result;
    use crate::packets::MovePlayer;

    #[derive(Debug, Default)]
    struct Tracked {
        value: u32,
        resets: Arc<AtomicUsize>,
        encodes: Arc<AtomicUsize>,
    }

    impl Packet for Tracked {
        const ID: u32 = 0x7e;
        const NAME: &'static str = "Tracked";

        fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
            self.encodes.fetch_add(1, Ordering::SeqCst);
            w.write_unsigned_var_int(self.value);
            Ok(())
        }

        fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
            self.value = r.read_unsigned_var_int()?;
            Ok(())
        }

        fn reset(&mut self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
            self.value = 0;
        }
    }

    fn counters(handle: &PooledPacket<Tracked>) -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        handle
            .with_envelope(|e| (e.packet().resets.clone(), e.packet().encodes.clone()))
            .unwrap()
    }

    #[test]
    fn test_create_object_starts_with_one_reference() {
        let pool = PacketPool::<Tracked>::new(8);
        let handle = pool.create_object(1);
        assert!(handle.is_pooled());
        assert_eq!(handle.reference_count().unwrap(), 1);
        assert_eq!(pool.stats().created, 1);
    }

    #[test]
    fn test_last_release_reclaims_exactly_once() {
        let pool = PacketPool::<Tracked>::new(8);
        let handle = pool.create_object(1);
        let (resets, _) = counters(&handle);
        handle.update(|p| p.value = 9).unwrap();

        let n = 3;
        for _ in 0..n {
            handle.add_reference().unwrap();
        }
        for i in 0..n {
            assert_eq!(handle.release().unwrap(), ReleaseOutcome::Retained(n - i));
            assert_eq!(resets.load(Ordering::SeqCst), 0);
        }
        assert_eq!(handle.release().unwrap(), ReleaseOutcome::Reclaimed);
        assert_eq!(resets.load(Ordering::SeqCst), 1);
        assert_eq!(pool.stats().idle, 1);

        // One more release than acquisitions.
        assert!(matches!(
            handle.release(),
            Err(PoolError::ReferenceUnderflow { .. })
        ));
        assert_eq!(resets.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reused_slot_is_reset_and_old_handle_is_stale() {
        let pool = PacketPool::<Tracked>::new(8);
        let first = pool.create_object(1);
        first.update(|p| p.value = 42).unwrap();
        first.release().unwrap();

        let second = pool.create_object(1);
        assert_eq!(pool.stats().reused, 1);
        assert_eq!(second.with_envelope(|e| e.packet().value).unwrap(), 0);
        assert!(second.generation() > first.generation());

        assert!(matches!(first.release(), Err(PoolError::StaleHandle { .. })));
        assert!(matches!(
            first.update(|p| p.value = 1),
            Err(PoolError::StaleHandle { .. })
        ));
        assert_eq!(second.reference_count().unwrap(), 1);
    }

    #[test]
    fn test_permanent_blocks_reclaim_until_revoked() {
        let pool = PacketPool::<Tracked>::new(8);
        let handle = pool.create_object(1);
        let (resets, _) = counters(&handle);
        handle.set_permanent(true).unwrap();
        assert!(handle.is_permanent());

        assert_eq!(handle.release().unwrap(), ReleaseOutcome::Permanent);
        assert_eq!(handle.release().unwrap(), ReleaseOutcome::Permanent);
        assert_eq!(handle.reference_count().unwrap(), 1);
        assert_eq!(resets.load(Ordering::SeqCst), 0);

        handle.set_permanent(false).unwrap();
        assert_eq!(handle.release().unwrap(), ReleaseOutcome::Reclaimed);
        assert_eq!(resets.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unpooled_instance() {
        let handle = PooledPacket::unpooled(Tracked::default());
        assert!(!handle.is_pooled());
        assert_eq!(handle.release().unwrap(), ReleaseOutcome::Unpooled);
        assert!(matches!(
            handle.add_reference(),
            Err(PoolError::NotPooled { .. })
        ));
        assert!(matches!(
            handle.set_permanent(true),
            Err(PoolError::NotPooled { .. })
        ));
        // Still usable after the no-op release.
        assert_eq!(handle.with_envelope(|e| e.packet().value).unwrap(), 0);
    }

    #[test]
    fn test_idle_list_is_bounded() {
        let pool = PacketPool::<Tracked>::new(1);
        let a = pool.create_object(1);
        let b = pool.create_object(1);
        assert_eq!(a.release().unwrap(), ReleaseOutcome::Reclaimed);
        assert_eq!(b.release().unwrap(), ReleaseOutcome::Reclaimed);
        assert_eq!(pool.stats().idle, 1);
    }

    #[test]
    fn test_registry_shares_pool_per_type() {
        let registry = PoolRegistry::new(4);
        let handle = registry.create_object::<Tracked>(1);
        handle.release().unwrap();
        assert_eq!(registry.pool::<Tracked>().stats().idle, 1);

        let moves = registry.pool::<MovePlayer>();
        assert_eq!(moves.stats(), PoolStats::default());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_slot_usable_after_panicking_update() {
        let pool = PacketPool::<Tracked>::new(4);
        let handle = pool.create_object(1);
        handle.update(|p| p.value = 5).unwrap();

        let other = handle.clone();
        let joined = thread::spawn(move || {
            other
                .update(|p| {
                    p.value = 6;
                    panic!("recipient failed mid-update");
                })
                .ok();
        })
        .join();
        assert!(joined.is_err());

        assert_eq!(handle.with_envelope(|e| e.packet().value).unwrap(), 6);
        assert_eq!(handle.release().unwrap(), ReleaseOutcome::Reclaimed);
        assert_eq!(pool.stats().idle, 1);
    }

    #[test]
    fn test_shared_instance_encoded_once_across_recipients() {
        let ctx = Arc::new(CodecContext::default());
        let pool = PacketPool::<Tracked>::new(4);
        let recipients = 8;
        let handle = pool.create_object(recipients);
        handle.update(|p| p.value = 1000).unwrap();
        let (resets, encodes) = counters(&handle);

        let barrier = Arc::new(Barrier::new(recipients));
        let workers: Vec<_> = (0..recipients)
            .map(|_| {
                let handle = handle.clone();
                let barrier = Arc::clone(&barrier);
                let ctx = Arc::clone(&ctx);
                thread::spawn(move || {
                    barrier.wait();
                    let bytes = handle.with_envelope(|e| e.encode(&ctx)).unwrap().unwrap();
                    let outcome = handle.release().unwrap();
                    (bytes, outcome)
                })
            })
            .collect();

        let results: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();
        let first = &results[0].0;
        assert!(results.iter().all(|(bytes, _)| bytes == first));
        assert_eq!(
            results
                .iter()
                .filter(|(_, outcome)| *outcome == ReleaseOutcome::Reclaimed)
                .count(),
            1
        );
        assert_eq!(encodes.load(Ordering::SeqCst), 1);
        assert_eq!(resets.load(Ordering::SeqCst), 1);
    }
}
