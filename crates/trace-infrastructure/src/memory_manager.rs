//! The bitmap-pool allocator and LRU eviction thread (`spec.md` §4.8).
//!
//! The original design (`rocprofvis_controller_mem_mgmt.h`) allocates a
//! raw `size * 4096`-byte buffer per pool and tracks occupancy with a
//! `std::bitset`. The workspace denies `unsafe_code`, so each pool here
//! is a fixed-capacity slab of `Option<T>` slots: `None` plays the role
//! of a cleared bit, `Some` an allocated one, and a scanning cursor keeps
//! the same "allocate from the next unset bit" behavior.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, warn};
use trace_domain::entities::handle::HandleId;
use trace_domain::error::{Error, Result};

/// Fixed slot count per pool (`kMemPoolBitSetSize` in the original).
pub const POOL_BITS: usize = 4096;

/// A fixed-capacity slab of `POOL_BITS` slots. Allocation scans from a
/// cursor for the next empty slot; a pool with every slot empty is
/// releasable (`spec.md` §4.8, testable property 8).
#[derive(Debug)]
pub struct MemoryPool<T> {
    slots: Vec<Option<T>>,
    cursor: usize,
    occupied_count: usize,
}

impl<T> Default for MemoryPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MemoryPool<T> {
    #[must_use]
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(POOL_BITS);
        slots.resize_with(POOL_BITS, || None);
        Self { slots, cursor: 0, occupied_count: 0 }
    }

    /// Allocate `value` into the next free slot, returning its index.
    ///
    /// # Errors
    /// Returns [`Error::MemoryAllocError`] when the pool is full.
    pub fn allocate(&mut self, value: T) -> Result<usize> {
        for offset in 0..POOL_BITS {
            let idx = (self.cursor + offset) % POOL_BITS;
            if self.slots[idx].is_none() {
                self.slots[idx] = Some(value);
                self.cursor = (idx + 1) % POOL_BITS;
                self.occupied_count += 1;
                return Ok(idx);
            }
        }
        Err(Error::MemoryAllocError { message: "pool exhausted".to_string() })
    }

    /// Clear `index`'s slot, returning the value that was stored there.
    pub fn deallocate(&mut self, index: usize) -> Option<T> {
        let taken = self.slots.get_mut(index).and_then(Option::take);
        if taken.is_some() {
            self.occupied_count = self.occupied_count.saturating_sub(1);
        }
        taken
    }

    /// `true` once every slot has been cleared; the pool can be dropped.
    #[must_use]
    pub fn is_releasable(&self) -> bool {
        self.occupied_count == 0
    }
}

/// `(timestamp, owner, segment-reference, array id, lod)` — the key an
/// eviction sweep uses to order candidates and the in-use set checks
/// against (`spec.md` §3 "LRU member").
#[derive(Debug, Clone)]
struct LruMember {
    timestamp: u64,
    owner: HandleId,
    segment: u64,
    array_id: u64,
    lod: u32,
}

struct LruState {
    members: HashMap<u64, LruMember>,
    in_use: std::collections::HashSet<u64>,
    storage_used: u64,
}

/// Background LRU eviction over fetched result arrays, capped by a soft
/// byte budget (`spec.md` §4.8).
pub struct LruManager {
    state: Arc<Mutex<LruState>>,
    cv: Arc<Condvar>,
    soft_cap_bytes: Arc<AtomicU64>,
    sweep_cap: u64,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    evicted_total: Arc<AtomicU64>,
}

impl LruManager {
    #[must_use]
    pub fn new(soft_cap_bytes: u64, sweep_cap: u64) -> Self {
        let state = Arc::new(Mutex::new(LruState {
            members: HashMap::new(),
            in_use: std::collections::HashSet::new(),
            storage_used: 0,
        }));
        let cv = Arc::new(Condvar::new());
        let soft_cap = Arc::new(AtomicU64::new(soft_cap_bytes));
        let shutdown = Arc::new(AtomicBool::new(false));
        let evicted_total = Arc::new(AtomicU64::new(0));

        let thread_state = Arc::clone(&state);
        let thread_cv = Arc::clone(&cv);
        let thread_cap = Arc::clone(&soft_cap);
        let thread_shutdown = Arc::clone(&shutdown);
        let thread_evicted = Arc::clone(&evicted_total);
        let sweep = sweep_cap;

        let thread = std::thread::Builder::new()
            .name("trace-lru-eviction".to_string())
            .spawn(move || lru_loop(&thread_state, &thread_cv, &thread_cap, &thread_shutdown, sweep, &thread_evicted))
            .expect("failed to spawn LRU eviction thread");

        Self {
            state,
            cv,
            soft_cap_bytes: soft_cap,
            sweep_cap,
            shutdown,
            thread: Some(thread),
            evicted_total,
        }
    }

    /// `AddLRUReference`: register a fetched array as evictable.
    pub fn add_reference(&self, array_id: u64, owner: HandleId, segment: u64, lod: u32, timestamp: u64) {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        state.members.insert(array_id, LruMember { timestamp, owner, segment, array_id, lod });
        state.storage_used = state.storage_used.saturating_add(1);
        self.cv.notify_one();
    }

    /// `CancelArrayOwnership`: the owner reclaims `array_id`, making it
    /// non-evictable until re-registered.
    pub fn cancel_ownership(&self, array_id: u64) {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        state.in_use.insert(array_id);
    }

    #[must_use]
    pub fn evicted_total(&self) -> u64 {
        self.evicted_total.load(Ordering::Relaxed)
    }

    pub fn set_soft_cap(&self, bytes: u64) {
        self.soft_cap_bytes.store(bytes, Ordering::Relaxed);
        self.cv.notify_one();
    }
}

fn lru_loop(
    state: &Arc<Mutex<LruState>>,
    cv: &Arc<Condvar>,
    soft_cap: &Arc<AtomicU64>,
    shutdown: &Arc<AtomicBool>,
    sweep_cap: u64,
    evicted_total: &Arc<AtomicU64>,
) {
    loop {
        let guard = state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let (guard, timed_out) = cv
            .wait_timeout(guard, Duration::from_millis(100))
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let _ = timed_out;

        if shutdown.load(Ordering::Acquire) {
            return;
        }

        let mut guard = guard;
        let cap = soft_cap.load(Ordering::Relaxed);
        if guard.storage_used <= cap {
            continue;
        }

        let mut candidates: Vec<&LruMember> = guard
            .members
            .values()
            .filter(|m| !guard.in_use.contains(&m.array_id))
            .collect();
        candidates.sort_by_key(|m| m.timestamp);

        let to_evict: Vec<u64> = candidates.iter().take(sweep_cap as usize).map(|m| m.array_id).collect();
        if to_evict.is_empty() {
            warn!("LRU budget exceeded but no evictable entries; proceeding best-effort");
            continue;
        }

        for array_id in &to_evict {
            if let Some(member) = guard.members.remove(array_id) {
                debug!(
                    array_id,
                    owner = member.owner.raw(),
                    segment = member.segment,
                    lod = member.lod,
                    "evicting LRU array"
                );
            }
            guard.storage_used = guard.storage_used.saturating_sub(1);
        }
        debug!(count = to_evict.len(), "LRU sweep evicted entries");
        evicted_total.fetch_add(to_evict.len() as u64, Ordering::Relaxed);
    }
}

impl Drop for LruManager {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        self.cv.notify_all();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("LRU eviction thread panicked during shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_bits_clear_to_empty_on_full_release() {
        let mut pool: MemoryPool<u64> = MemoryPool::new();
        let idx = pool.allocate(42).unwrap();
        assert!(!pool.is_releasable());
        assert_eq!(pool.deallocate(idx), Some(42));
        assert!(pool.is_releasable());
    }

    #[test]
    fn pool_exhaustion_returns_memory_alloc_error() {
        let mut pool: MemoryPool<u64> = MemoryPool::new();
        for i in 0..POOL_BITS {
            pool.allocate(i as u64).unwrap();
        }
        assert!(matches!(pool.allocate(999), Err(Error::MemoryAllocError { .. })));
    }

    #[test]
    fn lru_evicts_down_to_soft_cap() {
        let manager = LruManager::new(2, 1_000_000);
        for i in 0..10u64 {
            manager.add_reference(i, HandleId::new(0), 0, 0, i);
        }
        std::thread::sleep(Duration::from_millis(250));
        assert!(manager.evicted_total() > 0);
    }
}
