//! MPMC bounded ring buffer used for inter-thread hand-off.
//!
//! A slot-sequenced queue after Vyukov: every slot carries a monotonic
//! sequence tag that tells producers and consumers which generation the
//! slot belongs to. The head and tail counters only arbitrate *which*
//! thread owns a slot; the sequence tag is the synchronization point
//! that carries the payload's happens-before edge.
//!
//! Lock-free, not wait-free: an operation either completes, definitively
//! fails with full/empty, or observes contention and retries.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::utils::CachePadded;

/// Default capacity for hand-off buffers
pub const DEFAULT_RING_CAPACITY: usize = 1024;

struct Slot<T> {
    /// Generation tag: `pos` when writable, `pos + 1` when readable,
    /// `pos + cap` once re-armed for the next lap.
    seq: AtomicU64,
    data: UnsafeCell<MaybeUninit<T>>,
}

/// Bounded multi-producer multi-consumer FIFO.
///
/// Capacity is rounded up to a power of two so index-to-slot mapping is
/// a mask. Slot storage is allocated once at construction and reused for
/// the buffer's lifetime.
pub struct RingBuffer<T> {
    /// Next position to pop from
    head: CachePadded<AtomicU64>,
    /// Next position to push to
    tail: CachePadded<AtomicU64>,
    mask: u64,
    slots: Box<[Slot<T>]>,
}

// SAFETY: slot payloads are transferred between threads through the
// acquire/release sequence tag; a slot is only read by the consumer that
// won the head CAS for its position and only written by the producer
// that won the tail CAS.
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T> RingBuffer<T> {
    /// Create a buffer holding at least `capacity` items.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");
        let cap = capacity.next_power_of_two();

        let slots: Box<[Slot<T>]> = (0..cap as u64)
            .map(|i| Slot {
                seq: AtomicU64::new(i),
                data: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();

        Self {
            head: CachePadded::new(AtomicU64::new(0)),
            tail: CachePadded::new(AtomicU64::new(0)),
            mask: cap as u64 - 1,
            slots,
        }
    }

    /// Number of slots (the rounded-up capacity).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Push one item, failing with `Err(value)` when the buffer is full.
    ///
    /// A failed push has no side effects.
    pub fn push(&self, value: T) -> Result<(), T> {
        let mut pos = self.tail.load(Ordering::Relaxed);

        loop {
            let slot = &self.slots[(pos & self.mask) as usize];
            let seq = slot.seq.load(Ordering::Acquire);
            let dif = seq as i64 - pos as i64;

            if dif == 0 {
                match self
                    .tail
                    .compare_exchange_weak(pos, pos + 1, Ordering::Relaxed, Ordering::Relaxed)
                {
                    Ok(_) => {
                        // SAFETY: winning the tail CAS at `pos` grants
                        // exclusive write access to this slot until the
                        // release store below publishes it.
                        unsafe { (*slot.data.get()).write(value) };
                        slot.seq.store(pos + 1, Ordering::Release);
                        return Ok(());
                    }
                    Err(current) => pos = current,
                }
            } else if dif < 0 {
                return Err(value); // full
            } else {
                // Another producer advanced the tail past us; catch up.
                pos = self.tail.load(Ordering::Relaxed);
            }
        }
    }

    /// Pop one item, returning `None` when the buffer is empty.
    pub fn pop(&self) -> Option<T> {
        let mut pos = self.head.load(Ordering::Relaxed);

        loop {
            let slot = &self.slots[(pos & self.mask) as usize];
            let seq = slot.seq.load(Ordering::Acquire);
            let dif = seq as i64 - (pos + 1) as i64;

            if dif == 0 {
                match self
                    .head
                    .compare_exchange_weak(pos, pos + 1, Ordering::Relaxed, Ordering::Relaxed)
                {
                    Ok(_) => {
                        // SAFETY: winning the head CAS at `pos` grants
                        // exclusive read access; the acquire load of the
                        // sequence tag saw the producer's release store,
                        // so the payload write is visible.
                        let value = unsafe { (*slot.data.get()).assume_init_read() };
                        // Re-arm the slot for a push one lap ahead.
                        slot.seq
                            .store(pos + self.slots.len() as u64, Ordering::Release);
                        return Some(value);
                    }
                    Err(current) => pos = current,
                }
            } else if dif < 0 {
                return None; // empty
            } else {
                pos = self.head.load(Ordering::Relaxed);
            }
        }
    }

    /// Advisory emptiness check; the answer reflects a moment already in
    /// the past.
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    /// Advisory fullness check.
    pub fn is_full(&self) -> bool {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.wrapping_sub(head) >= self.slots.len() as u64
    }
}

impl<T> Drop for RingBuffer<T> {
    fn drop(&mut self) {
        // Items still resident at shutdown are discarded here.
        while self.pop().is_some() {}
    }
}
