//! Snapshot publication cell shared by the mirror and the engine.
//!
//! The current `BookState` lives behind an epoch-managed atomic pointer:
//! readers pin a guard and acquire-load the snapshot; writers clone it,
//! compose their mutation, and compare-and-swap the candidate in. A
//! displaced snapshot is destroyed only after every reader that might
//! still hold it has unpinned.

use std::sync::atomic::Ordering;
use std::thread;

use crossbeam::epoch::{self, Atomic, Owned};

use crate::book::BookState;

pub(crate) struct SharedBook {
    current: Atomic<BookState>,
}

impl SharedBook {
    pub(crate) fn new() -> Self {
        Self {
            current: Atomic::new(BookState::new()),
        }
    }

    /// Run `read` against the current snapshot.
    pub(crate) fn read<R>(&self, read: impl FnOnce(&BookState) -> R) -> R {
        let guard = epoch::pin();
        let shared = self.current.load(Ordering::Acquire, &guard);
        // SAFETY: the cell is initialized non-null and only ever swapped
        // to non-null candidates; the guard keeps the snapshot alive.
        read(unsafe { shared.deref() })
    }

    /// Clone the current snapshot, apply `compose`, and CAS-install the
    /// result, retrying against a fresh snapshot after every lost race.
    ///
    /// `compose` runs once per attempt; side effects it records (pending
    /// trades) must be rebuilt each attempt and only acted on once this
    /// returns. The winning attempt's output is returned.
    pub(crate) fn publish<R>(&self, mut compose: impl FnMut(&mut BookState) -> R) -> R {
        loop {
            let guard = epoch::pin();
            let current = self.current.load(Ordering::Acquire, &guard);
            // SAFETY: non-null as above; `current` stays valid while the
            // guard is pinned.
            let mut candidate = unsafe { current.deref() }.clone();
            let output = compose(&mut candidate);

            // A lost race drops the candidate with the error value; the
            // stale output dies with this iteration.
            let installed = match self.current.compare_exchange(
                current,
                Owned::new(candidate),
                Ordering::Release,
                Ordering::Acquire,
                &guard,
            ) {
                Ok(_) => {
                    // SAFETY: `current` was just unlinked by the CAS; no
                    // new reader can reach it, and the epoch defers the
                    // destruction past existing readers.
                    unsafe { guard.defer_destroy(current) };
                    true
                }
                Err(_) => false,
            };

            if installed {
                return output;
            }
            drop(guard);
            thread::yield_now();
        }
    }
}

impl Drop for SharedBook {
    fn drop(&mut self) {
        // SAFETY: `&mut self` means no concurrent readers or writers
        // remain; the final snapshot can be reclaimed immediately.
        unsafe {
            let shared = self.current.load(Ordering::Relaxed, epoch::unprotected());
            drop(shared.into_owned());
        }
    }
}
