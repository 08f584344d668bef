//! UDP ingress - receives market-update datagrams and fans them out.
//!
//! One thread owns the socket. The socket is polled in non-blocking
//! mode; malformed datagrams are counted and dropped, valid ones are
//! busy-enqueued into both hand-off buffers, yielding while a buffer is
//! full.

use std::io;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

use tracing::{debug, warn};

use crate::ring::RingBuffer;
use crate::update::MarketUpdate;
use crate::wire::{self, MAX_DATAGRAM_LEN};

/// Ingress counters, shared with the stats reporter.
#[derive(Debug, Default)]
pub struct PacketStats {
    /// Valid datagrams accepted
    pub packets_received: AtomicU64,
    /// Updates enqueued to both consumers
    pub updates_enqueued: AtomicU64,
    /// Datagrams dropped by validation
    pub packets_discarded: AtomicU64,
}

impl PacketStats {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Bind the feed socket on all interfaces, non-blocking.
///
/// Port 0 binds an ephemeral port, which tests use.
pub fn bind_socket(port: u16) -> io::Result<UdpSocket> {
    let socket = UdpSocket::bind(("0.0.0.0", port))?;
    socket.set_nonblocking(true)?;
    Ok(socket)
}

/// Receive datagrams until the run flag clears.
pub fn run_receiver(
    socket: &UdpSocket,
    run: &AtomicBool,
    book_queue: &RingBuffer<MarketUpdate>,
    match_queue: &RingBuffer<MarketUpdate>,
    stats: &PacketStats,
) {
    let mut buf = [0u8; MAX_DATAGRAM_LEN];

    while run.load(Ordering::Relaxed) {
        match socket.recv_from(&mut buf) {
            Ok((len, _)) => dispatch_datagram(&buf[..len], run, book_queue, match_queue, stats),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => thread::yield_now(),
            Err(err) => {
                warn!(%err, "feed socket receive error");
                thread::yield_now();
            }
        }
    }
}

/// Validate one datagram and enqueue its updates to both consumers.
pub(crate) fn dispatch_datagram(
    datagram: &[u8],
    run: &AtomicBool,
    book_queue: &RingBuffer<MarketUpdate>,
    match_queue: &RingBuffer<MarketUpdate>,
    stats: &PacketStats,
) {
    let updates = match wire::decode_datagram(datagram) {
        Ok(updates) => updates,
        Err(err) => {
            debug!(%err, "dropping datagram");
            stats.packets_discarded.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    stats.packets_received.fetch_add(1, Ordering::Relaxed);
    for update in updates {
        if !enqueue_blocking(book_queue, update, run) {
            return; // shutting down
        }
        if !enqueue_blocking(match_queue, update, run) {
            return;
        }
        stats.updates_enqueued.fetch_add(1, Ordering::Relaxed);
    }
}

/// Spin an item into a buffer, yielding while it is full.
///
/// Gives up (returning `false`) once the run flag clears, so shutdown
/// cannot wedge behind a full buffer whose consumers have exited.
fn enqueue_blocking(
    queue: &RingBuffer<MarketUpdate>,
    update: MarketUpdate,
    run: &AtomicBool,
) -> bool {
    let mut item = update;
    loop {
        match queue.push(item) {
            Ok(()) => return true,
            Err(back) => {
                if !run.load(Ordering::Relaxed) {
                    return false;
                }
                item = back;
                thread::yield_now();
            }
        }
    }
}
