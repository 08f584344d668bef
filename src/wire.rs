//! Wire framing for the UDP market-data feed.
//!
//! A datagram is a 4-byte header followed by a batch of packed update
//! records. All multi-byte fields are big-endian; the doubles travel as
//! big-endian bit patterns.
//!
//! ```text
//! header:  protocol u16 (= 0x6666) | count u16 (1..=20)
//! record:  timestamp u64 | price f64 | size f64 | side u8 | 7 pad bytes
//! ```
//!
//! Records are 32 bytes so every field stays 8-byte aligned within the
//! batch. Datagrams failing any validation are dropped by the receiver
//! and never reach the pipeline.

use thiserror::Error;

use crate::update::{MarketUpdate, Side};

/// Protocol magic carried in every datagram header
pub const PROTOCOL_MAGIC: u16 = 0x6666;

/// Maximum number of update records per datagram
pub const MAX_BATCH: usize = 20;

/// Encoded header length in bytes
pub const HEADER_LEN: usize = 4;

/// Encoded update record length in bytes
pub const UPDATE_LEN: usize = 32;

/// Largest valid datagram
pub const MAX_DATAGRAM_LEN: usize = HEADER_LEN + MAX_BATCH * UPDATE_LEN;

/// Why a datagram was rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("datagram too short: {0} bytes")]
    Truncated(usize),
    #[error("unknown protocol {0:#06x}")]
    BadProtocol(u16),
    #[error("batch count {0} outside 1..={MAX_BATCH}")]
    BadCount(u16),
    #[error("length mismatch: header promises {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("unknown side tag {0}")]
    BadSide(u8),
}

/// Decode one datagram into its batch of updates.
///
/// Validation order follows the receiver: length, protocol, count, exact
/// payload length, then per-record side tags.
pub fn decode_datagram(buf: &[u8]) -> Result<Vec<MarketUpdate>, WireError> {
    if buf.len() < HEADER_LEN {
        return Err(WireError::Truncated(buf.len()));
    }

    let protocol = u16::from_be_bytes([buf[0], buf[1]]);
    if protocol != PROTOCOL_MAGIC {
        return Err(WireError::BadProtocol(protocol));
    }

    let count = u16::from_be_bytes([buf[2], buf[3]]);
    if count == 0 || count as usize > MAX_BATCH {
        return Err(WireError::BadCount(count));
    }

    let expected = HEADER_LEN + count as usize * UPDATE_LEN;
    if buf.len() != expected {
        return Err(WireError::LengthMismatch {
            expected,
            actual: buf.len(),
        });
    }

    let mut updates = Vec::with_capacity(count as usize);
    for record in buf[HEADER_LEN..].chunks_exact(UPDATE_LEN) {
        updates.push(decode_update(record)?);
    }
    Ok(updates)
}

/// Encode a batch of updates into one datagram.
///
/// Used by tests and feed-simulation tools; the production path only
/// decodes. Fails when the batch does not fit a single datagram.
pub fn encode_datagram(updates: &[MarketUpdate]) -> Result<Vec<u8>, WireError> {
    if updates.is_empty() || updates.len() > MAX_BATCH {
        return Err(WireError::BadCount(updates.len() as u16));
    }

    let mut buf = Vec::with_capacity(HEADER_LEN + updates.len() * UPDATE_LEN);
    buf.extend_from_slice(&PROTOCOL_MAGIC.to_be_bytes());
    buf.extend_from_slice(&(updates.len() as u16).to_be_bytes());
    for update in updates {
        buf.extend_from_slice(&update.timestamp.to_be_bytes());
        buf.extend_from_slice(&update.price.to_bits().to_be_bytes());
        buf.extend_from_slice(&update.size.to_bits().to_be_bytes());
        buf.push(update.side.tag());
        buf.extend_from_slice(&[0u8; 7]);
    }
    Ok(buf)
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    u64::from_be_bytes(raw)
}

fn decode_update(record: &[u8]) -> Result<MarketUpdate, WireError> {
    debug_assert_eq!(record.len(), UPDATE_LEN);

    let timestamp = read_u64(&record[0..8]);
    let price = f64::from_bits(read_u64(&record[8..16]));
    let size = f64::from_bits(read_u64(&record[16..24]));
    let side = Side::from_tag(record[24]).ok_or(WireError::BadSide(record[24]))?;

    Ok(MarketUpdate {
        side,
        price,
        size,
        timestamp,
    })
}
