use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use crate::batch::DocumentId;

const ID_BITS: u32 = 80;
const ID_MASK: u128 = (1u128 << ID_BITS) - 1;

/// Hands out 20-hex-character document ids, unique per generator.
///
/// Ids are `base + n` where `base` is the creation time in nanoseconds
/// shifted left by 32 bits, so two stores opened at different instants
/// produce disjoint ranges for the first 2^32 ids.
#[derive(Debug)]
pub struct DocumentIdGenerator {
    base: u128,
    next: AtomicU64,
}

impl DocumentIdGenerator {
    pub fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        Self::with_base(nanos)
    }

    pub fn with_base(epoch_nanos: u128) -> Self {
        Self {
            base: (epoch_nanos << 32) & ID_MASK,
            next: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self) -> DocumentId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        let value = self.base.wrapping_add(n as u128) & ID_MASK;
        DocumentId::new(format!("{value:020x}"))
    }
}

impl Default for DocumentIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
