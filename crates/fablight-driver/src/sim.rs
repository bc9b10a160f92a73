// SPDX-License-Identifier: AGPL-3.0-only

//! Simulated register fabric
//!
//! Implements the same 32-bit word access contract as a mapped hardware
//! window, backed by an in-process array of atomics. This enables:
//!
//! 1. **CI without hardware**: every surface and lifecycle path runs against
//!    `SimFabric`; nothing needs `/dev/mem` or a programmed FPGA.
//!
//! 2. **Inspection after teardown**: the fabric is shared by cloning, so a
//!    test can hold its own handle and observe the quiesce values a removed
//!    instance left behind.
//!
//! 3. **Concurrency tests**: per-word atomics mirror the word-atomic bus the
//!    access model assumes — concurrent writers can race through the real
//!    gate and the result is still one of the written values, never a blend.
//!
//! Ordering is `Relaxed` throughout: the contract promises word atomicity,
//! not cross-register ordering, same as the hardware bus.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use fablight_fabric::RegisterMap;

/// In-process register fabric.
///
/// Cheap to clone; clones share the same registers.
#[derive(Clone, Debug)]
pub struct SimFabric {
    words: Arc<[AtomicU32]>,
}

impl SimFabric {
    /// Create a zeroed fabric of `span` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `span` is not a multiple of the 4-byte register width.
    #[must_use]
    pub fn new(span: usize) -> Self {
        assert!(span % 4 == 0, "fabric span must be a word multiple");
        let words: Arc<[AtomicU32]> = (0..span / 4).map(|_| AtomicU32::new(0)).collect();
        Self { words }
    }

    /// Create a zeroed fabric sized for one register map.
    #[must_use]
    pub fn for_map(map: &RegisterMap) -> Self {
        Self::new(map.span)
    }

    /// Fabric span in bytes.
    #[must_use]
    pub fn span(&self) -> usize {
        self.words.len() * 4
    }

    /// Read a 32-bit register.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is misaligned or `offset + 4` exceeds the span;
    /// callers validate first.
    #[must_use]
    pub fn read32(&self, offset: usize) -> u32 {
        assert!(offset % 4 == 0, "register offset misaligned");
        self.words[offset / 4].load(Ordering::Relaxed)
    }

    /// Write a 32-bit register.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is misaligned or `offset + 4` exceeds the span;
    /// callers validate first.
    pub fn write32(&self, offset: usize, value: u32) {
        assert!(offset % 4 == 0, "register offset misaligned");
        self.words[offset / 4].store(value, Ordering::Relaxed);
    }

    /// Copy of every register word, in window order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<u32> {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Relaxed))
            .collect()
    }
}
