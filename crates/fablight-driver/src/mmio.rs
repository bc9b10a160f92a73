//! Memory-mapped register window access.
//!
//! Maps one peripheral's register window from physical fabric memory via
//! `/dev/mem`. `/dev/mem` mappings must be page-granular, so the window's
//! physical base is rounded down to a page boundary and the remainder is
//! carried as an in-mapping offset.
//!
//! Bounds and alignment policy live in [`crate::window::RegisterWindow`];
//! this layer only asserts them as a last line of defense around the
//! volatile access itself.

// MMIO registers are naturally aligned by hardware, so pointer casts are safe
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_ptr_alignment)]

use std::os::fd::OwnedFd;
use std::ptr::NonNull;

use rustix::fs::{open, Mode, OFlags};
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};

use crate::error::{FablightError, Result};

/// Path the physical fabric is reached through.
const DEVMEM: &str = "/dev/mem";

/// One mapped register window.
///
/// Owns the mapping exclusively; unmapped on drop.
pub struct MappedWindow {
    /// Page-aligned mapping base.
    ptr: NonNull<u8>,
    /// Total bytes mapped (window span plus page slack).
    map_len: usize,
    /// Window start within the mapping.
    page_offset: usize,
    /// Window span in bytes.
    span: usize,
    /// Physical base address of the window.
    phys: u64,
    /// Keep the `/dev/mem` fd open for the lifetime of the mapping.
    _mem: OwnedFd,
}

impl std::fmt::Debug for MappedWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedWindow")
            .field("ptr", &format_args!("{:p}", self.ptr))
            .field("phys", &format_args!("{:#x}", self.phys))
            .field("span", &self.span)
            .finish()
    }
}

// SAFETY: Send - MappedWindow owns the mapping exclusively. Moving it between
// threads does not invalidate the mapping (mmap'd memory is process-wide).
unsafe impl Send for MappedWindow {}

// SAFETY: Sync - all access goes through read32/write32, which perform single
// volatile word operations on device memory. Concurrent word reads are safe
// (the bus serves whole words); concurrent writes are serialized one level up
// by the instance's write gate. No other mutable state is shared.
unsafe impl Sync for MappedWindow {}

impl MappedWindow {
    /// Map `span` bytes of fabric memory starting at physical `phys`.
    ///
    /// # Errors
    ///
    /// Returns [`FablightError::MapFailure`] if the base is not register
    /// aligned, `/dev/mem` cannot be opened, or the mapping fails.
    pub fn map(phys: u64, span: usize) -> Result<Self> {
        if span == 0 {
            return Err(FablightError::map_failure("window span is zero"));
        }
        if phys % 4 != 0 {
            return Err(FablightError::map_failure(format!(
                "physical base {phys:#x} is not register aligned"
            )));
        }

        let mem = open(DEVMEM, OFlags::RDWR | OFlags::SYNC, Mode::empty()).map_err(|e| {
            FablightError::map_failure(format!("cannot open {DEVMEM}: {e}"))
        })?;

        let page = rustix::param::page_size() as u64;
        let page_offset = (phys % page) as usize;
        let page_base = phys - page_offset as u64;
        let map_len = span + page_offset;

        tracing::debug!(
            "Mapping window: phys={phys:#x} span={span:#x} (page base {page_base:#x} + {page_offset:#x})"
        );

        // SAFETY: mmap is required to reach fabric memory. Preconditions:
        // - mem is a freshly opened /dev/mem fd
        // - map_len is non-zero (span checked above)
        // - page_base is page aligned by construction
        // - rustix returns Result; failure is handled, success is non-null
        let ptr = unsafe {
            let addr = mmap(
                std::ptr::null_mut(),
                map_len,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                &mem,
                page_base,
            )
            .map_err(|e| {
                FablightError::map_failure(format!("mmap of {phys:#x} failed: {e}"))
            })?;

            NonNull::new(addr.cast::<u8>()).expect("mmap returns non-null pointer on success")
        };

        tracing::info!("Mapped window at {phys:#x} ({span} bytes, virt {ptr:p})");

        Ok(Self {
            ptr,
            map_len,
            page_offset,
            span,
            phys,
            _mem: mem,
        })
    }

    /// Read a 32-bit register.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is misaligned or `offset + 4` exceeds the span;
    /// callers validate first.
    #[must_use]
    pub fn read32(&self, offset: usize) -> u32 {
        assert!(offset + 4 <= self.span, "register offset out of bounds");
        assert!(offset % 4 == 0, "register offset misaligned");
        // SAFETY: volatile read is required; the fabric can change the value
        // at any time. ptr is valid for page_offset + span bytes (from mmap),
        // offset + 4 <= span is asserted, and phys alignment guarantees the
        // u32 cast is aligned.
        unsafe {
            std::ptr::read_volatile(self.ptr.as_ptr().add(self.page_offset + offset).cast::<u32>())
        }
    }

    /// Write a 32-bit register.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is misaligned or `offset + 4` exceeds the span;
    /// callers validate first.
    pub fn write32(&self, offset: usize, value: u32) {
        assert!(offset + 4 <= self.span, "register offset out of bounds");
        assert!(offset % 4 == 0, "register offset misaligned");
        // SAFETY: volatile write is required; stores have fabric side effects
        // and must not be reordered or merged. Same bounds and alignment
        // invariants as read32.
        unsafe {
            std::ptr::write_volatile(
                self.ptr.as_ptr().add(self.page_offset + offset).cast::<u32>(),
                value,
            );
        }
    }

    /// Window span in bytes.
    #[must_use]
    pub const fn span(&self) -> usize {
        self.span
    }

    /// Physical base address of the window.
    #[must_use]
    pub const fn physical(&self) -> u64 {
        self.phys
    }
}

impl Drop for MappedWindow {
    fn drop(&mut self) {
        // SAFETY: ptr/map_len are exactly what mmap returned in map();
        // Drop runs at most once and no references outlive self.
        unsafe {
            if let Err(e) = munmap(self.ptr.as_ptr().cast(), self.map_len) {
                tracing::error!("munmap of window {:#x} failed: {e}", self.phys);
            }
        }
        tracing::debug!("Unmapped window at {:#x}", self.phys);
    }
}
