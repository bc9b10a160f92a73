//! Block surface: cursor-addressed access to a whole register window.
//!
//! An [`AccessSession`] is the analog of one open file description: it owns
//! a byte cursor into the window, starting at 0 and advancing by one
//! register per successful transfer. Cursors are independent across
//! sessions; correctness of concurrent mutation comes from the instance's
//! write gate, not from session isolation.
//!
//! Transfers move exactly one 4-byte register per call, in native byte
//! order. A read at or past the end of the window is EOF (zero bytes,
//! success); a write there is an error.

use std::io::SeekFrom;
use std::sync::Arc;

use crate::error::{FablightError, Result};
use crate::instance::InstanceShared;

/// One open handle against a peripheral's block surface.
#[derive(Debug)]
pub struct AccessSession {
    shared: Arc<InstanceShared>,
    cursor: u64,
}

impl AccessSession {
    pub(crate) fn new(shared: Arc<InstanceShared>) -> Self {
        Self { shared, cursor: 0 }
    }

    /// Read one register at the cursor into `buf`.
    ///
    /// Returns 4 on success, or 0 (EOF) when the cursor sits at or past the
    /// end of the window; the cursor only advances on a successful transfer.
    ///
    /// # Errors
    ///
    /// [`FablightError::Unaligned`] off a register boundary,
    /// [`FablightError::ShortTransfer`] if `buf` cannot hold one register,
    /// [`FablightError::InstanceRemoved`] once the instance is gone.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.shared.ensure_active()?;

        if self.cursor >= self.shared.window.span() as u64 {
            return Ok(0);
        }
        #[allow(clippy::cast_possible_truncation)]
        let offset = self.cursor as usize;
        if offset % 4 != 0 {
            return Err(FablightError::unaligned(offset));
        }
        if buf.len() < 4 {
            return Err(FablightError::short_transfer(4, buf.len()));
        }

        let value = self.shared.window.read32(offset)?;
        buf[..4].copy_from_slice(&value.to_ne_bytes());
        self.cursor += 4;
        Ok(4)
    }

    /// Write one register at the cursor from `bytes`.
    ///
    /// Requires at least 4 bytes of input; the register is written whole,
    /// under the write gate, and the cursor advances by 4.
    ///
    /// # Errors
    ///
    /// [`FablightError::OutOfRange`] at or past the end of the window,
    /// [`FablightError::Unaligned`] off a register boundary,
    /// [`FablightError::ShortTransfer`] for fewer than 4 input bytes (the
    /// register is not touched), [`FablightError::InstanceRemoved`] once
    /// the instance is gone.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        self.shared.ensure_active()?;

        let span = self.shared.window.span();
        if self.cursor >= span as u64 {
            #[allow(clippy::cast_possible_truncation)]
            return Err(FablightError::out_of_range(
                self.cursor.min(usize::MAX as u64) as usize,
                span,
            ));
        }
        #[allow(clippy::cast_possible_truncation)]
        let offset = self.cursor as usize;
        if offset % 4 != 0 {
            return Err(FablightError::unaligned(offset));
        }
        if bytes.len() < 4 {
            return Err(FablightError::short_transfer(4, bytes.len()));
        }
        // Copy from the caller before taking the gate; the critical section
        // is the single register store.
        let mut word = [0u8; 4];
        word.copy_from_slice(&bytes[..4]);
        let value = u32::from_ne_bytes(word);

        {
            let _gate = self.shared.lock_gate();
            // A concurrent remove() may have won the gate first.
            self.shared.ensure_active()?;
            self.shared.window.write32(offset, value)?;
        }
        self.cursor += 4;
        Ok(4)
    }

    /// Reposition the cursor.
    ///
    /// No upper clamp is applied; out-of-range cursors surface at the next
    /// read (EOF) or write (error). Returns the new cursor position.
    ///
    /// # Errors
    ///
    /// [`FablightError::InvalidOffset`] if the target would be negative;
    /// the cursor is left where it was.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let (base, delta) = match pos {
            SeekFrom::Start(offset) => {
                self.cursor = offset;
                return Ok(offset);
            }
            SeekFrom::End(delta) => (self.shared.window.span() as u64, delta),
            SeekFrom::Current(delta) => (self.cursor, delta),
        };

        let target = if delta >= 0 {
            base.checked_add(delta.unsigned_abs())
        } else {
            base.checked_sub(delta.unsigned_abs())
        };
        let Some(offset) = target else {
            #[allow(clippy::cast_possible_truncation)]
            let signed = (i128::from(base) + i128::from(delta))
                .clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64;
            return Err(FablightError::invalid_offset(signed));
        };
        self.cursor = offset;
        Ok(offset)
    }

    /// Current cursor position in bytes.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.cursor
    }

    /// Span of the window this session addresses.
    #[must_use]
    pub fn span(&self) -> usize {
        self.shared.window.span()
    }
}
