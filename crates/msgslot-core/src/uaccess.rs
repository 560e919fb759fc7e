//! User-memory copy seam
//!
//! Dispatch never touches caller memory directly. A write pulls bytes
//! through a [`UserSource`], a read pushes them through a [`UserSink`].
//! Either side may fail (a bad user pointer in a real kernel), which the
//! dispatch layer reports as `InvalidArgument`.
//!
//! # Implementors
//!
//! - `[u8]` / `Vec<u8>`: plain in-process buffers, never fail.
//! - Test doubles that fault mid-copy, to exercise the all-or-nothing
//!   write path.

use crate::constants::BUF_LEN;
use crate::error::{SlotError, SlotResult};

/// Caller-owned bytes a write copies in from
pub trait UserSource {
    /// Number of bytes the caller asked to write
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the first `dst.len()` bytes into `dst`
    fn copy_in(&self, dst: &mut [u8]) -> SlotResult<()>;
}

/// Caller-owned buffer a read copies out to
pub trait UserSink {
    /// Bytes available in the destination
    fn capacity(&self) -> usize;

    /// Copy all of `src` to the start of the destination
    fn copy_out(&mut self, src: &[u8]) -> SlotResult<()>;
}

impl UserSource for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn copy_in(&self, dst: &mut [u8]) -> SlotResult<()> {
        let src = self.get(..dst.len()).ok_or(SlotError::InvalidArgument)?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

impl UserSource for Vec<u8> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn copy_in(&self, dst: &mut [u8]) -> SlotResult<()> {
        self.as_slice().copy_in(dst)
    }
}

impl UserSink for [u8] {
    fn capacity(&self) -> usize {
        self.len()
    }

    fn copy_out(&mut self, src: &[u8]) -> SlotResult<()> {
        let dst = self.get_mut(..src.len()).ok_or(SlotError::InvalidArgument)?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

impl UserSink for Vec<u8> {
    fn capacity(&self) -> usize {
        self.len()
    }

    fn copy_out(&mut self, src: &[u8]) -> SlotResult<()> {
        self.as_mut_slice().copy_out(src)
    }
}

/// A message copied fully into device memory
///
/// Lives on the stack; building one never allocates.
pub struct StagedMessage {
    buf: [u8; BUF_LEN],
    len: usize,
}

impl StagedMessage {
    /// Copy a whole message in from `src`
    ///
    /// Fails with `InvalidArgument` for an empty or oversized source, or if
    /// the copy itself faults.
    pub fn stage<S: UserSource + ?Sized>(src: &S) -> SlotResult<Self> {
        let len = src.len();
        if len == 0 || len > BUF_LEN {
            return Err(SlotError::InvalidArgument);
        }
        let mut buf = [0u8; BUF_LEN];
        src.copy_in(&mut buf[..len])?;
        Ok(StagedMessage { buf, len })
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Faulty(usize);

    impl UserSource for Faulty {
        fn len(&self) -> usize {
            self.0
        }

        fn copy_in(&self, _dst: &mut [u8]) -> SlotResult<()> {
            Err(SlotError::InvalidArgument)
        }
    }

    #[test]
    fn test_stage_copies_bytes() {
        let staged = StagedMessage::stage(&b"hello"[..]).unwrap();
        assert_eq!(staged.as_bytes(), b"hello");
        assert_eq!(staged.len(), 5);
    }

    #[test]
    fn test_stage_bounds() {
        assert!(StagedMessage::stage(&[7u8; BUF_LEN][..]).is_ok());
        assert_eq!(
            StagedMessage::stage(&[7u8; BUF_LEN + 1][..]).err(),
            Some(SlotError::InvalidArgument)
        );
        assert_eq!(StagedMessage::stage(&[0u8; 0][..]).err(), Some(SlotError::InvalidArgument));
    }

    #[test]
    fn test_stage_fault() {
        assert_eq!(StagedMessage::stage(&Faulty(4)).err(), Some(SlotError::InvalidArgument));
    }

    #[test]
    fn test_sink_copy_out() {
        let mut out = vec![0u8; 8];
        out.copy_out(b"abc").unwrap();
        assert_eq!(&out[..3], b"abc");
        assert_eq!(UserSink::capacity(&out), 8);

        let mut small = [0u8; 2];
        assert_eq!(small[..].copy_out(b"abc"), Err(SlotError::InvalidArgument));
    }
}
