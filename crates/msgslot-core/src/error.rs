//! Error types for the message slot device

use core::fmt;
use std::collections::TryReserveError;

/// Result type for device operations
pub type SlotResult<T> = Result<T, SlotError>;

/// Errors surfaced by dispatch, tree and registration operations
///
/// Every variant maps to a negative errno status via [`SlotError::to_status`],
/// which is what a caller crossing the syscall boundary observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotError {
    /// Unbound session, zero/oversized message, zero channel id,
    /// unknown ioctl command or a failed user copy
    InvalidArgument,

    /// The bound channel holds no message
    NoMessage,

    /// Reader buffer is smaller than the stored message
    InsufficientSpace,

    /// No memory (or entry budget) for a new entry
    AllocationFailure,

    /// Device registration failed with the given errno
    RegistrationFailure(i32),
}

impl SlotError {
    /// Positive errno for this error
    pub fn errno(&self) -> i32 {
        match self {
            SlotError::InvalidArgument => libc::EINVAL,
            SlotError::NoMessage => libc::EWOULDBLOCK,
            SlotError::InsufficientSpace => libc::ENOSPC,
            SlotError::AllocationFailure => libc::ENOMEM,
            SlotError::RegistrationFailure(0) => libc::EIO,
            SlotError::RegistrationFailure(rc) => rc.checked_abs().unwrap_or(libc::EIO),
        }
    }

    /// Negative status as returned from a file operation
    #[inline]
    pub fn to_status(&self) -> i64 {
        -i64::from(self.errno())
    }
}

impl fmt::Display for SlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotError::InvalidArgument => write!(f, "invalid argument"),
            SlotError::NoMessage => write!(f, "no message on channel"),
            SlotError::InsufficientSpace => write!(f, "buffer too small for message"),
            SlotError::AllocationFailure => write!(f, "entry allocation failed"),
            SlotError::RegistrationFailure(rc) => {
                write!(f, "device registration failed: errno {}", rc)
            }
        }
    }
}

impl std::error::Error for SlotError {}

impl From<TryReserveError> for SlotError {
    fn from(_: TryReserveError) -> Self {
        SlotError::AllocationFailure
    }
}

/// Convert a dispatch result into the syscall-style return value
pub fn status_of(result: SlotResult<usize>) -> i64 {
    match result {
        Ok(n) => n as i64,
        Err(e) => e.to_status(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(format!("{}", SlotError::NoMessage), "no message on channel");
        assert_eq!(
            format!("{}", SlotError::RegistrationFailure(16)),
            "device registration failed: errno 16"
        );
    }

    #[test]
    fn test_errno_mapping() {
        assert_eq!(SlotError::InvalidArgument.errno(), libc::EINVAL);
        assert_eq!(SlotError::NoMessage.errno(), libc::EWOULDBLOCK);
        assert_eq!(SlotError::InsufficientSpace.errno(), libc::ENOSPC);
        assert_eq!(SlotError::AllocationFailure.errno(), libc::ENOMEM);
        assert_eq!(SlotError::RegistrationFailure(-libc::EBUSY).errno(), libc::EBUSY);
        assert_eq!(SlotError::RegistrationFailure(0).errno(), libc::EIO);
    }

    #[test]
    fn test_registration_rc_extremes() {
        assert_eq!(SlotError::RegistrationFailure(i32::MIN).errno(), libc::EIO);
        assert_eq!(SlotError::RegistrationFailure(i32::MIN).to_status(), -i64::from(libc::EIO));
        assert_eq!(SlotError::RegistrationFailure(i32::MAX).errno(), i32::MAX);
    }

    #[test]
    fn test_status_is_negative() {
        assert_eq!(SlotError::InvalidArgument.to_status(), -i64::from(libc::EINVAL));
        assert_eq!(status_of(Ok(5)), 5);
        assert_eq!(status_of(Err(SlotError::InsufficientSpace)), -i64::from(libc::ENOSPC));
    }

    #[test]
    fn test_try_reserve_conversion() {
        let mut v: Vec<u8> = Vec::new();
        let err = v.try_reserve(usize::MAX).unwrap_err();
        assert_eq!(SlotError::from(err), SlotError::AllocationFailure);
    }
}
