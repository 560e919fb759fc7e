//! Userspace ABI of the message slot device.
//!
//! What a program talking to `/dev/<name>` needs: the ioctl number, the
//! message size limit and a wrapper that binds a channel on an open fd.

use std::io;
use std::os::unix::io::RawFd;

pub use msgslot_core::constants::{BUF_LEN, DEVICE_RANGE_NAME, MAJOR_NUM, MSG_SLOT_CHANNEL};

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        // ioctl number: _IOW(MAJOR_NUM, 0, unsigned int), passed by value
        nix::ioctl_write_int!(msg_slot_channel_raw, MAJOR_NUM, 0);

        /// Bind the channel `channel` on an open device fd
        pub fn bind_channel(fd: RawFd, channel: u32) -> io::Result<()> {
            // SAFETY: MSG_SLOT_CHANNEL takes its argument by value, no
            // memory is shared with the driver.
            unsafe { msg_slot_channel_raw(fd, channel as libc::c_ulong) }
                .map(drop)
                .map_err(io::Error::from)
        }
    } else {
        pub fn bind_channel(_fd: RawFd, _channel: u32) -> io::Result<()> {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "message slot ioctl is only available on Linux",
            ))
        }
    }
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn test_request_code_matches_nix() {
        let code = nix::request_code_write!(MAJOR_NUM, 0, std::mem::size_of::<u32>());
        assert_eq!(code as u32, MSG_SLOT_CHANNEL);
    }

    #[test]
    fn test_bind_on_bad_fd() {
        let err = bind_channel(-1, 1).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    }
}
