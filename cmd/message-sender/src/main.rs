//! message_sender: store one message on a message slot channel.
//!
//! Usage: message_sender <device-file> <channel-id> <message>
//!
//! Opens the device, binds the channel, writes the message in a single
//! call and closes. Any failure prints `<context>: <os error>` to stderr
//! and exits with status 1.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::{AsRawFd, IntoRawFd};
use std::process;

use msgslot_module::uapi;

fn fail(context: &str, err: io::Error) -> ! {
    eprintln!("{}: {}", context, err);
    process::exit(1);
}

/// Base-10 channel id; anything unparsable becomes 0, which the device rejects
fn parse_channel(arg: &str) -> u32 {
    arg.trim().parse().unwrap_or(0)
}

fn close(file: File) -> io::Result<()> {
    let fd = file.into_raw_fd();
    // SAFETY: fd came from into_raw_fd and is closed exactly once
    if unsafe { libc::close(fd) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 4 {
        fail("you need 3 parameters", io::Error::from_raw_os_error(libc::EINVAL));
    }
    let channel = parse_channel(&args[2]);
    let message = args[3].as_bytes();

    let mut file = match OpenOptions::new().read(true).write(true).open(&args[1]) {
        Ok(f) => f,
        Err(e) => fail("Can't open device file", e),
    };

    if let Err(e) = uapi::bind_channel(file.as_raw_fd(), channel) {
        fail("Can't ioctl with this channel id", e);
    }

    match file.write(message) {
        Ok(n) if n == message.len() => {}
        Ok(n) => fail(
            "Can't write this message",
            io::Error::new(io::ErrorKind::WriteZero, format!("short write ({} of {} bytes)", n, message.len())),
        ),
        Err(e) => fail("Can't write this message", e),
    }

    if let Err(e) = close(file) {
        fail("Can't close the device file", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channel() {
        assert_eq!(parse_channel("42"), 42);
        assert_eq!(parse_channel(" 7\n"), 7);
        assert_eq!(parse_channel("abc"), 0);
        assert_eq!(parse_channel("-1"), 0);
    }
}
