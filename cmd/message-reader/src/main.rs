//! message_reader: print the message stored on a message slot channel.
//!
//! Usage: message_reader <device-file> <channel-id>
//!
//! Reads at most `BUF_LEN` bytes, closes the device, then writes exactly
//! the bytes received to stdout. Failures print `<context>: <os error>`
//! and exit with status 1.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, IntoRawFd};
use std::process;

use msgslot_module::uapi::{self, BUF_LEN};

fn fail(context: &str, err: io::Error) -> ! {
    eprintln!("{}: {}", context, err);
    process::exit(1);
}

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
    if args.len() != 3 {
        fail("you need 2 parameters", io::Error::from_raw_os_error(libc::EINVAL));
    }
    let channel = parse_channel(&args[2]);

    let mut file = match OpenOptions::new().read(true).write(true).open(&args[1]) {
        Ok(f) => f,
        Err(e) => fail("Can't open device file", e),
    };

    if let Err(e) = uapi::bind_channel(file.as_raw_fd(), channel) {
        fail("Can't ioctl with this channel id", e);
    }

    let mut buffer = [0u8; BUF_LEN];
    let len = match file.read(&mut buffer) {
        Ok(n) => n,
        Err(e) => fail("Can't read the message", e),
    };

    if let Err(e) = close(file) {
        fail("Can't close the device file", e);
    }

    // One write call; anything short of the full message is a failure
    let mut stdout = io::stdout().lock();
    match stdout.write(&buffer[..len]).and_then(|n| stdout.flush().map(|_| n)) {
        Ok(n) if n == len => {}
        Ok(_) => fail("Can't write to standard output", io::Error::from(io::ErrorKind::WriteZero)),
        Err(e) => fail("Can't write to standard output", e),
    }
}
