//! Per-open-handle session state
//!
//! A session is created unbound when the device is opened. The bind ioctl
//! sets the channel, and may be issued again to move the session to another
//! channel. Read and write refuse to run until a channel is bound.

use core::fmt;

use crate::error::{SlotError, SlotResult};
use crate::id::ChannelId;

/// Binding state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Opened, no channel selected yet
    Unbound,

    /// Opened and bound to a channel
    Bound(ChannelId),
}

impl SessionState {
    /// Check if read/write are allowed in this state
    #[inline]
    pub const fn is_bound(&self) -> bool {
        matches!(self, SessionState::Bound(_))
    }
}

/// State carried by one open handle
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Endpoint (minor number) the handle was opened on
    minor: usize,

    /// Currently bound channel
    bound: Option<ChannelId>,
}

impl Session {
    /// Create an unbound session on `minor`
    pub const fn new(minor: usize) -> Self {
        Session { minor, bound: None }
    }

    #[inline]
    pub const fn minor(&self) -> usize {
        self.minor
    }

    /// Bind to `channel`, returning the previous binding
    pub fn bind(&mut self, channel: ChannelId) -> Option<ChannelId> {
        self.bound.replace(channel)
    }

    /// Bind from a raw ioctl parameter
    ///
    /// Zero (and anything wider than 32 bits) is rejected without touching
    /// the current binding.
    pub fn set_channel(&mut self, param: u64) -> SlotResult<ChannelId> {
        let channel = ChannelId::from_ioctl_param(param)?;
        self.bind(channel);
        Ok(channel)
    }

    /// Bound channel, or `InvalidArgument` if none
    #[inline]
    pub fn channel(&self) -> SlotResult<ChannelId> {
        self.bound.ok_or(SlotError::InvalidArgument)
    }

    pub fn state(&self) -> SessionState {
        match self.bound {
            Some(channel) => SessionState::Bound(channel),
            None => SessionState::Unbound,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("minor", &self.minor)
            .field("state", &self.state())
            .finish()
    }
}
