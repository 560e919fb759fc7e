//! Channel and arena node identifier types

use core::fmt;
use core::num::NonZeroU32;

use crate::error::{SlotError, SlotResult};

/// Identifier of a channel within one endpoint
///
/// Channel 0 is never bindable, so the raw value is a `NonZeroU32`.
/// An unbound session is represented as `Option::<ChannelId>::None`,
/// which keeps "unbound" distinct from any real channel.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChannelId(NonZeroU32);

impl ChannelId {
    /// Create a channel id, or `None` for the reserved value 0
    #[inline]
    pub const fn new(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(v) => Some(ChannelId(v)),
            None => None,
        }
    }

    /// Convert a raw ioctl parameter
    ///
    /// The parameter arrives as an `unsigned long`; anything that is zero
    /// or does not fit the declared `unsigned int` is rejected.
    pub fn from_ioctl_param(param: u64) -> SlotResult<Self> {
        u32::try_from(param)
            .ok()
            .and_then(ChannelId::new)
            .ok_or(SlotError::InvalidArgument)
    }

    /// Get the raw u32 value
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelId({})", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ChannelId> for u32 {
    fn from(id: ChannelId) -> u32 {
        id.as_u32()
    }
}

/// Index of a node inside a tree arena
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        NodeId(index)
    }

    /// Get as usize for indexing
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}
