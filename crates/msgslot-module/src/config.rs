//! Device configuration

use msgslot_core::constants::{DEVICE_RANGE_NAME, MAJOR_NUM, UNLIMITED_ENTRIES};
use msgslot_core::env::{env_get, env_get_bool, env_get_str};

/// Configuration for loading a [`MessageSlot`](crate::device::MessageSlot)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotConfig {
    /// Name the device registers under
    pub device_name: String,

    /// Static major number (default: 235)
    pub major: u32,

    /// Channel budget per endpoint; writes needing a new entry beyond it
    /// fail with `AllocationFailure`
    pub max_entries_per_endpoint: usize,

    /// Dump the endpoint tree at trace level after every write
    pub dump_on_write: bool,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            device_name: DEVICE_RANGE_NAME.to_string(),
            major: MAJOR_NUM,
            max_entries_per_endpoint: UNLIMITED_ENTRIES,
            dump_on_write: false,
        }
    }
}

impl SlotConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by the environment
    ///
    /// - `MSGSLOT_DEVICE_NAME`
    /// - `MSGSLOT_MAJOR`
    /// - `MSGSLOT_MAX_ENTRIES`
    /// - `MSGSLOT_DUMP_TREES`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            device_name: env_get_str("MSGSLOT_DEVICE_NAME", &defaults.device_name),
            major: env_get("MSGSLOT_MAJOR", defaults.major),
            max_entries_per_endpoint: env_get("MSGSLOT_MAX_ENTRIES", defaults.max_entries_per_endpoint),
            dump_on_write: env_get_bool("MSGSLOT_DUMP_TREES", defaults.dump_on_write),
        }
    }

    pub fn device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    pub fn major(mut self, major: u32) -> Self {
        self.major = major;
        self
    }

    pub fn max_entries_per_endpoint(mut self, n: usize) -> Self {
        self.max_entries_per_endpoint = n;
        self
    }

    pub fn dump_on_write(mut self, enable: bool) -> Self {
        self.dump_on_write = enable;
        self
    }

    /// Validate configuration
    ///
    /// The major number is checked by the registrar, which is where a
    /// kernel would reject it too.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.device_name.is_empty() {
            return Err("device_name must not be empty");
        }
        if self.max_entries_per_endpoint == 0 {
            return Err("max_entries_per_endpoint must be at least 1");
        }
        Ok(())
    }
}
