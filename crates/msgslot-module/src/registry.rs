//! Endpoint registry
//!
//! One channel tree per minor number, created empty at load and disposed
//! at unload. Each tree sits behind its own [`SpinLock`], so handles on
//! different endpoints never contend and handles on the same endpoint are
//! serialized per call.

use msgslot_core::constants::NUM_ENDPOINTS;
use msgslot_core::{ChannelTree, SlotError, SlotResult, SpinLock};

/// Totals across all endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Endpoints holding at least one message
    pub active_endpoints: usize,
    /// Stored messages across every endpoint
    pub total_entries: usize,
}

/// Fixed-size table of per-endpoint channel trees
pub struct EndpointRegistry {
    endpoints: Box<[SpinLock<ChannelTree>]>,
}

impl EndpointRegistry {
    /// Create `NUM_ENDPOINTS` empty endpoints
    pub fn new(max_entries_per_endpoint: usize) -> Self {
        Self::with_endpoints(NUM_ENDPOINTS, max_entries_per_endpoint)
    }

    pub fn with_endpoints(count: usize, max_entries_per_endpoint: usize) -> Self {
        let endpoints = (0..count)
            .map(|_| SpinLock::new(ChannelTree::with_limit(max_entries_per_endpoint)))
            .collect();
        Self { endpoints }
    }

    /// Number of endpoint slots
    #[inline]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    #[inline]
    pub fn endpoint(&self, minor: usize) -> Option<&SpinLock<ChannelTree>> {
        self.endpoints.get(minor)
    }

    /// Run `f` on one endpoint's tree with its lock held
    pub fn with_endpoint<T>(
        &self,
        minor: usize,
        f: impl FnOnce(&mut ChannelTree) -> SlotResult<T>,
    ) -> SlotResult<T> {
        let endpoint = self.endpoint(minor).ok_or(SlotError::InvalidArgument)?;
        endpoint.with(f)
    }

    /// Release every stored message; returns how many were dropped
    pub fn dispose_all(&self) -> usize {
        self.endpoints
            .iter()
            .map(|endpoint| endpoint.with(|tree| tree.dispose()))
            .sum()
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats::default();
        for endpoint in self.endpoints.iter() {
            let len = endpoint.lock().len();
            if len > 0 {
                stats.active_endpoints += 1;
                stats.total_entries += len;
            }
        }
        stats
    }
}

impl std::fmt::Debug for EndpointRegistry {
    /// Skips endpoints whose lock is held, so formatting from inside
    /// `with_endpoint` cannot deadlock
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut stats = RegistryStats::default();
        let mut busy = 0usize;
        for endpoint in self.endpoints.iter() {
            match endpoint.try_with(|tree| tree.len()) {
                Some(0) => {}
                Some(len) => {
                    stats.active_endpoints += 1;
                    stats.total_entries += len;
                }
                None => busy += 1,
            }
        }
        f.debug_struct("EndpointRegistry")
            .field("endpoints", &self.len())
            .field("stats", &stats)
            .field("busy", &busy)
            .finish()
    }
}
