//! `MessageSlot`: the character device.
//!
//! Wires configuration, registration and the endpoint registry together and
//! implements the file operations:
//!
//! ```text
//!   open(minor)          -> SlotFile { Session: Unbound }
//!   ioctl(MSG_SLOT_CHANNEL, id)   Unbound | Bound(_) -> Bound(id)
//!   write(bytes)         stage into a stack buffer, then insert/replace
//!   read(buf)            copy out under the endpoint lock, then to caller
//!   release(file)        drops the session, messages stay
//! ```
//!
//! Each call takes the lock of one endpoint for a single tree operation.
//! User copies happen outside the lock: writes stage first, reads snapshot
//! into a stack buffer and copy out after unlocking.

use std::sync::atomic::{AtomicU64, Ordering};

use msgslot_core::constants::{BUF_LEN, MSG_SLOT_CHANNEL};
use msgslot_core::kprint::{self, LogLevel};
use msgslot_core::{
    kdebug, kerror, kinfo, ktrace, CharDevice, InsertOutcome, Registrar, Session, SlotError,
    SlotResult, StagedMessage, UserSink, UserSource,
};

use crate::config::SlotConfig;
use crate::registrar::InProcessRegistrar;
use crate::registry::{EndpointRegistry, RegistryStats};

/// An open handle on the device
#[derive(Debug)]
pub struct SlotFile {
    session: Session,
}

impl SlotFile {
    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[inline]
    pub fn minor(&self) -> usize {
        self.session.minor()
    }
}

/// Call counters (diagnostics only)
#[derive(Debug, Default)]
struct Counters {
    opens: AtomicU64,
    reads: AtomicU64,
    writes: AtomicU64,
    binds: AtomicU64,
    errors: AtomicU64,
}

/// Snapshot of device counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub opens: u64,
    pub reads: u64,
    pub writes: u64,
    pub binds: u64,
    pub errors: u64,
    pub registry: RegistryStats,
}

/// The loaded message slot device
///
/// Created by [`MessageSlot::load`] (module init) and torn down by
/// [`MessageSlot::unload`] or drop (module exit).
pub struct MessageSlot<R: Registrar = InProcessRegistrar> {
    config: SlotConfig,
    registry: EndpointRegistry,
    registrar: R,
    counters: Counters,
    loaded: bool,
}

impl MessageSlot<InProcessRegistrar> {
    /// Load with a private in-process registrar
    pub fn load_default(config: SlotConfig) -> SlotResult<Self> {
        Self::load(config, InProcessRegistrar::new())
    }
}

impl<R: Registrar> MessageSlot<R> {
    /// Module init: validate config, register the major, create endpoints
    pub fn load(config: SlotConfig, registrar: R) -> SlotResult<Self> {
        if let Err(msg) = config.validate() {
            kerror!("invalid configuration: {}", msg);
            return Err(SlotError::InvalidArgument);
        }

        if let Err(e) = registrar.register(config.major, &config.device_name) {
            kerror!("{} registration failed for {}: {}", config.device_name, config.major, e);
            return Err(e);
        }

        let registry = EndpointRegistry::new(config.max_entries_per_endpoint);
        kinfo!(
            "registered {} major {} with {} endpoints",
            config.device_name,
            config.major,
            registry.len()
        );

        Ok(Self {
            config,
            registry,
            registrar,
            counters: Counters::default(),
            loaded: true,
        })
    }

    /// Module exit: dispose every endpoint and unregister
    ///
    /// Returns the number of messages released.
    pub fn unload(mut self) -> usize {
        self.teardown()
    }

    pub fn config(&self) -> &SlotConfig {
        &self.config
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    pub fn stats(&self) -> DeviceStats {
        DeviceStats {
            opens: self.counters.opens.load(Ordering::Relaxed),
            reads: self.counters.reads.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
            binds: self.counters.binds.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
            registry: self.registry.stats(),
        }
    }

    fn teardown(&mut self) -> usize {
        if !self.loaded {
            return 0;
        }
        self.loaded = false;

        let released = self.registry.dispose_all();
        self.registrar.unregister(self.config.major, &self.config.device_name);
        kinfo!(
            "unregistered {} major {}, released {} messages",
            self.config.device_name,
            self.config.major,
            released
        );
        released
    }

    /// Whether writes dump the endpoint tree
    ///
    /// Requires `dump_on_write` and trace level output.
    pub fn dumps_enabled(&self) -> bool {
        self.config.dump_on_write && kprint::level_enabled(LogLevel::Trace)
    }

    /// Count and log a failed call
    fn track<T>(&self, op: &str, file: &SlotFile, result: SlotResult<T>) -> SlotResult<T> {
        if let Err(e) = &result {
            self.counters.errors.fetch_add(1, Ordering::Relaxed);
            kdebug!("{} minor {} {:?}: {}", op, file.minor(), file.session.state(), e);
        }
        result
    }

    fn do_write<S: UserSource + ?Sized>(&self, file: &SlotFile, src: &S) -> SlotResult<usize> {
        let channel = file.session.channel()?;
        let staged = StagedMessage::stage(src)?;

        self.registry.with_endpoint(file.minor(), |tree| {
            let outcome = tree.insert_or_replace(channel, staged.as_bytes())?;
            if let InsertOutcome::Replaced { previous_len } = outcome {
                ktrace!("minor {} channel {}: replaced {} bytes", file.minor(), channel, previous_len);
            }
            if self.dumps_enabled() {
                ktrace!("minor {} tree:\n{}", file.minor(), tree.dump());
            }
            Ok(())
        })?;

        Ok(staged.len())
    }

    fn do_read<D: UserSink + ?Sized>(&self, file: &SlotFile, dst: &mut D) -> SlotResult<usize> {
        let channel = file.session.channel()?;
        let capacity = dst.capacity();
        let mut snapshot = [0u8; BUF_LEN];

        let len = self.registry.with_endpoint(file.minor(), |tree| {
            let entry = tree.find(channel).ok_or(SlotError::NoMessage)?;
            if entry.is_empty() {
                return Err(SlotError::NoMessage);
            }
            if capacity < entry.len() {
                return Err(SlotError::InsufficientSpace);
            }
            snapshot[..entry.len()].copy_from_slice(entry.payload());
            Ok(entry.len())
        })?;

        dst.copy_out(&snapshot[..len])?;
        Ok(len)
    }
}

impl<R: Registrar> CharDevice for MessageSlot<R> {
    type File = SlotFile;

    fn open(&self, minor: usize) -> SlotResult<SlotFile> {
        if minor >= self.registry.len() {
            self.counters.errors.fetch_add(1, Ordering::Relaxed);
            kdebug!("open minor {}: out of range", minor);
            return Err(SlotError::InvalidArgument);
        }
        self.counters.opens.fetch_add(1, Ordering::Relaxed);
        Ok(SlotFile {
            session: Session::new(minor),
        })
    }

    fn read<D: UserSink + ?Sized>(&self, file: &SlotFile, dst: &mut D) -> SlotResult<usize> {
        self.counters.reads.fetch_add(1, Ordering::Relaxed);
        let result = self.do_read(file, dst);
        self.track("read", file, result)
    }

    fn write<S: UserSource + ?Sized>(&self, file: &SlotFile, src: &S) -> SlotResult<usize> {
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
        let result = self.do_write(file, src);
        self.track("write", file, result)
    }

    fn ioctl(&self, file: &mut SlotFile, cmd: u32, param: u64) -> SlotResult<()> {
        self.counters.binds.fetch_add(1, Ordering::Relaxed);
        let result = if cmd == MSG_SLOT_CHANNEL {
            file.session.set_channel(param).map(drop)
        } else {
            Err(SlotError::InvalidArgument)
        };
        self.track("ioctl", file, result)
    }

    fn release(&self, file: SlotFile) {
        kdebug!("release minor {} {:?}", file.minor(), file.session.state());
    }
}

impl<R: Registrar> Drop for MessageSlot<R> {
    fn drop(&mut self) {
        self.teardown();
    }
}
