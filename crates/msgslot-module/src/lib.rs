//! # msgslot-module - the message slot device
//!
//! Implements the [`CharDevice`](msgslot_core::CharDevice) and
//! [`Registrar`](msgslot_core::Registrar) traits from `msgslot-core`.
//!
//! ## Layout
//!
//! | Module      | Contents                                          |
//! |-------------|---------------------------------------------------|
//! | `config`    | `SlotConfig` (defaults, env overrides, validate)  |
//! | `registry`  | `EndpointRegistry`: 260 locked channel trees      |
//! | `registrar` | `InProcessRegistrar`: major number table          |
//! | `device`    | `MessageSlot`: load/unload and file operations    |
//! | `uapi`      | ioctl number and `bind_channel` for user programs |
//!
//! ## Example
//!
//! ```
//! use msgslot_core::CharDevice;
//! use msgslot_module::{MessageSlot, SlotConfig, MSG_SLOT_CHANNEL};
//!
//! let dev = MessageSlot::load_default(SlotConfig::default()).unwrap();
//! let mut file = dev.open(0).unwrap();
//! dev.ioctl(&mut file, MSG_SLOT_CHANNEL, 42).unwrap();
//! dev.write(&file, &b"hello"[..]).unwrap();
//!
//! let mut buf = [0u8; 128];
//! let n = dev.read(&file, &mut buf[..]).unwrap();
//! assert_eq!(&buf[..n], b"hello");
//! ```

pub mod config;
pub mod registry;
pub mod registrar;
pub mod device;
#[cfg(unix)]
pub mod uapi;

pub use config::SlotConfig;
pub use device::{DeviceStats, MessageSlot, SlotFile};
pub use registrar::InProcessRegistrar;
pub use registry::{EndpointRegistry, RegistryStats};
pub use msgslot_core::constants::{BUF_LEN, MSG_SLOT_CHANNEL, NUM_ENDPOINTS};
