//! `InProcessRegistrar`: default `Registrar` implementation.
//!
//! Keeps a table of claimed major numbers in process memory. Claiming a
//! major twice fails with `EBUSY`, an out-of-range major with `EINVAL`,
//! the same way `register_chrdev` would.

use msgslot_core::constants::MAX_MAJOR;
use msgslot_core::{Registrar, SlotError, SlotResult, SpinLock};

#[derive(Debug, Default)]
pub struct InProcessRegistrar {
    /// (major, name) pairs currently registered
    claimed: SpinLock<Vec<(u32, String)>>,
}

impl InProcessRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self, major: u32) -> bool {
        self.claimed.lock().iter().any(|(m, _)| *m == major)
    }

    /// Number of live registrations
    pub fn registered_count(&self) -> usize {
        self.claimed.lock().len()
    }
}

impl Registrar for InProcessRegistrar {
    fn register(&self, major: u32, name: &str) -> SlotResult<()> {
        if major == 0 || major > MAX_MAJOR {
            return Err(SlotError::RegistrationFailure(libc::EINVAL));
        }
        let mut claimed = self.claimed.lock();
        if claimed.iter().any(|(m, _)| *m == major) {
            return Err(SlotError::RegistrationFailure(libc::EBUSY));
        }
        claimed.push((major, name.to_string()));
        Ok(())
    }

    fn unregister(&self, major: u32, name: &str) {
        self.claimed
            .lock()
            .retain(|(m, n)| !(*m == major && n == name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_unregister() {
        let registrar = InProcessRegistrar::new();
        registrar.register(235, "message_slot").unwrap();
        assert!(registrar.is_registered(235));

        registrar.unregister(235, "message_slot");
        assert!(!registrar.is_registered(235));
        assert_eq!(registrar.registered_count(), 0);
    }

    #[test]
    fn test_double_registration() {
        let registrar = InProcessRegistrar::new();
        registrar.register(235, "message_slot").unwrap();
        assert_eq!(
            registrar.register(235, "other"),
            Err(SlotError::RegistrationFailure(libc::EBUSY))
        );
        assert!(registrar.register(236, "other").is_ok());
    }

    #[test]
    fn test_bad_major() {
        let registrar = InProcessRegistrar::new();
        assert_eq!(
            registrar.register(0, "message_slot"),
            Err(SlotError::RegistrationFailure(libc::EINVAL))
        );
        assert_eq!(
            registrar.register(MAX_MAJOR + 1, "message_slot"),
            Err(SlotError::RegistrationFailure(libc::EINVAL))
        );
    }
}
