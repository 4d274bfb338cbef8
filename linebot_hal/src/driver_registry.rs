//! Named HAL driver factories.
//!
//! The binary builds one registry at startup, fills it with
//! [`register_all_drivers`](crate::register_all_drivers) and instantiates the
//! driver named by `hal.driver`.

use linebot_common::hal::driver::{DriverFactory, HalDriver, HalError};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Clone, Copy)]
struct Entry {
    factory: DriverFactory,
    description: &'static str,
}

/// Driver factories by name, iterated in name order.
#[derive(Default)]
pub struct DriverRegistry {
    entries: BTreeMap<&'static str, Entry>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a factory under `name`.
    ///
    /// # Errors
    /// `HalError::DuplicateDriver` if `name` is taken; the first factory stays.
    pub fn register(
        &mut self,
        name: &'static str,
        description: &'static str,
        factory: DriverFactory,
    ) -> Result<(), HalError> {
        if self.entries.contains_key(name) {
            return Err(HalError::DuplicateDriver(name));
        }
        self.entries.insert(name, Entry { factory, description });
        Ok(())
    }

    /// Build a fresh, uninitialized driver.
    ///
    /// # Errors
    /// `HalError::DriverNotFound` for an unregistered name.
    pub fn create_driver(&self, name: &str) -> Result<Box<dyn HalDriver>, HalError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| HalError::DriverNotFound(name.to_string()))?;
        debug!(driver = name, "Creating HAL driver");
        Ok((entry.factory)())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    /// `(name, description)` pairs, sorted by name.
    pub fn describe(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries.iter().map(|(name, e)| (*name, e.description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linebot_common::hal::config::HalConfig;
    use linebot_common::hal::driver::Ports;

    /// Driver whose hardware is never there.
    struct AbsentDriver;

    impl HalDriver for AbsentDriver {
        fn name(&self) -> &'static str {
            "absent"
        }

        fn version(&self) -> &'static str {
            "0.0.1"
        }

        fn init(&mut self, _config: &HalConfig) -> Result<Ports, HalError> {
            Err(HalError::InitFailed("no motor controller on the bus".to_string()))
        }

        fn shutdown(&mut self) -> Result<(), HalError> {
            Ok(())
        }
    }

    fn absent() -> Box<dyn HalDriver> {
        Box::new(AbsentDriver)
    }

    #[test]
    fn create_returns_fresh_uninitialized_driver() {
        let mut reg = DriverRegistry::new();
        reg.register("absent", "test double", absent).unwrap();
        assert!(reg.contains("absent"));

        let mut driver = reg.create_driver("absent").unwrap();
        assert_eq!(driver.name(), "absent");
        assert!(matches!(
            driver.init(&HalConfig::default()),
            Err(HalError::InitFailed(_))
        ));
    }

    #[test]
    fn unknown_name_is_not_found() {
        let reg = DriverRegistry::new();
        assert!(matches!(
            reg.create_driver("pigpio"),
            Err(HalError::DriverNotFound(name)) if name == "pigpio"
        ));
    }

    #[test]
    fn names_are_sorted() {
        let mut reg = DriverRegistry::new();
        reg.register("zeta", "last", absent).unwrap();
        reg.register("alpha", "first", absent).unwrap();
        assert_eq!(reg.list_drivers(), vec!["alpha", "zeta"]);
        assert_eq!(
            reg.describe().collect::<Vec<_>>(),
            vec![("alpha", "first"), ("zeta", "last")]
        );
    }

    #[test]
    fn duplicate_name_keeps_first() {
        let mut reg = DriverRegistry::new();
        reg.register("dup", "first", absent).unwrap();
        assert!(matches!(
            reg.register("dup", "second", absent),
            Err(HalError::DuplicateDriver("dup"))
        ));
        assert_eq!(reg.describe().next(), Some(("dup", "first")));
    }
}
