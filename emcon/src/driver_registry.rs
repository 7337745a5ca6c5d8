//! Bus driver lookup by configured name.
//!
//! Buses name their driver in configuration (`driver = "simulation"`). The
//! registry maps those names to factories. It is built once in `main` and
//! lent to the monitor and the dispatcher.

use emcon_common::bus::{BusDriver, BusError, DriverFactory};
use std::collections::BTreeMap;

use crate::drivers::register_all_drivers;

/// Driver factories keyed by name, in name order.
#[derive(Default)]
pub struct DriverRegistry {
    factories: BTreeMap<&'static str, DriverFactory>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in driver.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        register_all_drivers(&mut registry);
        registry
    }

    /// # Panics
    /// Panics if `name` is already taken.
    pub fn register(&mut self, name: &'static str, factory: DriverFactory) {
        let previous = self.factories.insert(name, factory);
        assert!(previous.is_none(), "Driver '{name}' is already registered");
    }

    /// Registered driver names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// Instantiate the driver a bus is configured with.
    ///
    /// # Errors
    /// Returns `BusError::DriverNotFound` naming the unknown driver and the
    /// ones that are available.
    pub fn create_driver(&self, name: &str) -> Result<Box<dyn BusDriver>, BusError> {
        match self.factories.get(name) {
            Some(factory) => Ok(factory()),
            None => Err(BusError::DriverNotFound(format!(
                "{name} (available: {})",
                self.names().join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emcon_common::command::{Address, GearCommand};
    use emcon_common::config::BusConfig;
    use emcon_common::gear::GearSnapshot;
    use std::path::Path;

    struct TestDriver;

    impl BusDriver for TestDriver {
        fn name(&self) -> &'static str {
            "test"
        }

        fn open(&mut self, _config: &BusConfig, _config_dir: &Path) -> Result<(), BusError> {
            Ok(())
        }

        fn read_gear(&mut self, address: u8) -> Result<GearSnapshot, BusError> {
            Err(BusError::NoResponse(address))
        }

        fn send(&mut self, _command: GearCommand, _address: Address) -> Result<(), BusError> {
            Ok(())
        }
    }

    fn create_test_driver() -> Box<dyn BusDriver> {
        Box::new(TestDriver)
    }

    #[test]
    fn registry_register_and_create() {
        let mut reg = DriverRegistry::new();
        reg.register("test_driver", create_test_driver);

        let driver = reg.create_driver("test_driver").expect("should create");
        assert_eq!(driver.name(), "test");
    }

    #[test]
    fn registry_driver_not_found() {
        let reg = DriverRegistry::new();
        let err = reg.create_driver("nonexistent").err().unwrap();
        assert!(matches!(err, BusError::DriverNotFound(_)));
        assert_eq!(
            err.to_string(),
            "Driver not found: nonexistent (available: )"
        );
    }

    #[test]
    fn registry_builtin_has_simulation() {
        let reg = DriverRegistry::with_builtin();
        assert_eq!(reg.names(), vec!["simulation"]);
        assert_eq!(reg.create_driver("simulation").unwrap().name(), "simulation");
    }

    #[test]
    fn unknown_driver_lists_available() {
        let mut reg = DriverRegistry::with_builtin();
        reg.register("test_driver", create_test_driver);
        let err = reg.create_driver("daliserver").err().unwrap();
        assert_eq!(
            err.to_string(),
            "Driver not found: daliserver (available: simulation, test_driver)"
        );
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn registry_duplicate_panics() {
        let mut reg = DriverRegistry::new();
        reg.register("dup", create_test_driver);
        reg.register("dup", create_test_driver);
    }
}
