//! grid-bootstrap: idempotent startup initialization for a shared in-memory data grid.
//!
//! Any number of processes may call [`InitializationCoordinator::run`] at startup; the
//! grid converges to the state a single call would produce. See `coordinator`.

pub mod config;
pub mod constants;
pub mod coordinator;
pub mod error;
pub mod ident;
pub mod installer;
pub mod logging;
pub mod objects;
pub mod query;
pub mod reference;
pub mod seed;
pub mod storage;
pub mod tools;

pub use config::{InitConfig, SeedWriteMode};
pub use coordinator::{InitReport, InitializationCoordinator};
pub use error::{InitError, InitResult};
pub use installer::QueryCatalogInstaller;
pub use objects::SharedObjectCatalog;
pub use seed::SeedDataLoader;

// Test-only printing helper: expands to eprintln! during tests and is absent otherwise.
// Usage in tests: tprintln!("debug: {}", value);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// In non-test builds, provide a no-op tprintln! so calls compile without effect.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        // Preserve formatting checks in release without producing code
        if false { let _ = format!($($arg)*); }
    });
}
