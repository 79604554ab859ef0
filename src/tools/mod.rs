pub mod teardown;

pub use teardown::{inventory, teardown, TeardownSummary};
