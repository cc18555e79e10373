//! Installation and execution of the native tool
//!
//! `BinaryManager` ties the pieces together: the host platform and the
//! bundled release coordinates give a download URL (`download`), the archive
//! is unpacked into the cache directory (`detection` tracks what is there),
//! and runs are forwarded to the cached executable (`forward`).

mod detection;
pub mod download;
mod forward;
mod manager;
pub mod runners;

#[cfg(test)]
mod test_support;

pub use detection::{InstallLayout, InstallReceipt, InstallationState, check_installation_state};
pub use forward::{Exit, Invocation, forward};
pub use manager::BinaryManager;
