//! SmartFeed hub driver library.
//!
//! Keeps PetSafe SmartFeed feeders in sync with a smart-home hub by polling
//! a local HTTP bridge and translating hub commands into bridge calls.

pub mod bridge;
pub mod config;
pub mod device;
pub mod driver;
pub mod error;

#[cfg(test)]
pub(crate) mod testing;
