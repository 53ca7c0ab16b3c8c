//! fishbun-core: simulation core for a fish-bun street stall.
//!
//! The engine owns every piece of session state; hosts drive it with
//! `SimEngine::pump` and player commands, and read it back through
//! snapshots. Nothing here touches the platform clock or the network.

pub mod clock;
pub mod command;
pub mod config;
pub mod customer_subsystem;
pub mod day_controller;
pub mod economy;
pub mod engine;
pub mod error;
pub mod event;
pub mod inventory;
pub mod locale;
pub mod mold_subsystem;
pub mod narrative;
pub mod rng;
pub mod snapshot;
pub mod store;
pub mod subsystem;
pub mod types;
