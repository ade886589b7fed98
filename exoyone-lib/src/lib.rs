//! # ExoyOne Control Library
//!
//! `exoyone-lib` is a Rust library for controlling ExoyOne LED lights over the
//! local network. It keeps an in-memory mirror of the device state and offers
//! typed setters for colour, effects, power, timers, naming and Wi-Fi.
//!
//! The device speaks a small JSON protocol over UDP (port 8888 by default):
//! `{"getData": 1}` returns the full state, every other object is a command
//! that gets no reply. The library therefore reads the state back after each
//! command.
//!
//! ## Features
//!
//! - Mode pack and effect catalog with name/index lookups
//! - Typed device state with a display projection
//! - Timeouts and exponential backoff on every request
//! - A mock device for testing without hardware
//!
//! ## Example
//!
//! ```no_run
//! use exoyone_lib::catalog::ModePacks;
//! use exoyone_lib::control_interface::{ExoyOne, DEFAULT_PORT};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut exoyone = ExoyOne::connect("192.168.1.50", DEFAULT_PORT, ModePacks::new()).await?;
//!
//!     exoyone.toggle_power("on").await?;
//!     exoyone.set_effect("Aurora").await?;
//!     println!("Now showing {:?}", exoyone.active_effect_name());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Disclaimer
//!
//! This project is not affiliated with, authorized by, endorsed by, or in any way officially connected
//! with Exoy or its affiliates.
//!
//! ## License
//!
//! This project is dual-licensed under the MIT License and the Apache License, Version 2.0.
//! You may choose to use either license, depending on your project needs.

// The `catalog` module maps mode pack and effect names to the index pairs the
// device uses.
//
// Example usage:
//
// ```
// use exoyone_lib::catalog::ModePacks;
//
// let catalog = ModePacks::new();
// assert_eq!(catalog.indices_from_effect_name("Aurora"), Some((6, 2)));
// ```
pub mod catalog;

// The `control_interface` module holds the device client and the UDP
// transport underneath it.
pub mod control_interface;

pub mod error;

// The `state` module decodes device replies and renders them for display.
pub mod state;

// The `util` module provides the boolean word vocabulary, colour conversion
// for display, and a mock device for testing.
pub mod util;

pub use catalog::ModePacks;
pub use control_interface::ExoyOne;
pub use error::{ExoyOneError, Result};
pub use state::{DeviceType, ExoyOneState};
