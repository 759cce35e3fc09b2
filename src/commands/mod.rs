//! Node command results
//!
//! Lifecycle commands (ping, sleep, set-to-idle, erase, auto-balance,
//! auto-cal) are encoded and relayed by the base station. This module holds
//! the typed values those commands produce, so every
//! [`BaseStation`](crate::BaseStation) implementation hands back the same
//! shapes. Payload decoders are provided through `regiface`'s
//! [`FromByteArray`](regiface::FromByteArray) for links that receive the raw
//! response bytes.
//!
//! # Command Categories
//! - status: reachability and idle status
//!   - Ping responses with signal strength
//!   - Set-to-idle outcome
//!
//! - calibration: on-node calibration
//!   - Auto-balance target options
//!   - SHM-Link auto-cal results

mod calibration;
mod status;

pub use calibration::*;
pub use status::*;
