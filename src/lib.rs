//! Wireless Sensor Node Driver
//!
//! This crate provides a type-safe host-side interface to battery powered
//! wireless sensor nodes (G-Link2, SG-Link OEM, SHM-Link 2, TC-Link, V-Link).
//! Nodes are never reached directly: every request is relayed by a base
//! station, which the application provides by implementing [`BaseStation`].
//!
//! # Features
//! - Protocol dialect negotiation (1.0 and 1.1, grouped reads on 1.1)
//! - Read-through / write-through cache over the node's register space
//! - Per-model capability and channel layout tables
//! - Typed registers for identity, radio, sampling and diagnostics settings
//! - Verified configuration objects
//! - Calibration commands (auto-balance, SHM-Link 2 auto-cal)
//!
//! # Architecture
//! The driver is organized into several modules:
//!
//! - [`node`]: [`WirelessNode`], the facade applications use
//!   - Lazily negotiates the dialect and reads the feature model
//!   - Gates optional operations on node capabilities
//!
//! - [`protocol`]: Dialect negotiation
//! - [`cache`]: Register cache with bounded retries
//! - [`features`]: Per-model capabilities and channel register layout
//! - [`config`]: Configuration verification and writing
//! - [`registers`]: Register definitions
//!   - [`registers::channel`]: Per-channel values located by the feature model
//! - [`commands`]: Results of commands relayed by the base station
//! - [`link`]: The [`BaseStation`] trait
//!
//! # Usage
//! Registers are modelled with the `regiface` crate: each well-known location
//! is a type carrying its address, so reading one is a typed call:
//!
//! ```ignore
//! use wsn_node::{NodeAddress, SamplingMode, WirelessNode};
//!
//! let mut node = WirelessNode::new(NodeAddress(1234), base_station);
//! let mode: SamplingMode = node.read_register()?;
//! if mode == SamplingMode::NonSync {
//!     node.start_non_sync_sampling()?;
//! }
//! ```
//!
//! # Important Notes
//! - Nothing is sent to a node until an operation needs it
//! - Negotiation happens once per [`WirelessNode`]; a failed negotiation is
//!   attempted again on the next operation
//! - Applying a configuration resets the node's radio
//! - Auto-balance and auto-cal change registers on the node; the affected
//!   cache entries are dropped

pub mod access;
pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod features;
pub mod link;
pub mod node;
pub mod protocol;
pub mod registers;
pub mod types;

#[cfg(test)]
mod testing;

pub use access::{RegisterAccess, RegisterAccessExt};
pub use cache::{AccessSettings, RegisterCache};
pub use commands::*;
pub use config::{Configuration, NodeConfig};
pub use error::{ConfigCategory, ConfigIssue, ConfigIssues, Error, Result};
pub use features::{Capability, ChannelGroup, ChannelSetting, FeatureModel, NodeInfo};
pub use link::BaseStation;
pub use node::WirelessNode;
pub use protocol::{dialect_for, Dialect, FW_DIALECT_1_1};
pub use registers::*;
pub use types::{ChannelMask, NodeAddress, Version};
