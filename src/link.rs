//! Base station link
//!
//! Nodes are never talked to directly: every register access and command is
//! relayed by a base station. The [`BaseStation`] trait is the boundary to that
//! layer. Framing, radio timeouts and command encoding all live behind it.
//!
//! Implementations are expected to be cheap handles (for example an `Arc`
//! around the real connection), since one base station serves many nodes and
//! every [`WirelessNode`](crate::WirelessNode) keeps its own clone. Two handles
//! compare equal when they refer to the same base station.

use std::time::SystemTime;

use crate::{
    AutoCalResult, Dialect, NodeAddress, NodeModel, PingResponse, RegisterLocation, Result,
    SetToIdleStatus, Version,
};

/// Operations a base station performs on behalf of a node.
///
/// Transport failures are reported as
/// [`Error::Communication`](crate::Error::Communication); the driver retries
/// those where a retry budget applies. Any other error is passed to the caller
/// untouched.
pub trait BaseStation {
    /// Reads one word per entry of `locations`, in order.
    ///
    /// With `grouped` set the base station may fetch every location in a
    /// single round-trip; it is only ever set for dialects that support it.
    fn read_registers(
        &self,
        node: NodeAddress,
        dialect: Dialect,
        locations: &[RegisterLocation],
        grouped: bool,
    ) -> Result<Vec<u16>>;

    /// Writes a single word.
    fn write_register(
        &self,
        node: NodeAddress,
        dialect: Dialect,
        location: RegisterLocation,
        value: u16,
    ) -> Result<()>;

    fn ping(&self, node: NodeAddress) -> Result<PingResponse>;

    /// Puts the node to sleep. Returns whether the node acknowledged.
    fn sleep(&self, node: NodeAddress) -> Result<bool>;

    fn set_to_idle(&self, node: NodeAddress) -> Result<SetToIdleStatus>;

    /// Erases the node's datalogging memory. Returns whether the node reported
    /// success.
    fn erase(&self, node: NodeAddress) -> Result<bool>;

    fn start_non_sync_sampling(&self, node: NodeAddress) -> Result<()>;

    /// Runs auto-balance on `channel`, driving its offset toward `target`.
    fn auto_balance(&self, node: NodeAddress, channel: u8, target: u16) -> Result<()>;

    /// Runs auto-cal. Returns whether the node reported success, along with
    /// the result payload.
    fn auto_cal(
        &self,
        node: NodeAddress,
        model: NodeModel,
        firmware: Version,
    ) -> Result<(bool, AutoCalResult)>;

    /// Time the base station last heard from the node.
    fn last_communication_time(&self, node: NodeAddress) -> SystemTime;
}
