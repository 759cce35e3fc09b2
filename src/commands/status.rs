//! Status commands
//!
//! This module contains the results of commands used to check on a node:
//! - Ping, with the signal strength seen at both ends
//! - Set-to-idle, which may be canceled before the node answers

use regiface::FromByteArray;

/// Ping response
///
/// Returned by a ping relayed through the base station.
///
/// # Response Format
/// - Byte 0: non-zero when the node answered
/// - Byte 1: RSSI at the node, in dBm (signed)
/// - Byte 2: RSSI at the base station, in dBm (signed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingResponse {
    /// Whether the node answered the ping
    pub success: bool,
    /// Signal strength of the base station as seen by the node
    pub node_rssi: i16,
    /// Signal strength of the node as seen by the base station
    pub base_rssi: i16,
}

impl PingResponse {
    /// Response for a ping the node never answered.
    pub fn no_response() -> Self {
        Self {
            success: false,
            node_rssi: 0,
            base_rssi: 0,
        }
    }
}

impl FromByteArray for PingResponse {
    type Error = core::convert::Infallible;
    type Array = [u8; 3];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            success: bytes[0] != 0,
            node_rssi: i16::from(bytes[1] as i8),
            base_rssi: i16::from(bytes[2] as i8),
        })
    }
}

/// Error type for set-to-idle status values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidIdleStatus(pub u8);

/// Outcome of a set-to-idle request.
///
/// A node only hears the request when it next checks its radio, so the base
/// station may give up first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetToIdleStatus {
    /// The node acknowledged and is now idle
    Success,
    /// The request was canceled before the node answered
    Canceled,
    /// The node never acknowledged the request
    Failed,
}

impl TryFrom<u8> for SetToIdleStatus {
    type Error = InvalidIdleStatus;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Success),
            0x01 => Ok(Self::Canceled),
            0x02 => Ok(Self::Failed),
            invalid => Err(InvalidIdleStatus(invalid)),
        }
    }
}

impl FromByteArray for SetToIdleStatus {
    type Error = InvalidIdleStatus;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Self::try_from(bytes[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_rssi_is_signed() {
        let response = PingResponse::from_bytes([0x01, 0xC4, 0xBA]).unwrap();
        assert!(response.success);
        assert_eq!(response.node_rssi, -60);
        assert_eq!(response.base_rssi, -70);
    }

    #[test]
    fn idle_status_codes() {
        assert_eq!(SetToIdleStatus::from_bytes([0x01]), Ok(SetToIdleStatus::Canceled));
        assert_eq!(SetToIdleStatus::from_bytes([0x07]), Err(InvalidIdleStatus(0x07)));
    }
}
