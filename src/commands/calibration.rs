//! Calibration commands
//!
//! This module contains the inputs and results of on-node calibration:
//! - Auto-balance, which drives a bridge channel's hardware offset toward a
//!   target code on the 12-bit offset DAC
//! - Auto-cal, which zeroes every strain channel of an SHM-Link 2
//!
//! Both commands change registers on the node behind the host's back, so any
//! cached copy of the affected registers must be dropped afterwards.

use regiface::FromByteArray;

/// Auto-balance target for [`AutoBalanceOption::LOW`]
pub const AUTO_BALANCE_TARGET_LOW: u16 = 1024;
/// Auto-balance target for [`AutoBalanceOption::MIDSCALE`]
pub const AUTO_BALANCE_TARGET_MIDSCALE: u16 = 2048;
/// Auto-balance target for [`AutoBalanceOption::HIGH`]
pub const AUTO_BALANCE_TARGET_HIGH: u16 = 3072;

/// Where to balance a channel's reading.
///
/// Carried as the raw option code so options received from an application
/// layer can be passed through; only the three named options are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AutoBalanceOption(pub u8);

impl AutoBalanceOption {
    /// Balance to 25% of full scale
    pub const LOW: Self = Self(0);
    /// Balance to 50% of full scale
    pub const MIDSCALE: Self = Self(1);
    /// Balance to 75% of full scale
    pub const HIGH: Self = Self(2);

    /// Target code sent with the auto-balance command, if the option is valid.
    pub fn target_code(self) -> Option<u16> {
        match self {
            Self::LOW => Some(AUTO_BALANCE_TARGET_LOW),
            Self::MIDSCALE => Some(AUTO_BALANCE_TARGET_MIDSCALE),
            Self::HIGH => Some(AUTO_BALANCE_TARGET_HIGH),
            _ => None,
        }
    }
}

/// Per-channel outcome of an auto-cal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoCalChannelError {
    None,
    SensorShorted,
    SensorOpen,
    OutOfRange,
    Unknown(u8),
}

impl From<u8> for AutoCalChannelError {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::None,
            1 => Self::SensorShorted,
            2 => Self::SensorOpen,
            3 => Self::OutOfRange,
            other => Self::Unknown(other),
        }
    }
}

/// Number of strain channels an SHM-Link 2 calibrates.
pub const AUTO_CAL_CHANNELS: usize = 3;

/// Result of an SHM-Link 2 auto-cal
///
/// # Response Format
/// - Byte 0: completion flag (1 = completed)
/// - Bytes 1-3: error code for channels 1-3
/// - Bytes 4-15: offset applied to channels 1-3 (f32, big-endian)
/// - Bytes 16-19: node temperature in °C (f32, big-endian)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoCalResult {
    pub completed: bool,
    pub errors: [AutoCalChannelError; AUTO_CAL_CHANNELS],
    pub offsets: [f32; AUTO_CAL_CHANNELS],
    pub temperature: f32,
}

impl Default for AutoCalResult {
    fn default() -> Self {
        Self {
            completed: false,
            errors: [AutoCalChannelError::None; AUTO_CAL_CHANNELS],
            offsets: [0.0; AUTO_CAL_CHANNELS],
            temperature: 0.0,
        }
    }
}

impl FromByteArray for AutoCalResult {
    type Error = core::convert::Infallible;
    type Array = [u8; 20];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        let f32_at = |i: usize| f32::from_be_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);

        Ok(Self {
            completed: bytes[0] == 1,
            errors: [bytes[1].into(), bytes[2].into(), bytes[3].into()],
            offsets: [f32_at(4), f32_at(8), f32_at(12)],
            temperature: f32_at(16),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_balance_targets() {
        assert_eq!(AutoBalanceOption::LOW.target_code(), Some(1024));
        assert_eq!(AutoBalanceOption::MIDSCALE.target_code(), Some(2048));
        assert_eq!(AutoBalanceOption::HIGH.target_code(), Some(3072));
        assert_eq!(AutoBalanceOption(3).target_code(), None);
        assert_eq!(AutoBalanceOption(0xFF).target_code(), None);
    }

    #[test]
    fn auto_cal_payload() {
        let mut bytes = [0u8; 20];
        bytes[0] = 1;
        bytes[2] = 2;
        bytes[8..12].copy_from_slice(&1.5f32.to_be_bytes());
        bytes[16..20].copy_from_slice(&21.0f32.to_be_bytes());

        let result = AutoCalResult::from_bytes(bytes).unwrap();
        assert!(result.completed);
        assert_eq!(result.errors[0], AutoCalChannelError::None);
        assert_eq!(result.errors[1], AutoCalChannelError::SensorOpen);
        assert_eq!(result.offsets[1], 1.5);
        assert_eq!(result.temperature, 21.0);
    }
}
