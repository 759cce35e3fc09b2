//! Per-channel setting values
//!
//! Unlike the fixed registers in the parent module, these values have no
//! address of their own: [`FeatureModel::locate`](crate::FeatureModel::locate)
//! maps a ([`ChannelSetting`](crate::ChannelSetting), channel mask) pair to
//! the location they are stored at on a given node model.

use core::convert::Infallible;

use regiface::{FromByteArray, ToByteArray};

/// Hardware gain code applied by the channel's amplifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareGain {
    pub code: u16,
}

/// Hardware offset (bridge balance) applied by the channel's amplifier.
///
/// Mid-scale is 2048 on the 12-bit offset DAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareOffset {
    pub value: u16,
}

/// Linear calibration `y = slope * x + offset` (4 words).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearEquation {
    pub slope: f32,
    pub offset: f32,
}

impl Default for LinearEquation {
    fn default() -> Self {
        Self {
            slope: 1.0,
            offset: 0.0,
        }
    }
}

/// Error type for calibration unit conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidUnit(pub u16);

/// Engineering unit produced by a channel's calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalUnit {
    Bits,
    Volts,
    Millivolts,
    Microstrain,
    Gravity,
    DegreesCelsius,
}

impl CalUnit {
    pub fn from_code(code: u16) -> Result<Self, InvalidUnit> {
        match code {
            0x00 => Ok(Self::Bits),
            0x01 => Ok(Self::Volts),
            0x02 => Ok(Self::Millivolts),
            0x04 => Ok(Self::Microstrain),
            0x06 => Ok(Self::Gravity),
            0x0B => Ok(Self::DegreesCelsius),
            invalid => Err(InvalidUnit(invalid)),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::Bits => 0x00,
            Self::Volts => 0x01,
            Self::Millivolts => 0x02,
            Self::Microstrain => 0x04,
            Self::Gravity => 0x06,
            Self::DegreesCelsius => 0x0B,
        }
    }
}

/// Error type for equation type conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidEquationType(pub u16);

/// Kind of calibration equation a channel applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquationType {
    /// Raw bits are transmitted
    None,
    /// The [`LinearEquation`] is applied on the node
    Standard,
}

/// Error type for settling time conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSettlingTime(pub u16);

/// Filter settling time of a channel's ADC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlingTime {
    Ms4,
    Ms8,
    Ms16,
    Ms32,
    Ms40,
    Ms48,
    Ms60,
    Ms101,
    Ms120,
    Ms200,
}

impl SettlingTime {
    const TABLE: [(u16, SettlingTime); 10] = [
        (0, Self::Ms4),
        (1, Self::Ms8),
        (2, Self::Ms16),
        (3, Self::Ms32),
        (4, Self::Ms40),
        (5, Self::Ms48),
        (6, Self::Ms60),
        (7, Self::Ms101),
        (8, Self::Ms120),
        (9, Self::Ms200),
    ];

    pub fn from_code(code: u16) -> Result<Self, InvalidSettlingTime> {
        Self::TABLE
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, t)| *t)
            .ok_or(InvalidSettlingTime(code))
    }
}

/// Error type for thermocouple type conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidThermocoupleType(pub u16);

/// Thermocouple connected to a TC-Link channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermocoupleType {
    Uncompensated,
    J,
    K,
    N,
    R,
    S,
    T,
    E,
    B,
}

impl ThermocoupleType {
    pub fn from_code(code: u16) -> Result<Self, InvalidThermocoupleType> {
        match code {
            0 => Ok(Self::Uncompensated),
            1 => Ok(Self::J),
            2 => Ok(Self::K),
            3 => Ok(Self::N),
            4 => Ok(Self::R),
            5 => Ok(Self::S),
            6 => Ok(Self::T),
            7 => Ok(Self::E),
            8 => Ok(Self::B),
            invalid => Err(InvalidThermocoupleType(invalid)),
        }
    }
}

impl FromByteArray for HardwareGain {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            code: u16::from_be_bytes(bytes),
        })
    }
}

impl ToByteArray for HardwareGain {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.code.to_be_bytes())
    }
}

impl FromByteArray for HardwareOffset {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            value: u16::from_be_bytes(bytes),
        })
    }
}

impl ToByteArray for HardwareOffset {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.value.to_be_bytes())
    }
}

impl FromByteArray for LinearEquation {
    type Error = Infallible;
    type Array = [u8; 8];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            slope: f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            offset: f32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }
}

impl ToByteArray for LinearEquation {
    type Error = Infallible;
    type Array = [u8; 8];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let mut bytes = [0u8; 8];
        bytes[0..4].copy_from_slice(&self.slope.to_be_bytes());
        bytes[4..8].copy_from_slice(&self.offset.to_be_bytes());
        Ok(bytes)
    }
}

impl FromByteArray for CalUnit {
    type Error = InvalidUnit;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Self::from_code(u16::from_be_bytes(bytes))
    }
}

impl FromByteArray for EquationType {
    type Error = InvalidEquationType;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        match u16::from_be_bytes(bytes) {
            0 => Ok(Self::None),
            1 => Ok(Self::Standard),
            invalid => Err(InvalidEquationType(invalid)),
        }
    }
}

impl FromByteArray for SettlingTime {
    type Error = InvalidSettlingTime;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Self::from_code(u16::from_be_bytes(bytes))
    }
}

impl FromByteArray for ThermocoupleType {
    type Error = InvalidThermocoupleType;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Self::from_code(u16::from_be_bytes(bytes))
    }
}
