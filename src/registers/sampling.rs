//! Sampling registers
//!
//! This module contains registers describing how and when a node samples:
//! - sampling mode and active channels
//! - sample rate, number of sweeps and duration
//! - data format and collection method
//! - burst timing and datalogging sessions

use core::convert::Infallible;
use core::fmt;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

use crate::ChannelMask;

/// Error type for sampling mode conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSamplingMode(pub u16);

/// Sampling mode register (address: 0x000E)
#[register(0x000Eu16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ReadableRegister, WritableRegister)]
pub enum SamplingMode {
    /// Synchronized continuous sampling
    Sync,
    /// Synchronized burst sampling
    SyncBurst,
    /// Non-synchronized (low duty cycle) sampling
    NonSync,
    /// Armed datalogging to on-board memory
    ArmedDatalog,
}

impl SamplingMode {
    pub fn from_code(code: u16) -> Result<Self, InvalidSamplingMode> {
        match code {
            1 => Ok(Self::Sync),
            2 => Ok(Self::SyncBurst),
            3 => Ok(Self::NonSync),
            4 => Ok(Self::ArmedDatalog),
            invalid => Err(InvalidSamplingMode(invalid)),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::Sync => 1,
            Self::SyncBurst => 2,
            Self::NonSync => 3,
            Self::ArmedDatalog => 4,
        }
    }
}

impl fmt::Display for SamplingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sync => "Synchronized Sampling",
            Self::SyncBurst => "Burst Sampling",
            Self::NonSync => "Non-Synchronized Sampling",
            Self::ArmedDatalog => "Armed Datalogging",
        })
    }
}

/// Active channels register (address: 0x000C)
#[register(0x000Cu16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct ActiveChannels {
    pub mask: ChannelMask,
}

/// Sample rate register (address: 0x0010)
///
/// Holds the device's sample rate code; the rate it stands for depends on the
/// sampling mode.
#[register(0x0010u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct SampleRate {
    pub code: u16,
}

/// Number of sweeps register (address: 0x0012, 2 words)
#[register(0x0012u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct NumSweeps {
    pub sweeps: u32,
}

/// Unlimited duration register (address: 0x0016)
///
/// When set, the node samples until told to stop and ignores [`NumSweeps`].
#[register(0x0016u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct UnlimitedDuration {
    pub enabled: bool,
}

/// Error type for data format conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidDataFormat(pub u16);

/// Data format register (address: 0x0018)
#[register(0x0018u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub enum DataFormat {
    Uint16,
    Float32,
}

/// Error type for collection method conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCollectionMethod(pub u16);

/// Data collection method register (address: 0x001A)
#[register(0x001Au16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub enum DataCollectionMethod {
    LogOnly,
    TransmitOnly,
    LogAndTransmit,
}

/// Time between bursts register (address: 0x001C)
///
/// Only meaningful for [`SamplingMode::SyncBurst`].
#[register(0x001Cu16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct TimeBetweenBursts {
    pub seconds: u16,
}

/// Datalog session count register (address: 0x0028)
#[register(0x0028u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
pub struct NumDatalogSessions {
    pub count: u16,
}

impl FromByteArray for SamplingMode {
    type Error = InvalidSamplingMode;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Self::from_code(u16::from_be_bytes(bytes))
    }
}

impl ToByteArray for SamplingMode {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.code().to_be_bytes())
    }
}

impl FromByteArray for ActiveChannels {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            mask: ChannelMask::from_bits_retain(u16::from_be_bytes(bytes)),
        })
    }
}

impl ToByteArray for ActiveChannels {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.mask.bits().to_be_bytes())
    }
}

impl FromByteArray for SampleRate {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            code: u16::from_be_bytes(bytes),
        })
    }
}

impl ToByteArray for SampleRate {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.code.to_be_bytes())
    }
}

impl FromByteArray for NumSweeps {
    type Error = Infallible;
    type Array = [u8; 4];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            sweeps: u32::from_be_bytes(bytes),
        })
    }
}

impl ToByteArray for NumSweeps {
    type Error = Infallible;
    type Array = [u8; 4];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.sweeps.to_be_bytes())
    }
}

impl FromByteArray for UnlimitedDuration {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            enabled: u16::from_be_bytes(bytes) != 0,
        })
    }
}

impl ToByteArray for UnlimitedDuration {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(u16::from(self.enabled).to_be_bytes())
    }
}

impl FromByteArray for DataFormat {
    type Error = InvalidDataFormat;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        match u16::from_be_bytes(bytes) {
            1 => Ok(Self::Uint16),
            2 => Ok(Self::Float32),
            invalid => Err(InvalidDataFormat(invalid)),
        }
    }
}

impl ToByteArray for DataFormat {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let code: u16 = match self {
            Self::Uint16 => 1,
            Self::Float32 => 2,
        };
        Ok(code.to_be_bytes())
    }
}

impl FromByteArray for DataCollectionMethod {
    type Error = InvalidCollectionMethod;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        match u16::from_be_bytes(bytes) {
            1 => Ok(Self::LogOnly),
            2 => Ok(Self::TransmitOnly),
            3 => Ok(Self::LogAndTransmit),
            invalid => Err(InvalidCollectionMethod(invalid)),
        }
    }
}

impl ToByteArray for DataCollectionMethod {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let code: u16 = match self {
            Self::LogOnly => 1,
            Self::TransmitOnly => 2,
            Self::LogAndTransmit => 3,
        };
        Ok(code.to_be_bytes())
    }
}

impl FromByteArray for TimeBetweenBursts {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            seconds: u16::from_be_bytes(bytes),
        })
    }
}

impl ToByteArray for TimeBetweenBursts {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.seconds.to_be_bytes())
    }
}

impl FromByteArray for NumDatalogSessions {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            count: u16::from_be_bytes(bytes),
        })
    }
}
