//! Identity registers
//!
//! Read-only registers describing what a node is:
//! - firmware version (also used to probe the protocol dialect)
//! - model and serial number
//! - microcontroller, radio options and region
//! - size of the on-board datalogging memory
//!
//! These values are written at the factory and never change during a session,
//! which makes them ideal candidates for caching.

use core::convert::Infallible;
use core::fmt;

use bitflags::bitflags;
use regiface::{register, FromByteArray, ReadableRegister};

use crate::Version;

/// Firmware version register (address: 0x006C)
///
/// The major version is stored in the high byte and the minor version in the
/// low byte of a single word.
#[register(0x006Cu16)]
#[derive(Debug, Clone, Copy, ReadableRegister)]
pub struct FirmwareVersion {
    pub version: Version,
}

/// Node model family.
///
/// Models are identified by a 32-bit model number made of the product number
/// and a product option. Unrecognised numbers are preserved in
/// [`NodeModel::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeModel {
    /// G-Link2 with internal triaxial accelerometer
    GLink2Internal,
    /// SG-Link OEM strain gauge node
    SgLinkOem,
    /// SHM-Link 2 structural health monitoring node
    ShmLink2,
    /// TC-Link thermocouple node
    TcLink,
    /// V-Link 8 channel voltage node
    VLink,
    /// Any model number this driver has no profile for
    Unknown(u32),
}

impl NodeModel {
    const G_LINK_2_INTERNAL: u32 = 6310_0000;
    const SG_LINK_OEM: u32 = 6306_1000;
    const SHM_LINK_2: u32 = 6318_2000;
    const TC_LINK: u32 = 6303_1000;
    const V_LINK: u32 = 6308_0000;

    pub fn from_code(code: u32) -> Self {
        match code {
            Self::G_LINK_2_INTERNAL => Self::GLink2Internal,
            Self::SG_LINK_OEM => Self::SgLinkOem,
            Self::SHM_LINK_2 => Self::ShmLink2,
            Self::TC_LINK => Self::TcLink,
            Self::V_LINK => Self::VLink,
            other => Self::Unknown(other),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::GLink2Internal => Self::G_LINK_2_INTERNAL,
            Self::SgLinkOem => Self::SG_LINK_OEM,
            Self::ShmLink2 => Self::SHM_LINK_2,
            Self::TcLink => Self::TC_LINK,
            Self::VLink => Self::V_LINK,
            Self::Unknown(code) => code,
        }
    }
}

impl fmt::Display for NodeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GLink2Internal => f.write_str("G-Link2 (internal)"),
            Self::SgLinkOem => f.write_str("SG-Link OEM"),
            Self::ShmLink2 => f.write_str("SHM-Link 2"),
            Self::TcLink => f.write_str("TC-Link"),
            Self::VLink => f.write_str("V-Link"),
            Self::Unknown(code) => write!(f, "model {code}"),
        }
    }
}

/// Model number register (address: 0x0070, 2 words)
#[register(0x0070u16)]
#[derive(Debug, Clone, Copy, ReadableRegister)]
pub struct ModelNumber {
    pub model: NodeModel,
}

/// Serial number register (address: 0x0074, 2 words)
#[register(0x0074u16)]
#[derive(Debug, Clone, Copy, ReadableRegister)]
pub struct SerialNumber {
    pub value: u32,
}

/// Error type for microcontroller code conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidMicrocontroller(pub u16);

/// Microcontroller register (address: 0x0078)
#[register(0x0078u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
pub enum Microcontroller {
    Pic18F452,
    Pic18F46K20,
    Efr32Wg,
}

impl Microcontroller {
    pub fn from_code(code: u16) -> Result<Self, InvalidMicrocontroller> {
        match code {
            31 => Ok(Self::Pic18F452),
            32 => Ok(Self::Pic18F46K20),
            60 => Ok(Self::Efr32Wg),
            invalid => Err(InvalidMicrocontroller(invalid)),
        }
    }
}

bitflags! {
    /// Optional radio hardware fitted to a node
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RadioFeatureFlags: u16 {
        /// Extended range radio with an external power amplifier
        const EXTENDED_RANGE = 1;
    }
}

/// Radio features register (address: 0x007A)
#[register(0x007Au16)]
#[derive(Debug, Clone, Copy, ReadableRegister, Default)]
pub struct RadioFeatures {
    pub flags: RadioFeatureFlags,
}

impl RadioFeatures {
    pub fn extended_range(&self) -> bool {
        self.flags.contains(RadioFeatureFlags::EXTENDED_RANGE)
    }
}

/// Error type for region code conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidRegionCode(pub u16);

/// Region code register (address: 0x007C)
///
/// Selects the regulatory region the radio was certified for.
#[register(0x007Cu16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
pub enum RegionCode {
    NorthAmerica,
    Europe,
    Japan,
    Other,
}

impl RegionCode {
    pub fn from_code(code: u16) -> Result<Self, InvalidRegionCode> {
        match code {
            0x01 => Ok(Self::NorthAmerica),
            0x02 => Ok(Self::Europe),
            0x03 => Ok(Self::Japan),
            0x04 => Ok(Self::Other),
            invalid => Err(InvalidRegionCode(invalid)),
        }
    }
}

/// Datalogging memory size register (address: 0x007E)
///
/// Zero means the node has no datalogging memory.
#[register(0x007Eu16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, Default)]
pub struct DataStorageSize {
    /// Size in KiB
    pub kib: u16,
}

impl DataStorageSize {
    pub fn bytes(&self) -> u64 {
        u64::from(self.kib) * 1024
    }
}

impl FromByteArray for FirmwareVersion {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            version: Version::new(bytes[0], bytes[1]),
        })
    }
}

impl FromByteArray for ModelNumber {
    type Error = Infallible;
    type Array = [u8; 4];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            model: NodeModel::from_code(u32::from_be_bytes(bytes)),
        })
    }
}

impl FromByteArray for SerialNumber {
    type Error = Infallible;
    type Array = [u8; 4];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            value: u32::from_be_bytes(bytes),
        })
    }
}

impl FromByteArray for Microcontroller {
    type Error = InvalidMicrocontroller;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Self::from_code(u16::from_be_bytes(bytes))
    }
}

impl FromByteArray for RadioFeatures {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            flags: RadioFeatureFlags::from_bits_truncate(u16::from_be_bytes(bytes)),
        })
    }
}

impl FromByteArray for RegionCode {
    type Error = InvalidRegionCode;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Self::from_code(u16::from_be_bytes(bytes))
    }
}

impl FromByteArray for DataStorageSize {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            kib: u16::from_be_bytes(bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_codes_round_trip() {
        for model in [
            NodeModel::GLink2Internal,
            NodeModel::SgLinkOem,
            NodeModel::ShmLink2,
            NodeModel::TcLink,
            NodeModel::VLink,
            NodeModel::Unknown(42),
        ] {
            assert_eq!(NodeModel::from_code(model.code()), model);
        }
    }

    #[test]
    fn unknown_codes_are_rejected() {
        assert_eq!(Microcontroller::from_code(7), Err(InvalidMicrocontroller(7)));
        assert_eq!(RegionCode::from_code(9), Err(InvalidRegionCode(9)));
    }

    #[test]
    fn storage_size_is_reported_in_bytes() {
        assert_eq!(DataStorageSize { kib: 2 }.bytes(), 2048);
    }
}
