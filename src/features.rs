//! Node feature model
//!
//! What a node can do depends on its model and firmware. [`FeatureModel`]
//! captures that once per node and answers two questions for the rest of the
//! driver:
//! - [`supports`](FeatureModel::supports): is an optional capability present?
//! - [`locate`](FeatureModel::locate): where is a per-channel setting stored?
//!
//! Every capability check in the crate goes through these two calls.

use core::fmt;

use crate::{
    ChannelMask, DataStorageSize, Error, FirmwareVersion, ModelNumber, NodeModel, RegisterAccess,
    RegisterAccessExt, RegisterLocation, Result, SamplingMode, Version,
};

/// Oldest SHM-Link 2 firmware able to run auto-cal.
pub const FW_SHM_AUTO_CAL: Version = Version::new(9, 0);

/// Optional capability a node may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    SamplingMode(SamplingMode),
    FatigueConfig,
    HistogramConfig,
    AutoCal,
    /// Auto-balance on the given channel number
    AutoBalance(u8),
    Datalogging,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::SamplingMode(mode) => write!(f, "{mode}"),
            Capability::FatigueConfig => f.write_str("FatigueOptions configuration"),
            Capability::HistogramConfig => f.write_str("HistogramOptions configuration"),
            Capability::AutoCal => f.write_str("AutoCal"),
            Capability::AutoBalance(channel) => write!(f, "AutoBalance on channel {channel}"),
            Capability::Datalogging => f.write_str("Datalogging"),
        }
    }
}

/// Logical per-channel setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelSetting {
    HardwareGain,
    HardwareOffset,
    LinearEquation,
    Unit,
    EquationType,
    FilterSettlingTime,
    ThermocoupleType,
}

impl ChannelSetting {
    /// Start of the register block holding this setting for every channel,
    /// and the distance between consecutive channels.
    fn block(self) -> (RegisterLocation, RegisterLocation) {
        match self {
            ChannelSetting::HardwareGain => (0x0100, 2),
            ChannelSetting::HardwareOffset => (0x0120, 2),
            ChannelSetting::LinearEquation => (0x0140, 8),
            ChannelSetting::Unit => (0x01C0, 2),
            ChannelSetting::EquationType => (0x01E0, 2),
            ChannelSetting::FilterSettlingTime => (0x0200, 2),
            ChannelSetting::ThermocoupleType => (0x0220, 2),
        }
    }
}

impl fmt::Display for ChannelSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChannelSetting::HardwareGain => "Hardware Gain",
            ChannelSetting::HardwareOffset => "Hardware Offset",
            ChannelSetting::LinearEquation => "Linear Equation",
            ChannelSetting::Unit => "Unit",
            ChannelSetting::EquationType => "Equation Type",
            ChannelSetting::FilterSettlingTime => "Filter Settling Time",
            ChannelSetting::ThermocoupleType => "Thermocouple Type",
        })
    }
}

/// Channels sharing one register for a set of settings.
///
/// A group either covers a single channel or several channels that are
/// configured together (for example one settling time for every thermocouple).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelGroup {
    pub mask: ChannelMask,
    pub settings: Vec<ChannelSetting>,
}

impl ChannelGroup {
    fn location(&self, setting: ChannelSetting) -> Option<RegisterLocation> {
        if !self.settings.contains(&setting) {
            return None;
        }
        let (base, stride) = setting.block();
        let first = self.mask.lowest()?;
        Some(base + stride * RegisterLocation::from(first - 1))
    }
}

/// Identity of a node, as needed to build its [`FeatureModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    pub model: NodeModel,
    pub firmware: Version,
    pub storage: DataStorageSize,
}

impl NodeInfo {
    /// Reads the identity registers.
    pub fn read(access: &mut dyn RegisterAccess) -> Result<Self> {
        let firmware: FirmwareVersion = access.read_register()?;
        let model: ModelNumber = access.read_register()?;
        let storage: DataStorageSize = access.read_register()?;

        Ok(Self {
            model: model.model,
            firmware: firmware.version,
            storage,
        })
    }
}

/// Immutable capability table of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureModel {
    info: NodeInfo,
    channels: ChannelMask,
    groups: Vec<ChannelGroup>,
    sampling_modes: Vec<SamplingMode>,
    fatigue: bool,
    histogram: bool,
    auto_cal: bool,
    auto_balance: ChannelMask,
}

impl FeatureModel {
    /// Reads the node's identity and builds its feature model.
    ///
    /// # Errors
    /// * `Error::Communication` - an identity register could not be read
    /// * `Error::NotSupported` - the node model is unknown to this driver
    pub fn read(access: &mut dyn RegisterAccess) -> Result<Self> {
        let info = NodeInfo::read(access)?;
        Self::new(info)
    }

    /// Builds the feature model for a known identity.
    pub fn new(info: NodeInfo) -> Result<Self> {
        use ChannelSetting::*;
        use SamplingMode::*;

        const BRIDGE: &[ChannelSetting] = &[HardwareGain, HardwareOffset, LinearEquation, Unit, EquationType];
        const CALIBRATED: &[ChannelSetting] = &[LinearEquation, Unit, EquationType];
        const THERMOCOUPLE: &[ChannelSetting] = &[ThermocoupleType, LinearEquation, Unit, EquationType];

        let mut model = Self {
            info,
            channels: ChannelMask::empty(),
            groups: Vec::new(),
            sampling_modes: Vec::new(),
            fatigue: false,
            histogram: false,
            auto_cal: false,
            auto_balance: ChannelMask::empty(),
        };

        match info.model {
            NodeModel::GLink2Internal => {
                model.add_channels(1..=3, CALIBRATED);
                model.sampling_modes = vec![Sync, SyncBurst, NonSync, ArmedDatalog];
            }
            NodeModel::SgLinkOem => {
                model.add_channels(1..=2, BRIDGE);
                model.add_channels(3..=4, CALIBRATED);
                model.sampling_modes = vec![Sync, SyncBurst, NonSync, ArmedDatalog];
                model.auto_balance = ChannelMask::first(2);
            }
            NodeModel::ShmLink2 => {
                model.add_channels(1..=3, BRIDGE);
                model.sampling_modes = vec![Sync, NonSync];
                model.fatigue = true;
                model.histogram = true;
                model.auto_cal = info.firmware >= FW_SHM_AUTO_CAL;
                model.auto_balance = ChannelMask::first(3);
            }
            NodeModel::TcLink => {
                model.add_channels(1..=6, THERMOCOUPLE);
                model.groups.push(ChannelGroup {
                    mask: ChannelMask::first(6),
                    settings: vec![FilterSettlingTime],
                });
                model.sampling_modes = vec![Sync, NonSync, ArmedDatalog];
            }
            NodeModel::VLink => {
                model.add_channels(1..=4, BRIDGE);
                model.add_channels(5..=8, CALIBRATED);
                model.sampling_modes = vec![Sync, SyncBurst, NonSync, ArmedDatalog];
                model.auto_balance = ChannelMask::first(4);
            }
            NodeModel::Unknown(_) => {
                return Err(Error::NotSupported(format!("node {}", info.model)));
            }
        }

        if info.storage.kib == 0 {
            model.sampling_modes.retain(|mode| *mode != ArmedDatalog);
        }

        log::debug!(
            "features for {} fw {}: channels {:#06x}, modes {:?}",
            info.model,
            info.firmware,
            model.channels.bits(),
            model.sampling_modes
        );
        Ok(model)
    }

    fn add_channels(&mut self, channels: core::ops::RangeInclusive<u8>, settings: &[ChannelSetting]) {
        for channel in channels {
            let mask = ChannelMask::channel(channel);
            self.channels |= mask;
            self.groups.push(ChannelGroup {
                mask,
                settings: settings.to_vec(),
            });
        }
    }

    pub fn info(&self) -> &NodeInfo {
        &self.info
    }

    pub fn model(&self) -> NodeModel {
        self.info.model
    }

    pub fn firmware_version(&self) -> Version {
        self.info.firmware
    }

    /// Every physical channel of the node.
    pub fn channels(&self) -> ChannelMask {
        self.channels
    }

    pub fn channel_groups(&self) -> &[ChannelGroup] {
        &self.groups
    }

    pub fn sampling_modes(&self) -> &[SamplingMode] {
        &self.sampling_modes
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::SamplingMode(mode) => self.sampling_modes.contains(&mode),
            Capability::FatigueConfig => self.fatigue,
            Capability::HistogramConfig => self.histogram,
            Capability::AutoCal => self.auto_cal,
            Capability::AutoBalance(channel) => self.auto_balance.is_enabled(channel),
            Capability::Datalogging => self.info.storage.kib > 0,
        }
    }

    /// Fails with `Error::NotSupported` naming `capability` if it is absent.
    pub fn require(&self, capability: Capability) -> Result<()> {
        if self.supports(capability) {
            Ok(())
        } else {
            Err(Error::NotSupported(capability.to_string()))
        }
    }

    /// Location of `setting` for the channel group selected by exactly `mask`.
    ///
    /// # Errors
    /// * `Error::NotSupported` - no channel group with that mask maps the setting
    pub fn locate(&self, setting: ChannelSetting, mask: ChannelMask) -> Result<RegisterLocation> {
        self.groups
            .iter()
            .filter(|group| group.mask == mask)
            .find_map(|group| group.location(setting))
            .ok_or_else(|| {
                let channels: Vec<String> = mask.channels().map(|ch| format!("ch{ch}")).collect();
                Error::NotSupported(format!("{setting} for [{}]", channels.join(", ")))
            })
    }
}
