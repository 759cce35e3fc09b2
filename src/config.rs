//! Node configuration
//!
//! A [`Configuration`] is checked against a node's [`FeatureModel`] before it
//! is written. [`NodeConfig`] is the stock implementation: every field is
//! optional and only fields that are set are verified and written.
//!
//! ```ignore
//! let config = NodeConfig::new()
//!     .sampling_mode(SamplingMode::NonSync)
//!     .active_channels(ChannelMask::CH1 | ChannelMask::CH2)
//!     .inactivity_timeout(30);
//! node.apply_config(&config)?;
//! ```

use crate::registers::channel::{HardwareOffset, LinearEquation};
use crate::{
    ActiveChannels, Capability, ChannelMask, ChannelSetting, CheckRadioInterval, ConfigCategory,
    ConfigIssues, DefaultMode, Error, FatigueOptions, FeatureModel, HistogramOptions,
    InactivityTimeout, LostBeaconTimeout, NumSweeps, RegisterAccess, RegisterAccessExt, Result,
    SampleRate, SamplingMode, TimeBetweenBursts, TransmitPower, UnlimitedDuration,
};

/// Settings that can be checked against and written to a node.
pub trait Configuration {
    /// Lists every problem that would prevent [`apply`](Self::apply) from
    /// succeeding. May read the node through `access`.
    fn verify(&self, features: &FeatureModel, access: &mut dyn RegisterAccess) -> Result<ConfigIssues>;

    /// Writes the configuration to the node.
    ///
    /// # Errors
    /// * `Error::InvalidConfig` - [`verify`](Self::verify) reported issues;
    ///   nothing was written
    /// * `Error::Communication` - a register could not be written
    fn apply(&self, features: &FeatureModel, access: &mut dyn RegisterAccess) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeConfig {
    default_mode: Option<DefaultMode>,
    inactivity_timeout: Option<u16>,
    check_radio_interval: Option<u8>,
    transmit_power: Option<TransmitPower>,
    sampling_mode: Option<SamplingMode>,
    active_channels: Option<ChannelMask>,
    sample_rate: Option<u16>,
    sweeps: Option<u32>,
    unlimited_duration: Option<bool>,
    time_between_bursts: Option<u16>,
    lost_beacon_timeout: Option<u16>,
    hardware_offsets: Vec<(ChannelMask, HardwareOffset)>,
    linear_equations: Vec<(ChannelMask, LinearEquation)>,
    fatigue_options: Option<FatigueOptions>,
    histogram_options: Option<HistogramOptions>,
}

impl NodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_mode(mut self, mode: DefaultMode) -> Self {
        self.default_mode = Some(mode);
        self
    }

    /// Seconds of inactivity before the node enters its default mode.
    pub fn inactivity_timeout(mut self, seconds: u16) -> Self {
        self.inactivity_timeout = Some(seconds);
        self
    }

    pub fn check_radio_interval(mut self, seconds: u8) -> Self {
        self.check_radio_interval = Some(seconds);
        self
    }

    pub fn transmit_power(mut self, power: TransmitPower) -> Self {
        self.transmit_power = Some(power);
        self
    }

    pub fn sampling_mode(mut self, mode: SamplingMode) -> Self {
        self.sampling_mode = Some(mode);
        self
    }

    pub fn active_channels(mut self, channels: ChannelMask) -> Self {
        self.active_channels = Some(channels);
        self
    }

    pub fn sample_rate(mut self, code: u16) -> Self {
        self.sample_rate = Some(code);
        self
    }

    pub fn sweeps(mut self, sweeps: u32) -> Self {
        self.sweeps = Some(sweeps);
        self
    }

    pub fn unlimited_duration(mut self, enabled: bool) -> Self {
        self.unlimited_duration = Some(enabled);
        self
    }

    /// Only valid when the node samples in burst mode.
    pub fn time_between_bursts(mut self, seconds: u16) -> Self {
        self.time_between_bursts = Some(seconds);
        self
    }

    pub fn lost_beacon_timeout(mut self, minutes: u16) -> Self {
        self.lost_beacon_timeout = Some(minutes);
        self
    }

    pub fn hardware_offset(mut self, channels: ChannelMask, offset: HardwareOffset) -> Self {
        self.hardware_offsets.push((channels, offset));
        self
    }

    pub fn linear_equation(mut self, channels: ChannelMask, equation: LinearEquation) -> Self {
        self.linear_equations.push((channels, equation));
        self
    }

    pub fn fatigue_options(mut self, options: FatigueOptions) -> Self {
        self.fatigue_options = Some(options);
        self
    }

    pub fn histogram_options(mut self, options: HistogramOptions) -> Self {
        self.histogram_options = Some(options);
        self
    }

    /// Sampling mode the node will be in once this configuration is applied.
    fn effective_sampling_mode(&self, access: &mut dyn RegisterAccess) -> Result<SamplingMode> {
        match self.sampling_mode {
            Some(mode) => Ok(mode),
            None => access.read_register(),
        }
    }
}

impl Configuration for NodeConfig {
    fn verify(&self, features: &FeatureModel, access: &mut dyn RegisterAccess) -> Result<ConfigIssues> {
        let mut issues = ConfigIssues::new();

        if let Some(seconds) = self.inactivity_timeout {
            if seconds < InactivityTimeout::MIN_SECONDS {
                issues.push(
                    ConfigCategory::InactivityTimeout,
                    format!("must be at least {} seconds", InactivityTimeout::MIN_SECONDS),
                );
            }
        }

        if let Some(seconds) = self.check_radio_interval {
            if !(CheckRadioInterval::MIN_SECONDS..=CheckRadioInterval::MAX_SECONDS).contains(&seconds) {
                issues.push(
                    ConfigCategory::CheckRadioInterval,
                    format!(
                        "must be {}..={} seconds",
                        CheckRadioInterval::MIN_SECONDS,
                        CheckRadioInterval::MAX_SECONDS
                    ),
                );
            }
        }

        if let Some(minutes) = self.lost_beacon_timeout {
            let in_range = (LostBeaconTimeout::MIN_MINUTES..=LostBeaconTimeout::MAX_MINUTES).contains(&minutes);
            if minutes != LostBeaconTimeout::DISABLED && !in_range {
                issues.push(
                    ConfigCategory::LostBeaconTimeout,
                    format!(
                        "must be disabled or {}..={} minutes",
                        LostBeaconTimeout::MIN_MINUTES,
                        LostBeaconTimeout::MAX_MINUTES
                    ),
                );
            }
        }

        if let Some(mode) = self.sampling_mode {
            if !features.supports(Capability::SamplingMode(mode)) {
                issues.push(ConfigCategory::SamplingMode, format!("{mode} is not supported"));
            }
        }

        if let Some(channels) = self.active_channels {
            if channels.is_empty() {
                issues.push(ConfigCategory::ActiveChannels, "at least one channel must be active");
            } else if !features.channels().contains(channels) {
                issues.push(
                    ConfigCategory::ActiveChannels,
                    format!("channels {:#06x} do not exist on this node", channels.bits()),
                );
            }
        }

        if self.time_between_bursts.is_some() {
            let mode = self.effective_sampling_mode(access)?;
            if mode != SamplingMode::SyncBurst {
                issues.push(
                    ConfigCategory::TimeBetweenBursts,
                    format!("only applies to {}, not {mode}", SamplingMode::SyncBurst),
                );
            }
        }

        for (mask, _) in &self.hardware_offsets {
            if let Err(err) = features.locate(ChannelSetting::HardwareOffset, *mask) {
                issues.push(ConfigCategory::HardwareOffset, err.to_string());
            }
        }

        for (mask, _) in &self.linear_equations {
            if let Err(err) = features.locate(ChannelSetting::LinearEquation, *mask) {
                issues.push(ConfigCategory::LinearEquation, err.to_string());
            }
        }

        if self.fatigue_options.is_some() && !features.supports(Capability::FatigueConfig) {
            issues.push(ConfigCategory::FatigueOptions, "not supported by this node");
        }

        if self.histogram_options.is_some() && !features.supports(Capability::HistogramConfig) {
            issues.push(ConfigCategory::HistogramOptions, "not supported by this node");
        }

        Ok(issues)
    }

    fn apply(&self, features: &FeatureModel, access: &mut dyn RegisterAccess) -> Result<()> {
        let issues = self.verify(features, access)?;
        if !issues.is_empty() {
            log::warn!("rejecting node configuration: {issues}");
            return Err(Error::InvalidConfig(issues));
        }

        if let Some(mode) = self.default_mode {
            access.write_register(mode)?;
        }
        if let Some(seconds) = self.inactivity_timeout {
            access.write_register(InactivityTimeout { seconds })?;
        }
        if let Some(seconds) = self.check_radio_interval {
            access.write_register(CheckRadioInterval { seconds })?;
        }
        if let Some(power) = self.transmit_power {
            access.write_register(power)?;
        }
        if let Some(mode) = self.sampling_mode {
            access.write_register(mode)?;
        }
        if let Some(mask) = self.active_channels {
            access.write_register(ActiveChannels { mask })?;
        }
        if let Some(code) = self.sample_rate {
            access.write_register(SampleRate { code })?;
        }
        if let Some(sweeps) = self.sweeps {
            access.write_register(NumSweeps { sweeps })?;
        }
        if let Some(enabled) = self.unlimited_duration {
            access.write_register(UnlimitedDuration { enabled })?;
        }
        if let Some(seconds) = self.time_between_bursts {
            access.write_register(TimeBetweenBursts { seconds })?;
        }
        if let Some(minutes) = self.lost_beacon_timeout {
            access.write_register(LostBeaconTimeout { minutes })?;
        }
        for (mask, offset) in &self.hardware_offsets {
            let location = features.locate(ChannelSetting::HardwareOffset, *mask)?;
            access.write_value(location, *offset)?;
        }
        for (mask, equation) in &self.linear_equations {
            let location = features.locate(ChannelSetting::LinearEquation, *mask)?;
            access.write_value(location, *equation)?;
        }
        if let Some(options) = self.fatigue_options {
            access.write_register(options)?;
        }
        if let Some(options) = self.histogram_options {
            access.write_register(options)?;
        }

        log::debug!("node configuration applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBaseStation;
    use crate::{AccessSettings, Dialect, NodeAddress, NodeModel, RegisterCache, Version};

    fn node(model: NodeModel) -> (MockBaseStation, RegisterCache<MockBaseStation>, FeatureModel) {
        let bs = MockBaseStation::with_node(model, Version::new(9, 2));
        let mut cache = RegisterCache::new(NodeAddress(12), bs.clone(), Dialect::V1_1, AccessSettings::default());
        let features = FeatureModel::read(&mut cache).unwrap();
        bs.clear_calls();
        (bs, cache, features)
    }

    #[test]
    fn apply_writes_only_the_fields_that_are_set() {
        let (bs, mut cache, features) = node(NodeModel::SgLinkOem);
        let config = NodeConfig::new()
            .sampling_mode(SamplingMode::NonSync)
            .active_channels(ChannelMask::CH1 | ChannelMask::CH3)
            .sweeps(0x0001_0002);

        config.apply(&features, &mut cache).unwrap();
        assert_eq!(
            bs.writes(),
            vec![(0x000E, 3), (0x000C, 0b101), (0x0012, 0x0001), (0x0014, 0x0002)]
        );
    }

    #[test]
    fn verify_reports_every_range_violation() {
        let (_, mut cache, features) = node(NodeModel::VLink);
        let config = NodeConfig::new()
            .inactivity_timeout(4)
            .check_radio_interval(61)
            .lost_beacon_timeout(1);

        let issues = config.verify(&features, &mut cache).unwrap();
        assert_eq!(issues.len(), 3);
        assert!(issues.contains(ConfigCategory::InactivityTimeout));
        assert!(issues.contains(ConfigCategory::CheckRadioInterval));
        assert!(issues.contains(ConfigCategory::LostBeaconTimeout));
    }

    #[test]
    fn lost_beacon_timeout_can_be_disabled() {
        let (_, mut cache, features) = node(NodeModel::VLink);
        let issues = NodeConfig::new()
            .lost_beacon_timeout(LostBeaconTimeout::DISABLED)
            .verify(&features, &mut cache)
            .unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn verify_checks_the_feature_model() {
        let (_, mut cache, features) = node(NodeModel::ShmLink2);
        let config = NodeConfig::new()
            .sampling_mode(SamplingMode::SyncBurst)
            .active_channels(ChannelMask::CH4)
            .linear_equation(ChannelMask::CH1 | ChannelMask::CH2, LinearEquation::default());

        let issues = config.verify(&features, &mut cache).unwrap();
        assert!(issues.contains(ConfigCategory::SamplingMode));
        assert!(issues.contains(ConfigCategory::ActiveChannels));
        assert!(issues.contains(ConfigCategory::LinearEquation));
        assert!(!issues.contains(ConfigCategory::FatigueOptions));
    }

    #[test]
    fn empty_channel_set_is_rejected() {
        let (_, mut cache, features) = node(NodeModel::TcLink);
        let issues = NodeConfig::new()
            .active_channels(ChannelMask::empty())
            .verify(&features, &mut cache)
            .unwrap();
        assert!(issues.contains(ConfigCategory::ActiveChannels));
    }

    #[test]
    fn burst_timing_depends_on_the_node_sampling_mode() {
        let (bs, mut cache, features) = node(NodeModel::VLink);
        bs.set_word(0x000E, SamplingMode::Sync.code());

        let config = NodeConfig::new().time_between_bursts(60);
        let issues = config.verify(&features, &mut cache).unwrap();
        assert!(issues.contains(ConfigCategory::TimeBetweenBursts));

        let config = config.sampling_mode(SamplingMode::SyncBurst);
        assert!(config.verify(&features, &mut cache).unwrap().is_empty());
    }

    #[test]
    fn invalid_configuration_writes_nothing() {
        let (bs, mut cache, features) = node(NodeModel::GLink2Internal);
        let config = NodeConfig::new()
            .sample_rate(5)
            .histogram_options(HistogramOptions {
                transmit_rate: 1,
                bin_start: 0,
                bin_size: 50,
            });

        let err = config.apply(&features, &mut cache).unwrap_err();
        match err {
            Error::InvalidConfig(issues) => {
                assert!(issues.contains(ConfigCategory::HistogramOptions));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(bs.write_count(), 0);
    }

    #[test]
    fn channel_values_are_written_where_the_model_keeps_them() {
        let (bs, mut cache, features) = node(NodeModel::SgLinkOem);
        let config = NodeConfig::new().hardware_offset(ChannelMask::CH2, HardwareOffset { value: 2100 });

        config.apply(&features, &mut cache).unwrap();
        assert_eq!(bs.writes(), vec![(0x0122, 2100)]);
    }
}
