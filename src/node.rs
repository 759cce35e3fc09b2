//! Wireless node facade
//!
//! [`WirelessNode`] is the handle applications use for one node behind a base
//! station. It is cheap to create: nothing is sent to the node until the first
//! operation that needs it. At that point the protocol dialect is negotiated
//! and the register cache is set up (once), and the feature model is read
//! (once) when an operation needs to know what the node can do.
//!
//! ```ignore
//! use wsn_node::{AutoBalanceOption, NodeAddress, WirelessNode};
//!
//! let mut node = WirelessNode::new(NodeAddress(1234), base_station);
//! println!("firmware {}", node.firmware_version()?);
//! node.change_frequency(15)?;
//! node.auto_balance(1, AutoBalanceOption::MIDSCALE)?;
//! ```

use core::convert::Infallible;
use std::time::SystemTime;

use regiface::{FromByteArray, ReadableRegister, WritableRegister};

use crate::protocol::negotiate;
use crate::registers::channel::{
    CalUnit, EquationType, HardwareGain, HardwareOffset, LinearEquation, SettlingTime,
    ThermocoupleType,
};
use crate::{
    AccessSettings, ActiveChannels, AutoBalanceOption, AutoCalResult, BaseStation, Capability,
    ChannelMask, ChannelSetting, CheckRadioInterval, ConfigCategory, ConfigIssue, ConfigIssues,
    Configuration, DataCollectionMethod, DataFormat, DataStorageSize, DefaultMode, Dialect, Error,
    FatigueOptions, FeatureModel, FirmwareVersion, Frequency, HistogramControl, HistogramOptions,
    InactivityTimeout, LostBeaconTimeout, Microcontroller, ModelNumber, NodeAddress, NodeModel,
    NumDatalogSessions, NumSweeps, PingResponse, PowerControl, RadioFeatures, RegionCode,
    RegisterAccessExt, RegisterCache, RegisterLocation, Result, SampleRate, SamplingMode,
    SerialNumber, SetToIdleStatus, TimeBetweenBursts, TransmitPower, UnlimitedDuration, Version,
};

/// A wireless node reached through a base station.
pub struct WirelessNode<B> {
    address: NodeAddress,
    base_station: B,
    settings: AccessSettings,
    /// Built by protocol negotiation; holds the negotiated dialect
    cache: Option<RegisterCache<B>>,
    features: Option<FeatureModel>,
    frequency: Option<Frequency>,
}

impl<B> WirelessNode<B>
where
    B: BaseStation + Clone + PartialEq,
{
    /// Creates a handle for the node at `address` with default access settings.
    ///
    /// Nothing is sent to the node until an operation needs it.
    pub fn new(address: NodeAddress, base_station: B) -> Self {
        Self::with_settings(address, base_station, AccessSettings::default())
    }

    /// Creates a handle using `settings` for every register read and write.
    pub fn with_settings(address: NodeAddress, base_station: B, settings: AccessSettings) -> Self {
        Self {
            address,
            base_station,
            settings,
            cache: None,
            features: None,
            frequency: None,
        }
    }

    /// Starts from a known radio channel instead of reading it from the node.
    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    /// Node address on the wireless network.
    pub fn address(&self) -> NodeAddress {
        self.address
    }

    /// Base station the node is currently reached through.
    pub fn base_station(&self) -> &B {
        &self.base_station
    }

    /// Routes the node through another base station.
    ///
    /// Cached registers and the negotiated dialect are kept: they describe the
    /// node, not the path to it.
    pub fn set_base_station(&mut self, base_station: B) {
        if self.base_station == base_station {
            return;
        }
        if let Some(cache) = self.cache.as_mut() {
            cache.set_base_station(base_station.clone());
        }
        self.base_station = base_station;
        log::debug!("node {}: base station changed", self.address);
    }

    fn register_cache(&mut self) -> Result<&mut RegisterCache<B>> {
        let cache = match self.cache.take() {
            Some(cache) => cache,
            None => self.negotiate()?,
        };
        Ok(self.cache.insert(cache))
    }

    fn negotiate(&self) -> Result<RegisterCache<B>> {
        let mut negotiated = negotiate(&self.base_station, self.address, self.settings)?;
        negotiated.cache.update_settings(self.settings);
        Ok(negotiated.cache)
    }

    /// Feature model and register cache, building whichever is missing.
    fn parts(&mut self) -> Result<(&FeatureModel, &mut RegisterCache<B>)> {
        let mut cache = match self.cache.take() {
            Some(cache) => cache,
            None => self.negotiate()?,
        };
        let features = match self.features.take() {
            Some(features) => features,
            None => match FeatureModel::read(&mut cache) {
                Ok(features) => features,
                Err(err) => {
                    self.cache = Some(cache);
                    return Err(err);
                }
            },
        };

        let cache = self.cache.insert(cache);
        let features: &FeatureModel = self.features.insert(features);
        Ok((features, cache))
    }

    /// What the node can do.
    pub fn features(&mut self) -> Result<&FeatureModel> {
        Ok(self.parts()?.0)
    }

    fn require(&mut self, capability: Capability) -> Result<()> {
        self.features()?.require(capability)
    }

    /// Dialect the node is spoken to in.
    pub fn dialect(&mut self) -> Result<Dialect> {
        Ok(self.register_cache()?.dialect())
    }

    /// Access settings in effect for register reads and writes.
    pub fn settings(&self) -> AccessSettings {
        self.settings
    }

    fn update_settings(&mut self, update: impl FnOnce(&mut AccessSettings)) {
        update(&mut self.settings);
        if let Some(cache) = self.cache.as_mut() {
            cache.update_settings(self.settings);
        }
    }

    /// Enables or disables grouped reads. Only has an effect on dialect 1.1.
    pub fn use_group_read(&mut self, enabled: bool) {
        self.update_settings(|settings| settings.use_grouped_reads = enabled);
    }

    /// Sets how many times a failed register read or write is retried.
    pub fn read_write_retries(&mut self, retries: u8) {
        self.update_settings(|settings| settings.retries = retries);
    }

    /// Enables or disables reading through the register cache.
    ///
    /// Writes are recorded in the cache either way.
    pub fn use_register_cache(&mut self, enabled: bool) {
        self.update_settings(|settings| settings.use_cache = enabled);
    }

    /// Forgets every cached register value.
    pub fn clear_register_cache(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.invalidate_all();
        }
        self.frequency = None;
    }

    /// Reads a typed register, through the cache.
    ///
    /// # Errors
    /// * `Error::Communication` - the node did not answer within the retry budget
    /// * `Error::MalformedResponse` - the value read does not decode as `R`
    pub fn read_register<R>(&mut self) -> Result<R>
    where
        R: ReadableRegister<IdType = u16>,
    {
        self.register_cache()?.read_register()
    }

    /// Writes a typed register and records it in the cache.
    ///
    /// # Errors
    /// * `Error::Communication` - the node did not answer within the retry budget
    pub fn write_register<R>(&mut self, register: R) -> Result<()>
    where
        R: WritableRegister<IdType = u16, Error = Infallible>,
    {
        self.register_cache()?.write_register(register)
    }

    /// Reads the raw word at `location`.
    pub fn read_word(&mut self, location: RegisterLocation) -> Result<u16> {
        self.register_cache()?.read_word(location)
    }

    /// Writes a raw word at `location`.
    pub fn write_word(&mut self, location: RegisterLocation, value: u16) -> Result<()> {
        self.register_cache()?.write_word(location, value)
    }

    /// Lists what would prevent `config` from being applied.
    pub fn verify_config(&mut self, config: &dyn Configuration) -> Result<ConfigIssues> {
        let (features, cache) = self.parts()?;
        config.verify(features, cache)
    }

    /// Applies `config`, then resets the radio so the node picks it up.
    pub fn apply_config(&mut self, config: &dyn Configuration) -> Result<()> {
        let (features, cache) = self.parts()?;
        config.apply(features, cache)?;
        self.reset_radio()
    }

    /// Power cycles the node.
    ///
    /// # Errors
    /// * `Error::Communication` - the power control register could not be written
    pub fn cycle_power(&mut self) -> Result<()> {
        log::info!("node {}: cycling power", self.address);
        self.write_register(PowerControl::CyclePower)
    }

    /// Resets the node's radio so that pending radio settings take effect.
    pub fn reset_radio(&mut self) -> Result<()> {
        log::debug!("node {}: resetting radio", self.address);
        self.write_register(PowerControl::ResetRadio)
    }

    /// Moves the node to radio channel `channel` (11..=26).
    ///
    /// # Errors
    /// * `Error::OutOfRange` - `channel` is not a valid radio channel; nothing
    ///   is sent to the node
    pub fn change_frequency(&mut self, channel: u8) -> Result<()> {
        let frequency = Frequency::new(channel);
        if !frequency.is_valid() {
            return Err(Error::OutOfRange {
                name: "frequency",
                value: channel.into(),
                min: Frequency::MIN.channel.into(),
                max: Frequency::MAX.channel.into(),
            });
        }

        self.write_register(frequency)?;
        self.reset_radio()?;
        self.frequency = Some(frequency);
        log::info!("node {}: moved to {frequency}", self.address);
        Ok(())
    }

    /// Starts non-synchronized sampling.
    ///
    /// # Errors
    /// * `Error::InvalidConfig` - the node is configured for another sampling
    ///   mode; the start command is not sent
    pub fn start_non_sync_sampling(&mut self) -> Result<()> {
        let mode: SamplingMode = self.read_register()?;
        if mode != SamplingMode::NonSync {
            let issue = ConfigIssue::new(
                ConfigCategory::SamplingMode,
                format!("configured for {mode}, not {}", SamplingMode::NonSync),
            );
            return Err(Error::InvalidConfig(issue.into()));
        }
        self.base_station.start_non_sync_sampling(self.address)
    }

    /// Zeroes the on-node histogram. The node is power cycled to act on it.
    pub fn clear_histogram(&mut self) -> Result<()> {
        self.require(Capability::HistogramConfig)?;
        self.write_register(HistogramControl::Clear)?;
        self.cycle_power()
    }

    /// Balances `channel` toward the target selected by `option`.
    ///
    /// The node rewrites the channel's hardware offset, so that single cached
    /// entry is dropped.
    ///
    /// # Errors
    /// * `Error::NotSupported` - unknown `option`, a channel that cannot be
    ///   balanced, or no hardware offset mapped for the channel
    pub fn auto_balance(&mut self, channel: u8, option: AutoBalanceOption) -> Result<()> {
        let target = option
            .target_code()
            .ok_or_else(|| Error::NotSupported(format!("AutoBalance option {}", option.0)))?;
        self.require(Capability::AutoBalance(channel))?;

        log::info!("node {}: auto-balancing channel {channel} to {target}", self.address);
        self.base_station.auto_balance(self.address, channel, target)?;

        let (features, cache) = self.parts()?;
        let location = features.locate(ChannelSetting::HardwareOffset, ChannelMask::channel(channel))?;
        cache.invalidate(location);
        Ok(())
    }

    /// Runs auto-cal on an SHM-Link 2.
    ///
    /// # Errors
    /// * `Error::NotSupported` - not an SHM-Link 2, or its firmware predates
    ///   auto-cal
    /// * `Error::NodeCommunication` - the node reported that auto-cal failed
    pub fn auto_cal_shm_link(&mut self) -> Result<AutoCalResult> {
        let (model, firmware) = {
            let features = self.features()?;
            if features.model() != NodeModel::ShmLink2 {
                return Err(Error::NotSupported(format!("{} on {}", Capability::AutoCal, features.model())));
            }
            features.require(Capability::AutoCal)?;
            (features.model(), features.firmware_version())
        };

        let (success, result) = self.base_station.auto_cal(self.address, model, firmware)?;
        if !success {
            return Err(Error::NodeCommunication {
                node: self.address,
                message: "AutoCal has failed".into(),
            });
        }

        let (features, cache) = self.parts()?;
        for group in features.channel_groups() {
            if let Ok(location) = features.locate(ChannelSetting::HardwareOffset, group.mask) {
                cache.invalidate(location);
            }
        }
        Ok(result)
    }

    /// Erases the node's datalogging memory.
    pub fn erase(&mut self) -> Result<()> {
        if !self.base_station.erase(self.address)? {
            return Err(Error::NodeCommunication {
                node: self.address,
                message: "Erase has failed".into(),
            });
        }
        log::info!("node {}: datalog erased", self.address);
        Ok(())
    }

    /// Pings the node through the base station.
    ///
    /// # Errors
    /// * `Error::Communication` - the base station could not reach the node
    pub fn ping(&self) -> Result<PingResponse> {
        self.base_station.ping(self.address)
    }

    /// Puts the node to sleep. Returns whether the node acknowledged.
    pub fn sleep(&self) -> Result<bool> {
        self.base_station.sleep(self.address)
    }

    /// Stops whatever the node is doing and puts it in idle mode.
    pub fn set_to_idle(&self) -> Result<SetToIdleStatus> {
        self.base_station.set_to_idle(self.address)
    }

    /// When the base station last heard from the node.
    pub fn last_communication_time(&self) -> SystemTime {
        self.base_station.last_communication_time(self.address)
    }

    /// Firmware version the node reports.
    pub fn firmware_version(&mut self) -> Result<Version> {
        Ok(self.read_register::<FirmwareVersion>()?.version)
    }

    /// Node model.
    pub fn model(&mut self) -> Result<NodeModel> {
        Ok(self.read_register::<ModelNumber>()?.model)
    }

    /// Serial number.
    pub fn serial(&mut self) -> Result<u32> {
        Ok(self.read_register::<SerialNumber>()?.value)
    }

    /// Microcontroller fitted to the node.
    pub fn microcontroller(&mut self) -> Result<Microcontroller> {
        self.read_register()
    }

    /// Optional radio hardware fitted to the node.
    pub fn radio_features(&mut self) -> Result<RadioFeatures> {
        self.read_register()
    }

    /// Size of the datalogging memory.
    pub fn data_storage_size(&mut self) -> Result<DataStorageSize> {
        self.read_register()
    }

    /// Regulatory region the radio is configured for.
    pub fn region_code(&mut self) -> Result<RegionCode> {
        self.read_register()
    }

    /// Number of datalogging sessions stored on the node.
    pub fn num_datalog_sessions(&mut self) -> Result<u16> {
        Ok(self.read_register::<NumDatalogSessions>()?.count)
    }

    /// Current radio channel. Read once, then tracked in memory.
    pub fn frequency(&mut self) -> Result<Frequency> {
        if let Some(frequency) = self.frequency {
            return Ok(frequency);
        }
        let frequency: Frequency = self.read_register()?;
        Ok(*self.frequency.insert(frequency))
    }

    /// Mode the node enters after power-up.
    pub fn default_mode(&mut self) -> Result<DefaultMode> {
        self.read_register()
    }

    /// Seconds of inactivity before the node enters its default mode.
    pub fn inactivity_timeout(&mut self) -> Result<u16> {
        Ok(self.read_register::<InactivityTimeout>()?.seconds)
    }

    /// Seconds between radio checks while the node sleeps.
    pub fn check_radio_interval(&mut self) -> Result<u8> {
        Ok(self.read_register::<CheckRadioInterval>()?.seconds)
    }

    /// Transmit power of the node's radio.
    pub fn transmit_power(&mut self) -> Result<TransmitPower> {
        self.read_register()
    }

    /// Minutes without a beacon before sampling stops; 0 when disabled.
    pub fn lost_beacon_timeout(&mut self) -> Result<u16> {
        Ok(self.read_register::<LostBeaconTimeout>()?.minutes)
    }

    /// Sampling mode the node is configured for.
    ///
    /// # Errors
    /// * `Error::MalformedResponse` - the node holds an unknown mode code
    pub fn sampling_mode(&mut self) -> Result<SamplingMode> {
        self.read_register()
    }

    /// Channels sampled by the node.
    pub fn active_channels(&mut self) -> Result<ChannelMask> {
        Ok(self.read_register::<ActiveChannels>()?.mask)
    }

    /// Sample rate code.
    pub fn sample_rate(&mut self) -> Result<u16> {
        Ok(self.read_register::<SampleRate>()?.code)
    }

    /// Number of sweeps per sampling session.
    pub fn num_sweeps(&mut self) -> Result<u32> {
        Ok(self.read_register::<NumSweeps>()?.sweeps)
    }

    /// Whether sampling runs until stopped.
    pub fn unlimited_duration(&mut self) -> Result<bool> {
        Ok(self.read_register::<UnlimitedDuration>()?.enabled)
    }

    /// Format samples are transmitted in.
    pub fn data_format(&mut self) -> Result<DataFormat> {
        self.read_register()
    }

    /// Whether samples are transmitted, logged, or both.
    pub fn data_collection_method(&mut self) -> Result<DataCollectionMethod> {
        self.read_register()
    }

    /// Seconds between bursts. Only for nodes that can burst sample.
    pub fn time_between_bursts(&mut self) -> Result<u16> {
        self.require(Capability::SamplingMode(SamplingMode::SyncBurst))?;
        Ok(self.read_register::<TimeBetweenBursts>()?.seconds)
    }

    fn read_channel<T: FromByteArray>(&mut self, setting: ChannelSetting, channels: ChannelMask) -> Result<T> {
        let (features, cache) = self.parts()?;
        let location = features.locate(setting, channels)?;
        cache.read_value(location)
    }

    /// Hardware gain of the channel group selected by `channels`.
    ///
    /// # Errors
    /// * `Error::NotSupported` - the node has no hardware gain for that group
    pub fn hardware_gain(&mut self, channels: ChannelMask) -> Result<HardwareGain> {
        self.read_channel(ChannelSetting::HardwareGain, channels)
    }

    /// Hardware offset of the channel group selected by `channels`.
    pub fn hardware_offset(&mut self, channels: ChannelMask) -> Result<HardwareOffset> {
        self.read_channel(ChannelSetting::HardwareOffset, channels)
    }

    /// Calibration slope and offset of the channel group selected by `channels`.
    pub fn linear_equation(&mut self, channels: ChannelMask) -> Result<LinearEquation> {
        self.read_channel(ChannelSetting::LinearEquation, channels)
    }

    /// Calibration unit of the channel group selected by `channels`.
    pub fn unit(&mut self, channels: ChannelMask) -> Result<CalUnit> {
        self.read_channel(ChannelSetting::Unit, channels)
    }

    /// Calibration equation of the channel group selected by `channels`.
    pub fn equation_type(&mut self, channels: ChannelMask) -> Result<EquationType> {
        self.read_channel(ChannelSetting::EquationType, channels)
    }

    /// Filter settling time of the channel group selected by `channels`.
    pub fn filter_settling_time(&mut self, channels: ChannelMask) -> Result<SettlingTime> {
        self.read_channel(ChannelSetting::FilterSettlingTime, channels)
    }

    /// Thermocouple type of the channel group selected by `channels`.
    pub fn thermocouple_type(&mut self, channels: ChannelMask) -> Result<ThermocoupleType> {
        self.read_channel(ChannelSetting::ThermocoupleType, channels)
    }

    /// Fatigue analysis options.
    ///
    /// # Errors
    /// * `Error::NotSupported` - the node does not do fatigue analysis
    pub fn fatigue_options(&mut self) -> Result<FatigueOptions> {
        self.require(Capability::FatigueConfig)?;
        self.read_register()
    }

    /// Histogram options.
    ///
    /// # Errors
    /// * `Error::NotSupported` - the node does not keep a histogram
    pub fn histogram_options(&mut self) -> Result<HistogramOptions> {
        self.require(Capability::HistogramConfig)?;
        self.read_register()
    }
}
