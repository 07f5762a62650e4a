use core::fmt;

use typed_builder::TypedBuilder;

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Register {
    als_conf = 0x00,
    power_saving = 0x03,
    als = 0x04,
    white = 0x05,
    als_int = 0x06,
}

/// A setting given in its human form (`"1/4"`, `100`, ...) that the sensor
/// has no code for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSettingValue<V> {
    /// Which setting was being decoded
    pub setting: &'static str,
    /// The rejected value
    pub value: V,
    /// Human readable list of what would have been accepted
    pub accepted: &'static str,
}

impl<V: fmt::Display> fmt::Display for InvalidSettingValue<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid {} value: {}. Valid values are {}",
            self.setting, self.value, self.accepted
        )
    }
}

impl<V: fmt::Debug + fmt::Display> core::error::Error for InvalidSettingValue<V> {}

/// ALS gain
///
/// ```
/// use veml7700::Gain;
///
/// let gain = Gain::try_from("1/8").unwrap();
/// assert_eq!(gain, Gain::x1_8);
/// assert_eq!(gain.factor(), 0.125);
/// assert!(Gain::try_from("4").is_err());
/// ```
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Gain {
    x1 = 0b00,
    x2 = 0b01,
    x1_8 = 0b10,
    x1_4 = 0b11,
}

impl Gain {
    pub const ACCEPTED: &'static str = "1, 2, 1/4, 1/8";

    pub fn factor(self) -> f64 {
        match self {
            Gain::x1 => 1.0,
            Gain::x2 => 2.0,
            Gain::x1_4 => 0.25,
            Gain::x1_8 => 0.125,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gain::x1 => "1",
            Gain::x2 => "2",
            Gain::x1_4 => "1/4",
            Gain::x1_8 => "1/8",
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0b00 => Some(Gain::x1),
            0b01 => Some(Gain::x2),
            0b10 => Some(Gain::x1_8),
            0b11 => Some(Gain::x1_4),
            _ => None,
        }
    }
}

impl<'a> TryFrom<&'a str> for Gain {
    type Error = InvalidSettingValue<&'a str>;

    fn try_from(value: &'a str) -> Result<Self, Self::Error> {
        match value {
            "1" => Ok(Gain::x1),
            "2" => Ok(Gain::x2),
            "1/4" => Ok(Gain::x1_4),
            "1/8" => Ok(Gain::x1_8),
            _ => Err(InvalidSettingValue {
                setting: "gain",
                value,
                accepted: Gain::ACCEPTED,
            }),
        }
    }
}

impl fmt::Display for Gain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ALS integration time
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum IntegrationTime {
    ms25 = 0x0C,
    ms50 = 0x08,
    ms100 = 0x00,
    ms200 = 0x01,
    ms400 = 0x02,
    ms800 = 0x03,
}

impl IntegrationTime {
    pub const ACCEPTED: &'static str = "25, 50, 100, 200, 400, 800";

    pub fn millis(self) -> u16 {
        match self {
            IntegrationTime::ms25 => 25,
            IntegrationTime::ms50 => 50,
            IntegrationTime::ms100 => 100,
            IntegrationTime::ms200 => 200,
            IntegrationTime::ms400 => 400,
            IntegrationTime::ms800 => 800,
        }
    }

    pub fn from_millis(ms: u32) -> Result<Self, InvalidSettingValue<u32>> {
        match ms {
            25 => Ok(IntegrationTime::ms25),
            50 => Ok(IntegrationTime::ms50),
            100 => Ok(IntegrationTime::ms100),
            200 => Ok(IntegrationTime::ms200),
            400 => Ok(IntegrationTime::ms400),
            800 => Ok(IntegrationTime::ms800),
            _ => Err(InvalidSettingValue {
                setting: "integration time",
                value: ms,
                accepted: IntegrationTime::ACCEPTED,
            }),
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x0C => Some(IntegrationTime::ms25),
            0x08 => Some(IntegrationTime::ms50),
            0x00 => Some(IntegrationTime::ms100),
            0x01 => Some(IntegrationTime::ms200),
            0x02 => Some(IntegrationTime::ms400),
            0x03 => Some(IntegrationTime::ms800),
            _ => None,
        }
    }
}

impl TryFrom<u32> for IntegrationTime {
    type Error = InvalidSettingValue<u32>;

    fn try_from(ms: u32) -> Result<Self, Self::Error> {
        IntegrationTime::from_millis(ms)
    }
}

/// Number of consecutive out-of-window samples before the threshold
/// interrupt fires
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Persistence {
    one = 0b00,
    two = 0b01,
    four = 0b10,
    eight = 0b11,
}

impl Persistence {
    pub const ACCEPTED: &'static str = "1, 2, 4, 8";

    pub fn samples(self) -> u8 {
        match self {
            Persistence::one => 1,
            Persistence::two => 2,
            Persistence::four => 4,
            Persistence::eight => 8,
        }
    }

    pub fn from_samples(samples: u32) -> Result<Self, InvalidSettingValue<u32>> {
        match samples {
            1 => Ok(Persistence::one),
            2 => Ok(Persistence::two),
            4 => Ok(Persistence::four),
            8 => Ok(Persistence::eight),
            _ => Err(InvalidSettingValue {
                setting: "persistence",
                value: samples,
                accepted: Persistence::ACCEPTED,
            }),
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0b00 => Some(Persistence::one),
            0b01 => Some(Persistence::two),
            0b10 => Some(Persistence::four),
            0b11 => Some(Persistence::eight),
            _ => None,
        }
    }
}

impl TryFrom<u32> for Persistence {
    type Error = InvalidSettingValue<u32>;

    fn try_from(samples: u32) -> Result<Self, Self::Error> {
        Persistence::from_samples(samples)
    }
}

/// ALS_CONF register (0x00)
///
/// ```
/// use veml7700::{AlsConf, Gain, IntegrationTime, Persistence};
///
/// let conf = AlsConf {
///     enable: true,
///     interrupt_enable: false,
///     persistence: Persistence::one,
///     integration_time: IntegrationTime::ms100,
///     gain: Gain::x1_4,
/// };
/// assert_eq!(conf.to_reg(), 0b0001_1000_0000_0001);
/// assert_eq!(AlsConf::from_reg(0x1801), Some(conf));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlsConf {
    /// Bit 0, written as 1 to run the sensor
    pub enable: bool,
    /// Threshold interrupt enable
    pub interrupt_enable: bool,
    pub persistence: Persistence,
    pub integration_time: IntegrationTime,
    pub gain: Gain,
}

impl AlsConf {
    pub fn to_reg(&self) -> u16 {
        pack(
            self.enable,
            self.interrupt_enable,
            self.persistence,
            self.integration_time,
            self.gain,
        )
    }

    /// Decodes a register value. Reserved bits are ignored; `None` if the
    /// integration time field holds a code the sensor doesn't define.
    pub fn from_reg(value: u16) -> Option<Self> {
        let gain = Gain::from_code(((value >> 11) & 0b11) as u8)?;
        let integration_time = IntegrationTime::from_code(((value >> 6) & 0b1111) as u8)?;
        let persistence = Persistence::from_code(((value >> 4) & 0b11) as u8)?;

        Some(Self {
            enable: value & 1 != 0,
            interrupt_enable: value & (1 << 1) != 0,
            persistence,
            integration_time,
            gain,
        })
    }
}

/// Packs the ALS_CONF word.
///
/// bits 15-13 and 10 and 3-2 are reserved and always zero.
pub fn pack(
    enable: bool,
    interrupt_enable: bool,
    persistence: Persistence,
    integration_time: IntegrationTime,
    gain: Gain,
) -> u16 {
    let gain = u16::from(gain.code() & 0b11) << 11;
    let integration_time = u16::from(integration_time.code() & 0b1111) << 6;
    let persistence = u16::from(persistence.code() & 0b11) << 4;
    let interrupt_enable = u16::from(interrupt_enable) << 1;
    let enable = u16::from(enable);

    gain | integration_time | persistence | interrupt_enable | enable
}

/// Power saving mode, trades refresh time for current draw
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PowerSaveMode {
    mode1 = 0b00,
    mode2 = 0b01,
    mode3 = 0b10,
    mode4 = 0b11,
}

impl PowerSaveMode {
    pub const ACCEPTED: &'static str = "1, 2, 3, 4";

    pub fn from_mode(mode: u32) -> Result<Self, InvalidSettingValue<u32>> {
        match mode {
            1 => Ok(PowerSaveMode::mode1),
            2 => Ok(PowerSaveMode::mode2),
            3 => Ok(PowerSaveMode::mode3),
            4 => Ok(PowerSaveMode::mode4),
            _ => Err(InvalidSettingValue {
                setting: "power save mode",
                value: mode,
                accepted: PowerSaveMode::ACCEPTED,
            }),
        }
    }
}

/// POWER_SAVING register (0x03)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerSave {
    #[default]
    Disabled,
    Enabled(PowerSaveMode),
}

impl PowerSave {
    pub fn to_reg(self) -> u16 {
        match self {
            PowerSave::Disabled => 0x0000,
            PowerSave::Enabled(mode) => (u16::from(mode as u8) << 1) | 1,
        }
    }
}

/// ALS_INT register (0x06)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptStatus {
    /// Reading went above the high threshold
    pub high_threshold: bool,
    /// Reading went below the low threshold
    pub low_threshold: bool,
}

impl InterruptStatus {
    pub const HIGH: u16 = 0x4000;
    pub const LOW: u16 = 0x8000;

    pub fn from_reg(value: u16) -> Self {
        Self {
            high_threshold: value & Self::HIGH != 0,
            low_threshold: value & Self::LOW != 0,
        }
    }
}

/// Everything the driver writes to the sensor. Fixed once the driver is built.
///
/// ```
/// use veml7700::{Gain, IntegrationTime, Settings};
///
/// let settings = Settings::builder().gain(Gain::x2).build();
/// assert_eq!(settings.gain, Gain::x2);
/// assert_eq!(settings.integration_time, IntegrationTime::ms100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    #[builder(default = Gain::x1_4)]
    pub gain: Gain,
    #[builder(default = IntegrationTime::ms100)]
    pub integration_time: IntegrationTime,
    #[builder(default = Persistence::one)]
    pub persistence: Persistence,
    #[builder(default = false)]
    pub interrupt_enable: bool,
    #[builder(default)]
    pub power_save: PowerSave,
}

impl Default for Settings {
    fn default() -> Self {
        Settings::builder().build()
    }
}

impl Settings {
    pub fn als_conf(&self, enable: bool) -> AlsConf {
        AlsConf {
            enable,
            interrupt_enable: self.interrupt_enable,
            persistence: self.persistence,
            integration_time: self.integration_time,
            gain: self.gain,
        }
    }
}
