//! A platform agnostic driver to interface with the VEML7700 (ambient light sensor)
//!
//! The driver talks to the sensor through a [`regbus::RegisterBus`], opening a
//! fresh handle for every transaction.
//!
//! # Examples
//!
//! ```ignore
//! use regbus::I2cRegisterBus;
//! use veml7700::{Gain, Settings, Veml7700, DEFAULT_ADDRESS};
//!
//! // depends on your board/chip
//! let i2c = todo!("Create the I2C interface");
//!
//! let settings = Settings::builder().gain(Gain::x1_8).build();
//! let mut sensor = Veml7700::new(I2cRegisterBus::new(i2c), DEFAULT_ADDRESS, settings);
//!
//! // nothing can be read until the configuration is on the device
//! sensor.initialize().unwrap();
//!
//! let reading = sensor.read_lux().unwrap();
//! ```

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

use core::fmt;

use log::{debug, info, warn};
use regbus::{RegisterBus, RegisterHandle};

use config::Register;

pub mod config;
pub mod lux;

pub use config::{
    pack, AlsConf, Gain, IntegrationTime, InterruptStatus, InvalidSettingValue, Persistence,
    PowerSave, PowerSaveMode, Settings,
};

/// Fixed I2C address of the VEML7700
pub const DEFAULT_ADDRESS: u8 = 0x10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Veml7700Error<BusError> {
    /// Writing the configuration failed
    Write(BusError),
    /// Reading a data register failed
    Read(BusError),
    /// [`Veml7700::initialize`] hasn't succeeded yet
    NotInitialized,
}

impl<BusError: fmt::Display> fmt::Display for Veml7700Error<BusError> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Veml7700Error::Write(err) => write!(f, "failed to write config to VEML7700: {}", err),
            Veml7700Error::Read(err) => write!(f, "failed to read from VEML7700: {}", err),
            Veml7700Error::NotInitialized => f.write_str("VEML7700 is not initialized"),
        }
    }
}

impl<BusError: fmt::Debug + fmt::Display> core::error::Error for Veml7700Error<BusError> {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    Uninitialized,
    Ready,
    /// The last reading failed. The next one is attempted as usual.
    Faulted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LuxReading {
    /// Raw ALS count
    pub als: u16,
    /// Illuminance: lux (lx)
    pub lux: f64,
}

pub struct Veml7700<Bus> {
    bus: Bus,
    address: u8,
    settings: Settings,
    state: State,
}

impl<Bus: RegisterBus> Veml7700<Bus> {
    /// Creates the driver. Nothing is sent to the sensor until
    /// [`initialize`](Self::initialize).
    pub fn new(bus: Bus, address: u8, settings: Settings) -> Self {
        Self {
            bus,
            address,
            settings,
            state: State::Uninitialized,
        }
    }

    /// Writes the configuration and power saving registers.
    pub fn initialize(&mut self) -> Result<(), Veml7700Error<Bus::Error>> {
        let conf = self.settings.als_conf(true).to_reg();
        let power_save = self.settings.power_save.to_reg();

        let result = Self::write_config(&mut self.bus, self.address, conf, power_save);
        match result {
            Ok(()) => {
                self.state = State::Ready;
                info!("VEML7700 at 0x{:02X} initialized, config {:016b}", self.address, conf);
                Ok(())
            }
            Err(err) => {
                self.state = State::Uninitialized;
                Err(Veml7700Error::Write(err))
            }
        }
    }

    fn write_config(bus: &mut Bus, address: u8, conf: u16, power_save: u16) -> Result<(), Bus::Error> {
        let mut handle = bus.open_handle(address)?;

        // the config word goes out high byte first
        debug!("writing config to VEML7700: {:016b}", conf);
        handle.write_register(Register::als_conf as u8, &conf.to_be_bytes())?;
        handle.write_register(Register::power_saving as u8, &power_save.to_be_bytes())?;
        Ok(())
    }

    /// Raw ALS count
    pub fn read_raw(&mut self) -> Result<u16, Veml7700Error<Bus::Error>> {
        self.read_word(Register::als)
    }

    /// Raw white channel count
    pub fn read_white(&mut self) -> Result<u16, Veml7700Error<Bus::Error>> {
        self.read_word(Register::white)
    }

    /// Reads (and thereby clears) the threshold interrupt flags
    pub fn interrupt_status(&mut self) -> Result<InterruptStatus, Veml7700Error<Bus::Error>> {
        let value = self.read_word(Register::als_int)?;
        Ok(InterruptStatus::from_reg(value))
    }

    /// Reads the ALS count and converts it to lux
    pub fn read_lux(&mut self) -> Result<LuxReading, Veml7700Error<Bus::Error>> {
        let als = self.read_raw()?;
        Ok(LuxReading {
            als,
            lux: self.compute_lux(als),
        })
    }

    pub fn compute_lux(&self, raw: u16) -> f64 {
        lux::compute_lux(self.settings.gain, self.settings.integration_time, raw)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Gives the bus back
    pub fn release(self) -> Bus {
        self.bus
    }

    fn read_word(&mut self, register: Register) -> Result<u16, Veml7700Error<Bus::Error>> {
        if self.state == State::Uninitialized {
            return Err(Veml7700Error::NotInitialized);
        }

        let mut data = [0u8; 2];
        let result = self
            .bus
            .open_handle(self.address)
            .and_then(|mut handle| handle.read_register(register as u8, &mut data));

        match result {
            Ok(()) => {
                self.state = State::Ready;
                // data registers are little-endian, LSB first
                let value = u16::from_le_bytes(data);
                debug!(
                    "read {:?} from VEML7700. MSB: {:02x}, LSB: {:02x}, value: {:04x}",
                    register, data[1], data[0], value
                );
                Ok(value)
            }
            Err(err) => {
                self.state = State::Faulted;
                warn!("reading {:?} from VEML7700 failed", register);
                Err(Veml7700Error::Read(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
    use regbus::{BusError, I2cRegisterBus};

    type MockSensor = Veml7700<I2cRegisterBus<I2cMock>>;

    fn sensor(expectations: &[I2cTransaction], settings: Settings) -> MockSensor {
        Veml7700::new(I2cRegisterBus::new(I2cMock::new(expectations)), DEFAULT_ADDRESS, settings)
    }

    fn init_transactions() -> [I2cTransaction; 2] {
        [
            I2cTransaction::write(0x10, vec![0x00, 0x18, 0x01]),
            I2cTransaction::write(0x10, vec![0x03, 0x00, 0x00]),
        ]
    }

    fn done(sensor: MockSensor) {
        sensor.release().release().done();
    }

    #[test]
    fn initialize_writes_config_high_byte_first() {
        let mut sensor = sensor(&init_transactions(), Settings::default());
        assert_eq!(sensor.state(), State::Uninitialized);

        sensor.initialize().unwrap();
        assert_eq!(sensor.state(), State::Ready);
        done(sensor);
    }

    #[test]
    fn initialize_uses_configured_settings() {
        let settings = Settings::builder()
            .gain(Gain::x2)
            .integration_time(IntegrationTime::ms800)
            .persistence(Persistence::four)
            .interrupt_enable(true)
            .power_save(PowerSave::Enabled(PowerSaveMode::mode2))
            .build();
        // gain 01, it 0011, pers 10, int 1, enable 1
        let conf: u16 = (0b01 << 11) | (0b0011 << 6) | (0b10 << 4) | 0b11;
        let expectations = [
            I2cTransaction::write(0x10, vec![0x00, (conf >> 8) as u8, conf as u8]),
            I2cTransaction::write(0x10, vec![0x03, 0x00, 0b011]),
        ];

        let mut sensor = sensor(&expectations, settings);
        sensor.initialize().unwrap();
        done(sensor);
    }

    #[test]
    fn failed_config_write_stops_initialization() {
        let expectations = [I2cTransaction::write(0x10, vec![0x00, 0x18, 0x01]).with_error(ErrorKind::Other)];
        let mut sensor = sensor(&expectations, Settings::default());

        let err = sensor.initialize().unwrap_err();
        assert_eq!(err, Veml7700Error::Write(BusError::Transport(ErrorKind::Other)));
        assert_eq!(sensor.state(), State::Uninitialized);
        done(sensor);
    }

    #[test]
    fn failed_power_save_write_is_a_write_error() {
        let expectations = [
            I2cTransaction::write(0x10, vec![0x00, 0x18, 0x01]),
            I2cTransaction::write(0x10, vec![0x03, 0x00, 0x00]).with_error(ErrorKind::Other),
        ];
        let mut sensor = sensor(&expectations, Settings::default());

        assert!(matches!(sensor.initialize(), Err(Veml7700Error::Write(_))));
        assert!(matches!(sensor.read_raw(), Err(Veml7700Error::NotInitialized)));
        done(sensor);
    }

    #[test]
    fn reading_before_initialize_sends_nothing() {
        let mut sensor = sensor(&[], Settings::default());

        assert_eq!(sensor.read_lux().unwrap_err(), Veml7700Error::NotInitialized);
        done(sensor);
    }

    #[test]
    fn raw_count_is_little_endian() {
        let mut expectations = init_transactions().to_vec();
        expectations.push(I2cTransaction::write_read(0x10, vec![0x04], vec![0x34, 0x12]));
        let mut sensor = sensor(&expectations, Settings::default());

        sensor.initialize().unwrap();
        assert_eq!(sensor.read_raw().unwrap(), 0x1234);
        done(sensor);
    }

    #[test]
    fn read_lux_uses_configured_gain() {
        let settings = Settings::builder().gain(Gain::x1).build();
        let expectations = [
            I2cTransaction::write(0x10, vec![0x00, 0x00, 0x01]),
            I2cTransaction::write(0x10, vec![0x03, 0x00, 0x00]),
            I2cTransaction::write_read(0x10, vec![0x04], vec![0x01, 0x00]),
        ];
        let mut sensor = sensor(&expectations, settings);

        sensor.initialize().unwrap();
        let reading = sensor.read_lux().unwrap();
        assert_eq!(reading.als, 1);
        assert!((reading.lux - 0.0672).abs() < 1e-12, "{}", reading.lux);
        done(sensor);
    }

    #[test]
    fn read_failure_faults_without_latching() {
        let mut expectations = init_transactions().to_vec();
        expectations.push(I2cTransaction::write_read(0x10, vec![0x04], vec![0x00, 0x00]).with_error(ErrorKind::Other));
        expectations.push(I2cTransaction::write_read(0x10, vec![0x04], vec![0x10, 0x00]));
        let mut sensor = sensor(&expectations, Settings::default());
        sensor.initialize().unwrap();

        let err = sensor.read_lux().unwrap_err();
        assert_eq!(err, Veml7700Error::Read(BusError::Transport(ErrorKind::Other)));
        assert_eq!(sensor.state(), State::Faulted);

        let reading = sensor.read_lux().unwrap();
        assert_eq!(reading.als, 0x10);
        assert_eq!(sensor.state(), State::Ready);
        done(sensor);
    }

    #[test]
    fn white_channel_and_interrupt_status() {
        let mut expectations = init_transactions().to_vec();
        expectations.push(I2cTransaction::write_read(0x10, vec![0x05], vec![0xCD, 0xAB]));
        expectations.push(I2cTransaction::write_read(0x10, vec![0x06], vec![0x00, 0x40]));
        let mut sensor = sensor(&expectations, Settings::default());
        sensor.initialize().unwrap();

        assert_eq!(sensor.read_white().unwrap(), 0xABCD);
        let status = sensor.interrupt_status().unwrap();
        assert!(status.high_threshold);
        assert!(!status.low_threshold);
        done(sensor);
    }

    #[test]
    fn bad_address_is_reported_not_panicked() {
        let mut sensor = Veml7700::new(I2cRegisterBus::new(I2cMock::new(&[])), 0x90, Settings::default());

        assert_eq!(
            sensor.initialize().unwrap_err(),
            Veml7700Error::Write(BusError::InvalidAddress(0x90))
        );
        done(sensor);
    }
}
