//! Driver for the Adafruit STEMMA soil sensor, a capacitive moisture probe
//! with an on-board temperature sensor behind Microchip's "seesaw" firmware.
//!
//! Every reading is a command/response exchange: a two byte
//! `[module, function]` command is written, the firmware needs a few
//! milliseconds to prepare the answer, and then the result is read back.
//!
//! ```ignore
//! use regbus::I2cRegisterBus;
//! use seesaw::{SoilSensor, DEFAULT_ADDRESS};
//!
//! // depends on your board/chip
//! let i2c = todo!("Create the I2C interface");
//! let delay = todo!("Create a delay that implements `embedded_hal::delay::DelayNs`");
//!
//! let mut sensor = SoilSensor::new(I2cRegisterBus::new(i2c), delay, DEFAULT_ADDRESS);
//! let reading = sensor.read_all().unwrap();
//! ```

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

use core::fmt;

use embedded_hal::delay::DelayNs;
use fixed::types::U16F16;
use log::debug;
use regbus::{Command, RegisterBus, TransactionError};

/// Default I2C address, 0x37-0x39 with the address jumpers
pub const DEFAULT_ADDRESS: u8 = 0x36;

/// Time the firmware needs between command and result, in microseconds
pub const SETTLE_US: u32 = 5_000;

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum Module {
    status = 0x00,
    touch = 0x0F,
}

const STATUS_TEMP: u8 = 0x04;
const TOUCH_CHANNEL_OFFSET: u8 = 0x10;

const TEMPERATURE: Command<'static> = Command {
    bytes: &[Module::status as u8, STATUS_TEMP],
    result_register: Module::status as u8,
    settle_us: SETTLE_US,
};

const MOISTURE: Command<'static> = Command {
    bytes: &[Module::touch as u8, TOUCH_CHANNEL_OFFSET],
    result_register: Module::touch as u8,
    settle_us: SETTLE_US,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SoilError<BusError> {
    /// Opening the handle or sending the command failed
    Write(BusError),
    /// Reading the result failed
    Read(BusError),
}

impl<BusError> From<TransactionError<BusError>> for SoilError<BusError> {
    fn from(err: TransactionError<BusError>) -> Self {
        match err {
            TransactionError::Write(err) => SoilError::Write(err),
            TransactionError::Read(err) => SoilError::Read(err),
        }
    }
}

impl<BusError: fmt::Display> fmt::Display for SoilError<BusError> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoilError::Write(err) => write!(f, "failed to write command to soil sensor: {}", err),
            SoilError::Read(err) => write!(f, "failed to read from soil sensor: {}", err),
        }
    }
}

impl<BusError: fmt::Debug + fmt::Display> core::error::Error for SoilError<BusError> {}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SoilReading {
    /// Temperature: degrees celsius (°C)
    pub temperature_c: f32,
    /// Capacitive moisture index, roughly 200 (dry) to 2000 (wet)
    pub moisture: i32,
}

/// Temperature register: big-endian 16.16 fixed point, °C
pub fn decode_temperature(bytes: [u8; 4]) -> f32 {
    U16F16::from_be_bytes(bytes).to_num::<f32>()
}

/// Moisture register: big-endian u16
pub fn decode_moisture(bytes: [u8; 2]) -> i32 {
    i32::from(u16::from_be_bytes(bytes))
}

pub struct SoilSensor<Bus, Delay> {
    bus: Bus,
    delay: Delay,
    address: u8,
}

impl<Bus: RegisterBus, Delay: DelayNs> SoilSensor<Bus, Delay> {
    pub fn new(bus: Bus, delay: Delay, address: u8) -> Self {
        Self { bus, delay, address }
    }

    pub fn read_temperature(&mut self) -> Result<f32, SoilError<Bus::Error>> {
        let mut data = [0u8; 4];
        regbus::execute(&mut self.bus, &mut self.delay, self.address, &TEMPERATURE, &mut data)?;

        let temperature = decode_temperature(data);
        debug!("soil sensor temperature {:02X?} -> {} C", data, temperature);
        Ok(temperature)
    }

    pub fn read_moisture(&mut self) -> Result<i32, SoilError<Bus::Error>> {
        let mut data = [0u8; 2];
        regbus::execute(&mut self.bus, &mut self.delay, self.address, &MOISTURE, &mut data)?;

        let moisture = decode_moisture(data);
        debug!("soil sensor moisture {:02X?} -> {}", data, moisture);
        Ok(moisture)
    }

    /// Temperature, then moisture. Stops at the first failure.
    pub fn read_all(&mut self) -> Result<SoilReading, SoilError<Bus::Error>> {
        let temperature_c = self.read_temperature()?;
        let moisture = self.read_moisture()?;

        Ok(SoilReading {
            temperature_c,
            moisture,
        })
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Gives the bus and delay back
    pub fn release(self) -> (Bus, Delay) {
        (self.bus, self.delay)
    }
}
