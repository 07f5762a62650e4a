//! I2C transport selection.
//!
//! `"sim"` always gives the simulated bus, anything else is a real bus of the
//! host.

use std::fmt;

use embedded_hal::i2c::{self, Error as _, ErrorKind, ErrorType, I2c, Operation};
use thiserror::Error;

#[cfg(target_os = "linux")]
mod linux;
mod simulated;

pub use simulated::SimulatedI2c;

#[cfg(target_os = "linux")]
pub use linux_embedded_hal::Delay;

/// Blocking delay for hosts without linux-embedded-hal
#[cfg(not(target_os = "linux"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct Delay;

#[cfg(not(target_os = "linux"))]
impl embedded_hal::delay::DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}

pub const SIMULATED_BUS: &str = "sim";

#[derive(Debug, Error)]
pub enum OpenError {
    #[error("i2c bus {0:?} is not available on this platform")]
    Unsupported(String),
    #[cfg(target_os = "linux")]
    #[error(transparent)]
    Linux(#[from] linux_embedded_hal::i2cdev::linux::LinuxI2CError),
}

pub enum I2cBus {
    #[cfg(target_os = "linux")]
    Linux(linux_embedded_hal::I2cdev),
    Simulated(SimulatedI2c),
}

#[derive(Debug)]
pub enum I2cError {
    #[cfg(target_os = "linux")]
    Linux(linux_embedded_hal::I2CError),
    Simulated(ErrorKind),
}

impl fmt::Display for I2cError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(target_os = "linux")]
            I2cError::Linux(err) => write!(f, "{}", err),
            I2cError::Simulated(kind) => write!(f, "simulated bus: {}", kind),
        }
    }
}

impl std::error::Error for I2cError {}

impl i2c::Error for I2cError {
    fn kind(&self) -> ErrorKind {
        match self {
            #[cfg(target_os = "linux")]
            I2cError::Linux(err) => err.kind(),
            I2cError::Simulated(kind) => *kind,
        }
    }
}

impl ErrorType for I2cBus {
    type Error = I2cError;
}

impl I2c for I2cBus {
    fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Self::Error> {
        match self {
            #[cfg(target_os = "linux")]
            I2cBus::Linux(dev) => dev.read(address, read).map_err(I2cError::Linux),
            I2cBus::Simulated(sim) => sim.read(address, read).map_err(I2cError::Simulated),
        }
    }

    fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Self::Error> {
        match self {
            #[cfg(target_os = "linux")]
            I2cBus::Linux(dev) => dev.write(address, write).map_err(I2cError::Linux),
            I2cBus::Simulated(sim) => sim.write(address, write).map_err(I2cError::Simulated),
        }
    }

    fn write_read(&mut self, address: u8, write: &[u8], read: &mut [u8]) -> Result<(), Self::Error> {
        match self {
            #[cfg(target_os = "linux")]
            I2cBus::Linux(dev) => dev.write_read(address, write, read).map_err(I2cError::Linux),
            I2cBus::Simulated(sim) => sim.write_read(address, write, read).map_err(I2cError::Simulated),
        }
    }

    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        match self {
            #[cfg(target_os = "linux")]
            I2cBus::Linux(dev) => dev.transaction(address, operations).map_err(I2cError::Linux),
            I2cBus::Simulated(sim) => sim.transaction(address, operations).map_err(I2cError::Simulated),
        }
    }
}

/// Opens the bus named in a component's `i2c_bus` attribute.
pub fn open_bus(id: &str) -> Result<I2cBus, OpenError> {
    if id == SIMULATED_BUS {
        return Ok(I2cBus::Simulated(SimulatedI2c::new()));
    }
    open_native(id)
}

#[cfg(target_os = "linux")]
fn open_native(id: &str) -> Result<I2cBus, OpenError> {
    Ok(I2cBus::Linux(linux::open(id)?))
}

#[cfg(not(target_os = "linux"))]
fn open_native(id: &str) -> Result<I2cBus, OpenError> {
    Err(OpenError::Unsupported(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_is_always_available() {
        assert!(matches!(open_bus(SIMULATED_BUS), Ok(I2cBus::Simulated(_))));
    }

    #[test]
    fn simulated_errors_keep_their_kind() {
        let mut bus = open_bus(SIMULATED_BUS).unwrap();
        let err = bus.write(0x42, &[0x00]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::NoAcknowledge(_)));
        assert!(err.to_string().starts_with("simulated bus"));
    }
}
