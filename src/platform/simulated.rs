//! In-process stand-ins for the two sensors, answering on their default
//! addresses the way the real parts answer the drivers.

use std::time::{Duration, Instant};

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use fixed::types::U16F16;
use log::{debug, trace, warn};

const ALS_CONF: u8 = 0x00;
const POWER_SAVING: u8 = 0x03;
const ALS: u8 = 0x04;
const WHITE: u8 = 0x05;
const ALS_INT: u8 = 0x06;

const STATUS_TEMP: (u8, u8) = (0x00, 0x04);
const TOUCH_CHANNEL: (u8, u8) = (0x0F, 0x10);

pub struct SimulatedI2c {
    light: MockLightSensor,
    soil: MockSoilSensor,
}

struct MockLightSensor {
    registers: [u16; 7],
    pointer: u8,
    als: u16,
    white: u16,
}

struct MockSoilSensor {
    pending: Option<(u8, u8)>,
    commanded_at: Instant,
    temperature: U16F16,
    moisture: u16,
}

impl SimulatedI2c {
    pub fn new() -> Self {
        Self {
            light: MockLightSensor {
                registers: [0; 7],
                pointer: 0,
                als: 1200,
                white: 1500,
            },
            soil: MockSoilSensor {
                pending: None,
                commanded_at: Instant::now(),
                temperature: U16F16::from_num(21.5),
                moisture: 620,
            },
        }
    }

    pub fn with_light(mut self, als: u16, white: u16) -> Self {
        self.light.als = als;
        self.light.white = white;
        self
    }

    pub fn with_soil(mut self, temperature_c: f32, moisture: u16) -> Self {
        self.soil.temperature = U16F16::saturating_from_num(temperature_c);
        self.soil.moisture = moisture;
        self
    }
}

impl Default for SimulatedI2c {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLightSensor {
    fn running(&self) -> bool {
        self.registers[ALS_CONF as usize] & 0x0001 != 0
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), ErrorKind> {
        let (&register, value) = bytes.split_first().ok_or(ErrorKind::Other)?;
        if register > ALS_INT {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
        }
        self.pointer = register;

        match value {
            [] => Ok(()),
            [high, low] if register <= POWER_SAVING => {
                self.registers[register as usize] = u16::from_be_bytes([*high, *low]);
                trace!("veml7700 register {:#04x} <- {:#06x}", register, self.registers[register as usize]);
                Ok(())
            }
            _ => Err(ErrorKind::Other),
        }
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<(), ErrorKind> {
        let value = match self.pointer {
            ALS if self.running() => self.als,
            WHITE if self.running() => self.white,
            ALS | WHITE | ALS_INT => 0,
            register => self.registers[register as usize],
        };

        match buffer {
            [low, high] => {
                [*low, *high] = value.to_le_bytes();
                Ok(())
            }
            _ => Err(ErrorKind::Other),
        }
    }
}

impl MockSoilSensor {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ErrorKind> {
        match *bytes {
            [module, function] => {
                self.pending = Some((module, function));
                self.commanded_at = Instant::now();
                Ok(())
            }
            [_register] => Ok(()),
            _ => Err(ErrorKind::Other),
        }
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<(), ErrorKind> {
        let settle = Duration::from_micros(u64::from(seesaw::SETTLE_US));
        if self.commanded_at.elapsed() < settle {
            warn!("seesaw read {:?} after command, result not ready", self.commanded_at.elapsed());
            return Err(ErrorKind::Other);
        }

        match (self.pending.take(), buffer.len()) {
            (Some(STATUS_TEMP), 4) => buffer.copy_from_slice(&self.temperature.to_be_bytes()),
            (Some(TOUCH_CHANNEL), 2) => buffer.copy_from_slice(&self.moisture.to_be_bytes()),
            (pending, len) => {
                debug!("seesaw has no {} byte result for {:?}", len, pending);
                return Err(ErrorKind::Other);
            }
        }
        Ok(())
    }
}

impl ErrorType for SimulatedI2c {
    type Error = ErrorKind;
}

impl I2c for SimulatedI2c {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        for operation in operations {
            match (address, operation) {
                (veml7700::DEFAULT_ADDRESS, Operation::Write(bytes)) => self.light.write(bytes)?,
                (veml7700::DEFAULT_ADDRESS, Operation::Read(buffer)) => self.light.read(buffer)?,
                (seesaw::DEFAULT_ADDRESS, Operation::Write(bytes)) => self.soil.write(bytes)?,
                (seesaw::DEFAULT_ADDRESS, Operation::Read(buffer)) => self.soil.read(buffer)?,
                _ => return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)),
            }
        }
        Ok(())
    }
}
