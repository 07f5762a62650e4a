//! Named components around the drivers, as listed in the config.

use embedded_hal::delay::DelayNs;
use log::{info, warn};
use regbus::{I2cRegisterBus, RegisterBus};
use seesaw::{SoilError, SoilReading, SoilSensor};
use serde::Serialize;
use veml7700::{LuxReading, Settings, Veml7700, Veml7700Error};

use crate::config::ComponentSpec;
use crate::error::Error;
use crate::platform::{self, Delay, I2cBus};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Readings {
    Light(LuxReading),
    Soil(SoilReading),
}

pub struct LuxComponent<Bus> {
    name: String,
    driver: Veml7700<Bus>,
}

impl<Bus: RegisterBus> LuxComponent<Bus> {
    /// Builds and initializes the sensor. A sensor that can't be configured
    /// is not handed out.
    pub fn new(name: String, bus: Bus, address: u8, settings: Settings) -> Result<Self, Veml7700Error<Bus::Error>> {
        let mut driver = Veml7700::new(bus, address, settings);
        driver.initialize()?;
        Ok(Self { name, driver })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn readings(&mut self) -> Result<LuxReading, Veml7700Error<Bus::Error>> {
        self.driver.read_lux()
    }
}

pub struct SoilComponent<Bus, D> {
    name: String,
    driver: SoilSensor<Bus, D>,
}

impl<Bus: RegisterBus, D: DelayNs> SoilComponent<Bus, D> {
    pub fn new(name: String, bus: Bus, delay: D, address: u8) -> Self {
        Self {
            name,
            driver: SoilSensor::new(bus, delay, address),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn readings(&mut self) -> Result<SoilReading, SoilError<Bus::Error>> {
        self.driver.read_all()
    }
}

type PlatformBus = I2cRegisterBus<I2cBus>;

pub enum Component {
    Lux(LuxComponent<PlatformBus>),
    Soil(SoilComponent<PlatformBus, Delay>),
}

impl Component {
    pub fn build(spec: ComponentSpec) -> Result<Self, Error> {
        match spec {
            ComponentSpec::Lux {
                name,
                bus,
                address,
                settings,
            } => {
                let i2c = open(&name, bus)?;
                match LuxComponent::new(name.clone(), I2cRegisterBus::new(i2c), address, settings) {
                    Ok(component) => {
                        info!("{}: lux sensor ready at 0x{:02X}", name, address);
                        Ok(Component::Lux(component))
                    }
                    Err(source) => Err(Error::Light { name, source }),
                }
            }
            ComponentSpec::Soil { name, bus, address } => {
                let i2c = open(&name, bus)?;
                info!("{}: soil sensor at 0x{:02X}", name, address);
                Ok(Component::Soil(SoilComponent::new(name, I2cRegisterBus::new(i2c), Delay, address)))
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Component::Lux(component) => component.name(),
            Component::Soil(component) => component.name(),
        }
    }

    pub fn readings(&mut self) -> Result<Readings, Error> {
        let result = match self {
            Component::Lux(component) => component.readings().map(Readings::Light).map_err(|source| Error::Light {
                name: component.name().to_string(),
                source,
            }),
            Component::Soil(component) => component.readings().map(Readings::Soil).map_err(|source| Error::Soil {
                name: component.name().to_string(),
                source,
            }),
        };

        if let Err(err) = &result {
            warn!("{}", err);
        }
        result
    }
}

fn open(name: &str, bus: String) -> Result<I2cBus, Error> {
    platform::open_bus(&bus).map_err(|source| Error::OpenBus {
        name: name.to_string(),
        bus,
        source,
    })
}
