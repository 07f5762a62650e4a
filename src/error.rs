use std::io;
use std::path::PathBuf;

use regbus::BusError;
use seesaw::SoilError;
use thiserror::Error;
use veml7700::Veml7700Error;

use crate::config::ConfigValidationError;
use crate::platform::{I2cError, OpenError};

pub type PlatformBusError = BusError<I2cError>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("usage: stemma <config.json>")]
    Usage,
    #[error("failed to read config {path:?}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config: {0}")]
    ParseConfig(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Config(#[from] ConfigValidationError),
    #[error("{name}: failed to open i2c bus {bus:?}: {source}")]
    OpenBus {
        name: String,
        bus: String,
        #[source]
        source: OpenError,
    },
    #[error("{name}: {source}")]
    Light {
        name: String,
        #[source]
        source: Veml7700Error<PlatformBusError>,
    },
    #[error("{name}: {source}")]
    Soil {
        name: String,
        #[source]
        source: SoilError<PlatformBusError>,
    },
}
