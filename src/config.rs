//! Component list, loaded from a JSON file.
//!
//! ```json
//! {
//!     "components": [
//!         { "name": "lux", "model": "lux-sensor", "attributes": { "i2c_bus": "1", "gain": "1/8" } },
//!         { "name": "soil", "model": "soil-sensor", "attributes": { "i2c_bus": "1" } }
//!     ]
//! }
//! ```
//!
//! `attributes` are only decoded once the model is known, so a misspelled
//! attribute is reported against the component it belongs to.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use veml7700::{Gain, IntegrationTime, InvalidSettingValue, Persistence, PowerSave, PowerSaveMode, Settings};

use crate::error::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("{path}: \"{field}\" is required")]
    FieldRequired { path: String, field: &'static str },
    #[error("{path}: {message}")]
    InvalidSettingValue {
        path: String,
        field: &'static str,
        message: String,
    },
    #[error("{path}: i2c_addr {addr} is not a 7-bit address")]
    InvalidAddress { path: String, addr: i64 },
    #[error("{path}: bad attributes: {message}")]
    Attributes { path: String, message: String },
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub components: Vec<ComponentConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ComponentConfig {
    pub name: String,
    pub model: Model,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Model {
    LuxSensor,
    SoilSensor,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LuxConfig {
    #[serde(default)]
    pub i2c_bus: String,
    pub i2c_addr: Option<i64>,
    pub gain: Option<String>,
    pub integration_time: Option<i64>,
    pub persistence: Option<i64>,
    pub power_save_mode: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SoilConfig {
    #[serde(default)]
    pub i2c_bus: String,
    pub i2c_addr: Option<i64>,
}

/// A validated component, ready to be built
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentSpec {
    Lux {
        name: String,
        bus: String,
        address: u8,
        settings: Settings,
    },
    Soil {
        name: String,
        bus: String,
        address: u8,
    },
}

impl ComponentSpec {
    pub fn name(&self) -> &str {
        match self {
            ComponentSpec::Lux { name, .. } | ComponentSpec::Soil { name, .. } => name,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Validates every component, stopping at the first bad one.
    pub fn validate(&self) -> Result<Vec<ComponentSpec>, ConfigValidationError> {
        self.components
            .iter()
            .enumerate()
            .map(|(index, component)| component.validate(&format!("components.{}", index)))
            .collect()
    }
}

impl ComponentConfig {
    pub fn validate(&self, path: &str) -> Result<ComponentSpec, ConfigValidationError> {
        if self.name.is_empty() {
            return Err(ConfigValidationError::FieldRequired {
                path: path.to_string(),
                field: "name",
            });
        }

        match self.model {
            Model::LuxSensor => {
                let attributes: LuxConfig = self.attributes(path)?;
                Ok(ComponentSpec::Lux {
                    name: self.name.clone(),
                    bus: required_bus(path, &attributes.i2c_bus)?,
                    address: address(path, attributes.i2c_addr, veml7700::DEFAULT_ADDRESS)?,
                    settings: attributes.settings(path)?,
                })
            }
            Model::SoilSensor => {
                let attributes: SoilConfig = self.attributes(path)?;
                Ok(ComponentSpec::Soil {
                    name: self.name.clone(),
                    bus: required_bus(path, &attributes.i2c_bus)?,
                    address: address(path, attributes.i2c_addr, seesaw::DEFAULT_ADDRESS)?,
                })
            }
        }
    }

    fn attributes<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ConfigValidationError> {
        serde_json::from_value(Value::Object(self.attributes.clone())).map_err(|err| {
            ConfigValidationError::Attributes {
                path: path.to_string(),
                message: err.to_string(),
            }
        })
    }
}

impl LuxConfig {
    /// Unset, empty and zero values keep the driver defaults.
    pub fn settings(&self, path: &str) -> Result<Settings, ConfigValidationError> {
        let mut settings = Settings::default();

        if let Some(gain) = self.gain.as_deref().filter(|gain| !gain.is_empty()) {
            settings.gain = Gain::try_from(gain).map_err(|err| invalid(path, "gain", err))?;
        }
        if let Some(ms) = self.integration_time.filter(|&ms| ms != 0) {
            settings.integration_time = decode(path, "integration_time", ms, ("integration time", IntegrationTime::ACCEPTED), IntegrationTime::from_millis)?;
        }
        if let Some(samples) = self.persistence.filter(|&samples| samples != 0) {
            settings.persistence = decode(path, "persistence", samples, ("persistence", Persistence::ACCEPTED), Persistence::from_samples)?;
        }
        if let Some(mode) = self.power_save_mode.filter(|&mode| mode != 0) {
            let mode = decode(path, "power_save_mode", mode, ("power save mode", PowerSaveMode::ACCEPTED), PowerSaveMode::from_mode)?;
            settings.power_save = PowerSave::Enabled(mode);
        }

        Ok(settings)
    }
}

fn invalid(path: &str, field: &'static str, err: impl ToString) -> ConfigValidationError {
    ConfigValidationError::InvalidSettingValue {
        path: path.to_string(),
        field,
        message: err.to_string(),
    }
}

fn decode<T>(
    path: &str,
    field: &'static str,
    value: i64,
    (setting, accepted): (&'static str, &'static str),
    from: fn(u32) -> Result<T, InvalidSettingValue<u32>>,
) -> Result<T, ConfigValidationError> {
    match u32::try_from(value) {
        Ok(value) => from(value).map_err(|err| invalid(path, field, err)),
        Err(_) => Err(invalid(
            path,
            field,
            InvalidSettingValue {
                setting,
                value,
                accepted,
            },
        )),
    }
}

fn required_bus(path: &str, bus: &str) -> Result<String, ConfigValidationError> {
    if bus.is_empty() {
        return Err(ConfigValidationError::FieldRequired {
            path: path.to_string(),
            field: "i2c_bus",
        });
    }
    Ok(bus.to_string())
}

fn address(path: &str, addr: Option<i64>, default: u8) -> Result<u8, ConfigValidationError> {
    match addr {
        None | Some(0) => Ok(default),
        Some(addr @ 0x01..=0x7F) => Ok(addr as u8),
        Some(addr) => Err(ConfigValidationError::InvalidAddress {
            path: path.to_string(),
            addr,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<ComponentSpec>, ConfigValidationError> {
        let config: Config = serde_json::from_str(json).unwrap();
        config.validate()
    }

    fn lux(attributes: &str) -> Result<ComponentSpec, ConfigValidationError> {
        let json = format!(
            r#"{{"components":[{{"name":"lux","model":"lux-sensor","attributes":{}}}]}}"#,
            attributes
        );
        parse(&json).map(|mut specs| specs.remove(0))
    }

    fn lux_settings(attributes: &str) -> Settings {
        match lux(attributes).unwrap() {
            ComponentSpec::Lux { settings, .. } => settings,
            other => panic!("not a lux sensor: {:?}", other),
        }
    }

    #[test]
    fn minimal_lux_sensor_uses_defaults() {
        assert_eq!(
            lux(r#"{"i2c_bus":"1"}"#).unwrap(),
            ComponentSpec::Lux {
                name: "lux".to_string(),
                bus: "1".to_string(),
                address: 0x10,
                settings: Settings::default(),
            }
        );
    }

    #[test]
    fn configured_settings_take_effect() {
        let settings = lux_settings(r#"{"i2c_bus":"1","gain":"1/8","integration_time":800,"persistence":4,"power_save_mode":2}"#);
        assert_eq!(settings.gain, Gain::x1_8);
        assert_eq!(settings.integration_time, IntegrationTime::ms800);
        assert_eq!(settings.persistence, Persistence::four);
        assert_eq!(settings.power_save, PowerSave::Enabled(PowerSaveMode::mode2));
    }

    #[test]
    fn empty_and_zero_values_mean_default() {
        let settings = lux_settings(r#"{"i2c_bus":"1","i2c_addr":0,"gain":"","integration_time":0,"persistence":0,"power_save_mode":0}"#);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn missing_bus_is_required() {
        assert_eq!(
            lux(r#"{"gain":"2"}"#),
            Err(ConfigValidationError::FieldRequired {
                path: "components.0".to_string(),
                field: "i2c_bus",
            })
        );
        assert!(matches!(
            lux(r#"{"i2c_bus":""}"#),
            Err(ConfigValidationError::FieldRequired { field: "i2c_bus", .. })
        ));
    }

    #[test]
    fn missing_attributes_are_a_missing_bus() {
        let specs = parse(r#"{"components":[{"name":"soil","model":"soil-sensor"}]}"#);
        assert!(matches!(specs, Err(ConfigValidationError::FieldRequired { field: "i2c_bus", .. })));
    }

    #[test]
    fn bad_gain_names_the_accepted_values() {
        let err = lux(r#"{"i2c_bus":"1","gain":"4"}"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "components.0: invalid gain value: 4. Valid values are 1, 2, 1/4, 1/8"
        );
    }

    #[test]
    fn unsupported_integration_time_and_persistence() {
        assert!(matches!(
            lux(r#"{"i2c_bus":"1","integration_time":150}"#),
            Err(ConfigValidationError::InvalidSettingValue { field: "integration_time", .. })
        ));
        assert!(matches!(
            lux(r#"{"i2c_bus":"1","integration_time":-100}"#),
            Err(ConfigValidationError::InvalidSettingValue { field: "integration_time", .. })
        ));
        assert!(matches!(
            lux(r#"{"i2c_bus":"1","persistence":3}"#),
            Err(ConfigValidationError::InvalidSettingValue { field: "persistence", .. })
        ));
        assert!(matches!(
            lux(r#"{"i2c_bus":"1","power_save_mode":5}"#),
            Err(ConfigValidationError::InvalidSettingValue { field: "power_save_mode", .. })
        ));
    }

    #[test]
    fn address_must_fit_seven_bits() {
        assert!(matches!(
            lux(r#"{"i2c_bus":"1","i2c_addr":17}"#),
            Ok(ComponentSpec::Lux { address: 0x11, .. })
        ));
        assert_eq!(
            lux(r#"{"i2c_bus":"1","i2c_addr":128}"#),
            Err(ConfigValidationError::InvalidAddress {
                path: "components.0".to_string(),
                addr: 128,
            })
        );
        assert!(matches!(
            lux(r#"{"i2c_bus":"1","i2c_addr":-1}"#),
            Err(ConfigValidationError::InvalidAddress { addr: -1, .. })
        ));
    }

    #[test]
    fn errors_point_at_the_component() {
        let err = parse(
            r#"{"components":[
                {"name":"soil","model":"soil-sensor","attributes":{"i2c_bus":"sim"}},
                {"name":"lux","model":"lux-sensor","attributes":{"i2c_bus":"sim","persistence":5}}
            ]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("components.1: "), "{}", err);
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let specs = parse(r#"{"components":[{"name":"soil","model":"soil-sensor","attributes":{"i2c_bus":"1","gain":"2"}}]}"#);
        assert!(matches!(specs, Err(ConfigValidationError::Attributes { .. })));
    }

    #[test]
    fn soil_sensor_defaults_to_0x36() {
        let specs = parse(r#"{"components":[{"name":"soil","model":"soil-sensor","attributes":{"i2c_bus":"sim"}}]}"#).unwrap();
        assert_eq!(
            specs,
            vec![ComponentSpec::Soil {
                name: "soil".to_string(),
                bus: "sim".to_string(),
                address: 0x36,
            }]
        );
    }

    #[test]
    fn unknown_model_fails_to_parse() {
        let result: Result<Config, _> =
            serde_json::from_str(r#"{"components":[{"name":"x","model":"pressure-sensor"}]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn nameless_component_is_rejected() {
        assert!(matches!(
            parse(r#"{"components":[{"name":"","model":"soil-sensor","attributes":{"i2c_bus":"1"}}]}"#),
            Err(ConfigValidationError::FieldRequired { field: "name", .. })
        ));
    }
}
