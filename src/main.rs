use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[allow(unused_imports)]
use log::{debug, error, info, warn};
use serde::Serialize;

mod config;
mod error;
mod platform;
mod sensors;

use config::Config;
use error::Error;
use sensors::{Component, Readings};

#[derive(Debug, Serialize)]
struct ReadingLine<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    readings: Option<Readings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{}", err);
            ExitCode::from(2)
        }
    }
}

/// `Ok(false)` when at least one reading failed
fn run() -> Result<bool, Error> {
    let path = env::args_os().nth(1).map(PathBuf::from).ok_or(Error::Usage)?;
    let config = Config::load(&path)?;
    let specs = config.validate()?;
    info!("{} components in {}", specs.len(), path.display());

    let mut components = Vec::with_capacity(specs.len());
    for spec in specs {
        debug!("building {}", spec.name());
        components.push(Component::build(spec)?);
    }

    let mut all_ok = true;
    let mut stdout = io::stdout().lock();
    for component in &mut components {
        let line = match component.readings() {
            Ok(readings) => ReadingLine {
                name: component.name(),
                readings: Some(readings),
                error: None,
            },
            Err(err) => {
                all_ok = false;
                ReadingLine {
                    name: component.name(),
                    readings: None,
                    error: Some(err.to_string()),
                }
            }
        };
        // a closed stdout leaves nothing to report to
        let _ = serde_json::to_writer(&mut stdout, &line).and_then(|()| writeln!(stdout).map_err(serde_json::Error::io));
    }

    Ok(all_ok)
}
