use std::path::PathBuf;

use linux_embedded_hal::i2cdev::linux::LinuxI2CError;
use linux_embedded_hal::I2cdev;
use log::debug;

/// `"1"` is `/dev/i2c-1`, absolute paths are taken as they are
pub fn device_path(id: &str) -> PathBuf {
    if id.starts_with('/') {
        PathBuf::from(id)
    } else {
        PathBuf::from(format!("/dev/i2c-{}", id))
    }
}

pub fn open(id: &str) -> Result<I2cdev, LinuxI2CError> {
    let path = device_path(id);
    debug!("opening i2c bus {}", path.display());
    I2cdev::new(path)
}
