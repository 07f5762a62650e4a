use embedded_hal::i2c::I2c;
use heapless::Vec;
use log::trace;

use crate::{BusError, RegisterBus, RegisterHandle};

/// Longest register write (register address included) sent in one frame
pub const MAX_FRAME_LEN: usize = 16;

/// [`RegisterBus`] on top of any blocking `embedded-hal` I2C bus.
pub struct I2cRegisterBus<I2C> {
    i2c: I2C,
}

impl<I2C> I2cRegisterBus<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Gives the I2C bus back
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> RegisterBus for I2cRegisterBus<I2C> {
    type Error = BusError<I2C::Error>;

    type Handle<'a>
        = I2cHandle<'a, I2C>
    where
        Self: 'a;

    fn open_handle(&mut self, address: u8) -> Result<Self::Handle<'_>, Self::Error> {
        if address > 0x7F {
            return Err(BusError::InvalidAddress(address));
        }
        trace!("open i2c handle 0x{:02X}", address);
        Ok(I2cHandle {
            i2c: &mut self.i2c,
            address,
        })
    }
}

/// Handle to one address on an [`I2cRegisterBus`]
pub struct I2cHandle<'a, I2C> {
    i2c: &'a mut I2C,
    address: u8,
}

impl<I2C> I2cHandle<'_, I2C> {
    pub fn address(&self) -> u8 {
        self.address
    }
}

impl<I2C: I2c> RegisterHandle for I2cHandle<'_, I2C> {
    type Error = BusError<I2C::Error>;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.i2c.write(self.address, bytes)?;
        Ok(())
    }

    fn write_register(&mut self, register: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        let mut frame: Vec<u8, MAX_FRAME_LEN> = Vec::new();
        // can't fail, frame is empty
        let _ = frame.push(register);
        frame
            .extend_from_slice(bytes)
            .map_err(|_| BusError::FrameTooLong(bytes.len() + 1))?;

        self.i2c.write(self.address, &frame)?;
        Ok(())
    }

    fn read_register(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write_read(self.address, &[register], buffer)?;
        Ok(())
    }
}

impl<I2C> Drop for I2cHandle<'_, I2C> {
    fn drop(&mut self) {
        trace!("close i2c handle 0x{:02X}", self.address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    #[test]
    fn write_register_prefixes_register_address() {
        let expectations = [I2cTransaction::write(0x10, vec![0x00, 0x18, 0x01])];
        let mut bus = I2cRegisterBus::new(I2cMock::new(&expectations));

        let mut handle = bus.open_handle(0x10).unwrap();
        assert_eq!(handle.address(), 0x10);
        handle.write_register(0x00, &[0x18, 0x01]).unwrap();
        handle.close();

        bus.release().done();
    }

    #[test]
    fn raw_write_sends_bytes_unchanged() {
        let expectations = [I2cTransaction::write(0x36, vec![0x0F, 0x10])];
        let mut bus = I2cRegisterBus::new(I2cMock::new(&expectations));

        bus.open_handle(0x36).unwrap().write(&[0x0F, 0x10]).unwrap();

        bus.release().done();
    }

    #[test]
    fn read_register_selects_then_reads() {
        let expectations = [I2cTransaction::write_read(0x10, vec![0x04], vec![0x34, 0x12])];
        let mut bus = I2cRegisterBus::new(I2cMock::new(&expectations));

        let mut data = [0u8; 2];
        bus.open_handle(0x10)
            .unwrap()
            .read_register(0x04, &mut data)
            .unwrap();
        assert_eq!(data, [0x34, 0x12]);

        bus.release().done();
    }

    #[test]
    fn rejects_ten_bit_addresses_without_traffic() {
        let mut bus = I2cRegisterBus::new(I2cMock::new(&[]));

        assert!(matches!(bus.open_handle(0x80), Err(BusError::InvalidAddress(0x80))));

        bus.release().done();
    }

    #[test]
    fn oversized_frame_is_not_sent() {
        let mut bus = I2cRegisterBus::new(I2cMock::new(&[]));

        let payload = [0u8; MAX_FRAME_LEN];
        let err = bus
            .open_handle(0x10)
            .unwrap()
            .write_register(0x00, &payload)
            .unwrap_err();
        assert_eq!(err, BusError::FrameTooLong(MAX_FRAME_LEN + 1));

        bus.release().done();
    }

    #[test]
    fn transport_errors_are_wrapped() {
        let expectations = [I2cTransaction::write(0x10, vec![0x03, 0x00, 0x00]).with_error(ErrorKind::Other)];
        let mut bus = I2cRegisterBus::new(I2cMock::new(&expectations));

        let err = bus
            .open_handle(0x10)
            .unwrap()
            .write_register(0x03, &[0x00, 0x00])
            .unwrap_err();
        assert_eq!(err, BusError::Transport(ErrorKind::Other));

        bus.release().done();
    }
}
