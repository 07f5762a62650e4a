//! Scoped register access for small I2C peripherals.
//!
//! Drivers never hold on to a bus handle. Every operation opens a handle for
//! the peripheral address, does its writes and reads, and lets the handle drop,
//! which closes it again. That keeps cleanup local to each transaction, even
//! when a step fails halfway through.
//!
//! ```ignore
//! use regbus::{I2cRegisterBus, RegisterBus, RegisterHandle};
//!
//! // depends on your board/chip
//! let i2c = todo!("Create the I2C interface");
//! let mut bus = I2cRegisterBus::new(i2c);
//!
//! let mut handle = bus.open_handle(0x10)?;
//! handle.write_register(0x00, &[0x18, 0x01])?;
//! let mut data = [0u8; 2];
//! handle.read_register(0x04, &mut data)?;
//! // handle closed here
//! ```

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

use core::fmt;

mod i2c;
mod transaction;

pub use crate::i2c::{I2cHandle, I2cRegisterBus, MAX_FRAME_LEN};
pub use crate::transaction::{execute, Command, TransactionError};

/// Something that hands out per-address register handles.
pub trait RegisterBus {
    type Error: fmt::Debug;

    type Handle<'a>: RegisterHandle<Error = Self::Error>
    where
        Self: 'a;

    /// Opens a handle to the peripheral at `address`.
    ///
    /// The handle borrows the bus, so only one can be open at a time.
    fn open_handle(&mut self, address: u8) -> Result<Self::Handle<'_>, Self::Error>;
}

/// An open connection to one peripheral. Dropping it closes it.
pub trait RegisterHandle {
    type Error: fmt::Debug;

    /// Raw write, no register prefix.
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Writes `bytes` to `register`, the register address going out first.
    fn write_register(&mut self, register: u8, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Selects `register` and reads `buffer.len()` bytes back.
    fn read_register(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Closes the handle. Same as dropping it.
    fn close(self)
    where
        Self: Sized,
    {
    }
}

/// Errors from [`I2cRegisterBus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError<E> {
    /// The underlying I2C transfer failed
    Transport(E),
    /// Not a 7-bit address
    InvalidAddress(u8),
    /// Register address plus payload does not fit in one write frame
    FrameTooLong(usize),
}

impl<E> From<E> for BusError<E> {
    fn from(err: E) -> Self {
        BusError::Transport(err)
    }
}

impl<E: fmt::Display> fmt::Display for BusError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Transport(err) => write!(f, "i2c transfer failed: {}", err),
            BusError::InvalidAddress(addr) => write!(f, "0x{:02X} is not a 7-bit i2c address", addr),
            BusError::FrameTooLong(len) => {
                write!(f, "write frame of {} bytes exceeds {} bytes", len, MAX_FRAME_LEN)
            }
        }
    }
}

impl<E: fmt::Debug + fmt::Display> core::error::Error for BusError<E> {}
