use core::fmt;

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::{RegisterBus, RegisterHandle};

/// A write-wait-read exchange with firmware driven peripherals.
///
/// The command goes out as a plain write, then the device gets `settle_us` to
/// put the result in place before `result_register` is read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command<'a> {
    pub bytes: &'a [u8],
    pub result_register: u8,
    pub settle_us: u32,
}

/// Which half of a [`Command`] failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransactionError<E> {
    /// Opening the handle or writing the command
    Write(E),
    /// Reading the result register
    Read(E),
}

impl<E: fmt::Display> fmt::Display for TransactionError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionError::Write(err) => write!(f, "command write failed: {}", err),
            TransactionError::Read(err) => write!(f, "result read failed: {}", err),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> core::error::Error for TransactionError<E> {}

/// Runs `command` against the peripheral at `address` and fills `buffer` with
/// the result.
///
/// A fresh handle is opened for the exchange and closed on every return path.
/// The settle wait is a real blocking delay; reading early gives stale data.
pub fn execute<B, D>(
    bus: &mut B,
    delay: &mut D,
    address: u8,
    command: &Command<'_>,
    buffer: &mut [u8],
) -> Result<(), TransactionError<B::Error>>
where
    B: RegisterBus,
    D: DelayNs,
{
    let mut handle = bus.open_handle(address).map_err(TransactionError::Write)?;

    handle.write(command.bytes).map_err(TransactionError::Write)?;
    delay.delay_us(command.settle_us);
    handle
        .read_register(command.result_register, buffer)
        .map_err(TransactionError::Read)?;

    debug!(
        "0x{:02X} command {:02X?} -> {:02X?}",
        address, command.bytes, buffer
    );
    Ok(())
}
