//! Byte sink between the driver and the I/O expander.

use core::fmt::Debug;

use embedded_hal::i2c::I2c;

/// Writes single bytes to the expander's output port. No retries, no buffering.
pub trait Transport {
    type Error: Debug;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        (**self).write_byte(byte)
    }
}

/// Async counterpart of [`Transport`].
#[cfg(feature = "async")]
#[allow(async_fn_in_trait)]
pub trait AsyncTransport {
    type Error: Debug;

    async fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error>;
}

/// PCF8574 at a fixed address on an I2C bus.
///
/// Dropping or [releasing](I2cTransport::release) it closes the device; both consume the
/// transport so it cannot be closed twice.
#[derive(Debug)]
pub struct I2cTransport<I> {
    i2c: I,
    address: u8,
}

impl<I> I2cTransport<I> {
    /// Wrap an already opened bus. See [this site][lcd address] to find the address of a module.
    ///
    /// [lcd address]: https://www.ardumotive.com/i2clcden.html
    pub fn new(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Hand the bus back.
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> Transport for I2cTransport<I> {
    type Error = I::Error;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.i2c.write(self.address, &[byte])
    }
}

#[cfg(feature = "async")]
impl<I: embedded_hal_async::i2c::I2c> AsyncTransport for I2cTransport<I> {
    type Error = I::Error;

    async fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.i2c.write(self.address, &[byte]).await
    }
}

#[cfg(feature = "rppal")]
impl I2cTransport<rppal::i2c::I2c> {
    /// Open `/dev/i2c-<bus>` and target the expander at `address`.
    pub fn open(bus: u8, address: u8) -> Result<Self, rppal::i2c::Error> {
        let i2c = rppal::i2c::I2c::with_bus(bus)?;
        log::debug!("opened /dev/i2c-{} for expander at {:#04x}", bus, address);
        Ok(Self::new(i2c, address))
    }
}
