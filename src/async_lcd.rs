use embedded_hal_async::delay::DelayNs;
use log::{debug, trace};

use crate::command::{
    self, timing, Command, EntryMode, Register, ShiftDirection, ShiftTarget, BOOT_4BIT, BOOT_8BIT,
};
use crate::transport::AsyncTransport;
use crate::{Backlight, Config, DisplayControl, DisplayState, Error, Font, Invalid};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum AddressCounter {
    Ddram,
    Cgram,
}

/// API to write to the LCD.
///
/// Same wire traffic and pacing as [`crate::sync_lcd::Lcd`]; waits are awaited instead of spun.
pub struct Lcd<T, D>
where
    T: AsyncTransport,
    D: DelayNs,
{
    transport: T,
    delay: D,
    config: Config,
    backlight_state: Backlight,
    display_state: DisplayState,
    counter: AddressCounter,
}

impl<T, D> Lcd<T, D>
where
    T: AsyncTransport,
    D: DelayNs,
{
    /// Create new instance with only the transport and delay instance.
    pub fn new(transport: T, delay: D) -> Self {
        Self {
            transport,
            delay,
            config: Config::default(),
            backlight_state: Backlight::On,
            display_state: DisplayState::default(),
            counter: AddressCounter::Ddram,
        }
    }

    pub fn with_columns(mut self, columns: u8) -> Self {
        self.config = self.config.with_columns(columns);
        self
    }

    pub fn with_rows(mut self, rows: u8) -> Self {
        self.config = self.config.with_rows(rows);
        self
    }

    pub fn with_font(mut self, font: Font) -> Self {
        self.config = self.config.with_font(font);
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_backlight(mut self, backlight: Backlight) -> Self {
        self.backlight_state = backlight;
        self
    }

    /// Initializes the hardware. See [`crate::sync_lcd::Lcd::init`].
    pub async fn init(mut self) -> Result<Self, Error<T::Error>> {
        self.config.validate()?;
        debug!(
            "initialising {}x{} display, {:?}",
            self.config.columns(),
            self.config.rows(),
            self.config.font()
        );

        self.delay.delay_ms(timing::POWER_ON_MS).await;

        self.write_nibble(BOOT_8BIT, Register::Command).await?;
        self.delay.delay_ms(timing::FIRST_BOOT_MS).await;
        self.write_nibble(BOOT_8BIT, Register::Command).await?;
        self.delay.delay_us(timing::SECOND_BOOT_US).await;
        self.write_nibble(BOOT_8BIT, Register::Command).await?;

        self.write_nibble(BOOT_4BIT, Register::Command).await?;

        self.command(self.config.function_set()).await?;

        self.display_state = DisplayState::default();
        self.update_display_control().await?;
        self.command(Command::EntryModeSet.with(EntryMode::Increment as u8))
            .await?;
        self.clear().await?;
        debug!("display ready");
        Ok(self)
    }

    pub fn close(self) -> (T, D) {
        (self.transport, self.delay)
    }

    pub fn config(&self) -> Config {
        self.config
    }

    pub fn backlight_state(&self) -> Backlight {
        self.backlight_state
    }

    pub fn display_control(&self) -> DisplayState {
        self.display_state
    }

    async fn bus_write(&mut self, byte: u8) -> Result<(), Error<T::Error>> {
        self.transport.write_byte(byte).await.map_err(Error::Io)
    }

    async fn write_nibble(&mut self, nibble: u8, register: Register) -> Result<(), Error<T::Error>> {
        for frame in command::nibble_frames(nibble, register, self.backlight_state) {
            self.bus_write(frame).await?;
        }
        self.delay.delay_us(timing::SETTLE_US).await;
        Ok(())
    }

    async fn send(&mut self, value: u8, register: Register) -> Result<(), Error<T::Error>> {
        trace!("send {:#04x} to {:?} register", value, register);
        self.write_nibble(value >> 4, register).await?;
        self.write_nibble(value & 0x0f, register).await
    }

    async fn command(&mut self, value: u8) -> Result<(), Error<T::Error>> {
        self.send(value, Register::Command).await
    }

    async fn data(&mut self, value: u8) -> Result<(), Error<T::Error>> {
        if self.counter == AddressCounter::Cgram {
            return Err(Invalid::CgramAddressed.into());
        }
        self.send(value, Register::Data).await
    }

    pub async fn backlight(&mut self, backlight: Backlight) -> Result<(), Error<T::Error>> {
        debug!("backlight {:?}", backlight);
        self.backlight_state = backlight;
        self.bus_write(backlight as u8).await
    }

    pub async fn enable_backlight(&mut self) -> Result<(), Error<T::Error>> {
        self.backlight(Backlight::On).await
    }

    pub async fn disable_backlight(&mut self) -> Result<(), Error<T::Error>> {
        self.backlight(Backlight::Off).await
    }

    pub async fn toggle_backlight(&mut self) -> Result<(), Error<T::Error>> {
        self.backlight(self.backlight_state.toggled()).await
    }

    /// Write string to display.
    pub async fn write_str(&mut self, data: &str) -> Result<(), Error<T::Error>> {
        for c in data.chars() {
            self.data(c as u8).await?;
        }
        Ok(())
    }

    pub async fn write_raw(&mut self, code: u8) -> Result<(), Error<T::Error>> {
        self.data(code).await
    }

    pub async fn print(&mut self, data: &str, row: u8, col: u8) -> Result<(), Error<T::Error>> {
        self.set_cursor(row, col).await?;
        self.write_str(data).await
    }

    pub async fn print_raw(&mut self, code: u8, row: u8, col: u8) -> Result<(), Error<T::Error>> {
        self.set_cursor(row, col).await?;
        self.write_raw(code).await
    }

    /// Clear the display
    pub async fn clear(&mut self) -> Result<(), Error<T::Error>> {
        self.command(Command::Clear.bits()).await?;
        self.delay.delay_ms(timing::CLEAR_MS).await;
        self.counter = AddressCounter::Ddram;
        Ok(())
    }

    /// Return cursor to upper left corner, i.e. (0,0).
    pub async fn return_home(&mut self) -> Result<(), Error<T::Error>> {
        self.command(Command::ReturnHome.bits()).await?;
        self.delay.delay_ms(timing::CLEAR_MS).await;
        self.counter = AddressCounter::Ddram;
        Ok(())
    }

    /// Set the cursor to (row, col). Coordinates are zero-based.
    pub async fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), Error<T::Error>> {
        let address = self.config.cursor_address(row, col)?;
        self.command(address).await?;
        self.counter = AddressCounter::Ddram;
        Ok(())
    }

    /// Store a glyph in CGRAM slot `location & 7`. Position the cursor before writing again.
    pub async fn upload_custom_char(
        &mut self,
        location: u8,
        glyph: &[u8; 8],
    ) -> Result<(), Error<T::Error>> {
        self.command(command::cgram_address(location)).await?;
        self.counter = AddressCounter::Cgram;
        for &row in glyph {
            self.send(row, Register::Data).await?;
        }
        Ok(())
    }

    async fn update_display_control(&mut self) -> Result<(), Error<T::Error>> {
        self.command(Command::DisplayControl.with(self.display_state.bits()))
            .await
    }

    async fn set_display_flag(
        &mut self,
        flag: DisplayControl,
        on: bool,
    ) -> Result<(), Error<T::Error>> {
        debug!("{:?} {}", flag, if on { "on" } else { "off" });
        self.display_state = self.display_state.with(flag, on);
        self.update_display_control().await
    }

    pub async fn display_on(&mut self) -> Result<(), Error<T::Error>> {
        self.set_display_flag(DisplayControl::Display, true).await
    }

    pub async fn display_off(&mut self) -> Result<(), Error<T::Error>> {
        self.set_display_flag(DisplayControl::Display, false).await
    }

    pub async fn toggle_display(&mut self) -> Result<(), Error<T::Error>> {
        let on = self.display_state.contains(DisplayControl::Display);
        self.set_display_flag(DisplayControl::Display, !on).await
    }

    pub async fn cursor_on(&mut self) -> Result<(), Error<T::Error>> {
        self.set_display_flag(DisplayControl::Cursor, true).await
    }

    pub async fn cursor_off(&mut self) -> Result<(), Error<T::Error>> {
        self.set_display_flag(DisplayControl::Cursor, false).await
    }

    pub async fn toggle_cursor(&mut self) -> Result<(), Error<T::Error>> {
        let on = self.display_state.contains(DisplayControl::Cursor);
        self.set_display_flag(DisplayControl::Cursor, !on).await
    }

    pub async fn blink_on(&mut self) -> Result<(), Error<T::Error>> {
        self.set_display_flag(DisplayControl::Blink, true).await
    }

    pub async fn blink_off(&mut self) -> Result<(), Error<T::Error>> {
        self.set_display_flag(DisplayControl::Blink, false).await
    }

    pub async fn toggle_blink(&mut self) -> Result<(), Error<T::Error>> {
        let on = self.display_state.contains(DisplayControl::Blink);
        self.set_display_flag(DisplayControl::Blink, !on).await
    }

    async fn shift(
        &mut self,
        target: ShiftTarget,
        direction: ShiftDirection,
    ) -> Result<(), Error<T::Error>> {
        self.command(Command::Shift.with(target as u8 | direction as u8))
            .await
    }

    /// Scrolls the display one char to the left
    pub async fn scroll_display_left(&mut self) -> Result<(), Error<T::Error>> {
        self.shift(ShiftTarget::Display, ShiftDirection::Left).await
    }

    /// Scrolls the display one char to the right
    pub async fn scroll_display_right(&mut self) -> Result<(), Error<T::Error>> {
        self.shift(ShiftTarget::Display, ShiftDirection::Right).await
    }

    /// Moves the cursor one char to the left
    pub async fn scroll_cursor_left(&mut self) -> Result<(), Error<T::Error>> {
        self.shift(ShiftTarget::Cursor, ShiftDirection::Left).await
    }

    /// Moves the cursor one char to the right
    pub async fn scroll_cursor_right(&mut self) -> Result<(), Error<T::Error>> {
        self.shift(ShiftTarget::Cursor, ShiftDirection::Right).await
    }
}
