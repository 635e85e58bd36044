use embedded_hal::delay::DelayNs;
use log::{debug, trace};
use ufmt_write::uWrite;

use crate::command::{
    self, timing, Command, EntryMode, Register, ShiftDirection, ShiftTarget, BOOT_4BIT, BOOT_8BIT,
};
use crate::transport::Transport;
use crate::{Backlight, Config, DisplayControl, DisplayState, Error, Font, Invalid};

/// Where the controller's address counter points after the last command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum AddressCounter {
    Ddram,
    Cgram,
}

/// API to write to the LCD.
pub struct Lcd<T, D>
where
    T: Transport,
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
    T: Transport,
    D: DelayNs,
{
    /// Create new instance with only the transport and delay instance. Defaults to a 16x2
    /// module, 5x8 font, backlight on.
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

    /// Number of columns, 16 or 20.
    pub fn with_columns(mut self, columns: u8) -> Self {
        self.config = self.config.with_columns(columns);
        self
    }

    /// Number of rows, 1, 2 or 4.
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

    /// Initializes the hardware.
    ///
    /// The configuration is checked first; nothing is written if it is rejected. Then the
    /// controller is resynchronised from whatever state it powered up in (HD44780 datasheet,
    /// figure 24), switched to 4 bit mode, configured and cleared. It is left with the display
    /// on, cursor and blink off, and the cursor advancing to the right.
    pub fn init(mut self) -> Result<Self, Error<T::Error>> {
        self.config.validate()?;
        debug!(
            "initialising {}x{} display, {:?}",
            self.config.columns(),
            self.config.rows(),
            self.config.font()
        );

        // Initial delay to wait for init after power on.
        self.delay.delay_ms(timing::POWER_ON_MS);

        // Three times 8 bit mode, whatever width the controller believes it has.
        self.write_nibble(BOOT_8BIT, Register::Command)?;
        self.delay.delay_ms(timing::FIRST_BOOT_MS);
        self.write_nibble(BOOT_8BIT, Register::Command)?;
        self.delay.delay_us(timing::SECOND_BOOT_US);
        self.write_nibble(BOOT_8BIT, Register::Command)?;

        // Switch to 4 bit mode
        self.write_nibble(BOOT_4BIT, Register::Command)?;

        // Lines and font can only be latched here.
        self.command(self.config.function_set())?;

        self.display_state = DisplayState::default();
        self.update_display_control()?;
        self.command(Command::EntryModeSet.with(EntryMode::Increment as u8))?;
        self.clear()?;
        debug!("display ready");
        Ok(self)
    }

    /// Release the transport and the delay. Call [`Lcd::clear`] first to blank the screen.
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

    fn bus_write(&mut self, byte: u8) -> Result<(), Error<T::Error>> {
        self.transport.write_byte(byte).map_err(Error::Io)
    }

    fn write_nibble(&mut self, nibble: u8, register: Register) -> Result<(), Error<T::Error>> {
        for frame in command::nibble_frames(nibble, register, self.backlight_state) {
            self.bus_write(frame)?;
        }
        self.delay.delay_us(timing::SETTLE_US);
        Ok(())
    }

    fn send(&mut self, value: u8, register: Register) -> Result<(), Error<T::Error>> {
        trace!("send {:#04x} to {:?} register", value, register);
        self.write_nibble(value >> 4, register)?;
        self.write_nibble(value & 0x0f, register)
    }

    fn command(&mut self, value: u8) -> Result<(), Error<T::Error>> {
        self.send(value, Register::Command)
    }

    fn data(&mut self, value: u8) -> Result<(), Error<T::Error>> {
        if self.counter == AddressCounter::Cgram {
            return Err(Invalid::CgramAddressed.into());
        }
        self.send(value, Register::Data)
    }

    /// Set the backlight. It is carried by every later transfer.
    pub fn backlight(&mut self, backlight: Backlight) -> Result<(), Error<T::Error>> {
        debug!("backlight {:?}", backlight);
        self.backlight_state = backlight;
        self.bus_write(backlight as u8)
    }

    pub fn enable_backlight(&mut self) -> Result<(), Error<T::Error>> {
        self.backlight(Backlight::On)
    }

    pub fn disable_backlight(&mut self) -> Result<(), Error<T::Error>> {
        self.backlight(Backlight::Off)
    }

    pub fn toggle_backlight(&mut self) -> Result<(), Error<T::Error>> {
        self.backlight(self.backlight_state.toggled())
    }

    /// Write string to display at the current cursor position.
    ///
    /// Each character is sent as its low byte. There is no wrapping or clipping: characters past
    /// the last column land wherever the controller's address counter takes them.
    ///
    /// Fails with [`Invalid::CgramAddressed`] right after [`Lcd::upload_custom_char`], because the
    /// text would overwrite glyph rows instead of showing up. Position the cursor first.
    pub fn write_str(&mut self, data: &str) -> Result<(), Error<T::Error>> {
        for c in data.chars() {
            self.data(c as u8)?;
        }
        Ok(())
    }

    /// Write one character code (0..=7 for custom glyphs) at the current cursor position.
    pub fn write_raw(&mut self, code: u8) -> Result<(), Error<T::Error>> {
        self.data(code)
    }

    /// Write string starting at (row, col).
    pub fn print(&mut self, data: &str, row: u8, col: u8) -> Result<(), Error<T::Error>> {
        self.set_cursor(row, col)?;
        self.write_str(data)
    }

    /// Write one character code at (row, col).
    pub fn print_raw(&mut self, code: u8, row: u8, col: u8) -> Result<(), Error<T::Error>> {
        self.set_cursor(row, col)?;
        self.write_raw(code)
    }

    /// Clear the display
    pub fn clear(&mut self) -> Result<(), Error<T::Error>> {
        self.command(Command::Clear.bits())?;
        self.delay.delay_ms(timing::CLEAR_MS);
        self.counter = AddressCounter::Ddram;
        Ok(())
    }

    /// Return cursor to upper left corner, i.e. (0,0).
    pub fn return_home(&mut self) -> Result<(), Error<T::Error>> {
        self.command(Command::ReturnHome.bits())?;
        self.delay.delay_ms(timing::CLEAR_MS);
        self.counter = AddressCounter::Ddram;
        Ok(())
    }

    /// Set the cursor to (row, col). Coordinates are zero-based and must lie on screen.
    pub fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), Error<T::Error>> {
        let address = self.config.cursor_address(row, col)?;
        self.command(address)?;
        self.counter = AddressCounter::Ddram;
        Ok(())
    }

    /// Store a glyph in one of the 8 CGRAM slots. `location` wraps at 8; only the low 5 bits of
    /// each row are shown.
    ///
    /// The address counter is left inside CGRAM, so the next write has to be preceded by
    /// [`Lcd::set_cursor`], [`Lcd::print`], [`Lcd::clear`] or [`Lcd::return_home`].
    pub fn upload_custom_char(
        &mut self,
        location: u8,
        glyph: &[u8; 8],
    ) -> Result<(), Error<T::Error>> {
        self.command(command::cgram_address(location))?;
        self.counter = AddressCounter::Cgram;
        for &row in glyph {
            self.send(row, Register::Data)?;
        }
        Ok(())
    }

    /// Recomputes display control and updates the lcd
    fn update_display_control(&mut self) -> Result<(), Error<T::Error>> {
        self.command(Command::DisplayControl.with(self.display_state.bits()))
    }

    fn set_display_flag(&mut self, flag: DisplayControl, on: bool) -> Result<(), Error<T::Error>> {
        debug!("{:?} {}", flag, if on { "on" } else { "off" });
        self.display_state = self.display_state.with(flag, on);
        self.update_display_control()
    }

    pub fn display_on(&mut self) -> Result<(), Error<T::Error>> {
        self.set_display_flag(DisplayControl::Display, true)
    }

    /// Blank the display. Its contents are kept and come back with [`Lcd::display_on`].
    pub fn display_off(&mut self) -> Result<(), Error<T::Error>> {
        self.set_display_flag(DisplayControl::Display, false)
    }

    pub fn toggle_display(&mut self) -> Result<(), Error<T::Error>> {
        let on = self.display_state.contains(DisplayControl::Display);
        self.set_display_flag(DisplayControl::Display, !on)
    }

    // Set the cursor visibility
    pub fn cursor_on(&mut self) -> Result<(), Error<T::Error>> {
        self.set_display_flag(DisplayControl::Cursor, true)
    }

    pub fn cursor_off(&mut self) -> Result<(), Error<T::Error>> {
        self.set_display_flag(DisplayControl::Cursor, false)
    }

    pub fn toggle_cursor(&mut self) -> Result<(), Error<T::Error>> {
        let on = self.display_state.contains(DisplayControl::Cursor);
        self.set_display_flag(DisplayControl::Cursor, !on)
    }

    // Set if the cursor is blinking
    pub fn blink_on(&mut self) -> Result<(), Error<T::Error>> {
        self.set_display_flag(DisplayControl::Blink, true)
    }

    pub fn blink_off(&mut self) -> Result<(), Error<T::Error>> {
        self.set_display_flag(DisplayControl::Blink, false)
    }

    pub fn toggle_blink(&mut self) -> Result<(), Error<T::Error>> {
        let on = self.display_state.contains(DisplayControl::Blink);
        self.set_display_flag(DisplayControl::Blink, !on)
    }

    fn shift(&mut self, target: ShiftTarget, direction: ShiftDirection) -> Result<(), Error<T::Error>> {
        self.command(Command::Shift.with(target as u8 | direction as u8))
    }

    /// Scrolls the display one char to the left
    pub fn scroll_display_left(&mut self) -> Result<(), Error<T::Error>> {
        self.shift(ShiftTarget::Display, ShiftDirection::Left)
    }

    /// Scrolls the display one char to the right
    pub fn scroll_display_right(&mut self) -> Result<(), Error<T::Error>> {
        self.shift(ShiftTarget::Display, ShiftDirection::Right)
    }

    /// Moves the cursor one char to the left
    pub fn scroll_cursor_left(&mut self) -> Result<(), Error<T::Error>> {
        self.shift(ShiftTarget::Cursor, ShiftDirection::Left)
    }

    /// Moves the cursor one char to the right
    pub fn scroll_cursor_right(&mut self) -> Result<(), Error<T::Error>> {
        self.shift(ShiftTarget::Cursor, ShiftDirection::Right)
    }
}

impl<T, D> uWrite for Lcd<T, D>
where
    T: Transport,
    D: DelayNs,
{
    type Error = Error<T::Error>;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.write_str(s)
    }
}

impl<T, D> core::fmt::Write for Lcd<T, D>
where
    T: Transport,
    D: DelayNs,
{
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        Lcd::write_str(self, s).map_err(|_| core::fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, Event, Log};
    use crate::transport::I2cTransport;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        i2c::{Mock as I2cMock, Transaction as I2cTransaction},
    };
    use proptest::prelude::*;

    const ADDRESS: u8 = 0x27;

    fn writes(bytes: &[u8]) -> Vec<I2cTransaction> {
        bytes
            .iter()
            .map(|&byte| I2cTransaction::write(ADDRESS, vec![byte]))
            .collect()
    }

    fn ready(log: &Log, config: Config) -> Lcd<testing::Bus, testing::Clock> {
        let lcd = Lcd::new(log.bus(), log.clock())
            .with_config(config)
            .init()
            .unwrap();
        log.clear();
        lcd
    }

    #[test]
    fn init_lcd1602() {
        let mut expected = writes(&[
            // 0x3 three times, then 0x2, as lone nibbles: backlight on, enable set then cleared
            0b0011_1100,
            0b0011_1000,
            0b0011_1100,
            0b0011_1000,
            0b0011_1100,
            0b0011_1000,
            0b0010_1100,
            0b0010_1000,
            // function set: 4 bit, 2 lines, 5x8 = 0x28
            0b0010_1100,
            0b0010_1000,
            0b1000_1100,
            0b1000_1000,
            // display control: display on, cursor off, blink off = 0x0C
            0b0000_1100,
            0b0000_1000,
            0b1100_1100,
            0b1100_1000,
            // entry mode: increment, no shift = 0x06
            0b0000_1100,
            0b0000_1000,
            0b0110_1100,
            0b0110_1000,
            // clear = 0x01
            0b0000_1100,
            0b0000_1000,
            0b0001_1100,
            0b0001_1000,
        ]);
        // print "HI" at (0, 0)
        expected.extend(writes(&testing::command(0x80, Backlight::On)));
        expected.extend(writes(&[
            0b0100_1101,
            0b0100_1001,
            0b1000_1101,
            0b1000_1001,
            0b0100_1101,
            0b0100_1001,
            0b1001_1101,
            0b1001_1001,
        ]));

        let mut i2c = I2cMock::new(&expected);
        let mut lcd = Lcd::new(I2cTransport::new(i2c.clone(), ADDRESS), NoopDelay::new())
            .with_columns(16)
            .with_rows(2)
            .with_font(Font::Dots5x8)
            .with_backlight(Backlight::On)
            .init()
            .unwrap();
        lcd.print("HI", 0, 0).unwrap();

        i2c.done();
    }

    #[test]
    fn handshake_for_every_module() {
        let modules = [
            (16, 1, Font::Dots5x8),
            (16, 2, Font::Dots5x8),
            (16, 4, Font::Dots5x8),
            (20, 1, Font::Dots5x8),
            (20, 2, Font::Dots5x8),
            (20, 4, Font::Dots5x8),
            (16, 1, Font::Dots5x10),
            (20, 1, Font::Dots5x10),
        ];
        for (columns, rows, font) in modules {
            for backlight in [Backlight::On, Backlight::Off] {
                let log = Log::default();
                let config = Config::new(columns, rows, font).unwrap();
                let lcd = Lcd::new(log.bus(), log.clock())
                    .with_config(config)
                    .with_backlight(backlight)
                    .init();
                assert!(lcd.is_ok());
                assert_eq!(log.writes(), testing::handshake(config, backlight));
            }
        }
    }

    #[test]
    fn handshake_waits() {
        let log = Log::default();
        let _lcd = Lcd::new(log.bus(), log.clock()).init().unwrap();
        let events = log.events();

        assert_eq!(
            events[..12],
            [
                Event::Wait(50_000_000),
                Event::Write(0x3c),
                Event::Write(0x38),
                Event::Wait(50_000),
                Event::Wait(5_000_000),
                Event::Write(0x3c),
                Event::Write(0x38),
                Event::Wait(50_000),
                Event::Wait(100_000),
                Event::Write(0x3c),
                Event::Write(0x38),
                Event::Wait(50_000),
            ]
        );
        // clear ends the handshake with its own long wait
        assert_eq!(
            events[events.len() - 2..],
            [Event::Wait(50_000), Event::Wait(2_000_000)]
        );
    }

    #[test]
    fn rejects_config_before_any_write() {
        let cases = [
            (12, 2, Font::Dots5x8, Invalid::Columns(12)),
            (16, 3, Font::Dots5x8, Invalid::Rows(3)),
            (16, 2, Font::Dots5x10, Invalid::FontNeedsOneRow(2)),
            (20, 4, Font::Dots5x10, Invalid::FontNeedsOneRow(4)),
        ];
        for (columns, rows, font, invalid) in cases {
            let log = Log::default();
            let result = Lcd::new(log.bus(), log.clock())
                .with_columns(columns)
                .with_rows(rows)
                .with_font(font)
                .init();
            assert_eq!(result.err().and_then(|e| e.invalid()), Some(invalid));
            assert!(log.events().is_empty());
        }
    }

    #[test]
    fn aborts_init_on_bus_error() {
        let expected = [I2cTransaction::write(ADDRESS, vec![0b0011_1100]).with_error(ErrorKind::Other)];
        let mut i2c = I2cMock::new(&expected);
        let result = Lcd::new(I2cTransport::new(i2c.clone(), ADDRESS), NoopDelay::new()).init();

        assert!(matches!(result, Err(Error::Io(ErrorKind::Other))));
        i2c.done();
    }

    #[test]
    fn send_is_four_writes() {
        let log = Log::default();
        let mut lcd = ready(&log, Config::LCD1602);
        lcd.write_raw(0xa5).unwrap();

        assert_eq!(
            log.events(),
            [
                Event::Write(0xad),
                Event::Write(0xa9),
                Event::Wait(50_000),
                Event::Write(0x5d),
                Event::Write(0x59),
                Event::Wait(50_000),
            ]
        );
    }

    #[test]
    fn cursor_rows_on_lcd2004() {
        let log = Log::default();
        let mut lcd = ready(&log, Config::LCD2004);
        for (row, base) in [(0, 0x80), (1, 0xc0), (2, 0x94), (3, 0xd4)] {
            lcd.set_cursor(row, 7).unwrap();
            assert_eq!(log.writes(), testing::command(base + 7, Backlight::On));
            log.clear();
        }
    }

    proptest! {
        #[test]
        fn cursor_bounds(
            (columns, rows) in prop_oneof![Just((16u8, 2u8)), Just((20, 4)), Just((16, 1))],
            row in 0u8..6,
            col in 0u8..24,
        ) {
            let log = Log::default();
            let config = Config::new(columns, rows, Font::Dots5x8).unwrap();
            let mut lcd = ready(&log, config);
            let result = lcd.set_cursor(row, col);

            if row < rows && col < columns {
                prop_assert!(result.is_ok());
                prop_assert_eq!(
                    log.writes(),
                    testing::command(command::ddram_address(row, col), Backlight::On)
                );
            } else {
                prop_assert!(result.err().and_then(|e| e.invalid()).is_some());
                prop_assert!(log.events().is_empty());
            }
        }

        #[test]
        fn custom_char_location_wraps(location in any::<u8>(), glyph in any::<[u8; 8]>()) {
            let log = Log::default();
            let mut lcd = ready(&log, Config::LCD1602);
            lcd.upload_custom_char(location, &glyph).unwrap();

            let mut expected = testing::command(0x40 | (location & 0x07) << 3, Backlight::On);
            expected.extend(testing::data(&glyph, Backlight::On));
            prop_assert_eq!(log.writes(), expected);
        }
    }

    #[test]
    fn write_after_upload_needs_cursor() {
        let log = Log::default();
        let mut lcd = ready(&log, Config::LCD1602);
        lcd.upload_custom_char(0, &[0x1f; 8]).unwrap();
        log.clear();

        assert_eq!(
            lcd.write_str("x").err().and_then(|e| e.invalid()),
            Some(Invalid::CgramAddressed)
        );
        assert_eq!(
            lcd.write_raw(0).err().and_then(|e| e.invalid()),
            Some(Invalid::CgramAddressed)
        );
        assert!(log.events().is_empty());

        lcd.print_raw(0, 1, 3).unwrap();
        let mut expected = testing::command(0xc3, Backlight::On);
        expected.extend(testing::data(&[0], Backlight::On));
        assert_eq!(log.writes(), expected);
        assert!(lcd.write_str("ok").is_ok());
    }

    #[test]
    fn toggles_resend_all_three_bits() {
        let log = Log::default();
        let mut lcd = ready(&log, Config::LCD1602);

        lcd.cursor_on().unwrap();
        assert_eq!(log.writes(), testing::command(0x0e, Backlight::On));
        log.clear();

        lcd.toggle_blink().unwrap();
        assert_eq!(log.writes(), testing::command(0x0f, Backlight::On));
        log.clear();

        lcd.toggle_display().unwrap();
        assert_eq!(log.writes(), testing::command(0x0b, Backlight::On));
        log.clear();

        lcd.display_on().unwrap();
        lcd.cursor_off().unwrap();
        lcd.blink_off().unwrap();
        lcd.toggle_cursor().unwrap();
        let mut expected = testing::command(0x0f, Backlight::On);
        expected.extend(testing::command(0x0d, Backlight::On));
        expected.extend(testing::command(0x0c, Backlight::On));
        expected.extend(testing::command(0x0e, Backlight::On));
        assert_eq!(log.writes(), expected);
        assert!(lcd.display_control().contains(DisplayControl::Cursor));
    }

    #[test]
    fn backlight_round_trip() {
        let log = Log::default();
        let mut lcd = ready(&log, Config::LCD1602);

        lcd.toggle_backlight().unwrap();
        assert_eq!(lcd.backlight_state(), Backlight::Off);
        lcd.write_raw(b'A').unwrap();
        lcd.toggle_backlight().unwrap();
        assert_eq!(lcd.backlight_state(), Backlight::On);

        let mut expected = vec![0x00];
        expected.extend(testing::data(b"A", Backlight::Off));
        expected.push(0x08);
        assert_eq!(log.writes(), expected);
    }

    #[test]
    fn print_rejects_off_screen_text_start() {
        let log = Log::default();
        let mut lcd = ready(&log, Config::LCD1602);

        assert_eq!(
            lcd.print("late", 0, 16).err().and_then(|e| e.invalid()),
            Some(Invalid::Column {
                col: 16,
                columns: 16
            })
        );
        assert!(log.events().is_empty());
    }

    #[test]
    fn partial_print_on_bus_error() {
        let mut expected = writes(&testing::handshake(Config::LCD1602, Backlight::On));
        expected.extend(writes(&testing::command(0x80, Backlight::On)));
        expected.extend(writes(&testing::data(b"H", Backlight::On)));
        expected.push(I2cTransaction::write(ADDRESS, vec![0b0100_1101]).with_error(ErrorKind::Other));

        let mut i2c = I2cMock::new(&expected);
        let mut lcd = Lcd::new(I2cTransport::new(i2c.clone(), ADDRESS), NoopDelay::new())
            .init()
            .unwrap();
        assert!(matches!(lcd.print("HI", 0, 0), Err(Error::Io(ErrorKind::Other))));

        i2c.done();
    }

    #[test]
    fn home_clear_and_shifts() {
        let log = Log::default();
        let mut lcd = ready(&log, Config::LCD1602);

        lcd.return_home().unwrap();
        lcd.clear().unwrap();
        lcd.scroll_display_left().unwrap();
        lcd.scroll_display_right().unwrap();
        lcd.scroll_cursor_left().unwrap();
        lcd.scroll_cursor_right().unwrap();

        let mut expected = Vec::new();
        for value in [0x02, 0x01, 0x18, 0x1c, 0x10, 0x14] {
            expected.extend(testing::command(value, Backlight::On));
        }
        assert_eq!(log.writes(), expected);
    }

    #[test]
    fn ufmt_and_core_fmt() {
        let log = Log::default();
        let mut lcd = ready(&log, Config::LCD1602);

        ufmt::uwrite!(lcd, "{}", 42u8).unwrap();
        core::fmt::Write::write_fmt(&mut lcd, format_args!("{}", 7)).unwrap();

        assert_eq!(log.writes(), testing::data(b"427", Backlight::On));
    }

    #[test]
    fn close_hands_back_the_bus() {
        let i2c = I2cMock::new(&writes(&testing::handshake(Config::LCD1602, Backlight::On)));
        let lcd = Lcd::new(I2cTransport::new(i2c, ADDRESS), NoopDelay::new())
            .init()
            .unwrap();
        let (transport, _delay) = lcd.close();
        let mut bus = transport.release();
        bus.done();
    }
}
