//! Wall clock with a wandering creature, for a Raspberry Pi with a 16x2 backpack on /dev/i2c-1.
//!
//! Settings come from the environment (or a `.env` file):
//! `LCD_I2C_BUS`, `LCD_I2C_ADDRESS` (hex with `0x` or decimal), `LCD_COLUMNS`, `LCD_ROWS`.

use std::env;
use std::thread::sleep;
use std::time::Duration;

use dotenv::dotenv;
use eyre::{eyre, WrapErr};
use lcd1602_i2c::sync_lcd::Lcd;
use lcd1602_i2c::walker::{Heading, Walker};
use lcd1602_i2c::{Backlight, Font, I2cTransport, DEFAULT_ADDRESS, DEFAULT_BUS};
use log::{debug, info, warn};
use rppal::hal::Delay;
use rppal::i2c::I2c;
use time::macros::format_description;
use time::OffsetDateTime;

type Display = Lcd<I2cTransport<I2c>, Delay>;

fn env_u8(name: &str, default: u8) -> eyre::Result<u8> {
    let Ok(value) = env::var(name) else {
        return Ok(default);
    };
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.wrap_err_with(|| format!("{name}={value} is not a byte"))
}

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    let bus = env_u8("LCD_I2C_BUS", DEFAULT_BUS)?;
    let address = env_u8("LCD_I2C_ADDRESS", DEFAULT_ADDRESS)?;
    let columns = env_u8("LCD_COLUMNS", 16)?;
    let rows = env_u8("LCD_ROWS", 2)?;
    if rows < 2 {
        return Err(eyre!("the clock needs a second row for the walker"));
    }
    info!("display {columns}x{rows} at {address:#04x} on /dev/i2c-{bus}");

    let transport = I2cTransport::open(bus, address)
        .wrap_err_with(|| format!("opening /dev/i2c-{bus}"))?;
    let mut lcd = Lcd::new(transport, Delay::new())
        .with_columns(columns)
        .with_rows(rows)
        .with_font(Font::Dots5x8)
        .with_backlight(Backlight::On)
        .init()
        .wrap_err("initialising display")?;

    let outcome = run(&mut lcd);
    if let Err(err) = lcd.clear() {
        warn!("clearing display on exit: {err}");
    }
    let (transport, _delay) = lcd.close();
    drop(transport.release());
    outcome
}

/// Greeting, then the clock and the walker until something fails.
fn run(lcd: &mut Display) -> eyre::Result<()> {
    lcd.print("Hello!", 0, 7)?;
    for _ in 0..7 {
        lcd.scroll_display_left()?;
        sleep(Duration::from_millis(300));
    }
    sleep(Duration::from_secs(1));
    lcd.clear()?;

    lcd.print("  () ()", 0, 7)?;
    lcd.print("=<^ _ ^>=", 1, 7)?;

    let mut walker = Walker::new(1, 0, 5, 0, Heading::Right, 0);
    walker.place(lcd)?;

    let clock = format_description!("[hour]:[minute]:[second]");
    loop {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let text = now.format(&clock)?;
        debug!("tick {text}");
        lcd.print(&text, 0, 0)?;
        sleep(Duration::from_secs(1));
        walker.step(lcd)?;
    }
}
