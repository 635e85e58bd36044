//! Recording doubles shared by the driver tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;

use crate::command::{frames, nibble_frames, Register};
use crate::transport::Transport;
use crate::{Backlight, Config};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Write(u8),
    Wait(u32),
}

/// Interleaved log of bus writes and waits.
#[derive(Clone, Default)]
pub struct Log(Rc<RefCell<Vec<Event>>>);

impl Log {
    pub fn bus(&self) -> Bus {
        Bus(self.clone())
    }

    pub fn clock(&self) -> Clock {
        Clock(self.clone())
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn writes(&self) -> Vec<u8> {
        self.0
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Write(byte) => Some(*byte),
                Event::Wait(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

pub struct Bus(Log);

impl Transport for Bus {
    type Error = Infallible;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.0 .0.borrow_mut().push(Event::Write(byte));
        Ok(())
    }
}

pub struct Clock(Log);

impl DelayNs for Clock {
    fn delay_ns(&mut self, ns: u32) {
        self.0 .0.borrow_mut().push(Event::Wait(ns));
    }
}

/// Bus bytes of the full handshake for `config`.
pub fn handshake(config: Config, backlight: Backlight) -> Vec<u8> {
    let mut bytes = Vec::new();
    for nibble in [0x3, 0x3, 0x3, 0x2] {
        bytes.extend(nibble_frames(nibble, Register::Command, backlight));
    }
    for command in [config.function_set(), 0x0c, 0x06, 0x01] {
        bytes.extend(frames(command, Register::Command, backlight));
    }
    bytes
}

pub fn command(value: u8, backlight: Backlight) -> Vec<u8> {
    frames(value, Register::Command, backlight).to_vec()
}

pub fn data(text: &[u8], backlight: Backlight) -> Vec<u8> {
    text.iter()
        .flat_map(|&byte| frames(byte, Register::Data, backlight))
        .collect()
}
