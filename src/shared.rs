//! One display handle shared between threads.
//!
//! Every byte is split over four expander writes and the controller latches on the enable edge,
//! so a write squeezed in from another thread between two of them corrupts the framing. The
//! whole handle sits behind a single lock; each closure passed to [`SharedLcd::with`] runs to
//! completion before the next one starts.

use std::sync::{Mutex, PoisonError};

use embedded_hal::delay::DelayNs;
use log::warn;

use crate::sync_lcd::Lcd;
use crate::transport::Transport;

pub struct SharedLcd<T, D>
where
    T: Transport,
    D: DelayNs,
{
    inner: Mutex<Lcd<T, D>>,
}

impl<T, D> SharedLcd<T, D>
where
    T: Transport,
    D: DelayNs,
{
    pub fn new(lcd: Lcd<T, D>) -> Self {
        Self {
            inner: Mutex::new(lcd),
        }
    }

    /// Run `f` with exclusive access to the display.
    ///
    /// A thread that panicked while holding the lock may have left a byte half sent; the handle
    /// is still returned, but it should be initialised again before relying on the screen.
    pub fn with<R>(&self, f: impl FnOnce(&mut Lcd<T, D>) -> R) -> R {
        let mut lcd = self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("display lock poisoned, framing may be out of sync");
            PoisonError::into_inner(poisoned)
        });
        f(&mut lcd)
    }

    pub fn into_inner(self) -> Lcd<T, D> {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
