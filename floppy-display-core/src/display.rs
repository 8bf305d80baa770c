//! Foreground interface
//!
//! The only state the foreground touches: the text grid, the backlight flag
//! and the refresh counter it watches in [`Display::sync`]. Everything else
//! belongs to the [`RefreshEngine`](crate::RefreshEngine) in interrupt
//! context.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use portable_atomic::{AtomicBool, AtomicU8, Ordering};

use crate::engine::Controller;
use crate::error::InitError;
use crate::text::TextBuffer;

/// Outcome of a successful initialisation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerOn {
    /// Detected (or previously detected) controller
    pub controller: Controller,
    /// True on the first initialisation of this boot
    pub first_boot: bool,
}

/// Display state shared between foreground and interrupt context
///
/// `M` should mask the display interrupts while held; in firmware that is
/// `CriticalSectionRawMutex`.
pub struct Display<M: RawMutex> {
    text: Mutex<M, RefCell<TextBuffer>>,
    backlight: AtomicBool,
    refresh_count: AtomicU8,
}

impl<M: RawMutex> Default for Display<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> Display<M> {
    /// Blank display, backlight off
    pub const fn new() -> Self {
        Self {
            text: Mutex::new(RefCell::new(TextBuffer::new())),
            backlight: AtomicBool::new(false),
            refresh_count: AtomicU8::new(0),
        }
    }

    /// Write `text` at (`col`, `row`), space-padded to `min_width` cells
    ///
    /// The whole update happens under the lock, so a refresh never sees a
    /// half-written row.
    pub fn write(&self, col: usize, row: usize, min_width: usize, text: &str) {
        self.text
            .lock(|cell| cell.borrow_mut().write(col, row, min_width, text));
    }

    /// Blank both rows
    pub fn clear(&self) {
        self.text.lock(|cell| cell.borrow_mut().clear());
    }

    /// Set the backlight (LCD) or panel power (OLED)
    ///
    /// Takes effect with the next serialized frame.
    pub fn set_backlight(&self, on: bool) {
        self.backlight.store(on, Ordering::Relaxed);
    }

    /// Current backlight flag
    pub fn backlight(&self) -> bool {
        self.backlight.load(Ordering::Relaxed)
    }

    /// Completed full-frame transmissions, modulo 256
    pub fn refresh_count(&self) -> u8 {
        self.refresh_count.load(Ordering::Acquire)
    }

    /// Spin until everything written before the call is on the glass
    pub fn sync(&self) {
        self.sync_with(core::hint::spin_loop);
    }

    /// [`sync`](Self::sync) with a caller-supplied relax hook
    ///
    /// Waits for two refreshes: the frame in flight at call time may have
    /// been serialized before the caller's last write.
    pub fn sync_with(&self, mut relax: impl FnMut()) {
        let start = self.refresh_count();
        while self.refresh_count().wrapping_sub(start) < 2 {
            relax();
        }
    }

    /// Run `init` (the engine's initialisation) and finish power-on
    ///
    /// On the first boot with a character LCD, waits for the controller
    /// setup commands to be flushed and then turns the backlight on.
    pub fn initialize(&self, init: impl FnOnce() -> Result<PowerOn, InitError>) -> bool {
        self.initialize_with(init, core::hint::spin_loop)
    }

    /// [`initialize`](Self::initialize) with a caller-supplied relax hook
    pub fn initialize_with(
        &self,
        init: impl FnOnce() -> Result<PowerOn, InitError>,
        relax: impl FnMut(),
    ) -> bool {
        match init() {
            Ok(power_on) => {
                if power_on.first_boot && matches!(power_on.controller, Controller::Character(_)) {
                    self.sync_with(relax);
                    self.set_backlight(true);
                }
                true
            }
            Err(e) => {
                warn!("display: initialisation failed: {}", e);
                false
            }
        }
    }

    /// Run `f` on the grid with the lock held
    pub(crate) fn with_text<R>(&self, f: impl FnOnce(&TextBuffer) -> R) -> R {
        self.text.lock(|cell| f(&cell.borrow()))
    }

    /// Count one full frame on the wire
    pub(crate) fn frame_completed(&self) {
        self.refresh_count.fetch_add(1, Ordering::Release);
    }
}
