//! Refresh engine
//!
//! Owns every display peripheral and runs in interrupt context. After
//! [`RefreshEngine::initialize`] the display is refreshed continuously: each
//! DMA completion serializes the next chunk of the text grid and starts the
//! next transfer, so the foreground never waits on the bus.
//!
//! # State machine
//!
//! ```text
//!  Uninitialized ──initialize()──▶ TransferInFlight ◀──┐
//!        │                           │    │            │ on_dma_complete()
//!        │ first boot fails          │    └────────────┘
//!        ▼                           │ error interrupt or watchdog
//!      Error (inert, bus parked)     ▼
//!                                  Error ──reinitialise──▶ TransferInFlight
//!                                    ▲                         │
//!                                    └──── reinit fails ◀──────┘
//!                                       (watchdog left armed)
//! ```
//!
//! Character mode keeps the whole frame in one DMA transfer. Bitmap mode
//! keeps one I2C transaction open and streams a row per transfer; after both
//! rows it closes the transaction and opens a new one that re-addresses the
//! panel.

use embassy_sync::blocking_mutex::raw::RawMutex;
use floppy_display_hal::{
    Board, DelayNs, DmaChannel, I2cController, I2cSpeed, Irq, IrqControl, Peripherals,
};

use crate::bus::{detect, recovery, Transport};
use crate::config::{ConfigError, DriverConfig};
use crate::display::{Display, PowerOn};
use crate::error::{BusError, ErrorKind, InitError};
use crate::font::GlyphTable;
use crate::frame::ssd1306::RowCursor;
use crate::frame::{hd44780, ssd1306, TransferBuffer};
use crate::watchdog::Watchdog;

/// Interrupts owned by the engine
const IRQS: [Irq; 3] = [Irq::BusEvent, Irq::BusError, Irq::DmaComplete];

/// Detected display controller and its bus address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Controller {
    /// HD44780 behind a PCF8574 expander
    Character(u8),
    /// SSD1306 OLED
    Bitmap(u8),
}

impl Controller {
    /// 7-bit bus address
    pub fn address(&self) -> u8 {
        match *self {
            Controller::Character(address) | Controller::Bitmap(address) => address,
        }
    }
}

/// Refresh mode, fixed for the boot session once detection succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverMode {
    /// No controller detected yet
    #[default]
    Uninitialized,
    /// Whole-frame refresh of a character LCD
    Character { address: u8 },
    /// Row-streamed refresh of an OLED
    Bitmap { address: u8, cursor: RowCursor },
}

impl DriverMode {
    /// Controller in use, if any
    pub fn controller(&self) -> Option<Controller> {
        match *self {
            DriverMode::Uninitialized => None,
            DriverMode::Character { address } => Some(Controller::Character(address)),
            DriverMode::Bitmap { address, .. } => Some(Controller::Bitmap(address)),
        }
    }
}

impl From<Controller> for DriverMode {
    fn from(controller: Controller) -> Self {
        match controller {
            Controller::Character(address) => DriverMode::Character { address },
            Controller::Bitmap(address) => DriverMode::Bitmap {
                address,
                cursor: RowCursor::new(),
            },
        }
    }
}

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineState {
    /// No transfer running
    #[default]
    Idle,
    /// A DMA transfer is on the bus
    TransferInFlight,
    /// Last initialisation or transfer failed
    Error,
}

/// Recovery diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineStats {
    /// Error-interrupt recoveries attempted
    pub recoveries: u32,
    /// Most recent error
    pub last_error: Option<ErrorKind>,
}

/// Interrupt-context display driver
pub struct RefreshEngine<'a, M: RawMutex, B: Board> {
    display: &'a Display<M>,
    config: DriverConfig,
    bus: Transport<B::I2c>,
    dma: B::Dma,
    scl: B::Scl,
    sda: B::Sda,
    irq: B::Irq,
    watchdog: Watchdog<B::Alarm>,
    delay: B::Delay,
    glyphs: GlyphTable,
    buffer: TransferBuffer,
    mode: DriverMode,
    state: EngineState,
    stats: EngineStats,
}

impl<'a, M: RawMutex, B: Board> RefreshEngine<'a, M, B> {
    /// Take ownership of the display peripherals; nothing is touched yet
    ///
    /// Fails if `config` does not validate.
    pub fn new(
        display: &'a Display<M>,
        peripherals: Peripherals<B>,
        config: DriverConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let Peripherals {
            i2c,
            dma,
            scl,
            sda,
            irq,
            alarm,
            delay,
        } = peripherals;

        Ok(Self {
            display,
            bus: Transport::new(i2c, config.bus_timeout()),
            dma,
            scl,
            sda,
            irq,
            watchdog: Watchdog::new(alarm, config.watchdog_timeout()),
            delay,
            glyphs: GlyphTable::new(config.font),
            buffer: TransferBuffer::new(),
            mode: DriverMode::Uninitialized,
            state: EngineState::Idle,
            stats: EngineStats::default(),
            config,
        })
    }

    /// Bring the bus and the display up and start continuous refresh
    ///
    /// The first call of a boot session also checks the bus pull-ups and
    /// detects the controller. Later calls (from the error interrupt) reuse
    /// the detected controller and keep the text: the grid is cleared only
    /// when detection succeeds, never on a reinitialisation.
    pub fn initialize(&mut self) -> Result<PowerOn, InitError> {
        let known = self.mode.controller();
        let first_boot = known.is_none();

        self.bus.revive();
        self.bus.controller().set_powered(true);

        recovery::release_stuck_bus(&mut self.scl, &mut self.sda, &mut self.delay);

        if first_boot && !recovery::bus_is_pulled_up(&mut self.scl, &mut self.sda, &mut self.delay) {
            warn!("I2C: invalid bus");
            return self.fail(first_boot, InitError::InvalidBus);
        }

        recovery::attach(&mut self.scl, &mut self.sda);
        self.configure_bus(I2cSpeed::Standard);

        let controller = match known {
            Some(controller) => controller,
            None => match detect::detect(&mut self.bus, &self.config) {
                Ok(controller) => {
                    self.display.clear();
                    controller
                }
                Err(e) => return self.fail(first_boot, e),
            },
        };
        self.mode = controller.into();

        self.enable_interrupts();
        self.watchdog.rearm();

        let started = match controller {
            Controller::Bitmap(_) => {
                self.start_bitmap();
                Ok(())
            }
            Controller::Character(address) => self.start_character(address),
        };

        match started {
            Ok(()) => Ok(PowerOn {
                controller,
                first_boot,
            }),
            Err(e) => self.fail(first_boot, e.into()),
        }
    }

    /// I2C event interrupt
    ///
    /// Only does work while a bitmap transaction is being addressed.
    pub fn on_bus_event(&mut self) {
        if let Some(controller) = self.mode.controller() {
            self.bus.on_event(controller.address());
        }
    }

    /// DMA transfer-complete interrupt
    pub fn on_dma_complete(&mut self) {
        self.dma.stop();
        if self.refill() > 0 {
            self.start_transfer();
        } else {
            self.state = EngineState::Idle;
        }
    }

    /// I2C error interrupt, also pended by the board when the watchdog fires
    ///
    /// Resets the controller and reinitialises with the known controller.
    /// The foreground is never told.
    pub fn on_bus_error(&mut self) {
        let errors = self.bus.controller().clear_errors();
        let kind = if errors.has_errors() {
            ErrorKind::BusFault
        } else {
            ErrorKind::TransferStall
        };
        warn!("I2C: error ({=u16:#x}): {}", errors.bits(), kind);

        self.stats.last_error = Some(kind);
        self.state = EngineState::Error;

        if self.mode.controller().is_none() {
            // Never came up; nothing to recover
            return;
        }
        self.stats.recoveries = self.stats.recoveries.wrapping_add(1);

        self.bus.controller().reset();
        self.dma.stop();
        self.watchdog.cancel();

        match self.initialize() {
            Ok(_) => info!("I2C: recovered"),
            Err(e) => warn!("I2C: reinitialisation failed: {}", e),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Current refresh mode
    pub fn mode(&self) -> DriverMode {
        self.mode
    }

    /// Recovery diagnostics
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Shared display state
    pub fn display(&self) -> &'a Display<M> {
        self.display
    }

    /// Active configuration
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    fn configure_bus(&mut self, speed: I2cSpeed) {
        debug!("I2C: {=u32} Hz", speed.frequency());
        self.bus.controller().configure(speed);
    }

    fn enable_interrupts(&mut self) {
        let priority = self.config.irq_priority;
        for irq in IRQS {
            self.irq.set_priority(irq, priority);
            self.irq.clear_pending(irq);
        }
        self.bus.controller().set_error_interrupt(true);
        self.dma.stop();
        for irq in IRQS {
            self.irq.enable(irq);
        }
    }

    /// Clock the 4-bit handshake by hand, then DMA the setup commands
    fn start_character(&mut self, address: u8) -> Result<(), BusError> {
        self.bus.start(address)?;
        for (nibble, settle_us) in hd44780::HANDSHAKE {
            self.bus.write_nibble(nibble)?;
            if settle_us > 0 {
                self.delay.delay_us(settle_us);
            }
        }

        self.buffer.clear();
        hd44780::init_sequence(&mut self.buffer, self.display.backlight());
        self.bus.controller().set_dma_requests(true);
        self.start_transfer();
        Ok(())
    }

    /// Queue the panel setup and open the long-running transaction
    fn start_bitmap(&mut self) {
        self.configure_bus(I2cSpeed::Fast);
        self.bus.controller().set_error_interrupt(true);

        self.buffer.clear();
        ssd1306::emit_commands(&mut self.buffer, &ssd1306::init_commands(self.config.panel));
        self.open_bitmap_transaction();

        self.bus.controller().set_dma_requests(true);
        self.start_transfer();
    }

    /// Append the transaction opener to the buffer and request a start
    fn open_bitmap_transaction(&mut self) {
        ssd1306::open_transaction(&mut self.buffer, self.display.backlight());
        if let DriverMode::Bitmap { cursor, .. } = &mut self.mode {
            cursor.reset();
        }
        self.bus.open_async();
    }

    fn start_transfer(&mut self) {
        self.dma.start(self.buffer.as_slice());
        self.watchdog.rearm();
        self.state = EngineState::TransferInFlight;
    }

    /// Serialize the next chunk; 0 means nothing should be started
    fn refill(&mut self) -> usize {
        let mode = self.mode;
        match mode {
            DriverMode::Uninitialized => 0,
            DriverMode::Character { .. } => {
                self.display.frame_completed();
                let backlight = self.display.backlight();
                let buffer = &mut self.buffer;
                self.display
                    .with_text(|text| hd44780::serialize_frame(buffer, text, backlight))
            }
            DriverMode::Bitmap { cursor, .. } => self.refill_bitmap(cursor),
        }
    }

    fn refill_bitmap(&mut self, mut cursor: RowCursor) -> usize {
        let len = match cursor.row() {
            Some(row) => {
                let (buffer, glyphs) = (&mut self.buffer, &self.glyphs);
                let len = self
                    .display
                    .with_text(|text| ssd1306::render_row(buffer, text.row(row), glyphs));
                cursor.advance();
                len
            }
            None => {
                self.display.frame_completed();
                if self.bus.close().is_err() {
                    // Error flags are still set; the error interrupt recovers
                    return 0;
                }
                self.buffer.clear();
                self.open_bitmap_transaction();
                cursor.reset();
                self.buffer.len()
            }
        };

        if let DriverMode::Bitmap { cursor: current, .. } = &mut self.mode {
            *current = cursor;
        }
        len
    }

    /// Leave the hardware safe after a failed initialisation
    ///
    /// On the first boot everything is shut down and the lines are parked.
    /// On a reinitialisation the watchdog stays armed so recovery retries.
    fn fail(&mut self, first_boot: bool, error: InitError) -> Result<PowerOn, InitError> {
        self.stats.last_error = Some(error.kind());
        self.state = EngineState::Error;

        if first_boot {
            for irq in IRQS {
                self.irq.disable(irq);
            }
            self.watchdog.cancel();
            self.dma.stop();
            let i2c = self.bus.controller();
            i2c.disable();
            recovery::park(&mut self.scl, &mut self.sda);
            self.bus.controller().set_powered(false);
            self.mode = DriverMode::Uninitialized;
        } else {
            self.watchdog.rearm();
        }
        Err(error)
    }
}
