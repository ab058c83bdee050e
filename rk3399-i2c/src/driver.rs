//! Transaction engine
//!
//! One write transaction is: start condition, then the logical byte
//! stream (address byte, register-prefix bytes, payload) pushed through
//! the 32-byte transmit FIFO in one or more triggered bursts, then a stop
//! condition. Each burst is polled to completion before the next is
//! loaded; the controller has a single transmit count register and a
//! single transfer-finished flag, so bursts cannot overlap.
//!
//! Whatever happens mid-transaction, the stop condition is attempted and
//! the controller is disabled before returning, so the bus is never left
//! mid-cycle for the next caller.

use embedded_hal::delay::DelayNs;

use crate::poll::{poll_until, PollResult, TIMEOUT_POLLS};
use crate::regs::{con, int, I2cRegisters, FIFO_DEPTH_BYTES};

/// GPLL rate feeding the PMU-domain I2C source mux.
const GPLL_HZ: u32 = 800_000_000;

/// Source-clock divisor programmed into the clock unit (divide by 40).
const SRC_CLK_DIV: u32 = 39;

/// Controller function clock after the source divisor: 20 MHz.
const FUNC_CLK_HZ: u32 = GPLL_HZ / (SRC_CLK_DIV + 1);

/// Bus clock configuration.
///
/// Bring-up runs the bus at standard mode only; the divider is still
/// computed from the requested frequency rather than hardcoded.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// SCL frequency in Hz
    pub frequency: u32,
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Error from a write transaction. Both kinds are terminal for the
/// transaction in progress; nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Target device did not acknowledge an address or data byte.
    NoAck,
    /// A polled bus condition never asserted within its budget.
    Timeout,
}

/// Byte at position `pos` of the logical transaction stream.
///
/// Position 0 is the address byte (shifted left, R/W bit clear: write
/// only), positions 1..=register_len are the register-prefix bytes taken
/// little-endian from `register`, and everything after that is payload.
/// The header occupies only these positions of the overall stream, so a
/// chunk that starts past it carries payload bytes exclusively.
fn stream_byte(address: u8, register: u32, register_len: usize, payload: &[u8], pos: usize) -> u8 {
    if pos == 0 {
        address << 1
    } else if pos <= register_len {
        (register >> ((pos - 1) * 8)) as u8
    } else {
        payload[pos - 1 - register_len]
    }
}

/// Polled master-mode driver for one controller instance.
///
/// Owns the register bank and the delay source. Fully synchronous and
/// non-reentrant: the caller must serialize all use of one bus.
pub struct I2cMaster<R, D> {
    pub(crate) regs: R,
    pub(crate) delay: D,
}

impl<R: I2cRegisters, D: DelayNs> I2cMaster<R, D> {
    /// Wrap a register bank and delay source.
    ///
    /// The caller must have routed the bus pins and enabled the
    /// reference clock already; the driver does not verify either.
    pub fn new(regs: R, delay: D) -> Self {
        Self { regs, delay }
    }

    /// Release the register bank and delay source.
    pub fn free(self) -> (R, D) {
        (self.regs, self.delay)
    }

    /// Program the bus clock dividers for the requested SCL rate.
    ///
    /// Runs once at initialization, after pin-mux selection and before
    /// the first transaction. Register writes are unconditional; there
    /// is no error path.
    pub fn configure_clock(&mut self, config: I2cConfig) {
        self.regs.write_clock_source_div(SRC_CLK_DIV);

        // SCL = FUNC_CLK / (8 * (divl + 1 + divh + 1)). Round the total
        // divisor up so the resulting rate never exceeds the target,
        // then split it near-evenly between the two phases.
        let div = FUNC_CLK_HZ.div_ceil(8 * config.frequency).max(2);
        let divh = div / 2 - 1;
        let divl = div - div / 2 - 1;
        self.regs.write_clock_div((divh << 16) | divl);
    }

    /// Write `payload` to `address`, preceded by the low `register_len`
    /// bytes of `register` (little-endian, at most 4).
    ///
    /// Returns the first error encountered. Stop and disable run on
    /// every exit path, including after a start failure; a stop timeout
    /// is only surfaced when everything before it succeeded.
    pub fn write(
        &mut self,
        address: u8,
        register: u32,
        register_len: usize,
        payload: &[u8],
    ) -> Result<(), Error> {
        debug_assert!(address <= 0x7f);
        debug_assert!(register_len <= 4);

        let mut result = match self.send_start() {
            PollResult::Acknowledged => self.send_chunks(address, register, register_len, payload),
            PollResult::TimedOut => Err(Error::Timeout),
        };

        // Best-effort bus recovery, attempted regardless of the result
        // so far.
        if self.send_stop() == PollResult::TimedOut && result.is_ok() {
            result = Err(Error::Timeout);
        }
        self.disable();

        result
    }

    /// One-byte-register convenience write.
    pub fn write_register(&mut self, address: u8, register: u8, payload: &[u8]) -> Result<(), Error> {
        let result = self.write(address, register as u32, 1, payload);
        #[cfg(feature = "defmt")]
        if let Err(err) = result {
            defmt::warn!("i2c write to {=u8:#04x} failed: {}", address, err);
        }
        result
    }

    /// Push the whole logical stream through the FIFO, one burst at a
    /// time. Chunk size is the bytes remaining capped at the FIFO depth.
    fn send_chunks(
        &mut self,
        address: u8,
        register: u32,
        register_len: usize,
        payload: &[u8],
    ) -> Result<(), Error> {
        let total = 1 + register_len + payload.len();
        let mut offset = 0;

        while offset < total {
            let chunk = (total - offset).min(FIFO_DEPTH_BYTES);
            self.load_fifo(address, register, register_len, payload, offset, chunk);

            self.regs.write_control(con::ENABLE | con::MODE_TX);
            self.regs.write_tx_count(chunk as u32);
            self.regs.write_int_enable(int::MBTF | int::NAKRCV);

            // A NACK is recorded but the poll keeps running in the same
            // budget: a transfer-finished flag raised in the same window
            // must still be drained so the controller is not left in a
            // half-finished cycle. A recorded NACK fails the transaction
            // either way, and takes precedence over a later timeout.
            let mut nack = false;
            let Self { regs, delay } = self;
            let waited = poll_until(delay, TIMEOUT_POLLS, || {
                let pending = regs.pending();
                if pending & int::NAKRCV != 0 {
                    regs.clear_pending(int::NAKRCV);
                    nack = true;
                }
                if pending & int::MBTF != 0 {
                    regs.clear_pending(int::MBTF);
                    return true;
                }
                false
            });

            if nack {
                return Err(Error::NoAck);
            }
            if waited == PollResult::TimedOut {
                return Err(Error::Timeout);
            }

            offset += chunk;
        }

        Ok(())
    }

    /// Pack the chunk's byte window into little-endian FIFO words.
    fn load_fifo(
        &mut self,
        address: u8,
        register: u32,
        register_len: usize,
        payload: &[u8],
        offset: usize,
        chunk: usize,
    ) {
        for i in 0..chunk.div_ceil(4) {
            let mut word = 0u32;
            for j in 0..4 {
                let pos = i * 4 + j;
                if pos == chunk {
                    break;
                }
                let byte = stream_byte(address, register, register_len, payload, offset + pos);
                word |= (byte as u32) << (j * 8);
            }
            self.regs.write_tx_word(i, word);
        }
    }

    fn send_start(&mut self) -> PollResult {
        self.send_condition(con::START, int::START)
    }

    fn send_stop(&mut self) -> PollResult {
        self.send_condition(con::STOP, int::STOP)
    }

    /// Request a start or stop condition and wait for the controller to
    /// latch it. `int_bit` indexes both the enable and pending registers.
    fn send_condition(&mut self, con_bit: u32, int_bit: u32) -> PollResult {
        self.regs.clear_pending(int::ALL);
        self.regs.write_control(con::ENABLE | con_bit);
        self.regs.write_int_enable(int_bit);

        let Self { regs, delay } = self;
        poll_until(delay, TIMEOUT_POLLS, || {
            if regs.pending() & int_bit != 0 {
                regs.clear_pending(int_bit);
                true
            } else {
                false
            }
        })
    }

    /// Zero the control register, leaving the controller idle. Runs on
    /// every transaction exit path and is never retried.
    fn disable(&mut self) {
        self.regs.write_control(0);
    }
}
