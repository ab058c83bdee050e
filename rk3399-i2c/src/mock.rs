//! Simulated controller and delay source for host tests.

use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::regs::{con, int, I2cRegisters};

/// Delay source that only counts what it was asked to sleep.
pub struct MockDelay {
    slept_ns: u64,
}

impl MockDelay {
    pub fn new() -> Self {
        Self { slept_ns: 0 }
    }

    pub fn slept_us(&self) -> u64 {
        self.slept_ns / 1_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.slept_ns += u64::from(ns);
    }
}

/// Scripted register bank.
///
/// Responds to start/stop requests and transmit triggers according to
/// its knobs and records every access the driver makes. The default
/// behaves like a device that acknowledges everything immediately.
pub struct MockBus {
    start_responds: bool,
    stop_responds: bool,
    complete_responds: bool,
    nack_first_chunk: bool,
    /// Behave like a bus where only this address acknowledges.
    present_address: Option<u8>,

    /// Last value written to the control register.
    pub control: u32,
    /// Last value written to the interrupt-enable register.
    pub int_enable: u32,
    /// Current pending bits.
    pub pending: u32,
    /// Last SCL divider written, if any.
    pub clock_div: Option<u32>,
    /// Last source-clock divisor written, if any.
    pub clock_source_div: Option<u32>,

    /// Start conditions requested.
    pub start_requests: usize,
    /// Stop conditions requested.
    pub stop_requests: usize,
    /// Zero writes to the control register.
    pub disables: usize,
    /// MTXCNT value of every triggered burst, in order.
    pub tx_counts: Vec<u32>,
    /// FIFO words of every triggered burst, in load order.
    pub tx_words: Vec<Vec<u32>>,

    loading: Vec<u32>,
    first_chunk_of_txn: bool,
}

impl MockBus {
    pub fn new() -> Self {
        Self {
            start_responds: true,
            stop_responds: true,
            complete_responds: true,
            nack_first_chunk: false,
            present_address: None,
            control: 0,
            int_enable: 0,
            pending: 0,
            clock_div: None,
            clock_source_div: None,
            start_requests: 0,
            stop_requests: 0,
            disables: 0,
            tx_counts: Vec::new(),
            tx_words: Vec::new(),
            loading: Vec::new(),
            first_chunk_of_txn: false,
        }
    }

    /// Never assert the start-sent bit.
    pub fn without_start(mut self) -> Self {
        self.start_responds = false;
        self
    }

    /// Never assert the stop-sent bit.
    pub fn without_stop(mut self) -> Self {
        self.stop_responds = false;
        self
    }

    /// Never assert transfer-finished.
    pub fn without_completion(mut self) -> Self {
        self.complete_responds = false;
        self
    }

    /// NACK the first chunk of every transaction.
    pub fn nack_first_chunk(mut self) -> Self {
        self.nack_first_chunk = true;
        self
    }

    /// Acknowledge only transactions addressed to `address`.
    pub fn present_only(mut self, address: u8) -> Self {
        self.present_address = Some(address);
        self
    }

    /// 7-bit address of the burst just loaded, from FIFO word 0.
    fn loaded_address(&self) -> u8 {
        (self.loading.first().copied().unwrap_or(0) as u8) >> 1
    }
}

impl I2cRegisters for MockBus {
    fn write_control(&mut self, bits: u32) {
        self.control = bits;
        if bits == 0 {
            self.disables += 1;
        }
        if bits & con::START != 0 {
            self.start_requests += 1;
            self.first_chunk_of_txn = true;
            if self.start_responds {
                self.pending |= int::START;
            }
        }
        if bits & con::STOP != 0 {
            self.stop_requests += 1;
            if self.stop_responds {
                self.pending |= int::STOP;
            }
        }
    }

    fn write_int_enable(&mut self, bits: u32) {
        self.int_enable = bits;
    }

    fn pending(&self) -> u32 {
        self.pending
    }

    fn clear_pending(&mut self, bits: u32) {
        self.pending &= !bits;
    }

    fn write_clock_div(&mut self, value: u32) {
        self.clock_div = Some(value);
    }

    fn write_tx_count(&mut self, bytes: u32) {
        let acked = match self.present_address {
            Some(address) => !self.first_chunk_of_txn || self.loaded_address() == address,
            None => !(self.nack_first_chunk && self.first_chunk_of_txn),
        };
        self.first_chunk_of_txn = false;

        self.tx_counts.push(bytes);
        self.tx_words.push(core::mem::take(&mut self.loading));

        if !acked {
            self.pending |= int::NAKRCV;
        } else if self.complete_responds {
            self.pending |= int::MBTF;
        }
    }

    fn write_tx_word(&mut self, index: usize, word: u32) {
        assert_eq!(index, self.loading.len(), "FIFO words loaded out of order");
        self.loading.push(word);
    }

    fn write_clock_source_div(&mut self, div: u32) {
        self.clock_source_div = Some(div);
    }
}
