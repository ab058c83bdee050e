//! Controller register bank
//!
//! The transaction engine never touches raw addresses; everything goes
//! through the [`I2cRegisters`] trait. [`MmioI2c`] is the real
//! memory-mapped implementation, built once from the controller base
//! address and owning that register window exclusively from then on.
//! Host tests substitute a simulated controller.

/// Byte offsets of the controller registers used by the write path.
pub mod offset {
    /// Control register
    pub const CON: usize = 0x000;
    /// SCL clock divider (low phase in bits 15:0, high phase in 31:16)
    pub const CLKDIV: usize = 0x004;
    /// Master transmit byte count
    pub const MTXCNT: usize = 0x010;
    /// Interrupt enable
    pub const IEN: usize = 0x018;
    /// Interrupt pending (write 1 to clear)
    pub const IPD: usize = 0x01c;
    /// Transmit FIFO window, 8 x 32-bit words
    pub const TXDATA: usize = 0x100;
}

/// Control register bits
pub mod con {
    /// Controller enable
    pub const ENABLE: u32 = 1 << 0;
    /// Operation mode field (bits 2:1): transmit
    pub const MODE_TX: u32 = 0b00 << 1;
    /// Generate a start condition
    pub const START: u32 = 1 << 3;
    /// Generate a stop condition
    pub const STOP: u32 = 1 << 4;
}

/// Interrupt bit positions, shared by the enable and pending registers.
pub mod int {
    /// Byte transmit finished
    pub const BTF: u32 = 1 << 0;
    /// Byte receive finished
    pub const BRF: u32 = 1 << 1;
    /// Master transmit transfer finished
    pub const MBTF: u32 = 1 << 2;
    /// Master receive transfer finished
    pub const MBRF: u32 = 1 << 3;
    /// Start condition sent
    pub const START: u32 = 1 << 4;
    /// Stop condition sent
    pub const STOP: u32 = 1 << 5;
    /// NACK received
    pub const NAKRCV: u32 = 1 << 6;
    /// Every pending bit, for whole-register clears
    pub const ALL: u32 = 0x7f;
}

/// Transmit FIFO depth in bytes; one triggered burst moves at most this.
pub const FIFO_DEPTH_BYTES: usize = 32;

/// I2C4 controller base on the RK3399 (the instance wired out on
/// ROCKPRO64).
pub const I2C4_BASE: usize = 0xff3d_0000;

/// PMUCRU_CLKSEL_CON3: source-clock divisor for the PMU-domain I2C
/// controllers. Upper halfword is the Rockchip write-enable mask.
pub const PMUCRU_CLKSEL_CON3: usize = 0xff75_008c;

/// Register-level window onto one I2C controller instance.
///
/// Whoever holds the implementing value holds the controller: the driver
/// assumes exclusive access and the trait has no locking. Each method is
/// a single register access with no side effects beyond the hardware's
/// own semantics.
pub trait I2cRegisters {
    /// Write the control register.
    fn write_control(&mut self, bits: u32);

    /// Write the interrupt-enable register.
    fn write_int_enable(&mut self, bits: u32);

    /// Read the interrupt-pending register.
    fn pending(&self) -> u32;

    /// Clear the given pending bits (write-1-to-clear).
    fn clear_pending(&mut self, bits: u32);

    /// Write the SCL clock-divider register.
    fn write_clock_div(&mut self, value: u32);

    /// Write the transmit byte count, arming a transmit burst.
    fn write_tx_count(&mut self, bytes: u32);

    /// Write one 32-bit word into the transmit FIFO window.
    fn write_tx_word(&mut self, index: usize, word: u32);

    /// Write the source-clock divisor in the clock unit that feeds this
    /// controller. Implementations apply any write-enable masking the
    /// clock unit requires.
    fn write_clock_source_div(&mut self, div: u32);
}

/// Memory-mapped register bank for one controller instance.
pub struct MmioI2c {
    base: usize,
    clock_sel: usize,
}

impl MmioI2c {
    /// Create the register bank for the controller at `base`, with its
    /// source-clock divisor register at `clock_sel`.
    ///
    /// # Safety
    ///
    /// `base` must be the base address of an RK3399 I2C controller whose
    /// register window is mapped and accessible, and `clock_sel` the
    /// address of its CRU clock-select register. No other code may
    /// access either while this value exists.
    pub const unsafe fn new(base: usize, clock_sel: usize) -> Self {
        Self { base, clock_sel }
    }

    /// Register bank for I2C4 on ROCKPRO64.
    ///
    /// # Safety
    ///
    /// Same exclusivity requirement as [`MmioI2c::new`].
    pub const unsafe fn i2c4() -> Self {
        Self::new(I2C4_BASE, PMUCRU_CLKSEL_CON3)
    }

    fn read_reg(&self, offset: usize) -> u32 {
        unsafe { ((self.base + offset) as *const u32).read_volatile() }
    }

    fn write_reg(&mut self, offset: usize, value: u32) {
        unsafe { ((self.base + offset) as *mut u32).write_volatile(value) }
    }
}

impl I2cRegisters for MmioI2c {
    fn write_control(&mut self, bits: u32) {
        self.write_reg(offset::CON, bits);
    }

    fn write_int_enable(&mut self, bits: u32) {
        self.write_reg(offset::IEN, bits);
    }

    fn pending(&self) -> u32 {
        self.read_reg(offset::IPD)
    }

    fn clear_pending(&mut self, bits: u32) {
        self.write_reg(offset::IPD, bits);
    }

    fn write_clock_div(&mut self, value: u32) {
        self.write_reg(offset::CLKDIV, value);
    }

    fn write_tx_count(&mut self, bytes: u32) {
        self.write_reg(offset::MTXCNT, bytes);
    }

    fn write_tx_word(&mut self, index: usize, word: u32) {
        debug_assert!(index < FIFO_DEPTH_BYTES / 4);
        self.write_reg(offset::TXDATA + index * 4, word);
    }

    fn write_clock_source_div(&mut self, div: u32) {
        unsafe {
            (self.clock_sel as *mut u32).write_volatile((0xffff << 16) | (div & 0xffff));
        }
    }
}
