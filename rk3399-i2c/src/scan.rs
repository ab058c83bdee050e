//! Bus-scan utility
//!
//! Probes the assignable 7-bit address range with zero-payload writes. A
//! device that acknowledges its address byte is reported present; a NACK
//! is the normal answer from an empty address and, like every other
//! error, counts as absent. Probes are never retried.

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::driver::I2cMaster;
use crate::regs::I2cRegisters;

/// First address probed; 0x00..=0x02 are reserved.
pub const SCAN_FIRST: u8 = 0x03;

/// Last address probed; 0x78..=0x7f are reserved.
pub const SCAN_LAST: u8 = 0x77;

/// Upper bound on reportable devices.
pub const MAX_DEVICES: usize = 128;

/// Settle time after every probe, acknowledged or not.
const PROBE_SETTLE_US: u32 = 10;

impl<R: I2cRegisters, D: DelayNs> I2cMaster<R, D> {
    /// Probe addresses [`SCAN_FIRST`]..=[`SCAN_LAST`] in ascending order
    /// and return those that acknowledged, in probe order.
    ///
    /// Each probe is a write of a single zero register byte with no
    /// payload, followed by a fixed settle delay whatever the outcome.
    pub fn scan(&mut self) -> Vec<u8, MAX_DEVICES> {
        #[cfg(feature = "defmt")]
        defmt::info!("scanning i2c bus");

        let mut found = Vec::new();
        for address in SCAN_FIRST..=SCAN_LAST {
            if self.write(address, 0x00, 1, &[]).is_ok() {
                #[cfg(feature = "defmt")]
                defmt::info!("i2c device at {=u8:#04x}", address);
                let _ = found.push(address);
            }
            self.delay.delay_us(PROBE_SETTLE_US);
        }

        #[cfg(feature = "defmt")]
        defmt::info!("i2c scan complete, {=usize} device(s)", found.len());

        found
    }
}
