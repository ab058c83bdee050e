//! Polled master-mode I2C driver for the Rockchip RK3399
//!
//! This crate drives one RK3399 I2C controller instance during early
//! firmware bring-up, before an interrupt subsystem or OS is available.
//! All waiting is bounded busy-polling on the controller's status bits;
//! nothing here suspends or yields.
//!
//! Only the write path is implemented: a transaction is start condition,
//! address byte, optional register-address prefix, payload, stop
//! condition. Payloads longer than the 32-byte transmit FIFO are split
//! into sequential triggered bursts. A bus-scan utility probes the 7-bit
//! address space for responding devices.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  scan (address probe loop)           │
//! └──────────────────────────────────────┘
//!                   │
//!                   ▼
//! ┌──────────────────────────────────────┐
//! │  driver (clock, start/stop, packer,  │
//! │          chunked transaction engine) │
//! └──────────────────────────────────────┘
//!          │                  │
//!          ▼                  ▼
//! ┌────────────────┐  ┌────────────────┐
//! │ poll (bounded  │  │ regs (register │
//! │ busy-wait)     │  │ bank / MMIO)   │
//! └────────────────┘  └────────────────┘
//! ```
//!
//! Hardware access goes through the [`regs::I2cRegisters`] trait, so the
//! engine is board-agnostic and tested on the host against a simulated
//! controller. [`regs::MmioI2c`] is the real memory-mapped implementation.
//!
//! The caller is responsible for pin-mux and reference-clock selection
//! before any call, and must serialize all use of one bus instance: the
//! driver is single-threaded, non-reentrant, and owns the controller's
//! register window exclusively.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod driver;
pub mod poll;
pub mod regs;
pub mod scan;

#[cfg(test)]
pub(crate) mod mock;

// Re-export key types at crate root for convenience
pub use driver::{Error, I2cConfig, I2cMaster};
pub use poll::PollResult;
pub use regs::{I2cRegisters, MmioI2c};
