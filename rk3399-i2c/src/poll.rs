//! Bounded busy-wait polling
//!
//! There is no scheduler to yield to at bring-up time, so every wait in
//! the driver is the same shape: spin on a status condition with a
//! countdown budget, sleeping one microsecond between checks. The
//! start-wait, stop-wait and per-chunk transmit-wait all reuse this
//! primitive with a fresh budget each; budgets are never shared across
//! waits.

use embedded_hal::delay::DelayNs;

/// Poll budget for every wait, in 1 us quanta (100 ms).
pub const TIMEOUT_POLLS: u32 = 100_000;

/// Outcome of one bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollResult {
    /// The awaited status bit asserted within the budget.
    Acknowledged,
    /// The budget ran out with the condition still false.
    TimedOut,
}

/// Poll `check` until it reports true or `budget` countdown quanta have
/// elapsed.
///
/// The closure owns the status-bit handling: on a hit it must clear the
/// bit it was watching before returning true. Exhaustion is only checked
/// after the condition comes back false, so the check at countdown zero
/// still executes once (budget N allows N + 1 checks).
pub fn poll_until<D, F>(delay: &mut D, budget: u32, mut check: F) -> PollResult
where
    D: DelayNs,
    F: FnMut() -> bool,
{
    let mut remaining = budget;
    loop {
        if check() {
            return PollResult::Acknowledged;
        }
        if remaining == 0 {
            return PollResult::TimedOut;
        }
        delay.delay_us(1);
        remaining -= 1;
    }
}
