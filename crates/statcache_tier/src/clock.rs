// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use tick::Clock;
use tick::runtime::InactiveClock;

/// Returns a clock backed by the operating system time.
///
/// Cache tiers only read absolute time from their clock, so no runtime needs to drive
/// the clock's timers. Tests should use `tick::ClockControl` instead.
#[must_use]
pub fn system_clock() -> Clock {
    let (clock, _driver) = InactiveClock::default().activate();
    clock
}
