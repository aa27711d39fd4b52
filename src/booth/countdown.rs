// SPDX-License-Identifier: GPL-3.0-only

//! Countdown timer preceding each shot
//!
//! `count_from(n)` shows n, n-1, ..., 1 for one second each, then hides the
//! display and returns. Single-shot: there is no cancellation path, and a
//! new call is an independent sequence.

use crate::constants::timing::COUNTDOWN_TICK;

/// One step of a running countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// A tick value became visible
    Tick(u32),
    /// The countdown finished and the display is hidden
    Hidden,
}

/// Run a countdown from `seconds` down to 1
///
/// Each tick is emitted immediately when it becomes visible, so the caller
/// can render it for the full second it stays on screen. Completion is
/// signalled exactly once, via the final `Hidden` event and the return.
pub async fn count_from<F>(seconds: u32, mut emit: F)
where
    F: FnMut(CountdownEvent),
{
    for tick in (1..=seconds).rev() {
        emit(CountdownEvent::Tick(tick));
        tokio::time::sleep(COUNTDOWN_TICK).await;
    }

    emit(CountdownEvent::Hidden);
}
