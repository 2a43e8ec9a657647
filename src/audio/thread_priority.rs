// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use thread_priority::{set_current_thread_priority, ThreadPriority, ThreadPriorityValue};
use tracing::{info, warn};

const PRIORITY_ENV: &str = "WAVSTREAM_FEEDER_PRIORITY";

/// Resolves the feeder thread priority. WAVSTREAM_FEEDER_PRIORITY (0-99) wins
/// over the configured value; out of range values are ignored.
pub fn feeder_thread_priority(configured: Option<u8>) -> Option<ThreadPriorityValue> {
    std::env::var(PRIORITY_ENV)
        .ok()
        .and_then(|v| v.parse::<u8>().ok())
        .or(configured)
        .and_then(priority_value)
}

fn priority_value(n: u8) -> Option<ThreadPriorityValue> {
    (n < 100).then(|| ThreadPriorityValue::try_from(n).ok())?
}

pub(crate) fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| {
            v == "1"
                || v.eq_ignore_ascii_case("true")
                || v.eq_ignore_ascii_case("yes")
                || v.eq_ignore_ascii_case("on")
        })
        .unwrap_or(false)
}

/// Returns whether the feeder should try for RT (SCHED_FIFO) scheduling.
/// Off unless WAVSTREAM_RT_FEEDER=1.
pub fn rt_feeder_enabled() -> bool {
    env_flag("WAVSTREAM_RT_FEEDER")
}

/// Applies `priority` to the calling thread. Failures are logged and
/// otherwise ignored; the feeder still runs at the default priority.
pub fn configure_feeder_priority(priority: ThreadPriorityValue) {
    let tp = ThreadPriority::Crossplatform(priority);
    if let Err(e) = set_current_thread_priority(tp) {
        warn!(error = ?e, "Failed to set feeder thread priority");
    }

    #[cfg(unix)]
    if rt_feeder_enabled() {
        use thread_priority::unix::{
            set_thread_priority_and_policy, thread_native_id, RealtimeThreadSchedulePolicy,
            ThreadSchedulePolicy,
        };
        let tid = thread_native_id();
        match set_thread_priority_and_policy(
            tid,
            tp,
            ThreadSchedulePolicy::Realtime(RealtimeThreadSchedulePolicy::Fifo),
        ) {
            Ok(()) => info!("Enabled RT SCHED_FIFO for feeder thread"),
            Err(e) => warn!(error = %e, "Failed to set RT SCHED_FIFO for feeder thread"),
        }
    }
}
