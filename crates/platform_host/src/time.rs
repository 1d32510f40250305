//! Wall-clock stamps for process records and snapshot envelopes.

use std::cell::Cell;

thread_local! {
    static LAST_SNAPSHOT_STAMP_MS: Cell<u64> = const { Cell::new(0) };
}

/// Current unix time in milliseconds. Used for `ProcessRecord::created_at_unix_ms`.
#[cfg(target_arch = "wasm32")]
pub fn unix_time_ms_now() -> u64 {
    js_sys::Date::now().max(0.0) as u64
}

/// Current unix time in milliseconds. Used for `ProcessRecord::created_at_unix_ms`.
#[cfg(not(target_arch = "wasm32"))]
pub fn unix_time_ms_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

/// Stamp for a snapshot envelope write.
///
/// Layout, dock and preference saves can land in the same millisecond; each stamp is still
/// strictly greater than the one before it on this thread, so the latest save always wins.
pub fn next_snapshot_stamp_ms() -> u64 {
    bump_stamp(unix_time_ms_now())
}

fn bump_stamp(now: u64) -> u64 {
    LAST_SNAPSHOT_STAMP_MS.with(|last| {
        let next = now.max(last.get().saturating_add(1));
        last.set(next);
        next
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_stamps_strictly_increase() {
        let stamps = (0..64).map(|_| next_snapshot_stamp_ms()).collect::<Vec<_>>();
        assert!(stamps.windows(2).all(|pair| pair[1] > pair[0]));
    }

    #[test]
    fn a_clock_step_backwards_does_not_reorder_saves() {
        let first = bump_stamp(5_000_000);
        let second = bump_stamp(1_000);
        assert_eq!(second, first + 1);
    }
}
