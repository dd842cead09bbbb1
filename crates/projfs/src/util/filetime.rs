//! FILETIME conversion.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds between the FILETIME epoch (1601-01-01) and the Unix epoch.
const FILETIME_UNIX_DIFF_SECS: u64 = 11_644_473_600;

/// 100-nanosecond intervals per second.
const INTERVALS_PER_SEC: u64 = 10_000_000;

/// Convert a `SystemTime` to an i64 FILETIME value (100-nanosecond
/// intervals since January 1, 1601 UTC).
#[cfg_attr(not(windows), allow(dead_code))]
pub fn systemtime_to_filetime(time: SystemTime) -> i64 {
    let duration: Duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);

    let intervals: u64 = duration.as_secs() * INTERVALS_PER_SEC
        + duration.subsec_nanos() as u64 / 100
        + FILETIME_UNIX_DIFF_SECS * INTERVALS_PER_SEC;

    intervals as i64
}

/// FILETIME for the current system time. Placeholder timestamps all use
/// this value.
#[cfg_attr(not(windows), allow(dead_code))]
pub fn filetime_now() -> i64 {
    systemtime_to_filetime(SystemTime::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_epoch() {
        let ft: i64 = systemtime_to_filetime(UNIX_EPOCH);
        assert_eq!(ft, (FILETIME_UNIX_DIFF_SECS * INTERVALS_PER_SEC) as i64);
    }

    #[test]
    fn test_one_second_past_epoch() {
        let ft: i64 = systemtime_to_filetime(UNIX_EPOCH + Duration::from_secs(1));
        let epoch: i64 = systemtime_to_filetime(UNIX_EPOCH);
        assert_eq!(ft - epoch, INTERVALS_PER_SEC as i64);
    }

    #[test]
    fn test_pre_epoch_clamps_to_epoch() {
        let ft: i64 = systemtime_to_filetime(UNIX_EPOCH - Duration::from_secs(10));
        assert_eq!(ft, systemtime_to_filetime(UNIX_EPOCH));
    }

    #[test]
    fn test_now_is_recent() {
        // 2020-01-01 as FILETIME.
        let year_2020: i64 =
            systemtime_to_filetime(UNIX_EPOCH + Duration::from_secs(1_577_836_800));
        assert!(filetime_now() > year_2020);
    }
}
