use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// A point in time as seconds since the Unix epoch plus a nanosecond
/// remainder in `0..1_000_000_000`. Instants before the epoch have negative
/// seconds and a non-negative remainder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    seconds: i64,
    nanos: u32,
}

impl Timestamp {
    /// Returns `None` when `nanos` is not below one second.
    pub fn new(seconds: i64, nanos: u32) -> Option<Timestamp> {
        if nanos >= NANOS_PER_SECOND {
            None
        } else {
            Some(Timestamp { seconds, nanos })
        }
    }

    pub fn from_seconds(seconds: i64) -> Timestamp {
        Timestamp { seconds, nanos: 0 }
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn nanos(&self) -> u32 {
        self.nanos
    }

    /// The epoch itself, which is the zero value on the wire.
    pub fn is_zero(&self) -> bool {
        self.seconds == 0 && self.nanos == 0
    }
}

impl From<SystemTime> for Timestamp {
    fn from(t: SystemTime) -> Self {
        match t.duration_since(UNIX_EPOCH) {
            Ok(d) => Timestamp {
                seconds: d.as_secs() as i64,
                nanos: d.subsec_nanos(),
            },
            Err(e) => {
                let d = e.duration();
                let mut seconds = -(d.as_secs() as i64);
                let mut nanos = d.subsec_nanos();
                if nanos != 0 {
                    seconds -= 1;
                    nanos = NANOS_PER_SECOND - nanos;
                }
                Timestamp { seconds, nanos }
            }
        }
    }
}

impl From<Timestamp> for SystemTime {
    fn from(t: Timestamp) -> Self {
        if t.seconds >= 0 {
            UNIX_EPOCH + Duration::new(t.seconds as u64, t.nanos)
        } else {
            UNIX_EPOCH - Duration::from_secs(t.seconds.unsigned_abs()) + Duration::from_nanos(t.nanos as u64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_whole_second_remainder() {
        assert!(Timestamp::new(0, NANOS_PER_SECOND).is_none());
        assert!(Timestamp::new(0, NANOS_PER_SECOND - 1).is_some());
    }

    #[test]
    fn system_time_before_epoch() {
        let t = UNIX_EPOCH - Duration::from_millis(1500);
        let ts = Timestamp::from(t);
        assert_eq!(ts.seconds(), -2);
        assert_eq!(ts.nanos(), 500_000_000);
        assert_eq!(SystemTime::from(ts), t);
    }

    #[test]
    fn system_time_after_epoch() {
        let t = UNIX_EPOCH + Duration::new(1_500_000_000, 42);
        let ts = Timestamp::from(t);
        assert_eq!(ts, Timestamp::new(1_500_000_000, 42).unwrap());
        assert_eq!(SystemTime::from(ts), t);
    }
}
