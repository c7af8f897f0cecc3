//! Fixed-width elapsed-time field for trace lines.

use std::fmt;
use std::time::Duration;

/// Width of a rendered stamp: `HHH:MM:SS.mmm`.
pub const STAMP_WIDTH: usize = 13;

const MILLIS_PER_SECOND: u128 = 1_000;
const HOUR_WRAP: u128 = 1_000;
const WRAP_MILLIS: u128 = HOUR_WRAP * 60 * 60 * MILLIS_PER_SECOND;

/// Monotonic tick count rendered as `HHH:MM:SS.mmm`.
///
/// Minutes and seconds are decomposed base 60. Hours wrap at 1000 so the
/// field never grows.
///
/// # Example
///
/// ```rust
/// use jumptable_fsm::diagnostics::TickStamp;
///
/// // 1h 2m 3.5s at 1000 ticks per second
/// let stamp = TickStamp::from_ticks(3_723_500, 1_000);
/// assert_eq!(stamp.as_str(), "001:02:03.500");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickStamp {
    buf: [u8; STAMP_WIDTH],
}

impl TickStamp {
    pub fn from_ticks(ticks: u64, ticks_per_second: u64) -> Self {
        let rate = u128::from(ticks_per_second.max(1));
        let millis = (u128::from(ticks) * MILLIS_PER_SECOND / rate) % WRAP_MILLIS;
        Self::from_millis(millis as u64)
    }

    pub fn from_duration(elapsed: Duration) -> Self {
        Self::from_millis((elapsed.as_millis() % WRAP_MILLIS) as u64)
    }

    fn from_millis(millis: u64) -> Self {
        let mut buf = *b"000:00:00.000";
        let mut rest = millis;

        write_digits(&mut buf[10..13], rest % 1_000);
        rest /= 1_000;
        write_digits(&mut buf[7..9], rest % 60);
        rest /= 60;
        write_digits(&mut buf[4..6], rest % 60);
        rest /= 60;
        write_digits(&mut buf[0..3], rest % 1_000);

        Self { buf }
    }

    pub fn as_str(&self) -> &str {
        // only ASCII digits and separators are ever written
        std::str::from_utf8(&self.buf).unwrap_or("???:??:??.???")
    }
}

/// Write `value` zero-padded into `field`, least significant digit last.
fn write_digits(field: &mut [u8], mut value: u64) {
    for slot in field.iter_mut().rev() {
        *slot = b'0' + (value % 10) as u8;
        value /= 10;
    }
}

impl fmt::Display for TickStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for TickStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TickStamp").field(&self.as_str()).finish()
    }
}
