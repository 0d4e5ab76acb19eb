//! Spoken time-phrase parsing
//!
//! Turns short clock phrases ("18:30", "6:30 pm", "7") into the next
//! wall-clock instant matching them. A time already passed today resolves
//! to tomorrow, so results are always strictly in the future.

use chrono::{DateTime, Days, Duration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone};

/// Bound on the forward scan used to cross a DST gap
const MAX_DST_FORWARD_SHIFT_MINUTES: i64 = 180;

/// Meridiem suffix of a clock phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

/// Parse a clock phrase against the current local time
///
/// Accepted forms: `HH:MM` (24-hour), `H[:MM] am|pm`, and bare `H[:MM]`
/// read as 24-hour with minutes defaulting to zero. Seconds are always
/// zeroed. Returns `None` for anything else; the caller re-prompts.
#[must_use]
pub fn next_occurrence(phrase: &str) -> Option<DateTime<Local>> {
    next_occurrence_after(phrase, &Local::now())
}

/// Parse a clock phrase against an explicit reference instant
///
/// Generic over the time zone so behavior can be pinned in tests. A
/// candidate equal to the reference also rolls over to the next day.
#[must_use]
pub fn next_occurrence_after<Tz: TimeZone>(
    phrase: &str,
    now: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    let time = parse_clock(phrase)?;
    let tz = now.timezone();
    let today = now.date_naive();

    let candidate = resolve_local(&tz, today, time)?;
    if candidate > *now {
        return Some(candidate);
    }
    resolve_local(&tz, today.checked_add_days(Days::new(1))?, time)
}

/// Parse the wall-clock portion of a phrase
fn parse_clock(phrase: &str) -> Option<NaiveTime> {
    let trimmed = phrase.trim().to_lowercase();

    let (digits, meridiem) = if let Some(rest) = trimmed.strip_suffix("pm") {
        (rest.trim_end(), Some(Meridiem::Pm))
    } else if let Some(rest) = trimmed.strip_suffix("am") {
        (rest.trim_end(), Some(Meridiem::Am))
    } else {
        (trimmed.as_str(), None)
    };

    let (hour_part, minute_part) = match digits.split_once(':') {
        Some((h, m)) => (h, Some(m)),
        None => (digits, None),
    };

    if hour_part.is_empty()
        || hour_part.len() > 2
        || !hour_part.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let mut hour: u32 = hour_part.parse().ok()?;

    let minute: u32 = match minute_part {
        Some(m) if m.len() == 2 && m.bytes().all(|b| b.is_ascii_digit()) => m.parse().ok()?,
        Some(_) => return None,
        None => 0,
    };

    if let Some(meridiem) = meridiem {
        // Meridiem hours are defined for 1 through 12 only
        if hour == 0 || hour > 12 {
            return None;
        }
        hour = match meridiem {
            Meridiem::Am => hour % 12,
            Meridiem::Pm => hour % 12 + 12,
        };
    }

    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Resolve a naive date+time in `tz`, crossing DST gaps forward
fn resolve_local<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&date.and_time(time)) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            // The requested minute does not exist locally (spring-forward
            // gap); take the first representable minute after it
            let mut probe = date.and_time(time);
            for _ in 0..MAX_DST_FORWARD_SHIFT_MINUTES {
                probe += Duration::minutes(1);
                match tz.from_local_datetime(&probe) {
                    LocalResult::Single(dt) => return Some(dt),
                    LocalResult::Ambiguous(earliest, _) => return Some(earliest),
                    LocalResult::None => {}
                }
            }
            None
        }
    }
}
