use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::America::New_York;

/// Gate for whether the scheduler's timer loop should run jobs right now
/// (§4.8). Deterministic, no side effects — the same contract as the
/// teacher's `CalendarSpec`, narrowed from "valid bar end for gap detection"
/// to "market open for order submission".
pub trait MarketCalendar: Send + Sync {
    fn is_open(&self, now: DateTime<Utc>) -> bool;
}

/// NYSE regular session: weekdays 09:30-16:00 Eastern, excluding a hardcoded
/// holiday table. Grounded on the teacher's `CalendarSpec::NyseWeekdays`,
/// generalized from a fixed UTC-5 offset to `chrono-tz`'s real Eastern zone
/// so daylight saving is handled correctly rather than approximated away.
pub struct NyseCalendar;

impl MarketCalendar for NyseCalendar {
    fn is_open(&self, now: DateTime<Utc>) -> bool {
        let et = now.with_timezone(&New_York);
        if matches!(et.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        if is_nyse_holiday(et.date_naive()) {
            return false;
        }
        let open = et.date_naive().and_hms_opt(9, 30, 0).expect("valid time");
        let close = et.date_naive().and_hms_opt(16, 0, 0).expect("valid time");
        let local = et.naive_local();
        local >= open && local < close
    }
}

/// Always open — used by tests and the backtest runner, which has no
/// wall-clock notion of a trading session.
pub struct AlwaysOpenCalendar;

impl MarketCalendar for AlwaysOpenCalendar {
    fn is_open(&self, _now: DateTime<Utc>) -> bool {
        true
    }
}

/// Hardcoded NYSE market holidays, 2023-2026 (observed dates).
fn is_nyse_holiday(d: NaiveDate) -> bool {
    const HOLIDAYS: &[(i32, u32, u32)] = &[
        (2023, 1, 2),
        (2023, 1, 16),
        (2023, 2, 20),
        (2023, 4, 7),
        (2023, 5, 29),
        (2023, 6, 19),
        (2023, 7, 4),
        (2023, 9, 4),
        (2023, 11, 23),
        (2023, 12, 25),
        (2024, 1, 1),
        (2024, 1, 15),
        (2024, 2, 19),
        (2024, 3, 29),
        (2024, 5, 27),
        (2024, 6, 19),
        (2024, 7, 4),
        (2024, 9, 2),
        (2024, 11, 28),
        (2024, 12, 25),
        (2025, 1, 1),
        (2025, 1, 20),
        (2025, 2, 17),
        (2025, 4, 18),
        (2025, 5, 26),
        (2025, 6, 19),
        (2025, 7, 4),
        (2025, 9, 1),
        (2025, 11, 27),
        (2025, 12, 25),
        (2026, 1, 1),
        (2026, 1, 19),
        (2026, 2, 16),
        (2026, 4, 3),
        (2026, 5, 25),
        (2026, 6, 19),
        (2026, 7, 3),
        (2026, 9, 7),
        (2026, 11, 26),
        (2026, 12, 25),
    ];
    HOLIDAYS.contains(&(d.year(), d.month(), d.day()))
}
