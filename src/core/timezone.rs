use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};

/// Branch business timezone handling.
///
/// All timestamps are stored as UTC; collection days are bucketed in Indian
/// Standard Time (UTC+05:30) so a "daily" report matches the branch ledger
/// day rather than the UTC day.
pub struct BusinessTimezone;

const IST_OFFSET_SECONDS: i32 = 5 * 3600 + 1800;

impl BusinessTimezone {
    fn ist() -> FixedOffset {
        FixedOffset::east_opt(IST_OFFSET_SECONDS).expect("valid IST offset")
    }

    /// Convert a UTC timestamp to IST.
    pub fn utc_to_ist(utc_time: DateTime<Utc>) -> DateTime<FixedOffset> {
        utc_time.with_timezone(&Self::ist())
    }

    /// The IST calendar date a UTC timestamp falls on.
    pub fn business_date(utc_time: DateTime<Utc>) -> NaiveDate {
        Self::utc_to_ist(utc_time).date_naive()
    }

    /// UTC bounds `[start, end)` of one IST business day, for range queries
    /// over the collection ledger.
    pub fn day_bounds_utc(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always a valid time");
        let start = Self::ist()
            .from_local_datetime(&midnight)
            .single()
            .expect("fixed offsets have no DST gaps")
            .with_timezone(&Utc);
        (start, start + Duration::days(1))
    }
}
