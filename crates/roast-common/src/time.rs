//! Calendar arithmetic for day, hour and week windows.
//!
//! All instants are stored as UTC. Day and week boundaries are computed in
//! the calendar's time zone, so "today" and "hour of day" follow the user's
//! wall clock. End-of-day is the last millisecond before the next midnight,
//! which matches the millisecond precision records are stored with.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone, Timelike, Utc, Weekday};

#[derive(Debug, Clone)]
pub struct Calendar<Tz: TimeZone> {
    tz: Tz,
    week_starts_on: Weekday,
}

impl Calendar<Local> {
    pub fn local(week_starts_on: Weekday) -> Self {
        Self::new(Local, week_starts_on)
    }
}

impl<Tz: TimeZone> Calendar<Tz> {
    pub fn new(tz: Tz, week_starts_on: Weekday) -> Self {
        Self { tz, week_starts_on }
    }

    pub fn week_starts_on(&self) -> Weekday {
        self.week_starts_on
    }

    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.tz).date_naive()
    }

    /// Midnight of `date` in this calendar's zone, as UTC. A midnight that
    /// does not exist (DST gap) resolves to the first valid instant after it.
    pub fn midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        let naive = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        match self.tz.from_local_datetime(&naive).earliest() {
            Some(local) => local.with_timezone(&Utc),
            None => {
                let shifted = naive + Duration::hours(1);
                self.tz
                    .from_local_datetime(&shifted)
                    .earliest()
                    .map(|local| local.with_timezone(&Utc))
                    .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
            }
        }
    }

    pub fn start_of_day(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        self.midnight(self.local_date(at))
    }

    pub fn end_of_day(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        let next = self.local_date(at) + Duration::days(1);
        self.midnight(next) - Duration::milliseconds(1)
    }

    pub fn start_of_week(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        let date = self.local_date(at);
        let offset = (7 + date.weekday().num_days_from_monday()
            - self.week_starts_on.num_days_from_monday())
            % 7;
        self.midnight(date - Duration::days(offset as i64))
    }

    pub fn end_of_week(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        let start = self.local_date(self.start_of_week(at));
        self.midnight(start + Duration::days(7)) - Duration::milliseconds(1)
    }

    pub fn previous_week_start(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        let start = self.local_date(self.start_of_week(at));
        self.midnight(start - Duration::days(7))
    }

    pub fn previous_week_end(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        self.start_of_week(at) - Duration::milliseconds(1)
    }

    /// Local midnights of every calendar day in `[start, end]`, inclusive.
    pub fn days_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let mut days = Vec::new();
        let mut current = self.local_date(start);
        let last = self.local_date(end);

        while current <= last {
            days.push(self.midnight(current));
            current += Duration::days(1);
        }

        days
    }

    pub fn hour_of_day(&self, at: DateTime<Utc>) -> u32 {
        at.with_timezone(&self.tz).hour()
    }

    pub fn day_name(&self, at: DateTime<Utc>) -> &'static str {
        match self.local_date(at).weekday() {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_day_boundaries() {
        let cal = Calendar::new(Utc, Weekday::Mon);
        let at = utc(2024, 3, 6, 15, 30);

        assert_eq!(cal.start_of_day(at), utc(2024, 3, 6, 0, 0));
        assert_eq!(cal.end_of_day(at), utc(2024, 3, 7, 0, 0) - Duration::milliseconds(1));
        assert_eq!(cal.hour_of_day(at), 15);
    }

    #[test]
    fn test_week_boundaries_monday_start() {
        let cal = Calendar::new(Utc, Weekday::Mon);
        // 2024-03-06 is a Wednesday
        let at = utc(2024, 3, 6, 15, 30);

        assert_eq!(cal.start_of_week(at), utc(2024, 3, 4, 0, 0));
        assert_eq!(cal.end_of_week(at), utc(2024, 3, 11, 0, 0) - Duration::milliseconds(1));
        assert_eq!(cal.previous_week_start(at), utc(2024, 2, 26, 0, 0));
        assert_eq!(cal.previous_week_end(at), utc(2024, 3, 4, 0, 0) - Duration::milliseconds(1));
    }

    #[test]
    fn test_week_boundaries_sunday_start() {
        let cal = Calendar::new(Utc, Weekday::Sun);
        let at = utc(2024, 3, 6, 15, 30);
        assert_eq!(cal.start_of_week(at), utc(2024, 3, 3, 0, 0));

        let sunday = utc(2024, 3, 3, 8, 0);
        assert_eq!(cal.start_of_week(sunday), utc(2024, 3, 3, 0, 0));
    }

    #[test]
    fn test_days_in_range_inclusive() {
        let cal = Calendar::new(Utc, Weekday::Mon);
        let start = utc(2024, 3, 4, 0, 0);
        let days = cal.days_in_range(start, cal.end_of_week(start));

        assert_eq!(days.len(), 7);
        assert_eq!(days[0], start);
        assert_eq!(days[6], utc(2024, 3, 10, 0, 0));
    }

    #[test]
    fn test_offset_zone_shifts_day_and_hour() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let cal = Calendar::new(tz, Weekday::Mon);
        let at = utc(2024, 3, 6, 23, 30);

        assert_eq!(cal.hour_of_day(at), 1);
        assert_eq!(cal.start_of_day(at), utc(2024, 3, 6, 22, 0));
        assert_eq!(cal.day_name(at), "Thursday");
    }

    #[test]
    fn test_day_name_in_named_zone() {
        let cal = Calendar::local(Weekday::Mon);
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let noon = cal.midnight(sunday) + Duration::hours(12);
        assert_eq!(cal.day_name(noon), "Sunday");
    }
}
