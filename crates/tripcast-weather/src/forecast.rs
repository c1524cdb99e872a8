//! Day and hour views over the 3-hour forecast feed.

use chrono::{NaiveTime, Timelike};

use crate::types::{ForecastDay, ForecastEntry, ForecastHour};

/// Number of 3-hour steps covering the next 24 hours
pub const HOURLY_ENTRIES: usize = 8;

const DISPLAY_DAY_FORMAT: &str = "%a, %b %-d";

fn is_noon(time: NaiveTime) -> bool {
    time.hour() == 12 && time.minute() == 0 && time.second() == 0
}

/// One entry per day: the steps stamped exactly 12:00:00, in feed order.
pub fn daily_forecast(feed: &[ForecastEntry]) -> Vec<ForecastDay> {
    feed.iter()
        .filter(|entry| is_noon(entry.timestamp.time()))
        .map(|entry| ForecastDay {
            date: entry.timestamp,
            display_day: entry.timestamp.format(DISPLAY_DAY_FORMAT).to_string(),
            temperature: entry.temperature.round() as i32,
            description: entry.description.clone(),
            icon_id: entry.icon_id.clone(),
        })
        .collect()
}

/// The first `HOURLY_ENTRIES` steps of the feed, unfiltered.
pub fn hourly_forecast(feed: &[ForecastEntry]) -> Vec<ForecastHour> {
    feed.iter()
        .take(HOURLY_ENTRIES)
        .map(|entry| ForecastHour {
            time: entry.timestamp,
            temperature: entry.temperature.round() as i32,
            icon_id: entry.icon_id.clone(),
            description: entry.description.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use std::collections::BTreeSet;

    fn feed_from(start: NaiveDateTime, steps: usize) -> Vec<ForecastEntry> {
        (0..steps)
            .map(|i| ForecastEntry {
                timestamp: start + Duration::hours(3 * i as i64),
                temperature: 10.0 + i as f64 * 0.4,
                description: format!("step {}", i),
                icon_id: "01d".to_string(),
            })
            .collect()
    }

    fn start_at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_daily_picks_noon_entries() {
        let feed = feed_from(start_at(15), 40);
        let days = daily_forecast(&feed);

        assert!(days.iter().all(|d| d.date.time() == NaiveTime::from_hms_opt(12, 0, 0).unwrap()));

        let noon_days: BTreeSet<_> = feed
            .iter()
            .filter(|e| e.timestamp.hour() == 12)
            .map(|e| e.timestamp.date())
            .collect();
        assert_eq!(days.len(), noon_days.len());
        assert_eq!(days.len(), 5);
    }

    #[test]
    fn test_daily_is_deterministic() {
        let feed = feed_from(start_at(0), 40);
        assert_eq!(daily_forecast(&feed), daily_forecast(&feed));
    }

    #[test]
    fn test_daily_display_day_and_rounding() {
        let feed = vec![ForecastEntry {
            timestamp: start_at(12),
            temperature: 17.6,
            description: "clear sky".to_string(),
            icon_id: "01d".to_string(),
        }];
        let days = daily_forecast(&feed);
        assert_eq!(days[0].display_day, "Wed, May 1");
        assert_eq!(days[0].temperature, 18);
    }

    #[test]
    fn test_daily_ignores_near_noon_steps() {
        let mut feed = feed_from(start_at(12), 1);
        feed[0].timestamp = start_at(12) + Duration::seconds(1);
        assert!(daily_forecast(&feed).is_empty());
    }

    #[test]
    fn test_hourly_takes_first_eight_in_order() {
        let feed = feed_from(start_at(0), 40);
        let hours = hourly_forecast(&feed);

        assert_eq!(hours.len(), HOURLY_ENTRIES);
        for (hour, entry) in hours.iter().zip(&feed) {
            assert_eq!(hour.time, entry.timestamp);
            assert_eq!(hour.description, entry.description);
        }
    }

    #[test]
    fn test_hourly_short_feed() {
        assert_eq!(hourly_forecast(&feed_from(start_at(0), 3)).len(), 3);
        assert!(hourly_forecast(&[]).is_empty());
    }
}
