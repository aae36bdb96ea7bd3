// Weather domain models and derived values
use super::error::ExtractionError;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta, Utc};
use std::collections::BTreeMap;

/// Current conditions as reported by the forecast upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub apparent_temperature: f64,
    pub precipitation: f64,
    pub cloud_cover: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
}

/// Aggregates for a single forecast day ("tomorrow").
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSummary {
    pub date: NaiveDate,
    pub temp_min: f64,
    pub temp_max: f64,
    pub apparent_temp_min: f64,
    pub apparent_temp_max: f64,
    pub precipitation_sum: f64,
    pub wind_speed_max: f64,
    pub uv_index_max: f64,
    pub mean_cloud_cover: f64,
}

/// Evenly spaced samples described by a half-open `[start, end)` range and a step.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySeries {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub interval: TimeDelta,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyMean {
    pub date: NaiveDate,
    pub mean: Option<f64>,
}

impl HourlySeries {
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: TimeDelta,
        values: Vec<Option<f64>>,
    ) -> Self {
        Self {
            start,
            end,
            interval,
            values,
        }
    }

    /// Timestamps of every sample: includes `start`, excludes `end`.
    pub fn index(&self) -> Result<Vec<DateTime<Utc>>, ExtractionError> {
        if self.interval <= TimeDelta::zero() {
            return Err(ExtractionError::InvalidSeries(format!(
                "interval must be positive, got {}s",
                self.interval.num_seconds()
            )));
        }

        let mut index = Vec::new();
        let mut at = self.start;
        while at < self.end {
            index.push(at);
            // past the representable range is past `end` too
            match at.checked_add_signed(self.interval) {
                Some(next) => at = next,
                None => break,
            }
        }

        Ok(index)
    }
}

/// Resample the series to calendar days (in `offset` local time) by arithmetic mean.
///
/// Missing samples are skipped; a day with no samples at all has no mean.
/// Buckets are returned in date order.
pub fn daily_means(
    series: &HourlySeries,
    offset: FixedOffset,
) -> Result<Vec<DailyMean>, ExtractionError> {
    let index = series.index()?;
    if index.len() != series.values.len() {
        return Err(ExtractionError::InvalidSeries(format!(
            "index has {} timestamps but series has {} values",
            index.len(),
            series.values.len()
        )));
    }

    let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for (at, value) in index.iter().zip(&series.values) {
        let date = at.with_timezone(&offset).date_naive();
        let bucket = buckets.entry(date).or_insert((0.0, 0));
        if let Some(value) = value {
            bucket.0 += value;
            bucket.1 += 1;
        }
    }

    Ok(buckets
        .into_iter()
        .map(|(date, (sum, count))| DailyMean {
            date,
            mean: (count > 0).then(|| sum / count as f64),
        })
        .collect())
}

/// Mean of the second daily bucket. The series must start at the beginning of
/// "today" and cover at least two days.
pub fn tomorrow_mean(series: &HourlySeries, offset: FixedOffset) -> Result<f64, ExtractionError> {
    let means = daily_means(series, offset)?;
    let tomorrow = means.get(1).ok_or(ExtractionError::TooFewBuckets {
        expected: 2,
        found: means.len(),
    })?;

    tomorrow
        .mean
        .ok_or_else(|| ExtractionError::MissingField(format!("hourly values for {}", tomorrow.date)))
}

/// Average of a daily minimum and maximum.
pub fn midpoint(min: f64, max: f64) -> f64 {
    (min + max) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn series(start: DateTime<Utc>, step_hours: i64, values: &[f64]) -> HourlySeries {
        let interval = TimeDelta::hours(step_hours);
        HourlySeries::new(
            start,
            start + interval * values.len() as i32,
            interval,
            values.iter().copied().map(Some).collect(),
        )
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_index_is_half_open() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let s = series(start, 8, &[1.0, 2.0, 3.0]);
        let index = s.index().unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index[0], start);
        assert!(!index.contains(&s.end));
    }

    #[test]
    fn test_index_stops_at_end_of_time() {
        let end = DateTime::<Utc>::MAX_UTC;
        let start = end - TimeDelta::hours(1);
        let s = HourlySeries::new(start, end, TimeDelta::hours(2), vec![Some(1.0)]);

        assert_eq!(s.index().unwrap(), vec![start]);
    }

    #[test]
    fn test_three_buckets_per_day() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let s = series(start, 8, &[10.0, 20.0, 30.0, 90.0, 80.0, 70.0]);

        let means = daily_means(&s, utc()).unwrap();
        let values: Vec<f64> = means.iter().map(|m| m.mean.unwrap()).collect();
        assert_eq!(values, vec![20.0, 80.0]);
        assert_eq!(tomorrow_mean(&s, utc()).unwrap(), 80.0);
    }

    #[test]
    fn test_mean_is_bit_for_bit_repeatable() {
        let start = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let values: Vec<f64> = (0..48).map(|h| (h as f64 * 1.37) % 100.0).collect();
        let s = series(start, 1, &values);

        let first = tomorrow_mean(&s, utc()).unwrap();
        let second = tomorrow_mean(&s, utc()).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn test_buckets_follow_local_offset() {
        // 22:00 UTC is already the next day at UTC+2
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 22, 0, 0).unwrap();
        let s = series(start, 12, &[5.0, 15.0, 25.0]);
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();

        let means = daily_means(&s, plus_two).unwrap();
        assert_eq!(means[0].date, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
        assert_eq!(means[0].mean, Some(10.0));
        assert_eq!(means[1].mean, Some(25.0));
    }

    #[test]
    fn test_single_day_has_no_tomorrow() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let s = series(start, 6, &[1.0, 2.0, 3.0, 4.0]);

        assert_eq!(
            tomorrow_mean(&s, utc()),
            Err(ExtractionError::TooFewBuckets {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_missing_samples_are_skipped() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let interval = TimeDelta::hours(12);
        let s = HourlySeries::new(
            start,
            start + interval * 4,
            interval,
            vec![Some(1.0), Some(3.0), None, Some(40.0)],
        );

        assert_eq!(tomorrow_mean(&s, utc()).unwrap(), 40.0);
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let s = HourlySeries::new(start, start + TimeDelta::hours(3), TimeDelta::hours(1), vec![Some(1.0)]);

        assert!(matches!(daily_means(&s, utc()), Err(ExtractionError::InvalidSeries(_))));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let s = HourlySeries::new(start, start + TimeDelta::hours(3), TimeDelta::zero(), vec![]);

        assert!(matches!(s.index(), Err(ExtractionError::InvalidSeries(_))));
    }

    #[test]
    fn test_midpoint() {
        assert_eq!(midpoint(8.0, 14.0), 11.0);
        assert_eq!(midpoint(-3.0, 2.0), -0.5);
    }
}
