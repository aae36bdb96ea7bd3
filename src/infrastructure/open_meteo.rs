// Open-Meteo forecast API: request building and payload extraction
use crate::application::fetch_service::FetchRequest;
use crate::domain::error::ExtractionError;
use crate::domain::weather::{tomorrow_mean, ForecastSummary, HourlySeries, WeatherSnapshot};
use crate::infrastructure::config::WeatherSettings;
use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use serde::Deserialize;

pub const CURRENT_FIELDS: [&str; 6] = [
    "temperature_2m",
    "apparent_temperature",
    "precipitation",
    "cloud_cover",
    "wind_speed_10m",
    "wind_direction_10m",
];

pub const DAILY_FIELDS: [&str; 7] = [
    "temperature_2m_max",
    "temperature_2m_min",
    "apparent_temperature_max",
    "apparent_temperature_min",
    "uv_index_max",
    "precipitation_sum",
    "wind_speed_10m_max",
];

pub const HOURLY_FIELDS: [&str; 1] = ["cloud_cover"];

const TOMORROW: usize = 1;

#[derive(Debug, Deserialize)]
pub struct ForecastPayload {
    #[serde(default)]
    pub utc_offset_seconds: i32,
    pub current: Option<CurrentBlock>,
    pub hourly: Option<HourlyBlock>,
    pub daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize)]
pub struct CurrentBlock {
    pub time: i64,
    pub temperature_2m: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub precipitation: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub wind_speed_10m: Option<f64>,
    pub wind_direction_10m: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct HourlyBlock {
    pub time: Vec<i64>,
    #[serde(default)]
    pub cloud_cover: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct DailyBlock {
    pub time: Vec<i64>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub apparent_temperature_max: Vec<Option<f64>>,
    #[serde(default)]
    pub apparent_temperature_min: Vec<Option<f64>>,
    #[serde(default)]
    pub uv_index_max: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m_max: Vec<Option<f64>>,
}

/// Forecast request for the configured location. Times come back as unix seconds.
pub fn forecast_request(settings: &WeatherSettings) -> FetchRequest {
    FetchRequest::new(&settings.base_url)
        .param("latitude", settings.latitude)
        .param("longitude", settings.longitude)
        .param("current", CURRENT_FIELDS.join(","))
        .param("daily", DAILY_FIELDS.join(","))
        .param("hourly", HOURLY_FIELDS.join(","))
        .param("forecast_days", settings.forecast_days)
        .param("timezone", &settings.timezone)
        .param("timeformat", "unixtime")
}

pub fn parse_payload(body: &str) -> Result<ForecastPayload, ExtractionError> {
    serde_json::from_str(body).map_err(|e| ExtractionError::Payload(e.to_string()))
}

pub fn extract_snapshot(payload: &ForecastPayload) -> Result<WeatherSnapshot, ExtractionError> {
    let current = payload
        .current
        .as_ref()
        .ok_or_else(|| missing("current"))?;

    Ok(WeatherSnapshot {
        timestamp: timestamp(current.time, "current.time")?,
        temperature: required(current.temperature_2m, "current.temperature_2m")?,
        apparent_temperature: required(
            current.apparent_temperature,
            "current.apparent_temperature",
        )?,
        precipitation: required(current.precipitation, "current.precipitation")?,
        cloud_cover: required(current.cloud_cover, "current.cloud_cover")?,
        wind_speed: required(current.wind_speed_10m, "current.wind_speed_10m")?,
        wind_direction: required(current.wind_direction_10m, "current.wind_direction_10m")?,
    })
}

/// Tomorrow's daily aggregates plus the mean of tomorrow's hourly cloud cover.
pub fn extract_forecast(payload: &ForecastPayload) -> Result<ForecastSummary, ExtractionError> {
    let daily = payload.daily.as_ref().ok_or_else(|| missing("daily"))?;
    let hourly = payload.hourly.as_ref().ok_or_else(|| missing("hourly"))?;
    let offset = utc_offset(payload.utc_offset_seconds)?;

    let day_start = daily
        .time
        .get(TOMORROW)
        .copied()
        .ok_or(ExtractionError::TooFewBuckets {
            expected: TOMORROW + 1,
            found: daily.time.len(),
        })?;
    let date = timestamp(day_start, "daily.time")?
        .with_timezone(&offset)
        .date_naive();

    let series = hourly_series(hourly, "hourly.cloud_cover")?;

    Ok(ForecastSummary {
        date,
        temp_min: tomorrow(&daily.temperature_2m_min, "daily.temperature_2m_min")?,
        temp_max: tomorrow(&daily.temperature_2m_max, "daily.temperature_2m_max")?,
        apparent_temp_min: tomorrow(
            &daily.apparent_temperature_min,
            "daily.apparent_temperature_min",
        )?,
        apparent_temp_max: tomorrow(
            &daily.apparent_temperature_max,
            "daily.apparent_temperature_max",
        )?,
        precipitation_sum: tomorrow(&daily.precipitation_sum, "daily.precipitation_sum")?,
        wind_speed_max: tomorrow(&daily.wind_speed_10m_max, "daily.wind_speed_10m_max")?,
        uv_index_max: tomorrow(&daily.uv_index_max, "daily.uv_index_max")?,
        mean_cloud_cover: tomorrow_mean(&series, offset)?,
    })
}

/// Rebuild the `[start, end)` + interval description of the hourly block.
fn hourly_series(hourly: &HourlyBlock, field: &str) -> Result<HourlySeries, ExtractionError> {
    let first = *hourly.time.first().ok_or_else(|| missing("hourly.time"))?;
    let start = timestamp(first, "hourly.time")?;
    let interval = match hourly.time.get(1) {
        Some(&second) => timestamp(second, "hourly.time")?.signed_duration_since(start),
        None => TimeDelta::hours(1),
    };
    if hourly.cloud_cover.len() != hourly.time.len() {
        return Err(ExtractionError::InvalidSeries(format!(
            "{} has {} values for {} timestamps",
            field,
            hourly.cloud_cover.len(),
            hourly.time.len()
        )));
    }

    let end = i32::try_from(hourly.time.len())
        .ok()
        .and_then(|samples| interval.checked_mul(samples))
        .and_then(|span| start.checked_add_signed(span))
        .ok_or_else(|| {
            ExtractionError::InvalidSeries(format!(
                "{} runs past the representable time range",
                field
            ))
        })?;

    Ok(HourlySeries::new(start, end, interval, hourly.cloud_cover.clone()))
}

fn tomorrow(values: &[Option<f64>], field: &str) -> Result<f64, ExtractionError> {
    values
        .get(TOMORROW)
        .copied()
        .flatten()
        .ok_or_else(|| missing(&format!("{}[{}]", field, TOMORROW)))
}

fn required(value: Option<f64>, field: &str) -> Result<f64, ExtractionError> {
    value.ok_or_else(|| missing(field))
}

fn timestamp(secs: i64, field: &str) -> Result<DateTime<Utc>, ExtractionError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| ExtractionError::InvalidSeries(format!("{} is out of range: {}", field, secs)))
}

fn utc_offset(secs: i32) -> Result<FixedOffset, ExtractionError> {
    FixedOffset::east_opt(secs)
        .ok_or_else(|| ExtractionError::InvalidSeries(format!("invalid utc offset {}s", secs)))
}

fn missing(field: &str) -> ExtractionError {
    ExtractionError::MissingField(field.to_string())
}
