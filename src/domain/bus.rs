// Bus departure board models
use super::error::MalformedFeedError;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// The JSON document embedded in the departure board page.
#[derive(Debug, Clone, Deserialize)]
pub struct DepartureFeed {
    pub services: Vec<ServiceDepartures>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDepartures {
    pub service_name: String,
    #[serde(default)]
    pub departures: Vec<FeedDeparture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedDeparture {
    #[serde(deserialize_with = "deserialize_minutes")]
    pub minutes: i64,
    pub departure_time: String,
}

/// One row of the bus table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusDeparture {
    pub service_name: String,
    pub minutes_until_departure: i64,
    pub departure_time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusTableOptions {
    pub departures_per_service: usize,
    pub sort_by_departure: bool,
}

impl BusDeparture {
    pub fn new(service_name: String, minutes_until_departure: i64, departure_time: String) -> Self {
        Self {
            service_name,
            minutes_until_departure,
            departure_time,
        }
    }
}

/// Parse the JSON object embedded in a departure board document.
///
/// Takes everything from the first `{` to the last `}`, so surrounding markup
/// is ignored but the object itself must be the only one on the page.
pub fn extract_embedded_json(document: &str) -> Result<DepartureFeed, MalformedFeedError> {
    let start = document.find('{').ok_or(MalformedFeedError::NoJsonObject)?;
    let end = document.rfind('}').ok_or(MalformedFeedError::NoJsonObject)?;
    if end < start {
        return Err(MalformedFeedError::NoJsonObject);
    }

    Ok(serde_json::from_str(&document[start..=end])?)
}

/// Keep the first `per_service` departures of every service, in feed order.
pub fn truncate_per_service(feed: &DepartureFeed, per_service: usize) -> Vec<BusDeparture> {
    feed.services
        .iter()
        .flat_map(|service| {
            service.departures.iter().take(per_service).map(|departure| {
                BusDeparture::new(
                    service.service_name.clone(),
                    departure.minutes,
                    departure.departure_time.clone(),
                )
            })
        })
        .collect()
}

/// Stable ascending sort by minutes until departure.
pub fn sort_by_departure(departures: &mut [BusDeparture]) {
    departures.sort_by_key(|d| d.minutes_until_departure);
}

pub fn departure_table(feed: &DepartureFeed, options: &BusTableOptions) -> Vec<BusDeparture> {
    let mut table = truncate_per_service(feed, options.departures_per_service);
    if options.sort_by_departure {
        sort_by_departure(&mut table);
    }
    table
}

// The board reports minutes as a number, but some stops send strings ("3", "Due")
fn deserialize_minutes<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Whole(i64),
        Fractional(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Whole(minutes) => Ok(minutes),
        Raw::Fractional(minutes) => Ok(minutes.trunc() as i64),
        Raw::Text(text) => {
            let text = text.trim();
            if text.eq_ignore_ascii_case("due") {
                return Ok(0);
            }
            text.parse()
                .map_err(|_| de::Error::custom(format!("invalid minutes value `{}`", text)))
        }
    }
}
