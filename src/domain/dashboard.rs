// Dashboard pages and the view models rendered for them
use super::bus::BusDeparture;
use super::display::{classify_sky, classify_temperature, Indicator, Palette};
use super::error::MappingError;
use super::weather::{midpoint, ForecastSummary, WeatherSnapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Page {
    #[serde(rename = "page-1")]
    CurrentWeather,
    #[serde(rename = "page-2")]
    Forecast,
    #[serde(rename = "page-3")]
    BusTimes,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::CurrentWeather, Page::Forecast, Page::BusTimes];

    pub fn slug(self) -> &'static str {
        match self {
            Page::CurrentWeather => "page-1",
            Page::Forecast => "page-2",
            Page::BusTimes => "page-3",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Page> {
        Page::ALL.into_iter().find(|page| page.slug() == slug)
    }

    pub fn route(self) -> String {
        format!("/{}", self.slug())
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::CurrentWeather => "Today's Weather",
            Page::Forecast => "Tomorrow's Weather",
            Page::BusTimes => "Bus Times",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub title: String,
    pub lines: Vec<String>,
    pub indicator: Option<Indicator>,
    pub background: Option<String>,
}

impl Card {
    pub fn new(title: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            title: title.into(),
            lines,
            indicator: None,
            background: None,
        }
    }

    pub fn with_indicator(mut self, indicator: Indicator) -> Self {
        self.indicator = Some(indicator);
        self
    }

    /// Colour the card, or leave it neutral when the value cannot be coloured.
    pub fn with_background(mut self, colour: Result<String, MappingError>) -> Self {
        match colour {
            Ok(colour) => self.background = Some(colour),
            Err(e) => tracing::warn!("Card '{}' left uncoloured: {}", self.title, e),
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageView {
    /// No refresh has completed yet.
    Pending,
    CurrentWeather {
        temperature: Card,
        precipitation: Card,
    },
    Forecast {
        card: Card,
    },
    BusTable {
        rows: Vec<BusDeparture>,
    },
    Unavailable {
        reason: String,
    },
}

/// The latest view for a page, as published after each tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSnapshot {
    pub page: Page,
    pub tick: Option<u64>,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub view: PageView,
}

impl PageSnapshot {
    pub fn pending(page: Page) -> Self {
        Self {
            page,
            tick: None,
            refreshed_at: None,
            view: PageView::Pending,
        }
    }

    pub fn new(page: Page, tick: u64, refreshed_at: DateTime<Utc>, view: PageView) -> Self {
        Self {
            page,
            tick: Some(tick),
            refreshed_at: Some(refreshed_at),
            view,
        }
    }
}

/// Drop the fractional part, as the cards show whole units.
pub fn whole(value: f64) -> i64 {
    value.trunc() as i64
}

pub fn current_weather_view(snapshot: &WeatherSnapshot, palette: &Palette) -> PageView {
    let temperature = whole(snapshot.temperature);
    let apparent = whole(snapshot.apparent_temperature);
    // Whole millimetres: anything under 1mm reads as dry, so the light-rain
    // sky bins are never reached from the cards.
    let precipitation = whole(snapshot.precipitation);
    let cloud_cover = whole(snapshot.cloud_cover);

    let temperature_card = Card::new(
        "Temperature",
        vec![
            format!("Ambient temperature: {}°C", temperature),
            format!("Real-feel: {}°C", apparent),
        ],
    )
    .with_indicator(classify_temperature(temperature as f64))
    .with_background(palette.temperature.colour_for(temperature as f64));

    let precipitation_card = Card::new(
        "Precipitation",
        vec![
            format!("Rainfall: {}mm", precipitation),
            format!("Cloud Cover: {}%", cloud_cover),
        ],
    )
    .with_indicator(classify_sky(precipitation as f64, cloud_cover as f64))
    .with_background(palette.precipitation.colour_for(precipitation as f64));

    PageView::CurrentWeather {
        temperature: temperature_card,
        precipitation: precipitation_card,
    }
}

pub fn forecast_view(summary: &ForecastSummary, palette: &Palette) -> PageView {
    let temp_min = whole(summary.temp_min);
    let temp_max = whole(summary.temp_max);
    // Truncated like the current-weather card; sub-millimetre totals read as dry.
    let precipitation = whole(summary.precipitation_sum);
    let cloud_cover = whole(summary.mean_cloud_cover);

    let card = Card::new(
        "Tomorrow's Weather",
        vec![
            format!("Ambient temperature: {}°C - {}°C", temp_min, temp_max),
            format!(
                "Real-feel: {}°C - {}°C",
                whole(summary.apparent_temp_min),
                whole(summary.apparent_temp_max)
            ),
            format!("Precipitation: {}mm", precipitation),
            format!("Wind speed: {}km/h", whole(summary.wind_speed_max)),
            format!("UV index: {}", whole(summary.uv_index_max)),
            format!("Cloud Cover: {}%", cloud_cover),
        ],
    )
    .with_indicator(classify_sky(precipitation as f64, cloud_cover as f64))
    .with_background(
        palette
            .temperature
            .colour_for(midpoint(temp_min as f64, temp_max as f64)),
    );

    PageView::Forecast { card }
}

pub fn bus_view(rows: Vec<BusDeparture>) -> PageView {
    PageView::BusTable { rows }
}
