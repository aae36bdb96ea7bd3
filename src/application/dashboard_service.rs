// Dashboard service - Fetch, extract, derive and assemble one page view
use crate::application::fetch_service::{FetchError, FetchRequest, FetchService};
use crate::domain::bus::{departure_table, extract_embedded_json, BusTableOptions};
use crate::domain::dashboard::{bus_view, current_weather_view, forecast_view, Page, PageView};
use crate::domain::display::Palette;
use crate::domain::error::{ExtractionError, MalformedFeedError, MappingError};
use crate::infrastructure::config::DashboardConfig;
use crate::infrastructure::open_meteo::{self, ForecastPayload};
use crate::infrastructure::lothian;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    MalformedFeed(#[from] MalformedFeedError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

#[derive(Clone)]
pub struct DashboardService {
    fetcher: Arc<dyn FetchService>,
    weather_request: FetchRequest,
    bus_request: FetchRequest,
    palette: Palette,
    bus_table: BusTableOptions,
}

impl DashboardService {
    pub fn new(
        fetcher: Arc<dyn FetchService>,
        weather_request: FetchRequest,
        bus_request: FetchRequest,
        palette: Palette,
        bus_table: BusTableOptions,
    ) -> Self {
        Self {
            fetcher,
            weather_request,
            bus_request,
            palette,
            bus_table,
        }
    }

    pub fn from_config(
        fetcher: Arc<dyn FetchService>,
        config: &DashboardConfig,
    ) -> Result<Self, MappingError> {
        Ok(Self::new(
            fetcher,
            open_meteo::forecast_request(&config.weather),
            lothian::departures_request(&config.bus),
            config.colours.palette()?,
            config.bus.table_options(),
        ))
    }

    /// Run the pipeline for `page`. Failures become an explicit unavailable view.
    pub async fn build_page(&self, page: Page, tick: u64) -> PageView {
        let result = match page {
            Page::CurrentWeather => self.current_weather().await,
            Page::Forecast => self.forecast().await,
            Page::BusTimes => self.bus_times().await,
        };

        result.unwrap_or_else(|e| {
            tracing::error!("Refresh of {} (tick {}) failed: {}", page.slug(), tick, e);
            PageView::Unavailable {
                reason: e.to_string(),
            }
        })
    }

    pub async fn current_weather(&self) -> Result<PageView, PipelineError> {
        let payload = self.fetch_forecast().await?;
        let snapshot = open_meteo::extract_snapshot(&payload)?;

        tracing::debug!(
            "Current weather at {}: {}°C, {}mm, {}% cloud",
            snapshot.timestamp,
            snapshot.temperature,
            snapshot.precipitation,
            snapshot.cloud_cover
        );

        Ok(current_weather_view(&snapshot, &self.palette))
    }

    pub async fn forecast(&self) -> Result<PageView, PipelineError> {
        let payload = self.fetch_forecast().await?;
        let summary = open_meteo::extract_forecast(&payload)?;

        tracing::debug!(
            "Forecast for {}: {}..{}°C, cloud {}%",
            summary.date,
            summary.temp_min,
            summary.temp_max,
            summary.mean_cloud_cover
        );

        Ok(forecast_view(&summary, &self.palette))
    }

    pub async fn bus_times(&self) -> Result<PageView, PipelineError> {
        let document = self.fetcher.fetch_text(&self.bus_request).await?;
        let feed = extract_embedded_json(&document)?;
        let rows = departure_table(&feed, &self.bus_table);

        tracing::debug!(
            "{} departures from {} services",
            rows.len(),
            feed.services.len()
        );

        Ok(bus_view(rows))
    }

    async fn fetch_forecast(&self) -> Result<ForecastPayload, PipelineError> {
        let body = self.fetcher.fetch_text(&self.weather_request).await?;
        Ok(open_meteo::parse_payload(&body)?)
    }
}
