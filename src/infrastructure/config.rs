use crate::domain::bus::BusTableOptions;
use crate::domain::display::{ColourScale, OutOfRange, Palette};
use crate::domain::error::MappingError;
use serde::Deserialize;
use std::time::Duration;

const CONFIG_PATH_VAR: &str = "DASHBOARD_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/dashboard";
const ENV_PREFIX: &str = "DASHBOARD";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub weather: WeatherSettings,
    #[serde(default)]
    pub bus: BusSettings,
    #[serde(default)]
    pub pages: PageSettings,
    #[serde(default)]
    pub colours: ColourSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
    pub port: u16,
    pub title: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FetchSettings {
    pub cache_ttl_secs: u64,
    pub retries: u32,
    pub backoff_factor: f64,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WeatherSettings {
    pub base_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub forecast_days: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BusSettings {
    pub base_url: String,
    pub stop_code: String,
    pub departures_per_service: usize,
    pub sort_by_departure: bool,
}

/// Refresh interval per page, in seconds.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PageSettings {
    pub current_weather_secs: u64,
    pub forecast_secs: u64,
    pub bus_times_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ColourSettings {
    pub out_of_range: OutOfRange,
    pub temperature: ScaleSettings,
    pub precipitation: ScaleSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScaleSettings {
    pub min: f64,
    pub max: f64,
    pub low: String,
    pub high: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8050,
            title: "Home Dashboard".to_string(),
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 3600,
            retries: 5,
            backoff_factor: 0.2,
            timeout_secs: 30,
        }
    }
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            latitude: 55.967049727775326,
            longitude: -3.1928189339319695,
            timezone: "GMT".to_string(),
            forecast_days: 2,
        }
    }
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            base_url: "https://lothianapi.co.uk/departureBoards/website".to_string(),
            stop_code: "6200206810".to_string(),
            departures_per_service: 3,
            sort_by_departure: true,
        }
    }
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            current_weather_secs: 3600,
            forecast_secs: 21600,
            bus_times_secs: 60,
        }
    }
}

impl Default for ColourSettings {
    fn default() -> Self {
        Self {
            out_of_range: OutOfRange::Reject,
            temperature: ScaleSettings {
                min: 0.0,
                max: 40.0,
                low: "lightblue".to_string(),
                high: "red".to_string(),
            },
            precipitation: ScaleSettings {
                min: 0.0,
                max: 10.0,
                low: "skyblue".to_string(),
                high: "dimgrey".to_string(),
            },
        }
    }
}

impl FetchSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl BusSettings {
    pub fn table_options(&self) -> BusTableOptions {
        BusTableOptions {
            departures_per_service: self.departures_per_service,
            sort_by_departure: self.sort_by_departure,
        }
    }
}

impl ScaleSettings {
    fn scale(&self, out_of_range: OutOfRange) -> Result<ColourScale, MappingError> {
        Ok(ColourScale::from_names(self.min, self.max, &self.low, &self.high)?
            .with_out_of_range(out_of_range))
    }
}

impl ColourSettings {
    pub fn palette(&self) -> Result<Palette, MappingError> {
        Ok(Palette {
            temperature: self.temperature.scale(self.out_of_range)?,
            precipitation: self.precipitation.scale(self.out_of_range)?,
        })
    }
}

impl DashboardConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.weather.forecast_days >= 2,
            "weather.forecast_days must be at least 2 to show tomorrow, got {}",
            self.weather.forecast_days
        );
        anyhow::ensure!(
            self.bus.departures_per_service > 0,
            "bus.departures_per_service must be positive"
        );
        anyhow::ensure!(
            self.pages.current_weather_secs > 0
                && self.pages.forecast_secs > 0
                && self.pages.bus_times_secs > 0,
            "page refresh intervals must be positive"
        );
        anyhow::ensure!(
            self.fetch.timeout_secs > 0,
            "fetch.timeout_secs must be positive"
        );
        anyhow::ensure!(
            self.fetch.backoff_factor >= 0.0 && self.fetch.backoff_factor.is_finite(),
            "fetch.backoff_factor must be a non-negative number"
        );
        self.colours.palette()?;
        Ok(())
    }

    pub fn log_config(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  server      : {}:{}", self.server.bind_address, self.server.port);
        tracing::info!(
            "  fetch       : ttl={}s retries={} backoff={}s timeout={}s",
            self.fetch.cache_ttl_secs,
            self.fetch.retries,
            self.fetch.backoff_factor,
            self.fetch.timeout_secs
        );
        tracing::info!(
            "  weather     : {} ({}, {}) days={}",
            self.weather.base_url,
            self.weather.latitude,
            self.weather.longitude,
            self.weather.forecast_days
        );
        tracing::info!("  bus         : {} stop={}", self.bus.base_url, self.bus.stop_code);
        tracing::info!(
            "  refresh     : page-1={}s page-2={}s page-3={}s",
            self.pages.current_weather_secs,
            self.pages.forecast_secs,
            self.pages.bus_times_secs
        );
    }
}

/// Load `config/dashboard.toml` (or `$DASHBOARD_CONFIG`), then apply
/// `DASHBOARD__SECTION__KEY` environment overrides.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let settings = config::Config::builder()
        .add_source(config::File::with_name(&path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let dashboard: DashboardConfig = settings.try_deserialize()?;
    dashboard.validate()?;
    Ok(dashboard)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(source: &str) -> DashboardConfig {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_match_kiosk_setup() {
        let config = from_toml("");

        assert_eq!(config.fetch.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(config.fetch.retries, 5);
        assert_eq!(config.pages.bus_times_secs, 60);
        assert_eq!(config.bus.departures_per_service, 3);
        assert_eq!(config.colours.out_of_range, OutOfRange::Reject);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = from_toml(
            r#"
            [bus]
            stop_code = "6200242680"
            departures_per_service = 2

            [colours]
            out_of_range = "clamp"
            "#,
        );

        assert_eq!(config.bus.stop_code, "6200242680");
        assert_eq!(config.bus.table_options().departures_per_service, 2);
        assert!(config.bus.sort_by_departure);
        assert_eq!(config.colours.out_of_range, OutOfRange::Clamp);
        assert_eq!(config.colours.temperature.high, "red");
    }

    #[test]
    fn test_single_day_forecast_is_rejected() {
        let config = from_toml("[weather]\nforecast_days = 1\n");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let config = from_toml("[fetch]\ntimeout_secs = 0\n");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_colour_is_rejected() {
        let config = from_toml(
            r#"
            [colours.temperature]
            min = 0.0
            max = 40.0
            low = "lightblue"
            high = "ultraviolet"
            "#,
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_palette_carries_out_of_range_policy() {
        let mut config = DashboardConfig::default();
        config.colours.out_of_range = OutOfRange::Clamp;

        let palette = config.colours.palette().unwrap();
        assert_eq!(palette.temperature.colour_for(-20.0).unwrap(), "#add8e6ff");
    }
}
