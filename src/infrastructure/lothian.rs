// Lothian departure board request
use crate::application::fetch_service::FetchRequest;
use crate::infrastructure::config::BusSettings;

/// The board page for a single stop; the JSON we want is embedded in its body.
pub fn departures_request(settings: &BusSettings) -> FetchRequest {
    FetchRequest::new(&settings.base_url).param("stops", &settings.stop_code)
}
