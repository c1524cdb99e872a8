//! Current conditions and forecast feed.

use chrono::NaiveDateTime;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use tripcast_core::{TemperatureUnit, WeatherConfig};

use crate::types::{Coordinates, CurrentWeather, ForecastEntry, ProviderError};

const REQUEST_TIMEOUT_SECS: u64 = 10;
const DT_TXT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const COMPASS_POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    feels_like: f64,
    pressure: u32,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct OwmCurrentResponse {
    main: OwmMain,
    weather: Vec<OwmCondition>,
    wind: OwmWind,
    #[serde(default)]
    visibility: u32,
}

#[derive(Debug, Deserialize)]
struct OwmForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    dt_txt: String,
    main: OwmForecastMain,
    weather: Vec<OwmCondition>,
}

#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    list: Vec<OwmForecastItem>,
}

/// Compass point for a wind bearing in degrees
pub fn wind_direction(deg: f64) -> &'static str {
    let index = (deg / 45.0).round().rem_euclid(8.0) as usize;
    COMPASS_POINTS[index % 8]
}

/// Rough dew point from temperature and relative humidity
pub fn dew_point_estimate(temp: f64, humidity_pct: u8) -> f64 {
    temp - (100.0 - f64::from(humidity_pct)) / 5.0
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
    unit: TemperatureUnit,
}

impl WeatherProvider {
    pub fn new(config: &WeatherConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            unit: config.units,
        })
    }

    /// Point the client at another host (used against mock servers)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// GET `path` with the API key and decode the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ProviderError::InvalidApiKey);
        }
        if status == StatusCode::NOT_FOUND {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::NotFound(text));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::debug!("Provider returned status {} for {}", status, path);
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message: text,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("{}: {}", path, e)))
    }

    fn weather_params(&self, coords: Coordinates) -> Vec<(&'static str, String)> {
        vec![
            ("lat", coords.lat.to_string()),
            ("lon", coords.lon.to_string()),
            ("units", self.unit.as_query().to_string()),
        ]
    }

    /// Current conditions at `coords`
    #[instrument(skip(self), level = "info")]
    pub async fn current_weather(
        &self,
        coords: Coordinates,
    ) -> Result<CurrentWeather, ProviderError> {
        let body: OwmCurrentResponse = self
            .get_json("/data/2.5/weather", &self.weather_params(coords))
            .await?;

        let condition = body
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Decode("current weather has no condition".into()))?;

        Ok(CurrentWeather {
            temperature: body.main.temp.round() as i32,
            feels_like: body.main.feels_like.round() as i32,
            description: condition.description,
            wind_speed: body.wind.speed,
            wind_direction: wind_direction(body.wind.deg).to_string(),
            pressure_hpa: body.main.pressure,
            humidity_pct: body.main.humidity,
            visibility_km: f64::from(body.visibility) / 1000.0,
            icon_id: condition.icon,
            uv_index: None,
            dew_point_estimate: dew_point_estimate(body.main.temp, body.main.humidity),
        })
    }

    /// The raw 3-hour feed (about 40 steps covering 5 days), in provider order
    #[instrument(skip(self), level = "info")]
    pub async fn forecast(&self, coords: Coordinates) -> Result<Vec<ForecastEntry>, ProviderError> {
        let body: OwmForecastResponse = self
            .get_json("/data/2.5/forecast", &self.weather_params(coords))
            .await?;

        let entries = body
            .list
            .into_iter()
            .map(|item| {
                let timestamp = NaiveDateTime::parse_from_str(&item.dt_txt, DT_TXT_FORMAT)
                    .map_err(|e| ProviderError::Decode(format!("dt_txt {:?}: {}", item.dt_txt, e)))?;
                let condition = item.weather.into_iter().next().ok_or_else(|| {
                    ProviderError::Decode(format!("forecast step {} has no condition", item.dt_txt))
                })?;
                Ok(ForecastEntry {
                    timestamp,
                    temperature: item.main.temp,
                    description: condition.description,
                    icon_id: condition.icon,
                })
            })
            .collect::<Result<Vec<_>, ProviderError>>()?;

        tracing::debug!("Forecast feed has {} steps", entries.len());
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> WeatherProvider {
        let config = WeatherConfig {
            api_key: "test-key".to_string(),
            ..WeatherConfig::default()
        };
        WeatherProvider::new(&config).unwrap().with_base_url(&server.uri())
    }

    fn current_body() -> serde_json::Value {
        serde_json::json!({
            "main": {"temp": 21.6, "feels_like": 20.4, "pressure": 1015, "humidity": 60},
            "weather": [{"description": "few clouds", "icon": "02d"}],
            "wind": {"speed": 3.6, "deg": 225},
            "visibility": 10000
        })
    }

    #[test]
    fn test_wind_direction() {
        assert_eq!(wind_direction(0.0), "N");
        assert_eq!(wind_direction(44.0), "NE");
        assert_eq!(wind_direction(225.0), "SW");
        assert_eq!(wind_direction(350.0), "N");
    }

    #[test]
    fn test_dew_point_estimate() {
        assert!((dew_point_estimate(20.0, 60) - 12.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_current_weather() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("lat", "48.8566"))
            .and(query_param("lon", "2.3522"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .mount(&server)
            .await;

        let weather = provider(&server)
            .current_weather(Coordinates::new(48.8566, 2.3522))
            .await
            .unwrap();

        assert_eq!(weather.temperature, 22);
        assert_eq!(weather.feels_like, 20);
        assert_eq!(weather.description, "few clouds");
        assert_eq!(weather.wind_direction, "SW");
        assert_eq!(weather.pressure_hpa, 1015);
        assert_eq!(weather.humidity_pct, 60);
        assert!((weather.visibility_km - 10.0).abs() < f64::EPSILON);
        assert_eq!(weather.icon_id, "02d");
        assert!(weather.uv_index.is_none());
    }

    #[tokio::test]
    async fn test_invalid_api_key() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "cod": 401, "message": "Invalid API key"
            })))
            .mount(&server)
            .await;

        let err = provider(&server)
            .current_weather(Coordinates::new(0.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidApiKey));
    }

    #[tokio::test]
    async fn test_current_weather_without_condition_is_decode_error() {
        let server = MockServer::start().await;
        let mut body = current_body();
        body["weather"] = serde_json::json!([]);

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let err = provider(&server)
            .current_weather(Coordinates::new(0.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[tokio::test]
    async fn test_forecast_feed_order_preserved() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "list": [
                    {"dt_txt": "2024-05-01 09:00:00", "main": {"temp": 14.2},
                     "weather": [{"description": "mist", "icon": "50d"}]},
                    {"dt_txt": "2024-05-01 12:00:00", "main": {"temp": 17.5},
                     "weather": [{"description": "clear sky", "icon": "01d"}]}
                ]
            })))
            .mount(&server)
            .await;

        let feed = provider(&server)
            .forecast(Coordinates::new(48.8566, 2.3522))
            .await
            .unwrap();

        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].description, "mist");
        assert_eq!(feed[1].timestamp.to_string(), "2024-05-01 12:00:00");
    }

    #[tokio::test]
    async fn test_forecast_bad_timestamp() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "list": [{"dt_txt": "tomorrow", "main": {"temp": 1.0},
                          "weather": [{"description": "snow", "icon": "13d"}]}]
            })))
            .mount(&server)
            .await;

        let err = provider(&server)
            .forecast(Coordinates::new(0.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = provider(&server)
            .forecast(Coordinates::new(0.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 502, .. }));
    }
}
