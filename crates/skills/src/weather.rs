//! Weather skill: current conditions from an OpenWeatherMap-compatible API.
//!
//! The city is whatever remains of the utterance after removing a fixed set
//! of filler words. One GET per request, bounded by the configured timeout,
//! no retries.

use async_trait::async_trait;
use parley_config::WeatherConfig;
use parley_core::error::SkillError;
use parley_core::skill::{Capability, Skill};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, warn};

pub const NOT_CONFIGURED: &str =
    "Weather service is not configured. Please add WEATHER_API_KEY to your environment or config.toml.";
pub const MISSING_CITY: &str =
    "Please specify a city for weather information. For example: 'weather in Paris' or 'London weather'";
pub const SERVICE_UNAVAILABLE: &str =
    "Sorry, I'm having trouble accessing weather information right now.";

/// Words stripped from the utterance before the rest is taken as a city.
const STOP_WORDS: &[&str] = &[
    "weather", "forecast", "temperature", "temp", "in", "for", "at", "the", "what", "is", "how",
    "tell", "me", "about",
];

pub struct WeatherSkill {
    api_key: Option<String>,
    endpoint: String,
    client: reqwest::Client,
}

impl WeatherSkill {
    pub fn new(config: &WeatherConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {e}");
                reqwest::Client::new()
            });

        Self {
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.clone(),
            client,
        }
    }

    /// Fetch current conditions for `city`.
    async fn fetch(&self, api_key: &str, city: &str) -> Result<WeatherReport, SkillError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", city), ("appid", api_key), ("units", "metric")])
            .send()
            .await
            .map_err(|e| request_failed(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(SkillError::InvalidInput(format!(
                "weather service returned {status} for '{city}'"
            )));
        }

        let body: ApiWeather = response
            .json()
            .await
            .map_err(|e| request_failed(format!("malformed response: {e}")))?;

        WeatherReport::try_from(body)
    }
}

fn request_failed(reason: String) -> SkillError {
    SkillError::RequestFailed {
        skill: Capability::Weather.name().into(),
        reason,
    }
}

#[async_trait]
impl Skill for WeatherSkill {
    fn capability(&self) -> Capability {
        Capability::Weather
    }

    async fn handle(&self, utterance: &str) -> String {
        let Some(api_key) = self.api_key.as_deref() else {
            return NOT_CONFIGURED.into();
        };

        let Some(city) = extract_city(utterance) else {
            return MISSING_CITY.into();
        };

        debug!(city = %city, "Looking up weather");
        match self.fetch(api_key, &city).await {
            Ok(report) => report.to_string(),
            Err(SkillError::InvalidInput(reason)) => {
                warn!("Weather lookup rejected: {reason}");
                format!(
                    "Sorry, I couldn't find weather information for '{city}'. Please check the city name and try again."
                )
            }
            Err(e) => {
                error!("Weather API error: {e}");
                SERVICE_UNAVAILABLE.into()
            }
        }
    }
}

/// Lowercase the utterance and drop filler words; the rest is the city.
pub fn extract_city(utterance: &str) -> Option<String> {
    let lowered = utterance.to_lowercase();
    let words: Vec<&str> = lowered
        .split_whitespace()
        .filter(|w| !STOP_WORDS.contains(w))
        .collect();
    (!words.is_empty()).then(|| words.join(" "))
}

/// The fields of a current-weather response the reply is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub city: String,
    pub country: String,
    pub temperature: f64,
    pub description: String,
}

impl std::fmt::Display for WeatherReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "The weather in {}, {} is {}°C with {}.",
            self.city, self.country, self.temperature, self.description
        )
    }
}

impl TryFrom<ApiWeather> for WeatherReport {
    type Error = SkillError;

    fn try_from(api: ApiWeather) -> Result<Self, Self::Error> {
        let description = api
            .weather
            .into_iter()
            .next()
            .map(|w| w.description)
            .ok_or_else(|| request_failed("response has no weather conditions".into()))?;

        Ok(Self {
            city: api.name,
            country: api.sys.country,
            temperature: api.main.temp,
            description,
        })
    }
}

// --- OpenWeatherMap API types (internal) ---

#[derive(Debug, Deserialize)]
struct ApiWeather {
    name: String,
    main: ApiMain,
    weather: Vec<ApiCondition>,
    sys: ApiSys,
}

#[derive(Debug, Deserialize)]
struct ApiMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct ApiCondition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct ApiSys {
    country: String,
}
