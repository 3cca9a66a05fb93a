//! Static severe-weather advisories

use super::{CapabilityError, WeatherLookup};
use async_trait::async_trait;
use std::collections::HashMap;

/// Weather lookup answering from a fixed location → advisory table
#[derive(Debug, Clone, Default)]
pub struct StaticWeatherService {
    advisories: HashMap<String, String>,
}

impl StaticWeatherService {
    pub fn new(advisories: HashMap<String, String>) -> Self {
        Self { advisories }
    }
}

#[async_trait]
impl WeatherLookup for StaticWeatherService {
    async fn check_weather(&self, location: &str) -> Result<String, CapabilityError> {
        Ok(self
            .advisories
            .get(location)
            .cloned()
            .unwrap_or_else(|| format!("No active severe weather alerts for {}", location)))
    }
}
