use reqwest::header::HeaderValue;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;
use crate::error::Result;
use crate::listing::AddressFilter;
use crate::types::Property;

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// Listings closer than this (in degrees, per axis) to a geocoded point are
/// treated as sitting on it.
const SAME_SPOT_EPSILON: f64 = 1e-4;

#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub lat: f64,
    pub lon: f64,
    pub display_name: Option<String>,
}

/// Where a map view should center after an address search.
#[derive(Debug, Clone, PartialEq)]
pub struct MapTarget {
    pub lat: f64,
    pub lon: f64,
    pub zoom: u8,
}

impl MapTarget {
    pub fn is_on(&self, property: &Property) -> bool {
        match (property.latitude, property.longitude) {
            (Some(lat), Some(lon)) => {
                (lat - self.lat).abs() < SAME_SPOT_EPSILON
                    && (lon - self.lon).abs() < SAME_SPOT_EPSILON
            }
            _ => false,
        }
    }
}

#[derive(Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// Client for a Nominatim-compatible `/search` endpoint. Talks to a public
/// service, so it never carries the marketplace credential.
#[derive(Debug, Clone)]
pub struct Geocoder {
    base_url: String,
    http: reqwest::Client,
}

impl Geocoder {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        let http = reqwest::Client::builder().build()?;
        Ok(Self { base_url, http })
    }

    /// First hit for `query`, if any. Hits with unparsable coordinates are
    /// treated as no hit.
    pub async fn search(&self, query: &str) -> Result<Option<Place>> {
        let url = format!("{}/search", self.base_url);
        let res = self
            .http
            .get(&url)
            .header(USER_AGENT, HeaderValue::from_static("estate-client"))
            .query(&[("format", "json"), ("limit", "1"), ("q", query)])
            .send()
            .await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                method: reqwest::Method::GET,
                url,
                status,
                content_type: String::new(),
                body,
            });
        }
        let hits: Vec<SearchHit> =
            serde_json::from_str(&body).map_err(|source| ApiError::Decode {
                url: url.clone(),
                body: body.clone(),
                source,
            })?;
        let place = hits.into_iter().next().and_then(|hit| {
            Some(Place {
                lat: hit.lat.parse().ok()?,
                lon: hit.lon.parse().ok()?,
                display_name: hit.display_name,
            })
        });
        debug!("geocoded {query:?}: {place:?}");
        Ok(place)
    }

    /// Geocode an address search and pick a zoom for it. `None` when the
    /// filter is empty or nothing was found.
    pub async fn locate(&self, filter: &AddressFilter) -> Result<Option<MapTarget>> {
        let Some(query) = filter.geocode_query() else {
            return Ok(None);
        };
        Ok(self.search(&query).await?.map(|place| MapTarget {
            lat: place.lat,
            lon: place.lon,
            zoom: filter.zoom(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_matches_nearby_listing_only() {
        let target = MapTarget {
            lat: 49.8397,
            lon: 24.0297,
            zoom: 18,
        };
        let near = Property {
            latitude: Some(49.83975),
            longitude: Some(24.02965),
            ..Default::default()
        };
        let far = Property {
            latitude: Some(49.85),
            longitude: Some(24.0297),
            ..Default::default()
        };
        assert!(target.is_on(&near));
        assert!(!target.is_on(&far));
        assert!(!target.is_on(&Property::default()));
    }
}
