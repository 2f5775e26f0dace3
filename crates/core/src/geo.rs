//! Nearby-trial lookup by great-circle distance.

use crate::constants::{DEFAULT_NEARBY_LIMIT, DEFAULT_RADIUS_MILES, EARTH_RADIUS_MILES};
use crate::validation::{lenient_number, validate_coordinates};
use crate::{TrialsError, TrialsResult};
use serde::{Deserialize, Serialize};
use trial_types::{Coordinates, Trial};
use utoipa::{IntoParams, ToSchema};

/// Haversine distance between two points, in miles.
pub fn haversine_miles(from: Coordinates, to: Coordinates) -> f64 {
    let (lat1, lat2) = (from.lat.to_radians(), to.lat.to_radians());
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * a.sqrt().atan2((1.0 - a).sqrt())
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NearbyQuery {
    /// Latitude in degrees, -90 to 90.
    #[serde(default, deserialize_with = "lenient_number")]
    pub lat: Option<f64>,
    /// Longitude in degrees, -180 to 180.
    #[serde(default, deserialize_with = "lenient_number")]
    pub lng: Option<f64>,
    /// Search radius in miles (default 100).
    #[serde(default, deserialize_with = "lenient_number")]
    pub radius: Option<f64>,
    /// Maximum number of trials returned (default 20).
    #[serde(default, deserialize_with = "lenient_number")]
    pub limit: Option<usize>,
}

/// Validated nearby-trial request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyRequest {
    pub origin: Coordinates,
    pub radius: f64,
    pub limit: usize,
}

impl NearbyRequest {
    /// # Errors
    ///
    /// Returns [`TrialsError::InvalidInput`] when `lat` or `lng` is missing or out of range, or
    /// when the radius is negative or not a number.
    pub fn from_query(query: &NearbyQuery) -> TrialsResult<Self> {
        let (Some(lat), Some(lng)) = (query.lat, query.lng) else {
            return Err(TrialsError::InvalidInput(
                "Latitude and longitude are required".into(),
            ));
        };
        validate_coordinates(lat, lng)?;

        let radius = query.radius.unwrap_or(DEFAULT_RADIUS_MILES);
        if !radius.is_finite() || radius < 0.0 {
            return Err(TrialsError::InvalidInput(format!(
                "radius must be a non-negative number of miles, got: {radius}"
            )));
        }

        Ok(Self {
            origin: Coordinates { lat, lng },
            radius,
            limit: query.limit.unwrap_or(DEFAULT_NEARBY_LIMIT),
        })
    }
}

/// A trial with its distance from the requested point.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NearbyTrial {
    #[serde(flatten)]
    pub trial: Trial,
    /// Miles from the requested point.
    pub distance: f64,
}

/// Nearby trials bucketed by distance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct DistanceGroups {
    #[serde(rename = "0-25 miles")]
    pub within_25: Vec<NearbyTrial>,
    #[serde(rename = "26-50 miles")]
    pub within_50: Vec<NearbyTrial>,
    #[serde(rename = "51-100 miles")]
    pub within_100: Vec<NearbyTrial>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NearbyResult {
    pub user_location: Coordinates,
    pub radius: f64,
    pub total_nearby: usize,
    pub trials: Vec<NearbyTrial>,
    pub distance_groups: DistanceGroups,
}

/// Trials with coordinates within the requested radius, nearest first, at most `limit`.
pub fn nearby(request: &NearbyRequest, trials: Vec<Trial>) -> NearbyResult {
    let mut found: Vec<NearbyTrial> = trials
        .into_iter()
        .filter_map(|trial| {
            let distance = haversine_miles(request.origin, trial.coordinates?);
            (distance <= request.radius).then_some(NearbyTrial { trial, distance })
        })
        .collect();
    found.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    found.truncate(request.limit);

    let group = |keep: &dyn Fn(f64) -> bool| -> Vec<NearbyTrial> {
        found.iter().filter(|t| keep(t.distance)).cloned().collect()
    };
    let distance_groups = DistanceGroups {
        within_25: group(&|d| d <= 25.0),
        within_50: group(&|d| d > 25.0 && d <= 50.0),
        within_100: group(&|d| d > 50.0 && d <= 100.0),
    };

    NearbyResult {
        user_location: request.origin,
        radius: request.radius,
        total_nearby: found.len(),
        trials: found,
        distance_groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOSTON: Coordinates = Coordinates {
        lat: 42.3601,
        lng: -71.0589,
    };

    fn at(id: &str, lat: f64, lng: f64) -> Trial {
        Trial {
            id: id.into(),
            coordinates: Some(Coordinates { lat, lng }),
            ..Trial::default()
        }
    }

    #[test]
    fn haversine_matches_known_distance() {
        let new_york = Coordinates {
            lat: 40.7128,
            lng: -74.0060,
        };
        let miles = haversine_miles(BOSTON, new_york);
        assert!((miles - 190.0).abs() < 5.0, "{miles}");
        assert_eq!(haversine_miles(BOSTON, BOSTON), 0.0);
    }

    #[test]
    fn coordinates_are_required_and_checked() {
        let missing = NearbyQuery {
            lat: Some(42.0),
            ..NearbyQuery::default()
        };
        assert!(NearbyRequest::from_query(&missing).is_err());

        let out_of_range = NearbyQuery {
            lat: Some(95.0),
            lng: Some(0.0),
            ..NearbyQuery::default()
        };
        assert!(NearbyRequest::from_query(&out_of_range).is_err());

        let ok = NearbyRequest::from_query(&NearbyQuery {
            lat: Some(42.0),
            lng: Some(-71.0),
            ..NearbyQuery::default()
        })
        .unwrap();
        assert_eq!(ok.radius, DEFAULT_RADIUS_MILES);
        assert_eq!(ok.limit, DEFAULT_NEARBY_LIMIT);
    }

    #[test]
    fn nearest_first_within_radius_and_grouped() {
        let request = NearbyRequest {
            origin: BOSTON,
            radius: 100.0,
            limit: 10,
        };
        let result = nearby(
            &request,
            vec![
                at("providence", 41.8240, -71.4128),
                at("cambridge", 42.3736, -71.1097),
                at("new-york", 40.7128, -74.0060),
                Trial {
                    id: "nowhere".into(),
                    ..Trial::default()
                },
            ],
        );

        let ids: Vec<_> = result.trials.iter().map(|t| t.trial.id.as_str()).collect();
        assert_eq!(ids, vec!["cambridge", "providence"]);
        assert_eq!(result.total_nearby, 2);
        assert_eq!(result.distance_groups.within_25.len(), 1);
        assert_eq!(result.distance_groups.within_50.len(), 1);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["distanceGroups"]["0-25 miles"][0]["id"], "cambridge");
        assert!(json["trials"][0]["distance"].as_f64().unwrap() < 5.0);
    }
}
