// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Geolocation attached to a mood event.

use geo::Point;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Geohash precision used for stored events (matches GeoFire's default).
pub const GEOHASH_PRECISION: usize = 10;

/// Location of an event: geohash for range queries plus raw coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoInfo {
    pub geohash: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoInfo {
    /// Build from a point (x = longitude, y = latitude).
    ///
    /// Coordinates outside the valid latitude/longitude range are rejected.
    pub fn from_point(point: Point<f64>) -> Result<Self> {
        let geohash = geohash::encode(point.0, GEOHASH_PRECISION)
            .map_err(|e| AppError::Validation(format!("Cannot geohash {:?}: {}", point, e)))?;
        Ok(Self {
            geohash,
            latitude: point.y(),
            longitude: point.x(),
        })
    }

    pub fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_point_uses_default_precision() {
        // Jutland reference point from the geohash literature.
        let info = GeoInfo::from_point(Point::new(10.40744, 57.64911)).unwrap();
        assert_eq!(info.geohash, "u4pruydqqv");
        assert_eq!(info.latitude, 57.64911);
        assert_eq!(info.longitude, 10.40744);
        assert_eq!(info.point(), Point::new(10.40744, 57.64911));
    }

    #[test]
    fn test_out_of_range_point_is_rejected() {
        let err = GeoInfo::from_point(Point::new(10.0, 95.0)).unwrap_err();
        assert!(err.is_validation());
    }
}
