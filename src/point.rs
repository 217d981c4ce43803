// Copyright 2025 Viktor Reusch
//
// This file is part of schweizmobil_gpx.
//
// schweizmobil_gpx is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by the
// Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// schweizmobil_gpx is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
// FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License
// for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with schweizmobil_gpx. If not, see <https://www.gnu.org/licenses/>.

//! Point and track types flowing through the export pipeline.

/// A vertex in one of the Swiss planar grids, in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarPoint {
    pub easting: f64,
    pub northing: f64,
    /// Height above sea level as delivered by the service.
    pub elevation: Option<f64>,
}

impl PlanarPoint {
    pub fn new(easting: f64, northing: f64) -> Self {
        Self {
            easting,
            northing,
            elevation: None,
        }
    }

    pub fn with_elevation(easting: f64, northing: f64, elevation: f64) -> Self {
        Self {
            easting,
            northing,
            elevation: Some(elevation),
        }
    }
}

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
}

/// A named point of interest along a track.
#[derive(Debug, Clone, PartialEq)]
pub struct ViaPoint {
    pub name: String,
    pub point: PlanarPoint,
}

/// A saved route as retrieved from the service.
///
/// The order of `points` is the order of the path and is kept all the way to
/// the written document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Track {
    pub name: String,
    pub points: Vec<PlanarPoint>,
    pub via_points: Vec<ViaPoint>,
}
