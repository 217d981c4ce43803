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

//! Conversion from the Swiss planar grids to WGS84.
//!
//! Both LV03 and LV95 use the same oblique conformal cylindrical projection
//! on the Bessel 1841 ellipsoid. The inverse projection follows the rigorous
//! swisstopo formulas; the datum is then shifted to WGS84 with a geocentric
//! translation, which is what PROJ does for EPSG:21781 and EPSG:2056.

use std::f64::consts::FRAC_PI_4;
use std::fmt;
use std::str::FromStr;

use log::debug;
use thiserror::Error;

use crate::point::{GeoPoint, PlanarPoint};

/// Maximum number of iterations for the latitude fixed-point loops.
const MAX_ITERATIONS: usize = 32;
/// Convergence threshold for iterated latitudes, in radians.
const EPSILON: f64 = 1e-14;

/// Error returned when a [`Transformer`] cannot be set up.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// The ellipsoid is not a valid oblate ellipsoid.
    #[error("invalid ellipsoid: semi-major axis {semi_major_axis}, eccentricity² {eccentricity_squared}")]
    Ellipsoid {
        semi_major_axis: f64,
        eccentricity_squared: f64,
    },
    /// A projection constant could not be derived from the parameters.
    #[error("projection constant {0} is not finite")]
    Projection(&'static str),
    /// The datum shift contains non-finite values.
    #[error("invalid datum shift {0:?}")]
    DatumShift([f64; 3]),
}

/// Reference ellipsoid given by its semi-major axis and first eccentricity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// In metres.
    pub semi_major_axis: f64,
    pub eccentricity_squared: f64,
}

impl Ellipsoid {
    pub const BESSEL_1841: Self = Self {
        semi_major_axis: 6_377_397.155,
        eccentricity_squared: 0.006_674_372_230_614,
    };

    pub const WGS84: Self = Self {
        semi_major_axis: 6_378_137.0,
        eccentricity_squared: 0.006_694_379_990_141_317,
    };

    fn validate(&self) -> Result<(), ConversionError> {
        let valid = self.semi_major_axis.is_finite()
            && self.semi_major_axis > 0.0
            && self.eccentricity_squared.is_finite()
            && (0.0..1.0).contains(&self.eccentricity_squared);
        if valid {
            Ok(())
        } else {
            Err(ConversionError::Ellipsoid {
                semi_major_axis: self.semi_major_axis,
                eccentricity_squared: self.eccentricity_squared,
            })
        }
    }

    /// Radius of curvature in the prime vertical at `latitude` (radians).
    fn prime_vertical_radius(&self, latitude: f64) -> f64 {
        let sin = latitude.sin();
        self.semi_major_axis / (1.0 - self.eccentricity_squared * sin * sin).sqrt()
    }

    /// Geodetic (radians, metres) to earth-centred cartesian coordinates.
    fn geocentric(&self, latitude: f64, longitude: f64, height: f64) -> [f64; 3] {
        let n = self.prime_vertical_radius(latitude);
        let (sin_lat, cos_lat) = latitude.sin_cos();
        let (sin_lon, cos_lon) = longitude.sin_cos();
        [
            (n + height) * cos_lat * cos_lon,
            (n + height) * cos_lat * sin_lon,
            (n * (1.0 - self.eccentricity_squared) + height) * sin_lat,
        ]
    }

    /// Earth-centred cartesian coordinates to geodetic latitude and longitude
    /// in radians.
    fn geodetic(&self, [x, y, z]: [f64; 3]) -> (f64, f64) {
        let e2 = self.eccentricity_squared;
        let longitude = y.atan2(x);
        let p = x.hypot(y);

        let mut latitude = z.atan2(p * (1.0 - e2));
        for _ in 0..MAX_ITERATIONS {
            let n = self.prime_vertical_radius(latitude);
            let height = p / latitude.cos() - n;
            let next = z.atan2(p * (1.0 - e2 * n / (n + height)));
            let done = (next - latitude).abs() < EPSILON;
            latitude = next;
            if done {
                break;
            }
        }

        (latitude, longitude)
    }
}

/// The Swiss planar grids served by the mapping service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Grid {
    /// CH1903 / LV03, EPSG:21781.
    #[default]
    Lv03,
    /// CH1903+ / LV95, EPSG:2056.
    Lv95,
}

impl Grid {
    pub fn epsg(self) -> u32 {
        match self {
            Grid::Lv03 => 21781,
            Grid::Lv95 => 2056,
        }
    }

    /// Easting and northing of the projection centre in Bern.
    pub fn false_origin(self) -> (f64, f64) {
        match self {
            Grid::Lv03 => (600_000.0, 200_000.0),
            Grid::Lv95 => (2_600_000.0, 1_200_000.0),
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grid::Lv03 => f.write_str("lv03"),
            Grid::Lv95 => f.write_str("lv95"),
        }
    }
}

impl FromStr for Grid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lv03" | "21781" => Ok(Grid::Lv03),
            "lv95" | "2056" => Ok(Grid::Lv95),
            _ => Err(format!("unknown grid {s:?}, expected lv03 or lv95")),
        }
    }
}

/// Definition of the source coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    pub ellipsoid: Ellipsoid,
    /// Latitude of the projection centre in degrees.
    pub origin_latitude: f64,
    /// Longitude of the projection centre in degrees.
    pub origin_longitude: f64,
    pub false_easting: f64,
    pub false_northing: f64,
    /// Translation from the source datum to WGS84 in metres.
    pub to_wgs84: [f64; 3],
}

impl Parameters {
    /// Parameters of `grid` as published by swisstopo.
    pub fn swiss(grid: Grid) -> Self {
        let (false_easting, false_northing) = grid.false_origin();
        Self {
            ellipsoid: Ellipsoid::BESSEL_1841,
            // 46° 57' 08.66"
            origin_latitude: 46.0 + 57.0 / 60.0 + 8.66 / 3600.0,
            // 7° 26' 22.50"
            origin_longitude: 7.0 + 26.0 / 60.0 + 22.5 / 3600.0,
            false_easting,
            false_northing,
            to_wgs84: [674.374, 15.056, 405.346],
        }
    }
}

/// Converts [`PlanarPoint`]s to WGS84 [`GeoPoint`]s.
///
/// All projection constants are derived once in [`Transformer::new`]; the
/// conversion itself is pure.
#[derive(Debug, Clone)]
pub struct Transformer {
    params: Parameters,
    /// Radius of the projection sphere.
    radius: f64,
    alpha: f64,
    /// Spherical latitude of the projection centre.
    b0: f64,
    k: f64,
    /// First eccentricity of the source ellipsoid.
    e: f64,
}

impl Transformer {
    /// Create a transformer for one of the Swiss grids.
    ///
    /// # Example
    /// ```
    /// # use schweizmobil_gpx::{Grid, PlanarPoint, Transformer};
    /// let transformer = Transformer::new(Grid::Lv03).unwrap();
    /// let bern = transformer.transform(PlanarPoint::new(600_000.0, 200_000.0));
    /// assert!((bern.latitude - 46.951083).abs() < 1e-5);
    /// assert!((bern.longitude - 7.438632).abs() < 1e-5);
    /// ```
    pub fn new(grid: Grid) -> Result<Self, ConversionError> {
        debug!("setting up transformer for EPSG:{} to EPSG:4326", grid.epsg());
        Self::with_parameters(Parameters::swiss(grid))
    }

    /// Create a transformer for an arbitrary oblique conformal cylindrical
    /// projection.
    pub fn with_parameters(params: Parameters) -> Result<Self, ConversionError> {
        params.ellipsoid.validate()?;
        if params.to_wgs84.iter().any(|v| !v.is_finite()) {
            return Err(ConversionError::DatumShift(params.to_wgs84));
        }

        let e2 = params.ellipsoid.eccentricity_squared;
        let e = e2.sqrt();
        let phi0 = finite("origin latitude", params.origin_latitude.to_radians())?;
        finite("origin longitude", params.origin_longitude)?;
        finite("false easting", params.false_easting)?;
        finite("false northing", params.false_northing)?;

        let sin_phi0 = phi0.sin();
        let radius = finite(
            "sphere radius",
            params.ellipsoid.semi_major_axis * (1.0 - e2).sqrt() / (1.0 - e2 * sin_phi0 * sin_phi0),
        )?;
        let alpha = finite(
            "alpha",
            (1.0 + e2 / (1.0 - e2) * phi0.cos().powi(4)).sqrt(),
        )?;
        let b0 = finite("b0", (sin_phi0 / alpha).asin())?;
        let k = finite(
            "K",
            (FRAC_PI_4 + b0 / 2.0).tan().ln() - alpha * (FRAC_PI_4 + phi0 / 2.0).tan().ln()
                + alpha * e / 2.0 * ((1.0 + e * sin_phi0) / (1.0 - e * sin_phi0)).ln(),
        )?;

        Ok(Self {
            params,
            radius,
            alpha,
            b0,
            k,
            e,
        })
    }

    /// Convert a single point. The elevation is passed through unchanged.
    pub fn transform(&self, point: PlanarPoint) -> GeoPoint {
        let (latitude, longitude) = self.unproject(point.easting, point.northing);
        let (latitude, longitude) = self.shift_datum(latitude, longitude);
        GeoPoint {
            latitude: latitude.to_degrees(),
            longitude: longitude.to_degrees(),
            elevation: point.elevation,
        }
    }

    /// Convert all `points`, keeping their order.
    pub fn transform_all(&self, points: &[PlanarPoint]) -> Vec<GeoPoint> {
        points.iter().map(|&p| self.transform(p)).collect()
    }

    /// Inverse projection to ellipsoidal latitude and longitude on the source
    /// datum, in radians.
    fn unproject(&self, easting: f64, northing: f64) -> (f64, f64) {
        let y = easting - self.params.false_easting;
        let x = northing - self.params.false_northing;

        // Position on the sphere in the oblique system.
        let l_bar = y / self.radius;
        let b_bar = 2.0 * ((x / self.radius).exp().atan() - FRAC_PI_4);

        // Rotate to the equatorial system.
        let (sin_b0, cos_b0) = self.b0.sin_cos();
        let b = (cos_b0 * b_bar.sin() + sin_b0 * b_bar.cos() * l_bar.cos()).asin();
        let l = l_bar
            .sin()
            .atan2(cos_b0 * l_bar.cos() - sin_b0 * b_bar.tan());

        let longitude = self.params.origin_longitude.to_radians() + l / self.alpha;

        // Sphere to ellipsoid.
        let iso = ((FRAC_PI_4 + b / 2.0).tan().ln() - self.k) / self.alpha;
        let mut latitude = b;
        for _ in 0..MAX_ITERATIONS {
            let s = iso + self.e * (FRAC_PI_4 + (self.e * latitude.sin()).asin() / 2.0).tan().ln();
            let next = 2.0 * s.exp().atan() - 2.0 * FRAC_PI_4;
            let done = (next - latitude).abs() < EPSILON;
            latitude = next;
            if done {
                break;
            }
        }

        (latitude, longitude)
    }

    /// Move a position from the source datum to WGS84.
    ///
    /// Heights are taken as zero on both ellipsoids, as a 2D PROJ pipeline
    /// does.
    fn shift_datum(&self, latitude: f64, longitude: f64) -> (f64, f64) {
        let [x, y, z] = self.params.ellipsoid.geocentric(latitude, longitude, 0.0);
        let [dx, dy, dz] = self.params.to_wgs84;
        Ellipsoid::WGS84.geodetic([x + dx, y + dy, z + dz])
    }
}

fn finite(name: &'static str, value: f64) -> Result<f64, ConversionError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConversionError::Projection(name))
    }
}
