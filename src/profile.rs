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

//! Decoding of the track payload delivered by the mapping service.
//!
//! A track's `profile` is a list of `[easting, northing, elevation, distance]`
//! vertices, sometimes written with single quotes. Its `via_points` are a list
//! of `[easting, northing]` pairs.

use thiserror::Error;

use crate::point::{PlanarPoint, Track, ViaPoint};

/// Name of the first via-point.
pub const START_NAME: &str = "Starting point";
/// Name of the last via-point.
pub const DESTINATION_NAME: &str = "Destination";
/// Name of every via-point in between.
pub const WAYPOINT_NAME: &str = "Waypoint";

/// Error returned when a payload string cannot be decoded.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// The payload is not a JSON list of number lists.
    #[error("decoding {field} failed: {source}")]
    Json {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// A vertex lacks easting or northing.
    #[error("{field} vertex {index} has {len} component(s), expected at least 2")]
    Vertex {
        field: &'static str,
        index: usize,
        len: usize,
    },
}

impl Track {
    /// Build a track from the raw `profile` and `via_points` strings.
    ///
    /// # Example
    /// ```
    /// # use schweizmobil_gpx::Track;
    /// let track = Track::from_payload(
    ///     "Aareweg",
    ///     "[[600000, 200000, 540.0, 0.0], [600100, 200050, 545.5, 111.8]]",
    ///     "[[600000, 200000], [600100, 200050]]",
    /// )
    /// .unwrap();
    /// assert_eq!(track.points.len(), 2);
    /// assert_eq!(track.via_points[1].name, "Destination");
    /// ```
    pub fn from_payload(
        name: impl Into<String>,
        profile: &str,
        via_points: &str,
    ) -> Result<Self, ProfileError> {
        Ok(Self {
            name: name.into(),
            points: parse_profile(profile)?,
            via_points: parse_via_points(via_points)?,
        })
    }
}

/// Decode the `profile` string into path vertices.
///
/// The third component, if present, is the elevation. Further components
/// (the running distance) are ignored.
pub fn parse_profile(profile: &str) -> Result<Vec<PlanarPoint>, ProfileError> {
    parse_vertices("profile", profile)
}

/// Decode the `via_points` string and name the points by position.
pub fn parse_via_points(via_points: &str) -> Result<Vec<ViaPoint>, ProfileError> {
    let points = parse_vertices("via_points", via_points)?;
    let len = points.len();
    Ok(points
        .into_iter()
        .enumerate()
        .map(|(index, point)| ViaPoint {
            name: via_point_name(index, len).to_string(),
            point,
        })
        .collect())
}

/// Name of via-point `index` out of `len`.
pub fn via_point_name(index: usize, len: usize) -> &'static str {
    if index == 0 {
        START_NAME
    } else if index + 1 == len {
        DESTINATION_NAME
    } else {
        WAYPOINT_NAME
    }
}

fn parse_vertices(field: &'static str, raw: &str) -> Result<Vec<PlanarPoint>, ProfileError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(vec![]);
    }

    let normalized = raw.replace('\'', "\"");
    let vertices: Vec<Vec<f64>> = serde_json::from_str(&normalized)
        .map_err(|source| ProfileError::Json { field, source })?;

    vertices
        .into_iter()
        .enumerate()
        .map(|(index, vertex)| match vertex[..] {
            [easting, northing] => Ok(PlanarPoint::new(easting, northing)),
            [easting, northing, elevation, ..] => {
                Ok(PlanarPoint::with_elevation(easting, northing, elevation))
            }
            _ => Err(ProfileError::Vertex {
                field,
                index,
                len: vertex.len(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_vertices() {
        let points = parse_profile("[[600000.0, 200000.0, 540.5, 0.0], [600010, 200020, 541, 22.4]]")
            .unwrap();
        assert_eq!(
            points,
            vec![
                PlanarPoint::with_elevation(600_000.0, 200_000.0, 540.5),
                PlanarPoint::with_elevation(600_010.0, 200_020.0, 541.0),
            ]
        );

        // Quoted strings are not numbers, whichever quotes are used.
        let quoted = parse_profile("[['1', '2']]");
        assert!(matches!(quoted, Err(ProfileError::Json { field: "profile", .. })));
    }

    #[test]
    fn profile_without_elevation() {
        let points = parse_profile("[[600000, 200000]]").unwrap();
        assert_eq!(points, vec![PlanarPoint::new(600_000.0, 200_000.0)]);
    }

    #[test]
    fn short_vertex() {
        let err = parse_profile("[[1, 2, 3], [4]]").unwrap_err();
        assert!(matches!(
            err,
            ProfileError::Vertex {
                field: "profile",
                index: 1,
                len: 1
            }
        ));
    }

    #[test]
    fn empty_payload() {
        assert!(parse_profile("").unwrap().is_empty());
        assert!(parse_via_points("[]").unwrap().is_empty());
    }

    #[test]
    fn garbage_payload() {
        assert!(matches!(
            parse_via_points("not json"),
            Err(ProfileError::Json {
                field: "via_points",
                ..
            })
        ));
    }

    #[test]
    fn via_point_names() {
        let names: Vec<_> = parse_via_points("[[1, 2], [3, 4], [5, 6], [7, 8]]")
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, ["Starting point", "Waypoint", "Waypoint", "Destination"]);

        assert_eq!(via_point_name(0, 1), START_NAME);
        assert_eq!(via_point_name(1, 2), DESTINATION_NAME);
    }
}
