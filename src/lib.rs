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

//! Library for exporting [SchweizMobil](https://map.schweizmobil.ch) tracks
//! as [GPX](https://www.topografix.com/gpx.asp).
//!
//! Tracks are stored by the service in the Swiss planar grid. This library
//! converts their vertices to WGS84 and writes them as a GPX track, with the
//! track's via-points as named waypoints. It does no network I/O; the
//! command-line front-end fetches the track and hands it to [`export`] or
//! [`export_to_file`].

use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

mod encode;
mod point;
mod profile;
mod transform;

pub use encode::{build_gpx, encode, file_name, write_to_file, EncodeError, WriteError, CREATOR};
pub use point::{GeoPoint, PlanarPoint, Track, ViaPoint};
pub use profile::{parse_profile, parse_via_points, via_point_name, ProfileError};
pub use transform::{ConversionError, Ellipsoid, Grid, Parameters, Transformer};

/// Error returned from the export functions.
#[derive(Error, Debug)]
pub enum Error {
    /// The track payload could not be decoded.
    #[error("decoding track failed: {0}")]
    Profile(#[from] ProfileError),
    /// The coordinate transformation could not be set up.
    #[error("coordinate conversion failed: {0}")]
    Conversion(#[from] ConversionError),
    /// GPX encoding failed.
    #[error("encoding GPX failed: {0}")]
    Encode(#[from] EncodeError),
    /// The document could not be written.
    #[error("writing GPX failed: {0}")]
    Write(#[from] WriteError),
}

/// Convert a `track` given in `grid` coordinates and encode it as GPX.
///
/// # Example
/// ```
/// # use schweizmobil_gpx::{export, Grid, PlanarPoint, Track, ViaPoint};
/// let summit = PlanarPoint::with_elevation(600_200.0, 200_100.0, 610.0);
/// let track = Track {
///     name: "Alpine Loop".to_string(),
///     points: vec![
///         PlanarPoint::with_elevation(600_000.0, 200_000.0, 540.0),
///         summit,
///         PlanarPoint::with_elevation(600_400.0, 200_000.0, 560.0),
///     ],
///     via_points: vec![ViaPoint { name: "Summit".to_string(), point: summit }],
/// };
///
/// let document = export(&track, Grid::Lv03).expect("export failed");
/// assert_eq!(document.matches("<trkpt").count(), 3);
/// assert_eq!(document.matches("<wpt").count(), 1);
/// assert!(document.contains("<name>Summit</name>"));
/// ```
pub fn export(track: &Track, grid: Grid) -> Result<String, Error> {
    let transformer = Transformer::new(grid)?;
    export_with(track, &transformer)
}

/// Like [`export`], but with an existing `transformer`.
pub fn export_with(track: &Track, transformer: &Transformer) -> Result<String, Error> {
    let points = transformer.transform_all(&track.points);
    let via_points: Vec<_> = track
        .via_points
        .iter()
        .map(|via| (via.name.clone(), transformer.transform(via.point)))
        .collect();
    info!(
        "converted {:?}: {} points, {} via-points",
        track.name,
        points.len(),
        via_points.len()
    );
    Ok(encode(&track.name, &points, &via_points)?)
}

/// Export a `track` and write it to `dir`.
///
/// The file is named after the track, see [`file_name`]. Returns the path of
/// the written file.
pub fn export_to_file(track: &Track, grid: Grid, dir: &Path) -> Result<PathBuf, Error> {
    let document = export(track, grid)?;
    Ok(write_to_file(&document, dir, &track.name)?)
}
