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

//! Serialization of converted tracks to [GPX](https://www.topografix.com/gpx.asp)
//! and writing of the result to disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;

use geo_types::Point;
use gpx::{errors::GpxError, Gpx, GpxVersion, Metadata, Track, TrackSegment, Waypoint};
use log::{debug, info};
use thiserror::Error;

use crate::point::GeoPoint;

/// Value of the `creator` attribute of the `<gpx>` tag.
pub const CREATOR: &str = "schweizmobil.ch-API converter";
/// Extension of written files.
pub const EXTENSION: &str = "gpx";
/// File stem used when a track name has no usable characters.
const FALLBACK_STEM: &str = "track";
/// Characters that are replaced in file names.
const UNSAFE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
/// Longest file name, in bytes, accepted by common file systems.
const MAX_NAME_BYTES: usize = 255;
/// Device names Windows reserves regardless of extension.
const RESERVED_STEMS: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];
/// Name of the file a document is written to before being renamed.
const TEMP_NAME: &str = ".schweizmobil_gpx.part";

/// Error returned from [`encode`].
#[derive(Error, Debug)]
pub enum EncodeError {
    /// The GPX writer failed.
    #[error("writing GPX failed: {0}")]
    Gpx(#[from] GpxError),
    /// The GPX writer produced invalid UTF-8.
    #[error("GPX output is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

/// Error returned from [`write_to_file`].
#[derive(Error, Debug)]
#[error("cannot write {}: {source}", path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Build the GPX structure for a converted track.
///
/// Each via-point becomes a waypoint, the path becomes a single track with a
/// single segment.
pub fn build_gpx(track_name: &str, points: &[GeoPoint], via_points: &[(String, GeoPoint)]) -> Gpx {
    let waypoints = via_points
        .iter()
        .map(|(name, point)| {
            let mut waypoint = to_waypoint(point);
            waypoint.name = Some(name.clone());
            waypoint
        })
        .collect();

    let mut segment = TrackSegment::new();
    segment.points = points.iter().map(to_waypoint).collect();

    let mut track = Track::new();
    track.name = Some(track_name.to_string());
    track.segments.push(segment);

    Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(CREATOR.to_string()),
        metadata: Some(Metadata {
            name: Some(track_name.to_string()),
            ..Default::default()
        }),
        waypoints,
        tracks: vec![track],
        ..Default::default()
    }
}

/// Encode a converted track as a GPX 1.1 document.
///
/// Coordinates are written with full `f64` precision. Elevation is only
/// written for points that have one.
///
/// # Example
/// ```
/// # use schweizmobil_gpx::{encode, GeoPoint};
/// let path = [GeoPoint { latitude: 46.95, longitude: 7.44, elevation: Some(540.0) }];
/// let summit = GeoPoint { latitude: 46.96, longitude: 7.45, elevation: None };
///
/// let document = encode("Alpine Loop", &path, &[("Summit".to_string(), summit)]).unwrap();
/// assert!(document.contains("<name>Summit</name>"));
/// assert!(document.contains("46.95"));
/// ```
pub fn encode(
    track_name: &str,
    points: &[GeoPoint],
    via_points: &[(String, GeoPoint)],
) -> Result<String, EncodeError> {
    let gpx = build_gpx(track_name, points, via_points);
    let mut sink = vec![];
    gpx::write(&gpx, &mut sink)?;
    debug!(
        "encoded {:?}: {} track points, {} waypoints, {} bytes",
        track_name,
        points.len(),
        via_points.len(),
        sink.len()
    );
    Ok(String::from_utf8(sink)?)
}

/// Derive a file name from a track's display name.
///
/// Path separators, characters reserved on Windows (`: * ? " < > |`), and
/// control characters are replaced by `_`. The name is cut so the file name
/// fits in 255 bytes, then surrounding whitespace and trailing dots are
/// removed. A name with nothing left becomes `track`, a Windows device name
/// such as `CON` gets a leading `_`.
///
/// ```
/// # use schweizmobil_gpx::file_name;
/// assert_eq!(file_name("Alpine Loop"), "Alpine Loop.gpx");
/// assert_eq!(file_name("Bern/Thun: day 1"), "Bern_Thun_ day 1.gpx");
/// ```
pub fn file_name(track_name: &str) -> String {
    let mut stem: String = track_name
        .chars()
        .map(|c| {
            if c.is_control() || UNSAFE_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    let max_stem = MAX_NAME_BYTES - EXTENSION.len() - 1;
    if stem.len() > max_stem {
        let mut end = max_stem;
        while !stem.is_char_boundary(end) {
            end -= 1;
        }
        stem.truncate(end);
    }

    let trimmed = stem
        .trim_start()
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        return format!("{FALLBACK_STEM}.{EXTENSION}");
    }

    let device = trimmed.split('.').next().unwrap_or(trimmed).trim_end();
    if RESERVED_STEMS
        .iter()
        .any(|reserved| device.eq_ignore_ascii_case(reserved))
    {
        format!("_{trimmed}.{EXTENSION}")
    } else {
        format!("{trimmed}.{EXTENSION}")
    }
}

/// Write `document` to `dir`, naming the file after `track_name`.
///
/// The document goes to a temporary file first, which is then renamed over
/// the destination. On error no file exists beyond what existed before.
pub fn write_to_file(document: &str, dir: &Path, track_name: &str) -> Result<PathBuf, WriteError> {
    let name = file_name(track_name);
    let path = dir.join(&name);
    let tmp = dir.join(TEMP_NAME);

    let result = fs::write(&tmp, document).and_then(|()| fs::rename(&tmp, &path));
    if let Err(source) = result {
        // The temporary file may not even exist.
        let _ = fs::remove_file(&tmp);
        return Err(WriteError { path, source });
    }

    info!("GPX written: {}", path.display());
    Ok(path)
}

fn to_waypoint(point: &GeoPoint) -> Waypoint {
    let mut waypoint = Waypoint::new(Point::new(point.longitude, point.latitude));
    waypoint.elevation = point.elevation;
    waypoint
}
