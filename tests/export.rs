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

use std::fs;
use std::path::Path;

use schweizmobil_gpx::{
    export, export_to_file, write_to_file, Error, GeoPoint, Grid, PlanarPoint, Track, Transformer,
    ViaPoint,
};
use tempdir::TempDir;

/// Degrees.
const TOLERANCE: f64 = 1e-6;

fn alpine_loop() -> Track {
    let summit = PlanarPoint::with_elevation(601_250.0, 201_800.5, 1858.2);
    Track {
        name: "Alpine Loop".to_string(),
        points: vec![
            PlanarPoint::with_elevation(600_000.0, 200_000.0, 540.0),
            summit,
            PlanarPoint::new(602_500.25, 199_750.75),
        ],
        via_points: vec![ViaPoint {
            name: "Summit".to_string(),
            point: summit,
        }],
    }
}

fn read(document: &str) -> gpx::Gpx {
    gpx::read(document.as_bytes()).expect("document is not valid GPX")
}

fn assert_same(expected: &GeoPoint, actual: &gpx::Waypoint) {
    let point = actual.point();
    assert!((point.y() - expected.latitude).abs() < TOLERANCE);
    assert!((point.x() - expected.longitude).abs() < TOLERANCE);
    assert_eq!(actual.elevation, expected.elevation);
}

#[test]
fn alpine_loop_counts() {
    let gpx = read(&export(&alpine_loop(), Grid::Lv03).unwrap());

    assert_eq!(gpx.tracks.len(), 1);
    assert_eq!(gpx.tracks[0].segments.len(), 1);
    assert_eq!(gpx.tracks[0].segments[0].points.len(), 3);
    assert_eq!(gpx.waypoints.len(), 1);
    assert_eq!(gpx.waypoints[0].name.as_deref(), Some("Summit"));
    assert_eq!(
        gpx.metadata.and_then(|m| m.name).as_deref(),
        Some("Alpine Loop")
    );
}

#[test]
fn round_trip_keeps_coordinates_and_order() {
    let track = Track {
        name: "Zigzag".to_string(),
        points: (0..50)
            .map(|i| {
                let offset = if i % 2 == 0 { 0.0 } else { 35.5 };
                PlanarPoint::with_elevation(
                    640_000.0 + 20.0 * i as f64 + offset,
                    180_000.0 - 15.0 * i as f64,
                    700.0 + i as f64 * 0.1,
                )
            })
            // Duplicates must survive.
            .chain([PlanarPoint::new(640_000.0, 180_000.0); 2])
            .collect(),
        via_points: vec![],
    };
    let transformer = Transformer::new(Grid::Lv03).unwrap();
    let expected = transformer.transform_all(&track.points);

    let gpx = read(&export(&track, Grid::Lv03).unwrap());

    let actual = &gpx.tracks[0].segments[0].points;
    assert_eq!(actual.len(), expected.len());
    for (expected, actual) in expected.iter().zip(actual) {
        assert_same(expected, actual);
    }
}

#[test]
fn via_points_keep_order_and_position() {
    let track = Track::from_payload(
        "Seeweg",
        "[[600000, 200000, 540, 0], [600500, 200500, 560, 707.1], [601000, 201000, 600, 1414.2]]",
        "[[600000, 200000], [600500, 200500], [601000, 201000]]",
    )
    .unwrap();
    let transformer = Transformer::new(Grid::Lv03).unwrap();

    let gpx = read(&export(&track, Grid::Lv03).unwrap());

    let names: Vec<_> = gpx
        .waypoints
        .iter()
        .map(|w| w.name.clone().unwrap_or_default())
        .collect();
    assert_eq!(names, ["Starting point", "Waypoint", "Destination"]);
    for (via, waypoint) in track.via_points.iter().zip(&gpx.waypoints) {
        assert_same(&transformer.transform(via.point), waypoint);
    }
}

#[test]
fn no_via_points() {
    let mut track = alpine_loop();
    track.via_points.clear();

    let gpx = read(&export(&track, Grid::Lv03).unwrap());

    assert!(gpx.waypoints.is_empty());
    assert_eq!(gpx.tracks[0].segments[0].points.len(), 3);
}

#[test]
fn lv95_export_matches_lv03() {
    let lv03 = alpine_loop();
    let mut lv95 = lv03.clone();
    for point in &mut lv95.points {
        point.easting += 2_000_000.0;
        point.northing += 1_000_000.0;
    }
    for via in &mut lv95.via_points {
        via.point.easting += 2_000_000.0;
        via.point.northing += 1_000_000.0;
    }

    let a = read(&export(&lv03, Grid::Lv03).unwrap());
    let b = read(&export(&lv95, Grid::Lv95).unwrap());

    for (a, b) in a.tracks[0].segments[0].points.iter().zip(&b.tracks[0].segments[0].points) {
        assert!((a.point().x() - b.point().x()).abs() < 1e-9);
        assert!((a.point().y() - b.point().y()).abs() < 1e-9);
    }
}

#[test]
fn writes_file_named_after_track() {
    let dir = TempDir::new("schweizmobil_gpx").unwrap();

    let path = export_to_file(&alpine_loop(), Grid::Lv03, dir.path()).unwrap();

    assert_eq!(path, dir.path().join("Alpine Loop.gpx"));
    let gpx = read(&fs::read_to_string(&path).unwrap());
    assert_eq!(gpx.tracks[0].segments[0].points.len(), 3);
    // Only the final file is left behind.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn overwrites_existing_file() {
    let dir = TempDir::new("schweizmobil_gpx").unwrap();
    let path = dir.path().join("Alpine Loop.gpx");
    fs::write(&path, "stale").unwrap();

    export_to_file(&alpine_loop(), Grid::Lv03, dir.path()).unwrap();

    assert!(fs::read_to_string(&path).unwrap().contains("<gpx"));
}

#[test]
fn sanitizes_file_name() {
    let dir = TempDir::new("schweizmobil_gpx").unwrap();

    let path = write_to_file("<gpx/>", dir.path(), "Bern/Thun: 2?").unwrap();

    assert_eq!(path.file_name().unwrap(), "Bern_Thun_ 2_.gpx");
    assert_eq!(path.parent(), Some(dir.path()));
}

#[test]
fn very_long_track_name() {
    let dir = TempDir::new("schweizmobil_gpx").unwrap();
    let mut track = alpine_loop();
    track.name = "a".repeat(300);

    let path = export_to_file(&track, Grid::Lv03, dir.path()).unwrap();

    let name = path.file_name().unwrap().to_str().unwrap();
    assert_eq!(name.len(), 255);
    assert!(name.ends_with(".gpx"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    // The full name survives inside the document.
    let gpx = read(&fs::read_to_string(&path).unwrap());
    assert_eq!(gpx.tracks[0].name.as_deref(), Some(track.name.as_str()));
}

#[test]
fn name_filling_the_limit() {
    let dir = TempDir::new("schweizmobil_gpx").unwrap();

    let path = write_to_file("<gpx/>", dir.path(), &"a".repeat(250)).unwrap();

    assert_eq!(fs::read_to_string(path).unwrap(), "<gpx/>");
}

#[test]
fn missing_directory_is_a_write_error() {
    let dir = TempDir::new("schweizmobil_gpx").unwrap();
    let missing = dir.path().join("does").join("not").join("exist");

    let err = export_to_file(&alpine_loop(), Grid::Lv03, &missing).unwrap_err();

    match err {
        Error::Write(err) => assert_eq!(err.path, missing.join("Alpine Loop.gpx")),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!Path::new(&missing).exists());
}
