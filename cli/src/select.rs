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

//! Choosing a track by its name.

use std::io::{self, BufRead, Write};

use chrono::{DateTime, NaiveDateTime};
use log::warn;
use thiserror::Error;

use crate::service::{self, TrackDetail, TrackSource, TrackSummary};

/// Format of dates shown to the user.
const DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", not_found_message(.name, .available))]
    NotFound {
        name: String,
        available: Vec<TrackSummary>,
    },
    #[error(transparent)]
    Service(#[from] service::Error),
    #[error("reading selection failed: {0}")]
    Io(#[from] io::Error),
    #[error("no track selected")]
    Aborted,
}

fn not_found_message(name: &str, available: &[TrackSummary]) -> String {
    let header = format!("track '{name}' not found in your schweizmobil.ch account");
    if available.is_empty() {
        return format!("{header}, the account has no tracks");
    }
    let list: String = available
        .iter()
        .map(|track| format!("\n- {} (ID: {})", track.name, track.id))
        .collect();
    format!("{header}\nAvailable tracks:{list}")
}

/// Find the track called `name` and fetch its details.
///
/// Names are compared exactly. If several tracks share the name, they are
/// listed on `output` and the user picks one from `input`.
pub fn select(
    source: &impl TrackSource,
    name: &str,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<TrackDetail, Error> {
    let tracks = source.tracks()?;
    let matching: Vec<_> = tracks.iter().filter(|t| t.name == name).cloned().collect();

    match &matching[..] {
        [] => Err(Error::NotFound {
            name: name.to_string(),
            available: tracks,
        }),
        [track] => Ok(source.track_detail(&track.id)?),
        _ => choose(source, name, &matching, input, output),
    }
}

fn choose(
    source: &impl TrackSource,
    name: &str,
    matching: &[TrackSummary],
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<TrackDetail, Error> {
    writeln!(output, "\nMultiple tracks found with the name '{name}':")?;
    let mut details = Vec::with_capacity(matching.len());
    for (idx, track) in matching.iter().enumerate() {
        match source.track_detail(&track.id) {
            Ok(detail) => {
                writeln!(output, "{}: {}", idx + 1, describe(track, &detail))?;
                details.push(Some(detail));
            }
            Err(err) => {
                warn!("fetching details of track {} failed: {err}", track.id);
                writeln!(output, "{}: (details unavailable) | ID={}", idx + 1, track.id)?;
                details.push(None);
            }
        }
    }

    loop {
        write!(output, "Select a track (1-{}): ", matching.len())?;
        output.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(Error::Aborted);
        }

        match line.trim().parse::<usize>() {
            Ok(choice) if (1..=details.len()).contains(&choice) => {
                match details[choice - 1].take() {
                    Some(detail) => return Ok(detail),
                    None => writeln!(
                        output,
                        "Details for this track are unavailable. Please choose another."
                    )?,
                }
            }
            Ok(_) => writeln!(output, "Invalid choice. Please try again.")?,
            Err(_) => writeln!(output, "Invalid input. Please enter a number.")?,
        }
    }
}

/// One-line summary used to tell tracks of the same name apart.
fn describe(track: &TrackSummary, detail: &TrackDetail) -> String {
    let props = &detail.properties;
    format!(
        "{} | ID={} | Created: {} | Modified: {}",
        props.filter_name.as_deref().unwrap_or("N/A"),
        track.id,
        format_date(props.created_at.as_deref()),
        format_date(props.modified_at.as_deref()),
    )
}

/// Format an ISO 8601 timestamp for display. Unparseable values are shown as
/// they are.
fn format_date(date: Option<&str>) -> String {
    let Some(date) = date else {
        return "unknown".to_string();
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
        return parsed.format(DATE_FORMAT).to_string();
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(date, format).ok())
        .map(|parsed| parsed.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| date.to_string())
}
