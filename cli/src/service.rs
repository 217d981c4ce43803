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

//! Minimal client for the SchweizMobil map API.

use std::fmt;

use log::{debug, info};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use schweizmobil_gpx::{ProfileError, Track};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://map.schweizmobil.ch";

#[derive(Error, Debug)]
pub enum Error {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("login failed with status {0}, please check your username and password")]
    LoginFailed(StatusCode),
    #[error("GET {url} returned status {status}")]
    Status { url: String, status: StatusCode },
}

/// Identifier of a saved track.
///
/// The service uses numbers, but nothing else relies on that.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TrackId {
    Number(u64),
    Text(String),
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackId::Number(id) => write!(f, "{id}"),
            TrackId::Text(id) => f.write_str(id),
        }
    }
}

/// Entry of the track list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackSummary {
    pub id: TrackId,
    pub name: String,
}

/// Full track as returned by the detail endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackDetail {
    pub properties: TrackProperties,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackProperties {
    /// Encoded list of `[easting, northing, elevation, distance]`.
    pub profile: String,
    /// Encoded list of `[easting, northing]`.
    #[serde(default)]
    pub via_points: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub modified_at: Option<String>,
    #[serde(default)]
    pub filter_name: Option<String>,
}

impl TrackDetail {
    /// Decode the geometry of this track.
    pub fn to_track(&self, name: &str) -> Result<Track, ProfileError> {
        let props = &self.properties;
        Track::from_payload(name, &props.profile, props.via_points.as_deref().unwrap_or(""))
    }
}

/// Read access to the saved tracks of an account.
pub trait TrackSource {
    fn tracks(&self) -> Result<Vec<TrackSummary>, Error>;
    fn track_detail(&self, id: &TrackId) -> Result<TrackDetail, Error>;
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Authenticated session. The session cookie lives in the client.
pub struct Session {
    client: Client,
    base_url: String,
}

impl Session {
    /// Log in to the service at `base_url`.
    pub fn login(base_url: &str, username: &str, password: &str) -> Result<Self, Error> {
        let client = Client::builder().cookie_store(true).build()?;
        let session = Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        };

        let url = session.url("/api/4/login");
        debug!("POST {url}");
        let response = session
            .client
            .post(&url)
            .json(&LoginRequest { username, password })
            .send()?;
        if response.status() != StatusCode::OK {
            return Err(Error::LoginFailed(response.status()));
        }

        info!("logged in as {username}");
        Ok(session)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> Result<Response, Error> {
        let url = self.url(path);
        debug!("GET {url}");
        let response = self.client.get(&url).send()?;
        if response.status() != StatusCode::OK {
            return Err(Error::Status {
                url,
                status: response.status(),
            });
        }
        Ok(response)
    }
}

impl TrackSource for Session {
    fn tracks(&self) -> Result<Vec<TrackSummary>, Error> {
        let tracks: Vec<TrackSummary> = self.get("/api/5/tracks")?.json()?;
        debug!("account has {} tracks", tracks.len());
        Ok(tracks)
    }

    fn track_detail(&self, id: &TrackId) -> Result<TrackDetail, Error> {
        Ok(self.get(&format!("/api/4/tracks/{id}"))?.json()?)
    }
}
