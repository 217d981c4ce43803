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

//! Command-line tool that downloads a track from SchweizMobil and saves it as
//! GPX.

mod credentials;
mod select;
mod service;

use std::io::{self, stdin, stdout, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::debug;
use schweizmobil_gpx::{export_to_file, Grid, ProfileError};
use thiserror::Error;

use credentials::{Credentials, Field, Sources};
use service::Session;

#[derive(Error, Debug)]
enum Error {
    #[error(transparent)]
    Credentials(#[from] credentials::Error),
    #[error(transparent)]
    Service(#[from] service::Error),
    #[error(transparent)]
    Select(#[from] select::Error),
    #[error("decoding track failed: {0}")]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Export(#[from] schweizmobil_gpx::Error),
    #[error("reading input failed: {0}")]
    Io(#[from] io::Error),
    #[error("no track name given")]
    NoTrack,
}

fn cli() -> Command {
    Command::new("schweizmobil-gpx")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Download a track from schweizmobil.ch and export it as GPX")
        .arg(
            Arg::new("username")
                .short('u')
                .long("username")
                .help("Your schweizmobil.ch username"),
        )
        .arg(
            Arg::new("password")
                .short('p')
                .long("password")
                .help("Your schweizmobil.ch password"),
        )
        .arg(
            Arg::new("track")
                .short('t')
                .long("track")
                .help("Name of the track to export (case-sensitive)"),
        )
        .arg(
            Arg::new("credentials-file")
                .short('c')
                .long("credentials-file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("File with the lines username=... and password=..."),
        )
        .arg(
            Arg::new("grid")
                .long("grid")
                .value_name("GRID")
                .value_parser(|s: &str| s.parse::<Grid>())
                .default_value("lv03")
                .help("Coordinate grid used by the service (lv03 or lv95)"),
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .default_value(".")
                .help("Directory to write the GPX file to"),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .value_name("URL")
                .default_value(service::DEFAULT_BASE_URL)
                .help("Root URL of the map service"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable verbose output"),
        )
}

fn main() -> ExitCode {
    let matches = cli().get_matches();

    // RUST_LOG takes precedence.
    let level = if matches.get_flag("verbose") {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&matches) {
        Ok(path) => {
            println!("GPX written: {}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Export failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(matches: &ArgMatches) -> Result<PathBuf, Error> {
    let creds = credentials::resolve(
        Sources {
            file: matches
                .get_one::<PathBuf>("credentials-file")
                .map(PathBuf::as_path),
            default_file: Some(Path::new(credentials::DEFAULT_FILE)),
            username: matches.get_one::<String>("username").cloned(),
            password: matches.get_one::<String>("password").cloned(),
        },
        prompt,
    )?;

    let name = match matches.get_one::<String>("track") {
        Some(name) => name.clone(),
        None => read_line("Track name (case-sensitive): ")?,
    };
    if name.is_empty() {
        return Err(Error::NoTrack);
    }

    let Credentials { username, password } = creds;
    let base_url = matches
        .get_one::<String>("base-url")
        .map(String::as_str)
        .unwrap_or(service::DEFAULT_BASE_URL);
    let session = Session::login(base_url, &username, &password)?;

    let detail = select::select(&session, &name, &mut stdin().lock(), &mut stdout())?;
    let track = detail.to_track(&name)?;
    debug!(
        "track {name:?} has {} points and {} via-points",
        track.points.len(),
        track.via_points.len()
    );

    let grid = matches.get_one::<Grid>("grid").copied().unwrap_or_default();
    let dir = matches
        .get_one::<PathBuf>("output-dir")
        .map(PathBuf::as_path)
        .unwrap_or(Path::new("."));
    Ok(export_to_file(&track, grid, dir)?)
}

fn prompt(field: Field) -> io::Result<String> {
    match field {
        Field::Username => read_line("Schweizmobil.ch username: "),
        Field::Password => rpassword::prompt_password("Schweizmobil.ch password: "),
    }
}

fn read_line(prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    stdout().flush()?;
    let mut line = String::new();
    stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
