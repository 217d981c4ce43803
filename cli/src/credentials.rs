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

//! Loading and prompting for the account credentials.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use thiserror::Error;

/// Looked up in the working directory when no file is given.
pub const DEFAULT_FILE: &str = "credentials.txt";

/// Username and password of a SchweizMobil account.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// Keep the password out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read credentials file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "credentials file {} is missing required fields or is malformed, \
         it should contain exactly two lines: username=... and password=...",
        .0.display()
    )]
    Malformed(PathBuf),
    #[error("prompting for {field} failed: {source}")]
    Prompt {
        field: Field,
        #[source]
        source: io::Error,
    },
    #[error("username or password missing")]
    Missing,
}

/// A credential that may have to be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Password,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Username => f.write_str("username"),
            Field::Password => f.write_str("password"),
        }
    }
}

/// Parse `key=value` lines.
///
/// Lines without `=` are ignored. The result is only valid if it consists of
/// exactly a non-empty `username` and a non-empty `password`.
pub fn parse(content: &str) -> Option<Credentials> {
    let mut username = None;
    let mut password = None;
    let mut other = false;
    for line in content.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim() {
            "username" => username = Some(value),
            "password" => password = Some(value),
            _ => other = true,
        }
    }

    match (username, password) {
        (Some(username), Some(password))
            if !other && !username.is_empty() && !password.is_empty() =>
        {
            Some(Credentials { username, password })
        }
        _ => None,
    }
}

/// Load credentials from `path`.
///
/// Returns `Ok(None)` if there is no file at `path`.
pub fn load(path: &Path) -> Result<Option<Credentials>, Error> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
        .map(Some)
        .ok_or_else(|| Error::Malformed(path.to_path_buf()))
}

/// Where credentials may come from, in increasing priority.
#[derive(Debug, Default)]
pub struct Sources<'a> {
    /// Explicitly given credentials file.
    pub file: Option<&'a Path>,
    /// File tried when `file` yields nothing.
    pub default_file: Option<&'a Path>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Combine all `sources`; anything still missing is asked for with `prompt`.
///
/// A malformed file is reported as a warning and otherwise ignored.
pub fn resolve(
    sources: Sources,
    mut prompt: impl FnMut(Field) -> io::Result<String>,
) -> Result<Credentials, Error> {
    let from_file = |path: &Path| match load(path) {
        Ok(creds) => creds,
        Err(err) => {
            warn!("{err}");
            None
        }
    };

    let mut creds = sources.file.and_then(from_file);
    if creds.is_none() {
        creds = sources.default_file.and_then(from_file);
    }
    if creds.is_some() {
        debug!("using credentials from file");
    }
    let mut creds = creds.unwrap_or_default();

    if let Some(username) = sources.username.filter(|v| !v.is_empty()) {
        creds.username = username;
    }
    if let Some(password) = sources.password.filter(|v| !v.is_empty()) {
        creds.password = password;
    }

    for field in [Field::Username, Field::Password] {
        let value = match field {
            Field::Username => &mut creds.username,
            Field::Password => &mut creds.password,
        };
        if value.is_empty() {
            *value = prompt(field)
                .map_err(|source| Error::Prompt { field, source })?
                .trim_end_matches(['\r', '\n'])
                .to_string();
        }
    }

    if creds.username.is_empty() || creds.password.is_empty() {
        return Err(Error::Missing);
    }
    Ok(creds)
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    fn no_prompt(field: Field) -> io::Result<String> {
        panic!("unexpected prompt for {field}");
    }

    #[test]
    fn parse_valid() {
        let creds = parse("username = anna\npassword=se=cret \n").unwrap();
        assert_eq!(creds.username, "anna");
        assert_eq!(creds.password, "se=cret");
    }

    #[test]
    fn parse_ignores_lines_without_equals() {
        assert!(parse("# my account\nusername=a\n\npassword=b").is_some());
    }

    #[test]
    fn parse_rejects_incomplete() {
        assert_eq!(parse("username=a"), None);
        assert_eq!(parse("username=a\npassword="), None);
        assert_eq!(parse("username=a\npassword=b\ntoken=c"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn debug_hides_password() {
        let creds = Credentials {
            username: "anna".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{creds:?}").contains("hunter2"));
    }

    #[test]
    fn load_missing_file() {
        let dir = TempDir::new("credentials").unwrap();
        assert!(load(&dir.path().join("nope.txt")).unwrap().is_none());
    }

    #[test]
    fn load_malformed_file() {
        let dir = TempDir::new("credentials").unwrap();
        let path = dir.path().join("credentials.txt");
        fs::write(&path, "user=a\npass=b\n").unwrap();
        assert!(matches!(load(&path), Err(Error::Malformed(p)) if p == path));
    }

    #[test]
    fn flags_override_file() {
        let dir = TempDir::new("credentials").unwrap();
        let path = dir.path().join("mine.txt");
        fs::write(&path, "username=file\npassword=filepw\n").unwrap();

        let creds = resolve(
            Sources {
                file: Some(&path),
                username: Some("flag".into()),
                ..Default::default()
            },
            no_prompt,
        )
        .unwrap();

        assert_eq!(creds.username, "flag");
        assert_eq!(creds.password, "filepw");
    }

    #[test]
    fn empty_flags_keep_file_values() {
        let dir = TempDir::new("credentials").unwrap();
        let path = dir.path().join("mine.txt");
        fs::write(&path, "username=file\npassword=filepw\n").unwrap();

        let creds = resolve(
            Sources {
                file: Some(&path),
                username: Some(String::new()),
                password: Some(String::new()),
                ..Default::default()
            },
            no_prompt,
        )
        .unwrap();

        assert_eq!(creds.username, "file");
        assert_eq!(creds.password, "filepw");
    }

    #[test]
    fn falls_back_to_default_file() {
        let dir = TempDir::new("credentials").unwrap();
        let bad = dir.path().join("bad.txt");
        let default = dir.path().join(DEFAULT_FILE);
        fs::write(&bad, "garbage").unwrap();
        fs::write(&default, "username=d\npassword=p\n").unwrap();

        let creds = resolve(
            Sources {
                file: Some(&bad),
                default_file: Some(&default),
                ..Default::default()
            },
            no_prompt,
        )
        .unwrap();

        assert_eq!(creds.username, "d");
    }

    #[test]
    fn prompts_for_missing_fields() {
        let mut asked = vec![];
        let creds = resolve(
            Sources {
                username: Some("anna".into()),
                ..Default::default()
            },
            |field| {
                asked.push(field);
                Ok("pw\n".to_string())
            },
        )
        .unwrap();

        assert_eq!(asked, [Field::Password]);
        assert_eq!(creds.password, "pw");
    }

    #[test]
    fn empty_after_prompt() {
        let result = resolve(Sources::default(), |_| Ok(String::new()));
        assert!(matches!(result, Err(Error::Missing)));
    }
}
