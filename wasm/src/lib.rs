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

//! This is a WASM wrapper for `schweizmobil_gpx`.

use schweizmobil_gpx::{Grid, Track};
use wasm_bindgen::{prelude::wasm_bindgen, JsError};

/// Convert the `profile` and `via_points` strings of a SchweizMobil track to
/// a GPX document.
///
/// Coordinates are read as LV95 if `lv95` is set, LV03 otherwise.
#[wasm_bindgen]
pub fn export(name: &str, profile: &str, via_points: &str, lv95: bool) -> Result<Box<[u8]>, JsError> {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    let track = Track::from_payload(name, profile, via_points)?;
    let grid = if lv95 { Grid::Lv95 } else { Grid::Lv03 };
    let document = schweizmobil_gpx::export(&track, grid)?;
    Ok(document.into_bytes().into_boxed_slice())
}

/// File name under which the GPX of track `name` should be saved.
#[wasm_bindgen]
pub fn file_name(name: &str) -> String {
    schweizmobil_gpx::file_name(name)
}
