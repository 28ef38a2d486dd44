//! Marker set for the facility map.

use serde::Serialize;

use crate::models::Facility;

pub const WORLD_CENTER: [f64; 2] = [0.0, 0.0];
pub const WORLD_ZOOM: u8 = 2;

const MARKER_COLOR: &str = "blue";
const HIGHLIGHT_COLOR: &str = "red";

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MapMarker {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub color: &'static str,
    pub highlighted: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MapView {
    pub center: [f64; 2],
    pub zoom: u8,
    pub markers: Vec<MapMarker>,
}

impl MapView {
    /// World view with one marker per facility, in load order. The facility
    /// at `highlight` (a load position) is drawn in a distinct color.
    pub fn world(facilities: &[Facility], highlight: Option<usize>) -> Self {
        let markers = facilities
            .iter()
            .enumerate()
            .map(|(position, f)| {
                let highlighted = highlight == Some(position);
                MapMarker {
                    name: f.name.clone(),
                    latitude: f.latitude,
                    longitude: f.longitude,
                    color: if highlighted { HIGHLIGHT_COLOR } else { MARKER_COLOR },
                    highlighted,
                }
            })
            .collect();

        Self {
            center: WORLD_CENTER,
            zoom: WORLD_ZOOM,
            markers,
        }
    }

    /// JSON safe to embed inside a `<script>` element.
    pub fn to_script_json(&self) -> serde_json::Result<String> {
        // '<' only ever appears inside JSON strings, where < is equivalent.
        Ok(serde_json::to_string(self)?.replace('<', "\\u003c"))
    }
}
