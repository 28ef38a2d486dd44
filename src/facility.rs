//! Static facility set with nearest-neighbor lookup.
//!
//! The index is built once from the dataset and never mutated, so a shared
//! reference can serve any number of concurrent readers.

use rstar::primitives::GeomWithData;
use rstar::{PointDistance, RTree};
use std::cmp::Ordering;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{DataLoadError, GeoMeshError, Result};
use crate::geo::{self, DistanceMetric};
use crate::models::Facility;

const NAME_COLUMNS: &[&str] = &["school_name", "name", "id"];
const LATITUDE_COLUMNS: &[&str] = &["latitude", "lat"];
const LONGITUDE_COLUMNS: &[&str] = &["longitude", "lon", "lng"];

/// Tree entry: a point tagged with the facility's load-order position.
type Entry<P> = GeomWithData<P, usize>;

enum SpatialTree {
    Planar(RTree<Entry<[f64; 2]>>),
    Geodesic(RTree<Entry<[f64; 3]>>),
}

/// A facility returned by [`FacilityIndex::nearest`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacilityRef<'a> {
    /// Position of the facility in load order.
    pub position: usize,
    pub facility: &'a Facility,
}

impl FacilityRef<'_> {
    /// Great-circle distance from `(lat, lon)` to this facility.
    pub fn distance_km(&self, lat: f64, lon: f64) -> f64 {
        geo::haversine_km(lat, lon, self.facility.latitude, self.facility.longitude)
    }
}

pub struct FacilityIndex {
    facilities: Vec<Facility>,
    tree: SpatialTree,
    metric: DistanceMetric,
}

impl fmt::Debug for FacilityIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacilityIndex")
            .field("facilities", &self.facilities.len())
            .field("metric", &self.metric)
            .finish()
    }
}

impl FacilityIndex {
    /// Load a CSV dataset from disk.
    pub fn load(path: impl AsRef<Path>, metric: DistanceMetric) -> std::result::Result<Self, DataLoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DataLoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let index = Self::from_reader(BufReader::new(file), metric)?;
        tracing::info!(
            "Loaded {} facilities from {} ({} metric)",
            index.len(),
            path.display(),
            metric
        );
        Ok(index)
    }

    /// Load a CSV dataset from any reader. The first row must be a header.
    pub fn from_reader<R: Read>(reader: R, metric: DistanceMetric) -> std::result::Result<Self, DataLoadError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let name_col = find_column(&headers, NAME_COLUMNS)
            .ok_or(DataLoadError::MissingColumn("school_name"))?;
        let lat_col = find_column(&headers, LATITUDE_COLUMNS)
            .ok_or(DataLoadError::MissingColumn("latitude"))?;
        let lon_col = find_column(&headers, LONGITUDE_COLUMNS)
            .ok_or(DataLoadError::MissingColumn("longitude"))?;

        let mut facilities = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let row = record.position().map(|p| p.line()).unwrap_or_default();
            let field = |col: usize| record.get(col).unwrap_or("");

            let latitude = parse_coordinate(field(lat_col), "latitude", row)?;
            let longitude = parse_coordinate(field(lon_col), "longitude", row)?;
            let facility = Facility::new(field(name_col), latitude, longitude);
            validate(&facility).map_err(|reason| DataLoadError::InvalidRow { row, reason })?;
            facilities.push(facility);
        }

        Self::new(facilities, metric)
    }

    /// Build the index from records already in memory. Applies the same row
    /// checks as the CSV loader; `row` in errors is the 1-based record number.
    pub fn new(facilities: Vec<Facility>, metric: DistanceMetric) -> std::result::Result<Self, DataLoadError> {
        if facilities.is_empty() {
            return Err(DataLoadError::Empty);
        }
        for (position, facility) in facilities.iter().enumerate() {
            validate(facility).map_err(|reason| DataLoadError::InvalidRow {
                row: position as u64 + 1,
                reason,
            })?;
        }

        let tree = match metric {
            DistanceMetric::Planar => SpatialTree::Planar(RTree::bulk_load(
                facilities
                    .iter()
                    .enumerate()
                    .map(|(i, f)| Entry::new([f.latitude, f.longitude], i))
                    .collect(),
            )),
            DistanceMetric::Geodesic => SpatialTree::Geodesic(RTree::bulk_load(
                facilities
                    .iter()
                    .enumerate()
                    .map(|(i, f)| Entry::new(geo::unit_vector(f.latitude, f.longitude), i))
                    .collect(),
            )),
        };

        Ok(Self {
            facilities,
            tree,
            metric,
        })
    }

    /// The facility closest to `(lat, lon)` under the index's metric.
    ///
    /// Equidistant facilities resolve to the one loaded first.
    pub fn nearest(&self, lat: f64, lon: f64) -> Result<FacilityRef<'_>> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(GeoMeshError::InvalidCoordinate {
                latitude: lat,
                longitude: lon,
            });
        }

        let position = match &self.tree {
            SpatialTree::Planar(tree) => closest(tree, [lat, lon]),
            SpatialTree::Geodesic(tree) => closest(tree, geo::unit_vector(lat, lon)),
        }
        .ok_or(DataLoadError::Empty)?;

        Ok(FacilityRef {
            position,
            facility: &self.facilities[position],
        })
    }

    /// All facilities in load order.
    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }
}

/// Lowest position among the entries at minimal distance from `query`.
///
/// Entries whose squared distance rounds to the minimum (or overflows along
/// with it) are re-ranked with [`compare_distance`].
fn closest<P>(tree: &RTree<Entry<P>>, query: P) -> Option<usize>
where
    P: rstar::Point<Scalar = f64>,
{
    let best = tree.nearest_neighbor(&query)?;
    let radius_2 = best.distance_2(&query);
    tree.locate_within_distance(query.clone(), radius_2)
        .min_by(|a, b| compare_distance(&query, a.geom(), b.geom()).then(a.data.cmp(&b.data)))
        .map(|entry| entry.data)
}

/// Orders `a` and `b` by distance from `query` without squaring raw offsets.
///
/// Uses `|q-a|^2 - |q-b|^2 = sum (b_i - a_i)(2q_i - a_i - b_i)`, with the
/// second factor scaled by its largest magnitude so nothing overflows.
fn compare_distance<P>(query: &P, a: &P, b: &P) -> Ordering
where
    P: rstar::Point<Scalar = f64>,
{
    let offset = |i: usize| query.nth(i) - (a.nth(i) / 2.0 + b.nth(i) / 2.0);
    let scale = (0..P::DIMENSIONS).map(|i| offset(i).abs()).fold(0.0, f64::max);
    if scale == 0.0 {
        return Ordering::Equal;
    }
    let diff: f64 = (0..P::DIMENSIONS)
        .map(|i| (b.nth(i) - a.nth(i)) * (offset(i) / scale))
        .sum();
    diff.partial_cmp(&0.0).unwrap_or(Ordering::Equal)
}

fn find_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|candidate| headers.iter().position(|h| h.eq_ignore_ascii_case(candidate)))
}

fn parse_coordinate(raw: &str, column: &str, row: u64) -> std::result::Result<f64, DataLoadError> {
    raw.parse::<f64>().map_err(|_| DataLoadError::InvalidRow {
        row,
        reason: format!("{column} '{raw}' is not a number"),
    })
}

fn validate(facility: &Facility) -> std::result::Result<(), String> {
    if facility.name.trim().is_empty() {
        return Err("facility name is empty".to_string());
    }
    geo::check_range(facility.latitude, facility.longitude)
}
