//! Area identifiers and the area coordinate table
//!
//! The coordinate table is a tab-separated file with one row per area:
//! `area_id<TAB>longitude<TAB>latitude<TAB>name`.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::distance::Point;
use crate::dsv::{self, DsvError};

/// Opaque area label (e.g. an administrative-region code).
///
/// `AreaId::NONE` marks a node whose area could not be estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaId(pub u64);

impl AreaId {
    /// Sentinel for "no estimate"
    pub const NONE: AreaId = AreaId(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AreaId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(AreaId)
    }
}

impl From<u64> for AreaId {
    fn from(value: u64) -> Self {
        AreaId(value)
    }
}

/// Errors from the area coordinate table
#[derive(Debug, Error)]
pub enum AreaDataError {
    #[error("{0}")]
    Dsv(#[from] DsvError),

    #[error("{path}:{line}: invalid coordinate '{value}'")]
    InvalidCoordinate {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("unknown area: {0}")]
    UnknownArea(AreaId),
}

#[derive(Debug, Clone)]
struct AreaEntry {
    point: Point,
    name: String,
}

/// Lookup from area id to its representative point and name.
#[derive(Debug, Clone, Default)]
pub struct AreaCoordinateData {
    entries: HashMap<AreaId, AreaEntry>,
    /// Area ids in file order
    order: Vec<AreaId>,
}

impl AreaCoordinateData {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a coordinate table from a tab-separated file
    pub fn load(path: &Path) -> Result<Self, AreaDataError> {
        let mut data = Self::new();
        for row in dsv::read_rows(path, dsv::DEFAULT_DELIMITER, 3)? {
            let row = row?;
            let area: AreaId = row.fields[0]
                .parse()
                .map_err(|_| DsvError::invalid_area(path, row.line, &row.fields[0]))?;
            let lon = parse_coordinate(path, row.line, &row.fields[1])?;
            let lat = parse_coordinate(path, row.line, &row.fields[2])?;
            let name = row.fields.get(3).cloned().unwrap_or_default();
            data.insert(area, Point::new(lon, lat), name);
        }
        info!("Loaded {} area coordinates from {:?}", data.len(), path);
        Ok(data)
    }

    /// Add or replace an area
    pub fn insert(&mut self, area: AreaId, point: Point, name: impl Into<String>) {
        let entry = AreaEntry {
            point,
            name: name.into(),
        };
        if self.entries.insert(area, entry).is_none() {
            self.order.push(area);
        }
    }

    /// Representative point of an area
    pub fn get_point(&self, area: AreaId) -> Result<Point, AreaDataError> {
        self.entries
            .get(&area)
            .map(|e| e.point)
            .ok_or(AreaDataError::UnknownArea(area))
    }

    /// Human-readable area name
    pub fn get_name(&self, area: AreaId) -> Result<&str, AreaDataError> {
        self.entries
            .get(&area)
            .map(|e| e.name.as_str())
            .ok_or(AreaDataError::UnknownArea(area))
    }

    pub fn contains(&self, area: AreaId) -> bool {
        self.entries.contains_key(&area)
    }

    /// All area ids in file order
    pub fn area_ids(&self) -> &[AreaId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn parse_coordinate(path: &Path, line: usize, value: &str) -> Result<f64, AreaDataError> {
    value
        .trim()
        .parse()
        .map_err(|_| AreaDataError::InvalidCoordinate {
            path: path.to_path_buf(),
            line,
            value: value.to_string(),
        })
}
