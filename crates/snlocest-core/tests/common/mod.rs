//! Common test utilities for integration tests.
//!
//! Fixture paths and small helpers shared across integration test files.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use snlocest_core::{
    AreaCoordinateData, AreaDistance, AreaMetric, DistanceFormula, GraphBackend, IndexedGraph,
};
use tempfile::NamedTempFile;

/// Test fixture directory
pub const FIXTURE_DIR: &str = "tests/fixtures";

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join(FIXTURE_DIR)
        .join(name)
}

pub fn edges_path() -> PathBuf {
    fixture("edges.tsv")
}

pub fn labels_path() -> PathBuf {
    fixture("labels.tsv")
}

pub fn areas_path() -> PathBuf {
    fixture("areas.tsv")
}

/// Load the fixture graph with the given backend
pub fn load_fixture(backend: GraphBackend) -> Box<dyn IndexedGraph> {
    backend
        .load(&edges_path(), &labels_path(), '\t')
        .expect("Failed to load fixture graph")
}

pub fn fixture_areas() -> Arc<AreaCoordinateData> {
    Arc::new(AreaCoordinateData::load(&areas_path()).expect("Failed to load areas"))
}

/// Fresh memoized metric over the fixture areas
pub fn fixture_metric() -> Arc<dyn AreaMetric> {
    Arc::new(AreaDistance::new(fixture_areas(), DistanceFormula::Vincenty))
}

/// Write `content` to a temporary file
pub fn temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp file");
    file
}
