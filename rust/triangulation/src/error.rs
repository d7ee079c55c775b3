// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for triangulation.

use crate::arena::LoopId;

/// Result type alias for triangulation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while triangulating a polygon with holes.
///
/// None of these escape [`Triangulator::triangulate`](crate::Triangulator::triangulate),
/// which turns them into an empty mesh. [`Triangulator::try_triangulate`](crate::Triangulator::try_triangulate)
/// hands them to the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A loop has fewer than three points.
    #[error("{loop_id} has {count} points, at least 3 are required")]
    TooFewPoints { loop_id: LoopId, count: usize },

    /// A coordinate is NaN or infinite.
    #[error("input contains a non-finite coordinate")]
    NonFinite,

    /// The boundary has fewer than three points left after removing
    /// collinear and duplicate vertices.
    #[error("boundary is degenerate after cleanup")]
    DegenerateBoundary,

    /// Nothing is left once the holes are subtracted from the boundary.
    #[error("no area left to triangulate: boundary {boundary_area}, holes {hole_area}")]
    EmptyRegion { boundary_area: f64, hole_area: f64 },

    /// No simple polygon could be traced from the bridged boundary.
    #[error("decomposition failed: {0}")]
    Decomposition(String),

    /// The configuration is invalid or could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
