// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Triangulation tolerances and bridge-search framings.
//!
//! Every numeric threshold used by the predicates lives here so that callers
//! (and test suites) can tighten or loosen them without recompiling. The
//! configuration can be built in code, parsed from JSON, or read from
//! `TRIANGULATION_*` environment variables.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tolerances and tuning knobs for a triangulation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangulationConfig {
    /// Distance under which two points coincide and closest-approach points
    /// count as an intersection.
    pub linear_tolerance: f64,
    /// Smallest signed area treated as non-degenerate.
    pub area_tolerance: f64,
    /// Sine of the turning angle under which a vertex counts as collinear
    /// with its neighbours during cleanup.
    pub collinear_tolerance: f64,
    /// Multiplier applied to the linear tolerance by the near-overlap test.
    pub overlap_factor: f64,
    /// Largest relative difference between the summed triangle areas of a
    /// monotone piece and the piece's own area.
    pub area_match_tolerance: f64,
    /// Fraction of the boundary area the region left after subtracting holes
    /// must exceed.
    pub region_tolerance: f64,
    /// Allowed deviation (radians) of a convex loop's total turning from a
    /// full turn.
    pub winding_tolerance: f64,
    /// Shortest Newell normal still used to pick the projection plane.
    pub normal_tolerance: f64,
    /// Include the framing with the two in-plane axes swapped.
    pub swap_axes: bool,
    /// Extra in-plane rotations (degrees) used to search for bridges.
    pub framing_angles: Vec<f64>,
    /// Number of times a path enumeration may reach the boundary before it
    /// stops.
    pub path_cutoff: usize,
    /// Fan-triangulate convex polygons without holes directly.
    pub convex_fast_path: bool,
    /// Re-triangulate a monotone piece with earcut when the sweep output
    /// fails validation.
    pub earcut_fallback: bool,
}

impl Default for TriangulationConfig {
    fn default() -> Self {
        Self {
            linear_tolerance: 1e-9,
            area_tolerance: 1e-12,
            collinear_tolerance: 1e-9,
            overlap_factor: 1000.0,
            area_match_tolerance: 1e-6,
            region_tolerance: 1e-9,
            winding_tolerance: 1e-6,
            normal_tolerance: 1e-15,
            swap_axes: true,
            framing_angles: vec![30.0, 45.0, 60.0],
            path_cutoff: 3,
            convex_fast_path: true,
            earcut_fallback: true,
        }
    }
}

impl TriangulationConfig {
    /// Parses a configuration from a JSON document. Missing fields keep their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to a JSON document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads the configuration from environment variables, falling back to
    /// the defaults for anything unset or unparsable.
    ///
    /// Recognised variables: `TRIANGULATION_LINEAR_TOLERANCE`,
    /// `TRIANGULATION_AREA_TOLERANCE`, `TRIANGULATION_COLLINEAR_TOLERANCE`,
    /// `TRIANGULATION_OVERLAP_FACTOR`, `TRIANGULATION_AREA_MATCH_TOLERANCE`,
    /// `TRIANGULATION_REGION_TOLERANCE`, `TRIANGULATION_WINDING_TOLERANCE`,
    /// `TRIANGULATION_NORMAL_TOLERANCE`, `TRIANGULATION_SWAP_AXES`,
    /// `TRIANGULATION_FRAMING_ANGLES` (comma-separated degrees),
    /// `TRIANGULATION_PATH_CUTOFF`, `TRIANGULATION_CONVEX_FAST_PATH` and
    /// `TRIANGULATION_EARCUT_FALLBACK`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            linear_tolerance: env_parse("TRIANGULATION_LINEAR_TOLERANCE")
                .unwrap_or(defaults.linear_tolerance),
            area_tolerance: env_parse("TRIANGULATION_AREA_TOLERANCE")
                .unwrap_or(defaults.area_tolerance),
            collinear_tolerance: env_parse("TRIANGULATION_COLLINEAR_TOLERANCE")
                .unwrap_or(defaults.collinear_tolerance),
            overlap_factor: env_parse("TRIANGULATION_OVERLAP_FACTOR")
                .unwrap_or(defaults.overlap_factor),
            area_match_tolerance: env_parse("TRIANGULATION_AREA_MATCH_TOLERANCE")
                .unwrap_or(defaults.area_match_tolerance),
            region_tolerance: env_parse("TRIANGULATION_REGION_TOLERANCE")
                .unwrap_or(defaults.region_tolerance),
            winding_tolerance: env_parse("TRIANGULATION_WINDING_TOLERANCE")
                .unwrap_or(defaults.winding_tolerance),
            normal_tolerance: env_parse("TRIANGULATION_NORMAL_TOLERANCE")
                .unwrap_or(defaults.normal_tolerance),
            swap_axes: env_parse("TRIANGULATION_SWAP_AXES").unwrap_or(defaults.swap_axes),
            framing_angles: std::env::var("TRIANGULATION_FRAMING_ANGLES")
                .ok()
                .and_then(|raw| parse_angles(&raw))
                .unwrap_or(defaults.framing_angles),
            path_cutoff: env_parse("TRIANGULATION_PATH_CUTOFF").unwrap_or(defaults.path_cutoff),
            convex_fast_path: env_parse("TRIANGULATION_CONVEX_FAST_PATH")
                .unwrap_or(defaults.convex_fast_path),
            earcut_fallback: env_parse("TRIANGULATION_EARCUT_FALLBACK")
                .unwrap_or(defaults.earcut_fallback),
        }
    }

    /// Checks that every tolerance is positive and finite.
    pub fn validate(&self) -> Result<()> {
        let tolerances = [
            ("linear_tolerance", self.linear_tolerance),
            ("area_tolerance", self.area_tolerance),
            ("collinear_tolerance", self.collinear_tolerance),
            ("overlap_factor", self.overlap_factor),
            ("area_match_tolerance", self.area_match_tolerance),
            ("region_tolerance", self.region_tolerance),
            ("winding_tolerance", self.winding_tolerance),
            ("normal_tolerance", self.normal_tolerance),
        ];
        for (name, value) in tolerances {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Config(format!("{name} must be positive, got {value}")));
            }
        }
        if let Some(angle) = self.framing_angles.iter().find(|a| !a.is_finite()) {
            return Err(Error::Config(format!("framing angle {angle} is not finite")));
        }
        if self.path_cutoff == 0 {
            return Err(Error::Config("path_cutoff must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Distance under which a candidate line is considered to run along a
    /// polygon edge.
    #[inline]
    pub fn overlap_distance(&self) -> f64 {
        self.linear_tolerance * self.overlap_factor
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.trim().parse().ok()
}

fn parse_angles(raw: &str) -> Option<Vec<f64>> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().parse().ok())
        .collect()
}
