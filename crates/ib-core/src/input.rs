//! Reading a joint distribution P(x, y) from disk.

use std::path::Path;

use ib_math::Matrix;
use serde::Deserialize;

use crate::error::{CurveError, CurveResult};

/// Accepted input layouts: `{"pxy": [[...]]}` or a bare array of rows.
#[derive(Deserialize)]
#[serde(untagged)]
enum JointFile {
    Wrapped { pxy: Vec<Vec<f64>> },
    Bare(Vec<Vec<f64>>),
}

/// Parse a joint distribution from JSON text.
///
/// Syntax errors are reported against `path`; a ragged or empty matrix is
/// an invalid `pxy`.
pub fn parse_joint(content: &str, path: &Path) -> CurveResult<Matrix> {
    let parsed: JointFile = serde_json::from_str(content).map_err(|e| CurveError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let rows = match parsed {
        JointFile::Wrapped { pxy } => pxy,
        JointFile::Bare(rows) => rows,
    };
    Matrix::from_rows(rows)
        .ok_or_else(|| CurveError::invalid("pxy", "must be a non-empty rectangular matrix"))
}

pub fn load_joint(path: &Path) -> CurveResult<Matrix> {
    let content = std::fs::read_to_string(path).map_err(|source| CurveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_joint(&content, path)
}
