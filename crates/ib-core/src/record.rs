//! Persisted run record: the curve in the column layout downstream
//! analysis tools load.
//!
//! The core fills the curve columns and bounds. `kinkBeta`, `Qcgx`, `Qcgi`,
//! `Qc` and `c` belong to the tool that picks an operating point; they are
//! always written as `null` here and preserved when a record is reloaded.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::DisplayMode;
use crate::curve::point::beta_format;
use crate::curve::{Curve, PointDegradation};
use crate::error::{CurveError, CurveResult};
use crate::logging::{event_names, Stage};

/// Current run record schema version.
pub const RECORD_SCHEMA_VERSION: &str = "1.0.0";

/// Axis ceilings of the traced distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(rename = "Hx")]
    pub hx: f64,
    #[serde(rename = "Hgx")]
    pub hgx: f64,
    #[serde(rename = "Ixy")]
    pub ixy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub schema_version: String,
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub gamma: f64,
    pub alpha: f64,
    pub display: DisplayMode,
    pub solver: String,
    #[serde(with = "beta_format::seq")]
    pub betas: Vec<f64>,
    #[serde(rename = "Hga")]
    pub hga: Vec<f64>,
    #[serde(rename = "Ixt")]
    pub ixt: Vec<f64>,
    #[serde(rename = "Ht")]
    pub ht: Vec<f64>,
    #[serde(rename = "Hgt")]
    pub hgt: Vec<f64>,
    #[serde(rename = "Iyt")]
    pub iyt: Vec<f64>,
    pub bounds: Bounds,
    /// Indices of approximate points.
    pub approximate: Vec<usize>,
    #[serde(default)]
    pub degradations: Vec<PointDegradation>,

    #[serde(rename = "kinkBeta", default)]
    pub kink_beta: Option<f64>,
    #[serde(rename = "Qcgx", default)]
    pub qcgx: Option<Vec<Vec<f64>>>,
    #[serde(rename = "Qcgi", default)]
    pub qcgi: Option<Vec<Vec<f64>>>,
    #[serde(rename = "Qc", default)]
    pub qc: Option<Vec<f64>>,
    #[serde(rename = "c", default)]
    pub labels: Option<Vec<usize>>,
}

impl RunRecord {
    pub fn from_curve(curve: &Curve, run_id: impl Into<String>) -> Self {
        let cols = curve.columns();
        RunRecord {
            schema_version: RECORD_SCHEMA_VERSION.to_string(),
            run_id: run_id.into(),
            created_at: Utc::now(),
            gamma: curve.gamma,
            alpha: curve.alpha,
            display: curve.display,
            solver: curve.solver.clone(),
            betas: cols.bs,
            hga: cols.hga,
            ixt: cols.ixt,
            ht: cols.ht,
            hgt: cols.hgt,
            iyt: cols.iyt,
            bounds: Bounds {
                hx: curve.hx,
                hgx: curve.hgx,
                ixy: curve.ixy,
            },
            approximate: curve.approximate_indices(),
            degradations: curve.degradations.clone(),
            kink_beta: None,
            qcgx: None,
            qcgi: None,
            qc: None,
            labels: None,
        }
    }

    pub fn len(&self) -> usize {
        self.betas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.betas.is_empty()
    }

    pub fn to_json(&self) -> CurveResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CurveError::Internal(format!("failed to serialize run record: {e}")))
    }

    pub fn save(&self, path: &Path) -> CurveResult<()> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| CurveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            stage = %Stage::Output,
            event = event_names::RECORD_WRITTEN,
            path = %path.display(),
            run_id = %self.run_id,
            points = self.len(),
            "run record written"
        );
        Ok(())
    }

    /// Load a record, rejecting unknown schema versions and ragged columns.
    pub fn load(path: &Path) -> CurveResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| CurveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let record: RunRecord = serde_json::from_str(&content).map_err(|e| CurveError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let parse_err = |message: String| CurveError::Parse {
            path: path.to_path_buf(),
            message,
        };
        if record.schema_version != RECORD_SCHEMA_VERSION {
            return Err(parse_err(format!(
                "schema version mismatch: expected {}, got {}",
                RECORD_SCHEMA_VERSION, record.schema_version
            )));
        }
        let n = record.betas.len();
        for (name, len) in [
            ("Hga", record.hga.len()),
            ("Ixt", record.ixt.len()),
            ("Ht", record.ht.len()),
            ("Hgt", record.hgt.len()),
            ("Iyt", record.iyt.len()),
        ] {
            if len != n {
                return Err(parse_err(format!(
                    "column {name} has {len} entries, betas has {n}"
                )));
            }
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{CurvePoint, PointStatus};
    use tempfile::tempdir;

    fn curve() -> Curve {
        let mid = CurvePoint {
            beta: 2.0,
            hga: 0.5,
            ixt: 0.5,
            ht: 1.0,
            hgt: 1.0,
            iyt: 0.4,
            status: PointStatus::Exact,
        };
        let top = CurvePoint {
            beta: f64::INFINITY,
            hga: 1.0,
            ixt: 1.0,
            ht: 1.0,
            hgt: 1.0,
            iyt: 1.0,
            status: PointStatus::Endpoint,
        };
        Curve {
            gamma: 1.0,
            alpha: 1.0,
            display: DisplayMode::All,
            solver: "gib".to_string(),
            hx: 1.0,
            hgx: 1.0,
            ixy: 1.0,
            points: vec![CurvePoint::lower_endpoint(), mid, top],
            degradations: Vec::new(),
        }
    }

    #[test]
    fn record_uses_downstream_field_names() {
        let record = RunRecord::from_curve(&curve(), "run-test");
        let value: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(value["betas"][2], "inf");
        assert_eq!(value["Hga"][1], 0.5);
        assert_eq!(value["Iyt"][2], 1.0);
        assert_eq!(value["bounds"]["Ixy"], 1.0);
        assert!(value["kinkBeta"].is_null());
        assert!(value["Qcgx"].is_null());
        assert!(value["c"].is_null());
    }

    #[test]
    fn save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");
        let record = RunRecord::from_curve(&curve(), "run-test");
        record.save(&path).unwrap();
        let loaded = RunRecord::load(&path).unwrap();
        assert_eq!(loaded, record);
        assert!(loaded.betas[2].is_infinite());
    }

    #[test]
    fn downstream_fields_survive_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");
        let mut record = RunRecord::from_curve(&curve(), "run-test");
        record.kink_beta = Some(2.0);
        record.labels = Some(vec![0, 1, 1]);
        record.save(&path).unwrap();
        let loaded = RunRecord::load(&path).unwrap();
        assert_eq!(loaded.kink_beta, Some(2.0));
        assert_eq!(loaded.labels, Some(vec![0, 1, 1]));
    }

    #[test]
    fn load_rejects_ragged_columns_and_wrong_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");
        let mut record = RunRecord::from_curve(&curve(), "run-test");
        record.iyt.pop();
        record.save(&path).unwrap();
        assert!(matches!(RunRecord::load(&path), Err(CurveError::Parse { .. })));

        let mut record = RunRecord::from_curve(&curve(), "run-test");
        record.schema_version = "0.1.0".to_string();
        record.save(&path).unwrap();
        assert!(matches!(RunRecord::load(&path), Err(CurveError::Parse { .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = RunRecord::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CurveError::Io { .. }));
    }
}
