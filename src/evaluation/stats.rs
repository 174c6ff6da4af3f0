use serde::Serialize;

/// Running sum of squared angular errors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct RmseAccumulator {
    pub sum_squared_error: f64,
    pub count: usize,
}

impl RmseAccumulator {
    pub fn add(&mut self, error_deg: f64) {
        self.sum_squared_error += error_deg * error_deg;
        self.count += 1;
    }

    /// Root mean square error in degrees; `None` before the first sample.
    pub fn rmse(&self) -> Option<f64> {
        (self.count > 0).then(|| (self.sum_squared_error / self.count as f64).sqrt())
    }
}

/// Aggregate statistics of one evaluation run.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSummary {
    pub variant: String,
    pub grid_points: usize,
    /// Grid points within the region of interest.
    pub admitted: usize,
    pub matched: usize,
    /// Admitted points whose FOV window held no candidate.
    pub unmatched: usize,
    pub rmse_deg: Option<f64>,
    /// Matches whose route snapshot lies within the good-match radius;
    /// only counted for snapshot-storing backends.
    pub good_matches: Option<usize>,
    pub bad_matches: Option<usize>,
    pub elapsed_ms: f64,
}

impl EvaluationSummary {
    pub fn rmse_display(&self) -> String {
        format_rmse(self.rmse_deg)
    }

    /// End-of-run report line printed by the vector field tool.
    pub fn rmse_line(&self) -> String {
        format!("RMSE: {}", self.rmse_display())
    }
}

pub fn format_rmse(rmse: Option<f64>) -> String {
    rmse.map(|v| format!("{v:.3}"))
        .unwrap_or_else(|| "N/A".to_string())
}
