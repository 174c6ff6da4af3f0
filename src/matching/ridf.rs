use crate::backend::Differences;

/// Rotational image difference function: for each column the best
/// difference achievable at that rotation over all stored snapshots.
pub fn ridf(differences: &Differences) -> Vec<f32> {
    match differences {
        Differences::Row(row) => row.clone(),
        Differences::Matrix(m) => m
            .column_iter()
            .map(|column| column.iter().copied().fold(f32::INFINITY, f32::min))
            .collect(),
    }
}
