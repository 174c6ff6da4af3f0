use super::{check_size, DifferenceBackend, DifferenceScale, Differences};
use crate::error::{Error, Result};
use crate::image::{ImageU8, ImageView};
use nalgebra::DMatrix;

/// Stores every training snapshot verbatim and compares queries against
/// each of them at every column rotation.
#[derive(Clone, Debug)]
pub struct PerfectMemory {
    width: usize,
    height: usize,
    snapshots: Vec<Vec<u8>>,
}

impl PerfectMemory {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            snapshots: Vec::new(),
        }
    }

    pub fn train(&mut self, image: &ImageU8<'_>) -> Result<()> {
        check_size((self.width, self.height), image)?;
        let mut data = Vec::with_capacity(image.len());
        for row in image.rows() {
            data.extend_from_slice(row);
        }
        self.snapshots.push(data);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Mean absolute difference between `image` rotated by `shift` columns
    /// and stored snapshot `snapshot`.
    fn rotated_difference(&self, image: &ImageU8<'_>, snapshot: &[u8], shift: usize) -> f32 {
        let mut sum = 0u64;
        for (y, query_row) in image.rows().enumerate() {
            let stored = &snapshot[y * self.width..(y + 1) * self.width];
            let rotated = query_row[shift..].iter().chain(&query_row[..shift]);
            sum += rotated
                .zip(stored)
                .map(|(&q, &s)| q.abs_diff(s) as u64)
                .sum::<u64>();
        }
        sum as f32 / (self.width * self.height) as f32
    }
}

impl DifferenceBackend for PerfectMemory {
    fn name(&self) -> &'static str {
        "PerfectMemory"
    }

    fn image_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn differences(&self, image: &ImageU8<'_>) -> Result<Differences> {
        check_size((self.width, self.height), image)?;
        if self.snapshots.is_empty() {
            return Err(Error::InvalidInput(
                "perfect memory has no trained snapshots".to_string(),
            ));
        }
        let matrix = DMatrix::from_fn(self.snapshots.len(), self.width, |i, c| {
            self.rotated_difference(image, &self.snapshots[i], c)
        });
        Ok(Differences::Matrix(matrix))
    }

    fn scale(&self) -> DifferenceScale {
        DifferenceScale::Fixed(255.0)
    }

    fn stores_snapshots(&self) -> bool {
        true
    }
}
