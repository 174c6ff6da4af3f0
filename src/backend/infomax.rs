use super::{check_size, DifferenceBackend, DifferenceScale, Differences};
use crate::error::{Error, Result};
use crate::image::{GrayImageU8, ImageU8, ImageView};
use log::{debug, info};
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Training knobs for [`InfoMax`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct InfoMaxParams {
    pub learning_rate: f32,
    /// Hidden units; `None` uses one per input pixel.
    pub hidden_units: Option<usize>,
    /// Seed for the initial weight matrix.
    pub seed: u64,
}

impl Default for InfoMaxParams {
    fn default() -> Self {
        Self {
            learning_rate: 1e-4,
            hidden_units: None,
            seed: 42,
        }
    }
}

/// Single-layer InfoMax network trained on route snapshots. Familiar views
/// produce small summed absolute activations.
#[derive(Clone, Debug)]
pub struct InfoMax {
    width: usize,
    height: usize,
    learning_rate: f32,
    weights: DMatrix<f32>,
}

impl InfoMax {
    /// Untrained network with standardized Gaussian initial weights.
    pub fn new(width: usize, height: usize, params: &InfoMaxParams) -> Self {
        let inputs = width * height;
        let hidden = params.hidden_units.unwrap_or(inputs).max(1);
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut weights: DMatrix<f32> =
            DMatrix::from_fn(hidden, inputs, |_, _| StandardNormal.sample(&mut rng));
        for mut row in weights.row_iter_mut() {
            let mean = row.mean();
            row.add_scalar_mut(-mean);
            let std = (row.norm_squared() / inputs as f32).sqrt();
            if std > 0.0 {
                row /= std;
            }
        }
        Self {
            width,
            height,
            learning_rate: params.learning_rate,
            weights,
        }
    }

    /// Network with pre-trained weights; columns must equal the pixel count.
    pub fn from_weights(width: usize, height: usize, weights: DMatrix<f32>) -> Result<Self> {
        if weights.ncols() != width * height || weights.nrows() == 0 {
            return Err(Error::Weights(format!(
                "weight matrix is {}x{}, expected N x {}",
                weights.nrows(),
                weights.ncols(),
                width * height
            )));
        }
        Ok(Self {
            width,
            height,
            learning_rate: InfoMaxParams::default().learning_rate,
            weights,
        })
    }

    /// Loads `infomax.bin` from `route_dir` if it exists, otherwise trains a
    /// fresh network on `snapshots` and writes the weights there.
    pub fn load_or_train<I>(
        route_dir: &Path,
        width: usize,
        height: usize,
        params: &InfoMaxParams,
        snapshots: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = Result<GrayImageU8>>,
    {
        let weight_path = route_dir.join("infomax.bin");
        if weight_path.exists() {
            info!("Loading weights from {}", weight_path.display());
            return Self::from_weights(width, height, read_weights(&weight_path, width * height)?);
        }

        let mut net = Self::new(width, height, params);
        let mut count = 0usize;
        for snapshot in snapshots {
            net.train(&snapshot?.as_view())?;
            count += 1;
        }
        write_weights(net.weights(), &weight_path)?;
        info!("Trained on {count} snapshots");
        Ok(net)
    }

    pub fn weights(&self) -> &DMatrix<f32> {
        &self.weights
    }

    /// One step of the InfoMax rule:
    /// `W += lr / N * (W - (y + u) (u^T W))` with `u = W x`, `y = tanh(u)`.
    pub fn train(&mut self, image: &ImageU8<'_>) -> Result<()> {
        check_size((self.width, self.height), image)?;
        let x = net_input(image, 0);
        let u = &self.weights * &x;
        let y = u.map(f32::tanh);
        let ut_w = u.transpose() * &self.weights;
        let delta = &self.weights - (&y + &u) * ut_w;
        let step = self.learning_rate / self.weights.nrows() as f32;
        self.weights += delta * step;
        debug!("InfoMax step: |u|={:.3}", u.norm());
        Ok(())
    }

    fn decision(&self, x: &DVector<f32>) -> f32 {
        (&self.weights * x).abs().sum()
    }
}

impl DifferenceBackend for InfoMax {
    fn name(&self) -> &'static str {
        "InfoMax"
    }

    fn image_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn differences(&self, image: &ImageU8<'_>) -> Result<Differences> {
        check_size((self.width, self.height), image)?;
        let row = (0..self.width)
            .map(|shift| self.decision(&net_input(image, shift)))
            .collect();
        Ok(Differences::Row(row))
    }

    fn scale(&self) -> DifferenceScale {
        DifferenceScale::RowMaximum
    }
}

/// Z-scored pixel vector of `image` rotated by `shift` columns.
fn net_input(image: &ImageU8<'_>, shift: usize) -> DVector<f32> {
    let mut x = DVector::zeros(image.len());
    let mut i = 0;
    for y in 0..image.height() {
        for col in 0..image.width() {
            x[i] = image.get_rotated(col, y, shift) as f32;
            i += 1;
        }
    }
    let mean = x.mean();
    x.add_scalar_mut(-mean);
    let std = (x.norm_squared() / x.len().max(1) as f32).sqrt();
    if std > 0.0 {
        x /= std;
    }
    x
}

/// Writes `weights` as two little-endian `i32` dimensions followed by the
/// column-major `f32` data.
pub fn write_weights(weights: &DMatrix<f32>, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut out = BufWriter::new(file);
    let dims = [weights.nrows() as i32, weights.ncols() as i32];
    for d in dims {
        out.write_all(&d.to_le_bytes())
            .map_err(|e| Error::io(path, e))?;
    }
    for v in weights.iter() {
        out.write_all(&v.to_le_bytes())
            .map_err(|e| Error::io(path, e))?;
    }
    out.flush().map_err(|e| Error::io(path, e))
}

/// Reads a weight matrix written by [`write_weights`]. The header must
/// describe `inputs` columns and match the file length.
pub fn read_weights(path: &Path, inputs: usize) -> Result<DMatrix<f32>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let file_len = file.metadata().map_err(|e| Error::io(path, e))?.len();
    let mut reader = BufReader::new(file);
    let mut header = [0u8; 8];
    reader
        .read_exact(&mut header)
        .map_err(|e| Error::io(path, e))?;
    let rows = i32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let cols = i32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if rows <= 0 || cols <= 0 {
        return Err(Error::Weights(format!(
            "{} has invalid dimensions {rows}x{cols}",
            path.display()
        )));
    }
    let (rows, cols) = (rows as usize, cols as usize);
    if cols != inputs {
        return Err(Error::Weights(format!(
            "{} has {cols} input columns, expected {inputs}",
            path.display()
        )));
    }
    let data_len = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(4))
        .filter(|&n| n as u64 == file_len.saturating_sub(header.len() as u64))
        .ok_or_else(|| {
            Error::Weights(format!(
                "{} is {file_len} bytes, which does not match a {rows}x{cols} header",
                path.display()
            ))
        })?;
    let mut bytes = vec![0u8; data_len];
    reader
        .read_exact(&mut bytes)
        .map_err(|e| Error::io(path, e))?;
    let data: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok(DMatrix::from_column_slice(rows, cols, &data))
}
