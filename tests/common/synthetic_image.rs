use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Panorama of a synthetic world seen facing `heading_deg`.
///
/// The world is a sawtooth in azimuth, identical from every position, so a
/// view facing `h` is the view facing 0 rotated by `h`. Column `x` looks
/// at azimuth `heading_deg + 360 * x / width`.
pub fn panorama_u8(width: usize, height: usize, heading_deg: f64) -> Vec<u8> {
    assert!(width > 0 && height > 0, "image dimensions must be positive");

    let mut img = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let azimuth = (heading_deg + 360.0 * x as f64 / width as f64).rem_euclid(360.0);
            let val = 20 + (azimuth / 360.0 * 200.0) as u8 + (y * 8) as u8;
            img[y * width + x] = val;
        }
    }
    img
}

/// One snapshot of an on-disk test database. Positions in millimetres.
pub struct DiskEntry {
    pub x_mm: f64,
    pub y_mm: f64,
    pub heading_deg: f64,
    pub grid_index: Option<[usize; 2]>,
}

/// Writes `database_entries.csv` and one PNG panorama per entry to `dir`.
pub fn write_database(dir: &Path, width: usize, height: usize, entries: &[DiskEntry]) {
    fs::create_dir_all(dir).unwrap();
    let grid = entries.iter().all(|e| e.grid_index.is_some());
    let mut csv = String::from("X [mm], Y [mm], Z [mm], Heading [degrees], Filename");
    if grid {
        csv.push_str(", Grid X, Grid Y, Grid Z");
    }
    csv.push('\n');

    for (i, entry) in entries.iter().enumerate() {
        let filename = format!("image_{i}.png");
        let data = panorama_u8(width, height, entry.heading_deg);
        image::GrayImage::from_raw(width as u32, height as u32, data)
            .unwrap()
            .save(dir.join(&filename))
            .unwrap();
        write!(
            csv,
            "{}, {}, 0, {}, {}",
            entry.x_mm, entry.y_mm, entry.heading_deg, filename
        )
        .unwrap();
        if let Some([gx, gy]) = entry.grid_index {
            write!(csv, ", {gx}, {gy}, 0").unwrap();
        }
        csv.push('\n');
    }
    fs::write(dir.join("database_entries.csv"), csv).unwrap();
}
