use log::info;
use std::env;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use visual_homing::config::ridf;
use visual_homing::database::ImageDatabase;
use visual_homing::evaluation::csv::write_ridf;
use visual_homing::image::io::{ensure_parent_dir, load_grayscale_resized};
use visual_homing::matching::Matcher;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = ridf::load_config(Path::new(&config_path))?;
    let variant = config.matcher.resolve()?;
    let (width, height) = config.image.resolve()?;

    let route_db = ImageDatabase::open(&config.route).map_err(|e| e.to_string())?;
    let matcher = Matcher::for_route(
        variant,
        &route_db,
        width,
        height,
        config.matcher.fov_deg,
        &config.infomax,
    )
    .map_err(|e| e.to_string())?;

    let image = load_grayscale_resized(&config.test_image, width, height)?;
    let values = matcher
        .ridf(&image.as_view())
        .map_err(|e| e.to_string())?;
    info!(
        "RIDF of {} against {} ({} rotations)",
        config.test_image.display(),
        route_db.path().display(),
        values.len()
    );

    match &config.output {
        Some(path) => {
            ensure_parent_dir(path)?;
            let file = File::create(path)
                .map_err(|e| format!("Failed to create {}: {e}", path.display()))?;
            write_ridf(BufWriter::new(file), &values)
                .map_err(|e| format!("Failed to write {}: {e}", path.display()))
        }
        None => write_ridf(io::stdout().lock(), &values)
            .map_err(|e| format!("Failed to write CSV: {e}")),
    }
}

fn usage() -> String {
    "Usage: ridf <config.json>".to_string()
}
