use log::info;
use std::env;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use visual_homing::config::vector_field;
use visual_homing::database::ImageDatabase;
use visual_homing::evaluation::csv::RecordWriter;
use visual_homing::evaluation::{evaluate, EvaluationReport};
use visual_homing::image::io::{ensure_parent_dir, write_json_file};
use visual_homing::matching::Matcher;
use visual_homing::route::RouteGeometry;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = vector_field::load_config(Path::new(&config_path))?;
    let settings = config.resolve()?;

    let route_db = ImageDatabase::open(&config.route).map_err(|e| e.to_string())?;
    let grid_db = ImageDatabase::open(&config.grid).map_err(|e| e.to_string())?;
    if !grid_db.is_grid() {
        return Err(format!("{} is not a grid database", config.grid.display()));
    }
    if let Some(grid) = grid_db.grid_metadata() {
        let (x, y) = grid.extent_cm();
        info!("grid extent {x:.0} x {y:.0} cm");
    }

    let route = RouteGeometry::new(route_db.positions(), settings.decimate_distance_cm)
        .map_err(|e| e.to_string())?;
    let matcher = Matcher::for_route(
        settings.variant,
        &route_db,
        settings.width,
        settings.height,
        settings.fov_deg,
        &config.infomax,
    )
    .map_err(|e| e.to_string())?;

    let report = evaluate(&route, grid_db.entries(), &matcher, &settings.evaluation)
        .map_err(|e| e.to_string())?;

    match &config.output.csv {
        Some(path) => {
            ensure_parent_dir(path)?;
            let file = File::create(path)
                .map_err(|e| format!("Failed to create {}: {e}", path.display()))?;
            write_records(BufWriter::new(file), &report, matcher.reports_snapshot_index())
                .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
        }
        None => write_records(io::stdout().lock(), &report, matcher.reports_snapshot_index())
            .map_err(|e| format!("Failed to write CSV: {e}"))?,
    }

    let rmse_line = report.summary.rmse_line();
    info!("{rmse_line}");
    // keep stdout clean when it carries the CSV
    if config.output.csv.is_some() {
        println!("{rmse_line}");
    } else {
        eprintln!("{rmse_line}");
    }
    if let Some(path) = &config.output.summary_json {
        write_json_file(path, &report.summary)?;
        info!("summary written to {}", path.display());
    }
    Ok(())
}

fn write_records<W: Write>(
    out: W,
    report: &EvaluationReport,
    snapshot_column: bool,
) -> io::Result<()> {
    let mut writer = RecordWriter::new(out, snapshot_column)?;
    for record in &report.records {
        writer.write_record(record)?;
    }
    writer.finish()?;
    Ok(())
}

fn usage() -> String {
    "Usage: vector_field <config.json>".to_string()
}
