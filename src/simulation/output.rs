//! Output writing for ground-truth tracks and camera tracklets
//!
//! Ground truth goes to `<prefix>.csv` as one padded row per track; each
//! camera goes to `<prefix>_cam<N>.csv` with one point per line.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{error, info};

use super::camera::CameraTracklets;
use super::error::OutputError;
use super::track::GroundTruthTrack;

/// Sentinel used to pad short tracks
pub const PAD_VALUE: f64 = -1.0;

/// Leading metadata fields of a ground-truth row: camera, track id, valid length
const ROW_HEADER_FIELDS: usize = 3;

/// Fields per recorded sample: x, y, t
const SAMPLE_FIELDS: usize = 3;

/// Decimal places kept for every written value
pub const OUTPUT_DECIMALS: i32 = 6;

/// Build the rectangular ground-truth matrix
///
/// Every row is `camera, id, valid_len, x0, y0, t0, ...`, right-padded with
/// [`PAD_VALUE`] so all rows have the width of the longest track.
pub fn pad_tracks(tracks: &[GroundTruthTrack]) -> Vec<Vec<f64>> {
    let max_len = tracks.iter().map(|t| t.valid_len()).max().unwrap_or(0);
    let width = ROW_HEADER_FIELDS + SAMPLE_FIELDS * max_len;

    tracks
        .iter()
        .map(|track| {
            let mut row = Vec::with_capacity(width);
            row.push(track.camera as f64);
            row.push(track.id.0 as f64);
            row.push(track.valid_len() as f64);
            for sample in &track.samples {
                row.extend([sample.x, sample.y, sample.t]);
            }
            row.resize(width, PAD_VALUE);
            row
        })
        .collect()
}

pub fn ground_truth_output_path(prefix: &str) -> PathBuf {
    PathBuf::from(format!("{}.csv", prefix))
}

pub fn camera_output_path(prefix: &str, camera: usize) -> PathBuf {
    PathBuf::from(format!("{}_cam{}.csv", prefix, camera))
}

fn create_file(path: &Path) -> std::io::Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

/// Format a value rounded to [`OUTPUT_DECIMALS`] places
///
/// Accumulated step error such as `0.30000000000000004` is written as `0.3`.
pub fn format_value(value: f64) -> String {
    let scale = 10f64.powi(OUTPUT_DECIMALS);
    let rounded = (value * scale).round() / scale;
    // Avoid writing "-0"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    rounded.to_string()
}

fn format_row(values: &[f64]) -> String {
    values
        .iter()
        .map(|&v| format_value(v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Write the padded ground-truth matrix, one space-separated row per track
pub fn write_ground_truth(path: &Path, tracks: &[GroundTruthTrack]) -> Result<(), OutputError> {
    let wrap = |source: std::io::Error| OutputError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut out = create_file(path).map_err(wrap)?;
    for row in pad_tracks(tracks) {
        writeln!(out, "{}", format_row(&row)).map_err(wrap)?;
    }
    out.flush().map_err(wrap)
}

/// Write one `x y t track_id` line per tracklet point
///
/// The file is created even when the camera saw nothing.
pub fn write_camera_tracklets(path: &Path, tracklets: &CameraTracklets) -> Result<(), OutputError> {
    let wrap = |source: std::io::Error| OutputError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut out = create_file(path).map_err(wrap)?;
    for point in &tracklets.points {
        writeln!(
            out,
            "{} {} {} {}",
            format_value(point.x),
            format_value(point.y),
            format_value(point.t),
            point.track.0
        )
        .map_err(wrap)?;
    }
    out.flush().map_err(wrap)
}

/// Outcome of writing all output files
#[derive(Debug, Default)]
pub struct OutputReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<OutputError>,
}

impl OutputReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, path: PathBuf, result: Result<(), OutputError>) {
        match result {
            Ok(()) => {
                info!("Wrote {}", path.display());
                self.written.push(path);
            }
            Err(e) => {
                error!("{}", e);
                self.failed.push(e);
            }
        }
    }
}

/// Write the ground-truth file and every camera file
///
/// Each file is attempted independently; failures are logged and collected
/// instead of stopping the remaining files.
pub fn write_outputs(
    prefix: &str,
    tracks: &[GroundTruthTrack],
    cameras: &[CameraTracklets],
) -> OutputReport {
    let mut report = OutputReport::default();

    let path = ground_truth_output_path(prefix);
    let result = write_ground_truth(&path, tracks);
    report.record(path, result);

    for tracklets in cameras {
        let path = camera_output_path(prefix, tracklets.camera);
        let result = write_camera_tracklets(&path, tracklets);
        report.record(path, result);
    }

    report
}
