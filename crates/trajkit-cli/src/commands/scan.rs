use crate::cli::ScanArgs;
use crate::config::range_from_args;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use serde::Serialize;
use std::io::Write;
use trajkit::core::io::format::AnyTrajectory;
use trajkit::core::io::traits::TrajectoryBackend;
use trajkit::core::models::frame::Frame;
use trajkit::core::trajectory::Trajectory;
use trajkit::engine::progress::{Progress, ProgressReporter};
use tracing::{debug, info};

/// One CSV row of `trajkit scan`. Cell columns are empty for non-periodic frames.
#[derive(Debug, Serialize)]
struct ScanRow {
    frame: usize,
    atoms: usize,
    cell_a: Option<f64>,
    cell_b: Option<f64>,
    cell_c: Option<f64>,
    centroid_x: Option<f64>,
    centroid_y: Option<f64>,
    centroid_z: Option<f64>,
}

impl ScanRow {
    fn new(frame_index: usize, frame: &Frame) -> Self {
        let lengths = frame.unit_cell.lengths();
        let centroid = frame.centroid();
        Self {
            frame: frame_index,
            atoms: frame.n_atoms(),
            cell_a: lengths.map(|l| l.x),
            cell_b: lengths.map(|l| l.y),
            cell_c: lengths.map(|l| l.z),
            centroid_x: centroid.map(|c| c.x),
            centroid_y: centroid.map(|c| c.y),
            centroid_z: centroid.map(|c| c.z),
        }
    }
}

pub fn run(args: ScanArgs, quiet: bool) -> Result<()> {
    let range = range_from_args(&args.range);
    info!("Opening trajectory {:?} with range {:?}", &args.trajectory, range);
    let mut trajectory = Trajectory::<AnyTrajectory>::open(&args.trajectory, range)?;
    println!(
        "Scanning {} of {} frames (range {})...",
        trajectory.len(),
        trajectory.raw_len(),
        trajectory.frame_range()
    );

    let progress_handler = if quiet || args.output.is_none() {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let rows = match &args.output {
        Some(path) => {
            let rows = write_scan(&mut trajectory, std::fs::File::create(path)?, &reporter)?;
            println!("✓ Wrote {} rows to: {}", rows, path.display());
            rows
        }
        None => write_scan(&mut trajectory, std::io::stdout().lock(), &reporter)?,
    };
    debug!("Scan produced {} rows", rows);

    trajectory.close()?;
    Ok(())
}

/// Traverses the trajectory's range once, writing one row per visited frame.
fn write_scan<B, W>(
    trajectory: &mut Trajectory<B>,
    writer: W,
    reporter: &ProgressReporter,
) -> Result<usize>
where
    B: TrajectoryBackend,
    W: Write,
{
    let mut writer = csv::Writer::from_writer(writer);
    let mut rows = 0;
    reporter.phase("Scan", || {
        reporter.report(Progress::TraversalStart {
            total_frames: trajectory.len() as u64,
        });
        trajectory.for_each_frame(|frame_index, frame| {
            writer.serialize(ScanRow::new(frame_index, frame))?;
            rows += 1;
            reporter.report(Progress::FrameDone { frame_index });
            Ok::<_, CliError>(())
        })?;
        reporter.report(Progress::TraversalFinish);
        Ok::<_, CliError>(())
    })?;
    writer.flush()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trajkit::core::io::xyz::XyzFile;
    use trajkit::core::trajectory::RangeConfig;

    fn write_xyz(dir: &tempfile::TempDir, n_frames: usize) -> std::path::PathBuf {
        let mut content = String::new();
        for k in 1..=n_frames {
            content.push_str(&format!("2\nframe {k}\nC {k} 0 0\nO {k} 2 0\n"));
        }
        let path = dir.path().join("scan.xyz");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn scan_writes_one_row_per_visited_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_xyz(&dir, 6);
        let mut trajectory =
            Trajectory::<XyzFile>::open(&path, RangeConfig::new().first(2).step(2)).unwrap();

        let mut out = Vec::new();
        let rows = write_scan(&mut trajectory, &mut out, &ProgressReporter::new()).unwrap();
        assert_eq!(rows, 3);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "frame,atoms,cell_a,cell_b,cell_c,centroid_x,centroid_y,centroid_z"
        );
        assert_eq!(lines[1], "2,2,,,,2.0,1.0,0.0");
        assert_eq!(lines[3], "6,2,,,,6.0,1.0,0.0");
    }

    #[test]
    fn scanning_twice_restarts_the_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_xyz(&dir, 3);
        let mut trajectory = Trajectory::<XyzFile>::open(&path, RangeConfig::default()).unwrap();

        let mut first = Vec::new();
        let mut second = Vec::new();
        write_scan(&mut trajectory, &mut first, &ProgressReporter::new()).unwrap();
        write_scan(&mut trajectory, &mut second, &ProgressReporter::new()).unwrap();
        assert_eq!(first, second);
    }
}
