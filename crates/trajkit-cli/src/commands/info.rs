use crate::cli::InfoArgs;
use crate::error::{CliError, Result};
use trajkit::core::io::format::{AnyTrajectory, TrajectoryFormat};
use trajkit::core::models::unit_cell::UnitCell;
use trajkit::core::trajectory::{RangeConfig, Trajectory};
use tracing::info;

pub fn run(args: InfoArgs) -> Result<()> {
    let format = TrajectoryFormat::from_path(&args.trajectory).map_err(|e| {
        CliError::FileParsing {
            path: args.trajectory.clone(),
            source: e.into(),
        }
    })?;

    info!("Opening trajectory {:?} as {}", &args.trajectory, format);
    let trajectory = Trajectory::<AnyTrajectory>::open(&args.trajectory, RangeConfig::default())?;

    println!("Trajectory: {}", args.trajectory.display());
    println!("Format:     {}", format);
    println!("Frames:     {}", trajectory.raw_len());
    println!("Atoms:      {}", trajectory.current_frame().n_atoms());
    println!("Unit cell:  {}", describe_cell(&trajectory.current_frame().unit_cell));

    trajectory.close()?;
    Ok(())
}

pub(crate) fn describe_cell(cell: &UnitCell) -> String {
    match (cell.lengths(), cell.angles()) {
        (Some(l), Some(a)) => format!(
            "a={:.3} b={:.3} c={:.3} alpha={:.2} beta={:.2} gamma={:.2} (volume {:.1} A^3)",
            l.x,
            l.y,
            l.z,
            a.x,
            a.y,
            a.z,
            cell.volume()
        ),
        _ => "none (non-periodic)".to_string(),
    }
}
