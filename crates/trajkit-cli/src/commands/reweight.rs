use crate::cli::ReweightArgs;
use crate::config::PartialReweightConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use std::fs::File;
use std::io::BufWriter;
use trajkit::engine::progress::ProgressReporter;
use trajkit::engine::simulation::Simulation;
use trajkit::workflows;
use tracing::{info, warn};

pub fn run(args: ReweightArgs, quiet: bool) -> Result<()> {
    let partial_config = PartialReweightConfig::from_file(&args.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let settings = partial_config.merge_with_cli(&args)?;
    info!(
        "Perturbation '{}' with cutoff {} and kT {}",
        settings.perturbation.kind(),
        settings.reweight.cutoff,
        settings.reweight.kt()
    );

    info!(
        "Loading topology {:?} and trajectory {:?}",
        &args.topology, &args.trajectory
    );
    let mut simulation: Simulation =
        Simulation::open(&args.topology, &args.trajectory, settings.range)?;

    let progress_handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Reweighting {} of {} frames (range {})...",
        simulation.len(),
        simulation.raw_len(),
        simulation.frame_range()
    );
    let results = workflows::reweight::run(
        &mut simulation,
        &settings.perturbation,
        &settings.reweight,
        &reporter,
    )?;
    simulation.close()?;

    let ess = results.effective_sample_size();
    if ess < 1.5 && results.len() > 1 {
        warn!(
            "Effective sample size is {:.2}; the weights are dominated by a single frame.",
            ess
        );
    }

    info!("Writing {} rows to {:?}", results.len(), &args.output);
    results.write_csv(BufWriter::new(File::create(&args.output)?))?;
    println!(
        "✓ Weights for {} frames (effective sample size {:.2}) written to: {}",
        results.len(),
        ess,
        args.output.display()
    );

    Ok(())
}
