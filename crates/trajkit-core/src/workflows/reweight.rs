use crate::core::forcefield::perturbation::PairPerturbation;
use crate::core::io::traits::TrajectoryBackend;
use crate::core::models::frame::Frame;
use crate::core::neighbors::CellList;
use crate::engine::config::ReweightConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::simulation::Simulation;
use nalgebra::Point3;
use serde::Serialize;
use std::io::Write;
use tracing::{debug, info, instrument, warn};

/// Per-frame perturbation energies and the resulting ensemble weights.
///
/// All vectors are parallel and ordered by raw frame index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReweightResults {
    pub frame_indices: Vec<usize>,
    pub energy: Vec<f64>,
    /// Normalized Boltzmann weights, summing to 1.
    pub probability: Vec<f64>,
    /// `probability` scaled by the number of frames, so unperturbed frames
    /// weigh 1.
    pub relative_probability: Vec<f64>,
}

#[derive(Serialize)]
struct ReweightRow {
    frame: usize,
    energy: f64,
    probability: f64,
    relative_probability: f64,
}

impl ReweightResults {
    pub fn from_energies(frame_indices: Vec<usize>, energy: Vec<f64>, kt: f64) -> Self {
        let probability = boltzmann_probabilities(&energy, kt);
        let n = probability.len() as f64;
        let relative_probability = probability.iter().map(|p| p * n).collect();
        Self {
            frame_indices,
            energy,
            probability,
            relative_probability,
        }
    }

    pub fn len(&self) -> usize {
        self.frame_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame_indices.is_empty()
    }

    /// Kish effective sample size `1 / Σ pᵢ²`.
    pub fn effective_sample_size(&self) -> f64 {
        let sum_sq: f64 = self.probability.iter().map(|p| p * p).sum();
        if sum_sq > 0.0 { 1.0 / sum_sq } else { 0.0 }
    }

    /// Writes one `frame,energy,probability,relative_probability` row per frame.
    ///
    /// # Errors
    ///
    /// Returns the CSV writer's error.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);
        for i in 0..self.len() {
            writer.serialize(ReweightRow {
                frame: self.frame_indices[i],
                energy: self.energy[i],
                probability: self.probability[i],
                relative_probability: self.relative_probability[i],
            })?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Normalized `exp(-Eᵢ/kT)` weights.
///
/// Energies are shifted by their minimum before exponentiation, so large
/// perturbations do not overflow. Non-finite energies get a zero weight.
pub fn boltzmann_probabilities(energies: &[f64], kt: f64) -> Vec<f64> {
    let min_energy = energies
        .iter()
        .copied()
        .filter(|e| e.is_finite())
        .fold(f64::INFINITY, f64::min);
    if !min_energy.is_finite() {
        if !energies.is_empty() {
            warn!("No frame has a finite perturbation energy; all weights are zero.");
        }
        return vec![0.0; energies.len()];
    }

    let weights: Vec<f64> = energies
        .iter()
        .map(|&e| {
            if e.is_finite() {
                (-(e - min_energy) / kt).exp()
            } else {
                0.0
            }
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Sums `perturbation` over the pairs of one frame within the cutoff.
///
/// Without `group_2`, unordered pairs of `group_1` are used. With it, pairs
/// that refer to the same atom twice are skipped.
///
/// # Errors
///
/// [`EngineError::AtomIndexOutOfRange`] if a group refers to an atom the
/// frame does not have.
pub fn perturbation_energy<P>(
    frame: &Frame,
    group_1: &[usize],
    group_2: Option<&[usize]>,
    cutoff: f64,
    perturbation: &P,
) -> Result<f64, EngineError>
where
    P: PairPerturbation + ?Sized,
{
    let gather = |indices: &[usize]| -> Result<Vec<Point3<f64>>, EngineError> {
        indices
            .iter()
            .map(|&index| {
                frame
                    .positions
                    .get(index)
                    .copied()
                    .ok_or(EngineError::AtomIndexOutOfRange {
                        index,
                        n_atoms: frame.n_atoms(),
                    })
            })
            .collect()
    };
    let a = gather(group_1)?;
    let b = group_2.map(gather).transpose()?;
    let cells = CellList::new(cutoff, &frame.unit_cell);
    let mut energy = 0.0;
    match (group_2, b) {
        (Some(group_2), Some(b)) => {
            cells.for_each_pair_within(&a, &b, |i, j, dist| {
                if group_1[i] != group_2[j] {
                    energy += perturbation.energy(dist);
                }
            });
        }
        _ => cells.for_each_self_pair_within(&a, |_, _, dist| {
            energy += perturbation.energy(dist);
        }),
    }
    Ok(energy)
}

/// Reweights the frames of `simulation`'s range under `perturbation`.
///
/// Frame `i` receives the weight `exp(-ΔUᵢ/kT) / Σⱼ exp(-ΔUⱼ/kT)`, where `ΔUᵢ`
/// is the perturbation summed over the configured pairs.
///
/// # Errors
///
/// [`EngineError::EmptySelection`] if a group matches no atom, otherwise the
/// errors of [`Simulation::for_each_frame`].
#[instrument(skip_all, name = "reweight_workflow")]
pub fn run<B, P>(
    simulation: &mut Simulation<B>,
    perturbation: &P,
    config: &ReweightConfig,
    reporter: &ProgressReporter,
) -> Result<ReweightResults, EngineError>
where
    B: TrajectoryBackend,
    P: PairPerturbation + ?Sized,
{
    let (group_1, group_2) = reporter.phase("Selection", || {
        let group_1 = simulation.topology().select(&config.group_1);
        if group_1.is_empty() {
            return Err(EngineError::EmptySelection { group: "group_1" });
        }
        let group_2 = match &config.group_2 {
            Some(selection) => {
                let group = simulation.topology().select(selection);
                if group.is_empty() {
                    return Err(EngineError::EmptySelection { group: "group_2" });
                }
                Some(group)
            }
            None => None,
        };
        Ok((group_1, group_2))
    })?;
    info!(
        group_1 = group_1.len(),
        group_2 = group_2.as_ref().map_or(0, Vec::len),
        cutoff = config.cutoff,
        "Resolved reweighting groups"
    );

    let (frame_indices, energy) = reporter.phase("Perturbation energy", || {
        reporter.report(Progress::TraversalStart {
            total_frames: simulation.len() as u64,
        });
        let mut frame_indices = Vec::with_capacity(simulation.len());
        let mut energy = Vec::with_capacity(simulation.len());
        simulation.for_each_frame(|index, frame| {
            let e = perturbation_energy(
                frame,
                &group_1,
                group_2.as_deref(),
                config.cutoff,
                perturbation,
            )?;
            debug!(frame = index, energy = e, "Computed perturbation energy");
            frame_indices.push(index);
            energy.push(e);
            reporter.report(Progress::FrameDone { frame_index: index });
            Ok::<_, EngineError>(())
        })?;
        reporter.report(Progress::TraversalFinish);
        Ok::<_, EngineError>((frame_indices, energy))
    })?;

    let results = reporter.phase("Reweighting", || {
        Ok::<_, EngineError>(ReweightResults::from_energies(
            frame_indices,
            energy,
            config.kt(),
        ))
    })?;
    info!(
        frames = results.len(),
        effective_sample_size = results.effective_sample_size(),
        "Reweighting finished"
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::xyz::XyzFile;
    use crate::core::models::topology::AtomSelection;
    use crate::core::models::unit_cell::UnitCell;
    use crate::core::trajectory::RangeConfig;
    use crate::engine::config::ReweightConfigBuilder;
    use nalgebra::Vector3;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn frame(points: &[[f64; 3]]) -> Frame {
        let mut frame = Frame::new();
        frame
            .positions
            .extend(points.iter().map(|p| Point3::new(p[0], p[1], p[2])));
        frame
    }

    #[test]
    fn equal_energies_give_uniform_weights() {
        let p = boltzmann_probabilities(&[3.0, 3.0, 3.0, 3.0], 1.0);
        assert!(p.iter().all(|&x| f64_approx_equal(x, 0.25)));
    }

    #[test]
    fn probabilities_follow_boltzmann_ratio() {
        let p = boltzmann_probabilities(&[0.0, 1.0], 2.0);
        assert!(f64_approx_equal(p[1] / p[0], (-0.5f64).exp()));
        assert!(f64_approx_equal(p.iter().sum::<f64>(), 1.0));
    }

    #[test]
    fn large_energies_do_not_overflow() {
        let p = boltzmann_probabilities(&[-5000.0, -5001.0, f64::INFINITY], 1.0);
        assert!(p.iter().all(|x| x.is_finite()));
        assert!(f64_approx_equal(p[0] + p[1], 1.0));
        assert_eq!(p[2], 0.0);
    }

    #[test]
    fn relative_probability_is_scaled_by_frame_count() {
        let results = ReweightResults::from_energies(vec![1, 3], vec![0.0, 0.0], 1.0);
        assert_eq!(results.relative_probability, vec![1.0, 1.0]);
        assert!(f64_approx_equal(results.effective_sample_size(), 2.0));
    }

    #[test]
    fn energy_sums_pairs_within_cutoff_only() {
        let f = frame(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [5.0, 0.0, 0.0]]);
        let count = |_: f64| 1.0;
        assert_eq!(perturbation_energy(&f, &[0, 1, 2], None, 2.0, &count).unwrap(), 1.0);
        assert_eq!(perturbation_energy(&f, &[0, 1, 2], None, 6.0, &count).unwrap(), 3.0);
    }

    #[test]
    fn cross_group_energy_skips_shared_atoms() {
        let f = frame(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let dist = |d: f64| d;
        let energy = perturbation_energy(&f, &[0, 1], Some(&[0, 1][..]), 5.0, &dist).unwrap();
        assert!(f64_approx_equal(energy, 2.0));
    }

    #[test]
    fn energy_rejects_indices_past_the_frame() {
        let f = frame(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let count = |_: f64| 1.0;
        assert!(matches!(
            perturbation_energy(&f, &[0, 2], None, 5.0, &count),
            Err(EngineError::AtomIndexOutOfRange { index: 2, n_atoms: 2 })
        ));
        assert!(matches!(
            perturbation_energy(&f, &[0], Some(&[7][..]), 5.0, &count),
            Err(EngineError::AtomIndexOutOfRange { index: 7, n_atoms: 2 })
        ));
    }

    #[test]
    fn energy_uses_minimum_image() {
        let mut f = frame(&[[0.5, 5.0, 5.0], [9.5, 5.0, 5.0]]);
        f.unit_cell = UnitCell::Orthorhombic {
            lengths: Vector3::new(10.0, 10.0, 10.0),
        };
        let dist = |d: f64| d;
        let energy = perturbation_energy(&f, &[0], Some(&[1][..]), 3.0, &dist).unwrap();
        assert!(f64_approx_equal(energy, 1.0));
    }

    #[test]
    fn run_reweights_every_frame_of_the_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pair.xyz");
        let content: String = [1.0, 2.0, 3.0, 4.0]
            .iter()
            .map(|d| format!("2\n\nAr 0 0 0\nAr {d} 0 0\n"))
            .collect();
        std::fs::write(&path, content).unwrap();

        let mut simulation =
            Simulation::<XyzFile>::open(&path, &path, RangeConfig::new().step(2)).unwrap();
        let config = ReweightConfigBuilder::new()
            .group_1(AtomSelection::Indices(vec![0]))
            .group_2(AtomSelection::Indices(vec![1]))
            .cutoff(10.0)
            .build()
            .unwrap();
        let results = run(&mut simulation, &|d: f64| d, &config, &ProgressReporter::new()).unwrap();

        assert_eq!(results.frame_indices, vec![1, 3]);
        assert_eq!(results.energy, vec![1.0, 3.0]);
        let expected = 1.0 / (1.0 + (-2.0f64).exp());
        assert!(f64_approx_equal(results.probability[0], expected));

        let mut out = Vec::new();
        results.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("frame,energy,probability,relative_probability\n1,1.0,"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn run_rejects_empty_groups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.xyz");
        std::fs::write(&path, "1\n\nAr 0 0 0\n").unwrap();
        let mut simulation = Simulation::<XyzFile>::open(&path, &path, RangeConfig::default()).unwrap();
        let config = ReweightConfigBuilder::new()
            .group_1(AtomSelection::ResidueName("LIG".to_string()))
            .build()
            .unwrap();
        let result = run(&mut simulation, &|_: f64| 0.0, &config, &ProgressReporter::new());
        assert!(matches!(
            result,
            Err(EngineError::EmptySelection { group: "group_1" })
        ));
    }
}
