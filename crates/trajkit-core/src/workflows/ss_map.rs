use crate::core::io::traits::TrajectoryBackend;
use crate::core::models::atom::{Atom, ResidueKey};
use crate::core::models::topology::{AtomSelection, residue_spans};
use crate::core::secondary::{SecondaryStructure, SecondaryStructureClassifier};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::simulation::Simulation;
use nalgebra::DMatrix;
use std::io::Write;
use tracing::{debug, info, instrument};

/// Residue × frame matrix of secondary-structure codes.
///
/// Row `r` is `residues()[r]`, column `c` is raw frame `frame_indices()[c]`.
/// Entries are [`SecondaryStructure::code`] values.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryStructureMap {
    codes: DMatrix<u8>,
    residues: Vec<ResidueKey>,
    frame_indices: Vec<usize>,
}

impl SecondaryStructureMap {
    pub fn codes(&self) -> &DMatrix<u8> {
        &self.codes
    }

    pub fn residues(&self) -> &[ResidueKey] {
        &self.residues
    }

    pub fn frame_indices(&self) -> &[usize] {
        &self.frame_indices
    }

    pub fn n_residues(&self) -> usize {
        self.codes.nrows()
    }

    pub fn n_frames(&self) -> usize {
        self.codes.ncols()
    }

    /// Class of `residue` (row) in the `column`-th visited frame.
    pub fn class_at(&self, residue: usize, column: usize) -> Option<SecondaryStructure> {
        self.codes
            .get((residue, column))
            .copied()
            .and_then(SecondaryStructure::from_code)
    }

    /// For every frame, the fraction of residues whose class satisfies `predicate`.
    pub fn fraction_per_frame(&self, predicate: impl Fn(SecondaryStructure) -> bool) -> Vec<f64> {
        self.codes
            .column_iter()
            .map(|column| fraction(column.iter(), &predicate))
            .collect()
    }

    /// For every residue, the fraction of frames whose class satisfies `predicate`.
    pub fn fraction_per_residue(&self, predicate: impl Fn(SecondaryStructure) -> bool) -> Vec<f64> {
        self.codes
            .row_iter()
            .map(|row| fraction(row.iter(), &predicate))
            .collect()
    }

    /// Writes one row per residue: `chain,residue_number,residue_name`, then
    /// the integer code for each visited frame, headed by its raw index.
    ///
    /// # Errors
    ///
    /// Returns the CSV writer's error.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);
        let mut header = vec![
            "chain".to_string(),
            "residue_number".to_string(),
            "residue_name".to_string(),
        ];
        header.extend(self.frame_indices.iter().map(|i| i.to_string()));
        writer.write_record(&header)?;

        for (key, row) in self.residues.iter().zip(self.codes.row_iter()) {
            let mut record = vec![
                key.chain_id.to_string(),
                key.residue_number.to_string(),
                key.residue_name.clone(),
            ];
            record.extend(row.iter().map(|code| code.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn fraction<'a>(
    codes: impl Iterator<Item = &'a u8>,
    predicate: &impl Fn(SecondaryStructure) -> bool,
) -> f64 {
    let (mut total, mut hits) = (0usize, 0usize);
    for &code in codes {
        total += 1;
        if SecondaryStructure::from_code(code).is_some_and(predicate) {
            hits += 1;
        }
    }
    if total == 0 { 0.0 } else { hits as f64 / total as f64 }
}

/// Classifies the selected residues in every frame of `simulation`'s range.
///
/// The selected atoms are copied once into a persistent record buffer; each
/// frame only refreshes their positions before the buffer is handed to
/// `classifier`.
///
/// # Errors
///
/// [`EngineError::EmptySelection`], [`EngineError::Classifier`] when the
/// classifier fails, [`EngineError::ClassifierOutput`] when it returns the
/// wrong number of classes, or the errors of [`Simulation::for_each_frame`].
#[instrument(skip_all, name = "ss_map_workflow")]
pub fn run<B, C>(
    simulation: &mut Simulation<B>,
    selection: &AtomSelection,
    classifier: &mut C,
    reporter: &ProgressReporter,
) -> Result<SecondaryStructureMap, EngineError>
where
    B: TrajectoryBackend,
    C: SecondaryStructureClassifier + ?Sized,
{
    let selected = simulation.topology().select(selection);
    if selected.is_empty() {
        return Err(EngineError::EmptySelection { group: "selection" });
    }
    let mut atoms: Vec<Atom> = selected
        .iter()
        .map(|&i| simulation.atoms()[i].clone())
        .collect();
    let residues: Vec<ResidueKey> = residue_spans(&atoms).into_iter().map(|span| span.key).collect();
    let n_residues = residues.len();
    info!(
        atoms = atoms.len(),
        residues = n_residues,
        frames = simulation.len(),
        "Building secondary-structure map"
    );

    let mut frame_indices = Vec::with_capacity(simulation.len());
    let mut codes = Vec::with_capacity(n_residues * simulation.len());
    reporter.phase("Classification", || {
        reporter.report(Progress::TraversalStart {
            total_frames: simulation.len() as u64,
        });
        simulation.for_each_frame(|frame_index, frame| {
            for (atom, &i) in atoms.iter_mut().zip(&selected) {
                atom.position = frame.positions[i];
            }
            let classes = classifier
                .classify(&atoms)
                .map_err(|source| EngineError::Classifier { frame_index, source })?;
            if classes.len() != n_residues {
                return Err(EngineError::ClassifierOutput {
                    frame_index,
                    expected: n_residues,
                    found: classes.len(),
                });
            }
            debug!(frame = frame_index, "Classified frame");
            codes.extend(classes.iter().map(|class| class.code()));
            frame_indices.push(frame_index);
            reporter.report(Progress::FrameDone { frame_index });
            Ok::<_, EngineError>(())
        })?;
        reporter.report(Progress::TraversalFinish);
        Ok::<_, EngineError>(())
    })?;

    let n_frames = frame_indices.len();
    Ok(SecondaryStructureMap {
        codes: DMatrix::from_vec(n_residues, n_frames, codes),
        residues,
        frame_indices,
    })
}
