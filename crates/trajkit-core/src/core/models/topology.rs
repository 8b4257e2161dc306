use super::atom::{Atom, ResidueKey};
use itertools::Itertools;
use std::ops::Range;

/// Describes a subset of the atoms of a [`Topology`].
#[derive(Debug, Clone, PartialEq)]
pub enum AtomSelection {
    /// Every atom of the system.
    All,
    /// Explicit 0-based atom indices.
    Indices(Vec<usize>),
    /// All atoms of residues with this name (e.g., "LIG", "SOL").
    ResidueName(String),
    /// All atoms with this name (e.g., "CA").
    AtomName(String),
    /// All atoms of one chain.
    Chain(char),
}

/// A contiguous run of atoms sharing one [`ResidueKey`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResidueSpan {
    pub key: ResidueKey,
    pub atoms: Range<usize>,
}

/// Static atom metadata of a simulated system, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology {
    atoms: Vec<Atom>,
}

impl Topology {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Self { atoms }
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Groups consecutive atoms into residues.
    ///
    /// Two runs with the same key separated by other residues are reported as
    /// two distinct residues, mirroring how PDB readers number them.
    pub fn residues(&self) -> Vec<ResidueSpan> {
        residue_spans(&self.atoms)
    }

    /// Resolves a selection into sorted, unique atom indices.
    ///
    /// Explicit indices beyond the number of atoms are dropped; callers that
    /// need strictness compare lengths.
    pub fn select(&self, selection: &AtomSelection) -> Vec<usize> {
        let matching = |predicate: &dyn Fn(&Atom) -> bool| -> Vec<usize> {
            self.atoms
                .iter()
                .enumerate()
                .filter(|(_, atom)| predicate(atom))
                .map(|(i, _)| i)
                .collect()
        };
        match selection {
            AtomSelection::All => (0..self.atoms.len()).collect(),
            AtomSelection::Indices(indices) => indices
                .iter()
                .copied()
                .filter(|&i| i < self.atoms.len())
                .sorted_unstable()
                .dedup()
                .collect(),
            AtomSelection::ResidueName(name) => {
                matching(&|atom: &Atom| atom.residue_name.eq_ignore_ascii_case(name))
            }
            AtomSelection::AtomName(name) => matching(&|atom: &Atom| atom.name.eq_ignore_ascii_case(name)),
            AtomSelection::Chain(chain_id) => matching(&|atom: &Atom| atom.chain_id == *chain_id),
        }
    }
}

pub(crate) fn residue_spans(atoms: &[Atom]) -> Vec<ResidueSpan> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (key, group) in &atoms.iter().chunk_by(|atom| atom.residue_key()) {
        let count = group.count();
        spans.push(ResidueSpan {
            key,
            atoms: start..start + count,
        });
        start += count;
    }
    spans
}
