use crate::core::utils::elements;
use nalgebra::Point3;

/// Identifies the residue an atom belongs to.
///
/// Residues are not stored separately; consecutive atoms sharing the same key
/// form one residue, as in PDB files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResidueKey {
    /// The single-character chain identifier (`' '` when absent).
    pub chain_id: char,
    /// The residue sequence number.
    pub residue_number: isize,
    /// The three-letter residue name.
    pub residue_name: String,
}

/// Static per-atom record of a simulated system.
///
/// The `position` field holds the reference (topology) coordinates; analysis
/// workflows overwrite it in private copies when they need per-frame atom
/// records.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The serial number as read from the topology file.
    pub serial: usize,
    /// The name of the atom (e.g., "CA", "N", "O").
    pub name: String,
    /// The name of the parent residue (e.g., "ALA").
    pub residue_name: String,
    /// The sequence number of the parent residue.
    pub residue_number: isize,
    /// The chain identifier.
    pub chain_id: char,
    /// The chemical element symbol, capitalised (e.g., "C", "Fe").
    pub element: String,
    /// The atomic mass in g/mol, 0 for unknown elements.
    pub mass: f64,
    /// The partial charge in elementary charge units.
    pub charge: f64,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    /// Creates a new `Atom` with default values for residue data and charge.
    ///
    /// The element is inferred from the atom name and the mass from the element.
    pub fn new(serial: usize, name: &str, position: Point3<f64>) -> Self {
        let element = elements::element_from_atom_name(name);
        Self {
            serial,
            name: name.to_string(),
            residue_name: String::new(),
            residue_number: 0,
            chain_id: ' ',
            mass: elements::atomic_mass(&element),
            element,
            charge: 0.0,
            position,
        }
    }

    /// Replaces the element and refreshes the mass accordingly.
    pub fn set_element(&mut self, symbol: &str) {
        self.element = elements::normalize_symbol(symbol);
        self.mass = elements::atomic_mass(&self.element);
    }

    pub fn residue_key(&self) -> ResidueKey {
        ResidueKey {
            chain_id: self.chain_id,
            residue_number: self.residue_number,
            residue_name: self.residue_name.clone(),
        }
    }
}
