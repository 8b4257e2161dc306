use phf::{Map, phf_map};

static ATOMIC_MASSES: Map<&'static str, f64> = phf_map! {
    "H" => 1.008, "D" => 2.014, "He" => 4.0026,
    "Li" => 6.94, "Be" => 9.0122, "B" => 10.81, "C" => 12.011, "N" => 14.007,
    "O" => 15.999, "F" => 18.998, "Ne" => 20.180,
    "Na" => 22.990, "Mg" => 24.305, "Al" => 26.982, "Si" => 28.085, "P" => 30.974,
    "S" => 32.06, "Cl" => 35.45, "Ar" => 39.948,
    "K" => 39.098, "Ca" => 40.078, "Mn" => 54.938, "Fe" => 55.845, "Co" => 58.933,
    "Ni" => 58.693, "Cu" => 63.546, "Zn" => 65.38, "Se" => 78.971, "Br" => 79.904,
    "Rb" => 85.468, "Sr" => 87.62, "Cd" => 112.41, "I" => 126.90, "Cs" => 132.91,
    "Ba" => 137.33, "Pt" => 195.08, "Au" => 196.97, "Hg" => 200.59,
};

/// Returns the canonical capitalisation of an element symbol ("FE" -> "Fe").
pub fn normalize_symbol(symbol: &str) -> String {
    let mut chars = symbol.trim().chars().filter(|c| c.is_ascii_alphabetic());
    match chars.next() {
        Some(first) => {
            let mut normalized = first.to_ascii_uppercase().to_string();
            normalized.extend(chars.map(|c| c.to_ascii_lowercase()));
            normalized
        }
        None => String::new(),
    }
}

/// Guesses the element from a PDB-style atom name using its first letter.
///
/// Two-letter elements cannot be told apart from names such as `CA` (alpha
/// carbon), so this only ever returns single-letter symbols.
pub fn element_from_atom_name(name: &str) -> String {
    name.trim()
        .chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase().to_string())
        .unwrap_or_default()
}

/// Atomic mass in g/mol; 0 for unknown symbols.
pub fn atomic_mass(symbol: &str) -> f64 {
    ATOMIC_MASSES.get(symbol).copied().unwrap_or(0.0)
}
