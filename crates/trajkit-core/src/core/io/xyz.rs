use super::error::{ParseErrorKind, ReadError};
use super::lines::{LineReader, parse_float, parse_int, truncated};
use super::traits::TrajectoryBackend;
use crate::core::models::atom::Atom;
use crate::core::models::frame::Frame;
use crate::core::models::topology::Topology;
use crate::core::models::unit_cell::UnitCell;
use nalgebra::{Matrix3, Point3};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::trace;

const LATTICE_KEY: &str = "Lattice=\"";

/// Multi-frame XYZ trajectory reader.
///
/// Each frame is an atom-count line, a comment line, and one `symbol x y z`
/// line per atom. An extended-XYZ `Lattice="ax ay az bx by bz cx cy cz"`
/// entry in the comment line sets the unit cell of that frame.
pub struct XyzFile {
    path: PathBuf,
    lines: LineReader<BufReader<File>>,
    frames_read: usize,
    n_frames: Option<usize>,
}

impl XyzFile {
    /// Number of frames consumed since the file was opened.
    pub fn frames_read(&self) -> usize {
        self.frames_read
    }

    /// Builds a topology from the first frame: one atom per line, named and
    /// typed after its element symbol, all in a single unnamed residue.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::Inconsistency`] for a file without frames, or the
    /// parse error of the first frame.
    pub fn read_topology(path: &Path) -> Result<Topology, ReadError> {
        let mut lines = LineReader::new(BufReader::new(File::open(path)?));
        let Some(n_atoms) = read_header(&mut lines)? else {
            return Err(ReadError::Inconsistency(format!(
                "'{}' contains no frame",
                path.display()
            )));
        };
        if !lines.next_line()? {
            return Err(truncated(lines.line_number + 1, n_atoms, 0));
        }
        let mut atoms = Vec::with_capacity(n_atoms);
        for found in 0..n_atoms {
            if !lines.next_line()? {
                return Err(truncated(lines.line_number + 1, n_atoms, found));
            }
            let symbol = lines.buffer.split_whitespace().next().unwrap_or_default();
            let position = parse_atom_line(&lines.buffer, lines.line_number)?;
            let mut atom = Atom::new(found + 1, symbol, position);
            atom.set_element(symbol);
            atoms.push(atom);
        }
        Ok(Topology::new(atoms))
    }
}

impl TrajectoryBackend for XyzFile {
    fn open(path: &Path) -> Result<Self, ReadError> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: LineReader::new(BufReader::new(file)),
            frames_read: 0,
            n_frames: None,
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn n_frames(&mut self) -> Result<usize, ReadError> {
        if let Some(n) = self.n_frames {
            return Ok(n);
        }
        let mut lines = LineReader::new(BufReader::new(File::open(&self.path)?));
        let mut count = 0;
        while skip_frame(&mut lines)? {
            count += 1;
        }
        trace!(path = ?self.path, frames = count, "Counted XYZ frames");
        self.n_frames = Some(count);
        Ok(count)
    }

    fn read_into(&mut self, frame: &mut Frame) -> Result<(), ReadError> {
        let Some(n_atoms) = read_header(&mut self.lines)? else {
            return Err(ReadError::EndOfFile {
                frames_read: self.frames_read,
            });
        };

        let comment_line = self.lines.line_number + 1;
        if !self.lines.next_line()? {
            return Err(truncated(comment_line, n_atoms, 0));
        }
        frame.clear();
        frame.unit_cell = parse_lattice(&self.lines.buffer, self.lines.line_number)?;
        frame.positions.reserve(n_atoms);

        for found in 0..n_atoms {
            if !self.lines.next_line()? {
                return Err(truncated(self.lines.line_number + 1, n_atoms, found));
            }
            frame
                .positions
                .push(parse_atom_line(&self.lines.buffer, self.lines.line_number)?);
        }

        self.frames_read += 1;
        Ok(())
    }

    fn skip(&mut self, n: usize, _scratch: &mut Frame) -> Result<(), ReadError> {
        for _ in 0..n {
            if !skip_frame(&mut self.lines)? {
                return Err(ReadError::EndOfFile {
                    frames_read: self.frames_read,
                });
            }
            self.frames_read += 1;
        }
        Ok(())
    }
}

/// Reads the atom-count line of the next frame, skipping blank lines.
fn read_header<R: BufRead>(lines: &mut LineReader<R>) -> Result<Option<usize>, ReadError> {
    loop {
        if !lines.next_line()? {
            return Ok(None);
        }
        let trimmed = lines.buffer.trim();
        if trimmed.is_empty() {
            continue;
        }
        return parse_int(trimmed, "atom count", lines.line_number).map(Some);
    }
}

fn skip_frame<R: BufRead>(lines: &mut LineReader<R>) -> Result<bool, ReadError> {
    let Some(n_atoms) = read_header(lines)? else {
        return Ok(false);
    };
    for found in 0..n_atoms + 1 {
        if !lines.next_line()? {
            return Err(truncated(
                lines.line_number + 1,
                n_atoms,
                found.saturating_sub(1),
            ));
        }
    }
    Ok(true)
}

fn parse_atom_line(line: &str, line_number: usize) -> Result<Point3<f64>, ReadError> {
    let mut fields = line.split_whitespace().skip(1);
    let mut coordinate = |field: &'static str| -> Result<f64, ReadError> {
        let value = fields.next().ok_or(ReadError::Parse {
            line: line_number,
            kind: ParseErrorKind::MissingField { field },
        })?;
        parse_float(value, field, line_number)
    };
    let x = coordinate("x")?;
    let y = coordinate("y")?;
    let z = coordinate("z")?;
    Ok(Point3::new(x, y, z))
}

fn parse_lattice(comment: &str, line_number: usize) -> Result<UnitCell, ReadError> {
    let Some(start) = comment.find(LATTICE_KEY) else {
        return Ok(UnitCell::Infinite);
    };
    let rest = &comment[start + LATTICE_KEY.len()..];
    let body = rest.split('"').next().unwrap_or_default();
    let values = body
        .split_whitespace()
        .map(|v| parse_float(v, "lattice", line_number))
        .collect::<Result<Vec<_>, _>>()?;
    if values.len() != 9 {
        return Err(ReadError::Parse {
            line: line_number,
            kind: ParseErrorKind::InvalidLattice(values.len()),
        });
    }
    Ok(UnitCell::from_matrix(Matrix3::from_column_slice(&values)))
}
