use super::error::{ParseErrorKind, ReadError};
use super::lines::{LineReader, parse_float, parse_int};
use super::traits::TrajectoryBackend;
use crate::core::models::atom::Atom;
use crate::core::models::frame::Frame;
use crate::core::models::topology::Topology;
use crate::core::models::unit_cell::UnitCell;
use nalgebra::Point3;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::trace;

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

/// Multi-model PDB trajectory reader.
///
/// Models are delimited by `ENDMDL` (or `END`); a file without delimiters is a
/// single frame. A `CRYST1` record applies to its model and every later one
/// until the next `CRYST1`.
pub struct PdbFile {
    path: PathBuf,
    lines: LineReader<BufReader<File>>,
    unit_cell: UnitCell,
    frames_read: usize,
    n_frames: Option<usize>,
}

impl PdbFile {
    /// Reads the atoms of the first model as a topology.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, an `ATOM`/`HETATM` record is
    /// malformed, or the first model has no atoms.
    pub fn read_topology(path: &Path) -> Result<Topology, ReadError> {
        let mut lines = LineReader::new(BufReader::new(File::open(path)?));
        let mut atoms = Vec::new();
        while lines.next_line()? {
            match record_type(&lines.buffer) {
                "ATOM" | "HETATM" => atoms.push(parse_atom_record(&lines.buffer, lines.line_number)?),
                "ENDMDL" | "END" if !atoms.is_empty() => break,
                _ => {}
            }
        }
        if atoms.is_empty() {
            return Err(ReadError::Inconsistency(format!(
                "no ATOM/HETATM records in '{}'",
                path.display()
            )));
        }
        Ok(Topology::new(atoms))
    }
}

impl TrajectoryBackend for PdbFile {
    fn open(path: &Path) -> Result<Self, ReadError> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: LineReader::new(BufReader::new(file)),
            unit_cell: UnitCell::Infinite,
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
        let mut cell = UnitCell::Infinite;
        let mut count = 0;
        while next_model(&mut lines, &mut cell, None)? {
            count += 1;
        }
        trace!(path = ?self.path, frames = count, "Counted PDB models");
        self.n_frames = Some(count);
        Ok(count)
    }

    fn read_into(&mut self, frame: &mut Frame) -> Result<(), ReadError> {
        frame.clear();
        if !next_model(&mut self.lines, &mut self.unit_cell, Some(frame))? {
            return Err(ReadError::EndOfFile {
                frames_read: self.frames_read,
            });
        }
        self.frames_read += 1;
        Ok(())
    }

    fn skip(&mut self, n: usize, _scratch: &mut Frame) -> Result<(), ReadError> {
        for _ in 0..n {
            if !next_model(&mut self.lines, &mut self.unit_cell, None)? {
                return Err(ReadError::EndOfFile {
                    frames_read: self.frames_read,
                });
            }
            self.frames_read += 1;
        }
        Ok(())
    }
}

fn record_type(line: &str) -> &str {
    slice_and_trim(line, 0, 6)
}

/// Consumes one model. Coordinates are parsed only when `sink` is given.
/// Returns `false` if the file ended before any atom record.
fn next_model<R: BufRead>(
    lines: &mut LineReader<R>,
    cell: &mut UnitCell,
    mut sink: Option<&mut Frame>,
) -> Result<bool, ReadError> {
    let mut n_atoms = 0usize;
    while lines.next_line()? {
        let line = &lines.buffer;
        match record_type(line) {
            "CRYST1" => *cell = parse_cryst1(line, lines.line_number)?,
            "ATOM" | "HETATM" => {
                n_atoms += 1;
                if let Some(frame) = sink.as_deref_mut() {
                    frame.positions.push(parse_coordinates(line, lines.line_number)?);
                }
            }
            "ENDMDL" | "END" if n_atoms > 0 => break,
            _ => {}
        }
    }
    if let Some(frame) = sink {
        frame.unit_cell = *cell;
    }
    Ok(n_atoms > 0)
}

fn parse_cryst1(line: &str, line_number: usize) -> Result<UnitCell, ReadError> {
    let field = |start: usize, end: usize, name: &'static str| -> Result<f64, ReadError> {
        let value = slice_and_trim(line, start, end);
        if value.is_empty() {
            return Err(ReadError::Parse {
                line: line_number,
                kind: ParseErrorKind::MissingField { field: name },
            });
        }
        parse_float(value, name, line_number)
    };
    let lengths = [
        field(6, 15, "CRYST1 a")?,
        field(15, 24, "CRYST1 b")?,
        field(24, 33, "CRYST1 c")?,
    ];
    let angles = [
        field(33, 40, "CRYST1 alpha")?,
        field(40, 47, "CRYST1 beta")?,
        field(47, 54, "CRYST1 gamma")?,
    ];
    // A 1 Å cubic box is the placeholder written for non-periodic structures.
    if lengths.iter().all(|&l| (l - 1.0).abs() < 1e-6) {
        return Ok(UnitCell::Infinite);
    }
    Ok(UnitCell::from_lengths_and_angles(lengths, angles))
}

fn parse_coordinates(line: &str, line_number: usize) -> Result<Point3<f64>, ReadError> {
    let coordinate = |start: usize, end: usize, name: &'static str| -> Result<f64, ReadError> {
        let value = slice_and_trim(line, start, end);
        if value.is_empty() {
            return Err(ReadError::Parse {
                line: line_number,
                kind: ParseErrorKind::MissingField { field: name },
            });
        }
        parse_float(value, name, line_number)
    };
    Ok(Point3::new(
        coordinate(30, 38, "x (columns 31-38)")?,
        coordinate(38, 46, "y (columns 39-46)")?,
        coordinate(46, 54, "z (columns 47-54)")?,
    ))
}

fn parse_atom_record(line: &str, line_number: usize) -> Result<Atom, ReadError> {
    let serial_str = slice_and_trim(line, 6, 11);
    let name_str = slice_and_trim(line, 12, 16);
    let res_name_str = slice_and_trim(line, 17, 20);
    let chain_id_str = slice_and_trim(line, 21, 22);
    let res_num_str = slice_and_trim(line, 22, 26);
    let element_str = slice_and_trim(line, 76, 78);

    if name_str.is_empty() {
        return Err(ReadError::Parse {
            line: line_number,
            kind: ParseErrorKind::MissingField {
                field: "atom name (columns 13-16)",
            },
        });
    }
    let serial = parse_int(serial_str, "serial (columns 7-11)", line_number)?;
    let residue_number = if res_num_str.is_empty() {
        0
    } else {
        parse_int(res_num_str, "residue number (columns 23-26)", line_number)?
    };

    let mut atom = Atom::new(serial, name_str, parse_coordinates(line, line_number)?);
    atom.residue_name = res_name_str.to_string();
    atom.residue_number = residue_number;
    atom.chain_id = chain_id_str.chars().next().unwrap_or(' ');
    if !element_str.is_empty() {
        atom.set_element(element_str);
    }
    Ok(atom)
}
