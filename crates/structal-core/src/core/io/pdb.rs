use crate::core::io::containers::RawReference;
use crate::core::io::traits::ReferenceFile;
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PdbParseErrorKind,
    },
    #[error("Reference file contains no ATOM/HETATM records")]
    NoAtoms,
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record (must reach the beta column, 66 chars)")]
    LineTooShort,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn parse_float(
    line_num: usize,
    columns: &str,
    value: &str,
) -> Result<f64, PdbError> {
    if value.is_empty() {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::MissingRequiredField {
                columns: columns.into(),
            },
        });
    }
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: columns.into(),
            value: value.into(),
        },
    })
}

/// Reader for the PDB-style reference-structure format.
///
/// Fixed-column ATOM/HETATM records supply the atom serial, name, position,
/// and the two auxiliary scalars the engine reuses: occupancy as the alignment
/// weight and the beta/temperature factor as the displacement weight. `TER`
/// records close the current molecule block; `END`/`ENDMDL` stops reading, so
/// only the first model of a multi-model file is used.
pub struct PdbFile;

impl ReferenceFile for PdbFile {
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<RawReference, Self::Error> {
        let mut raw = RawReference {
            block_boundaries: vec![0],
            ..RawReference::default()
        };

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let record_type = slice_and_trim(&line, 0, 6);

            match record_type {
                "ATOM" | "HETATM" => {
                    if line.len() < 66 {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort,
                        });
                    }

                    let serial_str = slice_and_trim(&line, 6, 11);
                    let serial = serial_str.parse().map_err(|_| PdbError::Parse {
                        line: line_num,
                        kind: PdbParseErrorKind::InvalidInt {
                            columns: "7-11".into(),
                            value: serial_str.into(),
                        },
                    })?;

                    let x = parse_float(line_num, "31-38", slice_and_trim(&line, 30, 38))?;
                    let y = parse_float(line_num, "39-46", slice_and_trim(&line, 38, 46))?;
                    let z = parse_float(line_num, "47-54", slice_and_trim(&line, 46, 54))?;
                    let occupancy =
                        parse_float(line_num, "55-60", slice_and_trim(&line, 54, 60))?;
                    let beta = parse_float(line_num, "61-66", slice_and_trim(&line, 60, 66))?;

                    raw.serials.push(serial);
                    raw.names.push(slice_and_trim(&line, 12, 16).to_string());
                    raw.positions.push(nalgebra::Point3::new(x, y, z));
                    raw.align_weights.push(occupancy);
                    raw.displace_weights.push(beta);
                }
                "TER" => {
                    // Ignore a TER with no atoms since the previous boundary.
                    if raw.len() > *raw.block_boundaries.last().unwrap_or(&0) {
                        raw.block_boundaries.push(raw.len());
                    }
                }
                "END" | "ENDMDL" => break,
                _ => {}
            }
        }

        if raw.is_empty() {
            return Err(PdbError::NoAtoms);
        }
        if raw.block_boundaries.last() != Some(&raw.len()) {
            raw.block_boundaries.push(raw.len());
        }

        Ok(raw)
    }
}
