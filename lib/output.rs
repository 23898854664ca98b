//! Appending observable curves to plain-text output files.
//!
//! Each curve is one newline-terminated row of single-space-separated values
//! in scientific notation, with no header.

use std::{
    fs::OpenOptions,
    io::{ BufWriter, Write },
    path::Path,
};
use ndarray as nd;
use crate::{ Arr1, Arr2, error::OutputError };

pub type OResult<T> = Result<T, OutputError>;

/// Density of states, one row per random vector.
pub const DOS_FILE: &str = "dos.out";

/// Velocity autocorrelation, one row per correlation step.
pub const VAC_FILE: &str = "vac.out";

/// Mean-square displacement, one row per correlation step.
pub const MSD_FILE: &str = "msd.out";

fn format_row<S>(row: &Arr1<S>) -> String
where S: nd::Data<Elem = f64>
{
    row.iter()
        .map(|v| format!("{:.15e}", v))
        .collect::<Vec<String>>()
        .join(" ")
}

/// Append each row of `rows` to the file at `path`, creating it if needed.
pub fn append_rows<P, S>(path: P, rows: &Arr2<S>) -> OResult<()>
where
    P: AsRef<Path>,
    S: nd::Data<Elem = f64>,
{
    let path = path.as_ref();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| OutputError::Open { path: path.to_path_buf(), source })?;
    let write_err
        = |source| OutputError::Write { path: path.to_path_buf(), source };
    let mut out = BufWriter::new(file);
    for row in rows.outer_iter() {
        writeln!(out, "{}", format_row(&row)).map_err(write_err)?;
    }
    out.flush().map_err(write_err)
}

/// Append a single row to the file at `path`.
pub fn append_row<P, S>(path: P, row: &Arr1<S>) -> OResult<()>
where
    P: AsRef<Path>,
    S: nd::Data<Elem = f64>,
{
    append_rows(path, &row.view().insert_axis(nd::Axis(0)))
}
