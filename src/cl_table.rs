// File-backed lottery tables
//
// A table file holds a flattened n-dimensional probability array plus its
// shape. Loading happens once, before enumeration starts; shape validation
// failures are fatal with a cause the dispatcher can map to distinct exit
// codes.

use crate::cl_lottery::Lottery;
use log::error;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use std::process::exit;

/// Why a table could not be turned into a lottery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// File could not be read or parsed
    Load(String),

    /// A position dimension does not equal the graph size, or the data
    /// length does not match the shape
    DimensionMismatch,

    /// The shape does not describe `agents_num` positions plus one
    /// probability dimension
    AgentCountMismatch,
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::Load(e) => write!(f, "cannot load table: {}", e),
            TableError::DimensionMismatch => write!(f, "table dimension mismatch"),
            TableError::AgentCountMismatch => write!(f, "table agent count mismatch"),
        }
    }
}

/// Flattened probability table as stored on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct LotteryTable {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl LotteryTable {
    /// One-time blocking read of a YAML table file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let file = File::open(path).map_err(|e| TableError::Load(e.to_string()))?;
        serde_yaml::from_reader(file).map_err(|e| TableError::Load(e.to_string()))
    }

    /// Probability row for `seq`, or `None` when the tuple does not fit the
    /// table: wrong length, or a position outside the graph. Stream input can
    /// carry arbitrary tuples, so the check runs per call.
    fn row(&self, seq: &[usize], graph_size: usize, agents_num: usize, mode: usize) -> Option<&[f64]> {
        if seq.len() != agents_num {
            return None;
        }
        let mut start = 0usize;
        for &el in seq {
            let digit = if mode >= 1 { el - seq[0] } else { el };
            if digit >= graph_size {
                return None;
            }
            start = start * graph_size + digit;
        }
        start *= agents_num;
        self.data.get(start..start + agents_num)
    }
}

/// Build a lottery from a loaded table.
///
/// The shape must be `agents_num + 1` dimensions, all but the last equal to
/// `graph_size`, the last equal to `agents_num`, with matching data length.
/// A tuple indexes the table as mixed-radix digits base `graph_size`, taken
/// as absolute values or as offsets from the first element when `mode >= 1`,
/// selecting `agents_num` consecutive probabilities. Evaluating on a tuple
/// that does not fit the table aborts the run with the agent-count exit code.
pub fn table_lottery(
    graph_size: usize,
    agents_num: usize,
    table: LotteryTable,
    mode: usize,
) -> Result<Lottery, TableError> {
    if table.shape.len() != agents_num + 1 {
        return Err(TableError::AgentCountMismatch);
    }
    let last = table.shape.len() - 1;
    if table.shape[..last].iter().any(|&dim| dim != graph_size) {
        return Err(TableError::DimensionMismatch);
    }
    if table.shape[last] != agents_num {
        return Err(TableError::AgentCountMismatch);
    }
    if table.data.len() != table.shape.iter().product::<usize>() {
        return Err(TableError::DimensionMismatch);
    }
    Ok(Box::new(move |seq| {
        match table.row(seq, graph_size, agents_num, mode) {
            Some(row) => row.to_vec(),
            None => {
                error!(
                    "tuple {:?} does not fit a table for {} agents on {} vertices",
                    seq, agents_num, graph_size
                );
                exit(3)
            }
        }
    }))
}
