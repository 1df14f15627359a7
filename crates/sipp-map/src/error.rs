//! Map-construction error type.

use thiserror::Error;

/// Errors produced while building a map.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("map has no cells")]
    Empty,

    #[error("row {row} has {got} cells, expected {expected}")]
    RaggedRow { row: usize, expected: usize, got: usize },

    #[error("unknown map symbol {symbol:?} at row {row}, column {col}")]
    UnknownSymbol { row: usize, col: usize, symbol: char },

    #[error("cell ({row}, {col}) outside {rows}x{cols} grid")]
    OutOfBounds { row: usize, col: usize, rows: usize, cols: usize },

    #[error("{cells} cells exceed the location id space")]
    TooLarge { cells: usize },
}

pub type MapResult<T> = Result<T, MapError>;
