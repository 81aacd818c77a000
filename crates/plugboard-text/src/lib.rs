//! Plugboard Text - canonical textual form of signal values
//!
//! The wire-compatible contract for textual signal inspection and
//! injection tools: scalars as plain numeric tokens, a size-n vector as
//! `[n](x_1,...,x_n)`, an n-by-m matrix as `[n,m]((row_1),...,(row_n))`.
//! Parsing validates declared sizes against actual element counts.

mod error;
mod format;

pub use error::{Result, TextError};
pub use format::{
    matrix_to_text, parse_matrix, parse_typed, parse_value, parse_vector, value_to_text,
    vector_to_text,
};
