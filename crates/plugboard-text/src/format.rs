//! Printers and parsers for the canonical value grammar
//!
//! The wire grammar, one form per tag:
//! - scalar / int / bool: a plain token (`2.5`, `42`, `true`)
//! - size-n vector: `[n](x_1,x_2,...,x_n)`
//! - n-by-m matrix: `[n,m]((row_1),...,(row_n))`, each row m floats
//!
//! Declared sizes are validated against the actual element counts; any
//! disagreement fails with [`TextError::FormatSizeMismatch`].

use nalgebra::{DMatrix, DVector};
use plugboard_core::{Value, ValueType};

use crate::error::{Result, TextError};

/// Print a float so that it parses back as a scalar, never as an int
fn float_token(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 {
        format!("{:.1}", x)
    } else {
        x.to_string()
    }
}

/// Render a value in its canonical text form
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Scalar(x) => float_token(*x),
        Value::Text(s) => s.clone(),
        Value::Vector(v) => vector_to_text(v),
        Value::Matrix(m) => matrix_to_text(m),
    }
}

/// Render a vector as `[n](x_1,...,x_n)`
pub fn vector_to_text(v: &DVector<f64>) -> String {
    let elements: Vec<String> = v.iter().map(|x| float_token(*x)).collect();
    format!("[{}]({})", v.len(), elements.join(","))
}

/// Render a matrix as `[n,m]((row_1),...,(row_n))`
pub fn matrix_to_text(m: &DMatrix<f64>) -> String {
    let rows: Vec<String> = (0..m.nrows())
        .map(|r| {
            let row: Vec<String> = (0..m.ncols()).map(|c| float_token(m[(r, c)])).collect();
            format!("({})", row.join(","))
        })
        .collect();
    format!("[{},{}]({})", m.nrows(), m.ncols(), rows.join(","))
}

fn malformed(text: &str) -> TextError {
    TextError::Malformed(text.to_string())
}

/// Split `[size](body)` into its size and body parts
fn split_sized(text: &str) -> Result<(&str, &str)> {
    let trimmed = text.trim();
    let rest = trimmed.strip_prefix('[').ok_or_else(|| malformed(text))?;
    let (size, rest) = rest.split_once(']').ok_or_else(|| malformed(text))?;
    let body = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(|| malformed(text))?;
    Ok((size, body))
}

fn parse_float(token: &str, text: &str) -> Result<f64> {
    token.trim().parse::<f64>().map_err(|_| malformed(text))
}

/// Parse a vector from `[n](x_1,...,x_n)`, validating the declared size
pub fn parse_vector(text: &str) -> Result<DVector<f64>> {
    let (size, body) = split_sized(text)?;
    let expected: usize = size.trim().parse().map_err(|_| malformed(text))?;
    let elements: Vec<f64> = if body.trim().is_empty() {
        Vec::new()
    } else {
        body.split(',')
            .map(|token| parse_float(token, text))
            .collect::<Result<_>>()?
    };
    if elements.len() != expected {
        return Err(TextError::FormatSizeMismatch {
            expected,
            actual: elements.len(),
        });
    }
    Ok(DVector::from_vec(elements))
}

/// Parse a matrix from `[n,m]((row_1),...,(row_n))`, validating both sizes
pub fn parse_matrix(text: &str) -> Result<DMatrix<f64>> {
    let (size, body) = split_sized(text)?;
    let (rows_txt, cols_txt) = size.split_once(',').ok_or_else(|| malformed(text))?;
    let nrows: usize = rows_txt.trim().parse().map_err(|_| malformed(text))?;
    let ncols: usize = cols_txt.trim().parse().map_err(|_| malformed(text))?;

    let body: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    let mut data = Vec::with_capacity(nrows * ncols);
    let mut actual_rows = 0usize;
    if !body.is_empty() {
        let inner = body
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(|| malformed(text))?;
        for row in inner.split("),(") {
            actual_rows += 1;
            let mut actual_cols = 0usize;
            if !row.is_empty() {
                for token in row.split(',') {
                    data.push(parse_float(token, text)?);
                    actual_cols += 1;
                }
            }
            if actual_cols != ncols {
                return Err(TextError::FormatSizeMismatch {
                    expected: ncols,
                    actual: actual_cols,
                });
            }
        }
    }
    if actual_rows != nrows {
        return Err(TextError::FormatSizeMismatch {
            expected: nrows,
            actual: actual_rows,
        });
    }
    Ok(DMatrix::from_row_slice(nrows, ncols, &data))
}

/// Parse text into a value of the declared type
pub fn parse_typed(text: &str, ty: ValueType) -> Result<Value> {
    let trimmed = text.trim();
    match ty {
        ValueType::Bool => match trimmed {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(malformed(text)),
        },
        ValueType::Int => trimmed
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| malformed(text)),
        ValueType::Scalar => trimmed
            .parse::<f64>()
            .map(Value::Scalar)
            .map_err(|_| malformed(text)),
        ValueType::Text => Ok(Value::Text(text.to_string())),
        ValueType::Vector => parse_vector(text).map(Value::Vector),
        ValueType::Matrix => parse_matrix(text).map(Value::Matrix),
    }
}

/// Parse text into a value, guessing the type tag from the shape
///
/// Sized forms become vectors or matrices, `true`/`false` a bool, integer
/// tokens an int, other numeric tokens a scalar; anything else is text.
pub fn parse_value(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    if trimmed.starts_with('[') {
        let ty = match trimmed.split_once(']') {
            Some((size, _)) if size.contains(',') => ValueType::Matrix,
            _ => ValueType::Vector,
        };
        return parse_typed(trimmed, ty);
    }
    if trimmed == "true" || trimmed == "false" {
        return parse_typed(trimmed, ValueType::Bool);
    }
    if trimmed.parse::<i64>().is_ok() {
        return parse_typed(trimmed, ValueType::Int);
    }
    if trimmed.parse::<f64>().is_ok() {
        return parse_typed(trimmed, ValueType::Scalar);
    }
    Ok(Value::Text(text.to_string()))
}
