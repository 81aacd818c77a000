//! Dynamic value types carried by signals and command arguments

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag of a [`Value`]
///
/// Every signal and every command parameter declares one of these at
/// construction; wiring and dispatch compare tags, never payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Boolean value
    Bool,
    /// Integer value (for counts, indices, enum-like parameters)
    Int,
    /// Double-precision floating point value
    Scalar,
    /// String value
    Text,
    /// Column vector of floats
    Vector,
    /// Dense matrix of floats
    Matrix,
}

impl ValueType {
    /// Get the lowercase name of this type
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Scalar => "scalar",
            ValueType::Text => "text",
            ValueType::Vector => "vector",
            ValueType::Matrix => "matrix",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A dynamic value flowing through the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Scalar(f64),
    /// String value
    Text(String),
    /// Column vector of floats
    Vector(DVector<f64>),
    /// Dense matrix of floats
    Matrix(DMatrix<f64>),
}

impl Value {
    /// Get the type tag of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Scalar(_) => ValueType::Scalar,
            Value::Text(_) => ValueType::Text,
            Value::Vector(_) => ValueType::Vector,
            Value::Matrix(_) => ValueType::Matrix,
        }
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        self.value_type().name()
    }

    /// Try to get this value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as a float (integers are widened)
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(x) => Some(*x),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as a string
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a vector
    pub fn as_vector(&self) -> Option<&DVector<f64>> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get this value as a matrix
    pub fn as_matrix(&self) -> Option<&DMatrix<f64>> {
        match self {
            Value::Matrix(m) => Some(m),
            _ => None,
        }
    }

    /// Fit this value to a declared type
    ///
    /// Returns the value unchanged when the tags agree. An `Int` is widened
    /// to `Scalar` when a scalar is declared; every other cross-tag
    /// combination yields `None`.
    pub fn coerce_to(self, ty: ValueType) -> Option<Value> {
        if self.value_type() == ty {
            return Some(self);
        }
        match (self, ty) {
            (Value::Int(i), ValueType::Scalar) => Some(Value::Scalar(i as f64)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Scalar(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "\"{}\"", s),
            Value::Vector(v) => {
                write!(f, "[")?;
                for (i, x) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", x)?;
                }
                write!(f, "]")
            }
            Value::Matrix(m) => {
                write!(f, "[")?;
                for r in 0..m.nrows() {
                    if r > 0 {
                        write!(f, "; ")?;
                    }
                    for c in 0..m.ncols() {
                        if c > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", m[(r, c)])?;
                    }
                }
                write!(f, "]")
            }
        }
    }
}

// Convenient From implementations
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Scalar(x)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Scalar(x as f64)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<DVector<f64>> for Value {
    fn from(v: DVector<f64>) -> Self {
        Value::Vector(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Vector(DVector::from_vec(v))
    }
}

impl From<DMatrix<f64>> for Value {
    fn from(m: DMatrix<f64>) -> Self {
        Value::Matrix(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_types() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(42).as_int(), Some(42));
        assert_eq!(Value::Scalar(3.25).as_scalar(), Some(3.25));
        assert_eq!(Value::Int(42).as_scalar(), Some(42.0));
        assert_eq!(Value::Text("hello".into()).as_text(), Some("hello"));
        assert_eq!(Value::Scalar(1.0).type_name(), "scalar");
    }

    #[test]
    fn test_value_coercion() {
        assert_eq!(
            Value::Int(2).coerce_to(ValueType::Scalar),
            Some(Value::Scalar(2.0))
        );
        assert_eq!(Value::Int(2).coerce_to(ValueType::Int), Some(Value::Int(2)));
        assert_eq!(Value::Scalar(2.0).coerce_to(ValueType::Int), None);
        assert_eq!(Value::Bool(true).coerce_to(ValueType::Scalar), None);
    }

    #[test]
    fn test_value_from() {
        let _: Value = true.into();
        let _: Value = 42i64.into();
        let _: Value = 2.5f64.into();
        let _: Value = "hello".into();
        let v: Value = vec![1.0, 2.0, 3.0].into();
        assert_eq!(v.value_type(), ValueType::Vector);
    }
}
