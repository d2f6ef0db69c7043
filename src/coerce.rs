//! Literal coercion.
//!
//! Builders accept an [`Operand`]: either an already-built expression or a
//! raw value. Each operator family accepts a fixed set of input categories
//! (see [`Expected`]); anything else is rejected with a [`CoercionError`]
//! naming the category that was received.
//!
//! A typed Rust value becomes the same literal that [`literal`](crate::literal)
//! would build, and a literal expression is checked exactly like the raw
//! value it wraps, so `field("a").add(1)` and `field("a").add(literal(1))`
//! produce equal trees and fail in the same cases.

use half::f16;
use float8::F8E4M3;

use crate::ast::{
    Expr, FunctionExpr, List, ListType, Literal, Matrix, MatrixType, MatrixValues, SparseVector,
    TermMatch, Vector, VectorQuery, VectorType, matrix_shape,
};
use crate::error::{Category, CoercionError, Expected};
use crate::value::Value;

/// Right-hand operand of a builder method.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Expr(Expr),
    Value(Value),
}

impl Operand {
    pub fn null() -> Self {
        Operand::Expr(Expr::Literal(Literal::Null))
    }
}

impl From<Expr> for Operand {
    fn from(e: Expr) -> Self {
        Operand::Expr(e)
    }
}

impl From<&Expr> for Operand {
    fn from(e: &Expr) -> Self {
        Operand::Expr(e.clone())
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

impl From<TermMatch> for Operand {
    fn from(m: TermMatch) -> Self {
        Operand::Expr(Expr::Match(m))
    }
}

impl From<FunctionExpr> for Operand {
    fn from(f: FunctionExpr) -> Self {
        Operand::Expr(Expr::Function(f))
    }
}

macro_rules! operand_from_literal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(v: $ty) -> Self {
                    Operand::Expr(Expr::Literal(Literal::from(v)))
                }
            }
        )*
    };
}

operand_from_literal!(
    Literal,
    bool,
    i32,
    i64,
    u32,
    u64,
    f32,
    f64,
    &str,
    String,
    Vector,
    SparseVector,
    List,
    Matrix,
);

/// Coerces an operand for an operator that accepts `expected`.
pub(crate) fn operand(op: Operand, expected: Expected) -> Result<Expr, CoercionError> {
    match op {
        Operand::Expr(Expr::Literal(lit)) => {
            check_literal(&lit, expected)?;
            Ok(Expr::Literal(lit))
        }
        Operand::Expr(expr) => Ok(expr),
        Operand::Value(value) => {
            let found = value.category();
            if !accepts(expected, found) {
                return Err(CoercionError::Unsupported { expected, found });
            }
            let lit = match (&value, expected) {
                (Value::Array(_), Expected::Text) => {
                    Literal::List(list(&value, Some(ListType::String))?)
                }
                _ => scalar(&value)?,
            };
            Ok(Expr::Literal(lit))
        }
    }
}

fn check_literal(lit: &Literal, expected: Expected) -> Result<(), CoercionError> {
    let found = lit.category();
    let ok = match (expected, lit) {
        (Expected::Text, Literal::List(l)) => l.element_type() == ListType::String,
        _ => accepts(expected, found),
    };
    if ok {
        Ok(())
    } else {
        Err(CoercionError::Unsupported { expected, found })
    }
}

fn accepts(expected: Expected, found: Category) -> bool {
    use Category::*;
    match expected {
        Expected::Numeric => matches!(found, Integer | Float),
        Expected::Boolish => matches!(found, Boolean),
        Expected::Stringy => matches!(found, String),
        Expected::Ordered => matches!(found, Integer | Float | String),
        Expected::Comparable => matches!(found, Integer | Float | String | Boolean | Null),
        Expected::Flexible => matches!(found, String | Integer | Float),
        Expected::Iterable | Expected::Text => matches!(found, String | List | Array),
        Expected::Scalar => !matches!(found, NaN | Infinity | Object),
        Expected::Bytes => matches!(found, Bytes | Array),
        Expected::Vector | Expected::List | Expected::Matrix => matches!(found, Array),
        Expected::SparseVector => matches!(found, Object),
    }
}

/// Converts any JSON-shaped value into its natural literal.
///
/// Integers become `i64`, floats `f64`, arrays an inferred typed list.
/// Objects and non-finite floats are rejected.
pub fn scalar(value: &Value) -> Result<Literal, CoercionError> {
    Ok(match value {
        Value::Null => Literal::Null,
        Value::Boolean(b) => Literal::Bool(*b),
        Value::Integer(n) => Literal::I64(*n),
        Value::Float(n) if n.is_finite() => Literal::F64(*n),
        Value::String(s) => Literal::String(s.clone()),
        Value::Bytes(b) => Literal::Bytes(b.clone()),
        Value::Array(_) => Literal::List(list(value, None)?),
        other => {
            return Err(CoercionError::Unsupported {
                expected: Expected::Scalar,
                found: other.category(),
            });
        }
    })
}

/// Byte buffer from raw bytes or a list of integers in `0..=255`.
pub fn bytes(value: &Value) -> Result<Vec<u8>, CoercionError> {
    match value {
        Value::Bytes(b) => Ok(b.clone()),
        Value::Array(items) => elements(items, |v| integer::<u8>(v, Expected::Bytes, "u8")),
        other => Err(unsupported(Expected::Bytes, other)),
    }
}

/// Dense vector of the given element type. Empty vectors are valid.
pub fn vector(value: &Value, element: VectorType) -> Result<Vector, CoercionError> {
    let items = match value {
        Value::Bytes(b) if matches!(element, VectorType::U8 | VectorType::Binary) => {
            return Ok(match element {
                VectorType::Binary => Vector::Binary(b.clone()),
                _ => Vector::U8(b.clone()),
            });
        }
        Value::Array(items) => items,
        other => return Err(unsupported(Expected::Vector, other)),
    };
    let e = Expected::Vector;
    Ok(match element {
        VectorType::F32 => Vector::F32(elements(items, |v| float32(v, e))?),
        VectorType::U8 => Vector::U8(elements(items, |v| integer(v, e, "u8"))?),
        VectorType::I8 => Vector::I8(elements(items, |v| integer(v, e, "i8"))?),
        VectorType::Binary => Vector::Binary(elements(items, |v| integer(v, e, "u8"))?),
    })
}

/// `f32` sparse vector from an object keyed by non-negative integer indices.
pub fn sparse_f32(value: &Value) -> Result<SparseVector, CoercionError> {
    Ok(SparseVector::f32(sparse_entries(value, |v| {
        float32(v, Expected::SparseVector)
    })?))
}

/// `u8` sparse vector from an object keyed by non-negative integer indices.
pub fn sparse_u8(value: &Value) -> Result<SparseVector, CoercionError> {
    Ok(SparseVector::u8(sparse_entries(value, |v| {
        integer(v, Expected::SparseVector, "u8")
    })?))
}

fn sparse_entries<T>(
    value: &Value,
    convert: impl Fn(&Value) -> Result<T, CoercionError>,
) -> Result<Vec<(u32, T)>, CoercionError> {
    let Value::Object(map) = value else {
        return Err(unsupported(Expected::SparseVector, value));
    };
    map.iter()
        .map(|(key, v)| {
            let index: u32 = key
                .parse()
                .map_err(|_| CoercionError::InvalidSparseIndex(key.clone()))?;
            let v = convert(v).map_err(|e| e.at(index as usize))?;
            Ok((index, v))
        })
        .collect()
}

/// Homogeneous list.
///
/// With `element` set, every item is converted to that type. Without it the
/// element type is inferred: all integers give `i64`, integers mixed with
/// floats give `f64`, strings give `string`. An empty untyped list is an
/// empty `f32` list.
pub fn list(value: &Value, element: Option<ListType>) -> Result<List, CoercionError> {
    let Value::Array(items) = value else {
        return Err(unsupported(Expected::List, value));
    };
    let element = match element {
        Some(element) => element,
        None => infer_list_type(items)?,
    };
    let e = Expected::List;
    Ok(match element {
        ListType::U8 => List::U8(elements(items, |v| integer(v, e, "u8"))?),
        ListType::U32 => List::U32(elements(items, |v| integer(v, e, "u32"))?),
        ListType::U64 => List::U64(elements(items, |v| integer(v, e, "u64"))?),
        ListType::I32 => List::I32(elements(items, |v| integer(v, e, "i32"))?),
        ListType::I64 => List::I64(elements(items, |v| integer(v, e, "i64"))?),
        ListType::F32 => List::F32(elements(items, |v| float32(v, e))?),
        ListType::F64 => List::F64(elements(items, |v| float64(v, e))?),
        ListType::String => List::String(elements(items, |v| match v {
            Value::String(s) => Ok(s.clone()),
            other => Err(unsupported(e, other)),
        })?),
    })
}

fn infer_list_type(items: &[Value]) -> Result<ListType, CoercionError> {
    // TODO: reject untyped empty lists instead of defaulting to f32
    let Some(first) = items.first() else {
        return Ok(ListType::F32);
    };
    let first = first.category();
    let mut element = match first {
        Category::Integer => ListType::I64,
        Category::Float => ListType::F64,
        Category::String => ListType::String,
        found => {
            return Err(CoercionError::Unsupported {
                expected: Expected::List,
                found,
            }
            .at(0));
        }
    };
    for (index, item) in items.iter().enumerate().skip(1) {
        match (element, item.category()) {
            (ListType::String, Category::String) => {}
            (ListType::I64 | ListType::F64, Category::Integer) => {}
            (ListType::I64 | ListType::F64, Category::Float) => element = ListType::F64,
            (_, found @ (Category::NaN | Category::Infinity)) => {
                return Err(CoercionError::Unsupported {
                    expected: Expected::List,
                    found,
                }
                .at(index));
            }
            (_, found) => {
                return Err(CoercionError::MixedList {
                    index,
                    first,
                    found,
                });
            }
        }
    }
    Ok(element)
}

/// Matrix from a non-empty list of equal-length numeric rows.
pub fn matrix(value: &Value, element: MatrixType) -> Result<Matrix, CoercionError> {
    let Value::Array(rows) = value else {
        return Err(unsupported(Expected::Matrix, value));
    };
    let rows = rows
        .iter()
        .enumerate()
        .map(|(i, row)| match row {
            Value::Array(items) => Ok(items.as_slice()),
            other => Err(unsupported(Expected::Matrix, other).at(i)),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let num_cols = matrix_shape(rows.iter().map(|r| r.len()))?;
    let values = matrix_values(element, rows.into_iter().flatten())?;
    Ok(Matrix::from_parts(num_cols, values))
}

pub(crate) fn matrix_values<'a>(
    element: MatrixType,
    items: impl Iterator<Item = &'a Value>,
) -> Result<MatrixValues, CoercionError> {
    let items: Vec<&Value> = items.collect();
    let e = Expected::Matrix;
    let collect = |f: &dyn Fn(&Value) -> Result<f32, CoercionError>| {
        items
            .iter()
            .enumerate()
            .map(|(i, v)| f(v).map_err(|err| err.at(i)))
            .collect::<Result<Vec<f32>, CoercionError>>()
    };
    Ok(match element {
        MatrixType::F32 => MatrixValues::F32(collect(&|v| float32(v, e))?),
        MatrixType::F16 => MatrixValues::F16(
            collect(&|v| bounded_float(v, e, f16::MAX.to_f32(), "f16"))?
                .into_iter()
                .map(f16::from_f32)
                .collect(),
        ),
        MatrixType::F8 => MatrixValues::F8(
            collect(&|v| bounded_float(v, e, F8_MAX, "f8"))?
                .into_iter()
                .map(F8E4M3::from_f32)
                .collect(),
        ),
        MatrixType::U8 => MatrixValues::U8(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| integer(v, e, "u8").map_err(|err| err.at(i)))
                .collect::<Result<_, _>>()?,
        ),
        MatrixType::I8 => MatrixValues::I8(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| integer(v, e, "i8").map_err(|err| err.at(i)))
                .collect::<Result<_, _>>()?,
        ),
    })
}

/// Query for [`vector_distance`](crate::fns::vector_distance): an array is a
/// dense `f32` vector, an object a sparse `f32` vector.
pub fn vector_query(value: &Value) -> Result<VectorQuery, CoercionError> {
    match value {
        Value::Array(_) => Ok(VectorQuery::Dense(vector(value, VectorType::F32)?)),
        Value::Object(_) => Ok(VectorQuery::Sparse(sparse_f32(value)?)),
        other => Err(unsupported(Expected::Vector, other)),
    }
}

/// Rejects non-finite floats anywhere in a literal payload. JSON has no
/// encoding for `NaN` or infinity.
pub(crate) fn finite_literal(lit: &Literal) -> Result<(), CoercionError> {
    match lit {
        Literal::F32(_) | Literal::F64(_) => match lit.category() {
            found @ (Category::NaN | Category::Infinity) => Err(CoercionError::Unsupported {
                expected: Expected::Scalar,
                found,
            }),
            _ => Ok(()),
        },
        Literal::Vector(v) => finite_vector(v),
        Literal::SparseVector(v) => finite_sparse(v),
        Literal::List(List::F32(v)) => finite(v.iter().map(|&x| f64::from(x)), Expected::List),
        Literal::List(List::F64(v)) => finite(v.iter().copied(), Expected::List),
        Literal::Matrix(m) => finite_matrix(m),
        _ => Ok(()),
    }
}

/// Same check for the vector and matrix arguments of scoring functions.
pub(crate) fn finite_function(f: &FunctionExpr) -> Result<(), CoercionError> {
    match f {
        FunctionExpr::VectorDistance {
            query: VectorQuery::Dense(v),
            ..
        } => finite_vector(v),
        FunctionExpr::VectorDistance {
            query: VectorQuery::Sparse(v),
            ..
        } => finite_sparse(v),
        FunctionExpr::MultiVectorDistance { query, .. } => finite_matrix(query),
        FunctionExpr::Bm25Score | FunctionExpr::SemanticSimilarity { .. } => Ok(()),
    }
}

fn finite_vector(v: &Vector) -> Result<(), CoercionError> {
    match v {
        Vector::F32(values) => finite(values.iter().map(|&x| f64::from(x)), Expected::Vector),
        Vector::U8(_) | Vector::I8(_) | Vector::Binary(_) => Ok(()),
    }
}

fn finite_sparse(v: &SparseVector) -> Result<(), CoercionError> {
    match v {
        SparseVector::F32 { values, .. } => {
            finite(values.iter().map(|&x| f64::from(x)), Expected::SparseVector)
        }
        SparseVector::U8 { .. } => Ok(()),
    }
}

fn finite_matrix(m: &Matrix) -> Result<(), CoercionError> {
    finite(m.values().to_f32().into_iter().map(f64::from), Expected::Matrix)
}

fn finite(values: impl IntoIterator<Item = f64>, expected: Expected) -> Result<(), CoercionError> {
    for (i, v) in values.into_iter().enumerate() {
        if !v.is_finite() {
            let found = if v.is_nan() {
                Category::NaN
            } else {
                Category::Infinity
            };
            return Err(CoercionError::Unsupported { expected, found }.at(i));
        }
    }
    Ok(())
}

/// Largest finite F8E4M3 value.
const F8_MAX: f32 = 448.0;

fn unsupported(expected: Expected, value: &Value) -> CoercionError {
    CoercionError::Unsupported {
        expected,
        found: value.category(),
    }
}

fn elements<T>(
    items: &[Value],
    convert: impl Fn(&Value) -> Result<T, CoercionError>,
) -> Result<Vec<T>, CoercionError> {
    items
        .iter()
        .enumerate()
        .map(|(i, v)| convert(v).map_err(|e| e.at(i)))
        .collect()
}

fn integer<T: TryFrom<i64>>(
    value: &Value,
    expected: Expected,
    target: &'static str,
) -> Result<T, CoercionError> {
    let n = match value {
        Value::Integer(n) => *n,
        Value::Float(f) if f.is_finite() => {
            if f.fract() != 0.0 {
                return Err(CoercionError::NotAnInteger { value: *f });
            }
            if *f < i64::MIN as f64 || *f >= i64::MAX as f64 {
                return Err(CoercionError::OutOfRange {
                    value: f.to_string(),
                    target,
                });
            }
            *f as i64
        }
        other => return Err(unsupported(expected, other)),
    };
    T::try_from(n).map_err(|_| CoercionError::OutOfRange {
        value: n.to_string(),
        target,
    })
}

fn float64(value: &Value, expected: Expected) -> Result<f64, CoercionError> {
    match value {
        Value::Integer(n) => Ok(*n as f64),
        Value::Float(f) if f.is_finite() => Ok(*f),
        other => Err(unsupported(expected, other)),
    }
}

fn float32(value: &Value, expected: Expected) -> Result<f32, CoercionError> {
    bounded_float(value, expected, f32::MAX, "f32")
}

fn bounded_float(
    value: &Value,
    expected: Expected,
    max: f32,
    target: &'static str,
) -> Result<f32, CoercionError> {
    let f = float64(value, expected)?;
    if f.abs() > max as f64 {
        return Err(CoercionError::OutOfRange {
            value: f.to_string(),
            target,
        });
    }
    Ok(f as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_accepts_whole_floats() {
        assert_eq!(integer::<u8>(&Value::Float(3.0), Expected::Bytes, "u8"), Ok(3));
        assert_eq!(
            integer::<u8>(&Value::Float(3.5), Expected::Bytes, "u8"),
            Err(CoercionError::NotAnInteger { value: 3.5 })
        );
    }

    #[test]
    fn test_float32_rejects_overflow() {
        let err = float32(&Value::Float(1e300), Expected::Vector).unwrap_err();
        assert!(matches!(err, CoercionError::OutOfRange { target: "f32", .. }));
    }

    #[test]
    fn test_text_operand_keeps_bare_string() {
        let expr = operand(Value::from("love").into(), Expected::Text).unwrap();
        assert_eq!(expr, Expr::Literal(Literal::String("love".into())));
    }
}
