use std::collections::BTreeMap;

use float8::F8E4M3;
use half::f16;
use serde::{Deserialize, Serialize};

use crate::error::{Category, CoercionError};

/// Typed literal payload of an [`Expr::Literal`](crate::ast::Expr::Literal).
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Vector(Vector),
    SparseVector(SparseVector),
    List(List),
    Matrix(Matrix),
}

impl Literal {
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Literal::Bytes(bytes.into())
    }

    /// Runtime category of this literal. Non-finite floats report
    /// [`Category::NaN`] or [`Category::Infinity`].
    pub fn category(&self) -> Category {
        match self {
            Literal::Null => Category::Null,
            Literal::Bool(_) => Category::Boolean,
            Literal::I32(_) | Literal::I64(_) | Literal::U32(_) | Literal::U64(_) => {
                Category::Integer
            }
            Literal::F32(n) => float_category(*n as f64),
            Literal::F64(n) => float_category(*n),
            Literal::String(_) => Category::String,
            Literal::Bytes(_) => Category::Bytes,
            Literal::Vector(_) => Category::Vector,
            Literal::SparseVector(_) => Category::SparseVector,
            Literal::List(_) => Category::List,
            Literal::Matrix(_) => Category::Matrix,
        }
    }
}

fn float_category(n: f64) -> Category {
    if n.is_nan() {
        Category::NaN
    } else if n.is_infinite() {
        Category::Infinity
    } else {
        Category::Float
    }
}

macro_rules! literal_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Literal {
                fn from(v: $ty) -> Self {
                    Literal::$variant(v.into())
                }
            }
        )*
    };
}

literal_from! {
    bool => Bool,
    i32 => I32,
    i64 => I64,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    &str => String,
    Vector => Vector,
    SparseVector => SparseVector,
    List => List,
    Matrix => Matrix,
}

/// Dense vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum Vector {
    F32(Vec<f32>),
    U8(Vec<u8>),
    I8(Vec<i8>),
    /// Bit-packed binary vector
    Binary(Vec<u8>),
}

impl Vector {
    pub fn f32(values: impl Into<Vec<f32>>) -> Self {
        Vector::F32(values.into())
    }

    pub fn u8(values: impl Into<Vec<u8>>) -> Self {
        Vector::U8(values.into())
    }

    pub fn i8(values: impl Into<Vec<i8>>) -> Self {
        Vector::I8(values.into())
    }

    pub fn binary(values: impl Into<Vec<u8>>) -> Self {
        Vector::Binary(values.into())
    }

    pub fn len(&self) -> usize {
        match self {
            Vector::F32(v) => v.len(),
            Vector::U8(v) | Vector::Binary(v) => v.len(),
            Vector::I8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn vector_type(&self) -> VectorType {
        match self {
            Vector::F32(_) => VectorType::F32,
            Vector::U8(_) => VectorType::U8,
            Vector::I8(_) => VectorType::I8,
            Vector::Binary(_) => VectorType::Binary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorType {
    F32,
    U8,
    I8,
    Binary,
}

/// Sparse vector with indices kept in ascending order.
///
/// Built from index/value pairs; a repeated index keeps the last value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SparseVector {
    F32 { indices: Vec<u32>, values: Vec<f32> },
    U8 { indices: Vec<u32>, values: Vec<u8> },
}

impl SparseVector {
    pub fn f32(entries: impl IntoIterator<Item = (u32, f32)>) -> Self {
        let (indices, values) = sorted(entries);
        SparseVector::F32 { indices, values }
    }

    pub fn u8(entries: impl IntoIterator<Item = (u32, u8)>) -> Self {
        let (indices, values) = sorted(entries);
        SparseVector::U8 { indices, values }
    }

    pub fn indices(&self) -> &[u32] {
        match self {
            SparseVector::F32 { indices, .. } | SparseVector::U8 { indices, .. } => indices,
        }
    }

    pub fn len(&self) -> usize {
        self.indices().len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices().is_empty()
    }
}

fn sorted<T>(entries: impl IntoIterator<Item = (u32, T)>) -> (Vec<u32>, Vec<T>) {
    entries
        .into_iter()
        .collect::<BTreeMap<u32, T>>()
        .into_iter()
        .unzip()
}

/// Homogeneous typed list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum List {
    U8(Vec<u8>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    String(Vec<String>),
}

impl List {
    /// An empty list of the given element type.
    pub fn empty(element: ListType) -> Self {
        match element {
            ListType::U8 => List::U8(Vec::new()),
            ListType::U32 => List::U32(Vec::new()),
            ListType::U64 => List::U64(Vec::new()),
            ListType::I32 => List::I32(Vec::new()),
            ListType::I64 => List::I64(Vec::new()),
            ListType::F32 => List::F32(Vec::new()),
            ListType::F64 => List::F64(Vec::new()),
            ListType::String => List::String(Vec::new()),
        }
    }

    pub fn u32(values: impl Into<Vec<u32>>) -> Self {
        List::U32(values.into())
    }

    pub fn i64(values: impl Into<Vec<i64>>) -> Self {
        List::I64(values.into())
    }

    pub fn f32(values: impl Into<Vec<f32>>) -> Self {
        List::F32(values.into())
    }

    pub fn f64(values: impl Into<Vec<f64>>) -> Self {
        List::F64(values.into())
    }

    pub fn string<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        List::String(values.into_iter().map(Into::into).collect())
    }

    pub fn element_type(&self) -> ListType {
        match self {
            List::U8(_) => ListType::U8,
            List::U32(_) => ListType::U32,
            List::U64(_) => ListType::U64,
            List::I32(_) => ListType::I32,
            List::I64(_) => ListType::I64,
            List::F32(_) => ListType::F32,
            List::F64(_) => ListType::F64,
            List::String(_) => ListType::String,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            List::U8(v) => v.len(),
            List::U32(v) => v.len(),
            List::U64(v) => v.len(),
            List::I32(v) => v.len(),
            List::I64(v) => v.len(),
            List::F32(v) => v.len(),
            List::F64(v) => v.len(),
            List::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: Into<String>> From<Vec<S>> for List {
    fn from(values: Vec<S>) -> Self {
        List::string(values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListType {
    U8,
    U32,
    U64,
    I32,
    I64,
    F32,
    F64,
    String,
}

/// Row-major matrix with a fixed number of columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    num_cols: u32,
    values: MatrixValues,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatrixValues {
    F32(Vec<f32>),
    F16(Vec<f16>),
    F8(Vec<F8E4M3>),
    U8(Vec<u8>),
    I8(Vec<i8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixType {
    #[default]
    F32,
    F16,
    F8,
    U8,
    I8,
}

impl Matrix {
    pub fn f32(rows: Vec<Vec<f32>>) -> Result<Self, CoercionError> {
        let (num_cols, values) = flatten(rows)?;
        Ok(Matrix::from_parts(num_cols, MatrixValues::F32(values)))
    }

    pub fn f16(rows: Vec<Vec<f16>>) -> Result<Self, CoercionError> {
        let (num_cols, values) = flatten(rows)?;
        Ok(Matrix::from_parts(num_cols, MatrixValues::F16(values)))
    }

    pub fn f8(rows: Vec<Vec<F8E4M3>>) -> Result<Self, CoercionError> {
        let (num_cols, values) = flatten(rows)?;
        Ok(Matrix::from_parts(num_cols, MatrixValues::F8(values)))
    }

    pub fn u8(rows: Vec<Vec<u8>>) -> Result<Self, CoercionError> {
        let (num_cols, values) = flatten(rows)?;
        Ok(Matrix::from_parts(num_cols, MatrixValues::U8(values)))
    }

    pub fn i8(rows: Vec<Vec<i8>>) -> Result<Self, CoercionError> {
        let (num_cols, values) = flatten(rows)?;
        Ok(Matrix::from_parts(num_cols, MatrixValues::I8(values)))
    }

    /// Caller guarantees `values.len()` is a non-zero multiple of `num_cols`.
    pub(crate) fn from_parts(num_cols: u32, values: MatrixValues) -> Self {
        Matrix { num_cols, values }
    }

    pub fn num_cols(&self) -> u32 {
        self.num_cols
    }

    pub fn num_rows(&self) -> usize {
        self.values.len() / self.num_cols.max(1) as usize
    }

    pub fn values(&self) -> &MatrixValues {
        &self.values
    }

    pub fn matrix_type(&self) -> MatrixType {
        self.values.matrix_type()
    }
}

impl MatrixValues {
    pub fn len(&self) -> usize {
        match self {
            MatrixValues::F32(v) => v.len(),
            MatrixValues::F16(v) => v.len(),
            MatrixValues::F8(v) => v.len(),
            MatrixValues::U8(v) => v.len(),
            MatrixValues::I8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn matrix_type(&self) -> MatrixType {
        match self {
            MatrixValues::F32(_) => MatrixType::F32,
            MatrixValues::F16(_) => MatrixType::F16,
            MatrixValues::F8(_) => MatrixType::F8,
            MatrixValues::U8(_) => MatrixType::U8,
            MatrixValues::I8(_) => MatrixType::I8,
        }
    }

    /// Element values widened to `f32`.
    pub fn to_f32(&self) -> Vec<f32> {
        match self {
            MatrixValues::F32(v) => v.clone(),
            MatrixValues::F16(v) => v.iter().map(|x| x.to_f32()).collect(),
            MatrixValues::F8(v) => v.iter().map(|x| x.to_f32()).collect(),
            MatrixValues::U8(v) => v.iter().map(|&x| x as f32).collect(),
            MatrixValues::I8(v) => v.iter().map(|&x| x as f32).collect(),
        }
    }
}

/// Validates row shape and returns the column count.
///
/// The first row fixes the width; an empty first row is reported as
/// [`CoercionError::EmptyRow`], any later row of a different width as
/// [`CoercionError::RowLength`].
pub(crate) fn matrix_shape(
    row_lens: impl IntoIterator<Item = usize>,
) -> Result<u32, CoercionError> {
    let mut rows = row_lens.into_iter();
    let expected = rows.next().ok_or(CoercionError::EmptyMatrix)?;
    if expected == 0 {
        return Err(CoercionError::EmptyRow { row: 0 });
    }
    for (i, len) in rows.enumerate() {
        if len != expected {
            return Err(CoercionError::RowLength {
                row: i + 1,
                len,
                expected,
            });
        }
    }
    u32::try_from(expected).map_err(|_| CoercionError::OutOfRange {
        value: expected.to_string(),
        target: "matrix column count",
    })
}

fn flatten<T>(rows: Vec<Vec<T>>) -> Result<(u32, Vec<T>), CoercionError> {
    let num_cols = matrix_shape(rows.iter().map(Vec::len))?;
    Ok((num_cols, rows.into_iter().flatten().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_indices_sorted() {
        let a = SparseVector::f32([(7, 0.5), (1, 1.0)]);
        let b = SparseVector::f32([(1, 1.0), (7, 0.5)]);
        assert_eq!(a, b);
        assert_eq!(a.indices(), &[1, 7]);
    }

    #[test]
    fn test_matrix_shape_errors() {
        assert_eq!(matrix_shape([]), Err(CoercionError::EmptyMatrix));
        assert_eq!(matrix_shape([0, 2]), Err(CoercionError::EmptyRow { row: 0 }));
        assert_eq!(
            matrix_shape([2, 1]),
            Err(CoercionError::RowLength {
                row: 1,
                len: 1,
                expected: 2
            })
        );
        assert_eq!(matrix_shape([3, 3]), Ok(3));
    }

    #[test]
    fn test_matrix_dimensions() {
        let m = Matrix::f32(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(m.num_cols(), 3);
        assert_eq!(m.num_rows(), 2);
        assert_eq!(m.matrix_type(), MatrixType::F32);
    }

    #[test]
    fn test_float_literal_category() {
        assert_eq!(Literal::F64(f64::NAN).category(), Category::NaN);
        assert_eq!(Literal::F32(f32::INFINITY).category(), Category::Infinity);
        assert_eq!(Literal::F64(1.5).category(), Category::Float);
    }
}
