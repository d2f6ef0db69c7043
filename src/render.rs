//! Canonical text rendering.
//!
//! `Display` for expressions, stages and queries produces a compact,
//! builder-shaped notation. Two structurally equal trees always render to
//! the same text, and numeric literals carry their type suffix so that
//! `1i32` and `1i64` stay distinguishable.
//!
//! ```
//! use topk_query::{field, r#match, select};
//!
//! let expr = field("year").lte(1950).unwrap();
//! assert_eq!(expr.to_string(), r#"(field("year") <= 1950i32)"#);
//!
//! let m: topk_query::Expr = r#match("love").field("summary").into();
//! assert_eq!(m.to_string(), r#"match("love", field: "summary")"#);
//! ```

use std::fmt::{self, Display, Formatter};

use crate::ast::{
    BinaryOp, Expr, FunctionExpr, List, Literal, Matrix, MatrixType, Query, SparseVector, Stage,
    TermMatch, TernaryOp, UnaryOp, Vector, VectorQuery,
};

/// Escapes a string for inclusion between double quotes.
pub fn escape_string(s: &str) -> String {
    s.chars()
        .flat_map(|c| match c {
            '"' => vec!['\\', '"'],
            '\\' => vec!['\\', '\\'],
            '\n' => vec!['\\', 'n'],
            '\r' => vec!['\\', 'r'],
            '\t' => vec!['\\', 't'],
            c if c.is_control() => format!("\\u{:04x}", c as u32).chars().collect(),
            c => vec![c],
        })
        .collect()
}

struct Quoted<'a>(&'a str);

impl Display for Quoted<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", escape_string(self.0))
    }
}

fn join<T: Display>(f: &mut Formatter<'_>, items: impl IntoIterator<Item = T>) -> fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn bracketed<T: Display>(
    f: &mut Formatter<'_>,
    prefix: &str,
    items: impl IntoIterator<Item = T>,
) -> fmt::Result {
    write!(f, "{prefix}[")?;
    join(f, items)?;
    f.write_str("]")
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::I32(n) => write!(f, "{n}i32"),
            Literal::I64(n) => write!(f, "{n}i64"),
            Literal::U32(n) => write!(f, "{n}u32"),
            Literal::U64(n) => write!(f, "{n}u64"),
            Literal::F32(n) => write!(f, "{n}f32"),
            Literal::F64(n) => write!(f, "{n}f64"),
            Literal::String(s) => write!(f, "{}", Quoted(s)),
            Literal::Bytes(b) => bracketed(f, "bytes", b),
            Literal::Vector(v) => write!(f, "{v}"),
            Literal::SparseVector(v) => write!(f, "{v}"),
            Literal::List(l) => write!(f, "{l}"),
            Literal::Matrix(m) => write!(f, "{m}"),
        }
    }
}

impl Display for Vector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Vector::F32(v) => bracketed(f, "f32", v),
            Vector::U8(v) => bracketed(f, "u8", v),
            Vector::I8(v) => bracketed(f, "i8", v),
            Vector::Binary(v) => bracketed(f, "binary", v),
        }
    }
}

impl Display for SparseVector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (prefix, entries): (&str, Vec<String>) = match self {
            SparseVector::F32 { indices, values } => (
                "sparse_f32",
                indices.iter().zip(values).map(|(i, v)| format!("{i}: {v}")).collect(),
            ),
            SparseVector::U8 { indices, values } => (
                "sparse_u8",
                indices.iter().zip(values).map(|(i, v)| format!("{i}: {v}")).collect(),
            ),
        };
        write!(f, "{prefix}{{")?;
        join(f, entries)?;
        f.write_str("}")
    }
}

impl Display for List {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            List::U8(v) => bracketed(f, "list<u8>", v),
            List::U32(v) => bracketed(f, "list<u32>", v),
            List::U64(v) => bracketed(f, "list<u64>", v),
            List::I32(v) => bracketed(f, "list<i32>", v),
            List::I64(v) => bracketed(f, "list<i64>", v),
            List::F32(v) => bracketed(f, "list<f32>", v),
            List::F64(v) => bracketed(f, "list<f64>", v),
            List::String(v) => bracketed(f, "list<string>", v.iter().map(|s| Quoted(s))),
        }
    }
}

impl Display for Matrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let element = match self.matrix_type() {
            MatrixType::F32 => "f32",
            MatrixType::F16 => "f16",
            MatrixType::F8 => "f8",
            MatrixType::U8 => "u8",
            MatrixType::I8 => "i8",
        };
        let values = self.values().to_f32();
        let rows = values
            .chunks(self.num_cols().max(1) as usize)
            .map(|row| {
                let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                format!("[{}]", cells.join(", "))
            });
        bracketed(f, &format!("matrix<{element}>"), rows)
    }
}

impl Display for TermMatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "match({}", Quoted(&self.token))?;
        if let Some(field) = &self.field {
            write!(f, ", field: {}", Quoted(field))?;
        }
        if self.weight != 1.0 {
            write!(f, ", weight: {}", self.weight)?;
        }
        if self.all {
            f.write_str(", all: true")?;
        }
        f.write_str(")")
    }
}

impl Display for FunctionExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name())?;
        match self {
            FunctionExpr::Bm25Score => {}
            FunctionExpr::VectorDistance {
                field,
                query,
                skip_refine,
            } => {
                write!(f, "{}, ", Quoted(field))?;
                match query {
                    VectorQuery::Dense(v) => write!(f, "{v}")?,
                    VectorQuery::Sparse(v) => write!(f, "{v}")?,
                }
                if *skip_refine {
                    f.write_str(", skip_refine: true")?;
                }
            }
            FunctionExpr::MultiVectorDistance {
                field,
                query,
                candidates,
            } => {
                write!(f, "{}, {query}", Quoted(field))?;
                if let Some(n) = candidates {
                    write!(f, ", candidates: {n}")?;
                }
            }
            FunctionExpr::SemanticSimilarity { field, query } => {
                write!(f, "{}, {}", Quoted(field), Quoted(query))?;
            }
        }
        f.write_str(")")
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Field(name) => write!(f, "field({})", Quoted(name)),
            Expr::Literal(lit) => write!(f, "{lit}"),
            Expr::Function(func) => write!(f, "{func}"),
            Expr::Match(m) => write!(f, "{m}"),
            Expr::Unary { op, expr } => match op {
                UnaryOp::Not => write!(f, "!{expr}"),
                UnaryOp::IsNull | UnaryOp::IsNotNull => write!(f, "{expr}.{op}()"),
                _ => write!(f, "{op}({expr})"),
            },
            Expr::Binary { op, left, right } => match (op, op.symbol()) {
                (_, Some(symbol)) => write!(f, "({left} {symbol} {right})"),
                (BinaryOp::Min | BinaryOp::Max | BinaryOp::Pow, None) => {
                    write!(f, "{op}({left}, {right})")
                }
                _ => write!(f, "{left}.{op}({right})"),
            },
            Expr::Ternary { op, x, y, z } => match op {
                TernaryOp::Choose | TernaryOp::RegexpMatch => write!(f, "{x}.{op}({y}, {z})"),
            },
            Expr::Nary { op, exprs } => {
                write!(f, "{op}(")?;
                join(f, exprs)?;
                f.write_str(")")
            }
        }
    }
}

fn order(asc: bool) -> &'static str {
    if asc { "asc" } else { "desc" }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Select { exprs } => {
                f.write_str("select(")?;
                join(f, exprs.iter().map(|(name, expr)| format!("{name}: {expr}")))?;
                f.write_str(")")
            }
            Stage::Filter { expr } => write!(f, "filter({expr})"),
            Stage::Sort { expr, asc } => write!(f, "sort({expr}, {})", order(*asc)),
            Stage::Limit { k } => write!(f, "limit({k})"),
            Stage::TopK { expr, k, asc } => write!(f, "topk({expr}, {k}, {})", order(*asc)),
            Stage::Count => f.write_str("count()"),
            Stage::Rerank(options) => {
                let mut parts = Vec::new();
                if let Some(model) = &options.model {
                    parts.push(format!("model: {}", Quoted(model)));
                }
                if let Some(query) = &options.query {
                    parts.push(format!("query: {}", Quoted(query)));
                }
                if !options.fields.is_empty() {
                    let fields: Vec<String> =
                        options.fields.iter().map(|s| Quoted(s).to_string()).collect();
                    parts.push(format!("fields: [{}]", fields.join(", ")));
                }
                if let Some(n) = options.topk_multiple {
                    parts.push(format!("topk_multiple: {n}"));
                }
                write!(f, "rerank({})", parts.join(", "))
            }
        }
    }
}

/// One stage per line, continuation lines indented.
impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages().iter().enumerate() {
            if i > 0 {
                f.write_str("\n  .")?;
            }
            write!(f, "{stage}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("a\"b\\c\n"), "a\\\"b\\\\c\\n");
        assert_eq!(escape_string("\u{1}"), "\\u0001");
    }

    #[test]
    fn test_sparse_render() {
        let v = SparseVector::u8([(3, 1), (1, 2)]);
        assert_eq!(v.to_string(), "sparse_u8{1: 2, 3: 1}");
    }
}
