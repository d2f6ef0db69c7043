//! Coerce JSON values into typed literals

use serde::de::DeserializeOwned;

use super::CliError;
use crate::ast::{Literal, MatrixType};
use crate::coerce;
use crate::value::Value;

/// Target shape of the literal command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LiteralShape {
    /// Natural literal of the value
    #[default]
    Auto,
    Bytes,
    Vector,
    Sparse,
    List,
    Matrix,
}

/// Options for the literal command
#[derive(Debug, Clone, Default)]
pub struct LiteralOptions {
    /// JSON value to coerce
    pub value: String,
    pub shape: LiteralShape,
    /// Element type, e.g. `u8` or `f16`
    pub element: Option<String>,
}

/// Coerce a JSON value the way the query builders do
pub fn execute_literal(options: &LiteralOptions) -> Result<Literal, CliError> {
    let json: serde_json::Value = serde_json::from_str(&options.value)?;
    let value = Value::from(json);
    let element = options.element.as_deref();

    let literal = match options.shape {
        LiteralShape::Auto => coerce::scalar(&value)?,
        LiteralShape::Bytes => Literal::Bytes(coerce::bytes(&value)?),
        LiteralShape::Vector => {
            let element = parse_element(element, "vector")?.unwrap_or(crate::ast::VectorType::F32);
            Literal::Vector(coerce::vector(&value, element)?)
        }
        LiteralShape::Sparse => match element.unwrap_or("f32") {
            "f32" => Literal::SparseVector(coerce::sparse_f32(&value)?),
            "u8" => Literal::SparseVector(coerce::sparse_u8(&value)?),
            other => {
                return Err(CliError::UnknownElement {
                    shape: "sparse vector",
                    element: other.to_string(),
                });
            }
        },
        LiteralShape::List => Literal::List(coerce::list(&value, parse_element(element, "list")?)?),
        LiteralShape::Matrix => {
            let element: MatrixType = parse_element(element, "matrix")?.unwrap_or_default();
            Literal::Matrix(coerce::matrix(&value, element)?)
        }
    };
    Ok(literal)
}

/// Element names share the wire spelling of the type enums.
fn parse_element<T: DeserializeOwned>(
    element: Option<&str>,
    shape: &'static str,
) -> Result<Option<T>, CliError> {
    element
        .map(|name| {
            serde_json::from_value(serde_json::Value::String(name.to_lowercase())).map_err(|_| {
                CliError::UnknownElement {
                    shape,
                    element: name.to_string(),
                }
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{List, Vector};

    fn run(value: &str, shape: LiteralShape, element: Option<&str>) -> Result<Literal, CliError> {
        execute_literal(&LiteralOptions {
            value: value.to_string(),
            shape,
            element: element.map(str::to_string),
        })
    }

    #[test]
    fn test_auto_list() {
        let lit = run("[1, 2.5]", LiteralShape::Auto, None).unwrap();
        assert_eq!(lit, Literal::List(List::f64(vec![1.0, 2.5])));
    }

    #[test]
    fn test_vector_element() {
        let lit = run("[1, 2]", LiteralShape::Vector, Some("u8")).unwrap();
        assert_eq!(lit, Literal::Vector(Vector::u8(vec![1, 2])));
    }

    #[test]
    fn test_unknown_element() {
        let err = run("[1]", LiteralShape::Vector, Some("u128")).unwrap_err();
        assert!(matches!(err, CliError::UnknownElement { shape: "vector", .. }));
    }
}
