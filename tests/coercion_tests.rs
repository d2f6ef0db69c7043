use topk_query::ast::{
    List, ListType, Literal, Matrix, MatrixType, SparseVector, Vector, VectorType,
};
use topk_query::coerce;
use topk_query::error::{Category, CoercionError, Expected};
use topk_query::{ExprError, Value, field, literal};

fn json(v: serde_json::Value) -> Value {
    Value::from(v)
}

fn category(result: Result<topk_query::Expr, ExprError>) -> Option<Category> {
    result.unwrap_err().category()
}

// ============================================================================
// Raw values and explicit literals
// ============================================================================

#[test]
fn test_raw_int_equals_literal() {
    assert_eq!(
        field("a").add(1).unwrap(),
        field("a").add(literal(1)).unwrap()
    );
}

#[test]
fn test_raw_float_equals_literal() {
    assert_eq!(
        field("a").mul(2.5).unwrap(),
        field("a").mul(literal(2.5)).unwrap()
    );
}

#[test]
fn test_raw_string_equals_literal() {
    assert_eq!(
        field("a").eq("x").unwrap(),
        field("a").eq(literal("x")).unwrap()
    );
}

#[test]
fn test_dynamic_value_coerces_to_natural_literal() {
    assert_eq!(
        field("a").add(Value::Integer(1)).unwrap(),
        field("a").add(literal(1i64)).unwrap()
    );
    assert_eq!(
        field("a").add(Value::Float(0.5)).unwrap(),
        field("a").add(literal(0.5f64)).unwrap()
    );
}

#[test]
fn test_coercion_is_deterministic() {
    let a = field("a").lte(json(serde_json::json!(1950))).unwrap();
    let b = field("a").lte(json(serde_json::json!(1950))).unwrap();
    assert_eq!(a, b);
}

// ============================================================================
// Numeric rejections
// ============================================================================

#[test]
fn test_numeric_rejects_boolean() {
    assert_eq!(category(field("a").add(true)), Some(Category::Boolean));
}

#[test]
fn test_numeric_rejects_nan() {
    assert_eq!(category(field("a").add(f64::NAN)), Some(Category::NaN));
}

#[test]
fn test_numeric_rejects_infinity() {
    assert_eq!(category(field("a").add(f64::INFINITY)), Some(Category::Infinity));
    assert_eq!(category(field("a").sub(f32::NEG_INFINITY)), Some(Category::Infinity));
}

#[test]
fn test_numeric_rejections_are_distinct() {
    let errors = [
        field("a").add(true).unwrap_err(),
        field("a").add(f64::NAN).unwrap_err(),
        field("a").add(f64::INFINITY).unwrap_err(),
    ];
    assert_ne!(errors[0], errors[1]);
    assert_ne!(errors[1], errors[2]);
    assert_ne!(errors[0].to_string(), errors[1].to_string());
    assert_ne!(errors[1].to_string(), errors[2].to_string());
}

#[test]
fn test_numeric_rejects_null_string_object() {
    assert_eq!(category(field("a").add(Value::Null)), Some(Category::Null));
    assert_eq!(category(field("a").add("1")), Some(Category::String));
    assert_eq!(
        category(field("a").add(json(serde_json::json!({"x": 1})))),
        Some(Category::Object)
    );
}

#[test]
fn test_wrapped_literal_is_checked_like_raw_value() {
    assert_eq!(
        field("a").add(literal(true)).unwrap_err(),
        field("a").add(true).unwrap_err()
    );
}

#[test]
fn test_error_names_expected_shape() {
    let err = field("a").add(true).unwrap_err();
    assert_eq!(
        err,
        ExprError::Coercion(CoercionError::Unsupported {
            expected: Expected::Numeric,
            found: Category::Boolean,
        })
    );
    assert_eq!(err.to_string(), "unsupported numeric operand: boolean");
}

// ============================================================================
// Operand categories
// ============================================================================

#[test]
fn test_logical_requires_boolean() {
    assert!(field("a").and(true).is_ok());
    assert!(field("a").and(field("b")).is_ok());
    assert_eq!(category(field("a").and(1)), Some(Category::Integer));
    assert_eq!(
        category(field("a").or(json(serde_json::json!({})))),
        Some(Category::Object)
    );
}

#[test]
fn test_contains_rejects_list_and_boolean() {
    assert_eq!(
        category(field("tags").contains(List::string(["a"]))),
        Some(Category::List)
    );
    assert_eq!(category(field("tags").contains(false)), Some(Category::Boolean));
    assert!(field("tags").contains("a").is_ok());
    assert!(field("tags").contains(1).is_ok());
}

#[test]
fn test_starts_with_requires_string() {
    assert!(field("title").starts_with("The").is_ok());
    assert_eq!(category(field("title").starts_with(1)), Some(Category::Integer));
}

#[test]
fn test_in_accepts_string_or_list() {
    assert!(field("a").is_in("abc").is_ok());
    assert!(field("a").is_in(List::u32(vec![1, 2])).is_ok());
    assert!(field("a").is_in(json(serde_json::json!(["x", "y"]))).is_ok());
    assert_eq!(category(field("a").is_in(1)), Some(Category::Integer));
}

#[test]
fn test_ordered_accepts_numbers_and_strings() {
    assert!(field("a").lt(1).is_ok());
    assert!(field("a").gt("m").is_ok());
    assert_eq!(category(field("a").gte(true)), Some(Category::Boolean));
}

#[test]
fn test_equality_accepts_null() {
    let expr = field("a").eq(Value::Null).unwrap();
    assert_eq!(expr, field("a").eq(literal(Literal::Null)).unwrap());
}

// ============================================================================
// Bytes and vectors
// ============================================================================

#[test]
fn test_bytes_from_integer_list() {
    let bytes = coerce::bytes(&json(serde_json::json!([0, 128, 255]))).unwrap();
    assert_eq!(bytes, vec![0, 128, 255]);
}

#[test]
fn test_bytes_out_of_range() {
    let err = coerce::bytes(&json(serde_json::json!([1, 256]))).unwrap_err();
    assert!(matches!(
        err,
        CoercionError::Element { index: 1, ref source }
            if matches!(**source, CoercionError::OutOfRange { target: "u8", .. })
    ));
}

#[test]
fn test_bytes_from_buffer() {
    assert_eq!(coerce::bytes(&Value::Bytes(vec![7])).unwrap(), vec![7]);
    assert!(coerce::bytes(&Value::from("abc")).is_err());
}

#[test]
fn test_vector_element_ranges() {
    let v = json(serde_json::json!([0, 255]));
    assert_eq!(coerce::vector(&v, VectorType::U8).unwrap(), Vector::u8(vec![0, 255]));
    assert!(coerce::vector(&json(serde_json::json!([256])), VectorType::U8).is_err());
    assert!(coerce::vector(&json(serde_json::json!([-1])), VectorType::U8).is_err());

    let v = json(serde_json::json!([-128, 127]));
    assert_eq!(coerce::vector(&v, VectorType::I8).unwrap(), Vector::i8(vec![-128, 127]));
    assert!(coerce::vector(&json(serde_json::json!([128])), VectorType::I8).is_err());
}

#[test]
fn test_vector_rejects_fractional_integers() {
    let err = coerce::vector(&json(serde_json::json!([1.5])), VectorType::U8).unwrap_err();
    assert!(matches!(
        err,
        CoercionError::Element { index: 0, ref source }
            if matches!(**source, CoercionError::NotAnInteger { .. })
    ));
}

#[test]
fn test_empty_vector_is_valid() {
    let v = coerce::vector(&json(serde_json::json!([])), VectorType::F32).unwrap();
    assert!(v.is_empty());
    assert_eq!(v.vector_type(), VectorType::F32);
}

#[test]
fn test_vector_query_shapes() {
    assert!(matches!(
        coerce::vector_query(&json(serde_json::json!([0.1, 0.2]))),
        Ok(topk_query::ast::VectorQuery::Dense(_))
    ));
    assert!(matches!(
        coerce::vector_query(&json(serde_json::json!({"3": 0.5}))),
        Ok(topk_query::ast::VectorQuery::Sparse(_))
    ));
    assert_eq!(
        coerce::vector_query(&Value::from("x")).unwrap_err().category(),
        Some(Category::String)
    );
}

// ============================================================================
// Sparse vectors
// ============================================================================

#[test]
fn test_sparse_from_object() {
    let v = coerce::sparse_f32(&json(serde_json::json!({"7": 1.0, "1": 0.5}))).unwrap();
    assert_eq!(v, SparseVector::f32([(1, 0.5), (7, 1.0)]));
}

#[test]
fn test_sparse_rejects_bad_keys() {
    let err = coerce::sparse_f32(&json(serde_json::json!({"-1": 1.0}))).unwrap_err();
    assert_eq!(err, CoercionError::InvalidSparseIndex("-1".into()));
    let err = coerce::sparse_u8(&json(serde_json::json!({"a": 1}))).unwrap_err();
    assert_eq!(err, CoercionError::InvalidSparseIndex("a".into()));
}

#[test]
fn test_sparse_rejects_bad_values() {
    let err = coerce::sparse_u8(&json(serde_json::json!({"2": 300}))).unwrap_err();
    assert!(matches!(err, CoercionError::Element { index: 2, .. }));
    let err = coerce::sparse_f32(&json(serde_json::json!({"2": "x"}))).unwrap_err();
    assert_eq!(err.category(), Some(Category::String));
}

#[test]
fn test_sparse_reports_errors_in_key_order() {
    for _ in 0..8 {
        let value = json(serde_json::json!({"2": "y", "1": "x", "3": "z"}));
        let err = coerce::sparse_f32(&value).unwrap_err();
        assert!(matches!(err, CoercionError::Element { index: 1, .. }));

        let value = json(serde_json::json!({"b": 1, "a": 2}));
        let err = coerce::sparse_u8(&value).unwrap_err();
        assert_eq!(err, CoercionError::InvalidSparseIndex("a".into()));
    }
}

#[test]
fn test_sparse_requires_object() {
    let err = coerce::sparse_f32(&json(serde_json::json!([1.0]))).unwrap_err();
    assert_eq!(err.category(), Some(Category::Array));
}

// ============================================================================
// Lists
// ============================================================================

#[test]
fn test_list_inference() {
    assert_eq!(
        coerce::list(&json(serde_json::json!([1, 2])), None).unwrap(),
        List::i64(vec![1, 2])
    );
    assert_eq!(
        coerce::list(&json(serde_json::json!([1, 2.5])), None).unwrap(),
        List::f64(vec![1.0, 2.5])
    );
    assert_eq!(
        coerce::list(&json(serde_json::json!(["a", "b"])), None).unwrap(),
        List::string(["a", "b"])
    );
}

#[test]
fn test_list_mixed_types() {
    let err = coerce::list(&json(serde_json::json!([1, "a"])), None).unwrap_err();
    assert_eq!(
        err,
        CoercionError::MixedList {
            index: 1,
            first: Category::Integer,
            found: Category::String,
        }
    );
}

#[test]
fn test_untyped_empty_list_is_f32() {
    let list = coerce::list(&json(serde_json::json!([])), None).unwrap();
    assert_eq!(list.element_type(), ListType::F32);
    assert!(list.is_empty());
}

#[test]
fn test_typed_empty_list() {
    let list = coerce::list(&json(serde_json::json!([])), Some(ListType::String)).unwrap();
    assert_eq!(list, List::empty(ListType::String));
}

#[test]
fn test_typed_list_range() {
    let err = coerce::list(&json(serde_json::json!([1, -1])), Some(ListType::U32)).unwrap_err();
    assert!(matches!(err, CoercionError::Element { index: 1, .. }));
}

#[test]
fn test_list_of_booleans_rejected() {
    let err = coerce::list(&json(serde_json::json!([true])), None).unwrap_err();
    assert_eq!(err.category(), Some(Category::Boolean));
}

// ============================================================================
// Matrices
// ============================================================================

#[test]
fn test_matrix_empty() {
    let err = coerce::matrix(&json(serde_json::json!([])), MatrixType::F32).unwrap_err();
    assert_eq!(err, CoercionError::EmptyMatrix);
    assert_eq!(Matrix::f32(vec![]).unwrap_err(), CoercionError::EmptyMatrix);
}

#[test]
fn test_matrix_empty_first_row() {
    let err = coerce::matrix(&json(serde_json::json!([[], [1, 2]])), MatrixType::F32).unwrap_err();
    assert_eq!(err, CoercionError::EmptyRow { row: 0 });
}

#[test]
fn test_matrix_row_length_mismatch() {
    let err = coerce::matrix(&json(serde_json::json!([[1, 2], [3]])), MatrixType::F32).unwrap_err();
    assert_eq!(
        err,
        CoercionError::RowLength {
            row: 1,
            len: 1,
            expected: 2
        }
    );
}

#[test]
fn test_matrix_later_empty_row() {
    let err = coerce::matrix(&json(serde_json::json!([[1, 2], [3, 4], []])), MatrixType::F32)
        .unwrap_err();
    assert_eq!(
        err,
        CoercionError::RowLength {
            row: 2,
            len: 0,
            expected: 2
        }
    );
}

#[test]
fn test_matrix_integer_elements() {
    let m = coerce::matrix(&json(serde_json::json!([[1, 2], [3, 4]])), MatrixType::U8).unwrap();
    assert_eq!(m.num_rows(), 2);
    assert_eq!(m.matrix_type(), MatrixType::U8);

    let err = coerce::matrix(&json(serde_json::json!([[1.5]])), MatrixType::U8).unwrap_err();
    assert!(matches!(
        err,
        CoercionError::Element { ref source, .. }
            if matches!(**source, CoercionError::NotAnInteger { .. })
    ));
    assert!(coerce::matrix(&json(serde_json::json!([[200]])), MatrixType::I8).is_err());
}

#[test]
fn test_matrix_reduced_precision() {
    let m = coerce::matrix(&json(serde_json::json!([[0.5, 1.0]])), MatrixType::F16).unwrap();
    assert_eq!(m.values().to_f32(), vec![0.5, 1.0]);

    let err = coerce::matrix(&json(serde_json::json!([[1000.0]])), MatrixType::F8).unwrap_err();
    assert!(matches!(
        err,
        CoercionError::Element { ref source, .. }
            if matches!(**source, CoercionError::OutOfRange { target: "f8", .. })
    ));
}

#[test]
fn test_matrix_rows_must_be_arrays() {
    let err = coerce::matrix(&json(serde_json::json!([1, 2])), MatrixType::F32).unwrap_err();
    assert!(matches!(err, CoercionError::Element { index: 0, .. }));
    assert_eq!(err.category(), Some(Category::Integer));
}

// ============================================================================
// Scalars
// ============================================================================

#[test]
fn test_scalar_from_json() {
    assert_eq!(coerce::scalar(&json(serde_json::json!(null))).unwrap(), Literal::Null);
    assert_eq!(coerce::scalar(&json(serde_json::json!(true))).unwrap(), Literal::Bool(true));
    assert_eq!(coerce::scalar(&json(serde_json::json!(3))).unwrap(), Literal::I64(3));
    assert_eq!(coerce::scalar(&json(serde_json::json!("s"))).unwrap(), Literal::String("s".into()));
    assert!(coerce::scalar(&json(serde_json::json!({"a": 1}))).is_err());
    assert!(coerce::scalar(&Value::Float(f64::NAN)).is_err());
}
