use std::sync::Arc;

use topk_query::ast::{
    BinaryOp, List, Literal, NaryOp, TernaryOp, UnaryOp, Vector, VectorDistanceOptions,
};
use topk_query::error::{Category, CoercionError, ExprError};
use topk_query::{
    Expr, MAX_NARY_OPERANDS, Operand, abs, all, any, field, fns, literal, max, min, not, r#match,
};

fn fields(n: usize) -> Vec<Expr> {
    (0..n).map(|i| field(format!("f{i}"))).collect()
}

// ============================================================================
// Structural equality
// ============================================================================

#[test]
fn test_field_equality() {
    assert_eq!(field("a"), field("a"));
    assert_ne!(field("a"), field("b"));
}

#[test]
fn test_field_never_equals_literal() {
    assert_ne!(field("a"), literal("a"));
}

#[test]
fn test_literal_equality() {
    assert_eq!(literal("a"), literal("a"));
    assert_ne!(literal("a"), literal("b"));
    assert_ne!(literal(1i32), literal(1i64));
}

#[test]
fn test_composite_equality() {
    let a = field("a").add(1).unwrap().mul(field("b")).unwrap();
    let b = field("a").add(1).unwrap().mul(field("b")).unwrap();
    let c = field("a").add(2).unwrap().mul(field("b")).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

// ============================================================================
// Immutability and sharing
// ============================================================================

#[test]
fn test_builders_return_new_nodes() {
    let rank = field("rank");
    let boosted = rank.clone().mul(2).unwrap();
    let shifted = rank.clone().add(1).unwrap();

    assert_eq!(rank, field("rank"));
    assert_ne!(boosted, shifted);
}

#[test]
fn test_children_are_shared() {
    let base = field("a").add(1).unwrap();
    let copy = base.clone();
    match (&base, &copy) {
        (Expr::Binary { left: l1, .. }, Expr::Binary { left: l2, .. }) => {
            assert!(Arc::ptr_eq(l1, l2));
        }
        _ => panic!("expected binary nodes"),
    }
}

// ============================================================================
// Operator shapes
// ============================================================================

#[test]
fn test_binary_shape() {
    let expr = field("year").lte(1950).unwrap();
    assert_eq!(
        expr,
        Expr::Binary {
            op: BinaryOp::Lte,
            left: Arc::new(field("year")),
            right: Arc::new(Expr::Literal(Literal::I32(1950))),
        }
    );
}

#[test]
fn test_unary_builders() {
    let cases = [
        (field("a").not(), UnaryOp::Not),
        (field("a").is_null(), UnaryOp::IsNull),
        (field("a").is_not_null(), UnaryOp::IsNotNull),
        (field("a").abs(), UnaryOp::Abs),
        (field("a").ln(), UnaryOp::Ln),
        (field("a").exp(), UnaryOp::Exp),
        (field("a").sqrt(), UnaryOp::Sqrt),
        (field("a").square(), UnaryOp::Square),
    ];
    for (expr, expected) in cases {
        assert!(matches!(expr, Expr::Unary { op, .. } if op == expected));
    }
}

#[test]
fn test_not_forms_agree() {
    assert_eq!(not(field("a")), field("a").not());
    assert_eq!(!field("a"), field("a").not());
    assert_eq!(abs(field("a")), field("a").abs());
}

#[test]
fn test_min_max_free_functions() {
    assert_eq!(min(field("a"), 1).unwrap(), field("a").min(1).unwrap());
    assert_eq!(max(field("a"), 1).unwrap(), field("a").max(1).unwrap());
    assert!(min(true, field("a")).is_err());
}

#[test]
fn test_min_max_accept_strings() {
    assert!(field("name").min("zzz").is_ok());
    assert!(field("name").max("aaa").is_ok());
    assert!(max("a", field("name")).is_ok());

    let err = field("name").min(true).unwrap_err();
    assert_eq!(err.category(), Some(Category::Boolean));
}

#[test]
fn test_in_is_dedicated_operator() {
    let expr = field("genre").is_in(List::string(["drama", "comedy"])).unwrap();
    assert!(matches!(expr, Expr::Binary { op: BinaryOp::In, .. }));
}

#[test]
fn test_match_all_accepts_string_lists_only() {
    assert!(field("text").match_all("love hate").is_ok());
    assert!(field("text").match_any(List::string(["a", "b"])).is_ok());

    let err = field("text").match_all(List::u32(vec![1])).unwrap_err();
    assert_eq!(err.category(), Some(Category::List));
}

#[test]
fn test_coalesce() {
    let expr = field("rating").coalesce(0).unwrap();
    assert!(matches!(expr, Expr::Binary { op: BinaryOp::Coalesce, .. }));
    assert!(field("rating").coalesce(true).is_err());
}

// ============================================================================
// Ternary
// ============================================================================

#[test]
fn test_choose_is_ternary() {
    let expr = field("a").gt(0).unwrap().choose("pos", Operand::null()).unwrap();
    match expr {
        Expr::Ternary { op, y, z, .. } => {
            assert_eq!(op, TernaryOp::Choose);
            assert_eq!(*y, literal("pos"));
            assert_eq!(*z, Expr::Literal(Literal::Null));
        }
        other => panic!("expected ternary, got {other:?}"),
    }
}

#[test]
fn test_choose_branches_coerced_independently() {
    let err = field("c").choose(1, f64::NAN).unwrap_err();
    assert_eq!(err.category(), Some(Category::NaN));
}

#[test]
fn test_boost_desugars_to_choose() {
    let condition = field("genre").eq("drama").unwrap();
    let boosted = field("score").boost(condition.clone(), 2.0).unwrap();
    let expected = field("score")
        .mul(condition.choose(2.0, 1).unwrap())
        .unwrap();
    assert_eq!(boosted, expected);
}

#[test]
fn test_boost_rejects_non_boolean_condition() {
    let err = field("score").boost(1, 2.0).unwrap_err();
    assert_eq!(err.category(), Some(Category::Integer));
}

#[test]
fn test_regexp_match() {
    let expr = field("title").regexp_match("^the", Some("i")).unwrap();
    match expr {
        Expr::Ternary { op, y, z, .. } => {
            assert_eq!(op, TernaryOp::RegexpMatch);
            assert_eq!(*y, literal("^the"));
            assert_eq!(*z, literal("i"));
        }
        other => panic!("expected ternary, got {other:?}"),
    }

    let expr = field("title").regexp_match("x", None).unwrap();
    assert!(matches!(expr, Expr::Ternary { ref z, .. } if **z == Expr::Literal(Literal::Null)));
}

#[test]
fn test_regexp_rejects_invalid_pattern() {
    let err = field("title").regexp_match("(", None).unwrap_err();
    assert!(matches!(err, ExprError::InvalidRegex { ref pattern, .. } if pattern == "("));
}

#[test]
fn test_regexp_rejects_unknown_flag() {
    let err = field("title").regexp_match("a", Some("iq")).unwrap_err();
    assert_eq!(err, ExprError::InvalidRegexFlag('q'));
}

// ============================================================================
// N-ary
// ============================================================================

#[test]
fn test_all_with_max_operands() {
    let expr = all(fields(MAX_NARY_OPERANDS)).unwrap();
    assert!(matches!(expr, Expr::Nary { op: NaryOp::All, ref exprs } if exprs.len() == 32));
}

#[test]
fn test_all_over_limit() {
    let err = all(fields(33)).unwrap_err();
    assert_eq!(
        err,
        ExprError::TooManyOperands {
            op: NaryOp::All,
            count: 33,
            max: 32,
        }
    );
}

#[test]
fn test_any_over_limit() {
    assert!(any(fields(32)).is_ok());
    assert!(matches!(
        any(fields(33)),
        Err(ExprError::TooManyOperands { op: NaryOp::Any, .. })
    ));
}

#[test]
fn test_nary_operands_must_be_boolean() {
    let err = any([Operand::from(field("a")), Operand::from(1)]).unwrap_err();
    assert!(matches!(
        err,
        ExprError::Coercion(CoercionError::Element { index: 1, .. })
    ));
    assert_eq!(err.category(), Some(Category::Integer));
}

// ============================================================================
// Text match and functions
// ============================================================================

#[test]
fn test_match_defaults() {
    let m = r#match("love");
    assert_eq!(m.field, None);
    assert_eq!(m.weight, 1.0);
    assert!(!m.all);
}

#[test]
fn test_match_composes_with_logic() {
    let expr = Expr::from(r#match("love").field("summary"))
        .or(r#match("hate").weight(2.0).all(true))
        .unwrap()
        .not();
    assert!(matches!(expr, Expr::Unary { op: UnaryOp::Not, .. }));
}

#[test]
fn test_function_operands() {
    let score = fns::vector_distance(
        "embedding",
        Vector::f32(vec![0.1, 0.2]),
        VectorDistanceOptions { skip_refine: true },
    )
    .add(fns::bm25_score())
    .unwrap();
    assert!(matches!(score, Expr::Binary { op: BinaryOp::Add, .. }));
}

#[test]
fn test_walk_visits_every_node() {
    let expr = all([
        field("a").eq(1).unwrap(),
        field("b").is_null(),
    ])
    .unwrap();
    let mut count = 0;
    expr.walk(&mut |_| count += 1);
    // nary, binary, field, literal, unary, field
    assert_eq!(count, 6);
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_render_expressions() {
    assert_eq!(field("a").add(1).unwrap().to_string(), r#"(field("a") + 1i32)"#);
    assert_eq!(field("a").is_null().to_string(), r#"field("a").is_null()"#);
    assert_eq!(field("a").sqrt().to_string(), r#"sqrt(field("a"))"#);
    assert_eq!(
        field("tags").contains("x").unwrap().to_string(),
        r#"field("tags").contains("x")"#
    );
    assert_eq!(
        all([field("a"), field("b")]).unwrap().to_string(),
        r#"all(field("a"), field("b"))"#
    );
}

#[test]
fn test_render_distinguishes_types() {
    assert_ne!(literal(1i32).to_string(), literal(1i64).to_string());
    assert_ne!(field("a").to_string(), literal("a").to_string());
}

#[test]
fn test_render_functions() {
    assert_eq!(fns::bm25_score().to_string(), "bm25_score()");
    assert_eq!(
        fns::semantic_similarity("title", "dogs").to_string(),
        r#"semantic_similarity("title", "dogs")"#
    );
}
