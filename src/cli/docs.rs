//! Documentation content for the topkq CLI

use super::CliError;

/// Available documentation categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocCategory {
    Expressions,
    Literals,
    Stages,
    Functions,
    Wire,
}

impl DocCategory {
    /// Parse category name from string
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "expressions" | "expression" | "expr" | "operators" | "ops" => Some(Self::Expressions),
            "literals" | "literal" | "types" | "coercion" => Some(Self::Literals),
            "stages" | "stage" | "pipeline" | "pipelines" => Some(Self::Stages),
            "functions" | "function" | "fns" | "scoring" => Some(Self::Functions),
            "wire" | "json" | "payload" => Some(Self::Wire),
            _ => None,
        }
    }
}

/// Get the docs overview (category listing)
pub fn get_docs_overview() -> &'static str {
    r#"TOPK QUERY DOCUMENTATION

A query is a pipeline of stages built from typed expressions. Pipelines are
validated when finalized and sent to the engine as a JSON wire payload.

DOCUMENTATION CATEGORIES

  expressions       Fields, operators, text match, all/any
  literals          Literal types and how raw values are coerced
  stages            select, filter, sort, limit, topk, count, rerank
  functions         bm25_score, vector_distance, multi_vector_distance, semantic_similarity
  wire              JSON payload accepted by 'topkq check'

QUICK REFERENCE

  field("title")                   Field reference
  field("year").lte(1950)          Comparison, raw value coerced
  match("love", field: "summary")  Text match
  all(e1, e2, ...)                 Conjunction, at most 32 operands
  topk(expr, k, asc|desc)          Ordered collector

Run 'topkq doc <category>' for detailed documentation.
"#
}

/// Get documentation for a specific category
pub fn get_doc_category(name: &str) -> Result<&'static str, CliError> {
    match DocCategory::from_name(name) {
        Some(DocCategory::Expressions) => Ok(EXPRESSIONS_DOC),
        Some(DocCategory::Literals) => Ok(LITERALS_DOC),
        Some(DocCategory::Stages) => Ok(STAGES_DOC),
        Some(DocCategory::Functions) => Ok(FUNCTIONS_DOC),
        Some(DocCategory::Wire) => Ok(WIRE_DOC),
        None => Err(CliError::UnknownCategory(name.to_string())),
    }
}

const EXPRESSIONS_DOC: &str = r#"EXPRESSIONS - Fields, Operators, and Text Match

FIELD REFERENCE
  field("name")
    Reference to a document field. `_id` is the reserved document id.

LOGICAL OPERATORS
  .and(x)  .or(x)  .not()  all(...)  any(...)

  Constraints:
    - Operands must be boolean expressions or boolean literals
    - all/any accept at most 32 operands; more is a construction error

COMPARISON OPERATORS
  .eq(x)  .ne(x)       numbers, strings, booleans, null
  .lt(x)  .lte(x)      numbers or strings
  .gt(x)  .gte(x)
  .min(x)  .max(x)

ARITHMETIC OPERATORS
  .add(x)  .sub(x)  .mul(x)  .div(x)  .pow(x)
  .coalesce(default)
  .abs()  .sqrt()  .square()  .exp()  .ln()

  Constraints:
    - Raw operands must be finite numbers
    - Booleans, null, NaN and infinity are rejected with distinct errors

STRING AND COLLECTION OPERATORS
  .starts_with("prefix")
  .contains(x)           x is a string or a number
  .is_in(collection)     collection is a string or a list
  .regexp_match("pattern", flags)   flags drawn from i, m, s, x, U
  .match_all(tokens)     tokens is a string or a list of strings
  .match_any(tokens)

CONDITIONAL
  cond.choose(then, else)
  expr.boost(cond, factor)    expr * cond.choose(factor, 1)

TEXT MATCH
  match("token", field: "summary", weight: 2.0, all: true)
    Without a field, the token is matched against every text-indexed field.
"#;

const LITERALS_DOC: &str = r#"LITERALS - Types and Coercion

SCALARS
  null, bool, i32, i64, u32, u64, f32, f64, string

  Raw JSON values coerce to their natural literal:
    1       -> i64
    1.5     -> f64
    "a"     -> string
    [1, 2]  -> list<i64>

BYTES
  A byte buffer or a list of integers in 0..=255.

VECTORS
  f32, u8 (0..=255), i8 (-128..=127), binary. Empty vectors are valid.

SPARSE VECTORS
  f32 or u8 values keyed by non-negative 32-bit indices:
    {"1": 0.5, "7": 1.0}

LISTS
  Homogeneous. Integers mixed with floats become f64; any other mix is an
  error. An untyped empty list is an empty f32 list.

MATRICES
  f32, f16, f8, u8, i8. A non-empty list of equal-length rows.

  Errors name the offending row:
    []            cannot create matrix from empty list
    [[], [1, 2]]  row 0 is empty
    [[1, 2], [3]] row 1 has length 1, but expected 2

Try it:
  topkq literal '[1, 2.5]'
  topkq literal '[[1, 2], [3]]' --shape matrix
"#;

const STAGES_DOC: &str = r#"STAGES - Pipeline Composition

SELECT
  select(name: expr, ...)
    Adds projections. Consecutive selects merge; later names overwrite.

FILTER
  filter(expr)
    Keeps matching documents. Consecutive filters are ANDed together.

SORT
  sort(expr, asc|desc)
    Orders results. Needs a limit to bound them.

COLLECTORS
  limit(k)               first k documents
  topk(expr, k, asc)     k documents ordered by expr
  count()                number of matching documents

RERANK
  rerank(model, query, fields, topk_multiple)
    Refines collected documents. Must follow limit or topk.

  Constraints:
    - Exactly one collector per query
    - At most one ordering: sort and topk cannot be combined
    - Only rerank may follow the collector
    - k must be greater than zero
"#;

const FUNCTIONS_DOC: &str = r#"FUNCTIONS - Scoring

bm25_score()
  Keyword relevance. The filter must contain a text match; the engine
  rejects the query otherwise.

vector_distance(field, query, skip_refine)
  Distance to a dense or sparse query vector. The field needs a vector index.

multi_vector_distance(field, matrix, candidates)
  Late-interaction distance to a query matrix.

semantic_similarity(field, "text")
  Similarity to a text query embedded by the engine.

Example:
  select(score: (vector_distance("embedding", f32[0.1, 0.2]) * bm25_score()))
    .filter(match("love"))
    .topk(field("score"), 10, desc)
"#;

const WIRE_DOC: &str = r#"WIRE - JSON Payload

Every node is an object with a "type" discriminator.

  {"stages": [
    {"type": "filter", "expr": {
      "type": "binary", "op": "lte",
      "left": {"type": "field", "name": "year"},
      "right": {"type": "literal", "value": {"type": "i32", "value": 1950}}}},
    {"type": "limit", "k": 10}
  ]}

STAGES     select, filter, sort, limit, topk, count, rerank
EXPRESSIONS field, literal, function, match, unary, binary, ternary, nary

'topkq check' decodes a payload, validates it like a built query and prints
its canonical text. 'topkq render' re-emits it normalized.
"#;
