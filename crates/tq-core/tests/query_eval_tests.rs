use tq_core::{execute, QueryError, Value};

fn v(json: &str) -> Value {
    serde_json::from_str(json).unwrap()
}

/// Run `query` on JSON input and return the outputs as one JSON array value.
fn run(query: &str, input: &str) -> Value {
    let outputs = execute(query, &v(input))
        .unwrap_or_else(|e| panic!("query {query:?} failed: {e}"));
    Value::Array(outputs)
}

fn run_err(query: &str, input: &str) -> QueryError {
    match execute(query, &v(input)) {
        Err(err) => err,
        Ok(outputs) => panic!("expected {query:?} to fail, got {outputs:?}"),
    }
}

const USERS: &str = r#"{"users":[
    {"id":1,"name":"Alice","age":34,"role":"admin","active":true},
    {"id":2,"name":"Bob","age":27,"role":"dev","active":false},
    {"id":3,"name":"Cara","age":41,"role":"dev","active":true}
]}"#;

// ============================================================================
// Paths
// ============================================================================

#[test]
fn identity_returns_input() {
    assert_eq!(run(".", r#"{"a":1}"#), v(r#"[{"a":1}]"#));
}

#[test]
fn field_access_and_missing_field() {
    assert_eq!(run(".a", r#"{"a":1}"#), v("[1]"));
    assert_eq!(run(".missing", r#"{"a":1}"#), v("[null]"));
}

#[test]
fn field_on_non_object_is_type_error() {
    let err = run_err(".a", "[1,2]");
    assert!(matches!(err, QueryError::Type { .. }), "{err:?}");
    assert!(matches!(run_err(".a.b", r#"{"a":null}"#), QueryError::Type { .. }));
}

#[test]
fn index_positive_and_negative() {
    assert_eq!(run(".[0]", "[10,20,30]"), v("[10]"));
    assert_eq!(run(".[-1]", "[10,20,30]"), v("[30]"));
    assert_eq!(run(".[-3]", "[10,20,30]"), v("[10]"));
}

#[test]
fn index_out_of_range() {
    assert_eq!(
        run_err(".[3]", "[10,20,30]"),
        QueryError::IndexOutOfRange {
            index: 3,
            length: 3
        }
    );
    assert_eq!(
        run_err(".[-4]", "[10,20,30]"),
        QueryError::IndexOutOfRange {
            index: -4,
            length: 3
        }
    );
}

#[test]
fn index_on_object_is_type_error() {
    assert!(matches!(run_err(".[0]", r#"{"a":1}"#), QueryError::Type { .. }));
}

#[test]
fn iterate_array_and_object() {
    assert_eq!(run(".[]", "[1,2,3]"), v("[1,2,3]"));
    assert_eq!(run(".[]", r#"{"b":2,"a":1}"#), v("[1,2]"));
    assert_eq!(run(".[]", "[]"), v("[]"));
}

#[test]
fn select_on_field_of_iterated_scalar_is_type_error() {
    // `.[]` over an object yields its values; `.age` on the number 1 fails
    // instead of being filtered out.
    let err = run_err(".[] | select(.age > 100)", r#"{"age":1}"#);
    assert!(
        matches!(&err, QueryError::Type { operation, actual, .. }
            if operation == "field access .age" && actual == "number"),
        "{err:?}"
    );
    assert_eq!(run("select(.age > 100)", r#"{"age":1}"#), v("[]"));
}

#[test]
fn iterate_scalar_is_type_error() {
    assert!(matches!(run_err(".[]", "5"), QueryError::Type { .. }));
}

#[test]
fn nested_path() {
    assert_eq!(run(".users[1].name", USERS), v(r#"["Bob"]"#));
    assert_eq!(run(".users[].name", USERS), v(r#"["Alice","Bob","Cara"]"#));
}

// ============================================================================
// Pipes, select, comparisons
// ============================================================================

#[test]
fn pipe_flat_maps_streams() {
    assert_eq!(run(".[] | .[]", "[[1,2],[3]]"), v("[1,2,3]"));
}

#[test]
fn select_filters_stream() {
    assert_eq!(
        run(".users[] | select(.age > 30) | .name", USERS),
        v(r#"["Alice","Cara"]"#)
    );
}

#[test]
fn select_false_yields_nothing() {
    assert_eq!(run("select(false)", "1"), v("[]"));
    assert_eq!(run("select(.missing)", r#"{"a":1}"#), v("[]"));
}

#[test]
fn select_with_empty_condition_stream_is_false() {
    assert_eq!(run("select(.[])", "[]"), v("[]"));
}

#[test]
fn select_uses_first_condition_output() {
    assert_eq!(run("select(.[])", "[true,false]"), v("[[true,false]]"));
    assert_eq!(run("select(.[])", "[false,true]"), v("[]"));
}

#[test]
fn comparison_numeric() {
    assert_eq!(run(".[] | . >= 2", "[1,2,3]"), v("[false,true,true]"));
    assert_eq!(run(". == 1", "1.0"), v("[true]"));
}

#[test]
fn comparison_equality_by_string_representation() {
    assert_eq!(run(".role == \"admin\"", r#"{"role":"admin"}"#), v("[true]"));
    assert_eq!(run(".a != null", r#"{"a":null}"#), v("[false]"));
    assert_eq!(run(".a == true", r#"{"a":true}"#), v("[true]"));
}

#[test]
fn comparison_ordering_on_strings_is_type_error() {
    let err = run_err(".name > \"A\"", r#"{"name":"Bob"}"#);
    assert!(matches!(err, QueryError::Type { .. }), "{err:?}");
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn array_construct_collects_stream() {
    assert_eq!(
        run("[.users[] | select(.active == true) | .id]", USERS),
        v("[[1,3]]")
    );
    assert_eq!(run("[.[] | select(. > 5)]", "[1,2]"), v("[[]]"));
    assert_eq!(run("[]", "null"), v("[[]]"));
}

#[test]
fn array_construct_with_several_elements() {
    assert_eq!(run("[.a, .b, 3]", r#"{"a":1,"b":[2]}"#), v("[[1,[2],3]]"));
}

#[test]
fn object_construct_with_shorthand() {
    assert_eq!(
        run(".users[0] | {id, who: .name, \"is admin\": (.role == \"admin\")}", USERS),
        v(r#"[{"id":1,"who":"Alice","is admin":true}]"#)
    );
}

#[test]
fn object_construct_takes_first_output_or_null() {
    assert_eq!(
        run("{first: .[], none: (.[] | select(. > 9))}", "[1,2]"),
        v(r#"[{"first":1,"none":null}]"#)
    );
}

#[test]
fn literals() {
    assert_eq!(run("42", "null"), v("[42]"));
    assert_eq!(run("\"hi\"", "null"), v(r#"["hi"]"#));
    assert_eq!(run("null", "1"), v("[null]"));
}

// ============================================================================
// Conditionals and alternatives
// ============================================================================

#[test]
fn if_then_else() {
    assert_eq!(
        run(".users[] | if .age > 30 then \"senior\" else \"junior\" end", USERS),
        v(r#"["senior","junior","senior"]"#)
    );
}

#[test]
fn if_elif_else() {
    let query = ".[] | if . > 10 then \"big\" elif . > 5 then \"medium\" else \"small\" end";
    assert_eq!(run(query, "[1,7,20]"), v(r#"["small","medium","big"]"#));
}

#[test]
fn if_empty_condition_takes_else_branch() {
    assert_eq!(run("if .[] then 1 else 2 end", "[]"), v("[2]"));
}

#[test]
fn alternative_first_truthy() {
    assert_eq!(run("false // null // 3", "null"), v("[3]"));
    assert_eq!(run(".a // \"default\"", r#"{"a":0}"#), v("[0]"));
    assert_eq!(run(".a // \"default\"", r#"{}"#), v(r#"["default"]"#));
}

#[test]
fn alternative_all_falsy_returns_last() {
    assert_eq!(run("false // null", "null"), v("[null]"));
    assert_eq!(run("null // false", "null"), v("[false]"));
}

#[test]
fn alternative_keeps_only_truthy_outputs() {
    assert_eq!(run(".[] // 9", "[null,1,false,2]"), v("[1,2]"));
}

#[test]
fn alternative_propagates_errors() {
    assert!(matches!(run_err(".a // 1", "[1]"), QueryError::Type { .. }));
}

#[test]
fn pipe_binds_tighter_than_alternative() {
    assert_eq!(run(".a | .b // 5", r#"{"a":{"b":null}}"#), v("[5]"));
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn unknown_function() {
    assert_eq!(
        run_err("frobnicate", "null"),
        QueryError::UnknownFunction {
            name: "frobnicate".to_string()
        }
    );
}

#[test]
fn wrong_arity() {
    let err = run_err("length(1)", "[]");
    assert!(
        matches!(&err, QueryError::Arity { function, .. } if function == "length"),
        "{err:?}"
    );
    assert!(matches!(run_err("map", "[]"), QueryError::Arity { .. }));
    assert!(matches!(run_err("range(1;2;3;4)", "null"), QueryError::Arity { .. }));
}

#[test]
fn realistic_report_query() {
    let query = "[.users[] | select(.active == true)] | sort_by(.age) | map({name, age}) | reverse";
    assert_eq!(
        run(query, USERS),
        v(r#"[[{"name":"Cara","age":41},{"name":"Alice","age":34}]]"#)
    );
}

#[test]
fn group_and_count() {
    let query = ".users | group_by(.role) | map({role: .[0].role, count: length})";
    assert_eq!(
        run(query, USERS),
        v(r#"[[{"role":"admin","count":1},{"role":"dev","count":2}]]"#)
    );
}
