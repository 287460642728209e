use tq_core::{encode, json_to_toon, ToonError, ToonOptions, Value};

fn v(json: &str) -> Value {
    serde_json::from_str(json).unwrap()
}

fn enc(json: &str) -> String {
    encode(&v(json), &ToonOptions::default()).unwrap()
}

fn enc_with(json: &str, opts: ToonOptions) -> String {
    encode(&v(json), &opts).unwrap()
}

// ============================================================================
// Scalars
// ============================================================================

#[test]
fn encode_root_scalars() {
    assert_eq!(enc("null"), "null");
    assert_eq!(enc("true"), "true");
    assert_eq!(enc("false"), "false");
    assert_eq!(enc("42"), "42");
    assert_eq!(enc("-7"), "-7");
    assert_eq!(enc("3.14"), "3.14");
}

#[test]
fn encode_number_canonical_form() {
    assert_eq!(enc("1.0"), "1");
    assert_eq!(enc("1e21"), "1000000000000000000000");
    assert_eq!(enc("1.5e-7"), "0.00000015");
    assert_eq!(encode(&Value::Number(-0.0), &ToonOptions::default()).unwrap(), "0");
}

#[test]
fn encode_plain_string_unquoted() {
    assert_eq!(enc(r#""hello""#), "hello");
    assert_eq!(enc(r#""hello world""#), "hello world");
    assert_eq!(enc(r#""café""#), "café");
}

#[test]
fn encode_keyword_strings_quoted() {
    assert_eq!(enc(r#""true""#), r#""true""#);
    assert_eq!(enc(r#""false""#), r#""false""#);
    assert_eq!(enc(r#""null""#), r#""null""#);
}

#[test]
fn encode_keyword_case_variants_unquoted() {
    assert_eq!(enc(r#""True""#), "True");
    assert_eq!(enc(r#""NULL""#), "NULL");
}

#[test]
fn encode_numeric_strings_quoted() {
    assert_eq!(enc(r#""42""#), r#""42""#);
    assert_eq!(enc(r#""05""#), r#""05""#);
    assert_eq!(enc(r#""1e5""#), r#""1e5""#);
    assert_eq!(enc(r#""-1.5""#), r#""-1.5""#);
}

#[test]
fn encode_structural_strings_quoted() {
    assert_eq!(enc(r#""""#), r#""""#);
    assert_eq!(enc(r#"" padded""#), r#"" padded""#);
    assert_eq!(enc(r#""padded ""#), r#""padded ""#);
    assert_eq!(enc(r#""-item""#), r#""-item""#);
    assert_eq!(enc(r#""a:b""#), r#""a:b""#);
    assert_eq!(enc(r#""a,b""#), r#""a,b""#);
}

#[test]
fn encode_escapes_in_quoted_strings() {
    assert_eq!(enc(r#""line1\nline2""#), r#""line1\nline2""#);
    assert_eq!(enc(r#""tab\there""#), r#""tab\there""#);
    assert_eq!(enc(r#""say \"hi\"""#), r#""say \"hi\"""#);
    assert_eq!(enc(r#""back\\slash""#), r#""back\\slash""#);
}

// ============================================================================
// Objects
// ============================================================================

#[test]
fn encode_flat_object_sorted_keys() {
    assert_eq!(enc(r#"{"name":"Alice","age":30}"#), "age: 30\nname: Alice");
}

#[test]
fn encode_nested_object() {
    assert_eq!(
        enc(r#"{"user":{"name":"A","tags":[]}}"#),
        "user:\n  name: A\n  tags[0]:"
    );
}

#[test]
fn encode_empty_nested_object() {
    assert_eq!(enc(r#"{"meta":{},"x":1}"#), "meta:\nx: 1");
}

#[test]
fn encode_empty_root_object() {
    assert_eq!(enc("{}"), "");
}

#[test]
fn encode_key_quoting() {
    assert_eq!(
        enc(r#"{"my key":1,"a-b":2,"_ok.x":3}"#),
        "_ok.x: 3\n\"a-b\": 2\n\"my key\": 1"
    );
}

// ============================================================================
// Arrays
// ============================================================================

#[test]
fn encode_inline_primitive_array() {
    assert_eq!(enc(r#"{"tags":["admin","ops","dev"]}"#), "tags[3]: admin,ops,dev");
}

#[test]
fn encode_inline_mixed_scalars() {
    assert_eq!(
        enc(r#"{"xs":[1,"two",true,null,"3"]}"#),
        "xs[5]: 1,two,true,null,\"3\""
    );
}

#[test]
fn encode_empty_array() {
    assert_eq!(enc(r#"{"xs":[]}"#), "xs[0]:");
}

#[test]
fn encode_tabular_array() {
    assert_eq!(
        enc(r#"{"users":[{"id":1,"name":"Alice"},{"id":2,"name":"Bob"}]}"#),
        "users[2]{id,name}:\n  1,Alice\n  2,Bob"
    );
}

#[test]
fn encode_tabular_quotes_cells() {
    assert_eq!(
        enc(r#"{"rows":[{"a":"x,y","b":""}]}"#),
        "rows[1]{a,b}:\n  \"x,y\",\"\""
    );
}

#[test]
fn encode_non_uniform_objects_as_list() {
    assert_eq!(
        enc(r#"{"items":[{"a":1},{"b":2}]}"#),
        "items[2]:\n  - a: 1\n  - b: 2"
    );
}

#[test]
fn encode_objects_with_nested_values_as_list() {
    assert_eq!(
        enc(r#"{"xs":[{"id":1,"tags":["a","b"]}]}"#),
        "xs[1]:\n  - id: 1\n    tags[2]: a,b"
    );
}

#[test]
fn encode_list_item_nested_object_first() {
    assert_eq!(
        enc(r#"{"xs":[{"a":{"b":1},"c":2}]}"#),
        "xs[1]:\n  - a:\n      b: 1\n    c: 2"
    );
}

#[test]
fn encode_mixed_list() {
    assert_eq!(
        enc(r#"{"xs":[1,{"a":1},[2,3]]}"#),
        "xs[3]:\n  - 1\n  - a: 1\n  - [2]: 2,3"
    );
}

#[test]
fn encode_empty_object_list_item_is_bare_hyphen() {
    assert_eq!(enc(r#"{"xs":[{},1]}"#), "xs[2]:\n  -\n  - 1");
}

#[test]
fn encode_root_arrays() {
    assert_eq!(enc("[1,2]"), "[2]: 1,2");
    assert_eq!(enc("[]"), "[0]:");
    assert_eq!(enc(r#"[{"id":1},{"id":2}]"#), "[2]{id}:\n  1\n  2");
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn encode_with_indent_four() {
    let opts = ToonOptions {
        indent: 4,
        ..ToonOptions::default()
    };
    assert_eq!(enc_with(r#"{"a":{"b":1}}"#, opts), "a:\n    b: 1");
}

#[test]
fn encode_with_tabs() {
    let opts = ToonOptions {
        use_tab: true,
        ..ToonOptions::default()
    };
    assert_eq!(
        enc_with(r#"{"a":{"b":[{"x":1},{"y":2}]}}"#, opts),
        "a:\n\tb[2]:\n\t\t- x: 1\n\t\t- y: 2"
    );
    assert_eq!(
        enc_with(r#"{"xs":[{"a":1,"b":[1]}]}"#, opts),
        "xs[1]:\n\t- a: 1\n\t\tb[1]: 1"
    );
}

#[test]
fn encode_with_pipe_delimiter() {
    let opts = ToonOptions::with_delimiter('|');
    assert_eq!(enc_with(r#"{"xs":["a,b","c"]}"#, opts), "xs[2]: a,b|c");
    assert_eq!(enc_with(r#"{"xs":["a|b"]}"#, opts), "xs[1]: \"a|b\"");
    assert_eq!(
        enc_with(r#"{"r":[{"a":1,"b":2}]}"#, opts),
        "r[1]{a|b}:\n  1|2"
    );
}

#[test]
fn encode_with_tab_delimiter() {
    let opts = ToonOptions::with_delimiter('\t');
    assert_eq!(enc_with(r#"{"xs":["a","b c"]}"#, opts), "xs[2]: a\tb c");
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn encode_rejects_non_finite_numbers() {
    let opts = ToonOptions::default();
    for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = encode(&Value::Number(n), &opts).unwrap_err();
        assert!(matches!(err, ToonError::Encode(_)), "{err:?}");
    }
    let nested = Value::Array(vec![Value::from(1.0), Value::Number(f64::NAN)]);
    assert!(encode(&nested, &opts).is_err());
}

#[test]
fn encode_rejects_bad_options() {
    let zero_indent = ToonOptions {
        indent: 0,
        ..ToonOptions::default()
    };
    assert!(matches!(
        encode(&v("{}"), &zero_indent),
        Err(ToonError::Encode(_))
    ));
    assert!(matches!(
        encode(&v("{}"), &ToonOptions::with_delimiter('#')),
        Err(ToonError::Encode(_))
    ));
}

#[test]
fn encode_output_has_no_trailing_whitespace() {
    let toon = enc(r#"{"a":{"b":[{"c":1},{"d":[1,2]},{}],"e":""},"f":[]}"#);
    assert!(!toon.ends_with('\n'));
    for line in toon.lines() {
        assert_eq!(line, line.trim_end(), "trailing whitespace in {line:?}");
    }
}

// ============================================================================
// String convenience
// ============================================================================

#[test]
fn json_to_toon_converts() {
    let toon = json_to_toon(r#"{"name":"Alice","scores":[95,87,92]}"#, &ToonOptions::default()).unwrap();
    assert_eq!(toon, "name: Alice\nscores[3]: 95,87,92");
}

#[test]
fn json_to_toon_invalid_json() {
    let err = json_to_toon("{not json", &ToonOptions::default()).unwrap_err();
    assert!(matches!(err, ToonError::Json(_)));
}
