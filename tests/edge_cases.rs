//! Edge Case Testing
//!
//! This module tests edge cases and boundary conditions of the projection
//! and rewriting core to ensure unusual templates and item shapes are
//! handled gracefully. Tests include:
//! - Placeholder-like text inside string literals
//! - Adjacent, repeated, and punctuation-bounded placeholders
//! - Unterminated literals
//! - Deeply nested item values and mutation isolation
//! - Hostile name lists

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use fireflow::{parse_name_list, project, project_one, rewrite, InputRecord};

fn item(value: Value) -> InputRecord {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other:?}"),
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

// ============================================================================
// Rewriter: literals
// ============================================================================

#[test]
fn test_multiple_literals_stay_opaque() {
    let known = names(&["id"]);
    let values = project_one(&item(json!({"id": 1})), &known);

    let result = rewrite(
        "SELECT ':a', ':b' FROM t WHERE id = :id AND tag = ':id'",
        &known,
        &values,
    )
    .unwrap();

    assert_eq!(result.sql, "SELECT ':a', ':b' FROM t WHERE id = ? AND tag = ':id'");
    assert_eq!(result.args, vec![json!(1)]);
}

#[test]
fn test_empty_literal() {
    let known = names(&["id"]);
    let values = project_one(&item(json!({"id": 1})), &known);

    let result = rewrite("SELECT '' FROM t WHERE id = :id", &known, &values).unwrap();
    assert_eq!(result.sql, "SELECT '' FROM t WHERE id = ?");
}

#[test]
fn test_unterminated_literal_swallows_trailing_placeholder() {
    let known = names(&["id"]);
    let values = project_one(&item(json!({"id": 1})), &known);

    // The opening quote never closes, so the rest of the template is
    // literal text and nothing binds.
    let result = rewrite("SELECT * FROM t WHERE a = 'x AND b = :id", &known, &values).unwrap();
    assert_eq!(result.sql, "SELECT * FROM t WHERE a = 'x AND b = :id");
    assert!(result.args.is_empty());
}

#[test]
fn test_literal_with_unicode_content() {
    let known = names(&["id"]);
    let values = project_one(&item(json!({"id": 1})), &known);

    let result =
        rewrite("SELECT * FROM t WHERE label = 'héllo :wörld' AND id = :id", &known, &values)
            .unwrap();
    assert_eq!(result.sql, "SELECT * FROM t WHERE label = 'héllo :wörld' AND id = ?");
}

// ============================================================================
// Rewriter: placeholder boundaries
// ============================================================================

#[test]
fn test_adjacent_placeholders() {
    let known = names(&["a", "b"]);
    let values = project_one(&item(json!({"a": 1, "b": 2})), &known);

    let result = rewrite("SELECT :a:b FROM t", &known, &values).unwrap();
    assert_eq!(result.sql, "SELECT ?? FROM t");
    assert_eq!(result.args, vec![json!(1), json!(2)]);
}

#[test]
fn test_trailing_colon_is_literal() {
    let known = names(&[]);
    let values = project_one(&item(json!({})), &known);

    let result = rewrite("SELECT 1 FROM t WHERE x = ':' :", &known, &values).unwrap();
    assert_eq!(result.sql, "SELECT 1 FROM t WHERE x = ':' :");
    assert!(result.args.is_empty());
}

#[test]
fn test_double_colon_binds_after_first() {
    let known = names(&["id"]);
    let values = project_one(&item(json!({"id": 7})), &known);

    // The first ':' is not followed by an identifier character, the second
    // starts a placeholder.
    let result = rewrite("SELECT x ::id FROM t", &known, &values).unwrap();
    assert_eq!(result.sql, "SELECT x :? FROM t");
    assert_eq!(result.args, vec![json!(7)]);
}

#[test]
fn test_placeholder_name_stops_at_non_identifier() {
    let known = names(&["id"]);
    let values = project_one(&item(json!({"id": 7})), &known);

    let result = rewrite("SELECT * FROM t WHERE id IN (:id,:id)", &known, &values).unwrap();
    assert_eq!(result.sql, "SELECT * FROM t WHERE id IN (?,?)");
    assert_eq!(result.args, vec![json!(7), json!(7)]);
}

#[test]
fn test_case_sensitive_parameter_names() {
    let known = names(&["Id"]);
    let values = project_one(&item(json!({"Id": 7})), &known);

    let err = rewrite("SELECT * FROM t WHERE id = :id", &known, &values).unwrap_err();
    assert_eq!(err.error_code(), "UNKNOWN_PARAMETER");
}

#[test]
fn test_whole_template_is_one_placeholder() {
    let known = names(&["q"]);
    let values = project_one(&item(json!({"q": "x"})), &known);

    let result = rewrite(":q", &known, &values).unwrap();
    assert_eq!(result.sql, "?");
    assert_eq!(result.args, vec![json!("x")]);
}

#[test]
fn test_empty_template() {
    let known = names(&[]);
    let values = project_one(&item(json!({})), &known);

    let result = rewrite("", &known, &values).unwrap();
    assert_eq!(result.sql, "");
    assert!(result.args.is_empty());
}

// ============================================================================
// Rewriter: value shapes
// ============================================================================

#[test]
fn test_structured_values_bind_as_given() {
    let known = names(&["payload"]);
    let values = project_one(&item(json!({"payload": {"deep": [1, 2]}})), &known);

    let result = rewrite("INSERT INTO t(p) VALUES (:payload)", &known, &values).unwrap();
    assert_eq!(result.args, vec![json!({"deep": [1, 2]})]);
}

#[test]
fn test_null_and_boolean_values_bind() {
    let known = names(&["a", "b"]);
    let values = project_one(&item(json!({"a": null, "b": false})), &known);

    let result = rewrite("SELECT :a, :b FROM t", &known, &values).unwrap();
    assert_eq!(result.args, vec![Value::Null, json!(false)]);
}

// ============================================================================
// Projector
// ============================================================================

#[test]
fn test_projection_isolation_from_source() {
    let source = item(json!({"tags": ["a", "b"]}));
    let projected = project_one(&source, &names(&["tags"]));

    let mut taken = projected.into_values();
    if let Some(Value::Array(tags)) = taken.first_mut() {
        tags.push(json!("mutated"));
    }

    assert_eq!(source.get("tags"), Some(&json!(["a", "b"])));
}

#[test]
fn test_projection_of_many_records_keeps_order_and_length() {
    let records: Vec<InputRecord> = (0..100).map(|i| item(json!({"n": i}))).collect();

    let projected = project(&records, &names(&["n", "absent"]));
    assert_eq!(projected.len(), 100);
    assert_eq!(projected[0].get("n"), Some(&json!(0)));
    assert_eq!(projected[99].get("n"), Some(&json!(99)));
    assert_eq!(projected[50].get("absent"), Some(&Value::Null));
}

#[test]
fn test_projection_requesting_same_field_twice() {
    let projected = project_one(&item(json!({"id": 1})), &names(&["id", "id"]));
    assert_eq!(projected.into_values(), vec![json!(1), json!(1)]);
}

// ============================================================================
// Name lists
// ============================================================================

#[test]
fn test_name_list_with_interior_whitespace() {
    assert_eq!(parse_name_list("first name,last"), vec!["first name", "last"]);
}

#[test]
fn test_name_list_single_entry() {
    assert_eq!(parse_name_list("id"), vec!["id"]);
    assert_eq!(parse_name_list(" id "), vec!["id"]);
}
