//! couchfind - Condition Normalizer Tests

use couchfind::{normalize, Condition, Error, HashValue, Operand, Operator};
use serde_json::{json, Value};

fn compile(v: Value) -> couchfind::Result<Value> {
    normalize(&Condition::from_value(v)?).map(|s| s.into_value())
}

#[test]
fn test_empty_condition_is_empty_fragment() {
    assert!(normalize(&Condition::Empty).unwrap().is_empty());
}

#[test]
fn test_hash_identity() {
    let input = json!({"name": "alice", "age": 30, "active": true, "nick": null});
    assert_eq!(compile(input.clone()).unwrap(), input);
}

#[test]
fn test_hash_list_matches_explicit_in() {
    assert_eq!(
        compile(json!({"status": ["a", "b"]})).unwrap(),
        compile(json!(["IN", "status", ["a", "b"]])).unwrap()
    );
}

#[test]
fn test_and_wraps_operands() {
    let c1 = json!({"a": 1});
    let c2 = json!(["BETWEEN", "b", 1, 2]);
    assert_eq!(
        compile(json!(["AND", c1.clone(), c2.clone()])).unwrap(),
        json!({"$and": [compile(c1).unwrap(), compile(c2).unwrap()]})
    );
}

#[test]
fn test_or_with_built_conditions() {
    let c = Condition::or(vec![
        Condition::hash([("role", json!("admin"))]),
        Condition::is_in("role", vec![json!("mod"), json!("owner")]),
    ]);
    assert_eq!(
        normalize(&c).unwrap().into_value(),
        json!({"$or": [{"role": "admin"}, {"role": {"$in": ["mod", "owner"]}}]})
    );
}

#[test]
fn test_nested_groups() {
    assert_eq!(
        compile(json!(["OR", ["AND", {"a": 1}, {"b": 2}], {"c": 3}])).unwrap(),
        json!({"$or": [{"$and": [{"a": 1}, {"b": 2}]}, {"c": 3}]})
    );
}

#[test]
fn test_canonical_fragment_round_trips() {
    let canonical = compile(json!(["AND", {"a": [1, 2]}, ["REGEX", "n", "^x"]])).unwrap();
    let again = compile(canonical.clone()).unwrap();
    assert_eq!(again, canonical);
}

#[test]
fn test_between() {
    assert_eq!(
        normalize(&Condition::between("age", 18, 65)).unwrap().into_value(),
        json!({"age": {"$gte": 18, "$lte": 65}})
    );
}

#[test]
fn test_not_between_keeps_single_field_map() {
    assert_eq!(
        normalize(&Condition::not_between("age", 18, 65)).unwrap().into_value(),
        json!({"age": {"$lt": 18, "$gt": 65}})
    );
}

#[test]
fn test_in_empty_values_matches_nothing() {
    assert_eq!(
        compile(json!(["IN", "status", []])).unwrap(),
        json!({"status": {"$in": []}})
    );
}

#[test]
fn test_not_in() {
    assert_eq!(
        normalize(&Condition::not_in("status", vec![json!("banned")])).unwrap().into_value(),
        json!({"status": {"$nin": ["banned"]}})
    );
}

#[test]
fn test_composite_in_unsupported() {
    let err = compile(json!(["IN", ["a", "b"], [[1, 2], [3, 4]]])).unwrap_err();
    assert!(matches!(err, Error::UnsupportedCompositeKey(_)));
}

#[test]
fn test_regex_and_like() {
    assert_eq!(
        normalize(&Condition::regex("name", "^al")).unwrap().into_value(),
        json!({"name": {"$regex": "^al"}})
    );
    assert_eq!(
        normalize(&Condition::like("name", "al%")).unwrap().into_value(),
        json!({"name": {"$regex": "al%"}})
    );
}

#[test]
fn test_invalid_pattern() {
    let err = normalize(&Condition::regex("name", "(unclosed")).unwrap_err();
    match err {
        Error::InvalidPattern { pattern, .. } => assert_eq!(pattern, "(unclosed"),
        e => panic!("Expected InvalidPattern, got: {:?}", e),
    }
}

#[test]
fn test_pattern_dialect_has_no_look_around_or_backreferences() {
    for pattern in ["^(?=.*a).*$", "(?<!x)y", r"(a)\1"] {
        let err = normalize(&Condition::regex("name", pattern)).unwrap_err();
        assert!(
            matches!(err, Error::InvalidPattern { .. }),
            "{} gave {:?}",
            pattern,
            err
        );
    }
    assert_eq!(
        normalize(&Condition::like("name", r"(?i)^al\w+[0-9]{2}$")).unwrap().into_value(),
        json!({"name": {"$regex": r"(?i)^al\w+[0-9]{2}$"}})
    );
}

#[test]
fn test_operand_count_errors() {
    for bad in [
        json!(["BETWEEN", "a", 1]),
        json!(["NOT BETWEEN", "a", 1, 2, 3]),
        json!(["IN", "a"]),
        json!(["NOT IN", "a", [1], [2]]),
        json!(["REGEX", "a"]),
        json!(["LIKE", "a", "x", "y"]),
    ] {
        let err = compile(bad.clone()).unwrap_err();
        assert!(
            matches!(err, Error::MalformedCondition(_)),
            "{} gave {:?}",
            bad,
            err
        );
    }
}

#[test]
fn test_unknown_operator() {
    assert!(matches!(
        compile(json!(["SOUNDS LIKE", "a", "b"])),
        Err(Error::MalformedCondition(_))
    ));
}

#[test]
fn test_empty_and_group() {
    assert_eq!(compile(json!(["AND"])).unwrap(), json!({"$and": []}));
}

#[test]
fn test_raw_operand_inside_and() {
    let c = Condition::Operator(
        Operator::And,
        vec![
            Operand::Condition(Condition::raw(json!({"x": {"$exists": true}}))),
            Operand::Value(json!({"y": 1})),
        ],
    );
    assert_eq!(
        normalize(&c).unwrap().into_value(),
        json!({"$and": [{"x": {"$exists": true}}, {"y": 1}]})
    );
}

#[test]
fn test_normalize_does_not_alias_input() {
    let c = Condition::Hash(vec![("tags".to_string(), HashValue::Native(json!({"$all": ["a"]})))]);
    let mut out = normalize(&c).unwrap().into_value();
    out["tags"] = json!("changed");
    assert_eq!(
        c,
        Condition::Hash(vec![("tags".to_string(), HashValue::Native(json!({"$all": ["a"]})))])
    );
}
