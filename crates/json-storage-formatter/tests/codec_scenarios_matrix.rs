use chrono::{TimeZone, Utc};
use json_storage_formatter::{
    clone, clone_with, format_from_store, format_from_str, format_to_store,
    format_to_store_string, CloneOptions, DecodeOptions, EncodeOptions, FormatError, Function,
    Stored, Value,
};
use serde_json::{json, Value as Json};

fn encode(value: &Value) -> Json {
    match format_to_store(value, &EncodeOptions::default()).expect("encode must succeed") {
        Stored::Tree(tree) => tree,
        Stored::Text(text) => panic!("expected a tree, got text {text}"),
    }
}

fn decode(tree: &Json) -> Value {
    format_from_store(tree, &DecodeOptions::default()).expect("decode must succeed")
}

fn sample_record() -> Value {
    Value::object([
        ("id", Value::from(7)),
        ("name", Value::from("ada")),
        ("nothing", Value::Null),
        ("absent", Value::Undefined),
        (
            "created",
            Value::from(Utc.with_ymd_and_hms(2021, 6, 1, 12, 30, 0).unwrap()),
        ),
        (
            "roles",
            Value::set([Value::from("admin"), Value::from("dev")]),
        ),
        (
            "scores",
            Value::map([
                (Value::from("math"), Value::from(9.5)),
                (Value::from(2020), Value::array([Value::from(1), Value::Undefined])),
            ]),
        ),
        ("pattern", Value::regex("^[a-z]+$", "i")),
        ("failure", Value::error("disk full")),
        (
            "nested",
            Value::object([("deeper", Value::array([Value::object([("x", Value::from(false))])]))]),
        ),
    ])
}

#[test]
fn concrete_scenarios() {
    let date = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(
        encode(&Value::from(date)),
        json!({"$t": "date", "$v": "2020-01-01T00:00:00.000Z"})
    );
    assert_eq!(encode(&Value::Undefined), json!({"$t": "undefined"}));
    assert_eq!(decode(&json!({"$t": "undefined"})), Value::Undefined);

    let map = encode(&Value::map([(Value::from("a"), Value::from(1))]));
    assert_eq!(map, json!({"$t": "map", "$v": [["a", 1]]}));
    let restored = decode(&map);
    assert_eq!(
        restored.as_map().unwrap().get(&Value::from("a")),
        Some(&Value::from(1))
    );

    assert_eq!(encode(&Value::from(1)), json!(1));
    assert_eq!(encode(&Value::from("x")), json!("x"));
    assert_eq!(decode(&json!("{}")), Value::from("{}"));
}

#[test]
fn record_round_trips_through_tree_and_text() {
    let record = sample_record();
    let tree = encode(&record);
    assert_eq!(decode(&tree), record);

    let text = format_to_store_string(&record, &EncodeOptions::default()).unwrap();
    let from_text = format_from_str(&text, &DecodeOptions::default()).unwrap();
    assert_eq!(from_text, record);

    let as_json_string = Json::String(text);
    let parsed =
        format_from_store(&as_json_string, &DecodeOptions::new().json_parse(true)).unwrap();
    assert_eq!(parsed, record);
}

#[test]
fn record_wire_shape() {
    let tree = encode(&sample_record());
    assert_eq!(tree["absent"], json!({"$t": "undefined"}));
    assert_eq!(tree["nothing"], json!(null));
    assert_eq!(
        tree["created"],
        json!({"$t": "date", "$v": "2021-06-01T12:30:00.000Z"})
    );
    assert_eq!(tree["roles"], json!({"$t": "set", "$v": ["admin", "dev"]}));
    assert_eq!(
        tree["scores"],
        json!({"$t": "map", "$v": [["math", 9.5], [2020, [1, {"$t": "undefined"}]]]})
    );
    assert_eq!(
        tree["pattern"],
        json!({"$t": "regex", "$v": {"s": "^[a-z]+$", "f": "i"}})
    );
    assert_eq!(tree["failure"], json!({"$t": "error", "$v": "disk full"}));
}

#[test]
fn encode_leaves_input_untouched() {
    let record = sample_record();
    let snapshot = clone(&record);
    let _ = encode(&record);
    assert_eq!(record, snapshot);
}

#[test]
fn dates_round_trip_across_the_whole_calendar() {
    let instants = [
        Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(-1, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(0, 2, 29, 12, 0, 0).unwrap(),
        Utc.timestamp_millis_opt(-1).unwrap(),
        Utc.timestamp_nanos(1_500_000),
    ];
    for instant in instants {
        let value = Value::from(instant);
        let text = format_to_store_string(&value, &EncodeOptions::default()).unwrap();
        let restored = format_from_str(&text, &DecodeOptions::default()).unwrap();
        assert_eq!(restored, value, "stored as {text}");
    }
}

#[test]
fn reads_expanded_years_written_by_other_producers() {
    let value = decode(&json!({"$t": "date", "$v": "+010000-01-01T00:00:00.000Z"}));
    assert_eq!(
        value,
        Value::from(Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap())
    );
    let value = decode(&json!({"$t": "date", "$v": "2020-01-01T00:00:00.123456Z"}));
    assert_eq!(
        value,
        Value::from(Utc.timestamp_millis_opt(1_577_836_800_123).unwrap())
    );
}

#[test]
fn null_and_absent_stay_distinct() {
    let value = Value::object([("a", Value::Null), ("b", Value::Undefined)]);
    let restored = decode(&encode(&value));
    assert_eq!(restored.get("a"), Some(&Value::Null));
    assert_eq!(restored.get("b"), Some(&Value::Undefined));
    assert_eq!(restored.get("c"), None);
}

#[test]
fn error_keeps_message_only() {
    let restored = decode(&encode(&Value::error("boom")));
    assert_eq!(restored.as_error().unwrap().message, "boom");
}

#[test]
fn functions_round_trip_as_inert_source() {
    let f = Function::new("(a, b) => a + b", |args| {
        let sum: f64 = args.iter().filter_map(Value::as_f64).sum();
        Value::from(sum)
    });
    let tree = encode(&Value::from(f.clone()));
    assert_eq!(tree, json!({"$t": "function", "$v": "(a, b) => a + b"}));

    let restored = decode(&tree);
    let restored = restored.as_function().unwrap();
    assert_eq!(restored.source(), f.source());
    assert!(restored.is_inert());
    assert!(matches!(restored.call(&[]), Err(FormatError::NotCallable)));
}

#[test]
fn unreflectable_function_never_fails_encode() {
    let value = Value::object([("handler", Value::from(Function::native(|_| Value::Null)))]);
    let tree = encode(&value);
    assert_eq!(tree["handler"]["$t"], json!("error"));
    let restored = decode(&tree);
    assert!(restored.get("handler").unwrap().as_error().is_some());
}

#[test]
fn unknown_tags_degrade_to_plain_structures() {
    let tree = json!({"$t": "uint8array", "$v": [1, 2, 3]});
    let value = decode(&tree);
    let obj = value.as_object().unwrap();
    assert_eq!(obj.get("$t"), Some(&Value::from("uint8array")));
    assert_eq!(
        obj.get("$v"),
        Some(&Value::array([Value::from(1), Value::from(2), Value::from(3)]))
    );
}

#[test]
fn envelope_with_extra_fields_is_still_an_envelope() {
    let value = decode(&json!({"$t": "error", "$v": "x", "stack": "at foo"}));
    assert_eq!(value, Value::error("x"));
}

#[test]
fn clone_isolation() {
    let record = sample_record();
    let deep = clone(&record);
    assert_eq!(deep, record);
    assert!(!deep.same_container(&record));
    assert!(!deep.get("roles").unwrap().same_container(record.get("roles").unwrap()));

    let shallow = clone_with(&record, CloneOptions::shallow());
    assert_eq!(shallow, record);
    assert!(!shallow.same_container(&record));
    assert!(shallow.get("roles").unwrap().same_container(record.get("roles").unwrap()));
    assert!(shallow.get("nested").unwrap().same_container(record.get("nested").unwrap()));
}

#[test]
fn malformed_text_is_a_parse_failure() {
    for text in ["", "{", "[1,", "{\"$t\": }", "undefined"] {
        let result = format_from_str(text, &DecodeOptions::default());
        assert!(matches!(result, Err(FormatError::Json(_))), "text {text:?}");
    }
}
