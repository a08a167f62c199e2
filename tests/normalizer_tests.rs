use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use entimap::{
    EntityRegistry, MarshalConfig, MarshalError, Record, TypeNormalizer, Value,
};
use serde_json::json;

const CUSTOMER: &str = r#"
    @Entity()
    class Customer {
        @Id()
        id: number;

        @Column({ name: "SIGNED_UP", type: "timestamp" })
        signedUp: Date;

        @Column({ type: "decimal", precision: 10, scale: 2 })
        balance: number;

        @Column({ type: "uuid" })
        externalId: string;

        @Column({ name: "PROMO_CODE", type: "varchar", length: 16 })
        promoCode: string;
    }
"#;

const ORDER: &str = r#"
    @Entity()
    class Order {
        @Id()
        id: number;

        @ManyToOne(() => Customer)
        customer: Customer;

        @OneToMany(() => OrderLine, { joinColumn: "ORDER_ID" })
        lines: OrderLine[];
    }
"#;

const ORDER_LINE: &str = r#"
    @Entity()
    class OrderLine {
        @Id()
        id: number;

        @Column({ type: "timestamp" })
        shippedAt: Date;
    }
"#;

fn normalizer() -> TypeNormalizer {
    let registry = Arc::new(EntityRegistry::new());
    registry.parse_and_register("Customer.ts", CUSTOMER).unwrap();
    registry.parse_and_register("Order.ts", ORDER).unwrap();
    registry.parse_and_register("OrderLine.ts", ORDER_LINE).unwrap();
    TypeNormalizer::with_registry(MarshalConfig::default(), registry)
}

fn record(pairs: &[(&str, Value)]) -> Record {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

#[test]
fn test_integral_float_becomes_integer() {
    let mut rec = record(&[("age", Value::Float(30.0))]);
    TypeNormalizer::default().normalize(&mut rec);
    assert_eq!(rec["age"], Value::Integer(30));
}

#[test]
fn test_fractional_float_becomes_decimal() {
    let mut rec = record(&[("height", Value::Float(180.5))]);
    TypeNormalizer::default().normalize(&mut rec);
    assert_eq!(
        rec["height"],
        Value::Decimal(BigDecimal::from_str("180.5").unwrap())
    );
}

#[test]
fn test_heuristics_never_fail_on_odd_text() {
    let mut rec = record(&[
        ("when", Value::from("2024-13-45T99:00:00")),
        ("avatar_blob", Value::from("%%% not base64 %%%")),
        ("nickname", Value::from("Ada")),
    ]);
    TypeNormalizer::default().normalize(&mut rec);

    assert_eq!(rec["when"], Value::from("2024-13-45T99:00:00"));
    assert_eq!(rec["avatar_blob"], Value::from("%%% not base64 %%%"));
    assert_eq!(rec["nickname"], Value::from("Ada"));
}

#[test]
fn test_heuristic_temporal_and_binary_detection() {
    let mut rec = record(&[
        ("birthday", Value::from("1990-04-12")),
        ("avatar_blob", Value::from("aGVsbG8=")),
    ]);
    TypeNormalizer::default().normalize(&mut rec);

    assert_eq!(
        rec["birthday"],
        Value::Date(NaiveDate::from_ymd_opt(1990, 4, 12).unwrap())
    );
    assert_eq!(rec["avatar_blob"], Value::Bytes(b"hello".to_vec()));
}

#[test]
fn test_nested_maps_and_lists_are_normalized() {
    let mut rec = record(&[(
        "stats",
        Value::Map(record(&[(
            "scores",
            Value::List(vec![Value::Float(1.0), Value::Float(2.5)]),
        )])),
    )]);
    TypeNormalizer::default().normalize(&mut rec);

    let stats = rec["stats"].as_map().unwrap();
    assert_eq!(
        stats["scores"],
        Value::List(vec![
            Value::Integer(1),
            Value::Decimal(BigDecimal::from_str("2.5").unwrap()),
        ])
    );
}

#[test]
fn test_normalize_is_idempotent() {
    let normalizer = TypeNormalizer::default();
    let mut rec = record(&[
        ("age", Value::Float(30.0)),
        ("height", Value::Float(180.5)),
        ("seen", Value::from("2024-05-01T08:30:00")),
    ]);
    normalizer.normalize(&mut rec);
    let once = rec.clone();
    normalizer.normalize(&mut rec);
    assert_eq!(rec, once);
}

#[test]
fn test_hinted_columns_are_coerced() {
    let normalizer = normalizer();
    let mut rec = record(&[
        ("id", Value::Integer(1)),
        ("SIGNED_UP", Value::Integer(0)),
        ("balance", Value::Integer(12)),
        ("externalId", Value::from("0f8fad5b-d9cb-469f-a165-70867728950e")),
    ]);
    normalizer.normalize_for_entity(&mut rec, "Customer").unwrap();

    assert!(matches!(rec["SIGNED_UP"], Value::Timestamp(_)));
    assert_eq!(rec["balance"], Value::Decimal(BigDecimal::from(12)));
    assert!(matches!(rec["externalId"], Value::Uuid(_)));
}

#[test]
fn test_hinted_column_rejects_unreadable_value() {
    let normalizer = normalizer();
    let mut rec = record(&[("signedUp", Value::from("last tuesday"))]);

    let err = normalizer
        .normalize_for_entity(&mut rec, "Customer")
        .unwrap_err();
    match err {
        MarshalError::Normalization { entity, field, .. } => {
            assert_eq!(entity, "Customer");
            assert_eq!(field, "signedUp");
        }
        other => panic!("Expected normalization error, got {:?}", other),
    }
}

#[test]
fn test_hinted_null_passes_through() {
    let normalizer = normalizer();
    let mut rec = record(&[("signedUp", Value::Null), ("balance", Value::Null)]);
    normalizer.normalize_for_entity(&mut rec, "Customer").unwrap();
    assert!(rec["signedUp"].is_null());
    assert!(rec["balance"].is_null());
}

#[test]
fn test_association_and_collection_recurse_into_targets() {
    let normalizer = normalizer();
    let mut rec = record(&[
        ("id", Value::Float(3.0)),
        (
            "customer",
            Value::Map(record(&[("signedUp", Value::from("2024-01-02 03:04:05"))])),
        ),
        (
            "lines",
            Value::List(vec![Value::Map(record(&[
                ("id", Value::Float(9.0)),
                ("shippedAt", Value::Integer(86_400_000)),
            ]))]),
        ),
    ]);
    normalizer.normalize_for_entity(&mut rec, "Order").unwrap();

    assert_eq!(rec["id"], Value::Integer(3));
    let customer = rec["customer"].as_map().unwrap();
    assert!(matches!(customer["signedUp"], Value::Timestamp(_)));

    let Value::List(lines) = &rec["lines"] else {
        panic!("expected list");
    };
    let line = lines[0].as_map().unwrap();
    assert_eq!(line["id"], Value::Integer(9));
    assert!(matches!(line["shippedAt"], Value::Timestamp(_)));
}

#[test]
fn test_collection_must_be_a_list() {
    let normalizer = normalizer();
    let mut rec = record(&[("lines", Value::from("nope"))]);
    assert!(matches!(
        normalizer.normalize_for_entity(&mut rec, "Order"),
        Err(MarshalError::Normalization { .. })
    ));
}

#[test]
fn test_unknown_entity() {
    let mut rec = Record::new();
    assert!(matches!(
        normalizer().normalize_for_entity(&mut rec, "Ghost"),
        Err(MarshalError::EntityNotFound(_))
    ));
}

#[test]
fn test_external_rendering() {
    let normalizer = normalizer();
    let mut rec = record(&[
        ("age", Value::Float(30.0)),
        ("height", Value::Float(180.5)),
        ("signedUp", Value::from("2024-05-01T08:30:00")),
    ]);
    normalizer.normalize_for_entity(&mut rec, "Customer").unwrap();

    let external = serde_json::Value::Object(normalizer.to_external(&rec));
    assert_eq!(external["age"], json!(30));
    assert_eq!(external["height"], json!(180.5));
    assert_eq!(external["signedUp"], json!("2024-05-01T08:30:00"));
}

#[test]
fn test_varchar_column_is_not_retyped() {
    let normalizer = normalizer();
    let mut rec = record(&[
        ("promoCode", Value::from("10:30")),
        ("PROMO_CODE", Value::from("2024-01-01")),
    ]);
    normalizer.normalize_for_entity(&mut rec, "Customer").unwrap();

    assert_eq!(rec["promoCode"], Value::from("10:30"));
    assert_eq!(rec["PROMO_CODE"], Value::from("2024-01-01"));

    let external = serde_json::Value::Object(normalizer.to_external(&rec));
    assert_eq!(external["promoCode"], json!("10:30"));
}
