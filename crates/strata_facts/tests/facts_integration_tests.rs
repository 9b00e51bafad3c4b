//! Integration tests for the fact data model: values, layouts, schema
//! enforcement, and the fact store working together.

use strata_facts::{Error, Fact, FactSet, Schema, Shape, Value};

#[test]
fn test_schema_grows_with_the_store() {
    let mut schema = Schema::new();
    let mut facts = FactSet::new();

    let rows = [
        Fact::list("Parent", [Value::symbol("walker"), Value::symbol("bert")]),
        Fact::list("Parent", [Value::symbol("bert"), Value::symbol("clark")]),
        Fact::map("Person", [("name", Value::string("Bert")), ("age", Value::integer(40))]),
    ];
    for fact in rows {
        schema.check_fact(&fact).unwrap();
        assert!(facts.add(fact));
    }

    assert_eq!(schema.get("Parent"), Some(&Shape::List { arity: 2 }));
    assert_eq!(schema.get("Person"), Some(&Shape::Map));
    assert_eq!(facts.len(), 3);
    assert_eq!(facts.relation("Parent").len(), 2);
}

#[test]
fn test_rejected_fact_leaves_everything_unchanged() {
    let mut schema = Schema::new();
    let mut facts = FactSet::new();

    let good = Fact::list("Thing", [Value::symbol("pen"), Value::integer(1)]);
    schema.check_fact(&good).unwrap();
    facts.add(good);

    let bad = Fact::list("Thing", [Value::symbol("desk")]);
    match schema.check_fact(&bad) {
        Err(Error::ShapeMismatch { relation, .. }) => assert_eq!(relation, "Thing"),
        other => panic!("expected a shape mismatch, got {:?}", other),
    }

    assert_eq!(schema.get("Thing"), Some(&Shape::List { arity: 2 }));
    assert_eq!(facts.len(), 1);
}

#[test]
fn test_map_facts_ignore_field_order() {
    let mut facts = FactSet::new();
    facts.add(Fact::map(
        "Person",
        [("name", Value::string("Bert")), ("age", Value::integer(40))],
    ));

    // The same fields in another order are the same fact.
    let reordered = Fact::map(
        "Person",
        [("age", Value::integer(40)), ("name", Value::string("Bert"))],
    );
    assert!(!facts.add(reordered));
    assert_eq!(facts.len(), 1);
}

#[test]
fn test_pair_relation_end_to_end() {
    let mut schema = Schema::new();
    schema
        .check_shape(
            "Thing",
            Shape::Pair {
                fields: vec!["id".to_string(), "size".to_string()],
            },
        )
        .unwrap();

    let fact = Fact::pair(
        "Thing",
        [("id", Value::symbol("pen")), ("size", Value::integer(1))],
    );
    schema.check_fact(&fact).unwrap();

    // Both access modes read the same field.
    assert_eq!(fact.get(1), fact.field("size"));

    // Ordered and (declared) named uses both pass the schema.
    schema.check_ordered_use("Thing", 2).unwrap();
    schema
        .check_named_use("Thing", &["id".to_string()])
        .unwrap();

    // A plain list fact of the right arity also conforms.
    let list = Fact::list("Thing", [Value::symbol("desk"), Value::integer(10)]);
    schema.check_fact(&list).unwrap();
}

#[test]
fn test_collection_values_in_facts() {
    let mut facts = FactSet::new();
    let sizes = Value::list([Value::integer(1), Value::integer(10)]);
    let index = Value::map([
        (Value::symbol("pen"), Value::integer(1)),
        (Value::symbol("desk"), Value::integer(10)),
    ]);

    facts.add(Fact::list("Sizes", [sizes.clone()]));
    facts.add(Fact::list("Index", [index]));

    let stored = &facts.relation("Sizes")[0];
    assert_eq!(stored.get(0).and_then(Value::as_list).map(<[Value]>::len), Some(2));

    // Equal collections built in a different entry order dedup.
    let reordered = Value::map([
        (Value::symbol("desk"), Value::integer(10)),
        (Value::symbol("pen"), Value::integer(1)),
    ]);
    assert!(!facts.add(Fact::list("Index", [reordered])));
}

#[test]
fn test_relation_maintenance() {
    let mut facts = FactSet::new();
    facts.add(Fact::list("Draft", [Value::integer(1)]));
    facts.add(Fact::list("Draft", [Value::integer(2)]));
    facts.add(Fact::list("Final", [Value::integer(0)]));

    assert_eq!(facts.rename_relation("Draft", "Final"), 2);
    assert!(facts.relation("Draft").is_empty());
    assert_eq!(facts.relation("Final").len(), 2);
    assert!(!facts.contains(&Fact::list("Final", [Value::integer(0)])));

    assert_eq!(facts.drop_relation("Final"), 2);
    assert!(facts.is_empty());
}
