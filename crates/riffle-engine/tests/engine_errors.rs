//! Error-path tests: invalid queries are rejected before they can touch
//! the store.

use riffle_common::Error;
use riffle_engine::RiffleDB;

#[test]
fn test_unknown_edge_type_in_match() {
    let db = RiffleDB::new();
    db.execute("CREATE (0)->(1);").unwrap();

    let err = db.execute("MATCH (a)-[:FOLLOWS]->(b);").unwrap_err();
    assert!(matches!(err, Error::NoSuchType { name } if name == "FOLLOWS"));
}

#[test]
fn test_unknown_vertex_type_in_match() {
    let db = RiffleDB::new();
    db.execute("CREATE (0)->(1);").unwrap();

    let err = db.execute("MATCH (a:Person)->(b);").unwrap_err();
    assert!(matches!(err, Error::NoSuchType { .. }));
}

#[test]
fn test_unknown_type_in_delete() {
    let db = RiffleDB::new();
    db.execute("CREATE (0)->(1);").unwrap();

    let err = db.execute("DELETE (0)-[:FOLLOWS]->(1);").unwrap_err();
    assert!(matches!(err, Error::NoSuchType { .. }));

    // The store is untouched by the rejected statement.
    assert_eq!(db.execute("MATCH (a)->(b);").unwrap().rows().len(), 1);
}

#[test]
fn test_unknown_property_key_in_where() {
    let db = RiffleDB::new();
    db.execute("CREATE (0)->(1);").unwrap();

    let err = db
        .execute("MATCH (a)->(b) WHERE a.age > 10;")
        .unwrap_err();
    assert!(matches!(err, Error::NoSuchType { .. }));
}

#[test]
fn test_undeclared_variable_in_return() {
    let db = RiffleDB::new();
    db.execute("CREATE (0)->(1);").unwrap();

    let err = db.execute("MATCH (a)->(b) RETURN q;").unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));

    let err = db
        .execute("MATCH (a)->(b) RETURN SUM(q.age);")
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[test]
fn test_disconnected_pattern() {
    let db = RiffleDB::new();
    db.execute("CREATE (0)->(1),(2)->(3);").unwrap();

    let err = db.execute("MATCH (a)->(b),(c)->(d);").unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[test]
fn test_conflicting_vertex_types() {
    let db = RiffleDB::new();
    db.execute("CREATE (0:User)->(1:Bot);").unwrap();

    let err = db.execute("MATCH (a:User)->(b),(b)->(a:Bot);").unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[test]
fn test_create_with_symbolic_vertex() {
    let db = RiffleDB::new();
    let err = db.execute("CREATE (alice)->(bob);").unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[test]
fn test_malformed_query_text() {
    let db = RiffleDB::new();
    assert!(matches!(
        db.execute("MATCH (a)->;").unwrap_err(),
        Error::Parse { .. }
    ));
    assert!(matches!(
        db.execute("CONTINUOUS MATCH (a)->(b);").unwrap_err(),
        Error::Parse { .. }
    ));
}

#[test]
fn test_delete_nonexistent_edge_reports_zero() {
    let db = RiffleDB::new();
    db.execute("CREATE (0)->(1);").unwrap();
    let output = db.execute("DELETE (5)->(6);").unwrap();
    assert_eq!(output.to_string(), "0 edges deleted");
}
