//! End-to-end CONTINUOUS MATCH tests: delta plans stream EMERGED and
//! DELETED tuples into a file sink as mutations land.

use std::collections::BTreeMap;
use std::path::Path;

use riffle_engine::RiffleDB;

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

/// Splits sink lines into (emerged, deleted) tuple multisets.
fn split_tags(lines: &[String]) -> (Vec<Vec<i32>>, Vec<Vec<i32>>) {
    let mut emerged = Vec::new();
    let mut deleted = Vec::new();
    for line in lines {
        let mut fields: Vec<&str> = line.split(' ').collect();
        let tag = fields.pop().unwrap();
        let tuple: Vec<i32> = fields.iter().map(|f| f.parse().unwrap()).collect();
        match tag {
            "EMERGED" => emerged.push(tuple),
            "DELETED" => deleted.push(tuple),
            other => panic!("unexpected tag {other}"),
        }
    }
    emerged.sort();
    deleted.sort();
    (emerged, deleted)
}

#[test]
fn test_single_edge_closes_second_triangle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("triangles.txt");

    let db = RiffleDB::new();
    // One complete typed triangle plus a partial second one missing its
    // G edge.
    db.execute("CREATE (0)-[:F]->(1),(1)-[:G]->(2),(2)-[:H]->(0),(3)-[:H]->(0);")
        .unwrap();
    db.execute(&format!(
        "CONTINUOUS MATCH (a)-[:F]->(b),(b)-[:G]->(c),(c)-[:H]->(a) FILE '{}';",
        path.display()
    ))
    .unwrap();

    // Closing edge: triangle (a=0, b=1, c=3) now exists.
    db.execute("CREATE (1)-[:G]->(3);").unwrap();

    let (emerged, deleted) = split_tags(&read_lines(&path));
    // Exactly the new triangle emerges; the pre-existing one is not
    // re-emitted.
    assert_eq!(emerged, vec![vec![0, 1, 3]]);
    assert!(deleted.is_empty());
}

#[test]
fn test_deletion_reports_deleted_tuple() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deleted.txt");

    let db = RiffleDB::new();
    db.execute("CREATE (0)-[:F]->(1),(1)-[:G]->(2),(2)-[:H]->(0);")
        .unwrap();
    db.execute(&format!(
        "CONTINUOUS MATCH (a)-[:F]->(b),(b)-[:G]->(c),(c)-[:H]->(a) FILE '{}';",
        path.display()
    ))
    .unwrap();

    db.execute("DELETE (2)-[:H]->(0);").unwrap();

    let (emerged, deleted) = split_tags(&read_lines(&path));
    assert!(emerged.is_empty());
    assert_eq!(deleted, vec![vec![0, 1, 2]]);
}

#[test]
fn test_batch_with_every_edge_new() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("all_new.txt");

    let db = RiffleDB::new();
    db.execute("CREATE (9)-[:F]->(9);").unwrap(); // registry warm-up edge
    db.execute(&format!(
        "CONTINUOUS MATCH (a)-[:F]->(b),(b)-[:F]->(c),(c)-[:F]->(a) FILE '{}';",
        path.display()
    ))
    .unwrap();

    // All three triangle edges arrive in one batch: the decomposition
    // must report the new motifs exactly once each (once per rotation).
    db.execute("CREATE (0)-[:F]->(1),(1)-[:F]->(2),(2)-[:F]->(0);")
        .unwrap();

    let (emerged, deleted) = split_tags(&read_lines(&path));
    assert_eq!(
        emerged,
        vec![vec![0, 1, 2], vec![1, 2, 0], vec![2, 0, 1]]
    );
    assert!(deleted.is_empty());
}

/// The decomposition identity: across a run of mutation batches,
/// EMERGED minus DELETED equals Match(after) minus Match(before).
#[test]
fn test_delta_decomposition_matches_recomputation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("identity.txt");

    let db = RiffleDB::new();
    let wedge = "MATCH (a)->(b),(b)->(c),(c)->(a);";
    db.execute("CREATE (0)->(1),(1)->(2),(2)->(0),(1)->(3),(3)->(4);")
        .unwrap();

    let before = multiset(db.execute(wedge).unwrap().rows());

    db.execute(&format!(
        "CONTINUOUS MATCH (a)->(b),(b)->(c),(c)->(a) FILE '{}';",
        path.display()
    ))
    .unwrap();

    db.execute("CREATE (3)->(1),(4)->(1),(2)->(3),(3)->(2);")
        .unwrap();
    db.execute("DELETE (2)->(0),(3)->(4);").unwrap();

    let after = multiset(db.execute(wedge).unwrap().rows());

    // Net delta from the sink.
    let (emerged, deleted) = split_tags(&read_lines(&path));
    let mut net: BTreeMap<Vec<i32>, i64> = BTreeMap::new();
    for tuple in emerged {
        *net.entry(tuple).or_default() += 1;
    }
    for tuple in deleted {
        *net.entry(tuple).or_default() -= 1;
    }
    net.retain(|_, count| *count != 0);

    // Net delta from naive recomputation.
    let mut expected: BTreeMap<Vec<i32>, i64> = BTreeMap::new();
    for (tuple, count) in after {
        *expected.entry(tuple).or_default() += count;
    }
    for (tuple, count) in before {
        *expected.entry(tuple).or_default() -= count;
    }
    expected.retain(|_, count| *count != 0);

    assert_eq!(net, expected);
}

#[test]
fn test_continuous_with_where_clause() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("filtered.txt");

    let db = RiffleDB::new();
    db.execute("CREATE (0 {hot: true})-[:F]->(1),(2 {hot: false})-[:F]->(3);")
        .unwrap();
    db.execute(&format!(
        "CONTINUOUS MATCH (a)-[:F]->(b) WHERE a.hot = true FILE '{}';",
        path.display()
    ))
    .unwrap();

    db.execute("CREATE (0)-[:F]->(4),(2)-[:F]->(5);").unwrap();

    let (emerged, deleted) = split_tags(&read_lines(&path));
    // Only the hot vertex's new edge passes the filter.
    assert_eq!(emerged, vec![vec![0, 4]]);
    assert!(deleted.is_empty());
}

fn multiset(rows: &[(riffle_core::execution::MatchOutputTag, Vec<riffle_common::types::Value>)]) -> BTreeMap<Vec<i32>, i64> {
    let mut result: BTreeMap<Vec<i32>, i64> = BTreeMap::new();
    for (_, row) in rows {
        let tuple: Vec<i32> = row.iter().map(|v| v.as_int().unwrap()).collect();
        *result.entry(tuple).or_default() += 1;
    }
    result
}
