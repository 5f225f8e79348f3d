use std::collections::HashMap;
use std::env;

use opendal::layers::{LoggingLayer, RetryLayer};
use opendal::{Operator, Scheme};

const SCHEMES: [Scheme; 5] = [
    Scheme::Fs,
    Scheme::Hdfs,
    Scheme::Ipmfs,
    Scheme::Redis,
    Scheme::Rocksdb,
];

/// Every operator the suite should run against.
///
/// `memory` is always there. Other services join when
/// `OPENDAL_<SCHEME>_TEST=on`, configured by the rest of their
/// `OPENDAL_<SCHEME>_*` variables. Each run works under a fresh root.
pub fn operators() -> Vec<Operator> {
    let _ = dotenv::dotenv();

    let mut ops = vec![finish(Scheme::Memory, HashMap::new())];

    for scheme in SCHEMES {
        let mut map = opendal::scheme_envs(scheme, env::vars());
        if map.get("test").map(String::as_str) != Some("on") {
            continue;
        }
        if !opendal::services::is_enabled(scheme) {
            eprintln!("{scheme} test is on but the service is not compiled in, skipping");
            continue;
        }

        map.remove("test");
        ops.push(finish(scheme, map));
    }

    ops
}

fn finish(scheme: Scheme, mut map: HashMap<String, String>) -> Operator {
    let root = map.get("root").cloned().unwrap_or_else(|| "/".to_string());
    map.insert(
        "root".to_string(),
        format!("{}/{}/", root.trim_end_matches('/'), gen_name()),
    );

    // RocksDB locks its datadir, tests running in parallel need their own.
    if scheme == Scheme::Rocksdb
        && let Some(datadir) = map.get("datadir").cloned()
    {
        map.insert(
            "datadir".to_string(),
            format!("{}/{}", datadir.trim_end_matches('/'), gen_name()),
        );
    }

    opendal::services::build(scheme, map)
        .unwrap_or_else(|err| panic!("build {scheme} operator: {err}"))
        .layer(RetryLayer::new())
        .layer(LoggingLayer)
        .finish()
}

pub fn gen_name() -> String {
    format!("{:016x}", rand::random::<u64>())
}

pub fn gen_bytes() -> Vec<u8> {
    let size = rand::random_range(1..4096);
    (0..size).map(|_| rand::random::<u8>()).collect()
}

#[cfg(feature = "services-rocksdb")]
#[test]
fn test_rocksdb_operators_do_not_share_datadir() {
    let dir = tempfile::tempdir().unwrap();
    let map = HashMap::from([(
        "datadir".to_string(),
        dir.path().to_string_lossy().to_string(),
    )]);

    let first = finish(Scheme::Rocksdb, map.clone());
    let second = finish(Scheme::Rocksdb, map);

    first.object("a").blocking_write("first").unwrap();
    second.object("a").blocking_write("second").unwrap();
    assert_eq!(first.object("a").blocking_read().unwrap(), b"first");
}
