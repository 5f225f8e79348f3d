use opendal::{ErrorKind, ObjectMode, Result};

use crate::utils::{gen_bytes, gen_name, operators};

#[test]
fn test_blocking_write_read_delete() {
    for op in operators().into_iter().filter(|op| op.metadata().can_blocking()) {
        let o = op.object(&format!("{}/{}", gen_name(), gen_name()));
        let content = gen_bytes();

        o.blocking_write(content.clone()).unwrap();

        let meta = o.blocking_metadata().unwrap();
        assert_eq!(meta.mode(), ObjectMode::FILE);
        assert_eq!(meta.content_length(), content.len() as u64);

        assert_eq!(o.blocking_read().unwrap(), content, "{:?}", op.metadata());
        assert_eq!(o.blocking_range_read(1..).unwrap(), &content[1..]);

        o.blocking_delete().unwrap();
        assert!(!o.blocking_is_exist().unwrap());
    }
}

#[test]
fn test_blocking_list() {
    for op in operators()
        .into_iter()
        .filter(|op| op.metadata().can_blocking() && op.metadata().can_list())
    {
        let dir = format!("{}/", gen_name());
        let file = format!("{dir}{}", gen_name());
        op.object(&file).blocking_write(gen_bytes()).unwrap();

        let paths: Vec<String> = op
            .object(&dir)
            .blocking_list()
            .unwrap()
            .map(|o| o.map(|o| o.path().to_string()))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(paths, vec![file.clone()], "{:?}", op.metadata());

        op.object(&file).blocking_delete().unwrap();
    }
}

#[test]
fn test_blocking_unsupported() {
    for op in operators().into_iter().filter(|op| !op.metadata().can_blocking()) {
        let err = op.object(&gen_name()).blocking_read().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported, "{:?}", op.metadata());
    }
}
