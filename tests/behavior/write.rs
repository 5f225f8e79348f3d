use opendal::{ErrorKind, ObjectMode};

use crate::utils::{gen_bytes, gen_name, operators};

#[tokio::test]
async fn test_create_file() {
    for op in operators() {
        let o = op.object(&gen_name());

        o.create().await.unwrap();

        let meta = o.metadata().await.unwrap();
        assert_eq!(meta.mode(), ObjectMode::FILE, "{:?}", op.metadata());
        assert_eq!(meta.content_length(), 0);

        o.delete().await.unwrap();
    }
}

#[tokio::test]
async fn test_create_dir() {
    for op in operators() {
        let o = op.object(&format!("{}/", gen_name()));

        o.create().await.unwrap();
        // Creating twice is fine.
        o.create().await.unwrap();

        let meta = o.metadata().await.unwrap();
        assert_eq!(meta.mode(), ObjectMode::DIR, "{:?}", op.metadata());

        o.delete().await.unwrap();
    }
}

#[tokio::test]
async fn test_write_and_overwrite() {
    for op in operators() {
        let o = op.object(&format!("{}/{}", gen_name(), gen_name()));
        let first = gen_bytes();
        let second = gen_bytes();

        o.write(first.clone()).await.unwrap();
        assert_eq!(o.metadata().await.unwrap().content_length(), first.len() as u64);

        o.write(second.clone()).await.unwrap();
        assert_eq!(o.read().await.unwrap(), second, "{:?}", op.metadata());

        o.delete().await.unwrap();
    }
}

#[tokio::test]
async fn test_write_to_dir_path_fails() {
    for op in operators() {
        let err = op
            .object(&format!("{}/", gen_name()))
            .write("x")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ObjectIsADirectory);
    }
}

#[tokio::test]
async fn test_stat_not_exist() {
    for op in operators() {
        let o = op.object(&gen_name());

        let err = o.metadata().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ObjectNotFound, "{:?}", op.metadata());
        assert!(!o.is_exist().await.unwrap());
    }
}

#[tokio::test]
async fn test_delete() {
    for op in operators() {
        let o = op.object(&gen_name());

        o.write(gen_bytes()).await.unwrap();
        assert!(o.is_exist().await.unwrap());

        o.delete().await.unwrap();
        assert!(!o.is_exist().await.unwrap());

        // Deleting a missing object succeeds.
        o.delete().await.unwrap();
    }
}
