use opendal::ErrorKind;
use tokio::io::AsyncReadExt;

use crate::utils::{gen_bytes, gen_name, operators};

#[tokio::test]
async fn test_read_full() {
    for op in operators() {
        let o = op.object(&gen_name());
        let content = gen_bytes();
        o.write(content.clone()).await.unwrap();

        assert_eq!(o.read().await.unwrap(), content, "{:?}", op.metadata());

        o.delete().await.unwrap();
    }
}

#[tokio::test]
async fn test_read_range() {
    for op in operators() {
        let o = op.object(&gen_name());
        let content = gen_bytes();
        let size = content.len() as u64;
        o.write(content.clone()).await.unwrap();

        let offset = size / 3;
        let end = offset + size / 3;
        let bs = o.range_read(offset..end).await.unwrap();
        assert_eq!(bs, &content[offset as usize..end as usize]);

        let bs = o.range_read(offset..).await.unwrap();
        assert_eq!(bs, &content[offset as usize..]);

        // A range past the end is cut at the end.
        let bs = o.range_read(offset..size + 100).await.unwrap();
        assert_eq!(bs, &content[offset as usize..]);

        o.delete().await.unwrap();
    }
}

#[tokio::test]
async fn test_reader() {
    for op in operators() {
        let o = op.object(&gen_name());
        let content = gen_bytes();
        o.write(content.clone()).await.unwrap();

        let mut r = o.range_reader(1..).await.unwrap();
        let mut buf = Vec::new();
        r.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, &content[1..]);

        o.delete().await.unwrap();
    }
}

#[tokio::test]
async fn test_read_not_exist() {
    for op in operators() {
        let err = op.object(&gen_name()).read().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ObjectNotFound, "{:?}", op.metadata());
    }
}

#[tokio::test]
async fn test_read_dir_path_fails() {
    for op in operators() {
        let err = op
            .object(&format!("{}/", gen_name()))
            .read()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ObjectIsADirectory);
    }
}
