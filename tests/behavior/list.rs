use futures::TryStreamExt;
use opendal::ErrorKind;

use crate::utils::{gen_bytes, gen_name, operators};

#[tokio::test]
async fn test_list_dir() {
    for op in operators().into_iter().filter(|op| op.metadata().can_list()) {
        let dir = format!("{}/", gen_name());
        let file = format!("{dir}{}", gen_name());
        let sub = format!("{dir}{}/", gen_name());

        op.object(&file).write(gen_bytes()).await.unwrap();
        op.object(&format!("{sub}{}", gen_name()))
            .write(gen_bytes())
            .await
            .unwrap();

        let mut paths: Vec<String> = op
            .object(&dir)
            .list()
            .await
            .unwrap()
            .map_ok(|o| o.path().to_string())
            .try_collect()
            .await
            .unwrap();
        paths.sort();

        let mut expected = vec![file.clone(), sub.clone()];
        expected.sort();
        assert_eq!(paths, expected, "{:?}", op.metadata());
    }
}

#[tokio::test]
async fn test_list_missing_dir_is_empty() {
    for op in operators().into_iter().filter(|op| op.metadata().can_list()) {
        let objects: Vec<_> = op
            .object(&format!("{}/", gen_name()))
            .list()
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert!(objects.is_empty(), "{:?}", op.metadata());
    }
}

#[tokio::test]
async fn test_list_file_path_fails() {
    for op in operators() {
        let err = op.object(&gen_name()).list().await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::ObjectNotADirectory);
    }
}
