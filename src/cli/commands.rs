use std::io::Write;

use anyhow::{Result, bail};
use futures::TryStreamExt;
use opendal_core::{ErrorKind, Operator};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::info;

use super::Target;
use crate::config::Profiles;

pub(super) async fn cat(profiles: &Profiles, target: &str) -> Result<()> {
    let (op, path) = Target::parse(target).resolve(profiles)?;
    cat_to(&op, &path, &mut tokio::io::stdout()).await
}

pub(super) async fn stat(profiles: &Profiles, target: &str) -> Result<()> {
    let (op, path) = Target::parse(target).resolve(profiles)?;
    stat_to(&op, &path, &mut std::io::stdout()).await
}

pub(super) async fn ls(profiles: &Profiles, target: &str, recursive: bool) -> Result<()> {
    let (op, path) = Target::parse(target).resolve(profiles)?;
    ls_to(&op, &path, recursive, &mut std::io::stdout()).await
}

pub(super) async fn rm(profiles: &Profiles, target: &str) -> Result<()> {
    let (op, path) = Target::parse(target).resolve(profiles)?;
    op.object(&path).delete().await?;
    info!(path = %path, "removed");
    Ok(())
}

pub(super) async fn cp(profiles: &Profiles, src: &str, dst: &str) -> Result<()> {
    let (src_op, src_path) = Target::parse(src).resolve(profiles)?;
    let (dst_op, dst_path) = Target::parse(dst).resolve(profiles)?;
    copy(&src_op, &src_path, &dst_op, &dst_path).await
}

pub(super) async fn mkdir(profiles: &Profiles, target: &str) -> Result<()> {
    let (op, path) = Target::parse(target).resolve(profiles)?;
    op.object(&as_dir(&path)).create().await?;
    Ok(())
}

fn as_dir(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

async fn cat_to<W: AsyncWrite + Unpin>(op: &Operator, path: &str, w: &mut W) -> Result<()> {
    let mut r = op.object(path).reader().await?;
    tokio::io::copy(&mut r, w).await?;
    w.flush().await?;
    Ok(())
}

async fn stat_to<W: Write>(op: &Operator, path: &str, w: &mut W) -> Result<()> {
    let o = op.object(path);
    let meta = o.metadata().await?;

    writeln!(w, "path: {}", o.path())?;
    writeln!(w, "mode: {}", meta.mode())?;
    if meta.mode().is_file() {
        writeln!(w, "size: {}", meta.content_length())?;
    }
    if let Some(etag) = meta.etag() {
        writeln!(w, "etag: {etag}")?;
    }
    if let Some(t) = meta.last_modified() {
        writeln!(w, "last-modified: {}", t.to_rfc3339())?;
    }
    Ok(())
}

async fn ls_to<W: Write>(op: &Operator, path: &str, recursive: bool, w: &mut W) -> Result<()> {
    let path = if path.ends_with('/') || path.is_empty() {
        as_dir(path)
    } else {
        // Virtual directories of kv services can't be stat without the trailing `/`.
        match op.object(path).metadata().await {
            Ok(meta) if meta.mode().is_file() => {
                writeln!(w, "{}", op.object(path).path())?;
                return Ok(());
            }
            Ok(_) => as_dir(path),
            Err(err) if err.kind() == ErrorKind::ObjectNotFound => as_dir(path),
            Err(err) => return Err(err.into()),
        }
    };

    let mut dirs = vec![op.object(&path)];
    while let Some(dir) = dirs.pop() {
        let mut lister = dir.list().await?;
        while let Some(o) = lister.try_next().await? {
            writeln!(w, "{}", o.path())?;
            if recursive && o.path().ends_with('/') {
                dirs.push(o);
            }
        }
    }
    Ok(())
}

async fn copy(src_op: &Operator, src: &str, dst_op: &Operator, dst: &str) -> Result<()> {
    let src = src_op.object(src);
    if src.path().ends_with('/') {
        bail!("copying directory {} is not supported", src.path());
    }

    let dst = if dst.ends_with('/') {
        format!("{dst}{}", src.name())
    } else {
        dst.to_string()
    };

    let bs = src.read().await?;
    let size = bs.len();
    dst_op.object(&dst).write(bs).await?;

    info!(src = %src.path(), dst = %dst, size, "copied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use opendal_services::MemoryBuilder;

    use super::*;

    fn operator() -> Operator {
        Operator::create(MemoryBuilder::default()).unwrap().finish()
    }

    #[tokio::test]
    async fn test_cat_and_stat() {
        let op = operator();
        op.object("a.txt").write("hello").await.unwrap();

        let mut out = Vec::new();
        cat_to(&op, "/a.txt", &mut out).await.unwrap();
        assert_eq!(out, b"hello");

        let mut out = Vec::new();
        stat_to(&op, "a.txt", &mut out).await.unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("path: a.txt\n"));
        assert!(out.contains("mode: file\n"));
        assert!(out.contains("size: 5\n"));
    }

    #[tokio::test]
    async fn test_ls() {
        let op = operator();
        op.object("d/a").write("1").await.unwrap();
        op.object("d/sub/b").write("2").await.unwrap();

        let mut out = Vec::new();
        ls_to(&op, "d/", false, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "d/a\nd/sub/\n");

        let mut out = Vec::new();
        ls_to(&op, "d", true, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "d/a\nd/sub/\nd/sub/b\n");

        let mut out = Vec::new();
        ls_to(&op, "d/a", false, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "d/a\n");

        let mut out = Vec::new();
        ls_to(&op, "missing", false, &mut out).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_copy() {
        let src = operator();
        let dst = operator();
        src.object("dir/file").write("data").await.unwrap();

        copy(&src, "dir/file", &dst, "backup/").await.unwrap();
        assert_eq!(dst.object("backup/file").read().await.unwrap(), b"data");

        copy(&src, "dir/file", &dst, "renamed").await.unwrap();
        assert_eq!(dst.object("renamed").read().await.unwrap(), b"data");

        assert!(copy(&src, "dir/", &dst, "x").await.is_err());
    }

    #[test]
    fn test_as_dir() {
        assert_eq!(as_dir("a"), "a/");
        assert_eq!(as_dir("a/"), "a/");
    }
}
