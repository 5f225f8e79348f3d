//! Path helpers
//!
//! OpenDAL paths are `/`-separated, relative to the operator root and never
//! start with `/` (the root itself is `"/"`). Directories end with `/`.
//! Roots are absolute and always start and end with `/`.

/// Normalize a user supplied path.
///
/// - Whitespace around the path is trimmed.
/// - Repeated `/` are collapsed and the leading `/` is removed.
/// - A trailing `/` is kept, it marks a directory.
/// - An empty path is the root `"/"`.
pub fn normalize_path(path: &str) -> String {
    let path = path.trim();
    let has_trailing = path.ends_with('/');

    let mut p = path
        .split('/')
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if p.is_empty() {
        return "/".to_string();
    }
    if has_trailing {
        p.push('/');
    }
    p
}

/// Normalize a root so that it starts and ends with `/`.
pub fn normalize_root(root: &str) -> String {
    let mut v = root
        .trim()
        .split('/')
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if !v.starts_with('/') {
        v.insert(0, '/');
    }
    if !v.ends_with('/') {
        v.push('/')
    }
    v
}

/// Build the service key of `path` under `root`, without leading `/`.
///
/// `("/a/", "b")` gives `"a/b"` and `("/", "/")` gives `""`.
pub fn build_abs_path(root: &str, path: &str) -> String {
    debug_assert!(root.starts_with('/'), "root must be absolute");
    debug_assert!(root.ends_with('/'), "root must end with /");

    let p = root[1..].to_string();

    if path == "/" {
        p
    } else {
        debug_assert!(!path.starts_with('/'), "path must not start with /");
        p + path
    }
}

/// Build the absolute path of `path` under `root`, with leading `/`.
pub fn build_rooted_abs_path(root: &str, path: &str) -> String {
    debug_assert!(root.starts_with('/'), "root must be absolute");
    debug_assert!(root.ends_with('/'), "root must end with /");

    let p = root.to_string();

    if path == "/" {
        p
    } else {
        debug_assert!(!path.starts_with('/'), "path must not start with /");
        p + path
    }
}

/// Strip `root` from a path returned by a service.
///
/// The service path may be rooted (`/a/b`) or not (`a/b`).
pub fn build_rel_path(root: &str, path: &str) -> String {
    let rel = path
        .strip_prefix(root)
        .or_else(|| path.strip_prefix(root.trim_start_matches('/')))
        .unwrap_or(path);

    if rel.is_empty() {
        "/".to_string()
    } else {
        rel.to_string()
    }
}

/// Get the last segment of a path, directories keep their trailing `/`.
pub fn get_basename(path: &str) -> &str {
    if path == "/" {
        return path;
    }

    if !path.ends_with('/') {
        return path
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(path);
    }

    let trimmed = &path[..path.len() - 1];
    match trimmed.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Get the parent directory of a path, `"/"` for top level entries.
pub fn get_parent(path: &str) -> &str {
    if path == "/" {
        return path;
    }

    let trimmed = path.strip_suffix('/').unwrap_or(path);
    match trimmed.rfind('/') {
        Some(idx) => &path[..idx + 1],
        None => "/",
    }
}
