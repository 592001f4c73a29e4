/// Path processing utility functions / 路径处理工具函数

/// Clean and normalize path / 清理和规范化路径
/// 1. Replace backslashes with forward slashes / 将反斜杠替换为正斜杠
/// 2. Ensure path starts with / / 确保路径以 / 开头
/// 3. Clean . and .. in path / 清理路径中的 . 和 ..
pub fn fix_and_clean_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let path = if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    };

    // Clean path / 清理路径
    clean_path(&path)
}

/// Clean path, handle ., .. and duplicate / / 清理路径，处理 . 和 .. 和重复的 /
fn clean_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }

    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

/// Whether any component of the path is `..` / 路径是否包含 ..
pub fn has_parent_ref(path: &str) -> bool {
    path.replace('\\', "/").split('/').any(|part| part == "..")
}

/// Whether `path` is `prefix` itself or lies below it, compared as written
/// (no normalization) on component boundaries / 按路径分段判断前缀
pub fn has_path_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return path.starts_with('/');
    }
    match path.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

/// Join a directory and a child name / 拼接路径
pub fn join_path(dir: &str, name: &str) -> String {
    fix_and_clean_path(&format!("{}/{}", dir, name))
}

/// Parent directory of a cleaned path / 获取父目录
pub fn get_parent_path(path: &str) -> String {
    let path = fix_and_clean_path(path);
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

/// Last component of a path / 获取文件名
pub fn base_name(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_and_clean_path() {
        assert_eq!(fix_and_clean_path(""), "/");
        assert_eq!(fix_and_clean_path("."), "/");
        assert_eq!(fix_and_clean_path(".."), "/");
        assert_eq!(fix_and_clean_path("../.."), "/");
        assert_eq!(fix_and_clean_path("a/b/c"), "/a/b/c");
        assert_eq!(fix_and_clean_path("/a/b/c"), "/a/b/c");
        assert_eq!(fix_and_clean_path("a\\b\\c"), "/a/b/c");
        assert_eq!(fix_and_clean_path("/a//b///c"), "/a/b/c");
        assert_eq!(fix_and_clean_path("/a/./b/../c"), "/a/c");
    }

    #[test]
    fn test_has_parent_ref() {
        assert!(has_parent_ref("/a/../b"));
        assert!(has_parent_ref(".."));
        assert!(has_parent_ref("a\\..\\b"));
        assert!(!has_parent_ref("/a/..b/c"));
        assert!(!has_parent_ref("/a/b"));
    }

    #[test]
    fn test_has_path_prefix() {
        assert!(has_path_prefix("/tmp/reg", "/tmp/reg"));
        assert!(has_path_prefix("/tmp/reg/a", "/tmp/reg"));
        assert!(has_path_prefix("/tmp/reg/a", "/tmp/reg/"));
        assert!(!has_path_prefix("/tmp/registry", "/tmp/reg"));
        assert!(!has_path_prefix("/a", "/tmp/reg"));
        assert!(has_path_prefix("/anything", "/"));
    }

    #[test]
    fn test_join_and_parent() {
        assert_eq!(join_path("/a", "b"), "/a/b");
        assert_eq!(join_path("/a/", "/b/"), "/a/b");
        assert_eq!(join_path("/", "b"), "/b");
        assert_eq!(get_parent_path("/"), "/");
        assert_eq!(get_parent_path("/test"), "/");
        assert_eq!(get_parent_path("/test/file"), "/test");
        assert_eq!(base_name("/a/b/c"), "c");
        assert_eq!(base_name("/a/b/"), "b");
        assert_eq!(base_name("/"), "");
    }
}
