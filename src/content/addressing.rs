use std::path::PathBuf;

/// Relative path of a stored file: one single-character directory per level
/// of `depth`, taken from the leading characters of the hash, then the hash
/// itself as the file name.
///
/// `depth` must stay fixed for the lifetime of a store; files written under
/// one depth are not found under another.
pub fn path_for(hash: &str, depth: u8) -> PathBuf {
    let mut path = PathBuf::new();
    let mut buf = [0u8; 4];
    for c in hash.chars().take(depth as usize) {
        path.push(&*c.encode_utf8(&mut buf));
    }
    path.push(hash);
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_sharded_path() {
        assert_eq!(path_for("abcdef", 2), Path::new("a/b/abcdef"));
        assert_eq!(path_for("abcdef", 3), Path::new("a/b/c/abcdef"));
    }

    #[test]
    fn test_flat_layout() {
        assert_eq!(path_for("abcdef", 0), Path::new("abcdef"));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(path_for("0f1e2d", 2), path_for("0f1e2d", 2));
    }
}
