//! Tracing a page back to the file that actually holds its text.
//!
//! A page file can stand in for another in three ways: it can be a symbolic
//! link, it can be one of several hard links to the same inode, or it can be
//! a stub whose only content is a `.so` request naming another page. The
//! [`Resolver`] follows whichever of these it is asked to and returns the
//! final path; a result that differs from the input marks the input as an
//! alias.

pub mod error;

use self::error::{ErrorKind, Result};
use bitflags::bitflags;
use exn::ResultExt;
use mandb_compress::KNOWN_SUFFIXES;
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// How many `.so` hops to follow before assuming a page includes itself.
pub const DEFAULT_MAX_DEPTH: usize = 10;

bitflags! {
    /// Which kinds of indirection [`Resolver::resolve`] follows.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Follow: u8 {
        const SO_DIRECTIVE = 0b001;
        const SYMLINK      = 0b010;
        const HARDLINK     = 0b100;
    }
}

/// Resolves pages within one hierarchy.
///
/// `.so` requests are relative to the hierarchy root (`.so man1/ls.1`), so
/// each hierarchy gets its own resolver. The resolver holds no state between
/// calls.
#[derive(Debug, Clone)]
pub struct Resolver {
    root: PathBuf,
    max_depth: usize,
}

impl Resolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), max_depth: DEFAULT_MAX_DEPTH }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find the ultimate source of the page at `path`.
    ///
    /// 1. A symlink is canonicalized in full.
    /// 2. A file with several hard links is renamed to the smallest name in
    ///    its directory sharing its inode, so that every link resolves to the
    ///    same path no matter which one was asked about.
    /// 3. A `.so` request on the first non-comment line is followed (relative
    ///    targets only) and the target resolved again with every flag set.
    #[instrument(level = "debug", skip(self, path), fields(path = %path.display(), ?follow))]
    pub fn resolve(&self, path: &Path, follow: Follow) -> Result<PathBuf> {
        self.resolve_at(path, follow, 0)
    }

    fn resolve_at(&self, path: &Path, follow: Follow, depth: usize) -> Result<PathBuf> {
        let mut current = path.to_path_buf();
        if follow.contains(Follow::SYMLINK) && is_symlink(path)? {
            current = match fs::canonicalize(path) {
                Ok(target) => target,
                Err(err) if err.kind() == io::ErrorKind::NotFound => exn::bail!(ErrorKind::Dangling(path.to_path_buf())),
                Err(err) => return Err(err).or_raise(|| ErrorKind::Unreadable(path.to_path_buf())),
            };
        }
        if follow.contains(Follow::HARDLINK) {
            current = canonical_hardlink(&current)?;
        }
        if follow.contains(Follow::SO_DIRECTIVE)
            && let Some(target) = so_request(&current)?
        {
            if depth >= self.max_depth {
                exn::bail!(ErrorKind::Cycle(path.to_path_buf()));
            }
            let next = self.locate(&target)?;
            tracing::trace!(from = %current.display(), to = %next.display(), depth, "Following .so request");
            return self.resolve_at(&next, Follow::all(), depth + 1);
        }
        Ok(current)
    }

    /// Find the file a `.so` request refers to, allowing for compression.
    fn locate(&self, target: &Path) -> Result<PathBuf> {
        let candidate = self.root.join(target);
        if candidate.is_file() {
            return Ok(candidate);
        }
        for suffix in KNOWN_SUFFIXES {
            let mut compressed = candidate.clone().into_os_string();
            compressed.push(".");
            compressed.push(suffix);
            let compressed = PathBuf::from(compressed);
            if compressed.is_file() {
                return Ok(compressed);
            }
        }
        exn::bail!(ErrorKind::MissingTarget(candidate))
    }
}

fn is_symlink(path: &Path) -> Result<bool> {
    let meta = fs::symlink_metadata(path).or_raise(|| ErrorKind::Unreadable(path.to_path_buf()))?;
    Ok(meta.file_type().is_symlink())
}

#[cfg(unix)]
fn canonical_hardlink(path: &Path) -> Result<PathBuf> {
    use std::os::unix::fs::MetadataExt;

    let unreadable = || ErrorKind::Unreadable(path.to_path_buf());
    let meta = fs::symlink_metadata(path).or_raise(unreadable)?;
    let Some(dir) = path.parent().filter(|_| meta.nlink() > 1) else {
        return Ok(path.to_path_buf());
    };
    let mut smallest = None;
    for entry in fs::read_dir(dir).or_raise(unreadable)? {
        let entry = entry.or_raise(unreadable)?;
        let Ok(other) = entry.metadata() else {
            continue;
        };
        if other.ino() == meta.ino() && other.dev() == meta.dev() {
            let name = entry.file_name();
            if smallest.as_ref().is_none_or(|current| name < *current) {
                smallest = Some(name);
            }
        }
    }
    Ok(smallest.map_or_else(|| path.to_path_buf(), |name| dir.join(name)))
}

#[cfg(not(unix))]
fn canonical_hardlink(path: &Path) -> Result<PathBuf> {
    Ok(path.to_path_buf())
}

fn is_comment(line: &str) -> bool {
    line.starts_with(".\\\"") || line.starts_with("'\\\"")
}

/// The relative target of a `.so` request on the first non-comment line.
fn so_request(path: &Path) -> Result<Option<PathBuf>> {
    let unreadable = || ErrorKind::Unreadable(path.to_path_buf());
    let mut reader = mandb_compress::open(path).or_raise(unreadable)?;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).or_raise(unreadable)? == 0 {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if line.is_empty() || is_comment(line) {
            continue;
        }
        return Ok(parse_so(line));
    }
}

fn parse_so(line: &str) -> Option<PathBuf> {
    let rest = line.strip_prefix(".so").filter(|rest| rest.starts_with(char::is_whitespace))?;
    let target = rest.split("\\\"").next().unwrap_or_default().trim();
    if target.is_empty() {
        return None;
    }
    let target = Path::new(target);
    if target.is_absolute() {
        tracing::debug!(target = %target.display(), "Not following absolute .so request");
        return None;
    }
    Some(target.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mandb_compress::Compression;
    use rstest::rstest;
    use tempfile::TempDir;

    const PAGE: &str = ".TH FOO 1\n.SH NAME\nfoo \\- does foo\n";

    fn hierarchy() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("man1")).unwrap();
        dir
    }

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::write(&path, content).unwrap();
        path
    }

    #[rstest]
    #[case(".so man1/foo.1", Some("man1/foo.1"))]
    #[case(".so  man1/foo.1  \\\" trailing comment", Some("man1/foo.1"))]
    #[case(".so /usr/share/man/man1/foo.1", None)]
    #[case(".soelim", None)]
    #[case(".so", None)]
    #[case(".TH FOO 1", None)]
    fn test_parse_so(#[case] line: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_so(line), expected.map(PathBuf::from));
    }

    #[test]
    fn test_real_page_resolves_to_itself() {
        let dir = hierarchy();
        let page = write(dir.path(), "man1/foo.1", PAGE);
        assert_eq!(Resolver::new(dir.path()).resolve(&page, Follow::all()).unwrap(), page);
    }

    #[test]
    fn test_so_request() {
        let dir = hierarchy();
        let target = write(dir.path(), "man1/foo.1", PAGE);
        let stub = write(dir.path(), "man1/bar.1", ".\\\" stub for bar\n.so man1/foo.1\n");
        let resolver = Resolver::new(dir.path());
        assert_eq!(resolver.resolve(&stub, Follow::all()).unwrap(), target);
        // Not followed unless asked.
        assert_eq!(resolver.resolve(&stub, Follow::SYMLINK | Follow::HARDLINK).unwrap(), stub);
    }

    #[test]
    fn test_so_request_finds_compressed_target() {
        let dir = hierarchy();
        let target = dir.path().join("man1/foo.1.gz");
        fs::write(&target, Compression::Gzip.compress(PAGE.as_bytes()).unwrap()).unwrap();
        let stub = dir.path().join("man1/bar.1.gz");
        fs::write(&stub, Compression::Gzip.compress(b".so man1/foo.1\n").unwrap()).unwrap();
        assert_eq!(Resolver::new(dir.path()).resolve(&stub, Follow::all()).unwrap(), target);
    }

    #[test]
    fn test_so_request_to_missing_page() {
        let dir = hierarchy();
        let stub = write(dir.path(), "man1/bar.1", ".so man1/gone.1\n");
        let err = Resolver::new(dir.path()).resolve(&stub, Follow::all()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingTarget(p) if p.ends_with("man1/gone.1")));
    }

    #[test]
    fn test_absolute_so_is_not_followed() {
        let dir = hierarchy();
        let stub = write(dir.path(), "man1/bar.1", ".so /etc/passwd\n");
        assert_eq!(Resolver::new(dir.path()).resolve(&stub, Follow::all()).unwrap(), stub);
    }

    #[test]
    fn test_self_referencing_so_is_a_cycle() {
        let dir = hierarchy();
        let stub = write(dir.path(), "man1/loop.1", ".so man1/loop.1\n");
        let err = Resolver::new(dir.path()).resolve(&stub, Follow::all()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Cycle(_)));
    }

    #[rstest]
    #[case(DEFAULT_MAX_DEPTH, true)]
    #[case(DEFAULT_MAX_DEPTH + 1, false)]
    fn test_so_depth_limit(#[case] hops: usize, #[case] resolves: bool) {
        let dir = hierarchy();
        for i in 0..hops {
            write(dir.path(), &format!("man1/p{i}.1"), &format!(".so man1/p{}.1\n", i + 1));
        }
        let last = write(dir.path(), &format!("man1/p{hops}.1"), PAGE);
        let result = Resolver::new(dir.path()).resolve(&dir.path().join("man1/p0.1"), Follow::all());
        match resolves {
            true => assert_eq!(result.unwrap(), last),
            false => assert!(matches!(&*result.unwrap_err(), ErrorKind::Cycle(_))),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_is_canonicalized() {
        let dir = hierarchy();
        let target = write(dir.path(), "man1/foo.1", PAGE);
        let link = dir.path().join("man1/bar.1");
        std::os::unix::fs::symlink("foo.1", &link).unwrap();
        let resolved = Resolver::new(dir.path()).resolve(&link, Follow::all()).unwrap();
        assert_eq!(resolved, fs::canonicalize(target).unwrap());
        assert_eq!(Resolver::new(dir.path()).resolve(&link, Follow::HARDLINK).unwrap(), link);
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink() {
        let dir = hierarchy();
        let link = dir.path().join("man1/bar.1");
        std::os::unix::fs::symlink("gone.1", &link).unwrap();
        let err = Resolver::new(dir.path()).resolve(&link, Follow::all()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Dangling(p) if *p == link));
    }

    #[cfg(unix)]
    #[test]
    fn test_hardlinks_resolve_to_smallest_name() {
        let dir = hierarchy();
        let b = write(dir.path(), "man1/b.1", PAGE);
        let a = dir.path().join("man1/a.1");
        let c = dir.path().join("man1/c.1");
        fs::hard_link(&b, &a).unwrap();
        fs::hard_link(&b, &c).unwrap();
        write(dir.path(), "man1/0-unrelated.1", PAGE);
        let resolver = Resolver::new(dir.path());
        for input in [&a, &b, &c] {
            assert_eq!(resolver.resolve(input, Follow::HARDLINK).unwrap(), a);
        }
    }
}
