//! File access for the pipeline.
//!
//! Every read goes through [`SourceFs`] so an editor can substitute unsaved
//! buffers ([`OverlayFs`]) for what is on disk.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

pub trait SourceFs {
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Entries of `dir`, sorted by name.
    fn read_dir(&self, dir: &Path) -> Result<Vec<DirEntry>>;

    fn is_dir(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;
}

/// The real file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFs;

impl SourceFs for OsFs {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| Error::io(path, e))
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        let rd = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
        let mut entries = Vec::new();
        for entry in rd {
            let entry = entry.map_err(|e| Error::io(dir, e))?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            // Follow symlinks the way `os.Stat` does.
            let is_dir = std::fs::metadata(entry.path()).is_ok_and(|m| m.is_dir());
            entries.push(DirEntry { name, is_dir });
        }
        entries.sort();
        Ok(entries)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

impl<F: SourceFs + ?Sized> SourceFs for Box<F> {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        (**self).read_to_string(path)
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        (**self).read_dir(dir)
    }

    fn is_dir(&self, path: &Path) -> bool {
        (**self).is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        (**self).is_file(path)
    }
}

/// Unsaved editor buffers layered over another file system.
pub struct OverlayFs<F> {
    base: F,
    files: BTreeMap<PathBuf, String>,
}

impl<F: SourceFs> OverlayFs<F> {
    pub fn new(base: F, files: BTreeMap<PathBuf, String>) -> Self {
        let files = files
            .into_iter()
            .map(|(path, text)| (clean(&path), text))
            .collect();
        Self { base, files }
    }

    fn lookup(&self, path: &Path) -> Option<&String> {
        self.files.get(&clean(path))
    }
}

impl<F: SourceFs> SourceFs for OverlayFs<F> {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        match self.lookup(path) {
            Some(text) => Ok(text.clone()),
            None => self.base.read_to_string(path),
        }
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        let dir = clean(dir);
        let mut entries = match self.base.read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) if self.files.keys().any(|p| p.parent() == Some(dir.as_path())) => Vec::new(),
            Err(e) => return Err(e),
        };
        for path in self.files.keys() {
            if path.parent() != Some(dir.as_path()) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !entries.iter().any(|e| e.name == name) {
                entries.push(DirEntry {
                    name: name.to_string(),
                    is_dir: false,
                });
            }
        }
        entries.sort();
        Ok(entries)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let path = clean(path);
        self.base.is_dir(&path) || self.files.keys().any(|p| p.starts_with(&path) && *p != path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.lookup(path).is_some() || self.base.is_file(path)
    }
}

/// Parses the overlay archive editors write on stdin: for each file, its
/// name on one line, its size in bytes on the next, then exactly that many
/// bytes of content.
pub fn parse_overlay_archive(input: &[u8]) -> Result<BTreeMap<PathBuf, String>> {
    let mut files = BTreeMap::new();
    let mut rest = input;

    while !rest.is_empty() {
        let (name, after_name) = split_line(rest)
            .ok_or_else(|| Error::Overlay("missing file name".to_string()))?;
        let (size, after_size) = split_line(after_name)
            .ok_or_else(|| Error::Overlay(format!("missing size for {name}")))?;
        let size: usize = size
            .trim()
            .parse()
            .map_err(|e| Error::Overlay(format!("bad size for {name}: {e}")))?;
        if after_size.len() < size {
            return Err(Error::Overlay(format!(
                "{name}: want {size} bytes, have {}",
                after_size.len()
            )));
        }
        let (body, tail) = after_size.split_at(size);
        let text = String::from_utf8(body.to_vec())
            .map_err(|_| Error::Overlay(format!("{name}: contents are not UTF-8")))?;
        files.insert(clean(Path::new(name)), text);
        rest = tail;
    }

    Ok(files)
}

fn split_line(buf: &[u8]) -> Option<(&str, &[u8])> {
    let nl = memchr::memchr(b'\n', buf)?;
    let line = std::str::from_utf8(&buf[..nl]).ok()?;
    Some((line, &buf[nl + 1..]))
}

/// Lexical cleanup (`a/./b/../c` → `a/c`), no file-system access.
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_with_two_files() {
        let archive = b"/w/a.go\n13\npackage a\n\n///w/b.go\n10\npackage b\n";
        let files = parse_overlay_archive(archive).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[Path::new("/w/a.go")], "package a\n\n//");
        assert_eq!(files[Path::new("/w/b.go")], "package b\n");
    }

    #[test]
    fn archive_short_body_is_rejected() {
        let err = parse_overlay_archive(b"/w/a.go\n100\npackage a\n").unwrap_err();
        assert!(matches!(err, Error::Overlay(_)), "{err}");
    }

    #[test]
    fn overlay_shadows_and_adds_files() {
        struct Empty;
        impl SourceFs for Empty {
            fn read_to_string(&self, path: &Path) -> Result<String> {
                Err(Error::io(path, std::io::ErrorKind::NotFound.into()))
            }
            fn read_dir(&self, dir: &Path) -> Result<Vec<DirEntry>> {
                Err(Error::io(dir, std::io::ErrorKind::NotFound.into()))
            }
            fn is_dir(&self, _: &Path) -> bool {
                false
            }
            fn is_file(&self, _: &Path) -> bool {
                false
            }
        }

        let mut files = BTreeMap::new();
        files.insert(PathBuf::from("/w/./x.go"), "package x\n".to_string());
        let fs = OverlayFs::new(Empty, files);

        assert!(fs.is_dir(Path::new("/w")));
        assert!(fs.is_file(Path::new("/w/x.go")));
        assert_eq!(fs.read_to_string(Path::new("/w/x.go")).unwrap(), "package x\n");
        let names: Vec<_> = fs.read_dir(Path::new("/w")).unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["x.go"]);
    }
}
