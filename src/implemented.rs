//! Methods the receiver's type already declares.

use std::collections::HashSet;
use std::path::Path;

use goimpl_parser::parse_source;

use crate::error::{Error, Result};
use crate::fs::SourceFs;
use crate::receiver::ReceiverSpec;
use crate::reify::MethodSignature;

/// Names in `methods` that already have a method declared on `recv`'s base
/// type in `dir`.
///
/// Every `.go` file in the directory is parsed, test files and files of
/// other build configurations included; one that does not parse fails the
/// whole scan. Generic receivers match on the base name alone.
pub fn implemented_methods(
    fs: &dyn SourceFs,
    dir: &Path,
    recv: &ReceiverSpec,
    methods: &[MethodSignature],
) -> Result<HashSet<String>> {
    let _span = tracing::info_span!("implemented", recv = %recv.type_name, dir = %dir.display()).entered();

    let wanted: HashSet<&str> = methods.iter().map(|m| m.name.as_str()).collect();
    let mut found = HashSet::new();

    for entry in fs.read_dir(dir)? {
        if entry.is_dir || !entry.name.ends_with(".go") {
            continue;
        }
        let path = dir.join(&entry.name);
        let source = fs.read_to_string(&path)?;
        let file = parse_source(&source).map_err(|failure| Error::Syntax {
            path: path.clone(),
            failure,
        })?;

        for func in file.funcs() {
            let Some(r) = &func.recv else {
                continue;
            };
            if r.base_type_name() != Some(recv.type_name.as_str()) {
                continue;
            }
            if wanted.contains(func.name.name.as_str()) {
                tracing::debug!(method = %func.name.name, file = %entry.name, "already implemented");
                found.insert(func.name.name.clone());
            }
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use super::*;
    use crate::fs::{DirEntry, OverlayFs};

    struct Empty;

    impl SourceFs for Empty {
        fn read_to_string(&self, path: &Path) -> Result<String> {
            Err(Error::io(path, std::io::ErrorKind::NotFound.into()))
        }
        fn read_dir(&self, _: &Path) -> Result<Vec<DirEntry>> {
            Ok(Vec::new())
        }
        fn is_dir(&self, _: &Path) -> bool {
            true
        }
        fn is_file(&self, _: &Path) -> bool {
            false
        }
    }

    fn sig(name: &str) -> MethodSignature {
        MethodSignature {
            name: name.to_string(),
            params: Vec::new(),
            results: Vec::new(),
            doc: None,
        }
    }

    fn overlay(files: &[(&str, &str)]) -> OverlayFs<Empty> {
        let files: BTreeMap<PathBuf, String> = files
            .iter()
            .map(|(name, src)| (PathBuf::from("/w").join(name), src.to_string()))
            .collect();
        OverlayFs::new(Empty, files)
    }

    #[test]
    fn matches_on_base_type_name() {
        let fs = overlay(&[
            ("a.go", "package w\ntype T[K any] struct{}\nfunc (t *T[K]) Read() {}\nfunc (U) Write() {}\n"),
            ("a_test.go", "package w\nfunc (t T[K]) Close() error { return nil }\n"),
        ]);
        let recv = ReceiverSpec::parse("t *T[K]").unwrap();
        let methods = [sig("Read"), sig("Write"), sig("Close"), sig("Flush")];

        let got = implemented_methods(&fs, Path::new("/w"), &recv, &methods).unwrap();
        let mut got: Vec<_> = got.into_iter().collect();
        got.sort();
        assert_eq!(got, ["Close", "Read"]);
    }

    #[test]
    fn unparsable_file_aborts() {
        let fs = overlay(&[("a.go", "package w\nfunc (t *T) Read( {}\n")]);
        let recv = ReceiverSpec::parse("t *T").unwrap();
        let err = implemented_methods(&fs, Path::new("/w"), &recv, &[sig("Read")]).unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }), "{err}");
    }
}
