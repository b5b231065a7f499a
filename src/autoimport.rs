//! Import-path guessing for short package qualifiers.
//!
//! `http.Handler` names a package only by its conventional short name. The
//! guesser rewrites a one-line snippet such as
//! `package hack\nvar i http.Handler` into one with `import "net/http"`
//! added, the way goimports would, by searching the packages visible from
//! the search directory.

use std::path::{Path, PathBuf};

use goimpl_parser::ast::Decl;
use goimpl_parser::parse_source;
use goimpl_parser::walk::{QualifiedRefs, Visitor};
use walkdir::WalkDir;

use crate::error::Result;
use crate::locator::Locator;

pub trait ImportGuesser {
    /// Returns `snippet` with an import added for each package qualifier it
    /// does not import yet. Qualifiers with no plausible package are left
    /// alone.
    fn process(&self, locator: &Locator<'_>, src_dir: &Path, snippet: &str) -> Result<String>;
}

/// Default guesser: searches sibling files' imports, then the main
/// module(s), then the standard library, then required modules.
#[derive(Debug, Default, Clone, Copy)]
pub struct PackageIndex;

impl ImportGuesser for PackageIndex {
    fn process(&self, locator: &Locator<'_>, src_dir: &Path, snippet: &str) -> Result<String> {
        let Ok(file) = parse_source(snippet) else {
            return Ok(snippet.to_string());
        };

        let mut refs = QualifiedRefs::default();
        for decl in &file.decls {
            if let Decl::Value(v) = decl {
                for spec in &v.specs {
                    if let Some(typ) = &spec.typ {
                        refs.visit_type(typ);
                    }
                }
            }
        }

        let mut added: Vec<String> = Vec::new();
        for (qualifier, name) in refs.refs {
            if file.import_for(&qualifier).is_some() {
                continue;
            }
            let _span = tracing::debug_span!("guess_import", %qualifier, %name).entered();
            match guess(locator, src_dir, &qualifier, &name) {
                Some(path) => {
                    tracing::debug!(%path, "guessed import");
                    if !added.contains(&path) {
                        added.push(path);
                    }
                }
                None => tracing::debug!("no candidate package"),
            }
        }

        if added.is_empty() {
            return Ok(snippet.to_string());
        }
        let (head, rest) = snippet.split_once('\n').unwrap_or((snippet, ""));
        let imports: String = added.iter().map(|p| format!("import \"{p}\"\n")).collect();
        Ok(format!("{head}\n\n{imports}\n{rest}"))
    }
}

/// A directory that may hold the wanted package.
struct Candidate {
    import_path: String,
    dir: PathBuf,
}

fn guess(locator: &Locator<'_>, src_dir: &Path, qualifier: &str, name: &str) -> Option<String> {
    let verify = |mut candidates: Vec<Candidate>| -> Option<String> {
        candidates.sort_by(|a, b| {
            a.import_path
                .len()
                .cmp(&b.import_path.len())
                .then_with(|| a.import_path.cmp(&b.import_path))
        });
        candidates
            .into_iter()
            .find(|c| declares(locator, c, qualifier, name))
            .map(|c| c.import_path)
    };

    let tiers: [&dyn Fn() -> Vec<Candidate>; 4] = [
        &|| sibling_imports(locator, src_dir, qualifier),
        &|| {
            locator
                .modules
                .main_modules(locator.fs, src_dir)
                .into_iter()
                .flat_map(|(module, root)| walk_packages(&root, &module, qualifier, true))
                .collect()
        },
        &|| walk_packages(&locator.ctx.goroot.join("src"), "", qualifier, false),
        &|| {
            locator
                .modules
                .required_modules(locator.fs, src_dir)
                .into_iter()
                .flat_map(|(module, root)| walk_packages(&root, &module, qualifier, false))
                .collect()
        },
    ];

    tiers.iter().find_map(|tier| verify(tier()))
}

/// Packages imported under `qualifier` by files next to the search dir.
fn sibling_imports(locator: &Locator<'_>, src_dir: &Path, qualifier: &str) -> Vec<Candidate> {
    let Ok(files) = locator.buildable_files(src_dir) else {
        return Vec::new();
    };
    let mut out: Vec<Candidate> = Vec::new();
    for (_, source) in files {
        let Ok(ast) = parse_source(&source) else {
            continue;
        };
        let Some(imp) = ast.import_for(qualifier) else {
            continue;
        };
        if out.iter().any(|c| c.import_path == imp.path) {
            continue;
        }
        if let Ok(dir) = locator.modules.package_dir(locator.fs, &imp.path, src_dir) {
            out.push(Candidate {
                import_path: imp.path.clone(),
                dir,
            });
        }
    }
    out
}

/// Walks `root` for directories whose last path elements could name a
/// package called `qualifier`. `prefix` is the import path of `root`.
fn walk_packages(root: &Path, prefix: &str, qualifier: &str, allow_internal: bool) -> Vec<Candidate> {
    let mut out = Vec::new();
    let walker = WalkDir::new(root).follow_links(true).into_iter().filter_entry(|e| {
        if e.depth() == 0 {
            return true;
        }
        let name = e.file_name().to_string_lossy();
        e.file_type().is_dir() && !skip_dir(&name, allow_internal)
    });

    for entry in walker.filter_map(|e| e.ok()) {
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let rel = rel.to_string_lossy().replace('\\', "/");
        let import_path = match (prefix.is_empty(), rel.is_empty()) {
            (true, _) => rel,
            (false, true) => prefix.to_string(),
            (false, false) => format!("{prefix}/{rel}"),
        };
        if import_path.is_empty() || !could_be_package(&import_path, qualifier) {
            continue;
        }
        out.push(Candidate {
            import_path,
            dir: entry.path().to_path_buf(),
        });
    }
    out
}

fn skip_dir(name: &str, allow_internal: bool) -> bool {
    name.starts_with('.')
        || name.starts_with('_')
        || matches!(name, "testdata" | "vendor" | "cmd")
        || (name == "internal" && !allow_internal)
        || name.contains('@')
}

/// goimports' cheap pre-filter: one of the last two path elements, with
/// `-` and `.` dropped, contains the qualifier.
fn could_be_package(import_path: &str, qualifier: &str) -> bool {
    let qualifier = qualifier.to_ascii_lowercase();
    import_path
        .rsplit('/')
        .take(2)
        .map(|elem| elem.replace(['-', '.'], "").to_ascii_lowercase())
        .any(|elem| elem.contains(&qualifier))
}

/// Loads the candidate and checks its package name and that it declares
/// `name` at top level.
fn declares(locator: &Locator<'_>, c: &Candidate, qualifier: &str, name: &str) -> bool {
    let Ok(pkg) = locator.load_dir(&c.dir, &c.import_path) else {
        return false;
    };
    pkg.name == qualifier
        && pkg
            .files
            .iter()
            .any(|f| f.ast.top_level_names().contains(&name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_prefilter() {
        assert!(could_be_package("net/http", "http"));
        assert!(could_be_package("gopkg.in/yaml.v3", "yaml"));
        assert!(could_be_package("github.com/go-kit/kit/log", "kit"));
        assert!(!could_be_package("a/b/c/io", "http"));
    }

    #[test]
    fn skipped_directories() {
        assert!(skip_dir("testdata", true));
        assert!(skip_dir(".git", true));
        assert!(skip_dir("internal", false));
        assert!(!skip_dir("internal", true));
        assert!(!skip_dir("http", false));
    }
}
