//! Package location and loading.
//!
//! [`ModuleResolver`] maps an import path to a directory; [`Locator`] picks
//! the buildable files in that directory and parses them into a
//! [`Package`]. Packages are not cached: every lookup re-reads and
//! re-parses.

use std::path::{Path, PathBuf};

use goimpl_parser::ast::SourceFile;
use goimpl_parser::parse_source;

use crate::constraint::{good_file_name, header_allows};
use crate::context::BuildContext;
use crate::error::{Error, Result};
use crate::fs::SourceFs;

/// One parsed source file of a package.
#[derive(Debug)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub source: String,
    pub ast: SourceFile,
}

/// The parsed buildable files of one directory.
#[derive(Debug)]
pub struct Package {
    /// Name from the package clause.
    pub name: String,
    /// Import path, or empty for a package loaded by directory.
    pub import_path: String,
    pub dir: PathBuf,
    pub files: Vec<ParsedFile>,
}

impl Package {
    /// Import path when known, otherwise the directory.
    pub fn display_path(&self) -> String {
        if self.import_path.is_empty() {
            self.dir.display().to_string()
        } else {
            self.import_path.clone()
        }
    }
}

/// Finds the directory of an import path.
pub trait ModuleResolver {
    /// Directory holding `import_path` as seen from `src_dir`.
    fn package_dir(&self, fs: &dyn SourceFs, import_path: &str, src_dir: &Path) -> Result<PathBuf>;

    /// Main modules governing `src_dir`, as `(module path, root dir)`.
    fn main_modules(&self, fs: &dyn SourceFs, src_dir: &Path) -> Vec<(String, PathBuf)>;

    /// Required modules of the main modules, as `(module path, root dir)`.
    fn required_modules(&self, fs: &dyn SourceFs, src_dir: &Path) -> Vec<(String, PathBuf)>;
}

pub struct Locator<'a> {
    pub ctx: &'a BuildContext,
    pub fs: &'a dyn SourceFs,
    pub modules: &'a dyn ModuleResolver,
}

impl<'a> Locator<'a> {
    pub fn new(ctx: &'a BuildContext, fs: &'a dyn SourceFs, modules: &'a dyn ModuleResolver) -> Self {
        Self { ctx, fs, modules }
    }

    /// Loads the package at `import_path`, or the package in `src_dir` when
    /// the path is empty.
    pub fn load(&self, import_path: &str, src_dir: &Path) -> Result<Package> {
        let _span = tracing::info_span!("locate", path = import_path).entered();
        if import_path.is_empty() {
            return self.load_dir(src_dir, "");
        }
        let dir = self.modules.package_dir(self.fs, import_path, src_dir)?;
        tracing::debug!(dir = %dir.display(), "package directory");
        self.load_dir(&dir, import_path).map_err(|e| match e {
            Error::NoPackageInDir { reason, .. } => Error::PackageNotFound {
                path: import_path.to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Buildable `.go` files in `dir`, sorted, with their contents.
    pub fn buildable_files(&self, dir: &Path) -> Result<Vec<(PathBuf, String)>> {
        let mut out = Vec::new();
        for entry in self.fs.read_dir(dir)? {
            if entry.is_dir || !good_file_name(self.ctx, &entry.name) {
                continue;
            }
            let path = dir.join(&entry.name);
            let source = self.fs.read_to_string(&path)?;
            if header_allows(self.ctx, &source) {
                out.push((path, source));
            } else {
                tracing::trace!(file = %path.display(), "excluded by build constraints");
            }
        }
        Ok(out)
    }

    /// Parses every buildable file in `dir`. Files that fail to parse are
    /// skipped; files of a different package are an error.
    pub fn load_dir(&self, dir: &Path, import_path: &str) -> Result<Package> {
        let no_package = |reason: &str| Error::NoPackageInDir {
            dir: dir.to_path_buf(),
            reason: reason.to_string(),
        };
        if !self.fs.is_dir(dir) {
            return Err(no_package("no such directory"));
        }

        let mut name: Option<String> = None;
        let mut files = Vec::new();
        for (path, source) in self.buildable_files(dir)? {
            let ast = match parse_source(&source) {
                Ok(ast) => ast,
                Err(failure) => {
                    tracing::debug!(file = %path.display(), %failure, "skipping unparsable file");
                    continue;
                }
            };
            let file_pkg = &ast.package.name;
            match &name {
                None => name = Some(file_pkg.clone()),
                Some(first) if first != file_pkg => {
                    return Err(Error::MultiplePackages {
                        dir: dir.to_path_buf(),
                        first: first.clone(),
                        second: file_pkg.clone(),
                    });
                }
                Some(_) => {}
            }
            files.push(ParsedFile { path, source, ast });
        }

        let Some(name) = name else {
            return Err(no_package("no buildable Go source files"));
        };
        tracing::debug!(package = %name, files = files.len(), "loaded package");
        Ok(Package {
            name,
            import_path: import_path.to_string(),
            dir: dir.to_path_buf(),
            files,
        })
    }
}

// =============================================================================
// Module-aware resolution
// =============================================================================

/// Standard module search: GOROOT, main modules (go.work or go.mod),
/// vendor, module cache, GOPATH. No network and no `replace` handling.
pub struct GoModules {
    ctx: BuildContext,
}

impl GoModules {
    pub fn new(ctx: BuildContext) -> Self {
        Self { ctx }
    }

    fn find_upwards(&self, fs: &dyn SourceFs, start: &Path, file: &str) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(file))
            .find(|candidate| fs.is_file(candidate))
    }

    /// go.work modules if a workspace encloses `src_dir`, else the go.mod
    /// module. Each entry is `(module path, root, parsed go.mod)`.
    fn main(&self, fs: &dyn SourceFs, src_dir: &Path) -> Vec<(String, PathBuf, ModFile)> {
        let read_mod = |root: &Path| -> Option<ModFile> {
            let text = fs.read_to_string(&root.join("go.mod")).ok()?;
            Some(ModFile::parse(&text))
        };

        if let Some(work) = self.find_upwards(fs, src_dir, "go.work") {
            let root = work.parent().unwrap_or(Path::new("/"));
            if let Ok(text) = fs.read_to_string(&work) {
                return parse_go_work(&text)
                    .into_iter()
                    .filter_map(|rel| {
                        let dir = crate::fs::clean(&root.join(rel));
                        let m = read_mod(&dir)?;
                        Some((m.module.clone()?, dir, m))
                    })
                    .collect();
            }
        }

        let Some(gomod) = self.find_upwards(fs, src_dir, "go.mod") else {
            return Vec::new();
        };
        let root = gomod.parent().unwrap_or(Path::new("/")).to_path_buf();
        match read_mod(&root) {
            Some(m) => match m.module.clone() {
                Some(path) => vec![(path, root, m)],
                None => Vec::new(),
            },
            None => Vec::new(),
        }
    }
}

impl ModuleResolver for GoModules {
    fn package_dir(&self, fs: &dyn SourceFs, import_path: &str, src_dir: &Path) -> Result<PathBuf> {
        let mut tried = Vec::new();
        let mut probe = |dir: PathBuf| -> Option<PathBuf> {
            if fs.is_dir(&dir) {
                Some(dir)
            } else {
                tried.push(dir);
                None
            }
        };

        if is_std_path(import_path) {
            if let Some(dir) = probe(self.ctx.goroot.join("src").join(import_path)) {
                return Ok(dir);
            }
        }

        let main = self.main(fs, src_dir);
        for (module, root, _) in &main {
            if let Some(rest) = strip_module_prefix(import_path, module) {
                if let Some(dir) = probe(root.join(rest)) {
                    return Ok(dir);
                }
            }
        }

        if let [(_, root, _)] = main.as_slice() {
            if let Some(dir) = probe(root.join("vendor").join(import_path)) {
                return Ok(dir);
            }
        }

        let best = main
            .iter()
            .flat_map(|(_, _, m)| &m.require)
            .filter(|(module, _)| strip_module_prefix(import_path, module).is_some())
            .max_by_key(|(module, _)| module.len());
        if let Some((module, version)) = best {
            if let Some(rest) = strip_module_prefix(import_path, module) {
                let root = self.ctx.gomodcache.join(format!("{}@{}", escape_module_path(module), version));
                if let Some(dir) = probe(root.join(rest)) {
                    return Ok(dir);
                }
            }
        }

        for gopath in &self.ctx.gopath {
            if let Some(dir) = probe(gopath.join("src").join(import_path)) {
                return Ok(dir);
            }
        }

        let searched: Vec<String> = tried.iter().map(|p| p.display().to_string()).collect();
        Err(Error::PackageNotFound {
            path: import_path.to_string(),
            reason: format!("cannot find package \"{import_path}\" in any of: {}", searched.join(", ")),
        })
    }

    fn main_modules(&self, fs: &dyn SourceFs, src_dir: &Path) -> Vec<(String, PathBuf)> {
        self.main(fs, src_dir)
            .into_iter()
            .map(|(module, root, _)| (module, root))
            .collect()
    }

    fn required_modules(&self, fs: &dyn SourceFs, src_dir: &Path) -> Vec<(String, PathBuf)> {
        let mut out: Vec<(String, PathBuf)> = Vec::new();
        for (_, _, m) in self.main(fs, src_dir) {
            for (module, version) in m.require {
                if out.iter().any(|(seen, _)| *seen == module) {
                    continue;
                }
                let root = self.ctx.gomodcache.join(format!("{}@{}", escape_module_path(&module), version));
                out.push((module, root));
            }
        }
        out
    }
}

/// Standard-library paths have no dot in their first element.
pub fn is_std_path(import_path: &str) -> bool {
    let first = import_path.split('/').next().unwrap_or(import_path);
    !first.contains('.')
}

/// `""` for the module itself, `"sub/pkg"` for a package inside it.
fn strip_module_prefix<'p>(import_path: &'p str, module: &str) -> Option<&'p str> {
    let rest = import_path.strip_prefix(module)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}

/// Module-cache escaping: every upper-case letter becomes `!` plus its
/// lower-case form (`github.com/BurntSushi` → `github.com/!burnt!sushi`).
pub fn escape_module_path(module: &str) -> String {
    let mut out = String::with_capacity(module.len() + 4);
    for c in module.chars() {
        if c.is_ascii_uppercase() {
            out.push('!');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// The parts of a go.mod file resolution needs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModFile {
    pub module: Option<String>,
    /// `(module path, version)` pairs.
    pub require: Vec<(String, String)>,
}

impl ModFile {
    pub fn parse(text: &str) -> Self {
        let mut out = ModFile::default();
        for (verb, args) in directives(text) {
            match verb {
                "module" => out.module = args.first().map(|m| unquote_mod(m)),
                "require" => {
                    if let [path, version, ..] = args.as_slice() {
                        out.require.push((unquote_mod(path), version.to_string()));
                    }
                }
                _ => {}
            }
        }
        out
    }
}

/// `use` directories of a go.work file.
pub fn parse_go_work(text: &str) -> Vec<String> {
    directives(text)
        .into_iter()
        .filter(|(verb, _)| *verb == "use")
        .filter_map(|(_, args)| args.first().map(|d| unquote_mod(d)))
        .collect()
}

/// Flattens `verb args` lines and `verb ( args... )` blocks into
/// `(verb, args)` pairs, dropping `//` comments.
fn directives(text: &str) -> Vec<(&str, Vec<&str>)> {
    let mut out = Vec::new();
    let mut block: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.split("//").next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        if let Some(verb) = block {
            if line == ")" {
                block = None;
            } else {
                out.push((verb, line.split_whitespace().collect()));
            }
            continue;
        }
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            continue;
        };
        let args: Vec<&str> = words.collect();
        if args.first() == Some(&"(") {
            block = Some(verb);
        } else {
            out.push((verb, args));
        }
    }
    out
}

fn unquote_mod(s: &str) -> String {
    s.trim_matches(|c| c == '"' || c == '`').to_string()
}
