//! Method-stub generation for Go interfaces.
//!
//! Given a receiver such as `f *File` and an interface reference such as
//! `io.ReadWriter`, `net/http.Handler` or `Cache[string, []byte]`, the
//! [`Implementer`] finds the interface declaration on disk, flattens its
//! method set (following embeds across packages and substituting type
//! arguments), drops the methods the receiver already has, and renders the
//! rest as stubs:
//!
//! ```text
//! find_interface -> locate package -> find declaration -> reify -> implemented -> emit
//! ```
//!
//! Every stage talks to the outside world through a trait
//! ([`SourceFs`], [`ModuleResolver`], [`ImportGuesser`], [`SourceFormatter`])
//! so tests and editors can swap in their own.

pub mod autoimport;
pub mod constraint;
pub mod context;
pub mod emit;
pub mod error;
pub mod finder;
pub mod fs;
pub mod implemented;
pub mod locator;
pub mod position;
pub mod receiver;
pub mod reify;
pub mod typeref;

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

pub use autoimport::{ImportGuesser, PackageIndex};
pub use context::BuildContext;
pub use emit::{Canonical, SourceFormatter};
pub use error::{Error, Result};
pub use fs::{OsFs, OverlayFs, SourceFs};
pub use locator::{GoModules, Locator, ModuleResolver};
pub use position::Position;
pub use receiver::ReceiverSpec;
pub use reify::{MethodSignature, Param};
pub use typeref::TypeRef;

/// Whether interface method comments are copied onto the stubs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmitComments {
    #[default]
    With,
    Without,
}

impl From<bool> for EmitComments {
    fn from(with: bool) -> Self {
        if with {
            EmitComments::With
        } else {
            EmitComments::Without
        }
    }
}

/// Per-run settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Search directory: where unqualified names live, where imports are
    /// resolved from and where the receiver's methods are looked for.
    pub dir: PathBuf,
    /// Package the stubs are emitted into. Detected from `dir` when unset.
    pub recv_pkg: Option<String>,
    pub comments: EmitComments,
}

impl Options {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            recv_pkg: None,
            comments: EmitComments::With,
        }
    }
}

/// The resolution pipeline with its collaborators.
pub struct Implementer {
    ctx: BuildContext,
    fs: Box<dyn SourceFs>,
    modules: Box<dyn ModuleResolver>,
    guesser: Box<dyn ImportGuesser>,
    formatter: Box<dyn SourceFormatter>,
}

impl Implementer {
    /// Pipeline over the real file system with standard module resolution.
    pub fn new(ctx: BuildContext) -> Self {
        Self {
            modules: Box::new(GoModules::new(ctx.clone())),
            ctx,
            fs: Box::new(OsFs),
            guesser: Box::new(PackageIndex),
            formatter: Box::new(Canonical),
        }
    }

    pub fn with_fs(mut self, fs: impl SourceFs + 'static) -> Self {
        self.fs = Box::new(fs);
        self
    }

    /// Layers unsaved buffers over the current file system.
    pub fn with_overlay(mut self, files: BTreeMap<PathBuf, String>) -> Self {
        let base = std::mem::replace(&mut self.fs, Box::new(OsFs));
        self.fs = Box::new(OverlayFs::new(base, files));
        self
    }

    pub fn with_module_resolver(mut self, modules: impl ModuleResolver + 'static) -> Self {
        self.modules = Box::new(modules);
        self
    }

    pub fn with_import_guesser(mut self, guesser: impl ImportGuesser + 'static) -> Self {
        self.guesser = Box::new(guesser);
        self
    }

    pub fn with_formatter(mut self, formatter: impl SourceFormatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    pub fn locator(&self) -> Locator<'_> {
        Locator::new(&self.ctx, self.fs.as_ref(), self.modules.as_ref())
    }

    /// The flattened method set of `iface`, typed for `opts.recv_pkg`.
    pub fn resolve_interface(&self, iface: &str, opts: &Options) -> Result<Vec<MethodSignature>> {
        let locator = self.locator();
        let mut reifier = reify::Reifier::new(&locator, self.guesser.as_ref(), opts.recv_pkg.as_deref(), opts.comments);
        reifier.resolve(iface, &opts.dir)
    }

    /// Names in `methods` the receiver's type already declares in `dir`.
    pub fn implemented_methods(
        &self,
        methods: &[MethodSignature],
        recv: &ReceiverSpec,
        dir: &Path,
    ) -> Result<HashSet<String>> {
        implemented::implemented_methods(self.fs.as_ref(), dir, recv, methods)
    }

    /// Name of the package in `dir` when it declares the receiver's type.
    pub fn receiver_package(&self, recv: &ReceiverSpec, dir: &Path) -> Option<String> {
        let pkg = self.locator().load_dir(dir, "").ok()?;
        let declared = pkg
            .files
            .iter()
            .any(|f| f.ast.type_specs().any(|(_, s)| s.name.name == recv.type_name));
        declared.then_some(pkg.name)
    }

    /// Formatted stubs making `recv` implement `iface`.
    pub fn generate(&self, recv: &str, iface: &str, opts: &Options) -> Result<String> {
        let _span = tracing::info_span!("generate", recv, iface).entered();
        let recv = ReceiverSpec::parse(recv)?;

        let mut opts = opts.clone();
        if opts.recv_pkg.is_none() {
            opts.recv_pkg = self.receiver_package(&recv, &opts.dir);
            tracing::debug!(recv_pkg = ?opts.recv_pkg, "receiver package");
        }

        let methods = self.resolve_interface(iface, &opts)?;
        let implemented = self.implemented_methods(&methods, &recv, &opts.dir)?;
        let stubs = emit::render_stubs(&recv, &methods, &implemented);
        self.formatter.format(&stubs)
    }

    /// Just past the receiver type's declaration: where `-u` inserts.
    pub fn receiver_position(&self, recv: &str, dir: &Path) -> Result<Position> {
        let recv = ReceiverSpec::parse(recv)?;
        position::type_decl_end(&self.locator(), dir, &recv.type_name)
    }

    /// Fails with `ReceiverNotFound` unless `dir` declares the receiver's type.
    fn ensure_receiver_declared(&self, recv: &str, dir: &Path) -> Result<()> {
        self.receiver_position(recv, dir).map(|_decl_end| ())
    }

    /// The file at `pos` with the stubs inserted there, formatted.
    pub fn generate_for_position(&self, recv: &str, iface: &str, opts: &Options, pos: &Position) -> Result<String> {
        let stubs = self.generate(recv, iface, opts)?;
        self.ensure_receiver_declared(recv, &opts.dir)?;

        let orig = self.fs.read_to_string(&pos.file)?;
        let offset = pos.offset_in(&orig)?;
        let merged = position::insert_stubs(&orig, offset, &stubs);
        self.formatter.format(&merged)
    }
}
