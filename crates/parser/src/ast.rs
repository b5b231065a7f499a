//! # Go declaration-level syntax tree
//!
//! Owned nodes for everything outside function bodies: the package clause,
//! imports, type declarations, function and method signatures, and the full
//! type-expression grammar. Bodies and value initialisers are skipped by the
//! parser, only their extent is kept.
//!
//! Type expressions are a closed sum type ([`TypeExpr`]) so every consumer
//! (printer, walker, qualifier) handles each shape in one `match`.

use crate::error::Span;
use crate::lexer::CommentGroup;

/// Identifier with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }

    /// Go's export rule: the first character is an upper-case letter.
    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }
}

/// Reports whether `name` would be exported from its package.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

// =============================================================================
// Source File (Root Node)
// =============================================================================

/// A parsed Go source file.
///
/// ```text
/// SourceFile = PackageClause ";" { ImportDecl ";" } { TopLevelDecl ";" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub package: Ident,
    /// Package doc comment.
    pub doc: Option<CommentGroup>,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
    /// Every comment group in the file, in source order.
    pub comments: Vec<CommentGroup>,
}

impl SourceFile {
    pub fn type_specs(&self) -> impl Iterator<Item = (&TypeDecl, &TypeSpec)> {
        self.decls
            .iter()
            .filter_map(|d| match d {
                Decl::Type(td) => Some(td),
                _ => None,
            })
            .flat_map(|td| td.specs.iter().map(move |s| (td, s)))
    }

    pub fn funcs(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Func(f) => Some(f),
            _ => None,
        })
    }

    /// Import path bound to package qualifier `name` in this file, using the
    /// explicit alias or, failing that, the path's last element.
    pub fn import_for(&self, name: &str) -> Option<&ImportSpec> {
        self.imports.iter().find(|imp| imp.local_name() == Some(name))
    }

    /// Names declared at package scope (types, funcs, vars, consts).
    pub fn top_level_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for decl in &self.decls {
            match decl {
                Decl::Type(td) => names.extend(td.specs.iter().map(|s| s.name.name.as_str())),
                Decl::Func(f) if f.recv.is_none() => names.push(f.name.name.as_str()),
                Decl::Func(_) => {}
                Decl::Value(v) => {
                    for spec in &v.specs {
                        names.extend(spec.names.iter().map(|n| n.name.as_str()));
                    }
                }
            }
        }
        names
    }
}

/// ```text
/// ImportSpec = [ "." | PackageName ] ImportPath
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub name: Option<ImportName>,
    /// Unquoted import path.
    pub path: String,
    pub span: Span,
}

impl ImportSpec {
    /// Qualifier this import introduces, if any. Without an alias this is
    /// the assumed package name of the path.
    pub fn local_name(&self) -> Option<&str> {
        match &self.name {
            Some(ImportName::Name(id)) => Some(id.name.as_str()),
            Some(ImportName::Dot) | Some(ImportName::Blank) => None,
            None => Some(assumed_package_name(&self.path)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportName {
    /// `import . "pkg"`
    Dot,
    /// `import _ "pkg"`
    Blank,
    /// `import name "pkg"`
    Name(Ident),
}

/// Package name conventionally used for an import path: the last element,
/// minus a `go-` prefix, a `-go`/`.go` suffix, a `.vN` suffix, and skipping a
/// trailing major-version element (`example.com/foo/v2` → `foo`).
pub fn assumed_package_name(path: &str) -> &str {
    let mut parts = path.rsplit('/');
    let mut last = parts.next().unwrap_or(path);
    if is_major_version(last) {
        if let Some(prev) = parts.next() {
            last = prev;
        }
    }
    if let Some(dot) = last.find(".v") {
        if last[dot + 2..].bytes().all(|b| b.is_ascii_digit()) && dot + 2 < last.len() {
            last = &last[..dot];
        }
    }
    let last = last.strip_prefix("go-").unwrap_or(last);
    let last = last.strip_suffix("-go").unwrap_or(last);
    last.strip_suffix(".go").unwrap_or(last)
}

fn is_major_version(elem: &str) -> bool {
    elem.len() > 1
        && elem.starts_with('v')
        && elem[1..].bytes().all(|b| b.is_ascii_digit())
}

// =============================================================================
// Declarations
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    Type(TypeDecl),
    Func(FuncDecl),
    Value(ValueDecl),
}

/// `type` declaration, single or grouped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub doc: Option<CommentGroup>,
    pub specs: Vec<TypeSpec>,
    /// From the `type` keyword to the end of the last spec (or `)`).
    pub span: Span,
}

/// ```text
/// TypeSpec = identifier [ TypeParameters ] [ "=" ] Type
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    pub doc: Option<CommentGroup>,
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub alias: bool,
    pub typ: TypeExpr,
    pub span: Span,
}

impl TypeSpec {
    /// Declared type-parameter names in declaration order.
    pub fn type_param_names(&self) -> impl Iterator<Item = &str> {
        self.type_params
            .iter()
            .flat_map(|tp| tp.names.iter().map(|n| n.name.as_str()))
    }
}

/// One `Names Constraint` group of a type-parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    pub names: Vec<Ident>,
    pub constraint: TypeExpr,
}

/// ```text
/// FunctionDecl = "func" FunctionName [ TypeParameters ] Signature [ FunctionBody ]
/// MethodDecl   = "func" Receiver MethodName Signature [ FunctionBody ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    pub doc: Option<CommentGroup>,
    pub recv: Option<Receiver>,
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub sig: Signature,
    /// Extent of the body braces, when present.
    pub body: Option<Span>,
    pub span: Span,
}

/// Method receiver: `(name *T[P])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receiver {
    pub name: Option<Ident>,
    pub typ: TypeExpr,
    pub span: Span,
}

impl Receiver {
    /// The receiver's base type name with pointers, parentheses and type
    /// arguments peeled off: `*List[T]` → `List`.
    pub fn base_type_name(&self) -> Option<&str> {
        self.typ.base_name()
    }
}

/// `const`/`var` declaration. Initialisers are not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueDecl {
    pub kind: ValueKind,
    pub specs: Vec<ValueSpec>,
    pub span: Span,
}

/// `a, b T = ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub typ: Option<TypeExpr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Const,
    Var,
}

// =============================================================================
// Signatures and Fields
// =============================================================================

/// ```text
/// Signature = Parameters [ Result ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    pub params: Vec<Field>,
    pub results: Vec<Field>,
}

/// Field in a parameter list, result list or struct.
///
/// `names` is empty for anonymous parameters and embedded struct fields.
/// A variadic parameter's type is [`TypeExpr::Ellipsis`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub names: Vec<Ident>,
    pub typ: TypeExpr,
    /// Raw struct tag literal, quotes included.
    pub tag: Option<String>,
    pub span: Span,
}

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `Name`, `pkg.Name`, `Name[A, B]`
    Named(NamedType),
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `[]T`
    Slice(Box<TypeExpr>),
    /// `[N]T`, `[...]T`
    Array { len: Vec<LenPart>, elem: Box<TypeExpr> },
    /// `map[K]V`
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    /// `chan T`, `chan<- T`, `<-chan T`
    Chan { dir: ChanDir, elem: Box<TypeExpr> },
    /// `func(...) ...`
    Func(Box<Signature>),
    /// `struct { ... }`
    Struct(Vec<Field>),
    /// `interface { ... }`
    Interface(Vec<InterfaceElem>),
    /// `(T)`
    Paren(Box<TypeExpr>),
    /// `...T`, only as the type of a final parameter.
    Ellipsis(Box<TypeExpr>),
    /// `~int | string`, only inside constraints and interface bodies.
    Union(Vec<TypeTerm>),
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named(NamedType {
            pkg: None,
            name: name.into(),
            args: Vec::new(),
        })
    }

    /// Name of the named type at the core of a receiver-like expression.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Named(n) => Some(&n.name),
            TypeExpr::Pointer(inner) | TypeExpr::Paren(inner) => inner.base_name(),
            _ => None,
        }
    }

    /// Bare identifier (`T`, no qualifier, no arguments).
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            TypeExpr::Named(n) if n.pkg.is_none() && n.args.is_empty() => Some(&n.name),
            _ => None,
        }
    }
}

/// Reference to a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedType {
    /// Package qualifier as written in source.
    pub pkg: Option<String>,
    pub name: String,
    pub args: Vec<TypeExpr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// Piece of an array length expression. The length is kept as source
/// text, except that bare identifiers (constants) are split out so they can
/// be qualified when the type is printed for another package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LenPart {
    /// Identifier not part of a `pkg.Name` selector.
    Name(String),
    Text(String),
}

/// Term of a union: `~T` or `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTerm {
    pub tilde: bool,
    pub typ: TypeExpr,
}

/// Interface element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceElem {
    /// `Method(...) ...`
    Method(MethodSpec),
    /// Embedded type (`io.Reader`) or union (`~int | ~string`).
    Embed(EmbedSpec),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpec {
    /// Leading comment group, attached only when it ends on the line right
    /// above the method.
    pub doc: Option<CommentGroup>,
    pub name: Ident,
    pub sig: Signature,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedSpec {
    pub typ: TypeExpr,
    pub span: Span,
}
