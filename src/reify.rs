//! Turning an interface declaration into concrete method signatures.
//!
//! Methods come out in declaration order with embedded interfaces spliced
//! in at their position. Every type is rendered for the emitting package:
//! bound type parameters are replaced by their arguments and exported names
//! of the declaring package gain its qualifier unless the receiver lives in
//! that same package.

use std::fmt::Write;
use std::path::Path;

use goimpl_parser::ast::{is_exported, Field, InterfaceElem, MethodSpec, NamedType, TypeExpr};
use goimpl_parser::printer::{render_type_with, TypeRewriter};

use crate::autoimport::ImportGuesser;
use crate::error::{Error, Result};
use crate::finder::{self, Located, Shape, TypeParamBinding};
use crate::locator::{Locator, Package, ParsedFile};
use crate::typeref::{find_interface, TypeRef};
use crate::EmitComments;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Empty for an unnamed result.
    pub name: String,
    pub typ: String,
}

impl Param {
    fn new(name: impl Into<String>, typ: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            typ: typ.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    /// Flattened doc comment, newline-terminated.
    pub doc: Option<String>,
}

/// The predeclared `error` interface.
pub fn error_interface() -> Vec<MethodSignature> {
    vec![MethodSignature {
        name: "Error".to_string(),
        params: Vec::new(),
        results: vec![Param::new("", "string")],
        doc: None,
    }]
}

/// Qualifies and substitutes names while a declaration's types are rendered.
struct Qualify<'b> {
    pkg_name: &'b str,
    qualify: bool,
    binding: &'b TypeParamBinding,
}

impl TypeRewriter for Qualify<'_> {
    fn rewrite_named(&self, named: &NamedType, args: &[String]) -> Option<String> {
        // Selectors are already qualified; only their arguments are rewritten.
        if named.pkg.is_some() {
            return None;
        }
        if args.is_empty() {
            if let Some(bound) = self.binding.get(&named.name) {
                return Some(bound.to_string());
            }
        }
        if !self.qualify || !is_exported(&named.name) {
            return None;
        }
        let mut out = format!("{}.{}", self.pkg_name, named.name);
        if !args.is_empty() {
            let _ = write!(out, "[{}]", args.join(", "));
        }
        Some(out)
    }

    fn rewrite_const(&self, name: &str) -> Option<String> {
        if !self.qualify || !is_exported(name) {
            return None;
        }
        Some(format!("{}.{}", self.pkg_name, name))
    }
}

/// Walks interface declarations, following embeds across packages.
pub struct Reifier<'r> {
    locator: &'r Locator<'r>,
    guesser: &'r dyn ImportGuesser,
    recv_pkg: Option<&'r str>,
    comments: EmitComments,
    /// `(identity, name as written)` of each interface being expanded.
    stack: Vec<(String, String)>,
}

impl<'r> Reifier<'r> {
    pub fn new(
        locator: &'r Locator<'r>,
        guesser: &'r dyn ImportGuesser,
        recv_pkg: Option<&'r str>,
        comments: EmitComments,
    ) -> Self {
        Self {
            locator,
            guesser,
            recv_pkg,
            comments,
            stack: Vec::new(),
        }
    }

    /// Resolves the interface reference `input`, as typed by the user, to
    /// its flattened method set. Short and unqualified references are
    /// looked up from `src_dir`.
    pub fn resolve(&mut self, input: &str, src_dir: &Path) -> Result<Vec<MethodSignature>> {
        if input == "error" {
            return Ok(error_interface());
        }
        let tref = find_interface(input, src_dir, self.locator, self.guesser)?;
        self.expand(&tref, src_dir, input)
    }

    /// Method set of the interface `tref`; `shown` names it in errors.
    fn expand(&mut self, tref: &TypeRef, from_dir: &Path, shown: &str) -> Result<Vec<MethodSignature>> {
        let _span = tracing::info_span!("reify", iface = shown).entered();

        let pkg = self
            .locator
            .load(&tref.import_path, from_dir)
            .map_err(|e| Error::not_found(shown, e))?;
        let located = finder::find_type(&pkg, &tref.name, &tref.type_args).map_err(|e| Error::not_found(shown, e))?;

        let identity = format!("{}#{}", pkg.dir.display(), tref);
        if self.stack.iter().any(|(seen, _)| *seen == identity) {
            let mut chain: Vec<String> = self.stack.iter().map(|(_, d)| d.clone()).collect();
            chain.push(shown.to_string());
            return Err(Error::EmbeddingCycle { chain });
        }

        let shape = finder::shape(&located, shown)?;
        self.stack.push((identity, shown.to_string()));
        let methods = self.methods_of(&pkg, &located, shape);
        self.stack.pop();

        let methods = methods?;
        tracing::debug!(count = methods.len(), "reified");
        Ok(methods)
    }

    fn methods_of(&mut self, pkg: &Package, located: &Located<'_>, shape: Shape<'_>) -> Result<Vec<MethodSignature>> {
        let q = Qualify {
            pkg_name: &pkg.name,
            qualify: self.recv_pkg != Some(pkg.name.as_str()),
            binding: &located.binding,
        };

        match shape {
            Shape::Named(typ) => self.embedded(pkg, located.file, &q, typ),
            Shape::Methods(elems) => {
                let mut out = Vec::new();
                for elem in elems {
                    match elem {
                        InterfaceElem::Method(m) => out.push(self.signature(m, &q)),
                        InterfaceElem::Embed(embed) => {
                            out.extend(self.embedded(pkg, located.file, &q, &embed.typ)?);
                        }
                    }
                }
                Ok(out)
            }
        }
    }

    fn signature(&self, m: &MethodSpec, q: &Qualify<'_>) -> MethodSignature {
        let params = fields(&m.sig.params, q, "_");
        let results = fields(&m.sig.results, q, "");
        let doc = match self.comments {
            EmitComments::With => m.doc.as_ref().map(|group| group.flatten()),
            EmitComments::Without => None,
        };
        MethodSignature {
            name: m.name.name.clone(),
            params,
            results,
            doc,
        }
    }

    /// Method set of an embedded (or aliased) interface, resolved against
    /// the declaring package and file.
    fn embedded(
        &mut self,
        pkg: &Package,
        file: &ParsedFile,
        q: &Qualify<'_>,
        typ: &TypeExpr,
    ) -> Result<Vec<MethodSignature>> {
        let mut typ = typ;
        while let TypeExpr::Paren(inner) = typ {
            typ = inner;
        }
        let shown = render_type_with(typ, q);
        let TypeExpr::Named(named) = typ else {
            return Err(Error::NotInterface(shown));
        };
        let _span = tracing::debug_span!("embed", iface = %shown).entered();

        let type_args: Vec<String> = named.args.iter().map(|a| render_type_with(a, q)).collect();

        let Some(qualifier) = &named.pkg else {
            if q.binding.get(&named.name).is_some() {
                return Err(Error::ConstraintInterface(shown));
            }
            let declared_here = pkg
                .files
                .iter()
                .any(|f| f.ast.type_specs().any(|(_, s)| s.name.name == named.name));
            if !declared_here {
                match named.name.as_str() {
                    "error" => return Ok(error_interface()),
                    "any" => return Ok(Vec::new()),
                    "comparable" => return Err(Error::ConstraintInterface(shown)),
                    _ => {}
                }
            }
            let tref = TypeRef {
                import_path: pkg.import_path.clone(),
                name: named.name.clone(),
                type_args,
            };
            return self.expand(&tref, &pkg.dir, &shown);
        };

        match file.ast.import_for(qualifier) {
            Some(imp) => {
                let tref = TypeRef {
                    import_path: imp.path.clone(),
                    name: named.name.clone(),
                    type_args,
                };
                self.expand(&tref, &pkg.dir, &shown)
            }
            None => {
                tracing::debug!(%qualifier, "no import in declaring file, guessing");
                let tref = find_interface(&shown, &pkg.dir, self.locator, self.guesser)?;
                self.expand(&tref, &pkg.dir, &shown)
            }
        }
    }
}

/// One entry per declared name; an unnamed field gets `unnamed` as its
/// name.
fn fields(list: &[Field], q: &Qualify<'_>, unnamed: &str) -> Vec<Param> {
    let mut out = Vec::with_capacity(list.len());
    for field in list {
        let typ = render_type_with(&field.typ, q);
        if field.names.is_empty() {
            out.push(Param::new(unnamed, typ));
        } else {
            out.extend(field.names.iter().map(|n| Param::new(n.name.clone(), typ.clone())));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use goimpl_parser::parse_source;

    use super::*;

    fn render(src_type: &str, pkg: &str, qualify: bool, binding: &[(&str, &str)]) -> String {
        let src = format!("package p\ntype X {src_type}\n");
        let file = parse_source(&src).unwrap();
        let (_, spec) = file.type_specs().next().unwrap();

        let decl = format!(
            "package p\ntype B[{}] int\n",
            binding.iter().map(|(n, _)| format!("{n} any")).collect::<Vec<_>>().join(", ")
        );
        let bfile = parse_source(&decl).unwrap();
        let (_, bspec) = bfile.type_specs().next().unwrap();
        let args: Vec<String> = binding.iter().map(|(_, a)| a.to_string()).collect();
        let binding = finder::match_type_params(bspec, &args).unwrap();

        let q = Qualify {
            pkg_name: pkg,
            qualify,
            binding: &binding,
        };
        render_type_with(&spec.typ, &q)
    }

    #[test]
    fn exported_names_are_qualified() {
        assert_eq!(render("*Request", "http", true, &[("T", "int")]), "*http.Request");
        assert_eq!(render("map[string][]Header", "http", true, &[("T", "int")]), "map[string][]http.Header");
        assert_eq!(render("*Request", "http", false, &[("T", "int")]), "*Request");
        assert_eq!(render("io.Reader", "http", true, &[("T", "int")]), "io.Reader");
        assert_eq!(render("error", "http", true, &[("T", "int")]), "error");
    }

    #[test]
    fn only_type_names_are_qualified() {
        assert_eq!(
            render("func(Ctx context.Context, W Writer) (N int)", "p", true, &[("T", "int")]),
            "func(Ctx context.Context, W p.Writer) (N int)"
        );
        assert_eq!(render("struct{ Name Label }", "p", true, &[("T", "int")]), "struct{ Name p.Label }");
    }

    #[test]
    fn bound_params_are_substituted_everywhere() {
        let b = [("K", "string"), ("V", "*big.Int")];
        assert_eq!(render("map[K][]V", "p", true, &b), "map[string][]*big.Int");
        assert_eq!(render("func(K) (V, error)", "p", true, &b), "func(string) (*big.Int, error)");
        assert_eq!(render("Pair[K, V]", "p", true, &b), "p.Pair[string, *big.Int]");
        assert_eq!(render("iter.Seq[V]", "p", true, &b), "iter.Seq[*big.Int]");
    }

    #[test]
    fn anonymous_params_and_results() {
        let src = "package p\ntype I interface { M(int, string) (bool, error); N(a, b int) (ok bool) }\n";
        let file = parse_source(src).unwrap();
        let (_, spec) = file.type_specs().next().unwrap();
        let TypeExpr::Interface(elems) = &spec.typ else { panic!("not an interface") };
        let binding = TypeParamBinding::default();
        let q = Qualify {
            pkg_name: "p",
            qualify: false,
            binding: &binding,
        };

        let InterfaceElem::Method(m) = &elems[0] else { panic!() };
        assert_eq!(
            fields(&m.sig.params, &q, "_"),
            [Param::new("_", "int"), Param::new("_", "string")]
        );
        assert_eq!(fields(&m.sig.results, &q, ""), [Param::new("", "bool"), Param::new("", "error")]);

        let InterfaceElem::Method(n) = &elems[1] else { panic!() };
        assert_eq!(fields(&n.sig.params, &q, "_"), [Param::new("a", "int"), Param::new("b", "int")]);
        assert_eq!(fields(&n.sig.results, &q, ""), [Param::new("ok", "bool")]);
    }

    #[test]
    fn builtin_error() {
        let methods = error_interface();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name, "Error");
        assert!(methods[0].params.is_empty());
        assert_eq!(methods[0].results, [Param::new("", "string")]);
    }
}
