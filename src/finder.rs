//! Locating a type declaration inside a loaded package.

use goimpl_parser::ast::{InterfaceElem, TypeExpr, TypeSpec};
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::locator::{Package, ParsedFile};

/// Declared type-parameter names bound to caller-supplied argument text,
/// in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeParamBinding {
    pairs: SmallVec<[(String, String); 2]>,
}

impl TypeParamBinding {
    pub fn get(&self, param: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(name, _)| name == param)
            .map(|(_, arg)| arg.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, a)| (n.as_str(), a.as_str()))
    }
}

/// Binds `spec`'s type parameters to `args`. Counts must match exactly;
/// there is no partial binding and no defaulting.
pub fn match_type_params(spec: &TypeSpec, args: &[String]) -> Option<TypeParamBinding> {
    let names: SmallVec<[&str; 4]> = spec.type_param_names().collect();
    if names.len() != args.len() {
        return None;
    }
    Some(TypeParamBinding {
        pairs: names
            .into_iter()
            .zip(args)
            .map(|(name, arg)| (name.to_string(), arg.clone()))
            .collect(),
    })
}

/// A type declaration matched by name and arity.
#[derive(Debug)]
pub struct Located<'p> {
    pub file: &'p ParsedFile,
    pub spec: &'p TypeSpec,
    pub binding: TypeParamBinding,
}

/// Scans every file of `pkg` for a type named `name` taking exactly
/// `args.len()` type arguments. Arity mismatches keep scanning.
pub fn find_type<'p>(pkg: &'p Package, name: &str, args: &[String]) -> Result<Located<'p>> {
    let _span = tracing::info_span!("find_decl", name, package = %pkg.name).entered();
    for file in &pkg.files {
        for (_, spec) in file.ast.type_specs() {
            if spec.name.name != name {
                continue;
            }
            match match_type_params(spec, args) {
                Some(binding) => {
                    tracing::debug!(file = %file.path.display(), params = binding.len(), "declaration found");
                    return Ok(Located { file, spec, binding });
                }
                None => tracing::debug!(
                    file = %file.path.display(),
                    want = args.len(),
                    "type parameter count mismatch"
                ),
            }
        }
    }
    Err(Error::TypeNotFound {
        name: name.to_string(),
        package: pkg.display_path(),
    })
}

/// How a located declaration contributes methods.
#[derive(Debug)]
pub enum Shape<'p> {
    /// `interface { ... }` with at least one element.
    Methods(&'p [InterfaceElem]),
    /// `type X = other.I` or `type X other.I`: the method set of another
    /// named interface, expanded like an embed.
    Named(&'p TypeExpr),
}

/// Classifies the underlying type of a located declaration. `iface` is the
/// user-facing name for messages.
pub fn shape<'p>(located: &Located<'p>, iface: &str) -> Result<Shape<'p>> {
    let mut typ = &located.spec.typ;
    while let TypeExpr::Paren(inner) = typ {
        typ = inner;
    }
    match typ {
        TypeExpr::Interface(elems) if elems.is_empty() => Err(Error::EmptyInterface(iface.to_string())),
        TypeExpr::Interface(elems) => {
            if elems.iter().any(is_constraint_elem) {
                return Err(Error::ConstraintInterface(iface.to_string()));
            }
            Ok(Shape::Methods(elems))
        }
        TypeExpr::Named(_) => Ok(Shape::Named(typ)),
        _ => Err(Error::NotInterface(iface.to_string())),
    }
}

fn is_constraint_elem(elem: &InterfaceElem) -> bool {
    match elem {
        InterfaceElem::Embed(embed) => match &embed.typ {
            TypeExpr::Union(_) => true,
            TypeExpr::Named(n) => n.pkg.is_none() && n.name == "comparable",
            _ => false,
        },
        InterfaceElem::Method(_) => false,
    }
}
