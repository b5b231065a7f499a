use crate::ast::*;

/// Read-only traversal over type expressions.
///
/// Every method defaults to the matching `walk_*` function, so an
/// implementation overrides only the node kinds it cares about and calls
/// the `walk_*` function itself to keep descending.
pub trait Visitor {
    #[inline(always)]
    fn visit_type(&mut self, t: &TypeExpr) {
        walk_type(self, t);
    }

    #[inline(always)]
    fn visit_named(&mut self, n: &NamedType) {
        walk_named(self, n);
    }

    #[inline(always)]
    fn visit_signature(&mut self, sig: &Signature) {
        walk_signature(self, sig);
    }

    #[inline(always)]
    fn visit_field(&mut self, f: &Field) {
        walk_field(self, f);
    }

    #[inline(always)]
    fn visit_interface_elem(&mut self, e: &InterfaceElem) {
        walk_interface_elem(self, e);
    }
}

pub fn walk_type<V: Visitor + ?Sized>(v: &mut V, t: &TypeExpr) {
    match t {
        TypeExpr::Named(n) => v.visit_named(n),
        TypeExpr::Pointer(elem)
        | TypeExpr::Slice(elem)
        | TypeExpr::Paren(elem)
        | TypeExpr::Ellipsis(elem)
        | TypeExpr::Array { elem, .. }
        | TypeExpr::Chan { elem, .. } => v.visit_type(elem),
        TypeExpr::Map { key, value } => {
            v.visit_type(key);
            v.visit_type(value);
        }
        TypeExpr::Func(sig) => v.visit_signature(sig),
        TypeExpr::Struct(fields) => {
            for f in fields {
                v.visit_field(f);
            }
        }
        TypeExpr::Interface(elems) => {
            for e in elems {
                v.visit_interface_elem(e);
            }
        }
        TypeExpr::Union(terms) => {
            for term in terms {
                v.visit_type(&term.typ);
            }
        }
    }
}

pub fn walk_named<V: Visitor + ?Sized>(v: &mut V, n: &NamedType) {
    for arg in &n.args {
        v.visit_type(arg);
    }
}

pub fn walk_signature<V: Visitor + ?Sized>(v: &mut V, sig: &Signature) {
    for f in sig.params.iter().chain(&sig.results) {
        v.visit_field(f);
    }
}

pub fn walk_field<V: Visitor + ?Sized>(v: &mut V, f: &Field) {
    v.visit_type(&f.typ);
}

pub fn walk_interface_elem<V: Visitor + ?Sized>(v: &mut V, e: &InterfaceElem) {
    match e {
        InterfaceElem::Method(m) => v.visit_signature(&m.sig),
        InterfaceElem::Embed(embed) => v.visit_type(&embed.typ),
    }
}

// =============================================================================
// Ready-made visitors
// =============================================================================

/// Collects every package-qualified reference in a type, in first-seen
/// order: `map[io.Reader]http.Header` yields `("io", "Reader")` and
/// `("http", "Header")`.
#[derive(Debug, Default)]
pub struct QualifiedRefs {
    pub refs: Vec<(String, String)>,
}

impl Visitor for QualifiedRefs {
    fn visit_named(&mut self, n: &NamedType) {
        if let Some(pkg) = &n.pkg {
            if !self.refs.iter().any(|(p, name)| p == pkg && *name == n.name) {
                self.refs.push((pkg.clone(), n.name.clone()));
            }
        }
        walk_named(self, n);
    }
}
