//! Canonical (gofmt-style) rendering of type expressions.
//!
//! Rendering never mutates the tree. Callers that need to rewrite names
//! (qualifying exported identifiers, substituting type parameters) pass a
//! [`TypeRewriter`], which sees each named type with its arguments already
//! rendered and may return a replacement text.

use crate::ast::*;

/// Hook consulted for every [`NamedType`] during rendering.
pub trait TypeRewriter {
    /// Returns the full replacement text for `named`, or `None` to keep the
    /// default `pkg.Name[args]` rendering. `args` are the already-rewritten
    /// type arguments.
    fn rewrite_named(&self, named: &NamedType, args: &[String]) -> Option<String>;

    /// Replacement for a bare identifier in an array length.
    fn rewrite_const(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Leaves every name as written.
pub struct Verbatim;

impl TypeRewriter for Verbatim {
    #[inline]
    fn rewrite_named(&self, _named: &NamedType, _args: &[String]) -> Option<String> {
        None
    }
}

pub fn render_type(t: &TypeExpr) -> String {
    render_type_with(t, &Verbatim)
}

pub fn render_type_with(t: &TypeExpr, rw: &dyn TypeRewriter) -> String {
    let mut out = String::new();
    Printer { out: &mut out, rw }.ty(t);
    out
}

/// Renders a signature without the leading `func` keyword:
/// `(a, b int) (int, error)`.
pub fn render_signature_with(sig: &Signature, rw: &dyn TypeRewriter) -> String {
    let mut out = String::new();
    Printer { out: &mut out, rw }.signature(sig);
    out
}

struct Printer<'a> {
    out: &'a mut String,
    rw: &'a dyn TypeRewriter,
}

impl Printer<'_> {
    fn ty(&mut self, t: &TypeExpr) {
        match t {
            TypeExpr::Named(n) => self.named(n),
            TypeExpr::Pointer(elem) => {
                self.out.push('*');
                self.ty(elem);
            }
            TypeExpr::Slice(elem) => {
                self.out.push_str("[]");
                self.ty(elem);
            }
            TypeExpr::Array { len, elem } => {
                self.out.push('[');
                for part in len {
                    match part {
                        LenPart::Name(name) => match self.rw.rewrite_const(name) {
                            Some(text) => self.out.push_str(&text),
                            None => self.out.push_str(name),
                        },
                        LenPart::Text(text) => self.out.push_str(text),
                    }
                }
                self.out.push(']');
                self.ty(elem);
            }
            TypeExpr::Map { key, value } => {
                self.out.push_str("map[");
                self.ty(key);
                self.out.push(']');
                self.ty(value);
            }
            TypeExpr::Chan { dir, elem } => {
                self.out.push_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                self.ty(elem);
            }
            TypeExpr::Func(sig) => {
                self.out.push_str("func");
                self.signature(sig);
            }
            TypeExpr::Struct(fields) => {
                if fields.is_empty() {
                    self.out.push_str("struct{}");
                    return;
                }
                self.out.push_str("struct{ ");
                for (i, f) in fields.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str("; ");
                    }
                    self.field(f);
                    if let Some(tag) = &f.tag {
                        self.out.push(' ');
                        self.out.push_str(tag);
                    }
                }
                self.out.push_str(" }");
            }
            TypeExpr::Interface(elems) => {
                if elems.is_empty() {
                    self.out.push_str("interface{}");
                    return;
                }
                self.out.push_str("interface{ ");
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str("; ");
                    }
                    match e {
                        InterfaceElem::Method(m) => {
                            self.out.push_str(&m.name.name);
                            self.signature(&m.sig);
                        }
                        InterfaceElem::Embed(embed) => self.ty(&embed.typ),
                    }
                }
                self.out.push_str(" }");
            }
            TypeExpr::Paren(inner) => {
                self.out.push('(');
                self.ty(inner);
                self.out.push(')');
            }
            TypeExpr::Ellipsis(elem) => {
                self.out.push_str("...");
                self.ty(elem);
            }
            TypeExpr::Union(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(" | ");
                    }
                    if term.tilde {
                        self.out.push('~');
                    }
                    self.ty(&term.typ);
                }
            }
        }
    }

    fn named(&mut self, n: &NamedType) {
        let args: Vec<String> = n
            .args
            .iter()
            .map(|a| render_type_with(a, self.rw))
            .collect();

        if let Some(text) = self.rw.rewrite_named(n, &args) {
            self.out.push_str(&text);
            return;
        }

        if let Some(pkg) = &n.pkg {
            self.out.push_str(pkg);
            self.out.push('.');
        }
        self.out.push_str(&n.name);
        if !args.is_empty() {
            self.out.push('[');
            self.out.push_str(&args.join(", "));
            self.out.push(']');
        }
    }

    fn signature(&mut self, sig: &Signature) {
        self.out.push('(');
        self.field_list(&sig.params);
        self.out.push(')');

        match sig.results.as_slice() {
            [] => {}
            [single] if single.names.is_empty() => {
                self.out.push(' ');
                self.ty(&single.typ);
            }
            results => {
                self.out.push_str(" (");
                self.field_list(results);
                self.out.push(')');
            }
        }
    }

    fn field_list(&mut self, fields: &[Field]) {
        for (i, f) in fields.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.field(f);
        }
    }

    fn field(&mut self, f: &Field) {
        for (i, name) in f.names.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.out.push_str(&name.name);
        }
        if !f.names.is_empty() {
            self.out.push(' ');
        }
        self.ty(&f.typ);
    }
}
