//! Recursive-descent parser for Go declarations.
//!
//! Only the declaration layer is modelled. Function bodies are skipped by
//! brace balancing and `const`/`var` initialisers by bracket balancing up to
//! the end of their spec, so any syntactically valid Go file parses even
//! though statements and expressions are never built.

use crate::ast::*;
use crate::error::{Diag, DiagKind, ParseFailure, Span};
use crate::lexer::{CommentGroup, Lexer, LineIndex, Spanned, Tok};

type PResult<T> = Result<T, Diag>;

impl From<Diag> for ParseFailure {
    fn from(d: Diag) -> Self {
        ParseFailure { diags: vec![d] }
    }
}

/// Parses a complete Go source file.
pub fn parse_source(src: &str) -> Result<SourceFile, ParseFailure> {
    let mut p = Parser::new(src)?;
    Ok(p.source_file()?)
}

/// Parses a standalone type expression such as `map[string][]io.Reader`.
pub fn parse_type_expr(src: &str) -> Result<TypeExpr, ParseFailure> {
    let mut p = Parser::new(src)?;
    let typ = p.ty()?;
    p.eat(Tok::Semi);
    if p.peek().is_some() {
        return Err(p.error_here("unexpected input after type").into());
    }
    Ok(typ)
}

/// Parses the inside of a method receiver, e.g. `f *File` or `List[T]`, by
/// wrapping it in a throwaway method declaration.
pub fn parse_receiver(recv: &str) -> Result<Receiver, ParseFailure> {
    let src = format!("package hack\nfunc ({recv}) Foo()");
    let file = parse_source(&src)?;
    match file.decls.as_slice() {
        [Decl::Func(FuncDecl {
            recv: Some(r),
            name,
            ..
        })] if name.name == "Foo" => Ok(r.clone()),
        _ => Err(ParseFailure::single(
            DiagKind::Parse,
            Span::default(),
            format!("not a single receiver: {recv:?}"),
        )),
    }
}

/// Strips the quotes from a Go string literal and resolves the simple
/// escapes import paths can carry.
pub fn unquote(lit: &str) -> String {
    if let Some(raw) = lit.strip_prefix('`').and_then(|s| s.strip_suffix('`')) {
        return raw.replace('\r', "");
    }
    let body = lit
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(lit);

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

enum ParamEntry {
    /// A lone identifier: a parameter name or a type, decided by its siblings.
    Bare(Ident),
    Typed(TypeExpr, Span),
    Named(Ident, TypeExpr, Span),
}

struct Parser<'src> {
    src: &'src str,
    toks: Vec<Spanned<'src>>,
    pos: usize,
    lines: LineIndex,
    comments: Vec<CommentGroup>,
}

impl<'src> Parser<'src> {
    fn new(src: &'src str) -> Result<Self, ParseFailure> {
        let mut lexer = Lexer::new(src);
        let toks: Vec<_> = lexer.by_ref().collect();
        let diags = lexer.take_diags();
        if !diags.is_empty() {
            return Err(ParseFailure { diags });
        }
        Ok(Self {
            src,
            toks,
            pos: 0,
            lines: lexer.lines().clone(),
            comments: lexer.take_comments(),
        })
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    #[inline]
    fn peek(&self) -> Option<Tok<'src>> {
        self.toks.get(self.pos).map(|t| t.1)
    }

    #[inline]
    fn peek_at(&self, n: usize) -> Option<Tok<'src>> {
        self.toks.get(self.pos + n).map(|t| t.1)
    }

    #[inline]
    fn bump(&mut self) {
        if self.pos < self.toks.len() {
            self.pos += 1;
        }
    }

    #[inline]
    fn eat(&mut self, tok: Tok<'_>) -> bool {
        if self.peek() == Some(tok) {
            self.bump();
            true
        } else {
            false
        }
    }

    #[inline]
    fn cur_start(&self) -> usize {
        self.toks.get(self.pos).map_or(self.src.len(), |t| t.0)
    }

    #[inline]
    fn prev_end(&self) -> usize {
        match self.pos.checked_sub(1) {
            Some(i) => self.toks[i].2,
            None => 0,
        }
    }

    fn error_here(&self, msg: &str) -> Diag {
        let (span, found) = match self.toks.get(self.pos) {
            Some(&(s, Tok::Semi, e)) if s == e => (Span::new(s, e), "newline".to_string()),
            Some(&(s, tok, e)) => (Span::new(s, e), tok.to_string()),
            None => (Span::empty_at(self.src.len()), "EOF".to_string()),
        };
        Diag {
            kind: DiagKind::Parse,
            span,
            message: format!("{msg}, found {found}"),
        }
    }

    fn expect(&mut self, tok: Tok<'_>, what: &str) -> PResult<()> {
        if self.eat(tok) {
            Ok(())
        } else {
            Err(self.error_here(&format!("expected {what}")))
        }
    }

    fn expect_ident(&mut self) -> PResult<Ident> {
        match self.toks.get(self.pos) {
            Some(&(s, Tok::Ident(name), e)) => {
                self.bump();
                Ok(Ident::new(name, Span::new(s, e)))
            }
            _ => Err(self.error_here("expected identifier")),
        }
    }

    /// `;` between list elements; may be omitted before `closing` or EOF.
    fn expect_semi_or(&mut self, closing: Tok<'_>) -> PResult<()> {
        match self.peek() {
            Some(Tok::Semi) => {
                self.bump();
                Ok(())
            }
            None => Ok(()),
            Some(t) if t == closing => Ok(()),
            _ => Err(self.error_here("expected ';'")),
        }
    }

    fn starts_type(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Tok::Ident(_)
                    | Tok::Star
                    | Tok::LBrack
                    | Tok::KwMap
                    | Tok::KwChan
                    | Tok::Arrow
                    | Tok::KwFunc
                    | Tok::KwStruct
                    | Tok::KwInterface
                    | Tok::LParen
            )
        )
    }

    /// Looks at the bracket opened `offset` tokens ahead and reports whether
    /// the token after its matching close satisfies `follows`.
    fn bracket_followed_by(&self, offset: usize, follows: impl Fn(Option<Tok<'src>>) -> bool) -> bool {
        let mut depth = 0i32;
        let mut i = self.pos + offset;
        while let Some(&(_, tok, _)) = self.toks.get(i) {
            match tok {
                Tok::LBrack | Tok::LParen | Tok::LBrace => depth += 1,
                Tok::RBrack | Tok::RParen | Tok::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return follows(self.toks.get(i + 1).map(|t| t.1));
                    }
                }
                _ => {}
            }
            i += 1;
        }
        false
    }

    /// The comment group that documents the element starting at `start`:
    /// own-line, after the previous token, ending on the line just above.
    fn lead_comment(&self, start: usize) -> Option<CommentGroup> {
        let idx = self
            .comments
            .partition_point(|g| g.span().end as usize <= start);
        let group = self.comments.get(idx.checked_sub(1)?)?;
        let line = self.lines.line_of(start);
        let attached = group.own_line()
            && group.span().start as usize >= self.prev_end()
            && group.end_line() + 1 == line;
        attached.then(|| group.clone())
    }

    // =========================================================================
    // Source file and declarations
    // =========================================================================

    fn source_file(&mut self) -> PResult<SourceFile> {
        let doc = self.lead_comment(self.cur_start());
        self.expect(Tok::KwPackage, "'package'")?;
        let package = self.expect_ident()?;
        self.expect_semi_or(Tok::Semi)?;

        let mut imports = Vec::new();
        let mut decls = Vec::new();

        while self.peek() == Some(Tok::KwImport) {
            self.import_decl(&mut imports)?;
            self.expect_semi_or(Tok::Semi)?;
        }

        while let Some(tok) = self.peek() {
            match tok {
                Tok::Semi => {
                    self.bump();
                    continue;
                }
                Tok::KwType => decls.push(Decl::Type(self.type_decl()?)),
                Tok::KwFunc => decls.push(Decl::Func(self.func_decl()?)),
                Tok::KwConst | Tok::KwVar => decls.push(Decl::Value(self.value_decl()?)),
                Tok::KwImport => {
                    return Err(self.error_here("imports must appear before other declarations"))
                }
                _ => return Err(self.error_here("expected declaration")),
            }
            self.expect_semi_or(Tok::Semi)?;
        }

        Ok(SourceFile {
            package,
            doc,
            imports,
            decls,
            comments: std::mem::take(&mut self.comments),
        })
    }

    fn import_decl(&mut self, out: &mut Vec<ImportSpec>) -> PResult<()> {
        self.bump();
        if self.eat(Tok::LParen) {
            while !matches!(self.peek(), Some(Tok::RParen) | None) {
                if self.eat(Tok::Semi) {
                    continue;
                }
                out.push(self.import_spec()?);
                self.expect_semi_or(Tok::RParen)?;
            }
            self.expect(Tok::RParen, "')'")
        } else {
            out.push(self.import_spec()?);
            Ok(())
        }
    }

    fn import_spec(&mut self) -> PResult<ImportSpec> {
        let start = self.cur_start();
        let name = match self.peek() {
            Some(Tok::Dot) => {
                self.bump();
                Some(ImportName::Dot)
            }
            Some(Tok::Ident("_")) => {
                self.bump();
                Some(ImportName::Blank)
            }
            Some(Tok::Ident(_)) => Some(ImportName::Name(self.expect_ident()?)),
            _ => None,
        };
        let path = match self.peek() {
            Some(Tok::StringLit(lit) | Tok::RawStringLit(lit)) => {
                self.bump();
                unquote(lit)
            }
            _ => return Err(self.error_here("expected import path")),
        };
        Ok(ImportSpec {
            name,
            path,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn type_decl(&mut self) -> PResult<TypeDecl> {
        let start = self.cur_start();
        let doc = self.lead_comment(start);
        self.bump();

        let mut specs = Vec::new();
        if self.eat(Tok::LParen) {
            while !matches!(self.peek(), Some(Tok::RParen) | None) {
                if self.eat(Tok::Semi) {
                    continue;
                }
                let spec_doc = self.lead_comment(self.cur_start());
                let mut spec = self.type_spec()?;
                spec.doc = spec_doc;
                specs.push(spec);
                self.expect_semi_or(Tok::RParen)?;
            }
            self.expect(Tok::RParen, "')'")?;
        } else {
            let mut spec = self.type_spec()?;
            spec.doc = doc.clone();
            specs.push(spec);
        }

        Ok(TypeDecl {
            doc,
            specs,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn type_spec(&mut self) -> PResult<TypeSpec> {
        let start = self.cur_start();
        let name = self.expect_ident()?;
        let type_params = if self.peek() == Some(Tok::LBrack) && self.looks_like_type_params() {
            self.type_params()?
        } else {
            Vec::new()
        };
        let alias = self.eat(Tok::Assign);
        let typ = self.ty()?;
        Ok(TypeSpec {
            doc: None,
            name,
            type_params,
            alias,
            typ,
            span: Span::new(start, self.prev_end()),
        })
    }

    // `type A[T any] ...` versus `type A [N]int`.
    fn looks_like_type_params(&self) -> bool {
        matches!(self.peek_at(1), Some(Tok::Ident(_)))
            && matches!(
                self.peek_at(2),
                Some(
                    Tok::Ident(_)
                        | Tok::Comma
                        | Tok::Star
                        | Tok::LBrack
                        | Tok::LParen
                        | Tok::Tilde
                        | Tok::Arrow
                        | Tok::KwInterface
                        | Tok::KwFunc
                        | Tok::KwMap
                        | Tok::KwChan
                        | Tok::KwStruct
                )
            )
    }

    fn type_params(&mut self) -> PResult<Vec<TypeParam>> {
        self.expect(Tok::LBrack, "'['")?;
        let mut out = Vec::new();
        let mut pending = Vec::new();

        while !matches!(self.peek(), Some(Tok::RBrack) | None) {
            pending.push(self.expect_ident()?);
            if self.eat(Tok::Comma) {
                continue;
            }
            let constraint = self.union_type()?;
            out.push(TypeParam {
                names: std::mem::take(&mut pending),
                constraint,
            });
            if !self.eat(Tok::Comma) {
                break;
            }
        }

        if !pending.is_empty() {
            return Err(self.error_here("type parameters need a constraint"));
        }
        if out.is_empty() {
            return Err(self.error_here("empty type parameter list"));
        }
        self.expect(Tok::RBrack, "']'")?;
        Ok(out)
    }

    fn func_decl(&mut self) -> PResult<FuncDecl> {
        let start = self.cur_start();
        let doc = self.lead_comment(start);
        self.bump();

        let recv = if self.peek() == Some(Tok::LParen) {
            Some(self.receiver()?)
        } else {
            None
        };
        let name = self.expect_ident()?;
        let type_params = if self.peek() == Some(Tok::LBrack) {
            self.type_params()?
        } else {
            Vec::new()
        };
        let sig = self.signature()?;
        let body = if self.peek() == Some(Tok::LBrace) {
            Some(self.skip_block()?)
        } else {
            None
        };

        Ok(FuncDecl {
            doc,
            recv,
            name,
            type_params,
            sig,
            body,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn receiver(&mut self) -> PResult<Receiver> {
        let start = self.cur_start();
        let mut fields = self.params()?;
        let span = Span::new(start, self.prev_end());
        let bad = |message: &str| Diag {
            kind: DiagKind::Parse,
            span,
            message: message.to_string(),
        };
        match fields.len() {
            0 => return Err(bad("method has no receiver")),
            1 if fields[0].names.len() <= 1 => {}
            _ => return Err(bad("method has multiple receivers")),
        }
        let field = fields.remove(0);
        Ok(Receiver {
            name: field.names.into_iter().next(),
            typ: field.typ,
            span,
        })
    }

    fn skip_block(&mut self) -> PResult<Span> {
        let start = self.cur_start();
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            self.bump();
            match tok {
                Tok::LBrace => depth += 1,
                Tok::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(Span::new(start, self.prev_end()));
                    }
                }
                _ => {}
            }
        }
        Err(self.error_here("expected '}'"))
    }

    fn value_decl(&mut self) -> PResult<ValueDecl> {
        let start = self.cur_start();
        let kind = if self.peek() == Some(Tok::KwConst) {
            ValueKind::Const
        } else {
            ValueKind::Var
        };
        self.bump();

        let mut specs = Vec::new();
        if self.eat(Tok::LParen) {
            while !matches!(self.peek(), Some(Tok::RParen) | None) {
                if self.eat(Tok::Semi) {
                    continue;
                }
                specs.push(self.value_spec()?);
                self.expect_semi_or(Tok::RParen)?;
            }
            self.expect(Tok::RParen, "')'")?;
        } else {
            specs.push(self.value_spec()?);
        }

        Ok(ValueDecl {
            kind,
            specs,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn value_spec(&mut self) -> PResult<ValueSpec> {
        let mut names = vec![self.expect_ident()?];
        while self.eat(Tok::Comma) {
            names.push(self.expect_ident()?);
        }
        let typ = if self.starts_type() {
            Some(self.ty()?)
        } else {
            None
        };

        // Initialiser is skipped.
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            match tok {
                Tok::LParen | Tok::LBrack | Tok::LBrace => depth += 1,
                Tok::RParen | Tok::RBrack | Tok::RBrace => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                Tok::Semi if depth == 0 => break,
                _ => {}
            }
            self.bump();
        }
        Ok(ValueSpec { names, typ })
    }

    // =========================================================================
    // Types
    // =========================================================================

    fn ty(&mut self) -> PResult<TypeExpr> {
        match self.peek() {
            Some(Tok::Ident(_)) => self.type_name(),
            Some(Tok::Star) => {
                self.bump();
                Ok(TypeExpr::Pointer(Box::new(self.ty()?)))
            }
            Some(Tok::LBrack) => self.array_or_slice(),
            Some(Tok::KwMap) => {
                self.bump();
                self.expect(Tok::LBrack, "'['")?;
                let key = self.ty()?;
                self.expect(Tok::RBrack, "']'")?;
                let value = self.ty()?;
                Ok(TypeExpr::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }
            Some(Tok::KwChan) => {
                self.bump();
                let dir = if self.eat(Tok::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                Ok(TypeExpr::Chan {
                    dir,
                    elem: Box::new(self.ty()?),
                })
            }
            Some(Tok::Arrow) => {
                self.bump();
                self.expect(Tok::KwChan, "'chan'")?;
                Ok(TypeExpr::Chan {
                    dir: ChanDir::Recv,
                    elem: Box::new(self.ty()?),
                })
            }
            Some(Tok::KwFunc) => {
                self.bump();
                Ok(TypeExpr::Func(Box::new(self.signature()?)))
            }
            Some(Tok::KwStruct) => self.struct_type(),
            Some(Tok::KwInterface) => self.interface_type(),
            Some(Tok::LParen) => {
                self.bump();
                let inner = self.ty()?;
                self.expect(Tok::RParen, "')'")?;
                Ok(TypeExpr::Paren(Box::new(inner)))
            }
            _ => Err(self.error_here("expected type")),
        }
    }

    fn type_name(&mut self) -> PResult<TypeExpr> {
        let first = self.expect_ident()?;
        let (pkg, name) = if self.eat(Tok::Dot) {
            (Some(first.name), self.expect_ident()?.name)
        } else {
            (None, first.name)
        };
        let args = if self.peek() == Some(Tok::LBrack) && self.peek_at(1) != Some(Tok::RBrack) {
            self.type_args()?
        } else {
            Vec::new()
        };
        Ok(TypeExpr::Named(NamedType { pkg, name, args }))
    }

    fn type_args(&mut self) -> PResult<Vec<TypeExpr>> {
        self.expect(Tok::LBrack, "'['")?;
        let mut args = Vec::new();
        while self.peek() != Some(Tok::RBrack) {
            args.push(self.ty()?);
            if !self.eat(Tok::Comma) {
                break;
            }
        }
        self.expect(Tok::RBrack, "']'")?;
        if args.is_empty() {
            return Err(self.error_here("expected type argument list"));
        }
        Ok(args)
    }

    fn array_or_slice(&mut self) -> PResult<TypeExpr> {
        let open_end = self.toks[self.pos].2;
        self.bump();
        if self.eat(Tok::RBrack) {
            return Ok(TypeExpr::Slice(Box::new(self.ty()?)));
        }

        let first = self.pos;
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => return Err(self.error_here("expected ']'")),
                Some(Tok::RBrack) if depth == 0 => break,
                Some(Tok::LBrack | Tok::LParen | Tok::LBrace) => depth += 1,
                Some(Tok::RBrack | Tok::RParen | Tok::RBrace) => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.bump();
        }
        let len = self.len_parts(open_end, first, self.pos);
        self.bump();
        Ok(TypeExpr::Array {
            len,
            elem: Box::new(self.ty()?),
        })
    }

    /// Splits the tokens `first..last` of an array length into text and
    /// bare identifiers, with whitespace collapsed to single spaces.
    fn len_parts(&self, open_end: usize, first: usize, last: usize) -> Vec<LenPart> {
        let mut parts = Vec::new();
        let mut text = String::new();
        let mut prev_end = open_end;
        for i in first..last {
            let (start, tok, end) = self.toks[i];
            let slice = &self.src[start..end];
            if slice.trim().is_empty() {
                continue;
            }
            if start > prev_end && (!text.is_empty() || !parts.is_empty()) {
                text.push(' ');
            }
            prev_end = end;

            let after_dot = i > first && matches!(self.toks[i - 1].1, Tok::Dot);
            let before_dot = matches!(self.toks.get(i + 1).map(|t| t.1), Some(Tok::Dot));
            match tok {
                Tok::Ident(name) if !after_dot && !before_dot => {
                    if !text.is_empty() {
                        parts.push(LenPart::Text(std::mem::take(&mut text)));
                    }
                    parts.push(LenPart::Name(name.to_string()));
                }
                _ => text.push_str(slice),
            }
        }
        if !text.is_empty() {
            parts.push(LenPart::Text(text));
        }
        parts
    }

    /// `TypeTerm { "|" TypeTerm }`; a lone plain term is returned as is.
    fn union_type(&mut self) -> PResult<TypeExpr> {
        let mut terms = vec![self.type_term()?];
        while self.eat(Tok::Pipe) {
            terms.push(self.type_term()?);
        }
        if terms.len() == 1 && !terms[0].tilde {
            return Ok(terms.remove(0).typ);
        }
        Ok(TypeExpr::Union(terms))
    }

    fn type_term(&mut self) -> PResult<TypeTerm> {
        let tilde = self.eat(Tok::Tilde);
        Ok(TypeTerm {
            tilde,
            typ: self.ty()?,
        })
    }

    fn signature(&mut self) -> PResult<Signature> {
        let params = self.params()?;
        let results = if self.peek() == Some(Tok::LParen) {
            self.params()?
        } else if self.starts_type() {
            let start = self.cur_start();
            let typ = self.ty()?;
            vec![Field {
                names: Vec::new(),
                typ,
                tag: None,
                span: Span::new(start, self.prev_end()),
            }]
        } else {
            Vec::new()
        };
        Ok(Signature { params, results })
    }

    fn params(&mut self) -> PResult<Vec<Field>> {
        self.expect(Tok::LParen, "'('")?;
        let mut entries = Vec::new();
        while !matches!(self.peek(), Some(Tok::RParen) | None) {
            entries.push(self.param_entry()?);
            if !self.eat(Tok::Comma) {
                break;
            }
        }
        self.expect(Tok::RParen, "')'")?;
        resolve_params(entries)
    }

    fn param_entry(&mut self) -> PResult<ParamEntry> {
        let start = self.cur_start();
        if let Some(Tok::Ident(_)) = self.peek() {
            let anonymous_type = match self.peek_at(1) {
                Some(Tok::Dot) => true,
                Some(Tok::Comma | Tok::RParen) => {
                    return Ok(ParamEntry::Bare(self.expect_ident()?));
                }
                // `T[int]` is a type; `buf []byte` is a name and a type.
                Some(Tok::LBrack) => {
                    self.bracket_followed_by(1, |t| matches!(t, Some(Tok::Comma | Tok::RParen)))
                }
                _ => false,
            };
            if !anonymous_type {
                let name = self.expect_ident()?;
                let typ = self.param_type()?;
                return Ok(ParamEntry::Named(name, typ, Span::new(start, self.prev_end())));
            }
        }
        let typ = self.param_type()?;
        Ok(ParamEntry::Typed(typ, Span::new(start, self.prev_end())))
    }

    fn param_type(&mut self) -> PResult<TypeExpr> {
        if self.eat(Tok::Ellipsis) {
            Ok(TypeExpr::Ellipsis(Box::new(self.ty()?)))
        } else {
            self.ty()
        }
    }

    fn struct_type(&mut self) -> PResult<TypeExpr> {
        self.bump();
        self.expect(Tok::LBrace, "'{'")?;
        let mut fields = Vec::new();
        while !matches!(self.peek(), Some(Tok::RBrace) | None) {
            if self.eat(Tok::Semi) {
                continue;
            }
            fields.push(self.struct_field()?);
            self.expect_semi_or(Tok::RBrace)?;
        }
        self.expect(Tok::RBrace, "'}'")?;
        Ok(TypeExpr::Struct(fields))
    }

    fn struct_field(&mut self) -> PResult<Field> {
        let start = self.cur_start();
        let embedded = match (self.peek(), self.peek_at(1)) {
            (Some(Tok::Star), _) => true,
            (Some(Tok::Ident(_)), next) => match next {
                None
                | Some(
                    Tok::Dot
                    | Tok::Semi
                    | Tok::RBrace
                    | Tok::StringLit(_)
                    | Tok::RawStringLit(_),
                ) => true,
                Some(Tok::LBrack) => self.bracket_followed_by(1, |t| {
                    matches!(
                        t,
                        None | Some(Tok::Semi | Tok::RBrace | Tok::StringLit(_) | Tok::RawStringLit(_))
                    )
                }),
                _ => false,
            },
            _ => false,
        };

        let (names, typ) = if embedded {
            (Vec::new(), self.ty()?)
        } else {
            let mut names = vec![self.expect_ident()?];
            while self.eat(Tok::Comma) {
                names.push(self.expect_ident()?);
            }
            (names, self.ty()?)
        };

        let tag = match self.peek() {
            Some(Tok::StringLit(lit) | Tok::RawStringLit(lit)) => {
                self.bump();
                Some(lit.to_string())
            }
            _ => None,
        };

        Ok(Field {
            names,
            typ,
            tag,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn interface_type(&mut self) -> PResult<TypeExpr> {
        self.bump();
        self.expect(Tok::LBrace, "'{'")?;
        let mut elems = Vec::new();
        while !matches!(self.peek(), Some(Tok::RBrace) | None) {
            if self.eat(Tok::Semi) {
                continue;
            }
            let start = self.cur_start();
            let doc = self.lead_comment(start);
            if matches!(self.peek(), Some(Tok::Ident(_))) && self.peek_at(1) == Some(Tok::LParen) {
                let name = self.expect_ident()?;
                let sig = self.signature()?;
                elems.push(InterfaceElem::Method(MethodSpec {
                    doc,
                    name,
                    sig,
                    span: Span::new(start, self.prev_end()),
                }));
            } else {
                let typ = self.union_type()?;
                elems.push(InterfaceElem::Embed(EmbedSpec {
                    typ,
                    span: Span::new(start, self.prev_end()),
                }));
            }
            self.expect_semi_or(Tok::RBrace)?;
        }
        self.expect(Tok::RBrace, "'}'")?;
        Ok(TypeExpr::Interface(elems))
    }
}

/// Applies Go's parameter grouping: if any entry carries a name, bare
/// identifiers are names sharing the next entry's type (`a, b int`);
/// otherwise every entry is a type (`int, string`).
fn resolve_params(entries: Vec<ParamEntry>) -> PResult<Vec<Field>> {
    let named = entries.iter().any(|e| matches!(e, ParamEntry::Named(..)));
    let mut out = Vec::with_capacity(entries.len());

    if !named {
        for entry in entries {
            let (typ, span) = match entry {
                ParamEntry::Bare(id) => (TypeExpr::named(id.name), id.span),
                ParamEntry::Typed(typ, span) => (typ, span),
                ParamEntry::Named(..) => unreachable!("checked above"),
            };
            out.push(Field {
                names: Vec::new(),
                typ,
                tag: None,
                span,
            });
        }
        return Ok(out);
    }

    let mut pending: Vec<Ident> = Vec::new();
    for entry in entries {
        match entry {
            ParamEntry::Bare(id) => pending.push(id),
            ParamEntry::Named(id, typ, span) => {
                let start = pending.first().map_or(span.start, |p| p.span.start);
                pending.push(id);
                out.push(Field {
                    names: std::mem::take(&mut pending),
                    typ,
                    tag: None,
                    span: Span {
                        start,
                        end: span.end,
                    },
                });
            }
            ParamEntry::Typed(_, span) => {
                return Err(Diag {
                    kind: DiagKind::Parse,
                    span,
                    message: "mixed named and unnamed parameters".to_string(),
                });
            }
        }
    }

    if let Some(last) = pending.last() {
        return Err(Diag {
            kind: DiagKind::Parse,
            span: last.span,
            message: "mixed named and unnamed parameters".to_string(),
        });
    }
    Ok(out)
}
