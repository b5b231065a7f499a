//! Build-constraint file selection.
//!
//! A file takes part in a build when its name passes the `_GOOS` /
//! `_GOARCH` suffix rule and its header constraints (`//go:build`, or the
//! legacy `// +build` lines) hold in the [`BuildContext`].

use logos::Logos;

use crate::context::{BuildContext, KNOWN_ARCH, KNOWN_OS};

/// Name-only part of file selection: extension, test files, ignored
/// prefixes and OS/arch suffixes.
pub fn good_file_name(ctx: &BuildContext, name: &str) -> bool {
    let Some(stem) = name.strip_suffix(".go") else {
        return false;
    };
    if name.starts_with('_') || name.starts_with('.') || stem.ends_with("_test") {
        return false;
    }
    good_os_arch_suffix(ctx, stem)
}

fn good_os_arch_suffix(ctx: &BuildContext, stem: &str) -> bool {
    let Some(underscore) = stem.find('_') else {
        return true;
    };
    let parts: Vec<&str> = stem[underscore..].split('_').collect();
    let n = parts.len();
    if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
        return ctx.satisfies_tag(parts[n - 2]) && ctx.satisfies_tag(parts[n - 1]);
    }
    let last = parts[n - 1];
    if KNOWN_OS.contains(&last) || KNOWN_ARCH.contains(&last) {
        return ctx.satisfies_tag(last);
    }
    true
}

/// Evaluates the constraint lines in the file header (everything before the
/// package clause). A `//go:build` line wins over `// +build` lines; a file
/// with neither always matches. An unparsable `//go:build` expression
/// excludes the file.
pub fn header_allows(ctx: &BuildContext, src: &str) -> bool {
    let mut plus_build = Vec::new();

    for line in header_comment_lines(src) {
        if let Some(expr) = line.strip_prefix("//go:build") {
            if !expr.is_empty() && !expr.starts_with([' ', '\t']) {
                continue;
            }
            return match eval_expr(ctx, expr) {
                Some(ok) => ok,
                None => {
                    tracing::warn!(expr = expr.trim(), "unparsable //go:build line");
                    false
                }
            };
        }
        if let Some(rest) = line.strip_prefix("//") {
            if let Some(opts) = rest.trim_start().strip_prefix("+build") {
                if opts.is_empty() || opts.starts_with([' ', '\t']) {
                    plus_build.push(opts);
                }
            }
        }
    }

    plus_build.iter().all(|opts| eval_plus_build(ctx, opts))
}

/// `//` lines of the leading comment block, stopping at the first line
/// holding code. Lines inside `/* */` comments do not count.
fn header_comment_lines(src: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut in_block = false;
    for line in src.lines().map(str::trim) {
        if in_block {
            in_block = !line.contains("*/");
            continue;
        }
        if line.is_empty() {
            continue;
        }
        if line.starts_with("//") {
            out.push(line);
            continue;
        }
        if let Some(rest) = line.strip_prefix("/*") {
            in_block = !rest.contains("*/");
            continue;
        }
        break;
    }
    out
}

// `// +build linux,amd64 darwin`: space-separated alternatives of
// comma-separated conjunctions.
fn eval_plus_build(ctx: &BuildContext, opts: &str) -> bool {
    opts.split_whitespace().any(|alt| {
        alt.split(',').all(|term| match term.strip_prefix('!') {
            Some(tag) => !tag.is_empty() && !ctx.satisfies_tag(tag),
            None => !term.is_empty() && ctx.satisfies_tag(term),
        })
    })
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t]+")]
enum ExprTok<'a> {
    #[token("||")]
    Or,
    #[token("&&")]
    And,
    #[token("!")]
    Not,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[regex(r"[A-Za-z0-9_.]+", |lex| lex.slice())]
    Tag(&'a str),
}

/// Evaluates a `//go:build` expression; `None` when it does not parse.
pub fn eval_expr(ctx: &BuildContext, expr: &str) -> Option<bool> {
    let toks: Vec<ExprTok<'_>> = ExprTok::lexer(expr).collect::<Result<_, _>>().ok()?;
    if toks.is_empty() {
        return None;
    }
    let mut p = ExprParser { ctx, toks, pos: 0 };
    let value = p.or()?;
    (p.pos == p.toks.len()).then_some(value)
}

struct ExprParser<'c, 'a> {
    ctx: &'c BuildContext,
    toks: Vec<ExprTok<'a>>,
    pos: usize,
}

impl ExprParser<'_, '_> {
    fn eat(&mut self, tok: ExprTok<'_>) -> bool {
        if self.toks.get(self.pos) == Some(&tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Option<bool> {
        let mut value = self.and()?;
        while self.eat(ExprTok::Or) {
            value |= self.and()?;
        }
        Some(value)
    }

    fn and(&mut self) -> Option<bool> {
        let mut value = self.not()?;
        while self.eat(ExprTok::And) {
            value &= self.not()?;
        }
        Some(value)
    }

    fn not(&mut self) -> Option<bool> {
        if self.eat(ExprTok::Not) {
            return self.not().map(|v| !v);
        }
        if self.eat(ExprTok::LParen) {
            let value = self.or()?;
            return self.eat(ExprTok::RParen).then_some(value);
        }
        match self.toks.get(self.pos) {
            Some(ExprTok::Tag(tag)) => {
                self.pos += 1;
                Some(self.ctx.satisfies_tag(tag))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux() -> BuildContext {
        BuildContext::new("/goroot", vec![])
    }

    #[test]
    fn file_name_suffixes() {
        let ctx = linux();
        assert!(good_file_name(&ctx, "io.go"));
        assert!(good_file_name(&ctx, "pipe_linux.go"));
        assert!(good_file_name(&ctx, "pipe_linux_amd64.go"));
        assert!(good_file_name(&ctx, "linux.go"));
        assert!(!good_file_name(&ctx, "pipe_windows.go"));
        assert!(!good_file_name(&ctx, "pipe_linux_arm64.go"));
        assert!(!good_file_name(&ctx, "io_test.go"));
        assert!(!good_file_name(&ctx, "_gen.go"));
        assert!(!good_file_name(&ctx, "io.s"));
    }

    #[test]
    fn go_build_expressions() {
        let ctx = linux();
        assert_eq!(eval_expr(&ctx, "linux && amd64"), Some(true));
        assert_eq!(eval_expr(&ctx, "windows || (unix && !cgo)"), Some(true));
        assert_eq!(eval_expr(&ctx, "!go1.18"), Some(false));
        assert_eq!(eval_expr(&ctx, "linux &&"), None);
        assert_eq!(eval_expr(&ctx, "(linux"), None);
    }

    #[test]
    fn header_go_build_wins_over_plus_build() {
        let ctx = linux();
        let src = "// Copyright\n\n//go:build ignore\n// +build linux\n\npackage p\n";
        assert!(!header_allows(&ctx, src));

        let src = "// +build darwin linux,amd64\n// +build !cgo\n\npackage p\n";
        assert!(header_allows(&ctx, src));

        let src = "/* block\n//go:build ignore\n*/\npackage p\n//go:build ignore\n";
        assert!(header_allows(&ctx, src));
    }

    #[test]
    fn constraint_after_package_clause_is_ignored() {
        let ctx = linux();
        assert!(header_allows(&ctx, "package p\n\n//go:build ignore\n"));
    }
}
