//! Stub rendering and source normalisation.

use std::collections::HashSet;
use std::ops::Range;

use goimpl_parser::lexer::CommentKind;
use goimpl_parser::{parse_source, Lexer, Tok};

use crate::error::{Error, Result};
use crate::receiver::ReceiverSpec;
use crate::reify::{MethodSignature, Param};

/// Renders one stub per method not in `implemented`, in order.
///
/// Parameters and results named like the receiver variable become `_` so
/// the stub does not shadow it.
pub fn render_stubs(recv: &ReceiverSpec, methods: &[MethodSignature], implemented: &HashSet<String>) -> String {
    let _span = tracing::info_span!("emit", recv = %recv.text).entered();
    let recv_var = recv.var_name.as_deref();
    let mut out = String::new();

    for m in methods {
        if implemented.contains(&m.name) {
            tracing::trace!(method = %m.name, "skipping implemented method");
            continue;
        }
        if let Some(doc) = &m.doc {
            out.push_str(doc);
        }
        out.push_str("func (");
        out.push_str(&recv.text);
        out.push_str(") ");
        out.push_str(&m.name);
        out.push('(');
        out.push_str(&param_list(&m.params, recv_var));
        out.push(')');
        match m.results.as_slice() {
            [] => {}
            [only] if only.name.is_empty() => {
                out.push(' ');
                out.push_str(&only.typ);
            }
            results => {
                out.push_str(" (");
                out.push_str(&param_list(results, recv_var));
                out.push(')');
            }
        }
        out.push_str(" {\n\tpanic(\"not implemented\") // TODO: Implement\n}\n\n");
    }
    out
}

fn param_list(params: &[Param], recv_var: Option<&str>) -> String {
    params
        .iter()
        .map(|p| {
            let name = if Some(p.name.as_str()) == recv_var { "_" } else { p.name.as_str() };
            if name.is_empty() {
                p.typ.clone()
            } else {
                format!("{name} {}", p.typ)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Turns a generated buffer into its final form.
pub trait SourceFormatter {
    /// Fails with [`Error::Format`], carrying `src`, when the buffer is not
    /// valid Go.
    fn format(&self, src: &str) -> Result<String>;
}

/// Default formatter: checks the buffer parses and applies the layout
/// rules gofmt would change in generated code. Trailing whitespace goes,
/// runs of blank lines shrink to one, and doc block comments lose their
/// common indentation.
///
/// A buffer without a package clause is treated as a list of declarations
/// and keeps one trailing blank line if it had one; a whole file ends with
/// exactly one newline.
#[derive(Debug, Default, Clone, Copy)]
pub struct Canonical;

impl SourceFormatter for Canonical {
    fn format(&self, src: &str) -> Result<String> {
        let whole_file = matches!(Lexer::new(src).next(), Some((_, Tok::KwPackage, _)));
        let parsed = if whole_file {
            parse_source(src)
        } else {
            parse_source(&format!("package p\n{src}"))
        };
        if let Err(failure) = parsed {
            return Err(Error::Format {
                message: failure.to_string(),
                source_text: src.to_string(),
            });
        }

        let (dedented, verbatim) = dedent_block_comments(src);
        let mut out = normalize_lines(&dedented, &verbatim);
        if !whole_file && src.ends_with("\n\n") && !out.is_empty() {
            out.push('\n');
        }
        Ok(out)
    }
}

/// Rewrites every block comment that starts a line so its continuation
/// lines lose their shared leading whitespace. Returns the new text and the
/// byte ranges (in it) of raw strings and block comments, whose lines are
/// left alone afterwards.
fn dedent_block_comments(src: &str) -> (String, Vec<Range<usize>>) {
    let mut lexer = Lexer::new(src);
    let raw_strings: Vec<Range<usize>> = lexer
        .by_ref()
        .filter(|(_, tok, _)| matches!(tok, Tok::RawStringLit(_)))
        .map(|(start, _, end)| start..end)
        .collect();
    let blocks: Vec<Range<usize>> = lexer
        .take_comments()
        .iter()
        .flat_map(|group| group.comments.iter())
        .filter(|c| c.kind == CommentKind::Block)
        .map(|c| c.span.start as usize..c.span.end as usize)
        .collect();

    // Both lists are in source order; merge them while rewriting.
    let mut spans: Vec<(Range<usize>, bool)> = raw_strings
        .into_iter()
        .map(|r| (r, false))
        .chain(blocks.into_iter().map(|r| (r, true)))
        .collect();
    spans.sort_by_key(|(r, _)| r.start);

    let mut out = String::with_capacity(src.len());
    let mut verbatim = Vec::with_capacity(spans.len());
    let mut copied = 0;
    for (range, is_comment) in spans {
        out.push_str(&src[copied..range.start]);
        let text = &src[range.clone()];
        let at_line_start = src[..range.start].rsplit('\n').next().is_some_and(|pre| pre.trim().is_empty());
        let start = out.len();
        if is_comment && at_line_start {
            out.push_str(&dedent(text));
        } else {
            out.push_str(text);
        }
        verbatim.push(start..out.len());
        copied = range.end;
    }
    out.push_str(&src[copied..]);
    (out, verbatim)
}

/// `/*\n\t\tText\n\t*/` → `/*\n\tText\n*/`
fn dedent(comment: &str) -> String {
    let mut lines = comment.split('\n');
    let Some(first) = lines.next() else {
        return comment.to_string();
    };
    let rest: Vec<&str> = lines.collect();
    if rest.is_empty() {
        return comment.to_string();
    }

    let indent = |l: &str| l.len() - l.trim_start_matches([' ', '\t']).len();
    let mut common: Option<&str> = None;
    for line in rest.iter().filter(|l| !l.trim().is_empty()) {
        let prefix = &line[..indent(line)];
        common = Some(match common {
            None => prefix,
            Some(c) => {
                let shared = c.bytes().zip(prefix.bytes()).take_while(|(a, b)| a == b).count();
                &c[..shared]
            }
        });
    }
    let strip = common.map_or(0, str::len);

    let mut out = String::from(first);
    for line in rest {
        out.push('\n');
        out.push_str(line.get(strip..).unwrap_or_else(|| line.trim_start()));
    }
    out
}

fn normalize_lines(src: &str, verbatim: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(src.len());
    let mut blank_run = 0;
    let mut offset = 0;

    for line in src.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let body = line.strip_suffix('\n').unwrap_or(line);
        let end = start + body.len();

        if verbatim.iter().any(|r| r.start < end && end < r.end) {
            out.push_str(line);
            blank_run = 0;
            continue;
        }

        let trimmed = body.trim_end();
        if trimmed.is_empty() {
            blank_run += 1;
            if blank_run == 1 && !out.is_empty() {
                out.push('\n');
            }
            continue;
        }
        blank_run = 0;
        out.push_str(trimmed);
        out.push('\n');
    }

    while out.ends_with("\n\n") {
        out.pop();
    }
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str, params: &[(&str, &str)], results: &[(&str, &str)]) -> MethodSignature {
        let conv = |list: &[(&str, &str)]| {
            list.iter()
                .map(|(n, t)| Param {
                    name: n.to_string(),
                    typ: t.to_string(),
                })
                .collect()
        };
        MethodSignature {
            name: name.to_string(),
            params: conv(params),
            results: conv(results),
            doc: None,
        }
    }

    #[test]
    fn stub_layout() {
        let recv = ReceiverSpec::parse("f *File").unwrap();
        let methods = [
            method("Read", &[("p", "[]byte")], &[("n", "int"), ("err", "error")]),
            method("Close", &[], &[("", "error")]),
            method("Reset", &[], &[]),
            method("Pair", &[("_", "int")], &[("", "int"), ("", "bool")]),
        ];
        let out = render_stubs(&recv, &methods, &HashSet::new());
        assert_eq!(
            out,
            "func (f *File) Read(p []byte) (n int, err error) {\n\tpanic(\"not implemented\") // TODO: Implement\n}\n\n\
             func (f *File) Close() error {\n\tpanic(\"not implemented\") // TODO: Implement\n}\n\n\
             func (f *File) Reset() {\n\tpanic(\"not implemented\") // TODO: Implement\n}\n\n\
             func (f *File) Pair(_ int) (int, bool) {\n\tpanic(\"not implemented\") // TODO: Implement\n}\n\n"
        );
    }

    #[test]
    fn receiver_name_is_not_shadowed() {
        let recv = ReceiverSpec::parse("r *Receiver").unwrap();
        let methods = [method("M", &[("r", "string"), ("s", "int")], &[("r", "error")])];
        let out = render_stubs(&recv, &methods, &HashSet::new());
        assert!(out.starts_with("func (r *Receiver) M(_ string, s int) (_ error) {"), "{out}");
    }

    #[test]
    fn implemented_methods_are_skipped() {
        let recv = ReceiverSpec::parse("T").unwrap();
        let methods = [method("A", &[], &[]), method("B", &[], &[])];
        let done: HashSet<String> = ["A".to_string()].into();
        let out = render_stubs(&recv, &methods, &done);
        assert!(!out.contains(") A("));
        assert!(out.contains("func (T) B() {"));
    }

    #[test]
    fn block_comment_is_dedented() {
        let src = "/*\n\t\tMethod1 is the first method.\n\t*/\nfunc (r *R) Method1() {\n\tpanic(\"not implemented\") // TODO: Implement\n}\n\n";
        let out = Canonical.format(src).unwrap();
        assert_eq!(
            out,
            "/*\n\tMethod1 is the first method.\n*/\nfunc (r *R) Method1() {\n\tpanic(\"not implemented\") // TODO: Implement\n}\n\n"
        );
    }

    #[test]
    fn whole_file_whitespace() {
        let src = "package p  \n\n\n\ntype T struct{}\n\n\n\nfunc (T) M() {}\n\n\n";
        assert_eq!(Canonical.format(src).unwrap(), "package p\n\ntype T struct{}\n\nfunc (T) M() {}\n");
    }

    #[test]
    fn raw_strings_are_untouched() {
        let src = "package p\n\nvar s = `a   \n\n\n\nb`\n";
        assert_eq!(Canonical.format(src).unwrap(), src);
    }

    #[test]
    fn invalid_buffer_is_reported_with_its_text() {
        let src = "func (r *R) M( {\n}\n";
        match Canonical.format(src) {
            Err(Error::Format { source_text, message }) => {
                assert_eq!(source_text, src);
                assert!(!message.is_empty());
            }
            other => panic!("expected a format error, got {other:?}"),
        }
    }
}
