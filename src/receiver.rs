//! The receiver expression the stubs are generated for.

use goimpl_parser::ast::TypeExpr;
use goimpl_parser::parse_receiver;
use goimpl_parser::printer::render_type;

use crate::error::{Error, Result};

/// A validated receiver such as `r *List[T]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverSpec {
    /// The receiver as emitted in `func (...)`, whitespace collapsed.
    pub text: String,
    pub var_name: Option<String>,
    /// Base type name: `List` for `*List[T]`.
    pub type_name: String,
    pub is_pointer: bool,
    pub type_params: Vec<String>,
}

impl ReceiverSpec {
    /// Validates `recv` by parsing it as the receiver of a method
    /// declaration. Surrounding whitespace is tolerated; editors tend to
    /// pass a trailing space.
    pub fn parse(recv: &str) -> Result<Self> {
        let invalid = || Error::InvalidReceiver(recv.to_string());

        let text = recv.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() || words_outside_brackets(&text) > 2 {
            return Err(invalid());
        }

        let parsed = parse_receiver(&text).map_err(|failure| {
            tracing::debug!(%failure, "receiver did not parse");
            invalid()
        })?;

        let (is_pointer, base) = match &parsed.typ {
            TypeExpr::Pointer(inner) => (true, inner.as_ref()),
            other => (false, other),
        };
        let TypeExpr::Named(named) = base else {
            return Err(invalid());
        };
        if named.pkg.is_some() {
            return Err(invalid());
        }

        Ok(Self {
            text,
            var_name: parsed.name.map(|id| id.name),
            type_name: named.name.clone(),
            is_pointer,
            type_params: named.args.iter().map(render_type).collect(),
        })
    }
}

/// Space-separated words, not counting spaces inside `[...]`.
fn words_outside_brackets(text: &str) -> usize {
    let mut depth = 0usize;
    let mut words = 0;
    let mut in_word = false;
    for c in text.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if c.is_whitespace() && depth == 0 {
            in_word = false;
        } else if !in_word {
            in_word = true;
            words += 1;
        }
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receiver_forms() {
        let r = ReceiverSpec::parse("f *File").unwrap();
        assert_eq!(r.var_name.as_deref(), Some("f"));
        assert_eq!(r.type_name, "File");
        assert!(r.is_pointer);
        assert!(r.type_params.is_empty());

        let r = ReceiverSpec::parse("Murmur").unwrap();
        assert_eq!(r.var_name, None);
        assert_eq!(r.type_name, "Murmur");
        assert!(!r.is_pointer);

        let r = ReceiverSpec::parse("*Murmur").unwrap();
        assert_eq!(r.var_name, None);
        assert!(r.is_pointer);
    }

    #[test]
    fn generic_receiver() {
        let r = ReceiverSpec::parse("l *List[K, V]").unwrap();
        assert_eq!(r.type_name, "List");
        assert_eq!(r.type_params, ["K", "V"]);
        assert_eq!(r.text, "l *List[K, V]");
    }

    #[test]
    fn stray_whitespace_is_tolerated() {
        let r = ReceiverSpec::parse("  r   *Receiver ").unwrap();
        assert_eq!(r.text, "r *Receiver");
        assert_eq!(r.type_name, "Receiver");
    }

    #[test]
    fn invalid_receivers() {
        for recv in ["", "   ", "a+b", "a b c", "x pkg.T", "r []T", "func"] {
            let err = ReceiverSpec::parse(recv).unwrap_err();
            assert!(matches!(err, Error::InvalidReceiver(_)), "{recv:?}: {err}");
        }
        assert_eq!(
            ReceiverSpec::parse("a+b").unwrap_err().to_string(),
            "invalid receiver: \"a+b\""
        );
    }
}
