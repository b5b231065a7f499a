//! Interface references as typed on the command line.
//!
//! Three spellings are accepted:
//!
//! | input                       | import path | name       |
//! |-----------------------------|-------------|------------|
//! | `Store`                     | (local)     | `Store`    |
//! | `http.Handler`              | guessed     | `Handler`  |
//! | `net/http.Handler`          | `net/http`  | `Handler`  |
//!
//! Each may carry type arguments (`Cache[string, []byte]`). Arguments are
//! opaque text; a nested generic like `Pair[K, V]` stays one argument.

use std::fmt;
use std::path::Path;

use goimpl_parser::ast::{Decl, TypeExpr};
use goimpl_parser::printer::render_type;
use goimpl_parser::{parse_source, parse_type_expr};

use crate::autoimport::ImportGuesser;
use crate::error::{Error, Result};
use crate::locator::Locator;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    /// Empty for a type in the search directory's package.
    pub import_path: String,
    pub name: String,
    pub type_args: Vec<String>,
}

impl TypeRef {
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            import_path: String::new(),
            name: name.into(),
            type_args: Vec::new(),
        }
    }
}

/// `Name[A, B]`, without the import path.
impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.type_args.is_empty() {
            write!(f, "[{}]", self.type_args.join(", "))?;
        }
        Ok(())
    }
}

/// Splits `[pkg.]Name[A, B]` into qualifier, name and rendered type
/// arguments.
fn parse_name_and_args(input: &str, text: &str) -> Result<(Option<String>, String, Vec<String>)> {
    let typ = parse_type_expr(text).map_err(|failure| {
        if text.contains('[') {
            Error::InvalidTypeArgs {
                input: input.to_string(),
                reason: failure.to_string(),
            }
        } else {
            Error::UnparsableInterface(input.to_string())
        }
    })?;
    match typ {
        TypeExpr::Named(named) => {
            let args = named.args.iter().map(render_type).collect();
            Ok((named.pkg, named.name, args))
        }
        _ => Err(Error::UnparsableInterface(input.to_string())),
    }
}

/// Resolves `input` to an import path and type, guessing the import path
/// for a short `pkg.Name` reference.
pub fn find_interface(
    input: &str,
    src_dir: &Path,
    locator: &Locator<'_>,
    guesser: &dyn ImportGuesser,
) -> Result<TypeRef> {
    let _span = tracing::info_span!("find_interface", iface = input).entered();

    if input.split_whitespace().count() != 1 && !input.contains('[') {
        return Err(Error::UnparsableInterface(input.to_string()));
    }

    // Only the part before the type arguments spells the path.
    let head = &input[..input.find('[').unwrap_or(input.len())];

    if let Some(slash) = head.rfind('/') {
        if slash + 1 == head.len() {
            return Err(Error::TrailingSlash(input.to_string()));
        }
        let Some(dot) = head[slash..].rfind('.').map(|d| d + slash) else {
            return Err(Error::InvalidInterfaceName(input.to_string()));
        };
        if dot + 1 == head.len() {
            return Err(Error::TrailingDot(input.to_string()));
        }
        let path = &input[..dot];
        let (qualifier, name, type_args) = parse_name_and_args(input, &input[dot + 1..])?;
        if qualifier.is_some() {
            return Err(Error::InvalidInterfaceName(input.to_string()));
        }
        tracing::debug!(path, %name, "fully qualified interface");
        return Ok(TypeRef {
            import_path: path.to_string(),
            name,
            type_args,
        });
    }

    if head.ends_with('.') {
        return Err(Error::TrailingDot(input.to_string()));
    }

    let (qualifier, name, type_args) = parse_name_and_args(input, input)?;
    let Some(qualifier) = qualifier else {
        return Ok(TypeRef {
            import_path: String::new(),
            name,
            type_args,
        });
    };

    let snippet = format!("package hack\nvar i {input}\n");
    let processed = guesser
        .process(locator, src_dir, &snippet)
        .map_err(|_| Error::UnparsableInterface(input.to_string()))?;
    let file = parse_source(&processed).map_err(|_| Error::UnparsableInterface(input.to_string()))?;

    // The guessed declaration must still be the one we wrote.
    let still_var = file.decls.iter().any(|d| matches!(d, Decl::Value(_)));
    let import = file.import_for(&qualifier).filter(|_| still_var);
    match import {
        Some(imp) => {
            tracing::debug!(path = %imp.path, %name, "guessed import path");
            Ok(TypeRef {
                import_path: imp.path.clone(),
                name,
                type_args,
            })
        }
        None => Err(Error::UnrecognizedInterface(input.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::context::BuildContext;
    use crate::fs::OsFs;
    use crate::locator::GoModules;

    /// Guesser that knows exactly one package.
    struct Fixed(&'static str, &'static str);

    impl ImportGuesser for Fixed {
        fn process(&self, _: &Locator<'_>, _: &Path, snippet: &str) -> Result<String> {
            if snippet.contains(&format!(" {}.", self.0)) {
                let (head, rest) = snippet.split_once('\n').unwrap_or((snippet, ""));
                Ok(format!("{head}\nimport \"{}\"\n{rest}", self.1))
            } else {
                Ok(snippet.to_string())
            }
        }
    }

    fn find(input: &str) -> Result<TypeRef> {
        let ctx = BuildContext::new("/nonexistent", vec![]);
        let modules = GoModules::new(ctx.clone());
        let locator = Locator::new(&ctx, &OsFs, &modules);
        find_interface(input, &PathBuf::from("/nonexistent"), &locator, &Fixed("http", "net/http"))
    }

    #[test]
    fn fully_qualified() {
        let t = find("net/http.Handler").unwrap();
        assert_eq!(t.import_path, "net/http");
        assert_eq!(t.name, "Handler");
        assert!(t.type_args.is_empty());

        let t = find("example.com/x/store.Cache[string, map[string][]byte]").unwrap();
        assert_eq!(t.import_path, "example.com/x/store");
        assert_eq!(t.name, "Cache");
        assert_eq!(t.type_args, ["string", "map[string][]byte"]);
    }

    #[test]
    fn qualified_type_args_do_not_move_the_path_split() {
        let t = find("example.com/a.Wrap[example.com/b.T]");
        // The argument is not a valid Go type expression.
        assert!(matches!(t, Err(Error::InvalidTypeArgs { .. })), "{t:?}");

        let t = find("example.com/a.Wrap[io.Reader]").unwrap();
        assert_eq!(t.import_path, "example.com/a");
        assert_eq!(t.type_args, ["io.Reader"]);
    }

    #[test]
    fn short_qualifier_is_guessed() {
        let t = find("http.ResponseWriter").unwrap();
        assert_eq!(t.import_path, "net/http");
        assert_eq!(t.name, "ResponseWriter");

        let err = find("tennis.Racket").unwrap_err();
        assert!(matches!(err, Error::UnrecognizedInterface(ref s) if s == "tennis.Racket"), "{err}");
    }

    #[test]
    fn bare_name_is_local() {
        let t = find("Store[Key[int], V]").unwrap();
        assert_eq!(t, TypeRef {
            import_path: String::new(),
            name: "Store".to_string(),
            type_args: vec!["Key[int]".to_string(), "V".to_string()],
        });
        assert_eq!(t.to_string(), "Store[Key[int], V]");
    }

    #[test]
    fn malformed_references() {
        assert!(matches!(find("net/http/"), Err(Error::TrailingSlash(_))));
        assert!(matches!(find("net/http."), Err(Error::TrailingDot(_))));
        assert!(matches!(find("net/http/httputil"), Err(Error::InvalidInterfaceName(_))));
        assert!(matches!(find("a b"), Err(Error::UnparsableInterface(_))));
        assert!(matches!(find("a+b"), Err(Error::UnparsableInterface(_))));
        assert!(matches!(find("Store[]"), Err(Error::InvalidTypeArgs { .. })));
        assert!(matches!(find("Store[int"), Err(Error::InvalidTypeArgs { .. })));
        assert!(matches!(find("Store[int]x"), Err(Error::InvalidTypeArgs { .. })));
    }
}
