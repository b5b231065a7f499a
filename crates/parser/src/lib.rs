//! Go declaration-level front end (Logos lexer + recursive-descent parser).
//!
//! - The lexer implements Go semicolon insertion and keeps every comment,
//!   grouped the way `go/ast` groups them.
//! - The parser builds declarations, signatures and type expressions; bodies
//!   are skipped.
//! - The printer renders type expressions in gofmt's canonical form, with a
//!   hook for rewriting names.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod walk;

// Re-exports for convenience
pub use error::{Diag, DiagKind, ParseFailure, Span};
pub use lexer::{CommentGroup, Lexer, Tok};
pub use parser::{parse_receiver, parse_source, parse_type_expr};
