//! Insertion points for `-p file:line[:col]` and `-u`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use goimpl_parser::lexer::LineIndex;
use goimpl_parser::parse_source;

use crate::error::{Error, Result};
use crate::locator::Locator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub file: PathBuf,
    /// 1-based.
    pub line: u32,
    /// 1-based byte column.
    pub column: u32,
    /// Byte offset, when already known.
    pub offset: Option<usize>,
}

impl FromStr for Position {
    type Err = Error;

    /// `file:line` or `file:line:col`; the column defaults to 1.
    fn from_str(spec: &str) -> Result<Self> {
        let parts: Vec<&str> = spec.split(':').collect();
        if parts.len() < 2 {
            return Err(Error::Position("Invalid position spec".to_string()));
        }
        let line = parts[1]
            .parse()
            .map_err(|e| Error::Position(format!("invalid line spec in position: {e}")))?;
        let column = match parts.get(2) {
            Some(col) => col
                .parse()
                .map_err(|e| Error::Position(format!("invalid column spec in position: {e}")))?,
            None => 1,
        };
        Ok(Self {
            file: PathBuf::from(parts[0]),
            line,
            column,
            offset: None,
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

impl Position {
    /// Byte offset of this position in `src`.
    pub fn offset_in(&self, src: &str) -> Result<usize> {
        if let Some(offset) = self.offset {
            return Ok(offset);
        }
        let not_found = || Error::Position(format!("Could not find {self}"));

        let lines = LineIndex::new(src);
        let start = lines.line_start(self.line).ok_or_else(not_found)?;
        let line_end = src[start..].find('\n').map_or(src.len(), |nl| start + nl);
        let offset = start + self.column.saturating_sub(1) as usize;
        if offset > line_end || !src.is_char_boundary(offset) {
            return Err(not_found());
        }
        Ok(offset)
    }
}

/// `orig` with `stubs` spliced in at `offset`, padded by blank lines.
pub fn insert_stubs(orig: &str, offset: usize, stubs: &str) -> String {
    let offset = offset.min(orig.len());
    format!("{}\n\n{}\n\n{}", &orig[..offset], stubs, &orig[offset..])
}

/// End of the type declaration that declares `type_name` among the
/// buildable files of `dir`.
pub fn type_decl_end(locator: &Locator<'_>, dir: &Path, type_name: &str) -> Result<Position> {
    let _span = tracing::debug_span!("type_decl_end", type_name).entered();
    for (path, source) in locator.buildable_files(dir)? {
        let file = parse_source(&source).map_err(|failure| Error::Syntax {
            path: path.clone(),
            failure,
        })?;
        let Some((decl, _)) = file.type_specs().find(|(_, spec)| spec.name.name == type_name) else {
            continue;
        };
        let end = decl.span.end as usize;
        let lines = LineIndex::new(&source);
        let line = lines.line_of(end);
        let column = end - lines.line_start(line).unwrap_or(0) + 1;
        tracing::debug!(file = %path.display(), line, column, "receiver declaration");
        return Ok(Position {
            file: path,
            line,
            column: column as u32,
            offset: Some(end),
        });
    }
    Err(Error::ReceiverNotFound(type_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_specs() {
        let p: Position = "a/b.go:12".parse().unwrap();
        assert_eq!((p.file.as_path(), p.line, p.column), (Path::new("a/b.go"), 12, 1));

        let p: Position = "b.go:3:7".parse().unwrap();
        assert_eq!((p.line, p.column), (3, 7));
        assert_eq!(p.to_string(), "b.go:3:7");

        let err = "b.go".parse::<Position>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid position spec");
        let err = "b.go:x".parse::<Position>().unwrap_err();
        assert!(err.to_string().starts_with("invalid line spec in position: "), "{err}");
        let err = "b.go:1:y".parse::<Position>().unwrap_err();
        assert!(err.to_string().starts_with("invalid column spec in position: "), "{err}");
    }

    #[test]
    fn offsets() {
        let src = "package p\n\ntype T struct{}\n";
        let at = |spec: &str| spec.parse::<Position>().unwrap().offset_in(src);
        assert_eq!(at("f:1").unwrap(), 0);
        assert_eq!(at("f:3").unwrap(), 11);
        assert_eq!(at("f:3:5").unwrap(), 15);
        assert!(at("f:3:40").is_err());
        assert!(at("f:9").is_err());
    }

    #[test]
    fn insertion_pads_with_blank_lines() {
        let out = insert_stubs("package p\ntype T int\n", 21, "func (T) M() {}\n");
        assert_eq!(out, "package p\ntype T int\n\n\nfunc (T) M() {}\n\n\n");
    }
}
