use goimpl_parser::lexer::{Lexer, Tok};

/// Token texts separated by spaces; inserted semicolons print as `;`.
fn shape(src: &str) -> String {
    Lexer::new(src)
        .map(|(s, _, e)| if s == e { ";" } else { &src[s..e] })
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn interface_bodies() {
    assert_eq!(
        shape("type S interface {\n\tGet(k K) (V, bool)\n\tio.Closer\n}\n"),
        "type S interface { Get ( k K ) ( V , bool ) ; io . Closer ; } ;"
    );
    assert_eq!(shape("type E interface{ M(); N() }"), "type E interface { M ( ) ; N ( ) } ;");
    assert_eq!(
        shape("type U interface {\n\t~int | ~string\n\tf(xs ...T)\n}"),
        "type U interface { ~ int | ~ string ; f ( xs ... T ) ; } ;"
    );
}

#[test]
fn trailing_commas_and_open_brackets_suppress_semicolons() {
    assert_eq!(
        shape("type P[\n\tK comparable,\n\tV any,\n] struct{}\n"),
        "type P [ K comparable , V any , ] struct { } ;"
    );
    assert_eq!(shape("func F(\n\ta int,\n) (\n\terr error,\n)\n"), "func F ( a int , ) ( err error , ) ;");
}

#[test]
fn result_types_end_the_line() {
    assert_eq!(shape("func F() error\nfunc G()\n"), "func F ( ) error ; func G ( ) ;");
    assert_eq!(shape("func H() <-chan T\nvar c chan<- T\n"), "func H ( ) <- chan T ; var c chan <- T ;");
}

#[test]
fn statement_keywords() {
    assert_eq!(
        shape("break\ncontinue\nfallthrough\nreturn\ngo\nx++\ny--\n"),
        "break ; continue ; fallthrough ; return ; go x ++ ; y -- ;"
    );
}

#[test]
fn carriage_returns_end_lines() {
    assert_eq!(shape("import (\r\n\t\"io\"\r\t. \"fmt\"\r\n)"), "import ( \"io\" ; . \"fmt\" ; ) ;");
    assert_eq!(shape("Get() // doc\r\nPut()"), "Get ( ) ; Put ( ) ;");
}

#[test]
fn comments_are_not_tokens() {
    assert_eq!(shape("x /* c */ y"), "x y ;");
    assert_eq!(shape("// only a comment\n"), "");
    assert_eq!(shape("Get() // doc\nPut()"), "Get ( ) ; Put ( ) ;");
}

#[test]
fn literals() {
    assert_eq!(
        shape("x = 0x1F + 1e3i + 0b1_0\ns := \"a\\\"b\" + 'c' + `raw`\n"),
        "x = 0x1F + 1e3i + 0b1_0 ; s := \"a\\\"b\" + 'c' + `raw` ;"
    );
    let toks: Vec<_> = Lexer::new("`{`").map(|(_, t, _)| t).collect();
    assert!(matches!(toks[0], Tok::RawStringLit("`{`")), "{toks:?}");
}

#[test]
fn unicode_names() {
    assert_eq!(shape("type Größe interface{ Maß() }"), "type Größe interface { Maß ( ) } ;");
    assert_eq!(shape("x\u{0661}\u{0662} := 1"), "x\u{0661}\u{0662} := 1 ;");
}

#[test]
fn byte_order_mark_only_at_start() {
    assert_eq!(shape("\u{FEFF}package p"), "package p ;");

    let src = "π\u{FEFF}σ";
    let mut lx = Lexer::new(src);
    let toks: Vec<_> = lx.by_ref().collect();
    assert!(toks.iter().any(|(s, t, _)| matches!(t, Tok::Error) && *s == "π".len()), "{toks:?}");
    assert!(!lx.take_diags().is_empty());
}

#[test]
fn illegal_characters_become_error_tokens() {
    for bad in ['\u{2003}', '\u{200D}', '\u{0301}', '@'] {
        let src = format!("x{bad}y");
        let mut lx = Lexer::new(&src);
        let toks: Vec<_> = lx.by_ref().collect();
        let at = 1..1 + bad.len_utf8();
        assert!(
            toks.iter().any(|(s, t, e)| matches!(t, Tok::Error) && (*s..*e) == at),
            "U+{:04X}: {toks:?}",
            bad as u32
        );
        assert!(!lx.take_diags().is_empty());
        // No semicolon right after the error.
        assert_eq!(shape(&src), format!("x {bad} y ;"));
    }
}
