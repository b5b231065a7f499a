use goimpl_parser::lexer::{Lexer, Tok};
use proptest::prelude::*;

fn method_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Z][a-z0-9]{0,6}", 1..8)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn tokens_and_comments_tile_the_input(s in ".*") {
        let mut lx = Lexer::new(&s);
        let toks: Vec<_> = lx.by_ref().take(s.len() * 2 + 8).collect();
        prop_assert!(lx.next().is_none(), "lexer did not finish: {s:?}");

        let mut covered: Vec<(usize, usize)> = Vec::new();
        for &(start, tok, end) in &toks {
            prop_assert!(start <= end && end <= s.len(), "({start},{end}) {tok:?} in {s:?}");
            // Unterminated comments are also reported as error tokens.
            if start < end && !matches!(tok, Tok::Error) {
                covered.push((start, end));
            }
        }
        for group in lx.take_comments() {
            for c in &group.comments {
                let r = c.span.range();
                prop_assert_eq!(&s[r.clone()], c.text.as_str());
                prop_assert!(c.text.starts_with("//") || c.text.starts_with("/*"));
                prop_assert!(c.start_line <= c.end_line);
                covered.push((r.start, r.end));
            }
        }

        // Real tokens and comments never overlap and come in source order.
        covered.sort_unstable();
        for pair in covered.windows(2) {
            prop_assert!(pair[0].1 <= pair[1].0, "overlap {pair:?} in {s:?}");
        }
    }

    #[test]
    fn one_semicolon_per_method_line(names in method_names()) {
        let body: String = names.iter().map(|n| format!("\t{n}(x int) error\n")).collect();
        let src = format!("type I interface {{\n{body}}}\n");
        let semis = Lexer::new(&src).filter(|(s, t, e)| matches!(t, Tok::Semi) && s == e).count();
        // One per method plus the one after the closing brace.
        prop_assert_eq!(semis, names.len() + 1);
    }

    #[test]
    fn each_method_doc_is_its_own_group(names in method_names()) {
        let body: String = names.iter().map(|n| format!("\t// {n} does it.\n\t{n}()\n")).collect();
        let src = format!("type I interface {{\n{body}}}\n");
        let mut lx = Lexer::new(&src);
        lx.by_ref().for_each(drop);
        let groups = lx.take_comments();
        prop_assert_eq!(groups.len(), names.len());
        for (g, n) in groups.iter().zip(&names) {
            prop_assert!(g.own_line());
            prop_assert_eq!(g.flatten(), format!("// {n} does it.\n"));
        }
    }
}
