//! Integration tests for xpp macro expansion and formatting

use pretty_assertions::assert_eq;
use xpp::{
    format_document, run, tokenize, transform_document, transform_with_resolver, Assembler,
    ExpansionConfig, FormatOptions, MemoryFileResolver, NoopFileResolver, Options, RunMode,
    TokenKind, XppError,
};

fn transform_with_files(input: &str, resolver: &MemoryFileResolver) -> Result<String, XppError> {
    transform_with_resolver(input, "main.tex", resolver, &ExpansionConfig::default())
}

// ============================================================================
// Macro Expansion
// ============================================================================

mod expansion {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_macro() {
        assert_eq!(transform_document("\\Define\\Foo{bar}\\Foo").unwrap(), "bar");
    }

    #[test]
    fn test_delimited_macro() {
        let out = transform_document("\\Define\\Greet#1,{Hello, #1!}\\Greet World,").unwrap();
        assert_eq!(out, "Hello, World!");
    }

    #[test]
    fn test_multiple_delimiters() {
        let input = "\\Define\\Range#1..#2;{from #1 to #2}\\Range 1..10;";
        assert_eq!(transform_document(input).unwrap(), "from 1 to 10");
    }

    #[test]
    fn test_macro_defined_by_macro() {
        let input = "\\Define\\Mk#1{\\Define#1{made}}\\Mk\\New \\New";
        assert_eq!(transform_document(input).unwrap(), " made");
    }

    #[test]
    fn test_expansion_is_lazy() {
        // The body refers to \Name, which is only defined afterwards
        let input = "\\Define\\Hi{Hi \\Name}\\Define\\Name{Ada}\\Hi";
        assert_eq!(transform_document(input).unwrap(), "Hi Ada");
    }

    #[test]
    fn test_surrounding_text_is_preserved() {
        let input = "\\Define\\B#1{\\textbf{#1}}\nSome \\B{bold} text.\n";
        assert_eq!(transform_document(input).unwrap(), "\nSome \\textbf{bold} text.\n");
    }

    #[test]
    fn test_undef_missing_is_noop() {
        assert_eq!(transform_document("\\Undef\\DoesNotExist text").unwrap(), " text");

        let mut assembler = Assembler::new(
            "\\Define\\A{x}\\Undef\\DoesNotExist",
            "t.tex",
            &NoopFileResolver,
            &ExpansionConfig::default(),
        );
        assembler.parse().unwrap();
        assert_eq!(assembler.macros().len(), 1);
        assert!(assembler.macros().contains("\\A"));
    }

    #[test]
    fn test_unknown_commands_pass_through() {
        let input = "\\section{Intro} \\cite{x}";
        assert_eq!(transform_document(input).unwrap(), input);
    }
}

// ============================================================================
// Replacement Rules
// ============================================================================

mod replacement {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_replace_text() {
        assert_eq!(
            transform_document("\\Replace{cat}{dog}a cat sat").unwrap(),
            "a dog sat"
        );
    }

    #[test]
    fn test_rule_order_matters() {
        assert_eq!(
            transform_document("\\Replace{ab}{1}\\Replace{bc}{2}abc").unwrap(),
            "1c"
        );
        assert_eq!(
            transform_document("\\Replace{bc}{2}\\Replace{ab}{1}abc").unwrap(),
            "a2"
        );
    }

    #[test]
    fn test_raw_replacement_straddles_macros() {
        let input = "\\Define\\A{a}\\Define\\B{b}\\Replace*{ab}{X}\\A\\B";
        assert_eq!(transform_document(input).unwrap(), "X");
    }

    #[test]
    fn test_grouped_rule_does_not_straddle_macros() {
        let input = "\\Define\\A{a}\\Define\\B{b}\\Replace{ab}{X}\\A\\B";
        assert_eq!(transform_document(input).unwrap(), "ab");
    }

    #[test]
    fn test_raw_replacement_matches_commands() {
        let input = "\\Replace*{\\emph}{\\textit}\\emph{x}";
        assert_eq!(transform_document(input).unwrap(), "\\textit{x}");
    }

    #[test]
    fn test_unterminated_raw_operand() {
        let err = transform_document("\\Replace*{abc").unwrap_err();
        assert!(matches!(err, XppError::Lex { .. }));
    }
}

// ============================================================================
// Includes
// ============================================================================

mod includes {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_include_splices_tokens() {
        let resolver = MemoryFileResolver::new().with_file("body.tex", "middle");
        let out = transform_with_files("start \\Include{body.tex} end", &resolver).unwrap();
        assert_eq!(out, "start middle end");
    }

    #[test]
    fn test_included_definitions_are_visible() {
        let resolver = MemoryFileResolver::new()
            .with_file("macros.tex", "\\Define\\Who{you}\\Replace{hi}{hello}");
        let out = transform_with_files("\\Include{macros}hi \\Who", &resolver).unwrap();
        assert_eq!(out, "hello you");
    }

    #[test]
    fn test_include_name_expands_macros() {
        let resolver = MemoryFileResolver::new()
            .with_file("parts/a.tex", "A")
            .with_file("\\Dir/a.tex", "literal");
        let out = transform_with_files("\\Define\\Dir{parts}\\Include{\\Dir/a.tex}", &resolver)
            .unwrap();
        assert_eq!(out, "A");

        // Unknown macros in the name are kept as literal text
        let out = transform_with_files("\\Include{\\Dir/a.tex}", &resolver).unwrap();
        assert_eq!(out, "literal");
    }

    #[test]
    fn test_errors_point_into_included_file() {
        let resolver = MemoryFileResolver::new().with_file("bad.tex", "ok\n}");
        let err = transform_with_files("\\Include{bad.tex}", &resolver).unwrap_err();
        let loc = err.location().unwrap();
        assert_eq!(&*loc.file, "bad.tex");
        assert_eq!(loc.line, 2);
    }
}

// ============================================================================
// Errors
// ============================================================================

mod errors {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lex_errors() {
        assert!(matches!(transform_document("a\\"), Err(XppError::Lex { .. })));
        assert!(matches!(transform_document("#x"), Err(XppError::Lex { .. })));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(transform_document("{a"), Err(XppError::Parse { .. })));
        assert!(matches!(
            transform_document("\\Define{x}"),
            Err(XppError::Parse { .. })
        ));
    }

    #[test]
    fn test_expansion_errors() {
        let err = transform_document("\\Define\\G#1;{#1}\\G no delimiter").unwrap_err();
        assert!(err.to_string().contains("EOF while parsing macro arguments"));

        assert!(matches!(
            transform_document("\\Define\\Z{#2}\\Z"),
            Err(XppError::Expansion { .. })
        ));
    }

    #[test]
    fn test_recursive_macro_hits_limit() {
        let config = ExpansionConfig {
            max_expansions: 1000,
            ..ExpansionConfig::default()
        };
        let err = transform_with_resolver("\\Define\\L{\\L}\\L", "t.tex", &NoopFileResolver, &config)
            .unwrap_err();
        assert!(matches!(err, XppError::Expansion { .. }));
    }

    #[test]
    fn test_forward_reference_is_serialization_error() {
        let err = transform_document("\\Later\\Define\\Later{x}").unwrap_err();
        assert!(matches!(err, XppError::Serialization { .. }));
    }
}

// ============================================================================
// Formatter
// ============================================================================

mod formatting {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fmt(input: &str) -> String {
        format_document(input, &FormatOptions::default()).unwrap()
    }

    const DOCUMENT: &str = "\\documentclass{article}\n\\begin{document}\nHello world.\n\n\\begin{itemize}\n\\item one\n\\item two\n\\end{itemize}\n\\end{document}\n";

    #[test]
    fn test_document_layout() {
        assert_eq!(
            fmt(DOCUMENT),
            "\\documentclass{article}\n\\begin{document}\nHello world.\n\n\\begin{itemize}\n    \\item one\n    \\item two\n\\end{itemize}\n\\end{document}\n"
        );
    }

    #[test]
    fn test_idempotence() {
        for input in [
            DOCUMENT,
            "Intro \\begin{center}\nx\n\\end{center}\n",
            "\\def\\x{\n  body\n}\n",
            "aaaa bbbb cccc dddd eeee ffff\n",
        ] {
            let once = fmt(input);
            assert_eq!(fmt(&once), once);
        }
    }

    #[test]
    fn test_width_bounded_reflow() {
        let options = FormatOptions::default().with_line_width(20);
        let out = format_document("aaaa bbbb cccc dddd eeee ffff gggg hhhh\n", &options).unwrap();
        assert!(out.lines().all(|l| l.chars().count() <= 20), "{}", out);
        assert_eq!(out.split_whitespace().count(), 8);
    }

    #[test]
    fn test_reflow_without_trailing_newline() {
        let options = FormatOptions::default().with_line_width(20);
        let out = format_document("aaaa bbbb cccc dddd eeeeeeee", &options).unwrap();
        assert_eq!(out, "aaaa bbbb cccc dddd\neeeeeeee\n");
    }

    #[test]
    fn test_atomic_token_over_width() {
        let options = FormatOptions::default().with_line_width(10);
        let out = format_document("abcdefghijklmnop xy\n", &options).unwrap();
        assert_eq!(out, "abcdefghijklmnop\nxy\n");
    }

    #[test]
    fn test_environment_pairing() {
        assert_eq!(
            fmt("x \\begin{center}a\\end{center} y\n"),
            "x \\begin{center}a\\end{center} y\n"
        );
        assert_eq!(
            fmt("x \\begin{center}a\n\\end{center} y\n"),
            "x\n\\begin{center}a\n\\end{center}\ny\n"
        );
    }

    #[test]
    fn test_blank_lines_collapse() {
        assert_eq!(fmt("a\n\n\n\n\nb\n"), "a\n\nb\n");
        assert_eq!(fmt("\n\n\na\n"), "a\n");
    }

    #[test]
    fn test_enumerate_indentation() {
        let out = fmt("\\begin{enumerate}\n\\item first\n\\emph{more}\n\\end{enumerate}\nafter\n");
        assert_eq!(
            out,
            "\\begin{enumerate}\n    \\item first\n          \\emph{more}\n\\end{enumerate}\nafter\n"
        );
    }

    #[test]
    fn test_custom_list_environment() {
        let options = FormatOptions::default().with_list_environment("steps");
        let out = format_document("\\begin{steps}\n\\item go\n\\end{steps}\n", &options).unwrap();
        assert_eq!(out, "\\begin{steps}\n    \\item go\n\\end{steps}\n");
    }
}

// ============================================================================
// Public API
// ============================================================================

mod api {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tokenize() {
        let tokens = tokenize("\\a{b}", "x.tex").unwrap();
        let kinds: Vec<TokenKind> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::CommandSequence("\\a".to_string()),
                TokenKind::GroupBegin,
                TokenKind::Text("b".to_string()),
                TokenKind::GroupEnd,
            ]
        );
    }

    #[test]
    fn test_run_transform_into_sink() {
        let mut sink = Vec::new();
        run(
            "\\Define\\X{y}\\X",
            "t.tex",
            &Options::default(),
            &NoopFileResolver,
            &mut sink,
        )
        .unwrap();
        assert_eq!(String::from_utf8(sink).unwrap(), "y");
    }

    #[test]
    fn test_run_format_into_sink() {
        let options = Options {
            mode: RunMode::Format,
            ..Options::default()
        };
        let mut sink = Vec::new();
        run("one\ntwo\n", "t.tex", &options, &NoopFileResolver, &mut sink).unwrap();
        assert_eq!(String::from_utf8(sink).unwrap(), "one two\n");
    }
}
