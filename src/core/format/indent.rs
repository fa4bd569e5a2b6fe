//! Second formatting pass: indentation
//!
//! Works line by line on the output of the first pass. Environments and
//! conditionals indent their contents by 4; list environments indent by
//! 10 with `\item` lines hanging 6 to the left. Unbalanced braces on a
//! line shift indentation by 4 per brace.

use crate::core::options::FormatOptions;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FI_LINE: Regex = Regex::new(r"^\\fi(?:[^A-Za-z@]|$)").unwrap();
    static ref BEGIN_ENV: Regex = Regex::new(r"^\\begin\{([^}]*)\}").unwrap();
    static ref END_ENV: Regex = Regex::new(r"^\\end\{([^}]*)\}").unwrap();
    static ref IF_COMMAND: Regex = Regex::new(r"\\if[A-Za-z@]*").unwrap();
    static ref FI_COMMAND: Regex = Regex::new(r"\\fi(?:[^A-Za-z@]|$)").unwrap();
}

const STEP: usize = 4;
const LIST_STEP: usize = 10;
const ITEM_OUTDENT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Opens { amount: usize },
    Closes { list: bool },
    Item,
    Other,
}

fn classify(line: &str, options: &FormatOptions) -> LineKind {
    if line.starts_with("\\begin") {
        let env = BEGIN_ENV.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str());
        if let Some(env) = env {
            // Environments closed on the same line do not indent
            if line.contains(&format!("\\end{{{}}}", env)) {
                return LineKind::Other;
            }
        }
        return match env {
            Some(env) if options.is_list_environment(env) => LineKind::Opens { amount: LIST_STEP },
            Some("document") => LineKind::Other,
            _ => LineKind::Opens { amount: STEP },
        };
    }
    if line.starts_with("\\if") {
        if IF_COMMAND.find_iter(line).count() <= FI_COMMAND.find_iter(line).count() {
            return LineKind::Other;
        }
        return LineKind::Opens { amount: STEP };
    }
    if line.starts_with("\\end") {
        let list = END_ENV
            .captures(line)
            .and_then(|c| c.get(1))
            .map_or(false, |m| options.is_list_environment(m.as_str()));
        return LineKind::Closes { list };
    }
    if FI_LINE.is_match(line) {
        return LineKind::Closes { list: false };
    }
    if line.starts_with("\\item") {
        return LineKind::Item;
    }
    LineKind::Other
}

/// Indent the lines of `text`. Lines are trimmed and runs of blank lines
/// collapse to one.
pub fn indent(text: &str, options: &FormatOptions) -> Vec<String> {
    let mut level = 0usize;
    let mut lines: Vec<String> = Vec::new();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            if lines.last().map_or(true, |l| !l.is_empty()) {
                lines.push(String::new());
            }
            continue;
        }

        let kind = classify(line, options);
        if let LineKind::Closes { list } = kind {
            if list {
                level = level.saturating_sub(ITEM_OUTDENT);
            }
            level = level.saturating_sub(STEP);
        }

        let opens = line.matches('{').count();
        let closes = line.matches('}').count();
        if closes > opens {
            level = level.saturating_sub((closes - opens) * STEP);
        }

        let width = match kind {
            LineKind::Item => level.saturating_sub(ITEM_OUTDENT),
            _ => level,
        };
        lines.push(format!("{}{}", " ".repeat(width), line));

        if let LineKind::Opens { amount } = kind {
            level += amount;
        }
        if opens > closes {
            level += (opens - closes) * STEP;
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> Vec<String> {
        indent(text, &FormatOptions::default())
    }

    #[test]
    fn test_environment_indent() {
        assert_eq!(
            run("\\begin{center}\na\n\\end{center}\nb\n"),
            vec!["\\begin{center}", "    a", "\\end{center}", "b"]
        );
    }

    #[test]
    fn test_list_indent() {
        assert_eq!(
            run("\\begin{itemize}\n\\item one\ncontinued\n\\end{itemize}\nafter"),
            vec!["\\begin{itemize}", "    \\item one", "          continued", "\\end{itemize}", "after"]
        );
    }

    #[test]
    fn test_nested_lists() {
        let out = run("\\begin{enumerate}\n\\item a\n\\begin{itemize}\n\\item b\n\\end{itemize}\n\\end{enumerate}");
        assert_eq!(
            out,
            vec![
                "\\begin{enumerate}",
                "    \\item a",
                "          \\begin{itemize}",
                "              \\item b",
                "          \\end{itemize}",
                "\\end{enumerate}",
            ]
        );
    }

    #[test]
    fn test_document_not_indented() {
        assert_eq!(
            run("\\begin{document}\ntext\n\\end{document}"),
            vec!["\\begin{document}", "text", "\\end{document}"]
        );
    }

    #[test]
    fn test_conditionals() {
        assert_eq!(
            run("\\ifx\\a\\b\nyes\n\\fi\nno"),
            vec!["\\ifx\\a\\b", "    yes", "\\fi", "no"]
        );
        assert_eq!(run("\\ifx a b x\\fi\nno"), vec!["\\ifx a b x\\fi", "no"]);
        assert_eq!(run("\\final\nx"), vec!["\\final", "x"]);
    }

    #[test]
    fn test_inline_environment_does_not_indent() {
        assert_eq!(
            run("\\begin{center}a\\end{center}\nb"),
            vec!["\\begin{center}a\\end{center}", "b"]
        );
    }

    #[test]
    fn test_braces() {
        assert_eq!(
            run("\\def\\x{\nbody\n}\nafter"),
            vec!["\\def\\x{", "    body", "}", "after"]
        );
    }

    #[test]
    fn test_blank_lines_collapse() {
        assert_eq!(run("a\n\n\n\nb\n  \n"), vec!["a", "", "b", ""]);
        assert_eq!(run("\n \n\nx"), vec!["", "x"]);
    }

    #[test]
    fn test_never_negative() {
        assert_eq!(run("}}\n\\end{itemize}\nx"), vec!["}}", "\\end{itemize}", "x"]);
    }
}
