//! Document assembly
//!
//! Reads the expanded token stream, handles the meta-commands and builds
//! the output node list. Emission then applies the replacement rules and
//! turns the nodes back into text.

use crate::core::engine::{
    primitives, utils, Expander, Lexer, MacroTable, MetaCommand, NodeList, SourceLocation, Token,
    TokenKind,
};
use crate::core::options::ExpansionConfig;
use crate::core::replace::{apply_rules, RawReplacementRules, ReplacementRules};
use crate::utils::error::{XppError, XppResult};
use crate::utils::files::FileResolver;
use log::debug;

/// Builds a document from a lexer, expanding macros as it goes
pub struct Assembler<'r> {
    lexer: Lexer,
    macros: MacroTable,
    expander: Expander,
    rules: ReplacementRules,
    raw_rules: RawReplacementRules,
    resolver: &'r dyn FileResolver,
    config: ExpansionConfig,
    nodes: NodeList,
    open_groups: Vec<SourceLocation>,
}

impl<'r> Assembler<'r> {
    pub fn new(
        input: &str,
        file: &str,
        resolver: &'r dyn FileResolver,
        config: &ExpansionConfig,
    ) -> Self {
        Assembler {
            lexer: Lexer::new(input, file),
            macros: MacroTable::new(),
            expander: Expander::new(config),
            rules: ReplacementRules::new(),
            raw_rules: RawReplacementRules::new(),
            resolver,
            config: *config,
            nodes: NodeList::new(),
            open_groups: Vec::new(),
        }
    }

    /// Parse the whole input and return the output text
    pub fn assemble(mut self) -> XppResult<String> {
        self.parse()?;
        debug!(
            "{} nodes after {} macro expansions",
            self.nodes.len(),
            self.expander.expansions()
        );
        self.emit()
    }

    /// Macros defined so far
    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    /// Consume the input up to end of file
    pub fn parse(&mut self) -> XppResult<()> {
        loop {
            let token = self.lexer.next_token()?;
            match &token.kind {
                TokenKind::EndOfFile => break,
                TokenKind::GroupBegin => self.open_groups.push(token.loc.clone()),
                TokenKind::GroupEnd => {
                    if self.open_groups.pop().is_none() {
                        return Err(XppError::parse("unmatched '}'", &token.loc));
                    }
                }
                TokenKind::CommandSequence(name) => {
                    if let Some(command) = primitives::meta_command(name) {
                        self.meta_command(command, &token)?;
                        continue;
                    }
                    if let Some(mac) = self.macros.get(name) {
                        self.expander.expand(&mut self.lexer, &token, mac)?;
                        continue;
                    }
                }
                _ => {}
            }
            self.nodes.push(token);
        }

        match self.open_groups.last() {
            Some(loc) => Err(XppError::parse("unterminated group at end of input", loc)),
            None => Ok(()),
        }
    }

    fn meta_command(&mut self, command: MetaCommand, token: &Token) -> XppResult<()> {
        match command {
            MetaCommand::Define => {
                let (name, mac) = primitives::parse_definition(&mut self.lexer, token)?;
                self.macros.define(name, mac);
            }
            MetaCommand::Undef => {
                let name = primitives::parse_undef(&mut self.lexer, token)?;
                self.macros.undefine(&name);
            }
            MetaCommand::Replace => {
                if self.lexer.peek_char() == Some('*') {
                    let (pattern, replacement) = self.lexer.read_raw_replace(&token.loc)?;
                    self.raw_rules.add(pattern, replacement, &token.loc);
                } else {
                    let pattern = utils::read_operand(&mut self.lexer, token)?;
                    let replacement = utils::read_operand(&mut self.lexer, token)?;
                    self.rules.add(pattern, replacement, &token.loc);
                }
            }
            MetaCommand::Include => self.include(token)?,
        }
        Ok(())
    }

    fn include(&mut self, token: &Token) -> XppResult<()> {
        let group = utils::read_operand(&mut self.lexer, token)?;
        let name = self.macros.flatten(&group, self.config.max_flatten_depth)?;
        let name = name.trim();

        if self.lexer.source_depth() > self.config.max_include_depth {
            return Err(XppError::include(
                name,
                format!("includes nested deeper than {}", self.config.max_include_depth),
                &token.loc,
            ));
        }

        let content = self
            .resolver
            .read_file(name)
            .map_err(|e| XppError::include(name, e, &token.loc))?;
        debug!("include {} ({} bytes)", name, content.len());
        self.lexer.push_source(&content, name);
        Ok(())
    }

    /// Apply replacement rules and serialize the nodes
    pub fn emit(&self) -> XppResult<String> {
        let rules = self
            .rules
            .resolve(&self.macros, self.config.max_flatten_depth)?;

        let mut out = String::new();
        for node in &self.nodes {
            match &node.kind {
                TokenKind::Text(s) => out.push_str(&apply_rules(&rules, s)),
                _ => self.write_node(node, &mut out)?,
            }
        }

        Ok(self.raw_rules.apply(&out))
    }

    fn write_node(&self, node: &Token, out: &mut String) -> XppResult<()> {
        match &node.kind {
            TokenKind::CommandSequence(name) if self.macros.contains(name) => {
                Err(XppError::serialization(
                    format!("{} is a macro but was not expanded (used before its \\Define?)", name),
                    &node.loc,
                ))
            }
            TokenKind::Macro(name) => Err(XppError::serialization(
                format!("cannot serialize unexpanded macro {}", name),
                &node.loc,
            )),
            TokenKind::EndOfFile | TokenKind::Invalid => Err(XppError::serialization(
                format!("cannot serialize {}", node.token_type()),
                &node.loc,
            )),
            _ => {
                out.push_str(&node.payload());
                Ok(())
            }
        }
    }
}

/// Expand a document, resolving includes with `resolver`
pub fn transform_with_resolver(
    input: &str,
    file: &str,
    resolver: &dyn FileResolver,
    config: &ExpansionConfig,
) -> XppResult<String> {
    Assembler::new(input, file, resolver, config).assemble()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::files::{MemoryFileResolver, NoopFileResolver};

    fn transform(input: &str) -> XppResult<String> {
        transform_with_resolver(input, "test.tex", &NoopFileResolver, &ExpansionConfig::default())
    }

    #[test]
    fn test_plain_text_unchanged() {
        let input = "\\section{Intro}\nSome text % comment\n{grouped}\n";
        assert_eq!(transform(input).unwrap(), input);
    }

    #[test]
    fn test_define_and_use() {
        assert_eq!(transform("\\Define\\Foo{bar}\\Foo").unwrap(), "bar");
        assert_eq!(transform("\\Define\\Foo{bar} x \\Foo{}").unwrap(), " x bar{}");
    }

    #[test]
    fn test_redefinition_and_undef() {
        assert_eq!(
            transform("\\Define\\A{1}\\A\\Define\\A{2}\\A\\Undef\\A\\Undef\\A\\A").unwrap(),
            "12\\A"
        );
    }

    #[test]
    fn test_nested_expansion_order() {
        let input = "\\Define\\In{i}\\Define\\Out#1{[#1]}\\Out{\\In}\\In";
        assert_eq!(transform(input).unwrap(), "[i]i");
    }

    #[test]
    fn test_unbalanced_groups() {
        assert!(matches!(transform("a}"), Err(XppError::Parse { .. })));
        let err = transform("{a").unwrap_err();
        assert!(err.to_string().contains("unterminated group"));
    }

    #[test]
    fn test_use_before_define_is_serialization_error() {
        let err = transform("\\Foo\\Define\\Foo{x}").unwrap_err();
        assert!(matches!(err, XppError::Serialization { .. }));
    }

    #[test]
    fn test_replace_rules() {
        assert_eq!(transform("\\Replace{cat}{dog}a cat sat").unwrap(), "a dog sat");
        assert_eq!(
            transform("\\Replace{a}{b}\\Replace{b}{c}ab").unwrap(),
            "cc"
        );
    }

    #[test]
    fn test_replace_does_not_touch_commands() {
        assert_eq!(transform("\\Replace{sec}{X}\\section{sec}").unwrap(), "\\section{X}");
    }

    #[test]
    fn test_replace_stays_within_one_text_token() {
        let input = "\\Define\\A{a}\\Define\\B{b}\\Replace{ab}{X}\\A\\B ab";
        assert_eq!(transform(input).unwrap(), "ab X");
        assert_eq!(transform("\\Replace{a b}{X}a b").unwrap(), "a b");
    }

    #[test]
    fn test_raw_replace_on_output() {
        assert_eq!(transform("\\Replace*{\\{}{<}{a}").unwrap(), "<a}");
    }

    #[test]
    fn test_replace_operand_uses_final_macros() {
        let input = "\\Replace{\\Word}{X}\\Define\\Word{cat}cat";
        assert_eq!(transform(input).unwrap(), "X");
    }

    #[test]
    fn test_include() {
        let resolver = MemoryFileResolver::new().with_file("defs.tex", "\\Define\\Name{World}");
        let out = transform_with_resolver(
            "\\Include{ defs.tex }Hello \\Name",
            "main.tex",
            &resolver,
            &ExpansionConfig::default(),
        )
        .unwrap();
        assert_eq!(out, "Hello World");
    }

    #[test]
    fn test_include_missing_file() {
        let err = transform("\\Include{nope.tex}").unwrap_err();
        assert!(matches!(err, XppError::Include { .. }));
    }

    #[test]
    fn test_recursive_include_is_limited() {
        let resolver = MemoryFileResolver::new().with_file("self.tex", "\\Include{self.tex}");
        let config = ExpansionConfig {
            max_include_depth: 5,
            ..ExpansionConfig::default()
        };
        let err = transform_with_resolver("\\Include{self.tex}", "main.tex", &resolver, &config)
            .unwrap_err();
        assert!(matches!(err, XppError::Include { .. }));
    }

    #[test]
    fn test_runaway_recursion_is_limited() {
        let config = ExpansionConfig {
            max_expansions: 50,
            ..ExpansionConfig::default()
        };
        let err = transform_with_resolver(
            "\\Define\\R{\\R x}\\R",
            "t.tex",
            &NoopFileResolver,
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, XppError::Expansion { .. }));
    }

    #[test]
    fn test_error_location() {
        let err = transform("ok\n  }").unwrap_err();
        let loc = err.location().unwrap();
        assert_eq!((loc.line, loc.column), (2, 3));
        assert!(err.to_string().starts_with("test.tex:2:3:"));
    }
}
