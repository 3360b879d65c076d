//! DSQL - a small embedded query language for metadata queries.
//!
//! ```text
//! source text → Lexer → Parser → token tree → compile → Query → Translator → target syntax
//! ```
//!
//! The compiler consumes any token tree implementing [`SyntaxNode`]; the
//! bundled [`Lexer`] and [`Parser`] build one from DSQL text:
//!
//! ```text
//! SELECT <field-list|*> FROM <entity> [WHERE <bool-expr>]
//!     [ORDER BY <field-list> [ASC|DESC]] [LIMIT <int>] [OFFSET <int>]
//! ```
//!
//! # Example
//!
//! ```rust
//! use dsql::DefaultTranslator;
//!
//! let query = dsql::parse("select name from Account where age < 18 and grade > 0").unwrap();
//! let sql = query.translate(&mut DefaultTranslator::new()).unwrap();
//! assert_eq!(sql, "SELECT name FROM Account WHERE (age < 18 AND grade > 0)");
//! ```

pub mod ast;
pub mod compiler;
pub mod config;
pub mod lexer;
pub mod operator;
pub mod parser;
pub mod query;
pub mod token;
pub mod translator;
pub mod tree;
pub mod value;

pub use ast::{EntityType, Expression, Field};
pub use compiler::{compile, CompileError, QueryCompiler};
pub use config::{ConfigError, DsqlConfig};
pub use lexer::Lexer;
pub use operator::{Direction, Operator};
pub use parser::Parser;
pub use query::{BuildError, Query, QueryBuilder};
pub use translator::{Backend, DefaultTranslator, SeaQueryTranslator, TranslateError, Translator};
pub use tree::{NodeKind, SyntaxNode, TokenTree};
pub use value::Value;

/// Build the token tree for DSQL source text. Never fails; unparseable
/// spans show up as error markers in the tree.
pub fn parse_tree(source: &str) -> TokenTree {
    let tokens: Vec<_> = Lexer::new(source).collect();
    Parser::new(&tokens).parse()
}

/// Lex, parse and compile DSQL source text.
pub fn parse(source: &str) -> Result<Query, CompileError> {
    compile(&parse_tree(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_default(source: &str) -> String {
        parse(source)
            .unwrap()
            .translate(&mut DefaultTranslator::new())
            .unwrap()
    }

    #[test]
    fn test_canonical_round_trips() {
        let cases = [
            "SELECT name FROM Account",
            "SELECT * FROM Account",
            "SELECT name FROM Account WHERE age = 30",
            "SELECT name FROM Account WHERE (age < 18 AND grade > 0)",
            "SELECT name FROM Account WHERE ((age <> 18 OR grade > 0) AND grade > 0)",
            "SELECT name FROM Account ORDER BY name,age DESC LIMIT 10 OFFSET 20",
            "SELECT 'Billing City',name FROM Account WHERE name LIKE 'A%'",
            "SELECT name FROM Account WHERE NOT (name = 'O''Brien')",
            "SELECT name FROM Account WHERE (due >= NEXT_WEEK OR id = #[payload.id])",
        ];
        for source in cases {
            assert_eq!(to_default(source), source);
        }
    }

    #[test]
    fn test_source_grouping_is_normalised() {
        assert_eq!(
            to_default("select name from Account where age < 18 and grade > 0 or active = true"),
            "SELECT name FROM Account WHERE ((age < 18 AND grade > 0) OR active = true)"
        );
        assert_eq!(
            to_default("select name from Account where age < 18 and (grade > 0 or active = true)"),
            "SELECT name FROM Account WHERE (age < 18 AND (grade > 0 OR active = true))"
        );
        assert_eq!(
            to_default("select name from Account where ((age = 1))"),
            "SELECT name FROM Account WHERE age = 1"
        );
    }

    #[test]
    fn test_literal_forms_survive() {
        assert_eq!(
            to_default(
                "SELECT name FROM Account WHERE (amount > 10.50 AND created >= 2024-01-31) ORDER BY created ascending"
            ),
            "SELECT name FROM Account WHERE (amount > 10.50 AND created >= 2024-01-31) ORDER BY created ASC"
        );
        assert_eq!(
            to_default(r#"SELECT name FROM Account WHERE name = "Big Co""#),
            "SELECT name FROM Account WHERE name = 'Big Co'"
        );
        assert_eq!(
            to_default("SELECT name FROM Account WHERE owner <> null"),
            "SELECT name FROM Account WHERE owner <> NULL"
        );
    }

    #[test]
    fn test_double_quoted_strings_round_trip() {
        let cases = [
            (r#"SELECT name FROM Account WHERE name = "it's""#, "SELECT name FROM Account WHERE name = 'it''s'"),
            (
                r#"SELECT name FROM Account WHERE name = "say ""hi""""#,
                r#"SELECT name FROM Account WHERE name = 'say "hi"'"#,
            ),
        ];
        for (source, expected) in cases {
            let query = parse(source).unwrap();
            let text = query.translate(&mut DefaultTranslator::new()).unwrap();
            assert_eq!(text, expected);

            // 重新解析得到同一个查询
            let reparsed = parse(&text).unwrap();
            assert_eq!(reparsed, query);
            assert_eq!(to_default(&text), text);
        }
    }

    #[test]
    fn test_decimals_beyond_precision_are_not_rounded() {
        let source = "SELECT name FROM Account WHERE amount = 1.0000000000000000000000000000001";
        assert_eq!(to_default(source), source);
    }

    #[test]
    fn test_syntax_errors_never_yield_a_query() {
        for source in [
            "SELECT name FROM Account WHERE",
            "SELECT name FROM Account WHERE age >",
            "SELECT name FROM Account WHERE (age = 1",
            "SELECT name FROM Account WHERE age = 1 LIMIT ten",
            "SELECT FROM Account",
            "SELECT name FROM Account WHERE age ~ 3",
            "SELECT name Account",
        ] {
            assert!(
                matches!(parse(source), Err(CompileError::Syntax { .. })),
                "{}",
                source
            );
        }
    }

    #[test]
    fn test_missing_from_is_reported() {
        assert_eq!(
            parse("SELECT name").unwrap_err(),
            CompileError::Incomplete(BuildError::MissingSource)
        );
    }

    #[test]
    fn test_sea_query_backend_end_to_end() {
        let config = DsqlConfig {
            backend: Backend::Postgres,
            table_mapping: [("Account".to_string(), "accounts".to_string())].into(),
        };
        let query = parse("SELECT name, age FROM Account WHERE age >= 18 ORDER BY name LIMIT 5").unwrap();
        let sql = query
            .translate(&mut SeaQueryTranslator::from_config(&config))
            .unwrap();
        assert_eq!(
            sql,
            r#"SELECT "name", "age" FROM "accounts" WHERE "age" >= 18 ORDER BY "name" ASC LIMIT 5"#
        );
    }

    #[test]
    fn test_compiled_queries_are_shareable_across_threads() {
        let query = std::sync::Arc::new(parse("SELECT name FROM Account WHERE age = 30").unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let query = query.clone();
                std::thread::spawn(move || query.translate(&mut DefaultTranslator::new()).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "SELECT name FROM Account WHERE age = 30");
        }
    }

    #[test]
    fn test_query_serializes_to_json() {
        let query = parse("SELECT name FROM Account WHERE age = 30").unwrap();
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["source"]["name"], "Account");
        assert_eq!(json["fields"][0]["type"], "string");
        assert_eq!(json["filter"]["Comparison"]["value"]["value"], 30);
    }
}
