//! AST JSON serialisation helpers
//!
//! The AST serialises through serde with a `node` discriminator on every
//! statement and expression and a `base` discriminator on types, so the
//! JSON is self-describing. Symbol tables and enum member indices are
//! ordered maps, which keeps re-serialisation byte-stable and makes the
//! round trip of the `serde` subcommand an equality check.

use crate::ast::Program;
use serde_json::Value;

/// Serialise a program to pretty-printed JSON
pub fn to_json(program: &Program) -> serde_json::Result<String> {
    serde_json::to_string_pretty(program)
}

/// Deserialise a program from JSON
pub fn from_json(json: &str) -> serde_json::Result<Program> {
    serde_json::from_str(json)
}

/// Serialise a program for visualisation: spans and scope bookkeeping are
/// stripped so the tree stays compact.
pub fn to_vis_json(program: &Program) -> serde_json::Result<String> {
    let mut value = serde_json::to_value(program)?;
    strip_visual_noise(&mut value);
    serde_json::to_string_pretty(&value)
}

const STRIPPED_KEYS: &[&str] = &["span", "path_span", "scope", "scopes", "global_scope"];

fn strip_visual_noise(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for key in STRIPPED_KEYS {
                map.remove(*key);
            }
            for entry in map.values_mut() {
                strip_visual_noise(entry);
            }
        }
        Value::Array(items) => {
            for item in items {
                strip_visual_noise(item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inject::perform_injections;
    use crate::lexer::lex;
    use crate::modules::ModuleCache;
    use crate::parser::parse;
    use crate::span::SourceFile;
    use crate::typeck::typecheck;

    fn compile(source: &str) -> Program {
        let file = SourceFile::new("test.enki", source);
        let tokens = lex(&file).expect("lex failed");
        let mut modules = ModuleCache::new();
        let mut program = parse(&tokens, &file, &mut modules).expect("parse failed");
        perform_injections(&mut program);
        typecheck(&mut program).expect("typecheck failed");
        program
    }

    #[test]
    fn test_round_trip_is_byte_equal() {
        let program = compile(
            "enum Color { Red, Green }\n\
             struct Point { x: int, y: int }\n\
             define f(c: Color) -> string { return Color_to_string(c) }\n\
             let p = struct Point { 1, 2 }\n\
             let s = f(Color.Red)\n\
             if 1 < 2 { print(s) }",
        );

        let json = to_json(&program).expect("serialise");
        let parsed = from_json(&json).expect("deserialise");
        assert_eq!(
            program.body.statements.len(),
            parsed.body.statements.len()
        );
        let rejson = to_json(&parsed).expect("re-serialise");
        assert_eq!(json, rejson);
    }

    #[test]
    fn test_nodes_carry_discriminators() {
        let program = compile("let x = 1 + 2");
        let json = to_json(&program).expect("serialise");
        assert!(json.contains("\"node\": \"VarDecl\""));
        assert!(json.contains("\"node\": \"Binary\""));
        assert!(json.contains("\"base\": \"Int\""));
    }

    #[test]
    fn test_vis_strips_spans_and_scopes() {
        let program = compile("define f() -> int { return 1 }");
        let vis = to_vis_json(&program).expect("serialise");
        assert!(!vis.contains("\"span\""));
        assert!(!vis.contains("\"scope\""));
        assert!(!vis.contains("\"scopes\""));
        // The tree itself survives
        assert!(vis.contains("\"node\": \"Function\""));
        assert!(vis.contains("\"f\""));
    }

    #[test]
    fn test_empty_program_round_trip() {
        let program = compile("");
        let json = to_json(&program).expect("serialise");
        let parsed = from_json(&json).expect("deserialise");
        let rejson = to_json(&parsed).expect("re-serialise");
        assert_eq!(json, rejson);
    }
}
