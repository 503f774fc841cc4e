//! JSON command schemas, bound onto `argot` parsers.
//!
//! A [`CommandSchema`] describes a command line declaratively. Binding it
//! goes in two steps:
//! - [`SlotTable::allocate`] validates the schema and allocates typed
//!   storage for every argument
//! - [`bind`] declares the arguments on an [`argot::ArgumentParser`] whose
//!   destinations point into that storage
//!
//! After parsing, [`SlotTable::to_json`] reads the values back.

mod bind;
mod error;
mod model;
mod slots;

pub use bind::bind;
pub use error::SchemaError;
pub use model::{
    ActionSchema, ArgSchema, CommandSchema, Nargs, ScalarType, SubCommandSchema, ValueType,
};
pub use slots::SlotTable;

#[cfg(test)]
mod tests {
    use super::*;
    use argot::{ParseError, ParseOutcome};
    use serde_json::json;

    fn schema(text: &str) -> CommandSchema {
        CommandSchema::from_json(text).unwrap()
    }

    fn run(
        schema: &CommandSchema,
        argv: &[&str],
    ) -> (Result<ParseOutcome, ParseError>, serde_json::Value) {
        let mut slots = SlotTable::allocate(schema).unwrap();
        let outcome = {
            let mut parser = bind(schema, &mut slots).unwrap();
            parser.parse_args(argv.iter().copied())
        };
        (outcome, slots.to_json())
    }

    const PACK: &str = r#"{
        "name": "pack",
        "description": "Bundle files.",
        "version": "0.3.0",
        "args": [
            {"names": ["-v", "--verbose"], "action": "count", "help": "more output"},
            {"names": ["-l", "--level"], "value-type": "int", "default": 6},
            {"names": ["--exclude"], "action": "append"},
            {"names": ["--dry-run"], "action": "store-true"},
            {"names": ["--mode"], "action": "store-const", "const": "fast"},
            {"names": ["-t", "--tag"], "action": "append-const", "value-type": "char", "const": "x"},
            {"names": ["--ratio"], "value-type": "float", "nargs": "?", "const": 0.5},
            {"names": ["inputs"], "value-type": "path", "nargs": "+"},
            {"names": ["output"]}
        ]
    }"#;

    #[test]
    fn values_round_trip_into_json() {
        let schema = schema(PACK);
        let (outcome, values) = run(
            &schema,
            &["-vv", "a", "b", "--exclude", "*.o", "-tt", "--ratio", "--exclude=*.a", "out.tar"],
        );
        assert_eq!(outcome, Ok(ParseOutcome::Parsed(Vec::new())));
        assert_eq!(
            values,
            json!({
                "verbose": 2,
                "level": 6,
                "exclude": ["*.o", "*.a"],
                "dry_run": false,
                "mode": null,
                "tag": ["x", "x"],
                "ratio": 0.5,
                "inputs": ["a", "b"],
                "output": "out.tar"
            })
        );
    }

    #[test]
    fn help_and_version_come_from_the_schema() {
        let schema = schema(PACK);
        let (outcome, _) = run(&schema, &["--version"]);
        assert_eq!(outcome, Ok(ParseOutcome::Version("pack 0.3.0\n".to_string())));

        let (outcome, _) = run(&schema, &["-h"]);
        let Ok(ParseOutcome::Help(text)) = outcome else {
            panic!("expected help");
        };
        assert!(text.contains("\nBundle files.\n"));
        assert!(text.contains("-l, --level LEVEL"));
        assert!(text.contains("(number) [default: 6]"));
        assert!(text.contains("inputs [inputs ...]"));
    }

    #[test]
    fn user_errors_surface_as_parse_errors() {
        let schema = schema(PACK);
        let (outcome, _) = run(&schema, &["--level", "high", "a", "out"]);
        assert_eq!(
            outcome.unwrap_err().to_string(),
            "argument --level: invalid numeric format: 'high'"
        );
        let (outcome, _) = run(&schema, &[]);
        assert_eq!(
            outcome,
            Err(ParseError::MissingRequired(vec![
                "inputs".to_string(),
                "output".to_string()
            ]))
        );
    }

    #[test]
    fn sub_commands_nest_their_values() {
        let schema = schema(
            r#"{
                "name": "pm",
                "subcommand-required": true,
                "args": [{"names": ["-q"], "action": "store-false"}],
                "subcommands": [
                    {"name": "install", "aliases": ["i"], "help": "add packages",
                     "args": [{"names": ["packages"], "nargs": "+"},
                              {"names": ["--jobs"], "value-type": "int"}]},
                    {"name": "list"}
                ]
            }"#,
        );
        let (outcome, values) = run(&schema, &["-q", "i", "serde", "anyhow"]);
        assert_eq!(outcome, Ok(ParseOutcome::Parsed(vec!["install".to_string()])));
        assert_eq!(
            values,
            json!({
                "q": false,
                "command": "install",
                "install": {"packages": ["serde", "anyhow"], "jobs": null}
            })
        );

        let (outcome, values) = run(&schema, &[]);
        assert_eq!(
            outcome,
            Err(ParseError::MissingSubCommand(vec![
                "install".to_string(),
                "list".to_string()
            ]))
        );
        assert_eq!(values["command"], json!(null));
    }

    #[test]
    fn bad_declarations_are_schema_errors() {
        let cases = [
            (r#"{"name": "x", "args": [{"names": ["-ab"]}]}"#, "invalid argument name `-ab`"),
            (
                r#"{"name": "x", "args": [{"names": ["-a"]}, {"names": ["-a", "--all"]}]}"#,
                "argument name `-a` is declared twice",
            ),
            (
                r#"{"name": "x", "args": [{"names": ["--dry-run"]}, {"names": ["dry_run"]}]}"#,
                "value key `dry_run` is produced twice",
            ),
            (
                r#"{"name": "x", "args": [{"names": ["-a"], "action": "count", "nargs": 1}]}"#,
                "action `count` takes no values",
            ),
            (
                r#"{"name": "x", "args": [{"names": ["a"], "action": "store-true"}]}"#,
                "cannot be positional",
            ),
            (
                r#"{"name": "x", "args": [{"names": ["-a"], "nargs": 0}]}"#,
                "nargs 0 leaves nothing to store",
            ),
            (
                r#"{"name": "x", "args": [{"names": ["-a"], "nargs": "many"}]}"#,
                "invalid nargs `many`",
            ),
            (
                r#"{"name": "x", "args": [{"names": ["-a"], "action": "store-const"}]}"#,
                "needs a const",
            ),
            (
                r#"{"name": "x", "args": [{"names": ["-n"], "value-type": "int", "default": "ten"}]}"#,
                "bad default",
            ),
            (
                r#"{"name": "x", "args": [{"names": ["-f"], "action": "store-true", "value-type": "int"}]}"#,
                "value-type must be `bool`",
            ),
            (
                r#"{"name": "x", "args": [{"names": ["-o"], "file-mode": "q"}]}"#,
                "invalid file mode",
            ),
            (
                r#"{"name": "x", "subcommands": [{"name": "a"}, {"name": "b", "aliases": ["a"]}]}"#,
                "sub-command name `a` is declared twice",
            ),
            (
                r#"{"name": "x", "args": [{"names": ["command"]}], "subcommands": [{"name": "a"}]}"#,
                "value key `command` is produced twice",
            ),
            (
                r#"{"name": "x", "args": [{"names": ["-v"], "value-type": "decimal"}]}"#,
                "unknown value type `decimal`",
            ),
        ];
        for (text, expected) in cases {
            let err = CommandSchema::from_json(text)
                .and_then(|schema| SlotTable::allocate(&schema).map(|_| ()))
                .unwrap_err();
            assert!(
                err.to_string().contains(expected),
                "{text}: `{err}` does not mention `{expected}`"
            );
        }
    }

    #[test]
    fn file_mode_opens_the_path() {
        let dir = std::env::temp_dir().join(format!("argot-schema-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("data.txt");
        std::fs::write(&path, "x").unwrap();

        let schema = schema(r#"{"name": "x", "args": [{"names": ["input"], "file-mode": "r"}]}"#);
        let path = path.to_string_lossy().into_owned();
        let (outcome, values) = run(&schema, &[path.as_str()]);
        assert_eq!(outcome, Ok(ParseOutcome::Parsed(Vec::new())));
        assert_eq!(values, json!({"input": true}));

        let missing = dir.join("missing.txt").to_string_lossy().into_owned();
        let (outcome, _) = run(&schema, &[missing.as_str()]);
        assert!(outcome.unwrap_err().to_string().starts_with("argument input: can't open"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn append_const_fills_in_a_missing_value() {
        let single = schema(
            r#"{"name": "x", "args": [{"names": ["--x"], "action": "append", "nargs": "?", "const": "a"}]}"#,
        );
        let (outcome, values) = run(&single, &["--x"]);
        assert_eq!(outcome, Ok(ParseOutcome::Parsed(Vec::new())));
        assert_eq!(values, json!({"x": ["a"]}));

        let (_, values) = run(&single, &["--x", "b", "--x"]);
        assert_eq!(values, json!({"x": ["b", "a"]}));

        let whole_list = schema(
            r#"{"name": "x", "args": [{"names": ["--x"], "action": "append", "nargs": "?", "const": ["a"]}]}"#,
        );
        let err = SlotTable::allocate(&whole_list).unwrap_err();
        assert!(matches!(err, SchemaError::BadConst { .. }), "{err}");
    }

    #[test]
    fn mismatched_table_is_rejected() {
        let small = schema(r#"{"name": "x"}"#);
        let big = schema(PACK);
        let mut slots = SlotTable::allocate(&small).unwrap();
        assert!(matches!(bind(&big, &mut slots), Err(SchemaError::TableMismatch)));
    }
}
