//! The user-facing parser: declaration, builtin help/version flags and
//! rendering of whatever the backend was asked to show.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::argument::{Argument, ArgumentBuilder};
use crate::backend::{self, ArgumentIndex, Outcome, Request};
use crate::error::ParseError;
use crate::help;
use crate::holder::{ArgumentHolder, ArgumentId, GroupId};
use crate::info::ActionKind;
use crate::subcommand::{SubCommand, SubCommandGroup, SubCommandGroupId, SubCommandHolder, SubCommandId};

/// What a successful [`ArgumentParser::parse_args`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Destinations are filled; the selected sub-command path, outermost first.
    Parsed(Vec<String>),
    Help(String),
    Usage(String),
    Version(String),
}

pub struct ArgumentParser<'a> {
    prog: String,
    description: String,
    version: Option<String>,
    add_help: bool,
    holder: ArgumentHolder<'a>,
    sub_commands: SubCommandHolder<'a>,
    index: Rc<RefCell<ArgumentIndex>>,
}

impl<'a> ArgumentParser<'a> {
    pub fn new(prog: impl Into<String>) -> Self {
        let index = Rc::new(RefCell::new(ArgumentIndex::new()));
        let mut holder = ArgumentHolder::new();
        holder.set_listener(index.clone());
        Self {
            prog: prog.into(),
            description: String::new(),
            version: None,
            add_help: true,
            holder,
            sub_commands: SubCommandHolder::new(),
            index,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Enables `-V/--version`.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Whether `-h/--help` is added to every command (default: on).
    pub fn add_help(mut self, add_help: bool) -> Self {
        self.add_help = add_help;
        self
    }

    pub fn prog(&self) -> &str {
        &self.prog
    }

    #[track_caller]
    pub fn add_argument(&mut self, argument: impl Into<Argument<'a>>) -> ArgumentId {
        self.holder.add_argument(argument)
    }

    pub fn add_argument_group(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> GroupId {
        self.holder.add_argument_group(title, description)
    }

    #[track_caller]
    pub fn add_argument_to(
        &mut self,
        group: GroupId,
        argument: impl Into<Argument<'a>>,
    ) -> ArgumentId {
        self.holder.add_argument_to(group, argument)
    }

    pub fn add_sub_command_group(&mut self, group: SubCommandGroup<'a>) -> SubCommandGroupId {
        self.sub_commands.add_sub_command_group(group)
    }

    #[track_caller]
    pub fn add_sub_command(
        &mut self,
        group: SubCommandGroupId,
        command: SubCommand<'a>,
    ) -> SubCommandId {
        self.sub_commands.add_sub_command(group, command)
    }

    /// A top-level sub-command by name or alias.
    pub fn sub_command_mut(&mut self, name: &str) -> Option<&mut SubCommand<'a>> {
        let id = self.sub_commands.resolve(name)?;
        Some(self.sub_commands.get_mut(id))
    }

    pub fn holder(&self) -> &ArgumentHolder<'a> {
        &self.holder
    }

    pub fn sub_commands(&self) -> &SubCommandHolder<'a> {
        &self.sub_commands
    }

    pub fn format_usage(&mut self) -> String {
        self.ensure_builtins();
        help::format_usage(&self.prog, &self.holder, &self.sub_commands)
    }

    pub fn format_help(&mut self) -> String {
        self.ensure_builtins();
        help::format_help(&self.prog, &self.description, &self.holder, &self.sub_commands)
    }

    /// `usage` followed by `prog: error: message`, the way command-line
    /// tools report bad input.
    pub fn format_error(&mut self, err: &ParseError) -> String {
        format!("{}{}: error: {err}\n", self.format_usage(), self.prog)
    }

    /// Parse `argv`, which excludes the program name.
    pub fn parse_args<I, S>(&mut self, argv: I) -> Result<ParseOutcome, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ensure_builtins();
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        let outcome = {
            let index = self.index.borrow();
            backend::run(&self.holder, &self.sub_commands, &index, &argv)?
        };

        Ok(match outcome {
            Outcome::Parsed { path } => ParseOutcome::Parsed(path),
            Outcome::Requested { request, path } => match request {
                Request::Help => ParseOutcome::Help(self.render(&path, true)),
                Request::Usage => ParseOutcome::Usage(self.render(&path, false)),
                Request::Version => ParseOutcome::Version(self.version_text()),
            },
        })
    }

    fn version_text(&self) -> String {
        match &self.version {
            Some(version) => format!("{} {}\n", self.prog, version.trim()),
            None => format!("{}\n", self.prog),
        }
    }

    /// Help or usage of the command reached through `path`.
    fn render(&self, path: &[String], full: bool) -> String {
        let mut prog = self.prog.clone();
        let mut description = self.description.as_str();
        let mut holder = &self.holder;
        let mut sub_commands = &self.sub_commands;
        for name in path {
            let Some(id) = sub_commands.resolve(name) else {
                break;
            };
            let command = sub_commands.get(id);
            prog.push(' ');
            prog.push_str(command.name());
            description = command.help_text();
            holder = command.holder();
            sub_commands = command.sub_commands();
        }
        if full {
            help::format_help(&prog, description, holder, sub_commands)
        } else {
            help::format_usage(&prog, holder, sub_commands)
        }
    }

    /// Add `-h/--help` everywhere and `-V/--version` at the top, using only
    /// the spellings still free. Running it twice adds nothing.
    fn ensure_builtins(&mut self) {
        if self.add_help {
            add_help_everywhere(&mut self.holder, &mut self.sub_commands);
        }
        if self.version.is_some() {
            add_builtin(
                &mut self.holder,
                ["-V", "--version"],
                ActionKind::PrintVersion,
                "show version information and exit",
            );
        }
    }
}

fn add_help_everywhere(holder: &mut ArgumentHolder<'_>, sub_commands: &mut SubCommandHolder<'_>) {
    add_builtin(
        holder,
        ["-h", "--help"],
        ActionKind::PrintHelp,
        "show this help message and exit",
    );
    let ids: Vec<SubCommandId> = sub_commands.sub_commands().map(|(id, _)| id).collect();
    for id in ids {
        let (holder, nested) = sub_commands.get_mut(id).parts_mut();
        add_help_everywhere(holder, nested);
    }
}

fn add_builtin(holder: &mut ArgumentHolder<'_>, names: [&str; 2], kind: ActionKind, help: &str) {
    let free: Vec<&str> = names
        .into_iter()
        .filter(|name| !holder.contains_name(name))
        .collect();
    if free.is_empty() {
        return;
    }
    tracing::trace!(names = ?free, action = %kind, "adding builtin flag");
    holder.add_argument(ArgumentBuilder::new(free).action(kind).help(help));
}

impl fmt::Debug for ArgumentParser<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentParser")
            .field("prog", &self.prog)
            .field("version", &self.version)
            .field("holder", &self.holder)
            .field("sub_commands", &self.sub_commands)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::OpenMode;
    use std::fs::File;
    use std::io::Read;
    use std::path::PathBuf;

    #[test]
    fn parses_into_borrowed_destinations() {
        let mut verbose = 0_u8;
        let mut output = PathBuf::new();
        let mut inputs: Vec<String> = Vec::new();
        let mut ratio = 0.0_f64;
        let outcome = {
            let mut parser = ArgumentParser::new("tool").description("Does things.");
            parser.add_argument(
                ArgumentBuilder::new(["-v", "--verbose"])
                    .dest(&mut verbose)
                    .action(ActionKind::Count),
            );
            parser.add_argument(
                ArgumentBuilder::new(["-o", "--output"])
                    .dest(&mut output)
                    .default_value(PathBuf::from("out.bin")),
            );
            parser.add_argument(
                ArgumentBuilder::new(["--ratio"])
                    .dest(&mut ratio)
                    .default_value(0.5_f64),
            );
            parser.add_argument(ArgumentBuilder::new(["inputs"]).dest(&mut inputs).nargs_flag('+'));
            parser.parse_args(["-vv", "a.txt", "--verbose", "b.txt"])
        };
        assert_eq!(outcome, Ok(ParseOutcome::Parsed(Vec::new())));
        assert_eq!(verbose, 3);
        assert_eq!(output, PathBuf::from("out.bin"));
        assert_eq!(ratio, 0.5);
        assert_eq!(inputs, ["a.txt", "b.txt"]);
    }

    #[test]
    fn builtin_help_and_version() {
        let mut parser = ArgumentParser::new("tool")
            .description("Does things.")
            .version("1.2.3");
        parser.add_argument(ArgumentBuilder::new(["--name"]).nargs(1).help("who to greet"));

        assert_eq!(
            parser.parse_args(["--version"]),
            Ok(ParseOutcome::Version("tool 1.2.3\n".to_string()))
        );
        let Ok(ParseOutcome::Help(text)) = parser.parse_args(["--name", "x", "-h"]) else {
            panic!("expected help");
        };
        assert!(text.starts_with("usage: tool [-h] [--name NAME] [-V]\n\nDoes things.\n"));
        assert!(text.contains("  --name NAME    who to greet\n"));
        assert!(text.contains("  -h, --help     show this help message and exit\n"));
        assert!(text.contains("  -V, --version  show version information and exit\n"));
        assert_eq!(parser.format_help(), text);
    }

    #[test]
    fn builtins_respect_taken_names() {
        let mut host = String::new();
        let text = {
            let mut parser = ArgumentParser::new("srv");
            parser.add_argument(ArgumentBuilder::new(["-h", "--host"]).dest(&mut host));
            parser.format_usage()
        };
        assert_eq!(text, "usage: srv [--help] [-h HOST]\n");

        let mut parser = ArgumentParser::new("quiet").add_help(false);
        assert_eq!(parser.format_usage(), "usage: quiet\n");
        assert_eq!(
            parser.parse_args(["--help"]),
            Err(ParseError::UnknownOption("--help".to_string()))
        );
    }

    #[test]
    fn builtins_are_added_once() {
        let mut parser = ArgumentParser::new("tool");
        parser.format_help();
        parser.format_usage();
        let _ = parser.parse_args(Vec::<String>::new());
        assert_eq!(parser.holder().len(), 1);
    }

    #[test]
    fn sub_command_help_names_the_path() {
        let mut parser = ArgumentParser::new("pm");
        let group = parser.add_sub_command_group(SubCommandGroup::new("commands"));
        parser.add_sub_command(
            group,
            SubCommand::new("install")
                .help("Install a package.")
                .argument(ArgumentBuilder::new(["package"])),
        );
        let Ok(ParseOutcome::Help(text)) = parser.parse_args(["install", "--help"]) else {
            panic!("expected help");
        };
        assert!(text.starts_with("usage: pm install [-h] package\n\nInstall a package.\n"));

        let Ok(ParseOutcome::Help(top)) = parser.parse_args(["-h"]) else {
            panic!("expected help");
        };
        assert!(top.contains("\ncommands:\n  install  Install a package.\n"));
    }

    #[test]
    fn sub_command_lookup_by_alias() {
        let mut parser = ArgumentParser::new("pm");
        let group = parser.add_sub_command_group(SubCommandGroup::new("commands"));
        parser.add_sub_command(group, SubCommand::new("remove").alias("rm"));
        let command = parser.sub_command_mut("rm").expect("alias resolves");
        command.add_argument(ArgumentBuilder::new(["--purge"]));
        assert_eq!(command.name(), "remove");
        assert!(parser.sub_command_mut("erase").is_none());
        assert_eq!(
            parser.parse_args(["rm", "--purge"]),
            Ok(ParseOutcome::Parsed(vec!["remove".to_string()]))
        );
    }

    #[test]
    fn error_report_carries_usage() {
        let mut count = 0_u16;
        let text = {
            let mut parser = ArgumentParser::new("tool");
            parser.add_argument(ArgumentBuilder::new(["-n"]).dest(&mut count));
            let err = parser.parse_args(["-n", "many"]).unwrap_err();
            parser.format_error(&err)
        };
        assert_eq!(
            text,
            "usage: tool [-n N] [-h]\ntool: error: argument -n: invalid numeric format: 'many'\n"
        );
    }

    #[test]
    fn file_destinations_open_on_parse() {
        let dir = std::env::temp_dir().join(format!("argot-parser-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("input.txt");
        std::fs::write(&path, "hello").unwrap();

        let mut input: Option<File> = None;
        let outcome = {
            let mut parser = ArgumentParser::new("cat");
            parser.add_argument(
                ArgumentBuilder::new(["file"])
                    .dest(&mut input)
                    .file_mode(OpenMode::READ),
            );
            parser.parse_args([path.to_string_lossy().into_owned()])
        };
        assert_eq!(outcome, Ok(ParseOutcome::Parsed(Vec::new())));
        let mut text = String::new();
        input.expect("file opened").read_to_string(&mut text).unwrap();
        assert_eq!(text, "hello");
        std::fs::remove_dir_all(&dir).ok();
    }
}
