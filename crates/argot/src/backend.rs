//! GNU-style argv consumer.
//!
//! Supported syntax:
//! - `--name value`, `--name=value`
//! - `-n value`, `-nvalue`, bundled flags `-abc`
//! - `--` ends option parsing
//! - tokens that look like negative numbers are values, unless a digit
//!   short option (`-1`) is declared
//!
//! The backend reads argument metadata from an [`ArgumentHolder`], writes
//! through destinations and reports problems as [`ParseError`]. It never
//! prints anything.

use std::collections::{HashMap, HashSet};

use crate::any::AnyValue;
use crate::argument::Argument;
use crate::error::{ParseError, ParseResult};
use crate::holder::{ArgumentHolder, ArgumentHolderListener, ArgumentId};
use crate::info::{CallbackClient, DestInfo, NamesInfo, NumArgsInfo};
use crate::subcommand::SubCommandHolder;

/// Name lookup tables for one holder, kept current through
/// [`ArgumentHolderListener`].
#[derive(Debug, Default, Clone)]
pub struct ArgumentIndex {
    long: HashMap<String, ArgumentId>,
    short: HashMap<char, ArgumentId>,
    positionals: Vec<ArgumentId>,
}

impl ArgumentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_holder(holder: &ArgumentHolder<'_>) -> Self {
        let mut index = Self::new();
        for (id, argument) in holder.arguments() {
            index.insert(id, argument);
        }
        index
    }

    fn insert(&mut self, id: ArgumentId, argument: &Argument<'_>) {
        match argument.names() {
            NamesInfo::Positional(_) => self.positionals.push(id),
            NamesInfo::Optional(names) => {
                for name in names {
                    if name.starts_with("--") {
                        self.long.insert(name.clone(), id);
                    } else if let Some(c) = name.chars().nth(1) {
                        self.short.insert(c, id);
                    }
                }
            }
        }
    }

    pub fn long(&self, name: &str) -> Option<ArgumentId> {
        self.long.get(name).copied()
    }

    pub fn short(&self, c: char) -> Option<ArgumentId> {
        self.short.get(&c).copied()
    }

    /// Positional arguments in declaration order.
    pub fn positionals(&self) -> &[ArgumentId] {
        &self.positionals
    }

    pub fn has_digit_options(&self) -> bool {
        self.short.keys().any(char::is_ascii_digit)
    }
}

impl ArgumentHolderListener for ArgumentIndex {
    fn on_add_argument(&mut self, id: ArgumentId, argument: &Argument<'_>) {
        self.insert(id, argument);
    }
}

/// Something an action asked the caller to show instead of running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Help,
    Usage,
    Version,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every token was consumed. `path` lists the selected sub-commands.
    Parsed { path: Vec<String> },
    /// A help, usage or version action fired in the command at `path`.
    Requested { request: Request, path: Vec<String> },
}

/// Parse `argv` (without the program name) against `holder`.
///
/// `index` must describe `holder`; sub-command holders are indexed on the
/// fly.
pub fn run<'a>(
    holder: &ArgumentHolder<'a>,
    sub_commands: &SubCommandHolder<'a>,
    index: &ArgumentIndex,
    argv: &[String],
) -> ParseResult<Outcome> {
    parse_level(holder, sub_commands, index, argv, Vec::new())
}

fn parse_level<'a>(
    holder: &ArgumentHolder<'a>,
    sub_commands: &SubCommandHolder<'a>,
    index: &ArgumentIndex,
    argv: &[String],
    path: Vec<String>,
) -> ParseResult<Outcome> {
    tracing::debug!(depth = path.len(), tokens = argv.len(), "parsing command line");

    for (_, argument) in holder.arguments() {
        argument.apply_default();
    }

    let mut pass = Pass {
        holder,
        index,
        argv,
        negative_values: !index.has_digit_options(),
        seen: HashSet::new(),
        request: None,
        error: None,
    };

    // With sub-commands, positionals take only their minimum; the token
    // after them names the sub-command.
    let reserved: Option<usize> = (!sub_commands.is_empty()).then(|| {
        index
            .positionals()
            .iter()
            .map(|&id| holder.argument(id).num_args().min())
            .sum()
    });

    let mut positionals: Vec<&str> = Vec::new();
    let mut selected: Option<usize> = None;
    let mut i = 0usize;
    let mut after_separator = false;
    while i < argv.len() {
        let token = argv[i].as_str();

        if !after_separator && token == "--" {
            after_separator = true;
            i += 1;
            continue;
        }

        if !after_separator && pass.is_option_like(token) {
            i = if token.starts_with("--") {
                pass.long_option(i)
            } else {
                pass.short_options(i)
            };
            continue;
        }

        if reserved == Some(positionals.len()) {
            selected = Some(i);
            break;
        }
        positionals.push(token);
        i += 1;
    }

    pass.assign_positionals(&positionals, reserved.is_some());

    if let Some(request) = pass.request {
        tracing::debug!(?request, "action requested output");
        return Ok(Outcome::Requested { request, path });
    }

    let mut sub_result = None;
    if let Some(at) = selected {
        let given = argv[at].as_str();
        match sub_commands.resolve(given) {
            None => pass.fail(ParseError::UnknownSubCommand {
                given: given.to_string(),
                choices: sub_commands.choices(),
            }),
            Some(id) => {
                let command = sub_commands.get(id);
                tracing::debug!(sub_command = command.name(), given, "selected sub-command");
                if let Some(dest) = sub_commands.group_of(id).dest_info() {
                    dest.ops()
                        .store(dest.dest(), AnyValue::new(command.name().to_string()));
                }
                let mut sub_path = path.clone();
                sub_path.push(command.name().to_string());
                let sub_index = ArgumentIndex::from_holder(command.holder());
                sub_result = Some(parse_level(
                    command.holder(),
                    command.sub_commands(),
                    &sub_index,
                    &argv[at + 1..],
                    sub_path,
                ));
            }
        }
    }

    if let Some(requested @ Ok(Outcome::Requested { .. })) = sub_result {
        return requested;
    }
    if let Some(err) = pass.error {
        return Err(err);
    }
    let missing = pass.missing_required();
    if !missing.is_empty() {
        return Err(ParseError::MissingRequired(missing));
    }
    if selected.is_none() && sub_commands.is_required() {
        return Err(ParseError::MissingSubCommand(sub_commands.choices()));
    }

    match sub_result {
        Some(result) => result,
        None => Ok(Outcome::Parsed { path }),
    }
}

fn looks_negative(token: &str) -> bool {
    let Some(rest) = token.strip_prefix('-') else {
        return false;
    };
    rest.starts_with(|c: char| c.is_ascii_digit() || c == '.') && rest.parse::<f64>().is_ok()
}

/// State of one parse over one holder.
struct Pass<'p, 'a> {
    holder: &'p ArgumentHolder<'a>,
    index: &'p ArgumentIndex,
    argv: &'p [String],
    negative_values: bool,
    seen: HashSet<ArgumentId>,
    request: Option<Request>,
    /// First error wins; parsing goes on so a later help request still counts.
    error: Option<ParseError>,
}

impl<'p, 'a> Pass<'p, 'a> {
    fn fail(&mut self, err: ParseError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn is_option_like(&self, token: &str) -> bool {
        token.len() > 1
            && token.starts_with('-')
            && !(self.negative_values && looks_negative(token))
    }

    /// Count the value tokens following `start` an option may consume,
    /// given it already has `have` values.
    fn take_values(&self, start: usize, num_args: NumArgsInfo, have: usize) -> usize {
        let limit = num_args.max().map(|max| max.saturating_sub(have));
        let mut taken = 0;
        while limit.is_none_or(|limit| taken < limit) {
            match self.argv.get(start + taken) {
                Some(token) if !self.is_option_like(token) => taken += 1,
                _ => break,
            }
        }
        taken
    }

    /// Handle the `--name[=value]` token at `i`; returns the next index.
    fn long_option(&mut self, i: usize) -> usize {
        let (holder, argv) = (self.holder, self.argv);
        let token = argv[i].as_str();
        let (name, attached) = match token.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (token, None),
        };
        let Some(id) = self.index.long(name) else {
            self.fail(ParseError::UnknownOption(name.to_string()));
            return i + 1;
        };
        let argument = holder.argument(id);

        let mut values: Vec<&str> = Vec::new();
        if let Some(value) = attached {
            if !argument.takes_values() {
                self.fail(ParseError::UnexpectedValue {
                    option: name.to_string(),
                });
                return i + 1;
            }
            values.push(value);
        }
        let taken = self.take_values(i + 1, argument.num_args(), values.len());
        values.extend(argv[i + 1..i + 1 + taken].iter().map(String::as_str));
        tracing::trace!(option = name, values = values.len(), "long option");
        self.apply(id, &values);
        i + 1 + taken
    }

    /// Handle the short option cluster at `i`; returns the next index.
    fn short_options(&mut self, i: usize) -> usize {
        let (holder, argv) = (self.holder, self.argv);
        let body = &argv[i][1..];
        for (offset, c) in body.char_indices() {
            let Some(id) = self.index.short(c) else {
                self.fail(ParseError::UnknownOption(format!("-{c}")));
                return i + 1;
            };
            let argument = holder.argument(id);
            if !argument.takes_values() {
                self.apply(id, &[]);
                continue;
            }

            // The rest of the cluster is this option's first value.
            let rest = &body[offset + c.len_utf8()..];
            let rest = rest.strip_prefix('=').unwrap_or(rest);
            let mut values: Vec<&str> = Vec::new();
            if !rest.is_empty() {
                values.push(rest);
            }
            let taken = self.take_values(i + 1, argument.num_args(), values.len());
            values.extend(argv[i + 1..i + 1 + taken].iter().map(String::as_str));
            tracing::trace!(option = %format!("-{c}"), values = values.len(), "short option");
            self.apply(id, &values);
            return i + 1 + taken;
        }
        i + 1
    }

    /// Hand positional tokens out in declaration order. Unbounded
    /// positionals are greedy but leave the minimum later ones need.
    fn assign_positionals(&mut self, tokens: &[&str], minimal: bool) {
        let (holder, index) = (self.holder, self.index);
        let ids = index.positionals();
        let mins: Vec<usize> = ids
            .iter()
            .map(|&id| holder.argument(id).num_args().min())
            .collect();

        let mut cursor = 0usize;
        for (k, &id) in ids.iter().enumerate() {
            let num_args = holder.argument(id).num_args();
            let available = tokens.len() - cursor;
            let floor = num_args.min().min(available);
            let take = if minimal {
                floor
            } else {
                let room = available.saturating_sub(mins[k + 1..].iter().sum());
                num_args.max().map_or(room, |max| max.min(room)).max(floor)
            };
            if take == 0 {
                // An optional positional with nothing left still runs its
                // action, so `?` stores its const.
                if num_args.min() == 0 {
                    self.apply(id, &[]);
                }
                continue;
            }
            self.apply(id, &tokens[cursor..cursor + take]);
            cursor += take;
        }

        if cursor < tokens.len() {
            self.fail(ParseError::Unrecognized(
                tokens[cursor..].iter().map(|t| t.to_string()).collect(),
            ));
        }
    }

    /// Validate the count, convert every value and run the action.
    fn apply(&mut self, id: ArgumentId, values: &[&str]) {
        let holder = self.holder;
        let argument = holder.argument(id);
        self.seen.insert(id);

        if !argument.num_args().check(values.len()) {
            self.fail(ParseError::WrongCount {
                argument: argument.display_name().to_string(),
                expected: argument.num_args().expectation(),
            });
            return;
        }

        let mut data = Vec::with_capacity(values.len());
        for text in values {
            match argument.convert(text) {
                Ok(value) => data.push(value),
                Err(source) => {
                    self.fail(ParseError::Conversion {
                        argument: argument.display_name().to_string(),
                        source,
                    });
                    return;
                }
            }
        }

        let result = {
            let mut client = Client {
                data,
                dest: argument.dest(),
                const_value: argument.const_value(),
                request: &mut self.request,
            };
            argument.action().run(&mut client)
        };
        if let Err(source) = result {
            self.fail(ParseError::Conversion {
                argument: argument.display_name().to_string(),
                source,
            });
        }
    }

    fn missing_required(&self) -> Vec<String> {
        self.holder
            .arguments()
            .filter(|(id, argument)| argument.is_required() && !self.seen.contains(id))
            .map(|(_, argument)| argument.display_name().to_string())
            .collect()
    }
}

struct Client<'c, 'a> {
    data: Vec<AnyValue>,
    dest: Option<&'c DestInfo<'a>>,
    const_value: Option<&'c AnyValue>,
    request: &'c mut Option<Request>,
}

impl<'a> CallbackClient<'a> for Client<'_, 'a> {
    fn take_data(&mut self) -> Vec<AnyValue> {
        std::mem::take(&mut self.data)
    }

    fn dest(&self) -> Option<&DestInfo<'a>> {
        self.dest
    }

    fn const_value(&self) -> Option<&AnyValue> {
        self.const_value
    }

    fn print_help(&mut self) {
        self.request.get_or_insert(Request::Help);
    }

    fn print_usage(&mut self) {
        self.request.get_or_insert(Request::Usage);
    }

    fn print_version(&mut self) {
        self.request.get_or_insert(Request::Version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::ArgumentBuilder;
    use crate::error::ConversionError;
    use crate::info::ActionKind;
    use crate::subcommand::{SubCommand, SubCommandGroup};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn parse_flat(holder: &ArgumentHolder<'_>, items: &[&str]) -> ParseResult<Outcome> {
        let index = ArgumentIndex::from_holder(holder);
        run(holder, &SubCommandHolder::new(), &index, &argv(items))
    }

    fn parsed() -> ParseResult<Outcome> {
        Ok(Outcome::Parsed { path: Vec::new() })
    }

    #[test]
    fn listener_index_matches_rebuilt_index() {
        let index = Rc::new(RefCell::new(ArgumentIndex::new()));
        let mut holder = ArgumentHolder::new();
        holder.set_listener(index.clone());
        holder.add_argument(ArgumentBuilder::new(["-v", "--verbose"]));
        holder.add_argument(ArgumentBuilder::new(["file"]));
        holder.add_argument(ArgumentBuilder::new(["-1"]));

        let live = index.borrow();
        let rebuilt = ArgumentIndex::from_holder(&holder);
        assert_eq!(live.long("--verbose"), rebuilt.long("--verbose"));
        assert_eq!(live.short('v'), rebuilt.short('v'));
        assert_eq!(live.positionals(), rebuilt.positionals());
        assert!(live.has_digit_options());
    }

    #[test]
    fn count_repeats_in_a_cluster() {
        let mut verbosity = 0_u8;
        let result = {
            let mut holder = ArgumentHolder::new();
            holder.add_argument(
                ArgumentBuilder::new(["-v"])
                    .dest(&mut verbosity)
                    .action(ActionKind::Count),
            );
            parse_flat(&holder, &["-vvv"])
        };
        assert_eq!(result, parsed());
        assert_eq!(verbosity, 3);
    }

    #[test]
    fn attached_and_separate_values() {
        let mut output = String::new();
        let mut name = String::new();
        let mut level = 0_i32;
        let mut quiet = false;
        let result = {
            let mut holder = ArgumentHolder::new();
            holder.add_argument(ArgumentBuilder::new(["-o", "--output"]).dest(&mut output));
            holder.add_argument(ArgumentBuilder::new(["--name"]).dest(&mut name));
            holder.add_argument(ArgumentBuilder::new(["-l"]).dest(&mut level));
            holder.add_argument(
                ArgumentBuilder::new(["-q"])
                    .dest(&mut quiet)
                    .action(ActionKind::StoreTrue),
            );
            parse_flat(&holder, &["-qofile.txt", "--name=alice", "-l", "-3"])
        };
        assert_eq!(result, parsed());
        assert_eq!(output, "file.txt");
        assert_eq!(name, "alice");
        assert_eq!(level, -3);
        assert!(quiet);
    }

    #[test]
    fn defaults_land_before_tokens() {
        let mut jobs = 0_u32;
        let mut color = true;
        let result = {
            let mut holder = ArgumentHolder::new();
            holder.add_argument(ArgumentBuilder::new(["--jobs"]).dest(&mut jobs).default_value(4_u32));
            holder.add_argument(
                ArgumentBuilder::new(["--no-color"])
                    .dest(&mut color)
                    .action(ActionKind::StoreFalse),
            );
            parse_flat(&holder, &[])
        };
        assert_eq!(result, parsed());
        assert_eq!(jobs, 4);
        assert!(color);
    }

    #[test]
    fn append_collects_in_order() {
        let mut numbers: Vec<i32> = Vec::new();
        let result = {
            let mut holder = ArgumentHolder::new();
            holder.add_argument(
                ArgumentBuilder::new(["-n"])
                    .dest(&mut numbers)
                    .action(ActionKind::Append),
            );
            parse_flat(&holder, &["-n", "1", "-n2", "-n=3"])
        };
        assert_eq!(result, parsed());
        assert_eq!(numbers, [1, 2, 3]);
    }

    #[test]
    fn greedy_positionals_leave_room_for_later_ones() {
        let mut sources: Vec<String> = Vec::new();
        let mut target = String::new();
        let result = {
            let mut holder = ArgumentHolder::new();
            holder.add_argument(ArgumentBuilder::new(["src"]).dest(&mut sources).nargs_flag('+'));
            holder.add_argument(ArgumentBuilder::new(["dst"]).dest(&mut target));
            parse_flat(&holder, &["a", "b", "c"])
        };
        assert_eq!(result, parsed());
        assert_eq!(sources, ["a", "b"]);
        assert_eq!(target, "c");
    }

    #[test]
    fn optional_positional_without_token_stores_const() {
        let mut level = String::new();
        let mut tag = String::new();
        let result = {
            let mut holder = ArgumentHolder::new();
            holder.add_argument(
                ArgumentBuilder::new(["level"])
                    .dest(&mut level)
                    .nargs_flag('?')
                    .const_value("info".to_string()),
            );
            holder.add_argument(
                ArgumentBuilder::new(["tag"])
                    .dest(&mut tag)
                    .nargs_flag('?')
                    .default_value("none".to_string()),
            );
            parse_flat(&holder, &[])
        };
        assert_eq!(result, parsed());
        assert_eq!(level, "info");
        assert_eq!(tag, "none");

        let result = {
            let mut holder = ArgumentHolder::new();
            holder.add_argument(
                ArgumentBuilder::new(["level"])
                    .dest(&mut level)
                    .nargs_flag('?')
                    .const_value("info".to_string()),
            );
            parse_flat(&holder, &["warn"])
        };
        assert_eq!(result, parsed());
        assert_eq!(level, "warn");
    }

    #[test]
    fn option_lists_stop_at_next_option_and_separator() {
        let mut items: Vec<String> = Vec::new();
        let mut rest: Vec<String> = Vec::new();
        let result = {
            let mut holder = ArgumentHolder::new();
            holder.add_argument(ArgumentBuilder::new(["--items"]).dest(&mut items).nargs_flag('*'));
            holder.add_argument(ArgumentBuilder::new(["rest"]).dest(&mut rest).nargs_flag('*'));
            parse_flat(&holder, &["--items", "x", "y", "--", "--items", "z"])
        };
        assert_eq!(result, parsed());
        assert_eq!(items, ["x", "y"]);
        assert_eq!(rest, ["--items", "z"]);
    }

    #[test]
    fn fixed_count_is_enforced() {
        let mut pair: Vec<f64> = Vec::new();
        let result = {
            let mut holder = ArgumentHolder::new();
            holder.add_argument(ArgumentBuilder::new(["--pair"]).dest(&mut pair).nargs(2));
            parse_flat(&holder, &["--pair", "1.5"])
        };
        assert_eq!(
            result,
            Err(ParseError::WrongCount {
                argument: "--pair".to_string(),
                expected: "expected 2 arguments".to_string(),
            })
        );
    }

    #[test]
    fn conversion_failure_names_the_argument() {
        let mut num = 0_i32;
        let err = {
            let mut holder = ArgumentHolder::new();
            holder.add_argument(ArgumentBuilder::new(["--num"]).dest(&mut num));
            parse_flat(&holder, &["--num", "abc"]).unwrap_err()
        };
        assert!(err.is_conversion());
        assert_eq!(
            err.to_string(),
            "argument --num: invalid numeric format: 'abc'"
        );
    }

    #[test]
    fn unknown_option_and_extra_positionals() {
        let mut holder = ArgumentHolder::new();
        holder.add_argument(ArgumentBuilder::new(["-a"]));
        assert_eq!(
            parse_flat(&holder, &["-ax"]),
            Err(ParseError::UnknownOption("-x".to_string()))
        );
        assert_eq!(
            parse_flat(&holder, &["--bogus"]),
            Err(ParseError::UnknownOption("--bogus".to_string()))
        );
        assert_eq!(
            parse_flat(&holder, &["stray", "more"]),
            Err(ParseError::Unrecognized(vec![
                "stray".to_string(),
                "more".to_string()
            ]))
        );
    }

    #[test]
    fn flag_rejects_attached_value() {
        let mut holder = ArgumentHolder::new();
        holder.add_argument(ArgumentBuilder::new(["--dry-run"]));
        assert_eq!(
            parse_flat(&holder, &["--dry-run=yes"]),
            Err(ParseError::UnexpectedValue {
                option: "--dry-run".to_string()
            })
        );
    }

    #[test]
    fn help_wins_over_malformed_tokens() {
        let mut holder = ArgumentHolder::new();
        holder.add_argument(ArgumentBuilder::new(["-h", "--help"]).action(ActionKind::PrintHelp));
        holder.add_argument(ArgumentBuilder::new(["input"]));
        assert_eq!(
            parse_flat(&holder, &["--bogus", "-h"]),
            Ok(Outcome::Requested {
                request: Request::Help,
                path: Vec::new()
            })
        );
    }

    #[test]
    fn missing_required_arguments_are_listed() {
        let mut holder = ArgumentHolder::new();
        holder.add_argument(ArgumentBuilder::new(["--output"]).nargs(1).required(true));
        holder.add_argument(ArgumentBuilder::new(["input"]));
        assert_eq!(
            parse_flat(&holder, &[]),
            Err(ParseError::MissingRequired(vec![
                "--output".to_string(),
                "input".to_string()
            ]))
        );
    }

    #[test]
    fn digit_options_turn_off_negative_values() {
        let mut holder = ArgumentHolder::new();
        holder.add_argument(ArgumentBuilder::new(["-1"]));
        holder.add_argument(ArgumentBuilder::new(["value"]));
        assert_eq!(
            parse_flat(&holder, &["-5"]),
            Err(ParseError::UnknownOption("-5".to_string()))
        );
    }

    #[test]
    fn custom_action_sees_converted_values() {
        let seen = RefCell::new(Vec::new());
        let result = {
            let mut holder = ArgumentHolder::new();
            holder.add_argument(
                ArgumentBuilder::new(["-D"])
                    .nargs(1)
                    .type_fn(|text: &str| {
                        text.split_once('=')
                            .map(|(k, v)| (k.to_string(), v.to_string()))
                            .ok_or_else(|| ConversionError::message("expected KEY=VALUE"))
                    })
                    .action_fn(|client| {
                        for value in client.take_data() {
                            seen.borrow_mut().push(value.into_inner::<(String, String)>());
                        }
                        Ok(())
                    }),
            );
            let ok = parse_flat(&holder, &["-Dmode=fast", "-D", "level=3"]);
            let bad = parse_flat(&holder, &["-Dbroken"]);
            (ok, bad)
        };
        assert_eq!(result.0, parsed());
        assert_eq!(
            result.1.unwrap_err().to_string(),
            "argument -D: expected KEY=VALUE"
        );
        assert_eq!(
            seen.into_inner(),
            [
                ("mode".to_string(), "fast".to_string()),
                ("level".to_string(), "3".to_string())
            ]
        );
    }

    #[test]
    fn sub_command_dispatch() {
        let mut command = String::new();
        let mut verbose = false;
        let mut package = String::new();
        let mut force = false;
        let result = {
            let mut holder = ArgumentHolder::new();
            holder.add_argument(
                ArgumentBuilder::new(["-v"])
                    .dest(&mut verbose)
                    .action(ActionKind::StoreTrue),
            );
            let mut subs = SubCommandHolder::new();
            let group = subs.add_sub_command_group(
                SubCommandGroup::new("commands").dest(&mut command).required(true),
            );
            subs.add_sub_command(
                group,
                SubCommand::new("install")
                    .alias("i")
                    .argument(ArgumentBuilder::new(["package"]).dest(&mut package))
                    .argument(
                        ArgumentBuilder::new(["-f", "--force"])
                            .dest(&mut force)
                            .action(ActionKind::StoreTrue),
                    ),
            );
            subs.add_sub_command(group, SubCommand::new("list"));
            let index = ArgumentIndex::from_holder(&holder);
            (
                run(&holder, &subs, &index, &argv(&["-v", "i", "serde", "-f"])),
                run(&holder, &subs, &index, &argv(&["remove"])),
                run(&holder, &subs, &index, &argv(&["-v"])),
            )
        };
        assert_eq!(
            result.0,
            Ok(Outcome::Parsed {
                path: vec!["install".to_string()]
            })
        );
        assert_eq!(
            result.1,
            Err(ParseError::UnknownSubCommand {
                given: "remove".to_string(),
                choices: vec!["install".to_string(), "list".to_string()],
            })
        );
        assert_eq!(
            result.2,
            Err(ParseError::MissingSubCommand(vec![
                "install".to_string(),
                "list".to_string()
            ]))
        );
        assert_eq!(command, "install");
        assert!(verbose);
        assert_eq!(package, "serde");
        assert!(force);
    }

    #[test]
    fn help_inside_sub_command_reports_its_path() {
        let mut holder = ArgumentHolder::new();
        holder.add_argument(ArgumentBuilder::new(["-h"]).action(ActionKind::PrintHelp));
        let mut subs = SubCommandHolder::new();
        let group = subs.add_sub_command_group(SubCommandGroup::new("commands"));
        subs.add_sub_command(
            group,
            SubCommand::new("run")
                .argument(ArgumentBuilder::new(["-h"]).action(ActionKind::PrintHelp))
                .argument(ArgumentBuilder::new(["script"])),
        );
        let index = ArgumentIndex::from_holder(&holder);
        assert_eq!(
            run(&holder, &subs, &index, &argv(&["run", "-h"])),
            Ok(Outcome::Requested {
                request: Request::Help,
                path: vec!["run".to_string()]
            })
        );
    }
}
