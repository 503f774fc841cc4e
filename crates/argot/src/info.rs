//! The pieces an [`crate::argument::Argument`] is assembled from.
//!
//! Each piece is built once at declaration time. Constructors that are given
//! something the declaration can never satisfy (a malformed name, an
//! operation the destination type does not support) panic.

use std::any::Any;
use std::fmt;

use crate::any::AnyValue;
use crate::dest::OpaqueDestination;
use crate::error::ConversionError;
use crate::mode::OpenMode;
use crate::ops::{ArgType, OpKind, Operations, operations_of};

/// `-` followed by exactly one ASCII alphanumeric.
pub fn is_valid_short_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() == 2 && bytes[0] == b'-' && bytes[1].is_ascii_alphanumeric()
}

/// `--`, an ASCII alphanumeric, then alphanumerics, `-` or `_`.
pub fn is_valid_long_name(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("--") else {
        return false;
    };
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn is_valid_positional_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Declared name(s) of an argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamesInfo {
    Positional(String),
    /// Option strings in declaration order (`-o`, `--output`, ...).
    Optional(Vec<String>),
}

impl NamesInfo {
    #[track_caller]
    pub fn positional(name: impl Into<String>) -> Self {
        let name = name.into();
        if !is_valid_positional_name(&name) {
            panic!(
                "invalid positional argument name `{name}`: must start with an ASCII letter \
                 followed by ASCII letters, digits, `-` or `_`"
            );
        }
        Self::Positional(name)
    }

    #[track_caller]
    pub fn optional<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !is_valid_short_name(&name) && !is_valid_long_name(&name) {
                panic!(
                    "invalid option name `{name}`: expected `-x` (one ASCII letter or digit) \
                     or `--name` (ASCII letters, digits, `-` and `_`)"
                );
            }
            if out.contains(&name) {
                panic!("option name `{name}` is listed twice");
            }
            out.push(name);
        }
        if out.is_empty() {
            panic!("an optional argument needs at least one name");
        }
        Self::Optional(out)
    }

    /// Positional when given one name without a leading dash, optional when
    /// every name starts with one.
    #[track_caller]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let dashed = names.iter().filter(|n| n.starts_with('-')).count();
        match (names.len(), dashed) {
            (0, _) => panic!("an argument needs at least one name"),
            (1, 0) => Self::positional(names.into_iter().next().unwrap_or_default()),
            (n, d) if n == d => Self::optional(names),
            _ => panic!(
                "cannot mix positional and optional names in one argument: {}",
                names.join(", ")
            ),
        }
    }

    pub fn is_positional(&self) -> bool {
        matches!(self, Self::Positional(_))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// Every name, in declaration order.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        let names: &[String] = match self {
            Self::Positional(name) => std::slice::from_ref(name),
            Self::Optional(names) => names,
        };
        names.iter().map(String::as_str)
    }

    pub fn long_names(&self) -> impl Iterator<Item = &str> {
        self.all().filter(|n| n.starts_with("--"))
    }

    pub fn short_names(&self) -> impl Iterator<Item = &str> {
        self.all().filter(|n| is_valid_short_name(n))
    }

    /// Options without any `--long` spelling.
    pub fn is_short_only(&self) -> bool {
        self.is_optional() && self.long_names().next().is_none()
    }

    /// The name used in messages: the positional name, else the first long
    /// name, else the first short name.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Positional(name) => name,
            Self::Optional(names) => self
                .long_names()
                .next()
                .unwrap_or_else(|| names.first().map(String::as_str).unwrap_or_default()),
        }
    }

    /// Identifier-like key: dashes stripped, inner `-` turned into `_`.
    pub fn dest_name(&self) -> String {
        self.display_name().trim_start_matches('-').replace('-', "_")
    }

    /// Default meta-variable: the display name, uppercased.
    pub fn default_metavar(&self) -> String {
        self.dest_name().to_ascii_uppercase()
    }
}

impl fmt::Display for NamesInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A destination bound to the operations of its type.
pub struct DestInfo<'a> {
    dest: OpaqueDestination<'a>,
    ops: &'static dyn Operations,
}

impl<'a> DestInfo<'a> {
    pub fn from_ref<T: ArgType>(target: &'a mut T) -> Self {
        Self {
            dest: OpaqueDestination::new(target),
            ops: operations_of::<T>(),
        }
    }

    pub fn dest(&self) -> &OpaqueDestination<'a> {
        &self.dest
    }

    pub fn ops(&self) -> &'static dyn Operations {
        self.ops
    }

    pub fn type_is<T: Any>(&self) -> bool {
        self.dest.type_is::<T>()
    }
}

impl fmt::Debug for DestInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DestInfo<{}>", self.ops.short_type_name())
    }
}

pub type ConvertFn<'a> = dyn Fn(&str) -> Result<AnyValue, ConversionError> + 'a;

/// How one piece of text becomes a value.
pub enum TypeInfo<'a> {
    Parse(&'static dyn Operations),
    Open {
        ops: &'static dyn Operations,
        mode: OpenMode,
    },
    Callback(Box<ConvertFn<'a>>),
}

impl<'a> TypeInfo<'a> {
    #[track_caller]
    pub fn parse(ops: &'static dyn Operations) -> Self {
        require(ops, OpKind::Parse);
        Self::Parse(ops)
    }

    #[track_caller]
    pub fn file(ops: &'static dyn Operations, mode: OpenMode) -> Self {
        require(ops, OpKind::Open);
        Self::Open { ops, mode }
    }

    pub fn from_callback(
        f: impl Fn(&str) -> Result<AnyValue, ConversionError> + 'a,
    ) -> Self {
        Self::Callback(Box::new(f))
    }

    /// Like [`TypeInfo::from_callback`] for a callback returning a typed value.
    pub fn from_fn<T: Any>(f: impl Fn(&str) -> Result<T, ConversionError> + 'a) -> Self {
        Self::Callback(Box::new(move |text| f(text).map(AnyValue::new)))
    }

    pub fn convert(&self, text: &str) -> Result<AnyValue, ConversionError> {
        match self {
            Self::Parse(ops) => ops.parse(text),
            Self::Open { ops, mode } => ops.open(text, *mode),
            Self::Callback(f) => f(text),
        }
    }

    /// Operations of the produced values, when known.
    pub fn ops(&self) -> Option<&'static dyn Operations> {
        match self {
            Self::Parse(ops) | Self::Open { ops, .. } => Some(*ops),
            Self::Callback(_) => None,
        }
    }
}

impl fmt::Debug for TypeInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(ops) => write!(f, "Parse({})", ops.short_type_name()),
            Self::Open { ops, mode } => write!(f, "Open({}, {mode})", ops.short_type_name()),
            Self::Callback(_) => f.write_str("Callback"),
        }
    }
}

#[track_caller]
fn require(ops: &dyn Operations, kind: OpKind) {
    if !ops.is_supported(kind) {
        panic!(
            "operation `{kind}` is not supported for type `{}`: it requires {}",
            ops.short_type_name(),
            kind.requirement()
        );
    }
}

/// What happens once an argument's values are converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Store,
    StoreConst,
    StoreTrue,
    StoreFalse,
    Append,
    AppendConst,
    Count,
    PrintHelp,
    PrintUsage,
    PrintVersion,
    Custom,
    NoAction,
}

/// How many values an action consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValuePolicy {
    /// Always consumes values; zero NumArgs is a declaration error.
    Required,
    /// Never consumes values; NumArgs must be zero.
    Never,
    /// Either; positionals default to one value, options to none.
    Flexible,
}

impl ActionKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::StoreConst => "store-const",
            Self::StoreTrue => "store-true",
            Self::StoreFalse => "store-false",
            Self::Append => "append",
            Self::AppendConst => "append-const",
            Self::Count => "count",
            Self::PrintHelp => "help",
            Self::PrintUsage => "usage",
            Self::PrintVersion => "version",
            Self::Custom => "custom",
            Self::NoAction => "none",
        }
    }

    pub fn value_policy(self) -> ValuePolicy {
        match self {
            Self::Store | Self::Append => ValuePolicy::Required,
            Self::Custom | Self::NoAction => ValuePolicy::Flexible,
            _ => ValuePolicy::Never,
        }
    }

    /// Whether the action writes through a destination.
    pub fn needs_dest(self) -> bool {
        self.required_op().is_some()
    }

    /// The operation the destination type must support.
    pub fn required_op(self) -> Option<OpKind> {
        match self {
            Self::Store => Some(OpKind::Store),
            Self::StoreConst | Self::StoreTrue | Self::StoreFalse => Some(OpKind::StoreConst),
            Self::Append => Some(OpKind::Append),
            Self::AppendConst => Some(OpKind::AppendConst),
            Self::Count => Some(OpKind::Count),
            Self::PrintHelp
            | Self::PrintUsage
            | Self::PrintVersion
            | Self::Custom
            | Self::NoAction => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The backend's side of an action invocation.
pub trait CallbackClient<'a> {
    /// The converted values, in command-line order. Taking them leaves the
    /// client empty.
    fn take_data(&mut self) -> Vec<AnyValue>;

    fn dest(&self) -> Option<&DestInfo<'a>>;

    fn const_value(&self) -> Option<&AnyValue>;

    fn print_help(&mut self);

    fn print_usage(&mut self);

    fn print_version(&mut self);
}

pub type ActionFn<'a> = dyn Fn(&mut dyn CallbackClient<'a>) -> Result<(), ConversionError> + 'a;

/// The post-conversion policy of an argument.
pub enum ActionInfo<'a> {
    Builtin {
        kind: ActionKind,
        ops: Option<&'static dyn Operations>,
    },
    Callback(Box<ActionFn<'a>>),
}

impl<'a> ActionInfo<'a> {
    /// A builtin action over the destination type `ops`.
    ///
    /// Panics if the action writes to a destination and `ops` is missing or
    /// does not support the operation the action maps to.
    #[track_caller]
    pub fn builtin(kind: ActionKind, ops: Option<&'static dyn Operations>) -> Self {
        if kind == ActionKind::Custom {
            panic!("custom actions are built with `ActionInfo::from_callback`");
        }
        if let Some(op) = kind.required_op() {
            let Some(ops) = ops else {
                panic!("action `{kind}` needs a destination");
            };
            require(ops, op);
        }
        Self::Builtin { kind, ops }
    }

    pub fn from_callback(
        f: impl Fn(&mut dyn CallbackClient<'a>) -> Result<(), ConversionError> + 'a,
    ) -> Self {
        Self::Callback(Box::new(f))
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Builtin { kind, .. } => *kind,
            Self::Callback(_) => ActionKind::Custom,
        }
    }

    pub fn run(&self, client: &mut dyn CallbackClient<'a>) -> Result<(), ConversionError> {
        let (kind, ops) = match self {
            Self::Callback(f) => return f(client),
            Self::Builtin { kind, ops } => (*kind, *ops),
        };
        match kind {
            ActionKind::PrintHelp => client.print_help(),
            ActionKind::PrintUsage => client.print_usage(),
            ActionKind::PrintVersion => client.print_version(),
            ActionKind::NoAction => {
                client.take_data();
            }
            ActionKind::Custom => unreachable!("custom actions carry a callback"),
            _ => {
                let Some(ops) = ops else {
                    unreachable!("builtin action `{kind}` was built without operations")
                };
                run_builtin(kind, ops, client);
            }
        }
        Ok(())
    }
}

fn run_builtin(kind: ActionKind, ops: &'static dyn Operations, client: &mut dyn CallbackClient<'_>) {
    let data = client.take_data();
    let Some(dest) = client.dest() else {
        panic!("action `{kind}` invoked without a destination");
    };
    let dest = dest.dest();
    match kind {
        ActionKind::Store => {
            if data.is_empty() {
                if let Some(konst) = client.const_value() {
                    ops.store_const(dest, konst);
                }
            } else if data.iter().all(|v| v.type_id() == ops.type_id()) {
                for value in data {
                    ops.store(dest, value);
                }
            } else {
                ops.clear(dest);
                for value in data {
                    ops.append(dest, value);
                }
            }
        }
        ActionKind::Append => {
            if data.is_empty() {
                if let Some(konst) = client.const_value() {
                    ops.append_const(dest, konst);
                }
            }
            for value in data {
                ops.append(dest, value);
            }
        }
        ActionKind::StoreConst | ActionKind::StoreTrue | ActionKind::StoreFalse => {
            ops.store_const(dest, expect_const(kind, client));
        }
        ActionKind::AppendConst => ops.append_const(dest, expect_const(kind, client)),
        ActionKind::Count => ops.count(dest),
        _ => unreachable!("`{kind}` has no destination operation"),
    }
}

fn expect_const<'c>(kind: ActionKind, client: &'c dyn CallbackClient<'_>) -> &'c AnyValue {
    match client.const_value() {
        Some(konst) => konst,
        None => panic!("action `{kind}` invoked without a const value"),
    }
}

impl fmt::Debug for ActionInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin { kind, ops } => match ops {
                Some(ops) => write!(f, "Builtin({kind}, {})", ops.short_type_name()),
                None => write!(f, "Builtin({kind})"),
            },
            Self::Callback(_) => f.write_str("Callback"),
        }
    }
}

/// How many values an argument accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumArgsInfo {
    Exact(usize),
    /// `?`
    ZeroOrOne,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

impl NumArgsInfo {
    #[track_caller]
    pub fn from_flag(flag: char) -> Self {
        match flag {
            '?' => Self::ZeroOrOne,
            '*' => Self::ZeroOrMore,
            '+' => Self::OneOrMore,
            other => panic!("invalid nargs flag `{other}`: expected one of `?`, `*`, `+`"),
        }
    }

    pub fn from_num(count: usize) -> Self {
        Self::Exact(count)
    }

    pub fn min(self) -> usize {
        match self {
            Self::Exact(n) => n,
            Self::ZeroOrOne | Self::ZeroOrMore => 0,
            Self::OneOrMore => 1,
        }
    }

    /// `None` means unbounded.
    pub fn max(self) -> Option<usize> {
        match self {
            Self::Exact(n) => Some(n),
            Self::ZeroOrOne => Some(1),
            Self::ZeroOrMore | Self::OneOrMore => None,
        }
    }

    pub fn check(self, count: usize) -> bool {
        count >= self.min() && self.max().is_none_or(|max| count <= max)
    }

    /// The message shown when [`NumArgsInfo::check`] fails.
    pub fn expectation(self) -> String {
        match self {
            Self::Exact(0) => "ignored explicit argument".to_string(),
            Self::Exact(1) => "expected one argument".to_string(),
            Self::Exact(n) => format!("expected {n} arguments"),
            Self::ZeroOrOne => "expected at most one argument".to_string(),
            Self::ZeroOrMore => "expected any number of arguments".to_string(),
            Self::OneOrMore => "expected at least one argument".to_string(),
        }
    }

    /// The meta-variable repeated the way usage lines show it.
    pub fn format_metavar(self, metavar: &str) -> String {
        match self {
            Self::Exact(n) => vec![metavar; n].join(" "),
            Self::ZeroOrOne => format!("[{metavar}]"),
            Self::ZeroOrMore => format!("[{metavar} ...]"),
            Self::OneOrMore => format!("{metavar} [{metavar} ...]"),
        }
    }
}

impl fmt::Display for NumArgsInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::ZeroOrOne => f.write_str("?"),
            Self::ZeroOrMore => f.write_str("*"),
            Self::OneOrMore => f.write_str("+"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct TestClient<'a> {
        data: Vec<AnyValue>,
        dest: Option<DestInfo<'a>>,
        konst: Option<AnyValue>,
        help: bool,
    }

    impl<'a> TestClient<'a> {
        fn new(dest: Option<DestInfo<'a>>) -> Self {
            Self {
                data: Vec::new(),
                dest,
                konst: None,
                help: false,
            }
        }
    }

    impl<'a> CallbackClient<'a> for TestClient<'a> {
        fn take_data(&mut self) -> Vec<AnyValue> {
            std::mem::take(&mut self.data)
        }

        fn dest(&self) -> Option<&DestInfo<'a>> {
            self.dest.as_ref()
        }

        fn const_value(&self) -> Option<&AnyValue> {
            self.konst.as_ref()
        }

        fn print_help(&mut self) {
            self.help = true;
        }

        fn print_usage(&mut self) {}

        fn print_version(&mut self) {}
    }

    #[test]
    fn name_grammar() {
        assert!(is_valid_short_name("-v"));
        assert!(is_valid_short_name("-1"));
        assert!(!is_valid_short_name("-vv"));
        assert!(!is_valid_short_name("--"));
        assert!(!is_valid_short_name("-_"));

        assert!(is_valid_long_name("--dry-run"));
        assert!(is_valid_long_name("--out_dir"));
        assert!(is_valid_long_name("--2fa"));
        assert!(!is_valid_long_name("--"));
        assert!(!is_valid_long_name("---x"));
        assert!(!is_valid_long_name("--a b"));

        assert!(is_valid_positional_name("file"));
        assert!(is_valid_positional_name("out_dir"));
        assert!(!is_valid_positional_name("1st"));
        assert!(!is_valid_positional_name("-x"));
        assert!(!is_valid_positional_name(""));
    }

    #[test]
    fn names_are_classified() {
        let names = NamesInfo::from_names(["-o", "--output", "--out"]);
        assert!(names.is_optional());
        assert_eq!(names.short_names().collect::<Vec<_>>(), ["-o"]);
        assert_eq!(names.long_names().collect::<Vec<_>>(), ["--output", "--out"]);
        assert_eq!(names.display_name(), "--output");
        assert_eq!(names.default_metavar(), "OUTPUT");
        assert!(!names.is_short_only());

        let short = NamesInfo::from_names(["-v"]);
        assert!(short.is_short_only());
        assert_eq!(short.default_metavar(), "V");

        let pos = NamesInfo::from_names(["input-file"]);
        assert!(pos.is_positional());
        assert_eq!(pos.dest_name(), "input_file");
        assert_eq!(pos.default_metavar(), "INPUT_FILE");
    }

    #[test]
    #[should_panic(expected = "invalid option name `-long`")]
    fn single_dash_long_name_panics() {
        NamesInfo::optional(["-long"]);
    }

    #[test]
    #[should_panic(expected = "cannot mix positional and optional names")]
    fn mixed_names_panic() {
        NamesInfo::from_names(["file", "-f"]);
    }

    #[test]
    #[should_panic(expected = "invalid positional argument name `9lives`")]
    fn positional_must_start_with_letter() {
        NamesInfo::positional("9lives");
    }

    #[test]
    fn nargs_bounds() {
        assert_eq!(NumArgsInfo::from_flag('?'), NumArgsInfo::ZeroOrOne);
        assert!(NumArgsInfo::from_flag('?').check(0));
        assert!(NumArgsInfo::from_flag('?').check(1));
        assert!(!NumArgsInfo::from_flag('?').check(2));
        assert!(!NumArgsInfo::from_flag('+').check(0));
        assert!(NumArgsInfo::from_flag('+').check(9));
        assert!(NumArgsInfo::from_flag('*').check(0));
        assert!(NumArgsInfo::from_num(2).check(2));
        assert!(!NumArgsInfo::from_num(2).check(1));
        assert_eq!(NumArgsInfo::from_num(3).expectation(), "expected 3 arguments");
        assert_eq!(NumArgsInfo::OneOrMore.format_metavar("F"), "F [F ...]");
        assert_eq!(NumArgsInfo::Exact(2).format_metavar("X"), "X X");
    }

    #[test]
    #[should_panic(expected = "invalid nargs flag `x`")]
    fn bad_nargs_flag_panics() {
        NumArgsInfo::from_flag('x');
    }

    #[test]
    fn type_info_variants_convert() {
        let parse = TypeInfo::parse(operations_of::<u8>());
        assert_eq!(*parse.convert("7").unwrap().cast::<u8>(), 7);
        assert!(parse.convert("x").is_err());

        let calls = Cell::new(0);
        let upper = TypeInfo::from_fn(|text: &str| {
            calls.set(calls.get() + 1);
            Ok::<_, ConversionError>(text.to_uppercase())
        });
        assert_eq!(upper.convert("abc").unwrap().into_inner::<String>(), "ABC");
        assert_eq!(calls.get(), 1);
        assert!(upper.ops().is_none());
    }

    #[test]
    #[should_panic(expected = "operation `parse` is not supported for type `Vec<i32>`")]
    fn parse_type_info_on_unparsable_type_panics() {
        TypeInfo::parse(operations_of::<Vec<i32>>());
    }

    #[test]
    #[should_panic(expected = "operation `count` is not supported for type `String`")]
    fn count_on_string_panics() {
        ActionInfo::builtin(ActionKind::Count, Some(operations_of::<String>()));
    }

    #[test]
    #[should_panic(expected = "action `append` needs a destination")]
    fn append_without_destination_panics() {
        ActionInfo::builtin(ActionKind::Append, None);
    }

    #[test]
    fn store_writes_last_value() {
        let mut port = 0_u16;
        {
            let action = ActionInfo::builtin(ActionKind::Store, Some(operations_of::<u16>()));
            let mut client = TestClient::new(Some(DestInfo::from_ref(&mut port)));
            client.data = vec![AnyValue::new(80_u16)];
            action.run(&mut client).unwrap();
        }
        assert_eq!(port, 80);
    }

    #[test]
    fn store_of_several_elements_replaces_container() {
        let mut files = vec!["old".to_string()];
        {
            let action =
                ActionInfo::builtin(ActionKind::Store, Some(operations_of::<Vec<String>>()));
            let mut client = TestClient::new(Some(DestInfo::from_ref(&mut files)));
            client.data = vec![AnyValue::new("a".to_string()), AnyValue::new("b".to_string())];
            action.run(&mut client).unwrap();
        }
        assert_eq!(files, ["a", "b"]);
    }

    #[test]
    fn store_with_no_values_uses_const() {
        let mut level = Some(1_u8);
        {
            let action =
                ActionInfo::builtin(ActionKind::Store, Some(operations_of::<Option<u8>>()));
            let mut client = TestClient::new(Some(DestInfo::from_ref(&mut level)));
            client.konst = Some(AnyValue::new(Some(5_u8)));
            action.run(&mut client).unwrap();
        }
        assert_eq!(level, Some(5));
    }

    #[test]
    fn count_and_append_const() {
        let mut verbosity = 0_i32;
        let mut tags: Vec<char> = Vec::new();
        {
            let count = ActionInfo::builtin(ActionKind::Count, Some(operations_of::<i32>()));
            let mut client = TestClient::new(Some(DestInfo::from_ref(&mut verbosity)));
            count.run(&mut client).unwrap();
            count.run(&mut client).unwrap();

            let append =
                ActionInfo::builtin(ActionKind::AppendConst, Some(operations_of::<Vec<char>>()));
            let mut client = TestClient::new(Some(DestInfo::from_ref(&mut tags)));
            client.konst = Some(AnyValue::new('x'));
            append.run(&mut client).unwrap();
        }
        assert_eq!(verbosity, 2);
        assert_eq!(tags, ['x']);
    }

    #[test]
    fn help_action_signals_the_client() {
        let action = ActionInfo::builtin(ActionKind::PrintHelp, None);
        let mut client = TestClient::new(None);
        action.run(&mut client).unwrap();
        assert!(client.help);
    }

    #[test]
    fn callback_action_sees_data_and_can_fail() {
        let action = ActionInfo::from_callback(|client| {
            let data = client.take_data();
            if data.len() == 2 {
                Ok(())
            } else {
                Err(ConversionError::message("need a pair"))
            }
        });
        assert_eq!(action.kind(), ActionKind::Custom);
        let mut client = TestClient::new(None);
        client.data = vec![AnyValue::new(1), AnyValue::new(2)];
        assert!(action.run(&mut client).is_ok());
        let err = action.run(&mut client).unwrap_err();
        assert_eq!(err.to_string(), "need a pair");
    }
}
