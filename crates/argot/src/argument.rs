//! Argument assembly.
//!
//! An [`Argument`] is put together by [`ArgumentBuilder::build`], which fills
//! in everything the declaration left implicit: the meta-variable, the
//! action, the conversion policy and the accepted value count.
//!
//! ```
//! use argot::argument::ArgumentBuilder;
//! use argot::info::{ActionKind, NumArgsInfo};
//!
//! let mut verbose = false;
//! let arg = ArgumentBuilder::new(["-v", "--verbose"])
//!     .dest(&mut verbose)
//!     .action(ActionKind::StoreTrue)
//!     .build();
//! assert_eq!(arg.action().kind(), ActionKind::StoreConst);
//! assert_eq!(arg.num_args(), NumArgsInfo::Exact(0));
//! assert_eq!(arg.metavar(), "VERBOSE");
//! ```

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;

use crate::any::AnyValue;
use crate::error::ConversionError;
use crate::holder::GroupId;
use crate::info::{
    ActionInfo, ActionKind, CallbackClient, DestInfo, NamesInfo, NumArgsInfo, TypeInfo,
    ValuePolicy,
};
use crate::mode::OpenMode;
use crate::ops::{ArgType, OpKind, Operations};

/// One declared argument.
pub struct Argument<'a> {
    names: NamesInfo,
    dest: Option<DestInfo<'a>>,
    type_info: Option<TypeInfo<'a>>,
    action: ActionInfo<'a>,
    num_args: NumArgsInfo,
    const_value: Option<AnyValue>,
    default_value: Option<AnyValue>,
    help: String,
    metavar: String,
    required: bool,
    group: GroupId,
}

impl<'a> Argument<'a> {
    pub fn names(&self) -> &NamesInfo {
        &self.names
    }

    pub fn is_positional(&self) -> bool {
        self.names.is_positional()
    }

    pub fn display_name(&self) -> &str {
        self.names.display_name()
    }

    pub fn dest(&self) -> Option<&DestInfo<'a>> {
        self.dest.as_ref()
    }

    pub fn type_info(&self) -> Option<&TypeInfo<'a>> {
        self.type_info.as_ref()
    }

    pub fn action(&self) -> &ActionInfo<'a> {
        &self.action
    }

    pub fn num_args(&self) -> NumArgsInfo {
        self.num_args
    }

    /// Whether the argument consumes values on the command line.
    pub fn takes_values(&self) -> bool {
        self.num_args.max() != Some(0)
    }

    pub fn const_value(&self) -> Option<&AnyValue> {
        self.const_value.as_ref()
    }

    pub fn default_value(&self) -> Option<&AnyValue> {
        self.default_value.as_ref()
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn metavar(&self) -> &str {
        &self.metavar
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    pub(crate) fn set_group(&mut self, group: GroupId) {
        self.group = group;
    }

    /// Convert one piece of text. Without a conversion policy the text
    /// itself is passed on as a `String`.
    pub fn convert(&self, text: &str) -> Result<AnyValue, ConversionError> {
        match &self.type_info {
            Some(info) => info.convert(text),
            None => Ok(AnyValue::new(text.to_string())),
        }
    }

    /// Write the default value, if any, into the destination.
    pub fn apply_default(&self) {
        if let (Some(default), Some(dest)) = (&self.default_value, &self.dest) {
            dest.ops().store_const(dest.dest(), default);
        }
    }

    /// The default rendered for help output.
    pub fn format_default(&self) -> Option<String> {
        let default = self.default_value.as_ref()?;
        let dest = self.dest.as_ref()?;
        Some(dest.ops().format_value(default))
    }

    /// Short user-facing type name of the values this argument consumes.
    pub fn type_hint(&self) -> Option<String> {
        self.type_info
            .as_ref()
            .and_then(TypeInfo::ops)
            .map(|ops| ops.type_hint())
    }

    /// Usage ordering: options before positionals; options required first,
    /// then short-only flags, then by name; positionals by name.
    pub fn usage_cmp(&self, other: &Self) -> Ordering {
        match (self.is_positional(), other.is_positional()) {
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            (true, true) => self.display_name().cmp(other.display_name()),
            (false, false) => other
                .required
                .cmp(&self.required)
                .then_with(|| {
                    other
                        .names
                        .is_short_only()
                        .cmp(&self.names.is_short_only())
                })
                .then_with(|| self.display_name().cmp(other.display_name())),
        }
    }
}

impl fmt::Debug for Argument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("names", &self.names)
            .field("dest", &self.dest)
            .field("type_info", &self.type_info)
            .field("action", &self.action)
            .field("num_args", &self.num_args)
            .field("metavar", &self.metavar)
            .field("required", &self.required)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

/// Declaration of one argument.
pub struct ArgumentBuilder<'a> {
    names: NamesInfo,
    dest: Option<DestInfo<'a>>,
    type_info: Option<TypeInfo<'a>>,
    action_kind: Option<ActionKind>,
    action_callback: Option<ActionInfo<'a>>,
    num_args: Option<NumArgsInfo>,
    const_value: Option<AnyValue>,
    default_value: Option<AnyValue>,
    help: String,
    metavar: Option<String>,
    required: Option<bool>,
    file_mode: Option<OpenMode>,
}

impl<'a> ArgumentBuilder<'a> {
    /// See [`NamesInfo::from_names`].
    #[track_caller]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_names_info(NamesInfo::from_names(names))
    }

    pub fn from_names_info(names: NamesInfo) -> Self {
        Self {
            names,
            dest: None,
            type_info: None,
            action_kind: None,
            action_callback: None,
            num_args: None,
            const_value: None,
            default_value: None,
            help: String::new(),
            metavar: None,
            required: None,
            file_mode: None,
        }
    }

    pub fn dest<T: ArgType>(self, target: &'a mut T) -> Self {
        self.dest_info(DestInfo::from_ref(target))
    }

    pub fn dest_info(mut self, dest: DestInfo<'a>) -> Self {
        self.dest = Some(dest);
        self
    }

    pub fn action(mut self, kind: ActionKind) -> Self {
        self.action_kind = Some(kind);
        self
    }

    pub fn action_fn(
        mut self,
        f: impl Fn(&mut dyn CallbackClient<'a>) -> Result<(), ConversionError> + 'a,
    ) -> Self {
        self.action_callback = Some(ActionInfo::from_callback(f));
        self
    }

    pub fn type_info(mut self, info: TypeInfo<'a>) -> Self {
        self.type_info = Some(info);
        self
    }

    pub fn type_fn<T: Any>(
        self,
        f: impl Fn(&str) -> Result<T, ConversionError> + 'a,
    ) -> Self {
        self.type_info(TypeInfo::from_fn(f))
    }

    /// Open values as files instead of parsing them.
    pub fn file_mode(mut self, mode: OpenMode) -> Self {
        self.file_mode = Some(mode);
        self
    }

    pub fn nargs(mut self, count: usize) -> Self {
        self.num_args = Some(NumArgsInfo::from_num(count));
        self
    }

    /// `?`, `*` or `+`.
    #[track_caller]
    pub fn nargs_flag(mut self, flag: char) -> Self {
        self.num_args = Some(NumArgsInfo::from_flag(flag));
        self
    }

    pub fn num_args(mut self, num_args: NumArgsInfo) -> Self {
        self.num_args = Some(num_args);
        self
    }

    pub fn const_value<T: Any>(self, value: T) -> Self {
        self.const_any(AnyValue::new(value))
    }

    pub fn const_any(mut self, value: AnyValue) -> Self {
        self.const_value = Some(value);
        self
    }

    pub fn default_value<T: Any>(self, value: T) -> Self {
        self.default_any(AnyValue::new(value))
    }

    pub fn default_any(mut self, value: AnyValue) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    #[track_caller]
    pub fn build(self) -> Argument<'a> {
        let Self {
            names,
            dest,
            type_info,
            action_kind,
            action_callback,
            num_args,
            mut const_value,
            mut default_value,
            help,
            metavar,
            required,
            file_mode,
        } = self;

        let metavar = metavar.unwrap_or_else(|| names.default_metavar());
        let dest_ops = dest.as_ref().map(DestInfo::ops);

        // Flags over bool: the const is the flag's value, the default its negation.
        let mut kind = action_kind;
        if let Some(target @ (ActionKind::StoreTrue | ActionKind::StoreFalse)) = kind {
            let flag = target == ActionKind::StoreTrue;
            if !dest.as_ref().is_some_and(|d| d.type_is::<bool>()) {
                panic!("action `{target}` on `{names}` requires a `bool` destination");
            }
            const_value = Some(AnyValue::new(flag));
            if default_value.is_none() {
                default_value = Some(AnyValue::new(!flag));
            }
            kind = Some(ActionKind::StoreConst);
        }

        let action = match action_callback {
            Some(callback) => callback,
            None => {
                let kind = kind.unwrap_or(if dest.is_some() {
                    ActionKind::Store
                } else {
                    ActionKind::NoAction
                });
                ActionInfo::builtin(kind, dest_ops)
            }
        };
        let kind = action.kind();

        let policy = kind.value_policy();
        let num_args = num_args.unwrap_or(match policy {
            ValuePolicy::Required => NumArgsInfo::Exact(1),
            ValuePolicy::Never => NumArgsInfo::Exact(0),
            ValuePolicy::Flexible if names.is_positional() => NumArgsInfo::Exact(1),
            ValuePolicy::Flexible => NumArgsInfo::Exact(0),
        });
        match policy {
            ValuePolicy::Never if num_args != NumArgsInfo::Exact(0) => panic!(
                "action `{kind}` on `{names}` takes no values, but nargs is `{num_args}`"
            ),
            ValuePolicy::Required if num_args == NumArgsInfo::Exact(0) => {
                panic!("action `{kind}` on `{names}` needs nargs other than 0")
            }
            _ => {}
        }
        if names.is_positional() && num_args == NumArgsInfo::Exact(0) {
            panic!("positional argument `{names}` must consume at least one value");
        }

        let type_info = match type_info {
            Some(info) => Some(info),
            None if num_args.max() == Some(0) => None,
            None => dest_ops
                .and_then(|ops| value_ops(kind, ops, num_args, file_mode))
                .map(|ops| match file_mode {
                    Some(mode) => TypeInfo::file(ops, mode),
                    None => TypeInfo::parse(ops),
                }),
        };

        if let Some(konst) = &const_value {
            if let Some(ops) = dest_ops {
                let expected = match kind {
                    ActionKind::AppendConst | ActionKind::Append => ops.value_type_ops(),
                    _ => Some(ops),
                };
                if let Some(expected) = expected {
                    check_value_type("const", &names, konst, expected);
                }
            }
        }
        if matches!(kind, ActionKind::StoreConst | ActionKind::AppendConst)
            && const_value.is_none()
        {
            panic!("action `{kind}` on `{names}` requires a const value");
        }

        if let Some(default) = &default_value {
            let Some(ops) = dest_ops else {
                panic!("default value for `{names}` needs a destination");
            };
            if !ops.is_supported(OpKind::StoreConst) {
                panic!(
                    "default value for `{names}`: operation `store-const` is not supported \
                     for type `{}`: it requires {}",
                    ops.short_type_name(),
                    OpKind::StoreConst.requirement()
                );
            }
            check_value_type("default", &names, default, ops);
        }

        let required = required.unwrap_or(names.is_positional() && num_args.min() > 0);

        Argument {
            names,
            dest,
            type_info,
            action,
            num_args,
            const_value,
            default_value,
            help,
            metavar,
            required,
            group: GroupId::OPTIONS,
        }
    }
}

impl<'a> From<ArgumentBuilder<'a>> for Argument<'a> {
    #[track_caller]
    fn from(builder: ArgumentBuilder<'a>) -> Self {
        builder.build()
    }
}

/// The operations that convert each value for `kind` over a destination
/// whose operations are `dest`.
fn value_ops(
    kind: ActionKind,
    dest: &'static dyn Operations,
    num_args: NumArgsInfo,
    file_mode: Option<OpenMode>,
) -> Option<&'static dyn Operations> {
    let element = dest.value_type_ops();
    match kind {
        ActionKind::Append => element,
        ActionKind::Store => {
            let direct = if file_mode.is_some() {
                OpKind::Open
            } else {
                OpKind::Parse
            };
            let several = num_args.max().is_none_or(|max| max > 1);
            match element {
                Some(element) if several || !dest.is_supported(direct) => Some(element),
                _ => Some(dest),
            }
        }
        ActionKind::Custom => {
            let direct = if file_mode.is_some() {
                OpKind::Open
            } else {
                OpKind::Parse
            };
            dest.is_supported(direct).then_some(dest)
        }
        _ => None,
    }
}

#[track_caller]
fn check_value_type(what: &str, names: &NamesInfo, value: &AnyValue, ops: &dyn Operations) {
    if value.type_id() != ops.type_id() {
        panic!(
            "{what} value for `{names}` has type `{}`, but the destination expects `{}`",
            value.type_name(),
            ops.type_name()
        );
    }
}
