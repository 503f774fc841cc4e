//! Typed storage that parsed values land in.

use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::path::PathBuf;

use argot::info::{
    NamesInfo, NumArgsInfo, is_valid_long_name, is_valid_positional_name, is_valid_short_name,
};
use argot::subcommand::is_valid_command_name;
use argot::{AnyValue, ArgType, ArgumentBuilder, OpenMode};
use serde::Serialize;
use serde::de::{DeserializeOwned, Error as _};
use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::model::{ActionSchema, ArgSchema, CommandSchema, ScalarType, ValueType};

/// One slot's storage, seen through its JSON face.
pub(crate) trait Slot: fmt::Debug {
    /// Point `builder` at this slot.
    fn bind<'a>(&'a mut self, builder: ArgumentBuilder<'a>) -> ArgumentBuilder<'a>;

    /// A JSON value as the slot's own type (defaults, store consts).
    fn value_from_json(&self, json: &Value) -> Result<AnyValue, serde_json::Error>;

    /// A JSON value as one element (consts of `append` and `append-const`).
    fn element_from_json(&self, json: &Value) -> Result<AnyValue, serde_json::Error> {
        self.value_from_json(json)
    }

    fn to_json(&self) -> Value;
}

trait SlotScalar: ArgType + Serialize + DeserializeOwned + Clone + fmt::Debug {}

impl<T: ArgType + Serialize + DeserializeOwned + Clone + fmt::Debug> SlotScalar for T {}

/// Single value; unset reads back as `null`.
#[derive(Debug)]
struct ScalarSlot<T>(Option<T>);

impl<T: SlotScalar> Slot for ScalarSlot<T> {
    fn bind<'a>(&'a mut self, builder: ArgumentBuilder<'a>) -> ArgumentBuilder<'a> {
        builder.dest(&mut self.0)
    }

    fn value_from_json(&self, json: &Value) -> Result<AnyValue, serde_json::Error> {
        let value: T = serde_json::from_value(json.clone())?;
        Ok(AnyValue::new(Some(value)))
    }

    fn to_json(&self) -> Value {
        serde_json::to_value(&self.0).unwrap_or(Value::Null)
    }
}

#[derive(Debug)]
struct ListSlot<T>(Vec<T>);

impl<T: SlotScalar> Slot for ListSlot<T> {
    fn bind<'a>(&'a mut self, builder: ArgumentBuilder<'a>) -> ArgumentBuilder<'a> {
        builder.dest(&mut self.0)
    }

    fn value_from_json(&self, json: &Value) -> Result<AnyValue, serde_json::Error> {
        let value: Vec<T> = serde_json::from_value(json.clone())?;
        Ok(AnyValue::new(value))
    }

    fn element_from_json(&self, json: &Value) -> Result<AnyValue, serde_json::Error> {
        let value: T = serde_json::from_value(json.clone())?;
        Ok(AnyValue::new(value))
    }

    fn to_json(&self) -> Value {
        serde_json::to_value(&self.0).unwrap_or(Value::Null)
    }
}

#[derive(Debug)]
struct CountSlot(u64);

impl Slot for CountSlot {
    fn bind<'a>(&'a mut self, builder: ArgumentBuilder<'a>) -> ArgumentBuilder<'a> {
        builder.dest(&mut self.0)
    }

    fn value_from_json(&self, json: &Value) -> Result<AnyValue, serde_json::Error> {
        Ok(AnyValue::new(serde_json::from_value::<u64>(json.clone())?))
    }

    fn to_json(&self) -> Value {
        Value::from(self.0)
    }
}

#[derive(Debug)]
struct FlagSlot(bool);

impl Slot for FlagSlot {
    fn bind<'a>(&'a mut self, builder: ArgumentBuilder<'a>) -> ArgumentBuilder<'a> {
        builder.dest(&mut self.0)
    }

    fn value_from_json(&self, json: &Value) -> Result<AnyValue, serde_json::Error> {
        Ok(AnyValue::new(serde_json::from_value::<bool>(json.clone())?))
    }

    fn to_json(&self) -> Value {
        Value::Bool(self.0)
    }
}

/// An opened file; reads back as whether it was opened.
#[derive(Debug)]
struct FileSlot {
    file: Option<File>,
    mode: OpenMode,
}

impl Slot for FileSlot {
    fn bind<'a>(&'a mut self, builder: ArgumentBuilder<'a>) -> ArgumentBuilder<'a> {
        builder.dest(&mut self.file).file_mode(self.mode)
    }

    fn value_from_json(&self, _json: &Value) -> Result<AnyValue, serde_json::Error> {
        Err(serde_json::Error::custom("file arguments take no default or const"))
    }

    fn to_json(&self) -> Value {
        Value::Bool(self.file.is_some())
    }
}

fn scalar_slot(scalar: ScalarType) -> Box<dyn Slot> {
    match scalar {
        ScalarType::String => Box::new(ScalarSlot::<String>(None)),
        ScalarType::Int => Box::new(ScalarSlot::<i64>(None)),
        ScalarType::Float => Box::new(ScalarSlot::<f64>(None)),
        ScalarType::Bool => Box::new(ScalarSlot::<bool>(None)),
        ScalarType::Char => Box::new(ScalarSlot::<char>(None)),
        ScalarType::Path => Box::new(ScalarSlot::<PathBuf>(None)),
    }
}

fn list_slot(scalar: ScalarType) -> Box<dyn Slot> {
    match scalar {
        ScalarType::String => Box::new(ListSlot::<String>(Vec::new())),
        ScalarType::Int => Box::new(ListSlot::<i64>(Vec::new())),
        ScalarType::Float => Box::new(ListSlot::<f64>(Vec::new())),
        ScalarType::Bool => Box::new(ListSlot::<bool>(Vec::new())),
        ScalarType::Char => Box::new(ListSlot::<char>(Vec::new())),
        ScalarType::Path => Box::new(ListSlot::<PathBuf>(Vec::new())),
    }
}

/// One validated argument and its storage.
#[derive(Debug)]
pub(crate) struct Entry {
    pub(crate) key: String,
    pub(crate) schema: ArgSchema,
    pub(crate) num_args: Option<NumArgsInfo>,
    pub(crate) slot: Option<Box<dyn Slot>>,
}

impl Entry {
    /// Build the argument declaration, pointing into this entry's slot.
    pub(crate) fn builder(&mut self) -> Result<ArgumentBuilder<'_>, SchemaError> {
        let Entry {
            schema,
            num_args,
            slot,
            ..
        } = self;
        let label = schema.label();

        let mut builder = ArgumentBuilder::new(schema.names.iter().cloned())
            .action(schema.action.kind())
            .help(schema.help.clone());
        if let Some(num_args) = *num_args {
            builder = builder.num_args(num_args);
        }
        if let Some(metavar) = &schema.metavar {
            builder = builder.metavar(metavar.clone());
        }
        if let Some(required) = schema.required {
            builder = builder.required(required);
        }

        let Some(slot) = slot.as_deref_mut() else {
            return Ok(builder);
        };
        if let Some(json) = &schema.default {
            let value = slot
                .value_from_json(json)
                .map_err(|err| SchemaError::BadDefault {
                    argument: label.clone(),
                    reason: err.to_string(),
                })?;
            builder = builder.default_any(value);
        }
        if let Some(json) = &schema.const_value {
            let value = match schema.action {
                ActionSchema::Append | ActionSchema::AppendConst => slot.element_from_json(json),
                _ => slot.value_from_json(json),
            }
            .map_err(|err| SchemaError::BadConst {
                argument: label.clone(),
                reason: err.to_string(),
            })?;
            builder = builder.const_any(value);
        }
        Ok(slot.bind(builder))
    }
}

#[derive(Debug)]
pub(crate) struct SubTable {
    pub(crate) name: String,
    pub(crate) entries: Vec<Entry>,
}

/// Storage for every argument of a schema, sub-commands included.
#[derive(Debug)]
pub struct SlotTable {
    pub(crate) entries: Vec<Entry>,
    pub(crate) sub_commands: Vec<SubTable>,
    pub(crate) command: String,
}

impl SlotTable {
    /// Validate `schema` and allocate one slot per value-writing argument.
    pub fn allocate(schema: &CommandSchema) -> Result<Self, SchemaError> {
        let mut reserved = HashSet::new();
        if !schema.subcommands.is_empty() {
            reserved.insert("command".to_string());
        }

        let mut sub_commands = Vec::with_capacity(schema.subcommands.len());
        let mut sub_names = HashSet::new();
        for sub in &schema.subcommands {
            for name in std::iter::once(&sub.name).chain(&sub.aliases) {
                if !is_valid_command_name(name) {
                    return Err(SchemaError::InvalidSubCommand(name.clone()));
                }
                if !sub_names.insert(name.clone()) {
                    return Err(SchemaError::DuplicateSubCommand(name.clone()));
                }
            }
            reserved.insert(sub.name.clone());
            sub_commands.push(SubTable {
                name: sub.name.clone(),
                entries: allocate_entries(&sub.name, &sub.args, &HashSet::new())?,
            });
        }

        let entries = allocate_entries(&schema.name, &schema.args, &reserved)?;
        tracing::debug!(
            command = %schema.name,
            slots = entries.len(),
            sub_commands = sub_commands.len(),
            "allocated slot table"
        );
        Ok(Self {
            entries,
            sub_commands,
            command: String::new(),
        })
    }

    /// The selected sub-command's primary name, empty when none was given.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The current values, keyed by argument. With sub-commands, `command`
    /// holds the selected name and the selected sub-command's values sit
    /// under that name.
    pub fn to_json(&self) -> Value {
        let mut map = entries_to_json(&self.entries);
        if !self.sub_commands.is_empty() {
            let command = if self.command.is_empty() {
                Value::Null
            } else {
                Value::String(self.command.clone())
            };
            map.insert("command".to_string(), command);
            if let Some(sub) = self.sub_commands.iter().find(|s| s.name == self.command) {
                map.insert(sub.name.clone(), Value::Object(entries_to_json(&sub.entries)));
            }
        }
        Value::Object(map)
    }
}

fn entries_to_json(entries: &[Entry]) -> Map<String, Value> {
    entries
        .iter()
        .filter_map(|e| e.slot.as_ref().map(|slot| (e.key.clone(), slot.to_json())))
        .collect()
}

fn allocate_entries(
    command: &str,
    args: &[ArgSchema],
    reserved: &HashSet<String>,
) -> Result<Vec<Entry>, SchemaError> {
    let mut names = HashSet::new();
    let mut keys = reserved.clone();
    let mut entries = Vec::with_capacity(args.len());
    for arg in args {
        let names_info = check_names(command, arg)?;
        for name in &arg.names {
            if !names.insert(name.clone()) {
                return Err(SchemaError::DuplicateName {
                    command: command.to_string(),
                    name: name.clone(),
                });
            }
        }

        let entry = allocate_entry(arg, &names_info)?;
        if entry.slot.is_some() && !keys.insert(entry.key.clone()) {
            return Err(SchemaError::DuplicateKey {
                command: command.to_string(),
                key: entry.key,
            });
        }
        entries.push(entry);
    }
    Ok(entries)
}

/// The checks `NamesInfo` would otherwise panic on.
fn check_names(command: &str, arg: &ArgSchema) -> Result<NamesInfo, SchemaError> {
    let invalid = |name: &str| SchemaError::InvalidName {
        command: command.to_string(),
        name: name.to_string(),
    };
    match arg.names.as_slice() {
        [] => Err(invalid("")),
        [name] if !name.starts_with('-') => {
            if is_valid_positional_name(name) {
                Ok(NamesInfo::positional(name.clone()))
            } else {
                Err(invalid(name))
            }
        }
        names => {
            let mut seen = HashSet::new();
            for name in names {
                let valid = is_valid_short_name(name) || is_valid_long_name(name);
                if !valid || !seen.insert(name.as_str()) {
                    return Err(invalid(name));
                }
            }
            Ok(NamesInfo::optional(names.iter().cloned()))
        }
    }
}

/// The checks the argument builder would otherwise panic on, then the slot
/// matching the action and value type.
fn allocate_entry(arg: &ArgSchema, names: &NamesInfo) -> Result<Entry, SchemaError> {
    let label = arg.label();
    let action = arg.action;

    let num_args = arg
        .nargs
        .as_ref()
        .map(|n| n.to_num_args())
        .transpose()
        .map_err(|reason| SchemaError::invalid(&label, reason))?;

    if action.takes_values() {
        if num_args == Some(NumArgsInfo::Exact(0)) {
            return Err(SchemaError::invalid(&label, "nargs 0 leaves nothing to store"));
        }
    } else {
        if num_args.is_some_and(|n| n != NumArgsInfo::Exact(0)) {
            return Err(SchemaError::invalid(
                &label,
                format!("action `{}` takes no values", action.kind()),
            ));
        }
        if names.is_positional() {
            return Err(SchemaError::invalid(
                &label,
                format!("action `{}` cannot be positional", action.kind()),
            ));
        }
    }

    let value_type = arg.value_type.unwrap_or_default();
    let multiple = num_args.is_some_and(|n| n.max() != Some(1));

    let file_mode = match &arg.file_mode {
        None => None,
        Some(chars) => {
            let mode = OpenMode::from_chars(chars)
                .map_err(|err| SchemaError::invalid(&label, err.to_string()))?;
            let single = action == ActionSchema::Store && !multiple && !value_type.list;
            if !single || !matches!(value_type.scalar, ScalarType::String | ScalarType::Path) {
                return Err(SchemaError::invalid(
                    &label,
                    "file-mode needs a single-valued `store` of a string or path",
                ));
            }
            Some(mode)
        }
    };

    let slot: Option<Box<dyn Slot>> = match (action, file_mode) {
        (ActionSchema::Help | ActionSchema::Usage | ActionSchema::Version, _) => None,
        (_, Some(mode)) => Some(Box::new(FileSlot { file: None, mode })),
        (ActionSchema::Store, None) if value_type.list || multiple => {
            Some(list_slot(value_type.scalar))
        }
        (ActionSchema::Store | ActionSchema::StoreConst, None) if !value_type.list => {
            Some(scalar_slot(value_type.scalar))
        }
        (
            ActionSchema::Store
            | ActionSchema::StoreConst
            | ActionSchema::Append
            | ActionSchema::AppendConst,
            None,
        ) => Some(list_slot(value_type.scalar)),
        (ActionSchema::StoreTrue | ActionSchema::StoreFalse, None) => {
            expect_type(&label, arg.value_type, ScalarType::Bool)?;
            Some(Box::new(FlagSlot(false)))
        }
        (ActionSchema::Count, None) => {
            expect_type(&label, arg.value_type, ScalarType::Int)?;
            Some(Box::new(CountSlot(0)))
        }
    };

    match &slot {
        None => {
            if arg.default.is_some() || arg.const_value.is_some() {
                return Err(SchemaError::invalid(
                    &label,
                    format!("action `{}` takes no default or const", action.kind()),
                ));
            }
        }
        Some(slot) => {
            if let Some(json) = &arg.default {
                slot.value_from_json(json)
                    .map_err(|err| SchemaError::BadDefault {
                        argument: label.clone(),
                        reason: err.to_string(),
                    })?;
            }
            if let Some(json) = &arg.const_value {
                let converted = match action {
                    ActionSchema::Append | ActionSchema::AppendConst => {
                        slot.element_from_json(json)
                    }
                    ActionSchema::StoreTrue | ActionSchema::StoreFalse | ActionSchema::Count => {
                        return Err(SchemaError::invalid(
                            &label,
                            format!("action `{}` takes no const", action.kind()),
                        ));
                    }
                    _ => slot.value_from_json(json),
                };
                converted.map_err(|err| SchemaError::BadConst {
                    argument: label.clone(),
                    reason: err.to_string(),
                })?;
            }
        }
    }
    if matches!(action, ActionSchema::StoreConst | ActionSchema::AppendConst)
        && arg.const_value.is_none()
    {
        return Err(SchemaError::invalid(
            &label,
            format!("action `{}` needs a const", action.kind()),
        ));
    }

    Ok(Entry {
        key: names.dest_name(),
        schema: arg.clone(),
        num_args,
        slot,
    })
}

fn expect_type(label: &str, given: Option<ValueType>, scalar: ScalarType) -> Result<(), SchemaError> {
    match given {
        Some(given) if given != ValueType::scalar(scalar) => Err(SchemaError::invalid(
            label,
            format!("value-type must be `{}`, got `{given}`", scalar.name()),
        )),
        _ => Ok(()),
    }
}
