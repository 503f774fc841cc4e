//! Named sub-commands, each with its own arguments.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::argument::Argument;
use crate::holder::{ArgumentHolder, ArgumentId, GroupId};
use crate::info::DestInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubCommandId(usize);

impl SubCommandId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubCommandGroupId(usize);

impl SubCommandGroupId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Non-empty, no leading `-`, no whitespace.
pub fn is_valid_command_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('-') && !name.chars().any(char::is_whitespace)
}

/// A sub-command: a name, its aliases and a nested command line.
pub struct SubCommand<'a> {
    name: String,
    aliases: Vec<String>,
    help: String,
    arguments: ArgumentHolder<'a>,
    sub_commands: SubCommandHolder<'a>,
}

impl<'a> SubCommand<'a> {
    #[track_caller]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if !is_valid_command_name(&name) {
            panic!("invalid sub-command name `{name}`");
        }
        Self {
            name,
            aliases: Vec::new(),
            help: String::new(),
            arguments: ArgumentHolder::new(),
            sub_commands: SubCommandHolder::new(),
        }
    }

    #[track_caller]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        if !is_valid_command_name(&alias) {
            panic!("invalid alias `{alias}` for sub-command `{}`", self.name);
        }
        if alias == self.name || self.aliases.contains(&alias) {
            panic!("alias `{alias}` is listed twice for sub-command `{}`", self.name);
        }
        self.aliases.push(alias);
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Builder-style [`ArgumentHolder::add_argument`].
    #[track_caller]
    pub fn argument(mut self, argument: impl Into<Argument<'a>>) -> Self {
        self.arguments.add_argument(argument);
        self
    }

    #[track_caller]
    pub fn add_argument(&mut self, argument: impl Into<Argument<'a>>) -> ArgumentId {
        self.arguments.add_argument(argument)
    }

    pub fn add_argument_group(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> GroupId {
        self.arguments.add_argument_group(title, description)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn help_text(&self) -> &str {
        &self.help
    }

    pub fn holder(&self) -> &ArgumentHolder<'a> {
        &self.arguments
    }

    pub fn holder_mut(&mut self) -> &mut ArgumentHolder<'a> {
        &mut self.arguments
    }

    pub fn sub_commands(&self) -> &SubCommandHolder<'a> {
        &self.sub_commands
    }

    pub fn sub_commands_mut(&mut self) -> &mut SubCommandHolder<'a> {
        &mut self.sub_commands
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut ArgumentHolder<'a>, &mut SubCommandHolder<'a>) {
        (&mut self.arguments, &mut self.sub_commands)
    }
}

impl fmt::Debug for SubCommand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubCommand")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("arguments", &self.arguments)
            .field("sub_commands", &self.sub_commands)
            .finish_non_exhaustive()
    }
}

/// A titled set of sub-commands.
pub struct SubCommandGroup<'a> {
    id: SubCommandGroupId,
    title: String,
    description: String,
    dest: Option<DestInfo<'a>>,
    required: bool,
    members: Vec<SubCommandId>,
}

impl<'a> SubCommandGroup<'a> {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: SubCommandGroupId(0),
            title: title.into(),
            description: String::new(),
            dest: None,
            required: false,
            members: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Receives the primary name of the selected sub-command.
    pub fn dest(mut self, target: &'a mut String) -> Self {
        self.dest = Some(DestInfo::from_ref(target));
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn id(&self) -> SubCommandGroupId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description_text(&self) -> &str {
        &self.description
    }

    pub fn dest_info(&self) -> Option<&DestInfo<'a>> {
        self.dest.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn members(&self) -> &[SubCommandId] {
        &self.members
    }
}

impl fmt::Debug for SubCommandGroup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubCommandGroup")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("required", &self.required)
            .field("members", &self.members)
            .finish_non_exhaustive()
    }
}

pub trait SubCommandHolderListener {
    fn on_add_sub_command(&mut self, _id: SubCommandId, _command: &SubCommand<'_>) {}

    fn on_add_sub_command_group(&mut self, _group: &SubCommandGroup<'_>) {}
}

/// Sub-commands of one command. Names and aliases share one namespace.
pub struct SubCommandHolder<'a> {
    commands: Vec<SubCommand<'a>>,
    groups: Vec<SubCommandGroup<'a>>,
    group_of: Vec<SubCommandGroupId>,
    names: IndexMap<String, SubCommandId>,
    listener: Option<Rc<RefCell<dyn SubCommandHolderListener>>>,
}

impl Default for SubCommandHolder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> SubCommandHolder<'a> {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            groups: Vec::new(),
            group_of: Vec::new(),
            names: IndexMap::new(),
            listener: None,
        }
    }

    pub fn set_listener(&mut self, listener: Rc<RefCell<dyn SubCommandHolderListener>>) {
        self.listener = Some(listener);
    }

    pub fn add_sub_command_group(&mut self, mut group: SubCommandGroup<'a>) -> SubCommandGroupId {
        let id = SubCommandGroupId(self.groups.len());
        group.id = id;
        group.members.clear();
        self.groups.push(group);
        tracing::trace!(group = id.0, title = %self.groups[id.0].title, "added sub-command group");
        if let Some(listener) = &self.listener {
            listener
                .borrow_mut()
                .on_add_sub_command_group(&self.groups[id.0]);
        }
        id
    }

    /// Panics on an unknown group, or when the name or an alias is taken.
    #[track_caller]
    pub fn add_sub_command(
        &mut self,
        group: SubCommandGroupId,
        command: SubCommand<'a>,
    ) -> SubCommandId {
        if group.0 >= self.groups.len() {
            panic!("unknown sub-command group {}", group.0);
        }
        for name in std::iter::once(&command.name).chain(&command.aliases) {
            if let Some(existing) = self.names.get(name) {
                panic!(
                    "conflicting sub-command name `{name}`: already used by `{}`",
                    self.commands[existing.0].name
                );
            }
        }

        let id = SubCommandId(self.commands.len());
        for name in std::iter::once(&command.name).chain(&command.aliases) {
            self.names.insert(name.clone(), id);
        }
        self.commands.push(command);
        self.group_of.push(group);
        self.groups[group.0].members.push(id);

        let command = &self.commands[id.0];
        tracing::trace!(sub_command = %command.name, group = group.0, "added sub-command");
        if let Some(listener) = &self.listener {
            listener.borrow_mut().on_add_sub_command(id, command);
        }
        id
    }

    /// Resolve a name or alias.
    pub fn resolve(&self, name: &str) -> Option<SubCommandId> {
        self.names.get(name).copied()
    }

    pub fn get(&self, id: SubCommandId) -> &SubCommand<'a> {
        &self.commands[id.0]
    }

    pub fn get_mut(&mut self, id: SubCommandId) -> &mut SubCommand<'a> {
        &mut self.commands[id.0]
    }

    pub fn group(&self, id: SubCommandGroupId) -> &SubCommandGroup<'a> {
        &self.groups[id.0]
    }

    pub fn group_of(&self, id: SubCommandId) -> &SubCommandGroup<'a> {
        &self.groups[self.group_of[id.0].0]
    }

    pub fn groups(&self) -> impl Iterator<Item = &SubCommandGroup<'a>> {
        self.groups.iter()
    }

    pub fn sub_commands(&self) -> impl Iterator<Item = (SubCommandId, &SubCommand<'a>)> {
        self.commands
            .iter()
            .enumerate()
            .map(|(idx, cmd)| (SubCommandId(idx), cmd))
    }

    /// Primary names in declaration order.
    pub fn choices(&self) -> Vec<String> {
        self.commands.iter().map(|c| c.name.clone()).collect()
    }

    pub fn is_required(&self) -> bool {
        self.groups.iter().any(|g| g.required)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Debug for SubCommandHolder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubCommandHolder")
            .field("commands", &self.commands)
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}
