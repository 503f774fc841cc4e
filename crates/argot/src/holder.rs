//! Argument containment: groups, name uniqueness and change notification.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::argument::Argument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArgumentId(usize);

impl ArgumentId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(usize);

impl GroupId {
    /// The implicit group every option lands in by default.
    pub const OPTIONS: GroupId = GroupId(0);
    /// The implicit group every positional lands in by default.
    pub const POSITIONALS: GroupId = GroupId(1);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentGroup {
    id: GroupId,
    title: String,
    description: String,
    members: Vec<ArgumentId>,
}

impl ArgumentGroup {
    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Member arguments in insertion order.
    pub fn members(&self) -> &[ArgumentId] {
        &self.members
    }
}

/// Receives holder changes as they happen.
pub trait ArgumentHolderListener {
    fn on_add_argument(&mut self, _id: ArgumentId, _argument: &Argument<'_>) {}

    fn on_add_argument_group(&mut self, _group: &ArgumentGroup) {}
}

/// Owns the arguments of one command and the groups they are shown in.
pub struct ArgumentHolder<'a> {
    arguments: Vec<Argument<'a>>,
    groups: Vec<ArgumentGroup>,
    names: IndexMap<String, ArgumentId>,
    listener: Option<Rc<RefCell<dyn ArgumentHolderListener>>>,
}

impl Default for ArgumentHolder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ArgumentHolder<'a> {
    pub fn new() -> Self {
        let implicit = |id: GroupId, title: &str| ArgumentGroup {
            id,
            title: title.to_string(),
            description: String::new(),
            members: Vec::new(),
        };
        Self {
            arguments: Vec::new(),
            groups: vec![
                implicit(GroupId::OPTIONS, "options"),
                implicit(GroupId::POSITIONALS, "positional arguments"),
            ],
            names: IndexMap::new(),
            listener: None,
        }
    }

    /// Install the listener notified of every later insertion. The caller
    /// keeps its own handle to read the listener's state.
    pub fn set_listener(&mut self, listener: Rc<RefCell<dyn ArgumentHolderListener>>) {
        self.listener = Some(listener);
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    pub fn add_argument_group(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> GroupId {
        let id = GroupId(self.groups.len());
        self.groups.push(ArgumentGroup {
            id,
            title: title.into(),
            description: description.into(),
            members: Vec::new(),
        });
        tracing::trace!(group = id.0, title = %self.groups[id.0].title, "added argument group");
        if let Some(listener) = &self.listener {
            listener.borrow_mut().on_add_argument_group(&self.groups[id.0]);
        }
        id
    }

    /// Add to the implicit options or positionals group, by name kind.
    #[track_caller]
    pub fn add_argument(&mut self, argument: impl Into<Argument<'a>>) -> ArgumentId {
        let argument = argument.into();
        let group = if argument.is_positional() {
            GroupId::POSITIONALS
        } else {
            GroupId::OPTIONS
        };
        self.add_argument_to(group, argument)
    }

    /// Panics on an unknown group or on any name already used in this holder.
    #[track_caller]
    pub fn add_argument_to(
        &mut self,
        group: GroupId,
        argument: impl Into<Argument<'a>>,
    ) -> ArgumentId {
        let mut argument = argument.into();
        if group.0 >= self.groups.len() {
            panic!("unknown argument group {}", group.0);
        }
        for name in argument.names().all() {
            if let Some(existing) = self.names.get(name) {
                panic!(
                    "conflicting argument name `{name}`: already used by `{}`",
                    self.arguments[existing.0].display_name()
                );
            }
        }

        let id = ArgumentId(self.arguments.len());
        for name in argument.names().all() {
            self.names.insert(name.to_string(), id);
        }
        argument.set_group(group);
        self.arguments.push(argument);
        self.groups[group.0].members.push(id);

        let argument = &self.arguments[id.0];
        tracing::trace!(
            argument = argument.display_name(),
            group = group.0,
            "added argument"
        );
        if let Some(listener) = &self.listener {
            listener.borrow_mut().on_add_argument(id, argument);
        }
        id
    }

    pub fn argument(&self, id: ArgumentId) -> &Argument<'a> {
        &self.arguments[id.0]
    }

    pub fn group(&self, id: GroupId) -> &ArgumentGroup {
        &self.groups[id.0]
    }

    /// All arguments in declaration order.
    pub fn arguments(&self) -> impl Iterator<Item = (ArgumentId, &Argument<'a>)> {
        self.arguments
            .iter()
            .enumerate()
            .map(|(idx, arg)| (ArgumentId(idx), arg))
    }

    pub fn groups(&self) -> impl Iterator<Item = &ArgumentGroup> {
        self.groups.iter()
    }

    pub fn arguments_in_group(
        &self,
        group: GroupId,
    ) -> impl Iterator<Item = (ArgumentId, &Argument<'a>)> {
        self.groups[group.0]
            .members
            .iter()
            .map(|&id| (id, &self.arguments[id.0]))
    }

    /// Arguments sorted by [`Argument::usage_cmp`].
    pub fn arguments_in_usage_order(&self) -> Vec<(ArgumentId, &Argument<'a>)> {
        let mut out: Vec<_> = self.arguments().collect();
        out.sort_by(|(_, a), (_, b)| a.usage_cmp(b));
        out
    }

    /// Look up an argument by any of its names.
    pub fn find(&self, name: &str) -> Option<ArgumentId> {
        self.names.get(name).copied()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Every declared name, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }
}

impl fmt::Debug for ArgumentHolder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentHolder")
            .field("arguments", &self.arguments)
            .field("groups", &self.groups)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}
