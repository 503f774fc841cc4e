use argot::{ArgumentParser, SubCommand, SubCommandGroup};

use crate::error::SchemaError;
use crate::model::CommandSchema;
use crate::slots::SlotTable;

/// Declare every argument of `schema` on a new parser, with destinations
/// pointing into `slots`.
///
/// `slots` must come from [`SlotTable::allocate`] on the same schema.
pub fn bind<'a>(
    schema: &CommandSchema,
    slots: &'a mut SlotTable,
) -> Result<ArgumentParser<'a>, SchemaError> {
    let SlotTable {
        entries,
        sub_commands,
        command,
    } = slots;
    if entries.len() != schema.args.len() || sub_commands.len() != schema.subcommands.len() {
        return Err(SchemaError::TableMismatch);
    }

    let mut parser =
        ArgumentParser::new(schema.name.clone()).description(schema.description.clone());
    if let Some(version) = &schema.version {
        parser = parser.version(version.clone());
    }
    for entry in entries.iter_mut() {
        parser.add_argument(entry.builder()?);
    }

    if !schema.subcommands.is_empty() {
        let group = parser.add_sub_command_group(
            SubCommandGroup::new("commands")
                .dest(command)
                .required(schema.subcommand_required),
        );
        for (sub_schema, table) in schema.subcommands.iter().zip(sub_commands.iter_mut()) {
            if sub_schema.name != table.name || sub_schema.args.len() != table.entries.len() {
                return Err(SchemaError::TableMismatch);
            }
            let mut sub = SubCommand::new(sub_schema.name.clone()).help(sub_schema.help.clone());
            for alias in &sub_schema.aliases {
                sub = sub.alias(alias.clone());
            }
            for entry in table.entries.iter_mut() {
                sub.add_argument(entry.builder()?);
            }
            parser.add_sub_command(group, sub);
        }
    }

    tracing::debug!(command = %schema.name, "bound schema onto parser");
    Ok(parser)
}
