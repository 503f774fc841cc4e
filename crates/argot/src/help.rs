//! Usage and help rendering.

use crate::argument::Argument;
use crate::holder::{ArgumentHolder, GroupId};
use crate::subcommand::SubCommandHolder;

/// Render `usage: prog ...` with arguments in usage order.
pub fn format_usage(
    prog: &str,
    holder: &ArgumentHolder<'_>,
    sub_commands: &SubCommandHolder<'_>,
) -> String {
    let mut parts = vec![format!("usage: {prog}")];
    parts.extend(
        holder
            .arguments_in_usage_order()
            .into_iter()
            .map(|(_, argument)| usage_token(argument)),
    );
    if !sub_commands.is_empty() {
        parts.push(format!("{{{}}} ...", sub_commands.choices().join(",")));
    }
    let mut out = parts.join(" ");
    out.push('\n');
    out
}

/// Render the full help: usage, description, one section per non-empty
/// argument group, then one per sub-command group.
pub fn format_help(
    prog: &str,
    description: &str,
    holder: &ArgumentHolder<'_>,
    sub_commands: &SubCommandHolder<'_>,
) -> String {
    let mut out = format_usage(prog, holder, sub_commands);

    if !description.trim().is_empty() {
        out.push('\n');
        out.push_str(description.trim_end());
        out.push('\n');
    }

    let groups = [GroupId::POSITIONALS, GroupId::OPTIONS]
        .into_iter()
        .map(|id| holder.group(id))
        .chain(holder.groups().skip(2));
    for group in groups {
        let rows: Vec<(String, String)> = holder
            .arguments_in_group(group.id())
            .map(|(_, argument)| (row_left(argument), row_help(argument)))
            .collect();
        write_section(&mut out, group.title(), group.description(), &rows);
    }

    for group in sub_commands.groups() {
        let rows: Vec<(String, String)> = group
            .members()
            .iter()
            .map(|&id| {
                let command = sub_commands.get(id);
                let left = if command.aliases().is_empty() {
                    command.name().to_string()
                } else {
                    format!("{} ({})", command.name(), command.aliases().join(", "))
                };
                (left, command.help_text().to_string())
            })
            .collect();
        write_section(&mut out, group.title(), group.description_text(), &rows);
    }

    out
}

fn usage_token(argument: &Argument<'_>) -> String {
    let num_args = argument.num_args();
    if argument.is_positional() {
        return num_args.format_metavar(argument.display_name());
    }

    let name = argument
        .names()
        .short_names()
        .next()
        .unwrap_or(argument.display_name());
    let token = if argument.takes_values() {
        format!("{name} {}", num_args.format_metavar(argument.metavar()))
    } else {
        name.to_string()
    };
    if argument.is_required() {
        token
    } else {
        format!("[{token}]")
    }
}

fn row_left(argument: &Argument<'_>) -> String {
    if argument.is_positional() {
        return argument.display_name().to_string();
    }
    let names = argument.names();
    let mut left = names
        .short_names()
        .chain(names.long_names())
        .collect::<Vec<_>>()
        .join(", ");
    if argument.takes_values() {
        left.push(' ');
        left.push_str(&argument.num_args().format_metavar(argument.metavar()));
    }
    left
}

fn row_help(argument: &Argument<'_>) -> String {
    let mut help = argument.help().trim().to_string();
    if argument.takes_values() {
        if let Some(hint) = argument.type_hint() {
            push_word(&mut help, &format!("({hint})"));
        }
        if let Some(default) = argument.format_default() {
            push_word(&mut help, &format!("[default: {default}]"));
        }
    }
    help
}

fn push_word(out: &mut String, word: &str) {
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(word);
}

fn write_section(out: &mut String, title: &str, description: &str, rows: &[(String, String)]) {
    if rows.is_empty() {
        return;
    }
    out.push_str(&format!("\n{title}:\n"));
    if !description.trim().is_empty() {
        out.push_str(&format!("  {}\n\n", description.trim()));
    }
    let width = rows.iter().map(|(left, _)| left.len()).max().unwrap_or(0);
    for (left, help) in rows {
        if help.is_empty() {
            out.push_str(&format!("  {left}\n"));
        } else {
            out.push_str(&format!("  {left:width$}  {help}\n"));
        }
    }
}
