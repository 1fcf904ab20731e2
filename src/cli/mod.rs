//! CLI Module for console-rules
//!
//! One-shot commands against the same storage the terminal UI uses, for scripting
//! and quick edits without launching the full TUI.

pub mod commands;

use std::error::Error;

use colored::Colorize;
use console_rules::Session;

/// Executes CLI commands based on the provided arguments
pub async fn execute_cli(args: &[String], session: &mut Session) -> Result<(), Box<dyn Error>> {
    if args.is_empty() {
        print_help();
        return Ok(());
    }

    let mut rest: Vec<String> = args[1..].to_vec();
    let name = take_option(&mut rest, "--name");
    let file = take_option(&mut rest, "--file");

    match args[0].as_str() {
        "list" | "ls" => commands::list_snippets(session, rest.first().map(String::as_str)),
        "show" | "view" | "cat" => {
            let Some(target) = require(&rest, "show <ID|NAME>") else {
                return Ok(());
            };
            commands::show_snippet(session, target);
        }
        "new" => {
            let name = name.or_else(|| rest.first().cloned());
            commands::new_snippet(session, name, file).await?;
        }
        "save" => {
            let Some(target) = require(&rest, "save <ID|NAME> [--name NAME] [--file FILE]") else {
                return Ok(());
            };
            commands::save_snippet(session, target, name, file).await?;
        }
        "dup" | "duplicate" => {
            let Some(target) = require(&rest, "dup <ID|NAME>") else {
                return Ok(());
            };
            commands::duplicate_snippet(session, target).await?;
        }
        "rm" | "delete" => {
            let Some(target) = require(&rest, "rm <ID|NAME>") else {
                return Ok(());
            };
            commands::remove_snippet(session, target).await?;
        }
        "mv" | "move" => {
            if rest.len() < 2 {
                print_usage("mv <ID|NAME> <INDEX>");
                return Ok(());
            }
            let index: usize = rest[1]
                .parse()
                .map_err(|_| format!("invalid index: {}", rest[1]))?;
            commands::move_snippet(session, &rest[0], index).await?;
        }
        "run" => {
            let Some(target) = require(&rest, "run <ID|NAME>") else {
                return Ok(());
            };
            commands::run_snippet(session, target).await?;
        }
        "export" => commands::export_snippets(session, rest.first().map(String::as_str)).await?,
        "import" => {
            let Some(path) = require(&rest, "import <PATH>") else {
                return Ok(());
            };
            commands::import_snippets(session, path).await?;
        }
        "lang" | "language" => {
            commands::language(session, rest.first().map(String::as_str)).await?;
        }
        "highlight" => {
            let Some(path) = require(&rest, "highlight <FILE>") else {
                return Ok(());
            };
            commands::highlight_file(path)?;
        }
        "help" | "--help" | "-h" => print_help(),
        _ => {
            println!("{}  Unknown command: {}", "┃".bright_magenta(), args[0]);
            print_help();
        }
    }

    Ok(())
}

/// Removes `--flag` from `args`, returning whether it was present.
pub fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|arg| arg != flag);
    args.len() != before
}

/// Removes `--option VALUE` (or `--option=VALUE`) from `args`, returning the value.
pub fn take_option(args: &mut Vec<String>, option: &str) -> Option<String> {
    let prefix = format!("{option}=");
    if let Some(index) = args.iter().position(|arg| arg.starts_with(&prefix)) {
        let arg = args.remove(index);
        return Some(arg[prefix.len()..].to_string());
    }

    let index = args.iter().position(|arg| arg == option)?;
    if index + 1 >= args.len() {
        args.remove(index);
        return None;
    }
    let value = args.remove(index + 1);
    args.remove(index);
    Some(value)
}

fn require<'a>(args: &'a [String], usage: &str) -> Option<&'a str> {
    match args.first() {
        Some(arg) => Some(arg.as_str()),
        None => {
            print_usage(usage);
            None
        }
    }
}

fn print_usage(usage: &str) {
    println!("{}  Error: Missing argument", "┃".bright_magenta());
    println!("{}  Usage: console-rules {usage}", "┃".bright_magenta());
}

/// Prints the help message with available commands
fn print_help() {
    let commands = [
        ("list, ls [FILTER]", "List snippets, optionally filtered by name"),
        ("show, view <ID|NAME>", "Display a snippet with highlighting"),
        ("new [NAME] [--file FILE]", "Create a snippet, code read from FILE"),
        ("save <ID|NAME> [--name N] [--file F]", "Update the name and/or code"),
        ("dup <ID|NAME>", "Duplicate a snippet"),
        ("rm <ID|NAME>", "Delete a snippet"),
        ("mv <ID|NAME> <INDEX>", "Move a snippet to a position (0 = top)"),
        ("run <ID|NAME>", "Run a snippet with the configured interpreter"),
        ("export [PATH]", "Write all snippets to an export file"),
        ("import <PATH>", "Import snippets from an export or JSON array"),
        ("lang [en|pt]", "Show or change the language"),
        ("highlight <FILE>", "Print highlighted HTML markup for a file"),
        ("help", "Display this help message"),
    ];

    println!(
        "{}  {}",
        "┃".bright_magenta(),
        "CONSOLE RULES - SNIPPET MANAGER".bold()
    );
    println!("{}  {}", "┃".bright_magenta(), "USAGE:".bright_yellow());
    println!(
        "{}  console-rules [--ephemeral] [COMMAND] [ARGS]",
        "┃".bright_magenta()
    );
    println!("{}  {}", "┃".bright_magenta(), "COMMANDS:".bright_yellow());
    for (command, description) in commands {
        println!(
            "{}  {:<38} {}",
            "┃".bright_magenta(),
            command.bright_white(),
            description
        );
    }

    println!("{}  {}", "┃".bright_magenta(), "TIP:".bright_green());
    println!(
        "{}  Run with no arguments to launch the full TUI (Terminal User Interface) mode",
        "┃".bright_magenta()
    );
    println!(
        "{}  --ephemeral keeps everything in memory for this run",
        "┃".bright_magenta()
    );
}
