// File: ./src/cli.rs
//! Command-line parsing, help text and plain-text renderings used outside the TUI.

use crate::calendar::{WEEKDAY_LABELS, bucket_by_due_date, month_grid, month_label};
use crate::model::{Board, Card};
use chrono::{Datelike, NaiveDate};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Tui,
    Help,
    Login,
    Logout,
    Boards,
    /// Month to print; `None` means the current one.
    Calendar(Option<NaiveDate>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub root: Option<PathBuf>,
    pub command: Command,
}

/// Parses `YYYY-MM` into the first day of that month.
pub fn parse_month(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d").ok()
}

/// Parses the arguments after the binary name.
pub fn parse_args<I, S>(args: I) -> Result<CliArgs, String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut root = None;
    let mut positional = Vec::new();
    let mut iter = args.into_iter().map(Into::into);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" | "help" => {
                return Ok(CliArgs {
                    root,
                    command: Command::Help,
                });
            }
            "-r" | "--root" => {
                let path = iter
                    .next()
                    .ok_or_else(|| "--root needs a path".to_string())?;
                root = Some(PathBuf::from(path));
            }
            _ => positional.push(arg),
        }
    }

    let command = match positional.first().map(String::as_str) {
        None => Command::Tui,
        Some("login") => Command::Login,
        Some("logout") => Command::Logout,
        Some("boards") => Command::Boards,
        Some("calendar") => match positional.get(1) {
            None => Command::Calendar(None),
            Some(raw) => Command::Calendar(Some(
                parse_month(raw).ok_or_else(|| format!("Expected YYYY-MM, got '{}'", raw))?,
            )),
        },
        Some(other) => return Err(format!("Unknown command '{}'", other)),
    };

    Ok(CliArgs { root, command })
}

pub fn print_help(binary_name: &str) {
    println!(
        "Tablero v{} - course boards, tasks and deadlines in your terminal",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [--root <path>]", binary_name);
    println!("    {} login", binary_name);
    println!("    {} logout", binary_name);
    println!("    {} boards", binary_name);
    println!("    {} calendar [YYYY-MM]", binary_name);
    println!("    {} --help", binary_name);
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("COMMANDS:");
    println!("    login                 Ask for credentials and store the session");
    println!("    logout                Forget the stored session");
    println!("    boards                List the courses you can see");
    println!("    calendar [YYYY-MM]    Print a month with the number of cards due per day");
    println!();
    println!("KEYBINDINGS:");
    println!("    1-4 / Tab             Courses, Board, Calendar, Tasks");
    println!("    h j k l               Move around");
    println!("    Space / Enter         Pick up a card / drop it");
    println!("    End / G               Drop the card at the end of the column");
    println!("    [ ]                   Previous / next month");
    println!("    n                     New card: title | due | priority | description");
    println!("    p                     Courses: new course from a template (teachers)");
    println!("    f d a                 Tasks: assignee filter, due window, pick assignees");
    println!("    t                     Toggle dark/light theme");
    println!("    r                     Reload");
    println!("    q                     Quit");
}

/// Month as a text grid. Each day shows how many cards are due, `·` for
/// days of neighbouring months.
pub fn format_month(reference: NaiveDate, cards: &[Card]) -> String {
    let buckets = bucket_by_due_date(cards);
    let mut out = String::new();
    out.push_str(&format!("{:^35}\n", month_label(reference)));
    for label in WEEKDAY_LABELS {
        out.push_str(&format!("{:>5}", label));
    }
    out.push('\n');

    for week in month_grid(reference).chunks(7) {
        for cell in week {
            if !cell.in_month {
                out.push_str(&format!("{:>5}", "·"));
                continue;
            }
            match buckets.get(&cell.key()).map(Vec::len) {
                Some(n) => out.push_str(&format!("{:>3}*{}", cell.date.day(), n.min(9))),
                None => out.push_str(&format!("{:>5}", cell.date.day())),
            }
        }
        out.push('\n');
    }
    out
}

pub fn format_boards(boards: &[Board]) -> String {
    if boards.is_empty() {
        return "No courses yet.\n".to_string();
    }
    boards
        .iter()
        .map(|b| {
            format!(
                "{:>5}  {:<30} {:>3} members\n",
                b.id,
                b.name,
                b.members.len()
            )
        })
        .collect()
}
