// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Text/JSON rendering shared across command handlers.

use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Prints a single entity: pretty JSON in `Json` mode, or the caller's
/// one-line text rendering in `Text` mode.
pub fn print_one<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce(&T) -> String) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => println!("{}", text(value)),
    }
    Ok(())
}

/// Prints a list of entities: a JSON array, or one line of `text` per row
/// (plus a "no X found" message when the list is empty).
pub fn print_list<T: Serialize>(
    format: OutputFormat,
    values: &[T],
    empty_message: &str,
    text: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(values)?),
        OutputFormat::Text => {
            if values.is_empty() {
                println!("{empty_message}");
            } else {
                for value in values {
                    println!("{}", text(value));
                }
            }
        }
    }
    Ok(())
}
