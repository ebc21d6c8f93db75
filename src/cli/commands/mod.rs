pub mod entry;
pub mod purchase;
pub mod storage;
pub mod supplier;
pub mod system;

use chrono::NaiveDate;

use crate::cli::core::CommandError;
use crate::cli::registry::CommandRegistry;

pub(crate) fn register_all(registry: &mut CommandRegistry) {
    for entry in system::definitions()
        .into_iter()
        .chain(supplier::definitions())
        .chain(entry::definitions())
        .chain(purchase::definitions())
        .chain(storage::definitions())
    {
        registry.register(entry);
    }
}

/// Positional arguments plus `--name value` options and bare `--flag`s.
#[derive(Debug, Default)]
pub(crate) struct ParsedArgs<'a> {
    pub positionals: Vec<&'a str>,
    options: Vec<(&'static str, &'a str)>,
    flags: Vec<&'static str>,
}

impl<'a> ParsedArgs<'a> {
    pub fn option(&self, name: &str) -> Option<&'a str> {
        self.options
            .iter()
            .rev()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    pub fn flag(&self, name: &str) -> bool {
        self.flags.contains(&name)
    }

    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    /// Remaining positionals from `start`, joined with spaces.
    pub fn joined_from(&self, start: usize) -> Option<String> {
        let rest = self.positionals.get(start..)?;
        (!rest.is_empty()).then(|| rest.join(" "))
    }
}

pub(crate) fn parse_args<'a>(
    args: &[&'a str],
    options: &[&'static str],
    flags: &[&'static str],
) -> Result<ParsedArgs<'a>, CommandError> {
    let mut parsed = ParsedArgs::default();
    let mut iter = args.iter().copied();
    while let Some(arg) = iter.next() {
        let Some(name) = arg.strip_prefix("--").filter(|name| !name.is_empty()) else {
            parsed.positionals.push(arg);
            continue;
        };
        let (name, inline) = match name.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (name, None),
        };
        if let Some(known) = options.iter().find(|option| **option == name) {
            let value = match inline {
                Some(value) => value,
                None => iter.next().ok_or_else(|| {
                    CommandError::InvalidArguments(format!("`--{}` needs a value", name))
                })?,
            };
            parsed.options.push((*known, value));
        } else if let Some(known) = flags.iter().find(|flag| **flag == name) {
            parsed.flags.push(*known);
        } else {
            return Err(CommandError::InvalidArguments(format!(
                "unknown option `--{}`",
                name
            )));
        }
    }
    Ok(parsed)
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{}` (use YYYY-MM-DD)", value))
    })
}

/// Converts a 1-based index as shown in listings into a position.
pub(crate) fn parse_index(value: &str, len: usize) -> Result<usize, CommandError> {
    let index: usize = value.parse().map_err(|_| {
        CommandError::InvalidArguments(format!("`{}` is not a valid index", value))
    })?;
    if index == 0 || index > len {
        return Err(CommandError::InvalidArguments(format!(
            "index {} out of range (1-{})",
            index, len
        )));
    }
    Ok(index - 1)
}

pub(crate) fn usage(text: &str) -> CommandError {
    CommandError::InvalidArguments(format!("usage: {}", text))
}
