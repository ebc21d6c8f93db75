use std::{
    fmt,
    io::{self, StdinLock},
};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};
use shell_words::split;
use tracing::debug;

use crate::cli::core::{CliError, CliMode, CommandError, LoopControl, ShellContext};
use crate::cli::output::{self, info as output_info};
use crate::cli::registry::ArgKind;
use crate::core::services::PurchaseOrderService;
use crate::storage::StorageBackend;

/// Set to read commands from stdin without prompts or colour.
pub const SCRIPT_ENV: &str = "SUPPLIER_LEDGER_CLI_SCRIPT";

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };
    output::set_plain(mode == CliMode::Script);

    let mut context = ShellContext::new(mode)?;
    let mut source = match mode {
        CliMode::Interactive => {
            output_info(format!(
                "{}: {} suppliers loaded. Type `help` for commands.",
                context.config.store_name,
                context.shop.suppliers.len()
            ));
            LineSource::terminal(&context)?
        }
        CliMode::Script => LineSource::Script(io::stdin().lines()),
    };

    run_loop(&mut context, &mut source)?;

    if context.running {
        if let Err(err) = context.finish() {
            context.report_error(err)?;
        }
    }
    debug!(status = %context.status(), "shell finished");
    Ok(())
}

fn run_loop(context: &mut ShellContext, source: &mut LineSource) -> Result<(), CliError> {
    while context.running {
        match source.next_line(context)? {
            Input::Line(line) => match handle_line(context, &line) {
                Ok(LoopControl::Continue) => {}
                Ok(LoopControl::Exit) => break,
                Err(err) => context.report_error(err)?,
            },
            Input::Interrupted => {
                if context.confirm_exit()? {
                    break;
                }
            }
            Input::Closed => break,
        }
    }
    Ok(())
}

enum Input {
    Line(String),
    Interrupted,
    Closed,
}

/// Where shell lines come from: a rustyline terminal or piped stdin.
enum LineSource {
    Terminal(Box<Editor<CommandHelper, DefaultHistory>>),
    Script(io::Lines<StdinLock<'static>>),
}

impl LineSource {
    fn terminal(context: &ShellContext) -> Result<Self, CliError> {
        let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
        editor.set_helper(Some(CommandHelper::from_context(context)));
        editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);
        Ok(Self::Terminal(Box::new(editor)))
    }

    fn next_line(&mut self, context: &ShellContext) -> Result<Input, CliError> {
        match self {
            Self::Terminal(editor) => {
                if let Some(helper) = editor.helper_mut() {
                    helper.refresh(context);
                }
                match editor.readline(&context.prompt()) {
                    Ok(line) => {
                        let trimmed = line.trim();
                        if !trimmed.is_empty() {
                            editor.add_history_entry(trimmed).ok();
                        }
                        Ok(Input::Line(line))
                    }
                    Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
                    Err(ReadlineError::Eof) => {
                        output_info("Exiting shell.");
                        Ok(Input::Closed)
                    }
                    Err(err) => Err(err.into()),
                }
            }
            Self::Script(lines) => match lines.next() {
                Some(line) => Ok(Input::Line(line?)),
                None => Ok(Input::Closed),
            },
        }
    }
}

/// Runs one shell line. Blank lines and `#` comments are skipped.
pub(crate) fn handle_line(
    context: &mut ShellContext,
    line: &str,
) -> Result<LoopControl, CommandError> {
    if line.trim_start().starts_with('#') {
        return Ok(LoopControl::Continue);
    }
    let tokens = match parse_command_line(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            context.print_warning(&err.message);
            return Ok(LoopControl::Continue);
        }
    };

    if tokens.is_empty() {
        return Ok(LoopControl::Continue);
    }

    let raw = &tokens[0];
    let command = raw.to_lowercase();
    let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();

    context.last_command = Some(line.trim().to_string());

    match context.dispatch(&command, raw, &args) {
        Ok(LoopControl::Exit) => {
            context.running = false;
            Ok(LoopControl::Exit)
        }
        other => other,
    }
}

struct CommandSpec {
    name: String,
    usage_tail: &'static str,
    completes: ArgKind,
}

/// Completes command names, then the supplier, purchase order, command or
/// backup named by the first argument.
#[derive(Default)]
struct CommandHelper {
    commands: Vec<CommandSpec>,
    suppliers: Vec<String>,
    purchase_orders: Vec<String>,
    backups: Vec<String>,
}

impl CommandHelper {
    fn from_context(context: &ShellContext) -> Self {
        let mut commands: Vec<CommandSpec> = context
            .registry
            .list()
            .map(|entry| CommandSpec {
                name: entry.name.to_ascii_lowercase(),
                usage_tail: entry.usage_tail(),
                completes: entry.completes,
            })
            .collect();
        commands.sort_by(|a, b| a.name.cmp(&b.name));

        let mut helper = Self {
            commands,
            ..Self::default()
        };
        helper.refresh(context);
        helper
    }

    /// Picks up suppliers, orders and backups changed by the last command.
    fn refresh(&mut self, context: &ShellContext) {
        self.suppliers = context
            .shop
            .suppliers
            .iter()
            .map(|supplier| supplier.profile.name.clone())
            .collect();
        self.suppliers.sort_by_key(|name| name.to_lowercase());
        self.purchase_orders = PurchaseOrderService::open(&context.shop)
            .into_iter()
            .map(|order| order.short_id())
            .collect();
        self.backups = match context.storage.list_backups() {
            Ok(backups) => backups.into_iter().map(|backup| backup.name).collect(),
            Err(err) => {
                debug!(error = %err, "backup names unavailable for completion");
                Vec::new()
            }
        };
    }

    fn command(&self, name: &str) -> Option<&CommandSpec> {
        let name = name.to_ascii_lowercase();
        self.commands.iter().find(|spec| spec.name == name)
    }

    fn argument_candidates(&self, kind: ArgKind, typed: &str) -> Vec<Pair> {
        let (quoted, needle) = match typed.strip_prefix('"') {
            Some(rest) => (true, rest),
            None => (false, typed),
        };
        let needle = needle.to_lowercase();
        let values: Vec<&str> = match kind {
            ArgKind::None => return Vec::new(),
            ArgKind::Supplier => self.suppliers.iter().map(String::as_str).collect(),
            ArgKind::PurchaseOrder => {
                self.purchase_orders.iter().map(String::as_str).collect()
            }
            ArgKind::Command => self.commands.iter().map(|spec| spec.name.as_str()).collect(),
            ArgKind::Backup => self.backups.iter().map(String::as_str).collect(),
        };
        let needle = match kind {
            ArgKind::PurchaseOrder => needle.trim_start_matches('#').to_string(),
            _ => needle,
        };

        values
            .into_iter()
            .filter(|value| value.to_lowercase().starts_with(&needle))
            .map(|value| Pair {
                display: value.to_string(),
                replacement: if quoted || value.contains(char::is_whitespace) {
                    format!("\"{}\"", value)
                } else {
                    value.to_string()
                },
            })
            .collect()
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        let trimmed = prefix.trim_start();
        let leading = prefix.len() - trimmed.len();

        let Some(space_idx) = trimmed.find(char::is_whitespace) else {
            let needle = trimmed.to_ascii_lowercase();
            let candidates = self
                .commands
                .iter()
                .filter(|spec| spec.name.starts_with(&needle))
                .map(|spec| Pair {
                    display: spec.name.clone(),
                    replacement: spec.name.clone(),
                })
                .collect();
            return Ok((leading, candidates));
        };

        let Some(spec) = self.command(&trimmed[..space_idx]) else {
            return Ok((pos, Vec::new()));
        };
        let typed = trimmed[space_idx..].trim_start();
        let start = pos - typed.len();
        let finished = if let Some(inner) = typed.strip_prefix('"') {
            inner.contains('"')
        } else {
            typed.contains(char::is_whitespace)
        };
        if finished {
            return Ok((pos, Vec::new()));
        }
        Ok((start, self.argument_candidates(spec.completes, typed)))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &ReadlineContext<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        let trimmed = line.trim_start();
        let word = trimmed.strip_suffix(' ')?;
        if word.contains(char::is_whitespace) {
            return None;
        }
        self.command(word)
            .map(|spec| spec.usage_tail)
            .filter(|tail| !tail.is_empty())
            .map(str::to_string)
    }
}

impl Highlighter for CommandHelper {}

impl Validator for CommandHelper {}

pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, ParseError> {
    split(input).map_err(|err| ParseError {
        message: err.to_string(),
    })
}

#[derive(Debug)]
pub(crate) struct ParseError {
    message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
