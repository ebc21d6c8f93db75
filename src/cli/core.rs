//! Core CLI dispatch, error types, and shell context helpers.

use std::io;

use chrono::{Local, NaiveDate};
use dialoguer::{theme::ColorfulTheme, Confirm};
use rustyline::error::ReadlineError;
use strsim::levenshtein;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::{Config, ConfigManager},
    core::services::{ServiceError, SupplierService},
    currency::format_money,
    errors::LedgerError,
    ledger::ShopData,
    storage::{JsonStorage, LoadReport, StorageBackend},
};

use super::commands;
use super::output;
use super::registry::{CommandEntry, CommandRegistry};
pub use super::shell_context::{CliMode, ShellContext};

const PROMPT_NAME: &str = "supplier-ledger";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

/// Failures that abort the shell itself.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Storage(#[from] LedgerError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Readline(#[from] ReadlineError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
}

/// Failures of a single command; reported and the shell keeps running.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Storage(#[from] LedgerError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let config_manager = ConfigManager::new()?;
        let config = config_manager.load()?;
        let storage = JsonStorage::new(None, Some(config.backup_retention))?;
        Self::with_parts(mode, storage, config_manager, config)
    }

    pub(crate) fn with_parts(
        mode: CliMode,
        storage: JsonStorage,
        config_manager: ConfigManager,
        config: Config,
    ) -> Result<Self, CliError> {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let report = storage.load()?;

        let mut context = ShellContext {
            mode,
            registry,
            theme: ColorfulTheme::default(),
            storage,
            config_manager,
            config,
            shop: ShopData::new(),
            dirty: false,
            last_command: None,
            running: true,
        };
        context.replace_shop(report);
        Ok(context)
    }

    pub(crate) fn prompt(&self) -> String {
        let marker = if self.dirty { "*" } else { "" };
        format!("{PROMPT_NAME}[{}]{marker}> ", self.config.store_name)
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let best = self
            .registry
            .names()
            .map(|key| (levenshtein(key, &needle), key))
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = best {
            if distance <= 3 {
                output::info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(self.ask("Exit shell?", true)?)
    }

    fn ask(&self, prompt: &str, default: bool) -> Result<bool, dialoguer::Error> {
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                self.print_error(&message);
                self.print_hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Service(ServiceError::SupplierNotFound(name)) => {
                self.print_error(&format!("Supplier not found: {}", name));
                self.print_hint("Use `supplier-list` to see registered suppliers.");
                Ok(())
            }
            other => {
                self.print_error(&other.to_string());
                Ok(())
            }
        }
    }

    pub(crate) fn print_error(&self, message: &str) {
        output::error(message);
    }

    pub(crate) fn print_warning(&self, message: &str) {
        output::warning(message);
    }

    pub(crate) fn print_hint(&self, message: &str) {
        output::hint(message);
    }

    /// Asks before a destructive action. Script mode never prompts and
    /// proceeds only when `--yes` was passed.
    pub(crate) fn confirm(&self, prompt: &str, assume_yes: bool) -> Result<bool, CommandError> {
        if assume_yes {
            return Ok(true);
        }
        match self.mode {
            CliMode::Interactive => Ok(self.ask(prompt, false)?),
            CliMode::Script => Err(CommandError::InvalidArguments(format!(
                "{} Re-run with `--yes` to confirm.",
                prompt
            ))),
        }
    }

    pub(crate) fn money(&self, cents: i64) -> String {
        format_money(cents, &self.config.currency_symbol)
    }

    pub(crate) fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    pub(crate) fn supplier_id(&self, key: &str) -> Result<Uuid, CommandError> {
        Ok(SupplierService::resolve(&self.shop, key)?.id)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Swaps in freshly loaded data and surfaces its integrity warnings.
    pub(crate) fn replace_shop(&mut self, report: LoadReport) {
        for warning in &report.warnings {
            output::warning(warning);
        }
        if !report.warnings.is_empty() {
            self.print_hint("Run `verify` for details or `supplier-repair <supplier>` to fix balances.");
        }
        self.shop = report.data;
    }

    pub(crate) fn save(&mut self) -> CommandResult {
        let path = self.storage.save(&self.shop)?;
        self.dirty = false;
        output::success(format!("Saved to {}", path.display()));
        Ok(())
    }

    /// Handles unsaved changes when the session ends.
    pub(crate) fn finish(&mut self) -> CommandResult {
        if !self.dirty {
            return Ok(());
        }
        match self.mode {
            CliMode::Interactive => {
                if self.ask("Save changes before exiting?", true)? {
                    self.save()?;
                }
            }
            CliMode::Script => {
                output::warning("Unsaved changes discarded. Use `save` to keep them.");
            }
        }
        self.dirty = false;
        Ok(())
    }
}
