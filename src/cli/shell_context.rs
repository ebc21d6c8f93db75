//! Shared runtime state for the shell and command handlers.

use dialoguer::theme::ColorfulTheme;

use crate::{
    config::{Config, ConfigManager},
    ledger::ShopData,
    storage::JsonStorage,
};

use super::registry::CommandRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub theme: ColorfulTheme,
    pub storage: JsonStorage,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub shop: ShopData,
    /// Set when `shop` holds changes that have not been saved.
    pub dirty: bool,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn status(&self) -> String {
        format!(
            "ShellContext {{ running: {}, last_command: {:?}, suppliers: {}, unsaved: {} }}",
            self.running,
            self.last_command,
            self.shop.suppliers.len(),
            self.dirty
        )
    }
}
