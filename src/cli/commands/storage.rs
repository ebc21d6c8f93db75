use std::path::Path;

use crate::cli::commands::{parse_args, usage};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output::{self, section as output_section};
use crate::cli::registry::{ArgKind, CommandEntry};
use crate::core::services::LedgerService;
use crate::ledger::ShopData;
use crate::storage::{integrity_warnings, StorageBackend};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("save", "Write all data to disk", "save", cmd_save),
        CommandEntry::new(
            "export",
            "Export all data to a JSON file",
            "export <path>",
            cmd_export,
        ),
        CommandEntry::new(
            "import",
            "Replace current data with an exported JSON file",
            "import <path> [--yes]",
            cmd_import,
        ),
        CommandEntry::new(
            "backup",
            "Snapshot current data into the backups folder",
            "backup [note]",
            cmd_backup,
        ),
        CommandEntry::new("backups", "List backups, newest first", "backups", cmd_backups),
        CommandEntry::new(
            "restore",
            "Restore a backup by number or name",
            "restore <#|name> [--yes]",
            cmd_restore,
        )
        .completes(ArgKind::Backup),
        CommandEntry::new(
            "verify",
            "Check every supplier balance against its ledger",
            "verify",
            cmd_verify,
        ),
        CommandEntry::new("usage", "Show storage usage", "usage", cmd_usage),
        CommandEntry::new(
            "reset",
            "Delete all stored data",
            "reset [--yes]",
            cmd_reset,
        ),
    ]
}

fn cmd_save(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.save()
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [path] = args else {
        return Err(usage("export <path>"));
    };
    context.storage.export_to(&context.shop, Path::new(path))?;
    output::success(format!("Exported to {}", path));
    Ok(())
}

fn cmd_import(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = parse_args(args, &[], &["yes"])?;
    let [path] = parsed.positionals[..] else {
        return Err(usage("import <path> [--yes]"));
    };
    // Validate the file before asking to replace anything.
    let report = context.storage.import_from(Path::new(path))?;
    if has_data(&context.shop)
        && !context.confirm(
            "Importing replaces all current suppliers and orders. Continue?",
            parsed.flag("yes"),
        )?
    {
        output::info("Operation cancelled.");
        return Ok(());
    }
    let suppliers = report.data.suppliers.len();
    context.replace_shop(report);
    context.mark_dirty();
    output::success(format!("Imported {} supplier(s) from {}", suppliers, path));
    context.print_hint("Use `save` to keep the imported data.");
    Ok(())
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = (!args.is_empty()).then(|| args.join(" "));
    let info = context.storage.backup(&context.shop, note.as_deref())?;
    output::success(format!("Backup created: {}", info.name));
    Ok(())
}

fn cmd_backups(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let backups = context.storage.list_backups()?;
    if backups.is_empty() {
        output::warning("No backups available.");
        return Ok(());
    }
    output::info("Available backups:");
    for (idx, backup) in backups.iter().enumerate() {
        let when = backup
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown time".into());
        let note = backup
            .note
            .as_deref()
            .map(|note| format!(" [{}]", note))
            .unwrap_or_default();
        output::info(format!("  {:>2}. {} ({}){}", idx + 1, backup.name, when, note));
    }
    Ok(())
}

fn cmd_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = parse_args(args, &[], &["yes"])?;
    let [reference] = parsed.positionals[..] else {
        return Err(usage("restore <#|name> [--yes]"));
    };
    let backups = context.storage.list_backups()?;
    if backups.is_empty() {
        return Err(CommandError::InvalidArguments(
            "no backups available to restore".into(),
        ));
    }
    let target = match reference.parse::<usize>() {
        Ok(index) => backups
            .get(index.saturating_sub(1))
            .filter(|_| index > 0)
            .ok_or_else(|| {
                CommandError::InvalidArguments(format!("backup index {} out of range", index))
            })?,
        Err(_) => backups
            .iter()
            .find(|candidate| candidate.name == reference)
            .or_else(|| {
                backups
                    .iter()
                    .find(|candidate| candidate.name.contains(reference))
            })
            .ok_or_else(|| {
                CommandError::InvalidArguments(format!(
                    "no backup matches reference `{}`",
                    reference
                ))
            })?,
    };
    let name = target.name.clone();

    if !context.confirm(
        &format!("Replace current data with backup `{}`?", name),
        parsed.flag("yes"),
    )? {
        output::info("Operation cancelled.");
        return Ok(());
    }
    let report = context.storage.restore(&name)?;
    context.replace_shop(report);
    context.dirty = false;
    output::success(format!("Restored backup `{}`.", name));
    Ok(())
}

fn cmd_verify(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output_section("Ledger verification");
    let drifts = LedgerService::audit(&context.shop);
    for (id, drift) in &drifts {
        let name = context
            .shop
            .supplier(*id)
            .map(|supplier| supplier.name().to_string())
            .unwrap_or_else(|| id.to_string());
        output::warning(format!(
            "`{}`: stored balance {} but ledger sums to {} (off by {})",
            name,
            context.money(drift.stored_cents),
            context.money(drift.computed_cents),
            context.money(drift.difference_cents())
        ));
    }
    let other = integrity_warnings(&context.shop);
    for warning in &other {
        output::warning(warning);
    }

    if drifts.is_empty() && other.is_empty() {
        output::success(format!(
            "All {} supplier ledger(s) reconcile.",
            context.shop.suppliers.len()
        ));
    } else if !drifts.is_empty() {
        context.print_hint("Run `supplier-repair <supplier>` to rebuild a balance from its ledger.");
    }
    Ok(())
}

fn cmd_usage(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let size = context.storage.usage()?;
    let entries: usize = context
        .shop
        .suppliers
        .iter()
        .map(|supplier| supplier.account().len())
        .sum();
    output::info(format!("Store file   : {}", context.storage.store_path().display()));
    output::info(format!("Size on disk : {}", size));
    output::info(format!(
        "Records      : {} supplier(s), {} ledger entries, {} purchase order(s)",
        context.shop.suppliers.len(),
        entries,
        context.shop.purchase_orders.len()
    ));
    Ok(())
}

fn cmd_reset(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = parse_args(args, &[], &["yes"])?;
    if !parsed.positionals.is_empty() {
        return Err(usage("reset [--yes]"));
    }
    if !context.confirm(
        "Delete ALL suppliers, ledgers and purchase orders? This cannot be undone.",
        parsed.flag("yes"),
    )? {
        output::info("Operation cancelled.");
        return Ok(());
    }
    context.storage.clear()?;
    context.shop = ShopData::new();
    context.dirty = false;
    output::success("All data cleared.");
    Ok(())
}

fn has_data(shop: &ShopData) -> bool {
    !shop.suppliers.is_empty() || !shop.purchase_orders.is_empty()
}
