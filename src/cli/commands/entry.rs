use uuid::Uuid;

use crate::cli::commands::{parse_args, parse_date, parse_index, usage};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::{ArgKind, CommandEntry};
use crate::core::services::LedgerService;
use crate::currency::parse_amount;
use crate::ledger::{EntryDraft, EntryKind, ParseEntryKindError};

const ADD_USAGE: &str =
    "entry-add <supplier> <invoice|payment|return> <amount> <description> [--ref REF] [--date YYYY-MM-DD]";
const EDIT_USAGE: &str = "entry-edit <supplier> <#> [--type KIND] [--amount N] [--desc TEXT] [--ref REF] [--date YYYY-MM-DD]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "entry-add",
            "Post an invoice, payment or return to a supplier",
            ADD_USAGE,
            cmd_add,
        )
        .completes(ArgKind::Supplier),
        CommandEntry::new(
            "entry-edit",
            "Change a ledger entry; the balance is re-reconciled",
            EDIT_USAGE,
            cmd_edit,
        )
        .completes(ArgKind::Supplier),
        CommandEntry::new(
            "entry-delete",
            "Delete a ledger entry and reverse its effect",
            "entry-delete <supplier> <#> [--yes]",
            cmd_delete,
        )
        .completes(ArgKind::Supplier),
    ]
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = parse_args(args, &["ref", "date"], &[])?;
    let (Some(supplier), Some(kind), Some(amount)) = (
        parsed.positionals.first(),
        parsed.positionals.get(1),
        parsed.positionals.get(2),
    ) else {
        return Err(usage(ADD_USAGE));
    };
    let supplier_id = context.supplier_id(supplier)?;
    let kind = parse_kind(kind)?;
    let date = match parsed.option("date") {
        Some(value) => parse_date(value)?,
        None => context.today(),
    };

    // Unparseable amounts go through as missing so the reconciler rejects them.
    let draft = EntryDraft {
        date,
        kind,
        description: parsed.joined_from(3).unwrap_or_default(),
        amount: parse_amount(amount),
        reference: parsed.option("ref").map(str::to_string),
    };
    let entry_id = LedgerService::post_entry(&mut context.shop, supplier_id, &draft)?;
    context.mark_dirty();
    report_posting(context, supplier_id, entry_id, "posted");
    Ok(())
}

fn cmd_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = parse_args(args, &["type", "amount", "desc", "ref", "date"], &[])?;
    let [supplier, index] = parsed.positionals[..] else {
        return Err(usage(EDIT_USAGE));
    };
    if !parsed.has_options() {
        return Err(CommandError::InvalidArguments(
            "nothing to change; pass at least one of --type, --amount, --desc, --ref, --date"
                .into(),
        ));
    }
    let supplier_id = context.supplier_id(supplier)?;
    let (entry_id, mut draft) = locate_entry(context, supplier_id, index)?;

    if let Some(kind) = parsed.option("type") {
        draft.kind = parse_kind(kind)?;
    }
    if let Some(amount) = parsed.option("amount") {
        draft.amount = parse_amount(amount);
    }
    if let Some(description) = parsed.option("desc") {
        draft.description = description.to_string();
    }
    if let Some(reference) = parsed.option("ref") {
        draft.reference = Some(reference.to_string());
    }
    if let Some(date) = parsed.option("date") {
        draft.date = parse_date(date)?;
    }

    LedgerService::revise_entry(&mut context.shop, supplier_id, entry_id, &draft)?;
    context.mark_dirty();
    report_posting(context, supplier_id, entry_id, "updated");
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = parse_args(args, &[], &["yes"])?;
    let [supplier, index] = parsed.positionals[..] else {
        return Err(usage("entry-delete <supplier> <#> [--yes]"));
    };
    let supplier_id = context.supplier_id(supplier)?;
    let (entry_id, draft) = locate_entry(context, supplier_id, index)?;

    let prompt = format!(
        "Delete {} `{}` and reverse its effect on the balance?",
        draft.kind.label().to_lowercase(),
        draft.description
    );
    if !context.confirm(&prompt, parsed.flag("yes"))? {
        output::info("Operation cancelled.");
        return Ok(());
    }

    LedgerService::remove_entry(&mut context.shop, supplier_id, entry_id)?;
    context.mark_dirty();
    let balance = context
        .shop
        .supplier(supplier_id)
        .map(|supplier| (supplier.balance_cents(), supplier.account().status()));
    if let Some((cents, status)) = balance {
        output::success(format!(
            "Entry deleted. Balance: {} ({})",
            context.money(cents.abs()),
            status.label()
        ));
    }
    Ok(())
}

fn parse_kind(value: &str) -> Result<EntryKind, CommandError> {
    value
        .parse()
        .map_err(|err: ParseEntryKindError| {
            CommandError::InvalidArguments(err.to_string())
        })
}

/// Resolves a 1-based statement index to the entry id and an edit draft.
fn locate_entry(
    context: &ShellContext,
    supplier_id: Uuid,
    index: &str,
) -> Result<(Uuid, EntryDraft), CommandError> {
    let account = context
        .shop
        .supplier(supplier_id)
        .map(|supplier| supplier.account())
        .ok_or_else(|| CommandError::Message("supplier disappeared".into()))?;
    if account.is_empty() {
        return Err(CommandError::InvalidArguments(
            "this supplier has no ledger entries".into(),
        ));
    }
    let position = parse_index(index, account.len())?;
    let entry = &account.entries()[position];
    Ok((entry.id, EntryDraft::from_entry(entry)))
}

fn report_posting(context: &ShellContext, supplier_id: Uuid, entry_id: Uuid, verb: &str) {
    let Some(supplier) = context.shop.supplier(supplier_id) else {
        return;
    };
    let account = supplier.account();
    if let Some(entry) = account.entry(entry_id) {
        output::success(format!(
            "{} of {} {} for `{}`. Balance: {} ({})",
            entry.kind.label(),
            context.money(entry.amount_cents),
            verb,
            supplier.name(),
            context.money(account.balance_cents().abs()),
            account.status().label()
        ));
    }
}
