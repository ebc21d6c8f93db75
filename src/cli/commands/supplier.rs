use crate::cli::commands::{parse_args, usage};
use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::output::{self, render_table, section as output_section};
use crate::cli::registry::{ArgKind, CommandEntry};
use crate::core::services::{LedgerService, SummaryService, SupplierService};
use crate::ledger::{BalanceStatus, Supplier, SupplierProfile};

const PROFILE_OPTIONS: &[&str] = &["contact", "email", "phone", "address", "notes"];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "supplier-add",
            "Register a supplier with an empty ledger",
            "supplier-add <name> [--contact NAME] [--email EMAIL] [--phone PHONE] [--address TEXT] [--notes TEXT]",
            cmd_add,
        ),
        CommandEntry::new(
            "supplier-edit",
            "Update a supplier's contact details",
            "supplier-edit <supplier> [--name NAME] [--contact NAME] [--email EMAIL] [--phone PHONE] [--address TEXT] [--notes TEXT]",
            cmd_edit,
        )
        .completes(ArgKind::Supplier),
        CommandEntry::new(
            "supplier-list",
            "List suppliers with balances",
            "supplier-list [query]",
            cmd_list,
        ),
        CommandEntry::new(
            "supplier-show",
            "Show a supplier's ledger statement",
            "supplier-show <supplier>",
            cmd_show,
        )
        .completes(ArgKind::Supplier),
        CommandEntry::new(
            "supplier-remove",
            "Remove a settled supplier",
            "supplier-remove <supplier> [--yes]",
            cmd_remove,
        )
        .completes(ArgKind::Supplier),
        CommandEntry::new(
            "supplier-repair",
            "Recompute a supplier's balance from its ledger",
            "supplier-repair <supplier>",
            cmd_repair,
        )
        .completes(ArgKind::Supplier),
    ]
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    const USAGE: &str = "supplier-add <name> [--contact NAME] [--email EMAIL] [--phone PHONE]";
    let parsed = parse_args(args, PROFILE_OPTIONS, &[])?;
    let name = parsed.joined_from(0).ok_or_else(|| usage(USAGE))?;

    let mut profile = SupplierProfile::named(name);
    apply_profile_options(&mut profile, |key| parsed.option(key));
    let id = SupplierService::register(&mut context.shop, profile)?;
    context.mark_dirty();

    let name = context
        .shop
        .supplier(id)
        .map(|supplier| supplier.name().to_string())
        .unwrap_or_default();
    output::success(format!("Supplier `{}` added.", name));
    Ok(())
}

fn cmd_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    const USAGE: &str = "supplier-edit <supplier> [--name NAME] [--contact NAME] ...";
    let mut options = vec!["name"];
    options.extend_from_slice(PROFILE_OPTIONS);
    let parsed = parse_args(args, &options, &[])?;
    let key = parsed.joined_from(0).ok_or_else(|| usage(USAGE))?;
    if !parsed.has_options() {
        return Err(usage(USAGE));
    }

    let supplier = SupplierService::resolve(&context.shop, &key)?;
    let id = supplier.id;
    let mut profile = supplier.profile.clone();
    if let Some(name) = parsed.option("name") {
        profile.name = name.to_string();
    }
    apply_profile_options(&mut profile, |key| parsed.option(key));
    SupplierService::update_profile(&mut context.shop, id, profile)?;
    context.mark_dirty();
    output::success("Supplier updated.");
    Ok(())
}

fn cmd_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let query = args.join(" ");
    let suppliers = SupplierService::search(&context.shop, &query);
    if suppliers.is_empty() {
        if context.shop.suppliers.is_empty() {
            output::warning("No suppliers registered.");
            context.print_hint("Try `supplier-add \"Samsung Direct\" --contact Mike`.");
        } else {
            output::warning(format!("No suppliers match `{}`.", query));
        }
        return Ok(());
    }

    output_section("Suppliers");
    let rows: Vec<Vec<String>> = suppliers
        .iter()
        .map(|supplier| {
            vec![
                supplier.name().to_string(),
                dash_if_empty(&supplier.profile.contact_person),
                dash_if_empty(&supplier.profile.phone),
                supplier.account().len().to_string(),
                context.money(supplier.balance_cents().abs()),
                supplier.account().status().label().to_string(),
            ]
        })
        .collect();
    render_table(
        &["Name", "Contact", "Phone", "Entries", "Balance", "Status"],
        &rows,
    );

    let summary = SummaryService::payables(&context.shop);
    output::info(format!(
        "Total payable: {} across {} supplier(s); credit held: {}",
        context.money(summary.due_cents),
        summary.suppliers_due,
        context.money(summary.credit_cents)
    ));
    if summary.open_orders > 0 {
        output::info(format!(
            "Open purchase orders: {} worth {}",
            summary.open_orders,
            context.money(summary.open_order_cents)
        ));
    }
    Ok(())
}

fn cmd_show(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let key = (!args.is_empty())
        .then(|| args.join(" "))
        .ok_or_else(|| usage("supplier-show <supplier>"))?;
    let supplier = SupplierService::resolve(&context.shop, &key)?;
    print_statement(context, supplier);
    Ok(())
}

fn cmd_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = parse_args(args, &[], &["yes"])?;
    let key = parsed
        .joined_from(0)
        .ok_or_else(|| usage("supplier-remove <supplier> [--yes]"))?;
    let supplier = SupplierService::resolve(&context.shop, &key)?;
    let (id, name) = (supplier.id, supplier.name().to_string());

    if !context.confirm(&format!("Remove supplier `{}`?", name), parsed.flag("yes"))? {
        output::info("Operation cancelled.");
        return Ok(());
    }
    SupplierService::remove(&mut context.shop, id)?;
    context.mark_dirty();
    output::success(format!("Supplier `{}` removed.", name));
    Ok(())
}

fn cmd_repair(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let key = (!args.is_empty())
        .then(|| args.join(" "))
        .ok_or_else(|| usage("supplier-repair <supplier>"))?;
    let id = context.supplier_id(&key)?;
    match LedgerService::repair(&mut context.shop, id)? {
        Some(drift) => {
            context.mark_dirty();
            output::success(format!(
                "Balance corrected from {} to {}.",
                context.money(drift.stored_cents),
                context.money(drift.computed_cents)
            ));
        }
        None => output::info("Balance already matches the ledger."),
    }
    Ok(())
}

fn print_statement(context: &ShellContext, supplier: &Supplier) {
    let profile = &supplier.profile;
    output_section(format!("Statement: {}", supplier.name()));
    for (label, value) in [
        ("Contact", &profile.contact_person),
        ("Phone", &profile.phone),
        ("Email", &profile.email),
        ("Address", &profile.address),
        ("Notes", &profile.notes),
    ] {
        if !value.trim().is_empty() {
            output::info(format!("  {:<8}: {}", label, value));
        }
    }

    let account = supplier.account();
    if account.is_empty() {
        output::info("No ledger entries.");
    } else {
        let rows: Vec<Vec<String>> = account
            .entries()
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                let sign = if entry.kind.increases_balance() { "+" } else { "-" };
                vec![
                    (idx + 1).to_string(),
                    entry.date.format("%Y-%m-%d").to_string(),
                    entry.kind.label().to_string(),
                    entry.description.clone(),
                    entry.reference.clone().unwrap_or_else(|| "-".into()),
                    format!("{}{}", sign, context.money(entry.amount_cents)),
                ]
            })
            .collect();
        render_table(
            &["#", "Date", "Type", "Description", "Reference", "Amount"],
            &rows,
        );
    }

    let totals = account.totals();
    output::info(format!("Invoiced       : {}", context.money(totals.invoiced_cents)));
    output::info(format!(
        "Paid/Returned  : {}",
        context.money(totals.paid_or_returned_cents())
    ));
    let balance = account.balance_cents();
    let status = account.status();
    let line = format!(
        "Balance        : {} ({})",
        context.money(balance.abs()),
        status.label()
    );
    match status {
        BalanceStatus::Due => output::warning(line),
        BalanceStatus::Settled | BalanceStatus::Credit => output::success(line),
    }
}

fn apply_profile_options<'a>(
    profile: &mut SupplierProfile,
    option: impl Fn(&str) -> Option<&'a str>,
) {
    if let Some(value) = option("contact") {
        profile.contact_person = value.trim().to_string();
    }
    if let Some(value) = option("email") {
        profile.email = value.trim().to_string();
    }
    if let Some(value) = option("phone") {
        profile.phone = value.trim().to_string();
    }
    if let Some(value) = option("address") {
        profile.address = value.trim().to_string();
    }
    if let Some(value) = option("notes") {
        profile.notes = value.trim().to_string();
    }
}

fn dash_if_empty(value: &str) -> String {
    if value.trim().is_empty() {
        "-".into()
    } else {
        value.to_string()
    }
}
