use crate::cli::commands::{parse_args, parse_date, usage};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output::{self, render_table, section as output_section};
use crate::cli::registry::{ArgKind, CommandEntry};
use crate::core::services::PurchaseOrderService;
use crate::currency::{amount_to_cents, parse_amount};
use crate::ledger::PurchaseOrderItem;

const NEW_USAGE: &str =
    "po-new <supplier> <item:qty:unit-cost>... [--date YYYY-MM-DD] [--expected YYYY-MM-DD]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("po-new", "Create a purchase order", NEW_USAGE, cmd_new)
            .completes(ArgKind::Supplier),
        CommandEntry::new(
            "po-list",
            "List purchase orders (open ones unless --all)",
            "po-list [--all]",
            cmd_list,
        ),
        CommandEntry::new(
            "po-receive",
            "Mark an ordered purchase order as received",
            "po-receive <po>",
            cmd_receive,
        )
        .completes(ArgKind::PurchaseOrder),
        CommandEntry::new(
            "po-cancel",
            "Cancel an ordered purchase order",
            "po-cancel <po>",
            cmd_cancel,
        )
        .completes(ArgKind::PurchaseOrder),
        CommandEntry::new(
            "po-bill",
            "Post a received order to the supplier ledger as an invoice",
            "po-bill <po> [--date YYYY-MM-DD]",
            cmd_bill,
        )
        .completes(ArgKind::PurchaseOrder),
    ]
}

fn cmd_new(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = parse_args(args, &["date", "expected"], &[])?;
    let Some((supplier, item_args)) = parsed.positionals.split_first() else {
        return Err(usage(NEW_USAGE));
    };
    if item_args.is_empty() {
        return Err(usage(NEW_USAGE));
    }
    let items = item_args
        .iter()
        .map(|raw| parse_item(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let date = match parsed.option("date") {
        Some(value) => parse_date(value)?,
        None => context.today(),
    };
    let expected = parsed.option("expected").map(parse_date).transpose()?;

    let id = PurchaseOrderService::create(&mut context.shop, supplier, date, items)?;
    if expected.is_some() {
        PurchaseOrderService::set_expected_date(&mut context.shop, id, expected)?;
    }
    context.mark_dirty();
    if let Some(order) = context.shop.purchase_order(id) {
        output::success(format!(
            "Purchase order #{} for `{}` created: {}",
            order.short_id(),
            order.supplier_name,
            context.money(order.total_cents())
        ));
    }
    Ok(())
}

fn cmd_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = parse_args(args, &[], &["all"])?;
    let orders: Vec<_> = if parsed.flag("all") {
        context.shop.purchase_orders.iter().collect()
    } else {
        PurchaseOrderService::open(&context.shop)
    };
    if orders.is_empty() {
        output::warning("No purchase orders to show.");
        return Ok(());
    }

    output_section("Purchase orders");
    let rows: Vec<Vec<String>> = orders
        .iter()
        .map(|order| {
            let items = order
                .items
                .iter()
                .map(|item| format!("{} x{}", item.name, item.quantity))
                .collect::<Vec<_>>()
                .join(", ");
            vec![
                format!("#{}", order.short_id()),
                order.date.format("%Y-%m-%d").to_string(),
                order.supplier_name.clone(),
                items,
                context.money(order.total_cents()),
                order.status.to_string(),
                if order.billed_entry.is_some() { "yes" } else { "-" }.to_string(),
            ]
        })
        .collect();
    render_table(
        &["PO", "Date", "Supplier", "Items", "Total", "Status", "Billed"],
        &rows,
    );
    Ok(())
}

fn cmd_receive(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let key = args.first().ok_or_else(|| usage("po-receive <po>"))?;
    let id = PurchaseOrderService::resolve(&context.shop, key)?;
    PurchaseOrderService::receive(&mut context.shop, id)?;
    context.mark_dirty();
    output::success("Purchase order received.");
    context.print_hint("Use `po-bill` to post it to the supplier ledger.");
    Ok(())
}

fn cmd_cancel(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let key = args.first().ok_or_else(|| usage("po-cancel <po>"))?;
    let id = PurchaseOrderService::resolve(&context.shop, key)?;
    PurchaseOrderService::cancel(&mut context.shop, id)?;
    context.mark_dirty();
    output::success("Purchase order cancelled.");
    Ok(())
}

fn cmd_bill(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = parse_args(args, &["date"], &[])?;
    let [key] = parsed.positionals[..] else {
        return Err(usage("po-bill <po> [--date YYYY-MM-DD]"));
    };
    let id = PurchaseOrderService::resolve(&context.shop, key)?;
    let date = match parsed.option("date") {
        Some(value) => parse_date(value)?,
        None => context.today(),
    };
    PurchaseOrderService::bill(&mut context.shop, id, date)?;
    context.mark_dirty();

    let Some(order) = context.shop.purchase_order(id) else {
        return Ok(());
    };
    let balance = context
        .shop
        .supplier_by_name(&order.supplier_name)
        .map(|supplier| supplier.balance_cents())
        .unwrap_or_default();
    output::success(format!(
        "Invoice of {} posted to `{}`. Balance: {}",
        context.money(order.total_cents()),
        order.supplier_name,
        context.money(balance)
    ));
    Ok(())
}

/// Parses `name:quantity:unit-cost`; the name may itself contain colons.
fn parse_item(raw: &str) -> Result<PurchaseOrderItem, CommandError> {
    let invalid = || {
        CommandError::InvalidArguments(format!(
            "invalid item `{}` (expected name:quantity:unit-cost)",
            raw
        ))
    };
    let mut parts = raw.rsplitn(3, ':');
    let (Some(cost), Some(quantity), Some(name)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    let quantity: u32 = quantity.trim().parse().map_err(|_| invalid())?;
    let unit_cost_cents = parse_amount(cost)
        .filter(|amount| *amount >= 0.0)
        .and_then(amount_to_cents)
        .ok_or_else(invalid)?;
    Ok(PurchaseOrderItem::new(name.trim(), quantity, unit_cost_cents))
}
