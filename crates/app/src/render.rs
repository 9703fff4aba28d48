//! Plain text and JSON views of engine results.

use engine::{
    Account, AccountTotals, Flow, MoneyCents, Recorded, ShorthandMap, Totals, UnitRegistry,
    UnitTotals,
};
use serde::Serialize;

/// `2x g 1x c`, in catalog order, zero counts left out.
fn quantities(units: &UnitTotals, registry: &UnitRegistry) -> String {
    let mut parts: Vec<String> = registry
        .definitions()
        .iter()
        .map(|unit| (unit.id.as_str(), units.get(&unit.id)))
        .filter(|(_, count)| *count != 0)
        .map(|(id, count)| format!("{count}x {}", registry.display_key(id)))
        .collect();
    // Units no longer in the catalog still show up, by raw id.
    parts.extend(
        units
            .non_zero()
            .filter(|(id, _)| registry.get(id).is_none())
            .map(|(id, count)| format!("{count}x {id}")),
    );

    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(" ")
    }
}

pub fn recorded(recorded: &Recorded, registry: &UnitRegistry) -> String {
    let mut deltas = UnitTotals::default();
    for (unit, delta) in &recorded.event.deltas {
        deltas = deltas.with(unit, *delta);
    }
    let mut line = format!(
        "#{} {} {}: {}",
        recorded.event.id,
        recorded.event.flow,
        recorded.account.name,
        quantities(&deltas, registry)
    );
    if recorded.created {
        line.push_str(" (new account)");
    }
    line
}

fn row(label: &str, value: &str) -> String {
    format!("  {label:<12}{value}\n")
}

fn account_block(out: &mut String, totals: &AccountTotals, registry: &UnitRegistry) {
    out.push_str(&totals.account.name);
    out.push('\n');
    for flow in Flow::ALL {
        out.push_str(&row(flow.as_str(), &quantities(totals.flow(flow), registry)));
    }
    out.push_str(&row(
        "outstanding",
        &quantities(&totals.outstanding(), registry),
    ));
    let deposit = match totals.deposit_value(registry) {
        Some(value) => value.to_string(),
        None => "overflow".to_string(),
    };
    out.push_str(&row("deposit", &deposit));
}

pub fn totals(totals: &Totals, registry: &UnitRegistry) -> String {
    if totals.is_empty() {
        return "no accounts yet\n".to_string();
    }
    let mut out = String::new();
    for account in totals.iter() {
        account_block(&mut out, account, registry);
    }
    out
}

#[derive(Debug, Serialize)]
pub struct TotalsReport<'a> {
    account: &'a Account,
    delivered: &'a UnitTotals,
    returned: &'a UnitTotals,
    outstanding: UnitTotals,
    /// `null` when the value does not fit in cents.
    deposit_cents: Option<MoneyCents>,
}

pub fn totals_report<'a>(totals: &'a Totals, registry: &UnitRegistry) -> Vec<TotalsReport<'a>> {
    totals
        .iter()
        .map(|account| TotalsReport {
            account: &account.account,
            delivered: &account.delivered,
            returned: &account.returned,
            outstanding: account.outstanding(),
            deposit_cents: account.deposit_value(registry),
        })
        .collect()
}

pub fn search(registry: &UnitRegistry, query: &str, limit: usize) -> String {
    let lines: Vec<String> = registry
        .search(query, limit)
        .filter_map(|id| registry.describe(id))
        .collect();
    if lines.is_empty() {
        format!("no unit matches {query:?}")
    } else {
        lines.join("\n")
    }
}

pub fn aliases(shorthand: &ShorthandMap, registered: &[(String, Account)]) -> String {
    if shorthand.is_empty() {
        return "no accounts yet\n".to_string();
    }
    let mut out = String::new();
    for (name, alias) in shorthand.iter() {
        out.push_str(&format!("{alias:<8}{name}\n"));
    }
    if !registered.is_empty() {
        out.push_str("registered:\n");
        for (alias, account) in registered {
            out.push_str(&format!("{alias:<8}{}\n", account.name));
        }
    }
    out
}
