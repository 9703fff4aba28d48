//! Totals derived from the ledger.
//!
//! Nothing here is stored. [`Totals::replay`] folds the full event history
//! every time; since per-unit sums commute, the order of the events does not
//! change the result.
//!
//! Deltas are `i64` but sums are kept as `i128`, so no ordering of events can
//! push an intermediate sum out of range.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{Account, Event, Flow, MoneyCents, UnitRegistry};

/// Quantity per unit id. Missing units read as zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UnitTotals(BTreeMap<String, i128>);

impl UnitTotals {
    pub fn get(&self, unit: &str) -> i128 {
        self.0.get(unit).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i128)> {
        self.0.iter().map(|(unit, total)| (unit.as_str(), *total))
    }

    /// Units with a non-zero total.
    pub fn non_zero(&self) -> impl Iterator<Item = (&str, i128)> {
        self.iter().filter(|(_, total)| *total != 0)
    }

    pub fn is_empty(&self) -> bool {
        self.non_zero().next().is_none()
    }

    /// Add `delta` to `unit`.
    #[must_use]
    pub fn with(mut self, unit: &str, delta: i64) -> Self {
        self.add(unit, i128::from(delta));
        self
    }

    // Exact for any history shorter than 2^64 events.
    fn add(&mut self, unit: &str, delta: i128) {
        *self.0.entry(unit.to_string()).or_insert(0) += delta;
    }
}

/// Both flows of one account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccountTotals {
    pub account: Account,
    pub delivered: UnitTotals,
    pub returned: UnitTotals,
}

impl AccountTotals {
    fn empty(account: Account) -> Self {
        Self {
            account,
            delivered: UnitTotals::default(),
            returned: UnitTotals::default(),
        }
    }

    pub fn flow(&self, flow: Flow) -> &UnitTotals {
        match flow {
            Flow::Delivered => &self.delivered,
            Flow::Returned => &self.returned,
        }
    }

    fn flow_mut(&mut self, flow: Flow) -> &mut UnitTotals {
        match flow {
            Flow::Delivered => &mut self.delivered,
            Flow::Returned => &mut self.returned,
        }
    }

    /// Units still out at the account: delivered minus returned.
    pub fn outstanding(&self) -> UnitTotals {
        let mut outstanding = self.delivered.clone();
        for (unit, returned) in self.returned.iter() {
            outstanding.add(unit, -returned);
        }
        outstanding
    }

    /// Deposit value of the outstanding units. Units without a value count
    /// as nothing.
    ///
    /// Returns `None` when the value does not fit in [`MoneyCents`].
    pub fn deposit_value(&self, registry: &UnitRegistry) -> Option<MoneyCents> {
        let cents = self
            .outstanding()
            .non_zero()
            .try_fold(0_i128, |total, (unit, count)| {
                let Some(value) = registry.get(unit).and_then(|definition| definition.value)
                else {
                    return Some(total);
                };
                i128::from(value.cents())
                    .checked_mul(count)
                    .and_then(|amount| total.checked_add(amount))
            })?;
        i64::try_from(cents).ok().map(MoneyCents::new)
    }
}

/// Totals for every known account, keyed by account id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    accounts: BTreeMap<i64, AccountTotals>,
}

impl Totals {
    /// Fold the whole history. Every account appears, even without events.
    pub fn replay<'a, A, E>(accounts: A, events: E) -> Self
    where
        A: IntoIterator<Item = Account>,
        E: IntoIterator<Item = &'a Event>,
    {
        let mut totals: BTreeMap<i64, AccountTotals> = accounts
            .into_iter()
            .map(|account| (account.id, AccountTotals::empty(account)))
            .collect();

        for event in events {
            let Some(account) = totals.get_mut(&event.account_id) else {
                tracing::warn!(
                    event_id = event.id,
                    account_id = event.account_id,
                    "skipping event for unknown account"
                );
                continue;
            };
            let flow = account.flow_mut(event.flow);
            for (unit, delta) in &event.deltas {
                flow.add(unit, i128::from(*delta));
            }
        }

        Self { accounts: totals }
    }

    /// Look an account up by display name.
    pub fn account(&self, name: &str) -> Option<&AccountTotals> {
        self.accounts
            .values()
            .find(|totals| totals.account.name == name)
    }

    /// One cell: zero for unknown accounts or units.
    pub fn get(&self, account: &str, flow: Flow, unit: &str) -> i128 {
        self.account(account)
            .map_or(0, |totals| totals.flow(flow).get(unit))
    }

    /// Accounts in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &AccountTotals> {
        self.accounts.values()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn account(id: i64, name: &str) -> Account {
        Account {
            id,
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }

    fn event(id: i64, account_id: i64, flow: Flow, deltas: &[(&str, i64)]) -> Event {
        Event {
            id,
            account_id,
            flow,
            deltas: deltas
                .iter()
                .map(|(unit, delta)| (unit.to_string(), *delta))
                .collect(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn single_event_only_touches_its_cell() {
        let events = [event(1, 1, Flow::Delivered, &[("krat", 5)])];
        let totals = Totals::replay([account(1, "A")], &events);

        assert_eq!(totals.get("A", Flow::Delivered, "krat"), 5);
        assert_eq!(totals.get("A", Flow::Returned, "krat"), 0);
        assert_eq!(totals.get("A", Flow::Delivered, "box"), 0);
        assert_eq!(totals.get("B", Flow::Delivered, "krat"), 0);
    }

    #[test]
    fn replay_order_does_not_matter() {
        let e1 = event(1, 1, Flow::Delivered, &[("krat", 5), ("box", 1)]);
        let e2 = event(2, 1, Flow::Delivered, &[("krat", -2)]);
        let e3 = event(3, 2, Flow::Returned, &[("box", 4)]);
        let accounts = [account(1, "A"), account(2, "B")];

        let forward = Totals::replay(accounts.clone(), [&e1, &e2, &e3]);
        let backward = Totals::replay(accounts, [&e3, &e2, &e1]);
        assert_eq!(forward, backward);
        assert_eq!(forward.get("A", Flow::Delivered, "krat"), 3);
    }

    #[test]
    fn replay_order_does_not_matter_near_the_limits() {
        let events = [
            event(1, 1, Flow::Delivered, &[("krat", i64::MAX)]),
            event(2, 1, Flow::Delivered, &[("krat", 1)]),
            event(3, 1, Flow::Delivered, &[("krat", -1)]),
        ];
        let accounts = [account(1, "A")];

        let forward = Totals::replay(accounts.clone(), &events);
        let backward = Totals::replay(accounts, events.iter().rev());
        assert_eq!(forward, backward);
        assert_eq!(
            forward.get("A", Flow::Delivered, "krat"),
            i128::from(i64::MAX)
        );
    }

    #[test]
    fn accounts_without_events_are_listed() {
        let totals = Totals::replay([account(1, "A")], std::iter::empty::<&Event>());
        assert_eq!(totals.len(), 1);
        assert!(totals.account("A").unwrap().delivered.is_empty());
    }

    #[test]
    fn outstanding_and_deposit_value() {
        let events = [
            event(1, 1, Flow::Delivered, &[("krat", 10), ("cbl", 3)]),
            event(2, 1, Flow::Returned, &[("krat", 4), ("box", 1)]),
        ];
        let totals = Totals::replay([account(1, "A")], &events);
        let a = totals.account("A").unwrap();

        let outstanding = a.outstanding();
        assert_eq!(outstanding.get("krat"), 6);
        assert_eq!(outstanding.get("box"), -1);
        assert_eq!(outstanding.get("cbl"), 3);

        // 6 × 7,50 − 1 × 80,00; cbl has no value.
        let registry = UnitRegistry::builtin();
        assert_eq!(
            a.deposit_value(&registry),
            Some(MoneyCents::new(4_500 - 8_000))
        );
    }

    #[test]
    fn deposit_value_out_of_range_is_none() {
        let registry = UnitRegistry::builtin();

        // Each product fits in cents, their sum does not.
        let events = [event(
            1,
            1,
            Flow::Delivered,
            &[("krat", 10_i64.pow(16)), ("box", 10_i64.pow(15))],
        )];
        let totals = Totals::replay([account(1, "A")], &events);
        assert_eq!(totals.account("A").unwrap().deposit_value(&registry), None);

        let events = [event(1, 1, Flow::Delivered, &[("krat", i64::MAX)])];
        let totals = Totals::replay([account(1, "A")], &events);
        assert_eq!(totals.account("A").unwrap().deposit_value(&registry), None);
    }
}
