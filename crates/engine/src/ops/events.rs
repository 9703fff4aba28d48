use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{EngineError, Event, Flow, ResultEngine, accounts, event_deltas, events};

use super::{Engine, with_tx};

impl Engine {
    /// Append one event. Prior events are never touched.
    ///
    /// Every unit in `deltas` gets a row, zero deltas included.
    pub async fn append(
        &self,
        account_id: i64,
        flow: Flow,
        deltas: &BTreeMap<String, i64>,
    ) -> ResultEngine<Event> {
        with_tx!(self, |db_tx| {
            Self::append_in(&db_tx, account_id, flow, deltas).await
        })
    }

    /// The whole ledger in insertion order.
    pub async fn events(&self) -> ResultEngine<Vec<Event>> {
        let rows = events::Entity::find()
            .find_with_related(event_deltas::Entity)
            .order_by_asc(events::Column::Id)
            .all(&self.database)
            .await?;
        rows.into_iter().map(Event::try_from).collect()
    }

    /// History of one account in insertion order.
    pub async fn account_events(&self, account: &str) -> ResultEngine<Vec<Event>> {
        let account = self
            .account_by_name(account)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(account.to_string()))?;

        let rows = events::Entity::find()
            .filter(events::Column::AccountId.eq(account.id))
            .find_with_related(event_deltas::Entity)
            .order_by_asc(events::Column::Id)
            .all(&self.database)
            .await?;
        rows.into_iter().map(Event::try_from).collect()
    }

    pub(super) async fn append_in<C: ConnectionTrait>(
        conn: &C,
        account_id: i64,
        flow: Flow,
        deltas: &BTreeMap<String, i64>,
    ) -> ResultEngine<Event> {
        if accounts::Entity::find_by_id(account_id)
            .one(conn)
            .await?
            .is_none()
        {
            return Err(EngineError::KeyNotFound(format!("account {account_id}")));
        }

        let event = events::ActiveModel {
            id: ActiveValue::NotSet,
            account_id: ActiveValue::Set(account_id),
            flow: ActiveValue::Set(flow.as_str().to_string()),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(conn)
        .await?;

        let mut rows = Vec::with_capacity(deltas.len());
        for (unit, delta) in deltas {
            let row = event_deltas::ActiveModel {
                id: ActiveValue::NotSet,
                event_id: ActiveValue::Set(event.id),
                unit_id: ActiveValue::Set(unit.clone()),
                delta: ActiveValue::Set(*delta),
            }
            .insert(conn)
            .await?;
            rows.push(row);
        }

        tracing::debug!(
            event_id = event.id,
            account_id,
            flow = %flow,
            units = rows.len(),
            "event appended"
        );
        Event::try_from((event, rows))
    }
}
