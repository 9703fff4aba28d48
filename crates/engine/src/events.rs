//! Ledger events.
//!
//! An [`Event`] is an immutable fact: one account, one flow and a signed
//! quantity per unit. Events are only ever inserted. A correction is a new
//! event with opposite deltas.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::{EngineError, Flow};

use super::event_deltas;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Event {
    pub id: i64,
    pub account_id: i64,
    pub flow: Flow,
    pub deltas: BTreeMap<String, i64>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Quantity change for a unit; zero when the event does not touch it.
    pub fn delta(&self, unit: &str) -> i64 {
        self.deltas.get(unit).copied().unwrap_or(0)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub account_id: i64,
    pub flow: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
    #[sea_orm(has_many = "super::event_deltas::Entity")]
    EventDeltas,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::event_deltas::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EventDeltas.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<(Model, Vec<event_deltas::Model>)> for Event {
    type Error = EngineError;

    fn try_from((model, rows): (Model, Vec<event_deltas::Model>)) -> Result<Self, Self::Error> {
        let mut deltas = BTreeMap::new();
        for row in rows {
            if deltas.insert(row.unit_id.clone(), row.delta).is_some() {
                return Err(EngineError::CorruptedRecord(format!(
                    "event {} lists unit {} twice",
                    model.id, row.unit_id
                )));
            }
        }

        Ok(Self {
            id: model.id,
            account_id: model.account_id,
            flow: Flow::try_from(model.flow.as_str())?,
            deltas,
            created_at: model.created_at,
        })
    }
}
