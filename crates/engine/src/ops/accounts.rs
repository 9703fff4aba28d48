use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    Account, EngineError, ResultEngine, ShorthandMap, account_aliases, accounts,
    util::{normalize_account_name, normalize_key},
};

use super::{Engine, with_tx};

impl Engine {
    /// Get-or-create an account by name and return its id.
    ///
    /// Names that fold to the same key share one account; the first spelling
    /// seen is kept for display.
    pub async fn ensure_account(&self, name: &str) -> ResultEngine<i64> {
        with_tx!(self, |db_tx| {
            let (model, _) = Self::ensure_account_in(&db_tx, name).await?;
            Ok(model.id)
        })
    }

    /// All accounts, in creation order.
    pub async fn accounts(&self) -> ResultEngine<Vec<Account>> {
        let models = accounts::Entity::find()
            .order_by_asc(accounts::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Account::from).collect())
    }

    /// Look an account up by its name, ignoring case, accents and spacing.
    pub async fn account_by_name(&self, name: &str) -> ResultEngine<Option<Account>> {
        let model = Self::find_account_in(&self.database, name).await?;
        Ok(model.map(Account::from))
    }

    /// Look an account up by anything the parser would accept for it: a
    /// generated shorthand, a registered alias or the full name.
    pub async fn resolve_account(&self, alias: &str) -> ResultEngine<Option<Account>> {
        let shorthand = self.shorthand().await?;
        match shorthand.resolve(alias) {
            Some(name) => self.account_by_name(name).await,
            None => Ok(None),
        }
    }

    /// Register `alias` for an existing account. An alias already pointing
    /// elsewhere is moved.
    pub async fn register_alias(&self, alias: &str, account: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = Self::find_account_in(&db_tx, account)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(account.to_string()))?;
            Self::insert_alias_in(&db_tx, alias, model.id).await
        })
    }

    /// Registered aliases with their account, ordered by alias.
    pub async fn registered_aliases(&self) -> ResultEngine<Vec<(String, Account)>> {
        let rows = account_aliases::Entity::find()
            .find_also_related(accounts::Entity)
            .order_by_asc(account_aliases::Column::Alias)
            .all(&self.database)
            .await?;

        rows.into_iter()
            .map(|(alias, account)| match account {
                Some(account) => Ok((alias.alias, Account::from(account))),
                None => Err(EngineError::CorruptedRecord(format!(
                    "alias {} points at missing account {}",
                    alias.alias, alias.account_id
                ))),
            })
            .collect()
    }

    /// Shorthand map over the current accounts.
    pub async fn shorthand(&self) -> ResultEngine<ShorthandMap> {
        Self::shorthand_in(&self.database).await
    }

    pub(super) async fn shorthand_in<C: ConnectionTrait>(conn: &C) -> ResultEngine<ShorthandMap> {
        let names: Vec<String> = accounts::Entity::find()
            .order_by_asc(accounts::Column::Id)
            .all(conn)
            .await?
            .into_iter()
            .map(|model| model.name)
            .collect();

        let registered = account_aliases::Entity::find()
            .find_also_related(accounts::Entity)
            .all(conn)
            .await?
            .into_iter()
            .filter_map(|(alias, account)| account.map(|account| (alias.alias, account.name)));

        Ok(ShorthandMap::generate(names).with_registered(registered))
    }

    async fn find_account_in<C: ConnectionTrait>(
        conn: &C,
        name: &str,
    ) -> ResultEngine<Option<accounts::Model>> {
        let key = normalize_key(name);
        if key.is_empty() {
            return Ok(None);
        }
        let model = accounts::Entity::find()
            .filter(accounts::Column::NameNorm.eq(key))
            .one(conn)
            .await?;
        Ok(model)
    }

    /// Returns the account and whether it was created by this call.
    pub(super) async fn ensure_account_in<C: ConnectionTrait>(
        conn: &C,
        name: &str,
    ) -> ResultEngine<(accounts::Model, bool)> {
        let (display, key) = normalize_account_name(name)?;
        if let Some(model) = Self::find_account_in(conn, &key).await? {
            return Ok((model, false));
        }

        let active = accounts::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(display),
            name_norm: ActiveValue::Set(key.clone()),
            created_at: ActiveValue::Set(Utc::now()),
        };
        match active.insert(conn).await {
            Ok(model) => {
                tracing::info!(account_id = model.id, name = %model.name, "account created");
                Ok((model, true))
            }
            Err(err) => {
                // Lost a race on the unique key: the other writer's row wins.
                if let Some(model) = Self::find_account_in(conn, &key).await? {
                    return Ok((model, false));
                }
                Err(err.into())
            }
        }
    }

    pub(super) async fn insert_alias_in<C: ConnectionTrait>(
        conn: &C,
        alias: &str,
        account_id: i64,
    ) -> ResultEngine<()> {
        let key = normalize_key(alias);
        if key.is_empty() {
            return Err(EngineError::InvalidName(
                "alias must not be empty".to_string(),
            ));
        }

        match account_aliases::Entity::find_by_id(key.clone()).one(conn).await? {
            Some(model) if model.account_id == account_id => Ok(()),
            Some(model) => {
                tracing::debug!(alias = %key, from = model.account_id, to = account_id, "alias moved");
                let mut active: account_aliases::ActiveModel = model.into();
                active.account_id = ActiveValue::Set(account_id);
                active.update(conn).await?;
                Ok(())
            }
            None => {
                tracing::debug!(alias = %key, account_id, "alias registered");
                account_aliases::ActiveModel {
                    alias: ActiveValue::Set(key),
                    account_id: ActiveValue::Set(account_id),
                    created_at: ActiveValue::Set(Utc::now()),
                }
                .insert(conn)
                .await?;
                Ok(())
            }
        }
    }
}
