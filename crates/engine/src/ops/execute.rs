use sea_orm::TransactionTrait;
use serde::Serialize;

use crate::{
    Account, Event, Mutation, ParseError, Preview, ResultEngine, ShorthandMap,
    command::{self, ParseContext},
    util::normalize_account_name,
};

use super::{Engine, with_tx};

/// What a successful command line wrote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Recorded {
    pub account: Account,
    pub event: Event,
    /// The account did not exist before this command.
    pub created: bool,
}

impl Engine {
    /// Parse a command line and describe what it would record. Nothing is
    /// written.
    pub async fn preview(&self, input: &str, selected: Option<&str>) -> ResultEngine<Preview> {
        let accounts = self.shorthand().await?;
        let mutation = self.parse_line(input, selected, &accounts)?;
        Ok(Preview::new(mutation, &self.units))
    }

    /// Parse a command line and append its event.
    ///
    /// Account creation, alias registration and the append share one
    /// transaction: a command records exactly one event or nothing.
    pub async fn parse_and_execute(
        &self,
        input: &str,
        selected: Option<&str>,
    ) -> ResultEngine<Recorded> {
        with_tx!(self, |db_tx| {
            let accounts = Self::shorthand_in(&db_tx).await?;
            let mutation = self.parse_line(input, selected, &accounts)?;

            let (account, created) = Self::ensure_account_in(&db_tx, &mutation.account).await?;
            if let Some(alias) = &mutation.new_alias {
                Self::insert_alias_in(&db_tx, alias, account.id).await?;
            }
            let event =
                Self::append_in(&db_tx, account.id, mutation.flow, &mutation.deltas).await?;

            Ok(Recorded {
                account: account.into(),
                event,
                created,
            })
        })
    }

    fn parse_line(
        &self,
        input: &str,
        selected: Option<&str>,
        accounts: &ShorthandMap,
    ) -> ResultEngine<Mutation> {
        let selection = self.resolve_selection(selected, accounts)?;
        let context = ParseContext {
            selected: selection.as_ref().map(|(name, _)| name.as_str()),
            accounts,
            registry: &self.units,
            units: &self.unit_aliases,
            auto_create: self.auto_create,
        };

        let mut mutation = command::parse(input, &context)?;
        if let Some((_, Some(alias))) = selection {
            mutation.new_alias = Some(alias);
        }
        Ok(mutation)
    }

    /// Map an externally selected account onto a stored name. Returns the
    /// alias to register when the selection creates the account.
    fn resolve_selection(
        &self,
        selected: Option<&str>,
        accounts: &ShorthandMap,
    ) -> ResultEngine<Option<(String, Option<String>)>> {
        let Some(raw) = selected.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Ok(None);
        };
        if let Some(name) = accounts.resolve(raw) {
            return Ok(Some((name.to_string(), None)));
        }
        if self.auto_create {
            let (display, key) = normalize_account_name(raw)?;
            return Ok(Some((display, Some(key))));
        }
        Err(ParseError::UnknownAccount(raw.to_string()).into())
    }
}
