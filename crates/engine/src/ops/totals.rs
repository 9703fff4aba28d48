use crate::{AccountTotals, EngineError, ResultEngine, Totals};

use super::Engine;

impl Engine {
    /// Replay the full ledger into per-account totals.
    pub async fn totals(&self) -> ResultEngine<Totals> {
        let accounts = self.accounts().await?;
        let events = self.events().await?;
        Ok(Totals::replay(accounts, &events))
    }

    /// Totals for a single account.
    pub async fn account_totals(&self, name: &str) -> ResultEngine<AccountTotals> {
        let account = self
            .account_by_name(name)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(name.to_string()))?;
        let events = self.account_events(&account.name).await?;
        let display = account.name.clone();

        Totals::replay([account], &events)
            .account(&display)
            .cloned()
            .ok_or(EngineError::KeyNotFound(display))
    }
}
