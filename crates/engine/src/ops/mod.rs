use sea_orm::DatabaseConnection;

use crate::{AliasMap, ResultEngine, UnitRegistry};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// Callers need `sea_orm::TransactionTrait` in scope for `begin`.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

mod accounts;
mod events;
mod execute;
mod totals;

pub use execute::Recorded;

/// The ledger handle.
///
/// Owns the storage connection plus the unit registry the parser resolves
/// codes against. There is no global state: every operation goes through an
/// `Engine` built once with [`Engine::builder`] and released with
/// [`Engine::close`].
///
/// Writes assume a single logical writer. Account get-or-create is a
/// check-then-insert guarded only by the unique index on the normalized name.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    units: UnitRegistry,
    unit_aliases: AliasMap,
    auto_create: bool,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn units(&self) -> &UnitRegistry {
        &self.units
    }

    pub fn unit_aliases(&self) -> &AliasMap {
        &self.unit_aliases
    }

    /// Whether unknown account aliases create accounts.
    pub fn auto_create(&self) -> bool {
        self.auto_create
    }

    /// Close the underlying connection pool.
    pub async fn close(self) -> ResultEngine<()> {
        self.database.close().await?;
        Ok(())
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    units: Option<UnitRegistry>,
    auto_create: bool,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Unit definitions to parse against. Defaults to the built-in catalog.
    pub fn units(mut self, units: UnitRegistry) -> EngineBuilder {
        self.units = Some(units);
        self
    }

    /// Let unknown account aliases create accounts. Off by default.
    pub fn auto_create(mut self, enabled: bool) -> EngineBuilder {
        self.auto_create = enabled;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let units = self.units.unwrap_or_default();
        let unit_aliases = units.alias_map();
        tracing::debug!(
            units = units.definitions().len(),
            aliases = unit_aliases.len(),
            auto_create = self.auto_create,
            "engine ready"
        );
        Ok(Engine {
            database: self.database,
            units,
            unit_aliases,
            auto_create: self.auto_create,
        })
    }
}
