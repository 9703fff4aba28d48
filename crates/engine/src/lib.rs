//! Returnable packaging ledger.
//!
//! Operators type short command lines such as `-ju 5k 2c`; the [`command`]
//! parser turns them into a [`Mutation`], the [`Engine`] appends it as an
//! immutable [`Event`] and [`Totals`] are recomputed by replaying every event.

pub use accounts::Account;
pub use command::{Mutation, ParseContext, Preview};
pub use error::{EngineError, ErrorCategory, ParseError};
pub use events::Event;
pub use flow::Flow;
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder, Recorded};
pub use shorthand::ShorthandMap;
pub use totals::{AccountTotals, Totals, UnitTotals};
pub use units::{AliasMap, UnitDefinition, UnitKind, UnitOverride, UnitRegistry};

mod account_aliases;
mod accounts;
pub mod command;
mod error;
mod event_deltas;
mod events;
mod flow;
mod money;
mod ops;
pub mod shorthand;
mod totals;
pub mod units;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
