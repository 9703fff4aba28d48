//! Unit registry.
//!
//! A unit is a kind of reusable logistics asset (crate, roll container,
//! pallet, bottle, ...). The registry holds the definitions in their
//! canonical order and derives from them:
//!
//! - the [`AliasMap`] the command parser resolves typed codes through,
//! - the short display key used when echoing quantities back,
//! - a lazy [`Search`] over codes, names and keywords for suggestions.
//!
//! Definitions are immutable for the lifetime of a registry. Deployments
//! adjust them through typed [`UnitOverride`]s applied at load time.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::MoneyCents;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Crate,
    Container,
    Box,
    Cover,
    Pallet,
    Vat,
    Bottle,
    Can,
    Cylinder,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnitDefinition {
    /// Stable internal key, also stored in the ledger.
    pub id: String,
    pub kind: UnitKind,
    pub name: String,
    pub value: Option<MoneyCents>,
    /// Shared short code.
    pub default_code: String,
    /// Personal preference that takes precedence over `default_code`.
    pub user_code: Option<String>,
    pub aliases: Vec<String>,
    pub keywords: Vec<String>,
}

/// Per-unit adjustments read from configuration.
///
/// Absent fields keep the built-in value. `aliases` and `keywords` replace
/// the built-in lists rather than extending them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UnitOverride {
    pub name: Option<String>,
    pub value: Option<MoneyCents>,
    pub code: Option<String>,
    pub aliases: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
}

struct Builtin {
    id: &'static str,
    kind: UnitKind,
    name: &'static str,
    value_cents: Option<i64>,
    default_code: &'static str,
    user_code: Option<&'static str>,
    aliases: &'static [&'static str],
    keywords: &'static [&'static str],
}

/// Built-in catalog, in canonical order. The order decides alias collisions
/// and the order of search results.
const BUILTIN_UNITS: &[Builtin] = &[
    Builtin {
        id: "krat",
        kind: UnitKind::Crate,
        name: "TotaalVERS Emballagekrat",
        value_cents: Some(750),
        default_code: "k",
        user_code: Some("g"),
        aliases: &["k", "g", "krat"],
        keywords: &["emballage", "krat", "totaalvers"],
    },
    Builtin {
        id: "container",
        kind: UnitKind::Container,
        name: "TotaalVERS Rolcontainer",
        value_cents: Some(10_000),
        default_code: "c",
        user_code: None,
        aliases: &["c", "rc", "cont", "container"],
        keywords: &["rolcontainer", "container", "totaalvers"],
    },
    Builtin {
        id: "box",
        kind: UnitKind::Box,
        name: "Diepvriesbox",
        value_cents: Some(8_000),
        default_code: "b",
        user_code: None,
        aliases: &["b", "box"],
        keywords: &["diepvries", "vries", "box"],
    },
    Builtin {
        id: "rood",
        kind: UnitKind::Crate,
        name: "Rode krat",
        value_cents: Some(1_250),
        default_code: "r",
        user_code: None,
        aliases: &["r", "rood"],
        keywords: &["rode", "rood", "krat"],
    },
    Builtin {
        id: "hoes",
        kind: UnitKind::Cover,
        name: "Diepvrieshoes",
        value_cents: Some(20_000),
        default_code: "h",
        user_code: None,
        aliases: &["h", "hoes"],
        keywords: &["diepvries", "hoes", "cover"],
    },
    Builtin {
        id: "donkergroen",
        kind: UnitKind::Crate,
        name: "EPS Klapkrat donkergroen",
        value_cents: Some(426),
        default_code: "dg",
        user_code: None,
        aliases: &["dg", "donkergroen", "donker", "groen"],
        keywords: &["eps", "klapkrat", "donkergroen", "donker", "groen"],
    },
    Builtin {
        id: "cbl",
        kind: UnitKind::Crate,
        name: "Zwart CBL krat (hoog/middel)",
        value_cents: None,
        default_code: "cbl",
        user_code: None,
        aliases: &["cbl"],
        keywords: &["cbl", "zwart", "krat", "hoog", "middel"],
    },
    Builtin {
        id: "kleinblauw",
        kind: UnitKind::Crate,
        name: "Kleinblauw",
        value_cents: Some(90),
        default_code: "bl",
        user_code: None,
        aliases: &["bl", "kb", "kleinblauw"],
        keywords: &["klein", "blauw", "kleinblauw"],
    },
    Builtin {
        id: "europallet",
        kind: UnitKind::Pallet,
        name: "Europallet",
        value_cents: Some(2_250),
        default_code: "ep",
        user_code: None,
        aliases: &["ep", "euro", "europallet"],
        keywords: &["pallet", "euro", "europallet"],
    },
    Builtin {
        id: "kunststofpallet",
        kind: UnitKind::Pallet,
        name: "Kunststofpallet",
        value_cents: Some(6_500),
        default_code: "kp",
        user_code: None,
        aliases: &["kp", "kunststof", "kunststofpallet"],
        keywords: &["pallet", "kunststof", "plastic"],
    },
    Builtin {
        id: "container_lekkerland",
        kind: UnitKind::Container,
        name: "Rolcontainer - Lekkerland",
        value_cents: Some(10_000),
        default_code: "cl",
        user_code: None,
        aliases: &["cl", "lekkerland", "lek"],
        keywords: &["rolcontainer", "container", "lekkerland", "lek"],
    },
    Builtin {
        id: "zuurkoolvat",
        kind: UnitKind::Vat,
        name: "Zuurkoolvat",
        value_cents: Some(400),
        default_code: "zv",
        user_code: None,
        aliases: &["zv", "zuurkool", "vat"],
        keywords: &["zuurkool", "vat"],
    },
    Builtin {
        id: "sigarettenbox",
        kind: UnitKind::Box,
        name: "Sigarettenbox A",
        value_cents: Some(2_500),
        default_code: "sb",
        user_code: None,
        aliases: &["sb", "sig", "sigaret", "sigarettenbox"],
        keywords: &["sigaret", "sigaretten", "box"],
    },
    Builtin {
        id: "bierkrat",
        kind: UnitKind::Crate,
        name: "Statiegeld Bierkrat",
        value_cents: Some(390),
        default_code: "bk",
        user_code: None,
        aliases: &["bk", "bierkrat"],
        keywords: &["bier", "krat", "statiegeld"],
    },
    Builtin {
        id: "limkrat",
        kind: UnitKind::Crate,
        name: "Statiegeld Lim.krat",
        value_cents: Some(500),
        default_code: "lk",
        user_code: None,
        aliases: &["lk", "lim", "limkrat"],
        keywords: &["lim", "fris", "krat", "statiegeld"],
    },
    Builtin {
        id: "bierfles",
        kind: UnitKind::Bottle,
        name: "Bierfles 30 cl",
        value_cents: Some(10),
        default_code: "bf",
        user_code: None,
        aliases: &["bf", "bierfles", "fles"],
        keywords: &["bier", "fles", "30", "30cl"],
    },
    Builtin {
        id: "spakrat",
        kind: UnitKind::Crate,
        name: "Spa krat (6 flessen)",
        value_cents: Some(275),
        default_code: "sp",
        user_code: None,
        aliases: &["sp", "spa"],
        keywords: &["spa", "water", "krat", "6"],
    },
    Builtin {
        id: "watercan",
        kind: UnitKind::Can,
        name: "Watercan 18.9L",
        value_cents: None,
        default_code: "wc",
        user_code: None,
        aliases: &["wc", "watercan", "can"],
        keywords: &["water", "can", "18.9", "18.9l"],
    },
    Builtin {
        id: "biervat",
        kind: UnitKind::Vat,
        name: "Statiegeld bier vat",
        value_cents: Some(3_000),
        default_code: "bv",
        user_code: None,
        aliases: &["bv", "biervat", "vat"],
        keywords: &["bier", "vat", "statiegeld", "keg"],
    },
    Builtin {
        id: "koolzuurfles",
        kind: UnitKind::Cylinder,
        name: "Koolzuurfles",
        value_cents: Some(12_000),
        default_code: "kz",
        user_code: None,
        aliases: &["kz", "koolzuur", "koolzuurfles"],
        keywords: &["koolzuur", "fles", "co2"],
    },
];

impl From<&Builtin> for UnitDefinition {
    fn from(builtin: &Builtin) -> Self {
        Self {
            id: builtin.id.to_string(),
            kind: builtin.kind,
            name: builtin.name.to_string(),
            value: builtin.value_cents.map(MoneyCents::new),
            default_code: builtin.default_code.to_string(),
            user_code: builtin.user_code.map(str::to_string),
            aliases: builtin.aliases.iter().map(|s| s.to_string()).collect(),
            keywords: builtin.keywords.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl UnitDefinition {
    pub fn new(id: impl Into<String>, kind: UnitKind, name: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            default_code: id.clone(),
            id,
            kind,
            name: name.into(),
            value: None,
            user_code: None,
            aliases: Vec::new(),
            keywords: Vec::new(),
        }
    }

    #[must_use]
    pub fn value(mut self, value: MoneyCents) -> Self {
        self.value = Some(value);
        self
    }

    #[must_use]
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.default_code = code.into();
        self
    }

    #[must_use]
    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Every string that resolves to this unit, lower-cased and de-duplicated,
    /// in registration order: id, default code, user code, explicit aliases.
    pub fn all_aliases(&self) -> Vec<String> {
        let candidates = std::iter::once(self.id.as_str())
            .chain(std::iter::once(self.default_code.as_str()))
            .chain(self.user_code.as_deref())
            .chain(self.aliases.iter().map(String::as_str));

        let mut seen = HashSet::new();
        candidates
            .map(str::trim)
            .filter(|alias| !alias.is_empty())
            .map(str::to_lowercase)
            .filter(|alias| seen.insert(alias.clone()))
            .collect()
    }

    fn apply(&mut self, patch: &UnitOverride) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(value) = patch.value {
            self.value = Some(value);
        }
        if let Some(code) = &patch.code {
            self.user_code = Some(code.clone());
        }
        if let Some(aliases) = &patch.aliases {
            self.aliases = aliases.clone();
        }
        if let Some(keywords) = &patch.keywords {
            self.keywords = keywords.clone();
        }
    }

    fn matches(&self, query: &str) -> bool {
        self.all_aliases().iter().any(|alias| alias.contains(query))
            || self.name.to_lowercase().contains(query)
            || self
                .keywords
                .iter()
                .any(|keyword| keyword.to_lowercase().contains(query))
    }
}

/// Lower-cased alias to unit id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AliasMap {
    entries: HashMap<String, String>,
}

impl AliasMap {
    /// Resolve a typed code, case-insensitively.
    pub fn resolve(&self, code: &str) -> Option<&str> {
        self.entries
            .get(code.trim().to_lowercase().as_str())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(alias, id)| (alias.as_str(), id.as_str()))
    }
}

/// Ordered set of unit definitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitRegistry {
    units: Vec<UnitDefinition>,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl UnitRegistry {
    /// The built-in catalog without any override.
    pub fn builtin() -> Self {
        Self {
            units: BUILTIN_UNITS.iter().map(UnitDefinition::from).collect(),
        }
    }

    /// A registry from explicit definitions, kept in the given order.
    pub fn from_definitions(units: Vec<UnitDefinition>) -> Self {
        Self { units }
    }

    /// Merge per-unit overrides into the current definitions.
    ///
    /// Overrides naming an unknown unit are skipped.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &HashMap<String, UnitOverride>) -> Self {
        for (id, patch) in overrides {
            match self.units.iter_mut().find(|unit| &unit.id == id) {
                Some(unit) => unit.apply(patch),
                None => tracing::warn!("ignoring override for unknown unit {id:?}"),
            }
        }
        self
    }

    pub fn definitions(&self) -> &[UnitDefinition] {
        &self.units
    }

    pub fn get(&self, id: &str) -> Option<&UnitDefinition> {
        self.units.iter().find(|unit| unit.id == id)
    }

    /// Build the typed-code lookup.
    ///
    /// Definitions are registered in canonical order, so when two units claim
    /// the same alias the later one shadows the earlier one.
    pub fn alias_map(&self) -> AliasMap {
        let mut entries = HashMap::new();
        for unit in &self.units {
            for alias in unit.all_aliases() {
                if let Some(previous) = entries.insert(alias.clone(), unit.id.clone())
                    && previous != unit.id
                {
                    tracing::debug!("alias {alias:?} moves from {previous} to {}", unit.id);
                }
            }
        }
        AliasMap { entries }
    }

    /// Preferred short code for a unit: user code, default code, raw id.
    pub fn display_key(&self, id: &str) -> String {
        self.get(id)
            .and_then(|unit| {
                unit.user_code
                    .as_deref()
                    .filter(|code| !code.is_empty())
                    .or(Some(unit.default_code.as_str()).filter(|code| !code.is_empty()))
            })
            .unwrap_or(id)
            .to_lowercase()
    }

    /// De-duplicated aliases of one unit; empty for an unknown id.
    pub fn all_aliases(&self, id: &str) -> Vec<String> {
        self.get(id).map(UnitDefinition::all_aliases).unwrap_or_default()
    }

    /// Suggestion label, e.g. `TotaalVERS Emballagekrat € 7,50 (krat/k/g)`.
    pub fn describe(&self, id: &str) -> Option<String> {
        let unit = self.get(id)?;
        let value = unit
            .value
            .map_or_else(|| "-".to_string(), |value| value.to_string());
        Some(format!(
            "{} {} ({})",
            unit.name,
            value,
            unit.all_aliases().join("/")
        ))
    }

    /// Lazily scan for units matching `query` by prefix or substring.
    ///
    /// Results follow canonical order and stop after `limit` hits. The
    /// returned iterator is `Clone`, so a caller can keep it and replay the
    /// same scan.
    pub fn search(&self, query: &str, limit: usize) -> Search<'_> {
        Search {
            units: &self.units,
            query: query.trim().to_lowercase(),
            position: 0,
            remaining: limit,
        }
    }
}

/// Iterator returned by [`UnitRegistry::search`].
#[derive(Clone, Debug)]
pub struct Search<'a> {
    units: &'a [UnitDefinition],
    query: String,
    position: usize,
    remaining: usize,
}

impl<'a> Iterator for Search<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 || self.query.is_empty() {
            return None;
        }
        while let Some(unit) = self.units.get(self.position) {
            self.position += 1;
            if unit.matches(&self.query) {
                self.remaining -= 1;
                return Some(unit.id.as_str());
            }
        }
        None
    }
}
