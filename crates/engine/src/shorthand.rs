//! Account shorthand.
//!
//! Operators type accounts by the shortest prefix that identifies them.
//! The map is derived from the current account names every time it is
//! needed and is never stored. Aliases registered explicitly (see
//! [`Engine::register_alias`](crate::Engine::register_alias)) are layered on
//! top and take precedence.
//!
//! # Prefix search
//!
//! Names are folded to lookup keys and bucketed by first character. Within a
//! bucket every unresolved key claims its first `L` characters, starting at
//! `L = 1`. A prefix with a single claimant becomes that key's alias; keys
//! sharing a prefix stay unresolved and `L` grows.
//!
//! Lookup keys are single words: the folded name with inner spaces replaced
//! by `_` (`Albert Heijn` becomes `albert_heijn`), so every alias the map
//! hands out can be typed as the first token of a command. Two names that
//! only differ in `_` versus a space would share a key; the later one gets a
//! `_2`, `_3`, ... suffix.
//!
//! A key shorter than `L` claims itself whole. Keys are distinct, so once
//! `L` passes the length of a key that is a strict prefix of another (`deal`
//! and `deals`), the longer key claims a longer string and the short key
//! resolves to itself. At `L` equal to the longest key in the bucket every
//! claim is a whole distinct key, which bounds the loop.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::util::{normalize_key, typed_key};

/// First `len` characters of `key`, or all of it when shorter.
fn prefix(key: &str, len: usize) -> String {
    key.chars().take(len).collect()
}

/// Minimal unique prefix for every key.
///
/// Empty keys are skipped.
pub fn minimal_prefixes<'a, I>(keys: I) -> BTreeMap<&'a str, String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut buckets: BTreeMap<char, BTreeSet<&'a str>> = BTreeMap::new();
    for key in keys {
        if let Some(first) = key.chars().next() {
            buckets.entry(first).or_default().insert(key);
        }
    }

    let mut resolved = BTreeMap::new();
    for mut unresolved in buckets.into_values() {
        let longest = unresolved
            .iter()
            .map(|key| key.chars().count())
            .max()
            .unwrap_or(0);

        let mut len = 1;
        while !unresolved.is_empty() && len <= longest {
            let mut claims: BTreeMap<String, Vec<&'a str>> = BTreeMap::new();
            for key in &unresolved {
                claims.entry(prefix(key, len)).or_default().push(*key);
            }
            for (claimed, claimants) in claims {
                if let [only] = claimants.as_slice() {
                    unresolved.remove(only);
                    resolved.insert(*only, claimed);
                }
            }
            len += 1;
        }

        // Only reachable if two keys were equal, which the set rules out.
        for key in unresolved {
            resolved.insert(key, key.to_string());
        }
    }
    resolved
}

/// Typed alias to account name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShorthandMap {
    entries: HashMap<String, String>,
    shortest: BTreeMap<String, String>,
}

impl ShorthandMap {
    /// Derive aliases for the given account names.
    ///
    /// Each name gets its minimal unique prefix and its full lookup key.
    /// Names folding to the same key are one account; the first spelling
    /// wins.
    pub fn generate<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut folded = HashSet::new();
        let mut by_key: BTreeMap<String, String> = BTreeMap::new();
        for name in names {
            let name = name.as_ref();
            if !folded.insert(normalize_key(name)) {
                continue;
            }
            let base = typed_key(name);
            let mut key = base.clone();
            let mut suffix = 2;
            while by_key.contains_key(&key) {
                key = format!("{base}_{suffix}");
                suffix += 1;
            }
            by_key.insert(key, name.trim().to_string());
        }

        let mut map = Self::default();
        for (key, alias) in minimal_prefixes(by_key.keys().map(String::as_str)) {
            let name = &by_key[key];
            map.entries.insert(key.to_string(), name.clone());
            map.entries.insert(alias.clone(), name.clone());
            map.shortest.insert(name.clone(), alias);
        }
        map
    }

    /// Layer explicitly registered `(alias, account name)` pairs on top.
    #[must_use]
    pub fn with_registered<I>(mut self, registered: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (alias, name) in registered {
            let alias = typed_key(&alias);
            if alias.is_empty() {
                continue;
            }
            self.entries.insert(alias, name);
        }
        self
    }

    /// Resolve a typed alias (case-insensitive) to an account name. A full
    /// name may be given with spaces or with `_`.
    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.entries
            .get(typed_key(alias).as_str())
            .map(String::as_str)
    }

    /// The generated minimal alias of an account.
    pub fn shortest(&self, name: &str) -> Option<&str> {
        self.shortest.get(name).map(String::as_str)
    }

    /// `(account name, minimal alias)` pairs, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.shortest
            .iter()
            .map(|(name, alias)| (name.as_str(), alias.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
