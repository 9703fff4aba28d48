//! Command line interpreter.
//!
//! Grammar: `[trigger] [account] quantity*`, tokens separated by whitespace,
//! case-insensitive.
//!
//! - The trigger comes from [`TRIGGERS`]; the longest matching one wins, and
//!   the empty trigger always matches.
//! - The account token is only read when the caller has no account selected.
//! - A quantity is `<digits><letters>` or `<letters><digits>` with 1 to 12
//!   ASCII letters, e.g. `5k`, `k5`, `12dg`.
//!
//! Parsing never touches storage. Any rejected token fails the whole line.

use std::collections::BTreeMap;

use crate::{
    EngineError, Flow, ParseError, ResultEngine,
    shorthand::ShorthandMap,
    units::{AliasMap, UnitRegistry},
    util::normalize_key,
};

const MAX_CODE_LEN: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sign {
    Add,
    Subtract,
}

impl Sign {
    fn apply(self, count: i64) -> i64 {
        match self {
            Self::Add => count,
            Self::Subtract => -count,
        }
    }
}

/// One row of the trigger table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trigger {
    pub symbol: &'static str,
    pub flow: Flow,
    pub sign: Sign,
}

pub const TRIGGERS: [Trigger; 3] = [
    Trigger {
        symbol: "",
        flow: Flow::Delivered,
        sign: Sign::Add,
    },
    Trigger {
        symbol: "-",
        flow: Flow::Delivered,
        sign: Sign::Subtract,
    },
    Trigger {
        symbol: "<",
        flow: Flow::Returned,
        sign: Sign::Add,
    },
];

/// Longest trigger that prefixes `input`.
pub fn match_trigger(input: &str) -> Trigger {
    TRIGGERS
        .iter()
        .filter(|trigger| input.starts_with(trigger.symbol))
        .max_by_key(|trigger| trigger.symbol.len())
        .copied()
        .unwrap_or(TRIGGERS[0])
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    /// A count paired with a unit code, code lower-cased.
    Quantity {
        count: i64,
        code: String,
        raw: &'a str,
    },
    /// Anything else.
    Word { raw: &'a str },
}

impl<'a> Token<'a> {
    pub fn raw(&self) -> &'a str {
        match self {
            Self::Quantity { raw, .. } | Self::Word { raw } => *raw,
        }
    }

    pub fn is_quantity(&self) -> bool {
        matches!(self, Self::Quantity { .. })
    }
}

fn classify(raw: &str) -> Token<'_> {
    let digits_first = raw.starts_with(|ch: char| ch.is_ascii_digit());
    let split = raw
        .find(|ch: char| {
            if digits_first {
                !ch.is_ascii_digit()
            } else {
                !ch.is_ascii_alphabetic()
            }
        })
        .unwrap_or(raw.len());
    let (head, tail) = raw.split_at(split);
    let (digits, letters) = if digits_first { (head, tail) } else { (tail, head) };

    let shaped = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (1..=MAX_CODE_LEN).contains(&letters.len())
        && letters.bytes().all(|b| b.is_ascii_alphabetic());

    match digits.parse::<i64>() {
        Ok(count) if shaped => Token::Quantity {
            count,
            code: letters.to_ascii_lowercase(),
            raw,
        },
        _ => Token::Word { raw },
    }
}

/// Split on whitespace and classify every token.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    input.split_whitespace().map(classify).collect()
}

/// What the parser needs to know besides the text.
#[derive(Clone, Copy, Debug)]
pub struct ParseContext<'a> {
    /// Account chosen outside the command line, if any.
    pub selected: Option<&'a str>,
    pub accounts: &'a ShorthandMap,
    pub registry: &'a UnitRegistry,
    pub units: &'a AliasMap,
    /// Unknown account aliases create a new account instead of failing.
    pub auto_create: bool,
}

/// A fully validated command, ready to be appended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mutation {
    pub account: String,
    pub flow: Flow,
    pub sign: Sign,
    /// Signed quantity per unit id.
    pub deltas: BTreeMap<String, i64>,
    /// Alias to register for an account created by this command.
    pub new_alias: Option<String>,
}

impl Mutation {
    pub fn creates_account(&self) -> bool {
        self.new_alias.is_some()
    }

    /// Human line such as `Add delivered Jumbo 5x g 2x c`.
    pub fn describe(&self, registry: &UnitRegistry) -> String {
        let action = match self.sign {
            Sign::Add => "Add",
            Sign::Subtract => "Remove",
        };
        let mut text = format!("{action} {} {}", self.flow, self.account);
        if self.creates_account() {
            text.push_str(" (new)");
        }
        for (unit, delta) in &self.deltas {
            text.push_str(&format!(
                " {}x {}",
                delta.unsigned_abs(),
                registry.display_key(unit)
            ));
        }
        text
    }
}

/// Parse result paired with its feedback line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preview {
    pub mutation: Mutation,
    pub text: String,
}

impl Preview {
    pub fn new(mutation: Mutation, registry: &UnitRegistry) -> Self {
        let text = mutation.describe(registry);
        Self { mutation, text }
    }
}

fn resolve_account(
    token: &Token<'_>,
    context: &ParseContext<'_>,
) -> ResultEngine<(String, Option<String>)> {
    let raw = token.raw();
    if let Some(name) = context.accounts.resolve(raw) {
        return Ok((name.to_string(), None));
    }
    if token.is_quantity() {
        return Err(EngineError::Selection(format!(
            "select an account before \"{raw}\""
        )));
    }
    if context.auto_create {
        return Ok((raw.to_string(), Some(normalize_key(raw))));
    }
    Err(ParseError::UnknownAccount(raw.to_string()).into())
}

/// Turn one command line into a [`Mutation`].
pub fn parse(input: &str, context: &ParseContext<'_>) -> ResultEngine<Mutation> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty.into());
    }

    let trigger = match_trigger(trimmed);
    let mut tokens = tokenize(&trimmed[trigger.symbol.len()..]).into_iter();

    let (account, new_alias) = match context.selected {
        Some(name) => (name.to_string(), None),
        None => {
            let first = tokens.next().ok_or(ParseError::Empty)?;
            resolve_account(&first, context)?
        }
    };

    let mut deltas: BTreeMap<String, i64> = BTreeMap::new();
    for token in tokens {
        let (count, code, raw) = match token {
            Token::Quantity { count, code, raw } => (count, code, raw),
            Token::Word { raw } => return Err(ParseError::InvalidToken(raw.to_string()).into()),
        };
        let unit = context
            .units
            .resolve(&code)
            .ok_or_else(|| ParseError::UnknownUnit(raw.to_string()))?;
        let slot = deltas.entry(unit.to_string()).or_insert(0);
        *slot = slot
            .checked_add(trigger.sign.apply(count))
            .ok_or_else(|| ParseError::InvalidToken(raw.to_string()))?;
    }

    if deltas.is_empty() {
        return Err(ParseError::NoQuantities.into());
    }

    tracing::debug!(
        account = %account,
        flow = %trigger.flow,
        units = deltas.len(),
        "parsed command"
    );

    Ok(Mutation {
        account,
        flow: trigger.flow,
        sign: trigger.sign,
        deltas,
        new_alias,
    })
}

/// Parse without side effects and render the feedback line.
pub fn preview(input: &str, context: &ParseContext<'_>) -> ResultEngine<Preview> {
    let mutation = parse(input, context)?;
    Ok(Preview::new(mutation, context.registry))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        accounts: ShorthandMap,
        registry: UnitRegistry,
        units: AliasMap,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = UnitRegistry::builtin();
            Self {
                accounts: ShorthandMap::generate(["Jumbo", "Jansen", "Aldi"]),
                units: registry.alias_map(),
                registry,
            }
        }

        fn context(&self, selected: Option<&'static str>, auto_create: bool) -> ParseContext<'_> {
            ParseContext {
                selected,
                accounts: &self.accounts,
                registry: &self.registry,
                units: &self.units,
                auto_create,
            }
        }
    }

    #[test]
    fn longest_trigger_wins() {
        assert_eq!(match_trigger("-2g").symbol, "-");
        assert_eq!(match_trigger("<2g").symbol, "<");
        assert_eq!(match_trigger("2g").symbol, "");
        assert_eq!(match_trigger("<").flow, Flow::Returned);
    }

    #[test]
    fn tokenizer_accepts_both_shapes() {
        let tokens = tokenize("5k K12 12dg abc 5 k5k 1abcdefghijklm");
        assert_eq!(
            tokens[0],
            Token::Quantity {
                count: 5,
                code: "k".to_string(),
                raw: "5k"
            }
        );
        assert_eq!(
            tokens[1],
            Token::Quantity {
                count: 12,
                code: "k".to_string(),
                raw: "K12"
            }
        );
        assert!(tokens[2].is_quantity());
        assert!(!tokens[3].is_quantity());
        assert!(!tokens[4].is_quantity());
        assert!(!tokens[5].is_quantity());
        assert!(!tokens[6].is_quantity());
    }

    #[test]
    fn overflowing_count_is_not_a_quantity() {
        assert!(!classify("99999999999999999999k").is_quantity());
    }

    #[test]
    fn default_trigger_adds_delivered() {
        let fixture = Fixture::new();
        let mutation = parse("ju 5g 2c", &fixture.context(None, false)).unwrap();
        assert_eq!(mutation.account, "Jumbo");
        assert_eq!(mutation.flow, Flow::Delivered);
        assert_eq!(mutation.deltas["krat"], 5);
        assert_eq!(mutation.deltas["container"], 2);
    }

    #[test]
    fn generated_alias_of_multi_word_name_parses() {
        let registry = UnitRegistry::builtin();
        let accounts = ShorthandMap::generate(["Albert Heijn", "Albert Hall"]);
        let units = registry.alias_map();
        let context = ParseContext {
            selected: None,
            accounts: &accounts,
            registry: &registry,
            units: &units,
            auto_create: false,
        };

        let alias = accounts.shortest("Albert Heijn").unwrap();
        let mutation = parse(&format!("{alias} 5k"), &context).unwrap();
        assert_eq!(mutation.account, "Albert Heijn");
        assert_eq!(mutation.deltas["krat"], 5);
        assert_eq!(mutation.new_alias, None);
    }

    #[test]
    fn minus_trigger_subtracts_and_return_trigger_switches_flow() {
        let fixture = Fixture::new();
        let removed = parse("-2g", &fixture.context(Some("Jumbo"), false)).unwrap();
        assert_eq!(removed.flow, Flow::Delivered);
        assert_eq!(removed.deltas["krat"], -2);

        let returned = parse("< ja 3b", &fixture.context(None, false)).unwrap();
        assert_eq!(returned.account, "Jansen");
        assert_eq!(returned.flow, Flow::Returned);
        assert_eq!(returned.deltas["box"], 3);
    }

    #[test]
    fn same_unit_tokens_accumulate() {
        let fixture = Fixture::new();
        let mutation = parse("-a 2k 3g krat4", &fixture.context(None, false)).unwrap();
        assert_eq!(mutation.deltas.len(), 1);
        assert_eq!(mutation.deltas["krat"], -9);
    }

    #[test]
    fn parsing_is_idempotent() {
        let fixture = Fixture::new();
        let context = fixture.context(None, false);
        assert_eq!(
            parse("<JU 1k 2dg", &context).unwrap(),
            parse("<JU 1k 2dg", &context).unwrap()
        );
    }

    #[test]
    fn bad_token_fails_whole_command() {
        let fixture = Fixture::new();
        let context = fixture.context(Some("Jumbo"), false);
        assert_eq!(
            parse("5k 3bad", &context).unwrap_err(),
            EngineError::Parse(ParseError::UnknownUnit("3bad".to_string()))
        );
        assert_eq!(
            parse("5k hello", &context).unwrap_err(),
            EngineError::Parse(ParseError::InvalidToken("hello".to_string()))
        );
    }

    #[test]
    fn unknown_account_fails_unless_auto_create() {
        let fixture = Fixture::new();
        assert_eq!(
            parse("plus 5k", &fixture.context(None, false)).unwrap_err(),
            EngineError::Parse(ParseError::UnknownAccount("plus".to_string()))
        );

        let mutation = parse("Plus 5k", &fixture.context(None, true)).unwrap();
        assert_eq!(mutation.account, "Plus");
        assert_eq!(mutation.new_alias.as_deref(), Some("plus"));
    }

    #[test]
    fn quantity_without_selection_is_a_selection_error() {
        let fixture = Fixture::new();
        let err = parse("5k", &fixture.context(None, true)).unwrap_err();
        assert!(matches!(err, EngineError::Selection(_)));
    }

    #[test]
    fn empty_and_quantity_free_input() {
        let fixture = Fixture::new();
        assert_eq!(
            parse("   ", &fixture.context(None, false)).unwrap_err(),
            EngineError::Parse(ParseError::Empty)
        );
        assert_eq!(
            parse("-", &fixture.context(None, false)).unwrap_err(),
            EngineError::Parse(ParseError::Empty)
        );
        assert_eq!(
            parse("ju", &fixture.context(None, false)).unwrap_err(),
            EngineError::Parse(ParseError::NoQuantities)
        );
    }

    #[test]
    fn preview_text_uses_display_keys() {
        let fixture = Fixture::new();
        let removal = preview("-ju 5k 2c", &fixture.context(None, false)).unwrap();
        assert_eq!(removal.text, "Remove delivered Jumbo 2x c 5x g");

        let created = preview("<new 1b", &fixture.context(None, true)).unwrap();
        assert_eq!(created.text, "Add returned new (new) 1x b");
    }
}
