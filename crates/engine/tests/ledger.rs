use std::collections::BTreeMap;

use sea_orm::{Database, DatabaseConnection};

use engine::{Engine, EngineError, ErrorCategory, Flow, MoneyCents, ParseError, Totals};
use migration::MigratorTrait;

async fn connect() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

async fn engine_with_db() -> Engine {
    Engine::builder()
        .database(connect().await)
        .build()
        .await
        .unwrap()
}

async fn auto_create_engine() -> Engine {
    Engine::builder()
        .database(connect().await)
        .auto_create(true)
        .build()
        .await
        .unwrap()
}

fn deltas(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
    pairs
        .iter()
        .map(|(unit, delta)| (unit.to_string(), *delta))
        .collect()
}

#[tokio::test]
async fn append_then_totals_touches_one_cell() {
    let engine = engine_with_db().await;
    let acme = engine.ensure_account("Acme").await.unwrap();
    engine.ensure_account("Other").await.unwrap();

    let event = engine
        .append(acme, Flow::Delivered, &deltas(&[("krat", 5)]))
        .await
        .unwrap();
    assert_eq!(event.account_id, acme);
    assert_eq!(event.delta("krat"), 5);

    let totals = engine.totals().await.unwrap();
    assert_eq!(totals.len(), 2);
    assert_eq!(totals.get("Acme", Flow::Delivered, "krat"), 5);
    assert_eq!(totals.get("Acme", Flow::Returned, "krat"), 0);
    assert_eq!(totals.get("Acme", Flow::Delivered, "box"), 0);
    assert_eq!(totals.get("Other", Flow::Delivered, "krat"), 0);
}

#[tokio::test]
async fn append_to_missing_account_fails() {
    let engine = engine_with_db().await;
    let err = engine
        .append(42, Flow::Delivered, &deltas(&[("krat", 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    assert!(engine.events().await.unwrap().is_empty());
}

#[tokio::test]
async fn stored_events_replay_in_any_order() {
    let engine = engine_with_db().await;
    let acme = engine.ensure_account("Acme").await.unwrap();
    engine
        .append(acme, Flow::Delivered, &deltas(&[("krat", 5), ("box", 2)]))
        .await
        .unwrap();
    engine
        .append(acme, Flow::Delivered, &deltas(&[("krat", -1), ("box", 0)]))
        .await
        .unwrap();

    let accounts = engine.accounts().await.unwrap();
    let events = engine.events().await.unwrap();
    assert_eq!(events.len(), 2);
    assert!(events[0].id < events[1].id);
    assert_eq!(events[1].delta("box"), 0);

    let forward = Totals::replay(accounts.clone(), &events);
    let backward = Totals::replay(accounts, events.iter().rev());
    assert_eq!(forward, backward);
    assert_eq!(forward, engine.totals().await.unwrap());
    assert_eq!(forward.get("Acme", Flow::Delivered, "krat"), 4);
}

#[tokio::test]
async fn removal_against_selected_account() {
    let engine = engine_with_db().await;
    engine.ensure_account("A").await.unwrap();
    engine.parse_and_execute("5g", Some("A")).await.unwrap();

    let recorded = engine.parse_and_execute("-2g", Some("A")).await.unwrap();
    assert_eq!(recorded.account.name, "A");
    assert_eq!(recorded.event.flow, Flow::Delivered);
    assert_eq!(recorded.event.delta("krat"), -2);
    assert!(!recorded.created);

    let totals = engine.account_totals("a").await.unwrap();
    assert_eq!(totals.delivered.get("krat"), 3);
}

#[tokio::test]
async fn bad_token_records_nothing() {
    let engine = engine_with_db().await;
    engine.ensure_account("Acme").await.unwrap();

    let err = engine
        .parse_and_execute("5k 3bad", Some("Acme"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Parse(ParseError::UnknownUnit("3bad".to_string()))
    );
    assert_eq!(err.category(), ErrorCategory::Parse);
    assert!(engine.events().await.unwrap().is_empty());
    assert_eq!(engine.totals().await.unwrap().get("Acme", Flow::Delivered, "krat"), 0);
}

#[tokio::test]
async fn account_token_resolves_through_shorthand() {
    let engine = engine_with_db().await;
    engine.ensure_account("Jumbo").await.unwrap();
    engine.ensure_account("Jansen").await.unwrap();

    let recorded = engine.parse_and_execute("<ju 3b 1b", None).await.unwrap();
    assert_eq!(recorded.account.name, "Jumbo");
    assert_eq!(recorded.event.flow, Flow::Returned);
    assert_eq!(recorded.event.delta("box"), 4);

    let err = engine.parse_and_execute("j 3b", None).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Parse(ParseError::UnknownAccount("j".to_string()))
    );
}

#[tokio::test]
async fn unknown_account_creates_nothing_without_auto_create() {
    let engine = engine_with_db().await;

    let err = engine.parse_and_execute("Plus 5k", None).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Parse(ParseError::UnknownAccount("Plus".to_string()))
    );
    let err = engine.parse_and_execute("5k", Some("Plus")).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Parse(ParseError::UnknownAccount("Plus".to_string()))
    );
    assert!(engine.accounts().await.unwrap().is_empty());
}

#[tokio::test]
async fn auto_create_registers_the_alias() {
    let engine = auto_create_engine().await;

    let first = engine.parse_and_execute("Plus 5k", None).await.unwrap();
    assert!(first.created);
    assert_eq!(first.account.name, "Plus");

    let aliases = engine.registered_aliases().await.unwrap();
    assert_eq!(aliases.len(), 1);
    assert_eq!(aliases[0].0, "plus");
    assert_eq!(aliases[0].1.id, first.account.id);

    let second = engine.parse_and_execute("PLUS 1k", None).await.unwrap();
    assert!(!second.created);
    assert_eq!(second.account.id, first.account.id);

    let totals = engine.account_totals("Plus").await.unwrap();
    assert_eq!(totals.delivered.get("krat"), 6);
}

#[tokio::test]
async fn quantity_without_selection_is_rejected() {
    let engine = auto_create_engine().await;
    let err = engine.parse_and_execute("5k", None).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Selection);
    assert!(engine.accounts().await.unwrap().is_empty());
}

#[tokio::test]
async fn preview_writes_nothing() {
    let engine = auto_create_engine().await;
    let preview = engine.preview("-new 2k", None).await.unwrap();
    assert_eq!(preview.text, "Remove delivered new (new) 2x g");
    assert!(preview.mutation.creates_account());
    assert!(engine.accounts().await.unwrap().is_empty());
    assert!(engine.events().await.unwrap().is_empty());
}

#[tokio::test]
async fn ensure_account_is_idempotent() {
    let engine = engine_with_db().await;
    let first = engine.ensure_account("Café Noord").await.unwrap();
    let second = engine.ensure_account("  cafe   NOORD ").await.unwrap();
    assert_eq!(first, second);

    let accounts = engine.accounts().await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].name, "Café Noord");

    assert!(matches!(
        engine.ensure_account("   ").await,
        Err(EngineError::InvalidName(_))
    ));
}

#[tokio::test]
async fn shorthand_follows_stored_names() {
    let engine = engine_with_db().await;
    engine.ensure_account("ape").await.unwrap();
    engine.ensure_account("apple").await.unwrap();

    let shorthand = engine.shorthand().await.unwrap();
    assert_eq!(shorthand.shortest("ape"), Some("ape"));
    assert_eq!(shorthand.shortest("apple"), Some("app"));

    let resolved = engine.resolve_account("APP").await.unwrap().unwrap();
    assert_eq!(resolved.name, "apple");
    assert!(engine.resolve_account("ap").await.unwrap().is_none());
}

#[tokio::test]
async fn multi_word_names_get_typeable_shorthand() {
    let engine = engine_with_db().await;
    engine.ensure_account("Albert Heijn").await.unwrap();
    engine.ensure_account("Albert Hall").await.unwrap();

    let shorthand = engine.shorthand().await.unwrap();
    let alias = shorthand.shortest("Albert Heijn").unwrap().to_string();
    assert_eq!(alias, "albert_he");

    let recorded = engine
        .parse_and_execute(&format!("{alias} 2k"), None)
        .await
        .unwrap();
    assert_eq!(recorded.account.name, "Albert Heijn");
    assert!(!recorded.created);
    assert_eq!(
        engine
            .totals()
            .await
            .unwrap()
            .get("Albert Heijn", Flow::Delivered, "krat"),
        2
    );
}

#[tokio::test]
async fn registered_alias_overrides_generated_one() {
    let engine = engine_with_db().await;
    engine.ensure_account("Jumbo").await.unwrap();
    engine.ensure_account("Bakker").await.unwrap();

    engine.register_alias("j", "Bakker").await.unwrap();
    let recorded = engine.parse_and_execute("j 1c", None).await.unwrap();
    assert_eq!(recorded.account.name, "Bakker");

    let err = engine.register_alias("x", "Missing").await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("Missing".to_string()));
}

#[tokio::test]
async fn account_history_and_outstanding_value() {
    let engine = engine_with_db().await;
    engine.ensure_account("Acme").await.unwrap();
    engine.ensure_account("Other").await.unwrap();
    engine.parse_and_execute("10k", Some("Acme")).await.unwrap();
    engine.parse_and_execute("<4k", Some("Acme")).await.unwrap();
    engine.parse_and_execute("1k", Some("Other")).await.unwrap();

    let history = engine.account_events("acme").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].flow, Flow::Returned);

    let totals = engine.account_totals("Acme").await.unwrap();
    assert_eq!(totals.outstanding().get("krat"), 6);
    assert_eq!(
        totals.deposit_value(engine.units()),
        Some(MoneyCents::new(6 * 750))
    );

    assert!(matches!(
        engine.account_totals("Nobody").await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn close_releases_the_engine() {
    let engine = engine_with_db().await;
    engine.ensure_account("Acme").await.unwrap();
    engine.close().await.unwrap();
}
