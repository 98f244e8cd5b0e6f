mod common;

use engine::{BudgetAllocation, BudgetFilter, BudgetNew, BudgetPatch, EngineError, PageRequest};
use uuid::Uuid;

use common::{date, engine_with_db, register, rupees, spend, system_category};

fn january(total: Option<i64>, allocations: Vec<BudgetAllocation>) -> BudgetNew {
    BudgetNew {
        name: "January".to_string(),
        family_id: None,
        period_start: date(2025, 1, 1),
        period_end: date(2025, 1, 31),
        total_budget: total.map(rupees),
        needs_budget: None,
        wants_budget: None,
        savings_budget: None,
        alert_threshold_percent: None,
        is_active: None,
        allocations,
    }
}

fn allocation(category_id: Uuid, major: i64) -> BudgetAllocation {
    BudgetAllocation {
        category_id,
        allocated: rupees(major),
    }
}

#[tokio::test]
async fn stats_follow_period_spend() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let groceries = system_category(&engine, alice.id, "Groceries & Food").await;
    let dining = system_category(&engine, alice.id, "Dining & Restaurants").await;

    let budget = engine
        .create_budget(
            alice.id,
            january(Some(5000), vec![allocation(groceries.id, 2000)]),
        )
        .await
        .unwrap();

    spend(&engine, alice.id, groceries.id, rupees(1500), date(2025, 1, 10)).await;
    spend(&engine, alice.id, dining.id, rupees(800), date(2025, 1, 15)).await;
    // outside the period
    spend(&engine, alice.id, dining.id, rupees(999), date(2025, 2, 1)).await;

    let loaded = engine.get_budget(alice.id, budget.budget.id).await.unwrap();
    let stats = loaded.stats;
    assert_eq!(stats.total_spent, rupees(2300));
    assert_eq!(stats.total_remaining, Some(rupees(2700)));
    assert_eq!(stats.overall_utilization_percent, Some(46.0));
    assert!(!stats.alert_triggered);

    let line = stats
        .categories
        .iter()
        .find(|line| line.category_id == groceries.id)
        .unwrap();
    assert_eq!(line.spent, rupees(1500));
    assert_eq!(line.remaining, rupees(500));
    assert_eq!(line.utilization_percent, Some(75.0));
}

#[tokio::test]
async fn empty_period_reports_zero_spend() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;

    let created = engine
        .create_budget(alice.id, january(Some(1000), Vec::new()))
        .await
        .unwrap();
    assert_eq!(created.stats.total_spent, rupees(0));
    assert_eq!(created.stats.total_remaining, Some(rupees(1000)));
    assert_eq!(created.stats.overall_utilization_percent, Some(0.0));
}

#[tokio::test]
async fn allocations_cannot_exceed_total() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let groceries = system_category(&engine, alice.id, "Groceries & Food").await;
    let dining = system_category(&engine, alice.id, "Dining & Restaurants").await;

    let err = engine
        .create_budget(
            alice.id,
            january(
                Some(1000),
                vec![allocation(groceries.id, 700), allocation(dining.id, 500)],
            ),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    engine
        .create_budget(
            alice.id,
            january(
                Some(1000),
                vec![allocation(groceries.id, 500), allocation(dining.id, 500)],
            ),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn overlapping_active_budget_is_rejected() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;

    let first = engine
        .create_budget(alice.id, january(Some(1000), Vec::new()))
        .await
        .unwrap();

    let mut overlapping = january(Some(1000), Vec::new());
    overlapping.period_start = date(2025, 1, 31);
    overlapping.period_end = date(2025, 2, 28);
    let err = engine
        .create_budget(alice.id, overlapping.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    // Inactive budgets never conflict.
    overlapping.is_active = Some(false);
    engine.create_budget(alice.id, overlapping).await.unwrap();

    // Deactivating the first budget frees the period.
    engine
        .update_budget(
            alice.id,
            first.budget.id,
            BudgetPatch {
                is_active: Some(false),
                ..BudgetPatch::default()
            },
        )
        .await
        .unwrap();
    engine
        .create_budget(alice.id, january(Some(1000), Vec::new()))
        .await
        .unwrap();
}

#[tokio::test]
async fn same_period_in_another_family_is_allowed() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;

    engine
        .create_budget(alice.id, january(Some(1000), Vec::new()))
        .await
        .unwrap();

    let created = engine.create_family(alice.id, "Home", None).await.unwrap();
    let family_budget = engine
        .create_budget(alice.id, january(Some(1000), Vec::new()))
        .await
        .unwrap();
    assert_eq!(family_budget.budget.family_id, Some(created.family.id));

    let err = engine
        .create_budget(alice.id, january(Some(1000), Vec::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
}

#[tokio::test]
async fn concurrent_overlapping_creations_accept_one() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;

    let (a, b) = tokio::join!(
        engine.create_budget(alice.id, january(Some(1000), Vec::new())),
        engine.create_budget(alice.id, january(Some(2000), Vec::new())),
    );
    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(EngineError::ExistingKey(_))))
    );
}

#[tokio::test]
async fn invalid_period_and_threshold_are_rejected() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;

    let mut backwards = january(None, Vec::new());
    backwards.period_end = date(2024, 12, 31);
    let err = engine.create_budget(alice.id, backwards).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidPeriod(_)));

    let mut threshold = january(None, Vec::new());
    threshold.alert_threshold_percent = Some(0);
    let err = engine.create_budget(alice.id, threshold).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidValue(_)));
}

#[tokio::test]
async fn active_budget_and_filtered_listing() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;

    let jan = engine
        .create_budget(alice.id, january(Some(1000), Vec::new()))
        .await
        .unwrap();
    let mut feb = january(Some(1000), Vec::new());
    feb.name = "February".to_string();
    feb.period_start = date(2025, 2, 1);
    feb.period_end = date(2025, 2, 28);
    feb.is_active = Some(false);
    engine.create_budget(alice.id, feb).await.unwrap();

    let current = engine
        .active_budget(alice.id, date(2025, 1, 20))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.budget.id, jan.budget.id);
    assert!(
        engine
            .active_budget(alice.id, date(2025, 2, 10))
            .await
            .unwrap()
            .is_none()
    );

    let page = engine
        .list_budgets(
            alice.id,
            BudgetFilter {
                is_active: Some(true),
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].budget.name, "January");
}

#[tokio::test]
async fn other_users_budgets_are_not_found() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let bob = register(&engine, "bob@example.com").await;

    let budget = engine
        .create_budget(alice.id, january(Some(1000), Vec::new()))
        .await
        .unwrap();
    let err = engine
        .get_budget(bob.id, budget.budget.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    let err = engine
        .delete_budget(bob.id, budget.budget.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn update_checks_allocations_against_merged_total() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let groceries = system_category(&engine, alice.id, "Groceries & Food").await;

    let created = engine
        .create_budget(
            alice.id,
            january(Some(1000), vec![allocation(groceries.id, 800)]),
        )
        .await
        .unwrap();

    // lowering the total below the stored allocations
    let err = engine
        .update_budget(
            alice.id,
            created.budget.id,
            BudgetPatch {
                total_budget: Some(Some(rupees(500))),
                ..BudgetPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    // raising allocations above the stored total
    let err = engine
        .update_budget(
            alice.id,
            created.budget.id,
            BudgetPatch {
                allocations: Some(vec![allocation(groceries.id, 1200)]),
                ..BudgetPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let unchanged = engine.get_budget(alice.id, created.budget.id).await.unwrap();
    assert_eq!(unchanged.budget.total_budget, Some(rupees(1000)));
    assert_eq!(unchanged.budget.allocations[0].allocated, rupees(800));
}

#[tokio::test]
async fn moving_a_period_onto_another_budget_conflicts() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;

    engine
        .create_budget(alice.id, january(Some(1000), Vec::new()))
        .await
        .unwrap();
    let mut feb = january(Some(1000), Vec::new());
    feb.name = "February".to_string();
    feb.period_start = date(2025, 2, 1);
    feb.period_end = date(2025, 2, 28);
    let feb = engine.create_budget(alice.id, feb).await.unwrap();

    let err = engine
        .update_budget(
            alice.id,
            feb.budget.id,
            BudgetPatch {
                period_start: Some(date(2025, 1, 20)),
                ..BudgetPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    // its own period never counts against it
    engine
        .update_budget(
            alice.id,
            feb.budget.id,
            BudgetPatch {
                period_end: Some(date(2025, 2, 27)),
                ..BudgetPatch::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn family_budget_counts_only_family_spend() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let groceries = system_category(&engine, alice.id, "Groceries & Food").await;

    let personal = engine
        .create_budget(alice.id, january(Some(1000), Vec::new()))
        .await
        .unwrap();
    spend(&engine, alice.id, groceries.id, rupees(100), date(2025, 1, 5)).await;

    let family = engine
        .create_family(alice.id, "Home", None)
        .await
        .unwrap()
        .family;
    let shared = engine
        .create_budget(alice.id, january(Some(1000), Vec::new()))
        .await
        .unwrap();
    spend(&engine, alice.id, groceries.id, rupees(50), date(2025, 1, 6)).await;

    let shared = engine.get_budget(alice.id, shared.budget.id).await.unwrap();
    assert_eq!(shared.budget.family_id, Some(family.id));
    assert_eq!(shared.stats.total_spent, rupees(50));

    // a personal budget keeps every expense of its creator
    engine.clear_active_family(alice.id).await.unwrap();
    let personal = engine.get_budget(alice.id, personal.budget.id).await.unwrap();
    assert_eq!(personal.stats.total_spent, rupees(150));
}
