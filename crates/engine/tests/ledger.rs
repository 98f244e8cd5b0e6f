mod common;

use engine::{
    AssetNew, AssetType, AssetValuationNew, BudgetNew, CardNetwork, CategoryNew, CategoryType,
    CreditSourceNew, EngineError, FamilyRole, FinancialGoalNew, FinancialGoalPatch, GoalFilter,
    GoalStatus, GoalType, ImportOptions, Money, PageRequest, PaymentMethod, TagNew,
    TransactionFilter, TransactionPatch, TransactionType,
};

use common::{date, engine_with_db, expense, register, rupees, spend, system_category};

#[tokio::test]
async fn transactions_filter_and_page() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let groceries = system_category(&engine, alice.id, "Groceries & Food").await;
    let dining = system_category(&engine, alice.id, "Dining & Restaurants").await;

    let mut bazaar = expense(groceries.id, rupees(1200), date(2025, 1, 5));
    bazaar.payee = Some("Big Bazaar".to_string());
    let bazaar = engine.create_transaction(alice.id, bazaar).await.unwrap();
    spend(&engine, alice.id, dining.id, rupees(300), date(2025, 1, 9)).await;
    spend(&engine, alice.id, groceries.id, rupees(450), date(2025, 2, 2)).await;

    let by_search = engine
        .list_transactions(
            alice.id,
            &TransactionFilter {
                search: Some("bazaar".to_string()),
                ..TransactionFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_search.total, 1);
    assert_eq!(by_search.items[0].id, bazaar.id);
    assert!(by_search.items[0].is_paid);

    let january_groceries = engine
        .list_transactions(
            alice.id,
            &TransactionFilter {
                start_date: Some(date(2025, 1, 1)),
                end_date: Some(date(2025, 1, 31)),
                category_id: Some(groceries.id),
                ..TransactionFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(january_groceries.total, 1);

    let incomes = engine
        .list_transactions(
            alice.id,
            &TransactionFilter {
                transaction_type: Some(TransactionType::Income),
                ..TransactionFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(incomes.total, 0);

    let first_page = engine
        .list_transactions(
            alice.id,
            &TransactionFilter::default(),
            PageRequest::new(Some(1), Some(2), 20).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(first_page.total, 3);
    assert_eq!(first_page.total_pages, 2);
    assert_eq!(first_page.items.len(), 2);
    // newest first
    assert_eq!(first_page.items[0].t_date, date(2025, 2, 2));
}

#[tokio::test]
async fn transaction_validation_and_tags() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let groceries = system_category(&engine, alice.id, "Groceries & Food").await;

    let err = engine
        .create_transaction(alice.id, expense(groceries.id, Money::ZERO, date(2025, 1, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .create_transaction(
            alice.id,
            expense(uuid::Uuid::new_v4(), rupees(10), date(2025, 1, 1)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidReference(_)));

    let tag = engine
        .create_tag(
            alice.id,
            TagNew {
                name: "weekly".to_string(),
                family_id: None,
                color: None,
            },
        )
        .await
        .unwrap();
    let err = engine
        .create_tag(
            alice.id,
            TagNew {
                name: "weekly".to_string(),
                family_id: None,
                color: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let mut tagged = expense(groceries.id, rupees(100), date(2025, 1, 3));
    tagged.tag_ids = vec![tag.id, tag.id];
    let tx = engine.create_transaction(alice.id, tagged).await.unwrap();
    assert_eq!(tx.tag_ids, vec![tag.id]);

    let updated = engine
        .update_transaction(
            alice.id,
            tx.id,
            TransactionPatch {
                amount: Some(rupees(150)),
                tag_ids: Some(Vec::new()),
                ..TransactionPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.amount, rupees(150));
    assert!(updated.tag_ids.is_empty());
    let reloaded = engine.get_transaction(alice.id, tx.id).await.unwrap();
    assert!(reloaded.tag_ids.is_empty());
}

#[tokio::test]
async fn family_records_are_shared_and_viewers_only_read() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let bob = register(&engine, "bob@example.com").await;
    let carol = register(&engine, "carol@example.com").await;
    let groceries = system_category(&engine, alice.id, "Groceries & Food").await;

    // personal record stays out of the family
    let personal = spend(&engine, alice.id, groceries.id, rupees(10), date(2025, 1, 1)).await;

    let family = engine
        .create_family(alice.id, "Home", None)
        .await
        .unwrap()
        .family;
    for (user, role) in [(&bob, FamilyRole::Viewer), (&carol, FamilyRole::Member)] {
        let invite = engine
            .create_invite(alice.id, family.id, &user.email, role)
            .await
            .unwrap();
        engine.accept_invite(user.id, &invite.token).await.unwrap();
    }

    let shared = spend(&engine, alice.id, groceries.id, rupees(500), date(2025, 1, 2)).await;
    assert_eq!(shared.family_id, Some(family.id));

    for viewer in [bob.id, carol.id] {
        let page = engine
            .list_transactions(viewer, &TransactionFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, shared.id);
    }
    let err = engine
        .get_transaction(bob.id, personal.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = engine
        .create_transaction(bob.id, expense(groceries.id, rupees(5), date(2025, 1, 3)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine
        .delete_transaction(carol.id, shared.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let own = spend(&engine, carol.id, groceries.id, rupees(20), date(2025, 1, 4)).await;
    engine.delete_transaction(alice.id, own.id).await.unwrap();
}

#[tokio::test]
async fn import_moves_personal_records_once() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let groceries = system_category(&engine, alice.id, "Groceries & Food").await;

    let in_range = spend(&engine, alice.id, groceries.id, rupees(100), date(2025, 1, 15)).await;
    let out_of_range =
        spend(&engine, alice.id, groceries.id, rupees(200), date(2025, 3, 15)).await;
    engine
        .create_credit_source(
            alice.id,
            CreditSourceNew {
                family_id: None,
                card_name: "Travel card".to_string(),
                card_last4: "4242".to_string(),
                card_network: CardNetwork::Visa,
                credit_limit: rupees(100_000),
                billing_day: 5,
                due_day: 25,
            },
        )
        .await
        .unwrap();

    let options = ImportOptions {
        transactions: true,
        credit_sources: true,
        from_date: Some(date(2025, 1, 1)),
        to_date: Some(date(2025, 1, 31)),
        ..ImportOptions::default()
    };
    let created = engine
        .create_family(alice.id, "Home", Some(options))
        .await
        .unwrap();
    let report = created.import.unwrap();
    assert_eq!(report.transactions, 1);
    assert_eq!(report.credit_sources, 1);

    let family_view = engine
        .list_transactions(alice.id, &TransactionFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(family_view.total, 1);
    assert_eq!(family_view.items[0].id, in_range.id);
    assert_eq!(engine.list_credit_sources(alice.id, true).await.unwrap().len(), 1);

    let again = engine
        .migrate_ownership(
            alice.id,
            created.family.id,
            ImportOptions {
                transactions: true,
                ..ImportOptions::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(again.id, report.id);

    engine.clear_active_family(alice.id).await.unwrap();
    let personal_view = engine
        .list_transactions(alice.id, &TransactionFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(personal_view.total, 1);
    assert_eq!(personal_view.items[0].id, out_of_range.id);
}

#[tokio::test]
async fn imported_transactions_bring_their_card() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let bob = register(&engine, "bob@example.com").await;
    let groceries = system_category(&engine, alice.id, "Groceries & Food").await;

    let card = |name: &str, last4: &str| CreditSourceNew {
        family_id: None,
        card_name: name.to_string(),
        card_last4: last4.to_string(),
        card_network: CardNetwork::Visa,
        credit_limit: rupees(50_000),
        billing_day: 5,
        due_day: 25,
    };
    let charged = engine
        .create_credit_source(alice.id, card("Daily card", "1111"))
        .await
        .unwrap();
    let unused = engine
        .create_credit_source(alice.id, card("Spare card", "2222"))
        .await
        .unwrap();

    let mut swipe = expense(groceries.id, rupees(900), date(2025, 1, 12));
    swipe.payment_method = PaymentMethod::CreditCard;
    swipe.credit_source_id = Some(charged.id);
    let swipe = engine.create_transaction(alice.id, swipe).await.unwrap();

    let created = engine
        .create_family(
            alice.id,
            "Home",
            Some(ImportOptions {
                transactions: true,
                ..ImportOptions::default()
            }),
        )
        .await
        .unwrap();
    let report = created.import.unwrap();
    assert_eq!(report.transactions, 1);
    assert_eq!(report.credit_sources, 1);

    let invite = engine
        .create_invite(alice.id, created.family.id, &bob.email, FamilyRole::Viewer)
        .await
        .unwrap();
    engine.accept_invite(bob.id, &invite.token).await.unwrap();

    let seen = engine.get_transaction(bob.id, swipe.id).await.unwrap();
    let card = engine
        .get_credit_source(bob.id, seen.credit_source_id.unwrap())
        .await
        .unwrap();
    assert_eq!(card.family_id, Some(created.family.id));

    let err = engine.get_credit_source(bob.id, unused.id).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn import_skips_budgets_that_would_overlap() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let family = engine
        .create_family(alice.id, "Home", None)
        .await
        .unwrap()
        .family;

    let budget = |name: &str| BudgetNew {
        name: name.to_string(),
        family_id: None,
        period_start: date(2025, 1, 1),
        period_end: date(2025, 1, 31),
        total_budget: Some(rupees(1000)),
        needs_budget: None,
        wants_budget: None,
        savings_budget: None,
        alert_threshold_percent: None,
        is_active: None,
        allocations: Vec::new(),
    };
    engine.create_budget(alice.id, budget("Family")).await.unwrap();
    engine.clear_active_family(alice.id).await.unwrap();
    engine.create_budget(alice.id, budget("Mine")).await.unwrap();

    let report = engine
        .migrate_ownership(
            alice.id,
            family.id,
            ImportOptions {
                budgets: true,
                ..ImportOptions::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(report.budgets, 0);
    assert_eq!(report.budgets_skipped, 1);

    let err = engine
        .migrate_ownership(
            alice.id,
            family.id,
            ImportOptions {
                from_date: Some(date(2025, 2, 1)),
                to_date: Some(date(2025, 1, 1)),
                ..ImportOptions::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidPeriod(_)));
}

#[tokio::test]
async fn custom_categories_live_in_families() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let new = CategoryNew {
        name: "School fees".to_string(),
        parent_category_id: None,
        category_type: CategoryType::Expense,
        budget_classification: None,
        icon: None,
        color: None,
        display_order: None,
    };

    let err = engine
        .create_category(alice.id, new.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    engine.create_family(alice.id, "Home", None).await.unwrap();
    let custom = engine.create_category(alice.id, new).await.unwrap();
    assert!(!custom.is_system);

    spend(&engine, alice.id, custom.id, rupees(50), date(2025, 1, 1)).await;
    let err = engine
        .delete_category(alice.id, custom.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let groceries = system_category(&engine, alice.id, "Groceries & Food").await;
    let err = engine
        .delete_category(alice.id, groceries.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    assert_eq!(engine.seed_system_categories().await.unwrap(), 0);
}

#[tokio::test]
async fn newest_valuation_sets_current_price() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let asset = engine
        .create_asset(
            alice.id,
            AssetNew {
                family_id: None,
                asset_type: AssetType::Stock,
                name: "INFY".to_string(),
                symbol_isin: None,
                quantity_milli: 10_000,
                purchase_price: rupees(1400),
                current_price: None,
                purchase_date: Some(date(2024, 6, 1)),
                maturity_date: None,
                interest_rate_bps: None,
                risk_level: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    let valuation = engine
        .add_valuation(
            alice.id,
            asset.id,
            AssetValuationNew {
                valuation_date: date(2025, 1, 31),
                price_per_unit: rupees(1500),
                source: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(valuation.total_value, rupees(15_000));

    engine
        .add_valuation(
            alice.id,
            asset.id,
            AssetValuationNew {
                valuation_date: date(2024, 12, 31),
                price_per_unit: rupees(1300),
                source: None,
            },
        )
        .await
        .unwrap();
    let err = engine
        .add_valuation(
            alice.id,
            asset.id,
            AssetValuationNew {
                valuation_date: date(2025, 1, 31),
                price_per_unit: rupees(1600),
                source: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let reloaded = engine.get_asset(alice.id, asset.id).await.unwrap();
    assert_eq!(reloaded.current_price, Some(rupees(1500)));
    let history = engine.list_valuations(alice.id, asset.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].valuation_date, date(2025, 1, 31));
}

#[tokio::test]
async fn goal_progress_tracks_current_amount() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let goal = engine
        .create_goal(
            alice.id,
            FinancialGoalNew {
                family_id: None,
                goal_name: "Emergency fund".to_string(),
                goal_type: GoalType::EmergencyFund,
                target_amount: rupees(1000),
                current_amount: Some(rupees(250)),
                target_date: None,
                priority: None,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(goal.progress_percent, Some(25.0));
    assert_eq!(goal.status, GoalStatus::InProgress);

    let done = engine
        .update_goal(
            alice.id,
            goal.id,
            FinancialGoalPatch {
                current_amount: Some(rupees(1000)),
                status: Some(GoalStatus::Completed),
                ..FinancialGoalPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(done.progress_percent, Some(100.0));

    let completed = engine
        .list_goals(
            alice.id,
            GoalFilter {
                status: Some(GoalStatus::Completed),
            },
        )
        .await
        .unwrap();
    assert_eq!(completed.len(), 1);
}

#[tokio::test]
async fn summary_nets_scope_income_against_expenses() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let bob = register(&engine, "bob@example.com").await;
    let groceries = system_category(&engine, alice.id, "Groceries & Food").await;
    let salary = engine
        .list_categories(alice.id, Some(CategoryType::Income))
        .await
        .unwrap()
        .into_iter()
        .find(|category| category.name == "Salary & Wages")
        .unwrap();

    let mut payday = expense(salary.id, rupees(60_000), date(2025, 1, 1));
    payday.transaction_type = TransactionType::Income;
    engine.create_transaction(alice.id, payday).await.unwrap();
    spend(&engine, alice.id, groceries.id, rupees(1_500), date(2025, 1, 10)).await;
    spend(&engine, alice.id, groceries.id, rupees(500), date(2025, 1, 20)).await;
    spend(&engine, alice.id, groceries.id, rupees(700), date(2025, 2, 3)).await;
    // someone else's spending never shows up
    spend(&engine, bob.id, groceries.id, rupees(9_999), date(2025, 1, 15)).await;

    let january = engine
        .transaction_summary(alice.id, Some(date(2025, 1, 1)), Some(date(2025, 1, 31)))
        .await
        .unwrap();
    assert_eq!(january.total_income, rupees(60_000));
    assert_eq!(january.total_expenses, rupees(2_000));
    assert_eq!(january.net_savings, rupees(58_000));
    assert_eq!(january.income_count, 1);
    assert_eq!(january.expense_count, 2);
    assert_eq!(january.total_transactions, 3);

    let all_time = engine.transaction_summary(alice.id, None, None).await.unwrap();
    assert_eq!(all_time.total_expenses, rupees(2_700));
    assert_eq!(all_time.expense_count, 3);

    let empty = engine
        .transaction_summary(alice.id, Some(date(2024, 1, 1)), Some(date(2024, 1, 31)))
        .await
        .unwrap();
    assert_eq!(empty.total_income, Money::ZERO);
    assert_eq!(empty.total_transactions, 0);

    let err = engine
        .transaction_summary(alice.id, Some(date(2025, 2, 1)), Some(date(2025, 1, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidPeriod(_)));
}

#[tokio::test]
async fn merchant_codes_suggest_a_category() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let groceries = system_category(&engine, alice.id, "Groceries & Food").await;

    // already seeded once by the fixture
    assert_eq!(engine.seed_merchant_categories().await.unwrap(), 0);

    let supermarket = engine.merchant_category("5411").await.unwrap();
    assert_eq!(supermarket.description, "Grocery Stores, Supermarkets");
    assert_eq!(supermarket.suggested_category_id, Some(groceries.id));

    let codes = engine.list_merchant_categories().await.unwrap();
    assert_eq!(codes.len(), 16);
    assert_eq!(codes[0].mcc_code, "4111");

    let err = engine.merchant_category("1234").await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    let err = engine.merchant_category("54A1").await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidValue(_)));
}
