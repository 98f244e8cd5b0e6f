mod common;

use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, Statement};

use engine::{EngineError, FamilyRole, InviteStatus};

use common::{engine_with_db, register};

#[tokio::test]
async fn creating_a_family_makes_it_active_with_creator_as_admin() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;

    let created = engine.create_family(alice.id, "Home", None).await.unwrap();
    assert!(created.import.is_none());

    let active = engine.active_family(alice.id).await.unwrap().unwrap();
    assert_eq!(active.id, created.family.id);

    let families = engine.list_families(alice.id).await.unwrap();
    assert_eq!(families.len(), 1);
    assert_eq!(families[0].role, FamilyRole::Admin);
    assert_eq!(families[0].member_count, 1);
    assert!(families[0].is_active);

    engine.clear_active_family(alice.id).await.unwrap();
    assert!(engine.active_family(alice.id).await.unwrap().is_none());
}

#[tokio::test]
async fn invite_lifecycle() {
    let (engine, _db, notifier) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let bob = register(&engine, "bob@example.com").await;
    let family = engine
        .create_family(alice.id, "Home", None)
        .await
        .unwrap()
        .family;

    let invite = engine
        .create_invite(alice.id, family.id, "Bob@Example.com", FamilyRole::Member)
        .await
        .unwrap();
    assert_eq!(invite.invited_email, "bob@example.com");
    assert_eq!(invite.status, InviteStatus::Pending);
    assert!(invite.expires_at > Utc::now() + Duration::days(29));
    {
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].token, invite.token);
        assert_eq!(sent[0].family_name, "Home");
    }

    let err = engine
        .create_invite(alice.id, family.id, "bob@example.com", FamilyRole::Viewer)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let preview = engine.invite_preview(&invite.token).await.unwrap();
    assert_eq!(preview.family_name, "Home");
    assert_eq!(engine.pending_invites(bob.id).await.unwrap().len(), 1);

    let joined = engine.accept_invite(bob.id, &invite.token).await.unwrap();
    assert_eq!(joined.id, family.id);
    let bob_now = engine.user(bob.id).await.unwrap();
    assert_eq!(bob_now.active_family_id, Some(family.id));

    let err = engine
        .accept_invite(bob.id, &invite.token)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let members = engine.list_members(alice.id, family.id).await.unwrap();
    assert_eq!(members.len(), 2);

    let err = engine
        .create_invite(alice.id, family.id, "bob@example.com", FamilyRole::Member)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
}

#[tokio::test]
async fn expired_invite_cannot_be_accepted() {
    let (engine, db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let bob = register(&engine, "bob@example.com").await;
    let family = engine
        .create_family(alice.id, "Home", None)
        .await
        .unwrap()
        .family;
    let invite = engine
        .create_invite(alice.id, family.id, "bob@example.com", FamilyRole::Member)
        .await
        .unwrap();

    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "UPDATE family_invites SET expires_at = ? WHERE token = ?",
        vec![
            (Utc::now() - Duration::hours(1)).into(),
            invite.token.clone().into(),
        ],
    ))
    .await
    .unwrap();

    let err = engine
        .accept_invite(bob.id, &invite.token)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Expired(_)));
    assert!(engine.pending_invites(bob.id).await.unwrap().is_empty());

    // An expired invite no longer blocks a fresh one.
    engine
        .create_invite(alice.id, family.id, "bob@example.com", FamilyRole::Member)
        .await
        .unwrap();
}

#[tokio::test]
async fn invite_for_another_email_is_forbidden() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let carol = register(&engine, "carol@example.com").await;
    let family = engine
        .create_family(alice.id, "Home", None)
        .await
        .unwrap()
        .family;
    let invite = engine
        .create_invite(alice.id, family.id, "bob@example.com", FamilyRole::Member)
        .await
        .unwrap();

    let err = engine
        .accept_invite(carol.id, &invite.token)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine
        .accept_invite(carol.id, "no-such-token")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn only_admins_invite_and_manage_roles() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let bob = register(&engine, "bob@example.com").await;
    let family = engine
        .create_family(alice.id, "Home", None)
        .await
        .unwrap()
        .family;
    let invite = engine
        .create_invite(alice.id, family.id, "bob@example.com", FamilyRole::Member)
        .await
        .unwrap();
    engine.accept_invite(bob.id, &invite.token).await.unwrap();

    let err = engine
        .create_invite(bob.id, family.id, "carol@example.com", FamilyRole::Member)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let members = engine.list_members(alice.id, family.id).await.unwrap();
    let alice_membership = members.iter().find(|m| m.user_id == alice.id).unwrap();
    let bob_membership = members.iter().find(|m| m.user_id == bob.id).unwrap();

    let err = engine
        .update_member_role(bob.id, family.id, alice_membership.id, FamilyRole::Viewer)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine
        .update_member_role(alice.id, family.id, alice_membership.id, FamilyRole::Member)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRole(_)));

    let promoted = engine
        .update_member_role(alice.id, family.id, bob_membership.id, FamilyRole::Admin)
        .await
        .unwrap();
    assert_eq!(promoted.role, FamilyRole::Admin);

    let err = engine
        .remove_member(bob.id, family.id, alice_membership.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn cancelled_invite_disappears() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let family = engine
        .create_family(alice.id, "Home", None)
        .await
        .unwrap()
        .family;
    let invite = engine
        .create_invite(alice.id, family.id, "bob@example.com", FamilyRole::Viewer)
        .await
        .unwrap();
    assert_eq!(engine.list_invites(alice.id, family.id).await.unwrap().len(), 1);

    engine
        .cancel_invite(alice.id, family.id, invite.id)
        .await
        .unwrap();
    assert!(engine.list_invites(alice.id, family.id).await.unwrap().is_empty());
    let err = engine.invite_preview(&invite.token).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn leaving_and_deleting() {
    let (engine, _db, _) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let bob = register(&engine, "bob@example.com").await;
    let family = engine
        .create_family(alice.id, "Home", None)
        .await
        .unwrap()
        .family;
    let invite = engine
        .create_invite(alice.id, family.id, "bob@example.com", FamilyRole::Member)
        .await
        .unwrap();
    engine.accept_invite(bob.id, &invite.token).await.unwrap();

    let err = engine.leave_family(alice.id, family.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let err = engine.delete_family(bob.id, family.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    engine.leave_family(bob.id, family.id).await.unwrap();
    assert!(engine.user(bob.id).await.unwrap().active_family_id.is_none());
    assert!(engine.list_families(bob.id).await.unwrap().is_empty());

    engine.delete_family(alice.id, family.id).await.unwrap();
    assert!(engine.active_family(alice.id).await.unwrap().is_none());
    let err = engine.family_detail(alice.id, family.id).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}
