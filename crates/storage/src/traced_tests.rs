// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::store::WalStore;
use bell_core::{BlastDraft, ReactionId, ReactionKind, Urgency};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("trace")
        .with_test_writer()
        .try_init();
}

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_767_225_600 + secs, 0).unwrap()
}

fn blast() -> Blast {
    Blast::open(
        BlastId("b-1".to_string()),
        BlastDraft {
            household_id: HouseholdId("h-1".to_string()),
            created_by: MemberId("creator".to_string()),
            category_label: "Mail".to_string(),
            event_label: "Check".to_string(),
            urgency: Urgency::Whenever,
        },
        at(0),
    )
}

#[tokio::test]
async fn traced_store_delegates_every_call() {
    init_tracing();
    let store = TracedStore::new(WalStore::in_memory());
    let id = BlastId("b-1".to_string());
    let alice = MemberId("alice".to_string());

    store.insert_blast(blast()).await.unwrap();
    let inserted = store
        .insert_reaction(Reaction {
            id: ReactionId("r-1".to_string()),
            blast_id: id.clone(),
            member_id: alice.clone(),
            kind: ReactionKind::Mine,
            created_at: at(1),
        })
        .await
        .unwrap();
    assert!(matches!(inserted, ReactionInsert::Inserted(_)));

    assert!(matches!(
        store.claim_if_open(&id, &alice, at(2)).await.unwrap(),
        ClaimOutcome::Claimed(_)
    ));
    assert!(matches!(
        store
            .mark_done_if(&id, BlastStatus::Claimed, &alice, at(3))
            .await
            .unwrap(),
        DoneOutcome::Done(_)
    ));

    let listed = store
        .list_blasts(&HouseholdId("h-1".to_string()), Some(BlastStatus::Done))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(store.status_counts().await.unwrap().done, 1);

    // The wrapped store sees the same state
    let inner_view = store.inner.get_blast(&id).await.unwrap().unwrap();
    assert_eq!(inner_view, store.get_blast(&id).await.unwrap().unwrap());
}

#[tokio::test]
async fn traced_store_passes_errors_through() {
    init_tracing();
    let store = TracedStore::new(WalStore::in_memory());
    let err = store
        .claim_if_open(&BlastId("nope".to_string()), &MemberId("a".to_string()), at(0))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::BlastNotFound(_)));
}
