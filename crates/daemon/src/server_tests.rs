// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bell_core::{BlastStatus, FakeClock, ReactionKind, SequentialIdGen};
use bell_storage::WalStore;
use serde_json::json;

type TestContext = ServerContext<WalStore, FakeClock, SequentialIdGen>;

fn context() -> TestContext {
    ServerContext {
        lifecycle: Lifecycle::new(
            WalStore::in_memory(),
            FakeClock::new(),
            SequentialIdGen::new("id"),
        ),
        start_time: Instant::now(),
        ipc_timeout: Duration::from_secs(1),
        shutdown: Arc::new(Notify::new()),
    }
}

async fn create(ctx: &TestContext) -> String {
    let response = handle_request(
        ctx,
        Request::CreateBlast {
            body: json!({
                "householdId": "h-1",
                "memberId": "alice",
                "categoryLabel": "Kitchen",
                "eventLabel": "Dishwasher needs emptying",
                "urgency": "soon",
            }),
        },
    )
    .await;
    match response {
        Response::Blast { blast } => {
            assert_eq!(blast.blast.status, BlastStatus::Open);
            assert!(blast.reactions.is_empty());
            blast.blast.id.0.clone()
        }
        other => panic!("expected Blast, got {:?}", other),
    }
}

fn expect_error(response: Response) -> (u16, String) {
    match response {
        Response::Error { status, error } => (status, error),
        other => panic!("expected Error, got {:?}", other),
    }
}

#[tokio::test]
async fn ping_and_hello() {
    let ctx = context();
    assert_eq!(handle_request(&ctx, Request::Ping).await, Response::Pong);
    assert_eq!(
        handle_request(
            &ctx,
            Request::Hello {
                version: "0.0.0".to_string()
            }
        )
        .await,
        Response::Hello {
            version: PROTOCOL_VERSION.to_string()
        }
    );
}

#[tokio::test]
async fn claim_then_done_flow() {
    let ctx = context();
    let id = create(&ctx).await;

    let response = handle_request(
        &ctx,
        Request::React {
            blast_id: id.clone(),
            body: json!({ "memberId": "bob", "kind": "MINE" }),
        },
    )
    .await;
    let Response::Reacted { reaction, blast } = response else {
        panic!("expected Reacted");
    };
    assert_eq!(reaction.kind, ReactionKind::Mine);
    assert_eq!(blast.blast.status, BlastStatus::Claimed);
    assert_eq!(blast.reactions.len(), 1);

    let (status, error) = expect_error(
        handle_request(
            &ctx,
            Request::MarkDone {
                blast_id: id.clone(),
                body: json!({ "memberId": "carol" }),
            },
        )
        .await,
    );
    assert_eq!(status, 403);
    assert_eq!(error, "Only the person who claimed this can mark it done");

    let response = handle_request(
        &ctx,
        Request::MarkDone {
            blast_id: id,
            body: json!({ "memberId": "bob" }),
        },
    )
    .await;
    let Response::Blast { blast } = response else {
        panic!("expected Blast");
    };
    assert_eq!(blast.blast.status, BlastStatus::Done);
    assert_eq!(blast.blast.done_by_member_id.as_ref().map(|m| m.0.as_str()), Some("bob"));
}

#[tokio::test]
async fn validation_and_not_found_map_to_status_codes() {
    let ctx = context();

    let (status, error) = expect_error(
        handle_request(&ctx, Request::CreateBlast { body: json!({ "householdId": "h-1" }) }).await,
    );
    assert_eq!((status, error.as_str()), (400, "Missing required fields"));

    let (status, error) = expect_error(
        handle_request(
            &ctx,
            Request::ListBlasts {
                household_id: None,
                status: None,
            },
        )
        .await,
    );
    assert_eq!((status, error.as_str()), (400, "Household ID is required"));

    let (status, error) = expect_error(
        handle_request(
            &ctx,
            Request::React {
                blast_id: "missing".to_string(),
                body: json!({ "memberId": "bob", "kind": "ACK" }),
            },
        )
        .await,
    );
    assert_eq!((status, error.as_str()), (404, "Blast not found"));

    let (status, _) = expect_error(
        handle_request(
            &ctx,
            Request::GetBlast {
                id: "missing".to_string(),
            },
        )
        .await,
    );
    assert_eq!(status, 404);
}

#[tokio::test]
async fn list_filters_by_status_and_status_counts_blasts() {
    let ctx = context();
    let first = create(&ctx).await;
    let _second = create(&ctx).await;
    handle_request(
        &ctx,
        Request::React {
            blast_id: first.clone(),
            body: json!({ "memberId": "bob", "kind": "ON_IT" }),
        },
    )
    .await;

    let Response::Blasts { blasts } = handle_request(
        &ctx,
        Request::ListBlasts {
            household_id: Some("h-1".to_string()),
            status: Some("CLAIMED".to_string()),
        },
    )
    .await
    else {
        panic!("expected Blasts");
    };
    assert_eq!(blasts.len(), 1);
    assert_eq!(blasts[0].blast.id.0, first);

    let Response::Status {
        blasts_open,
        blasts_claimed,
        blasts_done,
        ..
    } = handle_request(&ctx, Request::Status).await
    else {
        panic!("expected Status");
    };
    assert_eq!((blasts_open, blasts_claimed, blasts_done), (1, 1, 0));
}

#[tokio::test]
async fn shutdown_request_notifies() {
    let ctx = context();
    let notified = ctx.shutdown.clone();
    assert_eq!(
        handle_request(&ctx, Request::Shutdown).await,
        Response::ShuttingDown
    );
    // notify_one stores a permit, so a later waiter still wakes
    tokio::time::timeout(Duration::from_secs(1), notified.notified())
        .await
        .unwrap();
}

#[tokio::test]
async fn handle_connection_round_trip() {
    let ctx = context();
    let (client, server) = tokio::io::duplex(64 * 1024);

    let serve = {
        let ctx = ctx.clone();
        tokio::spawn(async move { handle_connection(&ctx, server).await })
    };

    let (mut reader, mut writer) = tokio::io::split(client);
    let data = protocol::encode(&Request::Ping).unwrap();
    protocol::write_message(&mut writer, &data).await.unwrap();
    let bytes = protocol::read_message(&mut reader).await.unwrap();
    let response: Response = protocol::decode(&bytes).unwrap();

    assert_eq!(response, Response::Pong);
    serve.await.unwrap().unwrap();
}

#[tokio::test]
async fn client_closing_early_is_not_an_error() {
    let ctx = context();
    let (client, server) = tokio::io::duplex(64);
    drop(client);

    handle_connection(&ctx, server).await.unwrap();
}

#[tokio::test]
async fn serve_answers_until_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("bell.sock");
    let listener = UnixListener::bind(&socket).unwrap();
    let ctx = context();

    let server = {
        let ctx = ctx.clone();
        tokio::spawn(async move { serve(&listener, &ctx).await })
    };

    for (request, expected) in [
        (Request::Ping, Response::Pong),
        (Request::Shutdown, Response::ShuttingDown),
    ] {
        let stream = tokio::net::UnixStream::connect(&socket).await.unwrap();
        let (mut reader, mut writer) = stream.into_split();
        let data = protocol::encode(&request).unwrap();
        protocol::write_message(&mut writer, &data).await.unwrap();
        let bytes = protocol::read_message(&mut reader).await.unwrap();
        let response: Response = protocol::decode(&bytes).unwrap();
        assert_eq!(response, expected);
    }

    tokio::time::timeout(Duration::from_secs(2), server)
        .await
        .unwrap()
        .unwrap();
}
