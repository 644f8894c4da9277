use crate::fixtures::test_app::TestApp;
use crate::fixtures::ws::WsClient;
use serde_json::json;

/// Two writers race on one channel; a subscriber must observe a single total
/// order: sequence numbers 1..=N with no gap, no duplicate, and delivery in
/// exactly that order.
#[tokio::test]
async fn concurrent_writers_yield_one_total_order() {
    let app = TestApp::spawn().await;
    let team = app.seed_team("order").await;
    let channel_id = team.channels[0].id.clone();

    let mut observer_ws = WsClient::connect(&app, &team.owner.access_token).await;
    observer_ws.join_channel(&channel_id).await;

    let posts_per_writer = 10u64;
    let mut handles = Vec::new();
    for token in [
        team.owner.access_token.clone(),
        team.member.access_token.clone(),
    ] {
        let client = app.client.clone();
        let url = app.url(&format!("/api/channel/{}/message", channel_id));
        handles.push(tokio::spawn(async move {
            for i in 0..posts_per_writer {
                let resp = client
                    .post(&url)
                    .header("Authorization", format!("Bearer {}", token))
                    .json(&json!({ "content": format!("burst {i}") }))
                    .send()
                    .await
                    .expect("Post failed");
                assert_eq!(resp.status().as_u16(), 201);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let total = posts_per_writer * 2;
    let mut seqs = Vec::with_capacity(total as usize);
    for _ in 0..total {
        let frame = observer_ws.recv_type("message-created").await;
        seqs.push(frame["data"]["seq"].as_u64().unwrap());
    }

    // Delivery order equals commit order equals the gapless sequence.
    let expected: Vec<u64> = (1..=total).collect();
    assert_eq!(seqs, expected);
}

#[tokio::test]
async fn sequence_numbers_are_never_reused() {
    let app = TestApp::spawn().await;
    let team = app.seed_team("seqgap").await;
    let channel_id = team.channels[0].id.clone();

    let mut last_id = String::new();
    for _ in 0..3 {
        let resp = app
            .auth_post(
                &format!("/api/channel/{}/message", channel_id),
                &team.owner.access_token,
            )
            .json(&json!({ "content": "tick" }))
            .send()
            .await
            .unwrap();
        let msg: serde_json::Value = resp.json().await.unwrap();
        last_id = msg["id"].as_str().unwrap().to_string();
    }

    let resp = app
        .auth_delete(
            &format!("/api/message/{}", last_id),
            &team.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    // The counter keeps climbing past deleted history.
    let resp = app
        .auth_post(
            &format!("/api/channel/{}/message", channel_id),
            &team.owner.access_token,
        )
        .json(&json!({ "content": "tock" }))
        .send()
        .await
        .unwrap();
    let msg: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(msg["seq"], 4);
}
