use crate::fixtures::seed::SeededTeam;
use crate::fixtures::test_app::TestApp;
use serde_json::Value;

async fn post(app: &TestApp, channel_id: &str, token: &str, content: &str) -> Value {
    let resp = app
        .auth_post(&format!("/api/channel/{}/message", channel_id), token)
        .json(&serde_json::json!({ "content": content }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    resp.json().await.unwrap()
}

async fn setup() -> (TestApp, SeededTeam, String) {
    let app = TestApp::spawn().await;
    let team = app.seed_team("msg").await;
    let channel_id = team.channels[0].id.clone();
    (app, team, channel_id)
}

#[tokio::test]
async fn posting_assigns_gapless_sequence() {
    let (app, team, channel_id) = setup().await;

    for expected_seq in 1..=3 {
        let msg = post(&app, &channel_id, &team.owner.access_token, "tick").await;
        assert_eq!(msg["seq"], expected_seq);
        assert_eq!(msg["sender"]["username"], team.owner.username);
    }
}

#[tokio::test]
async fn blank_content_is_rejected() {
    let (app, team, channel_id) = setup().await;

    let resp = app
        .auth_post(
            &format!("/api/channel/{}/message", channel_id),
            &team.owner.access_token,
        )
        .json(&serde_json::json!({ "content": "   \n\t " }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn oversized_content_is_rejected() {
    let (app, team, channel_id) = setup().await;

    let resp = app
        .auth_post(
            &format!("/api/channel/{}/message", channel_id),
            &team.owner.access_token,
        )
        .json(&serde_json::json!({ "content": "x".repeat(4001) }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    // Exactly at the limit is fine.
    let resp = app
        .auth_post(
            &format!("/api/channel/{}/message", channel_id),
            &team.owner.access_token,
        )
        .json(&serde_json::json!({ "content": "x".repeat(4000) }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
}

#[tokio::test]
async fn non_member_cannot_post() {
    let (app, _team, channel_id) = setup().await;
    let outsider = app
        .register_user("nm@test.dev", "nm_user", "Nia", "Moss", "Secret123!")
        .await;

    let resp = app
        .auth_post(
            &format!("/api/channel/{}/message", channel_id),
            &outsider.access_token,
        )
        .json(&serde_json::json!({ "content": "knock knock" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn history_pages_read_chronologically() {
    let (app, team, channel_id) = setup().await;

    for i in 1..=30 {
        post(&app, &channel_id, &team.owner.access_token, &format!("m{i}")).await;
    }

    // Page 1 holds the newest 25, in chronological order within the page.
    let resp = app
        .auth_get(
            &format!("/api/channel/{}/message?page=1&per_page=25", channel_id),
            &team.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["total"], 30);
    assert_eq!(json["total_pages"], 2);
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 25);
    assert_eq!(items[0]["seq"], 6);
    assert_eq!(items[24]["seq"], 30);

    // Page 2 holds the oldest five.
    let resp = app
        .auth_get(
            &format!("/api/channel/{}/message?page=2&per_page=25", channel_id),
            &team.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 5);
    assert_eq!(items[0]["seq"], 1);
    assert_eq!(items[4]["seq"], 5);
}

#[tokio::test]
async fn history_requires_membership() {
    let (app, _team, channel_id) = setup().await;
    let outsider = app
        .register_user("hr@test.dev", "hr_user", "Hal", "Reed", "Secret123!")
        .await;

    let resp = app
        .auth_get(
            &format!("/api/channel/{}/message", channel_id),
            &outsider.access_token,
        )
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn sender_can_edit_their_message() {
    let (app, team, channel_id) = setup().await;
    let msg = post(&app, &channel_id, &team.owner.access_token, "tpyo").await;
    let message_id = msg["id"].as_str().unwrap();
    assert!(msg["edited_at"].is_null());

    let resp = app
        .auth_put(
            &format!("/api/message/{}", message_id),
            &team.owner.access_token,
        )
        .json(&serde_json::json!({ "content": "typo" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["content"], "typo");
    assert!(!json["edited_at"].is_null());
    // Position in the stream is unchanged.
    assert_eq!(json["seq"], msg["seq"]);
}

#[tokio::test]
async fn others_cannot_edit_or_delete() {
    let (app, team, channel_id) = setup().await;
    let msg = post(&app, &channel_id, &team.owner.access_token, "mine").await;
    let message_id = msg["id"].as_str().unwrap();

    // The member shares the channel but is not the sender. Both paths
    // answer 404, same as for a message that never existed.
    let resp = app
        .auth_put(
            &format!("/api/message/{}", message_id),
            &team.member.access_token,
        )
        .json(&serde_json::json!({ "content": "hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    let resp = app
        .auth_delete(
            &format!("/api/message/{}", message_id),
            &team.member.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn delete_removes_message_and_repairs_pointer() {
    let (app, team, channel_id) = setup().await;
    let first = post(&app, &channel_id, &team.owner.access_token, "one").await;
    let second = post(&app, &channel_id, &team.owner.access_token, "two").await;
    let second_id = second["id"].as_str().unwrap();

    let resp = app
        .auth_delete(
            &format!("/api/message/{}", second_id),
            &team.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let resp = app
        .auth_get(
            &format!("/api/channel/{}/message", channel_id),
            &team.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["total"], 1);
    assert_eq!(json["items"][0]["id"], first["id"]);

    // The channel's last-message pointer falls back to the survivor.
    let resp = app
        .auth_get(
            &format!("/api/team/{}/channel", team.team_id),
            &team.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    let channels: Vec<Value> = resp.json().await.unwrap();
    let channel = channels
        .iter()
        .find(|c| c["id"] == channel_id.as_str())
        .unwrap();
    assert_eq!(channel["last_message_id"], first["id"]);
}

#[tokio::test]
async fn replies_must_stay_in_the_same_channel() {
    let (app, team, channel_id) = setup().await;
    let parent = post(&app, &channel_id, &team.owner.access_token, "root").await;
    let other_channel = &team.channels[1].id;

    // Reply in the same channel works and carries the parent id.
    let resp = app
        .auth_post(
            &format!("/api/channel/{}/message", channel_id),
            &team.owner.access_token,
        )
        .json(&serde_json::json!({ "content": "reply", "parent_id": parent["id"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let reply: Value = resp.json().await.unwrap();
    assert_eq!(reply["parent_id"], parent["id"]);

    // A reply targeting a parent from another channel is invalid.
    let resp = app
        .auth_post(
            &format!("/api/channel/{}/message", other_channel),
            &team.owner.access_token,
        )
        .json(&serde_json::json!({ "content": "stray", "parent_id": parent["id"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}
