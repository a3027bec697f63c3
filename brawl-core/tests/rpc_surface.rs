//! RPC payloads, response shapes and error codes.

use brawl_core::catalog::EnemyDefinition;
use brawl_core::rpc::codes;
use brawl_core::testing::sample_player;
use brawl_core::{EnemyInstance, EnemyKind, RpcRouter, TestHarness};
use serde_json::json;

fn router(harness: &TestHarness) -> RpcRouter {
    RpcRouter::new(harness.service.clone())
}

#[tokio::test]
async fn test_load_game_response_shape() {
    let harness = TestHarness::new();
    let router = router(&harness);

    let response = router.handle("load_game", "u-1", "").await.unwrap();

    let player = &response["player_data"];
    assert_eq!(player["id"], "u-1");
    assert_eq!(player["health"], 100);
    assert_eq!(player["level"], 1);
    let enemies = player["battle_state"]["enemies"].as_object().unwrap();
    assert_eq!(enemies.len(), 1);
    let enemy = enemies.values().next().unwrap();
    assert_eq!(enemy["type"], "zombie");
    assert!(enemy["rewards"].as_array().unwrap().len() >= 2);
}

#[tokio::test]
async fn test_attack_response_shape() {
    let harness = TestHarness::new();
    let router = router(&harness);
    let loaded = router.handle("load_game", "u-1", "").await.unwrap();
    let target_id = loaded["player_data"]["battle_state"]["enemies"]
        .as_object()
        .unwrap()
        .keys()
        .next()
        .unwrap()
        .clone();

    harness.dice.then_succeed().then_succeed();
    let payload = json!({ "target_id": target_id, "attack": "jab" }).to_string();
    let response = router.handle("attack", "u-1", &payload).await.unwrap();

    assert_eq!(response["hit"], true);
    assert_eq!(response["target"]["health"], 48);
    assert_eq!(response["applied_effects"][0]["type"], "dazed");
    assert_eq!(response["applied_effects"][0]["duration"], 30);
    assert_eq!(response["attacker_died"], false);
    assert_eq!(response["target_died"], false);
    assert_eq!(response["player_data"]["id"], "u-1");
}

#[tokio::test]
async fn test_player_info_response_shape() {
    let harness = TestHarness::new();
    let mut player = sample_player("u-2");
    player.health = 61;
    player.record_kill(EnemyKind::Mutant);
    harness.seed_player(&player).await;
    let router = router(&harness);

    let response = router.handle("player_info", "u-2", "").await.unwrap();

    assert_eq!(response["player_health"], 61);
    assert_eq!(response["status_effects"], json!([]));
    assert_eq!(response["battle_stats"]["mutant"], 1);
}

#[tokio::test]
async fn test_error_codes() {
    let harness = TestHarness::new();
    let router = router(&harness);

    let mut player = sample_player("u-3");
    let corpse = EnemyInstance::from_definition(&EnemyDefinition::new(EnemyKind::Zombie, 0, 1.5), Vec::new());
    let corpse_id = player.battle.insert(corpse);
    harness.seed_player(&player).await;

    let cases = [
        ("dance", "u-3", String::new(), codes::INVALID_ARGUMENT),
        ("load_game", "  ", String::new(), codes::INVALID_ARGUMENT),
        ("attack", "u-3", "{".to_string(), codes::INVALID_ARGUMENT),
        (
            "attack",
            "u-3",
            json!({ "target_id": corpse_id.to_string(), "attack": "moonwalk" }).to_string(),
            codes::NOT_FOUND,
        ),
        (
            "attack",
            "u-3",
            json!({ "target_id": "nope", "attack": "jab" }).to_string(),
            codes::NOT_FOUND,
        ),
        (
            "attack",
            "u-3",
            json!({ "target_id": corpse_id.to_string(), "attack": "jab" }).to_string(),
            codes::FAILED_PRECONDITION,
        ),
    ];

    for (rpc, user, payload, code) in cases {
        let err = router.handle(rpc, user, &payload).await.unwrap_err();
        assert_eq!(err.code, code, "{rpc} {payload}");
    }
}

#[tokio::test]
async fn test_reload_catalogs_rpc() {
    let harness = TestHarness::new();
    let router = router(&harness);

    let response = router.handle("reload_catalogs", "admin", "").await.unwrap();

    assert_eq!(response["reloaded"], true);
    // Nothing stored yet, so every catalog keeps its contents.
    assert_eq!(harness.catalogs.attacks.len(), 7);
}
