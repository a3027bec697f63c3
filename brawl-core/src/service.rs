//! GameService - the request-level API of the combat engine.
//!
//! Wraps the resolver, the battle manager and persistence into one entry
//! point. Every mutating operation runs load, mutate, save under a
//! per-player lock, so two requests for the same player never interleave
//! inside one process.

use crate::catalog::{AttackKind, Catalogs, EnemyKind};
use crate::combat::{AttackOutcome, CombatResolver, ResolutionHook};
use crate::combatant::{EnemyId, Player, PlayerId};
use crate::config::EngineConfig;
use crate::dice::DiceRoller;
use crate::effects::{EffectProcessor, StatusEffectInstance};
use crate::error::Result;
use crate::persist::Persistence;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Idle lock-table entries are dropped once the table grows past this size.
const LOCK_TABLE_PRUNE_THRESHOLD: usize = 1024;

/// Source of the current time in unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        use std::time::{SystemTime, UNIX_EPOCH};

        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default()
    }
}

/// Result of an attack request.
#[derive(Debug, Clone, Serialize)]
pub struct AttackReport {
    /// The attacker as saved.
    pub player: Player,
    pub outcome: AttackOutcome,
}

/// Read-only summary of a player's combat state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerInfo {
    pub player_health: i64,
    pub status_effects: Vec<StatusEffectInstance>,
    pub battle_stats: HashMap<EnemyKind, u32>,
}

impl From<&Player> for PlayerInfo {
    fn from(player: &Player) -> Self {
        Self {
            player_health: player.health,
            status_effects: player.status_effects.clone(),
            battle_stats: player.battle_stats.clone(),
        }
    }
}

/// The combat engine as seen by a transport layer.
pub struct GameService {
    config: EngineConfig,
    store: Arc<dyn Persistence>,
    catalogs: Arc<Catalogs>,
    clock: Arc<dyn Clock>,
    resolver: CombatResolver,
    hooks: Vec<Arc<dyn ResolutionHook>>,
    locks: Mutex<HashMap<PlayerId, Arc<AsyncMutex<()>>>>,
}

impl GameService {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn Persistence>,
        catalogs: Arc<Catalogs>,
        dice: Arc<dyn DiceRoller>,
    ) -> Self {
        let effects =
            EffectProcessor::new(catalogs.clone(), dice.clone()).with_policy(config.apply_policy);
        let resolver = CombatResolver::new(catalogs.clone(), dice, effects);

        Self {
            config,
            store,
            catalogs,
            clock: Arc::new(SystemClock),
            resolver,
            hooks: Vec::new(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Load catalogs from `store` (seeding defaults where missing) and build
    /// a service with dice from `config`.
    pub async fn bootstrap(config: EngineConfig, store: Arc<dyn Persistence>) -> Result<Self> {
        let catalogs = Catalogs::bootstrap(store.as_ref()).await?;
        let dice: Arc<dyn DiceRoller> = Arc::new(config.dice());
        tracing::info!(
            environment = %config.environment,
            policy = %config.apply_policy,
            attacks = catalogs.attacks.len(),
            enemies = catalogs.enemies.len(),
            "game service ready"
        );
        Ok(Self::new(config, store, Arc::new(catalogs), dice))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register a hook to run after every attack.
    pub fn with_hook(mut self, hook: Arc<dyn ResolutionHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn catalogs(&self) -> &Arc<Catalogs> {
        &self.catalogs
    }

    /// Resolve an attack by `player_id` on one of its active enemies.
    pub async fn attack_action(
        &self,
        player_id: &PlayerId,
        target_id: &EnemyId,
        attack: AttackKind,
    ) -> Result<AttackReport> {
        let _guard = self.lock_player(player_id).await;
        let now = self.clock.now();
        let mut player = self.load_or_new(player_id, now).await?;

        let outcome = self
            .resolver
            .attack_action(&mut player, target_id, attack, now)?;
        for hook in &self.hooks {
            hook.after_attack(&mut player, &outcome, now);
        }

        player.updated_at = now;
        self.store.save_player(&player).await?;
        Ok(AttackReport { player, outcome })
    }

    /// Load the player, starting an encounter if none is active.
    pub async fn load_or_create_encounter(&self, player_id: &PlayerId) -> Result<Player> {
        let _guard = self.lock_player(player_id).await;
        let now = self.clock.now();
        let mut player = self.load_or_new(player_id, now).await?;

        self.resolver.battles().load_or_create(&mut player)?;

        player.updated_at = now;
        self.store.save_player(&player).await?;
        Ok(player)
    }

    /// Health, effects and kill stats. Never saves.
    pub async fn player_info(&self, player_id: &PlayerId) -> Result<PlayerInfo> {
        let player = self.load_or_new(player_id, self.clock.now()).await?;
        Ok(PlayerInfo::from(&player))
    }

    /// Re-read the catalog tables from storage.
    pub async fn reload_catalogs(&self) -> Result<()> {
        self.catalogs.reload(self.store.as_ref()).await
    }

    async fn load_or_new(&self, player_id: &PlayerId, now: i64) -> Result<Player> {
        if let Some(player) = self.store.load_player(player_id).await? {
            return Ok(player);
        }
        tracing::info!(player = %player_id, "creating new player");
        Ok(Player::new(
            player_id.clone(),
            player_id.as_str(),
            self.config.starting_health,
            now,
        ))
    }

    async fn lock_player(&self, player_id: &PlayerId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            if locks.len() >= LOCK_TABLE_PRUNE_THRESHOLD {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(
                locks
                    .entry(player_id.clone())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn lock_table_len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;
    use crate::testing::ScriptedDice;

    fn service() -> GameService {
        GameService::new(
            EngineConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(Catalogs::with_defaults()),
            Arc::new(ScriptedDice::new()),
        )
    }

    #[tokio::test]
    async fn test_player_info_does_not_save() {
        let store = Arc::new(MemoryStore::new());
        let service = GameService::new(
            EngineConfig::default().with_starting_health(80),
            store.clone(),
            Arc::new(Catalogs::with_defaults()),
            Arc::new(ScriptedDice::new()),
        );

        let info = service.player_info(&PlayerId::new("new")).await.unwrap();

        assert_eq!(info.player_health, 80);
        assert!(info.status_effects.is_empty());
        assert_eq!(store.player_count().await, 0);
    }

    #[tokio::test]
    async fn test_lock_table_prunes_idle_entries() {
        let service = service();
        for i in 0..LOCK_TABLE_PRUNE_THRESHOLD + 10 {
            let _guard = service.lock_player(&PlayerId::new(format!("p{i}"))).await;
        }
        assert!(service.lock_table_len() <= LOCK_TABLE_PRUNE_THRESHOLD);
    }

    #[tokio::test]
    async fn test_held_lock_survives_pruning() {
        let service = service();
        let held = service.lock_player(&PlayerId::new("busy")).await;
        for i in 0..LOCK_TABLE_PRUNE_THRESHOLD + 10 {
            let _guard = service.lock_player(&PlayerId::new(format!("p{i}"))).await;
        }

        let locks = service.locks.lock().unwrap();
        let entry = locks.get(&PlayerId::new("busy")).unwrap();
        assert!(entry.try_lock().is_err());
        drop(locks);
        drop(held);
    }

    #[test]
    fn test_system_clock_is_recent() {
        assert!(SystemClock.now() > 1_600_000_000);
    }
}
