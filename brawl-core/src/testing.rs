//! Testing utilities for the combat engine.
//!
//! This module provides tools for deterministic tests:
//! - `ScriptedDice` for forcing roll outcomes
//! - `FixedClock` for controlling time
//! - `TestHarness` for driving the game service end to end

use crate::catalog::Catalogs;
use crate::combatant::{EnemyId, Player, PlayerId};
use crate::config::EngineConfig;
use crate::dice::{DiceRoller, CHANCE_ROLL_SPACE};
use crate::persist::{MemoryStore, Persistence};
use crate::service::{Clock, GameService};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Dice that replay queued rolls in order.
///
/// A queued value outside the requested range is clamped into it. When the
/// queue runs dry every roll returns the low bound, which makes any
/// probability check with a positive chance succeed.
#[derive(Default)]
pub struct ScriptedDice {
    rolls: Mutex<VecDeque<i64>>,
}

impl ScriptedDice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dice preloaded with `rolls`.
    pub fn with_rolls(rolls: impl IntoIterator<Item = i64>) -> Self {
        Self {
            rolls: Mutex::new(rolls.into_iter().collect()),
        }
    }

    /// Queue a raw roll.
    pub fn push_roll(&self, roll: i64) -> &Self {
        self.queue().push_back(roll);
        self
    }

    /// Queue a roll that passes the next probability check.
    pub fn then_succeed(&self) -> &Self {
        self.push_roll(0)
    }

    /// Queue a roll that fails the next probability check.
    pub fn then_fail(&self) -> &Self {
        self.push_roll(CHANCE_ROLL_SPACE)
    }

    /// Rolls not yet consumed.
    pub fn remaining(&self) -> usize {
        self.queue().len()
    }

    fn queue(&self) -> std::sync::MutexGuard<'_, VecDeque<i64>> {
        self.rolls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DiceRoller for ScriptedDice {
    fn roll_range(&self, low: i64, high: i64) -> i64 {
        match self.queue().pop_front() {
            Some(roll) => roll.clamp(low, high),
            None => low,
        }
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move the clock forward by `seconds`, returning the new time.
    pub fn advance(&self, seconds: i64) -> i64 {
        self.now.fetch_add(seconds, Ordering::SeqCst) + seconds
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// A fresh player with default starting values.
pub fn sample_player(id: &str) -> Player {
    Player::new(PlayerId::new(id), id, EngineConfig::default().starting_health, 0)
}

/// A game service wired to in-memory storage, scripted dice and a fixed
/// clock.
pub struct TestHarness {
    pub service: Arc<GameService>,
    pub store: Arc<MemoryStore>,
    pub dice: Arc<ScriptedDice>,
    pub clock: Arc<FixedClock>,
    pub catalogs: Arc<Catalogs>,
}

/// Start time of every harness clock.
pub const HARNESS_EPOCH: i64 = 1_700_000_000;

impl TestHarness {
    /// Harness with the built-in catalogs.
    pub fn new() -> Self {
        Self::with_catalogs(Catalogs::with_defaults())
    }

    pub fn with_catalogs(catalogs: Catalogs) -> Self {
        Self::with_config(EngineConfig::default(), catalogs)
    }

    pub fn with_config(config: EngineConfig, catalogs: Catalogs) -> Self {
        let store = Arc::new(MemoryStore::new());
        let dice = Arc::new(ScriptedDice::new());
        let clock = Arc::new(FixedClock::new(HARNESS_EPOCH));
        let catalogs = Arc::new(catalogs);
        let service = GameService::new(config, store.clone(), catalogs.clone(), dice.clone())
            .with_clock(clock.clone());
        let service = Arc::new(service);

        Self {
            service,
            store,
            dice,
            clock,
            catalogs,
        }
    }

    /// Store `player` as-is, replacing whatever was saved.
    pub async fn seed_player(&self, player: &Player) {
        if let Err(e) = self.store.save_player(player).await {
            panic!("seeding player {} failed: {e}", player.id);
        }
    }

    /// The stored copy of a player.
    pub async fn stored_player(&self, id: &PlayerId) -> Option<Player> {
        match self.store.load_player(id).await {
            Ok(player) => player,
            Err(e) => panic!("loading player {id} failed: {e}"),
        }
    }

    /// Start an encounter for `id` and return the enemy's id.
    pub async fn start_encounter(&self, id: &PlayerId) -> EnemyId {
        let player = match self.service.load_or_create_encounter(id).await {
            Ok(player) => player,
            Err(e) => panic!("encounter for {id} failed: {e}"),
        };
        match player.battle.enemies.keys().next() {
            Some(enemy_id) => *enemy_id,
            None => panic!("encounter for {id} produced no enemy"),
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
