//! Battle lifecycle: encounter creation, reward rolls and death cleanup.

use crate::catalog::Catalogs;
use crate::combatant::{EnemyId, EnemyInstance, Player, RewardInfo, RewardKind};
use crate::dice::DiceRoller;
use crate::error::{CombatError, Result};
use std::sync::Arc;

/// Experience is rolled in `[0, 50]` and shifted by this floor.
pub const EXPERIENCE_FLOOR: i64 = 25;
pub const EXPERIENCE_SPREAD: i64 = 50;
pub const GOLD_RANGE: (i64, i64) = (10, 100);
pub const GEMS_RANGE: (i64, i64) = (0, 5);

/// Creates and tears down encounters on a player's battle session.
#[derive(Clone)]
pub struct BattleManager {
    catalogs: Arc<Catalogs>,
    dice: Arc<dyn DiceRoller>,
}

impl BattleManager {
    pub fn new(catalogs: Arc<Catalogs>, dice: Arc<dyn DiceRoller>) -> Self {
        Self { catalogs, dice }
    }

    /// Make sure the player has something to fight.
    ///
    /// Does nothing while an encounter is active. Returns the id of the
    /// enemy created, if any.
    pub fn load_or_create(&self, player: &mut Player) -> Result<Option<EnemyId>> {
        if !player.battle.is_empty() {
            return Ok(None);
        }
        self.create_encounter(player).map(Some)
    }

    /// Draw an enemy type uniformly from the catalog and add an instance of
    /// it to the player's session.
    pub fn create_encounter(&self, player: &mut Player) -> Result<EnemyId> {
        let table = self.catalogs.enemies.snapshot();
        if table.is_empty() {
            return Err(CombatError::invalid_state("enemy catalog is empty"));
        }

        let last = table.len() as i64 - 1;
        let index = self.dice.inclusive_roll(0, last).clamp(0, last) as usize;
        let Some(definition) = table.values().nth(index) else {
            return Err(CombatError::invalid_state("enemy draw fell outside the catalog"));
        };

        let enemy = EnemyInstance::from_definition(definition, self.generate_rewards());
        tracing::info!(
            player = %player.id,
            enemy = %enemy.kind,
            enemy_id = %enemy.id,
            health = enemy.health,
            "encounter created"
        );
        Ok(player.battle.insert(enemy))
    }

    /// Roll a reward bundle: experience and gold always, gems half the time.
    pub fn generate_rewards(&self) -> Vec<RewardInfo> {
        let mut rewards = vec![
            RewardInfo::new(
                RewardKind::Experience,
                self.dice.inclusive_roll(0, EXPERIENCE_SPREAD) + EXPERIENCE_FLOOR,
            ),
            RewardInfo::new(
                RewardKind::Gold,
                self.dice.inclusive_roll(GOLD_RANGE.0, GOLD_RANGE.1),
            ),
        ];
        if self.dice.inclusive_roll(0, 1) == 1 {
            rewards.push(RewardInfo::new(
                RewardKind::Gems,
                self.dice.inclusive_roll(GEMS_RANGE.0, GEMS_RANGE.1),
            ));
        }
        rewards
    }

    /// Record a kill and drop the enemy from the session.
    ///
    /// Rewards are not credited here; the removed instance still carries
    /// them for whoever does.
    pub fn resolve(&self, player: &mut Player, enemy_id: &EnemyId) -> Option<EnemyInstance> {
        let enemy = player.battle.remove(enemy_id)?;
        player.record_kill(enemy.kind);
        tracing::info!(
            player = %player.id,
            enemy = %enemy.kind,
            kills = player.kills(enemy.kind),
            "enemy defeated"
        );
        Some(enemy)
    }
}
