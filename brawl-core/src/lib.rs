//! Turn-based combat resolution engine.
//!
//! This crate provides:
//! - Attack resolution with probabilistic hits and on-hit status effects
//! - Status effects with periodic damage, expiry and optional stacking
//! - Encounter creation, reward rolls and death cleanup
//! - Catalogs of attacks, effects and enemies with live reload
//! - Player persistence and a JSON RPC surface
//!
//! # Quick Start
//!
//! ```ignore
//! use brawl_core::{EngineConfig, GameService, JsonFileStore, RpcRouter};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::from_env()?;
//!     let store = Arc::new(JsonFileStore::new(&config.data_dir));
//!     let service = GameService::bootstrap(config, store).await?;
//!
//!     let router = RpcRouter::new(Arc::new(service));
//!     let game = router.handle("load_game", "player-1", "").await?;
//!     println!("{game}");
//!     Ok(())
//! }
//! ```

pub mod battle;
pub mod catalog;
pub mod combat;
pub mod combatant;
pub mod config;
pub mod dice;
pub mod effects;
pub mod error;
pub mod persist;
pub mod rpc;
pub mod service;
pub mod testing;

// Primary public API
pub use battle::BattleManager;
pub use catalog::{
    AttackDefinition, AttackKind, Catalog, Catalogs, EnemyDefinition, EnemyKind,
    StatusEffectDefinition, StatusEffectKind,
};
pub use combat::{AttackOutcome, CombatResolver, ResolutionHook};
pub use combatant::{BattleSession, Combatant, EnemyId, EnemyInstance, Player, PlayerId, RewardInfo, RewardKind};
pub use config::{ConfigError, EngineConfig, Environment};
pub use dice::{Dice, DiceRoller};
pub use effects::{ApplyPolicy, EffectProcessor, StatusEffectInstance};
pub use error::{CombatError, Result};
pub use persist::{JsonFileStore, MemoryStore, PersistError, Persistence};
pub use rpc::{AttackRequest, RpcError, RpcRouter};
pub use service::{AttackReport, Clock, GameService, PlayerInfo, SystemClock};
pub use testing::{FixedClock, ScriptedDice, TestHarness};
