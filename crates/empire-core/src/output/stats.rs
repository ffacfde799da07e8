//! Statistics Output
//!
//! HUD counters computed from the current world.

use empire_events::{AgentStateKind, GameStats, QuestStatus};

use crate::store::WorldStore;

/// Aggregate agent, dragon and quest counts
pub fn compute_stats(store: &WorldStore) -> GameStats {
    let agents = store.agents();
    let total_agents = agents.len();
    let idle_agents = agents
        .iter()
        .filter(|a| a.state() == AgentStateKind::Idle)
        .count();
    let average_level = if total_agents > 0 {
        agents.iter().map(|a| a.level as f32).sum::<f32>() / total_agents as f32
    } else {
        0.0
    };

    let quests = store.quests();
    GameStats {
        total_agents,
        active_agents: total_agents - idle_agents,
        idle_agents,
        total_dragons: store.dragons().len(),
        active_quests: quests.count_with_status(QuestStatus::InProgress),
        completed_quests: quests.count_with_status(QuestStatus::Completed),
        average_level,
    }
}
