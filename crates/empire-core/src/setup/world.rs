//! World Setup
//!
//! Places the starting structures and the opening questline.

use glam::Vec3;

use crate::components::quest::QuestDraft;
use crate::components::world::StructureKind;
use crate::error::StoreResult;
use crate::store::WorldStore;

/// Where agents gather at the start of a session
pub const COMMAND_CENTER: Vec3 = Vec3::new(10.0, 0.0, 10.0);

/// Ids of everything placed by [`create_world`]
#[derive(Debug, Clone)]
pub struct WorldLayout {
    pub command_center: String,
    pub knowledge_castle: String,
    pub scout_tower: String,
    pub watchtower: String,
    pub code_workshop: String,
    pub research_lab: String,
    pub quest_ids: Vec<String>,
    pub questline_id: String,
}

struct QuestSeed {
    title: &'static str,
    description: &'static str,
    required_agents: usize,
    rewards: &'static [&'static str],
    level_reward: u32,
}

const JOURNEY: [QuestSeed; 5] = [
    QuestSeed {
        title: "Establish Reconnaissance",
        description: "Send agents to the Scout Tower to gather intel on the surrounding area.",
        required_agents: 2,
        rewards: &["+1 Agent Level", "Unlock: Workshop Access"],
        level_reward: 1,
    },
    QuestSeed {
        title: "Craft Agent Solutions",
        description: "Assign agents to the Code Workshop to develop new capabilities.",
        required_agents: 3,
        rewards: &["+2 Agent Levels", "Unlock: Research Lab"],
        level_reward: 2,
    },
    QuestSeed {
        title: "Analyze Data Patterns",
        description: "Deploy agents to the Research Lab to uncover hidden patterns.",
        required_agents: 3,
        rewards: &["+3 Agent Levels", "Unlock: Defense Protocols"],
        level_reward: 3,
    },
    QuestSeed {
        title: "Defend the Perimeter",
        description: "Station agents at the Watchtower to protect against incoming threats.",
        required_agents: 4,
        rewards: &["+4 Agent Levels", "Unlock: Castle Access"],
        level_reward: 4,
    },
    QuestSeed {
        title: "Complete Research at Knowledge Castle",
        description: "The ultimate goal - lead your agents to complete all research at the Knowledge Castle.",
        required_agents: 5,
        rewards: &["Victory!", "Empire Expanded"],
        level_reward: 5,
    },
];

/// Build the starting map: one structure of every kind and "The Agent's
/// Journey", five quests that each unlock the next.
pub fn create_world(store: &mut WorldStore) -> StoreResult<WorldLayout> {
    let command_center = store.add_structure(
        StructureKind::Base,
        "Command Center",
        "Agent spawn point and base of operations",
        COMMAND_CENTER,
        None,
    )?;
    let knowledge_castle = store.add_structure(
        StructureKind::Castle,
        "Knowledge Castle",
        "The ultimate goal - complete all research here",
        Vec3::new(15.0, 0.0, 5.0),
        Some("main-goal-knowledge".to_string()),
    )?;
    let scout_tower = store.add_structure(
        StructureKind::Tower,
        "Scout Tower",
        "Sub-goal: Establish reconnaissance",
        Vec3::new(5.0, 0.0, 5.0),
        Some("sub-goal-scouting".to_string()),
    )?;
    let watchtower = store.add_structure(
        StructureKind::Tower,
        "Watchtower",
        "Sub-goal: Defend the perimeter",
        Vec3::new(15.0, 0.0, 15.0),
        Some("sub-goal-defense".to_string()),
    )?;
    let code_workshop = store.add_structure(
        StructureKind::Workshop,
        "Code Workshop",
        "Task: Craft agent solutions",
        Vec3::new(5.0, 0.0, 15.0),
        None,
    )?;
    let research_lab = store.add_structure(
        StructureKind::Workshop,
        "Research Lab",
        "Task: Analyze data patterns",
        Vec3::new(15.0, 0.0, 15.0),
        None,
    )?;
    store.add_structure(
        StructureKind::Campfire,
        "Strategy Circle",
        "Gathering point for agent coordination",
        Vec3::new(10.0, 0.0, 8.0),
        None,
    )?;
    store.add_structure(
        StructureKind::Campfire,
        "Rest Camp",
        "Agent rest and recovery point",
        Vec3::new(8.0, 0.0, 10.0),
        None,
    )?;

    let targets = [
        &scout_tower,
        &code_workshop,
        &research_lab,
        &watchtower,
        &knowledge_castle,
    ];
    let mut quest_ids: Vec<String> = Vec::with_capacity(JOURNEY.len());
    for (seed, target) in JOURNEY.iter().zip(targets) {
        let id = store.add_quest(QuestDraft {
            title: seed.title.to_string(),
            description: seed.description.to_string(),
            target_structure_id: Some(target.clone()),
            required_agents: seed.required_agents,
            rewards: seed.rewards.iter().map(|r| r.to_string()).collect(),
            level_reward: seed.level_reward,
            prerequisite_quest_ids: quest_ids.last().cloned().into_iter().collect(),
        })?;
        quest_ids.push(id);
    }

    let questline_id = store.add_questline(
        "The Agent's Journey",
        "A comprehensive campaign to establish your agent empire and achieve ultimate knowledge.",
        quest_ids.clone(),
        JOURNEY.len(),
    )?;

    tracing::info!(
        "World created: {} structures, {} quests",
        store.structures().len(),
        quest_ids.len()
    );

    Ok(WorldLayout {
        command_center,
        knowledge_castle,
        scout_tower,
        watchtower,
        code_workshop,
        research_lab,
        quest_ids,
        questline_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use empire_events::{QuestStatus, QuestlineStatus};

    #[test]
    fn test_world_layout() {
        let mut store = WorldStore::new(Config::default(), 0);
        let layout = create_world(&mut store).unwrap();

        assert_eq!(store.structures().len(), 8);
        assert_eq!(store.structures().of_kind(StructureKind::Campfire).len(), 2);
        assert_eq!(
            store.structures().get(&layout.knowledge_castle).unwrap().goal_id.as_deref(),
            Some("main-goal-knowledge")
        );
        assert_eq!(layout.quest_ids.len(), 5);
    }

    #[test]
    fn test_journey_is_a_chain() {
        let mut store = WorldStore::new(Config::default(), 0);
        let layout = create_world(&mut store).unwrap();
        let board = store.quests();

        assert!(board.is_unlocked(&layout.quest_ids[0]));
        for pair in layout.quest_ids.windows(2) {
            let next = board.quest(&pair[1]).unwrap();
            assert_eq!(next.prerequisite_quest_ids, vec![pair[0].clone()]);
            assert!(!board.is_unlocked(&pair[1]));
        }

        let first = board
            .quest_for_structure(&layout.scout_tower)
            .unwrap();
        assert_eq!(first.title, "Establish Reconnaissance");
        assert_eq!(first.status, QuestStatus::Pending);

        let line = board.questline(&layout.questline_id).unwrap();
        assert_eq!(line.status, QuestlineStatus::NotStarted);
        assert_eq!(line.required_completed_quests, 5);
    }
}
