//! Snapshot Generation
//!
//! Captures the whole world as a [`WorldSnapshot`] for inspection or for an
//! external renderer.

use bevy_ecs::prelude::*;
use std::fs;
use std::path::Path;

use empire_events::{
    generate_snapshot_id, AgentSnapshot, DragonSnapshot, PartySnapshot, QuestSnapshot,
    QuestlineSnapshot, StructureSnapshot, WorldSnapshot,
};

use crate::output::stats::compute_stats;
use crate::store::{AgentView, WorldStore};

/// Resource: numbers snapshots in the order they are taken
#[derive(Resource, Debug)]
pub struct SnapshotGenerator {
    next_snapshot_id: u64,
}

impl Default for SnapshotGenerator {
    fn default() -> Self {
        Self { next_snapshot_id: 1 }
    }
}

impl SnapshotGenerator {
    pub fn next_id(&mut self) -> String {
        let id = generate_snapshot_id(self.next_snapshot_id);
        self.next_snapshot_id += 1;
        id
    }

    pub fn snapshot_count(&self) -> u64 {
        self.next_snapshot_id - 1
    }
}

fn agent_snapshot(agent: &AgentView) -> AgentSnapshot {
    AgentSnapshot {
        agent_id: agent.id.clone(),
        name: agent.name.clone(),
        position: agent.position.to_array(),
        target_position: agent.target.map(|t| t.to_array()),
        state: agent.state(),
        health: agent.health.current,
        max_health: agent.health.max,
        current_task: agent.task.label.clone(),
        level: agent.level,
        party_id: agent.party_id.clone(),
        parent_id: agent.parent_id.clone(),
    }
}

/// Generate a complete world snapshot
pub fn generate_snapshot(store: &mut WorldStore) -> WorldSnapshot {
    let snapshot_id = store
        .world_mut()
        .get_resource_or_insert_with(SnapshotGenerator::default)
        .next_id();

    let clock = store.clock();
    let agents: Vec<AgentSnapshot> = store.agents().iter().map(agent_snapshot).collect();

    let dragons = store
        .dragons()
        .into_iter()
        .map(|d| DragonSnapshot {
            dragon_id: d.id,
            name: d.name,
            position: d.position.to_array(),
            health: d.health.current,
            max_health: d.health.max,
            target_agent_id: d.target_agent_id,
        })
        .collect();

    let parties = store
        .parties()
        .all()
        .map(|party| {
            let members = agents.iter().filter(|a| party.has_member(&a.agent_id));
            let (total_health, total_max_health) = members
                .fold((0.0, 0.0), |(h, m), a| (h + a.health, m + a.max_health));
            PartySnapshot {
                party_id: party.id.clone(),
                name: party.name.clone(),
                formation: party.formation.to_string(),
                leader_id: party.leader_id.clone(),
                member_ids: party.member_ids.clone(),
                total_health,
                total_max_health,
            }
        })
        .collect();

    let structures = store
        .structures()
        .all()
        .map(|s| StructureSnapshot {
            structure_id: s.id.clone(),
            kind: s.kind.to_string(),
            name: s.name.clone(),
            position: s.position.to_array(),
            goal_id: s.goal_id.clone(),
        })
        .collect();

    let board = store.quests();
    let quests = board
        .quests()
        .map(|q| QuestSnapshot {
            quest_id: q.id.clone(),
            title: q.title.clone(),
            status: q.status,
            unlocked: board.missing_prerequisites(q).is_empty(),
            required_agents: q.required_agents,
            assigned_agent_ids: q.assigned_agent_ids.clone(),
            questline_id: q.questline_id.clone(),
        })
        .collect();
    let questlines = board
        .questlines()
        .map(|line| QuestlineSnapshot {
            questline_id: line.id.clone(),
            name: line.name.clone(),
            status: line.status,
            current_quest_index: line.current_quest_index,
            completed_quests: board.completed_in_questline(&line.id),
            required_completed_quests: line.required_completed_quests,
        })
        .collect();

    WorldSnapshot {
        snapshot_id,
        tick: clock.current_tick,
        sim_time: clock.now,
        clock: clock.game_clock().to_string(),
        agents,
        dragons,
        parties,
        structures,
        quests,
        questlines,
        stats: compute_stats(store),
    }
}

/// Write snapshot to a specific path
pub fn write_snapshot(snapshot: &WorldSnapshot, path: impl AsRef<Path>) -> std::io::Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::SpawnAgent;
    use crate::components::world::StructureKind;
    use crate::config::Config;
    use glam::Vec3;

    #[test]
    fn test_snapshot_ids_increase() {
        let mut store = WorldStore::new(Config::default(), 1);
        assert_eq!(generate_snapshot(&mut store).snapshot_id, "snap_000001");
        assert_eq!(generate_snapshot(&mut store).snapshot_id, "snap_000002");
        assert_eq!(
            store.world().resource::<SnapshotGenerator>().snapshot_count(),
            2
        );
    }

    #[test]
    fn test_snapshot_contents() {
        let mut store = WorldStore::new(Config::default(), 1);
        let a = store
            .spawn_agent(SpawnAgent {
                name: Some("Sir Query".to_string()),
                position: Some(Vec3::new(1.0, 0.0, 2.0)),
                ..Default::default()
            })
            .unwrap();
        let b = store.spawn_agent(SpawnAgent::default()).unwrap();
        store.create_party("Pair", &[a.clone(), b]).unwrap();
        store
            .add_structure(StructureKind::Castle, "Knowledge Castle", "", Vec3::new(15.0, 0.0, 5.0), None)
            .unwrap();
        store.spawn_dragon(None, Vec3::ZERO, Some(a.clone())).unwrap();

        let snapshot = generate_snapshot(&mut store);
        assert_eq!(snapshot.clock, "00:00");
        assert_eq!(snapshot.agents.len(), 2);
        let agent = snapshot.agent(&a).unwrap();
        assert_eq!(agent.name, "Sir Query");
        assert_eq!(agent.position, [1.0, 0.0, 2.0]);
        assert_eq!(snapshot.parties[0].total_max_health, 200.0);
        assert_eq!(snapshot.structures[0].kind, "castle");
        assert_eq!(snapshot.dragons[0].target_agent_id.as_deref(), Some(a.as_str()));
        assert_eq!(snapshot.stats.total_agents, 2);
    }

    #[test]
    fn test_write_snapshot_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("snap.json");
        let mut store = WorldStore::new(Config::default(), 1);
        let snapshot = generate_snapshot(&mut store);

        write_snapshot(&snapshot, &path).unwrap();

        let parsed: WorldSnapshot =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.snapshot_id, snapshot.snapshot_id);
    }
}
