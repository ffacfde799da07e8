//! Structures, quests and questlines.

use glam::Vec3;

use empire_events::{EventKind, QuestStatus, QuestlineStatus};

use crate::components::agent::Level;
use crate::components::party::ring_offsets;
use crate::components::quest::{Quest, QuestBoard, QuestDraft, Questline};
use crate::components::world::{Structure, StructureKind, StructureRegistry};
use crate::error::{StoreError, StoreResult};
use crate::store::{ensure_finite, AgentPatch, WorldStore};

impl WorldStore {
    pub fn add_structure(
        &mut self,
        kind: StructureKind,
        name: impl Into<String>,
        description: impl Into<String>,
        position: Vec3,
        goal_id: Option<String>,
    ) -> StoreResult<String> {
        let name = name.into();
        ensure_finite(&name, position)?;
        let id = self.next_id("structure");
        tracing::debug!("Placed {} '{}' at {}", kind, name, position);
        self.world_mut()
            .resource_mut::<StructureRegistry>()
            .register(Structure {
                id: id.clone(),
                kind,
                name,
                description: description.into(),
                position,
                goal_id,
            });
        Ok(id)
    }

    /// Send agents to work at a structure.
    ///
    /// They walk to a ring around it with "Assigned to <name>" queued, so
    /// arrival puts them straight to WORKING. An open quest on the structure
    /// picks them up if its prerequisites are met.
    pub fn assign_to_structure(&mut self, agent_ids: &[String], structure_id: &str) -> StoreResult<()> {
        let structure = self
            .structures()
            .get(structure_id)
            .cloned()
            .ok_or_else(|| StoreError::UnknownStructure(structure_id.to_string()))?;
        for agent_id in agent_ids {
            self.agent_entity(agent_id)?;
        }

        let label = format!("Assigned to {}", structure.name);
        for (agent_id, offset) in agent_ids.iter().zip(ring_offsets(agent_ids.len())) {
            self.order_move(agent_id, structure.position + offset, &label)?;
            self.update_agent(
                agent_id,
                AgentPatch {
                    queued_task: Some(Some(label.clone())),
                    ..Default::default()
                },
            )?;
        }

        let quest_id = self
            .quests()
            .quest_for_structure(structure_id)
            .map(|q| q.id.clone());
        if let Some(quest_id) = quest_id {
            match self.assign_quest(&quest_id, agent_ids) {
                Ok(()) => {}
                Err(StoreError::QuestLocked { missing, .. }) => {
                    tracing::warn!(
                        "{} at {} is locked until {} completes",
                        quest_id,
                        structure.name,
                        missing.join(", ")
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub fn add_quest(&mut self, draft: QuestDraft) -> StoreResult<String> {
        if let Some(structure_id) = &draft.target_structure_id {
            if self.structures().get(structure_id).is_none() {
                return Err(StoreError::UnknownStructure(structure_id.clone()));
            }
        }
        if let Some(missing) = draft
            .prerequisite_quest_ids
            .iter()
            .find(|id| self.quests().quest(id).is_none())
        {
            return Err(StoreError::UnknownQuest(missing.clone()));
        }

        let id = self.next_id("quest");
        tracing::debug!("Added quest {} '{}'", id, draft.title);
        self.world_mut()
            .resource_mut::<QuestBoard>()
            .insert_quest(Quest::from_draft(id.clone(), draft));
        Ok(id)
    }

    pub fn add_questline(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        quest_ids: Vec<String>,
        required_completed_quests: usize,
    ) -> StoreResult<String> {
        if let Some(missing) = quest_ids.iter().find(|id| self.quests().quest(id).is_none()) {
            return Err(StoreError::UnknownQuest(missing.clone()));
        }
        let id = self.next_id("questline");
        self.world_mut()
            .resource_mut::<QuestBoard>()
            .insert_questline(Questline {
                id: id.clone(),
                name: name.into(),
                description: description.into(),
                status: QuestlineStatus::NotStarted,
                quest_ids,
                current_quest_index: 0,
                required_completed_quests,
            })?;
        Ok(id)
    }

    /// Put agents on a quest. Every prerequisite must already be completed.
    pub fn assign_quest(&mut self, quest_id: &str, agent_ids: &[String]) -> StoreResult<()> {
        for agent_id in agent_ids {
            self.agent_entity(agent_id)?;
        }
        let previous = self
            .world_mut()
            .resource_mut::<QuestBoard>()
            .assign(quest_id, agent_ids)?;
        let status = self
            .quests()
            .quest(quest_id)
            .map_or(previous, |q| q.status);
        if status != previous {
            tracing::info!("Quest {} started with {} agents", quest_id, agent_ids.len());
            self.record(EventKind::QuestStatusChanged {
                quest_id: quest_id.to_string(),
                from: previous,
                to: status,
            });
        }
        Ok(())
    }

    /// Finish a quest, level up its agents and advance its questline
    pub fn complete_quest(&mut self, quest_id: &str) -> StoreResult<()> {
        let completion = self.world_mut().resource_mut::<QuestBoard>().complete(quest_id)?;
        if completion.previous == QuestStatus::Completed {
            return Ok(());
        }

        for agent_id in &completion.assigned_agent_ids {
            if let Ok(entity) = self.agent_entity(agent_id) {
                if let Some(mut level) = self.world_mut().get_mut::<Level>(entity) {
                    level.0 += completion.level_reward;
                }
            }
        }
        tracing::info!("Quest {} completed", quest_id);
        self.record(EventKind::QuestStatusChanged {
            quest_id: quest_id.to_string(),
            from: completion.previous,
            to: QuestStatus::Completed,
        });

        if let Some((questline_id, current_quest_index, status)) = completion.questline {
            if status == QuestlineStatus::Completed {
                tracing::info!("Questline {} completed", questline_id);
            }
            self.record(EventKind::QuestlineAdvanced {
                questline_id,
                current_quest_index,
                status,
            });
        }
        Ok(())
    }

    pub fn fail_quest(&mut self, quest_id: &str) -> StoreResult<()> {
        let previous = self.world_mut().resource_mut::<QuestBoard>().fail(quest_id)?;
        if previous != QuestStatus::Failed {
            tracing::warn!("Quest {} failed", quest_id);
            self.record(EventKind::QuestStatusChanged {
                quest_id: quest_id.to_string(),
                from: previous,
                to: QuestStatus::Failed,
            });
        }
        Ok(())
    }
}
