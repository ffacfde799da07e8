//! Quest Components
//!
//! Quests gated by prerequisites, grouped into questlines.

use bevy_ecs::prelude::*;
use std::collections::BTreeMap;

use empire_events::{QuestStatus, QuestlineStatus};

use crate::error::{StoreError, StoreResult};

/// A quest as submitted by the caller, before it gets an id
#[derive(Debug, Clone, Default)]
pub struct QuestDraft {
    pub title: String,
    pub description: String,
    pub target_structure_id: Option<String>,
    pub required_agents: usize,
    pub rewards: Vec<String>,
    /// Levels granted to each assigned agent on completion
    pub level_reward: u32,
    pub prerequisite_quest_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: QuestStatus,
    pub target_structure_id: Option<String>,
    pub required_agents: usize,
    pub assigned_agent_ids: Vec<String>,
    pub rewards: Vec<String>,
    pub level_reward: u32,
    pub prerequisite_quest_ids: Vec<String>,
    pub questline_id: Option<String>,
    /// Index within the questline
    pub position: Option<usize>,
}

impl Quest {
    pub fn from_draft(id: impl Into<String>, draft: QuestDraft) -> Self {
        Self {
            id: id.into(),
            title: draft.title,
            description: draft.description,
            status: QuestStatus::Pending,
            target_structure_id: draft.target_structure_id,
            required_agents: draft.required_agents,
            assigned_agent_ids: Vec::new(),
            rewards: draft.rewards,
            level_reward: draft.level_reward,
            prerequisite_quest_ids: draft.prerequisite_quest_ids,
            questline_id: None,
            position: None,
        }
    }

    pub fn is_staffed(&self) -> bool {
        self.assigned_agent_ids.len() >= self.required_agents
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Questline {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: QuestlineStatus,
    pub quest_ids: Vec<String>,
    pub current_quest_index: usize,
    pub required_completed_quests: usize,
}

/// Result of completing a quest
#[derive(Debug, Clone, PartialEq)]
pub struct QuestCompletion {
    pub previous: QuestStatus,
    pub assigned_agent_ids: Vec<String>,
    pub level_reward: u32,
    /// Questline progress after this completion
    pub questline: Option<(String, usize, QuestlineStatus)>,
}

/// Resource: all quests and questlines
#[derive(Resource, Debug, Default)]
pub struct QuestBoard {
    quests: BTreeMap<String, Quest>,
    questlines: BTreeMap<String, Questline>,
}

impl QuestBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_quest(&mut self, quest: Quest) {
        self.quests.insert(quest.id.clone(), quest);
    }

    /// Register a questline and tag its quests with their position in it
    pub fn insert_questline(&mut self, questline: Questline) -> StoreResult<()> {
        if let Some(missing) = questline
            .quest_ids
            .iter()
            .find(|id| !self.quests.contains_key(*id))
        {
            return Err(StoreError::UnknownQuest(missing.clone()));
        }
        for (position, quest_id) in questline.quest_ids.iter().enumerate() {
            if let Some(quest) = self.quests.get_mut(quest_id) {
                quest.questline_id = Some(questline.id.clone());
                quest.position = Some(position);
            }
        }
        self.questlines.insert(questline.id.clone(), questline);
        Ok(())
    }

    pub fn quest(&self, quest_id: &str) -> Option<&Quest> {
        self.quests.get(quest_id)
    }

    pub fn questline(&self, questline_id: &str) -> Option<&Questline> {
        self.questlines.get(questline_id)
    }

    pub fn quests(&self) -> impl Iterator<Item = &Quest> {
        self.quests.values()
    }

    pub fn questlines(&self) -> impl Iterator<Item = &Questline> {
        self.questlines.values()
    }

    /// Prerequisites of a quest that are not yet completed
    pub fn missing_prerequisites(&self, quest: &Quest) -> Vec<String> {
        quest
            .prerequisite_quest_ids
            .iter()
            .filter(|id| {
                self.quests
                    .get(*id)
                    .map_or(true, |q| q.status != QuestStatus::Completed)
            })
            .cloned()
            .collect()
    }

    pub fn is_unlocked(&self, quest_id: &str) -> bool {
        self.quests
            .get(quest_id)
            .is_some_and(|q| self.missing_prerequisites(q).is_empty())
    }

    /// The first unfinished quest targeting a structure
    pub fn quest_for_structure(&self, structure_id: &str) -> Option<&Quest> {
        self.quests.values().find(|q| {
            q.target_structure_id.as_deref() == Some(structure_id)
                && q.status != QuestStatus::Completed
        })
    }

    /// Assign agents to a quest and start it. Returns the previous status.
    pub fn assign(&mut self, quest_id: &str, agent_ids: &[String]) -> StoreResult<QuestStatus> {
        let quest = self
            .quests
            .get(quest_id)
            .ok_or_else(|| StoreError::UnknownQuest(quest_id.to_string()))?;
        let missing = self.missing_prerequisites(quest);
        if !missing.is_empty() {
            return Err(StoreError::QuestLocked {
                quest_id: quest_id.to_string(),
                missing,
            });
        }

        let questline_id = quest.questline_id.clone();
        let Some(quest) = self.quests.get_mut(quest_id) else {
            return Err(StoreError::UnknownQuest(quest_id.to_string()));
        };
        let previous = quest.status;
        for agent_id in agent_ids {
            if !quest.assigned_agent_ids.contains(agent_id) {
                quest.assigned_agent_ids.push(agent_id.clone());
            }
        }
        if matches!(previous, QuestStatus::Pending | QuestStatus::Failed) {
            quest.status = QuestStatus::InProgress;
        }

        if let Some(line) = questline_id.and_then(|id| self.questlines.get_mut(&id)) {
            if line.status == QuestlineStatus::NotStarted {
                line.status = QuestlineStatus::InProgress;
            }
        }
        Ok(previous)
    }

    /// Mark a quest completed and advance its questline
    pub fn complete(&mut self, quest_id: &str) -> StoreResult<QuestCompletion> {
        let quest = self
            .quests
            .get_mut(quest_id)
            .ok_or_else(|| StoreError::UnknownQuest(quest_id.to_string()))?;
        let previous = quest.status;
        quest.status = QuestStatus::Completed;
        let assigned_agent_ids = quest.assigned_agent_ids.clone();
        let level_reward = if previous == QuestStatus::Completed {
            0
        } else {
            quest.level_reward
        };
        let questline_id = quest.questline_id.clone();

        let questline = match questline_id {
            Some(id) => Some(self.advance_questline(&id)?),
            None => None,
        };

        Ok(QuestCompletion {
            previous,
            assigned_agent_ids,
            level_reward,
            questline,
        })
    }

    /// Mark a quest failed. Returns the previous status.
    pub fn fail(&mut self, quest_id: &str) -> StoreResult<QuestStatus> {
        let quest = self
            .quests
            .get_mut(quest_id)
            .ok_or_else(|| StoreError::UnknownQuest(quest_id.to_string()))?;
        let previous = quest.status;
        quest.status = QuestStatus::Failed;
        Ok(previous)
    }

    /// Drop an agent from every quest's assignment list
    pub fn unassign_agent(&mut self, agent_id: &str) {
        for quest in self.quests.values_mut() {
            quest.assigned_agent_ids.retain(|id| id != agent_id);
        }
    }

    pub fn completed_in_questline(&self, questline_id: &str) -> usize {
        self.questlines.get(questline_id).map_or(0, |line| {
            line.quest_ids
                .iter()
                .filter(|id| {
                    self.quests
                        .get(*id)
                        .is_some_and(|q| q.status == QuestStatus::Completed)
                })
                .count()
        })
    }

    fn advance_questline(&mut self, questline_id: &str) -> StoreResult<(String, usize, QuestlineStatus)> {
        let completed = self.completed_in_questline(questline_id);
        let next_index = {
            let line = self
                .questlines
                .get(questline_id)
                .ok_or_else(|| StoreError::UnknownQuestline(questline_id.to_string()))?;
            line.quest_ids
                .iter()
                .position(|id| {
                    self.quests
                        .get(id)
                        .map_or(true, |q| q.status != QuestStatus::Completed)
                })
                .unwrap_or(line.quest_ids.len())
        };

        let line = self
            .questlines
            .get_mut(questline_id)
            .ok_or_else(|| StoreError::UnknownQuestline(questline_id.to_string()))?;
        line.current_quest_index = next_index;
        line.status = if completed >= line.required_completed_quests {
            QuestlineStatus::Completed
        } else {
            QuestlineStatus::InProgress
        };
        Ok((line.id.clone(), line.current_quest_index, line.status))
    }

    pub fn count_with_status(&self, status: QuestStatus) -> usize {
        self.quests.values().filter(|q| q.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, prereqs: &[&str]) -> QuestDraft {
        QuestDraft {
            title: title.to_string(),
            required_agents: 2,
            level_reward: 1,
            prerequisite_quest_ids: prereqs.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn board_with_chain() -> QuestBoard {
        let mut board = QuestBoard::new();
        board.insert_quest(Quest::from_draft("quest_0001", draft("First", &[])));
        board.insert_quest(Quest::from_draft("quest_0002", draft("Second", &["quest_0001"])));
        board
            .insert_questline(Questline {
                id: "questline_0001".to_string(),
                name: "Journey".to_string(),
                description: String::new(),
                status: QuestlineStatus::NotStarted,
                quest_ids: vec!["quest_0001".to_string(), "quest_0002".to_string()],
                current_quest_index: 0,
                required_completed_quests: 2,
            })
            .unwrap();
        board
    }

    #[test]
    fn test_questline_tags_quests() {
        let board = board_with_chain();
        let second = board.quest("quest_0002").unwrap();
        assert_eq!(second.questline_id.as_deref(), Some("questline_0001"));
        assert_eq!(second.position, Some(1));
    }

    #[test]
    fn test_questline_rejects_unknown_quest() {
        let mut board = QuestBoard::new();
        let err = board
            .insert_questline(Questline {
                id: "questline_0001".to_string(),
                name: "Broken".to_string(),
                description: String::new(),
                status: QuestlineStatus::NotStarted,
                quest_ids: vec!["quest_9999".to_string()],
                current_quest_index: 0,
                required_completed_quests: 1,
            })
            .unwrap_err();
        assert_eq!(err, StoreError::UnknownQuest("quest_9999".to_string()));
    }

    #[test]
    fn test_prerequisites_gate_assignment() {
        let mut board = board_with_chain();
        let agents = vec!["agent_0001".to_string()];

        let err = board.assign("quest_0002", &agents).unwrap_err();
        assert!(matches!(err, StoreError::QuestLocked { ref missing, .. } if missing == &vec!["quest_0001".to_string()]));

        assert_eq!(board.assign("quest_0001", &agents).unwrap(), QuestStatus::Pending);
        assert_eq!(board.quest("quest_0001").unwrap().status, QuestStatus::InProgress);
        assert_eq!(
            board.questline("questline_0001").unwrap().status,
            QuestlineStatus::InProgress
        );

        board.complete("quest_0001").unwrap();
        assert!(board.is_unlocked("quest_0002"));
        board.assign("quest_0002", &agents).unwrap();
    }

    #[test]
    fn test_assignment_dedupes_agents() {
        let mut board = board_with_chain();
        let agents = vec!["a".to_string(), "b".to_string()];
        board.assign("quest_0001", &agents).unwrap();
        board.assign("quest_0001", &agents[..1]).unwrap();
        let quest = board.quest("quest_0001").unwrap();
        assert_eq!(quest.assigned_agent_ids, agents);
        assert!(quest.is_staffed());
    }

    #[test]
    fn test_questline_completes_after_required_count() {
        let mut board = board_with_chain();
        let first = board.complete("quest_0001").unwrap();
        assert_eq!(
            first.questline,
            Some(("questline_0001".to_string(), 1, QuestlineStatus::InProgress))
        );

        let second = board.complete("quest_0002").unwrap();
        assert_eq!(
            second.questline,
            Some(("questline_0001".to_string(), 2, QuestlineStatus::Completed))
        );
        assert_eq!(board.completed_in_questline("questline_0001"), 2);
    }

    #[test]
    fn test_completing_twice_grants_no_second_reward() {
        let mut board = board_with_chain();
        assert_eq!(board.complete("quest_0001").unwrap().level_reward, 1);
        assert_eq!(board.complete("quest_0001").unwrap().level_reward, 0);
    }

    #[test]
    fn test_quest_for_structure_skips_completed() {
        let mut board = QuestBoard::new();
        let mut d = draft("Scout", &[]);
        d.target_structure_id = Some("structure_0002".to_string());
        board.insert_quest(Quest::from_draft("quest_0001", d.clone()));
        board.insert_quest(Quest::from_draft("quest_0002", d));

        assert_eq!(
            board.quest_for_structure("structure_0002").map(|q| q.id.as_str()),
            Some("quest_0001")
        );
        board.complete("quest_0001").unwrap();
        assert_eq!(
            board.quest_for_structure("structure_0002").map(|q| q.id.as_str()),
            Some("quest_0002")
        );
    }

    #[test]
    fn test_fail_and_unassign() {
        let mut board = board_with_chain();
        board.assign("quest_0001", &["a".to_string()]).unwrap();
        assert_eq!(board.fail("quest_0001").unwrap(), QuestStatus::InProgress);
        assert_eq!(board.count_with_status(QuestStatus::Failed), 1);

        board.unassign_agent("a");
        assert!(board.quest("quest_0001").unwrap().assigned_agent_ids.is_empty());
        assert!(board.fail("quest_9999").is_err());
    }
}
