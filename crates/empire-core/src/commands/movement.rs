//! Move orders for loose selections.

use glam::Vec3;

use empire_events::{AgentStateKind, EventKind};

use crate::components::party::ring_offsets;
use crate::error::StoreResult;
use crate::store::{ensure_finite, AgentPatch, WorldStore};

/// Task label shown while travelling to `point`
pub fn move_label(point: Vec3) -> String {
    format!("Moving to {}, {}...", point.x, point.z)
}

impl WorldStore {
    /// Send one agent toward `destination` in the MOVING state.
    ///
    /// Any task queued for an earlier trip is dropped.
    pub(crate) fn order_move(&mut self, agent_id: &str, destination: Vec3, label: &str) -> StoreResult<()> {
        let patch = AgentPatch {
            queued_task: Some(None),
            ..AgentPatch::default()
        };
        self.update_agent(
            agent_id,
            patch
                .with_target(Some(destination))
                .with_state(AgentStateKind::Moving)
                .with_task(label),
        )?;
        self.record(EventKind::MoveOrdered {
            agent_id: agent_id.to_string(),
            target: destination.to_array(),
        });
        Ok(())
    }

    /// Spread the agents on a ring around `point` and send them there
    pub fn move_agents_to(&mut self, agent_ids: &[String], point: Vec3) -> StoreResult<()> {
        ensure_finite("destination", point)?;
        for agent_id in agent_ids {
            self.agent_entity(agent_id)?;
        }

        let label = move_label(point);
        for (agent_id, offset) in agent_ids.iter().zip(ring_offsets(agent_ids.len())) {
            self.order_move(agent_id, point + offset, &label)?;
        }
        Ok(())
    }

    /// Right-click on the ground: a selection that is wholly inside one party
    /// moves as that party, anything else moves as a ring.
    pub fn command_ground(&mut self, selected: &[String], point: Vec3) -> StoreResult<()> {
        if selected.is_empty() {
            return Ok(());
        }
        let party_id = self
            .parties()
            .party_containing_all(selected)
            .map(|p| p.id.clone());
        match party_id {
            Some(party_id) => self.move_party(&party_id, point),
            None => self.move_agents_to(selected, point),
        }
    }

    /// Cancel an agent's move and its queued task. A MOVING agent drops
    /// back to IDLE.
    pub fn stop_agent(&mut self, agent_id: &str) -> StoreResult<()> {
        let moving = self
            .agent(agent_id)
            .map(|a| a.state() == AgentStateKind::Moving)
            .unwrap_or(false);
        let mut patch = AgentPatch {
            queued_task: Some(None),
            ..AgentPatch::default()
        }
        .with_target(None);
        if moving {
            patch = patch
                .with_state(AgentStateKind::Idle)
                .with_task(self.config().states.idle_task_label.clone());
        }
        self.update_agent(agent_id, patch)
    }
}
