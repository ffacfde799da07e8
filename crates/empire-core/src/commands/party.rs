//! Party management and formation moves.

use glam::Vec3;

use crate::commands::movement::move_label;
use crate::components::agent::PartyMembership;
use crate::components::party::{Formation, Party, PartyRegistry};
use crate::error::{StoreError, StoreResult};
use crate::store::{ensure_finite, WorldStore};

impl WorldStore {
    fn party(&self, party_id: &str) -> StoreResult<Party> {
        self.parties()
            .get(party_id)
            .cloned()
            .ok_or_else(|| StoreError::UnknownParty(party_id.to_string()))
    }

    fn set_membership(&mut self, agent_id: &str, party_id: Option<String>) {
        if let Ok(entity) = self.agent_entity(agent_id) {
            if let Some(mut membership) = self.world_mut().get_mut::<PartyMembership>(entity) {
                membership.0 = party_id;
            }
        }
    }

    /// Form a party led by the first member. Members leave their old parties.
    pub fn create_party(&mut self, name: impl Into<String>, member_ids: &[String]) -> StoreResult<String> {
        let mut members: Vec<String> = Vec::with_capacity(member_ids.len());
        for agent_id in member_ids {
            self.agent_entity(agent_id)?;
            if !members.contains(agent_id) {
                members.push(agent_id.clone());
            }
        }
        if members.is_empty() {
            return Err(StoreError::EmptyParty);
        }

        for agent_id in &members {
            let previous = self.parties().party_of(agent_id).map(|p| p.id.clone());
            if let Some(previous) = previous {
                self.detach_from_party(&previous, agent_id);
            }
        }

        let id = self.next_id("party");
        let name = name.into();
        for agent_id in &members {
            self.set_membership(agent_id, Some(id.clone()));
        }
        tracing::info!("Formed party {} '{}' with {} members", id, name, members.len());
        self.world_mut().resource_mut::<PartyRegistry>().insert(Party {
            id: id.clone(),
            name,
            leader_id: members.first().cloned(),
            member_ids: members,
            formation: Formation::default(),
        });
        Ok(id)
    }

    pub fn disband_party(&mut self, party_id: &str) -> StoreResult<()> {
        let party = self
            .world_mut()
            .resource_mut::<PartyRegistry>()
            .remove(party_id)
            .ok_or_else(|| StoreError::UnknownParty(party_id.to_string()))?;
        for agent_id in &party.member_ids {
            self.set_membership(agent_id, None);
        }
        tracing::info!("Disbanded party {}", party_id);
        Ok(())
    }

    pub fn set_party_formation(&mut self, party_id: &str, formation: Formation) -> StoreResult<()> {
        let mut parties = self.world_mut().resource_mut::<PartyRegistry>();
        let party = parties
            .get_mut(party_id)
            .ok_or_else(|| StoreError::UnknownParty(party_id.to_string()))?;
        party.formation = formation;
        Ok(())
    }

    pub fn set_party_leader(&mut self, party_id: &str, agent_id: &str) -> StoreResult<()> {
        let mut parties = self.world_mut().resource_mut::<PartyRegistry>();
        let party = parties
            .get_mut(party_id)
            .ok_or_else(|| StoreError::UnknownParty(party_id.to_string()))?;
        if !party.has_member(agent_id) {
            return Err(StoreError::NotPartyMember {
                party_id: party_id.to_string(),
                agent_id: agent_id.to_string(),
            });
        }
        party.leader_id = Some(agent_id.to_string());
        Ok(())
    }

    /// Move the whole party to `point` in its formation, leader first.
    ///
    /// A `free` party keeps each member's offset from the party centroid.
    pub fn move_party(&mut self, party_id: &str, point: Vec3) -> StoreResult<()> {
        ensure_finite("destination", point)?;
        let party = self.party(party_id)?;
        let members: Vec<(String, Vec3)> = party
            .ordered_members()
            .into_iter()
            .filter_map(|id| self.agent(&id).map(|a| (id, a.position)))
            .collect();
        if members.is_empty() {
            return Ok(());
        }

        let spacing = self.config().movement.formation_spacing;
        let destinations: Vec<Vec3> = match party.formation.offsets(members.len(), spacing) {
            Some(offsets) => offsets.into_iter().map(|offset| point + offset).collect(),
            None => {
                let centroid =
                    members.iter().map(|(_, p)| *p).sum::<Vec3>() / members.len() as f32;
                members.iter().map(|(_, p)| point + (*p - centroid)).collect()
            }
        };

        let label = move_label(point);
        for ((agent_id, _), destination) in members.iter().zip(destinations) {
            self.order_move(agent_id, destination, &label)?;
        }
        tracing::debug!(
            "Party {} moving to {} in {} formation",
            party_id,
            point,
            party.formation
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::SpawnAgent;
    use crate::config::Config;

    fn store_with_agents(n: usize) -> (WorldStore, Vec<String>) {
        let mut store = WorldStore::new(Config::default(), 5);
        let ids = (0..n)
            .map(|i| {
                store
                    .spawn_agent(SpawnAgent {
                        position: Some(Vec3::new(i as f32 * 2.0, 0.0, 0.0)),
                        ..Default::default()
                    })
                    .unwrap()
            })
            .collect();
        (store, ids)
    }

    #[test]
    fn test_create_party_moves_members_between_parties() {
        let (mut store, ids) = store_with_agents(3);
        let first = store.create_party("Vanguard", &ids[..2]).unwrap();
        let second = store.create_party("Rearguard", &ids[1..]).unwrap();

        let vanguard = store.parties().get(&first).unwrap();
        assert_eq!(vanguard.member_ids, vec![ids[0].clone()]);
        let rearguard = store.parties().get(&second).unwrap();
        assert_eq!(rearguard.leader_id.as_deref(), Some(ids[1].as_str()));
        assert_eq!(store.agent(&ids[1]).unwrap().party_id, Some(second));
    }

    #[test]
    fn test_empty_or_unknown_members_rejected() {
        let (mut store, _) = store_with_agents(1);
        assert_eq!(store.create_party("Nobody", &[]), Err(StoreError::EmptyParty));
        assert!(matches!(
            store.create_party("Ghosts", &["agent_0404".to_string()]),
            Err(StoreError::UnknownAgent(_))
        ));
    }

    #[test]
    fn test_leader_must_be_member() {
        let (mut store, ids) = store_with_agents(3);
        let party = store.create_party("Squad", &ids[..2]).unwrap();
        store.set_party_leader(&party, &ids[1]).unwrap();
        assert!(matches!(
            store.set_party_leader(&party, &ids[2]),
            Err(StoreError::NotPartyMember { .. })
        ));
        assert!(store.set_party_formation("party_0404", Formation::Box).is_err());
    }

    #[test]
    fn test_despawn_passes_leadership_and_disbands() {
        let (mut store, ids) = store_with_agents(2);
        let party = store.create_party("Duo", &ids).unwrap();

        store.despawn_agent(&ids[0]).unwrap();
        assert_eq!(
            store.parties().get(&party).unwrap().leader_id.as_deref(),
            Some(ids[1].as_str())
        );

        store.despawn_agent(&ids[1]).unwrap();
        assert!(store.parties().get(&party).is_none());
    }

    #[test]
    fn test_move_party_in_line() {
        let (mut store, ids) = store_with_agents(3);
        let party = store.create_party("Line", &ids).unwrap();
        store.move_party(&party, Vec3::new(10.0, 0.0, 10.0)).unwrap();

        let targets: Vec<Vec3> = ids.iter().map(|id| store.agent(id).unwrap().target.unwrap()).collect();
        assert_eq!(targets[0], Vec3::new(8.0, 0.0, 10.0));
        assert_eq!(targets[1], Vec3::new(10.0, 0.0, 10.0));
        assert_eq!(targets[2], Vec3::new(12.0, 0.0, 10.0));
    }

    #[test]
    fn test_free_formation_keeps_offsets() {
        let (mut store, ids) = store_with_agents(3);
        let party = store.create_party("Loose", &ids).unwrap();
        store.set_party_formation(&party, Formation::Free).unwrap();
        store.move_party(&party, Vec3::new(0.0, 0.0, 20.0)).unwrap();

        // members stand at x = 0, 2, 4; centroid x = 2
        let target = store.agent(&ids[0]).unwrap().target.unwrap();
        assert_eq!(target, Vec3::new(-2.0, 0.0, 20.0));
    }

    #[test]
    fn test_ground_command_moves_whole_party() {
        let (mut store, ids) = store_with_agents(3);
        let party = store.create_party("Trio", &ids).unwrap();
        store.set_party_formation(&party, Formation::Column).unwrap();
        store.command_ground(&ids[..1], Vec3::ZERO).unwrap();

        for id in &ids {
            assert!(store.agent(id).unwrap().target.is_some());
        }
    }

    #[test]
    fn test_disband_clears_membership() {
        let (mut store, ids) = store_with_agents(2);
        let party = store.create_party("Pair", &ids).unwrap();
        store.disband_party(&party).unwrap();
        assert!(store.parties().is_empty());
        assert_eq!(store.agent(&ids[0]).unwrap().party_id, None);
        assert!(store.disband_party(&party).is_err());
    }
}
