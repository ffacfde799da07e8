//! Party Components
//!
//! Named groups of agents that move together in a formation.

use bevy_ecs::prelude::*;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

/// Layout of party members around a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formation {
    #[default]
    Line,
    Wedge,
    Column,
    Box,
    Circle,
    /// Members keep their current offsets from the party centroid
    Free,
}

impl Formation {
    pub fn all() -> &'static [Formation] {
        &[
            Formation::Line,
            Formation::Wedge,
            Formation::Column,
            Formation::Box,
            Formation::Circle,
            Formation::Free,
        ]
    }

    /// Offsets from the destination for `count` members, leader first.
    ///
    /// Returns `None` for [`Formation::Free`], whose offsets depend on where
    /// the members currently stand.
    pub fn offsets(self, count: usize, spacing: f32) -> Option<Vec<Vec3>> {
        let centered = |i: usize, n: usize| (i as f32 - (n as f32 - 1.0) / 2.0) * spacing;

        let offsets = match self {
            Formation::Line => (0..count)
                .map(|i| Vec3::new(centered(i, count), 0.0, 0.0))
                .collect(),
            Formation::Column => (0..count)
                .map(|i| Vec3::new(0.0, 0.0, centered(i, count)))
                .collect(),
            Formation::Wedge => (0..count)
                .map(|i| {
                    if i == 0 {
                        return Vec3::ZERO;
                    }
                    let row = ((i + 1) / 2) as f32;
                    let side = if i % 2 == 1 { -1.0 } else { 1.0 };
                    Vec3::new(side * row * spacing, 0.0, row * spacing)
                })
                .collect(),
            Formation::Box => {
                let width = (count as f32).sqrt().ceil().max(1.0) as usize;
                let rows = count.div_ceil(width);
                (0..count)
                    .map(|i| {
                        Vec3::new(centered(i % width, width), 0.0, centered(i / width, rows))
                    })
                    .collect()
            }
            Formation::Circle => ring_offsets(count),
            Formation::Free => return None,
        };
        Some(offsets)
    }
}

impl fmt::Display for Formation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Formation::Line => "line",
            Formation::Wedge => "wedge",
            Formation::Column => "column",
            Formation::Box => "box",
            Formation::Circle => "circle",
            Formation::Free => "free",
        };
        f.write_str(name)
    }
}

impl FromStr for Formation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Formation::all()
            .iter()
            .copied()
            .find(|f| f.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown formation: '{}'", s))
    }
}

/// Evenly spaced points on a ring whose radius grows with the group size.
///
/// Used when a loose selection (not a party) is ordered to a point.
pub fn ring_offsets(count: usize) -> Vec<Vec3> {
    let radius = ((count as f32).sqrt() * 0.5).max(1.0);
    (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * TAU;
            Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
        })
        .collect()
}

/// A named group of agents
#[derive(Debug, Clone, PartialEq)]
pub struct Party {
    pub id: String,
    pub name: String,
    pub member_ids: Vec<String>,
    pub formation: Formation,
    pub leader_id: Option<String>,
}

impl Party {
    pub fn has_member(&self, agent_id: &str) -> bool {
        self.member_ids.iter().any(|id| id == agent_id)
    }

    /// Members with the leader first, the rest in join order
    pub fn ordered_members(&self) -> Vec<String> {
        let mut ordered = Vec::with_capacity(self.member_ids.len());
        if let Some(leader) = &self.leader_id {
            if self.has_member(leader) {
                ordered.push(leader.clone());
            }
        }
        ordered.extend(
            self.member_ids
                .iter()
                .filter(|id| Some(*id) != self.leader_id.as_ref())
                .cloned(),
        );
        ordered
    }

    /// Remove a member. The next member inherits leadership if needed.
    pub fn remove_member(&mut self, agent_id: &str) -> bool {
        let before = self.member_ids.len();
        self.member_ids.retain(|id| id != agent_id);
        if self.leader_id.as_deref() == Some(agent_id) {
            self.leader_id = self.member_ids.first().cloned();
        }
        self.member_ids.len() != before
    }
}

/// Resource: registry of all parties
#[derive(Resource, Debug, Default)]
pub struct PartyRegistry {
    parties: BTreeMap<String, Party>,
}

impl PartyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, party: Party) {
        self.parties.insert(party.id.clone(), party);
    }

    pub fn get(&self, party_id: &str) -> Option<&Party> {
        self.parties.get(party_id)
    }

    pub fn get_mut(&mut self, party_id: &str) -> Option<&mut Party> {
        self.parties.get_mut(party_id)
    }

    pub fn remove(&mut self, party_id: &str) -> Option<Party> {
        self.parties.remove(party_id)
    }

    /// All parties, ordered by id
    pub fn all(&self) -> impl Iterator<Item = &Party> {
        self.parties.values()
    }

    /// The party containing this agent
    pub fn party_of(&self, agent_id: &str) -> Option<&Party> {
        self.parties.values().find(|p| p.has_member(agent_id))
    }

    /// The first party that contains every listed agent
    pub fn party_containing_all(&self, agent_ids: &[String]) -> Option<&Party> {
        if agent_ids.is_empty() {
            return None;
        }
        self.parties
            .values()
            .find(|p| !p.member_ids.is_empty() && agent_ids.iter().all(|id| p.has_member(id)))
    }

    pub fn len(&self) -> usize {
        self.parties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parties.is_empty()
    }
}
