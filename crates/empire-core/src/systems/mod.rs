//! ECS Systems
//!
//! The per-tick passes, in the order the schedule runs them: clock, movement,
//! agent states, reinforcement dispatch, dragon AI.

pub mod agent_state;
pub mod clock;
pub mod dragon_ai;
pub mod movement;
pub mod reinforcement;

pub use agent_state::{evaluate, update_agent_states, StateStep};
pub use clock::advance_clock;
pub use dragon_ai::update_dragons;
pub use movement::{move_agents, step_towards, Step};
pub use reinforcement::{
    call_for_reinforcements, dispatch_reinforcements, ReinforcementCallers, ReinforcementRequest,
    ReinforcementRequests,
};
