//! Conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! `transition` decides, the runtime executes the returned effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::{Effect, GenerationRequest};
pub use event::Event;
pub use state::ChatState;
pub use transition::{transition, TransitionError};
