//! Message-attribute lifecycle: consumption state, self-destruct timers and
//! secret-chat read signals, all committed through the mutation applier.

pub mod applier;
pub mod clock;
pub mod consumption;
pub mod expiration;
pub mod secret_chat;

pub use applier::MessageDelta;
pub use clock::{Clock, FixedClock, SystemClock};
pub use consumption::ConsumptionTracker;
