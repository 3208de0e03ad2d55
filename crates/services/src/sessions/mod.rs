mod controller;
mod state;
mod timer;
mod view;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::SessionController;
pub use state::{SessionEvent, SessionState};
pub use timer::{ActiveTimer, TimerTick};
pub use view::{QuizPosition, SessionSnapshot};
