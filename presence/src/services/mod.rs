pub mod heartbeat;
pub mod reaper;
pub mod registry;
pub mod session_log;
pub mod termination;
