pub mod session_logs;
pub mod sessions;

pub use session_logs::*;
pub use sessions::*;
