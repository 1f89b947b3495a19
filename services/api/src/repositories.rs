//! PostgreSQL repositories backing the attendance stores

pub mod ledger;
pub mod roster;
pub mod session_codes;

pub use ledger::AttendanceRepository;
pub use roster::RosterRepository;
pub use session_codes::SessionCodeRepository;
