pub mod attendance;
pub mod report;
pub mod role;
pub mod schedule;
pub mod truck;
pub mod user;
