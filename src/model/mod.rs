pub mod attendance;
pub mod catalog;
pub mod leave_request;
pub mod review;
pub mod role;
pub mod roster;
