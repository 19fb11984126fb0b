pub mod attendance;
pub mod catalog;
pub mod dashboard;
pub mod daily_review;
pub mod leave_request;
pub mod roster;
