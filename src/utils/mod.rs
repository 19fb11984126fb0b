pub mod db_utils;
pub mod punch_filter;
pub mod roster_cache;
