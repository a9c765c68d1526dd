pub mod auth;
pub mod common;
pub mod match_map;
pub mod matches;
pub mod player;
pub mod player_stat;
pub mod team;
