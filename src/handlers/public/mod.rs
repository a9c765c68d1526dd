pub mod match_handler;
pub mod media_handler;
pub mod player_handler;
pub mod team_handler;
