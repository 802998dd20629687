mod battles;
mod game;
mod models;
mod shared;

use super::Command;

pub async fn dispatch(cmd: Command) -> Result<(), String> {
    match cmd {
        Command::Play(args) => game::play(args).await,
        Command::Battles { limit } => battles::list_battles(limit).await,
        Command::Battle { run_id } => battles::show_battle(run_id).await,
        Command::Leaderboard => battles::leaderboard().await,
        Command::Models => models::list_models().await,
        Command::CheckKey => models::check_api_key().await,
    }
}
