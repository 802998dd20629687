use crate::adapters::config::Settings;

use super::shared::{open_run_db, print_json};

pub async fn list_battles(limit: usize) -> Result<(), String> {
    let settings = Settings::load_global();
    let db = open_run_db(&settings)?;
    let runs = db.list_runs(limit).map_err(|e| e.to_string())?;
    print_json(&runs)
}

pub async fn show_battle(run_id: String) -> Result<(), String> {
    let settings = Settings::load_global();
    let db = open_run_db(&settings)?;
    let run = db
        .get_run(run_id.trim())
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("Battle not found: {run_id}"))?;
    print_json(&run)
}

pub async fn leaderboard() -> Result<(), String> {
    let settings = Settings::load_global();
    let db = open_run_db(&settings)?;
    let board = db.leaderboard().map_err(|e| e.to_string())?;
    print_json(&board)
}
