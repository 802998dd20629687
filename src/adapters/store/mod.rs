use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::game::{Conversation, GameRun, Verdict};
use crate::core::ports::store::{StoreError, StorePort};

pub const DEFAULT_BATTLE_LIMIT: usize = 50;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: String,
    pub interrogator_model: Option<String>,
    pub participant_model: Option<String>,
    pub judgment: Option<String>,
    pub verdict: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ParticipantStats {
    pub participant_model: String,
    pub total_games: i64,
    pub fooled_count: i64,
    pub success_rate: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InterrogatorStats {
    pub interrogator_model: String,
    pub total_games: i64,
    pub correct_count: i64,
    pub success_rate: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Leaderboard {
    pub participant_stats: Vec<ParticipantStats>,
    pub interrogator_stats: Vec<InterrogatorStats>,
}

pub struct RunDb {
    conn: Connection,
}

/// `StorePort` over a SQLite file. Each write opens its own connection, so
/// concurrent runs never share a handle.
pub struct SqliteRunStore {
    db_path: PathBuf,
}

impl SqliteRunStore {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

impl StorePort for SqliteRunStore {
    fn persist(&self, run: &GameRun) -> Result<(), StoreError> {
        let mut db = RunDb::open(&self.db_path)?;
        db.insert_run(run)
    }
}

impl RunDb {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS game_runs (
                run_id TEXT PRIMARY KEY,
                interrogator_model TEXT,
                participant_model TEXT,
                interrogator_system_prompt TEXT,
                participant_system_prompt TEXT,
                conversation TEXT,
                judgment TEXT,
                verdict TEXT,
                run_by TEXT,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );
            ",
        )?;

        // Migration-safe ALTERs for databases created before participant tracking.
        ignore_duplicate_column_error(
            conn.execute("ALTER TABLE game_runs ADD COLUMN participant_model TEXT", []),
        )?;
        ignore_duplicate_column_error(conn.execute(
            "ALTER TABLE game_runs ADD COLUMN participant_system_prompt TEXT",
            [],
        ))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_game_runs_created ON game_runs(created_at)",
            [],
        )?;

        Ok(Self { conn })
    }

    pub fn insert_run(&mut self, run: &GameRun) -> Result<(), StoreError> {
        let conversation_json = serde_json::to_string(&run.conversation)?;
        self.conn.execute(
            "INSERT INTO game_runs (run_id, interrogator_model, participant_model, interrogator_system_prompt,
                                    participant_system_prompt, conversation, judgment, verdict, run_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                run.run_id,
                run.interrogator_model,
                run.participant_model,
                run.interrogator_system_prompt,
                run.participant_system_prompt,
                conversation_json,
                run.judgment,
                run.verdict.as_str(),
                run.run_by,
                run.created_at
            ],
        )?;
        Ok(())
    }

    pub fn list_runs(&self, limit: usize) -> Result<Vec<RunSummary>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, interrogator_model, participant_model, judgment, verdict, created_at
             FROM game_runs
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(RunSummary {
                run_id: row.get(0)?,
                interrogator_model: row.get(1)?,
                participant_model: row.get(2)?,
                judgment: row.get(3)?,
                verdict: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?);
        }
        Ok(summaries)
    }

    pub fn get_run(&self, run_id: &str) -> Result<Option<GameRun>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT run_id, interrogator_model, participant_model, interrogator_system_prompt,
                        participant_system_prompt, conversation, judgment, verdict, run_by, created_at
                 FROM game_runs
                 WHERE run_id = ?1",
                params![run_id],
                |row| {
                    Ok(StoredRunRow {
                        run_id: row.get(0)?,
                        interrogator_model: row.get(1)?,
                        participant_model: row.get(2)?,
                        interrogator_system_prompt: row.get(3)?,
                        participant_system_prompt: row.get(4)?,
                        conversation: row.get(5)?,
                        judgment: row.get(6)?,
                        verdict: row.get(7)?,
                        run_by: row.get(8)?,
                        created_at: row.get(9)?,
                    })
                },
            )
            .optional()?;

        row.map(StoredRunRow::into_game_run).transpose()
    }

    pub fn leaderboard(&self) -> Result<Leaderboard, StoreError> {
        let mut participant_stmt = self.conn.prepare(
            "SELECT participant_model,
                    COUNT(*) AS total_games,
                    SUM(CASE WHEN verdict = 'Human' THEN 1 ELSE 0 END) AS fooled_count,
                    ROUND(SUM(CASE WHEN verdict = 'Human' THEN 1 ELSE 0 END) * 100.0 / COUNT(*), 1) AS success_rate
             FROM game_runs
             WHERE participant_model IS NOT NULL
             GROUP BY participant_model
             ORDER BY success_rate DESC, total_games DESC, participant_model ASC",
        )?;
        let participant_rows = participant_stmt.query_map([], |row| {
            Ok(ParticipantStats {
                participant_model: row.get(0)?,
                total_games: row.get(1)?,
                fooled_count: row.get(2)?,
                success_rate: row.get(3)?,
            })
        })?;
        let mut participant_stats = Vec::new();
        for row in participant_rows {
            participant_stats.push(row?);
        }

        let mut interrogator_stmt = self.conn.prepare(
            "SELECT interrogator_model,
                    COUNT(*) AS total_games,
                    SUM(CASE WHEN verdict = 'AI' THEN 1 ELSE 0 END) AS correct_count,
                    ROUND(SUM(CASE WHEN verdict = 'AI' THEN 1 ELSE 0 END) * 100.0 / COUNT(*), 1) AS success_rate
             FROM game_runs
             WHERE interrogator_model IS NOT NULL
             GROUP BY interrogator_model
             ORDER BY success_rate DESC, total_games DESC, interrogator_model ASC",
        )?;
        let interrogator_rows = interrogator_stmt.query_map([], |row| {
            Ok(InterrogatorStats {
                interrogator_model: row.get(0)?,
                total_games: row.get(1)?,
                correct_count: row.get(2)?,
                success_rate: row.get(3)?,
            })
        })?;
        let mut interrogator_stats = Vec::new();
        for row in interrogator_rows {
            interrogator_stats.push(row?);
        }

        Ok(Leaderboard {
            participant_stats,
            interrogator_stats,
        })
    }
}

struct StoredRunRow {
    run_id: String,
    interrogator_model: Option<String>,
    participant_model: Option<String>,
    interrogator_system_prompt: Option<String>,
    participant_system_prompt: Option<String>,
    conversation: Option<String>,
    judgment: Option<String>,
    verdict: Option<String>,
    run_by: Option<String>,
    created_at: String,
}

impl StoredRunRow {
    fn into_game_run(self) -> Result<GameRun, StoreError> {
        let conversation: Conversation = match self.conversation.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => serde_json::from_str(raw)?,
            _ => Conversation {
                interrogator_transcript: Default::default(),
                participant_transcript: Default::default(),
            },
        };

        Ok(GameRun {
            run_id: self.run_id,
            interrogator_model: self.interrogator_model.unwrap_or_default(),
            participant_model: self.participant_model.unwrap_or_default(),
            interrogator_system_prompt: self.interrogator_system_prompt.unwrap_or_default(),
            participant_system_prompt: self.participant_system_prompt.unwrap_or_default(),
            conversation,
            judgment: self.judgment.unwrap_or_default(),
            verdict: Verdict::from_stored(self.verdict.as_deref().unwrap_or_default()),
            run_by: self.run_by.unwrap_or_default(),
            created_at: self.created_at,
        })
    }
}

fn ignore_duplicate_column_error(result: rusqlite::Result<usize>) -> rusqlite::Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(_, Some(msg)))
            if msg.to_ascii_lowercase().contains("duplicate column name") =>
        {
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests;
