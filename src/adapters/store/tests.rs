use super::{RunDb, SqliteRunStore};
use crate::core::game::{Conversation, ConversationHistory, GameRun, Verdict};
use crate::core::ports::store::{StoreError, StorePort};
use rusqlite::Connection;
use std::path::PathBuf;

fn temp_db_path() -> PathBuf {
    std::env::temp_dir().join(format!("turing-arena-store-{}.db", uuid::Uuid::new_v4()))
}

fn sample_run(
    run_id: &str,
    participant: &str,
    interrogator: &str,
    verdict: Verdict,
    ts: &str,
) -> GameRun {
    let mut interrogator_transcript = ConversationHistory::with_system("interrogate");
    interrogator_transcript.push_assistant("What did you eat today?");
    interrogator_transcript.push_user("Leftover pizza, cold.");
    let mut participant_transcript = ConversationHistory::with_system("be human");
    participant_transcript.push_user("What did you eat today?");
    participant_transcript.push_assistant("Leftover pizza, cold.");

    GameRun {
        run_id: run_id.to_string(),
        interrogator_model: interrogator.to_string(),
        participant_model: participant.to_string(),
        interrogator_system_prompt: "interrogate".to_string(),
        participant_system_prompt: "be human".to_string(),
        conversation: Conversation {
            interrogator_transcript,
            participant_transcript,
        },
        judgment: "Cold pizza felt real.".to_string(),
        verdict,
        run_by: "test".to_string(),
        created_at: ts.to_string(),
    }
}

#[test]
fn persist_and_get_run_round_trips_conversation() {
    let db_path = temp_db_path();
    let store = SqliteRunStore::new(db_path.clone());
    let run = sample_run("run-a", "p/one", "i/one", Verdict::Human, "2026-01-01T10:00:00+00:00");

    store.persist(&run).expect("persist run");

    let db = RunDb::open(store.db_path()).expect("open db");
    let loaded = db.get_run("run-a").expect("query run").expect("run exists");
    assert_eq!(loaded, run);
    assert_eq!(loaded.conversation.participant_transcript.len(), 3);

    assert!(db.get_run("missing").expect("query missing").is_none());

    let _ = std::fs::remove_file(db_path);
}

#[test]
fn duplicate_run_id_is_a_storage_failure() {
    let db_path = temp_db_path();
    let store = SqliteRunStore::new(db_path.clone());
    let run = sample_run("dup", "p", "i", Verdict::Ai, "2026-01-01T10:00:00+00:00");

    store.persist(&run).expect("first insert");
    let err = store.persist(&run).expect_err("second insert must fail");
    assert!(matches!(err, StoreError::Sqlite(_)));

    let _ = std::fs::remove_file(db_path);
}

#[test]
fn list_runs_is_newest_first_and_limited() {
    let db_path = temp_db_path();
    let mut db = RunDb::open(&db_path).expect("open db");
    db.insert_run(&sample_run("old", "p", "i", Verdict::Ai, "2026-01-01T10:00:00+00:00"))
        .expect("insert old");
    db.insert_run(&sample_run("new", "p", "i", Verdict::Human, "2026-01-03T10:00:00+00:00"))
        .expect("insert new");
    db.insert_run(&sample_run("mid", "p", "i", Verdict::Unknown, "2026-01-02T10:00:00+00:00"))
        .expect("insert mid");

    let all = db.list_runs(50).expect("list runs");
    let ids = all.iter().map(|r| r.run_id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["new", "mid", "old"]);
    assert_eq!(all[0].verdict.as_deref(), Some("Human"));
    assert_eq!(all[1].verdict.as_deref(), Some("Unknown"));

    let limited = db.list_runs(1).expect("list limited");
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].run_id, "new");

    let _ = std::fs::remove_file(db_path);
}

#[test]
fn leaderboard_counts_fooled_and_correct_verdicts() {
    let db_path = temp_db_path();
    let mut db = RunDb::open(&db_path).expect("open db");
    let ts = "2026-02-01T00:00:00+00:00";
    db.insert_run(&sample_run("1", "p/alpha", "i/x", Verdict::Human, ts)).expect("1");
    db.insert_run(&sample_run("2", "p/alpha", "i/x", Verdict::Ai, ts)).expect("2");
    db.insert_run(&sample_run("3", "p/alpha", "i/y", Verdict::Human, ts)).expect("3");
    db.insert_run(&sample_run("4", "p/beta", "i/y", Verdict::Ai, ts)).expect("4");

    let board = db.leaderboard().expect("leaderboard");

    assert_eq!(board.participant_stats.len(), 2);
    let alpha = &board.participant_stats[0];
    assert_eq!(alpha.participant_model, "p/alpha");
    assert_eq!(alpha.total_games, 3);
    assert_eq!(alpha.fooled_count, 2);
    assert!((alpha.success_rate - 66.7).abs() < 1e-9);
    let beta = &board.participant_stats[1];
    assert_eq!(beta.fooled_count, 0);
    assert_eq!(beta.success_rate, 0.0);

    assert_eq!(board.interrogator_stats.len(), 2);
    // Both interrogators caught one AI out of two games; ties fall back to name.
    assert_eq!(board.interrogator_stats[0].interrogator_model, "i/x");
    assert_eq!(board.interrogator_stats[0].correct_count, 1);
    assert_eq!(board.interrogator_stats[0].success_rate, 50.0);
    assert_eq!(board.interrogator_stats[1].interrogator_model, "i/y");

    let _ = std::fs::remove_file(db_path);
}

#[test]
fn open_migrates_legacy_schema_without_participant_columns() {
    let db_path = temp_db_path();

    let conn = Connection::open(&db_path).expect("open temp sqlite");
    conn.execute_batch(
        "
        CREATE TABLE game_runs (
            run_id TEXT PRIMARY KEY,
            interrogator_model TEXT,
            interrogator_system_prompt TEXT,
            conversation TEXT,
            judgment TEXT,
            verdict TEXT,
            run_by TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
        INSERT INTO game_runs (run_id, interrogator_model, judgment, verdict, run_by)
        VALUES ('legacy', 'i/old', 'It was a bot.', 'AI', 'webapp');
        ",
    )
    .expect("create legacy schema");
    drop(conn);

    let db = RunDb::open(&db_path).expect("migrate legacy schema");

    let has_participant_model: i64 = db
        .conn
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info('game_runs') WHERE name = 'participant_model'",
            [],
            |row| row.get(0),
        )
        .expect("check participant_model column");
    assert_eq!(has_participant_model, 1);

    let legacy = db.get_run("legacy").expect("query legacy").expect("legacy row");
    assert_eq!(legacy.verdict, Verdict::Ai);
    assert_eq!(legacy.participant_model, "");
    assert!(legacy.conversation.interrogator_transcript.is_empty());

    // Re-opening an already migrated database is a no-op.
    drop(db);
    RunDb::open(&db_path).expect("reopen migrated db");

    let _ = std::fs::remove_file(db_path);
}
