use chrono::Utc;
use database::{GameStore, MemoryStore};
use explorer::{run_session, GameFile, Outcome, PlayError, PlaySession};
use strategies::{PerfectStrategy, ScriptedStrategy};
use types::{
    Answer, EntryPoint, Event, Game, GameType, Identity, JoinCode, RewardPolicy, RunStatus,
    Scenario, ScenarioOption, SessionSnapshot,
};
use uuid::Uuid;

fn scenario(points: u32) -> Scenario {
    Scenario::new(
        "A post claims a celebrity endorsed a miracle cure.",
        vec![
            ScenarioOption::new("A", "Check a fact-checking site"),
            ScenarioOption::new("B", "Buy the cure"),
            ScenarioOption::new("C", "Share it"),
        ],
        "A",
        points,
        "Fact-checkers track viral health claims.",
    )
    .unwrap()
}

fn make_game(code: &str, game_type: GameType, points: &[u32]) -> Game {
    Game {
        id: Uuid::new_v4(),
        title: "Health Hoaxes".to_string(),
        description: None,
        game_type,
        game_code: JoinCode::parse(code).unwrap(),
        creator_id: Uuid::new_v4(),
        play_count: 0,
        is_official: true,
        is_under_review: false,
        cover_image_url: None,
        created_at: Utc::now(),
        scenarios: points.iter().map(|&p| scenario(p)).collect(),
    }
}

fn player() -> Identity {
    Identity::new(Uuid::new_v4(), "rahmat")
}

fn store_with(game: &Game) -> MemoryStore {
    let mut store = MemoryStore::new();
    store.insert_game(game.clone());
    store
}

#[tokio::test]
async fn test_two_scenario_quiz_end_to_end() {
    let game = make_game("DIGI000001", GameType::Quiz, &[20, 30]);
    let mut store = store_with(&game);
    let player = player();
    let mut strategy = ScriptedStrategy::new([Answer::pick("A"), Answer::pick("B")]);

    let report = run_session(
        &mut store,
        Some(player.clone()),
        "digi000001",
        EntryPoint::Play,
        &mut strategy,
    )
    .await
    .expect("session should run");

    let Outcome::Completed(finalized) = report.outcome else {
        panic!("expected completion, got {:?}", report.outcome);
    };
    assert_eq!(finalized.result.score, 20.0);
    assert_eq!(finalized.xp_granted, 20.0);
    assert!(report.notices.is_empty());
    assert!(report.history.contains(&Event::Answered {
        index: 1,
        selected: Some("B".to_string()),
        correct: false,
        awarded: 0.0,
        hp: 80,
    }));

    let record = store.score_for(player.user_id, game.id).unwrap();
    assert_eq!(record.score_achieved, 20.0);
    assert_eq!(record.scenario_count, 2);
    assert_eq!(store.play_count(game.id), Some(1));
    assert_eq!(store.xp_for(player.user_id), 20.0);
    assert!(store.session_for(player.user_id, game.id).is_none());
}

#[tokio::test]
async fn test_unknown_code_and_signed_out_player() {
    let game = make_game("DIGI000001", GameType::Quiz, &[20]);
    let mut store = store_with(&game);
    let mut strategy = PerfectStrategy::default();

    let missing = run_session(&mut store, Some(player()), "DIGI123456", EntryPoint::Play, &mut strategy).await;
    assert!(matches!(missing, Err(PlayError::GameNotFound(_))));

    let malformed = run_session(&mut store, Some(player()), "nope", EntryPoint::Play, &mut strategy).await;
    assert!(matches!(malformed, Err(PlayError::GameNotFound(_))));

    let signed_out = run_session(&mut store, None, "DIGI000001", EntryPoint::Play, &mut strategy).await;
    assert!(matches!(signed_out, Err(PlayError::Unauthenticated)));
}

#[tokio::test]
async fn test_abandon_saves_progress_and_resume_restores_it() {
    let game = make_game("DIGI000003", GameType::Quiz, &[20, 20, 20, 20, 20]);
    let mut store = store_with(&game);
    let player = player();

    let mut strategy = ScriptedStrategy::new([
        Answer::pick("A"),
        Answer::pick("A"),
        Answer::pick("C"),
    ])
    .stopping_after(3);
    let report = run_session(&mut store, Some(player.clone()), "DIGI000003", EntryPoint::Play, &mut strategy)
        .await
        .unwrap();
    assert_eq!(report.outcome, Outcome::Abandoned { index: 2 });

    let saved = store.session_for(player.user_id, game.id).unwrap();
    assert_eq!(saved, &SessionSnapshot::new(player.user_id, game.id, 3, 40.0, 80));

    let session = PlaySession::start(&mut store, Some(player.clone()), "DIGI000003", EntryPoint::Play)
        .await
        .unwrap();
    assert_eq!(session.state().index(), 3);
    assert_eq!(session.state().score(), 40.0);
    assert_eq!(session.state().hp(), 80);
}

#[tokio::test]
async fn test_failure_writes_no_score() {
    let game = make_game("DIGI000004", GameType::Quiz, &[20; 6]);
    let mut store = store_with(&game);
    let player = player();
    store
        .upsert_session(&SessionSnapshot::new(player.user_id, game.id, 1, 20.0, 100))
        .await
        .unwrap();

    let mut strategy = ScriptedStrategy::new(vec![Answer::pick("B"); 5]);
    let report = run_session(&mut store, Some(player.clone()), "DIGI000004", EntryPoint::Play, &mut strategy)
        .await
        .unwrap();

    assert_eq!(report.outcome, Outcome::Failed { score: 20.0 });
    assert!(store.session_for(player.user_id, game.id).is_none());
    assert!(store.score_for(player.user_id, game.id).is_none());
    assert_eq!(store.xp_for(player.user_id), 0.0);
    assert_eq!(store.play_count(game.id), Some(0));
}

#[tokio::test]
async fn test_retry_after_failure_uses_reduced_reward() {
    let game = make_game("DIGI000005", GameType::Quiz, &[20, 20, 20, 20, 20]);
    let mut store = store_with(&game);
    let player = player();

    let mut answers = vec![Answer::pick("B"); 5];
    answers.extend(vec![Answer::pick("A"); 5]);
    let mut strategy = ScriptedStrategy::new(answers).with_retries(1);
    let report = run_session(&mut store, Some(player.clone()), "DIGI000005", EntryPoint::Play, &mut strategy)
        .await
        .unwrap();

    let Outcome::Completed(finalized) = report.outcome else {
        panic!("expected completion after retry");
    };
    assert_eq!(finalized.result.policy, RewardPolicy::Retry);
    assert!((finalized.result.score - 10.0).abs() < 1e-9);
    assert!(report
        .history
        .iter()
        .any(|e| matches!(e, Event::Restarted { policy: RewardPolicy::Retry })));
    assert_eq!(store.play_count(game.id), Some(1));
}

#[tokio::test]
async fn test_extension_resumes_at_new_content_and_updates_record() {
    let mut game = make_game("DIGI000006", GameType::Quiz, &[20; 5]);
    let mut store = store_with(&game);
    let player = player();

    let mut strategy = PerfectStrategy::default();
    run_session(&mut store, Some(player.clone()), "DIGI000006", EntryPoint::Play, &mut strategy)
        .await
        .unwrap();
    assert_eq!(store.score_for(player.user_id, game.id).unwrap().score_achieved, 100.0);

    let replay = run_session(&mut store, Some(player.clone()), "DIGI000006", EntryPoint::Play, &mut strategy).await;
    assert!(matches!(replay, Err(PlayError::AlreadyCompleted(_))));

    game.scenarios.extend((0..3).map(|_| scenario(20)));
    store.replace_scenarios(game.id, game.scenarios.clone());

    let session = PlaySession::start(&mut store, Some(player.clone()), "DIGI000006", EntryPoint::Play)
        .await
        .unwrap();
    assert_eq!(session.state().index(), 5);
    drop(session);

    let report = run_session(&mut store, Some(player.clone()), "DIGI000006", EntryPoint::Play, &mut strategy)
        .await
        .unwrap();
    let Outcome::Completed(finalized) = report.outcome else {
        panic!("expected completion");
    };
    assert_eq!(finalized.result.earned, 60.0);

    let record = store.score_for(player.user_id, game.id).unwrap();
    assert_eq!(record.scenario_count, 8);
    assert_eq!(record.score_achieved, 160.0);
    assert_eq!(store.xp_for(player.user_id), 160.0);
    assert_eq!(store.play_count(game.id), Some(1));
}

#[tokio::test]
async fn test_review_of_completed_game() {
    let game = make_game("DIGI000007", GameType::Quiz, &[20, 20, 20, 20, 20, 20]);
    let mut store = store_with(&game);
    let player = player();
    let mut strategy = PerfectStrategy::default();
    run_session(&mut store, Some(player.clone()), "DIGI000007", EntryPoint::Play, &mut strategy)
        .await
        .unwrap();

    let report = run_session(&mut store, Some(player.clone()), "DIGI000007", EntryPoint::Review, &mut strategy)
        .await
        .unwrap();
    let Outcome::Completed(finalized) = report.outcome else {
        panic!("expected completion");
    };
    assert_eq!(types::format_points(finalized.result.score), "3.00");
    let record = store.score_for(player.user_id, game.id).unwrap();
    assert!((record.score_achieved - 123.0).abs() < 1e-9);
    assert_eq!(store.play_count(game.id), Some(1));
}

#[tokio::test]
async fn test_snapshot_past_last_scenario_finalizes_on_entry() {
    let game = make_game("DIGI000008", GameType::Quiz, &[20, 20]);
    let mut store = store_with(&game);
    let player = player();
    store
        .upsert_session(&SessionSnapshot::new(player.user_id, game.id, 2, 40.0, 100))
        .await
        .unwrap();

    let session = PlaySession::start(&mut store, Some(player.clone()), "DIGI000008", EntryPoint::Play)
        .await
        .unwrap();
    assert_eq!(session.state().status(), RunStatus::Completed);
    assert_eq!(session.finalized().map(|f| f.result.score), Some(40.0));
    drop(session);

    assert!(store.session_for(player.user_id, game.id).is_none());
    assert_eq!(store.score_for(player.user_id, game.id).unwrap().score_achieved, 40.0);
}

#[tokio::test]
async fn test_write_failures_become_notices() {
    let game = make_game("DIGI000009", GameType::Quiz, &[20, 20]);
    let mut store = store_with(&game);
    let player = player();
    store.set_fail_writes(true);

    let mut strategy = PerfectStrategy::default();
    let report = run_session(&mut store, Some(player.clone()), "DIGI000009", EntryPoint::Play, &mut strategy)
        .await
        .unwrap();

    let Outcome::Completed(finalized) = report.outcome else {
        panic!("a failing store must not stop the run");
    };
    assert_eq!(finalized.result.score, 40.0);
    assert!(finalized.record.is_none());
    assert_eq!(finalized.xp_granted, 0.0);
    assert!(!report.notices.is_empty());
    assert!(report.notices.iter().any(|n| n.operation == "save your progress"));
    assert!(report.notices.iter().any(|n| n.operation == "record your score"));
}

#[tokio::test]
async fn test_story_timeouts_cost_hp() {
    let game = make_game("DIGI000010", GameType::Story, &[20, 20]);
    let mut store = store_with(&game);
    let player = player();
    let mut strategy = ScriptedStrategy::new([Answer::TimedOut, Answer::pick("A")]);

    let report = run_session(&mut store, Some(player.clone()), "DIGI000010", EntryPoint::Play, &mut strategy)
        .await
        .unwrap();

    assert!(matches!(report.outcome, Outcome::Completed(_)));
    assert!(report
        .history
        .iter()
        .any(|e| matches!(e, Event::FinishedReading { index: 1 })));
    assert!(report.history.contains(&Event::Answered {
        index: 0,
        selected: None,
        correct: false,
        awarded: 0.0,
        hp: 80,
    }));
}

#[tokio::test]
async fn test_demo_game_file_plays_through() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../demos/digital_literacy.yaml");
    let game = GameFile::load(&path).unwrap().into_game("DIGI999999").unwrap();
    assert_eq!(game.game_code.as_str(), "DIGI000001");
    let mut store = store_with(&game);

    let mut strategy = PerfectStrategy::default();
    let report = run_session(&mut store, Some(player()), "DIGI000001", EntryPoint::Play, &mut strategy)
        .await
        .unwrap();
    let Outcome::Completed(finalized) = report.outcome else {
        panic!("expected completion");
    };
    assert_eq!(finalized.result.score, 70.0);
}

#[tokio::test]
async fn test_failed_score_write_grants_no_xp() {
    let game = make_game("DIGI000011", GameType::Quiz, &[20, 30]);
    let mut store = store_with(&game);
    let player = player();
    store.fail_operation("insert_score");

    let mut strategy = PerfectStrategy::default();
    for _ in 0..2 {
        let report = run_session(&mut store, Some(player.clone()), "DIGI000011", EntryPoint::Play, &mut strategy)
            .await
            .unwrap();
        let Outcome::Completed(finalized) = report.outcome else {
            panic!("expected completion");
        };
        assert!(finalized.record.is_none());
        assert_eq!(finalized.xp_granted, 0.0);
        assert!(report.notices.iter().any(|n| n.operation == "record your score"));
    }

    assert!(store.score_for(player.user_id, game.id).is_none());
    assert_eq!(store.xp_for(player.user_id), 0.0);
    assert_eq!(store.play_count(game.id), Some(0));
}

#[tokio::test]
async fn test_reduced_entry_on_unfinished_game_plays_at_full_reward() {
    let game = make_game("DIGI000012", GameType::Quiz, &[20, 30]);
    let mut store = store_with(&game);
    let player = player();
    let mut strategy = PerfectStrategy::default();

    let report = run_session(&mut store, Some(player.clone()), "DIGI000012", EntryPoint::Retry, &mut strategy)
        .await
        .unwrap();
    let Outcome::Completed(finalized) = report.outcome else {
        panic!("expected completion");
    };
    assert_eq!(finalized.result.policy, RewardPolicy::Normal);
    assert_eq!(finalized.result.score, 50.0);
    assert_eq!(store.score_for(player.user_id, game.id).unwrap().score_achieved, 50.0);
    assert_eq!(store.xp_for(player.user_id), 50.0);

    let review = run_session(&mut store, Some(player.clone()), "DIGI000012", EntryPoint::Review, &mut strategy)
        .await
        .unwrap();
    let Outcome::Completed(finalized) = review.outcome else {
        panic!("expected completion");
    };
    assert_eq!(finalized.result.policy, RewardPolicy::Review);
    assert!((store.score_for(player.user_id, game.id).unwrap().score_achieved - 51.25).abs() < 1e-9);
}

#[tokio::test]
async fn test_review_entry_resumes_saved_progress_on_unfinished_game() {
    let game = make_game("DIGI000013", GameType::Quiz, &[20, 20, 20]);
    let mut store = store_with(&game);
    let player = player();
    store
        .upsert_session(&SessionSnapshot::new(player.user_id, game.id, 1, 20.0, 80))
        .await
        .unwrap();

    let session = PlaySession::start(&mut store, Some(player.clone()), "DIGI000013", EntryPoint::Review)
        .await
        .unwrap();
    assert_eq!(session.state().policy(), RewardPolicy::Normal);
    assert_eq!(session.state().index(), 1);
    assert_eq!(session.state().hp(), 80);
}
