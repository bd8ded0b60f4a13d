mod database_tests {
    use crate::*;
    use types::{GameDraft, GameType, Role, Scenario, ScenarioOption, SessionSnapshot};

    pub async fn setup_test_db() -> SqliteStore {
        let config = DatabaseConfig {
            url: MEMORY_URL.to_string(),
            pool_size: 1,
        };
        SqliteStore::connect(&config)
            .await
            .expect("Failed to create test database")
    }

    fn scenario(situation: &str, points: u32) -> Scenario {
        Scenario::new(
            situation,
            vec![
                ScenarioOption::new("A", "Check the source"),
                ScenarioOption::new("B", "Share it right away"),
                ScenarioOption::new("C", "Ignore it"),
            ],
            "A",
            points,
            "Always verify before sharing.",
        )
        .unwrap()
    }

    fn draft(count: usize) -> GameDraft {
        GameDraft {
            title: "Spot the Hoax".to_string(),
            description: Some("Media literacy basics".to_string()),
            game_type: GameType::Quiz,
            cover_image_url: None,
            scenarios: (0..count)
                .map(|i| scenario(&format!("Scenario number {i}"), 20))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_register_and_lookup_profile() {
        let store = setup_test_db().await;
        let profile = store
            .register_profile("  ayu ", Role::Player)
            .await
            .expect("Failed to register");
        assert_eq!(profile.username, "ayu");

        let found = store.profile_by_username("ayu").await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(profile.id));
        assert!(store.profile_by_username("nobody").await.unwrap().is_none());

        let duplicate = store.register_profile("ayu", Role::Player).await;
        assert!(matches!(duplicate, Err(DatabaseError::Invalid(_))));
        assert!(store.register_profile("   ", Role::Player).await.is_err());
    }

    #[tokio::test]
    async fn test_update_username() {
        let store = setup_test_db().await;
        let ayu = store.register_profile("ayu", Role::Player).await.unwrap();
        store.register_profile("budi", Role::Player).await.unwrap();

        let renamed = store.update_username(ayu.id, "ayu_reads").await.unwrap();
        assert_eq!(renamed.username, "ayu_reads");
        assert!(store.update_username(ayu.id, "budi").await.is_err());
    }

    #[tokio::test]
    async fn test_create_game_round_trips_scenarios() {
        let mut store = setup_test_db().await;
        let creator = store.register_profile("maker", Role::Player).await.unwrap();
        let mut draft = draft(3);
        draft.scenarios[1] = draft.scenarios[1]
            .clone()
            .with_question("What do you do?")
            .with_answer_time(30)
            .with_highlight("number 1")
            .unwrap();

        let game = store.create_game(creator.id, draft).await.unwrap();
        assert!(game.game_code.as_str().starts_with("DIGI"));

        let loaded = store
            .fetch_game_by_code(&game.game_code)
            .await
            .unwrap()
            .expect("game should exist");
        assert_eq!(loaded.scenarios, game.scenarios);
        assert_eq!(loaded.scenarios[1].answer_time, Some(30));
        assert_eq!(loaded.scenarios[1].highlight_phrase.as_deref(), Some("number 1"));
        assert_eq!(loaded.play_count, 0);
    }

    #[tokio::test]
    async fn test_create_game_rejects_bad_correct_answer() {
        let store = setup_test_db().await;
        let creator = store.register_profile("maker", Role::Player).await.unwrap();
        let mut draft = draft(1);
        draft.scenarios[0].correct_answer = "Z".to_string();

        let result = store.create_game(creator.id, draft).await;
        assert!(matches!(result, Err(DatabaseError::Scenario(_))));
    }

    #[tokio::test]
    async fn test_session_upsert_is_last_write_wins() {
        let mut store = setup_test_db().await;
        let player = store.register_profile("player", Role::Player).await.unwrap();
        let game = store.create_game(player.id, draft(5)).await.unwrap();

        let first = SessionSnapshot::new(player.id, game.id, 1, 20.0, 100);
        let second = SessionSnapshot::new(player.id, game.id, 3, 40.0, 80);
        store.upsert_session(&first).await.unwrap();
        store.upsert_session(&second).await.unwrap();

        let loaded = store.fetch_session(player.id, game.id).await.unwrap();
        assert_eq!(loaded, Some(second));

        store.delete_session(player.id, game.id).await.unwrap();
        assert!(store.fetch_session(player.id, game.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_score_update_adds_and_keeps_larger_count() {
        let mut store = setup_test_db().await;
        let player = store.register_profile("player", Role::Player).await.unwrap();
        let game = store.create_game(player.id, draft(5)).await.unwrap();

        let record = store.insert_score(player.id, game.id, 60.0, 5).await.unwrap();
        assert!(store.insert_score(player.id, game.id, 1.0, 5).await.is_err());

        let updated = store.update_score(record.id, 2.5, 3).await.unwrap();
        assert_eq!(updated.score_achieved, 62.5);
        assert_eq!(updated.scenario_count, 5);

        let updated = store.update_score(record.id, 40.0, 8).await.unwrap();
        assert_eq!(updated.scenario_count, 8);

        let missing = store.update_score(uuid::Uuid::new_v4(), 1.0, 1).await;
        assert!(matches!(missing, Err(DatabaseError::ScoreNotFound(_))));
    }

    #[tokio::test]
    async fn test_play_count_and_xp() {
        let mut store = setup_test_db().await;
        let player = store.register_profile("player", Role::Player).await.unwrap();
        let game = store.create_game(player.id, draft(1)).await.unwrap();

        store.increment_play_count(game.id).await.unwrap();
        store.grant_xp(player.id, 7.5).await.unwrap();
        store.grant_xp(player.id, 2.0).await.unwrap();

        assert_eq!(store.fetch_game_by_id(game.id).await.unwrap().play_count, 1);
        assert_eq!(store.fetch_profile(player.id).await.unwrap().total_xp, 9.5);
        assert!(store.grant_xp(uuid::Uuid::new_v4(), 1.0).await.is_err());
    }

    #[tokio::test]
    async fn test_adding_scenarios_keeps_scores() {
        let mut store = setup_test_db().await;
        let creator = store.register_profile("maker", Role::Player).await.unwrap();
        let game = store.create_game(creator.id, draft(5)).await.unwrap();
        store.insert_score(creator.id, game.id, 100.0, 5).await.unwrap();
        store
            .upsert_session(&SessionSnapshot::new(creator.id, game.id, 2, 40.0, 100))
            .await
            .unwrap();

        let reset = store.update_game(creator.id, game.id, draft(8)).await.unwrap();
        assert_eq!(reset, ProgressReset::SessionsOnly);
        assert!(store.fetch_score(creator.id, game.id).await.unwrap().is_some());
        assert!(store.fetch_session(creator.id, game.id).await.unwrap().is_none());
        assert_eq!(store.fetch_game_by_id(game.id).await.unwrap().scenario_count(), 8);
    }

    #[tokio::test]
    async fn test_editing_scenarios_clears_scores() {
        let mut store = setup_test_db().await;
        let creator = store.register_profile("maker", Role::Player).await.unwrap();
        let game = store.create_game(creator.id, draft(5)).await.unwrap();
        store.insert_score(creator.id, game.id, 100.0, 5).await.unwrap();

        let mut edited = draft(5);
        edited.scenarios[0].points = 50;
        let reset = store.update_game(creator.id, game.id, edited).await.unwrap();
        assert_eq!(reset, ProgressReset::Full);
        assert!(store.fetch_score(creator.id, game.id).await.unwrap().is_none());

        let mut retitled = draft(5);
        retitled.scenarios[0].points = 50;
        retitled.title = "Renamed".to_string();
        let reset = store.update_game(creator.id, game.id, retitled).await.unwrap();
        assert_eq!(reset, ProgressReset::None);
        assert_eq!(store.fetch_game_by_id(game.id).await.unwrap().title, "Renamed");
    }

    #[tokio::test]
    async fn test_only_creator_or_admin_may_delete() {
        let store = setup_test_db().await;
        let creator = store.register_profile("maker", Role::Player).await.unwrap();
        let other = store.register_profile("other", Role::Player).await.unwrap();
        let admin = store.register_profile("admin", Role::Admin).await.unwrap();
        let game = store.create_game(creator.id, draft(1)).await.unwrap();

        let denied = store.delete_game(&other, game.id).await;
        assert!(matches!(denied, Err(DatabaseError::Forbidden(_))));
        assert!(store.update_game(other.id, game.id, draft(2)).await.is_err());

        store.delete_game(&admin, game.id).await.unwrap();
        assert!(store.fetch_game(game.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_games_marks_completed() {
        let mut store = setup_test_db().await;
        let creator = store.register_profile("maker", Role::Player).await.unwrap();
        let player = store.register_profile("player", Role::Player).await.unwrap();
        let official = store.create_game(creator.id, draft(2)).await.unwrap();
        store.set_official(official.id, true).await.unwrap();
        let community = store.create_game(creator.id, draft(3)).await.unwrap();
        store.insert_score(player.id, community.id, 60.0, 3).await.unwrap();

        let catalog = store.list_games(Some(player.id)).await.unwrap();
        assert_eq!(catalog.official.len(), 1);
        assert!(!catalog.official[0].completed);
        assert_eq!(catalog.community.len(), 1);
        assert!(catalog.community[0].completed);
        assert_eq!(catalog.community[0].game.creator_username.as_deref(), Some("maker"));

        let anonymous = store.list_games(None).await.unwrap();
        assert!(!anonymous.community[0].completed);

        assert_eq!(store.games_by_creator(creator.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_leaderboard_orders_by_xp() {
        let mut store = setup_test_db().await;
        for (name, xp) in [("low", 5.0), ("high", 120.0), ("mid", 42.5)] {
            let profile = store.register_profile(name, Role::Player).await.unwrap();
            store.grant_xp(profile.id, xp).await.unwrap();
        }

        let board = store.leaderboard().await.unwrap();
        let names: Vec<_> = board.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
        assert_eq!(board[0].rank, 1);
    }

    #[tokio::test]
    async fn test_score_with_title() {
        let mut store = setup_test_db().await;
        let player = store.register_profile("player", Role::Player).await.unwrap();
        let game = store.create_game(player.id, draft(2)).await.unwrap();
        store.insert_score(player.id, game.id, 27.5, 2).await.unwrap();

        let result = store
            .score_with_title(player.id, &game.game_code)
            .await
            .unwrap()
            .expect("score exists");
        assert_eq!(result.game_title, "Spot the Hoax");
        assert_eq!(result.score_achieved, 27.5);
    }

    #[tokio::test]
    async fn test_report_dismiss_flow() {
        let store = setup_test_db().await;
        let creator = store.register_profile("maker", Role::Player).await.unwrap();
        let reporter = store.register_profile("reporter", Role::Player).await.unwrap();
        let admin = store.register_profile("admin", Role::Admin).await.unwrap();
        let game = store.create_game(creator.id, draft(1)).await.unwrap();

        assert!(store.submit_report(reporter.id, game.id, "  ").await.is_err());
        let report = store
            .submit_report(reporter.id, game.id, "Offensive content")
            .await
            .unwrap();
        assert!(store.fetch_game_by_id(game.id).await.unwrap().is_under_review);
        assert!(store.list_games(None).await.unwrap().community.is_empty());

        let denied = store.pending_reports(reporter.id).await;
        assert!(matches!(denied, Err(DatabaseError::Forbidden(_))));

        let pending = store.pending_reports(admin.id).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].report.id, report.id);
        assert_eq!(pending[0].game_code.as_ref(), Some(&game.game_code));

        store.dismiss_report(admin.id, report.id).await.unwrap();
        assert!(!store.fetch_game_by_id(game.id).await.unwrap().is_under_review);
        assert!(store.pending_reports(admin.id).await.unwrap().is_empty());
        assert!(matches!(
            store.dismiss_report(admin.id, report.id).await,
            Err(DatabaseError::ReportNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_report_resolution_deletes_game() {
        let store = setup_test_db().await;
        let creator = store.register_profile("maker", Role::Player).await.unwrap();
        let admin = store.register_profile("admin", Role::Admin).await.unwrap();
        let game = store.create_game(creator.id, draft(1)).await.unwrap();
        let report = store
            .submit_report(creator.id, game.id, "Duplicate of another game")
            .await
            .unwrap();

        let deleted = store
            .resolve_report_by_deleting(admin.id, report.id)
            .await
            .unwrap();
        assert_eq!(deleted, Some(game.id));
        assert!(store.fetch_game(game.id).await.unwrap().is_none());
        assert!(store.pending_reports(admin.id).await.unwrap().is_empty());
    }
}
