use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use minesweeper_duel::{
    BoardError, Clock, GameConfig, GameSession, GameStatus, InMemoryPersistence, MoveOutcome, PlayerId,
    MINE_PENALTY, POINTS_PER_CELL, POINTS_PER_FLAG,
};
use rand::{rngs::SmallRng, SeedableRng};

/// 1x5 strip with a mine in the middle: `. 1 * 1 .`
fn strip() -> GameSession {
    let config = GameConfig::new(1, 5, 1).unwrap();
    let mut game = GameSession::new(config, "Ada", "Bob").unwrap();
    assert!(game.install_mines(&[(0, 2)]).unwrap());
    game
}

#[test]
fn rejects_invalid_configuration_up_front() {
    let config = GameConfig {
        rows: 4,
        cols: 4,
        mines: 7,
        ..GameConfig::default()
    };
    assert!(matches!(
        GameSession::new(config, "a", "b"),
        Err(BoardError::TooManyMines { .. })
    ));
}

#[test]
fn reveal_is_ignored_until_mines_exist() {
    let mut game = GameSession::new(GameConfig::default(), "a", "b").unwrap();
    assert_eq!(game.reveal(0, 0), None);
    assert_eq!(game.current_player(), PlayerId::One);
    assert!(game.is_first_move());
}

#[test]
fn play_reveal_generates_then_reveals() {
    let mut rng = SmallRng::seed_from_u64(11);
    let mut game = GameSession::new(GameConfig::default(), "a", "b").unwrap();
    let outcome = game.play_reveal(&mut rng, 5, 5).unwrap();
    let Some(MoveOutcome::Revealed { cells, hit_mine }) = outcome else {
        panic!("expected a reveal, got {:?}", outcome);
    };
    assert!(!hit_mine);
    assert!(!game.is_first_move());
    assert_eq!(game.board().mine_count(), 15);
    assert_eq!(game.remaining_safe_cells(), 85 - cells);
    assert_eq!(game.player(PlayerId::One).points(), cells as i32 * POINTS_PER_CELL);
    assert_eq!(game.current_player(), PlayerId::Two);
    assert_eq!(game.last_revealed_by(), Some(PlayerId::One));

    // A second call never regenerates the layout.
    let mines = game.board().mine_positions();
    game.play_reveal(&mut rng, 0, 0).unwrap();
    assert_eq!(game.board().mine_positions(), mines);
}

#[test]
fn mine_costs_penalty_and_passes_turn() {
    let mut game = strip();
    assert_eq!(
        game.reveal(0, 2),
        Some(MoveOutcome::Revealed {
            cells: 1,
            hit_mine: true
        })
    );
    assert_eq!(game.player(PlayerId::One).points(), -MINE_PENALTY);
    assert_eq!(game.current_player(), PlayerId::Two);
    assert_eq!(game.status(), GameStatus::Playing);
    assert_eq!(game.remaining_safe_cells(), 4);
}

#[test]
fn flag_place_scores_and_passes_turn_but_removal_does_not() {
    let mut game = strip();
    assert_eq!(game.toggle_flag(0, 2), Some(MoveOutcome::FlagPlaced));
    assert_eq!(game.player(PlayerId::One).points(), POINTS_PER_FLAG);
    assert_eq!(game.current_player(), PlayerId::Two);

    assert_eq!(game.toggle_flag(0, 2), Some(MoveOutcome::FlagRemoved));
    assert_eq!(game.player(PlayerId::Two).points(), 0);
    assert_eq!(game.player(PlayerId::One).points(), POINTS_PER_FLAG);
    assert_eq!(game.current_player(), PlayerId::Two);
}

#[test]
fn flagging_a_revealed_cell_is_ignored() {
    let mut game = strip();
    game.reveal(0, 0);
    assert_eq!(game.toggle_flag(0, 0), None);
    assert_eq!(game.current_player(), PlayerId::Two);
}

#[test]
fn equal_scores_end_in_a_draw() {
    let store = InMemoryPersistence::new();
    let config = GameConfig::new(1, 5, 1).unwrap();
    let mut game = GameSession::new(config, "Ada", "Bob")
        .unwrap()
        .with_persistence(Box::new(store.clone()));
    game.install_mines(&[(0, 2)]).unwrap();

    game.reveal(0, 0);
    assert_eq!(game.status(), GameStatus::Playing);
    game.reveal(0, 4);

    assert_eq!(game.status(), GameStatus::Draw);
    assert_eq!(game.player(PlayerId::One).points(), 20);
    assert_eq!(game.player(PlayerId::Two).points(), 20);
    assert_eq!(game.player(PlayerId::One).wins(), 0);
    assert_eq!(game.player(PlayerId::Two).wins(), 0);
    // The final move still passes the turn.
    assert_eq!(game.current_player(), PlayerId::One);

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].0, 1);
    assert_eq!(records[0].1.winner(), None);
    assert_eq!(records[0].1.cells_revealed, 4);
}

#[test]
fn higher_score_wins_even_off_a_mine() {
    let mut game = strip();
    game.reveal(0, 0); // P1 +20
    game.reveal(0, 2); // P2 -30
    game.reveal(0, 4); // P1 +20, board cleared
    assert_eq!(game.status(), GameStatus::Player1Won);
    assert_eq!(game.player(PlayerId::One).wins(), 1);
    assert_eq!(game.player(PlayerId::Two).wins(), 0);
}

#[test]
fn last_safe_cell_ends_game_for_the_player_behind() {
    let mut game = strip();
    game.toggle_flag(0, 2); // P1 +5
    game.reveal(0, 0); // P2 +20
    game.reveal(0, 4); // P1 +20
    assert_eq!(game.status(), GameStatus::Player1Won);
    assert_eq!(game.player(PlayerId::One).points(), 25);
}

#[test]
fn terminal_game_accepts_no_moves() {
    let mut game = strip();
    game.reveal(0, 0);
    game.reveal(0, 4);
    assert!(game.status().is_terminal());
    let before = game.state();
    assert_eq!(game.reveal(0, 2), None);
    assert_eq!(game.toggle_flag(0, 2), None);
    assert_eq!(game.state(), before);
}

#[test]
fn reset_keeps_wins_and_clears_the_rest() {
    let mut game = strip();
    game.reveal(0, 0);
    game.reveal(0, 2);
    game.reveal(0, 4);
    assert_eq!(game.player(PlayerId::One).wins(), 1);

    game.reset();
    let state = game.state();
    assert_eq!(state.status, GameStatus::Playing);
    assert_eq!(state.current_player, PlayerId::One);
    assert!(state.is_first_move);
    assert_eq!(state.player1.points(), 0);
    assert_eq!(state.player2.points(), 0);
    assert_eq!(state.player1.wins(), 1);
    assert_eq!(state.board.mine_count(), 0);
    assert_eq!(state.last_revealed_by, None);
}

#[test]
fn install_keeps_flags_and_replaces_until_first_reveal() {
    let config = GameConfig::new(1, 5, 1).unwrap();
    let mut game = GameSession::new(config, "a", "b").unwrap();
    game.toggle_flag(0, 4);
    assert!(game.install_mines(&[(0, 2)]).unwrap());
    assert!(game.board().cell(0, 4).unwrap().is_flagged);

    // A newer layout wins while nothing is uncovered.
    assert!(game.install_mines(&[(0, 0)]).unwrap());
    assert_eq!(game.board().mine_positions(), vec![(0, 0)]);
    assert!(game.board().cell(0, 4).unwrap().is_flagged);

    assert!(game.reveal(0, 3).is_some());
    assert!(!game.install_mines(&[(0, 2)]).unwrap());
    assert_eq!(game.board().mine_positions(), vec![(0, 0)]);
}

#[derive(Clone, Default)]
struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    fn set(&self, millis: u64) {
        self.0.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[test]
fn finished_game_record_carries_timing() {
    let store = InMemoryPersistence::new();
    let clock = ManualClock::default();
    let config = GameConfig::new(1, 5, 1).unwrap();
    let mut game = GameSession::new(config, "Ada", "Bob")
        .unwrap()
        .with_clock(Box::new(clock.clone()))
        .with_persistence(Box::new(store.clone()));
    assert_eq!(game.started_at(), None);

    clock.set(1_000);
    game.install_mines(&[(0, 2)]).unwrap();
    assert_eq!(game.started_at(), Some(1_000));

    clock.set(4_500);
    game.reveal(0, 0);
    game.reveal(0, 2);
    game.reveal(0, 4);
    assert_eq!(game.status(), GameStatus::Player1Won);

    let records = store.records();
    assert_eq!(records.len(), 1);
    let record = &records[0].1;
    assert_eq!(record.started_at_ms, Some(1_000));
    assert_eq!(record.finished_at_ms, Some(4_500));
    assert_eq!(record.duration_ms, Some(3_500));
    assert!(record.hit_mine);
    assert_eq!((record.rows, record.cols, record.mine_count), (1, 5, 1));

    game.reset();
    assert_eq!(game.started_at(), None);
}

#[test]
fn record_without_a_mine_hit() {
    let store = InMemoryPersistence::new();
    let config = GameConfig::new(1, 5, 1).unwrap();
    let mut game = GameSession::new(config, "Ada", "Bob")
        .unwrap()
        .with_persistence(Box::new(store.clone()));
    game.install_mines(&[(0, 2)]).unwrap();
    game.reveal(0, 0);
    game.reveal(0, 4);

    let record = &store.records()[0].1;
    assert!(!record.hit_mine);
    assert!(record.started_at_ms.is_some());
    assert!(record.duration_ms.is_some());
}

#[test]
fn snapshot_replaces_state_and_persists_on_finish() {
    let store = InMemoryPersistence::new();
    let config = GameConfig::new(1, 5, 1).unwrap();
    let mut peer = GameSession::new(config, "Ada", "Bob").unwrap();
    let mut local = GameSession::new(config, "x", "y")
        .unwrap()
        .with_persistence(Box::new(store.clone()));

    peer.install_mines(&[(0, 2)]).unwrap();
    peer.reveal(0, 0);
    local.apply_snapshot(peer.state()).unwrap();
    assert_eq!(local.state(), peer.state());
    assert!(store.is_empty());

    peer.reveal(0, 4);
    local.apply_snapshot(peer.state()).unwrap();
    assert_eq!(local.status(), GameStatus::Draw);
    assert_eq!(store.len(), 1);

    // Re-applying a terminal snapshot does not persist twice.
    local.apply_snapshot(peer.state()).unwrap();
    assert_eq!(store.len(), 1);
}

#[test]
fn snapshot_with_other_dimensions_is_rejected() {
    let mut local = GameSession::new(GameConfig::default(), "a", "b").unwrap();
    let other = GameSession::new(GameConfig::new(8, 8, 10).unwrap(), "a", "b").unwrap();
    let before = local.state();
    assert_eq!(
        local.apply_snapshot(other.state()),
        Err(BoardError::DimensionMismatch {
            expected: (10, 10),
            actual: (8, 8)
        })
    );
    assert_eq!(local.state(), before);
}

#[test]
fn names_are_sanitized() {
    let game = GameSession::new(GameConfig::default(), "a#b|c:d", "   ").unwrap();
    assert_eq!(game.player(PlayerId::One).name(), "a_b_c_d");
    assert_eq!(game.player(PlayerId::Two).name(), "Player 2");
}

#[test]
fn renamed_players_are_sanitized_too() {
    let mut game = GameSession::new(GameConfig::default(), "Ada", "Bob").unwrap();
    game.rename_player(PlayerId::Two, "Grace|Hopper");
    assert_eq!(game.player(PlayerId::Two).name(), "Grace_Hopper");
    game.rename_player(PlayerId::One, "");
    assert_eq!(game.player(PlayerId::One).name(), "Player 1");
}
