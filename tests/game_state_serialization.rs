use minesweeper_duel::snapshot::{decode_mines, decode_state, encode_mines, encode_state};
use minesweeper_duel::{
    Difficulty, GameConfig, GameRecord, GameSession, GameState, GameStatus, Message, PlayerId,
};
use proptest::prelude::*;
use rand::{rngs::SmallRng, Rng, SeedableRng};

/// Play a random but legal sequence of hot-seat moves.
fn reachable_state(seed: u64, moves: usize, difficulty: Difficulty) -> GameState {
    let mut rng = SmallRng::seed_from_u64(seed);
    let config: GameConfig = difficulty.into();
    let mut game = GameSession::new(config, "Ada Lovelace", "Bob").unwrap();
    for _ in 0..moves {
        let r = rng.random_range(0..config.rows);
        let c = rng.random_range(0..config.cols);
        if rng.random_bool(0.25) {
            game.toggle_flag(r, c);
        } else {
            game.play_reveal(&mut rng, r, c).unwrap();
        }
    }
    game.state()
}

#[test]
fn fresh_game_encodes_as_expected() {
    let config = GameConfig::new(2, 3, 0).unwrap();
    let game = GameSession::new(config, "Ada", "Bob").unwrap();
    assert_eq!(
        encode_state(&game.state()),
        "0,0,0,0/0,0,0,0/0,0,0,0;0,0,0,0/0,0,0,0/0,0,0,0#Ada:0:0#Bob:0:0#1#PLAYING#6#0#0#1#null"
    );
}

#[test]
fn snapshot_fields_survive_a_round_trip() {
    let config = GameConfig::new(1, 5, 1).unwrap();
    let mut game = GameSession::new(config, "Ada", "Bob").unwrap();
    game.install_mines(&[(0, 2)]).unwrap();
    game.toggle_flag(0, 2);
    game.reveal(0, 0);
    game.reveal(0, 4);

    let state = game.state();
    assert_eq!(state.status, GameStatus::Player1Won);
    let encoded = encode_state(&state);
    assert!(!encoded.contains('|'));
    assert!(!encoded.contains('\n'));
    let decoded = decode_state(&encoded).unwrap();
    assert_eq!(decoded, state);
    assert_eq!(decoded.last_revealed_by, Some(PlayerId::One));
    assert_eq!(decoded.player1.points(), 25);
    assert!(decoded.board.cell(0, 2).unwrap().is_flagged);
}

#[test]
fn mine_list_round_trip() {
    assert_eq!(encode_mines(&[(0, 0), (0, 1), (9, 9)]), "0,0;0,1;9,9");
    assert_eq!(decode_mines("0,0;0,1;9,9").unwrap(), vec![(0, 0), (0, 1), (9, 9)]);
    assert_eq!(encode_mines(&[]), "");
    assert!(decode_mines("").unwrap().is_empty());
}

#[test]
fn message_frames_round_trip() {
    let state = reachable_state(42, 20, Difficulty::Easy);
    for msg in [
        Message::BoardSync(vec![(1, 2), (3, 4)]),
        Message::BoardSyncAck,
        Message::GameStateUpdate(state),
        Message::ResetGame,
        Message::PlayerName("Ada Lovelace".into()),
    ] {
        let frame = msg.encode_frame();
        assert!(frame.ends_with('\n'));
        assert_eq!(frame.matches('\n').count(), 1);
        assert_eq!(frame.matches('|').count(), 1);
        assert_eq!(Message::decode_frame(&frame).unwrap(), msg);
    }
    assert_eq!(Message::ResetGame.encode_frame(), "RESET_GAME|\n");
    assert_eq!(
        Message::PlayerName("Ada".into()).encode_frame(),
        "PLAYER_NAME|Ada\n"
    );
}

#[test]
fn game_record_serializes_with_serde() {
    let state = reachable_state(5, 30, Difficulty::Easy);
    let record = GameRecord::from_state(state).with_timing(Some(1_000), Some(4_500));
    assert_eq!(record.duration_ms, Some(3_500));
    let json = serde_json::to_string(&record).unwrap();
    let back: GameRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back, record);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn reachable_states_round_trip(seed in any::<u64>(), moves in 0usize..80) {
        let difficulty = Difficulty::ALL[(seed % 4) as usize];
        let state = reachable_state(seed, moves, difficulty);
        let decoded = decode_state(&encode_state(&state)).unwrap();
        prop_assert_eq!(decoded, state);
    }
}
