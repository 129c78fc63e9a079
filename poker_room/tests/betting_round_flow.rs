//! End-to-end betting rounds through the room controller against the
//! in-memory repository.

use poker_room::{
    db::InMemoryRoomRepository,
    game::{ActionError, GameStatus, NewPlayer, PlayerAction, TurnDecision},
    room::{HintKind, RoomConfig, RoomController, RoomError, RoomEvent},
};
use std::sync::Arc;

/// Every chip in the room: balances, bets, staged chips and the pot.
async fn chips_in_room(controller: &RoomController, room_id: &str) -> i64 {
    let snap = controller.snapshot(room_id).await.unwrap();
    snap.room.pot + snap.players.iter().map(|p| p.chips_held()).sum::<i64>()
}

const HOST: &str = "player_host";

fn controller() -> RoomController {
    RoomController::new(Arc::new(InMemoryRoomRepository::new()), RoomConfig::default())
}

fn seat(seat: u8, buy_in: i64) -> NewPlayer {
    NewPlayer {
        name: format!("Seat {seat}"),
        avatar: "🙂".to_string(),
        seat,
        buy_in,
        color: Some("#ff0000".to_string()),
    }
}

/// Room with seats 0, 1, 2 holding 1000, 1000, 500 and the dealer on seat 0.
async fn three_handed(controller: &RoomController) -> String {
    let room_id = controller.create_room(HOST).await.unwrap().room.room_id;
    controller.join_room(&room_id, "p0", seat(0, 1000)).await.unwrap();
    controller.join_room(&room_id, "p1", seat(1, 1000)).await.unwrap();
    controller.join_room(&room_id, "p2", seat(2, 500)).await.unwrap();
    controller.set_dealer(&room_id, HOST, 0).await.unwrap();
    room_id
}

// ============================================================================
// Full round
// ============================================================================

#[tokio::test]
async fn test_raise_call_fold_collect_distribute() {
    let controller = controller();
    let room_id = three_handed(&controller).await;

    let first = controller.start_betting_round(&room_id, HOST).await.unwrap();
    assert_eq!(first, Some(1));
    let snap = controller.snapshot(&room_id).await.unwrap();
    assert_eq!(snap.room.current_highest_bet, 0);
    assert!(snap.players.iter().all(|p| !p.has_acted_this_round));

    // Seat 1 raises to 100.
    let report = controller.bet_raise(&room_id, "p1", 100).await.unwrap();
    assert_eq!(report.outcome.action, PlayerAction::Bet);
    assert_eq!(report.decision, TurnDecision::Next(2));
    let snap = controller.snapshot(&room_id).await.unwrap();
    let p1 = snap.player("p1").unwrap();
    assert_eq!((p1.balance, p1.current_bet), (900, 100));
    assert_eq!(snap.room.current_highest_bet, 100);
    assert_eq!(snap.room.current_turn_seat, Some(2));

    // Seat 2 calls.
    let report = controller.call(&room_id, "p2").await.unwrap();
    assert_eq!(report.decision, TurnDecision::Next(0));
    let snap = controller.snapshot(&room_id).await.unwrap();
    let p2 = snap.player("p2").unwrap();
    assert_eq!((p2.balance, p2.current_bet), (400, 100));
    assert!(p2.has_acted_this_round);

    // Seat 0 folds; 1 and 2 have matched, so the round is over.
    let report = controller.fold(&room_id, "p0").await.unwrap();
    assert_eq!(report.decision, TurnDecision::RoundComplete);
    assert!(report.room.betting_round_complete);
    assert_eq!(report.room.current_turn_seat, None);

    let collected = controller.collect_bets(&room_id, HOST).await.unwrap();
    assert_eq!(collected, 200);
    let snap = controller.snapshot(&room_id).await.unwrap();
    assert_eq!(snap.room.pot, 200);
    assert!(snap.players.iter().all(|p| p.current_bet == 0));

    // A folded player cannot be paid.
    let err = controller
        .distribute_pot(&room_id, HOST, "p0")
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::WinnerFolded));
    let unchanged = controller.snapshot(&room_id).await.unwrap();
    assert_eq!(unchanged.room.pot, 200);
    assert_eq!(unchanged.player("p0").unwrap().balance, 1000);

    let paid = controller.distribute_pot(&room_id, HOST, "p1").await.unwrap();
    assert_eq!(paid, 200);
    let snap = controller.snapshot(&room_id).await.unwrap();
    assert_eq!(snap.room.pot, 0);
    assert_eq!(snap.player("p1").unwrap().balance, 1100);
}

#[tokio::test]
async fn test_two_folds_send_room_to_showdown() {
    let controller = controller();
    let room_id = three_handed(&controller).await;
    controller.advance_stage(&room_id, HOST).await.unwrap();

    controller.fold(&room_id, "p1").await.unwrap();
    let report = controller.fold(&room_id, "p2").await.unwrap();

    assert!(matches!(
        report.decision,
        TurnDecision::SoleSurvivor { ref player_id, seat: 0 } if player_id == "p0"
    ));
    let snap = controller.snapshot(&room_id).await.unwrap();
    assert_eq!(snap.room.status, GameStatus::Showdown);
    assert!(snap.room.betting_round_complete);
    assert_eq!(snap.room.current_turn_seat, None);
}

#[tokio::test]
async fn test_opening_a_round_sweeps_leftover_bets() {
    let controller = controller();
    let room_id = three_handed(&controller).await;
    controller.start_betting_round(&room_id, HOST).await.unwrap();
    controller.bet_raise(&room_id, "p1", 100).await.unwrap();

    controller.start_betting_round(&room_id, HOST).await.unwrap();

    let snap = controller.snapshot(&room_id).await.unwrap();
    assert_eq!(snap.room.pot, 100);
    assert_eq!(snap.room.current_highest_bet, 0);
    assert!(snap.players.iter().all(|p| p.current_bet == 0));

    // The old raiser checking now leaves everyone else's turn alone.
    let report = controller.check(&room_id, "p1").await.unwrap();
    assert!(report.outcome.reopened.is_empty());
    assert_eq!(report.room.current_highest_bet, 0);
    assert_eq!(chips_in_room(&controller, &room_id).await, 2500);
}

#[tokio::test]
async fn test_raise_reopens_action_for_players_who_acted() {
    let controller = controller();
    let room_id = three_handed(&controller).await;
    controller.start_betting_round(&room_id, HOST).await.unwrap();

    controller.check(&room_id, "p1").await.unwrap();
    controller.check(&room_id, "p2").await.unwrap();
    let report = controller.bet_raise(&room_id, "p0", 50).await.unwrap();

    let mut reopened = report.outcome.reopened.clone();
    reopened.sort();
    assert_eq!(reopened, vec!["p1", "p2"]);
    assert_eq!(report.decision, TurnDecision::Next(1));

    let snap = controller.snapshot(&room_id).await.unwrap();
    assert!(!snap.player("p1").unwrap().has_acted_this_round);
    assert!(!snap.player("p2").unwrap().has_acted_this_round);
    assert!(snap.player("p0").unwrap().has_acted_this_round);
}

// ============================================================================
// Turn ownership
// ============================================================================

#[tokio::test]
async fn test_acting_out_of_turn_is_rejected() {
    let controller = controller();
    let room_id = three_handed(&controller).await;
    controller.start_betting_round(&room_id, HOST).await.unwrap();

    let err = controller.check(&room_id, "p2").await.unwrap_err();
    assert!(matches!(err, RoomError::NotYourTurn));
}

#[tokio::test]
async fn test_repeated_check_never_double_counts() {
    let controller = controller();
    let room_id = three_handed(&controller).await;
    controller.start_betting_round(&room_id, HOST).await.unwrap();

    controller.check(&room_id, "p1").await.unwrap();
    let err = controller.check(&room_id, "p1").await.unwrap_err();
    assert!(matches!(err, RoomError::NotYourTurn));

    let snap = controller.snapshot(&room_id).await.unwrap();
    assert_eq!(snap.room.current_turn_seat, Some(2));
    assert_eq!(snap.player("p1").unwrap().balance, 1000);
}

#[tokio::test]
async fn test_action_without_open_round_is_rejected() {
    let controller = controller();
    let room_id = three_handed(&controller).await;

    let err = controller.check(&room_id, "p1").await.unwrap_err();
    assert!(matches!(err, RoomError::NoActiveRound));
}

#[tokio::test]
async fn test_declined_call_leaves_turn_in_place() {
    let controller = controller();
    let room_id = three_handed(&controller).await;
    controller.start_betting_round(&room_id, HOST).await.unwrap();
    controller.bet_raise(&room_id, "p1", 800).await.unwrap();

    let err = controller.call(&room_id, "p2").await.unwrap_err();
    assert!(matches!(
        err,
        RoomError::Rejected(ActionError::InsufficientBalance {
            available: 500,
            required: 800
        })
    ));
    let snap = controller.snapshot(&room_id).await.unwrap();
    assert_eq!(snap.room.current_turn_seat, Some(2));
    assert_eq!(snap.player("p2").unwrap().balance, 500);
}

#[tokio::test]
async fn test_illegal_check_is_rejected() {
    let controller = controller();
    let room_id = three_handed(&controller).await;
    controller.start_betting_round(&room_id, HOST).await.unwrap();
    controller.bet_raise(&room_id, "p1", 40).await.unwrap();

    let err = controller.check(&room_id, "p2").await.unwrap_err();
    assert!(matches!(
        err,
        RoomError::Rejected(ActionError::IllegalCheck { owed: 40 })
    ));
}

// ============================================================================
// Staged bets
// ============================================================================

#[tokio::test]
async fn test_stage_then_confirm_commits_as_bet() {
    let controller = controller();
    let room_id = three_handed(&controller).await;
    controller.start_betting_round(&room_id, HOST).await.unwrap();

    let staged = controller
        .stage_bet(&room_id, "p1", 150, None)
        .await
        .unwrap();
    assert_eq!((staged.balance, staged.staged_bet), (850, 150));

    let report = controller.confirm_bet(&room_id, "p1").await.unwrap();
    assert_eq!(report.outcome.deducted, 150);

    let p1 = controller.snapshot(&room_id).await.unwrap();
    let p1 = p1.player("p1").unwrap();
    assert_eq!((p1.balance, p1.current_bet, p1.staged_bet), (850, 150, 0));
}

#[tokio::test]
async fn test_clear_returns_staged_chips() {
    let controller = controller();
    let room_id = three_handed(&controller).await;

    controller.stage_bet(&room_id, "p2", 200, None).await.unwrap();
    let cleared = controller.clear_bet(&room_id, "p2").await.unwrap();

    assert_eq!((cleared.balance, cleared.staged_bet), (500, 0));
}

#[tokio::test]
async fn test_staging_beyond_holdings_is_rejected() {
    let controller = controller();
    let room_id = three_handed(&controller).await;

    let err = controller
        .stage_bet(&room_id, "p2", 501, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RoomError::Rejected(ActionError::InsufficientBalance { .. })
    ));
}

#[tokio::test]
async fn test_confirm_without_staged_chips_is_rejected() {
    let controller = controller();
    let room_id = three_handed(&controller).await;
    controller.start_betting_round(&room_id, HOST).await.unwrap();

    let err = controller.confirm_bet(&room_id, "p1").await.unwrap_err();
    assert!(matches!(err, RoomError::InvalidStageAmount(0)));
}

#[tokio::test]
async fn test_fold_returns_staged_chips() {
    let controller = controller();
    let room_id = three_handed(&controller).await;
    controller.start_betting_round(&room_id, HOST).await.unwrap();
    controller.stage_bet(&room_id, "p1", 75, None).await.unwrap();

    controller.fold(&room_id, "p1").await.unwrap();

    let snap = controller.snapshot(&room_id).await.unwrap();
    let p1 = snap.player("p1").unwrap();
    assert_eq!((p1.balance, p1.staged_bet), (1000, 0));
    assert!(p1.is_folded);
}

// ============================================================================
// Change feed
// ============================================================================

#[tokio::test]
async fn test_stage_gesture_and_bet_are_published() {
    let controller = controller();
    let room_id = three_handed(&controller).await;
    controller.start_betting_round(&room_id, HOST).await.unwrap();
    let mut feed = controller.hub().subscribe(&room_id).await;

    controller
        .stage_bet(&room_id, "p1", 60, Some(2.5))
        .await
        .unwrap();
    controller.confirm_bet(&room_id, "p1").await.unwrap();

    let mut stage_hint = None;
    let mut bet_hint = None;
    while let Ok(event) = feed.try_recv() {
        if let RoomEvent::StageAnimation { hint } = &event {
            stage_hint = Some(hint.clone());
        }
        if let Some(hint) = event.bet_increase() {
            bet_hint = Some(hint);
        }
    }

    let stage_hint = stage_hint.expect("stage animation published");
    assert_eq!(stage_hint.kind, HintKind::Stage);
    assert_eq!(stage_hint.amount, 60);
    assert_eq!(stage_hint.velocity, Some(2.5));

    let bet_hint = bet_hint.expect("bet increase published");
    assert_eq!(bet_hint.player_id, "p1");
    assert_eq!(bet_hint.amount, 60);
}

// ============================================================================
// Concurrent writers
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_staging_during_collection_conserves_chips() {
    for _ in 0..25 {
        let controller = Arc::new(controller());
        let room_id = three_handed(&controller).await;
        controller.start_betting_round(&room_id, HOST).await.unwrap();
        controller.bet_raise(&room_id, "p1", 100).await.unwrap();
        controller.call(&room_id, "p2").await.unwrap();

        let collector = {
            let controller = controller.clone();
            let room_id = room_id.clone();
            tokio::spawn(async move { controller.collect_bets(&room_id, HOST).await })
        };
        let stager = {
            let controller = controller.clone();
            let room_id = room_id.clone();
            tokio::spawn(async move { controller.stage_bet(&room_id, "p1", 50, None).await })
        };
        assert_eq!(collector.await.unwrap().unwrap(), 200);
        stager.await.unwrap().unwrap();

        let snap = controller.snapshot(&room_id).await.unwrap();
        let p1 = snap.player("p1").unwrap();
        assert_eq!(snap.room.pot, 200);
        assert_eq!((p1.balance, p1.current_bet, p1.staged_bet), (850, 0, 50));
        assert_eq!(chips_in_room(&controller, &room_id).await, 2500);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_stage_and_clear_never_create_chips() {
    let controller = Arc::new(controller());
    let room_id = three_handed(&controller).await;

    let mut handles = vec![];
    for i in 0..20 {
        let controller = controller.clone();
        let room_id = room_id.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                controller.stage_bet(&room_id, "p0", 10 * i, None).await
            } else {
                controller.clear_bet(&room_id, "p0").await
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(chips_in_room(&controller, &room_id).await, 2500);
    assert_eq!(
        controller
            .snapshot(&room_id)
            .await
            .unwrap()
            .player("p0")
            .unwrap()
            .chips_held(),
        1000
    );
}
