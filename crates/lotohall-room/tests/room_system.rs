//! Integration tests for the room registry, drawer and cleaner.
//!
//! All timing tests run on paused Tokio time, so a "5 second" draw
//! interval costs nothing in wall-clock time.

use std::sync::Arc;
use std::time::Duration;

use lotohall_protocol::{ErrorKind, RoomId, Username};
use lotohall_room::{
    CleanerConfig, ClaimReceipt, Departure, PresenceCleaner, RoomConfig, RoomError, RoomRegistry,
    Verdict,
};
use lotohall_session::AdminGate;

// =========================================================================
// Helpers
// =========================================================================

const SECRET: &str = "s3cret";
const ADMIN_TOKEN: &str = "root-token";

fn rid(id: &str) -> RoomId {
    RoomId::from(id)
}

fn user(name: &str) -> Username {
    Username::from(name)
}

fn registry() -> Arc<RoomRegistry> {
    Arc::new(
        RoomRegistry::new(RoomConfig::default())
            .with_admin_gate(AdminGate::new(Some(ADMIN_TOKEN.into()))),
    )
}

/// A registry holding room "R1" (admin alice) with bob joined.
async fn hall() -> Arc<RoomRegistry> {
    let reg = registry();
    reg.create(&rid("R1"), &user("alice"), SECRET).await.unwrap();
    reg.join(&rid("R1"), &user("bob"), SECRET).await.unwrap();
    reg
}

async fn called(reg: &RoomRegistry) -> Vec<u8> {
    reg.snapshot(&rid("R1")).await.unwrap().called
}

/// Sleeps past the next draw at `secs` from now.
async fn after(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs) + Duration::from_millis(100)).await;
}

// =========================================================================
// Lifecycle
// =========================================================================

#[tokio::test]
async fn test_create_registers_admin() {
    let reg = registry();
    reg.create(&rid("R1"), &user("alice"), SECRET).await.unwrap();

    let snap = reg.snapshot(&rid("R1")).await.unwrap();
    assert_eq!(snap.admin, user("alice"));
    assert!(snap.users.contains_key(&user("alice")));
    assert_eq!(snap.interval, 5);
    assert!(!snap.running);
    assert!(snap.called.is_empty());
    assert_eq!(snap.current, 0);
}

#[tokio::test]
async fn test_create_duplicate_fails() {
    let reg = registry();
    reg.create(&rid("R1"), &user("alice"), SECRET).await.unwrap();

    let err = reg.create(&rid("R1"), &user("mallory"), "x").await.unwrap_err();
    assert!(matches!(err, RoomError::AlreadyExists(_)));
    assert_eq!(reg.snapshot(&rid("R1")).await.unwrap().admin, user("alice"));
}

#[tokio::test]
async fn test_create_rejects_blank_fields() {
    let reg = registry();
    for (id, admin, secret) in [(" ", "alice", SECRET), ("R1", "", SECRET), ("R1", "alice", "")] {
        let err = reg.create(&rid(id), &user(admin), secret).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
    assert_eq!(reg.room_count().await, 0);
}

#[tokio::test]
async fn test_join_rejects_blank_fields() {
    let reg = hall().await;
    for (id, name, secret) in [(" ", "carol", SECRET), ("R1", "", SECRET), ("R1", "carol", "")] {
        let err = reg.join(&rid(id), &user(name), secret).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
    let snap = reg.snapshot(&rid("R1")).await.unwrap();
    assert!(!snap.users.contains_key(&user("carol")));
    assert_eq!(snap.users.len(), 2);
}

#[tokio::test]
async fn test_join_with_wrong_secret_is_unauthorized() {
    let reg = hall().await;
    let err = reg.join(&rid("R1"), &user("carol"), "guess").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert!(!reg.snapshot(&rid("R1")).await.unwrap().users.contains_key(&user("carol")));
}

#[tokio::test]
async fn test_join_unknown_room_is_not_found() {
    let reg = registry();
    let err = reg.join(&rid("nope"), &user("bob"), SECRET).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_admin_leave_destroys_room() {
    let reg = hall().await;

    let departure = reg.leave(&rid("R1"), &user("alice")).await.unwrap();
    assert_eq!(departure, Departure::RoomClosed);

    let err = reg.snapshot(&rid("R1")).await.unwrap_err();
    assert!(matches!(err, RoomError::NotFound(_)));
    assert!(reg.list().await.is_empty());
}

#[tokio::test]
async fn test_user_leave_releases_cards() {
    let reg = hall().await;
    reg.select_card(&rid("R1"), &user("bob"), 4).await.unwrap();
    reg.select_card(&rid("R1"), &user("bob"), 2).await.unwrap();

    let departure = reg.leave(&rid("R1"), &user("bob")).await.unwrap();
    assert_eq!(departure, Departure::Left { released: vec![2, 4] });

    let snap = reg.snapshot(&rid("R1")).await.unwrap();
    assert!(!snap.users.contains_key(&user("bob")));
    assert!(snap.lotos.is_empty());
}

#[tokio::test]
async fn test_leave_of_absent_user_is_noop() {
    let reg = hall().await;
    let departure = reg.leave(&rid("R1"), &user("ghost")).await.unwrap();
    assert_eq!(departure, Departure::Left { released: vec![] });
    assert!(reg.contains(&rid("R1")).await);
}

#[tokio::test]
async fn test_ping_only_refreshes_present_users() {
    let reg = hall().await;
    assert!(reg.ping(&rid("R1"), &user("bob")).await);
    assert!(!reg.ping(&rid("R1"), &user("ghost")).await);
    assert!(!reg.ping(&rid("nope"), &user("bob")).await);

    let snap = reg.snapshot(&rid("R1")).await.unwrap();
    assert!(!snap.users.contains_key(&user("ghost")));
}

#[tokio::test]
async fn test_list_reports_rooms() {
    let reg = hall().await;
    reg.create(&rid("R2"), &user("zed"), "z").await.unwrap();
    reg.start(&rid("R2"), "z").await.unwrap();

    let mut list = reg.list().await;
    list.sort_by(|a, b| a.id.cmp(&b.id));

    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, rid("R1"));
    assert_eq!(list[0].player_count, 2);
    assert!(!list[0].running);
    assert_eq!(list[1].player_count, 1);
    assert!(list[1].running);
}

// =========================================================================
// Drawing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_start_draws_one_number_per_interval() {
    let reg = hall().await;
    reg.start(&rid("R1"), SECRET).await.unwrap();

    after(5).await;
    let first = called(&reg).await;
    assert_eq!(first.len(), 1);
    assert_eq!(reg.snapshot(&rid("R1")).await.unwrap().current, first[0]);

    after(5).await;
    let second = called(&reg).await;
    assert_eq!(second.len(), 2);
    assert_eq!(second[0], first[0]);
    assert_ne!(second[0], second[1]);
}

#[tokio::test(start_paused = true)]
async fn test_start_twice_is_forbidden() {
    let reg = hall().await;
    reg.start(&rid("R1"), SECRET).await.unwrap();

    let err = reg.start(&rid("R1"), SECRET).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    after(5).await;
    assert_eq!(called(&reg).await.len(), 1, "only one drawer may run");
}

#[tokio::test(start_paused = true)]
async fn test_start_with_wrong_secret_is_forbidden() {
    let reg = hall().await;
    let err = reg.start(&rid("R1"), "guess").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert!(!reg.snapshot(&rid("R1")).await.unwrap().running);
}

#[tokio::test(start_paused = true)]
async fn test_stop_halts_drawing() {
    let reg = hall().await;
    reg.start(&rid("R1"), SECRET).await.unwrap();
    after(5).await;

    reg.stop(&rid("R1"), SECRET).await.unwrap();
    after(30).await;

    let snap = reg.snapshot(&rid("R1")).await.unwrap();
    assert!(!snap.running);
    assert_eq!(snap.called.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_start_after_stop_begins_fresh_game() {
    let reg = hall().await;
    reg.start(&rid("R1"), SECRET).await.unwrap();
    after(10).await;
    reg.stop(&rid("R1"), SECRET).await.unwrap();

    reg.start(&rid("R1"), SECRET).await.unwrap();
    assert!(called(&reg).await.is_empty());

    after(5).await;
    assert_eq!(called(&reg).await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_set_interval_applies_after_current_wait() {
    let reg = hall().await;
    reg.start(&rid("R1"), SECRET).await.unwrap();
    after(5).await;

    reg.set_interval(&rid("R1"), 1).await.unwrap();
    assert_eq!(reg.snapshot(&rid("R1")).await.unwrap().interval, 1);

    // The pending 5s wait still runs out at t=10.
    tokio::time::sleep(Duration::from_millis(4_800)).await;
    assert_eq!(called(&reg).await.len(), 1);

    // Draws at t=10 and t=11.
    tokio::time::sleep(Duration::from_millis(1_600)).await;
    assert_eq!(called(&reg).await.len(), 3);
}

#[tokio::test]
async fn test_set_interval_bounds() {
    let reg = hall().await;

    for secs in [0, 3601] {
        let err = reg.set_interval(&rid("R1"), secs).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
    assert!(reg.set_interval(&rid("R1"), 3600).await.is_ok());

    let err = reg.set_interval(&rid("nope"), 5).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test(start_paused = true)]
async fn test_drawer_exits_when_room_destroyed() {
    let reg = hall().await;
    reg.start(&rid("R1"), SECRET).await.unwrap();
    after(5).await;

    reg.leave(&rid("R1"), &user("alice")).await.unwrap();
    after(5).await;

    // A new room under the same id must not be fed by the old drawer.
    reg.create(&rid("R1"), &user("alice"), SECRET).await.unwrap();
    after(10).await;
    assert!(called(&reg).await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_full_game_draws_every_number_once() {
    let reg = hall().await;
    reg.set_interval(&rid("R1"), 1).await.unwrap();
    reg.start(&rid("R1"), SECRET).await.unwrap();

    after(100).await;

    let snap = reg.snapshot(&rid("R1")).await.unwrap();
    assert!(snap.running, "an exhausted pool does not stop the game");
    let mut drawn = snap.called.clone();
    drawn.sort_unstable();
    assert_eq!(drawn, (1..=90).collect::<Vec<u8>>());
}

// =========================================================================
// Forced numbers
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_forced_number_is_drawn_next() {
    let reg = hall().await;
    reg.start(&rid("R1"), SECRET).await.unwrap();
    reg.force_number(&rid("R1"), 42, ADMIN_TOKEN).await.unwrap();

    after(5).await;
    let snap = reg.snapshot(&rid("R1")).await.unwrap();
    assert_eq!(snap.current, 42);
    assert_eq!(snap.called, vec![42]);

    after(5).await;
    let snap = reg.snapshot(&rid("R1")).await.unwrap();
    assert_eq!(snap.called.len(), 2);
    assert_ne!(snap.current, 42);
}

#[tokio::test]
async fn test_force_with_wrong_token_is_unauthorized() {
    let reg = hall().await;
    let err = reg.force_number(&rid("R1"), 42, "guess").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = reg.force_number(&rid("R1"), 42, "").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn test_force_when_gate_disabled_is_forbidden() {
    let reg = RoomRegistry::default();
    reg.create(&rid("R1"), &user("alice"), SECRET).await.unwrap();

    let err = reg.force_number(&rid("R1"), 42, "anything").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_force_validates_number_then_room() {
    let reg = hall().await;

    for n in [0, 91] {
        let err = reg.force_number(&rid("R1"), n, ADMIN_TOKEN).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
    let err = reg.force_number(&rid("nope"), 5, ADMIN_TOKEN).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// =========================================================================
// Bingo workflow
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_claim_pauses_drawing_until_rejected() {
    let reg = hall().await;
    reg.start(&rid("R1"), SECRET).await.unwrap();
    after(5).await;

    reg.submit_claim(&rid("R1"), &user("bob"), "1,2,3").await.unwrap();
    after(20).await;
    let snap = reg.snapshot(&rid("R1")).await.unwrap();
    assert!(snap.paused);
    assert!(snap.running);
    assert_eq!(snap.called.len(), 1);

    let verdict = reg.resolve_claim(&rid("R1"), false).await.unwrap();
    assert_eq!(
        verdict,
        Verdict::Rejected {
            user: user("bob"),
            remaining: 0
        }
    );

    after(5).await;
    let snap = reg.snapshot(&rid("R1")).await.unwrap();
    assert!(!snap.paused);
    assert_eq!(snap.called.len(), 2);
}

#[tokio::test]
async fn test_second_claim_overwrites_first() {
    let reg = hall().await;
    reg.start(&rid("R1"), SECRET).await.unwrap();

    let first = reg.submit_claim(&rid("R1"), &user("bob"), "5,10").await.unwrap();
    let second = reg.submit_claim(&rid("R1"), &user("bob"), "5,10,15").await.unwrap();
    assert_eq!(first, ClaimReceipt::Queued(0));
    assert_eq!(second, ClaimReceipt::Updated(0));

    let snap = reg.snapshot(&rid("R1")).await.unwrap();
    assert_eq!(snap.bingo_queue.len(), 1);
    assert_eq!(snap.bingo_queue[0].user, user("bob"));
    assert_eq!(snap.bingo_queue[0].nums, "5,10,15");
}

#[tokio::test]
async fn test_claim_with_bad_numbers_is_rejected() {
    let reg = hall().await;
    for nums in ["0", "1,91", "a,b", "1,,2"] {
        let err = reg.submit_claim(&rid("R1"), &user("bob"), nums).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput, "{nums:?}");
    }
    assert!(reg.snapshot(&rid("R1")).await.unwrap().bingo_queue.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_approve_ends_game_and_restart_resets() {
    let reg = hall().await;
    reg.start(&rid("R1"), SECRET).await.unwrap();
    after(5).await;

    reg.submit_claim(&rid("R1"), &user("bob"), "7").await.unwrap();
    reg.submit_claim(&rid("R1"), &user("alice"), "8").await.unwrap();
    let Verdict::Approved(winner) = reg.resolve_claim(&rid("R1"), true).await.unwrap() else {
        panic!("expected approval");
    };
    assert_eq!(winner.user, user("bob"));

    let snap = reg.snapshot(&rid("R1")).await.unwrap();
    assert!(snap.bingo_ok);
    assert!(!snap.running);
    assert!(snap.bingo_queue.is_empty());
    assert_eq!(snap.winner, Some(user("bob")));
    assert_eq!(snap.winner_nums.as_deref(), Some("7"));
    assert!(snap.approved_at.is_some());

    after(20).await;
    assert_eq!(called(&reg).await.len(), 1);

    reg.restart(&rid("R1")).await.unwrap();
    let snap = reg.snapshot(&rid("R1")).await.unwrap();
    assert!(!snap.bingo_ok);
    assert!(snap.winner.is_none());
    assert!(snap.called.is_empty());
    assert_eq!(snap.current, 0);
}

#[tokio::test(start_paused = true)]
async fn test_restart_then_start_runs_single_drawer() {
    let reg = hall().await;
    reg.start(&rid("R1"), SECRET).await.unwrap();
    reg.submit_claim(&rid("R1"), &user("bob"), "").await.unwrap();
    reg.resolve_claim(&rid("R1"), true).await.unwrap();
    reg.restart(&rid("R1")).await.unwrap();

    // The first drawer has not ticked yet when the second game starts.
    reg.start(&rid("R1"), SECRET).await.unwrap();

    after(5).await;
    assert_eq!(called(&reg).await.len(), 1);
}

#[tokio::test]
async fn test_resolve_without_claims_is_forbidden() {
    let reg = hall().await;
    let err = reg.resolve_claim(&rid("R1"), true).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_restart_before_win_is_forbidden() {
    let reg = hall().await;
    let err = reg.restart(&rid("R1")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

// =========================================================================
// Cards
// =========================================================================

#[tokio::test]
async fn test_card_taken_by_other_user() {
    let reg = hall().await;
    reg.select_card(&rid("R1"), &user("bob"), 7).await.unwrap();

    let err = reg.select_card(&rid("R1"), &user("alice"), 7).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert!(matches!(err, RoomError::CardTaken { card: 7, .. }));

    let snap = reg.snapshot(&rid("R1")).await.unwrap();
    assert_eq!(snap.lotos.get(&7), Some(&user("bob")));
}

#[tokio::test]
async fn test_unselect_by_non_owner_keeps_card() {
    let reg = hall().await;
    reg.select_card(&rid("R1"), &user("bob"), 7).await.unwrap();

    assert!(!reg.unselect_card(&rid("R1"), &user("alice"), 7).await.unwrap());
    assert!(reg.unselect_card(&rid("R1"), &user("bob"), 7).await.unwrap());
    assert!(reg.snapshot(&rid("R1")).await.unwrap().lotos.is_empty());
}

#[tokio::test]
async fn test_card_index_out_of_range() {
    let reg = hall().await;
    let err = reg.select_card(&rid("R1"), &user("bob"), 100).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(reg.select_card(&rid("R1"), &user("bob"), 99).await.is_ok());
}

// =========================================================================
// Presence cleaning
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_evict_stale_removes_only_quiet_users() {
    let reg = hall().await;
    reg.select_card(&rid("R1"), &user("bob"), 3).await.unwrap();

    tokio::time::advance(Duration::from_secs(30)).await;
    reg.ping(&rid("R1"), &user("alice")).await;
    tokio::time::advance(Duration::from_secs(31)).await;

    let report = reg.evict_stale(Duration::from_secs(60)).await;
    assert_eq!(report.evicted, vec![(rid("R1"), user("bob"))]);
    assert!(report.closed.is_empty());

    let snap = reg.snapshot(&rid("R1")).await.unwrap();
    assert!(!snap.users.contains_key(&user("bob")));
    assert!(snap.users.contains_key(&user("alice")));
    assert!(snap.lotos.is_empty(), "evicted user's cards are released");
}

#[tokio::test(start_paused = true)]
async fn test_stale_admin_closes_room() {
    let reg = hall().await;
    tokio::time::advance(Duration::from_secs(61)).await;

    let report = reg.evict_stale(Duration::from_secs(60)).await;
    assert_eq!(report.closed, vec![rid("R1")]);
    assert!(report.evicted.contains(&(rid("R1"), user("alice"))));
    assert!(!reg.contains(&rid("R1")).await);
}

#[tokio::test(start_paused = true)]
async fn test_stale_admin_ends_scan_of_its_room() {
    let reg = hall().await;
    for name in ["carol", "dave", "erin", "frank", "grace", "heidi"] {
        reg.join(&rid("R1"), &user(name), SECRET).await.unwrap();
    }
    reg.create(&rid("R2"), &user("zoe"), SECRET).await.unwrap();
    reg.join(&rid("R2"), &user("yann"), SECRET).await.unwrap();

    tokio::time::advance(Duration::from_secs(61)).await;
    reg.ping(&rid("R2"), &user("zoe")).await;

    let report = reg.evict_stale(Duration::from_secs(60)).await;
    assert_eq!(report.closed, vec![rid("R1")]);
    assert!(!reg.contains(&rid("R1")).await);

    // Nothing from R1 is reported after its admin.
    let closed_room: Vec<Username> = report
        .evicted
        .iter()
        .filter(|(room, _)| *room == rid("R1"))
        .map(|(_, name)| name.clone())
        .collect();
    assert_eq!(closed_room.last(), Some(&user("alice")));
    assert_eq!(closed_room.iter().filter(|name| **name == user("alice")).count(), 1);

    // Other rooms are still swept.
    assert!(report.evicted.contains(&(rid("R2"), user("yann"))));
    assert!(reg.contains(&rid("R2")).await);
}

#[tokio::test(start_paused = true)]
async fn test_cleaner_task_sweeps_periodically() {
    let reg = hall().await;
    let cleaner = PresenceCleaner::spawn(Arc::clone(&reg), CleanerConfig::default());

    // Keep alice alive; let bob go quiet.
    for _ in 0..14 {
        tokio::time::sleep(Duration::from_secs(5)).await;
        reg.ping(&rid("R1"), &user("alice")).await;
    }

    let snap = reg.snapshot(&rid("R1")).await.unwrap();
    assert!(snap.users.contains_key(&user("alice")));
    assert!(!snap.users.contains_key(&user("bob")));

    cleaner.abort();
}
