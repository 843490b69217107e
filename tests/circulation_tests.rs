//! Circulation scenarios against a real PostgreSQL database.
//!
//! Run with: TEST_DATABASE_URL=postgres://... cargo test -- --ignored

mod support;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use circulation_server::{
    config::CirculationConfig,
    error::{AppError, ErrorKind},
    models::{
        book::UpdateBook,
        borrow_request::DEFAULT_REJECTION_REASON,
        transaction::NewLoan,
        ActorClaims, BorrowRequestStatus, ReservationStatus, Role, TransactionStatus,
    },
    repository::Repository,
    services::Services,
};
use support::{book, count, init_test_db, insert_book, insert_profile};

fn rate() -> Decimal {
    Decimal::from(10)
}

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn loan(book_id: i32, user_id: i32, issued_by: i32, issue_date: DateTime<Utc>, due_date: DateTime<Utc>) -> NewLoan {
    NewLoan {
        book_id,
        user_id,
        issued_by,
        issue_date,
        due_date,
        notes: None,
    }
}

const UNPAID_FINES: &str = "SELECT COUNT(*) FROM fines WHERE transaction_id = $1 AND NOT paid";
const ALL_FINES: &str = "SELECT COUNT(*) FROM fines WHERE transaction_id = $1";

fn actor(user_id: i32, role: Role) -> ActorClaims {
    ActorClaims {
        sub: format!("user-{}", user_id),
        user_id,
        role,
        exp: 0,
        iat: 0,
    }
}

#[tokio::test]
#[ignore]
async fn test_issue_return_round_trip() {
    let db = init_test_db().await;
    let repo = Repository::new(db.pool.clone());
    let librarian = insert_profile(&db.pool, "Libby", Role::Librarian).await;
    let alice = insert_profile(&db.pool, "Alice", Role::Member).await;
    let book_id = insert_book(&db.pool, "9780000000001", 2).await;

    let now = Utc::now();
    let issued = repo
        .transactions
        .issue(&loan(book_id, alice, librarian, now, now + Duration::days(14)))
        .await
        .unwrap();
    assert_eq!(issued.status, TransactionStatus::Issued);
    assert!(issued.return_date.is_none());
    assert_eq!(book(&db.pool, book_id).await.available_copies, 1);

    let again = repo
        .transactions
        .issue(&loan(book_id, alice, librarian, now, now + Duration::days(14)))
        .await;
    assert!(matches!(again, Err(AppError::DuplicateLoan)));
    assert_eq!(book(&db.pool, book_id).await.available_copies, 1);

    let outcome = repo
        .transactions
        .return_loan(issued.id, librarian, now + Duration::days(3), rate())
        .await
        .unwrap();
    assert_eq!(outcome.transaction.status, TransactionStatus::Returned);
    assert_eq!(outcome.transaction.fine_amount, Decimal::ZERO);
    assert_eq!(outcome.transaction.returned_by, Some(librarian));
    assert!(outcome.fine.is_none());
    assert_eq!(book(&db.pool, book_id).await.available_copies, 2);

    let twice = repo
        .transactions
        .return_loan(issued.id, librarian, now + Duration::days(4), rate())
        .await;
    assert!(matches!(twice, Err(AppError::AlreadyReturned(id)) if id == issued.id));
    assert_eq!(book(&db.pool, book_id).await.available_copies, 2);
}

#[tokio::test]
#[ignore]
async fn test_last_copy_goes_to_reservation_queue() {
    let db = init_test_db().await;
    let repo = Repository::new(db.pool.clone());
    let librarian = insert_profile(&db.pool, "Libby", Role::Librarian).await;
    let alice = insert_profile(&db.pool, "Alice", Role::Member).await;
    let bob = insert_profile(&db.pool, "Bob", Role::Member).await;
    let carol = insert_profile(&db.pool, "Carol", Role::Member).await;
    let book_id = insert_book(&db.pool, "9780000000002", 1).await;

    let now = Utc::now();
    let expiry = now + Duration::days(3);
    let issued = repo
        .transactions
        .issue(&loan(book_id, alice, librarian, now, now + Duration::days(14)))
        .await
        .unwrap();
    assert_eq!(book(&db.pool, book_id).await.available_copies, 0);

    let bobs = repo.reservations.create(book_id, bob, now, expiry).await.unwrap();
    assert_eq!(bobs.queue_position, 1);
    assert_eq!(bobs.status, ReservationStatus::Pending);

    let refused = repo
        .transactions
        .issue(&loan(book_id, bob, librarian, now, now + Duration::days(14)))
        .await
        .unwrap_err();
    assert!(matches!(refused, AppError::BookUnavailable));
    assert_eq!(refused.kind(), ErrorKind::ResourceExhausted);

    let duplicate = repo.reservations.create(book_id, bob, now, expiry).await;
    assert!(matches!(duplicate, Err(AppError::DuplicatePending(_))));

    let carols = repo.reservations.create(book_id, carol, now, expiry).await.unwrap();
    assert_eq!(carols.queue_position, 2);

    // Positions are labels: cancelling the head leaves the rest untouched
    let cancelled = repo
        .reservations
        .close(bobs.id, ReservationStatus::Cancelled, now)
        .await
        .unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    assert_eq!(repo.reservations.get_by_id(carols.id).await.unwrap().queue_position, 2);

    let closed_again = repo.reservations.close(bobs.id, ReservationStatus::Fulfilled, now).await;
    assert!(matches!(closed_again, Err(AppError::InvalidState(_))));

    let fulfilled = repo
        .reservations
        .close(carols.id, ReservationStatus::Fulfilled, now)
        .await
        .unwrap();
    assert!(fulfilled.fulfilled_date.is_some());
    // Fulfilment does not issue anything
    assert_eq!(book(&db.pool, book_id).await.available_copies, 0);

    repo.transactions
        .return_loan(issued.id, librarian, now + Duration::days(1), rate())
        .await
        .unwrap();
    let on_shelf = repo.reservations.create(book_id, bob, now, expiry).await;
    assert!(matches!(on_shelf, Err(AppError::BookAvailable)));
}

#[tokio::test]
#[ignore]
async fn test_stale_reservations_expire() {
    let db = init_test_db().await;
    let repo = Repository::new(db.pool.clone());
    let librarian = insert_profile(&db.pool, "Libby", Role::Librarian).await;
    let alice = insert_profile(&db.pool, "Alice", Role::Member).await;
    let bob = insert_profile(&db.pool, "Bob", Role::Member).await;
    let book_id = insert_book(&db.pool, "9780000000003", 1).await;

    let created = at(2024, 3, 1);
    repo.transactions
        .issue(&loan(book_id, alice, librarian, created, created + Duration::days(14)))
        .await
        .unwrap();
    let reservation = repo
        .reservations
        .create(book_id, bob, created, created + Duration::days(3))
        .await
        .unwrap();

    assert_eq!(repo.reservations.expire_overdue(at(2024, 3, 3)).await.unwrap(), 0);
    assert_eq!(repo.reservations.expire_overdue(at(2024, 3, 5)).await.unwrap(), 1);
    assert_eq!(
        repo.reservations.get_by_id(reservation.id).await.unwrap().status,
        ReservationStatus::Expired
    );
    assert_eq!(repo.reservations.expire_overdue(at(2024, 3, 6)).await.unwrap(), 0);
}

#[tokio::test]
#[ignore]
async fn test_late_return_charges_four_days() {
    let db = init_test_db().await;
    let repo = Repository::new(db.pool.clone());
    let librarian = insert_profile(&db.pool, "Libby", Role::Librarian).await;
    let alice = insert_profile(&db.pool, "Alice", Role::Member).await;
    let book_id = insert_book(&db.pool, "9780000000004", 1).await;

    let issued = repo
        .transactions
        .issue(&loan(book_id, alice, librarian, at(2023, 12, 18), at(2024, 1, 1)))
        .await
        .unwrap();

    let outcome = repo
        .transactions
        .return_loan(issued.id, librarian, at(2024, 1, 5), rate())
        .await
        .unwrap();
    assert_eq!(outcome.transaction.status, TransactionStatus::Overdue);
    assert_eq!(outcome.transaction.return_date, Some(at(2024, 1, 5)));
    assert_eq!(outcome.transaction.fine_amount, Decimal::from(40));
    assert!(!outcome.transaction.fine_paid);

    let fine = outcome.fine.expect("fine charged");
    assert_eq!(fine.amount, Decimal::from(40));
    assert_eq!(fine.user_id, alice);
    assert!(!fine.paid);
    assert_eq!(count(&db.pool, ALL_FINES, issued.id).await, 1);
    assert_eq!(book(&db.pool, book_id).await.available_copies, 1);
}

#[tokio::test]
#[ignore]
async fn test_sync_twice_keeps_one_fine() {
    let db = init_test_db().await;
    let repo = Repository::new(db.pool.clone());
    let librarian = insert_profile(&db.pool, "Libby", Role::Librarian).await;
    let alice = insert_profile(&db.pool, "Alice", Role::Member).await;
    let book_id = insert_book(&db.pool, "9780000000005", 1).await;

    let issued = repo
        .transactions
        .issue(&loan(book_id, alice, librarian, at(2023, 12, 18), at(2024, 1, 1)))
        .await
        .unwrap();

    let first = repo.fines.sync_overdue(None, at(2024, 1, 3), rate()).await.unwrap();
    assert_eq!(first.overdue_loans, 1);
    assert_eq!(first.fines_upserted, 1);

    let second = repo.fines.sync_overdue(None, at(2024, 1, 6), rate()).await.unwrap();
    assert_eq!(second.fines_upserted, 1);
    assert_eq!(count(&db.pool, ALL_FINES, issued.id).await, 1);

    let unpaid = repo.fines.list_unpaid(Some(alice)).await.unwrap();
    assert_eq!(unpaid.len(), 1);
    assert_eq!(unpaid[0].fine.amount, Decimal::from(50));
    assert_eq!(unpaid[0].book.id, book_id);
    assert_eq!(repo.fines.total_unpaid(Some(alice)).await.unwrap(), Decimal::from(50));

    let loan = repo.transactions.get_by_id(issued.id).await.unwrap();
    assert_eq!(loan.status, TransactionStatus::Overdue);
    assert_eq!(loan.fine_amount, Decimal::from(50));
    assert!(loan.return_date.is_none());

    // An overdue loan can still come back; the fine is settled in place
    let outcome = repo
        .transactions
        .return_loan(issued.id, librarian, at(2024, 1, 6), rate())
        .await
        .unwrap();
    assert_eq!(outcome.transaction.status, TransactionStatus::Overdue);
    assert_eq!(count(&db.pool, ALL_FINES, issued.id).await, 1);
}

#[tokio::test]
#[ignore]
async fn test_paid_days_are_not_charged_again() {
    let db = init_test_db().await;
    let repo = Repository::new(db.pool.clone());
    let librarian = insert_profile(&db.pool, "Libby", Role::Librarian).await;
    let alice = insert_profile(&db.pool, "Alice", Role::Member).await;
    let book_id = insert_book(&db.pool, "9780000000006", 1).await;

    let issued = repo
        .transactions
        .issue(&loan(book_id, alice, librarian, at(2023, 12, 18), at(2024, 1, 1)))
        .await
        .unwrap();

    repo.fines.sync_overdue(Some(alice), at(2024, 1, 3), rate()).await.unwrap();
    let first = repo.fines.list_unpaid(Some(alice)).await.unwrap().remove(0).fine;
    assert_eq!(first.amount, Decimal::from(20));

    let paid = repo.fines.pay(first.id, "card", at(2024, 1, 3)).await.unwrap();
    assert!(paid.paid);
    assert_eq!(paid.payment_method.as_deref(), Some("card"));
    assert!(repo.transactions.get_by_id(issued.id).await.unwrap().fine_paid);

    let repaid = repo.fines.pay(first.id, "cash", at(2024, 1, 4)).await;
    assert!(matches!(repaid, Err(AppError::InvalidState(_))));
    assert!(matches!(
        repo.fines.pay(9999, "cash", at(2024, 1, 4)).await,
        Err(AppError::FineNotFound(9999))
    ));

    repo.fines.sync_overdue(Some(alice), at(2024, 1, 6), rate()).await.unwrap();
    assert_eq!(count(&db.pool, ALL_FINES, issued.id).await, 2);
    assert_eq!(count(&db.pool, UNPAID_FINES, issued.id).await, 1);
    assert_eq!(repo.fines.total_unpaid(Some(alice)).await.unwrap(), Decimal::from(30));
    assert!(!repo.transactions.get_by_id(issued.id).await.unwrap().fine_paid);
}

#[tokio::test]
#[ignore]
async fn test_pay_while_sync_runs() {
    let db = init_test_db().await;
    let repo = Repository::new(db.pool.clone());
    let librarian = insert_profile(&db.pool, "Libby", Role::Librarian).await;
    let alice = insert_profile(&db.pool, "Alice", Role::Member).await;
    let book_id = insert_book(&db.pool, "9780000000012", 1).await;

    repo.transactions
        .issue(&loan(book_id, alice, librarian, at(2023, 12, 18), at(2024, 1, 1)))
        .await
        .unwrap();

    for round in 0..5u32 {
        let day = 10 + 2 * round;
        repo.fines.sync_overdue(Some(alice), at(2024, 1, day), rate()).await.unwrap();
        let fine = repo.fines.list_unpaid(Some(alice)).await.unwrap().remove(0).fine;

        let (paid, synced) = tokio::join!(
            repo.fines.pay(fine.id, "cash", at(2024, 1, day)),
            repo.fines.sync_overdue(None, at(2024, 1, day + 1), rate()),
        );
        assert!(paid.is_ok(), "pay failed: {:?}", paid.err());
        assert!(synced.is_ok(), "sync failed: {:?}", synced.err());
    }

    let unpaid = repo.fines.list_unpaid(Some(alice)).await.unwrap();
    assert!(unpaid.len() <= 1);
    assert!(unpaid.iter().all(|f| f.fine.amount > Decimal::ZERO));
}

#[tokio::test]
#[ignore]
async fn test_reused_queue_position_stays_fifo() {
    let db = init_test_db().await;
    let repo = Repository::new(db.pool.clone());
    let librarian = insert_profile(&db.pool, "Libby", Role::Librarian).await;
    let alice = insert_profile(&db.pool, "Alice", Role::Member).await;
    let bob = insert_profile(&db.pool, "Bob", Role::Member).await;
    let carol = insert_profile(&db.pool, "Carol", Role::Member).await;
    let dave = insert_profile(&db.pool, "Dave", Role::Member).await;
    let book_id = insert_book(&db.pool, "9780000000013", 1).await;

    let now = Utc::now();
    repo.transactions
        .issue(&loan(book_id, alice, librarian, now, now + Duration::days(14)))
        .await
        .unwrap();

    let bobs = repo
        .reservations
        .create(book_id, bob, now, now + Duration::days(3))
        .await
        .unwrap();
    let later = now + Duration::minutes(5);
    let carols = repo
        .reservations
        .create(book_id, carol, later, later + Duration::days(3))
        .await
        .unwrap();
    repo.reservations
        .close(bobs.id, ReservationStatus::Cancelled, later)
        .await
        .unwrap();

    let latest = now + Duration::minutes(10);
    let daves = repo
        .reservations
        .create(book_id, dave, latest, latest + Duration::days(3))
        .await
        .unwrap();
    assert_eq!(daves.queue_position, carols.queue_position);

    let queue: Vec<i32> = repo
        .reservations
        .list_pending(Some(book_id))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.reservation.id)
        .collect();
    assert_eq!(queue, vec![carols.id, daves.id]);
}

#[tokio::test]
#[ignore]
async fn test_approval_needs_a_copy() {
    let db = init_test_db().await;
    let repo = Repository::new(db.pool.clone());
    let librarian = insert_profile(&db.pool, "Libby", Role::Librarian).await;
    let alice = insert_profile(&db.pool, "Alice", Role::Member).await;
    let bob = insert_profile(&db.pool, "Bob", Role::Member).await;
    let book_id = insert_book(&db.pool, "9780000000007", 1).await;

    let now = Utc::now();
    let requested_due = now + Duration::days(14);
    let request = repo
        .borrow_requests
        .create(book_id, bob, Some("for the weekend"), now, requested_due)
        .await
        .unwrap();
    assert_eq!(request.status, BorrowRequestStatus::Pending);

    let alices = repo
        .transactions
        .issue(&loan(book_id, alice, librarian, now, now + Duration::days(14)))
        .await
        .unwrap();

    let refused = repo.borrow_requests.approve(request.id, librarian, now).await;
    assert!(matches!(refused, Err(AppError::BookUnavailable)));
    assert_eq!(
        repo.borrow_requests.get_by_id(request.id).await.unwrap().status,
        BorrowRequestStatus::Pending
    );
    assert_eq!(book(&db.pool, book_id).await.available_copies, 0);

    repo.transactions
        .return_loan(alices.id, librarian, now + Duration::hours(1), rate())
        .await
        .unwrap();

    let (approved, issued) = repo
        .borrow_requests
        .approve(request.id, librarian, now + Duration::hours(2))
        .await
        .unwrap();
    assert_eq!(approved.status, BorrowRequestStatus::Approved);
    assert_eq!(approved.reviewed_by, Some(librarian));
    assert!(approved.reviewed_at.is_some());
    assert_eq!(issued.user_id, bob);
    assert_eq!(issued.issued_by, Some(librarian));
    assert_eq!(issued.due_date, request.requested_due_date);
    assert_eq!(book(&db.pool, book_id).await.available_copies, 0);

    let twice = repo.borrow_requests.approve(request.id, librarian, now).await;
    assert!(matches!(twice, Err(AppError::InvalidState(_))));
}

#[tokio::test]
#[ignore]
async fn test_borrow_request_guards() {
    let db = init_test_db().await;
    let repo = Repository::new(db.pool.clone());
    let librarian = insert_profile(&db.pool, "Libby", Role::Librarian).await;
    let alice = insert_profile(&db.pool, "Alice", Role::Member).await;
    let held = insert_book(&db.pool, "9780000000008", 2).await;
    let wanted = insert_book(&db.pool, "9780000000009", 2).await;

    let now = Utc::now();
    let due = now + Duration::days(14);
    repo.transactions
        .issue(&loan(held, alice, librarian, now, due))
        .await
        .unwrap();

    let borrowed = repo.borrow_requests.create(held, alice, None, now, due).await;
    assert!(matches!(borrowed, Err(AppError::AlreadyBorrowed)));

    let missing = repo.borrow_requests.create(424242, alice, None, now, due).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let first = repo.borrow_requests.create(wanted, alice, None, now, due).await.unwrap();
    let duplicate = repo.borrow_requests.create(wanted, alice, None, now, due).await;
    assert!(matches!(duplicate, Err(AppError::DuplicatePending(_))));

    let rejected = repo
        .borrow_requests
        .reject(first.id, librarian, DEFAULT_REJECTION_REASON, now)
        .await
        .unwrap();
    assert_eq!(rejected.status, BorrowRequestStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some(DEFAULT_REJECTION_REASON));
    assert_eq!(book(&db.pool, wanted).await.available_copies, 2);

    // A closed request frees the slot for a new one
    let second = repo.borrow_requests.create(wanted, alice, None, now, due).await.unwrap();
    let cancelled = repo.borrow_requests.cancel(second.id, now).await.unwrap();
    assert_eq!(cancelled.status, BorrowRequestStatus::Cancelled);
    assert!(matches!(
        repo.borrow_requests.cancel(second.id, now).await,
        Err(AppError::InvalidState(_))
    ));

    let pending = repo.borrow_requests.list_pending().await.unwrap();
    assert!(pending.is_empty());
    assert_eq!(repo.borrow_requests.list_for_user(alice).await.unwrap().len(), 2);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_issue_of_last_copy() {
    let db = init_test_db().await;
    let repo = Repository::new(db.pool.clone());
    let librarian = insert_profile(&db.pool, "Libby", Role::Librarian).await;
    let alice = insert_profile(&db.pool, "Alice", Role::Member).await;
    let bob = insert_profile(&db.pool, "Bob", Role::Member).await;
    let book_id = insert_book(&db.pool, "9780000000010", 1).await;

    let now = Utc::now();
    let due = now + Duration::days(14);
    let for_alice = loan(book_id, alice, librarian, now, due);
    let for_bob = loan(book_id, bob, librarian, now, due);

    let (a, b) = tokio::join!(
        repo.transactions.issue(&for_alice),
        repo.transactions.issue(&for_bob)
    );

    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    let loser = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert!(matches!(loser, AppError::BookUnavailable));

    assert_eq!(book(&db.pool, book_id).await.available_copies, 0);
    assert_eq!(
        count(
            &db.pool,
            "SELECT COUNT(*) FROM transactions WHERE book_id = $1 AND return_date IS NULL",
            book_id
        )
        .await,
        1
    );
}

#[tokio::test]
#[ignore]
async fn test_resize_respects_loans() {
    let db = init_test_db().await;
    let repo = Repository::new(db.pool.clone());
    let librarian = insert_profile(&db.pool, "Libby", Role::Librarian).await;
    let alice = insert_profile(&db.pool, "Alice", Role::Member).await;
    let bob = insert_profile(&db.pool, "Bob", Role::Member).await;
    let book_id = insert_book(&db.pool, "9780000000011", 3).await;

    let now = Utc::now();
    for member in [alice, bob] {
        repo.transactions
            .issue(&loan(book_id, member, librarian, now, now + Duration::days(14)))
            .await
            .unwrap();
    }

    let shrink = UpdateBook {
        total_copies: Some(1),
        ..Default::default()
    };
    assert!(matches!(
        repo.books.update(book_id, &shrink, now).await,
        Err(AppError::InvalidState(_))
    ));

    let grow = UpdateBook {
        total_copies: Some(5),
        ..Default::default()
    };
    let updated = repo.books.update(book_id, &grow, now).await.unwrap();
    assert_eq!(updated.total_copies, 5);
    assert_eq!(updated.available_copies, 3);

    assert!(matches!(repo.books.delete(book_id).await, Err(AppError::InvalidState(_))));
}

#[tokio::test]
#[ignore]
async fn test_member_stats() {
    let db = init_test_db().await;
    let repo = Repository::new(db.pool.clone());
    let services = Services::new(repo.clone(), CirculationConfig::default());
    let librarian = insert_profile(&db.pool, "Libby", Role::Librarian).await;
    let alice = insert_profile(&db.pool, "Alice", Role::Member).await;
    let bob = insert_profile(&db.pool, "Bob", Role::Member).await;
    let first = insert_book(&db.pool, "9780000000014", 1).await;
    let second = insert_book(&db.pool, "9780000000015", 1).await;

    let late = repo
        .transactions
        .issue(&loan(first, alice, librarian, at(2023, 12, 18), at(2024, 1, 1)))
        .await
        .unwrap();
    repo.transactions
        .return_loan(late.id, librarian, at(2024, 1, 5), rate())
        .await
        .unwrap();
    repo.transactions
        .issue(&loan(second, alice, librarian, at(2023, 12, 18), at(2024, 1, 1)))
        .await
        .unwrap();

    let stats = services.stats.member(&actor(alice, Role::Member), alice).await.unwrap();
    assert_eq!(stats.user_id, alice);
    assert_eq!(stats.total_borrowed, 2);
    assert_eq!(stats.currently_borrowed, 1);
    assert_eq!(stats.overdue, 1);
    assert_eq!(stats.total_fines, Decimal::from(40));
    assert_eq!(stats.unpaid_fines, Decimal::from(40));

    let fine = repo.fines.list_unpaid(Some(alice)).await.unwrap().remove(0).fine;
    repo.fines.pay(fine.id, "cash", at(2024, 1, 6)).await.unwrap();
    let stats = services.stats.member(&actor(librarian, Role::Librarian), alice).await.unwrap();
    assert_eq!(stats.total_fines, Decimal::from(40));
    assert_eq!(stats.unpaid_fines, Decimal::ZERO);

    let other = services.stats.member(&actor(bob, Role::Member), alice).await;
    assert!(matches!(other, Err(AppError::Unauthorized(_))));
    let missing = services.stats.member(&actor(librarian, Role::Librarian), 9999).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
#[ignore]
async fn test_issue_desk_member_lookup() {
    let db = init_test_db().await;
    let services = Services::new(Repository::new(db.pool.clone()), CirculationConfig::default());
    let librarian = insert_profile(&db.pool, "Libby", Role::Librarian).await;
    let alice = insert_profile(&db.pool, "Alice", Role::Member).await;
    let desk = actor(librarian, Role::Librarian);

    let by_card = services.circulation.find_member(&desk, "M-ALICE").await.unwrap();
    assert_eq!(by_card.id, alice);
    assert_eq!(by_card.member_id.as_deref(), Some("M-ALICE"));

    let by_email = services.circulation.find_member(&desk, "  Alice@Library.test ").await.unwrap();
    assert_eq!(by_email.id, alice);

    let unknown = services.circulation.find_member(&desk, "M-NOBODY").await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));
    let empty = services.circulation.find_member(&desk, "   ").await;
    assert!(matches!(empty, Err(AppError::Validation(_))));
    let member = services.circulation.find_member(&actor(alice, Role::Member), "M-ALICE").await;
    assert!(matches!(member, Err(AppError::Unauthorized(_))));
}
