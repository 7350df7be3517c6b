//! Behaviour every repository implementation must share, checked against the
//! in-memory store through the port trait objects the services use.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    AccountRepository, BoardChanges, BoardRepository, CommentRepository, DomainError, NewBoard,
    NewComment, NewRegistration, NewUser, NewVisit, UserRepository, VisitRepository,
};
use storage_adapters::MemoryStore;
use tokio_test::{assert_err, assert_ok};

struct Ports {
    users: Arc<dyn UserRepository>,
    accounts: Arc<dyn AccountRepository>,
    boards: Arc<dyn BoardRepository>,
    comments: Arc<dyn CommentRepository>,
    visits: Arc<dyn VisitRepository>,
}

fn registration(username: &str, email: &str) -> NewRegistration {
    NewRegistration {
        user: NewUser { username: username.into(), nickname: None },
        email: email.into(),
        password_hash: "h".into(),
    }
}

fn ports() -> Ports {
    let store = Arc::new(MemoryStore::new());
    Ports {
        users: store.clone(),
        accounts: store.clone(),
        boards: store.clone(),
        comments: store.clone(),
        visits: store,
    }
}

#[tokio::test]
async fn account_uniqueness_and_login_bookkeeping() {
    let p = ports();
    let (user, account) =
        assert_ok!(p.accounts.create_with_user(registration("alice", "a@x.io")).await);
    assert_eq!(account.user_id, user.id);
    assert_eq!(account.login_count, 0);

    let dup = assert_err!(p.accounts.create_with_user(registration("bob", "a@x.io")).await);
    assert!(matches!(dup, DomainError::Conflict(_)));

    let now = Utc::now();
    let first = assert_ok!(p.accounts.record_login(account.id, now).await);
    let second = assert_ok!(p.accounts.record_login(account.id, now).await);
    assert_eq!((first.login_count, second.login_count), (1, 2));
    assert_eq!(second.last_login_at, Some(now));
}

#[tokio::test]
async fn failed_registration_leaves_no_user_row() {
    let p = ports();
    assert_ok!(p.accounts.create_with_user(registration("alice", "a@x.io")).await);

    let err = assert_err!(p.accounts.create_with_user(registration("bob", "a@x.io")).await);
    assert_eq!(err, DomainError::Conflict("email is already in use".into()));
    assert!(assert_ok!(p.users.find_by_username("bob").await).is_none());

    let err = assert_err!(p.accounts.create_with_user(registration("alice", "b@x.io")).await);
    assert_eq!(err, DomainError::Conflict("username is already in use".into()));
    assert!(assert_ok!(p.accounts.find_by_email("b@x.io").await).is_none());

    // Neither rejection left a reservation behind.
    let (bob, _) = assert_ok!(p.accounts.create_with_user(registration("bob", "b@x.io")).await);
    assert_eq!(assert_ok!(p.users.find_by_username("bob").await), Some(bob));
}

#[tokio::test]
async fn mutations_on_deleted_boards_are_not_found() {
    let p = ports();
    let user = assert_ok!(p.users.create(NewUser { username: "bob".into(), nickname: None }).await);
    let board = assert_ok!(
        p.boards
            .create(NewBoard { user_id: user.id, title: "t".into(), content: "c".into() })
            .await
    );

    assert_ok!(p.boards.soft_delete(board.id, Utc::now()).await);

    assert!(assert_ok!(p.boards.find(board.id).await).is_none());
    assert_eq!(assert_ok!(p.boards.count().await), 0);
    assert!(matches!(
        p.boards.update(board.id, BoardChanges::default(), Utc::now()).await,
        Err(DomainError::NotFound(..))
    ));
    assert!(matches!(p.boards.increment_view_count(board.id).await, Err(DomainError::NotFound(..))));
    assert!(matches!(p.boards.soft_delete(board.id, Utc::now()).await, Err(DomainError::NotFound(..))));
    assert!(matches!(
        p.comments
            .create(NewComment {
                board_id: board.id,
                user_id: user.id,
                parent_id: None,
                content: "late".into(),
            })
            .await,
        Err(DomainError::NotFound(..))
    ));
}

#[tokio::test]
async fn replies_are_only_returned_for_requested_parents() {
    let p = ports();
    let user = assert_ok!(p.users.create(NewUser { username: "carol".into(), nickname: None }).await);
    let board = assert_ok!(
        p.boards
            .create(NewBoard { user_id: user.id, title: "t".into(), content: "c".into() })
            .await
    );
    let comment = |parent_id, content: &str| NewComment {
        board_id: board.id,
        user_id: user.id,
        parent_id,
        content: content.into(),
    };

    let a = assert_ok!(p.comments.create(comment(None, "a")).await);
    let b = assert_ok!(p.comments.create(comment(None, "b")).await);
    assert_ok!(p.comments.create(comment(Some(a.comment.id), "a1")).await);
    assert_ok!(p.comments.create(comment(Some(b.comment.id), "b1")).await);

    let top = assert_ok!(p.comments.list_top_level(board.id).await);
    assert_eq!(top.len(), 2);

    let only_a = assert_ok!(p.comments.list_replies(board.id, &[a.comment.id]).await);
    assert_eq!(only_a.len(), 1);
    assert_eq!(only_a[0].comment.content, "a1");
    assert!(assert_ok!(p.comments.list_replies(board.id, &[]).await).is_empty());
}

#[tokio::test]
async fn visits_allow_anonymous_rows() {
    let p = ports();
    let visit = assert_ok!(
        p.visits
            .record(NewVisit { ip_address: Some("127.0.0.1".into()), ..NewVisit::default() })
            .await
    );
    assert!(visit.user_id.is_none());
    assert_eq!(visit.ip_address.as_deref(), Some("127.0.0.1"));
}

#[tokio::test]
async fn board_needs_an_existing_author() {
    let p = ports();
    let err = assert_err!(
        p.boards
            .create(NewBoard { user_id: domains::UserId(99), title: "t".into(), content: "c".into() })
            .await
    );
    assert!(matches!(err, DomainError::NotFound("User", _)));
    assert_eq!(assert_ok!(p.boards.count().await), 0);
}
