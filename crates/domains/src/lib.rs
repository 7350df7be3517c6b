//! community-board/crates/domains/src/lib.rs
//!
//! The central domain types and interface definitions for the community board.

pub mod errors;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use ports::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use chrono::Utc;

    fn board() -> Board {
        let now = Utc::now();
        Board {
            id: BoardId(7),
            user_id: UserId(1),
            title: "Hello".into(),
            content: "First post".into(),
            board_type: BoardType::General,
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            is_notice: false,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn pagination_rounds_total_pages_up() {
        assert_eq!(Pagination::new(1, 10, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 10, 10).total_pages, 1);
        assert_eq!(Pagination::new(1, 10, 11).total_pages, 2);
        assert_eq!(Pagination::new(1, 3, 7).total_pages, 3);
        assert_eq!(Pagination::new(1, i64::MAX, 2).total_pages, 1);
        assert_eq!(Pagination::new(1, i64::MAX, 0).total_pages, 0);
    }

    #[test]
    fn pagination_offset_rejects_non_positive_input() {
        assert_eq!(Pagination::new(1, 10, 50).offset(), Some(0));
        assert_eq!(Pagination::new(3, 10, 50).offset(), Some(20));
        assert_eq!(Pagination::new(0, 10, 50).offset(), None);
        assert_eq!(Pagination::new(-2, 10, 50).offset(), None);
        assert_eq!(Pagination::new(1, 0, 50).offset(), None);
        assert_eq!(Pagination::new(i64::MAX, 10, 50).offset(), None);
        assert_eq!(Pagination::new(1, 0, 50).total_pages, 0);
    }

    #[test]
    fn summary_serializes_flat_camel_case_with_user() {
        let summary = BoardSummary {
            board: board(),
            user: Author { id: UserId(1), username: "alice".into() },
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["viewCount"], 0);
        assert_eq!(json["boardType"], "GENERAL");
        assert_eq!(json["user"]["username"], "alice");
    }

    #[test]
    fn account_never_serializes_password_hash() {
        let now = Utc::now();
        let account = UserAccount {
            id: AccountId(1),
            user_id: UserId(1),
            email: "a@example.com".into(),
            password_hash: Some("$argon2id$secret".into()),
            last_login_at: None,
            login_count: 0,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("passwordHash"));
    }

    #[test]
    fn status_round_trips_through_its_column_text() {
        for status in [UserStatus::Active, UserStatus::Inactive, UserStatus::Suspended] {
            assert_eq!(status.as_str().parse::<UserStatus>(), Ok(status));
        }
        assert!("BANNED".parse::<UserStatus>().is_err());
    }
}
