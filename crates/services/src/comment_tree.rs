//! # Comment tree assembly
//!
//! Joins flat comment rows into the two-level shape the API returns:
//! top-level comments in creation order, each carrying its direct replies in
//! creation order. Replies whose parent is not among the top-level comments
//! (deleted parent, reply-to-reply, or a dangling id) are dropped.

use std::collections::HashMap;

use domains::{CommentId, CommentNode, CommentView};

pub fn assemble(top_level: Vec<CommentView>, replies: Vec<CommentView>) -> Vec<CommentNode> {
    let mut by_parent: HashMap<CommentId, Vec<CommentView>> = HashMap::new();
    for reply in replies {
        if let Some(parent) = reply.comment.parent_id {
            by_parent.entry(parent).or_default().push(reply);
        }
    }

    let nodes: Vec<CommentNode> = top_level
        .into_iter()
        .map(|comment| {
            let mut replies = by_parent.remove(&comment.comment.id).unwrap_or_default();
            replies.sort_by_key(|r| (r.comment.created_at, r.comment.id));
            CommentNode { comment, replies }
        })
        .collect();

    let orphans: usize = by_parent.values().map(Vec::len).sum();
    if orphans > 0 {
        tracing::debug!(orphans, "replies without a visible parent were skipped");
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use domains::{Author, BoardComment, BoardId, UserId};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn comment(id: i64, parent: Option<i64>, t: i64) -> CommentView {
        CommentView {
            comment: BoardComment {
                id: CommentId(id),
                board_id: BoardId(1),
                user_id: UserId(1),
                parent_id: parent.map(CommentId),
                content: format!("c{id}"),
                like_count: 0,
                is_deleted: false,
                deleted_at: None,
                created_at: at(t),
                updated_at: at(t),
            },
            user: Author { id: UserId(1), username: "alice".into() },
        }
    }

    fn shape(nodes: &[CommentNode]) -> Vec<(i64, Vec<i64>)> {
        nodes
            .iter()
            .map(|n| {
                (n.comment.comment.id.0, n.replies.iter().map(|r| r.comment.id.0).collect())
            })
            .collect()
    }

    #[test]
    fn attaches_replies_under_their_parents_in_order() {
        let top = vec![comment(1, None, 1), comment(2, None, 2)];
        let replies = vec![comment(3, Some(1), 3), comment(4, Some(1), 4), comment(5, Some(2), 5)];

        let tree = assemble(top, replies);
        assert_eq!(shape(&tree), vec![(1, vec![3, 4]), (2, vec![5])]);
    }

    #[test]
    fn reply_order_does_not_depend_on_input_order() {
        let top = vec![comment(1, None, 1)];
        let replies = vec![comment(4, Some(1), 4), comment(3, Some(1), 3)];

        assert_eq!(shape(&assemble(top, replies)), vec![(1, vec![3, 4])]);
    }

    #[test]
    fn orphans_are_dropped() {
        let top = vec![comment(1, None, 1)];
        let replies = vec![comment(7, Some(99), 2), comment(8, Some(1), 3)];

        assert_eq!(shape(&assemble(top, replies)), vec![(1, vec![8])]);
    }

    #[test]
    fn comments_without_replies_get_an_empty_list() {
        let tree = assemble(vec![comment(1, None, 1)], vec![]);
        assert_eq!(tree.len(), 1);
        assert!(tree[0].replies.is_empty());
        assert!(assemble(vec![], vec![comment(2, Some(1), 2)]).is_empty());
    }
}
