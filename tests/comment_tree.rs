//! Reply-tree assembly from flat comment lists.

use chrono::{Duration, Utc};
use forum::models::{Comment, CommentNode, CommentStatus};
use forum::services::comment_tree::{build_tree, count_nodes};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Thread {
    post_id: Uuid,
    author_id: Uuid,
    seq: i64,
}

impl Thread {
    fn new() -> Self {
        Self {
            post_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            seq: 0,
        }
    }

    fn comment(&mut self, content: &str, parent: Option<&Comment>) -> Comment {
        self.seq += 1;
        let created_at = Utc::now() + Duration::seconds(self.seq);
        Comment {
            id: Uuid::new_v4(),
            content: content.to_string(),
            post_id: self.post_id,
            author_id: self.author_id,
            parent_comment_id: parent.map(|p| p.id),
            status: CommentStatus::Active,
            is_edited: false,
            created_at,
            updated_at: created_at,
        }
    }
}

fn shape(forest: &[CommentNode<Comment>]) -> Vec<(String, Vec<String>)> {
    forest
        .iter()
        .map(|node| {
            (
                node.comment.content.clone(),
                node.replies
                    .iter()
                    .map(|r| r.comment.content.clone())
                    .collect(),
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn nested_replies_are_attached_in_input_order() {
    let mut thread = Thread::new();
    let a = thread.comment("A", None);
    let b = thread.comment("B", None);
    let a1 = thread.comment("A1", Some(&a));
    let a1a = thread.comment("A1a", Some(&a1));
    let b1 = thread.comment("B1", Some(&b));

    let comments = vec![a.clone(), b.clone(), a1.clone(), a1a.clone(), b1.clone()];
    let forest = build_tree(&comments);

    let expected = vec![
        CommentNode {
            comment: a,
            replies: vec![CommentNode {
                comment: a1,
                replies: vec![CommentNode {
                    comment: a1a,
                    replies: vec![],
                }],
            }],
        },
        CommentNode {
            comment: b,
            replies: vec![CommentNode {
                comment: b1,
                replies: vec![],
            }],
        },
    ];
    assert_eq!(forest, expected);
}

#[test]
fn empty_input_gives_empty_forest() {
    let forest = build_tree::<Comment>(&[]);
    assert!(forest.is_empty());
}

#[test]
fn reply_to_missing_parent_is_left_out() {
    let mut thread = Thread::new();
    let x = thread.comment("X", None);
    let mut y = thread.comment("Y", None);
    y.parent_comment_id = Some(Uuid::new_v4());

    let forest = build_tree(&[x.clone(), y]);

    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].comment, x);
    assert!(forest[0].replies.is_empty());
}

#[test]
fn orphan_takes_its_replies_with_it() {
    let mut thread = Thread::new();
    let root = thread.comment("root", None);
    let mut orphan = thread.comment("orphan", None);
    orphan.parent_comment_id = Some(Uuid::new_v4());
    let under_orphan = thread.comment("under orphan", Some(&orphan));

    let comments = [root, orphan, under_orphan];
    let forest = build_tree(&comments);

    assert_eq!(count_nodes(&forest), 1);
    assert_eq!(forest[0].comment.content, "root");
}

#[test]
fn caller_order_is_kept_not_resorted() {
    let mut thread = Thread::new();
    let older = thread.comment("older", None);
    let newer = thread.comment("newer", None);
    let older_reply = thread.comment("older reply", Some(&newer));
    let newer_reply = thread.comment("newer reply", Some(&newer));

    // newest first, as a "new" sort would hand it over
    let comments = vec![newer_reply, older_reply, newer, older];
    let forest = build_tree(&comments);

    assert_eq!(
        shape(&forest),
        vec![
            (
                "newer".to_string(),
                vec!["newer reply".to_string(), "older reply".to_string()]
            ),
            ("older".to_string(), vec![]),
        ]
    );
}

#[test]
fn input_is_left_untouched() {
    let mut thread = Thread::new();
    let a = thread.comment("A", None);
    let a1 = thread.comment("A1", Some(&a));
    let comments = vec![a, a1];
    let snapshot = comments.clone();

    let first = build_tree(&comments);
    let second = build_tree(&comments);

    assert_eq!(comments, snapshot);
    assert_eq!(first, second);
}

#[test]
fn very_deep_chain_is_built_without_recursion() {
    let mut thread = Thread::new();
    let depth = 100_000;
    let mut comments = Vec::with_capacity(depth);
    comments.push(thread.comment("0", None));
    for i in 1..depth {
        let parent = comments[i - 1].clone();
        comments.push(thread.comment(&i.to_string(), Some(&parent)));
    }

    let forest = build_tree(&comments);
    assert_eq!(forest.len(), 1);
    assert_eq!(count_nodes(&forest), depth);

    // walk down to the leaf
    let mut node = &forest[0];
    let mut levels = 1;
    while let Some(child) = node.replies.first() {
        node = child;
        levels += 1;
    }
    assert_eq!(levels, depth);
    assert_eq!(node.comment.content, (depth - 1).to_string());

    // dropping a deeply nested forest recurses; hand it off level by level
    let mut pending = forest;
    while let Some(mut node) = pending.pop() {
        pending.append(&mut node.replies);
    }
}
