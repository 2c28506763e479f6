use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{CommentNode, Threaded};

/// Assemble a flat, single-post list of comments into a forest of reply trees.
///
/// Top-level comments and every `replies` list keep the order of `items`;
/// sort before calling if a particular order is wanted. A comment whose
/// parent is not in `items` is left out together with its replies. Nesting
/// depth is not limited; the assembly does not recurse.
pub fn build_tree<T: Threaded + Clone>(items: &[T]) -> Vec<CommentNode<T>> {
    // Later duplicates of an id take over as the attachment point.
    let index: HashMap<Uuid, usize> = items
        .iter()
        .enumerate()
        .map(|(position, item)| (item.id(), position))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); items.len()];
    let mut roots = Vec::new();

    for (position, item) in items.iter().enumerate() {
        match item.parent_id() {
            None => roots.push(position),
            Some(parent_id) => {
                if let Some(&parent) = index.get(&parent_id) {
                    children[parent].push(position);
                }
            }
        }
    }

    // Pre-order walk from the roots. Nodes stuck in a parent cycle are never
    // reached, so they drop out like orphans.
    let mut order = Vec::with_capacity(items.len());
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(position) = stack.pop() {
        order.push(position);
        stack.extend(children[position].iter().rev().copied());
    }

    // Reverse pre-order visits every child before its parent.
    let mut built: Vec<Option<CommentNode<T>>> = (0..items.len()).map(|_| None).collect();
    for &position in order.iter().rev() {
        let replies = children[position]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();

        built[position] = Some(CommentNode {
            comment: items[position].clone(),
            replies,
        });
    }

    roots
        .into_iter()
        .filter_map(|root| built[root].take())
        .collect()
}

/// Number of comments in a forest, replies included.
pub fn count_nodes<T>(forest: &[CommentNode<T>]) -> usize {
    let mut count = 0;
    let mut stack: Vec<&CommentNode<T>> = forest.iter().collect();
    while let Some(node) = stack.pop() {
        count += 1;
        stack.extend(node.replies.iter());
    }
    count
}
