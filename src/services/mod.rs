pub mod comment_service;
pub mod comment_tree;
pub mod community_service;
pub mod post_service;
pub mod user_service;
pub mod vote_ledger;
pub mod vote_overlay;
pub mod vote_store;
