//! This crate exposes an ordered index built on a self-balancing
//! Binary Search Tree (an AVL tree) whose ordering, printing, and
//! teardown are supplied by the caller.
//!
//! ## Binary Search Tree
//!
//! A Binary Search Tree is a data structure supporting operations to
//! insert and find stored records. BSTs are typically defined
//! recursively using the notion of a `Node`. A `Node` stores one record
//! and will sometimes have child `Node`s. The most important invariants
//! of a BST are:
//!
//! 1. For every `Node` in a BST, all the `Node`s in its left subtree have a
//!    record ordered before its own record.
//! 2. For every `Node` in a BST, all the `Node`s in its right subtree have a
//!    record ordered after its own record.
//!
//! > Note that some `Node`s have no children. These `Node`s are called "leaf nodes".
//!
//! Searching takes `O(height)`. An AVL tree additionally keeps the heights of
//! every node's two subtrees within one of each other, which caps the height
//! at `O(lg N)`. BSTs also naturally support sorted iteration by visiting the
//! left subtree, then the subtree root, then the right subtree.
//!
//! # Examples
//!
//! ```
//! use avl_index::{InsertError, Tree};
//!
//! #[derive(Debug)]
//! struct Room {
//!     id: i32,
//!     name: &'static str,
//! }
//!
//! let mut rooms = Tree::new(|a: &Room, b: &Room| a.id.cmp(&b.id), |room: &Room| println!("{room:?}"));
//!
//! rooms.insert(Room { id: 2, name: "hall" }).unwrap();
//! rooms.insert(Room { id: 1, name: "cellar" }).unwrap();
//!
//! // Equal keys are rejected and the record is handed back.
//! let rejected = rooms.insert(Room { id: 1, name: "attic" });
//! assert!(matches!(rejected, Err(InsertError::Duplicate(Room { name: "attic", .. }))));
//!
//! assert_eq!(rooms.find_by(|room| 2.cmp(&room.id)).map(|room| room.name), Some("hall"));
//!
//! let names: Vec<_> = (&rooms).into_iter().map(|room| room.name).collect();
//! assert_eq!(names, ["cellar", "hall"]);
//! ```

#![deny(missing_docs, clippy::clone_on_ref_ptr)]

mod error;
pub mod iter;
pub mod tree;


pub use error::{InsertError, NotFound, Status};
pub use iter::Iter;
pub use tree::Tree;
