//! In-order iteration over a [`Tree`][crate::Tree].
//!
//! The iterator keeps an explicit stack holding the path down the left spine of the part of the
//! tree it hasn't visited yet, so it does a constant amount of work per record on average and
//! never walks the whole tree up front.

use std::iter::FusedIterator;

use crate::tree::Node;

/// Capacity of the stack when an iterator is created. An AVL tree this tall holds thousands of
/// records, so most iterators never grow.
const INITIAL_STACK_CAPACITY: usize = 16;

/// A forward-only iterator over the records of a tree in ascending order. Once it returns `None`
/// it keeps returning `None`; create a new one to traverse again.
///
/// The stack doubles whenever it fills up. If that growth can't be allocated the iterator stops
/// early: it returns `None` from then on, so the records it hadn't reached yet are never yielded.
/// Use [`Iter::is_stalled`] to tell an early stop from reaching the end of the tree.
pub struct Iter<'a, T> {
    stack: Vec<&'a Node<T>>,
    stalled: bool,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(root: Option<&'a Node<T>>) -> Self {
        let mut iter = Self {
            stack: Vec::new(),
            stalled: false,
        };
        if iter.stack.try_reserve_exact(INITIAL_STACK_CAPACITY).is_err() {
            iter.stall();
            return iter;
        }
        iter.push_left_spine(root);
        iter
    }

    /// Whether the iterator stopped early because its stack couldn't grow.
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    fn stall(&mut self) {
        self.stack = Vec::new();
        self.stalled = true;
    }

    /// Pushes `node` and then each left child below it.
    fn push_left_spine(&mut self, mut node: Option<&'a Node<T>>) {
        while let Some(current) = node {
            if self.stack.len() == self.stack.capacity() {
                let additional = self.stack.capacity().max(INITIAL_STACK_CAPACITY);
                if self.stack.try_reserve_exact(additional).is_err() {
                    self.stall();
                    return;
                }
            }
            self.stack.push(current);
            node = current.left();
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right());
        Some(node.record())
    }
}

impl<T> FusedIterator for Iter<'_, T> {}
