//! A self-balancing BST (an AVL tree) that orders opaque records using a comparator supplied
//! by the caller. The tree never looks inside a record; everything it knows about records comes
//! from three capabilities handed to it at construction:
//!
//! 1. a comparator, which must be a consistent total order for the life of the tree,
//! 2. a printer, used by [`Tree::print_in_order`],
//! 3. optionally, a destructor that receives every stored record when the tree is dropped.
//!
//! Records with an equal key are never stored twice: a duplicate insert is rejected and the
//! record is handed back untouched.
//!
//! # Examples
//!
//! ```
//! use avl_index::tree::Tree;
//!
//! let mut tree = Tree::new(|a: &(u32, char), b: &(u32, char)| a.0.cmp(&b.0), |_| {});
//!
//! // Nothing in here yet.
//! assert_eq!(tree.find(&(1, ' ')), None);
//!
//! tree.insert((1, 'a')).unwrap();
//! assert_eq!(tree.find(&(1, ' ')), Some(&(1, 'a')));
//!
//! // Inserting a record with the same key keeps the original.
//! assert!(tree.insert((1, 'b')).is_err());
//! assert_eq!(tree.find(&(1, ' ')), Some(&(1, 'a')));
//! ```

use std::alloc::{self, Layout};
use std::cmp::Ordering;
use std::fmt;
use std::ptr::NonNull;

use crate::error::{InsertError, NotFound};
use crate::iter::Iter;

type Compare<T> = Box<dyn Fn(&T, &T) -> Ordering>;
type Print<T> = Box<dyn Fn(&T)>;
type Destroy<T> = Box<dyn FnMut(T)>;

/// An ordered collection of records kept height-balanced after every insertion. Lookups,
/// insertions, and the depth of every traversal are `O(lg N)`.
pub struct Tree<T> {
    root: Link<T>,
    len: usize,
    compare: Compare<T>,
    print: Print<T>,
    destroy: Option<Destroy<T>>,
}

impl<T> Drop for Tree<T> {
    fn drop(&mut self) {
        let root = self.root.take();
        let released = std::mem::take(&mut self.len);
        match self.destroy.as_mut() {
            Some(destroy) => root.destroy(&mut **destroy),
            None => root.destroy(&mut drop::<T>),
        }
        log::debug!("released {released} records");
    }
}

impl<T> fmt::Debug for Tree<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("len", &self.len)
            .field("root", &self.root.node())
            .finish()
    }
}

impl<T> Tree<T> {
    /// Generate a new, empty `Tree` ordered by `compare`. `print` is invoked once per record by
    /// [`Tree::print_in_order`].
    ///
    /// `compare(a, b)` must return `Less` when `a` belongs before `b`. Changing the answer it
    /// gives for two records after they are stored breaks the ordering of the tree.
    pub fn new(
        compare: impl Fn(&T, &T) -> Ordering + 'static,
        print: impl Fn(&T) + 'static,
    ) -> Self {
        Self {
            root: Link(None),
            len: 0,
            compare: Box::new(compare),
            print: Box::new(print),
            destroy: None,
        }
    }

    /// Hands every record still stored in the tree to `destroy` when the tree is dropped. Without
    /// a destructor the records are simply dropped, which is what you want when the tree stores
    /// references to records owned elsewhere.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    ///
    /// use avl_index::Tree;
    ///
    /// let destroyed = Rc::new(Cell::new(0));
    /// let counter = Rc::clone(&destroyed);
    ///
    /// let mut tree = Tree::ordered().with_destroy(move |_: u8| counter.set(counter.get() + 1));
    /// tree.insert(1).unwrap();
    /// tree.insert(2).unwrap();
    /// tree.destroy();
    ///
    /// assert_eq!(destroyed.get(), 2);
    /// ```
    pub fn with_destroy(mut self, destroy: impl FnMut(T) + 'static) -> Self {
        self.destroy = Some(Box::new(destroy));
        self
    }

    /// The number of records stored in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree stores no records.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of levels in the tree. An empty tree has a height of 0 and a tree holding a
    /// single record has a height of 1.
    pub fn height(&self) -> usize {
        self.root.height()
    }

    /// Inserts the record into the tree, rebalancing on the way back up.
    ///
    /// If the tree already stores a record the comparator considers equal, nothing changes and
    /// the new record is returned in [`InsertError::Duplicate`]. If a node cannot be allocated,
    /// the record is returned in [`InsertError::OutOfMemory`] and the tree is left exactly as it
    /// was.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_index::{InsertError, Tree};
    ///
    /// let mut tree = Tree::ordered();
    ///
    /// assert!(tree.insert(1).is_ok());
    /// assert!(matches!(tree.insert(1), Err(InsertError::Duplicate(1))));
    /// assert_eq!(tree.len(), 1);
    /// ```
    pub fn insert(&mut self, record: T) -> Result<(), InsertError<T>> {
        self.root.insert(record, &*self.compare)?;
        self.len += 1;
        Ok(())
    }

    /// Potentially finds the stored record equal to `key` under the tree's comparator. If no
    /// record matches, `None` is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_index::Tree;
    ///
    /// let mut tree = Tree::ordered();
    /// tree.insert(1).unwrap();
    ///
    /// assert_eq!(tree.find(&1), Some(&1));
    /// assert_eq!(tree.find(&42), None);
    /// ```
    pub fn find(&self, key: &T) -> Option<&T> {
        self.find_by(|record| (self.compare)(key, record))
    }

    /// Like [`Tree::find`] but reports a miss as an error.
    pub fn get(&self, key: &T) -> Result<&T, NotFound> {
        self.find(key).ok_or(NotFound)
    }

    /// Finds a record using `probe` in place of a key. `probe(record)` must return where the
    /// sought key lies relative to `record`, agreeing with the tree's comparator. This allows
    /// looking records up by a field without building a whole record to compare against.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_index::Tree;
    ///
    /// #[derive(Debug)]
    /// struct Room {
    ///     id: i32,
    /// }
    ///
    /// let mut rooms = Tree::new(|a: &Room, b: &Room| a.id.cmp(&b.id), |_: &Room| {});
    /// rooms.insert(Room { id: 7 }).unwrap();
    ///
    /// assert!(rooms.find_by(|room| 7.cmp(&room.id)).is_some());
    /// assert!(rooms.find_by(|room| 8.cmp(&room.id)).is_none());
    /// ```
    pub fn find_by(&self, probe: impl Fn(&T) -> Ordering) -> Option<&T> {
        self.root.find(&probe)
    }

    /// Calls the tree's printer on every record, in ascending order.
    pub fn print_in_order(&self) {
        self.root.for_each_in_order(&mut |record: &T| (self.print)(record));
    }

    /// Creates an iterator yielding the records in ascending order. Returns `None` for an empty
    /// tree or when the iterator's stack can't be allocated.
    ///
    /// The iterator borrows the tree, so the tree can't be modified until it is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_index::Tree;
    ///
    /// let mut tree = Tree::ordered();
    /// assert!(tree.iter().is_none());
    ///
    /// for x in [3, 1, 2] {
    ///     tree.insert(x).unwrap();
    /// }
    ///
    /// let mut iter = tree.iter().unwrap();
    /// assert_eq!(iter.next(), Some(&1));
    /// assert_eq!(iter.next(), Some(&2));
    /// assert_eq!(iter.next(), Some(&3));
    /// assert_eq!(iter.next(), None);
    /// assert_eq!(iter.next(), None);
    /// ```
    pub fn iter(&self) -> Option<Iter<'_, T>> {
        let iter = Iter::new(Some(self.root.node()?));
        (!iter.is_stalled()).then_some(iter)
    }

    /// Drops the tree, passing every record to the destructor if one was given.
    pub fn destroy(self) {
        drop(self)
    }
}

impl<T> Tree<T>
where
    T: Ord + fmt::Debug + 'static,
{
    /// Generate a new, empty `Tree` ordered by [`Ord`] that prints records to stdout using their
    /// [`Debug`][fmt::Debug] representation.
    pub fn ordered() -> Self {
        Self::new(T::cmp, |record| println!("{record:?}"))
    }
}

impl<'a, T> IntoIterator for &'a Tree<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        Iter::new(self.root.node())
    }
}

/// Which way an insertion went at a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Descent {
    /// The record was placed in a new leaf at this position.
    Here,
    Left,
    Right,
}

/// An owned, possibly empty, subtree.
struct Link<T>(Option<Box<Node<T>>>);

impl<T> Link<T> {
    fn node(&self) -> Option<&Node<T>> {
        self.0.as_deref()
    }

    fn height(&self) -> usize {
        self.node().map_or(0, |n| n.height)
    }

    fn take(&mut self) -> Self {
        Link(self.0.take())
    }

    fn find(&self, probe: &dyn Fn(&T) -> Ordering) -> Option<&T> {
        let node = self.node()?;
        match probe(&node.record) {
            Ordering::Less => node.left.find(probe),
            Ordering::Equal => Some(&node.record),
            Ordering::Greater => node.right.find(probe),
        }
    }

    fn for_each_in_order(&self, f: &mut dyn FnMut(&T)) {
        if let Some(node) = self.node() {
            node.left.for_each_in_order(f);
            f(&node.record);
            node.right.for_each_in_order(f);
        }
    }

    /// Post-order teardown: both subtrees, then the node's own record.
    fn destroy(self, destroy: &mut dyn FnMut(T)) {
        if let Some(node) = self.0 {
            let Node {
                record,
                left,
                right,
                ..
            } = *node;
            left.destroy(destroy);
            right.destroy(destroy);
            destroy(record);
        }
    }

    /// Inserts `record` into this subtree and returns which way it went at the subtree's root.
    ///
    /// The new node is allocated before anything along the path is touched, so on error the
    /// subtree is unchanged.
    fn insert(
        &mut self,
        record: T,
        compare: &dyn Fn(&T, &T) -> Ordering,
    ) -> Result<Descent, InsertError<T>> {
        let node = match &mut self.0 {
            Some(node) => node,
            None => {
                let leaf = Node::try_new_boxed(record).map_err(InsertError::OutOfMemory)?;
                self.0 = Some(leaf);
                return Ok(Descent::Here);
            }
        };

        let went = match compare(&record, &node.record) {
            Ordering::Less => Descent::Left,
            Ordering::Equal => return Err(InsertError::Duplicate(record)),
            Ordering::Greater => Descent::Right,
        };
        let then = match went {
            Descent::Left => node.left.insert(record, compare)?,
            _ => node.right.insert(record, compare)?,
        };
        node.fix_height();
        self.rebalance(went, then);

        if cfg!(debug_assertions) {
            if let Some(root) = self.node() {
                if let Some(left) = root.left() {
                    assert_eq!(compare(&left.record, &root.record), Ordering::Less);
                }
                if let Some(right) = root.right() {
                    assert_eq!(compare(&right.record, &root.record), Ordering::Greater);
                }
            }
        }

        Ok(went)
    }

    /// Restores the AVL invariant at this subtree's root after an insertion that went `went` at
    /// the root and `then` at the root's child on that side.
    ///
    /// See https://en.wikipedia.org/wiki/AVL_tree#Rebalancing for terminology.
    fn rebalance(&mut self, went: Descent, then: Descent) {
        let Some(root) = self.node() else {
            return;
        };
        let balance = root.balance_factor();
        let height = root.height;

        match (went, then) {
            (Descent::Left, Descent::Left) if balance > 1 => {
                log::trace!("left-left imbalance at height {height}");
                self.rotate_right();
            }
            (Descent::Right, Descent::Right) if balance < -1 => {
                log::trace!("right-right imbalance at height {height}");
                self.rotate_left();
            }
            (Descent::Left, Descent::Right) if balance > 1 => {
                log::trace!("left-right imbalance at height {height}");
                self.rotate_left_right();
            }
            (Descent::Right, Descent::Left) if balance < -1 => {
                log::trace!("right-left imbalance at height {height}");
                self.rotate_right_left();
            }
            _ => {}
        }

        if cfg!(debug_assertions) {
            let Some(root) = self.node() else {
                return;
            };
            let left_height = root.left.height();
            let right_height = root.right.height();
            assert_eq!(root.height, left_height.max(right_height) + 1);
            assert!(left_height.abs_diff(right_height) <= 1);
        }
    }

    /// Rotate self to the right. This moves the left child up vertically and self down vertically.
    /// Used to rebalance the tree when the left child is too tall. As such, it must only be called
    /// when there _is_ a left child.
    ///
    /// ## Panics
    ///
    /// When called on a node without a left child.
    ///
    /// # Diagram
    ///
    /// ```text
    ///   old_root (i.e. "self")    new_root
    ///    /     \                  /     \
    /// new_root  z     rotate ->  x    old_root
    ///  / \                               /  \
    /// x   y                             y    z
    /// ```
    fn rotate_right(&mut self) {
        let mut old_root = self.0.take().expect("Cannot rotate empty tree/node.");
        let mut new_root = old_root.left.0.take().expect("Rotate right => left child");

        old_root.left = new_root.right.take();
        old_root.fix_height();

        new_root.right = Link(Some(old_root));
        new_root.fix_height();
        self.0 = Some(new_root);
    }

    /// The mirror image of [`Link::rotate_right`]: the right child moves up.
    ///
    /// ## Panics
    ///
    /// When called on a node without a right child.
    fn rotate_left(&mut self) {
        let mut old_root = self.0.take().expect("Cannot rotate empty tree/node.");
        let mut new_root = old_root.right.0.take().expect("Rotate left => right child");

        old_root.right = new_root.left.take();
        old_root.fix_height();

        new_root.left = Link(Some(old_root));
        new_root.fix_height();
        self.0 = Some(new_root);
    }

    fn rotate_right_left(&mut self) {
        self.0
            .as_mut()
            .expect("Rotating a tree requires a root")
            .right
            .rotate_right();
        self.rotate_left();
    }

    fn rotate_left_right(&mut self) {
        self.0
            .as_mut()
            .expect("Rotating a tree requires a root")
            .left
            .rotate_left();
        self.rotate_right();
    }
}

/// A single vertex of the tree. It exclusively owns its record and both of its children.
pub(crate) struct Node<T> {
    record: T,
    left: Link<T>,
    right: Link<T>,

    /// How many levels are in the subtree rooted at this node.
    /// A node with no children has a height of 1.
    height: usize,
}

impl<T> fmt::Debug for Node<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("record", &self.record)
            .field("height", &self.height)
            .field("left", &self.left())
            .field("right", &self.right())
            .finish()
    }
}

impl<T> Node<T> {
    /// Allocates a leaf holding `record`, handing the record back if the allocator fails.
    fn try_new_boxed(record: T) -> Result<Box<Self>, T> {
        let layout = Layout::new::<Self>();
        // SAFETY: `layout` is not zero-sized because every `Node` stores its `height`.
        let Some(ptr) = NonNull::new(unsafe { alloc::alloc(layout) }.cast::<Self>()) else {
            return Err(record);
        };

        let node = Node {
            record,
            left: Link(None),
            right: Link(None),
            height: 1,
        };
        // SAFETY: `ptr` is non-null and was allocated by the global allocator with the layout of
        // `Self`, so it is valid for a write and may be owned by a `Box` afterwards.
        unsafe {
            ptr.as_ptr().write(node);
            Ok(Box::from_raw(ptr.as_ptr()))
        }
    }

    pub(crate) fn record(&self) -> &T {
        &self.record
    }

    pub(crate) fn left(&self) -> Option<&Self> {
        self.left.node()
    }

    pub(crate) fn right(&self) -> Option<&Self> {
        self.right.node()
    }

    /// Adjusts the height of `self` to be the max of its children's heights + 1.
    fn fix_height(&mut self) {
        self.height = self.left.height().max(self.right.height()) + 1;
    }

    /// The height of the left subtree minus the height of the right subtree.
    fn balance_factor(&self) -> isize {
        self.left.height() as isize - self.right.height() as isize
    }
}
