use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::rc::Rc;

use avl_index::{InsertError, Status, Tree};

/// A record the way a dungeon loader stores them: keyed by an integer id and carrying a payload
/// the tree never looks at.
#[derive(Clone, Debug, PartialEq)]
struct Room {
    id: i16,
    visits: u8,
}

fn rooms() -> Tree<Room> {
    Tree::new(|a: &Room, b: &Room| a.id.cmp(&b.id), |_: &Room| {})
}

fn records<T>(tree: &Tree<T>) -> Vec<&T> {
    tree.into_iter().collect()
}

quickcheck::quickcheck! {
    fn iteration_is_strictly_ascending(ids: Vec<i16>) -> bool {
        let mut tree = rooms();
        for id in &ids {
            let _ = tree.insert(Room { id: *id, visits: 0 });
        }

        let expected: BTreeSet<_> = ids.iter().copied().collect();
        let seen: Vec<_> = records(&tree).iter().map(|room| room.id).collect();
        seen.windows(2).all(|w| w[0] < w[1]) && seen.iter().copied().eq(expected)
    }
}

quickcheck::quickcheck! {
    fn find_after_insert(ids: Vec<i16>) -> bool {
        let mut tree = rooms();
        for id in &ids {
            let _ = tree.insert(Room { id: *id, visits: 0 });
        }

        ids.iter().all(|id| {
            let found = tree.find_by(|room| id.cmp(&room.id));
            found.map(|room| room.id) == Some(*id)
        })
    }
}

quickcheck::quickcheck! {
    fn misses_are_not_found(ids: Vec<i16>, others: Vec<i16>) -> bool {
        let mut tree = rooms();
        for id in &ids {
            let _ = tree.insert(Room { id: *id, visits: 0 });
        }
        let inserted: HashSet<_> = ids.into_iter().collect();

        others
            .iter()
            .filter(|id| !inserted.contains(*id))
            .all(|id| {
                let probe = Room { id: *id, visits: 0 };
                tree.get(&probe).map_err(Status::from) == Err(Status::NotFound)
            })
    }
}

quickcheck::quickcheck! {
    fn duplicates_keep_the_first_record(pairs: Vec<(i16, u8)>) -> bool {
        let mut tree = rooms();
        let mut first = BTreeMap::new();
        for (id, visits) in &pairs {
            let result = tree.insert(Room { id: *id, visits: *visits });
            let expected = if first.contains_key(id) { Status::Duplicate } else { Status::Ok };
            if Status::of_insert(&result) != expected {
                return false;
            }
            first.entry(*id).or_insert(*visits);
        }

        tree.len() == first.len()
            && records(&tree)
                .iter()
                .zip(&first)
                .all(|(room, (id, visits))| room.id == *id && room.visits == *visits)
    }
}

quickcheck::quickcheck! {
    fn destroy_sees_every_record_once(ids: Vec<i16>) -> bool {
        let destroyed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&destroyed);
        let mut tree = rooms().with_destroy(move |room| sink.borrow_mut().push(room.id));

        let mut stored = BTreeSet::new();
        for id in &ids {
            if tree.insert(Room { id: *id, visits: 0 }).is_ok() {
                stored.insert(*id);
            }
        }
        tree.destroy();

        let mut destroyed = destroyed.borrow().clone();
        destroyed.sort_unstable();
        destroyed.into_iter().eq(stored)
    }
}

quickcheck::quickcheck! {
    fn iterator_is_fused(ids: Vec<i16>) -> bool {
        let mut tree = rooms();
        for id in &ids {
            let _ = tree.insert(Room { id: *id, visits: 0 });
        }

        match tree.iter() {
            None => tree.is_empty(),
            Some(mut iter) => {
                let count = iter.by_ref().count();
                count == tree.len() && (0..3).all(|_| iter.next().is_none())
            }
        }
    }
}

quickcheck::quickcheck! {
    fn height_is_logarithmic(ids: Vec<i16>) -> bool {
        let mut tree = rooms();
        for id in &ids {
            let _ = tree.insert(Room { id: *id, visits: 0 });
        }

        // An AVL tree with N records is at most ~1.44 * lg(N + 2) tall.
        let bound = 1.45 * ((tree.len() + 2) as f64).log2();
        tree.height() as f64 <= bound
    }
}

#[test]
fn rejected_records_are_handed_back() {
    let mut tree = rooms();
    tree.insert(Room { id: 1, visits: 1 }).unwrap();

    let rejected = tree.insert(Room { id: 1, visits: 2 }).unwrap_err();
    assert!(matches!(rejected, InsertError::Duplicate(_)));
    assert_eq!(rejected.into_record(), Room { id: 1, visits: 2 });
    assert_eq!(tree.find(&Room { id: 1, visits: 0 }), Some(&Room { id: 1, visits: 1 }));
}

#[test]
fn printer_sees_ascending_records() {
    let printed = Rc::new(RefCell::new(String::new()));
    let sink = Rc::clone(&printed);
    let mut tree = Tree::new(
        |a: &Room, b: &Room| a.id.cmp(&b.id),
        move |room: &Room| sink.borrow_mut().push_str(&format!("{} ", room.id)),
    );
    for id in [30, 10, 20, 50, 40] {
        tree.insert(Room { id, visits: 0 }).unwrap();
    }

    tree.print_in_order();
    assert_eq!(*printed.borrow(), "10 20 30 40 50 ");

    // Printing doesn't change anything.
    tree.print_in_order();
    assert_eq!(tree.len(), 5);
    assert_eq!(printed.borrow().len(), 30);
}
