use std::{cmp::Ordering, ops::Range};

/// Binary min-heap with at most one entry per key. Keys are small integers, and
/// the position of every key in the heap is tracked so that its entry can be
/// updated or removed.
pub(super) struct Heap<T>
where
    T: Copy + PartialOrd,
{
    items: Vec<(T, usize)>,
    positions: Vec<Option<usize>>,
}

fn parent(index: usize) -> Option<usize> {
    if index > 0 {
        Some((index - 1) >> 1)
    } else {
        None
    }
}

fn children(index: usize) -> Range<usize> {
    let off = index << 1;
    (off + 1)..(off + 3)
}

impl<T> Heap<T>
where
    T: Copy + PartialOrd,
{
    pub(super) fn new(nkeys: usize) -> Self {
        Heap {
            items: Vec::new(),
            positions: vec![None; nkeys],
        }
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.items.len()
    }

    fn less(&self, a: usize, b: usize) -> bool {
        matches!(
            self.items[a].0.partial_cmp(&self.items[b].0),
            Some(Ordering::Less)
        )
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.items.swap(a, b);
        self.positions[self.items[a].1] = Some(a);
        self.positions[self.items[b].1] = Some(b);
    }

    fn sift_up(&mut self, mut index: usize) -> usize {
        while let Some(pi) = parent(index) {
            if self.less(index, pi) {
                self.swap(index, pi);
                index = pi;
            } else {
                break;
            }
        }
        index
    }

    fn sift_down(&mut self, mut index: usize) -> usize {
        loop {
            let smallest = children(index)
                .filter(|ci| *ci < self.items.len())
                .fold(index, |best, ci| if self.less(ci, best) { ci } else { best });
            if smallest == index {
                return index;
            }
            self.swap(index, smallest);
            index = smallest;
        }
    }

    /// Insert the entry for `key`, or replace it if it is already queued.
    pub(super) fn set(&mut self, key: usize, val: T) {
        match self.positions[key] {
            Some(pos) => {
                self.items[pos].0 = val;
                let down = self.sift_down(pos);
                if down == pos {
                    self.sift_up(pos);
                }
            }
            None => {
                self.items.push((val, key));
                let last = self.items.len() - 1;
                self.positions[key] = Some(last);
                self.sift_up(last);
            }
        }
    }

    pub(super) fn remove(&mut self, key: usize) {
        let Some(pos) = self.positions[key].take() else {
            return;
        };
        let last = self.items.len() - 1;
        if pos != last {
            self.items.swap(pos, last);
            self.positions[self.items[pos].1] = Some(pos);
        }
        self.items.pop();
        if pos < self.items.len() {
            let down = self.sift_down(pos);
            if down == pos {
                self.sift_up(pos);
            }
        }
    }

    /// Remove and return the smallest entry with its key.
    pub(super) fn pop(&mut self) -> Option<(usize, T)> {
        let (val, key) = *self.items.first()?;
        self.remove(key);
        Some((key, val))
    }
}
