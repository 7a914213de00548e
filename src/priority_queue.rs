use std::cmp::Ordering;

/// A key tracked in the top-k set together with its estimated count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    pub key: String,
    pub count: u32,
}

impl Node {
    pub fn new(key: impl Into<String>, count: u32) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// Min-heap order for nodes: lower count first, and among equal counts the
/// lexicographically greater key first, so it is the one evicted.
pub(crate) fn node_order(a: &Node, b: &Node) -> Ordering {
    a.count.cmp(&b.count).then_with(|| b.key.cmp(&a.key))
}

// Binary heap helpers using Eytzinger layout (0-based indexing)
#[inline]
fn parent(i: usize) -> usize {
    (i - 1) >> 1
}

#[inline]
fn left(i: usize) -> usize {
    2 * i + 1
}

/// Moves the element at `pos` towards the root until its parent is not greater.
pub(crate) fn sift_up<T, C>(items: &mut [T], cmp: &C, mut pos: usize)
where
    C: Fn(&T, &T) -> Ordering,
{
    while pos > 0 {
        let parent = parent(pos);
        if cmp(&items[pos], &items[parent]) != Ordering::Less {
            break;
        }
        items.swap(parent, pos);
        pos = parent;
    }
}

/// Moves the element at `start` towards the leaves. Returns whether it moved.
pub(crate) fn sift_down<T, C>(items: &mut [T], cmp: &C, start: usize) -> bool
where
    C: Fn(&T, &T) -> Ordering,
{
    let len = items.len();
    let mut pos = start;
    loop {
        let left = left(pos);
        if left >= len {
            break;
        }
        let right = left + 1;
        let mut smallest = left;
        if right < len && cmp(&items[right], &items[left]) == Ordering::Less {
            smallest = right;
        }
        if cmp(&items[smallest], &items[pos]) != Ordering::Less {
            break;
        }
        items.swap(pos, smallest);
        pos = smallest;
    }
    pos > start
}

/// Array-backed binary min-heap that never grows past its capacity.
pub(crate) struct BoundedMinHeap<T, C> {
    items: Vec<T>,
    capacity: usize,
    cmp: C,
}

impl<T, C> BoundedMinHeap<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    pub(crate) fn with_capacity(capacity: usize, cmp: C) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            cmp,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub(crate) fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Appends and sifts up. The caller makes room first.
    pub(crate) fn push(&mut self, item: T) {
        assert!(
            !self.is_full(),
            "BoundedMinHeap: push on full heap (capacity {})",
            self.capacity
        );
        self.items.push(item);
        let last = self.items.len() - 1;
        sift_up(&mut self.items, &self.cmp, last);
    }

    /// Removes and returns the minimum element.
    ///
    /// # Panics
    ///
    /// Panics if the heap is empty.
    pub(crate) fn pop(&mut self) -> T {
        if self.items.is_empty() {
            panic!("BoundedMinHeap: pop on empty heap");
        }
        let root = self.items.swap_remove(0);
        sift_down(&mut self.items, &self.cmp, 0);
        root
    }

    /// Updates the element at `index` in place, then repairs the heap.
    ///
    /// A single change can only break the order in one direction, so sift-up
    /// runs only when sift-down left the element where it was.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub(crate) fn fix<F>(&mut self, index: usize, update: F)
    where
        F: FnOnce(&mut T),
    {
        assert!(
            index < self.items.len(),
            "BoundedMinHeap: index {} is out of bounds [0, {})",
            index,
            self.items.len()
        );
        update(&mut self.items[index]);
        if !sift_down(&mut self.items, &self.cmp, index) {
            sift_up(&mut self.items, &self.cmp, index);
        }
    }

    /// Copy of the contents, greatest first. The heap itself is untouched.
    pub(crate) fn sorted(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut items = self.items.clone();
        items.sort_by(|a, b| (self.cmp)(b, a));
        items
    }

    #[cfg(test)]
    pub(crate) fn is_heap(&self) -> bool {
        (1..self.items.len())
            .all(|i| (self.cmp)(&self.items[parent(i)], &self.items[i]) != Ordering::Greater)
    }
}

pub(crate) type NodeOrder = fn(&Node, &Node) -> Ordering;

/// The heap holding the current top-k candidates.
pub(crate) type TopKHeap = BoundedMinHeap<Node, NodeOrder>;

impl BoundedMinHeap<Node, NodeOrder> {
    pub(crate) fn new(k: usize) -> Self {
        Self::with_capacity(k, node_order as NodeOrder)
    }

    /// Offers a node to the heap.
    ///
    /// When full, the node only gets in if its count beats the current
    /// minimum, and the evicted root is returned.
    pub(crate) fn add(&mut self, node: Node) -> Option<Node> {
        if !self.is_full() {
            self.push(node);
            return None;
        }
        if node.count > self.min_count() {
            let expelled = self.pop();
            self.push(node);
            return Some(expelled);
        }
        None
    }

    /// Count of the root, or 0 when empty.
    pub(crate) fn min_count(&self) -> u32 {
        self.peek().map(|node| node.count).unwrap_or(0)
    }

    pub(crate) fn find(&self, key: &str) -> Option<usize> {
        self.iter().position(|node| node.key == key)
    }

    /// Divides every count by `factor` without re-sifting.
    pub(crate) fn fade(&mut self, factor: u32) {
        for node in self.items.iter_mut() {
            node.count /= factor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(k: usize) -> TopKHeap {
        let mut heap = TopKHeap::new(k);
        for i in 0..k {
            heap.add(Node::new(i.to_string(), i as u32));
        }
        heap
    }

    fn counts(nodes: &[Node]) -> Vec<u32> {
        nodes.iter().map(|node| node.count).collect()
    }

    #[test]
    fn test_basic_insertion() {
        let mut heap = TopKHeap::new(2);
        assert!(heap.add(Node::new("a", 1)).is_none());
        assert!(heap.add(Node::new("b", 2)).is_none());

        assert_eq!(heap.sorted(), vec![Node::new("b", 2), Node::new("a", 1)]);
        assert_eq!(heap.min_count(), 1);
    }

    #[test]
    fn test_sliding_minimum() {
        let (k, last) = (3, 100);
        let mut heap = filled(k);

        for i in k..=last {
            heap.add(Node::new(i.to_string(), i as u32));
            assert_eq!(heap.min_count(), (i - 2) as u32);
            assert_eq!(heap.len(), k);
        }

        for i in (1..=k).rev() {
            assert_eq!(heap.pop().count, (last - i + 1) as u32);
        }
        assert!(heap.is_empty());
    }

    #[test]
    fn test_add_when_full_requires_strictly_greater_count() {
        let mut heap = TopKHeap::new(2);
        heap.add(Node::new("a", 3));
        heap.add(Node::new("b", 5));

        assert!(heap.add(Node::new("c", 3)).is_none());
        assert!(heap.add(Node::new("d", 1)).is_none());
        assert!(heap.find("c").is_none());

        let expelled = heap.add(Node::new("e", 4));
        assert_eq!(expelled, Some(Node::new("a", 3)));
        assert_eq!(heap.sorted(), vec![Node::new("b", 5), Node::new("e", 4)]);
    }

    #[test]
    fn test_equal_counts_evict_greater_key_first() {
        let mut heap = TopKHeap::new(3);
        heap.add(Node::new("0", 1));
        heap.add(Node::new("2", 1));
        heap.add(Node::new("1", 1));

        assert_eq!(heap.peek().map(|n| n.key.as_str()), Some("2"));
        assert_eq!(heap.add(Node::new("3", 5)), Some(Node::new("2", 1)));
        assert_eq!(
            heap.sorted(),
            vec![Node::new("3", 5), Node::new("0", 1), Node::new("1", 1)]
        );
    }

    #[test]
    fn test_fix_moves_node_both_ways() {
        let mut heap = TopKHeap::new(5);
        for (key, count) in [("a", 10), ("b", 20), ("c", 30), ("d", 40), ("e", 50)] {
            heap.add(Node::new(key, count));
        }

        let idx = heap.find("a").unwrap();
        heap.fix(idx, |node| node.count = 45);
        assert!(heap.is_heap());
        assert_eq!(heap.min_count(), 20);

        let idx = heap.find("e").unwrap();
        heap.fix(idx, |node| node.count = 5);
        assert!(heap.is_heap());
        assert_eq!(heap.peek(), Some(&Node::new("e", 5)));
    }

    #[test]
    fn test_repeated_updates() {
        let mut heap = TopKHeap::new(2);
        heap.add(Node::new("a", 1));
        for i in 2..100 {
            let idx = heap.find("a").unwrap();
            heap.fix(idx, |node| node.count = i);
        }
        heap.add(Node::new("b", 50));

        assert_eq!(heap.len(), 2);
        assert_eq!(counts(&heap.sorted()), vec![99, 50]);
    }

    #[test]
    fn test_capacity_overflow() {
        let mut heap = TopKHeap::new(2);
        for (key, count) in [("a", 1), ("b", 2), ("c", 3), ("d", 4), ("e", 5)] {
            heap.add(Node::new(key, count));
        }

        assert_eq!(heap.len(), 2, "heap should maintain capacity");
        assert_eq!(heap.sorted(), vec![Node::new("e", 5), Node::new("d", 4)]);
    }

    #[test]
    fn test_heap_property() {
        let mut heap = TopKHeap::new(10);
        for i in (0..=30u32).rev() {
            heap.add(Node::new(format!("item{}", i % 7), i / 3));
            assert!(heap.is_heap(), "heap property violated after adding {}", i);
            assert!(heap.len() <= 10);
        }

        let sorted = heap.sorted();
        for pair in sorted.windows(2) {
            assert!(
                pair[0].count >= pair[1].count,
                "not ordered by count: {:?} before {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_sorted_does_not_mutate() {
        let heap = filled(4);
        let before: Vec<_> = heap.iter().cloned().collect();
        let _ = heap.sorted();
        let after: Vec<_> = heap.iter().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_fade_divides_counts() {
        let mut heap = TopKHeap::new(3);
        heap.add(Node::new("a", 7));
        heap.add(Node::new("b", 20));
        heap.add(Node::new("c", 1));

        heap.fade(2);

        assert_eq!(
            heap.sorted(),
            vec![Node::new("b", 10), Node::new("a", 3), Node::new("c", 0)]
        );
    }

    #[test]
    fn test_generic_heap_with_custom_comparator() {
        let mut heap = BoundedMinHeap::with_capacity(4, |a: &i64, b: &i64| b.cmp(a));
        for v in [3, -1, 8, 5] {
            heap.push(v);
        }
        assert_eq!(heap.peek(), Some(&8));
        assert_eq!(heap.sorted(), vec![-1, 3, 5, 8]);
        assert_eq!(heap.pop(), 8);
        assert_eq!(heap.pop(), 5);
        assert_eq!(heap.get(0), Some(&3));
    }

    #[test]
    #[should_panic(expected = "pop on empty heap")]
    fn test_pop_empty_panics() {
        let mut heap = TopKHeap::new(3);
        heap.pop();
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_fix_out_of_range_panics() {
        let mut heap = filled(2);
        heap.fix(2, |node| node.count = 1);
    }
}
