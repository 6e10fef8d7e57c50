/// Position of a node inside the arena of a [`List`].
pub(crate) type Index = usize;

/// Optional index of a neighbour node.
pub(crate) type Link = Option<Index>;

pub(crate) struct Node<T> {
    /// Index of the next node of the list
    pub next: Link,
    /// Index of the previous node of the list
    pub prev: Link,
    /// Element of the node
    pub data: T,
}

/// Doubly linked list whose nodes live in a contiguous arena.
///
/// Links between nodes are plain indices into `nodes`, so a node is owned by
/// exactly one slot and `next`/`prev` carry no ownership at all. Removing a node
/// vacates its slot and the slot is recycled by the next insertion.
///
/// ```text
///  nodes: [ Some(A) | None | Some(C) | Some(B) ]      vacant: [1]
///
///  head = 0 ---> A(next: 3) ---> B(next: 2) ---> C(next: None) <--- tail = 2
/// ```
///
/// An [`Index`] stays valid until the node it points to is removed.
pub(crate) struct List<T> {
    nodes: Vec<Option<Node<T>>>,
    vacant: Vec<Index>,
    head: Link,
    tail: Link,
    len: usize,
}

pub(crate) struct Iter<'a, T> {
    list: &'a List<T>,
    current: Link,
    remaining: usize,
}

impl<T> List<T> {
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            vacant: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn next(&self, index: Index) -> Link {
        self.node(index).next
    }

    #[inline]
    pub fn prev(&self, index: Index) -> Link {
        self.node(index).prev
    }

    #[inline]
    pub fn get(&self, index: Index) -> &T {
        &self.node(index).data
    }

    #[inline]
    pub fn get_mut(&mut self, index: Index) -> &mut T {
        &mut self.node_mut(index).data
    }

    /// Appends `data` at the tail of the list and returns its index.
    pub fn push_back(&mut self, data: T) -> Index {
        let index = self.claim(Node {
            next: None,
            prev: self.tail,
            data,
        });

        match self.tail {
            Some(tail) => self.node_mut(tail).next = Some(index),
            None => self.head = Some(index),
        }

        self.tail = Some(index);
        self.len += 1;

        index
    }

    /// Links `data` right after the node at `at` and returns its index.
    pub fn insert_after(&mut self, at: Index, data: T) -> Index {
        let next = self.node(at).next;
        let index = self.claim(Node {
            next,
            prev: Some(at),
            data,
        });

        self.node_mut(at).next = Some(index);
        match next {
            Some(next) => self.node_mut(next).prev = Some(index),
            None => self.tail = Some(index),
        }

        self.len += 1;

        index
    }

    /// Unlinks the node at `index`, vacates its slot and hands back its data.
    pub fn remove(&mut self, index: Index) -> T {
        let node = self.nodes[index]
            .take()
            .expect("removing a node that is not in the list");

        match node.prev {
            Some(prev) => self.node_mut(prev).next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => self.node_mut(next).prev = node.prev,
            None => self.tail = node.prev,
        }

        self.vacant.push(index);
        self.len -= 1;

        node.data
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            current: self.head,
            remaining: self.len,
        }
    }

    fn claim(&mut self, node: Node<T>) -> Index {
        match self.vacant.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                index
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn node(&self, index: Index) -> &Node<T> {
        self.nodes[index]
            .as_ref()
            .expect("stale list index")
    }

    fn node_mut(&mut self, index: Index) -> &mut Node<T> {
        self.nodes[index]
            .as_mut()
            .expect("stale list index")
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Index, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.current?;
        let node = self.list.node(index);

        self.current = node.next;
        self.remaining -= 1;

        Some((index, &node.data))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = (Index, &'a T);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
