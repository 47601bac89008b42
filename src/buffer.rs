use std::collections::VecDeque;

use crate::error::BufferError;

/// Bounded FIFO of items awaiting dispatch.
#[derive(Clone, Debug)]
pub struct ArrivalBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> ArrivalBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            capacity,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    pub fn enqueue(&mut self, item: T) -> Result<(), BufferError> {
        if self.items.len() >= self.capacity {
            return Err(BufferError::Full {
                capacity: self.capacity,
            });
        }
        self.items.push_back(item);
        Ok(())
    }

    pub fn dequeue(&mut self) -> Result<T, BufferError> {
        self.items.pop_front().ok_or(BufferError::Empty)
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Front-to-back view, without draining.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dequeues_in_arrival_order() {
        let mut buffer = ArrivalBuffer::unbounded();
        for id in ["p1", "p2", "p3"] {
            buffer.enqueue(id).unwrap();
        }
        assert_eq!(buffer.size(), 3);
        assert_eq!(buffer.dequeue().unwrap(), "p1");
        assert_eq!(buffer.dequeue().unwrap(), "p2");
        assert_eq!(buffer.peek(), Some(&"p3"));
    }

    #[test]
    fn rejects_enqueue_at_capacity() {
        let mut buffer = ArrivalBuffer::new(2);
        buffer.enqueue(1).unwrap();
        buffer.enqueue(2).unwrap();
        assert_eq!(buffer.enqueue(3), Err(BufferError::Full { capacity: 2 }));
        assert_eq!(buffer.size(), 2);
    }

    #[test]
    fn dequeue_on_empty_fails() {
        let mut buffer: ArrivalBuffer<u32> = ArrivalBuffer::new(1);
        assert!(buffer.is_empty());
        assert_eq!(buffer.dequeue(), Err(BufferError::Empty));
    }
}
