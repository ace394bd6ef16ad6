/// Linear undo/redo history. Pushing after stepping back drops the redo tail.
#[derive(Debug, Clone)]
pub struct CanvasHistory<T> {
    records: Vec<T>,
    index: usize,
}

impl<T> Default for CanvasHistory<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            index: 0,
        }
    }
}

impl<T> CanvasHistory<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn current(&self) -> Option<&T> {
        self.records.get(self.index)
    }

    pub fn can_go_prev(&self) -> bool {
        self.index > 0
    }

    pub fn can_go_next(&self) -> bool {
        self.index + 1 < self.records.len()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.index = 0;
    }

    pub fn push(&mut self, record: T) {
        if !self.records.is_empty() {
            self.records.truncate(self.index + 1);
        }
        self.records.push(record);
        self.index = self.records.len() - 1;
    }

    pub fn go_prev(&mut self) -> Option<&T> {
        if !self.can_go_prev() {
            return None;
        }
        self.index -= 1;
        self.records.get(self.index)
    }

    pub fn go_next(&mut self) -> Option<&T> {
        if !self.can_go_next() {
            return None;
        }
        self.index += 1;
        self.records.get(self.index)
    }
}
