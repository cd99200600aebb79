use serde::{Deserialize, Serialize};

/// Two-point line segment anchored to indices of the visible slice.
///
/// Indices are slice-relative, so a segment drifts when the window, zoom or
/// offset changes after it was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub i1: usize,
    pub p1: f64,
    pub i2: usize,
    pub p2: f64,
}

/// First endpoint of an annotation still waiting for its second click
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingPoint {
    pub index: usize,
    pub price: f64,
}

impl PendingPoint {
    pub fn complete(self, index: usize, price: f64) -> Annotation {
        Annotation { i1: self.index, p1: self.price, i2: index, p2: price }
    }
}

/// Ordered, append-only list of annotations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationStore {
    items: Vec<Annotation>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, annotation: Annotation) {
        self.items.push(annotation);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[Annotation] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
