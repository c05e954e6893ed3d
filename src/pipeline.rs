//! Sequential, fail-fast application of transforms
//!
//! Transforms run strictly in the order they were added. The first error
//! stops the run and is returned unchanged; later transforms never execute.
//! Nothing is rolled back, so a store that went through a failed run must
//! not be written out.

use log::info;

use crate::error::Result;
use crate::store::DocumentStore;
use crate::transforms::Transform;

/// An ordered list of transforms
#[derive(Default)]
pub struct Pipeline {
    transforms: Vec<Box<dyn Transform>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transform to the end of the pipeline
    pub fn push(&mut self, transform: Box<dyn Transform>) {
        self.transforms.push(transform);
    }

    /// Builder-style [`push`](Self::push)
    pub fn with(mut self, transform: impl Transform + 'static) -> Self {
        self.push(Box::new(transform));
        self
    }

    /// Names of the transforms, in run order
    pub fn names(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Apply every transform in order, stopping at the first failure.
    pub fn run(&self, store: &mut DocumentStore) -> Result<()> {
        let total = self.transforms.len();
        for (idx, transform) in self.transforms.iter().enumerate() {
            info!("[{}/{}] Applying {}", idx + 1, total, transform.name());
            transform.apply(store)?;
        }
        Ok(())
    }
}

impl From<Vec<Box<dyn Transform>>> for Pipeline {
    fn from(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }
}
