//! In-memory document store for one customization run
//!
//! The store holds one ordered list of `(identifier, document)` entries per
//! [`Category`], plus three side lists that bypass structured merging: raw
//! pre-rendered files, unrecognized source identifiers and operator-facing
//! manual instructions.
//!
//! Transforms filter and mutate entries in place; they never reorder the
//! survivors of a category.

use std::collections::BTreeMap;

use crate::category::Category;
use crate::document::{self, Document};
use crate::selector::Selector;

/// One document and the identifier it was loaded or created under.
///
/// The identifier is usually a source file path. It is carried for
/// traceability and output naming only; it is not an identity for merging.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub identifier: String,
    pub document: Document,
}

impl Entry {
    pub fn new(identifier: impl Into<String>, document: Document) -> Self {
        Self {
            identifier: identifier.into(),
            document,
        }
    }
}

/// A raw file written verbatim to the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    pub filename: String,
    pub content: String,
}

/// Categorized documents plus side lists
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    categories: BTreeMap<Category, Vec<Entry>>,
    raw_files: Vec<RawFile>,
    unrecognized: Vec<String>,
    manual_instructions: Vec<String>,
}

impl DocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries of one category, in order
    pub fn category(&self, category: Category) -> &[Entry] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Mutable entries of one category
    pub fn category_mut(&mut self, category: Category) -> &mut Vec<Entry> {
        self.categories.entry(category).or_default()
    }

    /// Mutable documents of one category, in order
    pub fn documents_mut(&mut self, category: Category) -> impl Iterator<Item = &mut Document> {
        self.category_mut(category)
            .iter_mut()
            .map(|entry| &mut entry.document)
    }

    /// Every `(category, entry)` pair in canonical category order
    pub fn entries(&self) -> impl Iterator<Item = (Category, &Entry)> {
        self.categories
            .iter()
            .flat_map(|(category, entries)| entries.iter().map(move |entry| (*category, entry)))
    }

    /// Every categorized document, flattened in canonical category order.
    /// Side lists are not included.
    pub fn all_documents(&self) -> impl Iterator<Item = &Document> {
        self.categories
            .values()
            .flat_map(|entries| entries.iter().map(|entry| &entry.document))
    }

    /// Mutable view of every categorized document
    pub fn all_documents_mut(&mut self) -> impl Iterator<Item = &mut Document> {
        self.categories
            .values_mut()
            .flat_map(|entries| entries.iter_mut().map(|entry| &mut entry.document))
    }

    /// Remove, from every category, each entry whose document satisfies
    /// `predicate`. Survivors keep their relative order. Returns the number
    /// of entries removed.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Document) -> bool,
    {
        let mut removed = 0;
        for entries in self.categories.values_mut() {
            let before = entries.len();
            entries.retain(|entry| !predicate(&entry.document));
            removed += before - entries.len();
        }
        removed
    }

    /// Every categorized document matching `selector`, for in-place mutation
    pub fn select_where(&mut self, selector: &Selector) -> Vec<&mut Document> {
        self.all_documents_mut()
            .filter(|doc| selector.matches(doc))
            .collect()
    }

    /// Append a document to a category without any validation
    pub fn append(&mut self, category: Category, identifier: impl Into<String>, document: Document) {
        self.category_mut(category)
            .push(Entry::new(identifier, document));
    }

    /// Append a document to the category named by its `kind`. Documents with
    /// an unknown or missing kind are recorded as unrecognized instead.
    pub fn insert_classified(&mut self, identifier: impl Into<String>, document: Document) -> Option<Category> {
        let identifier = identifier.into();
        match document::kind(&document).and_then(Category::from_kind) {
            Some(category) => {
                self.append(category, identifier, document);
                Some(category)
            }
            None => {
                self.append_unrecognized(identifier);
                None
            }
        }
    }

    /// Append a pre-rendered file
    pub fn append_raw(&mut self, filename: impl Into<String>, content: impl Into<String>) {
        self.raw_files.push(RawFile {
            filename: filename.into(),
            content: content.into(),
        });
    }

    /// Append an operator-facing instruction
    pub fn append_instruction(&mut self, text: impl Into<String>) {
        self.manual_instructions.push(text.into());
    }

    /// Record an input that could not be classified
    pub fn append_unrecognized(&mut self, identifier: impl Into<String>) {
        self.unrecognized.push(identifier.into());
    }

    pub fn raw_files(&self) -> &[RawFile] {
        &self.raw_files
    }

    pub fn unrecognized(&self) -> &[String] {
        &self.unrecognized
    }

    pub fn manual_instructions(&self) -> &[String] {
        &self.manual_instructions
    }

    /// Number of categorized documents
    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    /// Whether the store holds no categorized documents
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
