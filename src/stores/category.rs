//! Defines the category store trait.

use crate::{
    Error,
    models::{Category, CategoryId, CategoryName},
};

/// Handles the creation, retrieval, and deletion of expense categories.
pub trait CategoryStore {
    /// Create a new category and add it to the store.
    fn create(&mut self, name: CategoryName) -> Result<Category, Error>;

    /// Get a category by its ID.
    fn get(&self, category_id: CategoryId) -> Result<Category, Error>;

    /// Get all categories in the store, ordered by name.
    fn get_all(&self) -> Result<Vec<Category>, Error>;

    /// Remove a category from the store.
    ///
    /// Implementers must refuse to remove a category that expenses are still
    /// tagged with.
    fn delete(&mut self, category_id: CategoryId) -> Result<(), Error>;
}
