//! Defines the person store trait.

use crate::{
    Error,
    models::{Person, PersonId, PersonName},
};

/// Handles the creation, retrieval, and deletion of people.
pub trait PersonStore {
    /// Create a new person and add them to the store.
    fn create(&mut self, name: PersonName) -> Result<Person, Error>;

    /// Get a person by their ID.
    fn get(&self, person_id: PersonId) -> Result<Person, Error>;

    /// Get all people in the store, ordered by name.
    fn get_all(&self) -> Result<Vec<Person>, Error>;

    /// Remove a person from the store.
    ///
    /// Implementers must refuse to remove a person that still owns expenses.
    fn delete(&mut self, person_id: PersonId) -> Result<(), Error>;
}
