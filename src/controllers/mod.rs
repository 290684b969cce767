//! The CRUD workflow engine: one module per entity kind, each carrying
//! the same four workflow shapes (create, read, update, delete) over the
//! store, the form pipeline, and the integrity guard.

pub mod authors;
pub mod books;
pub mod genres;
pub mod instances;
