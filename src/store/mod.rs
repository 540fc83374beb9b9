//! The catalog store: persistent mapping of packages and their owned
//! files to a relational backing store.

pub mod catalog;
