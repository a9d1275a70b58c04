//! jotpad-core - Core library for Jotpad
//!
//! This crate contains the note model, the remote store boundary, and the
//! client state shared by the Jotpad interfaces.

pub mod adapter;
pub mod config;
pub mod controller;
pub mod editor;
pub mod error;
pub mod format;
pub mod layout;
pub mod models;
pub mod store;
pub mod util;

pub use controller::{NoteController, NotesView};
pub use error::{Error, Result};
pub use models::{Note, NoteEdit, NoteId};
