//! Data models for the library server

pub mod book;
pub mod borrow;
pub mod object_id;

// Re-export commonly used types
pub use book::{Book, BookListing, BookQuery, CreateBook, Genre, UpdateBook};
pub use borrow::{Borrow, BorrowSummary, BorrowedBook, CreateBorrow};
pub use object_id::ObjectId;
