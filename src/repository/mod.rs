//! Repository layer for database operations

pub mod books;
pub mod borrows;
#[cfg(test)]
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookListing, Borrow, BorrowSummary, CreateBorrow, ObjectId, UpdateBook},
};

/// Book persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Persist a new book. Fails with a duplicate error when the ISBN is taken.
    async fn insert(&self, book: &Book) -> AppResult<()>;

    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<Book>>;

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>>;

    async fn list(&self, listing: &BookListing) -> AppResult<Vec<Book>>;

    /// Apply a partial update to the current stored row as one unit of work,
    /// so a concurrent borrow is never overwritten. Returns `None` if the
    /// book does not exist.
    async fn update(&self, id: &ObjectId, update: UpdateBook) -> AppResult<Option<Book>>;

    /// Remove a book, returning it if it existed. Borrow records are kept.
    async fn delete(&self, id: &ObjectId) -> AppResult<Option<Book>>;

    /// Check that the backing database answers
    async fn ping(&self) -> AppResult<()>;
}

/// Borrow persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BorrowStore: Send + Sync {
    /// Take copies out of the referenced book and record the borrow as one
    /// unit of work. Fails with not-found or insufficient-copies errors
    /// without changing anything.
    async fn borrow(&self, request: &CreateBorrow) -> AppResult<Borrow>;

    /// Total borrowed quantity per book that still exists
    async fn summary(&self) -> AppResult<Vec<BorrowSummary>>;
}

/// Main repository struct holding the stores
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookStore>,
    pub borrows: Arc<dyn BorrowStore>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            borrows: Arc::new(borrows::BorrowsRepository::new(pool)),
        }
    }

    pub fn from_stores(books: Arc<dyn BookStore>, borrows: Arc<dyn BorrowStore>) -> Self {
        Self { books, borrows }
    }
}

/// Map a unique-index violation on `books.isbn` to the duplicate ISBN error.
pub(crate) fn isbn_conflict(isbn: &str, err: sqlx::Error) -> AppError {
    let unique_violation = matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation());
    if unique_violation {
        AppError::duplicate_isbn(isbn)
    } else {
        AppError::Database(err)
    }
}
