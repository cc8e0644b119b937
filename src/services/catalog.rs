//! Catalog management service

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookListing, CreateBook, ObjectId, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create a new book. The ISBN must not be in use.
    pub async fn create_book(&self, request: CreateBook) -> AppResult<Book> {
        if self
            .repository
            .books
            .find_by_isbn(&request.isbn)
            .await?
            .is_some()
        {
            return Err(AppError::duplicate_isbn(&request.isbn));
        }

        let book = Book::new(request);
        self.repository.books.insert(&book).await?;

        tracing::info!(book_id = %book.id, isbn = %book.isbn, copies = book.copies, "book created");
        Ok(book)
    }

    /// List books with filter, sort and limit
    pub async fn list_books(&self, listing: &BookListing) -> AppResult<Vec<Book>> {
        self.repository.books.list(listing).await
    }

    /// Most recently added books that can be borrowed
    pub async fn featured_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list(&BookListing::featured()).await
    }

    pub async fn get_book(&self, id: &ObjectId) -> AppResult<Book> {
        self.repository
            .books
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::book_not_found("bookId", id))
    }

    /// Update an existing book
    pub async fn update_book(&self, id: &ObjectId, update: UpdateBook) -> AppResult<Book> {
        // Check for duplicate ISBN
        if let Some(ref isbn) = update.isbn {
            if let Some(other) = self.repository.books.find_by_isbn(isbn).await? {
                if &other.id != id {
                    return Err(AppError::duplicate_isbn(isbn));
                }
            }
        }

        let updated = self
            .repository
            .books
            .update(id, update)
            .await?
            .ok_or_else(|| AppError::book_not_found("bookId", id))?;

        tracing::info!(book_id = %updated.id, copies = updated.copies, available = updated.available, "book updated");
        Ok(updated)
    }

    /// Delete a book. Its borrow records are left in place.
    pub async fn delete_book(&self, id: &ObjectId) -> AppResult<()> {
        let deleted = self
            .repository
            .books
            .delete(id)
            .await?
            .ok_or_else(|| AppError::book_not_found("bookId", id))?;

        tracing::info!(book_id = %deleted.id, isbn = %deleted.isbn, "book deleted");
        Ok(())
    }

    /// Check database connectivity
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.books.ping().await
    }
}
