//! Borrowing service

use crate::{
    error::{AppError, AppResult},
    models::{Borrow, BorrowSummary, CreateBorrow},
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowsService {
    repository: Repository,
}

impl BorrowsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Borrow copies of a book
    pub async fn borrow_book(&self, request: CreateBorrow) -> AppResult<Borrow> {
        match self.repository.borrows.borrow(&request).await {
            Ok(borrow) => {
                tracing::info!(
                    borrow_id = %borrow.id,
                    book_id = %borrow.book,
                    quantity = borrow.quantity,
                    due_date = %borrow.due_date,
                    "book borrowed"
                );
                Ok(borrow)
            }
            Err(err @ AppError::BadRequest(_)) | Err(err @ AppError::NotFound(_)) => {
                tracing::warn!(book_id = %request.book, quantity = request.quantity, "borrow rejected: {}", err);
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Total borrowed quantity per book
    pub async fn summary(&self) -> AppResult<Vec<BorrowSummary>> {
        self.repository.borrows.summary().await
    }
}
