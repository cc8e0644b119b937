//! Borrows repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use super::{books::BOOK_COLUMNS, BorrowStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::BorrowRejection, Book, Borrow, BorrowSummary, BorrowedBook, CreateBorrow,
    },
};

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BorrowStore for BorrowsRepository {
    async fn borrow(&self, request: &CreateBorrow) -> AppResult<Borrow> {
        let mut tx = self.pool.begin().await?;

        // Lock the book row so concurrent borrows see each other's decrement.
        let sql = format!("SELECT {} FROM books WHERE id = $1 FOR UPDATE", BOOK_COLUMNS);
        let mut book = sqlx::query_as::<_, Book>(&sql)
            .bind(&request.book)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::book_not_found("book", &request.book))?;

        book.check_borrow(request.quantity).map_err(|rejection| match rejection {
            BorrowRejection::InsufficientCopies { available } => {
                AppError::insufficient_copies(available, request.quantity)
            }
        })?;
        book.apply_borrow(request.quantity);

        sqlx::query("UPDATE books SET copies = $2, available = $3, updated_at = $4 WHERE id = $1")
            .bind(&book.id)
            .bind(book.copies)
            .bind(book.available)
            .bind(book.updated_at)
            .execute(&mut *tx)
            .await?;

        let borrow = Borrow::new(request);
        let saved = sqlx::query_as::<_, Borrow>(
            r#"
            INSERT INTO borrows (id, book_id, quantity, due_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, book_id, quantity, due_date, created_at, updated_at
            "#,
        )
        .bind(&borrow.id)
        .bind(&borrow.book)
        .bind(borrow.quantity)
        .bind(borrow.due_date)
        .bind(borrow.created_at)
        .bind(borrow.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(saved)
    }

    async fn summary(&self) -> AppResult<Vec<BorrowSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT b.title, b.isbn, SUM(br.quantity)::BIGINT AS total_quantity
            FROM borrows br
            JOIN books b ON b.id = br.book_id
            GROUP BY b.id, b.title, b.isbn
            ORDER BY b.title, b.isbn
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let summary = rows
            .into_iter()
            .map(|row| BorrowSummary {
                book: BorrowedBook {
                    title: row.get("title"),
                    isbn: row.get("isbn"),
                },
                total_quantity: row.get("total_quantity"),
            })
            .collect();

        Ok(summary)
    }
}
