//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};

use super::{isbn_conflict, BookStore};
use crate::{
    error::AppResult,
    models::{Book, BookListing, ObjectId, UpdateBook},
};

pub(crate) const BOOK_COLUMNS: &str =
    "id, title, author, genre, isbn, description, copies, available, created_at, updated_at";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn insert(&self, book: &Book) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO books (id, title, author, genre, isbn, description, copies, available, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.genre.as_str())
        .bind(&book.isbn)
        .bind(&book.description)
        .bind(book.copies)
        .bind(book.available)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| isbn_conflict(&book.isbn, e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<Book>> {
        let sql = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let sql = format!("SELECT {} FROM books WHERE isbn = $1", BOOK_COLUMNS);
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn list(&self, listing: &BookListing) -> AppResult<Vec<Book>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM books WHERE TRUE", BOOK_COLUMNS));

        if let Some(ref genre) = listing.genre {
            builder.push(" AND genre = ").push_bind(genre.clone());
        }
        if listing.only_available {
            builder.push(" AND available = TRUE");
        }

        // Column and direction come from closed enums, never from raw input.
        let order = listing.order.keyword();
        builder.push(format!(
            " ORDER BY {} {}, id {}",
            listing.sort_by.column(),
            order,
            order
        ));
        builder.push(" LIMIT ").push_bind(listing.limit);

        let books = builder
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn update(&self, id: &ObjectId, update: UpdateBook) -> AppResult<Option<Book>> {
        let mut tx = self.pool.begin().await?;

        // Lock the row so a borrow cannot commit between the read and the write.
        let sql = format!("SELECT {} FROM books WHERE id = $1 FOR UPDATE", BOOK_COLUMNS);
        let Some(mut book) = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        book.apply_update(update);

        let sql = format!(
            r#"
            UPDATE books
            SET title = $2, author = $3, genre = $4, isbn = $5, description = $6,
                copies = $7, available = $8, updated_at = $9
            WHERE id = $1
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );
        let updated = sqlx::query_as::<_, Book>(&sql)
            .bind(&book.id)
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.genre.as_str())
            .bind(&book.isbn)
            .bind(&book.description)
            .bind(book.copies)
            .bind(book.available)
            .bind(book.updated_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| isbn_conflict(&book.isbn, e))?;

        tx.commit().await?;

        Ok(Some(updated))
    }

    async fn delete(&self, id: &ObjectId) -> AppResult<Option<Book>> {
        let sql = format!("DELETE FROM books WHERE id = $1 RETURNING {}", BOOK_COLUMNS);
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
