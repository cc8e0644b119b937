//! In-memory stores for exercising services and handlers without a database

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{BookStore, BorrowStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BorrowRejection, SortField, SortOrder},
        Book, BookListing, Borrow, BorrowSummary, BorrowedBook, CreateBorrow, ObjectId,
        UpdateBook,
    },
};

#[derive(Default)]
struct State {
    books: Vec<Book>,
    borrows: Vec<Borrow>,
}

/// Books and borrows behind one lock, so a borrow is atomic here too
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn borrows(&self) -> Vec<Borrow> {
        self.state.lock().await.borrows.clone()
    }
}

fn compare(a: &Book, b: &Book, field: SortField) -> Ordering {
    let ordering = match field {
        SortField::Title => a.title.cmp(&b.title),
        SortField::Author => a.author.cmp(&b.author),
        SortField::Genre => a.genre.as_str().cmp(b.genre.as_str()),
        SortField::Isbn => a.isbn.cmp(&b.isbn),
        SortField::Copies => a.copies.cmp(&b.copies),
        SortField::Available => a.available.cmp(&b.available),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    };
    ordering.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn insert(&self, book: &Book) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.books.iter().any(|b| b.isbn == book.isbn) {
            return Err(AppError::duplicate_isbn(&book.isbn));
        }
        state.books.push(book.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<Book>> {
        let state = self.state.lock().await;
        Ok(state.books.iter().find(|b| &b.id == id).cloned())
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let state = self.state.lock().await;
        Ok(state.books.iter().find(|b| b.isbn == isbn).cloned())
    }

    async fn list(&self, listing: &BookListing) -> AppResult<Vec<Book>> {
        let state = self.state.lock().await;
        let mut books: Vec<Book> = state
            .books
            .iter()
            .filter(|b| {
                listing
                    .genre
                    .as_deref()
                    .map_or(true, |genre| b.genre.as_str() == genre)
            })
            .filter(|b| !listing.only_available || b.available)
            .cloned()
            .collect();

        books.sort_by(|a, b| {
            let ordering = compare(a, b, listing.sort_by);
            match listing.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
        books.truncate(listing.limit.max(0) as usize);
        Ok(books)
    }

    async fn update(&self, id: &ObjectId, update: UpdateBook) -> AppResult<Option<Book>> {
        let mut state = self.state.lock().await;
        if let Some(ref isbn) = update.isbn {
            if state.books.iter().any(|b| &b.isbn == isbn && &b.id != id) {
                return Err(AppError::duplicate_isbn(isbn));
            }
        }
        Ok(state.books.iter_mut().find(|b| &b.id == id).map(|stored| {
            stored.apply_update(update);
            stored.clone()
        }))
    }

    async fn delete(&self, id: &ObjectId) -> AppResult<Option<Book>> {
        let mut state = self.state.lock().await;
        let position = state.books.iter().position(|b| &b.id == id);
        Ok(position.map(|index| state.books.remove(index)))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl BorrowStore for MemoryStore {
    async fn borrow(&self, request: &CreateBorrow) -> AppResult<Borrow> {
        let mut state = self.state.lock().await;
        let book = state
            .books
            .iter_mut()
            .find(|b| b.id == request.book)
            .ok_or_else(|| AppError::book_not_found("book", &request.book))?;

        book.check_borrow(request.quantity).map_err(|rejection| match rejection {
            BorrowRejection::InsufficientCopies { available } => {
                AppError::insufficient_copies(available, request.quantity)
            }
        })?;
        book.apply_borrow(request.quantity);

        let borrow = Borrow::new(request);
        state.borrows.push(borrow.clone());
        Ok(borrow)
    }

    async fn summary(&self) -> AppResult<Vec<BorrowSummary>> {
        let state = self.state.lock().await;
        let mut totals: BTreeMap<&ObjectId, i64> = BTreeMap::new();
        for borrow in &state.borrows {
            *totals.entry(&borrow.book).or_default() += i64::from(borrow.quantity);
        }

        let mut summary: Vec<BorrowSummary> = totals
            .into_iter()
            .filter_map(|(id, total)| {
                state.books.iter().find(|b| &b.id == id).map(|book| BorrowSummary {
                    book: BorrowedBook {
                        title: book.title.clone(),
                        isbn: book.isbn.clone(),
                    },
                    total_quantity: total,
                })
            })
            .collect();
        summary.sort_by(|a, b| {
            a.book
                .title
                .cmp(&b.book.title)
                .then_with(|| a.book.isbn.cmp(&b.book.isbn))
        });
        Ok(summary)
    }
}
