//! Book model, request schemas and the copies/availability lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};
use validator::ValidationErrors;

use super::object_id::ObjectId;
use crate::validation::{Payload, Presence};

/// Book genre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Genre {
    Fiction,
    NonFiction,
    Science,
    History,
    Biography,
    Fantasy,
}

impl Genre {
    pub const ALL: [Genre; 6] = [
        Genre::Fiction,
        Genre::NonFiction,
        Genre::Science,
        Genre::History,
        Genre::Biography,
        Genre::Fantasy,
    ];

    pub const LITERALS: [&'static str; 6] = [
        "FICTION",
        "NON_FICTION",
        "SCIENCE",
        "HISTORY",
        "BIOGRAPHY",
        "FANTASY",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Fiction => "FICTION",
            Genre::NonFiction => "NON_FICTION",
            Genre::Science => "SCIENCE",
            Genre::History => "HISTORY",
            Genre::Biography => "BIOGRAPHY",
            Genre::Fantasy => "FANTASY",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown genre: {0}")]
pub struct GenreParseError(pub String);

impl TryFrom<&str> for Genre {
    type Error = GenreParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Genre::ALL
            .into_iter()
            .find(|genre| genre.as_str() == value)
            .ok_or_else(|| GenreParseError(value.to_string()))
    }
}

impl TryFrom<String> for Genre {
    type Error = GenreParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Genre::try_from(value.as_str())
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored book record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    #[schema(value_type = String, example = "64b7f0c2a1e4d3f2b1c0a9e8")]
    pub id: ObjectId,
    pub title: String,
    pub author: String,
    #[sqlx(try_from = "String")]
    pub genre: Genre,
    pub isbn: String,
    pub description: String,
    pub copies: i32,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Why a borrow cannot be served from a book's stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BorrowRejection {
    #[error("Only {available} copies available")]
    InsufficientCopies { available: i32 },
}

impl Book {
    /// Build a new record from a validated creation request
    pub fn new(request: CreateBook) -> Self {
        let now = Utc::now();
        let mut book = Self {
            id: ObjectId::generate(),
            title: request.title,
            author: request.author,
            genre: request.genre,
            isbn: request.isbn,
            description: request.description,
            copies: request.copies,
            available: request.available,
            created_at: now,
            updated_at: now,
        };
        book.normalize_availability();
        book
    }

    /// A book with no copies left is never available.
    pub fn normalize_availability(&mut self) {
        if self.copies <= 0 {
            self.copies = 0;
            self.available = false;
        }
    }

    /// Check that `quantity` copies can be lent out.
    pub fn check_borrow(&self, quantity: i32) -> Result<(), BorrowRejection> {
        if quantity > self.copies {
            return Err(BorrowRejection::InsufficientCopies {
                available: self.copies,
            });
        }
        Ok(())
    }

    /// Take `quantity` copies out of stock. Callers run [`Book::check_borrow`] first.
    pub fn apply_borrow(&mut self, quantity: i32) {
        self.copies -= quantity;
        if self.copies <= 0 {
            self.copies = 0;
            self.available = false;
        }
        self.updated_at = Utc::now();
    }

    /// Apply an allow-listed partial update.
    pub fn apply_update(&mut self, update: UpdateBook) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(author) = update.author {
            self.author = author;
        }
        if let Some(genre) = update.genre {
            self.genre = genre;
        }
        if let Some(isbn) = update.isbn {
            self.isbn = isbn;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(copies) = update.copies {
            self.copies = copies;
        }
        if let Some(available) = update.available {
            self.available = available;
        }
        self.normalize_availability();
        self.updated_at = Utc::now();
    }
}

/// Validated book creation request
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct CreateBook {
    #[schema(example = "Dune")]
    pub title: String,
    #[schema(example = "Frank Herbert")]
    pub author: String,
    pub genre: Genre,
    #[schema(example = "9780441172719")]
    pub isbn: String,
    #[serde(default)]
    pub description: String,
    #[schema(minimum = 0)]
    pub copies: i32,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl CreateBook {
    pub fn from_payload(body: &Value) -> Result<Self, ValidationErrors> {
        let mut payload = Payload::new(body)?;
        let title = payload.text("title", "Title", Presence::Required);
        let author = payload.text("author", "Author", Presence::Required);
        let genre = payload.one_of::<Genre>("genre", "Genre", Presence::Required, &Genre::LITERALS);
        let isbn = payload.text("isbn", "ISBN", Presence::Required);
        let description = payload.free_text("description", "Description");
        let copies = payload.integer(
            "copies",
            "Copies",
            Presence::Required,
            0,
            "Copies must be a non-negative number",
        );
        let available = payload.boolean("available", "Available");

        let errors = payload.into_errors();
        match (title, author, genre, isbn, copies) {
            (Some(title), Some(author), Some(genre), Some(isbn), Some(copies)) if errors.is_empty() => {
                Ok(Self {
                    title,
                    author,
                    genre,
                    isbn,
                    description: description.unwrap_or_default(),
                    copies,
                    available: available.unwrap_or(true),
                })
            }
            _ => Err(errors),
        }
    }
}

/// Validated partial update. Only these fields can change.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<Genre>,
    pub isbn: Option<String>,
    pub description: Option<String>,
    #[schema(minimum = 0)]
    pub copies: Option<i32>,
    pub available: Option<bool>,
}

impl UpdateBook {
    pub fn from_payload(body: &Value) -> Result<Self, ValidationErrors> {
        let mut payload = Payload::new(body)?;
        let update = Self {
            title: payload.text("title", "Title", Presence::Optional),
            author: payload.text("author", "Author", Presence::Optional),
            genre: payload.one_of::<Genre>("genre", "Genre", Presence::Optional, &Genre::LITERALS),
            isbn: payload.text("isbn", "ISBN", Presence::Optional),
            description: payload.free_text("description", "Description"),
            copies: payload.integer(
                "copies",
                "Copies",
                Presence::Optional,
                0,
                "Copies must be a non-negative number",
            ),
            available: payload.boolean("available", "Available"),
        };

        let errors = payload.into_errors();
        if errors.is_empty() {
            Ok(update)
        } else {
            Err(errors)
        }
    }
}

/// Raw list query parameters. Kept as text so bad values fall back to defaults
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Genre to filter on
    pub filter: Option<String>,
    /// Field to sort by (default: createdAt)
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default: desc)
    pub sort: Option<String>,
    /// Maximum number of results (default: 10, at most 100)
    pub limit: Option<String>,
}

impl BookQuery {
    /// Collect raw query pairs. The first occurrence of a key wins and
    /// unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "filter" => &mut query.filter,
                "sortBy" => &mut query.sort_by,
                "sort" => &mut query.sort,
                "limit" => &mut query.limit,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }
}

/// Sortable book columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Author,
    Genre,
    Isbn,
    Copies,
    Available,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn from_param(param: &str) -> Self {
        match param {
            "title" => SortField::Title,
            "author" => SortField::Author,
            "genre" => SortField::Genre,
            "isbn" => SortField::Isbn,
            "copies" => SortField::Copies,
            "available" => SortField::Available,
            "updatedAt" => SortField::UpdatedAt,
            _ => SortField::CreatedAt,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Author => "author",
            SortField::Genre => "genre",
            SortField::Isbn => "isbn",
            SortField::Copies => "copies",
            SortField::Available => "available",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

pub const DEFAULT_LIST_LIMIT: i64 = 10;
pub const MAX_LIST_LIMIT: i64 = 100;
pub const FEATURED_LIMIT: i64 = 6;

/// Normalized listing criteria
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookListing {
    pub genre: Option<String>,
    pub only_available: bool,
    pub sort_by: SortField,
    pub order: SortOrder,
    pub limit: i64,
}

impl BookListing {
    /// Most recent available books first
    pub fn featured() -> Self {
        Self {
            genre: None,
            only_available: true,
            sort_by: SortField::CreatedAt,
            order: SortOrder::Desc,
            limit: FEATURED_LIMIT,
        }
    }
}

impl From<&BookQuery> for BookListing {
    fn from(query: &BookQuery) -> Self {
        let limit = query
            .limit
            .as_deref()
            .and_then(|limit| limit.trim().parse::<i64>().ok())
            .filter(|limit| *limit > 0)
            .map(|limit| limit.min(MAX_LIST_LIMIT))
            .unwrap_or(DEFAULT_LIST_LIMIT);

        Self {
            genre: query.filter.clone().filter(|genre| !genre.is_empty()),
            only_available: false,
            sort_by: query
                .sort_by
                .as_deref()
                .map(SortField::from_param)
                .unwrap_or(SortField::CreatedAt),
            order: match query.sort.as_deref() {
                Some("asc") => SortOrder::Asc,
                _ => SortOrder::Desc,
            },
            limit,
        }
    }
}
