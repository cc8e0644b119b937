//! Book catalog API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookListing, BookQuery, CreateBook, UpdateBook},
    validation, AppState,
};

use super::ApiResponse;

/// Create a book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input or duplicate ISBN", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<Value>, AppError>,
) -> AppResult<(StatusCode, Json<ApiResponse<Book>>)> {
    let request = CreateBook::from_payload(&body)?;
    let book = state.services.catalog.create_book(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Book created successfully", book)),
    ))
}

/// List books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Books matching the query", body = Vec<Book>)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    WithRejection(Query(pairs), _): WithRejection<Query<Vec<(String, String)>>, AppError>,
) -> AppResult<Json<ApiResponse<Vec<Book>>>> {
    let query = BookQuery::from_pairs(pairs);
    let books = state
        .services
        .catalog
        .list_books(&BookListing::from(&query))
        .await?;
    Ok(Json(ApiResponse::new("Books retrieved successfully", books)))
}

/// Get a book by ID
#[utoipa::path(
    get,
    path = "/books/{bookId}",
    tag = "books",
    params(("bookId" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 400, description = "Malformed book ID", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    WithRejection(Path(book_id), _): WithRejection<Path<String>, AppError>,
) -> AppResult<Json<ApiResponse<Book>>> {
    let id = validation::path_id("bookId", &book_id)?;
    let book = state.services.catalog.get_book(&id).await?;
    Ok(Json(ApiResponse::new("Book retrieved successfully", book)))
}

/// Update a book
#[utoipa::path(
    put,
    path = "/books/{bookId}",
    tag = "books",
    params(("bookId" = String, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input or duplicate ISBN", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    WithRejection(Path(book_id), _): WithRejection<Path<String>, AppError>,
    WithRejection(Json(body), _): WithRejection<Json<Value>, AppError>,
) -> AppResult<Json<ApiResponse<Book>>> {
    let id = validation::path_id("bookId", &book_id)?;
    let update = UpdateBook::from_payload(&body)?;
    let book = state.services.catalog.update_book(&id, update).await?;
    Ok(Json(ApiResponse::new("Book updated successfully", book)))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{bookId}",
    tag = "books",
    params(("bookId" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted"),
        (status = 400, description = "Malformed book ID", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    WithRejection(Path(book_id), _): WithRejection<Path<String>, AppError>,
) -> AppResult<Json<ApiResponse<()>>> {
    let id = validation::path_id("bookId", &book_id)?;
    state.services.catalog.delete_book(&id).await?;
    Ok(Json(ApiResponse::new("Book deleted successfully", ())))
}

/// Recently added books that can be borrowed
#[utoipa::path(
    get,
    path = "/featured-books",
    tag = "books",
    responses(
        (status = 200, description = "Up to six available books, newest first", body = Vec<Book>)
    )
)]
pub async fn featured_books(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Book>>>> {
    let books = state.services.catalog.featured_books().await?;
    Ok(Json(ApiResponse::new("Books retrieved successfully", books)))
}
