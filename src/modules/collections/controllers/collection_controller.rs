use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::config::Config;
use crate::core::error::AppError;
use crate::core::CallerContext;
use crate::modules::collections::models::{
    RecordCollectionRequest, UpdateRemarksRequest, VoidCollectionRequest,
};
use crate::modules::collections::services::collection_service::CollectionService;

/// Query parameters for a customer's collection history
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub include_voided: bool,
}

fn default_limit() -> i64 {
    20
}

/// Record a collection against a customer
/// POST /customers/{id}/collections
pub async fn record_collection(
    service: web::Data<Arc<CollectionService>>,
    caller: CallerContext,
    path: web::Path<String>,
    request: web::Json<RecordCollectionRequest>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();

    let response = service
        .record_collection(&customer_id, request.into_inner(), &caller)
        .await?;

    Ok(HttpResponse::Created().json(response))
}

/// List a customer's collections, newest first
/// GET /customers/{id}/collections
pub async fn list_collections(
    service: web::Data<Arc<CollectionService>>,
    config: web::Data<Config>,
    caller: CallerContext,
    path: web::Path<String>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();
    let limit = query.limit.min(config.app.max_history_page_size as i64);

    let history = service
        .list_customer_collections(
            &customer_id,
            query.include_voided,
            limit,
            query.offset,
            &caller,
        )
        .await?;

    Ok(HttpResponse::Ok().json(history))
}

/// Fetch one collection entry
/// GET /collections/{id}
pub async fn get_collection(
    service: web::Data<Arc<CollectionService>>,
    caller: CallerContext,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let entry_id = path.into_inner();
    let entry = service.get_entry(&entry_id, &caller).await?;

    Ok(HttpResponse::Ok().json(entry))
}

/// Void a completed collection
/// POST /collections/{id}/void
pub async fn void_collection(
    service: web::Data<Arc<CollectionService>>,
    caller: CallerContext,
    path: web::Path<String>,
    request: web::Json<VoidCollectionRequest>,
) -> Result<HttpResponse, AppError> {
    let entry_id = path.into_inner();

    let entry = service
        .void_collection(&entry_id, request.into_inner().reason, &caller)
        .await?;

    Ok(HttpResponse::Ok().json(entry))
}

/// Edit the remarks of a non-voided collection
/// PATCH /collections/{id}/remarks
pub async fn update_remarks(
    service: web::Data<Arc<CollectionService>>,
    caller: CallerContext,
    path: web::Path<String>,
    request: web::Json<UpdateRemarksRequest>,
) -> Result<HttpResponse, AppError> {
    let entry_id = path.into_inner();

    let entry = service
        .update_remarks(&entry_id, request.into_inner().remarks, &caller)
        .await?;

    Ok(HttpResponse::Ok().json(entry))
}

/// Configure collection routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/customers/{id}/collections")
            .route(web::post().to(record_collection))
            .route(web::get().to(list_collections)),
    )
    .service(
        web::scope("/collections")
            .route("/{id}/void", web::post().to(void_collection))
            .route("/{id}/remarks", web::patch().to(update_remarks))
            .route("/{id}", web::get().to(get_collection)),
    );
}
