use std::io::Write;
use std::path::Path;

use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use chrono::Utc;
use futures::{StreamExt, TryStreamExt};
use log::error;
use serde_json::json;
use shared::{HistoryEntry, PredictionResponse};
use uuid::Uuid;

use crate::auth::{self, middleware::AuthenticatedUser};
use crate::config::Config;
use crate::db::predictions::PredictionRepository;
use crate::inference::pipeline::{InferenceError, InferencePipeline};

#[derive(serde::Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/auth/signup").route(web::post().to(auth::routes::signup)))
        .service(web::resource("/api/auth/login").route(web::post().to(auth::routes::login)))
        .service(web::resource("/api/auth/me").route(web::get().to(auth::routes::me)))
        .service(web::resource("/api/predict").route(web::post().to(handle_predict)))
        .service(web::resource("/api/history").route(web::get().to(get_history)));
}

/// Reads the first uploaded file out of the multipart payload, along
/// with its client-side filename when one was sent.
async fn read_upload(payload: &mut Multipart) -> Result<(Vec<u8>, Option<String>), Error> {
    let mut image_data = Vec::new();
    let mut file_name = None;

    while let Ok(Some(mut field)) = payload.try_next().await {
        if file_name.is_none() {
            file_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(String::from);
        }
        while let Some(chunk) = field.next().await {
            let data = chunk?;
            image_data.write_all(&data)?;
        }
        if !image_data.is_empty() {
            break;
        }
    }

    Ok((image_data, file_name))
}

/// Strips any path components a client may have smuggled into the
/// upload filename.
fn sanitize_file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.bin".to_string())
}

async fn handle_predict(
    _user: AuthenticatedUser,
    pipeline: web::Data<InferencePipeline>,
    predictions: web::Data<PredictionRepository>,
    config: web::Data<Config>,
    mut payload: Multipart,
) -> Result<HttpResponse, Error> {
    let timestamp = Utc::now();
    let (image_data, file_name) = read_upload(&mut payload).await?;
    if image_data.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse {
            error: "No image provided".to_string(),
        }));
    }

    let file_name = sanitize_file_name(file_name.as_deref().unwrap_or("upload.bin"));
    let stored_name = format!("{}_{}", Uuid::new_v4(), file_name);
    let image_reference = config.uploads_dir.join(&stored_name);

    tokio::fs::create_dir_all(&config.uploads_dir).await?;
    tokio::fs::write(&image_reference, &image_data).await?;

    let result = match pipeline.infer(&image_data) {
        Ok(result) => result,
        Err(InferenceError::Preprocess(e)) => {
            error!("Failed to preprocess upload {}: {}", stored_name, e);
            return Ok(HttpResponse::BadRequest().json(ErrorResponse {
                error: "Error processing image".to_string(),
            }));
        }
    };

    let response = PredictionResponse {
        label: result.label,
        real_percentage: result.real_confidence,
        fake_percentage: result.fake_confidence,
    };

    let reference_str = image_reference.to_string_lossy();
    match predictions.record(&result, &reference_str, timestamp).await {
        Ok(id) => {
            log::info!(
                "Recorded prediction {} for {}: {} ({:.2}% real)",
                id,
                reference_str,
                result.label,
                result.real_confidence
            );
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => {
            // The inference result is still valid; report the partial
            // failure alongside it.
            error!("Failed to persist prediction for {}: {:?}", reference_str, e);
            Ok(HttpResponse::Ok().json(json!({
                "label": response.label,
                "real_percentage": response.real_percentage,
                "fake_percentage": response.fake_percentage,
                "warning": "Prediction could not be saved",
            })))
        }
    }
}

async fn get_history(
    _user: AuthenticatedUser,
    predictions: web::Data<PredictionRepository>,
) -> HttpResponse {
    match predictions.list_recent(50).await {
        Ok(records) => {
            let entries: Vec<HistoryEntry> = records
                .into_iter()
                .map(|record| HistoryEntry {
                    id: record.id,
                    image_reference: record.image_reference,
                    label: record.label,
                    real_confidence: record.real_confidence,
                    fake_confidence: record.fake_confidence,
                    timestamp: record.timestamp,
                })
                .collect();
            HttpResponse::Ok().json(entries)
        }
        Err(e) => {
            error!("Failed to fetch prediction history: {:?}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch history".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(sanitize_file_name("selfie.png"), "selfie.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("dir/photo.jpg"), "photo.jpg");
        assert_eq!(sanitize_file_name(""), "upload.bin");
    }
}
