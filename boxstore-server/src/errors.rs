use actix_multipart::MultipartError;
use actix_web::{HttpResponse, ResponseError};
use reference_index::IndexError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoxstoreErr {
    #[error("Forbidden: only admin user can upload files")]
    Forbidden,

    #[error("filename must be specified")]
    MissingFilename,

    #[error("no file uploaded")]
    NoFileUploaded,

    #[error("Failed to read multipart upload: {0}")]
    Upload(MultipartError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("blob storage unavailable: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

impl ResponseError for BoxstoreErr {
    fn error_response(&self) -> HttpResponse {
        match self {
            BoxstoreErr::Forbidden => HttpResponse::Forbidden().body(self.to_string()),
            BoxstoreErr::MissingFilename => HttpResponse::BadRequest().body(self.to_string()),
            BoxstoreErr::NoFileUploaded => HttpResponse::BadRequest().body(self.to_string()),
            BoxstoreErr::Upload(_) => HttpResponse::BadRequest().body(self.to_string()),
            BoxstoreErr::Index(IndexError::NotFound(_)) => {
                HttpResponse::NotFound().body(self.to_string())
            }
            BoxstoreErr::Index(IndexError::StorageUnavailable(_)) => {
                HttpResponse::InternalServerError().body(self.to_string())
            }
            BoxstoreErr::Storage(_) => HttpResponse::InternalServerError().body(self.to_string()),
        }
    }
}
