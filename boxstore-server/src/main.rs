mod auth;
mod errors;
mod params;

use std::path::PathBuf;
use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{get, post, web, App, HttpRequest, HttpResponse, HttpServer, Responder};
use clap::Parser;
use futures_util::TryStreamExt;
use quick_cache::sync::Cache;
use serde::{Deserialize, Serialize};

use blob_store::local_store::LocalBlobStore;
use blob_store::s3_store::{create_s3_client, S3BlobStore};
use blob_store::store::BlobStores;
use reference_index::memory::MemoryIndex;
use reference_index::rocks::RocksIndex;
use reference_index::{Handle, Indexes};

use crate::auth::{IdentityProvider, StaticTokenProvider};
use crate::errors::BoxstoreErr;
use crate::params::{Args, IndexBackend, StorageBackend};

struct AppState {
    handle_lookup: Cache<String, String>,
    index: Indexes,
    blobs: BlobStores,
    identity: Arc<dyn IdentityProvider>,
}

#[derive(Serialize, Deserialize)]
struct UploadDoneResponse {
    filename: String,
    url: String,
}

#[derive(Serialize, Deserialize)]
struct Hello {}

const APP_TYPE_JSON: &str = "application/json";
const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

fn admin_session(req: &HttpRequest) -> String {
    req.headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Pulls the first `file` field out of a multipart body.
async fn read_file_field(payload: &mut Multipart) -> Result<(String, Vec<u8>), BoxstoreErr> {
    loop {
        let mut field = match payload.try_next().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(BoxstoreErr::NoFileUploaded),
            Err(e) => return Err(BoxstoreErr::Upload(e)),
        };

        let filename = {
            let content_disposition = field.content_disposition();
            if content_disposition.get_name() != Some("file") {
                continue;
            }
            content_disposition
                .get_filename()
                .map(|name| name.to_string())
        };

        let filename = match filename {
            Some(name) if !name.is_empty() => name,
            _ => return Err(BoxstoreErr::MissingFilename),
        };

        let mut data = Vec::new();
        loop {
            match field.try_next().await {
                Ok(Some(chunk)) => data.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(e) => return Err(BoxstoreErr::Upload(e)),
            }
        }
        return Ok((filename, data));
    }
}

#[post("/upload")]
async fn upload(
    req: HttpRequest,
    mut payload: Multipart,
    shared_state: web::Data<AppState>,
) -> impl Responder {
    let session = admin_session(&req);
    if !shared_state.identity.is_admin(&session) {
        tracing::error!("Non admin user tried to upload files");
        return HttpResponse::from_error(BoxstoreErr::Forbidden);
    }

    let (filename, data) = match read_file_field(&mut payload).await {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!("{}", e);
            return HttpResponse::from_error(e);
        }
    };

    let handle = match shared_state.blobs.as_trait().put_blob(&data).await {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!("blob write failed: {}", e);
            return HttpResponse::from_error(BoxstoreErr::Storage(e));
        }
    };

    if let Err(e) = shared_state
        .index
        .as_trait()
        .put(&filename, Handle::from(handle.clone()))
        .await
    {
        tracing::error!("index write failed for {}: {}", filename, e);
        return HttpResponse::from_error(BoxstoreErr::Index(e));
    }
    shared_state.handle_lookup.insert(filename.clone(), handle);

    tracing::info!("registered {}", filename);
    let resp = UploadDoneResponse {
        url: format!("/serve/{}", filename),
        filename,
    };
    HttpResponse::Ok().content_type(APP_TYPE_JSON).json(resp)
}

#[get("/serve/{name:.*}")]
async fn serve(name: web::Path<String>, shared_state: web::Data<AppState>) -> impl Responder {
    let name = name.into_inner();
    tracing::info!("filename={}", name);

    if name.is_empty() {
        tracing::error!("filename must be specified");
        return HttpResponse::from_error(BoxstoreErr::MissingFilename);
    }

    let handle = match shared_state.handle_lookup.get(&name) {
        Some(handle) => handle,
        None => match shared_state.index.as_trait().get(&name).await {
            Ok(handle) => {
                let handle = handle.into_inner();
                shared_state.handle_lookup.insert(name.clone(), handle.clone());
                handle
            }
            Err(e) => {
                tracing::error!("lookup failed for {}: {}", name, e);
                return HttpResponse::from_error(BoxstoreErr::Index(e));
            }
        },
    };

    match shared_state.blobs.as_trait().get_blob(&handle).await {
        Ok(data) => HttpResponse::Ok()
            .content_type("application/octet-stream")
            .append_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", name),
            ))
            .body(data),
        Err(e) => {
            tracing::error!("blob read failed for {}: {}", handle, e);
            HttpResponse::from_error(BoxstoreErr::Storage(e))
        }
    }
}

#[get("/hello")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().content_type(APP_TYPE_JSON).json(Hello {})
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt::init();

    let index = match args.index_backend {
        IndexBackend::Memory => Indexes::Memory(MemoryIndex::new()),
        IndexBackend::Rocks => {
            let path = PathBuf::from(&args.data_dir).join("index.db");
            let index = RocksIndex::open(&path)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
            Indexes::Rocks(index)
        }
    };

    let blobs = match args.storage_backend {
        StorageBackend::Local => {
            let dir = PathBuf::from(&args.data_dir).join("blobs");
            BlobStores::Local(LocalBlobStore::new(dir))
        }
        StorageBackend::S3 => {
            let client = create_s3_client(args.s3_endpoint.as_deref()).await;
            BlobStores::S3(S3BlobStore::new(client, args.s3_bucket.clone()))
        }
    };

    let state = web::Data::new(AppState {
        handle_lookup: Cache::new(100_000),
        index,
        blobs,
        identity: Arc::new(StaticTokenProvider::new(args.admin_token.clone())),
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(upload)
            .service(serve)
            .service(hello)
    })
    .bind(args.http_addr.clone())?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;

    const BOUNDARY: &str = "------------------------abcdef012345";

    fn test_state(admin_token: &str) -> web::Data<AppState> {
        let blob_dir = tempfile::tempdir().unwrap().into_path();
        web::Data::new(AppState {
            handle_lookup: Cache::new(1_000),
            index: Indexes::Memory(MemoryIndex::new()),
            blobs: BlobStores::Local(LocalBlobStore::new(blob_dir)),
            identity: Arc::new(StaticTokenProvider::new(admin_token.to_string())),
        })
    }

    fn multipart_body(field_name: &str, filename: &str, content: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, field_name, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    #[actix_web::test]
    async fn test_upload_then_serve_round_trip() {
        let state = test_state("secret");
        let app = test::init_service(
            App::new()
                .app_data(state)
                .service(upload)
                .service(serve),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/upload")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .insert_header((ADMIN_TOKEN_HEADER, "secret"))
            .set_payload(multipart_body("file", "a.txt", b"hello blob"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let done: UploadDoneResponse = test::read_body_json(resp).await;
        assert_eq!(done.filename, "a.txt");
        assert_eq!(done.url, "/serve/a.txt");

        let req = test::TestRequest::get().uri("/serve/a.txt").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(&body[..], b"hello blob");
    }

    #[actix_web::test]
    async fn test_non_admin_upload_is_forbidden() {
        let state = test_state("secret");
        let app = test::init_service(App::new().app_data(state).service(upload)).await;

        let req = test::TestRequest::post()
            .uri("/upload")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(multipart_body("file", "a.txt", b"hello blob"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_serve_unknown_name_is_not_found() {
        let state = test_state("secret");
        let app = test::init_service(App::new().app_data(state).service(serve)).await;

        let req = test::TestRequest::get().uri("/serve/missing.txt").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_reupload_overwrites_mapping() {
        let state = test_state("secret");
        let app = test::init_service(
            App::new()
                .app_data(state)
                .service(upload)
                .service(serve),
        )
        .await;

        for content in [b"first version".as_slice(), b"second version".as_slice()] {
            let req = test::TestRequest::post()
                .uri("/upload")
                .insert_header((
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                ))
                .insert_header((ADMIN_TOKEN_HEADER, "secret"))
                .set_payload(multipart_body("file", "a.txt", content))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get().uri("/serve/a.txt").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(&body[..], b"second version");
    }

    #[actix_web::test]
    async fn test_upload_without_file_field_is_bad_request() {
        let state = test_state("secret");
        let app = test::init_service(App::new().app_data(state).service(upload)).await;

        let req = test::TestRequest::post()
            .uri("/upload")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .insert_header((ADMIN_TOKEN_HEADER, "secret"))
            .set_payload(multipart_body("other", "a.txt", b"hello blob"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
