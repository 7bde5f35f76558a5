use crate::error::ApiError;
use crate::registry::SessionRegistry;
use actix_cors::Cors;
use actix_web::{error::InternalError, web, App, HttpResponse, HttpServer};
use colmatch_core::Schema;
use colmatch_mapping::{SchemaSide, Session};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

type ApiResult = Result<HttpResponse, ApiError>;

#[derive(Deserialize)]
struct CreateSessionRequest {
    source: serde_json::Value,
    data_model: serde_json::Value,
}

#[derive(Deserialize)]
struct ConfirmRequest {
    column: String,
    accepted: bool,
}

#[derive(Deserialize)]
struct OverrideRequest {
    column: String,
    source_column: String,
}

#[derive(Deserialize)]
struct ColumnRequest {
    column: String,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(registry: Arc<SessionRegistry>, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(registry.clone()))
                .configure(Self::configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }

    /// Register the session routes. Expects a `web::Data<Arc<SessionRegistry>>`
    /// in the app data.
    pub fn configure(cfg: &mut web::ServiceConfig) {
        let json = web::JsonConfig::default().error_handler(|err, _req| {
            let body = serde_json::json!({ "error": err.to_string() });
            InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
        });

        cfg.app_data(json)
            .route("/sessions", web::get().to(list_sessions))
            .route("/sessions", web::post().to(create_session))
            .route("/sessions/{id}", web::get().to(get_session))
            .route("/sessions/{id}", web::delete().to(delete_session))
            .route("/sessions/{id}/propose", web::post().to(propose))
            .route("/sessions/{id}/confirm", web::post().to(confirm))
            .route("/sessions/{id}/submit", web::post().to(submit))
            .route("/sessions/{id}/override", web::post().to(override_column))
            .route("/sessions/{id}/leave-unmapped", web::post().to(leave_unmapped))
            .route("/sessions/{id}/describe/{side}/{name}", web::get().to(describe));
    }
}

fn lookup(registry: &SessionRegistry, id: Uuid) -> Result<Arc<Mutex<Session>>, ApiError> {
    registry.get(&id).ok_or(ApiError::SessionNotFound(id))
}

/// Run `action` against one session on the blocking pool.
///
/// A proposal holds the session lock for the whole embedding run, so waiting
/// for that lock must never park an async worker.
async fn with_session<T, F>(registry: &SessionRegistry, id: Uuid, action: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut Session) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let session = lookup(registry, id)?;
    web::block(move || action(&mut session.lock()))
        .await
        .map_err(|e| ApiError::Blocking(e.to_string()))?
}

async fn list_sessions(registry: web::Data<Arc<SessionRegistry>>) -> ApiResult {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "sessions": registry.ids()
    })))
}

async fn create_session(
    registry: web::Data<Arc<SessionRegistry>>,
    req: web::Json<CreateSessionRequest>,
) -> ApiResult {
    let req = req.into_inner();
    let source = Schema::from_json_value("source", req.source)?;
    let data_model = Schema::from_json_value("data_model", req.data_model)?;

    let id = registry.create(source, data_model);
    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}

async fn get_session(registry: web::Data<Arc<SessionRegistry>>, path: web::Path<Uuid>) -> ApiResult {
    let snapshot = with_session(&registry, path.into_inner(), |session| Ok(session.snapshot())).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

async fn delete_session(registry: web::Data<Arc<SessionRegistry>>, path: web::Path<Uuid>) -> ApiResult {
    let id = path.into_inner();
    if registry.remove(&id) {
        Ok(HttpResponse::Ok().json(serde_json::json!({ "result": true })))
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

async fn propose(registry: web::Data<Arc<SessionRegistry>>, path: web::Path<Uuid>) -> ApiResult {
    let snapshot = with_session(&registry, path.into_inner(), |session| {
        session.propose()?;
        Ok(session.snapshot())
    })
    .await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

async fn confirm(
    registry: web::Data<Arc<SessionRegistry>>,
    path: web::Path<Uuid>,
    req: web::Json<ConfirmRequest>,
) -> ApiResult {
    let req = req.into_inner();
    let snapshot = with_session(&registry, path.into_inner(), move |session| {
        session.confirm(&req.column, req.accepted)?;
        Ok(session.snapshot())
    })
    .await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

async fn submit(registry: web::Data<Arc<SessionRegistry>>, path: web::Path<Uuid>) -> ApiResult {
    let outcome = with_session(&registry, path.into_inner(), |session| Ok(session.submit()?)).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

async fn override_column(
    registry: web::Data<Arc<SessionRegistry>>,
    path: web::Path<Uuid>,
    req: web::Json<OverrideRequest>,
) -> ApiResult {
    let req = req.into_inner();
    let snapshot = with_session(&registry, path.into_inner(), move |session| {
        session.override_column(&req.column, &req.source_column)?;
        Ok(session.snapshot())
    })
    .await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

async fn leave_unmapped(
    registry: web::Data<Arc<SessionRegistry>>,
    path: web::Path<Uuid>,
    req: web::Json<ColumnRequest>,
) -> ApiResult {
    let req = req.into_inner();
    let snapshot = with_session(&registry, path.into_inner(), move |session| {
        session.leave_unmapped(&req.column)?;
        Ok(session.snapshot())
    })
    .await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

async fn describe(
    registry: web::Data<Arc<SessionRegistry>>,
    path: web::Path<(Uuid, SchemaSide, String)>,
) -> ApiResult {
    let (id, side, name) = path.into_inner();
    let (name, description) = with_session(&registry, id, move |session| {
        let description = session.describe(side, &name).map(str::to_string);
        match description {
            Some(description) => Ok((name, description)),
            None => Err(ApiError::ColumnNotFound(name)),
        }
    })
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "side": side,
        "name": name,
        "description": description,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use colmatch_core::HashingEmbedder;
    use serde_json::{json, Value};

    fn registry() -> Arc<SessionRegistry> {
        Arc::new(SessionRegistry::new(Arc::new(HashingEmbedder::default())))
    }

    fn customer_schemas() -> Value {
        json!({
            "source": {"columns": [
                {"name": "id", "description": "unique customer identifier"},
                {"name": "addr", "description": "mailing address"}
            ]},
            "data_model": {"columns": [
                {"name": "cust_id", "description": "unique customer identifier"}
            ]}
        })
    }

    macro_rules! app {
        ($registry:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($registry.clone()))
                    .configure(RestApi::configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_accept_round_trip() {
        let registry = registry();
        let app = app!(registry);

        let req = test::TestRequest::post().uri("/sessions").set_json(customer_schemas()).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        let id = body["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post().uri(&format!("/sessions/{id}/propose")).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"], "proposed");
        assert_eq!(body["mapping"], json!([{"column": "cust_id", "source": "id"}]));

        let req = test::TestRequest::post()
            .uri(&format!("/sessions/{id}/confirm"))
            .set_json(json!({"column": "cust_id", "accepted": true}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"], "under_review");

        let req = test::TestRequest::post().uri(&format!("/sessions/{id}/submit")).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"status": "resolved"}));

        let req = test::TestRequest::get().uri(&format!("/sessions/{id}")).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"], "resolved");
    }

    #[actix_web::test]
    async fn test_reject_and_override() {
        let registry = registry();
        let app = app!(registry);

        let req = test::TestRequest::post().uri("/sessions").set_json(customer_schemas()).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let id = body["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post().uri(&format!("/sessions/{id}/propose")).to_request();
        test::call_service(&app, req).await;
        let req = test::TestRequest::post()
            .uri(&format!("/sessions/{id}/confirm"))
            .set_json(json!({"column": "cust_id", "accepted": false}))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post().uri(&format!("/sessions/{id}/submit")).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "pending");
        assert_eq!(body["not_valid"], json!(["cust_id"]));
        assert_eq!(body["residual_pool"], json!(["id"]));

        let req = test::TestRequest::post()
            .uri(&format!("/sessions/{id}/override"))
            .set_json(json!({"column": "cust_id", "source_column": "addr"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::post()
            .uri(&format!("/sessions/{id}/override"))
            .set_json(json!({"column": "cust_id", "source_column": "id"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_error_statuses() {
        let registry = registry();
        let app = app!(registry);

        let missing = Uuid::new_v4();
        let req = test::TestRequest::get().uri(&format!("/sessions/{missing}")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri("/sessions")
            .set_json(json!({"source": {"rows": []}, "data_model": {"columns": []}}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("Schema parse error"));

        let req = test::TestRequest::post().uri("/sessions").set_json(customer_schemas()).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let id = body["id"].as_str().unwrap().to_string();

        // submit before propose
        let req = test::TestRequest::post().uri(&format!("/sessions/{id}/submit")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::get()
            .uri(&format!("/sessions/{id}/describe/source/addr"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["description"], "mailing address");

        let req = test::TestRequest::get()
            .uri(&format!("/sessions/{id}/describe/data_model/addr"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete().uri(&format!("/sessions/{id}")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(registry.is_empty());
    }

    #[actix_web::test]
    async fn test_embedding_failure_is_bad_gateway() {
        let registry = registry();
        let app = app!(registry);

        let req = test::TestRequest::post()
            .uri("/sessions")
            .set_json(json!({
                "source": {"columns": [{"name": "id", "description": "unique customer identifier"}]},
                "data_model": {"columns": [{"name": "blank", "description": ""}]}
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let id = body["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post().uri(&format!("/sessions/{id}/propose")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let req = test::TestRequest::get().uri(&format!("/sessions/{id}")).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"], "unmapped");
    }

    #[actix_web::test]
    async fn test_busy_session_does_not_stall_worker() {
        let registry = registry();
        let app = std::rc::Rc::new(app!(registry));

        let schema = || Schema::new("s", vec![colmatch_core::ColumnRecord::new("id", "identifier")]);
        let busy = registry.create(schema(), schema());
        let idle = registry.create(schema(), schema());

        // stand-in for a long proposal holding the session lock
        let held = registry.get(&busy).unwrap();
        let (locked_tx, locked_rx) = std::sync::mpsc::channel();
        let holder = std::thread::spawn(move || {
            let _guard = held.lock();
            locked_tx.send(()).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(500));
        });
        locked_rx.recv().unwrap();

        let waiting = {
            let app = app.clone();
            let req = test::TestRequest::get().uri(&format!("/sessions/{busy}")).to_request();
            actix_web::rt::spawn(async move { test::call_service(&*app, req).await.status() })
        };
        actix_web::rt::time::sleep(std::time::Duration::from_millis(50)).await;

        let req = test::TestRequest::get().uri(&format!("/sessions/{idle}")).to_request();
        let resp = test::call_service(&*app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        // answered while the other session is still locked
        assert!(registry.get(&busy).unwrap().is_locked());

        assert_eq!(waiting.await.unwrap(), StatusCode::OK);
        holder.join().unwrap();
    }
}
