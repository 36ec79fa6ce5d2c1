use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use axum::extract::{Path as AxumPath, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cli::ServeArgs;
use crate::directory::{DuckDbRepository, HospitalRepository, MemoryRepository};
use crate::error::DirectoryError;
use crate::model::{
    CreateHospitalRequest, CreateTreatmentRequest, Hospital, HospitalWithTreatments, SearchQuery,
    Treatment, TreatmentComparison,
};
use crate::seed;
use crate::storage::{StoragePaths, file_present_nonempty};

#[derive(Clone)]
struct AppState {
    repo: Arc<Mutex<Box<dyn HospitalRepository>>>,
}

pub async fn run(opts: ServeArgs) -> anyhow::Result<()> {
    let repo: Box<dyn HospitalRepository> = if opts.memory {
        let mut repo = MemoryRepository::new();
        if let Some(seed_file) = &opts.seed_file {
            let entries = seed::read_seed_file(&PathBuf::from(seed_file))?;
            let counts = seed::load(&mut repo, &entries)?;
            tracing::info!(
                "In-memory store seeded: {} hospitals, {} treatments",
                counts.hospitals,
                counts.treatments
            );
        } else {
            tracing::info!("In-memory store starts empty");
        }
        Box::new(repo)
    } else {
        let paths = StoragePaths::new(&opts.data_dir);
        if !file_present_nonempty(&paths.duckdb_path) {
            return Err(anyhow!(
                "DuckDB not found at {}. Run: hospital-directory seed",
                paths.duckdb_path.display()
            ));
        }
        let repo = DuckDbRepository::open(&paths.duckdb_path)
            .with_context(|| format!("open duckdb at {}", paths.duckdb_path.display()))?;
        Box::new(repo)
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(repo)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", opts.host, opts.port)
        .parse()
        .context("parse host:port")?;

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(repo: Box<dyn HospitalRepository>) -> Router {
    let state = AppState {
        repo: Arc::new(Mutex::new(repo)),
    };
    Router::new()
        .route("/hospitals", get(api_list_hospitals).post(api_add_hospital))
        .route("/hospitals/search", post(api_search_hospitals))
        .route(
            "/hospitals/compare/:treatment_name",
            get(api_compare_treatment_prices),
        )
        .route("/hospitals/:id", get(api_get_hospital))
        .route("/hospitals/:id/treatments", post(api_add_treatment))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HospitalsResponse {
    hospitals: Vec<Hospital>,
}

#[derive(Debug, Serialize)]
struct HospitalDetailResponse {
    hospital: HospitalWithTreatments,
}

#[derive(Debug, Serialize)]
struct ComparisonResponse {
    comparison: TreatmentComparison,
}

#[derive(Debug, Serialize)]
struct HospitalResponse {
    hospital: Hospital,
}

#[derive(Debug, Serialize)]
struct TreatmentResponse {
    treatment: Treatment,
}

type ApiResult<T> = Result<Json<T>, DirectoryError>;

async fn api_list_hospitals(State(st): State<AppState>) -> ApiResult<HospitalsResponse> {
    let repo = st.repo.lock().await;
    let hospitals = repo.list_all()?;
    Ok(Json(HospitalsResponse { hospitals }))
}

async fn api_search_hospitals(
    State(st): State<AppState>,
    Json(q): Json<SearchQuery>,
) -> ApiResult<HospitalsResponse> {
    let repo = st.repo.lock().await;
    let hospitals = repo.search(&q)?;
    Ok(Json(HospitalsResponse { hospitals }))
}

async fn api_get_hospital(
    State(st): State<AppState>,
    AxumPath(id): AxumPath<i64>,
) -> ApiResult<HospitalDetailResponse> {
    let repo = st.repo.lock().await;
    let hospital = repo.get_by_id(id)?;
    Ok(Json(HospitalDetailResponse { hospital }))
}

async fn api_compare_treatment_prices(
    State(st): State<AppState>,
    AxumPath(treatment_name): AxumPath<String>,
) -> ApiResult<ComparisonResponse> {
    let repo = st.repo.lock().await;
    let comparison = repo.compare_treatment_prices(&treatment_name)?;
    Ok(Json(ComparisonResponse { comparison }))
}

// Open endpoint: no role check is applied to inserts.
async fn api_add_hospital(
    State(st): State<AppState>,
    Json(req): Json<CreateHospitalRequest>,
) -> ApiResult<HospitalResponse> {
    let mut repo = st.repo.lock().await;
    let hospital = repo.add_hospital(&req)?;
    Ok(Json(HospitalResponse { hospital }))
}

async fn api_add_treatment(
    State(st): State<AppState>,
    AxumPath(id): AxumPath<i64>,
    Json(req): Json<CreateTreatmentRequest>,
) -> ApiResult<TreatmentResponse> {
    let mut repo = st.repo.lock().await;
    let treatment = repo.add_treatment(id, &req)?;
    Ok(Json(TreatmentResponse { treatment }))
}
