use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::cli::SeedArgs;
use crate::directory::{DuckDbRepository, HospitalRepository};
use crate::model::{CreateHospitalRequest, CreateTreatmentRequest};
use crate::storage::StoragePaths;

/// One element of the seed file: a hospital plus the treatments it offers.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedHospital {
    #[serde(flatten)]
    pub hospital: CreateHospitalRequest,
    #[serde(default)]
    pub treatments: Vec<CreateTreatmentRequest>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedCounts {
    pub hospitals: u64,
    pub treatments: u64,
}

pub fn parse_seed(s: &str) -> anyhow::Result<Vec<SeedHospital>> {
    serde_json::from_str(s).context("parse seed JSON")
}

pub fn read_seed_file(path: &Path) -> anyhow::Result<Vec<SeedHospital>> {
    let data = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_seed(&data).with_context(|| format!("load {}", path.display()))
}

pub fn load(
    repo: &mut dyn HospitalRepository,
    entries: &[SeedHospital],
) -> anyhow::Result<SeedCounts> {
    let mut counts = SeedCounts::default();
    for entry in entries {
        let hospital = repo
            .add_hospital(&entry.hospital)
            .with_context(|| format!("insert hospital {}", entry.hospital.name))?;
        counts.hospitals += 1;
        for t in &entry.treatments {
            repo.add_treatment(hospital.id, t)
                .with_context(|| format!("insert treatment {} for {}", t.name, hospital.name))?;
            counts.treatments += 1;
        }
    }
    Ok(counts)
}

pub fn run(opts: SeedArgs) -> anyhow::Result<()> {
    tracing::info!("hospital-directory seed");
    tracing::info!("data_dir={}", opts.data_dir);
    if opts.rebuild {
        tracing::info!("rebuild=true (will clear existing hospitals and treatments)");
    }

    let paths = StoragePaths::new(&opts.data_dir);
    paths.ensure_dirs().context("create data directory")?;
    let seed_path = opts
        .file
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| paths.default_seed_file());

    tracing::info!("Step 1/3: read seed file {}", seed_path.display());
    let t0 = std::time::Instant::now();
    let entries = read_seed_file(&seed_path)?;
    tracing::info!(
        "Seed file parsed in {:.1}s: {} hospitals",
        t0.elapsed().as_secs_f64(),
        entries.len()
    );

    tracing::info!("Step 2/3: open DuckDB + ensure schema");
    let t1 = std::time::Instant::now();
    let mut repo = DuckDbRepository::open(&paths.duckdb_path)
        .with_context(|| format!("open duckdb at {}", paths.duckdb_path.display()))?;
    tracing::info!(
        "DuckDB ready in {:.1}s: {}",
        t1.elapsed().as_secs_f64(),
        paths.duckdb_path.display()
    );

    tracing::info!("Step 3/3: load hospitals + treatments");
    let existing = repo.hospital_count()?;
    if existing > 0 && !opts.rebuild {
        tracing::info!(
            "DuckDB already holds {} hospitals; skipping (pass --rebuild to reload)",
            existing
        );
        return Ok(());
    }
    if existing > 0 {
        repo.clear().context("clear existing rows")?;
    }

    let t2 = std::time::Instant::now();
    let counts = load(&mut repo, &entries)?;
    tracing::info!(
        "Loaded {} hospitals and {} treatments in {:.1}s",
        counts.hospitals,
        counts.treatments,
        t2.elapsed().as_secs_f64()
    );

    tracing::info!("Seed complete.");
    Ok(())
}
