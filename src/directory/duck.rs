use std::collections::HashMap;
use std::path::Path;

use chrono::{NaiveDateTime, Utc};
use duckdb::types::Value;
use duckdb::{Connection, OptionalExt, Row, params, params_from_iter};

use crate::directory::{HospitalRepository, SearchFilter};
use crate::error::{DirectoryError, Result};
use crate::model::{
    CreateHospitalRequest, CreateTreatmentRequest, Hospital, HospitalWithTreatments, PriceOffer,
    SearchQuery, Treatment, TreatmentComparison, dedup_specialties,
};

const SCHEMA_SQL: &str = r#"
    CREATE SEQUENCE IF NOT EXISTS hospitals_id_seq START 1;
    CREATE SEQUENCE IF NOT EXISTS treatments_id_seq START 1;

    CREATE TABLE IF NOT EXISTS hospitals (
      id BIGINT PRIMARY KEY DEFAULT nextval('hospitals_id_seq'),
      name TEXT NOT NULL,
      address TEXT NOT NULL,
      latitude DOUBLE NOT NULL,
      longitude DOUBLE NOT NULL,
      phone TEXT,
      email TEXT,
      rating DOUBLE NOT NULL,
      created_at TIMESTAMP NOT NULL
    );

    CREATE TABLE IF NOT EXISTS hospital_specialties (
      hospital_id BIGINT NOT NULL REFERENCES hospitals(id),
      ordinal INTEGER NOT NULL,
      specialty TEXT NOT NULL,
      PRIMARY KEY (hospital_id, ordinal)
    );

    CREATE TABLE IF NOT EXISTS treatments (
      id BIGINT PRIMARY KEY DEFAULT nextval('treatments_id_seq'),
      hospital_id BIGINT NOT NULL REFERENCES hospitals(id),
      name TEXT NOT NULL,
      price DOUBLE NOT NULL,
      description TEXT,
      created_at TIMESTAMP NOT NULL
    );
"#;

const HOSPITAL_COLUMNS: &str =
    "h.id, h.name, h.address, h.latitude, h.longitude, h.phone, h.email, h.rating, h.created_at";

const TREATMENT_COLUMNS: &str = "id, hospital_id, name, price, description, created_at";

/// Same expression as `geo::distance_km`.
/// Binds: query lat, query lon, then query lat, query lon, query lat.
const DISTANCE_SQL: &str = r#"(
    CASE WHEN h.latitude = ? AND h.longitude = ? THEN 0.0
    ELSE 6371 * acos(LEAST(1.0, GREATEST(-1.0,
      cos(radians(?)) * cos(radians(h.latitude)) *
      cos(radians(h.longitude) - radians(?)) +
      sin(radians(?)) * sin(radians(h.latitude))
    )))
    END
  )"#;

const SPECIALTY_SQL: &str = "EXISTS (SELECT 1 FROM hospital_specialties s WHERE s.hospital_id = h.id AND s.specialty = ?)";

pub struct DuckDbRepository {
    conn: Connection,
}

impl DuckDbRepository {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    pub fn hospital_count(&self) -> Result<u64> {
        let mut stmt = self.conn.prepare("SELECT COUNT(*) FROM hospitals")?;
        let v: i64 = stmt.query_row([], |row| row.get(0))?;
        Ok(v.max(0) as u64)
    }

    /// Removes every hospital and treatment. Id sequences keep counting.
    pub fn clear(&mut self) -> Result<()> {
        self.conn.execute("DELETE FROM treatments", [])?;
        self.conn.execute("DELETE FROM hospital_specialties", [])?;
        self.conn.execute("DELETE FROM hospitals", [])?;
        Ok(())
    }

    fn query_hospitals(&self, where_sql: &str, params: &[Value]) -> Result<Vec<Hospital>> {
        let sql = format!(
            r#"
            SELECT {HOSPITAL_COLUMNS}
            FROM hospitals h
            {where_sql}
            ORDER BY h.rating DESC, h.name ASC, h.id ASC
        "#
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), hospital_from_row)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        self.attach_specialties(out.iter_mut().collect())?;
        Ok(out)
    }

    fn attach_specialties(&self, mut targets: Vec<&mut Hospital>) -> Result<()> {
        if targets.is_empty() {
            return Ok(());
        }
        let mut ids: Vec<i64> = targets.iter().map(|h| h.id).collect();
        ids.sort_unstable();
        ids.dedup();

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            r#"
            SELECT hospital_id, specialty
            FROM hospital_specialties
            WHERE hospital_id IN ({placeholders})
            ORDER BY hospital_id ASC, ordinal ASC
        "#
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), |row| {
            Ok((row.get::<usize, i64>(0)?, row.get::<usize, String>(1)?))
        })?;

        let mut by_hospital: HashMap<i64, Vec<String>> = HashMap::new();
        for r in rows {
            let (id, specialty) = r?;
            by_hospital.entry(id).or_default().push(specialty);
        }
        for h in targets.iter_mut() {
            if let Some(specialties) = by_hospital.get(&h.id) {
                h.specialties = specialties.clone();
            }
        }
        Ok(())
    }

    fn hospital_exists(&self, id: i64) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT COUNT(*) FROM hospitals WHERE id = ?")?;
        let v: i64 = stmt.query_row(params![id], |row| row.get(0))?;
        Ok(v > 0)
    }
}

impl HospitalRepository for DuckDbRepository {
    fn list_all(&self) -> Result<Vec<Hospital>> {
        self.query_hospitals("", &[])
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<Hospital>> {
        let filter = SearchFilter::from_query(query);
        tracing::debug!(?filter, "duckdb search");
        let (where_sql, params) = search_where(&filter);
        self.query_hospitals(&where_sql, &params)
    }

    fn get_by_id(&self, id: i64) -> Result<HospitalWithTreatments> {
        let hospital: Option<Hospital> = {
            let sql = format!("SELECT {HOSPITAL_COLUMNS} FROM hospitals h WHERE h.id = ? LIMIT 1");
            let mut stmt = self.conn.prepare(&sql)?;
            stmt.query_row(params![id], hospital_from_row).optional()?
        };
        let Some(mut hospital) = hospital else {
            return Err(DirectoryError::NotFound("Hospital not found".to_string()));
        };
        self.attach_specialties(vec![&mut hospital])?;

        let sql = format!(
            r#"
            SELECT {TREATMENT_COLUMNS}
            FROM treatments
            WHERE hospital_id = ?
            ORDER BY name ASC, id ASC
        "#
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![id], treatment_from_row)?;
        let mut treatments = Vec::new();
        for r in rows {
            treatments.push(r?);
        }

        Ok(HospitalWithTreatments {
            hospital,
            treatments,
        })
    }

    fn compare_treatment_prices(&self, treatment_name: &str) -> Result<TreatmentComparison> {
        // contains() rather than LIKE so '%' and '_' in the name match literally.
        let sql = format!(
            r#"
            SELECT {HOSPITAL_COLUMNS}, t.price, t.description
            FROM hospitals h
            JOIN treatments t ON h.id = t.hospital_id
            WHERE contains(lower(t.name), lower(?))
            ORDER BY t.price ASC, h.name ASC, h.id ASC
        "#
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![treatment_name], |row| {
            Ok(PriceOffer {
                hospital: hospital_from_row(row)?,
                price: row.get(9)?,
                description: row.get(10)?,
            })
        })?;
        let mut offers = Vec::new();
        for r in rows {
            offers.push(r?);
        }
        self.attach_specialties(offers.iter_mut().map(|o| &mut o.hospital).collect())?;

        Ok(TreatmentComparison {
            treatment_name: treatment_name.to_string(),
            hospitals: offers,
        })
    }

    fn add_hospital(&mut self, req: &CreateHospitalRequest) -> Result<Hospital> {
        let specialties = dedup_specialties(&req.specialties);
        let created_at = Utc::now().naive_utc();

        let tx = self.conn.transaction()?;
        let inserted: Option<Hospital> = {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO hospitals (name, address, latitude, longitude, phone, email, rating, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                RETURNING id, name, address, latitude, longitude, phone, email, rating, created_at
            "#,
            )?;
            stmt.query_row(
                params![
                    req.name,
                    req.address,
                    req.latitude,
                    req.longitude,
                    req.phone,
                    req.email,
                    req.rating,
                    created_at
                ],
                hospital_from_row,
            )
            .optional()?
        };
        let Some(mut hospital) = inserted else {
            return Err(DirectoryError::Internal(
                "Failed to create hospital".to_string(),
            ));
        };

        {
            let mut ins = tx.prepare(
                "INSERT INTO hospital_specialties (hospital_id, ordinal, specialty) VALUES (?, ?, ?)",
            )?;
            for (ordinal, specialty) in specialties.iter().enumerate() {
                ins.execute(params![hospital.id, ordinal as i64, specialty])?;
            }
        }
        tx.commit()?;

        hospital.specialties = specialties;
        tracing::info!(id = hospital.id, name = %hospital.name, "hospital added");
        Ok(hospital)
    }

    fn add_treatment(
        &mut self,
        hospital_id: i64,
        req: &CreateTreatmentRequest,
    ) -> Result<Treatment> {
        if !self.hospital_exists(hospital_id)? {
            return Err(DirectoryError::NotFound("Hospital not found".to_string()));
        }
        let created_at = Utc::now().naive_utc();
        let sql = format!(
            r#"
            INSERT INTO treatments (hospital_id, name, price, description, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {TREATMENT_COLUMNS}
        "#
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let treatment = stmt
            .query_row(
                params![hospital_id, req.name, req.price, req.description, created_at],
                treatment_from_row,
            )
            .optional()?
            .ok_or_else(|| DirectoryError::Internal("Failed to create treatment".to_string()))?;

        tracing::info!(
            id = treatment.id,
            hospital_id,
            name = %treatment.name,
            "treatment added"
        );
        Ok(treatment)
    }
}

/// Builds the WHERE clause for a search. Filters are ANDed in a fixed order
/// (rating, specialty, distance) and every value is a bound parameter.
fn search_where(filter: &SearchFilter) -> (String, Vec<Value>) {
    let mut clauses = vec!["h.rating >= ?".to_string()];
    let mut params = vec![Value::Double(filter.rating_min)];

    if let Some(specialty) = &filter.specialty {
        clauses.push(SPECIALTY_SQL.to_string());
        params.push(Value::Text(specialty.clone()));
    }

    if let Some(origin) = filter.origin {
        clauses.push(format!("{DISTANCE_SQL} <= ?"));
        params.push(Value::Double(origin.lat));
        params.push(Value::Double(origin.lon));
        params.push(Value::Double(origin.lat));
        params.push(Value::Double(origin.lon));
        params.push(Value::Double(origin.lat));
        params.push(Value::Double(filter.radius_km));
    }

    (format!("WHERE {}", clauses.join(" AND ")), params)
}

fn hospital_from_row(row: &Row<'_>) -> duckdb::Result<Hospital> {
    let created_at: NaiveDateTime = row.get(8)?;
    Ok(Hospital {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        phone: row.get(5)?,
        email: row.get(6)?,
        rating: row.get(7)?,
        specialties: Vec::new(),
        created_at: created_at.and_utc(),
    })
}

fn treatment_from_row(row: &Row<'_>) -> duckdb::Result<Treatment> {
    let created_at: NaiveDateTime = row.get(5)?;
    Ok(Treatment {
        id: row.get(0)?,
        hospital_id: row.get(1)?,
        name: row.get(2)?,
        price: row.get(3)?,
        description: row.get(4)?,
        created_at: created_at.and_utc(),
    })
}
