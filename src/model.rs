use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub rating: f64,
    pub specialties: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Treatment {
    pub id: i64,
    pub hospital_id: i64,
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HospitalWithTreatments {
    #[serde(flatten)]
    pub hospital: Hospital,
    pub treatments: Vec<Treatment>,
}

/// Body of `POST /hospitals/search`. Every field is optional; see
/// [`crate::directory::SearchFilter`] for how defaults are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Kilometres.
    pub radius: Option<f64>,
    pub specialty: Option<String>,
    pub rating_min: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceOffer {
    pub hospital: Hospital,
    pub price: f64,
    pub description: Option<String>,
}

/// Offers for one treatment name, cheapest first. The head of `hospitals`
/// is the best price; nothing else marks it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreatmentComparison {
    pub treatment_name: String,
    pub hospitals: Vec<PriceOffer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateHospitalRequest {
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub rating: f64,
    pub specialties: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTreatmentRequest {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
}

/// Drops repeated specialty tags, keeping the first occurrence.
pub fn dedup_specialties(specialties: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(specialties.len());
    for s in specialties {
        if !out.contains(s) {
            out.push(s.clone());
        }
    }
    out
}
