pub mod duck;
pub mod memory;

#[cfg(test)]
mod suite;

use std::cmp::Ordering;

use crate::error::Result;
use crate::geo::{self, GeoPoint};
use crate::model::{
    CreateHospitalRequest, CreateTreatmentRequest, Hospital, HospitalWithTreatments, PriceOffer,
    SearchQuery, Treatment, TreatmentComparison,
};

pub use duck::DuckDbRepository;
pub use memory::MemoryRepository;

pub const DEFAULT_RADIUS_KM: f64 = 10.0;
pub const DEFAULT_RATING_MIN: f64 = 0.0;

/// Storage behind the hospital endpoints.
///
/// Implementations must return hospital lists in directory order (rating
/// descending, then name ascending) and comparison offers cheapest first.
pub trait HospitalRepository: Send {
    fn list_all(&self) -> Result<Vec<Hospital>>;

    fn search(&self, query: &SearchQuery) -> Result<Vec<Hospital>>;

    /// Fails with `NotFound` for an unknown id.
    fn get_by_id(&self, id: i64) -> Result<HospitalWithTreatments>;

    /// Case-insensitive substring match on treatment names. No match is an
    /// empty comparison, not an error.
    fn compare_treatment_prices(&self, treatment_name: &str) -> Result<TreatmentComparison>;

    fn add_hospital(&mut self, req: &CreateHospitalRequest) -> Result<Hospital>;

    /// Fails with `NotFound` when `hospital_id` does not exist.
    fn add_treatment(
        &mut self,
        hospital_id: i64,
        req: &CreateTreatmentRequest,
    ) -> Result<Treatment>;
}

/// A [`SearchQuery`] with its defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchFilter {
    pub rating_min: f64,
    pub specialty: Option<String>,
    pub origin: Option<GeoPoint>,
    pub radius_km: f64,
}

impl SearchFilter {
    pub fn from_query(q: &SearchQuery) -> Self {
        let specialty = q.specialty.as_deref().filter(|s| !s.is_empty()).map(str::to_string);
        Self {
            rating_min: q.rating_min.unwrap_or(DEFAULT_RATING_MIN),
            specialty,
            origin: GeoPoint::from_pair(q.latitude, q.longitude),
            radius_km: q.radius.unwrap_or(DEFAULT_RADIUS_KM),
        }
    }

    pub fn matches(&self, h: &Hospital) -> bool {
        if h.rating < self.rating_min {
            return false;
        }
        if let Some(specialty) = &self.specialty {
            if !h.specialties.iter().any(|s| s == specialty) {
                return false;
            }
        }
        if let Some(origin) = self.origin {
            let target = GeoPoint::new(h.latitude, h.longitude);
            if !geo::within_radius(origin, target, self.radius_km) {
                return false;
            }
        }
        true
    }
}

pub fn directory_order(a: &Hospital, b: &Hospital) -> Ordering {
    b.rating
        .total_cmp(&a.rating)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_directory(hospitals: &mut [Hospital]) {
    hospitals.sort_by(directory_order);
}

/// Cheapest first. Equal prices fall back to hospital name, then id, so the
/// order is stable across backends.
pub fn rank_offers(offers: &mut [PriceOffer]) {
    offers.sort_by(|a, b| {
        a.price
            .total_cmp(&b.price)
            .then_with(|| a.hospital.name.cmp(&b.hospital.name))
            .then_with(|| a.hospital.id.cmp(&b.hospital.id))
    });
}

pub fn treatment_name_matches(treatment_name: &str, needle: &str) -> bool {
    treatment_name.to_lowercase().contains(&needle.to_lowercase())
}
