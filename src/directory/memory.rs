use chrono::Utc;

use crate::directory::{
    HospitalRepository, SearchFilter, rank_offers, sort_directory, treatment_name_matches,
};
use crate::error::{DirectoryError, Result};
use crate::model::{
    CreateHospitalRequest, CreateTreatmentRequest, Hospital, HospitalWithTreatments, PriceOffer,
    SearchQuery, Treatment, TreatmentComparison, dedup_specialties,
};

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    hospitals: Vec<Hospital>,
    treatments: Vec<Treatment>,
    next_hospital_id: i64,
    next_treatment_id: i64,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, id: i64) -> Option<&Hospital> {
        self.hospitals.iter().find(|h| h.id == id)
    }
}

impl HospitalRepository for MemoryRepository {
    fn list_all(&self) -> Result<Vec<Hospital>> {
        let mut out = self.hospitals.clone();
        sort_directory(&mut out);
        Ok(out)
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<Hospital>> {
        let filter = SearchFilter::from_query(query);
        tracing::debug!(?filter, "memory search");
        let mut out: Vec<Hospital> = self
            .hospitals
            .iter()
            .filter(|h| filter.matches(h))
            .cloned()
            .collect();
        sort_directory(&mut out);
        Ok(out)
    }

    fn get_by_id(&self, id: i64) -> Result<HospitalWithTreatments> {
        let hospital = self
            .find(id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound("Hospital not found".to_string()))?;

        let mut treatments: Vec<Treatment> = self
            .treatments
            .iter()
            .filter(|t| t.hospital_id == id)
            .cloned()
            .collect();
        treatments.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        Ok(HospitalWithTreatments {
            hospital,
            treatments,
        })
    }

    fn compare_treatment_prices(&self, treatment_name: &str) -> Result<TreatmentComparison> {
        let mut offers = Vec::new();
        for t in &self.treatments {
            if !treatment_name_matches(&t.name, treatment_name) {
                continue;
            }
            let Some(hospital) = self.find(t.hospital_id) else {
                continue;
            };
            offers.push(PriceOffer {
                hospital: hospital.clone(),
                price: t.price,
                description: t.description.clone(),
            });
        }
        rank_offers(&mut offers);

        Ok(TreatmentComparison {
            treatment_name: treatment_name.to_string(),
            hospitals: offers,
        })
    }

    fn add_hospital(&mut self, req: &CreateHospitalRequest) -> Result<Hospital> {
        self.next_hospital_id += 1;
        let hospital = Hospital {
            id: self.next_hospital_id,
            name: req.name.clone(),
            address: req.address.clone(),
            latitude: req.latitude,
            longitude: req.longitude,
            phone: req.phone.clone(),
            email: req.email.clone(),
            rating: req.rating,
            specialties: dedup_specialties(&req.specialties),
            created_at: Utc::now(),
        };
        self.hospitals.push(hospital.clone());
        tracing::info!(id = hospital.id, name = %hospital.name, "hospital added");
        Ok(hospital)
    }

    fn add_treatment(
        &mut self,
        hospital_id: i64,
        req: &CreateTreatmentRequest,
    ) -> Result<Treatment> {
        if self.find(hospital_id).is_none() {
            return Err(DirectoryError::NotFound("Hospital not found".to_string()));
        }
        self.next_treatment_id += 1;
        let treatment = Treatment {
            id: self.next_treatment_id,
            hospital_id,
            name: req.name.clone(),
            price: req.price,
            description: req.description.clone(),
            created_at: Utc::now(),
        };
        self.treatments.push(treatment.clone());
        tracing::info!(id = treatment.id, hospital_id, name = %treatment.name, "treatment added");
        Ok(treatment)
    }
}
