//! Behaviour every `HospitalRepository` backend must share.

use crate::directory::HospitalRepository;
use crate::error::DirectoryError;
use crate::model::{CreateHospitalRequest, CreateTreatmentRequest, SearchQuery};

pub fn hospital_a() -> CreateHospitalRequest {
    CreateHospitalRequest {
        name: "Hospital A".to_string(),
        address: "1 Market St, San Francisco".to_string(),
        latitude: 37.7749,
        longitude: -122.4194,
        phone: Some("+1 415 555 0100".to_string()),
        email: None,
        rating: 4.8,
        specialties: vec!["Cardiology".to_string()],
    }
}

pub fn hospital_b() -> CreateHospitalRequest {
    CreateHospitalRequest {
        name: "Hospital B".to_string(),
        address: "200 Broadway, New York".to_string(),
        latitude: 40.7128,
        longitude: -74.0060,
        phone: None,
        email: Some("info@b.example".to_string()),
        rating: 4.2,
        specialties: vec!["Surgery".to_string()],
    }
}

fn at(name: &str, lat: f64, lon: f64, rating: f64) -> CreateHospitalRequest {
    CreateHospitalRequest {
        name: name.to_string(),
        address: String::new(),
        latitude: lat,
        longitude: lon,
        phone: None,
        email: None,
        rating,
        specialties: vec![],
    }
}

fn treatment(name: &str, price: f64) -> CreateTreatmentRequest {
    CreateTreatmentRequest {
        name: name.to_string(),
        price,
        description: Some(format!("{name} at list price")),
    }
}

fn names(hospitals: &[crate::model::Hospital]) -> Vec<&str> {
    hospitals.iter().map(|h| h.name.as_str()).collect()
}

pub fn run_all<R, F>(make: F)
where
    R: HospitalRepository + 'static,
    F: Fn() -> R,
{
    empty_directory_lists_nothing(&mut make());
    list_all_orders_by_rating_then_name(&mut make());
    search_scenario(&mut make());
    rating_floor_is_respected(&mut make());
    specialty_filter_is_exact(&mut make());
    coincident_point_matches_zero_radius(&mut make());
    one_degree_latitude_radius_edge(&mut make());
    zero_coordinates_are_a_real_point(&mut make());
    search_sorts_by_rating_not_distance(&mut make());
    get_by_id_without_treatments(&mut make());
    get_by_id_unknown_is_not_found(&mut make());
    get_by_id_sorts_treatments_by_name(&mut make());
    add_treatment_unknown_hospital(&mut make());
    duplicate_specialties_collapse(&mut make());
    compare_general_checkup(&mut make());
    compare_is_case_insensitive_substring(&mut make());
    compare_without_match_is_empty(&mut make());
    compare_treats_wildcards_literally(&mut make());
}

fn empty_directory_lists_nothing(repo: &mut dyn HospitalRepository) {
    assert!(repo.list_all().unwrap().is_empty());
    assert!(repo.search(&SearchQuery::default()).unwrap().is_empty());
}

fn list_all_orders_by_rating_then_name(repo: &mut dyn HospitalRepository) {
    repo.add_hospital(&at("Zeta", 1.0, 1.0, 4.0)).unwrap();
    repo.add_hospital(&at("Alpha", 2.0, 2.0, 4.0)).unwrap();
    repo.add_hospital(&at("Top", 3.0, 3.0, 4.9)).unwrap();
    assert_eq!(names(&repo.list_all().unwrap()), ["Top", "Alpha", "Zeta"]);
}

fn search_scenario(repo: &mut dyn HospitalRepository) {
    repo.add_hospital(&hospital_a()).unwrap();
    repo.add_hospital(&hospital_b()).unwrap();

    let near_sf = repo
        .search(&SearchQuery {
            latitude: Some(37.7749),
            longitude: Some(-122.4194),
            radius: Some(10.0),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(names(&near_sf), ["Hospital A"]);

    let top_rated = repo
        .search(&SearchQuery {
            rating_min: Some(4.5),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(names(&top_rated), ["Hospital A"]);

    let surgery = repo
        .search(&SearchQuery {
            specialty: Some("Surgery".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(names(&surgery), ["Hospital B"]);

    let everything = repo.search(&SearchQuery::default()).unwrap();
    assert_eq!(names(&everything), ["Hospital A", "Hospital B"]);
}

fn rating_floor_is_respected(repo: &mut dyn HospitalRepository) {
    for (i, rating) in [3.9, 4.49, 4.5, 4.7, 5.0].iter().enumerate() {
        repo.add_hospital(&at(&format!("H{i}"), 0.0, 0.0, *rating))
            .unwrap();
    }
    let found = repo
        .search(&SearchQuery {
            rating_min: Some(4.5),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(found.len(), 3);
    assert!(found.iter().all(|h| h.rating >= 4.5));
}

fn specialty_filter_is_exact(repo: &mut dyn HospitalRepository) {
    let mut cardio = at("Cardio", 0.0, 0.0, 4.0);
    cardio.specialties = vec!["Surgery".to_string(), "Cardiology".to_string()];
    let mut lower = at("Lowercase", 0.0, 0.0, 4.0);
    lower.specialties = vec!["cardiology".to_string()];
    let none = at("Generalist", 0.0, 0.0, 4.0);
    repo.add_hospital(&cardio).unwrap();
    repo.add_hospital(&lower).unwrap();
    repo.add_hospital(&none).unwrap();

    let found = repo
        .search(&SearchQuery {
            specialty: Some("Cardiology".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(names(&found), ["Cardio"]);
    assert!(
        found
            .iter()
            .all(|h| h.specialties.iter().any(|s| s == "Cardiology"))
    );

    let blank = repo
        .search(&SearchQuery {
            specialty: Some(String::new()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(blank.len(), 3);
}

fn coincident_point_matches_zero_radius(repo: &mut dyn HospitalRepository) {
    repo.add_hospital(&hospital_a()).unwrap();
    let found = repo
        .search(&SearchQuery {
            latitude: Some(37.7749),
            longitude: Some(-122.4194),
            radius: Some(0.0),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(names(&found), ["Hospital A"]);
}

fn one_degree_latitude_radius_edge(repo: &mut dyn HospitalRepository) {
    repo.add_hospital(&at("North", 1.0, 20.0, 4.0)).unwrap();
    let query = |radius: f64| SearchQuery {
        latitude: Some(0.0),
        longitude: Some(20.0),
        radius: Some(radius),
        ..Default::default()
    };
    assert!(repo.search(&query(100.0)).unwrap().is_empty());
    assert_eq!(names(&repo.search(&query(120.0)).unwrap()), ["North"]);
}

fn zero_coordinates_are_a_real_point(repo: &mut dyn HospitalRepository) {
    repo.add_hospital(&at("Null Island", 0.0, 0.0, 4.0))
        .unwrap();
    repo.add_hospital(&at("Far", 45.0, 45.0, 4.0)).unwrap();
    let found = repo
        .search(&SearchQuery {
            latitude: Some(0.0),
            longitude: Some(0.0),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(names(&found), ["Null Island"]);
}

fn search_sorts_by_rating_not_distance(repo: &mut dyn HospitalRepository) {
    // ~1 km and ~5 km north of the query point.
    repo.add_hospital(&at("Close", 10.009, 10.0, 3.0)).unwrap();
    repo.add_hospital(&at("Further", 10.045, 10.0, 4.5))
        .unwrap();
    let found = repo
        .search(&SearchQuery {
            latitude: Some(10.0),
            longitude: Some(10.0),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(names(&found), ["Further", "Close"]);
}

fn get_by_id_without_treatments(repo: &mut dyn HospitalRepository) {
    let created = repo.add_hospital(&hospital_a()).unwrap();
    let fetched = repo.get_by_id(created.id).unwrap();
    assert_eq!(fetched.hospital.id, created.id);
    assert_eq!(fetched.hospital.name, "Hospital A");
    assert_eq!(fetched.hospital.specialties, ["Cardiology"]);
    assert_eq!(fetched.hospital.phone.as_deref(), Some("+1 415 555 0100"));
    assert!(fetched.hospital.email.is_none());
    assert!(fetched.treatments.is_empty());
}

fn get_by_id_unknown_is_not_found(repo: &mut dyn HospitalRepository) {
    repo.add_hospital(&hospital_a()).unwrap();
    match repo.get_by_id(9_999) {
        Err(DirectoryError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}

fn get_by_id_sorts_treatments_by_name(repo: &mut dyn HospitalRepository) {
    let h = repo.add_hospital(&hospital_a()).unwrap();
    let other = repo.add_hospital(&hospital_b()).unwrap();
    repo.add_treatment(h.id, &treatment("X-Ray", 60.0)).unwrap();
    repo.add_treatment(h.id, &treatment("Blood Panel", 40.0))
        .unwrap();
    repo.add_treatment(other.id, &treatment("MRI Scan", 500.0))
        .unwrap();

    let fetched = repo.get_by_id(h.id).unwrap();
    let treatment_names: Vec<&str> = fetched.treatments.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(treatment_names, ["Blood Panel", "X-Ray"]);
    assert!(fetched.treatments.iter().all(|t| t.hospital_id == h.id));
}

fn add_treatment_unknown_hospital(repo: &mut dyn HospitalRepository) {
    match repo.add_treatment(42, &treatment("MRI Scan", 10.0)) {
        Err(DirectoryError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}

fn duplicate_specialties_collapse(repo: &mut dyn HospitalRepository) {
    let mut req = hospital_a();
    req.specialties = vec![
        "Cardiology".to_string(),
        "Oncology".to_string(),
        "Cardiology".to_string(),
    ];
    let created = repo.add_hospital(&req).unwrap();
    assert_eq!(created.specialties, ["Cardiology", "Oncology"]);
    let fetched = repo.get_by_id(created.id).unwrap();
    assert_eq!(fetched.hospital.specialties, ["Cardiology", "Oncology"]);
}

fn compare_general_checkup(repo: &mut dyn HospitalRepository) {
    let a = repo.add_hospital(&hospital_a()).unwrap();
    let b = repo.add_hospital(&hospital_b()).unwrap();
    repo.add_treatment(a.id, &treatment("General Checkup", 100.0))
        .unwrap();
    repo.add_treatment(b.id, &treatment("General Checkup", 80.0))
        .unwrap();

    let cmp = repo.compare_treatment_prices("General Checkup").unwrap();
    assert_eq!(cmp.treatment_name, "General Checkup");
    assert_eq!(cmp.hospitals.len(), 2);
    assert_eq!(cmp.hospitals[0].hospital.name, "Hospital B");
    assert_eq!(cmp.hospitals[0].price, 80.0);
    assert_eq!(cmp.hospitals[0].hospital.specialties, ["Surgery"]);
    assert_eq!(cmp.hospitals[1].hospital.name, "Hospital A");
    assert_eq!(cmp.hospitals[1].price, 100.0);
    assert_eq!(
        cmp.hospitals[1].description.as_deref(),
        Some("General Checkup at list price")
    );
}

fn compare_is_case_insensitive_substring(repo: &mut dyn HospitalRepository) {
    let a = repo.add_hospital(&hospital_a()).unwrap();
    let b = repo.add_hospital(&hospital_b()).unwrap();
    let c = repo.add_hospital(&at("Hospital C", 0.0, 0.0, 3.5)).unwrap();
    repo.add_treatment(a.id, &treatment("MRI Scan", 450.0)).unwrap();
    repo.add_treatment(b.id, &treatment("Brain mri", 300.0)).unwrap();
    repo.add_treatment(c.id, &treatment("MRI Scan", 610.0)).unwrap();
    repo.add_treatment(c.id, &treatment("CT Scan", 90.0)).unwrap();

    let cmp = repo.compare_treatment_prices("mri").unwrap();
    let prices: Vec<f64> = cmp.hospitals.iter().map(|o| o.price).collect();
    assert_eq!(prices, [300.0, 450.0, 610.0]);
    let best = cmp.hospitals[0].price;
    assert!(cmp.hospitals.iter().all(|o| best <= o.price));
}

fn compare_without_match_is_empty(repo: &mut dyn HospitalRepository) {
    let a = repo.add_hospital(&hospital_a()).unwrap();
    repo.add_treatment(a.id, &treatment("MRI Scan", 450.0)).unwrap();
    let cmp = repo.compare_treatment_prices("nonexistent-xyz").unwrap();
    assert_eq!(cmp.treatment_name, "nonexistent-xyz");
    assert!(cmp.hospitals.is_empty());
}

fn compare_treats_wildcards_literally(repo: &mut dyn HospitalRepository) {
    let a = repo.add_hospital(&hospital_a()).unwrap();
    repo.add_treatment(a.id, &treatment("MRI Scan", 450.0)).unwrap();
    assert!(repo.compare_treatment_prices("%").unwrap().hospitals.is_empty());
    assert!(repo.compare_treatment_prices("M_I").unwrap().hospitals.is_empty());
}
