//! CSV loaders for fleet and hospital seed data.
//!
//! # Vehicles
//!
//! ```csv
//! id,unit_code,class,lat,lng,area
//! 0,PUN-A1,ALS,18.5308,73.8475,Shivajinagar
//! 1,PUN-B1,BLS,18.5074,73.8077,Kothrud
//! ```
//!
//! `class` is `ALS`/`BLS` (or `advanced`/`basic`).  `lat`/`lng` is the home
//! base; every vehicle starts there, available.
//!
//! # Hospitals
//!
//! ```csv
//! id,name,lat,lng,critical_care_beds,trauma_capable,cath_lab,specialties
//! 0,Sassoon General,18.5286,73.8740,12,true,true,trauma;cardiology
//! 1,Clinic Without Address,,,2,false,false,
//! ```
//!
//! Empty `lat`/`lng` means the hospital has no known location; it is loaded
//! but never matched.  `specialties` is `;`-separated.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use ems_core::{GeoPoint, Hospital, HospitalId, Vehicle, VehicleClass, VehicleId};

use crate::{DispatchError, DispatchResult};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct VehicleRecord {
    id:        u32,
    unit_code: String,
    class:     String,
    lat:       f64,
    lng:       f64,
    #[serde(default)]
    area:      String,
}

#[derive(Deserialize)]
struct HospitalRecord {
    id:                 u32,
    name:               String,
    lat:                Option<f64>,
    lng:                Option<f64>,
    #[serde(default)]
    critical_care_beds: u32,
    #[serde(default)]
    trauma_capable:     bool,
    #[serde(default)]
    cath_lab:           bool,
    #[serde(default)]
    specialties:        String,
}

// ── Public API ────────────────────────────────────────────────────────────────

pub fn load_vehicles_csv(path: &Path) -> DispatchResult<Vec<Vehicle>> {
    let file = std::fs::File::open(path)?;
    load_vehicles_reader(file)
}

/// Like [`load_vehicles_csv`] but accepts any `Read` source.
pub fn load_vehicles_reader<R: Read>(reader: R) -> DispatchResult<Vec<Vehicle>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut out = Vec::new();

    for (row, result) in csv_reader.deserialize::<VehicleRecord>().enumerate() {
        let r = result.map_err(|e| DispatchError::Parse(e.to_string()))?;
        let class: VehicleClass = r
            .class
            .parse()
            .map_err(|e| DispatchError::Parse(format!("vehicle row {row}: {e}")))?;
        let base = GeoPoint::try_new(r.lat, r.lng)?;
        out.push(Vehicle::new(VehicleId(r.id), r.unit_code, class, base, r.area));
    }
    Ok(out)
}

pub fn load_hospitals_csv(path: &Path) -> DispatchResult<Vec<Hospital>> {
    let file = std::fs::File::open(path)?;
    load_hospitals_reader(file)
}

/// Like [`load_hospitals_csv`] but accepts any `Read` source.
pub fn load_hospitals_reader<R: Read>(reader: R) -> DispatchResult<Vec<Hospital>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut out = Vec::new();

    for (row, result) in csv_reader.deserialize::<HospitalRecord>().enumerate() {
        let r = result.map_err(|e| DispatchError::Parse(e.to_string()))?;
        let position = match (r.lat, r.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::try_new(lat, lng)?),
            (None, None) => None,
            _ => {
                return Err(DispatchError::Parse(format!(
                    "hospital row {row}: lat and lng must both be set or both be empty"
                )));
            }
        };

        let mut hospital = Hospital::new(HospitalId(r.id), r.name, position);
        hospital.critical_care_beds = r.critical_care_beds;
        hospital.trauma_capable = r.trauma_capable;
        hospital.cath_lab = r.cath_lab;
        hospital.specialties = r
            .specialties
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
        out.push(hospital);
    }
    Ok(out)
}
