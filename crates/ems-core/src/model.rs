//! Domain records: vehicles, incidents, hospitals, and their state enums.
//!
//! These are plain values.  The fleet/incident registry that owns them lives
//! outside this crate; the dispatch engine reads them and requests changes to
//! vehicle location/status and incident lifecycle.

use std::fmt;
use std::str::FromStr;

use crate::{CoreError, GeoPoint, HospitalId, IncidentId, VehicleId};

// ── Severity ──────────────────────────────────────────────────────────────────

/// Triage severity tier.  Ordered so that `High < Medium < Low`, i.e. sorting
/// ascending puts the most urgent incidents first.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    /// P1: cardiac arrest, severe trauma, unconscious, not breathing.
    High,
    /// P2: fractures, moderate bleeding, chest pain, stroke symptoms.
    #[default]
    Medium,
    /// P3: minor, non-life-threatening.
    Low,
}

impl Severity {
    /// Golden-hour budget in minutes from report to definitive care.
    /// Low-severity incidents carry no limit.
    pub fn golden_hour_minutes(self) -> Option<u32> {
        match self {
            Severity::High   => Some(60),
            Severity::Medium => Some(90),
            Severity::Low    => None,
        }
    }

    /// Short priority code used by call-takers.
    pub fn as_code(self) -> &'static str {
        match self {
            Severity::High   => "P1",
            Severity::Medium => "P2",
            Severity::Low    => "P3",
        }
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p1" | "high" | "critical"  => Ok(Severity::High),
            "p2" | "medium" | "urgent"  => Ok(Severity::Medium),
            "p3" | "low" | "stable"     => Ok(Severity::Low),
            other => Err(CoreError::Parse(format!("unknown severity {other:?}"))),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

// ── Category ──────────────────────────────────────────────────────────────────

/// Incident category tag produced by triage.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Category {
    Cardiac,
    Trauma,
    Accident,
    Burns,
    Respiratory,
    Neurological,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Cardiac      => "cardiac",
            Category::Trauma       => "trauma",
            Category::Accident     => "accident",
            Category::Burns        => "burns",
            Category::Respiratory  => "respiratory",
            Category::Neurological => "neurological",
            Category::Other        => "other",
        }
    }
}

impl FromStr for Category {
    type Err = CoreError;

    /// Unknown tags map to [`Category::Other`]; classifiers invent new labels
    /// and an unrecognised one must not drop the incident.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "cardiac"      => Category::Cardiac,
            "trauma"       => Category::Trauma,
            "accident"     => Category::Accident,
            "burns"        => Category::Burns,
            "respiratory"  => Category::Respiratory,
            "neurological" => Category::Neurological,
            _              => Category::Other,
        })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Vehicle ───────────────────────────────────────────────────────────────────

/// Ambulance capability tier.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VehicleClass {
    /// Advanced life support (higher acuity).
    Advanced,
    /// Basic life support (lower acuity).
    Basic,
}

impl FromStr for VehicleClass {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "als" | "advanced" => Ok(VehicleClass::Advanced),
            "bls" | "basic"    => Ok(VehicleClass::Basic),
            other => Err(CoreError::Parse(format!("unknown vehicle class {other:?}"))),
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VehicleClass::Advanced => "ALS",
            VehicleClass::Basic    => "BLS",
        })
    }
}

/// Operational state of an ambulance.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VehicleStatus {
    /// Idle and eligible for assignment.
    #[default]
    Available,
    /// Committed to an incident: driving to it or working on scene.
    Dispatched,
    /// Heading back to base after its incident was resolved.
    Returning,
    /// Offline; never considered for assignment.
    OutOfService,
}

impl VehicleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleStatus::Available    => "available",
            VehicleStatus::Dispatched   => "dispatched",
            VehicleStatus::Returning    => "returning",
            VehicleStatus::OutOfService => "offline",
        }
    }
}

impl FromStr for VehicleStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" | "idle"                       => Ok(VehicleStatus::Available),
            "dispatched" | "enroute" | "en-route"      => Ok(VehicleStatus::Dispatched),
            "returning"                                => Ok(VehicleStatus::Returning),
            "offline" | "out-of-service" | "out_of_service" => Ok(VehicleStatus::OutOfService),
            other => Err(CoreError::Parse(format!("unknown vehicle status {other:?}"))),
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ambulance as seen by the dispatch engine.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vehicle {
    pub id:        VehicleId,
    /// Radio call sign, e.g. `"PUN-A1"`.  Used in logs only.
    pub unit_code: String,
    pub class:     VehicleClass,
    pub status:    VehicleStatus,
    /// Current location.
    pub position:  GeoPoint,
    /// Home station the vehicle returns to after each incident.
    pub base:      GeoPoint,
    /// Free-text operating area, matched against incident areas for affinity.
    pub area:      String,
}

impl Vehicle {
    /// An available vehicle parked at its base.
    pub fn new(
        id:        VehicleId,
        unit_code: impl Into<String>,
        class:     VehicleClass,
        base:      GeoPoint,
        area:      impl Into<String>,
    ) -> Self {
        Self {
            id,
            unit_code: unit_code.into(),
            class,
            status: VehicleStatus::Available,
            position: base,
            base,
            area: area.into(),
        }
    }
}

// ── Incident ──────────────────────────────────────────────────────────────────

/// Lifecycle of an incident.
///
/// ```text
/// Reported → Assigned → EnRoute → OnScene → Resolved
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IncidentStatus {
    #[default]
    Reported,
    Assigned,
    EnRoute,
    OnScene,
    Resolved,
}

impl IncidentStatus {
    /// `true` while a vehicle is committed to the incident.
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(
            self,
            IncidentStatus::Assigned | IncidentStatus::EnRoute | IncidentStatus::OnScene
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IncidentStatus::Reported => "reported",
            IncidentStatus::Assigned => "assigned",
            IncidentStatus::EnRoute  => "en-route",
            IncidentStatus::OnScene  => "on-scene",
            IncidentStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reported emergency.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Incident {
    pub id:                IncidentId,
    pub position:          GeoPoint,
    pub severity:          Severity,
    pub category:          Category,
    /// Free-text location description ("Karve Road near Nal Stop").
    pub area:              String,
    /// Caller's description, kept for handoff and audit.
    pub description:       String,
    pub status:            IncidentStatus,
    pub assigned_vehicle:  Option<VehicleId>,
    pub assigned_hospital: Option<HospitalId>,
    /// Vehicle → incident geometry, once planned.
    pub dispatch_route:    Option<Vec<GeoPoint>>,
    /// Incident → hospital geometry, once planned.
    pub hospital_route:    Option<Vec<GeoPoint>>,
}

impl Incident {
    /// A freshly reported, unassigned incident.
    pub fn new(
        id:       IncidentId,
        position: GeoPoint,
        severity: Severity,
        category: Category,
        area:     impl Into<String>,
    ) -> Self {
        Self {
            id,
            position,
            severity,
            category,
            area: area.into(),
            description: String::new(),
            status: IncidentStatus::Reported,
            assigned_vehicle: None,
            assigned_hospital: None,
            dispatch_route: None,
            hospital_route: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

// ── Hospital ──────────────────────────────────────────────────────────────────

/// A receiving hospital.  Read-only to the engine.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hospital {
    pub id:                 HospitalId,
    pub name:               String,
    /// Hospitals without a known location are skipped during matching.
    pub position:           Option<GeoPoint>,
    /// Immediately usable critical-care (ICU) beds.
    pub critical_care_beds: u32,
    pub trauma_capable:     bool,
    /// Cardiac catheterisation lab on site.
    pub cath_lab:           bool,
    pub specialties:        Vec<String>,
}

impl Hospital {
    pub fn new(id: HospitalId, name: impl Into<String>, position: Option<GeoPoint>) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            critical_care_beds: 0,
            trauma_capable: false,
            cath_lab: false,
            specialties: Vec::new(),
        }
    }
}
