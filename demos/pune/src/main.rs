//! pune: end-to-end run of the dispatch engine over a small Pune fleet.
//!
//! Six ambulances and five hospitals are seeded from embedded CSV.  A handful
//! of calls come in, vehicles drive to the scenes, every incident is resolved
//! and the fleet drives home.  Updates stream into an in-memory store the
//! whole time.
//!
//! Environment:
//!
//! | Variable      | Effect                                              |
//! |---------------|-----------------------------------------------------|
//! | `EMS_CONFIG`  | Path to a JSON `DispatchConfig` (demo preset if unset) |
//! | `EMS_OSRM`    | Any value: route via the public OSRM servers first  |
//! | `RUST_LOG`    | Log filter, default `info`                          |

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use anyhow::{Result, bail};
use tokio::time::{Instant, sleep, timeout};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ems_core::{GeoPoint, IncidentStatus};
use ems_dispatch::{
    DispatchConfig, DispatchOutcome, Dispatcher, DispatcherBuilder, ExternalRouter, MemoryStore,
    OsrmRouter, load_hospitals_reader, load_vehicles_reader, pump_updates,
};

// ── Seed data ─────────────────────────────────────────────────────────────────

const VEHICLES_CSV: &str = "\
id,unit_code,class,lat,lng,area\n\
0,PUN-A1,ALS,18.5308,73.8475,Shivajinagar\n\
1,PUN-A2,ALS,18.5590,73.7868,Aundh\n\
2,PUN-B1,BLS,18.5074,73.8077,Kothrud\n\
3,PUN-B2,BLS,18.5018,73.8636,Swargate\n\
4,PUN-B3,BLS,18.5679,73.9143,Viman Nagar\n\
5,PUN-A3,ALS,18.4575,73.8508,Katraj\n\
";

const HOSPITALS_CSV: &str = "\
id,name,lat,lng,critical_care_beds,trauma_capable,cath_lab,specialties\n\
0,Sassoon General,18.5286,73.8740,24,true,true,trauma;cardiology;burns\n\
1,Ruby Hall Clinic,18.5335,73.8776,14,true,true,cardiology\n\
2,Deenanath Mangeshkar,18.5030,73.8290,18,true,true,neurology;cardiology\n\
3,Bharati Hospital,18.4580,73.8560,10,true,false,trauma\n\
4,Ward Dispensary,,,0,false,false,\n\
";

/// (description, caller's area)
const CALLS: &[(&str, &str)] = &[
    ("Elderly man collapsed at home, not breathing", "Shivajinagar"),
    ("Two-wheeler crash near the flyover, rider bleeding", "Swargate"),
    ("Child with asthma attack, wheezing", "Kothrud"),
    ("Kitchen fire, woman with burns on both arms", "Viman Nagar"),
    ("Sudden slurred speech and weakness, possible stroke", "Katraj"),
];

const SWARGATE: GeoPoint = GeoPoint::new(18.5018, 73.8636);

// ── Config ────────────────────────────────────────────────────────────────────

/// Compressed enough that a full round trip takes well under a minute.
fn demo_config() -> DispatchConfig {
    DispatchConfig {
        time_compression:        40.0,
        min_leg_secs:            3,
        tick_interval_ms:        250,
        return_tick_interval_ms: 400,
        ..DispatchConfig::default()
    }
}

fn load_config() -> Result<DispatchConfig> {
    match std::env::var_os("EMS_CONFIG") {
        Some(path) => Ok(DispatchConfig::from_path(Path::new(&path))?),
        None => Ok(demo_config()),
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== pune: emergency dispatch ===");

    let config = load_config()?;
    let vehicles = load_vehicles_reader(Cursor::new(VEHICLES_CSV))?;
    let hospitals = load_hospitals_reader(Cursor::new(HOSPITALS_CSV))?;
    println!("Fleet: {} vehicles  |  Hospitals: {}", vehicles.len(), hospitals.len());

    let builder = DispatcherBuilder::new(config.clone())
        .vehicles(vehicles)
        .hospitals(hospitals);

    if std::env::var_os("EMS_OSRM").is_some() {
        let osrm = OsrmRouter::new(config.osrm_endpoints.clone(), config.external_timeout())?;
        println!("Routing: OSRM ({} endpoints) with grid fallback", osrm.endpoints().len());
        run(builder.external_router(osrm)).await
    } else {
        println!("Routing: grid only");
        run(builder).await
    }
}

async fn run<X: ExternalRouter>(builder: DispatcherBuilder<X>) -> Result<()> {
    let (dispatcher, updates) = builder.build()?;
    let pump = tokio::spawn(async move {
        let mut store = MemoryStore::new();
        let counts = pump_updates(updates, &mut store).await;
        (store, counts)
    });

    // 1. Congestion around Swargate before the calls come in.
    let slowed = dispatcher.update_traffic(SWARGATE, 1.5, 2.5)?;
    info!(nodes = slowed, "traffic slowdown applied");

    // 2. Calls.
    println!();
    println!("{:<5} {:<4} {:<13} {:<8} {:<10} {:<9} {:>4}", "Inc", "Sev", "Category", "Vehicle", "Hospital", "Route", "ETA");
    println!("{}", "-".repeat(60));
    for &(description, area) in CALLS {
        let report = dispatcher.report_call(description, area).await?;
        let (vehicle, hospital, source, eta) = match &report.outcome {
            Some(DispatchOutcome::Dispatched { vehicle, hospital, eta_minutes, source }) => (
                vehicle.0.to_string(),
                hospital.map_or_else(|| "-".to_owned(), |h| h.0.to_string()),
                format!("{source:?}"),
                eta_minutes.to_string(),
            ),
            other => (format!("{other:?}"), "-".to_owned(), "-".to_owned(), "-".to_owned()),
        };
        println!(
            "{:<5} {:<4} {:<13} {:<8} {:<10} {:<9} {:>4}",
            report.incident.0,
            report.triage.severity.as_code(),
            report.triage.category.as_str(),
            vehicle,
            hospital,
            source,
            eta,
        );
    }

    // 3. Wait for every dispatched vehicle to reach its scene.
    wait_until(&dispatcher, "vehicles on scene", Duration::from_secs(180), |d| {
        d.incidents()
            .iter()
            .all(|i| !matches!(i.status, IncidentStatus::Assigned | IncidentStatus::EnRoute))
    })
    .await?;
    println!();
    println!("All dispatched vehicles on scene.");

    // 4. Resolve everything; queued incidents get picked up as vehicles free.
    let deadline = Instant::now() + Duration::from_secs(600);
    loop {
        let open: Vec<_> = dispatcher
            .incidents()
            .into_iter()
            .filter(|i| i.status == IncidentStatus::OnScene)
            .map(|i| i.id)
            .collect();
        for id in &open {
            dispatcher.resolve(*id).await?;
        }
        let unresolved = dispatcher.incidents().iter().filter(|i| i.status != IncidentStatus::Resolved).count();
        if unresolved == 0 {
            break;
        }
        if Instant::now() >= deadline {
            bail!("{unresolved} incidents still unresolved");
        }
        sleep(Duration::from_millis(500)).await;
        wait_until(&dispatcher, "queued incidents served", Duration::from_secs(180), |d| {
            d.incidents()
                .iter()
                .all(|i| !matches!(i.status, IncidentStatus::Assigned | IncidentStatus::EnRoute))
        })
        .await?;
    }

    // 5. Wait for the fleet to get home.
    wait_until(&dispatcher, "fleet back at base", Duration::from_secs(180), |d| d.claims().is_empty()).await?;
    dispatcher.clear_traffic();

    println!();
    println!("{:<8} {:<4} {:<10} {:<13}", "Vehicle", "Cls", "Status", "Area");
    println!("{}", "-".repeat(38));
    for v in dispatcher.vehicles() {
        println!("{:<8} {:<4} {:<10} {:<13}", v.unit_code, v.class.to_string(), v.status.as_str(), v.area);
    }

    // 6. Stop, then let the pump drain.
    dispatcher.shutdown().await;
    drop(dispatcher);
    let (store, (applied, failed)) = timeout(Duration::from_secs(5), pump).await??;

    println!();
    println!("Store: {applied} updates applied, {failed} failed");
    println!("  position writes : {}", store.moves);
    println!("  incidents       : {}", store.incidents.len());
    for notice in &store.notices {
        println!(
            "  notice -> {:<22} ETA {:>3} min  {}",
            notice.hospital_name,
            notice.eta_minutes,
            notice.resources.join(", "),
        );
    }
    Ok(())
}

async fn wait_until<X: ExternalRouter>(
    dispatcher: &Dispatcher<X>,
    what:       &str,
    limit:      Duration,
    done:       impl Fn(&Dispatcher<X>) -> bool,
) -> Result<()> {
    let deadline = Instant::now() + limit;
    while !done(dispatcher) {
        if Instant::now() >= deadline {
            bail!("timed out waiting for {what}");
        }
        sleep(Duration::from_millis(250)).await;
    }
    Ok(())
}
