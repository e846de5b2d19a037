use fleetdesk_core::domain::{NewVehicle, RateTable, Vehicle};
use fleetdesk_core::gateway::StoreGateway;
use fleetdesk_core::notify::InMemoryNoticeSink;

use crate::FleetAddArgs;

use super::{notice_lines, open_console, CommandResult};

pub fn list() -> CommandResult {
    let console = match open_console("fleet list") {
        Ok(console) => console,
        Err(result) => return result,
    };

    let notices = InMemoryNoticeSink::default();
    let state = console.load_state(&notices);

    let mut lines: Vec<String> = state.vehicles.iter().map(render_vehicle).collect();
    if lines.is_empty() {
        lines.push("fleet is empty".to_string());
    }
    lines.extend(notice_lines(&notices));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

pub fn add(args: &FleetAddArgs) -> CommandResult {
    let console = match open_console("fleet add") {
        Ok(console) => console,
        Err(result) => return result,
    };

    let new = NewVehicle {
        brand: args.brand.clone(),
        license_plate: args.license_plate.clone(),
        vin: args.vin.clone(),
        year: args.year,
        rates: RateTable {
            hour4: args.price_4h,
            hour12: args.price_12h,
            day: args.price_day,
            month: args.price_month,
        },
        inspection_until: args.inspection_until,
        insurance_note: args.insurance.clone(),
        vignette_until: args.vignette_until,
    };

    match console.runtime.block_on(console.gateway.insert_vehicle(&new)) {
        Ok(vehicle) => CommandResult::success(
            "fleet add",
            format!("vehicle {} added as {}", vehicle.label(), vehicle.id.0),
        ),
        Err(error) => CommandResult::halted("fleet add", error.class(), error.to_string()),
    }
}

fn render_vehicle(vehicle: &Vehicle) -> String {
    let day_rate = vehicle
        .rates
        .day
        .map(|rate| format!("{rate} CZK/day"))
        .unwrap_or_else(|| "no day rate".to_string());
    format!(
        "#{} {} | {day_rate} | inspection until {} | vignette until {}",
        vehicle.id.0,
        vehicle.label(),
        vehicle.inspection_until,
        vehicle.vignette_until,
    )
}
