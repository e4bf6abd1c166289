//! CSV export for monthly simulation results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::model::types::MonthlyResult;

/// Column header for monthly result export.
pub const HEADER: &str = "month,outdoor_temp,outdoor_humidity,indoor_temp,indoor_humidity,\
                          supply_air_temp,occupancy,occupancy_rate,operation_hours,solar_radiation,\
                          load_wall_kw,load_window_kw,load_solar_kw,load_lighting_kw,\
                          load_oa_equipment_kw,load_person_sensible_kw,load_person_latent_kw,\
                          load_outdoor_air_latent_kw,sensible_load_kw,latent_load_kw,total_load_kw,shf,\
                          central_ahu_fan_kwh,central_chiller_kwh,central_total_kwh,\
                          local_fan_kwh,local_compressor_kwh,local_total_kwh,\
                          lighting_kwh,oa_equipment_kwh,outdoor_enthalpy,indoor_enthalpy";

/// Exports monthly results to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(results: &[MonthlyResult], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(results, buf)
}

/// Writes monthly results as CSV to any writer.
///
/// One header row, then one row per month. Output is deterministic for
/// identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(results: &[MonthlyResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in results {
        let kw = |v: f64| format!("{v:.4}");
        let kwh = |v: f64| format!("{v:.2}");
        wtr.write_record(&[
            r.month.to_string(),
            format!("{:.1}", r.outdoor_temp),
            format!("{:.1}", r.outdoor_humidity),
            format!("{:.1}", r.indoor_temp),
            format!("{:.1}", r.indoor_humidity),
            format!("{:.1}", r.supply_air_temp),
            r.occupancy.to_string(),
            format!("{:.2}", r.occupancy_rate),
            format!("{:.1}", r.operation_hours),
            format!("{:.1}", r.solar_radiation),
            kw(r.load_wall_kw),
            kw(r.load_window_kw),
            kw(r.load_solar_kw),
            kw(r.load_lighting_kw),
            kw(r.load_oa_equipment_kw),
            kw(r.load_person_sensible_kw),
            kw(r.load_person_latent_kw),
            kw(r.load_outdoor_air_latent_kw),
            kw(r.sensible_load_kw),
            kw(r.latent_load_kw),
            kw(r.total_load_kw),
            format!("{:.4}", r.shf),
            kwh(r.central_ahu_fan_kwh),
            kwh(r.central_chiller_kwh),
            kwh(r.central_total_kwh),
            kwh(r.local_fan_kwh),
            kwh(r.local_compressor_kwh),
            kwh(r.local_total_kwh),
            kwh(r.lighting_kwh),
            kwh(r.oa_equipment_kwh),
            format!("{:.3}", r.outdoor_enthalpy),
            format!("{:.3}", r.indoor_enthalpy),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
