//! Post-hoc annual aggregates computed from monthly results.

use std::fmt;

use serde::Serialize;

use super::types::MonthlyResult;

/// Annual totals derived from a complete simulated year.
///
/// Computed from `&[MonthlyResult]` so the summary always agrees with the
/// rows it was built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualSummary {
    /// Number of months aggregated.
    pub months: usize,
    /// Central system energy over the year (kWh).
    pub annual_central_total_kwh: f64,
    /// Local system energy over the year (kWh).
    pub annual_local_total_kwh: f64,
    /// Lighting energy over the year (kWh).
    pub annual_lighting_kwh: f64,
    /// Office equipment energy over the year (kWh).
    pub annual_oa_equipment_kwh: f64,
    /// Thermal load integrated over operating hours (kWh).
    pub annual_total_load_kwh: f64,
    /// Mean of the monthly total loads (kW).
    pub average_monthly_load_kw: f64,
    /// Largest monthly total load (kW).
    pub peak_load_kw: f64,
    /// Month in which the peak load occurs (0 when empty).
    pub peak_load_month: u32,
}

impl AnnualSummary {
    /// Aggregates a sequence of monthly results. An empty slice yields zeros.
    pub fn from_results(results: &[MonthlyResult]) -> Self {
        let mut summary = Self {
            months: results.len(),
            annual_central_total_kwh: 0.0,
            annual_local_total_kwh: 0.0,
            annual_lighting_kwh: 0.0,
            annual_oa_equipment_kwh: 0.0,
            annual_total_load_kwh: 0.0,
            average_monthly_load_kw: 0.0,
            peak_load_kw: 0.0,
            peak_load_month: 0,
        };

        let mut load_sum = 0.0;
        let mut peak: Option<(f64, u32)> = None;
        for r in results {
            summary.annual_central_total_kwh += r.central_total_kwh;
            summary.annual_local_total_kwh += r.local_total_kwh;
            summary.annual_lighting_kwh += r.lighting_kwh;
            summary.annual_oa_equipment_kwh += r.oa_equipment_kwh;
            summary.annual_total_load_kwh += r.total_load_kw * r.operation_hours;
            load_sum += r.total_load_kw;
            if peak.is_none_or(|(kw, _)| r.total_load_kw > kw) {
                peak = Some((r.total_load_kw, r.month));
            }
        }

        if let Some((kw, month)) = peak {
            summary.average_monthly_load_kw = load_sum / results.len() as f64;
            summary.peak_load_kw = kw;
            summary.peak_load_month = month;
        }
        summary
    }

    /// Central plus local energy over the year (kWh).
    pub fn annual_hvac_total_kwh(&self) -> f64 {
        self.annual_central_total_kwh + self.annual_local_total_kwh
    }
}

impl fmt::Display for AnnualSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Annual Summary ({} months) ---", self.months)?;
        writeln!(f, "Central HVAC energy:   {:.0} kWh", self.annual_central_total_kwh)?;
        writeln!(f, "Local HVAC energy:     {:.0} kWh", self.annual_local_total_kwh)?;
        writeln!(f, "Lighting energy:       {:.0} kWh", self.annual_lighting_kwh)?;
        writeln!(f, "Equipment energy:      {:.0} kWh", self.annual_oa_equipment_kwh)?;
        writeln!(f, "Thermal load:          {:.0} kWh", self.annual_total_load_kwh)?;
        writeln!(f, "Mean monthly load:     {:.2} kW", self.average_monthly_load_kw)?;
        write!(
            f,
            "Peak load:             {:.2} kW (month {})",
            self.peak_load_kw, self.peak_load_month
        )
    }
}
