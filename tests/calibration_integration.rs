//! Integration tests for grid search and differential-evolution calibration.

mod common;

use bem_sim::calibration::{
    ActualDataPoint, CalibrationMethod, CalibrationOptions, CalibrationRequest, CancellationToken,
    ComparisonTarget, FAILED_TRIAL_PENALTY, ParameterField, ParameterRange, SearchStatus, calibrate,
    compare,
};
use bem_sim::error::CalibrationError;

/// Request whose metered data comes from the modern preset with `wall_u_value = 0.5`.
fn wall_request(ranges: Vec<ParameterRange>) -> CalibrationRequest {
    let base = common::modern();
    let truth = common::with_parameter(&base, ParameterField::WallUValue, 0.5);
    CalibrationRequest::new(&base, common::synthetic_actual(&truth), ComparisonTarget::Total, ranges)
}

fn wall_range(num_steps: usize) -> ParameterRange {
    ParameterRange::with_steps(ParameterField::WallUValue, 0.1, 0.9, num_steps)
}

#[test]
fn grid_with_n_steps_returns_n_ranked_results() {
    let req = wall_request(vec![wall_range(7)]);
    let out = calibrate(&req, CalibrationMethod::Grid, &CalibrationOptions::default(), None).unwrap();
    assert_eq!(out.method, CalibrationMethod::Grid);
    assert_eq!(out.status, SearchStatus::Exhaustive);
    assert_eq!(out.results.len(), 7);
    let first = out.results.first().unwrap().metrics.rmse;
    let last = out.results.last().unwrap().metrics.rmse;
    assert!(first <= last);
    assert!(out.results.windows(2).all(|w| w[0].metrics.rmse <= w[1].metrics.rmse));
}

#[test]
fn grid_recovers_ground_truth() {
    let req = wall_request(vec![wall_range(9)]);
    let out = calibrate(&req, CalibrationMethod::Grid, &CalibrationOptions::default(), None).unwrap();
    let best = out.best().unwrap();
    let value = best.value_of(ParameterField::WallUValue).unwrap();
    assert!((value - 0.5).abs() < 0.1, "best wall U {value}");
    assert!(best.metrics.rmse < 1e-6, "best RMSE {}", best.metrics.rmse);
    assert_eq!(best.simulation_results.as_ref().map(Vec::len), Some(12));
}

#[test]
fn grid_on_two_parameters_covers_the_product() {
    let req = wall_request(vec![
        wall_range(3),
        ParameterRange::with_step(ParameterField::LocalAcCop, 3.0, 5.0, 1.0),
    ]);
    let out = calibrate(&req, CalibrationMethod::Grid, &CalibrationOptions::default(), None).unwrap();
    assert_eq!(out.results.len(), 9);
    assert!(out.results.iter().all(|r| r.parameters.len() == 2));
}

#[test]
fn oversized_grid_is_sampled() {
    let req = wall_request(vec![
        wall_range(10),
        ParameterRange::with_steps(ParameterField::WindowUValue, 1.0, 3.0, 10),
    ]);
    let options = CalibrationOptions {
        max_combinations: 40,
        ..CalibrationOptions::default()
    };
    let out = calibrate(&req, CalibrationMethod::Grid, &options, None).unwrap();
    assert_eq!(out.status, SearchStatus::Sampled { total_combinations: 100 });
    assert_eq!(out.results.len(), 40);

    let again = calibrate(&req, CalibrationMethod::Grid, &options, None).unwrap();
    assert_eq!(out.results, again.results);
}

#[test]
fn grid_axis_beyond_usize_is_rejected() {
    let req = wall_request(vec![ParameterRange::with_step(ParameterField::WallUValue, 0.0, 1e300, 1.0)]);
    assert!(req.validate().is_ok());
    let out = calibrate(&req, CalibrationMethod::Grid, &CalibrationOptions::default(), None);
    assert!(matches!(out, Err(CalibrationError::GridTooLarge(_))));
}

#[test]
fn grid_with_huge_step_count_is_sampled() {
    let req = wall_request(vec![ParameterRange::with_steps(
        ParameterField::WallUValue,
        0.1,
        0.9,
        usize::MAX / 2,
    )]);
    let options = CalibrationOptions {
        max_combinations: 20,
        ..CalibrationOptions::default()
    };
    let out = calibrate(&req, CalibrationMethod::Grid, &options, None).unwrap();
    assert_eq!(
        out.status,
        SearchStatus::Sampled {
            total_combinations: usize::MAX / 2
        }
    );
    assert_eq!(out.results.len(), 20);
    assert!(out.results.iter().all(|r| {
        let v = r.value_of(ParameterField::WallUValue).unwrap();
        (0.1..=0.9).contains(&v)
    }));
}

#[test]
fn failed_grid_trials_rank_last() {
    let req = CalibrationRequest::new(
        &common::modern(),
        common::synthetic_actual(&common::modern()),
        ComparisonTarget::Central,
        vec![ParameterRange::with_steps(ParameterField::CentralChillerCop, 0.0, 4.5, 4)],
    );
    let out = calibrate(&req, CalibrationMethod::Grid, &CalibrationOptions::default(), None).unwrap();
    assert_eq!(out.results.len(), 4);
    let last = out.results.last().unwrap();
    assert_eq!(last.value_of(ParameterField::CentralChillerCop), Some(0.0));
    assert_eq!(last.metrics.rmse, FAILED_TRIAL_PENALTY);
    assert!(last.simulation_results.is_none());
    assert_eq!(out.best().unwrap().metrics.rmse, 0.0);
}

#[test]
fn optimizer_recovers_ground_truth() {
    let req = wall_request(vec![wall_range(10)]);
    let out = calibrate(&req, CalibrationMethod::Optimize, &CalibrationOptions::default(), None).unwrap();
    assert!(matches!(
        out.status,
        SearchStatus::Converged | SearchStatus::MaxIterations
    ));
    let best = out.best().unwrap();
    let value = best.value_of(ParameterField::WallUValue).unwrap();
    assert!((value - 0.5).abs() < 0.01, "best wall U {value}");
    assert!(best.simulation_results.is_some());
}

#[test]
fn optimizer_survives_failing_trials() {
    let req = CalibrationRequest::new(
        &common::modern(),
        common::synthetic_actual(&common::modern()),
        ComparisonTarget::Central,
        vec![ParameterRange::with_steps(ParameterField::CentralChillerCop, 0.0, 0.0, 1)],
    );
    let options = CalibrationOptions::default();
    let out = calibrate(&req, CalibrationMethod::Optimize, &options, None).unwrap();
    // every trial divides by a zero COP, so energies are flat at the penalty
    assert_eq!(out.status, SearchStatus::Converged);
    assert_eq!(out.evaluations, 2 * options.population_size);
    // failed trials never enter the history
    assert_eq!(out.results.len(), 1);
    let best = out.best().unwrap();
    assert_eq!(best.metrics.rmse, FAILED_TRIAL_PENALTY);
    assert_eq!(best.value_of(ParameterField::CentralChillerCop), Some(0.0));
    assert!(best.simulation_results.is_none());
}

#[test]
fn optimizer_returns_best_then_bounded_history() {
    let req = wall_request(vec![wall_range(10)]);
    let out = calibrate(&req, CalibrationMethod::Optimize, &CalibrationOptions::default(), None).unwrap();
    assert!(out.results.len() <= 11);
    assert!(out.results.len() > 1);
    assert!(out.results[1..].iter().all(|r| r.simulation_results.is_none()));
    let best = out.results[0].metrics.rmse;
    assert!(out.results[1..].iter().all(|r| r.metrics.rmse >= best));
}

#[test]
fn optimizer_is_reproducible_for_a_seed() {
    let req = wall_request(vec![
        wall_range(10),
        ParameterRange::with_steps(ParameterField::WindowUValue, 1.0, 2.5, 10),
    ]);
    let options = CalibrationOptions {
        seed: 11,
        max_iterations: 15,
        ..CalibrationOptions::default()
    };
    let a = calibrate(&req, CalibrationMethod::Optimize, &options, None).unwrap();
    let b = calibrate(&req, CalibrationMethod::Optimize, &options, None).unwrap();
    assert_eq!(a.results, b.results);
    assert_eq!(a.evaluations, b.evaluations);

    let single = CalibrationOptions {
        workers: Some(1),
        ..options.clone()
    };
    let c = calibrate(&req, CalibrationMethod::Optimize, &single, None).unwrap();
    assert_eq!(a.results, c.results);
}

#[test]
fn cancelled_searches_stop_early() {
    let req = wall_request(vec![wall_range(9)]);
    let token = CancellationToken::new();
    token.cancel();

    let grid = calibrate(&req, CalibrationMethod::Grid, &CalibrationOptions::default(), Some(&token)).unwrap();
    assert_eq!(grid.status, SearchStatus::Cancelled);
    assert!(grid.results.is_empty());

    let options = CalibrationOptions::default();
    let opt = calibrate(&req, CalibrationMethod::Optimize, &options, Some(&token)).unwrap();
    assert_eq!(opt.status, SearchStatus::Cancelled);
    // only the initial population was scored
    assert_eq!(opt.evaluations, options.population_size);
    assert!(opt.best().is_some());
}

#[test]
fn unknown_method_and_parameter_are_rejected() {
    assert!(matches!(
        "simplex".parse::<CalibrationMethod>(),
        Err(CalibrationError::UnknownMethod(_))
    ));
    assert!(matches!(
        "floor_spec.roof_u_value".parse::<ParameterField>(),
        Err(CalibrationError::UnknownParameter(_))
    ));
    let json = r#"{"parameter":"equipment_spec.heater_cop","min_value":1.0,"max_value":2.0}"#;
    assert!(serde_json::from_str::<ParameterRange>(json).is_err());
}

#[test]
fn actual_data_for_unsimulated_month_is_rejected() {
    let mut req = wall_request(vec![wall_range(3)]);
    req.actual_data.push(ActualDataPoint {
        month: 13,
        central_total_kwh: None,
        local_total_kwh: None,
        total_kwh: Some(100.0),
    });
    let out = calibrate(&req, CalibrationMethod::Grid, &CalibrationOptions::default(), None);
    assert!(matches!(
        out,
        Err(CalibrationError::InvalidActualData { row: 12, month: 13, .. })
    ));
}

#[test]
fn target_without_values_is_insufficient_data() {
    let mut req = wall_request(vec![wall_range(3)]);
    req.comparison_target = ComparisonTarget::Local;
    for p in &mut req.actual_data {
        p.local_total_kwh = None;
    }
    let out = calibrate(&req, CalibrationMethod::Optimize, &CalibrationOptions::default(), None);
    assert!(matches!(out, Err(CalibrationError::InsufficientData(_))));
}

#[test]
fn compare_reports_worst_month() {
    let base = common::modern();
    let mut actual = common::synthetic_actual(&base);
    actual[6].total_kwh = actual[6].total_kwh.map(|v| v + 500.0);
    let cmp = compare(&base, &actual, ComparisonTarget::Total).unwrap();
    assert_eq!(cmp.metrics.max_error_month, 7);
    assert!((cmp.metrics.max_error - 500.0).abs() < 1e-6);
}
