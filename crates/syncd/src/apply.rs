//! Apply-view driver.
//!
//! Two stages. The comparison runs on a copy of the current view, so a
//! failure there leaves both the device and the caller's view untouched
//! and is reported as [`SyncdError::Comparison`], which keeps whether the
//! cause was a consistency violation. Execution then replays
//! the optimized operation log; from that point every error is fatal. On
//! success the temporary view, now fully bound to real ids, becomes the
//! caller's current view.

use log::{info, warn};
use sonic_sai::SaiInterface;
use std::sync::Mutex;

use crate::comparison::ComparisonLogic;
use crate::config::ApplyViewConfig;
use crate::error::{Result, SyncdError};
use crate::executor::{check_consistency, AsicExecutor};
use crate::fatal;
use crate::switch::SwitchContext;
use crate::view::AsicView;

/// Outcome of one apply-view run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    /// Operations recorded by the comparison.
    pub operations: usize,
    /// Operations sent to the device after optimization.
    pub executed: usize,
    /// Read-back result, `None` when the check is disabled.
    pub consistent: Option<bool>,
}

fn into_fatal(err: SyncdError) -> SyncdError {
    if err.is_fatal() {
        err
    } else {
        fatal!("execution failed: {err}")
    }
}

/// Converges the device from `current` to `temp`.
pub fn apply_view<S: SaiInterface + ?Sized>(
    sai: &mut S,
    current: &mut AsicView,
    temp: AsicView,
    switch: &mut SwitchContext,
    config: &ApplyViewConfig,
) -> Result<ApplyReport> {
    config.validate()?;
    switch.set_policy(config.removal_policy()?);
    let breaks = config.break_config()?;

    let mut working = current.clone();
    let mut temp = temp;
    ComparisonLogic::new(&mut working, &mut temp, switch, &breaks, &config.engine)
        .compare_views()
        .map_err(|err| {
            warn!("apply view rejected, device untouched: {err}");
            SyncdError::Comparison {
                fatal: err.is_fatal(),
                message: err.to_string(),
            }
        })?;

    let operations = working.ops().len();
    info!("comparison done, {}", working.ops().summary());

    let ops = working
        .ops()
        .optimized(config.execution.optimize_removes, config.execution.collapse_operations)
        .map_err(into_fatal)?;
    let executed = AsicExecutor::new(&mut *sai, &mut working, &mut temp, switch, &config.execution)
        .execute(ops)
        .map_err(into_fatal)?;

    let consistent = if config.execution.consistency_check {
        Some(check_consistency(&*sai, &temp).map_err(into_fatal)?)
    } else {
        None
    };

    *current = temp.into_baseline().map_err(into_fatal)?;
    info!("apply view done, {executed} operations executed");

    Ok(ApplyReport {
        operations,
        executed,
        consistent,
    })
}

/// [`apply_view`] holding the device lock for the whole run, so no other
/// request reaches the device between comparison and execution.
pub fn apply_view_locked<S: SaiInterface>(
    device: &Mutex<S>,
    current: &mut AsicView,
    temp: AsicView,
    switch: &mut SwitchContext,
    config: &ApplyViewConfig,
) -> Result<ApplyReport> {
    let mut guard = device
        .lock()
        .map_err(|_| fatal!("device lock poisoned"))?;
    apply_view(&mut *guard, current, temp, switch, config)
}
