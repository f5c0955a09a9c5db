use super::adapter::{DeviceAdapter, TrackerAdapter};
use super::error::SyncError;
use crate::models::{Action, ObservedState, PositionTable};
use crate::reconcile::calculate_action;

/// Runs one reconciliation cycle.
///
/// Reads both sides, applies at most one corrective write, and returns the
/// snapshot observed *before* that write. The caller keeps it and passes it
/// back as `previous` next time, or drops it to `None` when this returns an
/// error so the next cycle starts from scratch.
pub async fn sync<T, D>(
    previous: Option<&ObservedState>,
    tracker: &T,
    device: &D,
    table: &PositionTable,
) -> Result<ObservedState, SyncError>
where
    T: TrackerAdapter + ?Sized,
    D: DeviceAdapter + ?Sized,
{
    let (tracker_state, device_state) = tokio::try_join!(
        async { tracker.get_current_state().await.map_err(SyncError::Tracker) },
        async { device.get_current_state().await.map_err(SyncError::Device) },
    )?;
    let current = ObservedState::new(tracker_state, device_state);

    let action = calculate_action(&current, previous, table);
    tracing::debug!(
        project = ?current.tracker.project_id,
        position = ?current.device.actual_position,
        bootstrap = previous.is_none(),
        %action,
        "sync action"
    );

    match action {
        Action::SetTrackerProject(project) => {
            tracker
                .set_current_state(project)
                .await
                .map_err(SyncError::Tracker)?;
            tracing::info!(%action, "updated tracker");
        }
        Action::SetDevicePosition(position) => {
            device
                .set_current_state(position)
                .await
                .map_err(SyncError::Device)?;
            tracing::info!(%action, "updated device");
        }
        Action::NoAction => {}
    }

    Ok(current)
}
