//! Control application: set interactive elements and signal the page's own update logic.
//!
//! Applying a control never waits for the page to react; that is the
//! reload synchronizer's job, so several controls can be set back-to-back
//! before a single wait.

use crate::error::{EngineError, EngineResult};
use crate::page::PageSession;
use crate::types::{ControlId, ControlSetting, ControlValue};

/// Set one control on the live page.
///
/// Fails with `ControlNotFound` if the element is absent at call time.
pub async fn apply_control(
    session: &mut dyn PageSession,
    setting: &ControlSetting,
) -> EngineResult<()> {
    let selector = setting.control.selector();
    let found = match &setting.value {
        ControlValue::Toggle(on) => session.set_checked(selector, *on).await?,
        ControlValue::Choice(value) => session.select_value(selector, value).await?,
    };

    if !found {
        return Err(EngineError::ControlNotFound(format!(
            "{} ({selector})",
            setting.control
        )));
    }

    tracing::debug!(control = %setting.control, value = ?setting.value, "control applied");
    Ok(())
}

/// Apply settings in order, skipping controls the current page variant lacks.
///
/// Returns the controls that were skipped. Any error other than
/// `ControlNotFound` aborts.
pub async fn apply_all(
    session: &mut dyn PageSession,
    settings: &[ControlSetting],
) -> EngineResult<Vec<ControlId>> {
    let mut skipped = Vec::new();

    for setting in settings {
        match apply_control(session, setting).await {
            Ok(()) => {}
            Err(EngineError::ControlNotFound(detail)) => {
                tracing::warn!("Skipping control: {detail}");
                skipped.push(setting.control);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(skipped)
}

/// Click the page's "apply configuration" trigger.
///
/// Fails with `ControlNotFound` if the trigger is absent.
pub async fn trigger_reload(session: &mut dyn PageSession) -> EngineResult<()> {
    let selector = ControlId::ApplyTrigger.selector();
    if !session.click(selector).await? {
        return Err(EngineError::ControlNotFound(format!(
            "{} ({selector})",
            ControlId::ApplyTrigger
        )));
    }
    tracing::debug!("reload triggered");
    Ok(())
}
