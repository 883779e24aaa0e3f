//! Narrow views of the device capabilities the host drives.
//!
//! The camera, the photo library and the date picker are native widgets owned
//! by the front end. The core only states what it needs from them so the
//! permission and cancellation rules can be exercised without a device.

use chrono::NaiveDate;
use log::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Cancelled,
    /// URI of the captured or chosen image.
    Selected(String),
}

/// A camera or a photo-library picker.
pub trait PhotoSource {
    /// Short label used in logs, e.g. `"camera"`.
    fn name(&self) -> &str;

    fn request_permission(&mut self) -> Permission;

    fn launch(&mut self) -> CaptureOutcome;
}

pub trait DatePicker {
    /// Shows the picker starting at `current`; `None` means the user left it unchanged.
    fn pick(&mut self, current: NaiveDate) -> Option<NaiveDate>;
}

/// Runs the permission check and then the capture flow.
///
/// Returns `None` when permission is denied or the user cancels; the picker is
/// never launched without permission.
pub fn acquire_photo(source: &mut dyn PhotoSource) -> Option<String> {
    if source.request_permission() == Permission::Denied {
        info!("Permission denied for {}, no photo attached", source.name());
        return None;
    }

    match source.launch() {
        CaptureOutcome::Selected(uri) => {
            debug!("{} returned {}", source.name(), uri);
            Some(uri)
        }
        CaptureOutcome::Cancelled => {
            debug!("{} cancelled", source.name());
            None
        }
    }
}
