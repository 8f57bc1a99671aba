use ambience_core::{HapticKind, HapticSink};
use tracing::debug;

/// Haptic sink for kiosks without a motor: pulses become trace events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHaptics;

impl HapticSink for TracingHaptics {
    fn pulse(&self, kind: HapticKind) {
        debug!(?kind, "Haptic pulse");
    }
}
