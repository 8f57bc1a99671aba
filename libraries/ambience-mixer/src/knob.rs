//! Continuous control input (volume knob)
//!
//! Translates a linear drag gesture into a bounded value (0-100).
//!
//! The visual position follows every gesture update, but the owner is only
//! notified once the rounded value is at least `notify_step` away from the
//! value at drag start. The end of a drag always reports the exact final
//! value, so the quantization never costs precision.
//!
//! The drag axis is inverted: a negative translation (towards the top of the
//! track) raises the value.

use crate::config::KnobSettings;
use crate::error::Result;
use ambience_core::HapticKind;

/// Output of a knob gesture step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnobEvent {
    /// The user started interacting (postpones the idle timeout)
    Interaction,
    /// A haptic pulse should be emitted
    Haptic(HapticKind),
    /// The knob value changed; the owner should adopt it
    ValueChanged(u8),
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    start_position: f32,
}

/// Drag-driven volume knob
#[derive(Debug, Clone)]
pub struct Knob {
    settings: KnobSettings,
    /// Normalized position (0.0 = bottom/min, 1.0 = top/max)
    position: f32,
    drag: Option<Drag>,
}

impl Knob {
    /// Create a knob showing `value`
    pub fn new(value: u8, settings: KnobSettings) -> Result<Self> {
        settings.validate()?;

        Ok(Self {
            settings,
            position: Self::position_for(value),
            drag: None,
        })
    }

    /// Current value (0-100)
    pub fn value(&self) -> u8 {
        Self::value_for(self.position)
    }

    /// Current normalized position (0.0 - 1.0)
    pub fn position(&self) -> f32 {
        self.position
    }

    /// Whether a drag is in progress
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Apply an external value change
    ///
    /// Ignored while a drag is in progress so a programmatic update never
    /// yanks the thumb from under the user's finger. Returns whether the value
    /// was applied.
    pub fn set_value(&mut self, value: u8) -> bool {
        if self.drag.is_some() {
            return false;
        }

        self.position = Self::position_for(value);
        true
    }

    /// Gesture start
    pub fn begin_drag(&mut self) -> Vec<KnobEvent> {
        self.drag = Some(Drag {
            start_position: self.position,
        });

        vec![KnobEvent::Interaction, KnobEvent::Haptic(HapticKind::Light)]
    }

    /// Gesture update with the total translation along the drag axis since the start
    pub fn update_drag(&mut self, translation: f32) -> Vec<KnobEvent> {
        let Some(drag) = self.drag else {
            return Vec::new();
        };

        if !translation.is_finite() {
            return Vec::new();
        }

        let normalized_delta = translation / self.settings.travel();
        self.position = (drag.start_position - normalized_delta).clamp(0.0, 1.0);

        let new_value = i16::from(self.value());
        let start_value = i16::from(Self::value_for(drag.start_position));

        if (new_value - start_value).abs() >= i16::from(self.settings.notify_step) {
            vec![KnobEvent::ValueChanged(self.value())]
        } else {
            Vec::new()
        }
    }

    /// Gesture end: report the final value unconditionally
    pub fn end_drag(&mut self) -> Vec<KnobEvent> {
        if self.drag.take().is_none() {
            return Vec::new();
        }

        let final_value = self.commit_final();
        vec![
            KnobEvent::ValueChanged(final_value),
            KnobEvent::Haptic(HapticKind::Light),
        ]
    }

    /// Gesture cancelled by the system
    ///
    /// The thumb stays where the last update left it (it does not jump back
    /// to the drag start) and that position is reported as the final value.
    pub fn cancel_drag(&mut self) -> Vec<KnobEvent> {
        if self.drag.take().is_none() {
            return Vec::new();
        }

        vec![KnobEvent::ValueChanged(self.commit_final())]
    }

    fn commit_final(&mut self) -> u8 {
        let value = self.value();

        match self.settings.snap_final_step {
            Some(step) => {
                let step = u16::from(step);
                let value16 = u16::from(value);
                let mut snapped = ((value16 + step / 2) / step * step).min(100);
                // 100 stays reachable even when the step does not divide it
                if 100 - value16 < value16.abs_diff(snapped) {
                    snapped = 100;
                }
                let snapped = snapped as u8;
                self.position = Self::position_for(snapped);
                snapped
            }
            None => value,
        }
    }

    fn position_for(value: u8) -> f32 {
        f32::from(value.min(100)) / 100.0
    }

    fn value_for(position: f32) -> u8 {
        (position * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 120 track - 56 thumb = 64 units of travel
    fn knob(value: u8) -> Knob {
        Knob::new(value, KnobSettings::default()).unwrap()
    }

    fn changes(events: &[KnobEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|event| match event {
                KnobEvent::ValueChanged(value) => Some(*value),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn begin_drag_reports_interaction_and_light_haptic() {
        let mut knob = knob(70);
        let events = knob.begin_drag();

        assert_eq!(
            events,
            vec![KnobEvent::Interaction, KnobEvent::Haptic(HapticKind::Light)]
        );
        assert!(knob.is_dragging());
    }

    #[test]
    fn dragging_up_raises_value() {
        let mut knob = knob(50);
        knob.begin_drag();

        // -32 units = half the travel upwards
        let events = knob.update_drag(-32.0);

        assert_eq!(knob.value(), 100);
        assert_eq!(changes(&events), vec![100]);
    }

    #[test]
    fn small_moves_are_not_reported() {
        let mut knob = knob(50);
        knob.begin_drag();

        // 2.56 units = 4%
        let events = knob.update_drag(-2.56);

        assert_eq!(knob.value(), 54);
        assert!(changes(&events).is_empty());
    }

    #[test]
    fn threshold_is_measured_from_drag_start() {
        let mut knob = knob(50);
        knob.begin_drag();

        // 3.2 units = 5%
        assert_eq!(changes(&knob.update_drag(3.2)), vec![45]);
        // Still 6% from the start value, so every further update reports
        assert_eq!(changes(&knob.update_drag(3.84)), vec![44]);
    }

    #[test]
    fn end_drag_reports_exact_value_below_threshold() {
        let mut knob = knob(50);
        knob.begin_drag();
        knob.update_drag(-1.28); // +2%

        let events = knob.end_drag();

        assert_eq!(
            events,
            vec![
                KnobEvent::ValueChanged(52),
                KnobEvent::Haptic(HapticKind::Light)
            ]
        );
        assert!(!knob.is_dragging());
    }

    #[test]
    fn value_is_clamped_at_both_ends() {
        let mut knob = knob(10);
        knob.begin_drag();
        knob.update_drag(1_000.0);
        assert_eq!(knob.value(), 0);

        knob.update_drag(-1_000.0);
        assert_eq!(knob.value(), 100);
        assert_eq!(knob.position(), 1.0);
    }

    #[test]
    fn external_value_is_ignored_while_dragging() {
        let mut knob = knob(40);
        knob.begin_drag();
        knob.update_drag(-6.4); // +10%

        assert!(!knob.set_value(70));
        assert_eq!(knob.value(), 50);

        knob.end_drag();
        assert!(knob.set_value(70));
        assert_eq!(knob.value(), 70);
    }

    #[test]
    fn cancel_keeps_live_position() {
        let mut knob = knob(40);
        knob.begin_drag();
        knob.update_drag(-12.8); // +20%

        let events = knob.cancel_drag();

        assert_eq!(events, vec![KnobEvent::ValueChanged(60)]);
        assert_eq!(knob.value(), 60);
        assert!(!knob.is_dragging());
    }

    #[test]
    fn updates_without_drag_are_ignored() {
        let mut knob = knob(40);

        assert!(knob.update_drag(-30.0).is_empty());
        assert!(knob.end_drag().is_empty());
        assert!(knob.cancel_drag().is_empty());
        assert_eq!(knob.value(), 40);
    }

    #[test]
    fn non_finite_translation_is_ignored() {
        let mut knob = knob(40);
        knob.begin_drag();

        assert!(knob.update_drag(f32::NAN).is_empty());
        assert!(knob.update_drag(f32::INFINITY).is_empty());
        assert_eq!(knob.value(), 40);
    }

    #[test]
    fn snap_policy_rounds_final_value() {
        let settings = KnobSettings {
            snap_final_step: Some(5),
            ..KnobSettings::default()
        };
        let mut knob = Knob::new(50, settings).unwrap();
        knob.begin_drag();
        knob.update_drag(-1.92); // +3% -> 53

        let events = knob.end_drag();

        assert_eq!(changes(&events), vec![55]);
        assert_eq!(knob.value(), 55);
    }

    #[test]
    fn snap_policy_keeps_extremes_reachable() {
        let settings = KnobSettings {
            snap_final_step: Some(30),
            ..KnobSettings::default()
        };
        let mut knob = Knob::new(80, settings).unwrap();
        knob.begin_drag();
        assert_eq!(changes(&knob.end_drag()), vec![90]);

        // 98 is nearer to 100 than to 90
        knob.set_value(98);
        knob.begin_drag();
        assert_eq!(changes(&knob.end_drag()), vec![100]);

        knob.begin_drag();
        knob.update_drag(-64.0);
        assert_eq!(changes(&knob.end_drag()), vec![100]);
        assert_eq!(knob.value(), 100);

        knob.begin_drag();
        knob.update_drag(64.0);
        assert_eq!(changes(&knob.end_drag()), vec![0]);
    }

    #[test]
    fn invalid_geometry_is_rejected() {
        let settings = KnobSettings {
            track_length: 40.0,
            thumb_extent: 56.0,
            ..KnobSettings::default()
        };
        assert!(Knob::new(50, settings).is_err());
    }
}
