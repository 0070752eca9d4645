//! Transition Controller
//!
//! Owns the content handover: replacing the visible generation with a new one
//! without a frame where neither (or a half-styled one) is on screen.
//!
//! # Handover
//!
//! ```text
//! Idle ──handover──▶ Swapping ──animated──▶ Settling ──settle timer──▶ Idle
//!                        │                                           ▲
//!                        └────────────immediate─────────────────────┘
//! ```
//!
//! 1. The incoming generation is inserted behind the active one, already
//!    styled, so it is pre-rendered but hidden.
//! 2. The deck advances exactly one step; the incoming generation is now the
//!    active one.
//! 3. If the step animates, the previous generation is kept until the settle
//!    delay has passed so the cross-fade has something to fade from; otherwise
//!    it is removed right away.
//!
//! Superseded generations waiting for their settle timer form a stack. Each
//! settle timer discards the most recently superseded generation, so a
//! handover arriving mid-settle never removes the generation that is on
//! screen.

use std::time::Duration;

use crate::scheduler::{Scheduler, TimerSlot};
use crate::slides::{ContentGeneration, GenerationId};
use crate::style::CompiledTheme;
use crate::surface::{RenderSurface, SurfaceOp};

/// Handover progress
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandoverPhase {
    /// Exactly one generation (or none) on the surface
    Idle,
    /// Incoming generation inserted, advance not yet issued
    Swapping,
    /// Superseded generations waiting to be discarded
    Settling,
}

/// How a handover went
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandoverReport {
    /// Generation now active
    pub active: GenerationId,
    /// Whether the advance animated
    pub animated: bool,
    /// Generation discarded synchronously, if any
    pub discarded: Option<GenerationId>,
}

/// Content handover state machine
#[derive(Debug)]
pub struct TransitionController {
    item_transitions: bool,
    skip_next: bool,
    settle_delay: Duration,
    present: Vec<GenerationId>,
    pending_discard: Vec<GenerationId>,
    next_seq: u64,
    phase: HandoverPhase,
}

impl TransitionController {
    /// Create a controller that waits `settle_delay` before discarding
    #[must_use]
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            item_transitions: false,
            skip_next: false,
            settle_delay,
            present: Vec::new(),
            pending_discard: Vec::new(),
            next_seq: 0,
            phase: HandoverPhase::Idle,
        }
    }

    /// Enable or disable animated handovers
    pub fn set_item_transitions(&mut self, enabled: bool) {
        self.item_transitions = enabled;
    }

    /// Whether animated handovers are enabled
    #[must_use]
    pub fn item_transitions(&self) -> bool {
        self.item_transitions
    }

    /// Suppress the animation of the next handover only
    pub fn skip_next_transition(&mut self) {
        self.skip_next = true;
    }

    /// Whether the next handover will skip its animation
    #[must_use]
    pub fn skips_next(&self) -> bool {
        self.skip_next
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> HandoverPhase {
        self.phase
    }

    /// Generations on the surface, oldest first; the last one is active
    #[must_use]
    pub fn present(&self) -> &[GenerationId] {
        &self.present
    }

    /// Visible generation
    #[must_use]
    pub fn active(&self) -> Option<GenerationId> {
        self.present.last().copied()
    }

    /// Superseded generations still waiting for their settle timer
    #[must_use]
    pub fn pending_discards(&self) -> usize {
        self.pending_discard.len()
    }

    /// Swap `incoming` onto the surface
    pub fn handover(
        &mut self,
        incoming: &ContentGeneration,
        theme: &CompiledTheme,
        surface: &mut dyn RenderSurface,
        scheduler: &mut Scheduler,
    ) -> HandoverReport {
        let id = incoming.id();
        self.phase = HandoverPhase::Swapping;

        surface.apply(SurfaceOp::InsertGeneration {
            generation: id,
            slides: incoming.slides().to_vec(),
            transition: theme.transition.clone(),
            main_style: theme.main_style.clone(),
        });
        self.present.push(id);
        surface.apply(SurfaceOp::SetBackground {
            background: theme.background.clone(),
        });
        surface.apply(SurfaceOp::SetFooterStyle {
            style: theme.footer_style.clone(),
        });

        let animate = self.item_transitions && !self.skip_next && self.present.len() > 1;
        self.skip_next = false;
        surface.apply(SurfaceOp::Advance { to: id, animate });

        let previous = self
            .present
            .len()
            .checked_sub(2)
            .and_then(|i| self.present.get(i).copied());

        let mut discarded = None;
        if let Some(previous) = previous {
            if animate {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.pending_discard.push(previous);
                scheduler.schedule(TimerSlot::Settle(seq), self.settle_delay);
                tracing::debug!(
                    incoming = %id,
                    %previous,
                    seq,
                    "Animated handover; previous generation settling"
                );
            } else if !self.pending_discard.contains(&previous) {
                self.remove(previous, surface);
                discarded = Some(previous);
            }
        }

        self.phase = if self.pending_discard.is_empty() {
            HandoverPhase::Idle
        } else {
            HandoverPhase::Settling
        };

        HandoverReport {
            active: id,
            animated: animate,
            discarded,
        }
    }

    /// A settle timer fired: discard the most recently superseded generation
    pub fn on_settle(&mut self, seq: u64, surface: &mut dyn RenderSurface) -> Option<GenerationId> {
        let Some(generation) = self.pending_discard.pop() else {
            tracing::debug!(seq, "Settle timer with nothing to discard");
            return None;
        };

        let discarded = if Some(generation) == self.active() {
            tracing::warn!(%generation, "Refusing to discard the active generation");
            None
        } else {
            self.remove(generation, surface);
            Some(generation)
        };

        if self.pending_discard.is_empty() {
            self.phase = HandoverPhase::Idle;
        }
        discarded
    }

    /// Reapply theme-derived styling to what is on screen
    pub fn apply_theme(&self, theme: &CompiledTheme, surface: &mut dyn RenderSurface) {
        if let Some(generation) = self.active() {
            surface.apply(SurfaceOp::SetMainStyle {
                generation,
                style: theme.main_style.clone(),
            });
        }
        surface.apply(SurfaceOp::SetBackground {
            background: theme.background.clone(),
        });
        surface.apply(SurfaceOp::SetFooterStyle {
            style: theme.footer_style.clone(),
        });
    }

    /// Remove everything synchronously and cancel outstanding settle timers
    pub fn clear(&mut self, surface: &mut dyn RenderSurface, scheduler: &mut Scheduler) {
        let canceled = scheduler.cancel_where(|slot| matches!(slot, TimerSlot::Settle(_)));
        surface.apply(SurfaceOp::ClearAll);
        self.present.clear();
        self.pending_discard.clear();
        self.phase = HandoverPhase::Idle;
        tracing::debug!(canceled, "Content cleared");
    }

    fn remove(&mut self, generation: GenerationId, surface: &mut dyn RenderSurface) {
        self.present.retain(|g| *g != generation);
        surface.apply(SurfaceOp::RemoveGeneration { generation });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slides::{SlideStore, TextSlideInput};
    use crate::style::{Canvas, StyleCompiler, Theme};
    use crate::surface::RecordingSurface;

    const SETTLE: Duration = Duration::from_millis(5000);

    struct Rig {
        controller: TransitionController,
        store: SlideStore,
        theme: CompiledTheme,
        surface: RecordingSurface,
        scheduler: Scheduler,
    }

    impl Rig {
        fn new(item_transitions: bool) -> Self {
            let mut controller = TransitionController::new(SETTLE);
            controller.set_item_transitions(item_transitions);
            Self {
                controller,
                store: SlideStore::new(),
                theme: StyleCompiler::new(Canvas::default(), "display-res").compile(&Theme::default()),
                surface: RecordingSurface::new(),
                scheduler: Scheduler::new(Duration::from_millis(16)),
            }
        }

        fn load(&mut self, text: &str) -> HandoverReport {
            let generation = self.store.prepare_text(&[TextSlideInput::new(text)]);
            let report = self.controller.handover(
                &generation,
                &self.theme,
                &mut self.surface,
                &mut self.scheduler,
            );
            self.store.commit(generation);
            report
        }

        fn fire_settles(&mut self) {
            let far = tokio::time::Instant::now() + SETTLE * 10;
            for slot in self.scheduler.take_due(far) {
                if let TimerSlot::Settle(seq) = slot {
                    self.controller.on_settle(seq, &mut self.surface);
                }
            }
        }
    }

    #[test]
    fn test_first_handover_never_animates() {
        let mut rig = Rig::new(true);
        let report = rig.load("a");
        assert!(!report.animated);
        assert_eq!(report.discarded, None);
        assert_eq!(rig.controller.phase(), HandoverPhase::Idle);
        assert_eq!(rig.controller.present().len(), 1);
    }

    #[test]
    fn test_immediate_handover_discards_previous() {
        let mut rig = Rig::new(false);
        let first = rig.load("a");
        let second = rig.load("b");

        assert!(!second.animated);
        assert_eq!(second.discarded, Some(first.active));
        assert_eq!(rig.controller.present(), &[second.active]);
        assert!(rig.scheduler.is_empty());
    }

    #[test]
    fn test_handover_inserts_before_advancing() {
        let mut rig = Rig::new(false);
        let report = rig.load("a");
        let ops = rig.surface.ops();

        let insert = ops
            .iter()
            .position(|op| matches!(op, SurfaceOp::InsertGeneration { .. }))
            .unwrap();
        let advance = ops
            .iter()
            .position(|op| matches!(op, SurfaceOp::Advance { to, .. } if *to == report.active))
            .unwrap();
        assert!(insert < advance);
    }

    #[test]
    fn test_animated_handover_settles_later() {
        let mut rig = Rig::new(true);
        let first = rig.load("a");
        let second = rig.load("b");

        assert!(second.animated);
        assert_eq!(second.discarded, None);
        assert_eq!(rig.controller.phase(), HandoverPhase::Settling);
        assert_eq!(rig.controller.present(), &[first.active, second.active]);
        assert!(rig.scheduler.is_scheduled(TimerSlot::Settle(0)));

        rig.fire_settles();
        assert_eq!(rig.controller.present(), &[second.active]);
        assert_eq!(rig.controller.phase(), HandoverPhase::Idle);
    }

    #[test]
    fn test_mid_settle_handover_keeps_active() {
        let mut rig = Rig::new(true);
        rig.load("a");
        rig.load("b");
        let third = rig.load("c");

        assert_eq!(rig.controller.pending_discards(), 2);
        rig.fire_settles();
        assert_eq!(rig.controller.present(), &[third.active]);
        assert_eq!(rig.controller.pending_discards(), 0);
    }

    #[test]
    fn test_skip_next_is_consumed_once() {
        let mut rig = Rig::new(true);
        rig.load("a");

        rig.controller.skip_next_transition();
        let skipped = rig.load("b");
        assert!(!skipped.animated);
        assert!(!rig.controller.skips_next());

        let animated = rig.load("c");
        assert!(animated.animated);
    }

    #[test]
    fn test_clear_cancels_settle_timers() {
        let mut rig = Rig::new(true);
        rig.load("a");
        rig.load("b");
        assert!(!rig.scheduler.is_empty());

        rig.controller.clear(&mut rig.surface, &mut rig.scheduler);
        assert!(rig.scheduler.is_empty());
        assert!(rig.controller.present().is_empty());
        assert_eq!(rig.controller.phase(), HandoverPhase::Idle);
        assert_eq!(rig.surface.last(), Some(SurfaceOp::ClearAll));
    }
}
