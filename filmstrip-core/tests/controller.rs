//! End-to-end gesture scenarios driven through the public API with a
//! manually advanced clock.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use filmstrip_core::{
    AnimationClock, ConfigError, ControllerConfig, EdgeDirection, FilmScroller, FlingScroller,
    Listener, PositionController, Rect, ScaleRangeHint,
};

#[derive(Clone, Default)]
struct ManualClock(Rc<Cell<u64>>);

impl AnimationClock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}

#[derive(Default)]
struct Feedback {
    invalidates: Cell<u32>,
    holding: Cell<bool>,
    pulls: RefCell<Vec<(i32, EdgeDirection)>>,
    absorbs: RefCell<Vec<(i32, EdgeDirection)>>,
}

struct RecordingListener(Rc<Feedback>);

impl Listener for RecordingListener {
    fn invalidate(&mut self) {
        self.0.invalidates.set(self.0.invalidates.get() + 1);
    }

    fn is_holding(&self) -> bool {
        self.0.holding.get()
    }

    fn on_pull(&mut self, offset: i32, direction: EdgeDirection) {
        self.0.pulls.borrow_mut().push((offset, direction));
    }

    fn on_absorb(&mut self, velocity: i32, direction: EdgeDirection) {
        self.0.absorbs.borrow_mut().push((velocity, direction));
    }
}

struct Harness {
    c: PositionController,
    feedback: Rc<Feedback>,
    clock: Rc<Cell<u64>>,
}

// With e.g. RUST_LOG=trace the kernel logs per-tick gap sizes, rects and
// re-index decisions while a test runs.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl Harness {
    fn new() -> Self {
        init_tracing();
        let feedback = Rc::new(Feedback::default());
        let clock = Rc::new(Cell::new(0));
        let c = PositionController::with_parts(
            Box::new(RecordingListener(feedback.clone())),
            Box::new(ManualClock(clock.clone())),
            Box::new(FlingScroller::new()),
            Box::new(FilmScroller::new()),
            ControllerConfig::default(),
        )
        .expect("default config");
        Self { c, feedback, clock }
    }

    fn tick(&mut self, now_ms: u64) {
        self.clock.set(now_ms);
        self.c.advance_animation();
    }

    /// Advance once and report whether all animation has ceased (a further
    /// tick changes nothing and requests no redraw).
    fn tick_settled(&mut self, now_ms: u64) -> bool {
        self.tick(now_ms);
        let before = self.feedback.invalidates.get();
        self.tick(now_ms + 16);
        self.feedback.invalidates.get() == before
    }

    /// Focus a single image with optional neighbors.
    fn focus_single(&mut self, has_prev: bool, has_next: bool) {
        self.c.move_box(
            &[None, None, None, Some(0), None, None, None],
            has_prev,
            has_next,
            true,
        );
    }
}

const IDENTITY: [Option<i32>; 7] = [
    Some(-3),
    Some(-2),
    Some(-1),
    Some(0),
    Some(1),
    Some(2),
    Some(3),
];

#[test]
fn invalid_config_is_rejected() {
    let bad = ControllerConfig {
        scale_limit: 0.5,
        ..Default::default()
    };
    let err = PositionController::with_parts(
        Box::new(RecordingListener(Rc::new(Feedback::default()))),
        Box::new(ManualClock::default()),
        Box::new(FlingScroller::new()),
        Box::new(FilmScroller::new()),
        bad,
    )
    .err();
    assert!(matches!(err, Some(ConfigError::ScaleLimit(_))));
}

#[test]
fn pinch_lands_exactly_on_the_intended_scale() {
    let mut h = Harness::new();
    h.focus_single(false, false);
    h.c.set_image_size(0, 1000, 700, false);
    let start = h.c.image_scale();

    h.c.begin_scale(320.0, 240.0);
    h.c.scale_by(2.0, 320.0, 240.0);
    assert_eq!(h.c.image_scale(), start, "no movement before the first tick");

    h.tick(25);
    let mid = h.c.image_scale();
    assert!(mid > start && mid < 2.0 * start, "mid-animation scale {mid}");

    h.tick(50);
    // Completion writes the target, not an accumulated approximation.
    assert_eq!(h.c.image_scale(), 2.0 * start);
}

#[test]
fn pinch_on_an_exact_fit_image_may_still_zoom() {
    let mut h = Harness::new();
    h.focus_single(false, false);

    // An image matching the view has a minimal scale of 1, but the maximal
    // scale in page mode is the absolute ceiling, so doubling is in range.
    h.c.begin_scale(320.0, 240.0);
    let hint = h.c.scale_by(2.0, 320.0, 240.0);
    assert_eq!(hint, ScaleRangeHint::Within);
    h.tick(50);
    assert_eq!(h.c.image_scale(), 2.0);
}

#[test]
fn pinch_overshoot_snaps_back_to_maximal_scale() {
    let mut h = Harness::new();
    h.focus_single(false, false);
    h.c.set_image_size(0, 1000, 700, false);

    h.c.begin_scale(320.0, 240.0);
    let hint = h.c.scale_by(8.0, 320.0, 240.0);
    assert_eq!(hint, ScaleRangeHint::Over);

    h.tick(50);
    assert!(h.c.image_scale() > 4.0, "gesture may overshoot the maximum");

    h.c.end_scale();
    h.tick(60); // resolves the finished gesture animation into a snap-back
    h.tick(700);
    assert_eq!(h.c.image_scale(), 4.0);
}

#[test]
fn stop_freezes_and_skip_is_then_a_no_op() {
    let mut h = Harness::new();
    h.focus_single(false, false);
    h.c.set_image_size(0, 800, 600, false);

    h.c.zoom_in(320.0, 240.0, 3.0);
    h.tick(150);
    h.c.stop_animation();

    let scale = h.c.image_scale();
    let rect = h.c.get_position(0);
    assert!(scale < 3.0, "stopped mid-flight at {scale}");

    h.c.skip_animation();
    assert_eq!(h.c.image_scale(), scale);
    assert_eq!(h.c.get_position(0), rect);

    // Nothing left to advance either.
    h.tick(1000);
    assert_eq!(h.c.image_scale(), scale);
}

#[test]
fn identity_reindex_does_not_move_anything() {
    let mut h = Harness::new();
    h.c.move_box(&IDENTITY, true, true, true);
    h.c.set_image_size(-1, 900, 500, false);
    h.c.set_image_size(0, 800, 600, false);
    h.c.set_image_size(1, 700, 700, false);

    let before: Vec<Rect> = (-3..=3).map(|i| h.c.get_position(i)).collect();
    h.c.move_box(&IDENTITY, true, true, true);
    let after: Vec<Rect> = (-3..=3).map(|i| h.c.get_position(i)).collect();
    assert_eq!(before, after);
}

#[test]
fn focus_shift_keeps_the_surviving_box_on_screen() {
    let mut h = Harness::new();
    h.c.move_box(&IDENTITY, true, true, true);
    h.c.set_image_size(0, 800, 600, false);
    h.c.set_image_size(1, 900, 500, false);

    let old_next = h.c.get_position(1);

    // Focus moves forward by one: every box slides down an index.
    h.c.move_box(
        &[Some(-2), Some(-1), Some(0), Some(1), Some(2), Some(3), None],
        true,
        true,
        true,
    );

    // The platform's coordinate frame shifted so the newly focused box has
    // not jumped on screen; snap-back takes it to center from here.
    assert_eq!(h.c.get_position(0), old_next);
    assert_eq!(h.c.image_width(), 900);
    assert_eq!(h.c.image_height(), 500);
}

#[test]
fn scrolling_past_the_first_image_pulls_and_clamps() {
    let mut h = Harness::new();
    h.focus_single(false, true);

    // The view-sized image fits exactly, so the horizontal bound is a single
    // point and any leftward history is refused.
    h.c.start_scroll(100.0, 0.0);
    assert_eq!(
        h.feedback.pulls.borrow().as_slice(),
        &[(100, EdgeDirection::Left)]
    );
    assert!(h.c.is_center(), "clamped back to the resting position");
}

#[test]
fn vertical_overscroll_pulls_the_opposite_edge() {
    let mut h = Harness::new();
    h.focus_single(false, false);
    h.c.zoom_in(320.0, 240.0, 4.0);
    h.tick(300);
    h.tick(310);

    // Zoomed to 2560x1920, the vertical bound is +-720.
    h.c.start_scroll(0.0, 800.0);
    assert_eq!(
        h.feedback.pulls.borrow().as_slice(),
        &[(80, EdgeDirection::Top)]
    );
    assert_eq!(h.c.get_position(0).center_y(), 960);
}

#[test]
fn fling_is_refused_when_the_image_fits() {
    let mut h = Harness::new();
    h.focus_single(true, true);
    assert!(!h.c.fling(3000.0, 0.0));
    assert!(!h.c.is_scrolling());
}

#[test]
fn page_fling_decelerates_to_rest_inside_the_bound() {
    let mut h = Harness::new();
    h.focus_single(false, false);
    h.c.zoom_in(320.0, 240.0, 4.0);
    h.tick(300);
    h.tick(310);

    assert!(h.c.fling(-3000.0, 0.0));
    assert!(h.c.is_scrolling());

    for t in (400..=2000).step_by(100) {
        h.tick(t);
    }
    assert!(!h.c.is_scrolling());
    let center = h.c.get_position(0).center_x();
    assert!(center < 320, "moved left, ended at {center}");
    // 2560 scaled width against a 640 view: the platform bound is +-960.
    assert!(center >= 320 - 960);
}

#[test]
fn fling_into_a_resting_edge_is_refused() {
    let mut h = Harness::new();
    h.focus_single(false, true);
    h.c.zoom_in(320.0, 240.0, 4.0);
    h.tick(300);
    h.tick(310);
    // Zoomed in and centered, the image clears every edge.
    assert!(h.c.image_at_edges().is_none());

    // Drag until the image rests against its right edge, then release.
    h.c.start_scroll(-2000.0, 0.0);
    h.tick(320);
    let edges = h.c.image_at_edges();
    assert!(edges.right);
    assert!(!edges.is_none());

    // A further fling toward that edge has nowhere to go.
    assert!(!h.c.fling(-3000.0, 0.0));
}

#[test]
fn film_fling_at_the_strip_edge_is_refused() {
    let mut h = Harness::new();
    h.focus_single(false, true);
    h.c.set_film_mode(true);
    // Resting at the default position with no previous image: refused no
    // matter the direction, matching the scroll clamp.
    assert!(!h.c.fling(-1500.0, 0.0));
    assert!(!h.c.fling(1500.0, 0.0));
}

#[test]
fn zoom_target_clamps_to_the_scale_limit() {
    let mut h = Harness::new();
    h.focus_single(false, false);
    h.c.set_image_size(0, 800, 600, false);

    h.c.zoom_in(320.0, 240.0, 10.0);
    h.tick(300);
    assert_eq!(h.c.image_scale(), 4.0);
    assert!(!h.c.is_at_minimal_scale());

    h.c.reset_to_full_view();
    h.tick(700);
    assert!(h.c.is_at_minimal_scale());
    assert!(h.c.is_center());
}

#[test]
fn capture_slide_recenters_the_strip() {
    let mut h = Harness::new();
    h.focus_single(false, true);

    // Displace toward the next image first.
    h.c.start_scroll(-100.0, 0.0);
    assert!(!h.c.is_center());

    h.c.start_capture_animation_slide(1);
    h.tick(800);
    h.tick(816);
    assert!(h.c.is_center());
    assert!(h.c.is_at_minimal_scale());
}

#[test]
fn opening_animation_starts_from_the_thumbnail_rect() {
    let mut h = Harness::new();
    h.focus_single(false, false);

    let thumb = Rect::new(200, 150, 360, 270);
    h.c.set_open_animation_rect(Some(thumb));
    h.c.set_image_size(0, 1600, 1200, false);

    // Before any tick the image sits exactly in the thumbnail rectangle.
    assert_eq!(h.c.get_position(0), thumb);

    h.tick(600);
    h.tick(616);
    assert!(h.c.is_center());
    assert!(h.c.is_at_minimal_scale());
    assert_eq!(h.c.get_position(0).width(), 640);
}

#[test]
fn holding_suppresses_snapback_until_release() {
    let mut h = Harness::new();
    h.focus_single(false, true);
    h.c.zoom_in(320.0, 240.0, 4.0);
    h.tick(300);
    h.tick(310);

    h.feedback.holding.set(true);
    // With a next image present the drag may run past the stable bound
    // (-960 at this scale) without being clamped.
    h.c.start_scroll(-1200.0, 0.0);
    let held = h.c.get_position(0);
    assert!(held.center_x() < 320 - 960);

    // The scroll animation finished; the snap-back that would follow is
    // suppressed while a finger is down.
    h.tick(400);
    h.tick(500);
    assert_eq!(h.c.get_position(0), held);

    h.feedback.holding.set(false);
    h.c.snapback();
    h.tick(1200);
    assert!(h.tick_settled(1210));
    // Back inside the slack-widened bound.
    assert_eq!(h.c.get_position(0).center_x(), 320 - 972);
}

#[test]
fn deltas_compose_across_unfinished_animations() {
    let mut h = Harness::new();
    h.focus_single(true, true);
    h.c.zoom_in(320.0, 240.0, 4.0);
    h.tick(300);
    h.tick(310);

    let x0 = h.c.get_position(0).center_x();
    h.c.start_scroll(40.0, 0.0);
    h.c.start_scroll(40.0, 0.0);
    h.c.start_scroll(40.0, 0.0);
    // Scroll animations are instantaneous, so each delta lands fully even
    // without a tick in between.
    assert_eq!(h.c.get_position(0).center_x(), x0 + 120);
}
