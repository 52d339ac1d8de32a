//! Pointer driven tilt of the model.
//!
//! The pointer position is mapped to a pitch/yaw target and the model eases
//! towards it with a quadratic ease-out. Every pointer event replaces the
//! running tween with a new one that starts from the current rotation.

use instant::Duration;
use winit::dpi::{PhysicalPosition, PhysicalSize};

use crate::data_structures::scene::ModelNode;

/// Rotation around the x axis (`pitch`) and the y axis (`yaw`), in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Tilt {
    pub pitch: f32,
    pub yaw: f32,
}

impl Tilt {
    pub fn lerp(self, other: Tilt, t: f32) -> Tilt {
        Tilt {
            pitch: self.pitch + (other.pitch - self.pitch) * t,
            yaw: self.yaw + (other.yaw - self.yaw) * t,
        }
    }
}

/// Decelerating curve with `e(0) = 0` and `e(1) = 1`.
pub fn ease_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Map a pointer position inside a viewport to the tilt target.
///
/// The horizontal fraction drives the yaw and the vertical fraction the pitch,
/// both centred on the middle of the viewport and scaled by `swing`. Positions
/// outside the viewport are clamped to its edges.
pub fn pointer_to_tilt(
    pointer: PhysicalPosition<f64>,
    viewport: PhysicalSize<u32>,
    swing: f32,
) -> Tilt {
    if viewport.width == 0 || viewport.height == 0 {
        return Tilt::default();
    }
    let fx = (pointer.x / viewport.width as f64).clamp(0.0, 1.0) as f32;
    let fy = (pointer.y / viewport.height as f64).clamp(0.0, 1.0) as f32;
    Tilt {
        pitch: (fy - 0.5) * swing,
        yaw: (fx - 0.5) * swing,
    }
}

/// A time-boxed eased interpolation between two tilts.
#[derive(Clone, Debug)]
pub struct RotationTween {
    from: Tilt,
    to: Tilt,
    elapsed: Duration,
    duration: Duration,
}

impl RotationTween {
    pub fn new(from: Tilt, to: Tilt, duration: Duration) -> Self {
        Self {
            from,
            to,
            elapsed: Duration::ZERO,
            duration,
        }
    }

    pub fn target(&self) -> Tilt {
        self.to
    }

    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Advance by `dt` and return the tilt at the new point in time.
    pub fn advance(&mut self, dt: Duration) -> Tilt {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.value()
    }

    pub fn value(&self) -> Tilt {
        if self.is_finished() {
            return self.to;
        }
        self.from.lerp(self.to, ease_out_quad(self.progress()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerState {
    /// No model has been loaded; pointer events do nothing.
    Idle,
    Active,
}

#[derive(Debug)]
pub struct InteractionController {
    state: ControllerState,
    swing: f32,
    duration: Duration,
    tween: Option<RotationTween>,
}

impl InteractionController {
    pub fn new(swing: f32, duration: Duration) -> Self {
        Self {
            state: ControllerState::Idle,
            swing,
            duration,
            tween: None,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Switch to `Active`. Called once, when the model has been added to the scene.
    pub fn activate(&mut self) {
        if self.state == ControllerState::Active {
            log::warn!("Interaction controller was activated twice");
        }
        self.state = ControllerState::Active;
    }

    pub fn tween(&self) -> Option<&RotationTween> {
        self.tween.as_ref()
    }

    /// Retarget the model rotation towards the pointer.
    pub fn on_pointer_moved<M>(
        &mut self,
        pointer: PhysicalPosition<f64>,
        viewport: PhysicalSize<u32>,
        model: Option<&ModelNode<M>>,
    ) {
        let (ControllerState::Active, Some(model)) = (self.state, model) else {
            return;
        };
        let target = pointer_to_tilt(pointer, viewport, self.swing);
        self.tween = Some(RotationTween::new(model.tilt(), target, self.duration));
    }

    /// Advance the running tween and write the result into the model.
    pub fn update<M>(&mut self, dt: Duration, model: Option<&mut ModelNode<M>>) {
        let (Some(tween), Some(model)) = (self.tween.as_mut(), model) else {
            return;
        };
        model.set_tilt(tween.advance(dt));
        if tween.is_finished() {
            self.tween = None;
        }
    }
}
