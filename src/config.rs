//! Viewer defaults.
//!
//! The viewer has no config file, CLI or environment variables. Everything
//! tunable lives in [`ViewerConfig`], whose `Default` carries the fixed values
//! the viewer ships with. Library users can hand a modified copy to
//! [`crate::flow::run`].

use instant::Duration;

/// Radiance HDRI used for reflections and ambient lighting.
pub const ENVIRONMENT_URL: &str =
    "https://dl.polyhaven.org/file/ph-assets/HDRIs/hdr/1k/pond_bridge_night_1k.hdr";
/// glTF asset, relative to the `assets/` directory.
pub const MODEL_PATH: &str = "DamagedHelmet.gltf";

/// Full angular swing of the pointer tilt in radians. Targets stay within ±half of it.
pub const MAX_SWING: f32 = std::f32::consts::PI * 0.12;
/// Strength of the chromatic shift in texture-space units.
pub const RGB_SHIFT_AMOUNT: f32 = 0.003;

#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fovy_deg: f32,
    pub znear: f32,
    pub zfar: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fovy_deg: 51.0,
            znear: 0.1,
            zfar: 100.0,
            position: [0.0, 0.0, 3.5],
            target: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub environment_url: String,
    pub model_path: String,
    pub camera: CameraConfig,
    /// Exposure multiplier applied before ACES filmic tone mapping.
    pub exposure: f32,
    pub rgb_shift_amount: f32,
    /// Direction of the shift in radians; 0 shifts red right and blue left.
    pub rgb_shift_angle: f32,
    pub max_swing: f32,
    pub tween_duration: Duration,
    /// 4x MSAA on the scene pass.
    pub antialias: bool,
    /// Upper bound for the device pixel ratio used to size the drawing buffer.
    pub max_pixel_ratio: f64,
    pub clear_colour: wgpu::Color,
}

impl ViewerConfig {
    pub fn sample_count(&self) -> u32 {
        if self.antialias { 4 } else { 1 }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            environment_url: ENVIRONMENT_URL.to_string(),
            model_path: MODEL_PATH.to_string(),
            camera: CameraConfig::default(),
            exposure: 1.0,
            rgb_shift_amount: RGB_SHIFT_AMOUNT,
            rgb_shift_angle: 0.0,
            max_swing: MAX_SWING,
            tween_duration: Duration::from_millis(500),
            antialias: true,
            max_pixel_ratio: 2.0,
            // alpha-enabled canvas: nothing behind the model is painted
            clear_colour: wgpu::Color::TRANSPARENT,
        }
    }
}
