//! Environment presets and the backdrop state machine.
//!
//! Exactly one preset is active at a time. Studio and night install their
//! flat backdrop synchronously; outdoor requests a panorama load and keeps
//! the previous backdrop on screen until the image arrives. Results from a
//! load that outlived its preset are discarded by generation.

use std::{fmt, path::Path};

use anyhow::Context;
use image::RgbaImage;
use log::{debug, info, warn};
use rand::Rng;

use crate::config::Colour;

/// Lighting and backdrop presets the showroom can stand in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvPreset {
    Studio,
    Outdoor,
    Night,
}

impl EnvPreset {
    pub const ALL: [EnvPreset; 3] = [EnvPreset::Studio, EnvPreset::Outdoor, EnvPreset::Night];

    pub fn name(&self) -> &'static str {
        match self {
            EnvPreset::Studio => "studio",
            EnvPreset::Outdoor => "outdoor",
            EnvPreset::Night => "night",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(name))
    }

    /// The preset after this one, wrapping at the end of the list.
    pub fn next(&self) -> Self {
        let index = Self::ALL.iter().position(|p| p == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for EnvPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded equirectangular panorama ready for upload.
pub struct PanoramaImage {
    pub image: RgbaImage,
}

impl fmt::Debug for PanoramaImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanoramaImage")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .finish()
    }
}

/// What fills the screen behind the vehicle.
#[derive(Debug)]
pub enum Backdrop {
    Flat(wgpu::Color),
    Panorama(PanoramaImage),
}

/// A pending panorama load, tagged with the generation that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanoramaRequest {
    pub generation: u64,
    pub file: &'static str,
}

pub const OUTDOOR_PANORAMA: &str = "outdoor_panorama.jpg";

const STAR_COUNT: usize = 1000;
const STAR_EXTENT: f32 = 1000.0;

const STUDIO_BACKDROP: Colour = Colour(0x1a1a2e);
const NIGHT_BACKDROP: Colour = Colour(0x000011);

/// Owns the active preset, its backdrop, the star field, and the ambient
/// light level. Switching is synchronous except for the outdoor panorama,
/// which goes through [`PanoramaRequest`] and [`complete_panorama`].
///
/// [`complete_panorama`]: EnvironmentController::complete_panorama
#[derive(Debug)]
pub struct EnvironmentController {
    current: EnvPreset,
    backdrop: Backdrop,
    stars: Vec<[f32; 3]>,
    ambient: f32,
    generation: u64,
    pending: Option<PanoramaRequest>,
    backdrop_dirty: bool,
    stars_dirty: bool,
}

impl EnvironmentController {
    pub fn new() -> Self {
        Self {
            current: EnvPreset::Studio,
            backdrop: Backdrop::Flat(STUDIO_BACKDROP.to_wgpu()),
            stars: Vec::new(),
            ambient: 0.5,
            generation: 0,
            pending: None,
            backdrop_dirty: false,
            stars_dirty: false,
        }
    }

    pub fn current(&self) -> EnvPreset {
        self.current
    }

    pub fn ambient(&self) -> f32 {
        self.ambient
    }

    pub fn stars(&self) -> &[[f32; 3]] {
        &self.stars
    }

    /// Make `preset` the active environment. Re-selecting the current
    /// preset re-runs its installation, so a night re-entry rolls fresh
    /// stars.
    pub fn switch(&mut self, preset: EnvPreset) {
        self.generation += 1;
        self.current = preset;
        match preset {
            EnvPreset::Studio => {
                self.backdrop = Backdrop::Flat(STUDIO_BACKDROP.to_wgpu());
                self.ambient = 0.5;
                self.pending = None;
                self.clear_stars();
                self.backdrop_dirty = true;
            }
            EnvPreset::Outdoor => {
                // Keep the previous backdrop up until the panorama lands.
                self.ambient = 0.65;
                self.pending = Some(PanoramaRequest {
                    generation: self.generation,
                    file: OUTDOOR_PANORAMA,
                });
                self.clear_stars();
            }
            EnvPreset::Night => {
                self.backdrop = Backdrop::Flat(NIGHT_BACKDROP.to_wgpu());
                self.ambient = 0.15;
                self.pending = None;
                self.roll_stars();
                self.backdrop_dirty = true;
            }
        }
        info!("environment switched to {}", preset);
    }

    fn roll_stars(&mut self) {
        let mut rng = rand::thread_rng();
        self.stars = (0..STAR_COUNT)
            .map(|_| {
                [
                    rng.gen_range(-STAR_EXTENT..STAR_EXTENT),
                    rng.gen_range(-STAR_EXTENT..STAR_EXTENT),
                    rng.gen_range(-STAR_EXTENT..STAR_EXTENT),
                ]
            })
            .collect();
        self.stars_dirty = true;
    }

    fn clear_stars(&mut self) {
        if !self.stars.is_empty() {
            self.stars.clear();
            self.stars_dirty = true;
        }
    }

    /// Take the outstanding panorama request, if any. The caller owns
    /// spawning the load and feeding the result back through
    /// [`complete_panorama`](Self::complete_panorama).
    pub fn take_request(&mut self) -> Option<PanoramaRequest> {
        self.pending.take()
    }

    /// Deliver the result of a panorama load. Results from a superseded
    /// generation, or arriving after the preset moved on, are dropped; a
    /// failed load keeps whatever backdrop is already up.
    pub fn complete_panorama(&mut self, generation: u64, result: anyhow::Result<PanoramaImage>) {
        if generation != self.generation || self.current != EnvPreset::Outdoor {
            debug!("discarding stale panorama (generation {})", generation);
            return;
        }
        match result {
            Ok(panorama) => {
                info!(
                    "outdoor panorama installed ({}x{})",
                    panorama.image.width(),
                    panorama.image.height()
                );
                self.backdrop = Backdrop::Panorama(panorama);
                self.backdrop_dirty = true;
            }
            Err(err) => {
                warn!("outdoor panorama failed to load, keeping backdrop: {err:#}");
            }
        }
    }

    pub fn backdrop(&self) -> &Backdrop {
        &self.backdrop
    }

    /// The colour the render pass clears to. Under a panorama the sky pass
    /// covers every pixel anyway.
    pub fn clear_colour(&self) -> wgpu::Color {
        match &self.backdrop {
            Backdrop::Flat(colour) => *colour,
            Backdrop::Panorama(_) => wgpu::Color::BLACK,
        }
    }

    pub fn take_backdrop_dirty(&mut self) -> bool {
        std::mem::take(&mut self.backdrop_dirty)
    }

    pub fn take_stars_dirty(&mut self) -> bool {
        std::mem::take(&mut self.stars_dirty)
    }
}

impl Default for EnvironmentController {
    fn default() -> Self {
        Self::new()
    }
}

/// Read and decode the panorama from the assets directory next to the
/// executable's working directory.
pub async fn load_panorama(file_name: &str) -> anyhow::Result<PanoramaImage> {
    let path = Path::new("./").join("assets").join(file_name);
    let data = std::fs::read(&path)
        .with_context(|| format!("reading panorama {}", path.display()))?;
    let image = image::load_from_memory(&data)
        .with_context(|| format!("decoding panorama {}", path.display()))?
        .to_rgba8();
    Ok(PanoramaImage { image })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panorama(width: u32, height: u32) -> PanoramaImage {
        PanoramaImage {
            image: RgbaImage::new(width, height),
        }
    }

    #[test]
    fn starts_in_studio_with_flat_backdrop() {
        let env = EnvironmentController::new();
        assert_eq!(env.current(), EnvPreset::Studio);
        assert!(matches!(env.backdrop(), Backdrop::Flat(_)));
        assert!(env.stars().is_empty());
        assert!((env.ambient() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn night_rolls_a_full_star_field() {
        let mut env = EnvironmentController::new();
        env.switch(EnvPreset::Night);
        assert_eq!(env.stars().len(), 1000);
        assert!(env.take_stars_dirty());
        assert!(env.stars().iter().all(|star| {
            star.iter().all(|c| (-STAR_EXTENT..STAR_EXTENT).contains(c))
        }));
    }

    #[test]
    fn night_reentry_rolls_fresh_stars() {
        let mut env = EnvironmentController::new();
        env.switch(EnvPreset::Night);
        let first = env.stars().to_vec();
        env.switch(EnvPreset::Studio);
        assert!(env.stars().is_empty());
        env.switch(EnvPreset::Night);
        assert_eq!(env.stars().len(), 1000);
        // A thousand fresh samples matching the old field exactly would be
        // a broken generator.
        assert_ne!(env.stars(), first.as_slice());
    }

    #[test]
    fn leaving_night_clears_the_stars() {
        let mut env = EnvironmentController::new();
        env.switch(EnvPreset::Night);
        env.take_stars_dirty();
        env.switch(EnvPreset::Outdoor);
        assert!(env.stars().is_empty());
        assert!(env.take_stars_dirty());
    }

    #[test]
    fn outdoor_requests_a_panorama_and_keeps_the_backdrop() {
        let mut env = EnvironmentController::new();
        env.take_backdrop_dirty();
        env.switch(EnvPreset::Outdoor);
        let request = env.take_request().unwrap();
        assert_eq!(request.file, OUTDOOR_PANORAMA);
        assert!(matches!(env.backdrop(), Backdrop::Flat(_)));
        assert!(!env.take_backdrop_dirty());
        assert!(env.take_request().is_none());
    }

    #[test]
    fn panorama_installs_for_the_current_generation() {
        let mut env = EnvironmentController::new();
        env.switch(EnvPreset::Outdoor);
        let request = env.take_request().unwrap();
        env.complete_panorama(request.generation, Ok(panorama(8, 4)));
        assert!(matches!(env.backdrop(), Backdrop::Panorama(_)));
        assert!(env.take_backdrop_dirty());
    }

    #[test]
    fn stale_panorama_is_discarded() {
        let mut env = EnvironmentController::new();
        env.switch(EnvPreset::Outdoor);
        let request = env.take_request().unwrap();
        env.switch(EnvPreset::Night);
        env.take_backdrop_dirty();
        env.complete_panorama(request.generation, Ok(panorama(8, 4)));
        assert!(matches!(env.backdrop(), Backdrop::Flat(_)));
        assert!(!env.take_backdrop_dirty());
    }

    #[test]
    fn reentering_outdoor_outdates_the_older_request() {
        let mut env = EnvironmentController::new();
        env.switch(EnvPreset::Outdoor);
        let first = env.take_request().unwrap();
        env.switch(EnvPreset::Outdoor);
        let second = env.take_request().unwrap();
        assert_ne!(first.generation, second.generation);

        env.complete_panorama(first.generation, Ok(panorama(8, 4)));
        assert!(matches!(env.backdrop(), Backdrop::Flat(_)));
        env.complete_panorama(second.generation, Ok(panorama(8, 4)));
        assert!(matches!(env.backdrop(), Backdrop::Panorama(_)));
    }

    #[test]
    fn failed_panorama_keeps_the_previous_backdrop() {
        let mut env = EnvironmentController::new();
        env.switch(EnvPreset::Outdoor);
        let request = env.take_request().unwrap();
        env.complete_panorama(request.generation, Err(anyhow::anyhow!("no such file")));
        assert!(matches!(env.backdrop(), Backdrop::Flat(_)));
        assert!(!env.take_backdrop_dirty());
    }

    #[test]
    fn preset_cycle_wraps() {
        assert_eq!(EnvPreset::Studio.next(), EnvPreset::Outdoor);
        assert_eq!(EnvPreset::Outdoor.next(), EnvPreset::Night);
        assert_eq!(EnvPreset::Night.next(), EnvPreset::Studio);
    }

    #[test]
    fn preset_names_round_trip() {
        for preset in EnvPreset::ALL {
            assert_eq!(EnvPreset::from_name(preset.name()), Some(preset));
        }
        assert_eq!(EnvPreset::from_name("OUTDOOR"), Some(EnvPreset::Outdoor));
        assert_eq!(EnvPreset::from_name("void"), None);
    }

    #[test]
    fn ambient_follows_the_preset() {
        let mut env = EnvironmentController::new();
        env.switch(EnvPreset::Night);
        assert!((env.ambient() - 0.15).abs() < f32::EPSILON);
        env.switch(EnvPreset::Outdoor);
        assert!((env.ambient() - 0.65).abs() < f32::EPSILON);
        env.switch(EnvPreset::Studio);
        assert!((env.ambient() - 0.5).abs() < f32::EPSILON);
    }
}
