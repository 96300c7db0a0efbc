//! Configuration state: option catalogs, current selections, and the
//! validated setters that keep the scene in sync.
//!
//! The [`Configurator`] is the single source of truth for what the scene
//! should display. Every option change goes through it: the stored value is
//! updated first, then the change is applied to the matching parts through
//! the role registry, or handed to the environment controller.

use std::fmt;

use log::{debug, info};
use thiserror::Error;

use crate::{
    environment::{EnvPreset, EnvironmentController},
    vehicle::{PAINT_ROLES, VehicleModel},
};

/// A 24-bit sRGB colour in canonical hex form.
///
/// Catalog membership is compared on the hex value, so validation is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Colour(pub u32);

impl Colour {
    /// Convert to linear RGBA for GPU upload. The hex value is sRGB encoded;
    /// shaders and clear colours work in linear space.
    pub fn to_linear_rgba(self) -> [f32; 4] {
        let channel = |shift: u32| {
            let c = ((self.0 >> shift) & 0xFF) as f32 / 255.0;
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        [channel(16), channel(8), channel(0), 1.0]
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        let [r, g, b, _] = self.to_linear_rgba();
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.0)
    }
}

/// A named colour preset.
#[derive(Debug, Clone, Copy)]
pub struct ColourOption {
    pub name: &'static str,
    pub colour: Colour,
}

/// The available body colours, in picker order. The first entry is the
/// default.
pub const BODY_COLOURS: [ColourOption; 6] = [
    ColourOption {
        name: "Candy White",
        colour: Colour(0xFFFFFF),
    },
    ColourOption {
        name: "Starry Black",
        colour: Colour(0x1A1A1A),
    },
    ColourOption {
        name: "Glaze Red",
        colour: Colour(0xCC0000),
    },
    ColourOption {
        name: "Aurora Silver",
        colour: Colour(0xC0C0C0),
    },
    ColourOption {
        name: "Dune Brown",
        colour: Colour(0x8B4513),
    },
    ColourOption {
        name: "Glacier Blue",
        colour: Colour(0x4682B4),
    },
];

/// The available rim colours, in picker order. The first entry is the
/// default.
pub const RIM_COLOURS: [ColourOption; 4] = [
    ColourOption {
        name: "Silver",
        colour: Colour(0xC0C0C0),
    },
    ColourOption {
        name: "Black",
        colour: Colour(0x111111),
    },
    ColourOption {
        name: "Gunmetal",
        colour: Colour(0x2C3539),
    },
    ColourOption {
        name: "Bronze",
        colour: Colour(0xCD7F32),
    },
];

/// Wheel style selection. Changing it records the new value only; no
/// geometry swap is defined in this scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelStyle {
    Standard,
    Sport,
    Premium,
    Alloy,
}

impl WheelStyle {
    pub const ALL: [WheelStyle; 4] = [
        WheelStyle::Standard,
        WheelStyle::Sport,
        WheelStyle::Premium,
        WheelStyle::Alloy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            WheelStyle::Standard => "Standard",
            WheelStyle::Sport => "Sport",
            WheelStyle::Premium => "Premium",
            WheelStyle::Alloy => "Alloy",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|style| style.label().eq_ignore_ascii_case(name))
    }

    /// The next style in catalog order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            WheelStyle::Standard => WheelStyle::Sport,
            WheelStyle::Sport => WheelStyle::Premium,
            WheelStyle::Premium => WheelStyle::Alloy,
            WheelStyle::Alloy => WheelStyle::Standard,
        }
    }
}

/// Rejection of an option value outside the supported catalog. The stored
/// configuration and the scene are left untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("{0} is not an available body colour")]
    UnknownBodyColour(Colour),
    #[error("{0} is not an available rim colour")]
    UnknownRimColour(Colour),
}

/// A full snapshot of the current option selections. Always fully
/// populated: exactly one value per option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Configuration {
    pub body_colour: Colour,
    pub rim_colour: Colour,
    pub wheel_style: WheelStyle,
    pub environment: EnvPreset,
}

impl Default for Configuration {
    /// The documented defaults: Candy White body, Silver rims, Standard
    /// wheels, studio backdrop.
    fn default() -> Self {
        Self {
            body_colour: BODY_COLOURS[0].colour,
            rim_colour: RIM_COLOURS[0].colour,
            wheel_style: WheelStyle::Standard,
            environment: EnvPreset::Studio,
        }
    }
}

/// The configurator: current options, the vehicle model they drive, and
/// the environment controller.
///
/// The vehicle starts out absent. Setters called before [`build_vehicle`]
/// store their value and succeed; the eventual build picks the stored
/// configuration up.
///
/// [`build_vehicle`]: Configurator::build_vehicle
#[derive(Debug)]
pub struct Configurator {
    config: Configuration,
    vehicle: Option<VehicleModel>,
    environment: EnvironmentController,
}

impl Configurator {
    pub fn new() -> Self {
        Self {
            config: Configuration::default(),
            vehicle: None,
            environment: EnvironmentController::new(),
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn vehicle(&self) -> Option<&VehicleModel> {
        self.vehicle.as_ref()
    }

    pub fn vehicle_mut(&mut self) -> Option<&mut VehicleModel> {
        self.vehicle.as_mut()
    }

    pub fn environment(&self) -> &EnvironmentController {
        &self.environment
    }

    pub fn environment_mut(&mut self) -> &mut EnvironmentController {
        &mut self.environment
    }

    /// Vehicle and environment borrowed together, for callers pushing both
    /// to the GPU in one pass.
    pub fn scene_mut(&mut self) -> (Option<&mut VehicleModel>, &mut EnvironmentController) {
        (self.vehicle.as_mut(), &mut self.environment)
    }

    /// Build (or rebuild) the vehicle from the stored configuration,
    /// replacing any previous model.
    pub fn build_vehicle(&mut self) -> &VehicleModel {
        let vehicle = VehicleModel::build(&self.config);
        info!("vehicle model built");
        self.vehicle.insert(vehicle)
    }

    /// Select a body colour. Repaints every paintable part; the glass keeps
    /// its tint. Out-of-catalog values are rejected with the state
    /// unchanged.
    pub fn set_body_colour(&mut self, colour: Colour) -> Result<(), OptionError> {
        if !BODY_COLOURS.iter().any(|option| option.colour == colour) {
            return Err(OptionError::UnknownBodyColour(colour));
        }
        self.apply_body_colour(colour);
        Ok(())
    }

    /// Select a rim colour. Repaints the rims only; tires are untouched.
    /// Out-of-catalog values are rejected with the state unchanged.
    pub fn set_rim_colour(&mut self, colour: Colour) -> Result<(), OptionError> {
        if !RIM_COLOURS.iter().any(|option| option.colour == colour) {
            return Err(OptionError::UnknownRimColour(colour));
        }
        self.apply_rim_colour(colour);
        Ok(())
    }

    /// Record the wheel style selection. Documented limitation: there is no
    /// geometry swap, the choice is bookkeeping only.
    pub fn set_wheel_style(&mut self, style: WheelStyle) {
        self.config.wheel_style = style;
        debug!("wheel style set to {} (no geometry swap)", style.label());
    }

    pub fn set_environment(&mut self, preset: EnvPreset) {
        self.config.environment = preset;
        self.environment.switch(preset);
    }

    /// Restore all four options to their documented defaults and reapply
    /// them. All four mutations land within this one call, so the next
    /// rendered frame shows the full default state, never a partial one.
    pub fn reset(&mut self) {
        let defaults = Configuration::default();
        self.apply_body_colour(defaults.body_colour);
        self.apply_rim_colour(defaults.rim_colour);
        self.set_wheel_style(defaults.wheel_style);
        self.set_environment(defaults.environment);
        info!("options reset to defaults");
    }

    /// Advance the wheel style to the next catalog entry.
    pub fn cycle_wheel_style(&mut self) {
        self.set_wheel_style(self.config.wheel_style.next());
    }

    /// Advance the environment to the next preset.
    pub fn cycle_environment(&mut self) {
        self.set_environment(self.config.environment.next());
    }

    fn apply_body_colour(&mut self, colour: Colour) {
        self.config.body_colour = colour;
        if let Some(vehicle) = &mut self.vehicle {
            let targets = vehicle.with_roles(&PAINT_ROLES);
            vehicle.apply_colour(&targets, colour);
        }
        debug!("body colour set to {}", colour);
    }

    fn apply_rim_colour(&mut self, colour: Colour) {
        self.config.rim_colour = colour;
        if let Some(vehicle) = &mut self.vehicle {
            let targets = vehicle.rim_targets();
            vehicle.apply_colour(&targets, colour);
        }
        debug!("rim colour set to {}", colour);
    }
}

impl Default for Configurator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_converts_to_unit_linear() {
        assert_eq!(Colour(0xFFFFFF).to_linear_rgba(), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(Colour(0x000000).to_linear_rgba(), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn red_lands_in_the_red_lane() {
        let [r, g, b, a] = Colour(0xCC0000).to_linear_rgba();
        assert!(r > 0.5 && r < 0.7);
        assert_eq!(g, 0.0);
        assert_eq!(b, 0.0);
        assert_eq!(a, 1.0);
    }

    #[test]
    fn colour_displays_as_hex() {
        assert_eq!(Colour(0xCC0000).to_string(), "#CC0000");
        assert_eq!(Colour(0x00000F).to_string(), "#00000F");
    }

    #[test]
    fn wheel_styles_cycle_through_the_catalog() {
        let mut style = WheelStyle::Standard;
        for expected in [
            WheelStyle::Sport,
            WheelStyle::Premium,
            WheelStyle::Alloy,
            WheelStyle::Standard,
        ] {
            style = style.next();
            assert_eq!(style, expected);
        }
    }

    #[test]
    fn wheel_style_lookup_ignores_case() {
        assert_eq!(WheelStyle::from_name("sport"), Some(WheelStyle::Sport));
        assert_eq!(WheelStyle::from_name("ALLOY"), Some(WheelStyle::Alloy));
        assert_eq!(WheelStyle::from_name("offroad"), None);
    }

    #[test]
    fn defaults_match_the_catalog_heads() {
        let config = Configuration::default();
        assert_eq!(config.body_colour, Colour(0xFFFFFF));
        assert_eq!(config.rim_colour, Colour(0xC0C0C0));
        assert_eq!(config.wheel_style, WheelStyle::Standard);
        assert_eq!(config.environment, EnvPreset::Studio);
    }
}
