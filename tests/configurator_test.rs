//! End-to-end configurator behaviour through the public API, no GPU
//! involved: option changes land on exactly the right parts, resets are
//! atomic, and environment switches never leak state into each other.

use showroom::{
    config::{Colour, Configuration, Configurator, WheelStyle, BODY_COLOURS, RIM_COLOURS},
    data_structures::part::PartRole,
    environment::{Backdrop, EnvPreset, PanoramaImage},
    snapshot::{ExportStamper, EXPORT_PREFIX},
};

fn configurator_with_vehicle() -> Configurator {
    let mut configurator = Configurator::new();
    configurator.build_vehicle();
    configurator
}

fn part_colours(configurator: &Configurator, role: PartRole) -> Vec<Colour> {
    let vehicle = configurator.vehicle().unwrap();
    vehicle
        .with_role(role)
        .iter()
        .map(|id| vehicle.part(*id).material.colour)
        .collect()
}

#[test]
fn fresh_configurator_holds_the_documented_defaults() {
    let configurator = Configurator::new();
    let config = configurator.config();
    assert_eq!(config.body_colour, BODY_COLOURS[0].colour);
    assert_eq!(config.rim_colour, RIM_COLOURS[0].colour);
    assert_eq!(config.wheel_style, WheelStyle::Standard);
    assert_eq!(config.environment, EnvPreset::Studio);
}

#[test]
fn body_colour_repaints_body_and_roof_only() {
    let mut configurator = configurator_with_vehicle();
    let rims_before = part_colours(&configurator, PartRole::Rim);
    let glass_before = part_colours(&configurator, PartRole::Glass);

    for option in BODY_COLOURS {
        configurator.set_body_colour(option.colour).unwrap();

        assert_eq!(
            part_colours(&configurator, PartRole::Body),
            vec![option.colour]
        );
        assert_eq!(
            part_colours(&configurator, PartRole::Roof),
            vec![option.colour]
        );
        assert_eq!(part_colours(&configurator, PartRole::Rim), rims_before);
        assert_eq!(part_colours(&configurator, PartRole::Glass), glass_before);
        assert_eq!(
            part_colours(&configurator, PartRole::Tire),
            vec![Colour(0x333333); 4]
        );
        assert_eq!(
            part_colours(&configurator, PartRole::Headlight),
            vec![Colour(0xFFFFCC); 2]
        );
    }
}

#[test]
fn rim_colour_repaints_rims_only() {
    let mut configurator = configurator_with_vehicle();
    let body_before = part_colours(&configurator, PartRole::Body);

    for option in RIM_COLOURS {
        configurator.set_rim_colour(option.colour).unwrap();

        assert_eq!(
            part_colours(&configurator, PartRole::Rim),
            vec![option.colour; 4]
        );
        assert_eq!(part_colours(&configurator, PartRole::Body), body_before);
        assert_eq!(
            part_colours(&configurator, PartRole::Tire),
            vec![Colour(0x333333); 4]
        );
    }
}

#[test]
fn out_of_catalog_colours_are_rejected_without_side_effects() {
    let mut configurator = configurator_with_vehicle();
    let before = *configurator.config();

    assert!(configurator.set_body_colour(Colour(0x123456)).is_err());
    assert!(configurator.set_rim_colour(Colour(0xABCDEF)).is_err());

    assert_eq!(*configurator.config(), before);
    // Nothing was flagged for re-upload either.
    assert!(configurator
        .vehicle_mut()
        .unwrap()
        .take_dirty()
        .is_empty());
}

#[test]
fn options_selected_before_build_take_effect_on_build() {
    let mut configurator = Configurator::new();
    let silver = BODY_COLOURS[3].colour;
    let gunmetal = RIM_COLOURS[2].colour;

    configurator.set_body_colour(silver).unwrap();
    configurator.set_rim_colour(gunmetal).unwrap();
    configurator.build_vehicle();

    assert!(part_colours(&configurator, PartRole::Body)
        .iter()
        .all(|colour| *colour == silver));
    assert_eq!(
        part_colours(&configurator, PartRole::Rim),
        vec![gunmetal; 4]
    );
}

#[test]
fn reset_returns_every_option_to_default_at_once() {
    let mut configurator = configurator_with_vehicle();
    configurator.set_body_colour(BODY_COLOURS[5].colour).unwrap();
    configurator.set_rim_colour(RIM_COLOURS[1].colour).unwrap();
    configurator.set_wheel_style(WheelStyle::Alloy);
    configurator.set_environment(EnvPreset::Night);

    configurator.reset();

    assert_eq!(*configurator.config(), Configuration::default());
    assert!(part_colours(&configurator, PartRole::Body)
        .iter()
        .all(|colour| *colour == BODY_COLOURS[0].colour));
    assert_eq!(
        part_colours(&configurator, PartRole::Rim),
        vec![RIM_COLOURS[0].colour; 4]
    );
    assert_eq!(configurator.environment().current(), EnvPreset::Studio);
    assert!(configurator.environment().stars().is_empty());
}

#[test]
fn environment_switches_leave_nothing_behind() {
    let mut configurator = Configurator::new();

    configurator.set_environment(EnvPreset::Night);
    assert_eq!(configurator.environment().stars().len(), 1000);
    assert!(matches!(
        configurator.environment().backdrop(),
        Backdrop::Flat(_)
    ));

    configurator.set_environment(EnvPreset::Studio);
    assert!(configurator.environment().stars().is_empty());
    assert!(matches!(
        configurator.environment().backdrop(),
        Backdrop::Flat(_)
    ));
}

#[test]
fn stale_panorama_never_overwrites_a_later_backdrop() {
    let mut configurator = Configurator::new();

    configurator.set_environment(EnvPreset::Outdoor);
    let stale = configurator.environment_mut().take_request().unwrap();

    configurator.set_environment(EnvPreset::Night);
    configurator.environment_mut().complete_panorama(
        stale.generation,
        Ok(PanoramaImage {
            image: image::RgbaImage::new(4, 2),
        }),
    );
    assert!(matches!(
        configurator.environment().backdrop(),
        Backdrop::Flat(_)
    ));

    // A fresh outdoor entry with the matching generation does install.
    configurator.set_environment(EnvPreset::Outdoor);
    let current = configurator.environment_mut().take_request().unwrap();
    configurator.environment_mut().complete_panorama(
        current.generation,
        Ok(PanoramaImage {
            image: image::RgbaImage::new(4, 2),
        }),
    );
    assert!(matches!(
        configurator.environment().backdrop(),
        Backdrop::Panorama(_)
    ));
}

#[test]
fn failed_panorama_load_keeps_the_scene_usable() {
    let mut configurator = Configurator::new();
    configurator.set_environment(EnvPreset::Outdoor);
    let request = configurator.environment_mut().take_request().unwrap();

    configurator
        .environment_mut()
        .complete_panorama(request.generation, Err(anyhow::anyhow!("disk error")));

    assert_eq!(configurator.environment().current(), EnvPreset::Outdoor);
    assert!(matches!(
        configurator.environment().backdrop(),
        Backdrop::Flat(_)
    ));
}

#[test]
fn wheel_style_cycles_through_the_whole_catalog() {
    let mut configurator = Configurator::new();
    let mut seen = vec![configurator.config().wheel_style];
    for _ in 0..4 {
        configurator.cycle_wheel_style();
        seen.push(configurator.config().wheel_style);
    }
    assert_eq!(
        &seen[..4],
        &[
            WheelStyle::Standard,
            WheelStyle::Sport,
            WheelStyle::Premium,
            WheelStyle::Alloy,
        ]
    );
    // Wrapped around.
    assert_eq!(seen[4], WheelStyle::Standard);
}

#[test]
fn wheel_style_is_recorded_without_touching_the_parts() {
    let mut configurator = configurator_with_vehicle();
    configurator.set_wheel_style(WheelStyle::Premium);
    assert_eq!(configurator.config().wheel_style, WheelStyle::Premium);
    assert!(configurator
        .vehicle_mut()
        .unwrap()
        .take_dirty()
        .is_empty());
}

#[test]
fn export_names_are_unique_and_prefixed() {
    let mut stamper = ExportStamper::new();
    let mut names: Vec<String> = (0..5).map(|_| stamper.filename()).collect();
    for name in &names {
        assert!(name.starts_with(EXPORT_PREFIX));
        assert!(name.ends_with(".png"));
    }
    let len_before = names.len();
    names.dedup();
    assert_eq!(names.len(), len_before);
}
