//! uevr_utils command line tool.
//!
//! Two jobs:
//!
//! - `--check <defs.json>` parses an animation definition file, reports
//!   poses that reference missing positions and exits non-zero if any are
//!   found.
//! - Without `--check`, runs a short scripted session against the in-memory
//!   mock engine: creates the three controllers, attaches a hand mesh, plays
//!   a grip press/release through the tick schedule and finishes with a
//!   level change. Useful to see the log output a real mod would produce.
//!
//! # Running
//!
//! ```sh
//! cargo run -- --check hand.json
//! RUST_LOG=debug cargo run -- --ticks 30
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};

use uevr_utils::host::mock::MockHost;
use uevr_utils::host::{ObjectModel, POSEABLE_MESH_CLASS, Rotator};
use uevr_utils::lookup::{find_instance_of, print_instance_names};
use uevr_utils::resources::animationstore::AnimationDefinition;
use uevr_utils::resources::controllers::ControllerId;
use uevr_utils::resources::modconfig::ModConfig;
use uevr_utils::session::Session;

const DEMO_DEFINITION: &str = r#"{
    "positions": {
        "grip": {
            "on":  { "thumb_01": [25, 0, 0], "index_01": [40, 0, 0] },
            "off": { "thumb_01": [0, 0, 0],  "index_01": [0, 0, 0] }
        }
    },
    "poses": { "fist": [["grip", "on"]] }
}"#;

/// Demo tick length (90 Hz headset).
const TICK: f32 = 1.0 / 90.0;

/// UEVR utility layer: animation definition checker and mock session demo
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Validate an animation definition JSON file and exit.
    #[arg(long, value_name = "PATH")]
    check: Option<PathBuf>,

    /// Configuration file (default: ./uevr_utils.ini).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write the effective configuration back to the config file and exit.
    #[arg(long)]
    save_config: bool,

    /// Animation definition used by the demo instead of the built-in one.
    #[arg(long, value_name = "PATH")]
    definition: Option<PathBuf>,

    /// Ticks to run between the demo's press and release.
    #[arg(long, default_value_t = 10)]
    ticks: u32,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Early-exit: validate a definition file
    if let Some(path) = cli.check {
        std::process::exit(check_definition(&path));
    }

    let mut config = match cli.config {
        Some(path) => ModConfig::with_path(path),
        None => ModConfig::new(),
    };
    if let Err(e) = config.load_from_file() {
        warn!("Using default configuration: {}", e);
    }

    if cli.save_config {
        if let Err(e) = config.save_to_file() {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        return;
    }

    let definition = match cli.definition {
        Some(path) => AnimationDefinition::load(&path),
        None => AnimationDefinition::from_json(DEMO_DEFINITION),
    };
    let definition = match definition {
        Ok(definition) => definition,
        Err(e) => {
            eprintln!("Error loading animation definition: {e}");
            std::process::exit(1);
        }
    };

    run_demo(config, definition, cli.ticks);
}

fn check_definition(path: &Path) -> i32 {
    let definition = match AnimationDefinition::load(path) {
        Ok(definition) => definition,
        Err(e) => {
            eprintln!("Error: {}: {e}", path.display());
            return 1;
        }
    };
    let issues = definition.validate();
    for issue in &issues {
        println!("{}: {}", path.display(), issue);
    }
    if issues.is_empty() {
        println!(
            "{}: ok ({} animations, {} poses)",
            path.display(),
            definition.positions.len(),
            definition.poses.len()
        );
        0
    } else {
        1
    }
}

fn run_demo(config: ModConfig, definition: AnimationDefinition, ticks: u32) {
    info!("uevr_utils {} demo against the mock engine", uevr_utils::VERSION);

    let mock = Arc::new(MockHost::with_engine_classes());
    let Some(mesh) = mock.spawn_named(POSEABLE_MESH_CLASS, "RightHandMesh") else {
        error!("Mock engine has no poseable mesh class");
        return;
    };
    mock.add_bone(mesh, "hand_r", None, Rotator::ZERO);
    mock.add_bone(mesh, "thumb_01", Some("hand_r"), Rotator::ZERO);
    mock.add_bone(mesh, "index_01", Some("hand_r"), Rotator::ZERO);

    let host: Arc<dyn ObjectModel> = mock.clone();
    let mut session = Session::new(host.clone(), config);

    session.with_controllers(|controllers, host, cache| {
        for id in ControllerId::ALL {
            if controllers.create_controller(host, cache, id).is_none() {
                warn!("Could not create {:?} controller", id);
            }
        }
        if !controllers.attach_component_to_controller(host, ControllerId::Right, mesh, "", 0, false) {
            warn!("Could not attach the hand mesh");
        }
        info!(
            "Right controller direction: {:?}",
            controllers.controller_direction(host, cache, ControllerId::Right)
        );
    });
    print_instance_names(host.as_ref(), POSEABLE_MESH_CLASS);
    if find_instance_of(host.as_ref(), POSEABLE_MESH_CLASS, "RightHandMesh") != Some(mesh) {
        warn!("Hand mesh lookup by name failed");
    }

    let definition = Arc::new(definition);
    session.with_animations(|animations, _| animations.add("right", mesh, definition));

    session.push_control("right", "grip", true);
    for _ in 0..ticks {
        session.tick(TICK);
    }
    info!("thumb_01 after press: {:?}", mock.bone_local_rotation(mesh, "thumb_01"));

    session.push_control("right", "grip", false);
    for _ in 0..ticks {
        session.tick(TICK);
    }
    info!("thumb_01 after release: {:?}", mock.bone_local_rotation(mesh, "thumb_01"));

    session.with_animations(|animations, host| {
        animations.pose(host, "right", "fist");
        animations.print_state();
    });

    session.level_changed();
    let remaining = session.with_controllers(|controllers, host, _| {
        ControllerId::ALL
            .iter()
            .filter(|id| controllers.controller_exists(host, **id))
            .count()
    });
    info!(
        "After level change: {} controllers tracked, {} live engine objects, {} ticks run",
        remaining,
        mock.live_object_count(),
        session.world_time().frame
    );
}
