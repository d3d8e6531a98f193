use std::path::PathBuf;
use std::process::exit;

use anyhow::{Context, Error};
use clap::{Parser, ValueHint};
use particle_fx::core::init_logging;
use particle_fx::particles::NodePath;
use particle_fx::{CompilerConfig, EditEvent, ParticleEffectSession, SessionState, System};

#[derive(Parser, Debug)]
#[clap(name = "particle-fxc", version, about = "Compile a particle effect into GLSL")]
struct Opt {
    /// Particle system description (JSON)
    #[clap(value_hint = ValueHint::FilePath)]
    system: PathBuf,

    /// Compiler configuration file (TOML, or JSON with a .json extension)
    #[clap(long, short, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Print the fragment shader instead of the vertex shader
    #[clap(long)]
    fragment: bool,
}

fn main() {
    match run(Opt::parse()) {
        Ok(code) => exit(code),
        Err(e) => {
            eprintln!("Error: {:?}", e);
            exit(2);
        }
    }
}

fn run(opt: Opt) -> Result<i32, Error> {
    let mut config = match &opt.config {
        Some(path) => CompilerConfig::from_file(path)
            .with_context(|| format!("Cannot load config from {}", path.display()))?,
        None => CompilerConfig::load_or_default(),
    };
    config.apply_env_overrides();
    init_logging(&config.logging);

    let content = std::fs::read_to_string(&opt.system)
        .with_context(|| format!("Cannot read {}", opt.system.display()))?;
    let system: System =
        serde_json::from_str(&content).context("Invalid particle system description")?;

    let mut session = ParticleEffectSession::new(&config)
        .context("Invalid configuration")?
        .with_system(system);
    if session.apply(EditEvent::Paste(NodePath::root())) != SessionState::Committed {
        for diagnostic in session.diagnostics() {
            eprintln!("{}", diagnostic);
        }
        return Ok(1);
    }

    let effect = session
        .committed()
        .context("Session committed without an artifact")?;
    if opt.fragment {
        print!("{}", effect.sources().fragment);
    } else {
        print!("{}", effect.sources().vertex);
    }
    Ok(0)
}
