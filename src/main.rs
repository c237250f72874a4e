use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

mod audio;
mod config;
mod lighting;

use audio::{FeatureStream, MicCapture};
use config::Config;
use lighting::{CommandDispatcher, HueBridge, LightBridge, LightingMapper, MappingConfig};

/// Commands waiting on the bridge at any one time; beyond this, new ones are
/// dropped as stale.
const DISPATCH_QUEUE_CAPACITY: usize = 4;

#[derive(Parser)]
#[command(name = "lumitone")]
#[command(about = "Drives Hue lights from live microphone loudness and pitch")]
struct Args {
    /// Path to the JSON config file
    #[arg(long, short, default_value = "lumitone.json")]
    config: String,

    /// Bridge address override (e.g. 192.168.1.2)
    #[arg(long)]
    address: Option<String>,

    /// Bridge credential override
    #[arg(long)]
    username: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = Config::load_or_default(&args.config)?;
    if let Some(address) = args.address {
        config.bridge.address = address;
    }
    if let Some(username) = args.username {
        config.bridge.username = username;
    }
    if config.bridge.address.is_empty() {
        anyhow::bail!(
            "no bridge address configured; set bridge.address in {} or pass --address",
            args.config
        );
    }

    info!("Starting Lumitone");

    // The bridge connection gates everything: no confirmed connection, no
    // audio processing.
    let runtime = tokio::runtime::Runtime::new()?;
    let bridge = runtime
        .block_on(HueBridge::connect(
            &config.bridge.username,
            &config.bridge.address,
        ))
        .context("connecting to the Hue bridge")?;
    let bridge: Arc<dyn LightBridge> = Arc::new(bridge);

    runtime.block_on(resolve_light_names(bridge.as_ref(), &mut config.mapping))?;

    let (dispatcher, _worker) = CommandDispatcher::spawn(
        Arc::clone(&bridge),
        runtime.handle().clone(),
        DISPATCH_QUEUE_CAPACITY,
    );
    let mapper = Arc::new(Mutex::new(LightingMapper::new(config.mapping.clone())));

    let mut stream = FeatureStream::new(
        config.audio.sample_rate as f32,
        config.audio.volume_window,
    );
    {
        let mapper = Arc::clone(&mapper);
        let dispatcher = dispatcher.clone();
        stream.on_volume(move |volume| {
            for command in mapper.lock().unwrap().map_volume(volume) {
                dispatcher.dispatch(command);
            }
        });
    }
    {
        let mapper = Arc::clone(&mapper);
        let dispatcher = dispatcher.clone();
        stream.on_dominant_frequency(move |frequency| {
            for command in mapper.lock().unwrap().map_frequency(frequency) {
                dispatcher.dispatch(command);
            }
        });
    }

    let mut capture = MicCapture::start(&config.audio)?;
    info!("Pipeline running; press Ctrl-C to stop");
    stream.run(&mut capture);

    Ok(())
}

/// Resolves configured light names to bridge ids, overriding the numeric ids.
/// A configured name that the bridge does not know is a startup failure.
async fn resolve_light_names(bridge: &dyn LightBridge, mapping: &mut MappingConfig) -> Result<()> {
    if let Some(name) = &mapping.primary_light_name {
        mapping.primary_light = bridge
            .get_light_by_name(name)
            .await?
            .with_context(|| format!("no light named '{name}' on the bridge"))?;
        info!("Resolved primary light '{}' to id {}", name, mapping.primary_light);
    }
    if let Some(name) = &mapping.secondary_light_name {
        mapping.secondary_light = bridge
            .get_light_by_name(name)
            .await?
            .with_context(|| format!("no light named '{name}' on the bridge"))?;
        info!(
            "Resolved secondary light '{}' to id {}",
            name, mapping.secondary_light
        );
    }
    Ok(())
}
