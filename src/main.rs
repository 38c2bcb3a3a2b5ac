use anyhow::Result;
use log::{debug, error, info, trace, warn};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;
use worm_common::{RecordingCanvas, ScheduledAction, ScheduledEvent, Snapshot, WormsConfig};
use worm_engine::Simulation;

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting Worm Engine...");

    // --- Load Configuration ---
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = WormsConfig::load(&config_path)?;
    info!("Loaded configuration from {}", config_path);
    debug!("Simulation Parameters: {:#?}", config.get_sim_params());

    if config.worms.parallel {
        info!("Using {} Rayon threads.", rayon::current_num_threads());
    }

    // --- Initialize Simulation ---
    let mut sim = Simulation::from_config(&config)?;
    info!("Population initialized with {} worms.", sim.worms().len());

    let total_ticks = config.timing.total_ticks;
    let record_interval = config.timing.record_interval;
    let mut schedule = config.schedule.clone();
    schedule.sort_by_key(|event| event.tick);
    let mut pending = schedule.into_iter().peekable();

    let mut canvas = RecordingCanvas::new();
    let mut snapshots: Vec<Snapshot> = Vec::new();

    info!("Starting animation loop for {} ticks...", total_ticks);
    let start_time = Instant::now();
    let mut previous_print_time = start_time;

    for tick in 0..total_ticks {
        while let Some(event) = pending.next_if(|event| event.tick <= tick) {
            apply_event(&mut sim, &event);
        }

        let tick_start_time = Instant::now();
        canvas.clear();
        let drawn = sim.tick(&mut canvas);
        let tick_duration = tick_start_time.elapsed();

        let is_record_tick = (tick + 1) % record_interval == 0;
        if drawn && is_record_tick && config.output.save_snapshots {
            snapshots.push(Snapshot {
                tick: tick + 1,
                viewport: sim.viewport(),
                heads: sim.heads(),
                commands: canvas.take_commands(),
            });
        }

        let current_time = Instant::now();
        if current_time.duration_since(previous_print_time).as_secs_f64() >= 5.0 || tick + 1 == total_ticks {
            info!(
                "Tick [{}/{}] | Worms: {} | Running: {} | Snapshots: {} | Elapsed: {:.2} s",
                tick + 1,
                total_ticks,
                sim.worms().len(),
                sim.is_running(),
                snapshots.len(),
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = current_time;
        } else {
            trace!("Tick [{}/{}] completed in {:.3} ms", tick + 1, total_ticks, tick_duration.as_secs_f64() * 1000.0);
        }
    }

    for event in pending {
        warn!("Scheduled event at tick {} is past the end of the run; skipped.", event.tick);
    }

    info!("Animation finished in {:.3} seconds.", start_time.elapsed().as_secs_f64());

    // --- Save Recorded Data ---
    if config.output.save_snapshots {
        save_snapshots(&config, &snapshots)?;
    } else {
        info!("Skipping saving snapshots as per config (save_snapshots is false).");
    }

    if config.output.save_positions {
        let filename = format!("{}_final_joints.csv", config.output.base_filename);
        match csv::Writer::from_path(&filename) {
            Ok(mut writer) => {
                writer.write_record(["worm", "joint", "x", "y"])?;
                for (w, worm) in sim.worms().iter().enumerate() {
                    for (j, joint) in worm.joints().iter().enumerate() {
                        writer.write_record(&[
                            w.to_string(),
                            j.to_string(),
                            format!("{:.4}", joint.x),
                            format!("{:.4}", joint.y),
                        ])?;
                    }
                }
                writer.flush()?;
                info!("Final joint positions saved to {}", filename);
            }
            Err(e) => error!("Error saving CSV file '{}': {}", filename, e),
        }
    } else {
        info!("Skipping saving final positions as per config.");
    }

    info!("Worm Engine Complete.");
    Ok(())
}

/// Plays one scheduled control-panel action against the simulation.
fn apply_event(sim: &mut Simulation, event: &ScheduledEvent) {
    debug!("Tick {}: applying {:?}", event.tick, event.action);
    match &event.action {
        ScheduledAction::Refresh { overrides } => sim.refresh(overrides),
        ScheduledAction::Resize { width, height } => sim.resize(*width, *height),
        ScheduledAction::Toggle => {
            sim.toggle();
        }
        ScheduledAction::SetShadow { enabled } => sim.set_shadow(*enabled),
    }
}

fn save_snapshots(config: &WormsConfig, snapshots: &[Snapshot]) -> Result<()> {
    let base = &config.output.base_filename;
    let output_format = config.output.format.as_deref().unwrap_or("json");

    let (filename, result) = match output_format {
        "bincode" => {
            // Binary format (much more compact)
            let filename = format!("{}_snapshots.bin", base);
            let result = File::create(&filename)
                .map_err(anyhow::Error::from)
                .and_then(|file| Ok(bincode::serialize_into(BufWriter::new(file), snapshots)?));
            (filename, result)
        }
        "messagepack" => {
            // MessagePack format (compact and cross-platform)
            let filename = format!("{}_snapshots.msgpack", base);
            let result = File::create(&filename)
                .map_err(anyhow::Error::from)
                .and_then(|file| Ok(rmp_serde::encode::write(&mut BufWriter::new(file), snapshots)?));
            (filename, result)
        }
        other => {
            if other != "json" {
                error!("Unknown output format: {}. Using JSON instead.", other);
            }
            let filename = format!("{}_snapshots.json", base);
            let result = File::create(&filename)
                .map_err(anyhow::Error::from)
                .and_then(|file| {
                    let mut writer = BufWriter::new(file);
                    serde_json::to_writer(&mut writer, snapshots)?;
                    writer.flush()?;
                    Ok(())
                });
            (filename, result)
        }
    };

    match result {
        Ok(()) => {
            info!("{} snapshots saved to {}", snapshots.len(), filename);
            Ok(())
        }
        Err(e) => {
            error!("Error writing snapshots to '{}': {}", filename, e);
            Err(e)
        }
    }
}
