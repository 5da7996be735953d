use std::path::PathBuf;
use std::time::Instant;

use bilingual_tts::{segment, Pipeline, PipelineConfig};

/// Usage: `cargo run --example speak -- [config.json] "text to speak"`
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let text = args
        .pop()
        .unwrap_or_else(|| "The word کتاب means book در زبان انگلیسی".to_string());
    let config = match args.first() {
        Some(path) => PipelineConfig::from_json_file(&PathBuf::from(path))?,
        None => PipelineConfig::default(),
    };

    for seg in segment(&text) {
        println!("[{}] {}", seg.language, seg.text);
    }

    let pipeline = Pipeline::new(config)?;
    let start = Instant::now();
    let report = pipeline.generate_audio_report(&text)?;
    println!(
        "Synthesized {:.2}s of audio in {:.2?} ({}/{} segments)",
        report.duration_secs,
        start.elapsed(),
        report.synthesized,
        report.segments
    );
    for failure in &report.failures {
        println!("  skipped #{} {:?}: {}", failure.index, failure.segment.text, failure.error);
    }
    println!("Saved to {}", report.path.display());
    Ok(())
}
