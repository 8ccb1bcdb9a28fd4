use anyhow::Result;
use clap::Parser;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clipgrep::clip_encoder::ClipEncoder;
use clipgrep::compose::{self, ComposeOpts};
use clipgrep::edl_encoder::EdlEncoder;
use clipgrep::export::{self, BATCH_SIZE};
use clipgrep::ffmpeg_renderer::FfmpegRenderer;
use clipgrep::json_array_encoder::JsonArrayEncoder;
use clipgrep::m3u_encoder::M3uEncoder;
use clipgrep::search::{DEFAULT_SEMANTIC_THRESHOLD, Engine, SearchOpts, SearchType};
use clipgrep::segments::Composition;
use clipgrep::vtt_encoder::VttEncoder;

fn main() -> Result<()> {
    clipgrep::logging::init();
    let params = Params::parse();

    let mut engine = match params.seed {
        Some(seed) => Engine::new().with_seed(seed),
        None => Engine::new(),
    };

    let opts = SearchOpts {
        prefer: params.prefer.clone(),
        exact_match: params.exact_match,
        threshold: params.threshold,
        force_reindex: params.force_reindex,
    };

    let results = engine.search(&params.input, &params.search, params.search_type, &opts)?;
    for (file, err) in &results.skipped {
        eprintln!("skipped {}: {err}", file.display());
    }
    if results.is_empty() {
        eprintln!("No results found for: {}", params.search.join(" "));
        return Ok(());
    }

    let compose_opts = ComposeOpts {
        padding: params.padding,
        resync: params.resync,
        randomize: params.randomize,
        max_clips: params.max_clips,
    };
    let composition = compose::build(
        &results.matches,
        params.search_type,
        &compose_opts,
        engine.rng_mut(),
    );

    if params.demo {
        for clip in &composition {
            println!(
                "{} | {:.2} - {:.2} | {}",
                clip.file.display(),
                clip.start,
                clip.end,
                clip.content
            );
        }
        return Ok(());
    }

    let ext = params
        .output
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "m3u" => write_playlist(M3uEncoder::new(writer(&params.output)?), &composition)?,
        "edl" => write_playlist(EdlEncoder::new(writer(&params.output)?), &composition)?,
        "vtt" => write_playlist(VttEncoder::new(writer(&params.output)?), &composition)?,
        "json" => write_playlist(JsonArrayEncoder::new(writer(&params.output)?), &composition)?,
        _ => render_supercut(&params, &composition)?,
    }

    if params.write_vtt && ext != "vtt" {
        let vtt_path = params.output.with_extension("vtt");
        write_playlist(VttEncoder::new(writer(&vtt_path)?), &composition)?;
        println!("Subtitle file written to: {}", vtt_path.display());
    }

    Ok(())
}

fn writer(path: &PathBuf) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

fn write_playlist<E: ClipEncoder>(mut encoder: E, composition: &Composition) -> Result<()> {
    for clip in composition {
        encoder.write_clip(clip)?;
    }
    encoder.close()?;
    Ok(())
}

fn render_supercut(params: &Params, composition: &Composition) -> Result<()> {
    let mut renderer = FfmpegRenderer::new()?;

    if params.export_clips {
        let summary = export::export_individual_clips(&mut renderer, composition, &params.output)?;
        println!("Exported {} of {} clips", summary.rendered, summary.total_batches);
        return Ok(());
    }

    if composition.len() <= BATCH_SIZE {
        export::create_supercut(&mut renderer, composition, &params.output)?;
        println!("Supercut written to: {}", params.output.display());
        return Ok(());
    }

    let bar = indicatif::ProgressBar::new(100);
    bar.set_style(indicatif::ProgressStyle::with_template(
        "{bar:40.cyan/blue} {percent}%",
    )?);

    let mut update = |p: f64| bar.set_position((p * 100.0) as u64);
    let summary = export::create_supercut_in_batches(
        &mut renderer,
        composition,
        &params.output,
        BATCH_SIZE,
        Some(&mut update as &mut dyn FnMut(f64)),
    )?;
    bar.finish_and_clear();

    if summary.is_partial() {
        println!(
            "Supercut written to: {} ({} of {} batches rendered)",
            params.output.display(),
            summary.rendered,
            summary.total_batches
        );
    } else {
        println!("Supercut written to: {}", params.output.display());
    }

    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "clipgrep")]
#[command(about = "Search spoken content in media transcripts and compose supercuts")]
struct Params {
    /// Media files to search.
    #[arg(short = 'i', long = "input", required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Search queries; independent, any may match.
    #[arg(short = 's', long = "search", required = true, num_args = 1..)]
    pub search: Vec<String>,

    #[arg(
        short = 't',
        long = "search-type",
        value_enum,
        default_value_t = SearchType::Sentence
    )]
    pub search_type: SearchType,

    /// Output path; .m3u/.edl/.vtt/.json write playlists, anything else renders.
    #[arg(short = 'o', long = "output", default_value = "supercut.mp4")]
    pub output: PathBuf,

    /// Seconds of padding around each clip (defaults per search type).
    #[arg(short = 'p', long = "padding")]
    pub padding: Option<f64>,

    /// Constant offset to correct transcript/media drift, in seconds.
    #[arg(long = "resync", default_value_t = 0.0, allow_hyphen_values = true)]
    pub resync: f64,

    /// Keep at most this many clips (0 = unlimited).
    #[arg(short = 'm', long = "max-clips", default_value_t = 0)]
    pub max_clips: usize,

    /// Shuffle the composition for remix-style output.
    #[arg(short = 'r', long = "randomize", default_value_t = false)]
    pub randomize: bool,

    /// Match whole words only.
    #[arg(long = "exact-match", default_value_t = false)]
    pub exact_match: bool,

    /// Similarity threshold for semantic search.
    #[arg(long = "threshold", default_value_t = DEFAULT_SEMANTIC_THRESHOLD)]
    pub threshold: f64,

    /// Preferred transcript extension (e.g. .srt).
    #[arg(long = "prefer")]
    pub prefer: Option<String>,

    /// Rebuild embedding caches for semantic search.
    #[arg(long = "force-reindex", default_value_t = false)]
    pub force_reindex: bool,

    /// Seed for mash selection and shuffling (reproducible output).
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Print the composition instead of rendering it.
    #[arg(long = "demo", default_value_t = false)]
    pub demo: bool,

    /// Export each clip as its own file instead of one supercut.
    #[arg(long = "export-clips", default_value_t = false)]
    pub export_clips: bool,

    /// Also write supercut subtitles next to the output.
    #[arg(long = "write-vtt", default_value_t = false)]
    pub write_vtt: bool,
}
