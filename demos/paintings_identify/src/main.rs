use argh::FromArgs;
use std::path::PathBuf;

use kornia_io::functional as F;
use kornia_paintings::{
    config::PipelineConfig,
    corpus::ReferenceCorpus,
    detector::FrameDetector,
    embedder::ColorHistogramEmbedder,
    matcher::{MatchStrategy, PaintingMatcher},
    metrics::Metric,
    pipeline::PaintingIdentifier,
};

#[derive(FromArgs)]
/// Identify the paintings in a photo against a reference corpus
struct Args {
    /// path to the photo
    #[argh(option, short = 'i')]
    image: PathBuf,

    /// path to the reference corpus json
    #[argh(option, short = 'c')]
    corpus: PathBuf,

    /// matching strategy: keypoint, embedding, combined (default: keypoint)
    #[argh(option, short = 's', default = "String::from(\"keypoint\")")]
    strategy: String,

    /// embedding distance: euclidean, cityblock, minkowski[:p], chebyshev, cosine, jaccard
    #[argh(option, short = 'm', default = "Metric::Cosine", from_str_fn(to_metric))]
    metric: Metric,

    /// histogram bins per channel of the embedder, must match the corpus (default: 16)
    #[argh(option, default = "16")]
    bins: usize,

    /// write the photo with the detected frames drawn to this png
    #[argh(option, short = 'a')]
    annotated: Option<PathBuf>,

    /// json file overriding the detector and matcher parameters
    #[argh(option)]
    config: Option<PathBuf>,
}

fn to_metric(value: &str) -> Result<Metric, String> {
    value.parse().map_err(|e| format!("{e}"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let strategy = match args.strategy.as_str() {
        "keypoint" => MatchStrategy::KeypointOnly,
        "embedding" => MatchStrategy::EmbeddingOnly(args.metric),
        "combined" => MatchStrategy::Combined(args.metric),
        other => return Err(format!("unknown strategy: {other}").into()),
    };

    let config = match args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    let corpus = ReferenceCorpus::load(&args.corpus)?;
    let matcher = PaintingMatcher::new(corpus, config.matcher)?
        .with_embedder(ColorHistogramEmbedder::new(args.bins)?);
    let identifier = PaintingIdentifier::new(FrameDetector::new(config.detector)?, matcher);

    let image = F::read_image_any_rgb8(&args.image)?;
    log::info!("read {} of size {}", args.image.display(), image.size());

    let (identifications, annotated) = identifier.identify_annotated(&image, strategy)?;

    if let Some(path) = args.annotated {
        F::write_image_png_rgb8(&path, &annotated)?;
        log::info!("wrote the annotated photo to {}", path.display());
    }

    for (i, identification) in identifications.iter().enumerate() {
        let corpus = identifier.matcher().corpus();
        let filename = match identification.matches.first() {
            Some(best) => corpus.filename(best.index)?,
            None => "-",
        };
        println!(
            "painting {i}: {} ({filename})",
            serde_json::to_string(identification)?
        );
    }

    if identifications.is_empty() {
        println!("no painting found");
    }

    Ok(())
}
