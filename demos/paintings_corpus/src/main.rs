use argh::FromArgs;
use std::path::PathBuf;

use kornia_paintings::{
    builder::CorpusBuilder, config::PipelineConfig, embedder::ColorHistogramEmbedder,
};

#[derive(FromArgs)]
/// Build a reference corpus from a directory of labeled painting photos
struct Args {
    /// directory holding the `room__IMG_XXXX__NN` images
    #[argh(option, short = 'd')]
    directory: PathBuf,

    /// path of the corpus json to write
    #[argh(option, short = 'o')]
    output: PathBuf,

    /// also store color histogram embeddings
    #[argh(switch, short = 'e')]
    embeddings: bool,

    /// histogram bins per channel of the embedder (default: 16)
    #[argh(option, default = "16")]
    bins: usize,

    /// json file overriding the matcher parameters
    #[argh(option)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let config = match args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    let mut builder = CorpusBuilder::new(&config.matcher)?;
    if args.embeddings {
        builder = builder.with_embedder(ColorHistogramEmbedder::new(args.bins)?);
    }

    let corpus = builder.build_from_directory(&args.directory)?;
    corpus.save(&args.output)?;

    log::info!(
        "wrote {} records from {} to {}",
        corpus.len(),
        args.directory.display(),
        args.output.display()
    );

    Ok(())
}
