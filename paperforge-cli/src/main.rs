use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

// Import from paperforge-core
use paperforge_core::paper::{build_generation_prompt, build_knowledge_point_prompt};
use paperforge_core::{
    assemble_paper, build_sample_paper, recover_json, DeploymentProfile, DocumentProcessor,
    PaperRequest, PipelineConfig, RawDocument,
};

// Import CLI utilities
use paperforge::server::{self, AppState, BIND_ENV, DEFAULT_BIND};
use paperforge::{init_tracing, save_stages};

#[derive(Parser)]
#[command(name = "paperforge")]
#[command(about = "Extract teaching material from office documents and assemble test papers")]
struct Args {
    /// Default log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract and clean the text of a document
    Extract {
        /// Document to process (docx, doc, pptx, ppt, pdf, txt)
        input: PathBuf,

        /// Path to custom config file (YAML format)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Deployment profile: standard or knowledge-points
        #[arg(long)]
        profile: Option<DeploymentProfile>,

        /// Declared MIME type (inferred from the extension if not specified)
        #[arg(long)]
        mime: Option<String>,

        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Enable detailed profiling of all pipeline steps
        #[arg(long)]
        profile_steps: bool,

        /// Dump all intermediate pipeline stage outputs to a directory
        #[arg(long)]
        dump_stages: bool,

        /// Directory for stage dump output
        #[arg(long, default_value = "test_outputs/stages")]
        stages_dir: PathBuf,

        /// Print the effective config as YAML and exit
        #[arg(long)]
        show_config: bool,
    },

    /// Recover JSON from a model completion (file path or `-` for stdin)
    Recover {
        input: String,

        /// Assemble a paper, falling back to the sample paper on failure
        #[arg(long)]
        paper: bool,

        /// Paper request JSON used for the sample fallback
        #[arg(long)]
        request: Option<PathBuf>,
    },

    /// Print the sample paper for a request
    Sample {
        #[arg(long)]
        request: Option<PathBuf>,
    },

    /// Print the generation prompt, or the knowledge-point prompt for a document
    Prompt {
        #[arg(long)]
        request: Option<PathBuf>,

        /// Build the knowledge-point prompt from this document instead
        #[arg(long)]
        knowledge_points: Option<PathBuf>,
    },

    /// Run the upload and recovery HTTP server
    Serve {
        /// Address to bind (falls back to PAPERFORGE_BIND, then 127.0.0.1:8787)
        #[arg(long)]
        bind: Option<String>,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    match args.command {
        Command::Extract {
            input,
            config,
            profile,
            mime,
            output,
            profile_steps,
            dump_stages,
            stages_dir,
            show_config,
        } => {
            let config = load_config(config.as_deref(), profile);
            if show_config {
                print!("{}", config.to_yaml()?);
                return Ok(());
            }
            run_extract(&input, config, mime, output, profile_steps, dump_stages.then_some(stages_dir))
        }
        Command::Recover { input, paper, request } => {
            let completion = read_input(&input)?;
            if paper {
                let request = load_request(request.as_deref())?;
                let outcome = assemble_paper(Some(&completion), &request);
                println!("{}", serde_json::to_string_pretty(&outcome)?);
                return Ok(());
            }
            match recover_json(&completion) {
                Ok(value) => {
                    println!("{}", serde_json::to_string_pretty(&value)?);
                    Ok(())
                }
                Err(e) => Err(anyhow!("{e} ({})", e.detail())),
            }
        }
        Command::Sample { request } => {
            let request = load_request(request.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&build_sample_paper(&request))?);
            Ok(())
        }
        Command::Prompt {
            request,
            knowledge_points,
        } => {
            match knowledge_points {
                Some(path) => {
                    let processor =
                        DocumentProcessor::new(PipelineConfig::for_profile(DeploymentProfile::KnowledgePoints));
                    let document = RawDocument::from_path(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    let cleaned = processor.process(&document)?;
                    let limit = processor.config().limits.max_text_length;
                    println!("{}", build_knowledge_point_prompt(&cleaned.text, limit));
                }
                None => {
                    let request = load_request(request.as_deref())?;
                    println!("{}", build_generation_prompt(&request));
                }
            }
            Ok(())
        }
        Command::Serve { bind, config } => {
            let config = load_config(config.as_deref(), None);
            let bind = bind
                .or_else(|| std::env::var(BIND_ENV).ok().filter(|b| !b.trim().is_empty()))
                .unwrap_or_else(|| DEFAULT_BIND.to_string());
            let state = Arc::new(AppState::new(DocumentProcessor::new(config)));

            let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
            runtime.block_on(server::serve(state, &bind))
        }
    }
}

fn load_config(path: Option<&Path>, profile: Option<DeploymentProfile>) -> PipelineConfig {
    let mut config = PipelineConfig::load_with_fallback(path);

    match path {
        Some(p) => info!("📋 Loaded config from: {}", p.display()),
        None => info!("📋 Using default config"),
    }

    // Apply CLI overrides to config
    if let Some(profile) = profile {
        config.profile = profile;
        config.limits.max_text_length = profile.max_text_length();
    }
    config
}

fn load_request(path: Option<&Path>) -> Result<PaperRequest> {
    match path {
        Some(p) => {
            let content =
                std::fs::read_to_string(p).with_context(|| format!("reading request {}", p.display()))?;
            serde_json::from_str(&content).with_context(|| format!("parsing request {}", p.display()))
        }
        None => Ok(PaperRequest::default()),
    }
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("reading stdin")?;
        return Ok(buffer);
    }
    std::fs::read_to_string(input).with_context(|| format!("reading {input}"))
}

fn run_extract(
    input: &Path,
    config: PipelineConfig,
    mime: Option<String>,
    output: Option<PathBuf>,
    profile_steps: bool,
    stages_dir: Option<PathBuf>,
) -> Result<()> {
    let mut document =
        RawDocument::from_path(input).with_context(|| format!("reading {}", input.display()))?;
    if let Some(mime) = mime {
        document.mime_type = mime;
    }

    let processor = DocumentProcessor::new(config).with_profiling(profile_steps);
    info!("📄 Processing: {}", input.display());

    // Stage dump mode: capture and save all intermediates
    if let Some(stages_dir) = stages_dir {
        info!("🔬 Pipeline stage dump mode");
        let stages = processor.capture_stages(&document)?;
        for path in save_stages(&stages, processor.config(), &document.file_name, &stages_dir)? {
            info!("  💾 {}", path.display());
        }
        info!("✅ All stages dumped to: {}", stages_dir.display());
        return Ok(());
    }

    let response = processor.process_upload(&document);
    let json = serde_json::to_string_pretty(&response)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            info!("💾 Results saved to: {}", path.display());
        }
        None => println!("{json}"),
    }

    if response.is_success() {
        Ok(())
    } else {
        Err(anyhow!("{} could not be extracted", document.file_name))
    }
}
