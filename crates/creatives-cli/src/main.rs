mod display;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use creatives_ai::{AiRefiner, ClientRegistry, CreativesGenerator, PromptTemplate};
use creatives_core::{QuestionDraft, ServiceRegistry, Tone};
use creatives_sync::{CtGovClient, GraphqlClient, TrialSource, augment};
use futures::StreamExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Service whose provider configs are used for AI-backed refinement.
const REFINE_SERVICE: &str = "prescreener";

#[derive(Parser)]
#[command(name = "creatives")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Clinical trial ad creatives and prescreener question refinement", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// AI service registry JSON (built-in defaults when omitted)
    #[arg(long, global = true, env = "CREATIVES_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite a generated prescreener question
    Refine {
        /// Question id
        #[arg(long)]
        id: String,

        /// Generated question title
        #[arg(long)]
        title: String,

        /// Eligibility explanation behind the question
        #[arg(long)]
        explain: String,

        /// Free-form refinement instruction
        #[arg(short, long, conflicts_with = "tone", required_unless_present = "tone")]
        instruction: Option<String>,

        /// Use a tone preset instead of an instruction
        #[arg(short, long)]
        tone: Option<Tone>,

        /// GraphQL endpoint of the refinement service
        #[arg(long, env = "CREATIVES_GRAPHQL_URL", required_unless_present = "provider")]
        endpoint: Option<String>,

        /// Bearer token for the refinement service
        #[arg(long, env = "CREATIVES_API_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Call this AI provider directly instead of the refinement service
        #[arg(long)]
        provider: Option<String>,

        /// Customer whose provider settings to use with --provider
        #[arg(long, default_value = "acmeinc")]
        customer: String,
    },

    /// List tone presets
    Tones,

    /// Show a ClinicalTrials.gov study summary
    Trial {
        /// NCT identifier, e.g. NCT06585670
        #[arg(long)]
        nct_id: String,
    },

    /// Generate ad creatives for a trial with every configured provider
    Generate {
        #[arg(long, default_value = "acmeinc")]
        customer: String,

        /// NCT identifier of the trial
        #[arg(long)]
        nct_id: String,

        /// Prompt template JSON (built-in creatives template when omitted)
        #[arg(long)]
        template: Option<PathBuf>,

        /// Render cards instead of JSON lines
        #[arg(long)]
        cards: bool,

        /// Show creatives as already published
        #[arg(long, requires = "cards")]
        published: bool,
    },
}

fn load_services(path: Option<&Path>) -> anyhow::Result<ServiceRegistry> {
    match path {
        Some(path) => ServiceRegistry::load(path)
            .with_context(|| format!("loading service registry from {}", path.display())),
        None => Ok(ServiceRegistry::builtin()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("creatives v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Refine {
            id,
            title,
            explain,
            instruction,
            tone,
            endpoint,
            token,
            provider,
            customer,
        } => {
            let mut draft = QuestionDraft::new(id, title, explain);
            match (tone, instruction) {
                (Some(tone), _) => draft.apply_tone(tone),
                (None, Some(instruction)) => draft.set_instruction(instruction),
                (None, None) => {}
            }

            let outcome = if let Some(provider) = provider {
                let services = load_services(cli.config.as_deref())?;
                let resolved = services.ai_service_configs(&customer, REFINE_SERVICE)?;
                let Some(config) = resolved.configs.get(&provider) else {
                    match resolved.invalid.get(&provider) {
                        Some(problems) => bail!("invalid {provider} config for {customer}: {problems}"),
                        None => bail!("{customer} has no {REFINE_SERVICE} config for {provider}"),
                    }
                };
                let client = ClientRegistry::default()
                    .get_client(&provider, config)
                    .with_context(|| format!("no AI client for provider {provider}"))?;
                augment(&mut draft, &AiRefiner::new(client)).await
            } else {
                let endpoint = endpoint.context("--endpoint is required without --provider")?;
                let mut client = GraphqlClient::new(endpoint);
                if let Some(token) = token {
                    client = client.with_token(token);
                }
                info!(endpoint = client.endpoint(), "refining through the GraphQL service");
                augment(&mut draft, &client).await
            };
            display::print_refinement(&draft, &outcome);
            if let Some(message) = outcome.message() {
                bail!(message);
            }
        }

        Commands::Tones => display::print_tones(),

        Commands::Trial { nct_id } => {
            let trial = CtGovClient::new()
                .trial_summary(&nct_id)
                .await
                .with_context(|| format!("fetching {nct_id} from ClinicalTrials.gov"))?;
            display::print_trial(&trial);
        }

        Commands::Generate {
            customer,
            nct_id,
            template,
            cards,
            published,
        } => {
            let services = load_services(cli.config.as_deref())?;
            let template = match template {
                Some(path) => PromptTemplate::load(&path)?,
                None => PromptTemplate::builtin_creatives()?,
            };
            let clients = ClientRegistry::default();
            let trials = CtGovClient::new();
            let generator = CreativesGenerator::new(&clients, &services, &trials, &template);

            let mut stream = generator
                .generate(&customer, &nct_id)
                .await
                .with_context(|| format!("generating creatives for {nct_id}"))?;
            let mut batches = 0usize;
            while let Some(batch) = stream.next().await {
                batches += 1;
                if cards {
                    display::print_generated(&batch, published);
                } else {
                    println!("{}", serde_json::to_string(&batch)?);
                }
            }
            if batches == 0 {
                bail!("no provider returned creatives for {nct_id}");
            }
        }
    }

    Ok(())
}
