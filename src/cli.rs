use std::path::PathBuf;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use clap::builder::styling::{AnsiColor, Color, Style, Styles};
use clap::{Args, ColorChoice, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::aot::{Shell, generate};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tracing::{info, warn};

use qcluster::classify::openai::OAIEmbedder;
use qcluster::classify::{DEFAULT_NUM_CLUSTERS, DEFAULT_TOP_K};
use qcluster::{AppError, AppResult, Classifier, ClusterParams, Embedder, NoEmbedder, io_utils};

const STYLES: Styles = Styles::styled()
    .header(Style::new().bold())
    .usage(Style::new().bold())
    .error(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))))
    .literal(
        Style::new()
            .bold()
            .fg_color(Some(Color::Ansi(AnsiColor::Green))),
    )
    .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))))
    .valid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
    .invalid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightRed))));

/// Long-form CLI description shown in `--help`.
const LONG_ABOUT: &str = "qcluster - Deterministic clustering of questionnaire items

Groups question texts into a fixed number of clusters using a precomputed
similarity matrix. The same input always produces the same clusters, the same
centroid questions and the same representative questions.

Representative questions are picked with a sentence embedding model, either
loaded locally (requires the `local-ml` build feature) or served by an
OpenAI-compatible embeddings endpoint.";

/// Default embedding model for both backends.
pub const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// qcluster - Deterministic clustering of questionnaire items.
#[derive(Parser, Debug, Clone)]
#[command(author, version, propagate_version = true, about, long_about = Some(LONG_ABOUT), styles = STYLES)]
pub struct Cli {
    /// Color choice for the output
    #[arg(long, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Subcommand to run
    #[command(subcommand)]
    pub cmd: Cmd,
}

/// Top-level commands supported by the CLI.
#[derive(Subcommand, Debug, Clone)]
pub enum Cmd {
    /// Cluster questions using a similarity matrix
    Cluster(ClusterArgs),

    /// Generate shell completion for a given shell
    Completion {
        /// Output file to write the completion script to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// The shell to generate the completion for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Inputs and parameters for a clustering run.
#[derive(Args, Debug, Clone)]
pub struct ClusterArgs {
    /// JSON array of questions (strings or `{question_no, question_text}` objects)
    #[arg(short = 'i', long)]
    pub questions: PathBuf,

    /// JSON array of rows forming the NxN similarity matrix
    #[arg(short, long)]
    pub similarity: PathBuf,

    /// Number of clusters to produce (at most one per question)
    #[arg(short, long, default_value_t = DEFAULT_NUM_CLUSTERS)]
    pub num_clusters: usize,

    /// Representative questions to keep per cluster; 0 skips the embedding model
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Output file for the clusters (JSON)
    /// If not provided, prints to stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub embedder: EmbedderArgs,
}

/// Which embedding backend picks representative questions.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbedderKind {
    /// Run the model in-process (needs the `local-ml` feature)
    Local,
    /// Call an OpenAI-compatible embeddings endpoint
    OpenAi,
    /// Do not compute representative questions
    None,
}

impl Default for EmbedderKind {
    fn default() -> Self {
        if cfg!(feature = "local-ml") {
            EmbedderKind::Local
        } else {
            EmbedderKind::OpenAi
        }
    }
}

/// Options selecting and configuring the embedding backend.
#[derive(Args, Debug, Clone)]
pub struct EmbedderArgs {
    /// Embedding backend
    #[arg(long, value_enum, default_value_t = EmbedderKind::default())]
    pub embedder: EmbedderKind,

    /// Embedding model name
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Whether to use secure connection (HTTPS) to the embedding server
    /// Defaults to false for local servers (i.e. `localhost` and private subnets)
    /// Defaults to true for public IP addresses and hostnames
    #[arg(long)]
    pub secure: Option<bool>,

    /// Host for the embedding server
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Port for the embedding server
    #[arg(long, default_value_t = 1234)]
    pub port: u16,

    /// OpenAI API version for the embedding server
    #[arg(long, default_value = "v1")]
    pub api_version: String,
}

impl EmbedderArgs {
    /// True when `host` is a loopback, private or local-only name.
    fn is_local_host(&self) -> bool {
        const LOCAL_SUFFIXES: [&str; 7] = [
            ".local",
            ".internal",
            ".lan",
            ".corp",
            ".home.arpa",
            ".private",
            ".test",
        ];
        self.host == "localhost"
            || LOCAL_SUFFIXES.iter().any(|s| self.host.ends_with(s))
            || self
                .host
                .parse::<std::net::Ipv4Addr>()
                .is_ok_and(|ip| ip.is_loopback() || ip.is_private() || ip.is_link_local())
            || self.host.parse::<std::net::Ipv6Addr>().is_ok_and(|ip| {
                ip.is_loopback() || ip.is_unique_local() || ip.is_unicast_link_local()
            })
    }

    pub fn api_base(&self) -> String {
        let scheme = match self.secure {
            Some(true) => "https",
            Some(false) => "http",
            None if self.is_local_host() => "http",
            None => "https",
        };
        format!(
            "{scheme}://{}:{}/{}",
            self.host, self.port, self.api_version
        )
    }

    pub fn get_client(&self) -> Client<OpenAIConfig> {
        Client::with_config(OpenAIConfig::default().with_api_base(self.api_base()))
    }

    /// Build the configured backend. Loading happens once per process.
    #[tracing::instrument(name = "Preparing embedding model", level = "info", skip(self))]
    pub async fn build(&self) -> AppResult<Box<dyn Embedder>> {
        match self.embedder {
            EmbedderKind::None => Ok(Box::new(NoEmbedder)),
            EmbedderKind::OpenAi => Ok(Box::new(OAIEmbedder::new(
                self.get_client(),
                self.model.clone(),
            ))),
            #[cfg(feature = "local-ml")]
            EmbedderKind::Local => Ok(Box::new(
                qcluster::classify::bert::BertEmbedder::new_from_pretrained(&self.model).await?,
            )),
            #[cfg(not(feature = "local-ml"))]
            EmbedderKind::Local => Err(AppError::Other(
                "this build has no local embedding model; rebuild with `--features local-ml` \
                 or pass `--embedder open-ai`"
                    .to_string(),
            )),
        }
    }
}

impl Cmd {
    /// Execute the chosen top-level command.
    #[tracing::instrument(name = "Running command", level = "info", skip(self))]
    pub async fn run(&self) -> AppResult<()> {
        match self {
            Cmd::Cluster(args) => args.run().await,
            Cmd::Completion { shell, output } => {
                let mut cmd = Cli::command();
                if let Some(output_path) = output {
                    let mut file = std::fs::OpenOptions::new()
                        .write(true)
                        .truncate(true)
                        .create(true)
                        .open(output_path)?;
                    generate(*shell, &mut cmd, "qcluster", &mut file);
                    info!(
                        "Generated completion script for {} at {}",
                        shell,
                        output_path.display()
                    );
                } else {
                    generate(*shell, &mut cmd, "qcluster", &mut std::io::stdout());
                }
                Ok(())
            }
        }
    }
}

impl ClusterArgs {
    /// Effective parameters; a disabled embedder means no representatives.
    pub fn params(&self) -> ClusterParams {
        let top_k = if self.embedder.embedder == EmbedderKind::None {
            0
        } else {
            self.top_k
        };
        ClusterParams {
            num_clusters: self.num_clusters,
            top_k,
        }
    }

    #[tracing::instrument(name = "Clustering questions from files", level = "info", skip(self))]
    async fn run(&self) -> AppResult<()> {
        if self.num_clusters == 0 {
            return Err(AppError::InvalidClusterCount { requested: 0 });
        }
        let questions = io_utils::read_questions(&self.questions).await?;
        let similarity = io_utils::read_similarity(&self.similarity).await?;

        let params = self.params();
        if params.top_k == 0 && self.top_k > 0 {
            warn!("Embedder disabled; clusters will have no representative questions");
        }
        let embedder: Box<dyn Embedder> = if params.top_k == 0 {
            Box::new(NoEmbedder)
        } else {
            self.embedder.build().await?
        };

        let classifier = Classifier::new(embedder, params);
        let clusters = classifier.classify(&questions, &similarity).await?;
        info!(
            "Grouped {} questions into {} clusters",
            questions.len(),
            clusters.len()
        );
        io_utils::write_json_output(self.output.as_ref(), &clusters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("qcluster").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cluster_defaults() {
        let cli = parse(&["cluster", "-i", "q.json", "-s", "s.json"]);
        let Cmd::Cluster(args) = cli.cmd else {
            panic!("expected cluster command");
        };
        assert_eq!(args.params(), ClusterParams::default());
        assert_eq!(args.embedder.model, DEFAULT_MODEL);
        assert_eq!(args.embedder.embedder, EmbedderKind::default());
        assert!(args.output.is_none());
    }

    #[test]
    fn disabled_embedder_forces_zero_top_k() {
        let cli = parse(&[
            "cluster", "-i", "q.json", "-s", "s.json", "-n", "3", "-k", "4", "--embedder", "none",
        ]);
        let Cmd::Cluster(args) = cli.cmd else {
            panic!("expected cluster command");
        };
        assert_eq!(
            args.params(),
            ClusterParams {
                num_clusters: 3,
                top_k: 0
            }
        );
    }

    #[test]
    fn api_base_scheme_follows_host() {
        let mut args = parse(&["cluster", "-i", "q", "-s", "s"]);
        let Cmd::Cluster(ref mut cluster) = args.cmd else {
            panic!("expected cluster command");
        };
        let emb = &mut cluster.embedder;
        assert_eq!(emb.api_base(), "http://localhost:1234/v1");
        emb.host = "192.168.1.20".to_string();
        assert!(emb.api_base().starts_with("http://"));
        emb.host = "api.example.com".to_string();
        assert_eq!(emb.api_base(), "https://api.example.com:1234/v1");
        emb.secure = Some(false);
        assert!(emb.api_base().starts_with("http://"));
    }

    #[test]
    fn negative_cluster_count_fails_value_parsing() {
        let err = Cli::try_parse_from([
            "qcluster",
            "cluster",
            "-i",
            "q",
            "-s",
            "s",
            "--num-clusters=-1",
        ])
        .err()
        .expect("negative count must not parse");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[tokio::test]
    async fn zero_cluster_count_is_rejected_before_reading_inputs() {
        let cli = parse(&["cluster", "-i", "missing-q.json", "-s", "missing-s.json", "-n", "0"]);
        let Cmd::Cluster(args) = cli.cmd else {
            panic!("expected cluster command");
        };
        assert_eq!(args.num_clusters, 0);
        let err = args.run().await.unwrap_err();
        assert!(matches!(err, AppError::InvalidClusterCount { requested: 0 }));
    }
}
