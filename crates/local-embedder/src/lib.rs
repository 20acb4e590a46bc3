use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use futures::StreamExt;
use murmur3::murmur3_x86_128;
use tokenizers::tokenizer::{Tokenizer, TruncationParams};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info_span, warn};
use tracing_indicatif::span_ext::IndicatifSpanExt;
use tracing_indicatif::style::ProgressStyle;

/// Model used when the caller does not pick one.
pub static DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

const MODEL_FILES: [&str; 3] = ["config.json", "model.safetensors", "tokenizer.json"];

#[derive(thiserror::Error, Debug)]
pub enum EmbedderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),
    #[error("Bincode encode error: {0}")]
    BincodeEncode(#[from] bincode::error::EncodeError),
    #[error("Int parse error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),
    #[error("Header value error: {0}")]
    HeaderValue(#[from] reqwest::header::ToStrError),
    #[error("Download of {file} failed with HTTP status {status}")]
    Download {
        file: String,
        status: reqwest::StatusCode,
    },
    #[error("Other error: {0}")]
    Other(String),
    #[error("{0}")]
    Dir(#[from] qcluster_dirs::DirError),
}

// Tokenizer error mapping
impl From<Box<dyn std::error::Error + Send + Sync>> for EmbedderError {
    fn from(e: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Tokenizer(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EmbedderError>;

/// The parts of `config.json` needed outside the model itself.
#[derive(serde::Deserialize)]
struct ModelDims {
    hidden_size: usize,
    max_position_embeddings: usize,
}

/// Sentence embedder backed by a BERT encoder with masked mean pooling.
///
/// Cheap to clone: the model and tokenizer are shared behind `Arc`s, so a single
/// instance can be loaded once and handed to every caller.
#[derive(Clone)]
pub struct BertEmbedder {
    device: Device,
    model: Arc<BertModel>,
    tokenizer: Arc<Tokenizer>,
    hidden_size: usize,
    cache_dir: Option<PathBuf>,
}

impl BertEmbedder {
    fn create_device() -> Result<Device> {
        #[cfg(all(target_os = "macos", target_arch = "aarch64"))]
        {
            Ok(Device::new_metal(0)?)
        }

        #[cfg(not(all(target_os = "macos", target_arch = "aarch64")))]
        {
            Ok(Device::Cpu)
        }
    }

    fn progress_style(template: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }

    /// Directory name for a hub model id, e.g. `org/name` -> `org_name`.
    fn model_slug(model_name: &str) -> String {
        model_name.replace('/', "_")
    }

    #[tracing::instrument(name = "Downloading embedding model from Hugging Face", level = "info")]
    pub async fn new_from_pretrained<S: AsRef<str> + std::fmt::Debug>(
        model_name: S,
    ) -> Result<Self> {
        let model_name = model_name.as_ref();
        let cache_dir = qcluster_dirs::DirType::Cache.ensure_dir_async().await?;
        let model_dir = cache_dir
            .join("huggingface")
            .join("transformers")
            .join(Self::model_slug(model_name));
        tokio::fs::create_dir_all(&model_dir).await?;

        let base_url = format!("https://huggingface.co/{model_name}/resolve/main/");

        let client = reqwest::ClientBuilder::new()
            .user_agent(concat!("qcluster-embedder/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            .referer(true)
            .retry(reqwest::retry::for_host("huggingface.co").max_retries_per_request(3))
            .build()?;

        for file in MODEL_FILES {
            let file_path = model_dir.join(file);
            if file_path.exists() {
                continue;
            }
            Self::download_file(&client, &format!("{base_url}{file}"), file, &file_path).await?;
        }

        let mut embedder = Self::new_from_dir(&model_dir)?;
        embedder.cache_dir = Some(
            qcluster_dirs::DirType::Cache
                .ensure_subdir(Path::new("embeddings").join(Self::model_slug(model_name)))?,
        );
        Ok(embedder)
    }

    /// Stream one hub file into `dest`, going through a `.part` file so an
    /// interrupted download is never mistaken for a complete one.
    async fn download_file(
        client: &reqwest::Client,
        url: &str,
        file: &str,
        dest: &Path,
    ) -> Result<()> {
        let resp = client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(EmbedderError::Download {
                file: file.to_string(),
                status: resp.status(),
            });
        }

        let header_span = info_span!("Downloading model file", file = %file);
        header_span.pb_set_message("Downloading...");
        header_span.pb_set_finish_message("Download complete");

        if let Some(content_length) = resp.headers().get(reqwest::header::CONTENT_LENGTH) {
            let file_size: u64 = content_length.to_str()?.parse()?;
            debug!("Expected file size: {} bytes", file_size);
            header_span.pb_set_style(&Self::progress_style(
                "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            ));
            header_span.pb_set_length(file_size);
        } else {
            warn!("Content-Length header not found.");
            header_span.pb_set_style(&Self::progress_style("{msg} {spinner}"));
        }
        let _enter = header_span.enter();

        let part_path = dest.with_extension("part");
        let mut open_file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&part_path)
            .await?;

        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            open_file.write_all(&chunk).await?;
            header_span.pb_inc(chunk.len() as u64);
        }
        open_file.flush().await?;
        open_file.sync_all().await?;
        drop(open_file);

        tokio::fs::rename(&part_path, dest).await?;
        Ok(())
    }

    /// Load a model from a directory holding `config.json`, `model.safetensors`
    /// and `tokenizer.json`. Embeddings loaded this way are not cached on disk.
    #[tracing::instrument(
        name = "Loading embedding model from directory",
        level = "info",
        skip(model_dir)
    )]
    pub fn new_from_dir<P: AsRef<Path>>(model_dir: P) -> Result<Self> {
        let model_dir = model_dir.as_ref();

        let config_bytes = std::fs::read(model_dir.join("config.json"))?;
        let config: BertConfig = serde_json::from_slice(&config_bytes)?;
        let dims: ModelDims = serde_json::from_slice(&config_bytes)?;

        let mut tokenizer = Tokenizer::from_file(model_dir.join("tokenizer.json"))
            .map_err(|e| EmbedderError::Tokenizer(e.to_string()))?;
        tokenizer.with_truncation(Some(TruncationParams {
            max_length: dims.max_position_embeddings,
            ..Default::default()
        }))?;

        let device = Self::create_device()?;

        let weights_data = std::fs::read(model_dir.join("model.safetensors"))?;
        let vb = VarBuilder::from_slice_safetensors(&weights_data, DType::F32, &device)?;
        let model = BertModel::load(vb, &config)?;

        Ok(Self {
            device,
            model: Arc::new(model),
            tokenizer: Arc::new(tokenizer),
            hidden_size: dims.hidden_size,
            cache_dir: None,
        })
    }

    /// Length of every vector this model produces.
    pub fn dimension(&self) -> usize {
        self.hidden_size
    }

    fn cache_path(&self, text: &str) -> Result<Option<PathBuf>> {
        let Some(dir) = &self.cache_dir else {
            return Ok(None);
        };
        let hash = murmur3_x86_128(&mut Cursor::new(text), 0)?;
        Ok(Some(dir.join(format!("{hash}.bin"))))
    }

    fn read_cached(path: &Path) -> Option<Vec<f32>> {
        let f = std::fs::File::open(path).ok()?;
        let mut reader = std::io::BufReader::new(f);
        match bincode::decode_from_std_read(&mut reader, bincode::config::standard()) {
            Ok(vec) => Some(vec),
            Err(e) => {
                warn!("Ignoring unreadable embedding cache entry {:?}: {}", path, e);
                None
            }
        }
    }

    pub fn embed_text_blocking(&self, text: &str) -> Result<Vec<f32>> {
        let text = text.trim();
        let cache_path = self.cache_path(text)?;
        if let Some(cached) = cache_path.as_deref().and_then(Self::read_cached) {
            return Ok(cached);
        }

        let encoding = self.tokenizer.encode(text, true)?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = Tensor::new(encoding.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask =
            Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        // (1, seq_len, hidden)
        let outputs = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = outputs.broadcast_mul(&mask)?.sum(1)?;
        let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
        let pooled = summed.broadcast_div(&counts)?;
        let norm = pooled.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12, f64::MAX)?;
        let pooled = pooled.broadcast_div(&norm)?;
        let embedding = pooled.squeeze(0)?.to_vec1::<f32>()?;

        if let Some(cache_path) = cache_path {
            let mut f = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&cache_path)?;
            bincode::encode_into_std_write(&embedding, &mut f, bincode::config::standard())?;
        }

        Ok(embedding)
    }

    /// Embed a batch of texts on a blocking worker, preserving input order.
    pub async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let embedder = self.clone();
        let texts: Vec<String> = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let header_span = info_span!("Embedding question texts");
            header_span.pb_set_message("Embedding...");
            header_span.pb_set_finish_message("Embedding complete");
            header_span.pb_set_length(texts.len() as u64);
            header_span.pb_set_style(&Self::progress_style(
                "{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            ));
            let _enter = header_span.enter();

            let mut embeddings = Vec::with_capacity(texts.len());
            for t in &texts {
                embeddings.push(embedder.embed_text_blocking(t)?);
                header_span.pb_inc(1);
            }
            Result::<_>::Ok(embeddings)
        })
        .await
        .map_err(|e| EmbedderError::Other(e.to_string()))?
    }
}
