use std::path::Path;

use ndarray::Array2;
use serde::de::DeserializeOwned;
use serde::ser;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::AppResult;
use crate::classify::similarity::similarity_from_rows;
use crate::question::Question;

/// Parse JSON, reporting the path of the offending value on failure.
pub fn parse_json<T: DeserializeOwned>(data: &[u8]) -> AppResult<T> {
    let de = &mut serde_json::Deserializer::from_slice(data);
    Ok(serde_path_to_error::deserialize(de)?)
}

/// Read and parse a JSON file.
#[tracing::instrument(name = "Reading JSON file", level = "debug")]
pub async fn read_json<T, P>(path: P) -> AppResult<T>
where
    T: DeserializeOwned,
    P: AsRef<Path> + std::fmt::Debug,
{
    let data = fs::read(path).await?;
    parse_json(&data)
}

/// Load questions: a JSON array of strings or `{question_no, question_text}` objects.
pub async fn read_questions<P: AsRef<Path> + std::fmt::Debug>(path: P) -> AppResult<Vec<Question>> {
    let questions: Vec<Question> = read_json(path).await?;
    debug!("Loaded {} questions", questions.len());
    Ok(questions)
}

/// Load a similarity matrix stored as a JSON array of rows.
pub async fn read_similarity<P: AsRef<Path> + std::fmt::Debug>(path: P) -> AppResult<Array2<f64>> {
    let rows: Vec<Vec<f64>> = read_json(path).await?;
    similarity_from_rows(rows)
}

/// Serialize an object to pretty JSON and write it to `output`, or stdout when `None`.
#[tracing::instrument(name = "Writing JSON output", level = "debug", skip(obj))]
pub async fn write_json_output<P: AsRef<Path> + std::fmt::Debug, S: ser::Serialize>(
    output: Option<P>,
    obj: &S,
) -> AppResult<()> {
    let mut data = serde_json::to_string_pretty(obj)?;
    data.push('\n');
    match output {
        Some(path) => write_file(path, data).await,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(data.as_bytes()).await?;
            stdout.flush().await?;
            Ok(())
        }
    }
}

/// Write raw string data to a file, overwriting any existing content.
async fn write_file<P: AsRef<Path> + std::fmt::Debug>(output: P, data: String) -> AppResult<()> {
    if let Some(parent) = output.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(output)
        .await?;
    file.write_all(data.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}
