use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::Context as _;

/// Writes `value` as pretty JSON to `path`, or to stdout when `path` is `None`.
pub fn save_json<T>(value: &T, path: Option<&Path>) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            write_json(BufWriter::new(file), value)
                .with_context(|| format!("Failed to write JSON to {}", path.display()))
        }
        None => write_json(io::stdout().lock(), value).context("Failed to write JSON to stdout"),
    }
}

fn write_json<W, T>(mut writer: W, value: &T) -> anyhow::Result<()>
where
    W: Write,
    T: serde::Serialize,
{
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Reads a JSON file; `kind` names the file in error messages.
pub fn read_json_file<T>(kind: &str, path: &Path) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let file = File::open(path)
        .with_context(|| format!("Failed to open {kind} file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {kind} JSON file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use brainfuzz_evolution::EvolutionParams;

    use super::*;

    #[test]
    fn test_write_json_ends_with_newline() {
        let mut buf = Vec::new();
        write_json(&mut buf, &EvolutionParams::default()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with("}\n"));
        let parsed: EvolutionParams = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.generation_size, EvolutionParams::default().generation_size);
    }

    #[test]
    fn test_read_missing_file_names_kind() {
        let path = std::env::temp_dir().join("brainfuzz-missing-params.json");
        let err = read_json_file::<EvolutionParams>("evolution params", &path).unwrap_err();
        assert!(err.to_string().contains("evolution params"));
    }
}
