use std::io;
use std::path::Path;
use tokenizers::Tokenizer;

/// Loads a tokenizer from a model directory or explicit tokenizer.json path.
pub fn load_tokenizer(model_path: &Path) -> io::Result<Tokenizer> {
    let tokenizer_path = if model_path
        .file_name()
        .is_some_and(|name| name == std::ffi::OsStr::new("tokenizer.json"))
    {
        model_path.to_path_buf()
    } else if model_path.is_dir() {
        model_path.join("tokenizer.json")
    } else {
        model_path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Model path has no parent"))?
            .join("tokenizer.json")
    };

    Tokenizer::from_file(&tokenizer_path).map_err(io::Error::other)
}

/// Checks that a checkpoint directory holds `config.json` and `model.safetensors`.
pub fn checkpoint_files(model_dir: &Path) -> io::Result<(std::path::PathBuf, std::path::PathBuf)> {
    if !model_dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("model directory not found: {}", model_dir.display()),
        ));
    }

    let config_path = model_dir.join("config.json");
    if !config_path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("missing config.json in {}", model_dir.display()),
        ));
    }

    let weights_path = model_dir.join("model.safetensors");
    if !weights_path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("missing model.safetensors in {}", model_dir.display()),
        ));
    }

    Ok((config_path, weights_path))
}
