use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to write storage item: {0}")]
    Write(String),
}

#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("malformed settings under `{key}`: {source}")]
    Decode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("view settings for {scope}/{id} lack a center or zoom")]
    IncompleteView { scope: String, id: String },
    #[error(transparent)]
    Storage(#[from] StorageError),
}
