#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Cluster API error [{status}]: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse cluster response: {0}")]
    Parse(String),
}
