use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing configuration: {0}")]
    ConfigurationMissing(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("strategy file error: {0}")]
    StrategyFile(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected response from {url}: {status} {body}")]
    UnexpectedResponse {
        url: String,
        status: u16,
        body: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
