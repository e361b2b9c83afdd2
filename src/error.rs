use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("failed to read URL records")]
    Input,
    #[display("failed to generate sitemaps")]
    Sitemap,
    #[display("failed to build sitemap index")]
    Index,
    #[display("failed to set up search engine pings")]
    Notify,
    #[display("cannot inspect {}", _0.display())]
    Inspect(#[error(not(source))] PathBuf),
}
