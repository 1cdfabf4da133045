#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone crime oracle API server.
//!
//! Reads its config from `CRIME_ORACLE_CONFIG` or the embedded default.

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = crime_oracle_config::load(None).map_err(std::io::Error::other)?;
    crime_oracle_server::run_server(config).await
}
