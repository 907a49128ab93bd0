//! Build information for the indexer binaries.

use miniflux_indexer_shared::BuildInfo;

/// Build info of the running binary.
///
/// `GIT_COMMIT` and `BUILD_ENV` are read at compile time; a missing
/// `BUILD_ENV` means a development build.
pub fn current(name: &str) -> BuildInfo {
    let info = BuildInfo::new(name, env!("CARGO_PKG_VERSION"))
        .with_environment(option_env!("BUILD_ENV").unwrap_or(BuildInfo::ENV_DEVELOPMENT));

    match option_env!("GIT_COMMIT") {
        Some(commit) if !commit.is_empty() => info.with_commit_id(commit),
        _ => info,
    }
}
