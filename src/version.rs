//! Version and build information

use std::fmt;

/// Build information embedded by `build.rs`
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    /// Short commit hash, "unknown" outside a git checkout
    pub git_hash: &'static str,
    pub git_branch: &'static str,
    git_dirty: &'static str,
    pub build_timestamp: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
}

impl BuildInfo {
    pub const fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            git_hash: env!("SITE_AUTHOR_GIT_HASH"),
            git_branch: env!("SITE_AUTHOR_GIT_BRANCH"),
            git_dirty: env!("SITE_AUTHOR_GIT_DIRTY"),
            build_timestamp: env!("SITE_AUTHOR_BUILD_TIMESTAMP"),
            target: env!("SITE_AUTHOR_TARGET"),
            profile: env!("SITE_AUTHOR_PROFILE"),
        }
    }

    /// Whether the checkout had uncommitted changes at build time
    pub fn git_dirty(&self) -> bool {
        self.git_dirty == "true"
    }

    /// Version with commit suffix (e.g., "0.1.0-abc1234" or "0.1.0-abc1234-dirty")
    pub fn full_version(&self) -> String {
        if self.git_dirty() {
            format!("{}-{}-dirty", self.version, self.git_hash)
        } else {
            format!("{}-{}", self.version, self.git_hash)
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.name, self.full_version())?;
        writeln!(f)?;
        writeln!(f, "  Commit:  {} ({})", self.git_hash, self.git_branch)?;
        writeln!(f, "  Built:   {}", self.build_timestamp)?;
        writeln!(f, "  Target:  {}", self.target)?;
        writeln!(f, "  Profile: {}", self.profile)
    }
}

/// Get the current build info
pub fn build_info() -> BuildInfo {
    BuildInfo::current()
}
