use std::{
    env,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use crate::error::ServerError;

/// Listening port. Not configurable.
pub const PORT: u16 = 9000;

pub struct ServerConfig {
    pub addr: SocketAddr,
    pub root: PathBuf,
}

impl ServerConfig {
    /// Binds all interfaces on [`PORT`] and serves the directory that
    /// contains the running executable.
    pub fn locate() -> Result<Self, ServerError> {
        let exe = env::current_exe().map_err(ServerError::CurrentExe)?;
        let root = exe
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| ServerError::NoParentDir(exe.clone()))?;

        Ok(Self::with_root(root))
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], PORT)),
            root: root.into(),
        }
    }
}

/// Loads `.env` into the process environment.
///
/// `<root>/.env` is preferred; otherwise the first `.env` found from the
/// working directory upward is used. Variables that are already set are
/// left alone. Returns the file that was loaded, if any.
pub fn load_dotenv(root: &Path) -> Option<PathBuf> {
    let local = root.join(".env");
    let result = if local.is_file() {
        dotenvy::from_path(&local).map(|()| local)
    } else {
        dotenvy::dotenv()
    };

    match result {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "Loaded environment file");
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed environment file");
            None
        }
    }
}
