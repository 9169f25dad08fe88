//! Parameter file loading
//!
//! Parameter files are TOML documents living under `$ROUTE_SW_ROOT/params`, one file per module,
//! deserialised straight into that module's params struct.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable ({0}) is not set")]
    SwRootNotSet(&'static str),

    #[error("Could not read the parameter file {0:?}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Could not parse the parameter file {0:?}: {1}")]
    Parse(PathBuf, toml::de::Error),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file, with the given name relative to the params directory.
pub fn load<P>(param_file_name: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    let path = params_dir()?.join(param_file_name);

    let params_str = fs::read_to_string(&path).map_err(|e| LoadError::Read(path.clone(), e))?;

    toml::from_str(&params_str).map_err(|e| LoadError::Parse(path, e))
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// The params directory under the software root.
fn params_dir() -> Result<PathBuf, LoadError> {
    crate::host::get_route_sw_root()
        .map(|root| root.join("params"))
        .map_err(|_| LoadError::SwRootNotSet(crate::host::SW_ROOT_ENV_VAR))
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;
    use std::{env, fs};

    #[derive(Debug, Deserialize)]
    struct TestParams {
        cross_track_max_m: f64,
    }

    #[test]
    fn test_load_relative_to_sw_root() {
        let root = env::temp_dir().join("route_sw_params_test");
        fs::create_dir_all(root.join("params")).unwrap();
        fs::write(
            root.join("params").join("test.toml"),
            "cross_track_max_m = 2.0\n",
        )
        .unwrap();
        env::set_var(crate::host::SW_ROOT_ENV_VAR, &root);

        let params: TestParams = load("test.toml").unwrap();
        assert!((params.cross_track_max_m - 2.0).abs() < f64::EPSILON);

        // A missing file reports the full path it looked for
        match load::<TestParams>("missing.toml") {
            Err(LoadError::Read(path, _)) => assert!(path.ends_with("missing.toml")),
            other => panic!("Expected Read error, got {:?}", other),
        }
    }
}
