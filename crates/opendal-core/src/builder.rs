use std::collections::HashMap;
use std::env;

use opendal_common::{Result, Scheme, env_prefix};

use crate::raw::Accessor;

/// Builds the [`Accessor`] of one service
///
/// Every builder can be configured from a plain string map, which is also
/// how `OPENDAL_<SCHEME>_<KEY>` environment variables are applied.
pub trait Builder: Default {
    const SCHEME: Scheme;

    type Accessor: Accessor;

    fn from_map(map: HashMap<String, String>) -> Self;

    fn from_iter(iter: impl Iterator<Item = (String, String)>) -> Self
    where
        Self: Sized,
    {
        Self::from_map(iter.collect())
    }

    /// Configure from env, `OPENDAL_REDIS_ENDPOINT` becomes key `endpoint`.
    fn from_env() -> Self
    where
        Self: Sized,
    {
        Self::from_map(scheme_envs(Self::SCHEME, env::vars()))
    }

    fn build(&mut self) -> Result<Self::Accessor>;
}

/// Collect the variables of `scheme` with the prefix stripped and the key lowercased.
pub fn scheme_envs(
    scheme: Scheme,
    vars: impl Iterator<Item = (String, String)>,
) -> HashMap<String, String> {
    let prefix = env_prefix(scheme);

    vars.filter_map(|(k, v)| {
        k.to_lowercase()
            .strip_prefix(&prefix)
            .map(|k| (k.to_string(), v))
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_envs() {
        let vars = vec![
            ("OPENDAL_REDIS_ENDPOINT".to_string(), "tcp://127.0.0.1:6379".to_string()),
            ("OPENDAL_REDIS_TEST".to_string(), "on".to_string()),
            ("opendal_redis_root".to_string(), "/tmp".to_string()),
            ("OPENDAL_HDFS_NAME_NODE".to_string(), "default".to_string()),
            ("PATH".to_string(), "/usr/bin".to_string()),
        ];

        let envs = scheme_envs(Scheme::Redis, vars.into_iter());
        assert_eq!(envs.len(), 3);
        assert_eq!(envs["endpoint"], "tcp://127.0.0.1:6379");
        assert_eq!(envs["test"], "on");
        assert_eq!(envs["root"], "/tmp");
    }
}
