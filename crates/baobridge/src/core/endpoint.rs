use std::fmt;

use crate::data::SessionId;

/// Host-facing operations a session exposes under its namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    SetRoot,
    SetProof,
    Write,
    WritePromise,
    Result,
    Error,
}

impl Endpoint {
    pub const ALL: [Endpoint; 6] = [
        Endpoint::SetRoot,
        Endpoint::SetProof,
        Endpoint::Write,
        Endpoint::WritePromise,
        Endpoint::Result,
        Endpoint::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::SetRoot => "set_root",
            Endpoint::SetProof => "set_proof",
            Endpoint::Write => "write",
            Endpoint::WritePromise => "write_promise",
            Endpoint::Result => "result",
            Endpoint::Error => "error",
        }
    }

    /// Full name of this endpoint for one session: `<prefix>_<id>_<op>`.
    pub fn name(&self, prefix: &str, id: SessionId) -> String { format!("{prefix}_{id}_{}", self.as_str()) }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Split a namespaced endpoint name back into its session and operation.
///
/// Returns `None` when the name does not belong to `prefix` or is malformed.
pub fn parse_endpoint(prefix: &str, name: &str) -> Option<(SessionId, Endpoint)> {
    let rest = name.strip_prefix(prefix)?.strip_prefix('_')?;
    let (id, op) = rest.split_once('_')?;
    let id = id.parse().ok()?;
    let endpoint = Endpoint::ALL.into_iter().find(|endpoint| endpoint.as_str() == op)?;
    Some((id, endpoint))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_format() {
        let id = SessionId::from(17);
        assert_eq!(Endpoint::WritePromise.name("bao", id), "bao_17_write_promise");
        assert_eq!(Endpoint::SetRoot.name("upload", id), "upload_17_set_root");
    }

    #[test]
    fn test_parse_every_endpoint() {
        let id = SessionId::from(9001);
        for endpoint in Endpoint::ALL {
            let name = endpoint.name("bao", id);
            assert_eq!(parse_endpoint("bao", &name), Some((id, endpoint)));
        }
    }

    #[test]
    fn test_parse_rejects_foreign_names() {
        assert_eq!(parse_endpoint("bao", "other_1_write"), None);
        assert_eq!(parse_endpoint("bao", "bao_x_write"), None);
        assert_eq!(parse_endpoint("bao", "bao_1_read"), None);
        assert_eq!(parse_endpoint("bao", "bao1_write"), None);
        assert_eq!(parse_endpoint("bao", "bao_1"), None);
    }
}
