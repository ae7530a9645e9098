//! Credential exchange and cluster-identity decoding (spec §4.H step 1-4, §4.I).

use crate::codec::{Reader, Writer};
use crate::error::{VoltError, VoltResult};
use crate::status::{LoginStatus, ServiceType};
use sha1::{Digest, Sha1};

/// Cluster identity returned by a successful login (spec §4.H step 4).
#[derive(Debug, Clone)]
pub struct ClusterIdentity {
    pub host_id: i32,
    pub connection_id: i64,
    /// Epoch milliseconds at which the cluster started.
    pub cluster_start_millis: i64,
    pub leader_ipv4: [u8; 4],
    pub build_tag: String,
}

/// Builds the login frame payload: service type, user id, SHA-1 password hash.
pub fn encode_login_request(service_type: ServiceType, user_id: &str, password: &str) -> VoltResult<Vec<u8>> {
    let mut hasher = Sha1::new();
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();

    let mut w = Writer::with_capacity(32 + user_id.len());
    w.write_string(service_type.as_str())?;
    w.write_string(user_id)?;
    w.write_bytes(&digest)?;
    Ok(w.into_vec())
}

/// Parses the login response frame, raising a distinct error per non-success status.
pub fn decode_login_response(payload: &[u8]) -> VoltResult<ClusterIdentity> {
    let mut r = Reader::new(payload);
    let status = LoginStatus::from_i8(r.read_i8()?);
    match status {
        LoginStatus::Connected => {}
        LoginStatus::InvalidCredentials => return Err(VoltError::InvalidCredentials),
        LoginStatus::ServerTooBusy => return Err(VoltError::ServerTooBusy),
        LoginStatus::HandshakeTimeout => return Err(VoltError::HandshakeTimeout),
        LoginStatus::CorruptedHandshake => return Err(VoltError::CorruptedHandshake),
        LoginStatus::Unknown(code) => return Err(VoltError::UnknownLoginStatus(code)),
    }

    let host_id = r.read_i32().map_err(|_| VoltError::ParseLoginResponse)?;
    let connection_id = r.read_i64().map_err(|_| VoltError::ParseLoginResponse)?;
    let cluster_start_millis = r.read_i64().map_err(|_| VoltError::ParseLoginResponse)?;
    let leader_bytes = r.read_slice(4).map_err(|_| VoltError::ParseLoginResponse)?;
    let leader_ipv4: [u8; 4] = leader_bytes.try_into().map_err(|_| VoltError::ParseLoginResponse)?;
    let build_tag = r.read_string().map_err(|_| VoltError::ParseLoginResponse)?;

    Ok(ClusterIdentity { host_id, connection_id, cluster_start_millis, leader_ipv4, build_tag })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_carries_a_20_byte_sha1_digest() {
        let payload = encode_login_request(ServiceType::Database, "usr", "pwd").unwrap();
        // 4+8 "database", 4+3 "usr", then 20-byte digest.
        assert_eq!(payload.len(), 4 + 8 + 4 + 3 + 20);
        assert_eq!(&payload[payload.len() - 20..], Sha1::digest(b"pwd").as_slice());
    }

    #[test]
    fn decodes_successful_login_response() {
        let mut w = Writer::with_capacity(64);
        w.write_i8(0).unwrap();
        w.write_i32(7).unwrap();
        w.write_i64(42).unwrap();
        w.write_i64(1_700_000_000_000).unwrap();
        w.write_bytes(&[10, 0, 0, 1]).unwrap();
        w.write_string("v10").unwrap();
        let bytes = w.into_vec();

        let identity = decode_login_response(&bytes).unwrap();
        assert_eq!(identity.host_id, 7);
        assert_eq!(identity.connection_id, 42);
        assert_eq!(identity.leader_ipv4, [10, 0, 0, 1]);
        assert_eq!(identity.build_tag, "v10");
    }

    #[test]
    fn invalid_credentials_status_is_a_distinct_error() {
        let mut w = Writer::with_capacity(4);
        w.write_i8(-1).unwrap();
        let bytes = w.into_vec();
        assert!(matches!(decode_login_response(&bytes), Err(VoltError::InvalidCredentials)));
    }
}
