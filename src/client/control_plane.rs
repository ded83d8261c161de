//! Control Plane trait for server communication
//!
//! This trait abstracts the command/reply exchange so that the stats
//! pipeline can run against a live `RawConnection` or a scripted mock.

use crate::utils::{ConnectionError, ProbeError, ProtocolError, RespValue, Result};

/// Control plane operations trait
///
/// Implementations handle the underlying protocol and connection management.
/// A server error reply must be surfaced as `ProtocolError::ServerError`,
/// never returned as a `RespValue::Error`.
pub trait ControlPlane {
    /// Execute a command with string arguments
    ///
    /// # Example
    /// ```ignore
    /// let response = conn.execute(&["INFO"])?;
    /// let response = conn.execute(&["CONFIG", "GET", "maxmemory"])?;
    /// ```
    fn execute(&mut self, args: &[&str]) -> Result<RespValue>;
}

/// Extension trait with common control plane operations
///
/// These are convenience methods built on top of the base `ControlPlane` trait.
pub trait ControlPlaneExt: ControlPlane {
    /// Send PING and verify PONG response
    fn ping(&mut self) -> Result<bool> {
        match self.execute(&["PING"])? {
            RespValue::SimpleString(s) => Ok(s == "PONG"),
            _ => Ok(false),
        }
    }

    /// Get INFO for a section (empty string returns the default sections)
    fn info(&mut self, section: &str) -> Result<String> {
        let response = if section.is_empty() {
            self.execute(&["INFO"])?
        } else {
            self.execute(&["INFO", section])?
        };

        match response {
            RespValue::BulkString(data) => String::from_utf8(data).map_err(|e| {
                ProbeError::from(ProtocolError::Parse(format!(
                    "INFO reply is not UTF-8: {}",
                    e
                )))
            }),
            other => Err(unexpected("bulk string", &other)),
        }
    }

    /// Read one server parameter with CONFIG GET.
    /// The reply must be a two-element array of (name, value).
    fn config_get(&mut self, name: &str) -> Result<String> {
        let response = self.execute(&["CONFIG", "GET", name])?;

        match response.as_array() {
            Some([_, value]) => value
                .to_text()
                .ok_or_else(|| unexpected("scalar parameter value", value)),
            _ => Err(unexpected("2-element array", &response)),
        }
    }

    /// Send AUTH command
    fn authenticate(&mut self, password: &str) -> Result<()> {
        let response = self.execute(&["AUTH", password]).map_err(|e| match e {
            ProbeError::Protocol(ProtocolError::ServerError(msg)) => {
                ProbeError::from(ConnectionError::AuthFailed(msg))
            }
            other => other,
        })?;

        if response.is_ok() {
            Ok(())
        } else {
            Err(ConnectionError::AuthFailed(format!("Unexpected response: {:?}", response)).into())
        }
    }

    /// Send SELECT command
    fn select_db(&mut self, db: u32) -> Result<()> {
        let db_str = db.to_string();
        let response = self.execute(&["SELECT", &db_str]).map_err(|e| match e {
            ProbeError::Protocol(ProtocolError::ServerError(reason)) => {
                ProbeError::from(ConnectionError::SelectFailed { db, reason })
            }
            other => other,
        })?;

        if response.is_ok() {
            Ok(())
        } else {
            Err(ConnectionError::SelectFailed {
                db,
                reason: format!("Unexpected response: {:?}", response),
            }
            .into())
        }
    }

    /// Send SET command
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let response = self.execute(&["SET", key, value])?;
        if response.is_ok() {
            Ok(())
        } else {
            Err(unexpected("+OK", &response))
        }
    }

    /// Send GET command. A missing key yields `None`.
    fn get(&mut self, key: &str) -> Result<Option<String>> {
        match self.execute(&["GET", key])? {
            RespValue::Null => Ok(None),
            RespValue::BulkString(data) => Ok(Some(String::from_utf8_lossy(&data).into_owned())),
            other => Err(unexpected("bulk string", &other)),
        }
    }
}

// Blanket implementation: any ControlPlane automatically gets ControlPlaneExt
impl<T: ControlPlane + ?Sized> ControlPlaneExt for T {}

fn unexpected(expected: &str, actual: &RespValue) -> ProbeError {
    ProtocolError::UnexpectedResponse {
        expected: expected.to_string(),
        actual: format!("{:?}", actual),
    }
    .into()
}


#[cfg(test)]
mod tests {
    use super::mock::{bulk, MockControlPlane};
    use super::*;

    #[test]
    fn test_ping() {
        let mut mock = MockControlPlane::new(vec![RespValue::SimpleString("PONG".to_string())]);
        assert!(mock.ping().unwrap());
        assert_eq!(mock.commands, vec![vec!["PING".to_string()]]);
    }

    #[test]
    fn test_info() {
        let mut mock = MockControlPlane::new(vec![bulk("redis_version:7.0.0\r\n")]);
        assert_eq!(mock.info("").unwrap(), "redis_version:7.0.0\r\n");
        assert_eq!(mock.commands, vec![vec!["INFO".to_string()]]);
    }

    #[test]
    fn test_info_wrong_type() {
        let mut mock = MockControlPlane::new(vec![RespValue::Integer(1)]);
        let err = mock.info("").unwrap_err();
        assert!(matches!(
            err,
            ProbeError::Protocol(ProtocolError::UnexpectedResponse { .. })
        ));
    }

    #[test]
    fn test_config_get() {
        let mut mock = MockControlPlane::new(vec![RespValue::Array(vec![
            bulk("maxmemory"),
            bulk("1048576"),
        ])]);
        assert_eq!(mock.config_get("maxmemory").unwrap(), "1048576");
        assert_eq!(
            mock.commands,
            vec![vec![
                "CONFIG".to_string(),
                "GET".to_string(),
                "maxmemory".to_string()
            ]]
        );
    }

    #[test]
    fn test_config_get_bad_shape() {
        let mut mock = MockControlPlane::new(vec![
            RespValue::Array(vec![bulk("maxclients")]),
            RespValue::Integer(10000),
            RespValue::Array(Vec::new()),
        ]);
        for _ in 0..3 {
            let err = mock.config_get("maxclients").unwrap_err();
            assert!(err.is_reply_scoped(), "unexpected error: {}", err);
        }
    }

    #[test]
    fn test_authenticate() {
        let mut mock = MockControlPlane::new(vec![RespValue::SimpleString("OK".to_string())]);
        mock.authenticate("secret").unwrap();
        assert_eq!(
            mock.commands,
            vec![vec!["AUTH".to_string(), "secret".to_string()]]
        );
    }

    #[test]
    fn test_authenticate_rejected() {
        let mut mock = MockControlPlane::new(vec![RespValue::Error(
            "WRONGPASS invalid username-password pair".to_string(),
        )]);
        let err = mock.authenticate("nope").unwrap_err();
        assert!(matches!(
            err,
            ProbeError::Connection(ConnectionError::AuthFailed(_))
        ));
        assert!(err.is_setup_failure());
    }

    #[test]
    fn test_select_db_rejected() {
        let mut mock = MockControlPlane::new(vec![RespValue::Error(
            "ERR DB index is out of range".to_string(),
        )]);
        let err = mock.select_db(99).unwrap_err();
        assert!(matches!(
            err,
            ProbeError::Connection(ConnectionError::SelectFailed { db: 99, .. })
        ));
    }

    #[test]
    fn test_select_db_non_ok_status() {
        let mut mock = MockControlPlane::new(vec![RespValue::SimpleString("QUEUED".to_string())]);
        assert!(mock.select_db(1).unwrap_err().is_setup_failure());
    }

    #[test]
    fn test_get_missing_key() {
        let mut mock = MockControlPlane::new(vec![RespValue::Null, bulk("v")]);
        assert_eq!(mock.get("k").unwrap(), None);
        assert_eq!(mock.get("k").unwrap(), Some("v".to_string()));
    }
}
