use crate::{EdbError, EdbResult};

// Tags of the messages this client sends.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum ClientMessageType {
    ClientHandshake = 0x56,               // 'V'
    AuthenticationSaslInitialResponse = 0x70, // 'p'
    AuthenticationSaslResponse = 0x72,    // 'r'
    Prepare = 0x50,                       // 'P'
    DescribeStatement = 0x44,             // 'D'
    Execute = 0x45,                       // 'E'
    ExecuteScript = 0x51,                 // 'Q'
    Sync = 0x53,                          // 'S'
    Flush = 0x48,                         // 'H'
    Terminate = 0x58,                     // 'X'
}
impl ClientMessageType {
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }
}

// Tags of the messages this client receives.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum ServerMessageType {
    ServerHandshake,        // 'v'
    Authentication,         // 'R'
    ServerKeyData,          // 'K'
    ParameterStatus,        // 'S'
    PrepareComplete,        // '1'
    CommandDataDescription, // 'T'
    Data,                   // 'D'
    CommandComplete,        // 'C'
    ReadyForCommand,        // 'Z'
    ErrorResponse,          // 'E'
    LogMessage,             // 'L'
}
impl ServerMessageType {
    // An unknown tag means the stream can no longer be interpreted; the
    // caller must close the connection.
    pub(crate) fn from_u8(tag: u8) -> EdbResult<Self> {
        match tag {
            0x76 => Ok(Self::ServerHandshake),
            0x52 => Ok(Self::Authentication),
            0x4b => Ok(Self::ServerKeyData),
            0x53 => Ok(Self::ParameterStatus),
            0x31 => Ok(Self::PrepareComplete),
            0x54 => Ok(Self::CommandDataDescription),
            0x44 => Ok(Self::Data),
            0x43 => Ok(Self::CommandComplete),
            0x5a => Ok(Self::ReadyForCommand),
            0x45 => Ok(Self::ErrorResponse),
            0x4c => Ok(Self::LogMessage),
            tag => Err(EdbError::Protocol(format!(
                "unknown server message tag 0x{tag:02x}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ClientMessageType, ServerMessageType};

    #[test]
    fn client_tags() {
        assert_eq!(ClientMessageType::ClientHandshake.as_u8(), b'V');
        assert_eq!(ClientMessageType::Prepare.as_u8(), b'P');
        assert_eq!(ClientMessageType::ExecuteScript.as_u8(), b'Q');
        assert_eq!(ClientMessageType::Sync.as_u8(), b'S');
        assert_eq!(ClientMessageType::Terminate.as_u8(), b'X');
    }

    #[test]
    fn unknown_server_tag_is_rejected() {
        assert!(ServerMessageType::from_u8(b'?').is_err());
        assert_eq!(
            ServerMessageType::from_u8(b'Z').unwrap(),
            ServerMessageType::ReadyForCommand
        );
    }
}
