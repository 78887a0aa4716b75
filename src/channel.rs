use std::{error::Error, fmt, str::FromStr};

/// The text channel a turn arrived on
///
/// Affects only response framing: USSD responses keep their
/// `CON `/`END ` prefix, chat channels have it stripped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    /// Session oriented telephony channel
    Ussd,
    /// WhatsApp chat bot
    WhatsApp,
    /// Telegram chat bot
    Telegram,
}

impl Channel {
    pub(crate) fn format_response(self, response: String) -> String {
        match self {
            Channel::Ussd => response,
            Channel::WhatsApp | Channel::Telegram => match framed_body(&response) {
                Some(body) => body.to_string(),
                None => response,
            },
        }
    }
}

impl FromStr for Channel {
    type Err = UnknownChannel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ussd" => Ok(Channel::Ussd),
            "whatsapp" => Ok(Channel::WhatsApp),
            "telegram" => Ok(Channel::Telegram),
            _ => Err(UnknownChannel(value.to_string())),
        }
    }
}

/// An error returned when parsing an unknown channel tag
#[derive(Debug)]
pub struct UnknownChannel(String);

impl fmt::Display for UnknownChannel {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        write!(out, "unknown channel: {}", self.0)
    }
}

impl Error for UnknownChannel {}

/// Returns the response body when the response carries a framing prefix
pub(crate) fn framed_body(response: &str) -> Option<&str> {
    if response.starts_with("CON ") || response.starts_with("END ") {
        Some(&response[4..])
    } else {
        None
    }
}

/// Returns the response without its framing prefix, if any
pub(crate) fn response_body(response: &str) -> &str {
    framed_body(response).unwrap_or(response)
}
