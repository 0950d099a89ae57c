use secrecy::ExposeSecret;
use tracing::{debug, warn};

use crate::codec::{OwnMessage, own_password};
use crate::config::SessionConfig;
use crate::errors::{AuthRejection, SessionError};
use crate::net::GatewayConnection;
use crate::shared_types::GatewayIdentity;

// -----------------------------------------------------------------------------
// ----- Constants -------------------------------------------------------------

const SESSION_REQUEST: &str = "*99*1##";

/// WHO=13 dimensions used to learn the gateway identity.
const DIM_MAC_ADDRESS: &str = "12";
const DIM_MODEL: &str = "15";
const DIM_FIRMWARE: &str = "16";

// -----------------------------------------------------------------------------
// ----- Establish -------------------------------------------------------------

/// Open the transport, run the greeting/authentication exchange and learn
/// the gateway identity. On any failure the connection is dropped; no tasks
/// are started here.
pub async fn establish(
    config: &SessionConfig,
) -> Result<(GatewayConnection, GatewayIdentity), SessionError> {
    let mut connection =
        GatewayConnection::connect(&config.host, config.port, config.connect_timeout)
            .await
            .map_err(|e| SessionError::unreachable(&e))?;

    greet(config, &mut connection).await?;
    authenticate(config, &mut connection).await?;

    let identity = fetch_identity(config, &mut connection).await?;
    debug!(
        gateway = %identity.unique_id,
        model = %identity.model,
        firmware = %identity.firmware,
        "handshake complete"
    );

    Ok((connection, identity))
}

// -----------------------------------------------------------------------------
// ----- Greeting / Authentication ---------------------------------------------

async fn greet(
    config: &SessionConfig,
    connection: &mut GatewayConnection,
) -> Result<(), SessionError> {
    match read_message(config, connection).await? {
        OwnMessage::Ack => {}
        other => {
            return Err(SessionError::Protocol(format!(
                "expected greeting ACK, got {other:?}"
            )));
        }
    }

    connection
        .send_frame(SESSION_REQUEST)
        .await
        .map_err(|e| SessionError::unreachable(&e))
}

async fn authenticate(
    config: &SessionConfig,
    connection: &mut GatewayConnection,
) -> Result<(), SessionError> {
    let nonce = match read_message(config, connection).await? {
        // Open gateway, no password round.
        OwnMessage::Ack => return Ok(()),
        OwnMessage::Nonce(nonce) => nonce,
        OwnMessage::Nack => {
            return Err(SessionError::AuthRejected(AuthRejection::PasswordError));
        }
        other => {
            return Err(SessionError::Protocol(format!(
                "expected ACK or nonce after session request, got {other:?}"
            )));
        }
    };

    let Some(password) = config.password.as_ref() else {
        return Err(SessionError::AuthRejected(AuthRejection::PasswordRequired));
    };

    let Ok(numeric) = password.expose_secret().parse::<u32>() else {
        warn!("configured gateway password is not numeric; OPEN auth cannot use it");
        return Err(SessionError::AuthRejected(AuthRejection::PasswordError));
    };

    let answer = format!("*#{}##", own_password(numeric, &nonce));
    connection
        .send_frame(&answer)
        .await
        .map_err(|e| SessionError::unreachable(&e))?;

    match read_message(config, connection).await? {
        OwnMessage::Ack => Ok(()),
        OwnMessage::Nack => Err(SessionError::AuthRejected(AuthRejection::PasswordError)),
        other => Err(SessionError::Protocol(format!(
            "expected auth verdict, got {other:?}"
        ))),
    }
}

// -----------------------------------------------------------------------------
// ----- Identity --------------------------------------------------------------

async fn fetch_identity(
    config: &SessionConfig,
    connection: &mut GatewayConnection,
) -> Result<GatewayIdentity, SessionError> {
    let mac = query_dimension(config, connection, DIM_MAC_ADDRESS).await?;
    let model = query_dimension(config, connection, DIM_MODEL).await?;
    let firmware = query_dimension(config, connection, DIM_FIRMWARE).await?;

    let unique_id = format_mac(&mac)?;
    let model = model
        .first()
        .map(|id| model_name(id))
        .unwrap_or_else(|| "Unknown".to_string());
    let firmware = if firmware.is_empty() {
        "unknown".to_string()
    } else {
        firmware.join(".")
    };

    Ok(GatewayIdentity::new(unique_id, model, firmware))
}

/// Send a `*#13**DIM##` request and collect the reply values. The gateway
/// answers with a dimension frame followed by an ACK; a NACK (dimension not
/// supported on this model) yields an empty value list.
async fn query_dimension(
    config: &SessionConfig,
    connection: &mut GatewayConnection,
    dimension: &str,
) -> Result<Vec<String>, SessionError> {
    let request = format!("*#13**{dimension}##");
    connection
        .send_frame(&request)
        .await
        .map_err(|e| SessionError::unreachable(&e))?;

    let mut values = None;
    loop {
        match read_message(config, connection).await? {
            OwnMessage::Dimension {
                who,
                dimension: dim,
                values: reply,
                ..
            } if who == "13" && dim == dimension => {
                values = Some(reply);
            }
            OwnMessage::Ack => {
                return Ok(values.ok_or_else(|| {
                    SessionError::Protocol(format!(
                        "gateway acknowledged dimension {dimension} without a reply"
                    ))
                })?);
            }
            OwnMessage::Nack => return Ok(Vec::new()),
            other => {
                return Err(SessionError::Protocol(format!(
                    "unexpected frame during identity query: {other:?}"
                )));
            }
        }
    }
}

// -----------------------------------------------------------------------------
// ----- Helpers ---------------------------------------------------------------

async fn read_message(
    config: &SessionConfig,
    connection: &mut GatewayConnection,
) -> Result<OwnMessage, SessionError> {
    let frame = tokio::time::timeout(config.connect_timeout, connection.read_frame())
        .await
        .map_err(|_| SessionError::Unreachable {
            reason: "handshake timed out".to_string(),
        })?
        .map_err(|e| SessionError::unreachable(&e))?
        .ok_or_else(|| SessionError::Protocol("gateway closed during handshake".to_string()))?;

    OwnMessage::parse(&frame)
        .map_err(|e| SessionError::Protocol(format!("unparseable handshake frame: {e}")))
}

/// MAC dimension values are decimal octets; render the canonical lowercase
/// colon-separated form used as the session's unique id.
fn format_mac(values: &[String]) -> Result<String, SessionError> {
    if values.is_empty() {
        return Err(SessionError::Protocol(
            "gateway did not report a MAC address".to_string(),
        ));
    }

    let octets: Result<Vec<String>, _> = values
        .iter()
        .map(|v| v.parse::<u8>().map(|b| format!("{b:02x}")))
        .collect();

    match octets {
        Ok(octets) => Ok(octets.join(":")),
        Err(_) => Err(SessionError::Protocol(format!(
            "malformed MAC dimension values: {values:?}"
        ))),
    }
}

fn model_name(id: &str) -> String {
    let known = match id {
        "2" => "MHServer",
        "4" => "MH200",
        "6" => "F452",
        "7" => "F452V",
        "11" => "MHServer2",
        "12" => "F453AV",
        "13" => "H4684",
        "16" => "F453",
        "27" => "L4686SDK",
        _ => return format!("Unknown ({id})"),
    };
    known.to_string()
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------


// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
